//! Explicit application state: the loaded clips plus the active view inputs.
//!
//! Every mutation goes to the store first and is followed by a full reload,
//! so `clips` always mirrors what is persisted.

use std::path::{Path, PathBuf};

use crate::{derive, ingest, Clip, ClipError, ClipId, NewClip, Store, ViewState};

pub struct Session<'a> {
    store: &'a dyn Store,
    clips: Vec<Clip>,
    pub view: ViewState,
}

/// Outcome of ingesting a batch of files; one rejected file never stops the rest.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub saved: Vec<(PathBuf, ClipId)>,
    pub rejected: Vec<(PathBuf, anyhow::Error)>,
}

impl<'a> Session<'a> {
    pub fn open(store: &'a dyn Store, view: ViewState) -> anyhow::Result<Self> {
        let mut s = Self {
            store,
            clips: Vec::new(),
            view,
        };
        s.reload()?;
        Ok(s)
    }

    pub fn store(&self) -> &'a dyn Store {
        self.store
    }

    pub fn reload(&mut self) -> anyhow::Result<()> {
        self.clips = self.store.get_all()?;
        tracing::trace!(count = self.clips.len(), "reloaded clips");
        Ok(())
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn visible(&self) -> Vec<&Clip> {
        derive(&self.clips, &self.view)
    }

    pub fn get(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    /// Validation happens here, before the store is touched.
    pub fn save(&mut self, clip: NewClip) -> anyhow::Result<ClipId> {
        clip.validate()?;
        let id = self.store.save(clip)?;
        self.reload()?;
        Ok(id)
    }

    pub fn delete(&mut self, id: ClipId) -> anyhow::Result<()> {
        self.store.delete(id)?;
        self.reload()
    }

    pub fn save_image_file(
        &mut self,
        path: &Path,
        tags: &[String],
        memo: Option<String>,
    ) -> anyhow::Result<ClipId> {
        let clip = ingest::image_from_file(path)?
            .with_tags(tags)
            .with_memo(memo);
        self.save(clip)
    }

    /// Classifies and saves each dropped file. Rejections are collected per
    /// file and logged.
    pub fn ingest(&mut self, paths: &[PathBuf], extra_tags: &[String]) -> IngestReport {
        let mut report = IngestReport::default();
        for path in paths {
            let result = ingest::dropped_file(path, extra_tags)
                .map_err(anyhow::Error::from)
                .and_then(|clip| self.save(clip));
            match result {
                Ok(id) => report.saved.push((path.clone(), id)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "file rejected");
                    report.rejected.push((path.clone(), e));
                }
            }
        }
        report
    }

    /// Looks a clip up in the loaded set, falling back to the store.
    pub fn require(&self, id: ClipId) -> anyhow::Result<Clip> {
        if let Some(c) = self.get(id) {
            return Ok(c.clone());
        }
        self.store
            .get(id)?
            .ok_or_else(|| ClipError::NotFound(id).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClipKind, MemStore, SortOrder};
    use assert_matches::assert_matches;

    #[test]
    fn mutations_reload_the_full_set() {
        let store = MemStore::new();
        let mut s = Session::open(&store, ViewState::default()).unwrap();
        assert!(s.visible().is_empty());
        let a = s.save(NewClip::text("alpha")).unwrap();
        let b = s.save(NewClip::text("beta")).unwrap();
        assert_eq!(s.clips().len(), 2);
        s.delete(a).unwrap();
        let ids: Vec<_> = s.visible().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![b]);
    }

    #[test]
    fn empty_text_never_reaches_the_store() {
        let store = MemStore::new();
        let mut s = Session::open(&store, ViewState::default()).unwrap();
        let err = s.save(NewClip::text("   ")).unwrap_err();
        assert_matches!(err.downcast_ref::<ClipError>(), Some(ClipError::EmptyContent));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn view_changes_apply_without_reload() {
        let store = MemStore::new();
        store.save(NewClip::text("one")).unwrap();
        store
            .save(NewClip::image("data:image/png;base64,AA=="))
            .unwrap();
        let mut s = Session::open(&store, ViewState::default()).unwrap();
        s.view.category = Some(ClipKind::Image);
        assert_eq!(s.visible().len(), 1);
        s.view.category = None;
        s.view.sort = SortOrder::Oldest;
        assert_eq!(s.visible()[0].content, "one");
    }

    #[test]
    fn require_reports_missing_ids() {
        let store = MemStore::new();
        let s = Session::open(&store, ViewState::default()).unwrap();
        let err = s.require(42).unwrap_err();
        assert_matches!(err.downcast_ref::<ClipError>(), Some(ClipError::NotFound(42)));
    }
}
