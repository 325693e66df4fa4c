use anyhow::Result;
use clipjar_core::{Clip, ClipId, ClipKind, NewClip, Store};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use time::OffsetDateTime;

enum BackendInit {
    Sqlite(PathBuf),
    Mem,
}

/// Defers opening the backend until the first store call, so commands like
/// `config` never touch the database.
pub struct LazyStore {
    init: Mutex<Option<BackendInit>>, // consumed on first open
    inner: Mutex<Option<Box<dyn Store>>>,
}

impl LazyStore {
    pub fn sqlite(path: PathBuf) -> Self {
        Self::with(BackendInit::Sqlite(path))
    }

    pub fn mem() -> Self {
        Self::with(BackendInit::Mem)
    }

    fn with(init: BackendInit) -> Self {
        Self {
            init: Mutex::new(Some(init)),
            inner: Mutex::new(None),
        }
    }

    fn open(&self) -> Result<MutexGuard<'_, Option<Box<dyn Store>>>> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("store lock poisoned"))?;
        if inner.is_none() {
            let backend = self
                .init
                .lock()
                .map_err(|_| anyhow::anyhow!("store lock poisoned"))?
                .take();
            let store: Box<dyn Store> = match backend {
                Some(BackendInit::Sqlite(path)) => {
                    if let Some(dir) = path.parent() {
                        std::fs::create_dir_all(dir)?;
                    }
                    tracing::debug!(db = %path.display(), "opening sqlite store");
                    Box::new(clipjar_core::SqliteStore::new(&path)?)
                }
                Some(BackendInit::Mem) => Box::new(clipjar_core::MemStore::new()),
                None => anyhow::bail!("store backend failed to open earlier"),
            };
            *inner = Some(store);
        }
        Ok(inner)
    }

    fn with_store<T>(&self, f: impl FnOnce(&dyn Store) -> Result<T>) -> Result<T> {
        let guard = self.open()?;
        match guard.as_deref() {
            Some(store) => f(store),
            None => anyhow::bail!("store not open"),
        }
    }
}

impl Store for LazyStore {
    fn init(&self) -> Result<()> {
        self.with_store(|s| s.init())
    }
    fn save(&self, clip: NewClip) -> Result<ClipId> {
        self.with_store(|s| s.save(clip))
    }
    fn get_all(&self) -> Result<Vec<Clip>> {
        self.with_store(|s| s.get_all())
    }
    fn get(&self, id: ClipId) -> Result<Option<Clip>> {
        self.with_store(|s| s.get(id))
    }
    fn delete(&self, id: ClipId) -> Result<()> {
        self.with_store(|s| s.delete(id))
    }
    fn by_kind(&self, kind: ClipKind) -> Result<Vec<Clip>> {
        self.with_store(|s| s.by_kind(kind))
    }
    fn by_tag(&self, tag: &str) -> Result<Vec<Clip>> {
        self.with_store(|s| s.by_tag(tag))
    }
    fn created_between(&self, from: OffsetDateTime, to: OffsetDateTime) -> Result<Vec<Clip>> {
        self.with_store(|s| s.created_between(from, to))
    }
    fn count(&self) -> Result<usize> {
        self.with_store(|s| s.count())
    }
    fn search(&self, query: &str, kind: Option<ClipKind>) -> Result<Vec<Clip>> {
        self.with_store(|s| s.search(query, kind))
    }
}
