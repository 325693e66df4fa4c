//! clipjar-core: clip types, the record store trait, and the in-memory store

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use time::OffsetDateTime;

pub mod error;
pub mod ingest;
pub mod session;
pub mod view;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use error::ClipError;
pub use session::Session;
pub use view::{derive, SortOrder, ViewState};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

pub type ClipId = i64;

/// A persisted text or image snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: ClipId,
    #[serde(rename = "type")]
    pub kind: ClipKind,
    /// Raw text, or a base64 `data:` URI for images.
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Clip {
    /// Case-insensitive substring match against content, memo, or any tag.
    /// `needle` must already be lowercase; an empty needle matches everything.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.content.to_lowercase().contains(needle)
            || self
                .memo
                .as_deref()
                .map(|m| m.to_lowercase().contains(needle))
                .unwrap_or(false)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }

    /// Single-line summary for list output.
    pub fn preview(&self, max: usize) -> String {
        let s = match self.kind {
            ClipKind::Text => self.content.replace(['\n', '\r', '\t'], " "),
            ClipKind::Image => {
                let name = self.filename.as_deref().unwrap_or("image");
                match self.mime_type.as_deref() {
                    Some(mime) => format!("[{}] {}", mime, name),
                    None => format!("[image] {}", name),
                }
            }
        };
        if s.chars().count() > max {
            let cut: String = s.chars().take(max).collect();
            format!("{}…", cut)
        } else {
            s
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ClipKind {
    Text,
    Image,
}

impl ClipKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ClipKind::Text => "text",
            ClipKind::Image => "image",
        }
    }
}

impl fmt::Display for ClipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClipKind {
    type Err = ClipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ClipKind::Text),
            "image" => Ok(ClipKind::Image),
            other => Err(ClipError::UnknownKind(other.to_string())),
        }
    }
}

/// Insert payload: a clip before the store assigns its id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClip {
    pub kind: ClipKind,
    pub content: String,
    pub tags: Vec<String>,
    pub memo: Option<String>,
    pub filename: Option<String>,
    pub filesize: Option<u64>,
    pub mime_type: Option<String>,
}

impl NewClip {
    pub fn text<S: Into<String>>(content: S) -> Self {
        Self::with_kind(ClipKind::Text, content.into())
    }

    /// `data_uri` must be a base64 `data:image/...` URI.
    pub fn image<S: Into<String>>(data_uri: S) -> Self {
        Self::with_kind(ClipKind::Image, data_uri.into())
    }

    fn with_kind(kind: ClipKind, content: String) -> Self {
        Self {
            kind,
            content,
            tags: Vec::new(),
            memo: None,
            filename: None,
            filesize: None,
            mime_type: None,
        }
    }

    /// Appends tags in the given order, trimming each and dropping empties.
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.tags.extend(
            tags.into_iter()
                .map(|t| t.as_ref().trim().to_string())
                .filter(|t| !t.is_empty()),
        );
        self
    }

    pub fn with_memo<S: Into<String>>(mut self, memo: Option<S>) -> Self {
        self.memo = memo
            .map(Into::into)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        self
    }

    pub fn with_file(mut self, filename: String, filesize: u64, mime_type: String) -> Self {
        self.filename = Some(filename);
        self.filesize = Some(filesize);
        self.mime_type = Some(mime_type);
        self
    }

    /// Checks the payload before any store mutation happens.
    pub fn validate(&self) -> Result<(), ClipError> {
        if self.content.trim().is_empty() {
            return Err(ClipError::EmptyContent);
        }
        if self.kind == ClipKind::Image {
            let (mime, _) = ingest::decode_data_uri(&self.content)?;
            if !mime.starts_with("image/") {
                return Err(ClipError::InvalidDataUri);
            }
        }
        Ok(())
    }

    pub(crate) fn into_clip(self, id: ClipId, at: OffsetDateTime) -> Clip {
        Clip {
            id,
            kind: self.kind,
            content: self.content,
            tags: self.tags,
            memo: self.memo,
            filename: self.filename,
            filesize: self.filesize,
            mime_type: self.mime_type,
            created_at: at,
            updated_at: at,
        }
    }
}

/// Splits a comma separated tag list: `"a, b"` becomes `["a", "b"]`.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub trait Store: Send + Sync {
    fn init(&self) -> anyhow::Result<()> {
        Ok(())
    }
    /// Validates, stamps and inserts `clip`, returning the new id.
    fn save(&self, clip: NewClip) -> anyhow::Result<ClipId>;
    /// Every record. Callers impose their own order.
    fn get_all(&self) -> anyhow::Result<Vec<Clip>>;
    fn get(&self, id: ClipId) -> anyhow::Result<Option<Clip>>;
    /// Removing an id that does not exist is a no-op.
    fn delete(&self, id: ClipId) -> anyhow::Result<()>;
    // Secondary lookups
    fn by_kind(&self, kind: ClipKind) -> anyhow::Result<Vec<Clip>>;
    fn by_tag(&self, tag: &str) -> anyhow::Result<Vec<Clip>>;
    fn created_between(
        &self,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> anyhow::Result<Vec<Clip>>;

    fn count(&self) -> anyhow::Result<usize> {
        Ok(self.get_all()?.len())
    }

    /// In-memory filter over `get_all`, not an indexed query.
    fn search(&self, query: &str, kind: Option<ClipKind>) -> anyhow::Result<Vec<Clip>> {
        let needle = query.trim().to_lowercase();
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|c| kind.map(|k| c.kind == k).unwrap_or(true))
            .filter(|c| c.matches_lowercase(&needle))
            .collect())
    }
}

/// In-process store with the same semantics as the SQLite backend.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<MemInner>,
}

#[derive(Default)]
struct MemInner {
    clips: BTreeMap<ClipId, Clip>,
    last_id: ClipId,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, MemInner>> {
        self.inner
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))
    }

    fn select<F>(&self, pred: F) -> anyhow::Result<Vec<Clip>>
    where
        F: Fn(&Clip) -> bool,
    {
        Ok(self
            .lock()?
            .clips
            .values()
            .filter(|c| pred(c))
            .cloned()
            .collect())
    }
}

impl Store for MemStore {
    fn save(&self, clip: NewClip) -> anyhow::Result<ClipId> {
        clip.validate()?;
        let mut inner = self.lock()?;
        inner.last_id += 1;
        let id = inner.last_id;
        let kind = clip.kind;
        inner.clips.insert(id, clip.into_clip(id, now_utc_millis()));
        tracing::debug!(id, %kind, "saved clip (memory)");
        Ok(id)
    }

    fn get_all(&self) -> anyhow::Result<Vec<Clip>> {
        self.select(|_| true)
    }

    fn get(&self, id: ClipId) -> anyhow::Result<Option<Clip>> {
        Ok(self.lock()?.clips.get(&id).cloned())
    }

    fn delete(&self, id: ClipId) -> anyhow::Result<()> {
        if self.lock()?.clips.remove(&id).is_none() {
            tracing::debug!(id, "delete of missing clip ignored");
        }
        Ok(())
    }

    fn by_kind(&self, kind: ClipKind) -> anyhow::Result<Vec<Clip>> {
        self.select(|c| c.kind == kind)
    }

    fn by_tag(&self, tag: &str) -> anyhow::Result<Vec<Clip>> {
        self.select(|c| c.tags.iter().any(|t| t == tag))
    }

    fn created_between(
        &self,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> anyhow::Result<Vec<Clip>> {
        self.select(|c| c.created_at >= from && c.created_at <= to)
    }

    fn count(&self) -> anyhow::Result<usize> {
        Ok(self.lock()?.clips.len())
    }
}

#[cfg(feature = "sqlite")]
pub use SqliteStore as StoreImpl;

#[cfg(not(feature = "sqlite"))]
pub use MemStore as StoreImpl;

#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub current: i64,
    pub latest: i64,
    pub pending: Vec<String>,
}

#[allow(dead_code)]
pub(crate) fn parse_version_prefix(name: &str) -> Option<u32> {
    let digits: String = name.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse::<u32>().ok()
    }
}

/// Current UTC time truncated to the millisecond precision the stores keep.
pub(crate) fn now_utc_millis() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(now.nanosecond() / 1_000_000 * 1_000_000)
        .unwrap_or(now)
}

#[allow(dead_code)]
pub(crate) fn to_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

#[allow(dead_code)]
pub(crate) fn from_millis(ms: i64) -> anyhow::Result<OffsetDateTime> {
    Ok(OffsetDateTime::from_unix_timestamp_nanos(
        ms as i128 * 1_000_000,
    )?)
}
