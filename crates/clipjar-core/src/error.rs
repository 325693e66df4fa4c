use thiserror::Error;

use crate::ClipId;

/// Domain errors raised before or around store calls. Storage engine
/// failures travel as `anyhow::Error` through the `Store` trait.
#[derive(Debug, Error)]
pub enum ClipError {
    #[error("clip content must not be empty")]
    EmptyContent,
    #[error("image content must be a base64 data URI")]
    InvalidDataUri,
    #[error("unknown clip type `{0}` (expected text or image)")]
    UnknownKind(String),
    #[error("unknown sort order `{0}` (expected newest or oldest)")]
    UnknownSort(String),
    #[error("unsupported file type: {0}")]
    UnsupportedFile(String),
    #[error("{0} is not an image")]
    NotAnImage(String),
    #[error("{0} is not valid UTF-8 text")]
    NotText(String),
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("clip {0} not found")]
    NotFound(ClipId),
}
