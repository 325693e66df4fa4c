//! File ingestion: classify files as image or text and turn them into clips.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fs;
use std::path::Path;

use crate::{ClipError, ClipKind, NewClip};

/// Tag attached to every clip created from a dropped file.
pub const DROPPED_TAG: &str = "file";

const IMAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
];

const TEXT_EXTENSIONS: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("text", "text/plain"),
    ("log", "text/plain"),
    ("ini", "text/plain"),
    ("conf", "text/plain"),
    ("md", "text/markdown"),
    ("markdown", "text/markdown"),
    ("csv", "text/csv"),
    ("tsv", "text/tab-separated-values"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "text/javascript"),
    ("ts", "text/plain"),
    ("rs", "text/x-rust"),
    ("py", "text/x-python"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("toml", "application/toml"),
    ("yaml", "application/yaml"),
    ("yml", "application/yaml"),
    ("sh", "application/x-sh"),
];

/// Non-`text/*` MIME types that still carry plain text.
const TEXT_MIME_TYPES: &[&str] = &[
    "application/json",
    "application/xml",
    "application/javascript",
    "application/toml",
    "application/yaml",
    "application/x-sh",
];

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// MIME type implied by the file extension, if it is one we ingest.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = extension(path)?;
    IMAGE_EXTENSIONS
        .iter()
        .chain(TEXT_EXTENSIONS.iter())
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

pub fn classify_mime(mime: &str) -> Option<ClipKind> {
    let mime = mime.trim().to_ascii_lowercase();
    let essence = mime.split(';').next().unwrap_or("").trim();
    if essence.starts_with("image/") {
        Some(ClipKind::Image)
    } else if essence.starts_with("text/") || TEXT_MIME_TYPES.contains(&essence) {
        Some(ClipKind::Text)
    } else {
        None
    }
}

/// Classifies by the MIME hint first, then by extension.
pub fn classify(path: &Path, mime_hint: Option<&str>) -> Option<ClipKind> {
    mime_hint
        .and_then(classify_mime)
        .or_else(|| mime_for_path(path).and_then(classify_mime))
}

/// Preferred file extension for a MIME type (used for download names).
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let mime = mime.trim().to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .chain(TEXT_EXTENSIONS.iter())
        .find(|(_, m)| *m == mime)
        .map(|(ext, _)| *ext)
}

pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Splits a base64 `data:` URI into its MIME type and decoded bytes.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>), ClipError> {
    let rest = uri
        .trim()
        .strip_prefix("data:")
        .ok_or(ClipError::InvalidDataUri)?;
    let (meta, payload) = rest.split_once(',').ok_or(ClipError::InvalidDataUri)?;
    let mut params = meta.split(';');
    let mime = params.next().unwrap_or("").trim().to_ascii_lowercase();
    if mime.is_empty() || !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(ClipError::InvalidDataUri);
    }
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| ClipError::InvalidDataUri)?;
    Ok((mime, bytes))
}

/// A file read from disk and classified, ready to become a clip.
#[derive(Debug, Clone)]
pub struct FileClip {
    pub kind: ClipKind,
    pub mime_type: String,
    pub filename: String,
    pub filesize: u64,
    bytes: Vec<u8>,
}

impl FileClip {
    pub fn into_new_clip(self) -> Result<NewClip, ClipError> {
        let clip = match self.kind {
            ClipKind::Image => NewClip::image(encode_data_uri(&self.mime_type, &self.bytes)),
            ClipKind::Text => {
                let text = String::from_utf8(self.bytes)
                    .map_err(|_| ClipError::NotText(self.filename.clone()))?;
                NewClip::text(text)
            }
        }
        .with_file(self.filename, self.filesize, self.mime_type);
        clip.validate()?;
        Ok(clip)
    }
}

/// Reads and classifies `path`. Files with an unknown extension are sniffed
/// for an image signature before being rejected.
pub fn read_file(path: &Path) -> Result<FileClip, ClipError> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let bytes = fs::read(path).map_err(|source| ClipError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let mime = match mime_for_path(path) {
        Some(mime) => mime,
        None => match image::guess_format(&bytes) {
            Ok(format) => format.to_mime_type(),
            Err(_) => return Err(ClipError::UnsupportedFile(filename)),
        },
    };
    let Some(kind) = classify(path, Some(mime)) else {
        return Err(ClipError::UnsupportedFile(filename));
    };
    tracing::debug!(file = %filename, %kind, %mime, "classified file");
    Ok(FileClip {
        kind,
        mime_type: mime.to_string(),
        filename,
        filesize: bytes.len() as u64,
        bytes,
    })
}

/// Builds an image clip from `path`, rejecting anything that is not an image.
pub fn image_from_file(path: &Path) -> Result<NewClip, ClipError> {
    let file = read_file(path)?;
    if file.kind != ClipKind::Image {
        return Err(ClipError::NotAnImage(file.filename));
    }
    file.into_new_clip()
}

/// Builds a clip for a dropped file, tagged with [`DROPPED_TAG`] and its kind.
pub fn dropped_file(path: &Path, extra_tags: &[String]) -> Result<NewClip, ClipError> {
    let file = read_file(path)?;
    let auto = [DROPPED_TAG, file.kind.as_str()];
    Ok(file
        .into_new_clip()?
        .with_tags(auto)
        .with_tags(extra_tags.iter().filter(|t| !auto.contains(&t.trim()))))
}
