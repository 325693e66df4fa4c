use anyhow::{Context, Result};
use clipjar_core::ingest::{decode_data_uri, extension_for_mime};
use clipjar_core::{Clip, ClipError, ClipKind};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::copy_helpers::{Clipboard, ImageRgba};

/// Puts a clip on the clipboard: text as-is, images decoded to RGBA.
pub fn copy_clip(clip: &Clip, clipboard: &dyn Clipboard) -> Result<()> {
    match clip.kind {
        ClipKind::Text => clipboard.set_text(&clip.content)?,
        ClipKind::Image => {
            let (mime, bytes) = decode_data_uri(&clip.content)?;
            let img = image::load_from_memory(&bytes)
                .with_context(|| format!("cannot decode {} for the clipboard", mime))?
                .to_rgba8();
            let (width, height) = img.dimensions();
            clipboard.set_image(&ImageRgba {
                width,
                height,
                bytes: img.into_raw(),
            })?;
        }
    }
    tracing::info!(id = clip.id, kind = %clip.kind, "copied clip");
    Ok(())
}

/// Default file name for a downloaded image: the stored name, else
/// `clip-<id>.<ext>`.
pub fn download_name(clip: &Clip, mime: &str) -> String {
    clip.filename
        .as_deref()
        .and_then(|n| Path::new(n).file_name())
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| {
            format!(
                "clip-{}.{}",
                clip.id,
                extension_for_mime(mime).unwrap_or("bin")
            )
        })
}

/// Writes the original image bytes. `out` may name a file or a directory;
/// without it the file lands in `dir`.
pub fn download_clip(clip: &Clip, dir: &Path, out: Option<&Path>) -> Result<PathBuf> {
    if clip.kind != ClipKind::Image {
        return Err(ClipError::NotAnImage(format!("clip {}", clip.id)).into());
    }
    let (mime, bytes) = decode_data_uri(&clip.content)?;
    let target = match out {
        Some(p) if p.is_dir() => p.join(download_name(clip, &mime)),
        Some(p) => p.to_path_buf(),
        None => dir.join(download_name(clip, &mime)),
    };
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    std::fs::write(&target, &bytes).with_context(|| format!("write {}", target.display()))?;
    tracing::info!(id = clip.id, path = %target.display(), "downloaded image");
    Ok(target)
}

pub fn format_time(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.unix_timestamp().to_string())
}

pub fn rel_time(at: OffsetDateTime) -> String {
    let delta = (OffsetDateTime::now_utc() - at).whole_seconds();
    if delta < 60 {
        return "just now".into();
    }
    let minutes = delta / 60;
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{}d ago", days);
    }
    let weeks = days / 7;
    if weeks < 5 {
        return format!("{}w ago", weeks);
    }
    let date = at.date();
    format!("{}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}

pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Full preview: a metadata header, then the text itself. Images show their
/// file details and pixel size instead.
pub fn render_preview(clip: &Clip) -> String {
    let mut lines = vec![
        format!("id: {}", clip.id),
        format!("type: {}", clip.kind),
        format!("created: {}", format_time(clip.created_at)),
    ];
    if !clip.tags.is_empty() {
        lines.push(format!("tags: {}", clip.tags.join(", ")));
    }
    if let Some(memo) = &clip.memo {
        lines.push(format!("memo: {}", memo));
    }
    if let Some(name) = &clip.filename {
        lines.push(format!("file: {}", name));
    }
    if let Some(size) = clip.filesize {
        lines.push(format!("size: {}", human_size(size)));
    }
    if let Some(mime) = &clip.mime_type {
        lines.push(format!("mime: {}", mime));
    }
    match clip.kind {
        ClipKind::Text => {
            lines.push(String::new());
            lines.push(clip.content.clone());
        }
        ClipKind::Image => {
            let dims = decode_data_uri(&clip.content)
                .ok()
                .and_then(|(_, bytes)| image::load_from_memory(&bytes).ok())
                .map(|img| format!("{}x{}", img.width(), img.height()));
            lines.push(format!(
                "dimensions: {}",
                dims.as_deref().unwrap_or("unknown")
            ));
        }
    }
    lines.join("\n")
}

/// One tab separated line per clip for `list` and `search`.
pub fn card_line(clip: &Clip) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        clip.id,
        clip.kind,
        format_time(clip.created_at),
        clip.tags.join(","),
        clip.preview(60)
    )
}
