use anyhow::Result;
use std::process::{Command, Stdio};

/// Decoded RGBA pixels, the form the system clipboard accepts for images.
#[derive(Debug, Clone)]
pub struct ImageRgba {
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

pub trait Clipboard {
    fn set_text(&self, text: &str) -> Result<()>;
    fn set_image(&self, img: &ImageRgba) -> Result<()>;
}

/// The OS clipboard via arboard, with command line tools as a fallback.
#[derive(Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        copy_text(text)
    }
    fn set_image(&self, img: &ImageRgba) -> Result<()> {
        copy_image(img)
    }
}

#[cfg(target_os = "macos")]
const TEXT_FALLBACKS: &[(&str, &[&str])] = &[("pbcopy", &[])];
#[cfg(target_os = "windows")]
const TEXT_FALLBACKS: &[(&str, &[&str])] = &[("clip", &[])];
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const TEXT_FALLBACKS: &[(&str, &[&str])] =
    &[("xclip", &["-selection", "clipboard"]), ("xsel", &["-b"])];

fn arboard_text(text: &str) -> Result<()> {
    let mut cb = arboard::Clipboard::new()?;
    cb.set_text(text.to_string())?;
    Ok(())
}

fn try_prog_bytes(prog: &str, args: &[&str], input: &[u8]) -> Result<bool> {
    let mut child = match Command::new(prog)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(c) => c,
        Err(_) => return Ok(false),
    };
    if let Some(mut stdin) = child.stdin.take() {
        use std::io::Write as _;
        let _ = stdin.write_all(input);
    }
    let status = child.wait()?;
    Ok(status.success())
}

pub fn copy_text(text: &str) -> Result<()> {
    #[cfg(target_os = "linux")]
    {
        if std::env::var_os("WAYLAND_DISPLAY").is_some()
            && try_prog_bytes("wl-copy", &[], text.as_bytes())?
        {
            return Ok(());
        }
    }
    if let Err(e) = arboard_text(text) {
        tracing::debug!(error = %e, "arboard text copy failed, trying helpers");
        for (prog, args) in TEXT_FALLBACKS {
            if try_prog_bytes(prog, args, text.as_bytes())? {
                return Ok(());
            }
        }
        return Err(e);
    }
    Ok(())
}

pub fn copy_image(img: &ImageRgba) -> Result<()> {
    #[cfg(target_os = "linux")]
    {
        use image::ImageEncoder;
        if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            let mut buf = Vec::new();
            image::codecs::png::PngEncoder::new(&mut buf).write_image(
                &img.bytes,
                img.width,
                img.height,
                image::ExtendedColorType::Rgba8,
            )?;
            if try_prog_bytes("wl-copy", &["-t", "image/png"], &buf)? {
                return Ok(());
            }
        }
    }
    let mut cb = arboard::Clipboard::new()?;
    cb.set_image(arboard::ImageData {
        width: img.width as usize,
        height: img.height as usize,
        bytes: std::borrow::Cow::Borrowed(&img.bytes),
    })?;
    Ok(())
}
