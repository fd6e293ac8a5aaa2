//! Export of a finished frame: PNG bytes, data URL, files, clipboard, share.
//!
//! The output format is fixed to PNG. Clipboard and share go through
//! host-provided traits; every failure is returned to the caller.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use image::{ImageFormat, RgbaImage};
use kotak_common::error::{KotakError, KotakResult};
use serde::Serialize;

/// MIME type of every export.
pub const EXPORT_MIME: &str = "image/png";

/// Prefix of downloaded file names.
pub const DOWNLOAD_PREFIX: &str = "kotakkata";

/// Caption prefilled into share intents.
pub const SHARE_CAPTION: &str = "Made with KotakKata";

const TWITTER_INTENT: &str = "https://twitter.com/intent/tweet?text=";
const WHATSAPP_INTENT: &str = "https://api.whatsapp.com/send?text=";

/// Encoded image bytes with their MIME type, ready for a clipboard or a
/// share sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ImageBlob {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            mime: EXPORT_MIME,
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encode a raster as PNG.
pub fn encode_png(image: &RgbaImage) -> KotakResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| KotakError::export(format!("PNG encoding failed: {e}")))?;
    Ok(bytes)
}

/// `data:image/png;base64,...` for already-encoded PNG bytes.
pub fn to_data_url(png: &[u8]) -> String {
    format!("data:{EXPORT_MIME};base64,{}", STANDARD.encode(png))
}

/// Timestamped download name, e.g. `kotakkata-1718000000000.png`.
pub fn download_file_name(now: DateTime<Utc>) -> String {
    format!("{DOWNLOAD_PREFIX}-{}.png", now.timestamp_millis())
}

/// Write `image` as a PNG into `dir` under its download name.
pub fn save_png(image: &RgbaImage, dir: &Path, now: DateTime<Utc>) -> KotakResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(download_file_name(now));
    std::fs::write(&path, encode_png(image)?)?;
    tracing::info!(path = %path.display(), "Saved image");
    Ok(path)
}

/// Somewhere an image can be copied to.
pub trait ClipboardSink: Send + Sync {
    fn write_image(&self, blob: &ImageBlob) -> KotakResult<()>;
}

/// Host share capabilities. The clipboard is used by the fallback path.
pub trait ShareHost: ClipboardSink {
    /// Whether a native share sheet can take this blob.
    fn supports_native_share(&self, blob: &ImageBlob) -> bool;

    fn share_native(&self, blob: &ImageBlob, file_name: &str, caption: &str) -> KotakResult<()>;

    fn open_url(&self, url: &str) -> KotakResult<()>;
}

/// Where a share should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareTarget {
    Twitter,
    WhatsApp,
    /// Native share sheet only, no web fallback.
    Native,
}

impl ShareTarget {
    /// Prefilled web intent for the target, if it has one.
    pub fn intent_url(self, caption: &str) -> Option<String> {
        let base = match self {
            ShareTarget::Twitter => TWITTER_INTENT,
            ShareTarget::WhatsApp => WHATSAPP_INTENT,
            ShareTarget::Native => return None,
        };
        Some(format!("{base}{}", percent_encode(caption)))
    }
}

/// How a share completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    Native,
    /// Image copied to the clipboard and this intent URL opened.
    Intent { url: String },
}

/// Share `blob`: native sheet when the host has one, otherwise copy to the
/// clipboard and open the target's intent URL.
pub fn share_image(
    blob: &ImageBlob,
    file_name: &str,
    target: ShareTarget,
    host: &dyn ShareHost,
) -> KotakResult<ShareOutcome> {
    if host.supports_native_share(blob) {
        host.share_native(blob, file_name, SHARE_CAPTION)?;
        tracing::info!(?target, "Shared via native sheet");
        return Ok(ShareOutcome::Native);
    }

    let url = target.intent_url(SHARE_CAPTION).ok_or_else(|| {
        KotakError::unsupported("Native share is not available on this host")
    })?;
    host.write_image(blob)?;
    host.open_url(&url)?;
    tracing::info!(?target, url = %url, "Shared via intent URL");
    Ok(ShareOutcome::Intent { url })
}

/// Percent-encode like `encodeURIComponent`.
pub fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
