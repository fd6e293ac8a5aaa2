//! Background image loading.
//!
//! Decoding is CPU-bound, so the async entry point hands it to the blocking
//! pool. Callers treat any error here as "no image" and keep the solid fill.

use image::RgbaImage;
use kotak_common::error::{KotakError, KotakResult};
use kotak_model::request::BackgroundSource;

/// Decode a background source into an RGBA raster.
pub fn decode_background(source: &BackgroundSource) -> KotakResult<RgbaImage> {
    let decoded = match source {
        BackgroundSource::Path(path) => {
            if !path.exists() {
                return Err(KotakError::FileNotFound { path: path.clone() });
            }
            image::open(path).map_err(|e| {
                KotakError::image_load(format!("Failed to decode {}: {e}", path.display()))
            })?
        }
        BackgroundSource::Encoded(bytes) => image::load_from_memory(bytes)
            .map_err(|e| KotakError::image_load(format!("Failed to decode image bytes: {e}")))?,
    };

    let image = decoded.to_rgba8();
    if image.width() == 0 || image.height() == 0 {
        return Err(KotakError::image_load("Background image is empty"));
    }
    Ok(image)
}

/// Decode on the blocking pool.
pub async fn load_background(source: BackgroundSource) -> KotakResult<RgbaImage> {
    tokio::task::spawn_blocking(move || decode_background(&source))
        .await
        .map_err(|e| KotakError::image_load(format!("Background decode task failed: {e}")))?
}
