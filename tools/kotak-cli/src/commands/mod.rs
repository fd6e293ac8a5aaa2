pub mod fonts;
pub mod layout;
pub mod render;
pub mod request;

use std::sync::Arc;

use kotak_common::config::AppConfig;
use kotak_render::{BlockGlyphs, FontBook, GlyphBackend};

/// Font files from the configured directories, or block glyphs when there
/// are none (or when asked for).
pub fn load_glyphs(config: &AppConfig, block_glyphs: bool) -> anyhow::Result<Arc<dyn GlyphBackend>> {
    if block_glyphs {
        return Ok(Arc::new(BlockGlyphs::new()));
    }
    let book = FontBook::from_config(&config.fonts)?;
    if book.is_empty() {
        tracing::warn!("No font files found, drawing block glyphs");
        return Ok(Arc::new(BlockGlyphs::new()));
    }
    Ok(Arc::new(book))
}
