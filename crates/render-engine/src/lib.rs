//! KotakKata Render Engine
//!
//! Turns a [`RenderRequest`](kotak_model::request::RenderRequest) into a
//! finished card and exports it.
//!
//! # Pipeline
//!
//! ```text
//! request ──┬── background: solid fill, then optional cover-fit image
//!           │        (decoded on the blocking pool; failure keeps the fill)
//!           ├── layout: kotak-layout fit + placement
//!           ├── text: halo / drop shadow, then crisp glyphs
//!           ├── overlays: serious caption, sticker (effects cleared)
//!           ▼
//!        Frame ── PNG bytes / data URL / blob ── save, clipboard, share
//! ```

pub mod background;
pub mod compositor;
pub mod export;
pub mod fonts;
pub mod glyphs;
pub mod surface;

pub use compositor::{Compositor, Frame, RenderOutcome};
pub use export::{ClipboardSink, ImageBlob, ShareHost, ShareOutcome, ShareTarget};
pub use fonts::FontBook;
pub use glyphs::{BlockGlyphs, GlyphBackend};
pub use surface::{Surface, TextEffect};
