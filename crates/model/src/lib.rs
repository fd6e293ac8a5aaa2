//! KotakKata Model
//!
//! Defines the data contracts shared by the layout engine and compositor:
//! - **Request:** One immutable snapshot of text and style per render pass
//! - **Geometry:** Logical vs. working-resolution canvas dimensions, cover fit
//! - **Fonts:** Font specs and the picker catalog
//! - **Colors:** Hex-parsed RGBA colors
//!
//! Logical sizes are what the user picks; the compositor renders at a fixed
//! 2x supersample of them.

pub mod color;
pub mod font;
pub mod geometry;
pub mod request;

pub use color::*;
pub use font::*;
pub use geometry::*;
pub use request::*;
