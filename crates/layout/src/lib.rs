//! KotakKata Layout Engine
//!
//! Given text, a fixed drawing area and a presentation mode, picks a font
//! size and line breaks that fill the area:
//! - **Normal:** Shrink-to-fit greedy wrap with orphan avoidance
//! - **Weird:** Seeded chaotic line grouping, then shrink-to-fit
//! - **Serious:** Greedy wrap with taller leading and a reserved caption band
//!
//! This crate is pure computation. Glyph metrics come exclusively through
//! the [`TextMeasurer`] seam, so the engine runs against any rasterizer.

pub mod fit;
pub mod measure;
pub mod place;
pub mod weird;
pub mod wrap;

pub use fit::{candidate_sizes, fit, fit_text, FitResult, LayoutSpec, LayoutStyle, Line};
pub use measure::{MetricTableMeasurer, TextMeasurer};
pub use place::{layout_request, place_lines, PlacedLine, PlacedWord, TextFrame, TextLayout};
