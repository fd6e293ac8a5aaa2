//! Glyph rasterization backends.
//!
//! A [`GlyphBackend`] is a [`TextMeasurer`] that can also turn text into
//! pixel coverage. Layout and painting go through the same backend so that
//! measured widths and drawn glyphs always agree.

use image::{Pixel, RgbaImage};
use kotak_common::error::KotakResult;
use kotak_layout::measure::{MetricTableMeasurer, TextMeasurer};
use kotak_model::color::Rgba;
use kotak_model::font::FontSpec;

/// Receives one covered pixel: `(x, y, coverage in 0..=1)`.
pub type CoveragePlot<'a> = dyn FnMut(i32, i32, f32) + 'a;

/// Measures and rasterizes text.
pub trait GlyphBackend: TextMeasurer {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Rasterize `text` with its em box top-left at `(x, top)`.
    fn rasterize(
        &self,
        text: &str,
        x: f64,
        top: f64,
        font: &FontSpec,
        plot: &mut CoveragePlot<'_>,
    ) -> KotakResult<()>;

    /// Draw `text` onto `image` in `color`, blending by coverage.
    fn draw_text(
        &self,
        image: &mut RgbaImage,
        text: &str,
        x: f64,
        top: f64,
        font: &FontSpec,
        color: Rgba,
    ) -> KotakResult<()> {
        self.rasterize(text, x, top, font, &mut |px, py, coverage| {
            blend_pixel(image, px, py, color, coverage)
        })
    }
}

/// Source-over blend of `color` at `coverage` into one pixel. Out-of-bounds
/// coordinates are ignored.
pub fn blend_pixel(image: &mut RgbaImage, x: i32, y: i32, color: Rgba, coverage: f32) {
    if x < 0 || y < 0 || x as u32 >= image.width() || y as u32 >= image.height() {
        return;
    }
    let alpha = (color.a as f32 * coverage.clamp(0.0, 1.0)).round() as u8;
    if alpha == 0 {
        return;
    }
    image
        .get_pixel_mut(x as u32, y as u32)
        .blend(&image::Rgba([color.r, color.g, color.b, alpha]));
}

/// Font-file-free backend: metric-table widths, glyphs drawn as solid boxes.
///
/// Used for headless previews and tests where no face is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockGlyphs {
    metrics: MetricTableMeasurer,
}

impl BlockGlyphs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TextMeasurer for BlockGlyphs {
    fn measure_text_width(&self, text: &str, font: &FontSpec) -> KotakResult<f64> {
        self.metrics.measure_text_width(text, font)
    }
}

impl GlyphBackend for BlockGlyphs {
    fn name(&self) -> &str {
        "block"
    }

    fn rasterize(
        &self,
        text: &str,
        x: f64,
        top: f64,
        font: &FontSpec,
        plot: &mut CoveragePlot<'_>,
    ) -> KotakResult<()> {
        let size = font.size_px;
        let y0 = (top + 0.2 * size).round() as i32;
        let y1 = (top + 0.85 * size).round() as i32;

        let mut caret = x;
        let mut buf = [0u8; 4];
        for c in text.chars() {
            let advance = self.metrics.measure_text_width(c.encode_utf8(&mut buf), font)?;
            if !c.is_whitespace() {
                let x0 = (caret + 0.08 * advance).round() as i32;
                let x1 = (caret + 0.92 * advance).round() as i32;
                for py in y0..y1 {
                    for px in x0..x1 {
                        plot(px, py, 1.0);
                    }
                }
            }
            caret += advance;
        }
        Ok(())
    }
}
