//! The drawing surface for one render pass.
//!
//! Holds the raster plus the active text effect. Effects are explicit state:
//! set before painting text, cleared before any overlay, so nothing bleeds
//! from one paint step into the next.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use imageproc::filter::gaussian_blur_f32;
use kotak_common::error::KotakResult;
use kotak_model::color::Rgba;
use kotak_model::font::FontSpec;
use kotak_model::geometry::{cover_fit, CanvasGeometry, Rect};

use crate::glyphs::GlyphBackend;

/// Soft treatment painted under text.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TextEffect {
    #[default]
    None,
    /// Blurred copy of the glyphs in the text's own color.
    Halo { radius: f64 },
    /// Blurred, offset copy of the glyphs in a fixed color.
    DropShadow {
        color: Rgba,
        blur: f64,
        offset_x: f64,
        offset_y: f64,
    },
}

/// One run of text with its em box top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphRun<'a> {
    pub text: &'a str,
    pub x: f64,
    pub top: f64,
}

/// RGBA raster plus text-effect state.
#[derive(Debug, Clone)]
pub struct Surface {
    image: RgbaImage,
    effect: TextEffect,
}

impl Surface {
    /// A fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width.max(1), height.max(1)),
            effect: TextEffect::None,
        }
    }

    pub fn for_geometry(geometry: &CanvasGeometry) -> Self {
        let (width, height) = geometry.pixel_size();
        Self::new(width, height)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width() as f64, self.height() as f64)
    }

    pub fn fill(&mut self, color: Rgba) {
        let pixel = image::Rgba(color.to_array());
        for p in self.image.pixels_mut() {
            *p = pixel;
        }
    }

    /// Draw `source` scaled to cover the whole surface, centered and cropped.
    pub fn draw_cover(&mut self, source: &RgbaImage) {
        let target = cover_fit(source.width() as f64, source.height() as f64, &self.bounds());
        let w = target.w.round().max(1.0) as u32;
        let h = target.h.round().max(1.0) as u32;
        let scaled = imageops::resize(source, w, h, FilterType::Triangle);
        imageops::overlay(
            &mut self.image,
            &scaled,
            target.x.round() as i64,
            target.y.round() as i64,
        );
    }

    pub fn effect(&self) -> TextEffect {
        self.effect
    }

    pub fn set_effect(&mut self, effect: TextEffect) {
        self.effect = effect;
    }

    pub fn clear_effect(&mut self) {
        self.effect = TextEffect::None;
    }

    /// Paint runs in `color`, with the active effect underneath.
    pub fn draw_runs(
        &mut self,
        glyphs: &dyn GlyphBackend,
        runs: &[GlyphRun<'_>],
        font: &FontSpec,
        color: Rgba,
    ) -> KotakResult<()> {
        self.paint_effect(glyphs, runs, font, color)?;
        for run in runs {
            glyphs.draw_text(&mut self.image, run.text, run.x, run.top, font, color)?;
        }
        Ok(())
    }

    pub fn draw_text(
        &mut self,
        glyphs: &dyn GlyphBackend,
        text: &str,
        x: f64,
        top: f64,
        font: &FontSpec,
        color: Rgba,
    ) -> KotakResult<()> {
        self.draw_runs(glyphs, &[GlyphRun { text, x, top }], font, color)
    }

    fn paint_effect(
        &mut self,
        glyphs: &dyn GlyphBackend,
        runs: &[GlyphRun<'_>],
        font: &FontSpec,
        text_color: Rgba,
    ) -> KotakResult<()> {
        let (color, blur, dx, dy) = match self.effect {
            TextEffect::None => return Ok(()),
            TextEffect::Halo { radius } => (text_color, radius, 0.0, 0.0),
            TextEffect::DropShadow {
                color,
                blur,
                offset_x,
                offset_y,
            } => (color, blur, offset_x, offset_y),
        };

        // Constant color channels, coverage in alpha only, so blurring
        // never shifts the hue.
        let [r, g, b, a] = color.to_array();
        let (width, height) = self.image.dimensions();
        let mut layer = RgbaImage::from_pixel(width, height, image::Rgba([r, g, b, 0]));
        for run in runs {
            glyphs.rasterize(run.text, run.x + dx, run.top + dy, font, &mut |px, py, coverage| {
                if px < 0 || py < 0 || px as u32 >= width || py as u32 >= height {
                    return;
                }
                let alpha = (a as f32 * coverage.clamp(0.0, 1.0)).round() as u8;
                let pixel = layer.get_pixel_mut(px as u32, py as u32);
                if alpha > pixel.0[3] {
                    pixel.0[3] = alpha;
                }
            })?;
        }

        let sigma = (blur / 2.0) as f32;
        if sigma > 0.0 {
            layer = gaussian_blur_f32(&layer, sigma);
        }
        imageops::overlay(&mut self.image, &layer, 0, 0);
        Ok(())
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}
