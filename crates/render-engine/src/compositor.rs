//! Frame compositor: background, fitted text, caption and sticker.
//!
//! A render pass is synchronous apart from the optional background decode.
//! Each call to [`Compositor::render`] takes a new generation number; a pass
//! whose generation is no longer the latest when it finishes is discarded, so
//! a slow background load can never overwrite a newer frame. The stored frame
//! is replaced only by a complete pass.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::RgbaImage;
use kotak_common::error::{KotakError, KotakResult};
use kotak_layout::measure::TextMeasurer;
use kotak_layout::place::{layout_request, TextFrame, TextLayout};
use kotak_model::color::Rgba;
use kotak_model::font::FontSpec;
use kotak_model::geometry::{CanvasGeometry, SUPERSAMPLE};
use kotak_model::request::{
    RenderMode, RenderRequest, SERIOUS_CAPTION, SERIOUS_CAPTION_BAND,
    SERIOUS_FONT_FAMILY, SERIOUS_TEXT_COLOR,
};
use parking_lot::Mutex;

use crate::background::load_background;
use crate::export::{self, ClipboardSink, ImageBlob, ShareHost, ShareOutcome, ShareTarget};
use crate::glyphs::GlyphBackend;
use crate::surface::{GlyphRun, Surface, TextEffect};

/// Sticker em size in logical pixels.
pub const STICKER_SIZE: f64 = 48.0;

/// Serious caption em size in working pixels.
pub const CAPTION_FONT_SIZE: f64 = 24.0;

/// Message passed to the quality callback for long texts.
pub const QUALITY_ADVISORY: &str = "Text is quite long; consider shortening it for a cleaner card.";

const SERIOUS_SHADOW: TextEffect = TextEffect::DropShadow {
    color: Rgba::new(0, 0, 0, 26),
    blur: 8.0,
    offset_x: 0.0,
    offset_y: 4.0,
};

const STICKER_SHADOW: TextEffect = TextEffect::DropShadow {
    color: Rgba::new(0, 0, 0, 51),
    blur: 6.0,
    offset_x: 0.0,
    offset_y: 3.0,
};

/// Receives `Some(advice)` for over-long text and `None` otherwise.
pub type QualityCallback = Arc<dyn Fn(Option<&str>) + Send + Sync>;

/// A finished raster and the layout painted into it.
#[derive(Debug)]
pub struct Frame {
    pub generation: u64,
    pub image: RgbaImage,
    /// `None` when the text was blank.
    pub layout: Option<TextLayout>,
}

/// Result of a render call.
#[derive(Debug, Clone)]
pub enum RenderOutcome {
    Rendered(Arc<Frame>),
    /// A newer render started before this one finished; nothing was stored.
    Superseded { generation: u64, latest: u64 },
}

impl RenderOutcome {
    pub fn frame(&self) -> Option<&Arc<Frame>> {
        match self {
            RenderOutcome::Rendered(frame) => Some(frame),
            RenderOutcome::Superseded { .. } => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, RenderOutcome::Superseded { .. })
    }
}

struct Inner {
    glyphs: Arc<dyn GlyphBackend>,
    generation: AtomicU64,
    frame: Mutex<Option<Arc<Frame>>>,
    quality: Mutex<Option<QualityCallback>>,
}

/// Handle to a compositor. Clones share the same frame and generation.
#[derive(Clone)]
pub struct Compositor {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("glyphs", &self.inner.glyphs.name())
            .field("generation", &self.generation())
            .finish()
    }
}

impl Compositor {
    pub fn new(glyphs: Arc<dyn GlyphBackend>) -> Self {
        Self {
            inner: Arc::new(Inner {
                glyphs,
                generation: AtomicU64::new(0),
                frame: Mutex::new(None),
                quality: Mutex::new(None),
            }),
        }
    }

    /// Install the quality advisory callback, replacing any previous one.
    pub fn set_quality_callback(&self, callback: impl Fn(Option<&str>) + Send + Sync + 'static) {
        *self.inner.quality.lock() = Some(Arc::new(callback));
    }

    pub fn glyphs(&self) -> &dyn GlyphBackend {
        self.inner.glyphs.as_ref()
    }

    /// Generation of the most recently started render.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// The last completed frame.
    pub fn current_frame(&self) -> Option<Arc<Frame>> {
        self.inner.frame.lock().clone()
    }

    /// Render `request`, loading its background image first if it has one.
    ///
    /// The generation is taken when this is called, not when the future is
    /// first polled, so call order decides which render is the newest.
    pub fn render(
        &self,
        request: RenderRequest,
    ) -> impl Future<Output = KotakResult<RenderOutcome>> + Send + 'static {
        let generation = self.begin_pass(&request);
        let this = self.clone();
        async move {
            let background = match request.active_background_image() {
                Some(source) => match load_background(source.clone()).await {
                    Ok(image) => Some(image),
                    Err(err) => {
                        tracing::warn!(
                            generation,
                            error = %err,
                            "Background image failed to load, using solid fill"
                        );
                        None
                    }
                },
                None => None,
            };
            this.complete(generation, &request, background.as_ref())
        }
    }

    /// Render synchronously with an already-decoded background.
    pub fn render_now(
        &self,
        request: &RenderRequest,
        background: Option<&RgbaImage>,
    ) -> KotakResult<RenderOutcome> {
        let generation = self.begin_pass(request);
        self.complete(generation, request, background)
    }

    fn begin_pass(&self, request: &RenderRequest) -> u64 {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(generation, mode = ?request.mode, "Render pass started");

        let callback = self.inner.quality.lock().clone();
        if let Some(callback) = callback {
            if request.exceeds_quality_limit() {
                callback(Some(QUALITY_ADVISORY));
            } else {
                callback(None);
            }
        }
        generation
    }

    fn complete(
        &self,
        generation: u64,
        request: &RenderRequest,
        background: Option<&RgbaImage>,
    ) -> KotakResult<RenderOutcome> {
        if let Some(outcome) = self.check_superseded(generation) {
            return Ok(outcome);
        }

        let (image, layout) = paint_request(request, background, self.glyphs())?;
        if let Some(layout) = &layout {
            tracing::debug!(
                generation,
                font_size = layout.fit.font_size,
                lines = layout.fit.lines.len(),
                overflow = layout.fit.overflow,
                "Text laid out"
            );
        }

        let mut slot = self.inner.frame.lock();
        if let Some(outcome) = self.check_superseded(generation) {
            return Ok(outcome);
        }
        let frame = Arc::new(Frame {
            generation,
            image,
            layout,
        });
        *slot = Some(frame.clone());
        Ok(RenderOutcome::Rendered(frame))
    }

    fn check_superseded(&self, generation: u64) -> Option<RenderOutcome> {
        let latest = self.generation();
        if latest != generation {
            tracing::debug!(generation, latest, "Discarding superseded render");
            return Some(RenderOutcome::Superseded { generation, latest });
        }
        None
    }

    fn require_frame(&self) -> KotakResult<Arc<Frame>> {
        self.current_frame()
            .ok_or_else(|| KotakError::export("Nothing has been rendered yet"))
    }

    /// PNG bytes of the current frame.
    pub fn export_png(&self) -> KotakResult<Vec<u8>> {
        export::encode_png(&self.require_frame()?.image)
    }

    pub fn export_data_url(&self) -> KotakResult<String> {
        Ok(export::to_data_url(&self.export_png()?))
    }

    pub fn export_blob(&self) -> KotakResult<ImageBlob> {
        Ok(ImageBlob::png(self.export_png()?))
    }

    pub fn download_file_name(&self, now: DateTime<Utc>) -> String {
        export::download_file_name(now)
    }

    /// Save the current frame into `dir` under a timestamped name.
    pub fn save_png(&self, dir: &Path) -> KotakResult<PathBuf> {
        export::save_png(&self.require_frame()?.image, dir, Utc::now())
    }

    pub fn copy_to_clipboard(&self, sink: &dyn ClipboardSink) -> KotakResult<()> {
        let blob = self.export_blob()?;
        sink.write_image(&blob)?;
        tracing::info!(bytes = blob.len(), "Copied image to clipboard");
        Ok(())
    }

    pub fn share(&self, target: ShareTarget, host: &dyn ShareHost) -> KotakResult<ShareOutcome> {
        let blob = self.export_blob()?;
        export::share_image(&blob, &export::download_file_name(Utc::now()), target, host)
    }
}

/// One full pass: background, text, caption, sticker.
///
/// Blank text stops after the background. Any error aborts the pass before
/// anything is returned, so callers never see a partial raster.
pub fn paint_request(
    request: &RenderRequest,
    background: Option<&RgbaImage>,
    glyphs: &dyn GlyphBackend,
) -> KotakResult<(RgbaImage, Option<TextLayout>)> {
    request.validate()?;
    let geometry = request.geometry();
    let mut surface = Surface::for_geometry(&geometry);

    surface.fill(request.active_background_color());
    if request.mode != RenderMode::Serious {
        if let Some(image) = background {
            surface.draw_cover(image);
        }
    }

    if request.is_blank() {
        return Ok((surface.into_image(), None));
    }

    let layout = layout_request(request, &glyphs)?;

    match request.mode {
        RenderMode::Serious => surface.set_effect(SERIOUS_SHADOW),
        _ => {
            let blur = request.active_blur_level();
            if blur > 0.0 {
                surface.set_effect(TextEffect::Halo { radius: 2.0 * blur });
            }
        }
    }

    let runs: Vec<GlyphRun<'_>> = layout
        .lines
        .iter()
        .flat_map(|line| {
            line.words.iter().map(move |word| GlyphRun {
                text: &word.text,
                x: word.x,
                top: line.y,
            })
        })
        .collect();
    surface.draw_runs(glyphs, &runs, &layout.font, request.active_text_color())?;
    surface.clear_effect();

    if request.mode == RenderMode::Serious {
        paint_caption(&mut surface, glyphs, &geometry, &layout.frame)?;
    }

    if let Some(sticker) = request
        .sticker
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        paint_sticker(&mut surface, glyphs, request, &geometry, sticker)?;
    }

    Ok((surface.into_image(), Some(layout)))
}

fn paint_caption(
    surface: &mut Surface,
    glyphs: &dyn GlyphBackend,
    geometry: &CanvasGeometry,
    frame: &TextFrame,
) -> KotakResult<()> {
    let font = FontSpec::new(SERIOUS_FONT_FAMILY, CAPTION_FONT_SIZE).with_italic(true);
    let width = glyphs.measure_text_width(SERIOUS_CAPTION, &font)?;
    let x = (geometry.width - width) / 2.0;
    let band_top = frame.top + frame.height;
    let top = band_top + (SERIOUS_CAPTION_BAND - CAPTION_FONT_SIZE) / 2.0;
    surface.draw_text(
        glyphs,
        SERIOUS_CAPTION,
        x,
        top,
        &font,
        SERIOUS_TEXT_COLOR.with_opacity(0.6),
    )
}

fn paint_sticker(
    surface: &mut Surface,
    glyphs: &dyn GlyphBackend,
    request: &RenderRequest,
    geometry: &CanvasGeometry,
    sticker: &str,
) -> KotakResult<()> {
    let size = STICKER_SIZE * SUPERSAMPLE;
    let font = request.body_font().at_size(size);
    let width = glyphs.measure_text_width(sticker, &font)?;
    let x = geometry.width - geometry.padding - width;
    let top = geometry.height - geometry.padding - size;

    surface.set_effect(STICKER_SHADOW);
    let painted = surface.draw_text(glyphs, sticker, x, top, &font, request.active_text_color());
    surface.clear_effect();
    painted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontBook;
    use crate::glyphs::BlockGlyphs;
    use kotak_model::geometry::AspectRatio;
    use kotak_model::request::{BackgroundSource, SERIOUS_BACKGROUND};

    fn compositor() -> Compositor {
        Compositor::new(Arc::new(BlockGlyphs::new()))
    }

    fn request(text: &str) -> RenderRequest {
        RenderRequest {
            text: text.to_string(),
            ..RenderRequest::default()
        }
    }

    fn has_color_in(image: &RgbaImage, rows: std::ops::Range<u32>, color: [u8; 4]) -> bool {
        rows.flat_map(|y| (0..image.width()).map(move |x| (x, y)))
            .any(|(x, y)| image.get_pixel(x, y).0 == color)
    }

    #[tokio::test]
    async fn test_blank_text_paints_background_only() {
        let compositor = compositor();
        let outcome = compositor.render(request("   ")).await.unwrap();
        let frame = outcome.frame().unwrap();

        assert_eq!(frame.image.dimensions(), (480, 480));
        assert!(frame.layout.is_none());
        assert!(frame.image.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[tokio::test]
    async fn test_text_is_painted() {
        let compositor = compositor();
        let outcome = compositor
            .render(request("ikan hiu ikan kakap"))
            .await
            .unwrap();
        let frame = outcome.frame().unwrap();
        let layout = frame.layout.as_ref().unwrap();

        assert_eq!(layout.fit.joined_text(), "ikan hiu ikan kakap");
        assert!(frame.image.pixels().any(|p| p.0 == [0, 0, 0, 255]));
    }

    #[tokio::test]
    async fn test_newer_render_supersedes_older() {
        let compositor = compositor();
        let stale = compositor.render(request("first"));
        let fresh = compositor.render(request("second"));

        let fresh = fresh.await.unwrap();
        assert_eq!(fresh.frame().unwrap().generation, 2);

        let stale = stale.await.unwrap();
        assert!(stale.is_superseded());
        assert!(matches!(
            stale,
            RenderOutcome::Superseded {
                generation: 1,
                latest: 2
            }
        ));

        let current = compositor.current_frame().unwrap();
        assert_eq!(current.generation, 2);
        assert_eq!(
            current.layout.as_ref().unwrap().fit.joined_text(),
            "second"
        );
    }

    #[tokio::test]
    async fn test_broken_background_falls_back_to_fill() {
        let compositor = compositor();
        let req = RenderRequest {
            background_color: Rgba::rgb(0x12, 0x34, 0x56),
            background_image: Some(BackgroundSource::Encoded(b"not an image".to_vec())),
            ..request("")
        };
        let outcome = compositor.render(req).await.unwrap();
        let image = &outcome.frame().unwrap().image;
        assert!(image.pixels().all(|p| p.0 == [0x12, 0x34, 0x56, 0xff]));
    }

    #[test]
    fn test_background_image_covers_canvas() {
        let compositor = compositor();
        let background = RgbaImage::from_pixel(30, 90, image::Rgba([0, 200, 0, 255]));
        let outcome = compositor
            .render_now(&request(""), Some(&background))
            .unwrap();
        let image = &outcome.frame().unwrap().image;
        assert!(image.pixels().all(|p| p.0 == [0, 200, 0, 255]));
    }

    #[test]
    fn test_serious_ignores_background_image() {
        let compositor = compositor();
        let background = RgbaImage::from_pixel(10, 10, image::Rgba([255, 0, 0, 255]));
        let req = RenderRequest {
            mode: RenderMode::Serious,
            ..request("")
        };
        let outcome = compositor.render_now(&req, Some(&background)).unwrap();
        let corner = outcome.frame().unwrap().image.get_pixel(0, 0).0;
        assert_eq!(corner, SERIOUS_BACKGROUND.to_array());
    }

    #[test]
    fn test_serious_paints_caption_in_bottom_band() {
        let compositor = compositor();
        let caption_rows = 400..424;

        let normal = compositor.render_now(&request("hi"), None).unwrap();
        let normal_image = &normal.frame().unwrap().image;
        assert!(normal_image
            .enumerate_pixels()
            .filter(|(_, y, _)| caption_rows.contains(y))
            .all(|(_, _, p)| p.0 == [255, 255, 255, 255]));

        let serious = RenderRequest {
            mode: RenderMode::Serious,
            ..request("hi")
        };
        let outcome = compositor.render_now(&serious, None).unwrap();
        let image = &outcome.frame().unwrap().image;
        let background = SERIOUS_BACKGROUND.to_array();
        assert!(image
            .enumerate_pixels()
            .filter(|(_, y, _)| caption_rows.contains(y))
            .any(|(_, _, p)| p.0 != background));
    }

    #[test]
    fn test_sticker_lands_bottom_right() {
        let compositor = compositor();
        let plain = compositor.render_now(&request("hi"), None).unwrap();
        assert_eq!(plain.frame().unwrap().image.get_pixel(400, 390).0, [255; 4]);

        let with_sticker = RenderRequest {
            sticker: Some("🗿".to_string()),
            ..request("hi")
        };
        let outcome = compositor.render_now(&with_sticker, None).unwrap();
        let image = &outcome.frame().unwrap().image;
        assert_eq!(image.get_pixel(400, 390).0, [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(20, 390).0, [255; 4]);
    }

    /// Bounding box `(x0, y0, x1, y1)`, inclusive, of pixels exactly `color`
    /// within `rows`.
    fn color_bounds(image: &RgbaImage, rows: std::ops::Range<u32>, color: [u8; 4]) -> (u32, u32, u32, u32) {
        let hits: Vec<(u32, u32)> = rows
            .flat_map(|y| (0..image.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| image.get_pixel(x, y).0 == color)
            .collect();
        assert!(!hits.is_empty(), "no {color:?} pixels found");
        (
            hits.iter().map(|h| h.0).min().unwrap(),
            hits.iter().map(|h| h.1).min().unwrap(),
            hits.iter().map(|h| h.0).max().unwrap(),
            hits.iter().map(|h| h.1).max().unwrap(),
        )
    }

    #[test]
    fn test_blur_does_not_reach_sticker() {
        let red = [255, 0, 0, 255];
        let req = RenderRequest {
            text_color: Rgba::rgb(255, 0, 0),
            blur_level: 4.0,
            sticker: Some("🗿".to_string()),
            ..request("hi")
        };
        let outcome = compositor().render_now(&req, None).unwrap();
        let image = &outcome.frame().unwrap().image;

        let (x0, y0, x1, y1) = color_bounds(image, 330..480, red);
        let neutral = |x: u32, y: u32| {
            let [r, g, b, _] = image.get_pixel(x, y).0;
            r == g && g == b
        };
        for d in 1..=4 {
            for y in y0..=y1 {
                assert!(neutral(x0 - d, y), "left of sticker at ({}, {y})", x0 - d);
                assert!(neutral(x1 + d, y), "right of sticker at ({}, {y})", x1 + d);
            }
            for x in x0..=x1 {
                assert!(neutral(x, y0 - d), "above sticker at ({x}, {})", y0 - d);
                assert!(neutral(x, y1 + d), "below sticker at ({x}, {})", y1 + d);
            }
        }

        // The sticker's own shadow falls below it.
        let below = image.get_pixel((x0 + x1) / 2, y1 + 2).0;
        assert!(below[0] < 255, "missing sticker shadow: {below:?}");
    }

    #[test]
    fn test_serious_uses_drop_shadow_not_halo() {
        let ink = [0x1a, 0x1a, 0x1a, 255];
        let req = RenderRequest {
            mode: RenderMode::Serious,
            text_color: Rgba::rgb(255, 0, 0),
            blur_level: 4.0,
            ..request("halo dunia")
        };
        let outcome = compositor().render_now(&req, None).unwrap();
        let image = &outcome.frame().unwrap().image;

        assert!(image
            .pixels()
            .all(|p| (p.0[0] as i32 - p.0[2] as i32).abs() <= 6));

        // Rows above the caption band.
        let (_, top, _, bottom) = color_bounds(image, 0..390, ink);
        let mid_of_row = |y: u32| {
            let xs: Vec<u32> = (0..image.width())
                .filter(|&x| image.get_pixel(x, y).0 == ink)
                .take_while({
                    let mut last = None;
                    move |&x| {
                        let contiguous = last.map_or(true, |l: u32| x == l + 1);
                        last = Some(x);
                        contiguous
                    }
                })
                .collect();
            xs[xs.len() / 2]
        };
        let above = image.get_pixel(mid_of_row(top), top - 2).0[0];
        let below = image.get_pixel(mid_of_row(bottom), bottom + 2).0[0];
        assert!(
            below as i32 + 8 <= above as i32,
            "shadow should fall below the text: above {above}, below {below}"
        );
    }

    #[test]
    fn test_invalid_request_fails_and_keeps_previous_frame() {
        let compositor = compositor();
        compositor.render_now(&request("ok"), None).unwrap();

        let req = RenderRequest {
            max_font_size: f64::NAN,
            ..request("tidak")
        };
        let err = compositor.render_now(&req, None).unwrap_err();
        assert!(matches!(err, KotakError::Config { .. }));
        assert_eq!(compositor.current_frame().unwrap().generation, 1);
    }

    #[test]
    fn test_blank_sticker_is_skipped() {
        let compositor = compositor();
        let req = RenderRequest {
            sticker: Some("  ".to_string()),
            ..request("hi")
        };
        let outcome = compositor.render_now(&req, None).unwrap();
        assert!(!has_color_in(&outcome.frame().unwrap().image, 340..420, [0, 0, 0, 255]));
    }

    #[test]
    fn test_story_aspect_sets_height() {
        let compositor = compositor();
        let req = RenderRequest {
            aspect_ratio: AspectRatio::Story,
            ..request("tall")
        };
        let outcome = compositor.render_now(&req, None).unwrap();
        assert_eq!(outcome.frame().unwrap().image.dimensions(), (480, 853));
    }

    #[test]
    fn test_missing_font_aborts_and_keeps_previous_frame() {
        let compositor = Compositor::new(Arc::new(FontBook::new()));
        let first = compositor.render_now(&request(""), None).unwrap();
        assert_eq!(first.frame().unwrap().generation, 1);

        let err = compositor.render_now(&request("hello"), None).unwrap_err();
        assert!(err.is_dependency_unavailable());
        assert_eq!(compositor.current_frame().unwrap().generation, 1);
    }

    #[test]
    fn test_quality_callback_fires_every_render() {
        let compositor = compositor();
        let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::default();
        let sink = seen.clone();
        compositor.set_quality_callback(move |advice| sink.lock().push(advice.map(String::from)));

        compositor.render_now(&request("short"), None).unwrap();
        compositor
            .render_now(&request(&"kata ".repeat(60)), None)
            .unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], None);
        assert_eq!(seen[1].as_deref(), Some(QUALITY_ADVISORY));
    }

    #[test]
    fn test_export_requires_a_frame() {
        let compositor = compositor();
        assert!(matches!(
            compositor.export_png().unwrap_err(),
            KotakError::Export { .. }
        ));

        compositor.render_now(&request("ok"), None).unwrap();
        let png = compositor.export_png().unwrap();
        assert!(png.starts_with(b"\x89PNG"));
        assert!(compositor
            .export_data_url()
            .unwrap()
            .starts_with("data:image/png;base64,"));
        assert_eq!(compositor.export_blob().unwrap().mime, "image/png");
    }

    #[test]
    fn test_clones_share_state() {
        let compositor = compositor();
        let other = compositor.clone();
        other.render_now(&request("shared"), None).unwrap();
        assert_eq!(compositor.generation(), 1);
        assert!(compositor.current_frame().is_some());
    }
}
