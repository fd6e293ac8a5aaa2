//! The render request: one immutable snapshot of everything a pass needs.
//!
//! The shell builds a fresh `RenderRequest` on every input change and hands
//! it to the compositor. Nothing in here is mutated during a pass.

use std::path::{Path, PathBuf};

use kotak_common::config::CanvasDefaults;
use kotak_common::error::{KotakError, KotakResult};
use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::font::{FontSpec, FontWeight};
use crate::geometry::{AspectRatio, CanvasGeometry};

/// Face forced by serious mode.
pub const SERIOUS_FONT_FAMILY: &str = "Merriweather";
/// Text color forced by serious mode.
pub const SERIOUS_TEXT_COLOR: Rgba = Rgba::rgb(0x1a, 0x1a, 0x1a);
/// Background forced by serious mode.
pub const SERIOUS_BACKGROUND: Rgba = Rgba::rgb(0xfa, 0xf9, 0xf6);
/// Caption painted under the quote in serious mode.
pub const SERIOUS_CAPTION: &str = "— Anonim";
/// Height reserved at the bottom of the text area for the caption (working px).
pub const SERIOUS_CAPTION_BAND: f64 = 40.0;
/// Upward shift of the centered text block in serious mode (working px).
pub const SERIOUS_VERTICAL_SHIFT: f64 = 20.0;

/// Texts longer than this many characters trigger the quality advisory.
pub const QUALITY_ALERT_CHARS: usize = 250;

/// Weirdness levels accepted by weird mode.
pub const WEIRDNESS_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Presentation mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Shrink-to-fit, justified, orphan-avoiding.
    #[default]
    Normal,
    /// Seeded chaotic line grouping.
    Weird,
    /// Fixed serif face and palette with a caption.
    Serious,
}

impl RenderMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "weird" => Some(Self::Weird),
            "serious" => Some(Self::Serious),
            _ => None,
        }
    }
}

/// Where the optional background image comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundSource {
    /// Image file on disk.
    Path(PathBuf),
    /// Encoded image bytes already in memory (e.g. an upload).
    #[serde(skip)]
    Encoded(Vec<u8>),
}

/// A full description of one card to render.
///
/// Sizes here are logical (display) pixels; see [`CanvasGeometry`] for the
/// working-resolution view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderRequest {
    pub text: String,

    /// Logical canvas width; height follows from `aspect_ratio`.
    pub width: f64,
    pub aspect_ratio: AspectRatio,
    pub padding: f64,

    /// Largest font size tried (logical px).
    pub max_font_size: f64,
    /// Smallest font size tried, and the overflow fallback (logical px).
    pub min_font_size: f64,

    pub font_family: String,
    pub font_weight: FontWeight,

    pub mode: RenderMode,
    /// 1..=5, only read in weird mode.
    pub weirdness_level: u8,
    /// Only read in weird mode.
    pub random_seed: i64,

    pub background_color: Rgba,
    pub text_color: Rgba,
    pub background_image: Option<BackgroundSource>,
    pub sticker: Option<String>,
    pub blur_level: f64,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self::from_canvas(&CanvasDefaults::default(), String::new())
            .unwrap_or_else(|_| Self::fallback())
    }
}

impl RenderRequest {
    /// Build a request from configured canvas defaults.
    pub fn from_defaults(defaults: &CanvasDefaults, text: impl Into<String>) -> KotakResult<Self> {
        Self::from_canvas(defaults, text.into())
    }

    fn from_canvas(defaults: &CanvasDefaults, text: String) -> KotakResult<Self> {
        let background_color = Rgba::from_hex(&defaults.background_color)
            .map_err(|e| KotakError::config(format!("background_color: {e}")))?;
        let text_color = Rgba::from_hex(&defaults.text_color)
            .map_err(|e| KotakError::config(format!("text_color: {e}")))?;

        Ok(Self {
            text,
            width: defaults.width as f64,
            aspect_ratio: AspectRatio::Square,
            padding: defaults.padding,
            max_font_size: defaults.max_font_size,
            min_font_size: defaults.min_font_size,
            font_family: defaults.font_family.clone(),
            font_weight: FontWeight::Normal,
            mode: RenderMode::Normal,
            weirdness_level: 3,
            random_seed: 0,
            background_color,
            text_color,
            background_image: None,
            sticker: None,
            blur_level: 0.0,
        })
    }

    fn fallback() -> Self {
        Self {
            text: String::new(),
            width: 240.0,
            aspect_ratio: AspectRatio::Square,
            padding: 24.0,
            max_font_size: 42.0,
            min_font_size: 14.0,
            font_family: "Arial".to_string(),
            font_weight: FontWeight::Normal,
            mode: RenderMode::Normal,
            weirdness_level: 3,
            random_seed: 0,
            background_color: Rgba::WHITE,
            text_color: Rgba::BLACK,
            background_image: None,
            sticker: None,
            blur_level: 0.0,
        }
    }

    /// Load a request from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: &Path) -> KotakResult<Self> {
        if !path.exists() {
            return Err(KotakError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let request: Self = serde_json::from_str(&content)?;
        request.validate()?;
        Ok(request)
    }

    /// Reject geometry and font ranges no pass could render.
    pub fn validate(&self) -> KotakResult<()> {
        if !(self.width > 0.0 && self.width.is_finite()) {
            return Err(KotakError::config("width must be positive and finite"));
        }
        if !(self.padding >= 0.0) || 2.0 * self.padding >= self.width {
            return Err(KotakError::config(
                "padding must be non-negative and leave room for text",
            ));
        }
        if !(self.min_font_size > 0.0) {
            return Err(KotakError::config("min_font_size must be positive"));
        }
        if !(self.max_font_size <= self.width) {
            return Err(KotakError::config(format!(
                "max_font_size {} must be finite and no larger than the width {}",
                self.max_font_size, self.width
            )));
        }
        if self.min_font_size > self.max_font_size {
            return Err(KotakError::config(format!(
                "min_font_size {} exceeds max_font_size {}",
                self.min_font_size, self.max_font_size
            )));
        }
        if self.blur_level < 0.0 || !self.blur_level.is_finite() {
            return Err(KotakError::config("blur_level must be >= 0"));
        }
        Ok(())
    }

    /// Working-resolution canvas geometry.
    pub fn geometry(&self) -> CanvasGeometry {
        CanvasGeometry::from_logical(self.width, self.padding, self.aspect_ratio)
    }

    /// Whitespace-delimited words; runs of whitespace collapse.
    pub fn words(&self) -> Vec<&str> {
        self.text.split_whitespace().collect()
    }

    /// Trimmed text with every whitespace run collapsed to one space.
    pub fn normalized_text(&self) -> String {
        self.words().join(" ")
    }

    /// Whether there is nothing to lay out.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Weirdness level clamped into [`WEIRDNESS_RANGE`].
    pub fn weirdness(&self) -> u8 {
        self.weirdness_level
            .clamp(*WEIRDNESS_RANGE.start(), *WEIRDNESS_RANGE.end())
    }

    /// Family actually used for body text.
    pub fn active_font_family(&self) -> &str {
        match self.mode {
            RenderMode::Serious => SERIOUS_FONT_FAMILY,
            _ => &self.font_family,
        }
    }

    /// Body text face without a size.
    pub fn body_font(&self) -> FontSpec {
        FontSpec::new(self.active_font_family(), 0.0).with_weight(self.font_weight)
    }

    pub fn active_text_color(&self) -> Rgba {
        match self.mode {
            RenderMode::Serious => SERIOUS_TEXT_COLOR,
            _ => self.text_color,
        }
    }

    pub fn active_background_color(&self) -> Rgba {
        match self.mode {
            RenderMode::Serious => SERIOUS_BACKGROUND,
            _ => self.background_color,
        }
    }

    /// Background image to draw, if any. Serious mode never draws one.
    pub fn active_background_image(&self) -> Option<&BackgroundSource> {
        match self.mode {
            RenderMode::Serious => None,
            _ => self.background_image.as_ref(),
        }
    }

    /// Blur level after mode overrides; serious mode disables blur.
    pub fn active_blur_level(&self) -> f64 {
        match self.mode {
            RenderMode::Serious => 0.0,
            _ => self.blur_level.max(0.0),
        }
    }

    /// Whether the quality advisory applies to this text.
    pub fn exceeds_quality_limit(&self) -> bool {
        self.text.chars().count() > QUALITY_ALERT_CHARS
    }
}
