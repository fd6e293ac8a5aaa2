//! Canvas geometry: aspect ratios, supersampling, and cover fitting.
//!
//! Logical sizes are display pixels as picked in the UI. Everything the
//! layout engine and the compositor touch is in working-resolution pixels,
//! i.e. logical size times [`SUPERSAMPLE`].

use serde::{Deserialize, Serialize};

/// Fixed working-resolution multiplier over the logical display size.
pub const SUPERSAMPLE: f64 = 2.0;

/// Output aspect ratio. Width is always the independent dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectRatio {
    /// 1:1.
    #[default]
    Square,
    /// 9:16, for stories.
    #[serde(alias = "tall")]
    Story,
}

impl AspectRatio {
    /// Height for the given width.
    pub fn height_for(self, width: f64) -> f64 {
        match self {
            AspectRatio::Square => width,
            AspectRatio::Story => width * 16.0 / 9.0,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "square" | "1:1" => Some(Self::Square),
            "story" | "tall" | "9:16" => Some(Self::Story),
            _ => None,
        }
    }
}

/// An axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

/// Destination rectangle that scales a `src_w x src_h` image uniformly so it
/// covers `target` completely, centered. Overflow on one axis is cropped by
/// the target bounds; the image is never letterboxed.
pub fn cover_fit(src_w: f64, src_h: f64, target: &Rect) -> Rect {
    if src_w <= 0.0 || src_h <= 0.0 {
        return *target;
    }
    let scale = (target.w / src_w).max(target.h / src_h);
    let w = src_w * scale;
    let h = src_h * scale;
    Rect {
        x: target.x + (target.w - w) / 2.0,
        y: target.y + (target.h - h) / 2.0,
        w,
        h,
    }
}

/// Canvas dimensions at working resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasGeometry {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl CanvasGeometry {
    /// Geometry for a logical width and padding, supersampled.
    pub fn from_logical(width: f64, padding: f64, aspect: AspectRatio) -> Self {
        let width = width * SUPERSAMPLE;
        Self {
            width,
            height: aspect.height_for(width),
            padding: padding * SUPERSAMPLE,
        }
    }

    /// Surface size in whole pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            self.width.round().max(1.0) as u32,
            self.height.round().max(1.0) as u32,
        )
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Width available for text: container width minus padding on both sides.
    pub fn content_width(&self) -> f64 {
        (self.width - 2.0 * self.padding).max(0.0)
    }

    /// Height available for text before any reserved band.
    pub fn content_height(&self) -> f64 {
        (self.height - 2.0 * self.padding).max(0.0)
    }
}
