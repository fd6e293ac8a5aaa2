//! Shrink-to-fit: choose the largest font size whose wrap fits the area.

use kotak_common::error::KotakResult;
use kotak_model::font::FontSpec;
use kotak_model::geometry::SUPERSAMPLE;
use kotak_model::request::{RenderMode, RenderRequest, SERIOUS_CAPTION_BAND};
use serde::Serialize;

use crate::measure::{MeasuredWords, TextMeasurer};
use crate::weird;
use crate::wrap::{avoid_orphan, greedy_wrap, widest_line, LineRange};

/// Font sizes step down by this many working pixels per candidate.
pub const SIZE_STEP: f64 = 2.0;

/// Leading multiplier for normal mode.
pub const NORMAL_LINE_HEIGHT: f64 = 1.25;
/// Leading multiplier for serious mode.
pub const SERIOUS_LINE_HEIGHT: f64 = 1.6;

/// Line-breaking and leading policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "mode")]
pub enum LayoutStyle {
    Normal,
    Serious,
    Weird { level: u8, seed: i64 },
}

impl LayoutStyle {
    pub fn from_request(request: &RenderRequest) -> Self {
        match request.mode {
            RenderMode::Normal => LayoutStyle::Normal,
            RenderMode::Serious => LayoutStyle::Serious,
            RenderMode::Weird => LayoutStyle::Weird {
                level: request.weirdness(),
                seed: request.random_seed,
            },
        }
    }

    /// Line height as a multiple of font size.
    pub fn line_height_factor(&self) -> f64 {
        match self {
            LayoutStyle::Normal => NORMAL_LINE_HEIGHT,
            LayoutStyle::Serious => SERIOUS_LINE_HEIGHT,
            LayoutStyle::Weird { level, .. } => weird::line_height_factor(*level),
        }
    }

    pub fn line_height(&self, font_size: f64) -> f64 {
        font_size * self.line_height_factor()
    }

    /// Whether the block's final line is justified like the others.
    pub fn justifies_last_line(&self) -> bool {
        matches!(self, LayoutStyle::Weird { .. })
    }
}

/// Everything the fit loop needs, in working-resolution pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSpec {
    pub max_width: f64,
    pub max_height: f64,
    pub max_font_size: f64,
    pub min_font_size: f64,
    /// Face to measure with; its size is replaced per candidate.
    pub font: FontSpec,
    pub style: LayoutStyle,
}

impl LayoutSpec {
    /// Derive the spec from a request: supersample, subtract padding, reserve
    /// the serious caption band and apply the serious font override.
    pub fn from_request(request: &RenderRequest) -> Self {
        let geometry = request.geometry();
        let style = LayoutStyle::from_request(request);
        let band = match style {
            LayoutStyle::Serious => SERIOUS_CAPTION_BAND,
            _ => 0.0,
        };
        Self {
            max_width: geometry.content_width(),
            max_height: (geometry.content_height() - band).max(0.0),
            max_font_size: request.max_font_size * SUPERSAMPLE,
            min_font_size: request.min_font_size * SUPERSAMPLE,
            font: request.body_font(),
            style,
        }
    }
}

/// One laid-out line of words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    pub words: Vec<String>,
}

impl Line {
    pub fn text(&self) -> String {
        self.words.join(" ")
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// The chosen size and line breaks for one render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitResult {
    pub font_size: f64,
    pub line_height: f64,
    pub lines: Vec<Line>,
    /// True when no candidate fit and the minimum-size fallback was used
    /// with a block taller than the available height.
    pub overflow: bool,
}

impl FitResult {
    fn empty(spec: &LayoutSpec) -> Self {
        Self {
            font_size: spec.max_font_size,
            line_height: spec.style.line_height(spec.max_font_size),
            lines: Vec::new(),
            overflow: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.lines.iter().map(Line::len).sum()
    }

    /// All words re-joined with single spaces.
    pub fn joined_text(&self) -> String {
        self.lines
            .iter()
            .map(Line::text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Total height of the text block.
    pub fn block_height(&self) -> f64 {
        self.lines.len() as f64 * self.line_height
    }
}

/// Font sizes to try, largest first: `max, max-2, ...`, ending with `min`.
///
/// Only `min` is yielded when either bound is not finite or `max <= min`.
pub fn candidate_sizes(max_font_size: f64, min_font_size: f64) -> impl Iterator<Item = f64> {
    let steps = if max_font_size.is_finite()
        && min_font_size.is_finite()
        && max_font_size > min_font_size
    {
        ((max_font_size - min_font_size) / SIZE_STEP).ceil() as u64
    } else {
        0
    };
    (0..steps)
        .map(move |i| max_font_size - SIZE_STEP * i as f64)
        .chain(std::iter::once(min_font_size))
}

/// Fit a request's text into its canvas.
pub fn fit(request: &RenderRequest, measurer: &dyn TextMeasurer) -> KotakResult<FitResult> {
    request.validate()?;
    fit_text(&request.text, &LayoutSpec::from_request(request), measurer)
}

/// Fit `text` into the area described by `spec`.
///
/// Never fails for layout reasons: when nothing fits, the minimum size is
/// used and the block may overflow vertically. Errors only come from the
/// measurer.
pub fn fit_text(
    text: &str,
    spec: &LayoutSpec,
    measurer: &dyn TextMeasurer,
) -> KotakResult<FitResult> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Ok(FitResult::empty(spec));
    }

    let forced = match spec.style {
        LayoutStyle::Weird { level, seed } => Some(weird::group_words(words.len(), level, seed)),
        _ => None,
    };

    for size in candidate_sizes(spec.max_font_size, spec.min_font_size) {
        let measured = MeasuredWords::measure(&words, &spec.font.at_size(size), measurer)?;
        let line_height = spec.style.line_height(size);

        let lines = match &forced {
            Some(groups) => {
                if widest_line(groups, &measured) > spec.max_width {
                    continue;
                }
                groups.clone()
            }
            None => {
                let Some(mut lines) = greedy_wrap(&measured, spec.max_width, true) else {
                    continue;
                };
                if spec.style == LayoutStyle::Normal {
                    avoid_orphan(&mut lines, &measured, spec.max_width);
                }
                lines
            }
        };

        if lines.len() as f64 * line_height <= spec.max_height {
            tracing::debug!(
                font_size = size,
                lines = lines.len(),
                style = ?spec.style,
                "Text fits"
            );
            return Ok(build(&words, &lines, size, line_height, false));
        }
    }

    let size = spec.min_font_size;
    let line_height = spec.style.line_height(size);
    let lines = match forced {
        Some(groups) => groups,
        None => {
            let measured = MeasuredWords::measure(&words, &spec.font.at_size(size), measurer)?;
            greedy_wrap(&measured, spec.max_width, false).unwrap_or_default()
        }
    };
    let overflow = lines.len() as f64 * line_height > spec.max_height;
    tracing::debug!(
        font_size = size,
        lines = lines.len(),
        overflow,
        "No candidate size fits, using minimum"
    );
    Ok(build(&words, &lines, size, line_height, overflow))
}

fn build(
    words: &[&str],
    lines: &[LineRange],
    font_size: f64,
    line_height: f64,
    overflow: bool,
) -> FitResult {
    FitResult {
        font_size,
        line_height,
        lines: lines
            .iter()
            .map(|range| Line {
                words: words[range.clone()].iter().map(|w| w.to_string()).collect(),
            })
            .collect(),
        overflow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kotak_common::error::KotakError;

    /// Every character 0.5em, so widths are easy to compute by hand.
    struct HalfEm;

    impl TextMeasurer for HalfEm {
        fn measure_text_width(&self, text: &str, font: &FontSpec) -> KotakResult<f64> {
            Ok(text.chars().count() as f64 * 0.5 * font.size_px)
        }
    }

    struct Unavailable;

    impl TextMeasurer for Unavailable {
        fn measure_text_width(&self, _text: &str, font: &FontSpec) -> KotakResult<f64> {
            Err(KotakError::dependency(format!("no face for {}", font.family)))
        }
    }

    fn spec(max_width: f64, max_height: f64, style: LayoutStyle) -> LayoutSpec {
        LayoutSpec {
            max_width,
            max_height,
            max_font_size: 20.0,
            min_font_size: 10.0,
            font: FontSpec::new("Test", 0.0),
            style,
        }
    }

    #[test]
    fn test_candidate_sizes_inclusive() {
        let sizes = |max, min| candidate_sizes(max, min).collect::<Vec<f64>>();
        assert_eq!(sizes(84.0, 28.0).len(), 29);
        assert_eq!(sizes(20.0, 10.0), vec![20.0, 18.0, 16.0, 14.0, 12.0, 10.0]);
        assert_eq!(sizes(21.0, 10.0).last(), Some(&10.0));
        assert_eq!(sizes(21.0, 10.0)[5], 11.0);
        assert_eq!(sizes(20.0, 19.0), vec![20.0, 19.0]);
        assert_eq!(sizes(10.0, 10.0), vec![10.0]);
        assert_eq!(sizes(8.0, 10.0), vec![10.0]);
    }

    #[test]
    fn test_candidate_sizes_with_unbounded_max() {
        assert_eq!(candidate_sizes(f64::NAN, 28.0).collect::<Vec<_>>(), vec![28.0]);
        assert_eq!(candidate_sizes(f64::INFINITY, 28.0).collect::<Vec<_>>(), vec![28.0]);
        let mut huge = candidate_sizes(1e300, 28.0);
        assert_eq!(huge.next(), Some(1e300));
    }

    #[test]
    fn test_empty_text_gives_no_lines() {
        for text in ["", "   ", "\n\t"] {
            let result = fit_text(text, &spec(100.0, 100.0, LayoutStyle::Normal), &HalfEm).unwrap();
            assert!(result.is_empty());
            assert!(!result.overflow);
        }
    }

    #[test]
    fn test_single_short_word_uses_max_size() {
        let result = fit_text("hi", &spec(100.0, 100.0, LayoutStyle::Normal), &HalfEm).unwrap();
        assert_eq!(result.font_size, 20.0);
        assert_eq!(result.line_height, 25.0);
        assert_eq!(result.lines.len(), 1);
    }

    #[test]
    fn test_shrinks_until_height_fits() {
        // "aaaa" at size s is 2s wide, space 0.5s. Width 100:
        // s=20: 40 + 10 + 40 = 90 -> 2 per line -> 2 lines * 25 = 50 > 40
        // s=18: 36 + 9 + 36 = 81 -> 2 lines * 22.5 = 45 > 40
        // s=16: 32 + 8 + 32 + 8 + 32 = 112 > 100 -> 2 lines * 20 = 40 <= 40
        let result = fit_text(
            "aaaa aaaa aaaa aaaa",
            &spec(100.0, 40.0, LayoutStyle::Normal),
            &HalfEm,
        )
        .unwrap();
        assert_eq!(result.font_size, 16.0);
        assert_eq!(result.lines.len(), 2);
        assert!(!result.overflow);
    }

    #[test]
    fn test_oversized_word_falls_back_to_minimum() {
        // 30 chars at min size 10 is 150 wide, never fits 100
        let long = "x".repeat(30);
        let text = format!("a {long} b");
        let result = fit_text(&text, &spec(100.0, 1000.0, LayoutStyle::Normal), &HalfEm).unwrap();
        assert_eq!(result.font_size, 10.0);
        let lines: Vec<String> = result.lines.iter().map(Line::text).collect();
        assert_eq!(lines, vec!["a".to_string(), long, "b".to_string()]);
        assert!(!result.overflow);
    }

    #[test]
    fn test_fallback_reports_overflow() {
        let text = "aaaa ".repeat(40);
        let result = fit_text(&text, &spec(100.0, 20.0, LayoutStyle::Normal), &HalfEm).unwrap();
        assert_eq!(result.font_size, 10.0);
        assert!(result.overflow);
        assert_eq!(result.word_count(), 40);
    }

    #[test]
    fn test_serious_uses_taller_leading() {
        let result = fit_text("hi", &spec(100.0, 100.0, LayoutStyle::Serious), &HalfEm).unwrap();
        assert!((result.line_height - 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_weird_keeps_forced_grouping() {
        let style = LayoutStyle::Weird { level: 3, seed: 42 };
        let result = fit_text("a b c d e f", &spec(1000.0, 1000.0, style), &HalfEm).unwrap();
        let lines: Vec<String> = result.lines.iter().map(Line::text).collect();
        assert_eq!(lines, vec!["a b c d e", "f"]);
        assert_eq!(result.font_size, 20.0);
        assert!((result.line_height - 20.0 * 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_weird_shrinks_for_widest_line() {
        // "a b c d e" is 9 chars -> 4.5s; at width 50 the first fit is s=10
        let style = LayoutStyle::Weird { level: 3, seed: 42 };
        let result = fit_text("a b c d e f", &spec(50.0, 1000.0, style), &HalfEm).unwrap();
        assert_eq!(result.font_size, 10.0);
        assert_eq!(result.lines.len(), 2);
        assert!(!result.overflow);
    }

    #[test]
    fn test_measurer_failure_propagates() {
        let err = fit_text("hello", &spec(100.0, 100.0, LayoutStyle::Normal), &Unavailable)
            .unwrap_err();
        assert!(err.is_dependency_unavailable());
    }

    #[test]
    fn test_fit_rejects_unbounded_font_size() {
        let request = RenderRequest {
            text: "halo dunia".to_string(),
            max_font_size: 1e300,
            ..RenderRequest::default()
        };
        let err = fit(&request, &HalfEm).unwrap_err();
        assert!(matches!(err, KotakError::Config { .. }));
    }

    #[test]
    fn test_spec_from_request_supersamples() {
        let request = RenderRequest::default();
        let spec = LayoutSpec::from_request(&request);
        assert_eq!(spec.max_width, 384.0);
        assert_eq!(spec.max_height, 384.0);
        assert_eq!(spec.max_font_size, 84.0);
        assert_eq!(spec.min_font_size, 28.0);
        assert_eq!(spec.style, LayoutStyle::Normal);
    }

    #[test]
    fn test_spec_from_serious_request_reserves_band() {
        let request = RenderRequest {
            mode: RenderMode::Serious,
            font_family: "Impact".to_string(),
            ..RenderRequest::default()
        };
        let spec = LayoutSpec::from_request(&request);
        assert_eq!(spec.max_height, 384.0 - SERIOUS_CAPTION_BAND);
        assert_eq!(spec.font.family, "Merriweather");
        assert_eq!(spec.style.line_height_factor(), SERIOUS_LINE_HEIGHT);
    }
}
