//! The text measurement seam, plus a font-file-free implementation.
//!
//! The engine learns glyph metrics only through [`TextMeasurer`]. An `Err`
//! from a measurer means the capability is unavailable (no face for the
//! family, no backend) and aborts the whole layout.

use std::sync::Arc;

use kotak_common::error::KotakResult;
use kotak_model::font::{family_key, FontSpec, FontWeight};

/// Measures the advance width of a run of text.
pub trait TextMeasurer: Send + Sync {
    /// Width in pixels of `text` set in `font` at `font.size_px`.
    fn measure_text_width(&self, text: &str, font: &FontSpec) -> KotakResult<f64>;
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for Arc<T> {
    fn measure_text_width(&self, text: &str, font: &FontSpec) -> KotakResult<f64> {
        (**self).measure_text_width(text, font)
    }
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for &T {
    fn measure_text_width(&self, text: &str, font: &FontSpec) -> KotakResult<f64> {
        (**self).measure_text_width(text, font)
    }
}

/// Word widths for one candidate size, measured once and reused.
#[derive(Debug, Clone)]
pub struct MeasuredWords {
    pub widths: Vec<f64>,
    pub space: f64,
}

impl MeasuredWords {
    pub fn measure(
        words: &[&str],
        font: &FontSpec,
        measurer: &dyn TextMeasurer,
    ) -> KotakResult<Self> {
        let space = measurer.measure_text_width(" ", font)?;
        let widths = words
            .iter()
            .map(|w| measurer.measure_text_width(w, font))
            .collect::<KotakResult<Vec<_>>>()?;
        Ok(Self { widths, space })
    }

    /// Natural width of words `range` joined by single spaces.
    pub fn run_width(&self, range: std::ops::Range<usize>) -> f64 {
        let n = range.len();
        if n == 0 {
            return 0.0;
        }
        self.widths[range].iter().sum::<f64>() + self.space * (n - 1) as f64
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static metric tables
// ────────────────────────────────────────────────────────────────────────────

/// Glyph classes the static tables distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricClass {
    Sans,
    Serif,
    Mono,
}

impl MetricClass {
    /// Guess the class from a family name.
    pub fn for_family(family: &str) -> Self {
        let key = family_key(family);
        if key.contains("mono") || key.contains("courier") || key.contains("code") {
            MetricClass::Mono
        } else if (key.contains("serif") && !key.contains("sans"))
            || SERIF_FAMILIES.contains(&key.as_str())
        {
            MetricClass::Serif
        } else {
            MetricClass::Sans
        }
    }
}

const SERIF_FAMILIES: [&str; 6] = [
    "merriweather",
    "timesnewroman",
    "times",
    "georgia",
    "garamond",
    "ebgaramond",
];

/// Advance widths in 1/1000 em for ASCII 0x20..=0x7E.
/// Index = (char as usize) - 32.
#[rustfmt::skip]
const SANS_WIDTHS: [u16; 95] = [
    // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // :    ;    <    =    >    ?    @
    278, 278, 584, 584, 584, 556, 1015,
    // A-M
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    // N-Z
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [    \    ]    ^    _    `
    278, 278, 278, 469, 556, 333,
    // a-m
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    // n-z
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // {    |    }    ~
    334, 260, 334, 584,
];

#[rustfmt::skip]
const SERIF_WIDTHS: [u16; 95] = [
    // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    // 0-9
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    // :    ;    <    =    >    ?    @
    278, 278, 564, 564, 564, 444, 921,
    // A-M
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
    // N-Z
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
    // [    \    ]    ^    _    `
    333, 278, 333, 469, 500, 333,
    // a-m
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
    // n-z
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
    // {    |    }    ~
    480, 200, 480, 541,
];

const MONO_WIDTH: u16 = 600;

/// Fallback width for characters outside the tables.
const SANS_AVERAGE: u16 = 556;
const SERIF_AVERAGE: u16 = 500;

/// Bold faces run wider than regular ones by roughly this factor.
const BOLD_WIDTH_FACTOR: f64 = 1.06;

/// Deterministic measurer backed by static per-character width tables.
///
/// No kerning, no shaping: widths are the sum of per-character advances.
/// Good enough for previews and for layout tests that must not depend on
/// installed fonts.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricTableMeasurer;

impl MetricTableMeasurer {
    pub fn new() -> Self {
        Self
    }

    /// Width of one character in em units.
    pub fn char_em(class: MetricClass, c: char) -> f64 {
        let code = c as usize;
        let per_mille = match class {
            MetricClass::Mono => MONO_WIDTH,
            MetricClass::Sans if (32..=126).contains(&code) => SANS_WIDTHS[code - 32],
            MetricClass::Serif if (32..=126).contains(&code) => SERIF_WIDTHS[code - 32],
            MetricClass::Sans => SANS_AVERAGE,
            MetricClass::Serif => SERIF_AVERAGE,
        };
        per_mille as f64 / 1000.0
    }

    /// Width of a string in em units, before weight adjustment.
    pub fn measure_em(class: MetricClass, text: &str) -> f64 {
        text.chars().map(|c| Self::char_em(class, c)).sum()
    }
}

impl TextMeasurer for MetricTableMeasurer {
    fn measure_text_width(&self, text: &str, font: &FontSpec) -> KotakResult<f64> {
        let class = MetricClass::for_family(&font.family);
        let weight = match font.weight {
            FontWeight::Normal => 1.0,
            FontWeight::Bold => BOLD_WIDTH_FACTOR,
        };
        Ok(Self::measure_em(class, text) * font.size_px * weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arial(size: f64) -> FontSpec {
        FontSpec::new("Arial", size)
    }

    #[test]
    fn test_empty_string_is_zero() {
        let w = MetricTableMeasurer.measure_text_width("", &arial(40.0)).unwrap();
        assert_eq!(w, 0.0);
    }

    #[test]
    fn test_space_width_scales_with_size() {
        let m = MetricTableMeasurer;
        let small = m.measure_text_width(" ", &arial(10.0)).unwrap();
        let large = m.measure_text_width(" ", &arial(100.0)).unwrap();
        assert!((small - 2.78).abs() < 1e-9);
        assert!((large - 27.8).abs() < 1e-9);
    }

    #[test]
    fn test_known_word_width() {
        // "Rust" = R(722) + u(556) + s(500) + t(278) = 2056 per mille
        let w = MetricTableMeasurer
            .measure_text_width("Rust", &arial(100.0))
            .unwrap();
        assert!((w - 205.6).abs() < 1e-9, "got {w}");
    }

    #[test]
    fn test_non_ascii_uses_average() {
        let w = MetricTableMeasurer
            .measure_text_width("é", &arial(1000.0))
            .unwrap();
        assert!((w - SANS_AVERAGE as f64).abs() < 1e-9);
    }

    #[test]
    fn test_bold_is_wider() {
        let m = MetricTableMeasurer;
        let regular = m.measure_text_width("kotak", &arial(40.0)).unwrap();
        let bold = m
            .measure_text_width("kotak", &arial(40.0).with_weight(FontWeight::Bold))
            .unwrap();
        assert!(bold > regular);
    }

    #[test]
    fn test_family_classes() {
        assert_eq!(MetricClass::for_family("Merriweather"), MetricClass::Serif);
        assert_eq!(MetricClass::for_family("Space Mono"), MetricClass::Mono);
        assert_eq!(MetricClass::for_family("Noto Sans"), MetricClass::Sans);
        assert_eq!(MetricClass::for_family("PT Serif"), MetricClass::Serif);
        assert_eq!(MetricClass::for_family("Impact"), MetricClass::Sans);
    }

    #[test]
    fn test_mono_is_fixed_pitch() {
        let m = MetricTableMeasurer;
        let font = FontSpec::new("Space Mono", 10.0);
        assert_eq!(
            m.measure_text_width("iiii", &font).unwrap(),
            m.measure_text_width("MMMM", &font).unwrap()
        );
    }

    #[test]
    fn test_run_width_joins_with_spaces() {
        let font = arial(100.0);
        let measured =
            MeasuredWords::measure(&["ab", "cd", "ef"], &font, &MetricTableMeasurer).unwrap();
        let expected = measured.widths.iter().sum::<f64>() + 2.0 * measured.space;
        assert!((measured.run_width(0..3) - expected).abs() < 1e-9);
        assert_eq!(measured.run_width(1..1), 0.0);
        assert!((measured.run_width(1..2) - measured.widths[1]).abs() < 1e-9);
    }
}
