//! Word placement: alignment and vertical centering of a fitted block.
//!
//! The last line and any single-word line are set ragged-left with natural
//! spacing. Every other line is fully justified: the leftover width is split
//! evenly across the gaps. Weird mode justifies the last line too.

use kotak_common::error::KotakResult;
use kotak_model::font::FontSpec;
use kotak_model::request::{RenderMode, RenderRequest, SERIOUS_VERTICAL_SHIFT};
use serde::Serialize;

use crate::fit::{fit, FitResult, LayoutSpec};
use crate::measure::TextMeasurer;

/// The box text is placed into, in working-resolution pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextFrame {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    /// Upward offset applied after centering.
    pub vertical_shift: f64,
}

impl TextFrame {
    /// Frame for a request; `spec` supplies the available height so the
    /// serious caption band stays reserved.
    pub fn for_request(request: &RenderRequest, spec: &LayoutSpec) -> Self {
        let geometry = request.geometry();
        Self {
            left: geometry.padding,
            top: geometry.padding,
            width: spec.max_width,
            height: spec.max_height,
            vertical_shift: match request.mode {
                RenderMode::Serious => SERIOUS_VERTICAL_SHIFT,
                _ => 0.0,
            },
        }
    }
}

/// A word with its horizontal position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedWord {
    pub text: String,
    pub x: f64,
    pub width: f64,
}

/// A line with the top of its em box and its placed words.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedLine {
    pub y: f64,
    pub justified: bool,
    pub words: Vec<PlacedWord>,
}

impl PlacedLine {
    /// Gaps between consecutive words (start of next minus end of previous).
    pub fn gaps(&self) -> Vec<f64> {
        self.words
            .windows(2)
            .map(|pair| pair[1].x - (pair[0].x + pair[0].width))
            .collect()
    }

    /// Right edge of the last word.
    pub fn right(&self) -> f64 {
        self.words.last().map(|w| w.x + w.width).unwrap_or(0.0)
    }
}

/// Position every word of `fit` inside `frame`.
pub fn place_lines(
    fit: &FitResult,
    spec: &LayoutSpec,
    frame: &TextFrame,
    measurer: &dyn TextMeasurer,
) -> KotakResult<Vec<PlacedLine>> {
    if fit.is_empty() {
        return Ok(Vec::new());
    }

    let font = spec.font.at_size(fit.font_size);
    let space = measurer.measure_text_width(" ", &font)?;
    let justify_last = spec.style.justifies_last_line();
    let last_index = fit.lines.len() - 1;

    let mut y = frame.top + (frame.height - fit.block_height()) / 2.0 - frame.vertical_shift;
    let mut placed = Vec::with_capacity(fit.lines.len());

    for (index, line) in fit.lines.iter().enumerate() {
        let widths = line
            .words
            .iter()
            .map(|w| measurer.measure_text_width(w, &font))
            .collect::<KotakResult<Vec<_>>>()?;

        let ragged = line.len() == 1 || (index == last_index && !justify_last);
        let gap = if ragged {
            space
        } else {
            let total: f64 = widths.iter().sum();
            (frame.width - total) / (line.len() - 1) as f64
        };

        let mut x = frame.left;
        let words = line
            .words
            .iter()
            .zip(&widths)
            .map(|(text, &width)| {
                let word = PlacedWord {
                    text: text.clone(),
                    x,
                    width,
                };
                x += width + gap;
                word
            })
            .collect();

        placed.push(PlacedLine {
            y,
            justified: !ragged,
            words,
        });
        y += fit.line_height;
    }

    Ok(placed)
}

/// A request laid out end to end: fit plus placement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLayout {
    pub fit: FitResult,
    /// Face the lines were fitted in, at the chosen size.
    #[serde(skip)]
    pub font: FontSpec,
    pub frame: TextFrame,
    pub lines: Vec<PlacedLine>,
}

/// Fit and place a request's text.
pub fn layout_request(
    request: &RenderRequest,
    measurer: &dyn TextMeasurer,
) -> KotakResult<TextLayout> {
    let spec = LayoutSpec::from_request(request);
    let frame = TextFrame::for_request(request, &spec);
    let fit = fit(request, measurer)?;
    let lines = place_lines(&fit, &spec, &frame, measurer)?;
    Ok(TextLayout {
        font: spec.font.at_size(fit.font_size),
        fit,
        frame,
        lines,
    })
}
