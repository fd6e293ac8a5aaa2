//! Greedy line-fill wrapping and the orphan pass.
//!
//! Lines are word-index ranges into the caller's word list, so wrapping
//! never copies or alters words.

use std::ops::Range;

use crate::measure::MeasuredWords;

/// A wrapped line as a range of word indices.
pub type LineRange = Range<usize>;

/// Greedy wrap: each line absorbs words left to right until the next word
/// would push it past `max_width`.
///
/// With `strict`, a single word wider than `max_width` makes the whole wrap
/// infeasible and `None` is returned immediately. Without it, such a word is
/// placed alone on its own line and left to overflow.
pub fn greedy_wrap(
    measured: &MeasuredWords,
    max_width: f64,
    strict: bool,
) -> Option<Vec<LineRange>> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut current_width = 0.0;

    for (i, &word_width) in measured.widths.iter().enumerate() {
        if strict && word_width > max_width {
            return None;
        }

        let line_empty = i == start;
        let test_width = current_width + word_width + if line_empty { 0.0 } else { measured.space };

        if test_width <= max_width || line_empty {
            current_width = test_width;
        } else {
            lines.push(start..i);
            start = i;
            current_width = word_width;
        }
    }

    if start < measured.widths.len() {
        lines.push(start..measured.widths.len());
    }
    Some(lines)
}

/// Move one word down onto a single-word final line.
///
/// Applies when there are at least two lines, the last holds exactly one
/// word and the one before it holds more than two. Runs once; the move is
/// skipped if the new last line would no longer fit `max_width`.
/// Returns whether a word was moved.
pub fn avoid_orphan(lines: &mut [LineRange], measured: &MeasuredWords, max_width: f64) -> bool {
    let n = lines.len();
    if n < 2 {
        return false;
    }
    let (last, prev) = (lines[n - 1].clone(), lines[n - 2].clone());
    if last.len() != 1 || prev.len() <= 2 {
        return false;
    }

    let new_last = (last.start - 1)..last.end;
    if measured.run_width(new_last.clone()) > max_width {
        return false;
    }

    lines[n - 2] = prev.start..(prev.end - 1);
    lines[n - 1] = new_last;
    true
}

/// Widest natural line width among `lines`.
pub fn widest_line(lines: &[LineRange], measured: &MeasuredWords) -> f64 {
    lines
        .iter()
        .map(|line| measured.run_width(line.clone()))
        .fold(0.0, f64::max)
}
