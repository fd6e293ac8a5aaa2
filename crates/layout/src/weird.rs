//! Weird mode: seeded chaotic line grouping.
//!
//! Line breaks come from a run length drawn per line from a trigonometric
//! hash of the seed, not from measured widths. The hash is
//! `frac(sin(seed + offset) * 10000)` and must stay bit-for-bit stable:
//! a given `(words, level, seed)` always yields the same grouping.

use crate::wrap::LineRange;

/// Pseudo-random value in `[0, 1)` for `seed` at `offset`.
pub fn seeded_random(seed: i64, offset: u64) -> f64 {
    let x = (seed as f64 + offset as f64).sin() * 10000.0;
    x - x.floor()
}

/// Inclusive bounds on words per line for a weirdness level.
///
/// Higher levels give shorter, choppier lines.
pub fn run_length_bounds(level: u8) -> (usize, usize) {
    let level = level as i64;
    let min = (6 - level).max(1) as usize;
    let max = (8 - level).max(2) as usize;
    (min, max)
}

/// Line-height multiplier for a weirdness level.
pub fn line_height_factor(level: u8) -> f64 {
    1.1 + 0.05 * level as f64
}

/// Group `word_count` words into lines of seeded run lengths.
///
/// Line `i` draws its run length from `seeded_random(seed, i)`. The final
/// line takes whatever words remain, so it may be shorter than the minimum.
pub fn group_words(word_count: usize, level: u8, seed: i64) -> Vec<LineRange> {
    let (min, max) = run_length_bounds(level);
    let span = (max - min + 1) as f64;

    let mut lines = Vec::new();
    let mut start = 0;
    let mut offset = 0u64;
    while start < word_count {
        let draw = (seeded_random(seed, offset) * span).floor() as usize;
        let run = (min + draw).min(max);
        let end = (start + run).min(word_count);
        lines.push(start..end);
        start = end;
        offset += 1;
    }
    lines
}
