//! Printed-line estimation.
//!
//! The renderer owns exact typesetting; selection only needs a stable,
//! conservative estimate. A fixed characters-per-line constant is enough
//! to keep the knapsack weights honest — the repair loop catches whatever
//! the approximation misses.

/// Estimated printed lines for a bullet of `char_len` characters.
/// Always at least 1 — even an empty bullet occupies a line slot.
pub fn estimate_lines(char_len: usize, chars_per_line: usize) -> usize {
    if chars_per_line == 0 {
        return 1;
    }
    char_len.div_ceil(chars_per_line).max(1)
}
