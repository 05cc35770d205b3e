// Budgeted selection: line estimation plus the greedy-with-recompute
// coverage maximizer.

pub mod line_metrics;
pub mod selector;

pub use line_metrics::estimate_lines;
pub use selector::{coverage_of, recompute_coverage, select};
