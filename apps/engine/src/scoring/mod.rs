// Relevance scoring: deterministic per-story heuristics plus the blended
// ranking that tolerates judgment-service absence.

pub mod ranker;
pub mod scorer;

pub use ranker::{rank, RankedStory};
pub use scorer::{score, ScoreBreakdown};
