use thiserror::Error;

/// Engine-level error type.
///
/// `Config` and `NotFound` are fatal and never retried. `External` is
/// recoverable at the boundary where a fallback exists (heuristic-only
/// ranking, drop-instead-of-shorten) and escalates only when no fallback
/// remains. A repair loop that hits its iteration ceiling with violations
/// left is NOT an error — it is a reported `RepairOutcome`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("External service error: {0}")]
    External(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
