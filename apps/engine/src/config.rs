//! Engine configuration — explicit policy structs passed into each component.
//!
//! There is no process-wide mutable state: callers build an `EngineConfig`
//! (or individual policy structs) and hand it to the entry points. The
//! numeric constants here are policy, not derived values; the defaults are
//! the ones the unit tests verify against the worked scenarios.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::errors::EngineError;
use crate::validation::Constraints;

/// Weights for the deterministic heuristic score and the judgment blend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub skill: f64,
    pub keyword: f64,
    pub evidence: f64,
    /// Share of the final score taken by the external judgment score when
    /// one is available. The remainder stays with the heuristic score.
    pub judgment_blend: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skill: 0.4,
            keyword: 0.3,
            evidence: 0.3,
            judgment_blend: 0.5,
        }
    }
}

/// Policy knobs for the budgeted selection pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionPolicy {
    /// Fixed characters-per-printed-line constant used for line estimates.
    pub chars_per_line: usize,
    /// Diminishing-returns factor applied per prior coverage of a skill:
    /// the n-th bullet covering the same skill scores it at `factor^n`.
    pub redundancy_factor: f64,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            chars_per_line: 90,
            redundancy_factor: 0.5,
        }
    }
}

/// Policy knobs for the repair loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairPolicy {
    /// Hard ceiling on repair iterations. The loop performs at most
    /// `max_iterations + 1` render/validate cycles.
    pub max_iterations: u8,
    /// Retries per external rewrite/render call before falling through to
    /// the next-priority repair action (or escalating, for render).
    pub external_retries: u32,
}

impl Default for RepairPolicy {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            external_retries: 2,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub scoring: ScoringWeights,
    pub selection: SelectionPolicy,
    pub repair: RepairPolicy,
    pub constraints: Constraints,
    /// API key for the default HTTP-backed judgment/rewrite client.
    /// `None` means the caller supplies its own collaborator impls.
    pub anthropic_api_key: Option<String>,
}

impl EngineConfig {
    /// Loads configuration from environment variables, with defaults for
    /// everything except the optional API key.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let mut config = EngineConfig {
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            ..Default::default()
        };

        if let Ok(v) = std::env::var("MAX_REPAIR_ITERATIONS") {
            config.repair.max_iterations = v
                .parse::<u8>()
                .context("MAX_REPAIR_ITERATIONS must be a small integer")?;
        }
        if let Ok(v) = std::env::var("CHARS_PER_LINE") {
            config.selection.chars_per_line = v
                .parse::<usize>()
                .context("CHARS_PER_LINE must be a positive integer")?;
        }
        if let Ok(v) = std::env::var("MAX_LINE_CHARS") {
            config.constraints.max_line_chars = v
                .parse::<usize>()
                .context("MAX_LINE_CHARS must be a positive integer")?;
        }

        Ok(config)
    }

    /// Rejects nonsensical policy values. Budget caps are validated
    /// separately by `SpaceBudget::new`.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.selection.chars_per_line == 0 {
            return Err(EngineError::Config(
                "chars_per_line must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.selection.redundancy_factor) {
            return Err(EngineError::Config(format!(
                "redundancy_factor must be in [0, 1], got {}",
                self.selection.redundancy_factor
            )));
        }
        if !(0.0..=1.0).contains(&self.scoring.judgment_blend) {
            return Err(EngineError::Config(format!(
                "judgment_blend must be in [0, 1], got {}",
                self.scoring.judgment_blend
            )));
        }
        let w = &self.scoring;
        if w.skill < 0.0 || w.keyword < 0.0 || w.evidence < 0.0 {
            return Err(EngineError::Config(
                "heuristic weights must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
