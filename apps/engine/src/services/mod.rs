//! External collaborator interfaces.
//!
//! The engine consumes these as trait objects — any backend satisfying
//! the contracts works (the tests use deterministic stubs; `llm.rs`
//! provides an HTTP-backed implementation of judgment + rewrite).

pub mod llm;
pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::EngineError;
use crate::models::plan::SelectedBullet;
use crate::models::story::{ExperienceItem, Requirement};

pub use llm::LlmClient;

/// Result of an external relevance judgment for one story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgmentScore {
    /// 0–1 relevance score.
    pub score: f64,
    pub rationale: String,
}

/// Optional external judgment of story relevance. Failure degrades the
/// ranker to heuristic-only scoring.
#[async_trait]
pub trait JudgmentService: Send + Sync {
    async fn assess(
        &self,
        story: &ExperienceItem,
        requirements: &[Requirement],
    ) -> Result<JudgmentScore, EngineError>;
}

/// Shortens/rephrases bullet text to a target character length.
#[async_trait]
pub trait RewriteService: Send + Sync {
    async fn shorten(&self, text: &str, target_chars: usize) -> Result<String, EngineError>;
}

/// One printed line of a typeset document, attributed back to the plan
/// bullet that produced it where the renderer can tell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedLine {
    pub text: String,
    pub bullet_id: Option<Uuid>,
}

/// A typesetting/compilation diagnostic reported by the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderDiagnostic {
    pub message: String,
    pub bullet_id: Option<Uuid>,
}

/// A typeset document plus compilation diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub page_count: u32,
    pub lines: Vec<RenderedLine>,
    pub diagnostics: Vec<RenderDiagnostic>,
}

/// Typesets a plan's materialized content.
#[async_trait]
pub trait RenderService: Send + Sync {
    async fn render(&self, bullets: &[SelectedBullet]) -> Result<RenderedDocument, EngineError>;
}
