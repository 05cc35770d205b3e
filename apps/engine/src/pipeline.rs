//! End-to-end tailoring pipeline: rank → select → repair.
//!
//! Outputs are plain data (`RankedStory`, `ResumePlan`, `Violation`)
//! for the caller to persist or render further; the engine keeps no
//! state between invocations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::models::plan::SpaceBudget;
use crate::models::story::{ExperienceItem, Requirement};
use crate::repair::{run_repair_loop, RepairContext, RepairOutcome};
use crate::scoring::ranker::{rank, RankedStory};
use crate::selection::select;
use crate::services::{JudgmentService, RenderService, RewriteService};

/// Everything a single tailoring run needs. Stories are assumed
/// normalized upstream (skills canonicalized, lengths computed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailorRequest {
    pub requirements: Vec<Requirement>,
    pub stories: Vec<ExperienceItem>,
    pub budget: SpaceBudget,
}

/// Full pipeline result: the rank table plus the repair loop's report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailorOutput {
    pub ranked: Vec<RankedStory>,
    pub outcome: RepairOutcome,
}

/// Runs one tailoring pass end to end.
///
/// The judgment service is optional; without one (or when it fails) the
/// ranking is heuristic-only. Rewrite and render are required by the
/// repair loop. A triggered cancellation signal aborts the loop and
/// returns the best plan so far.
pub async fn tailor(
    request: TailorRequest,
    config: &EngineConfig,
    judgment: Option<&dyn JudgmentService>,
    rewrite: &dyn RewriteService,
    render: &dyn RenderService,
    cancel: Option<watch::Receiver<bool>>,
) -> Result<TailorOutput, EngineError> {
    config.validate()?;

    let items_by_story: HashMap<Uuid, ExperienceItem> = request
        .stories
        .iter()
        .map(|s| (s.id, s.clone()))
        .collect();

    info!(
        stories = request.stories.len(),
        requirements = request.requirements.len(),
        "ranking stories"
    );
    let ranked = rank(
        &request.requirements,
        &request.stories,
        &config.scoring,
        judgment,
    )
    .await;

    let plan = select(
        &ranked,
        &request.requirements,
        &items_by_story,
        &request.budget,
        &config.selection,
    )?;
    info!(
        bullets = plan.bullet_count(),
        coverage = plan.coverage.score,
        "plan selected"
    );

    let ctx = RepairContext {
        requirements: &request.requirements,
        ranked: &ranked,
        items_by_story: &items_by_story,
    };
    let outcome = run_repair_loop(
        plan,
        &ctx,
        rewrite,
        render,
        &config.constraints,
        &config.selection,
        &config.repair,
        cancel,
    )
    .await?;
    info!(
        status = ?outcome.status,
        iterations = outcome.iterations,
        "tailoring complete"
    );

    Ok(TailorOutput { ranked, outcome })
}
