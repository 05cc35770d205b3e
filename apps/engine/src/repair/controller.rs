//! Repair loop controller — the render/validate/repair state machine.
//!
//! States run `PLANNED → RENDERED → VALIDATED → {RESOLVED | REPAIRING →
//! PLANNED}`. The ceiling guarantees at most `max_iterations + 1`
//! render/validate cycles; hitting it with violations left is a reported
//! `Unresolved` outcome, not an error. Each invocation owns its plan
//! exclusively, and iterations are strictly sequential because every
//! repair decision depends on the previous cycle's violation set.

use std::collections::HashMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{RepairPolicy, SelectionPolicy};
use crate::errors::EngineError;
use crate::materialize::materialize;
use crate::models::plan::ResumePlan;
use crate::models::story::{ExperienceItem, Requirement};
use crate::repair::actions::{drop_fallback, plan_repairs, RepairAction};
use crate::scoring::ranker::RankedStory;
use crate::selection::{recompute_coverage, select};
use crate::services::{RenderService, RenderedDocument, RewriteService};
use crate::validation::{validate, Constraints, Violation};

/// Terminal status of a repair loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStatus {
    /// All violations cleared.
    Resolved,
    /// Iteration ceiling reached with violations remaining.
    Unresolved,
    /// Cancellation signal observed; the plan is the best achieved so far.
    Cancelled,
}

/// Final report of a repair loop run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairOutcome {
    pub plan: ResumePlan,
    /// Violations remaining at termination. Empty when `Resolved`.
    pub violations: Vec<Violation>,
    pub status: RepairStatus,
    /// Repair batches applied.
    pub iterations: u32,
    /// Render/validate cycles performed.
    pub render_cycles: u32,
    /// Rewrite collaborator invocations, retries included.
    pub rewrite_calls: u32,
}

/// Read-only inputs shared across loop iterations.
pub struct RepairContext<'a> {
    pub requirements: &'a [Requirement],
    pub ranked: &'a [RankedStory],
    pub items_by_story: &'a HashMap<Uuid, ExperienceItem>,
}

enum LoopState {
    Planned,
    Rendered(RenderedDocument),
    Validated(Vec<Violation>),
    Repairing(Vec<Violation>),
}

/// Runs the repair loop to a terminal state.
///
/// Render failure after `external_retries` retries escalates as
/// `External` (no fallback remains). Rewrite failure falls through to
/// the drop action for that bullet. A triggered cancellation signal
/// aborts the in-flight external call and returns `Cancelled`.
pub async fn run_repair_loop(
    mut plan: ResumePlan,
    ctx: &RepairContext<'_>,
    rewrite: &dyn RewriteService,
    render: &dyn RenderService,
    constraints: &Constraints,
    selection: &SelectionPolicy,
    policy: &RepairPolicy,
    mut cancel: Option<watch::Receiver<bool>>,
) -> Result<RepairOutcome, EngineError> {
    let mut state = LoopState::Planned;
    let mut iterations = 0u32;
    let mut render_cycles = 0u32;
    let mut rewrite_calls = 0u32;

    loop {
        if is_cancelled(&cancel) {
            info!(iterations, "repair loop cancelled");
            return Ok(outcome(plan, Vec::new(), RepairStatus::Cancelled, iterations, render_cycles, rewrite_calls));
        }

        state = match state {
            LoopState::Planned => {
                let bullets = materialize(&plan, ctx.items_by_story)?;
                let doc = match render_with_retry(render, &bullets, policy, &mut cancel, &mut render_cycles).await? {
                    Some(doc) => doc,
                    None => {
                        return Ok(outcome(plan, Vec::new(), RepairStatus::Cancelled, iterations, render_cycles, rewrite_calls));
                    }
                };
                LoopState::Rendered(doc)
            }

            LoopState::Rendered(doc) => {
                let violations = validate(&doc, constraints);
                debug!(
                    violations = violations.len(),
                    pages = doc.page_count,
                    "validated rendering"
                );
                LoopState::Validated(violations)
            }

            LoopState::Validated(violations) => {
                if violations.is_empty() {
                    info!(iterations, render_cycles, "constraints satisfied");
                    return Ok(outcome(plan, violations, RepairStatus::Resolved, iterations, render_cycles, rewrite_calls));
                }
                if iterations >= u32::from(policy.max_iterations) {
                    warn!(
                        iterations,
                        remaining = violations.len(),
                        "iteration ceiling reached with violations remaining"
                    );
                    return Ok(outcome(plan, violations, RepairStatus::Unresolved, iterations, render_cycles, rewrite_calls));
                }
                LoopState::Repairing(violations)
            }

            LoopState::Repairing(violations) => {
                let actions = plan_repairs(&violations, &plan, ctx.items_by_story, constraints);
                debug!(batch = actions.len(), "applying repair batch");
                for action in actions {
                    let cancelled = apply_action(
                        action, &mut plan, ctx, rewrite, selection, policy, &mut cancel, &mut rewrite_calls,
                    )
                    .await?;
                    if cancelled {
                        return Ok(outcome(plan, violations, RepairStatus::Cancelled, iterations, render_cycles, rewrite_calls));
                    }
                }
                iterations += 1;
                LoopState::Planned
            }
        };
    }
}

/// Applies one action. Returns true if a cancellation was observed
/// mid-application.
#[allow(clippy::too_many_arguments)]
async fn apply_action(
    action: RepairAction,
    plan: &mut ResumePlan,
    ctx: &RepairContext<'_>,
    rewrite: &dyn RewriteService,
    selection: &SelectionPolicy,
    policy: &RepairPolicy,
    cancel: &mut Option<watch::Receiver<bool>>,
    rewrite_calls: &mut u32,
) -> Result<bool, EngineError> {
    match action {
        RepairAction::ShortenBullet {
            bullet_id,
            target_chars,
        } => {
            let Some(text) = current_text(plan, ctx.items_by_story, bullet_id) else {
                return Ok(false);
            };
            match rewrite_with_retry(rewrite, &text, target_chars, policy, cancel, rewrite_calls).await {
                None => return Ok(true),
                Some(Ok(rewritten)) => {
                    debug!(%bullet_id, target_chars, "bullet shortened");
                    plan.rewrites.insert(bullet_id, rewritten);
                }
                Some(Err(err)) => {
                    // Shorten failed for good; fall through to dropping.
                    warn!(%bullet_id, %err, "rewrite exhausted, falling through to drop");
                    if let Some(fallback) = drop_fallback(plan, ctx.items_by_story, bullet_id) {
                        return Box::pin(apply_action(
                            fallback, plan, ctx, rewrite, selection, policy, cancel, rewrite_calls,
                        ))
                        .await;
                    }
                }
            }
        }

        RepairAction::DropBullet { bullet_id } => {
            if plan.remove_bullet(bullet_id) {
                debug!(%bullet_id, "bullet dropped");
                recompute_coverage(plan, ctx.items_by_story, ctx.requirements, selection);
            }
        }

        RepairAction::DropLowestStory { story_id } => {
            if plan.remove_story(story_id) {
                debug!(%story_id, "story dropped");
                recompute_coverage(plan, ctx.items_by_story, ctx.requirements, selection);
            }
        }

        RepairAction::NarrowSection { section, max_lines } => {
            let mut budget = plan.budget.clone();
            budget.sections.entry(section.clone()).or_default().max_lines = Some(max_lines);
            debug!(section = %section, max_lines, "narrowing section and re-selecting");

            let mut reselected = select(
                ctx.ranked,
                ctx.requirements,
                ctx.items_by_story,
                &budget,
                selection,
            )?;
            // Carry rewrites for bullets that survived the re-selection.
            for (id, text) in &plan.rewrites {
                if reselected.bullet_ids().any(|b| b == *id) {
                    reselected.rewrites.insert(*id, text.clone());
                }
            }
            *plan = reselected;
        }
    }
    Ok(false)
}

// ────────────────────────────────────────────────────────────────────────────
// External call plumbing
// ────────────────────────────────────────────────────────────────────────────

/// Renders with up to `external_retries` retries. `Ok(None)` means
/// cancelled; exhaustion escalates the last error.
async fn render_with_retry(
    render: &dyn RenderService,
    bullets: &[crate::models::plan::SelectedBullet],
    policy: &RepairPolicy,
    cancel: &mut Option<watch::Receiver<bool>>,
    render_cycles: &mut u32,
) -> Result<Option<RenderedDocument>, EngineError> {
    let mut last_error: Option<EngineError> = None;
    for attempt in 0..=policy.external_retries {
        match guarded(cancel, render.render(bullets)).await {
            None => return Ok(None),
            Some(Ok(doc)) => {
                *render_cycles += 1;
                return Ok(Some(doc));
            }
            Some(Err(err)) => {
                warn!(attempt, %err, "render attempt failed");
                last_error = Some(err);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| EngineError::External("render failed".to_string())))
}

/// Rewrites with retries. `None` means cancelled; `Some(Err)` means
/// exhausted, letting the caller fall through to a drop.
async fn rewrite_with_retry(
    rewrite: &dyn RewriteService,
    text: &str,
    target_chars: usize,
    policy: &RepairPolicy,
    cancel: &mut Option<watch::Receiver<bool>>,
    rewrite_calls: &mut u32,
) -> Option<Result<String, EngineError>> {
    let mut last_error: Option<EngineError> = None;
    for attempt in 0..=policy.external_retries {
        *rewrite_calls += 1;
        match guarded(cancel, rewrite.shorten(text, target_chars)).await {
            None => return None,
            Some(Ok(rewritten)) => return Some(Ok(rewritten)),
            Some(Err(err)) => {
                warn!(attempt, %err, "rewrite attempt failed");
                last_error = Some(err);
            }
        }
    }
    Some(Err(last_error.unwrap_or_else(|| {
        EngineError::External("rewrite failed".to_string())
    })))
}

/// Races an external call against the cancellation signal. `None` means
/// the signal fired first.
async fn guarded<T>(
    cancel: &mut Option<watch::Receiver<bool>>,
    call: impl Future<Output = Result<T, EngineError>>,
) -> Option<Result<T, EngineError>> {
    match cancel {
        Some(rx) => tokio::select! {
            result = call => Some(result),
            _ = wait_cancelled(rx) => None,
        },
        None => Some(call.await),
    }
}

fn is_cancelled(cancel: &Option<watch::Receiver<bool>>) -> bool {
    cancel.as_ref().is_some_and(|rx| *rx.borrow())
}

async fn wait_cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender dropped: cancellation can never fire.
            std::future::pending::<()>().await;
        }
    }
}

fn current_text(
    plan: &ResumePlan,
    items_by_story: &HashMap<Uuid, ExperienceItem>,
    bullet_id: Uuid,
) -> Option<String> {
    if let Some(rewritten) = plan.rewrites.get(&bullet_id) {
        return Some(rewritten.clone());
    }
    let story = plan
        .stories
        .iter()
        .find(|s| s.bullet_ids.contains(&bullet_id))?;
    items_by_story
        .get(&story.story_id)?
        .bullet(bullet_id)
        .map(|b| b.text.clone())
}

fn outcome(
    plan: ResumePlan,
    violations: Vec<Violation>,
    status: RepairStatus,
    iterations: u32,
    render_cycles: u32,
    rewrite_calls: u32,
) -> RepairOutcome {
    RepairOutcome {
        plan,
        violations,
        status,
        iterations,
        render_cycles,
        rewrite_calls,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
