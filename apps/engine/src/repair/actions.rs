//! Repair action planning — picks the cheapest corrective action per
//! violation.
//!
//! Planning is pure: given the violation set and the current plan it
//! returns one deduplicated action batch and touches nothing. Priority
//! order per violation: shorten the offending bullet → drop the
//! lowest-ranked bullet → drop the lowest-scoring story → narrow the
//! widest section budget and re-select. A bullet that is the sole
//! representative of a covered top skill is not dropped while another
//! option remains.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::plan::ResumePlan;
use crate::models::story::ExperienceItem;
use crate::validation::{Constraints, Violation};

/// One corrective step the controller can execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepairAction {
    /// Re-invoke the rewrite collaborator with a stricter length target.
    ShortenBullet { bullet_id: Uuid, target_chars: usize },
    /// Remove one bullet from the plan.
    DropBullet { bullet_id: Uuid },
    /// Remove the lowest-scoring story entirely.
    DropLowestStory { story_id: Uuid },
    /// Tighten a section's line budget and re-run selection.
    NarrowSection { section: String, max_lines: usize },
}

/// Plans one repair batch for the given violation set.
///
/// Violations attributed to a bullet get a shorten action; unattributable
/// ones (page overflow, compilation diagnostics without a source line)
/// repair by dropping from the bottom of the rank order. Duplicate
/// actions collapse, so two long lines from one bullet yield one shorten.
pub fn plan_repairs(
    violations: &[Violation],
    plan: &ResumePlan,
    items_by_story: &HashMap<Uuid, ExperienceItem>,
    constraints: &Constraints,
) -> Vec<RepairAction> {
    let mut actions: Vec<RepairAction> = Vec::new();

    for violation in violations {
        let action = match violation.bullet_id {
            Some(bullet_id) if plan.bullet_ids().any(|id| id == bullet_id) => {
                effective_char_len(plan, items_by_story, bullet_id).map(|len| {
                    RepairAction::ShortenBullet {
                        bullet_id,
                        target_chars: shorten_target(len, constraints.max_line_chars),
                    }
                })
            }
            _ => drop_action(plan, items_by_story),
        };

        if let Some(action) = action {
            if !actions.contains(&action) {
                actions.push(action);
            }
        }
    }

    actions
}

/// The drop fallback for a bullet whose shorten attempt failed.
pub fn drop_fallback(
    plan: &ResumePlan,
    items_by_story: &HashMap<Uuid, ExperienceItem>,
    bullet_id: Uuid,
) -> Option<RepairAction> {
    if !is_sole_representative(plan, items_by_story, bullet_id) {
        return Some(RepairAction::DropBullet { bullet_id });
    }
    drop_action(plan, items_by_story)
}

/// Stricter rewrite target: 80% of the current length, capped at the
/// line-length constraint.
fn shorten_target(current_chars: usize, max_line_chars: usize) -> usize {
    (current_chars * 4 / 5).min(max_line_chars).max(1)
}

/// Drop path for violations with no usable bullet attribution.
fn drop_action(
    plan: &ResumePlan,
    items_by_story: &HashMap<Uuid, ExperienceItem>,
) -> Option<RepairAction> {
    if let Some(bullet_id) = drop_candidate(plan, items_by_story) {
        return Some(RepairAction::DropBullet { bullet_id });
    }
    structural_fallback(plan)
}

/// Lowest-ranked droppable bullet: stories are in rank order, so walk
/// them from the bottom, skipping sole representatives.
fn drop_candidate(
    plan: &ResumePlan,
    items_by_story: &HashMap<Uuid, ExperienceItem>,
) -> Option<Uuid> {
    for story in plan.stories.iter().rev() {
        for bullet_id in story.bullet_ids.iter().rev() {
            if !is_sole_representative(plan, items_by_story, *bullet_id) {
                return Some(*bullet_id);
            }
        }
    }
    None
}

/// When no individual bullet may be dropped: drop the lowest-scoring
/// story if more than one remains, otherwise narrow the widest section
/// and re-select. If neither applies, drop the last bullet anyway (no
/// other corrective action remains).
fn structural_fallback(plan: &ResumePlan) -> Option<RepairAction> {
    if plan.stories.len() > 1 {
        return plan
            .stories
            .last()
            .map(|s| RepairAction::DropLowestStory { story_id: s.story_id });
    }

    let widest = plan
        .stories
        .iter()
        .max_by_key(|s| s.estimated_lines)
        .filter(|s| s.estimated_lines > 1);
    if let Some(story) = widest {
        return Some(RepairAction::NarrowSection {
            section: story.section.clone(),
            max_lines: story.estimated_lines - 1,
        });
    }

    plan.stories
        .last()
        .and_then(|s| s.bullet_ids.last())
        .map(|id| RepairAction::DropBullet { bullet_id: *id })
}

/// True when this bullet is the only selected bullet carrying one of the
/// plan's covered top skills.
fn is_sole_representative(
    plan: &ResumePlan,
    items_by_story: &HashMap<Uuid, ExperienceItem>,
    bullet_id: Uuid,
) -> bool {
    let Some(own_skills) = bullet_skills(plan, items_by_story, bullet_id) else {
        return false;
    };

    for skill in &plan.coverage.top_skills {
        if !own_skills.iter().any(|s| s == skill) {
            continue;
        }
        let holders = plan
            .bullet_ids()
            .filter(|id| {
                bullet_skills(plan, items_by_story, *id)
                    .map(|skills| skills.iter().any(|s| s == skill))
                    .unwrap_or(false)
            })
            .count();
        if holders == 1 {
            return true;
        }
    }
    false
}

fn bullet_skills<'a>(
    plan: &ResumePlan,
    items_by_story: &'a HashMap<Uuid, ExperienceItem>,
    bullet_id: Uuid,
) -> Option<&'a [String]> {
    let story = plan
        .stories
        .iter()
        .find(|s| s.bullet_ids.contains(&bullet_id))?;
    let item = items_by_story.get(&story.story_id)?;
    item.bullet(bullet_id).map(|b| b.skills.as_slice())
}

/// Current text length of a selected bullet, rewrite applied.
fn effective_char_len(
    plan: &ResumePlan,
    items_by_story: &HashMap<Uuid, ExperienceItem>,
    bullet_id: Uuid,
) -> Option<usize> {
    if let Some(rewritten) = plan.rewrites.get(&bullet_id) {
        return Some(rewritten.chars().count());
    }
    let story = plan
        .stories
        .iter()
        .find(|s| s.bullet_ids.contains(&bullet_id))?;
    items_by_story
        .get(&story.story_id)?
        .bullet(bullet_id)
        .map(|b| b.char_len)
}
