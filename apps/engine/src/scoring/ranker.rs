//! Ranker — orders stories by a blended relevance score.
//!
//! When the judgment service succeeds for a story, the final score blends
//! heuristic and judgment; when it fails (or none is supplied), the story
//! falls back to heuristic-only. Total judgment failure is a required
//! fallback path, never an error — the ranker always returns a fully
//! ordered list. Ties break by story id so the order is a stable total
//! order for identical deterministic inputs.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ScoringWeights;
use crate::models::story::{ExperienceItem, Requirement};
use crate::scoring::scorer::{matched_skills, score};
use crate::services::JudgmentService;

/// A story's rank entry: the deterministic component, the optional
/// external component, and their blend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedStory {
    pub story_id: Uuid,
    pub heuristic_score: f64,
    pub judgment_score: Option<f64>,
    pub final_score: f64,
    pub matched_skills: Vec<String>,
    pub rationale: String,
}

/// Ranks all stories descending by final score.
pub async fn rank(
    requirements: &[Requirement],
    stories: &[ExperienceItem],
    weights: &ScoringWeights,
    judgment: Option<&dyn JudgmentService>,
) -> Vec<RankedStory> {
    let mut ranked = Vec::with_capacity(stories.len());

    for story in stories {
        let breakdown = score(story, requirements, weights);
        let matched = matched_skills(story, requirements);

        let (judgment_score, rationale) = match judgment {
            Some(service) => match service.assess(story, requirements).await {
                Ok(j) => (Some(j.score.clamp(0.0, 1.0)), j.rationale),
                Err(e) => {
                    warn!(
                        story_id = %story.id,
                        "judgment service failed, falling back to heuristic-only: {e}"
                    );
                    (None, heuristic_rationale(&matched, requirements))
                }
            },
            None => (None, heuristic_rationale(&matched, requirements)),
        };

        let final_score = match judgment_score {
            Some(j) => {
                (1.0 - weights.judgment_blend) * breakdown.heuristic_score
                    + weights.judgment_blend * j
            }
            None => breakdown.heuristic_score,
        };

        debug!(
            story_id = %story.id,
            heuristic = breakdown.heuristic_score,
            judgment = ?judgment_score,
            final_score,
            "scored story"
        );

        ranked.push(RankedStory {
            story_id: story.id,
            heuristic_score: breakdown.heuristic_score,
            judgment_score,
            final_score,
            matched_skills: matched,
            rationale,
        });
    }

    ranked.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.story_id.cmp(&b.story_id))
    });

    ranked
}

/// Human-readable rationale for the heuristic-only path.
fn heuristic_rationale(matched: &[String], requirements: &[Requirement]) -> String {
    let distinct: std::collections::BTreeSet<&str> =
        requirements.iter().map(|r| r.skill.as_str()).collect();
    if matched.is_empty() {
        "No requirement skills matched by tag.".to_string()
    } else {
        format!(
            "Matched {}/{} requirement skills: {}.",
            matched.len(),
            distinct.len(),
            matched.join(", ")
        )
    }
}
