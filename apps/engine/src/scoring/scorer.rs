//! Deterministic relevance scorer — one story against one requirement set.
//!
//! Pure function, no external calls, no failure modes: malformed input
//! (empty requirement list, story without bullets) contributes zero to the
//! affected overlap rather than raising.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::ScoringWeights;
use crate::models::story::{ExperienceItem, Requirement};

/// Component scores for one story. `heuristic_score` is the fixed-weight
/// linear combination of the three components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skill_overlap: f64,
    pub keyword_overlap: f64,
    pub evidence_strength: f64,
    pub heuristic_score: f64,
}

/// Scores a story against the posting's requirements.
///
/// - `skill_overlap`: fraction of distinct requirement skills present as
///   exact canonical tags on the story's bullets.
/// - `keyword_overlap`: fraction of distinct requirement skills appearing
///   as a case-insensitive substring of any bullet text.
/// - `evidence_strength`: strength of the strongest bullet tier.
pub fn score(
    story: &ExperienceItem,
    requirements: &[Requirement],
    weights: &ScoringWeights,
) -> ScoreBreakdown {
    let requirement_skills: BTreeSet<&str> =
        requirements.iter().map(|r| r.skill.as_str()).collect();

    let (skill_overlap, keyword_overlap) = if requirement_skills.is_empty() {
        (0.0, 0.0)
    } else {
        let story_skills = story.skills();
        let tag_hits = requirement_skills
            .iter()
            .filter(|skill| story_skills.contains(*skill))
            .count();

        let text_hits = requirement_skills
            .iter()
            .filter(|skill| {
                story
                    .bullets
                    .iter()
                    .any(|b| b.text.to_lowercase().contains(*skill))
            })
            .count();

        let denom = requirement_skills.len() as f64;
        (tag_hits as f64 / denom, text_hits as f64 / denom)
    };

    let evidence_strength = story.max_tier_strength();

    let heuristic_score = weights.skill * skill_overlap
        + weights.keyword * keyword_overlap
        + weights.evidence * evidence_strength;

    ScoreBreakdown {
        skill_overlap,
        keyword_overlap,
        evidence_strength,
        heuristic_score,
    }
}

/// Requirement skills matched by exact tag on any of the story's bullets,
/// deterministically ordered.
pub fn matched_skills(story: &ExperienceItem, requirements: &[Requirement]) -> Vec<String> {
    let story_skills = story.skills();
    requirements
        .iter()
        .map(|r| r.skill.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|skill| story_skills.contains(skill))
        .map(str::to_string)
        .collect()
}
