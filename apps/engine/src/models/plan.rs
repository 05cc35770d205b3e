//! Plan records: the space budget, the selected subset, and the
//! materialized projection.
//!
//! `ResumePlan` is the selector's sole output and the repair loop's
//! primary mutable state — its story list shrinks and its `rewrites` map
//! grows as repairs are applied. Each loop invocation owns its plan
//! exclusively, so none of this needs locking.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::EngineError;
use crate::models::story::{EvidenceTier, Metric};

/// Optional per-section caps layered under the global budget.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionBudget {
    pub max_bullets: Option<usize>,
    pub max_lines: Option<usize>,
}

/// Hard space budget for selection. Both global caps are strictly
/// positive — `new` rejects zero rather than silently clamping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceBudget {
    pub max_bullets: usize,
    pub max_lines: usize,
    #[serde(default)]
    pub sections: BTreeMap<String, SectionBudget>,
}

impl SpaceBudget {
    pub fn new(max_bullets: usize, max_lines: usize) -> Result<Self, EngineError> {
        if max_bullets == 0 || max_lines == 0 {
            return Err(EngineError::Config(format!(
                "budget caps must be strictly positive (max_bullets={max_bullets}, max_lines={max_lines})"
            )));
        }
        Ok(Self {
            max_bullets,
            max_lines,
            sections: BTreeMap::new(),
        })
    }

    pub fn with_section(mut self, section: impl Into<String>, budget: SectionBudget) -> Self {
        self.sections.insert(section.into(), budget);
        self
    }
}

/// A chosen story with the subset of its bullets that made the cut.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedStory {
    pub story_id: Uuid,
    /// Selected bullet ids, in selection order.
    pub bullet_ids: Vec<Uuid>,
    pub section: String,
    /// Estimated printed lines for the selected subset.
    pub estimated_lines: usize,
}

/// Summary of how well the selection covers the posting's top skills.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Coverage {
    /// Requirement skills covered at least once, by weight descending.
    pub top_skills: Vec<String>,
    /// Normalized 0–1 coverage score (diminishing-returns weighted).
    pub score: f64,
}

/// The selector's output and the repair loop's working state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumePlan {
    pub budget: SpaceBudget,
    pub stories: Vec<SelectedStory>,
    pub coverage: Coverage,
    /// Bullet texts replaced by repair rewrites, keyed by bullet id.
    /// Applied as overrides during materialization.
    #[serde(default)]
    pub rewrites: BTreeMap<Uuid, String>,
}

impl ResumePlan {
    pub fn empty(budget: SpaceBudget) -> Self {
        Self {
            budget,
            stories: Vec::new(),
            coverage: Coverage::default(),
            rewrites: BTreeMap::new(),
        }
    }

    pub fn bullet_count(&self) -> usize {
        self.stories.iter().map(|s| s.bullet_ids.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    /// All selected bullet ids in plan order.
    pub fn bullet_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.stories.iter().flat_map(|s| s.bullet_ids.iter().copied())
    }

    /// Removes a single bullet from the plan. Stories left with no
    /// bullets are removed entirely. Returns false if the id was not in
    /// the plan.
    pub fn remove_bullet(&mut self, bullet_id: Uuid) -> bool {
        let mut removed = false;
        for story in &mut self.stories {
            let before = story.bullet_ids.len();
            story.bullet_ids.retain(|id| *id != bullet_id);
            if story.bullet_ids.len() < before {
                removed = true;
            }
        }
        if removed {
            self.stories.retain(|s| !s.bullet_ids.is_empty());
            self.rewrites.remove(&bullet_id);
        }
        removed
    }

    /// Removes a whole story and its rewrites. Returns false if absent.
    pub fn remove_story(&mut self, story_id: Uuid) -> bool {
        let Some(pos) = self.stories.iter().position(|s| s.story_id == story_id) else {
            return false;
        };
        let story = self.stories.remove(pos);
        for id in &story.bullet_ids {
            self.rewrites.remove(id);
        }
        true
    }
}

/// Materialized bullet content resolved from a plan — a read-only
/// projection, never mutated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedBullet {
    pub story_id: Uuid,
    pub bullet_id: Uuid,
    pub section: String,
    /// Bullet text with any repair rewrite applied.
    pub text: String,
    pub skills: Vec<String>,
    pub tier: EvidenceTier,
    pub char_len: usize,
    pub metrics: Vec<Metric>,
}
