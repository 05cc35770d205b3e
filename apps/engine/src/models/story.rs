//! Input records: job requirements and normalized experience items.
//!
//! Everything here is created by upstream collaborators (content source,
//! posting parser) and is read-only to the engine. Normalization — skill
//! canonicalization to lowercase, character lengths, tier lowercasing —
//! happens once at load time; the engine never re-normalizes.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A required or preferred skill extracted from a job posting.
///
/// `skill` is the canonical (lowercase) name, used for exact tag matches
/// and case-insensitive substring matches against bullet text. `weight`
/// is the evidence/importance weight from extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    pub skill: String,
    pub weight: f64,
    pub required: bool,
}

impl Requirement {
    pub fn new(skill: impl Into<String>, weight: f64, required: bool) -> Self {
        Self {
            skill: skill.into(),
            weight,
            required,
        }
    }
}

/// Evidence-strength tier of a bullet. Serialized lowercase to match the
/// normalized upstream representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceTier {
    Low,
    Medium,
    High,
}

impl EvidenceTier {
    /// Numeric strength used by the scorer.
    pub fn strength(self) -> f64 {
        match self {
            EvidenceTier::Low => 0.3,
            EvidenceTier::Medium => 0.6,
            EvidenceTier::High => 1.0,
        }
    }
}

/// An optional quantified metric attached to a bullet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
}

/// A single normalized resume bullet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: Uuid,
    pub text: String,
    /// Canonical (lowercase) skill tags.
    pub skills: Vec<String>,
    pub tier: EvidenceTier,
    /// Character length computed at load time.
    pub char_len: usize,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl Bullet {
    /// Builds a bullet from raw text, computing `char_len`. Test and
    /// loader convenience — skills are assumed already canonical.
    pub fn new(id: Uuid, text: impl Into<String>, skills: Vec<String>, tier: EvidenceTier) -> Self {
        let text = text.into();
        let char_len = text.chars().count();
        Self {
            id,
            text,
            skills,
            tier,
            char_len,
            metrics: Vec::new(),
        }
    }
}

/// A job/role period owning an ordered set of bullets ("story").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceItem {
    pub id: Uuid,
    pub company: String,
    pub role: String,
    pub start: NaiveDate,
    /// `None` means a current position.
    pub end: Option<NaiveDate>,
    /// Resume section this story belongs to ("experience", "project", ...).
    pub section: String,
    pub bullets: Vec<Bullet>,
}

impl ExperienceItem {
    /// Union of skill tags across the story's bullets, deterministically
    /// ordered.
    pub fn skills(&self) -> BTreeSet<&str> {
        self.bullets
            .iter()
            .flat_map(|b| b.skills.iter().map(String::as_str))
            .collect()
    }

    pub fn bullet(&self, bullet_id: Uuid) -> Option<&Bullet> {
        self.bullets.iter().find(|b| b.id == bullet_id)
    }

    /// Strongest evidence tier across the story's bullets.
    pub fn max_tier_strength(&self) -> f64 {
        self.bullets
            .iter()
            .map(|b| b.tier.strength())
            .fold(0.0, f64::max)
    }
}
