//! Budget Planner — selects a coverage-maximizing subset of bullets.
//!
//! The objective is submodular: a bullet's value is its parent story's
//! rank score times the marginal coverage it adds, where repeat coverage
//! of an already-covered skill earns a diminishing weight. A naive 0/1
//! knapsack over precomputed values would over-select redundant bullets
//! from the same high-rank story, so selection runs greedy-with-recompute:
//! after every pick the marginal values of the remaining candidates are
//! recomputed against the updated coverage state.
//!
//! Sections that declare sub-budgets are first pruned by an independent
//! per-section greedy run under those caps; the merged pool then goes
//! through the global greedy under the global caps (section caps stay
//! enforced during the merge).

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;
use uuid::Uuid;

use crate::config::SelectionPolicy;
use crate::errors::EngineError;
use crate::models::plan::{Coverage, ResumePlan, SectionBudget, SelectedStory, SpaceBudget};
use crate::models::story::{ExperienceItem, Requirement};
use crate::scoring::ranker::RankedStory;
use crate::selection::line_metrics::estimate_lines;

/// One selectable bullet with its knapsack weight and coverage skills.
#[derive(Debug, Clone)]
struct Candidate {
    story_id: Uuid,
    bullet_id: Uuid,
    section: String,
    /// Position of the owning story in the rank order (tie-break key).
    rank_index: usize,
    rank_score: f64,
    /// Bullet skills that appear in the requirement set, deduplicated.
    skills: Vec<String>,
    line_cost: usize,
}

/// Selects bullets under the budget and returns the layout plan.
///
/// Deterministic for identical rank order and budget: ties break by story
/// rank order, then bullet id. An empty result (nothing fits, or nothing
/// contributes coverage) is a valid plan with coverage 0, not an error.
pub fn select(
    ranked: &[RankedStory],
    requirements: &[Requirement],
    items_by_story: &HashMap<Uuid, ExperienceItem>,
    budget: &SpaceBudget,
    policy: &SelectionPolicy,
) -> Result<ResumePlan, EngineError> {
    if budget.max_bullets == 0 || budget.max_lines == 0 {
        return Err(EngineError::Config(format!(
            "budget caps must be strictly positive (max_bullets={}, max_lines={})",
            budget.max_bullets, budget.max_lines
        )));
    }

    let weight_by_skill = requirement_weights(requirements);
    let candidates = build_candidates(ranked, items_by_story, &weight_by_skill, policy);

    // Phase 1: independent per-section prune for sections with sub-budgets.
    let mut pool: Vec<Candidate> = Vec::with_capacity(candidates.len());
    let mut by_section: BTreeMap<String, Vec<Candidate>> = BTreeMap::new();
    for candidate in candidates {
        if budget.sections.contains_key(&candidate.section) {
            by_section
                .entry(candidate.section.clone())
                .or_default()
                .push(candidate);
        } else {
            pool.push(candidate);
        }
    }
    for (section, section_pool) in by_section {
        let caps = &budget.sections[&section];
        let max_bullets = caps.max_bullets.unwrap_or(budget.max_bullets);
        let max_lines = caps.max_lines.unwrap_or(budget.max_lines);
        let picks = greedy(
            &section_pool,
            max_bullets.min(budget.max_bullets),
            max_lines.min(budget.max_lines),
            None,
            &weight_by_skill,
            policy.redundancy_factor,
        );
        debug!(section = %section, survivors = picks.len(), "per-section greedy prune");
        pool.extend(picks.into_iter().map(|i| section_pool[i].clone()));
    }

    // Phase 2: global greedy merge under the global caps, with section
    // caps still enforced.
    pool.sort_by(|a, b| {
        a.rank_index
            .cmp(&b.rank_index)
            .then_with(|| a.bullet_id.cmp(&b.bullet_id))
    });
    let picks = greedy(
        &pool,
        budget.max_bullets,
        budget.max_lines,
        Some(&budget.sections),
        &weight_by_skill,
        policy.redundancy_factor,
    );

    let picked: Vec<&Candidate> = picks.iter().map(|&i| &pool[i]).collect();
    let coverage = {
        let skill_sets: Vec<&[String]> = picked.iter().map(|c| c.skills.as_slice()).collect();
        coverage_of(&skill_sets, requirements, policy.redundancy_factor)
    };

    debug!(
        bullets = picked.len(),
        lines = picked.iter().map(|c| c.line_cost).sum::<usize>(),
        coverage = coverage.score,
        "selection complete"
    );

    Ok(assemble_plan(budget.clone(), &picked, coverage))
}

/// Re-derives a plan's coverage summary from its current bullet set.
/// Used by the repair loop after any drop.
pub fn recompute_coverage(
    plan: &mut ResumePlan,
    items_by_story: &HashMap<Uuid, ExperienceItem>,
    requirements: &[Requirement],
    policy: &SelectionPolicy,
) {
    let weight_by_skill = requirement_weights(requirements);
    let mut skill_sets: Vec<Vec<String>> = Vec::new();
    for story in &plan.stories {
        let Some(item) = items_by_story.get(&story.story_id) else {
            continue;
        };
        for bullet_id in &story.bullet_ids {
            if let Some(bullet) = item.bullet(*bullet_id) {
                skill_sets.push(relevant_skills(&bullet.skills, &weight_by_skill));
            }
        }
    }
    let refs: Vec<&[String]> = skill_sets.iter().map(Vec::as_slice).collect();
    plan.coverage = coverage_of(&refs, requirements, policy.redundancy_factor);
}

/// Computes the normalized 0–1 coverage summary for an ordered sequence
/// of bullet skill sets.
///
/// The first bullet covering a skill earns that skill's full requirement
/// weight; each subsequent one earns `factor^n` of it. The score divides
/// by the total requirement weight, so a single bullet covering one of
/// two equal-weight skills scores 0.5.
pub fn coverage_of(skill_sets: &[&[String]], requirements: &[Requirement], factor: f64) -> Coverage {
    let weight_by_skill = requirement_weights(requirements);
    let total_weight: f64 = weight_by_skill.values().sum();

    let mut covered: BTreeMap<&str, u32> = BTreeMap::new();
    let mut achieved = 0.0;
    for skills in skill_sets {
        for skill in skills.iter() {
            if let Some((canonical, weight)) = weight_by_skill.get_key_value(skill.as_str()) {
                let times = covered.entry(canonical).or_insert(0);
                achieved += weight * factor.powi(*times as i32);
                *times += 1;
            }
        }
    }

    let mut top_skills: Vec<&str> = covered.keys().copied().collect();
    top_skills.sort_by(|a, b| {
        weight_by_skill[*b]
            .partial_cmp(&weight_by_skill[*a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.cmp(b))
    });

    let score = if total_weight > 0.0 {
        (achieved / total_weight).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Coverage {
        top_skills: top_skills.into_iter().map(str::to_string).collect(),
        score,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Greedy core
// ────────────────────────────────────────────────────────────────────────────

/// Greedy-with-recompute over a candidate pool.
///
/// Each round picks the feasible candidate with the highest marginal
/// value per line of cost (rank score × diminishing-returns coverage
/// gain, divided by line cost), then updates the coverage state so later
/// marginals shrink for already-covered skills. The per-line density
/// keeps a wide bullet from starving narrower ones that jointly cover
/// more. Candidates are visited in (rank_index, bullet_id) order and a
/// strict comparison keeps the first best, which makes ties
/// deterministic. Stops when the bullet cap is hit, nothing fits the
/// remaining lines, or no remaining candidate adds coverage.
fn greedy(
    candidates: &[Candidate],
    max_bullets: usize,
    max_lines: usize,
    section_caps: Option<&BTreeMap<String, SectionBudget>>,
    weight_by_skill: &BTreeMap<String, f64>,
    factor: f64,
) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        candidates[a]
            .rank_index
            .cmp(&candidates[b].rank_index)
            .then_with(|| candidates[a].bullet_id.cmp(&candidates[b].bullet_id))
    });

    let mut picked = vec![false; candidates.len()];
    let mut picks: Vec<usize> = Vec::new();
    let mut covered: BTreeMap<&str, u32> = BTreeMap::new();
    let mut used_lines = 0usize;
    let mut section_bullets: BTreeMap<&str, usize> = BTreeMap::new();
    let mut section_lines: BTreeMap<&str, usize> = BTreeMap::new();

    while picks.len() < max_bullets {
        let mut best: Option<(usize, f64)> = None;

        for &idx in &order {
            if picked[idx] {
                continue;
            }
            let candidate = &candidates[idx];
            if used_lines + candidate.line_cost > max_lines {
                continue;
            }
            if let Some(caps) = section_caps {
                if let Some(cap) = caps.get(&candidate.section) {
                    let used_b = section_bullets
                        .get(candidate.section.as_str())
                        .copied()
                        .unwrap_or(0);
                    let used_l = section_lines
                        .get(candidate.section.as_str())
                        .copied()
                        .unwrap_or(0);
                    if cap.max_bullets.is_some_and(|m| used_b + 1 > m) {
                        continue;
                    }
                    if cap.max_lines.is_some_and(|m| used_l + candidate.line_cost > m) {
                        continue;
                    }
                }
            }

            let marginal = marginal_value(candidate, &covered, weight_by_skill, factor);
            let density = marginal / candidate.line_cost.max(1) as f64;
            if best.map_or(true, |(_, best_density)| density > best_density) {
                best = Some((idx, density));
            }
        }

        let Some((idx, value)) = best else { break };
        if value <= 0.0 {
            break;
        }

        let candidate = &candidates[idx];
        picked[idx] = true;
        picks.push(idx);
        used_lines += candidate.line_cost;
        *section_bullets.entry(candidate.section.as_str()).or_insert(0) += 1;
        *section_lines.entry(candidate.section.as_str()).or_insert(0) += candidate.line_cost;
        for skill in &candidate.skills {
            if let Some((canonical, _)) = weight_by_skill.get_key_value(skill.as_str()) {
                *covered.entry(canonical).or_insert(0) += 1;
            }
        }
    }

    picks
}

/// Marginal objective value of a candidate under the current coverage.
fn marginal_value(
    candidate: &Candidate,
    covered: &BTreeMap<&str, u32>,
    weight_by_skill: &BTreeMap<String, f64>,
    factor: f64,
) -> f64 {
    let gain: f64 = candidate
        .skills
        .iter()
        .filter_map(|skill| {
            weight_by_skill.get(skill.as_str()).map(|weight| {
                let times = covered.get(skill.as_str()).copied().unwrap_or(0);
                weight * factor.powi(times as i32)
            })
        })
        .sum();
    candidate.rank_score * gain
}

// ────────────────────────────────────────────────────────────────────────────
// Candidate construction & plan assembly
// ────────────────────────────────────────────────────────────────────────────

/// Max weight per distinct requirement skill (duplicates collapse).
fn requirement_weights(requirements: &[Requirement]) -> BTreeMap<String, f64> {
    let mut weights: BTreeMap<String, f64> = BTreeMap::new();
    for req in requirements {
        let entry = weights.entry(req.skill.clone()).or_insert(req.weight);
        if req.weight > *entry {
            *entry = req.weight;
        }
    }
    weights
}

fn relevant_skills(skills: &[String], weight_by_skill: &BTreeMap<String, f64>) -> Vec<String> {
    skills
        .iter()
        .filter(|s| weight_by_skill.contains_key(s.as_str()))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn build_candidates(
    ranked: &[RankedStory],
    items_by_story: &HashMap<Uuid, ExperienceItem>,
    weight_by_skill: &BTreeMap<String, f64>,
    policy: &SelectionPolicy,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for (rank_index, entry) in ranked.iter().enumerate() {
        let Some(item) = items_by_story.get(&entry.story_id) else {
            debug!(story_id = %entry.story_id, "ranked story absent from item set, skipping");
            continue;
        };
        for bullet in &item.bullets {
            candidates.push(Candidate {
                story_id: item.id,
                bullet_id: bullet.id,
                section: item.section.clone(),
                rank_index,
                rank_score: entry.final_score,
                skills: relevant_skills(&bullet.skills, weight_by_skill),
                line_cost: estimate_lines(bullet.char_len, policy.chars_per_line),
            });
        }
    }
    candidates
}

/// Groups picked candidates into `SelectedStory` records, stories in rank
/// order, bullets in id order within a story.
fn assemble_plan(budget: SpaceBudget, picked: &[&Candidate], coverage: Coverage) -> ResumePlan {
    let mut by_story: BTreeMap<(usize, Uuid), Vec<&Candidate>> = BTreeMap::new();
    for candidate in picked {
        by_story
            .entry((candidate.rank_index, candidate.story_id))
            .or_default()
            .push(candidate);
    }

    let stories = by_story
        .into_values()
        .map(|mut bullets| {
            bullets.sort_by(|a, b| a.bullet_id.cmp(&b.bullet_id));
            SelectedStory {
                story_id: bullets[0].story_id,
                section: bullets[0].section.clone(),
                estimated_lines: bullets.iter().map(|c| c.line_cost).sum(),
                bullet_ids: bullets.iter().map(|c| c.bullet_id).collect(),
            }
        })
        .collect();

    ResumePlan {
        budget,
        stories,
        coverage,
        rewrites: BTreeMap::new(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::story::{Bullet, EvidenceTier};
    use chrono::NaiveDate;

    fn make_story(id: Uuid, section: &str, bullets: Vec<Bullet>) -> ExperienceItem {
        ExperienceItem {
            id,
            company: "Acme".to_string(),
            role: "Engineer".to_string(),
            start: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            end: None,
            section: section.to_string(),
            bullets,
        }
    }

    fn make_bullet(id: u128, text_len: usize, skills: &[&str]) -> Bullet {
        let mut b = Bullet::new(
            Uuid::from_u128(id),
            "x".repeat(text_len),
            skills.iter().map(|s| s.to_string()).collect(),
            EvidenceTier::Medium,
        );
        b.char_len = text_len;
        b
    }

    fn make_ranked(story_id: Uuid, final_score: f64) -> RankedStory {
        RankedStory {
            story_id,
            heuristic_score: final_score,
            judgment_score: None,
            final_score,
            matched_skills: vec![],
            rationale: String::new(),
        }
    }

    fn make_requirements(skills: &[(&str, f64)]) -> Vec<Requirement> {
        skills
            .iter()
            .map(|(s, w)| Requirement::new(*s, *w, true))
            .collect()
    }

    /// Two stories, two bullets each, all one line at the default policy.
    fn fixture() -> (
        Vec<RankedStory>,
        Vec<Requirement>,
        HashMap<Uuid, ExperienceItem>,
    ) {
        let story_a = Uuid::from_u128(1);
        let story_b = Uuid::from_u128(2);
        let items: HashMap<Uuid, ExperienceItem> = [
            (
                story_a,
                make_story(
                    story_a,
                    "experience",
                    vec![
                        make_bullet(11, 80, &["go", "sql"]),
                        make_bullet(12, 80, &["go"]),
                    ],
                ),
            ),
            (
                story_b,
                make_story(
                    story_b,
                    "experience",
                    vec![
                        make_bullet(21, 80, &["kubernetes"]),
                        make_bullet(22, 80, &["sql"]),
                    ],
                ),
            ),
        ]
        .into_iter()
        .collect();
        let ranked = vec![make_ranked(story_a, 0.9), make_ranked(story_b, 0.6)];
        let reqs = make_requirements(&[("go", 1.0), ("sql", 1.0), ("kubernetes", 1.0)]);
        (ranked, reqs, items)
    }

    #[test]
    fn test_zero_caps_are_a_configuration_error() {
        let (ranked, reqs, items) = fixture();
        let budget = SpaceBudget {
            max_bullets: 0,
            max_lines: 10,
            sections: BTreeMap::new(),
        };
        let result = select(&ranked, &reqs, &items, &budget, &SelectionPolicy::default());
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_budget_caps_never_exceeded() {
        let (ranked, reqs, items) = fixture();
        for (max_bullets, max_lines) in [(1, 10), (2, 1), (3, 2), (10, 100)] {
            let budget = SpaceBudget::new(max_bullets, max_lines).unwrap();
            let plan = select(&ranked, &reqs, &items, &budget, &SelectionPolicy::default())
                .unwrap();
            assert!(plan.bullet_count() <= max_bullets);
            let lines: usize = plan.stories.iter().map(|s| s.estimated_lines).sum();
            assert!(lines <= max_lines, "lines {lines} > cap {max_lines}");
        }
    }

    #[test]
    fn test_nothing_fits_yields_empty_plan_not_error() {
        let (ranked, reqs, _) = fixture();
        // Every bullet is 3 estimated lines; only 1 line of budget.
        let story_id = ranked[0].story_id;
        let items: HashMap<Uuid, ExperienceItem> = [(
            story_id,
            make_story(
                story_id,
                "experience",
                vec![make_bullet(11, 250, &["go"])],
            ),
        )]
        .into_iter()
        .collect();
        let budget = SpaceBudget::new(5, 1).unwrap();
        let plan =
            select(&ranked, &reqs, &items, &budget, &SelectionPolicy::default()).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.coverage.score, 0.0);
    }

    #[test]
    fn test_max_bullets_one_picks_top_ranked_with_full_contribution() {
        // Budget of one bullet and generous lines: the top-ranked story's
        // best bullet wins and coverage equals its full contribution.
        let (ranked, reqs, items) = fixture();
        let budget = SpaceBudget::new(1, 100).unwrap();
        let policy = SelectionPolicy::default();
        let plan = select(&ranked, &reqs, &items, &budget, &policy).unwrap();

        assert_eq!(plan.bullet_count(), 1);
        assert_eq!(plan.stories[0].story_id, ranked[0].story_id);
        // bullet 11 covers go+sql out of {go, sql, kubernetes} — 2/3.
        assert_eq!(plan.stories[0].bullet_ids, vec![Uuid::from_u128(11)]);
        let skills = vec!["go".to_string(), "sql".to_string()];
        let expected = coverage_of(&[skills.as_slice()], &reqs, policy.redundancy_factor);
        assert!((plan.coverage.score - expected.score).abs() < 1e-9);
        assert!((plan.coverage.score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_diminishing_returns_prefers_new_skill_over_redundant() {
        // Story A (rank 0.9) has two "go" bullets; story B (rank 0.6) has
        // a "sql" bullet. With 2 slots the second pick must be B's sql
        // bullet: 0.6*1.0 beats 0.9*0.5 for redundant go coverage.
        let story_a = Uuid::from_u128(1);
        let story_b = Uuid::from_u128(2);
        let items: HashMap<Uuid, ExperienceItem> = [
            (
                story_a,
                make_story(
                    story_a,
                    "experience",
                    vec![
                        make_bullet(11, 80, &["go"]),
                        make_bullet(12, 80, &["go"]),
                    ],
                ),
            ),
            (
                story_b,
                make_story(story_b, "experience", vec![make_bullet(21, 80, &["sql"])]),
            ),
        ]
        .into_iter()
        .collect();
        let ranked = vec![make_ranked(story_a, 0.9), make_ranked(story_b, 0.6)];
        let reqs = make_requirements(&[("go", 1.0), ("sql", 1.0)]);
        let budget = SpaceBudget::new(2, 100).unwrap();
        let plan =
            select(&ranked, &reqs, &items, &budget, &SelectionPolicy::default()).unwrap();

        let mut picked: Vec<Uuid> = plan.bullet_ids().collect();
        picked.sort();
        assert!(picked.contains(&Uuid::from_u128(21)), "sql bullet selected");
        assert_eq!(plan.bullet_count(), 2);
        assert_eq!(plan.coverage.top_skills.len(), 2);
    }

    #[test]
    fn test_coverage_monotone_in_max_lines() {
        let (ranked, reqs, items) = fixture();
        let policy = SelectionPolicy::default();
        let mut previous = 0.0;
        for max_lines in [1, 2, 3, 4, 8, 20] {
            let budget = SpaceBudget::new(4, max_lines).unwrap();
            let plan = select(&ranked, &reqs, &items, &budget, &policy).unwrap();
            assert!(
                plan.coverage.score >= previous - 1e-9,
                "coverage dropped from {previous} to {} at max_lines={max_lines}",
                plan.coverage.score
            );
            previous = plan.coverage.score;
        }
    }

    #[test]
    fn test_coverage_monotone_with_heterogeneous_line_costs() {
        // Story A's single 3-line bullet covers only "a"; story B's two
        // 1-line bullets cover "b" and "c". Once the line budget admits
        // the wide bullet, it must not displace the pair — per-line
        // density keeps coverage from dropping as the budget grows.
        let story_a = Uuid::from_u128(1);
        let story_b = Uuid::from_u128(2);
        let items: HashMap<Uuid, ExperienceItem> = [
            (
                story_a,
                make_story(story_a, "experience", vec![make_bullet(11, 250, &["a"])]),
            ),
            (
                story_b,
                make_story(
                    story_b,
                    "experience",
                    vec![
                        make_bullet(21, 80, &["b"]),
                        make_bullet(22, 80, &["c"]),
                    ],
                ),
            ),
        ]
        .into_iter()
        .collect();
        let ranked = vec![make_ranked(story_a, 1.0), make_ranked(story_b, 0.9)];
        let reqs = make_requirements(&[("a", 1.0), ("b", 1.0), ("c", 1.0)]);
        let policy = SelectionPolicy::default();

        let mut previous = 0.0;
        for max_lines in [1, 2, 3, 4, 5, 8] {
            let budget = SpaceBudget::new(4, max_lines).unwrap();
            let plan = select(&ranked, &reqs, &items, &budget, &policy).unwrap();
            assert!(
                plan.coverage.score >= previous - 1e-9,
                "coverage dropped from {previous} to {} at max_lines={max_lines}",
                plan.coverage.score
            );
            previous = plan.coverage.score;
        }
        // With room for everything, all three skills are covered.
        assert!((previous - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_selection_deterministic_across_runs() {
        let (ranked, reqs, items) = fixture();
        let budget = SpaceBudget::new(3, 10).unwrap();
        let policy = SelectionPolicy::default();
        let a = select(&ranked, &reqs, &items, &budget, &policy).unwrap();
        let b = select(&ranked, &reqs, &items, &budget, &policy).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_section_sub_budget_respected() {
        let story_a = Uuid::from_u128(1);
        let story_b = Uuid::from_u128(2);
        let items: HashMap<Uuid, ExperienceItem> = [
            (
                story_a,
                make_story(
                    story_a,
                    "experience",
                    vec![
                        make_bullet(11, 80, &["go"]),
                        make_bullet(12, 80, &["sql"]),
                        make_bullet(13, 80, &["kubernetes"]),
                    ],
                ),
            ),
            (
                story_b,
                make_story(story_b, "project", vec![make_bullet(21, 80, &["rust"])]),
            ),
        ]
        .into_iter()
        .collect();
        let ranked = vec![make_ranked(story_a, 0.9), make_ranked(story_b, 0.8)];
        let reqs = make_requirements(&[
            ("go", 1.0),
            ("sql", 1.0),
            ("kubernetes", 1.0),
            ("rust", 1.0),
        ]);
        let budget = SpaceBudget::new(10, 100).unwrap().with_section(
            "experience",
            SectionBudget {
                max_bullets: Some(2),
                max_lines: None,
            },
        );
        let plan =
            select(&ranked, &reqs, &items, &budget, &SelectionPolicy::default()).unwrap();

        let experience_bullets: usize = plan
            .stories
            .iter()
            .filter(|s| s.section == "experience")
            .map(|s| s.bullet_ids.len())
            .sum();
        assert!(experience_bullets <= 2, "section cap exceeded");
        // The uncapped project section is unaffected.
        assert!(plan
            .stories
            .iter()
            .any(|s| s.section == "project" && s.bullet_ids.len() == 1));
    }

    #[test]
    fn test_zero_value_bullets_not_selected() {
        let story_a = Uuid::from_u128(1);
        let items: HashMap<Uuid, ExperienceItem> = [(
            story_a,
            make_story(
                story_a,
                "experience",
                vec![make_bullet(11, 80, &["cobol"])],
            ),
        )]
        .into_iter()
        .collect();
        let ranked = vec![make_ranked(story_a, 0.9)];
        let reqs = make_requirements(&[("go", 1.0)]);
        let budget = SpaceBudget::new(5, 100).unwrap();
        let plan =
            select(&ranked, &reqs, &items, &budget, &SelectionPolicy::default()).unwrap();
        assert!(plan.is_empty(), "no coverage gain means no selection");
    }

    #[test]
    fn test_coverage_of_halves_repeat_coverage() {
        let reqs = make_requirements(&[("go", 1.0), ("sql", 1.0)]);
        let go = vec!["go".to_string()];
        let sets: Vec<&[String]> = vec![go.as_slice(), go.as_slice()];
        let coverage = coverage_of(&sets, &reqs, 0.5);
        // (1.0 + 0.5) / 2.0
        assert!((coverage.score - 0.75).abs() < 1e-9);
        assert_eq!(coverage.top_skills, vec!["go"]);
    }

    #[test]
    fn test_recompute_coverage_after_drop() {
        let (ranked, reqs, items) = fixture();
        let budget = SpaceBudget::new(4, 100).unwrap();
        let policy = SelectionPolicy::default();
        let mut plan = select(&ranked, &reqs, &items, &budget, &policy).unwrap();
        let before = plan.coverage.score;

        let dropped = plan.bullet_ids().next().unwrap();
        plan.remove_bullet(dropped);
        recompute_coverage(&mut plan, &items, &reqs, &policy);
        assert!(plan.coverage.score <= before + 1e-9);
    }
}
