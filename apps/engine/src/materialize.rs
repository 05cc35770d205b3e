//! Materializer — resolves a plan's bullet references into content.
//!
//! A dangling reference means upstream state is inconsistent, so it is a
//! hard `NotFound` error, never silently skipped. Repair rewrites are
//! applied as text overrides here; the resulting projection is read-only.

use std::collections::HashMap;

use uuid::Uuid;

use crate::errors::EngineError;
use crate::models::plan::{ResumePlan, SelectedBullet};
use crate::models::story::ExperienceItem;

/// Resolves every selected bullet id into its full content record, in
/// plan order.
pub fn materialize(
    plan: &ResumePlan,
    items_by_story: &HashMap<Uuid, ExperienceItem>,
) -> Result<Vec<SelectedBullet>, EngineError> {
    let mut bullets = Vec::with_capacity(plan.bullet_count());

    for story in &plan.stories {
        let item = items_by_story.get(&story.story_id).ok_or_else(|| {
            EngineError::NotFound(format!("story {} referenced by plan", story.story_id))
        })?;

        for bullet_id in &story.bullet_ids {
            let bullet = item.bullet(*bullet_id).ok_or_else(|| {
                EngineError::NotFound(format!(
                    "bullet {bullet_id} in story {} referenced by plan",
                    story.story_id
                ))
            })?;

            let (text, char_len) = match plan.rewrites.get(bullet_id) {
                Some(rewritten) => (rewritten.clone(), rewritten.chars().count()),
                None => (bullet.text.clone(), bullet.char_len),
            };

            bullets.push(SelectedBullet {
                story_id: story.story_id,
                bullet_id: *bullet_id,
                section: story.section.clone(),
                text,
                skills: bullet.skills.clone(),
                tier: bullet.tier,
                char_len,
                metrics: bullet.metrics.clone(),
            });
        }
    }

    Ok(bullets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::plan::{Coverage, SelectedStory, SpaceBudget};
    use crate::models::story::{Bullet, EvidenceTier};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn make_fixture() -> (ResumePlan, HashMap<Uuid, ExperienceItem>, Uuid, Uuid) {
        let story_id = Uuid::from_u128(1);
        let bullet_id = Uuid::from_u128(11);
        let item = ExperienceItem {
            id: story_id,
            company: "Acme".to_string(),
            role: "Engineer".to_string(),
            start: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            end: None,
            section: "experience".to_string(),
            bullets: vec![Bullet::new(
                bullet_id,
                "Reduced p99 latency by 40% with a rust rewrite",
                vec!["rust".to_string()],
                EvidenceTier::High,
            )],
        };
        let plan = ResumePlan {
            budget: SpaceBudget::new(5, 40).unwrap(),
            stories: vec![SelectedStory {
                story_id,
                bullet_ids: vec![bullet_id],
                section: "experience".to_string(),
                estimated_lines: 1,
            }],
            coverage: Coverage::default(),
            rewrites: BTreeMap::new(),
        };
        let items = [(story_id, item)].into_iter().collect();
        (plan, items, story_id, bullet_id)
    }

    #[test]
    fn test_materialize_resolves_all_references() {
        let (plan, items, story_id, bullet_id) = make_fixture();
        let bullets = materialize(&plan, &items).unwrap();
        assert_eq!(bullets.len(), 1);
        assert_eq!(bullets[0].story_id, story_id);
        assert_eq!(bullets[0].bullet_id, bullet_id);
        assert_eq!(bullets[0].skills, vec!["rust"]);
    }

    #[test]
    fn test_missing_story_is_not_found() {
        let (plan, _, _, _) = make_fixture();
        let empty: HashMap<Uuid, ExperienceItem> = HashMap::new();
        let err = materialize(&plan, &empty).unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
        assert!(err.to_string().contains(&plan.stories[0].story_id.to_string()));
    }

    #[test]
    fn test_missing_bullet_is_not_found() {
        let (mut plan, items, _, _) = make_fixture();
        let phantom = Uuid::from_u128(999);
        plan.stories[0].bullet_ids.push(phantom);
        let err = materialize(&plan, &items).unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
        assert!(err.to_string().contains(&phantom.to_string()));
    }

    #[test]
    fn test_rewrite_override_replaces_text_and_length() {
        let (mut plan, items, _, bullet_id) = make_fixture();
        plan.rewrites
            .insert(bullet_id, "Cut p99 latency 40%".to_string());
        let bullets = materialize(&plan, &items).unwrap();
        assert_eq!(bullets[0].text, "Cut p99 latency 40%");
        assert_eq!(bullets[0].char_len, 19);
    }
}
