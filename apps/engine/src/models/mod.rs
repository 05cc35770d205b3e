pub mod plan;
pub mod story;

pub use plan::{Coverage, ResumePlan, SectionBudget, SelectedBullet, SelectedStory, SpaceBudget};
pub use story::{Bullet, EvidenceTier, ExperienceItem, Metric, Requirement};
