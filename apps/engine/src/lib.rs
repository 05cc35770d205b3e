//! Constrained selection and iterative repair engine for resume tailoring.
//!
//! The pipeline ranks experience records against a job's requirements,
//! selects a budget-respecting subset of bullets that maximizes skill
//! coverage, and repairs the typeset rendering until hard constraints
//! pass or the iteration ceiling is reached. External collaborators
//! (judgment, rewrite, render) plug in behind the traits in [`services`];
//! [`services::LlmClient`] is the HTTP-backed default for the first two.
//!
//! Entry point: [`pipeline::tailor`]. Individual stages are public for
//! callers that need finer control.

pub mod config;
pub mod errors;
pub mod materialize;
pub mod models;
pub mod pipeline;
pub mod repair;
pub mod scoring;
pub mod selection;
pub mod services;
pub mod telemetry;
pub mod validation;

pub use config::{EngineConfig, RepairPolicy, ScoringWeights, SelectionPolicy};
pub use errors::EngineError;
pub use materialize::materialize;
pub use models::{
    Bullet, Coverage, EvidenceTier, ExperienceItem, Metric, Requirement, ResumePlan,
    SectionBudget, SelectedBullet, SelectedStory, SpaceBudget,
};
pub use pipeline::{tailor, TailorOutput, TailorRequest};
pub use repair::{run_repair_loop, RepairAction, RepairOutcome, RepairStatus};
pub use scoring::{rank, RankedStory};
pub use selection::select;
pub use services::{
    JudgmentScore, JudgmentService, LlmClient, RenderService, RenderedDocument, RewriteService,
};
pub use validation::{validate, Constraints, Violation, ViolationKind};
