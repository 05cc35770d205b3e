// Iterative repair: pure action planning plus the render/validate/repair
// state machine.

pub mod actions;
pub mod controller;

pub use actions::{plan_repairs, RepairAction};
pub use controller::{run_repair_loop, RepairContext, RepairOutcome, RepairStatus};
