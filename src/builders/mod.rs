//! Builders to construct a run from configuration.

pub mod plan;

pub use plan::{build_plan, RunPlan};
