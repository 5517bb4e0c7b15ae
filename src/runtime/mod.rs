//! Run orchestration and process integration.

pub mod app;
pub mod signal;

pub use app::{run_maintenance, RunSummary};
pub use signal::spawn_interrupt_bridge;
