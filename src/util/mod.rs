//! Status output and telemetry helpers.

pub mod report;
pub mod telemetry;

pub use report::{CapturedOutput, ReportOptions, Reporter};
pub use telemetry::init_tracing;
