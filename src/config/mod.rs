//! Configuration models for runs and workers.

pub mod run;

pub use run::{Credentials, Mode, RunConfig, Throttle, WorkerConfig};
