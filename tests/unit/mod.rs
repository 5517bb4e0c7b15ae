//! Unit tests for individual components

mod cli_test;
mod config_test;
mod error_test;
mod exclusion_test;
mod partition_test;
mod report_test;
