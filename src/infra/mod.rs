//! Resource client backends.

pub mod memory;
pub mod postgres;

pub use memory::{FleetEvent, InMemoryFleet, MemoryConnection};
pub use postgres::{PgClient, PgSession};
