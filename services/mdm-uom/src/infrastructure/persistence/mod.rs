//! Persistence implementations

mod memory;
mod snapshot;

pub use memory::{InMemoryConversionRepository, InMemoryUnitRepository};
pub use snapshot::Snapshot;
