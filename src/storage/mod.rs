//! Storage implementations for the repository seam

#[cfg(feature = "in-memory")]
pub mod in_memory;

#[cfg(feature = "in-memory")]
pub use in_memory::{InMemoryRepository, RelationDef, RelationKind};
