//! Daybook SDK
//!
//! Shared library providing the error surface, task data model, and collaborator
//! traits for Daybook components. This crate is used by the engine and by
//! anything that wants to plug an alternative memory backend into it.

/// Error types and handling
pub mod errors;

/// Memory search collaborator trait
pub mod memory;

/// Task data model shared across the pipeline
pub mod types;

// Re-export commonly used types
pub use errors::{DaybookErrorExt, EngineError};
pub use memory::{MemoryHit, MemorySearch};
pub use types::{ExtractedTask, Priority};
