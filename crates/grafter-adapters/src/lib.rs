//! Infrastructure adapters for Grafter.
//!
//! This crate implements the ports defined in `grafter-core::application::ports`.
//! It contains all filesystem access and I/O operations.

pub mod content;
pub mod recipe;
pub mod scanner;

// Re-export commonly used adapters
pub use content::{LocalContent, MemoryContent};
pub use recipe::{Recipe, RecipeLoader, Step};
pub use scanner::{ProjectScanner, ScannedFile};
