//! Application ports (traits) for external dependencies.
//!
//! The engine is content-in, content-out. Adapters in `grafter-adapters`
//! decide where content comes from and where it goes.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `ContentProvider`: Current file content
//!   - `ContentSink`: Final file content

pub mod output;

pub use output::{ContentProvider, ContentSink};

#[cfg(test)]
pub use output::{MockContentProvider, MockContentSink};
