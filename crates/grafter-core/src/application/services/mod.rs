//! Application services - orchestrate use cases.

pub mod edit_service;

pub use edit_service::{EditReport, EditService, FailurePolicy, FileOutcome, FileStatus};
