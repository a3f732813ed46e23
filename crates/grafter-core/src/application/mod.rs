//! Application layer for Grafter.
//!
//! This layer contains:
//! - **Edits**: The `(path, edit)` unit addons register, plus typed helpers
//! - **Services**: Applying an edit plan through the ports
//! - **Ports**: Interface definitions (traits) for file content
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! merge logic itself. All of that lives in `crate::domain`.

pub mod edits;
pub mod error;
pub mod ports;
pub mod services;

pub use edits::{
    EditPlan, FileEdit, FileKind, Signals, edit_component, edit_css, edit_json, edit_script,
    edit_toml, edit_yaml,
};
pub use error::ApplicationError;
pub use ports::{ContentProvider, ContentSink};
pub use services::{EditReport, EditService, FailurePolicy, FileOutcome, FileStatus};
