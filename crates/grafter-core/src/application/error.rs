//! Application layer errors.
//!
//! These errors represent failures in orchestration, not in merging itself.
//! Merge failures are `DomainError` from `crate::domain`; the edit service
//! wraps them with the addon and file they came from.

use thiserror::Error;

use crate::domain::DomainError;
use crate::error::ErrorCategory;

/// Errors that occur while applying an edit plan.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// An addon's edit function failed on one file.
    #[error("addon `{addon}` could not edit {path}: {source}")]
    EditFailed {
        addon: String,
        path: String,
        #[source]
        source: DomainError,
    },

    /// The current content of a file could not be read.
    #[error("cannot read {path}: {reason}")]
    ContentUnavailable { path: String, reason: String },

    /// The new content of a file could not be written.
    #[error("cannot write {path}: {reason}")]
    WriteFailed { path: String, reason: String },
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::EditFailed { addon, path, source } => {
                let mut tips = vec![format!("Addon `{addon}` stopped while editing {path}")];
                tips.extend(source.suggestions());
                tips.push("Edits already written by earlier addons were kept".into());
                tips
            }
            Self::ContentUnavailable { path, .. } => vec![
                format!("Failed to read: {path}"),
                "Check that the file is readable and valid UTF-8".into(),
            ],
            Self::WriteFailed { path, .. } => vec![
                format!("Failed to write: {path}"),
                "Check that you have write permissions".into(),
                "Ensure the parent directory is not a file".into(),
            ],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EditFailed { source, .. } => source.category().into(),
            Self::ContentUnavailable { .. } => ErrorCategory::NotFound,
            Self::WriteFailed { .. } => ErrorCategory::Internal,
        }
    }

    /// The addon an error belongs to, if any.
    pub fn addon(&self) -> Option<&str> {
        match self {
            Self::EditFailed { addon, .. } => Some(addon),
            _ => None,
        }
    }
}
