//! Driven (output) ports - implemented by infrastructure.

use crate::domain::RelativePath;
use crate::error::GrafterResult;

/// Port for reading the current content of project files.
///
/// Implemented by:
/// - `grafter_adapters::content::LocalContent` (production)
/// - `grafter_adapters::content::MemoryContent` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait ContentProvider: Send + Sync {
    /// Current text of `path`, or an empty string when the file does not
    /// exist.
    fn read(&self, path: &RelativePath) -> GrafterResult<String>;

    /// Check if the file exists.
    fn exists(&self, path: &RelativePath) -> bool;
}

/// Port for storing the final content of project files.
///
/// Every write is independent and final; there is no rollback.
#[cfg_attr(test, mockall::automock)]
pub trait ContentSink: Send + Sync {
    /// Replace the content of `path`, creating parent directories as needed.
    fn write(&self, path: &RelativePath, content: &str) -> GrafterResult<()>;
}
