use std::fmt;
use std::path::{Component, Path, PathBuf};

use super::error::DomainError;

/// A project-relative file path. Edits never address files outside the
/// project root, so absolute paths and `..` segments are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath(PathBuf);

impl RelativePath {
    pub fn try_new(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();
        if path.is_absolute() || path.has_root() {
            return Err(DomainError::AbsolutePathNotAllowed {
                path: path.display().to_string(),
            });
        }
        if path.components().any(|c| c == Component::ParentDir) {
            return Err(DomainError::InvalidInput(format!(
                "path escapes the project root: {}",
                path.display()
            )));
        }
        if path.as_os_str().is_empty() {
            return Err(DomainError::InvalidInput("empty file path".into()));
        }
        Ok(Self(path))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Lowercased extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.0
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }
}

impl AsRef<Path> for RelativePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl TryFrom<&str> for RelativePath {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::try_new(s)
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_nested_relative_paths() {
        let path = RelativePath::try_new("src/routes/+layout.svelte").unwrap();
        assert_eq!(path.extension().as_deref(), Some("svelte"));
        assert_eq!(path.to_string(), "src/routes/+layout.svelte");
    }

    #[test]
    fn rejects_paths_outside_the_project() {
        assert!(matches!(
            RelativePath::try_new("/etc/passwd"),
            Err(DomainError::AbsolutePathNotAllowed { .. })
        ));
        assert!(matches!(
            RelativePath::try_new("../outside.js"),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(RelativePath::try_new("").is_err());
    }
}
