// ============================================================================
// domain/error.rs - ENGINE ERROR DOMAIN
// ============================================================================

use std::fmt;

use thiserror::Error;

/// Syntax family a parse failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxFormat {
    Script,
    Stylesheet,
    Markup,
    Json,
    Toml,
    Yaml,
}

impl SyntaxFormat {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Stylesheet => "stylesheet",
            Self::Markup => "markup",
            Self::Json => "json",
            Self::Toml => "toml",
            Self::Yaml => "yaml",
        }
    }
}

impl fmt::Display for SyntaxFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (edits may be retried by the orchestrator)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Parse Errors
    // ========================================================================
    #[error("failed to parse {format} at line {line}, column {column}: {message}")]
    Parse {
        format: SyntaxFormat,
        message: String,
        line: usize,
        column: usize,
    },

    // ========================================================================
    // Shape Errors
    // ========================================================================
    #[error("unexpected shape: expected {expected}, found {found}")]
    UnexpectedShape { expected: String, found: String },

    // ========================================================================
    // Constraint Violations
    // ========================================================================
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("Absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },
}

impl DomainError {
    /// Build a parse error, translating a byte offset into a 1-based line and
    /// column.
    pub fn parse_at(
        format: SyntaxFormat,
        source: &str,
        offset: usize,
        message: impl Into<String>,
    ) -> Self {
        let (line, column) = line_column(source, offset);
        Self::Parse {
            format,
            message: message.into(),
            line,
            column,
        }
    }

    pub fn shape(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedShape {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Parse { format, .. } => vec![
                format!("The existing {format} file is not valid and cannot be merged into"),
                "Fix the syntax error by hand and re-run the add-on".into(),
            ],
            Self::UnexpectedShape { expected, .. } => vec![
                format!("The file does not contain {expected}"),
                "The existing content is too unusual to merge automatically".into(),
                "Apply the change by hand, or restore the file to its generated form".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Parse { .. } => ErrorCategory::Syntax,
            Self::UnexpectedShape { .. } => ErrorCategory::Shape,
            Self::InvalidInput(_) | Self::AbsolutePathNotAllowed { .. } => {
                ErrorCategory::Validation
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Syntax,
    Shape,
    Validation,
}

/// Convenient result alias for engine operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// 1-based line and column of a byte offset.
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..floor_char_boundary(source, offset)];
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(nl) => before[nl + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line, column)
}

fn floor_char_boundary(source: &str, mut offset: usize) -> usize {
    while offset > 0 && !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_column_counts_from_one() {
        let src = "ab\ncd\nef";
        assert_eq!(line_column(src, 0), (1, 1));
        assert_eq!(line_column(src, 4), (2, 2));
        assert_eq!(line_column(src, 100), (3, 3));
    }

    #[test]
    fn parse_error_mentions_format_and_position() {
        let err = DomainError::parse_at(SyntaxFormat::Json, "{\n  x", 4, "expected ':'");
        let msg = err.to_string();
        assert!(msg.contains("json"));
        assert!(msg.contains("line 2"));
        assert_eq!(err.category(), ErrorCategory::Syntax);
    }

    #[test]
    fn shape_error_suggests_manual_edit() {
        let err = DomainError::shape("a default export", "nothing");
        assert!(err.suggestions().iter().any(|s| s.contains("by hand")));
    }
}
