// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Grafter.
//!
//! Everything needed to merge a change into an existing source file without
//! clobbering what a human wrote there: a parser and printer per format,
//! convention inference, the comment side-table, and the idempotent mutation
//! primitives built on top.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: Adapters take text and return text
//! - **Idempotent**: Every upsert is a no-op when its target already exists
//! - **Round-trip safe**: Untouched input prints back unchanged
//!
// Public API - what the world sees
pub mod comments;
pub mod config;
pub mod convention;
pub mod css;
pub mod equality;
pub mod error;
pub mod markup;
pub mod node;
pub mod path;
pub mod script;

// Re-exports for convenience
pub use comments::{Comment, CommentForm, CommentTable, Placement};
pub use config::{JsonDocument, TomlDocument, YamlDocument, YamlNode};
pub use convention::{Convention, QuoteStyle, infer_indent, infer_quote_style};
pub use css::Stylesheet;
pub use equality::{Canonical, equal};
pub use error::{DomainError, DomainResult, ErrorCategory, SyntaxFormat};
pub use markup::Component;
pub use node::{NodeId, Origin};
pub use path::RelativePath;
pub use script::{ScriptTree, parse_expression, parse_statement, parse_statements};
