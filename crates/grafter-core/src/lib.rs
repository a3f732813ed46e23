//! Grafter Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers of Grafter, an
//! engine that merges generated fragments into existing source files:
//! imports into import lists, properties into config objects, plugins into
//! plugin arrays, markup into components. Every operation is idempotent and
//! leaves untouched code, comments and formatting alone.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           grafter-cli (CLI)             │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │     (EditService, EditPlan, helpers)    │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │    (ContentProvider, ContentSink)       │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    grafter-adapters (Infrastructure)    │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │  (format adapters, primitives, merges)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use grafter_core::prelude::*;
//! use grafter_core::domain::script::ops::imports::add_named;
//!
//! let out = edit_script("run();\n", |tree| {
//!     add_named(&mut tree.program, "pkg", ["foo"], false);
//!     Ok(())
//! })
//! .unwrap();
//! assert_eq!(out, "import { foo } from 'pkg';\n\nrun();\n");
//! ```

pub mod application;
pub mod domain;
pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        ApplicationError, EditPlan, EditReport, EditService, FailurePolicy, FileKind, FileStatus,
        edit_component, edit_css, edit_json, edit_script, edit_toml, edit_yaml,
        ports::{ContentProvider, ContentSink},
    };
    pub use crate::domain::{
        Component, Convention, DomainError, DomainResult, JsonDocument, QuoteStyle,
        RelativePath, ScriptTree, Stylesheet, TomlDocument, YamlDocument, YamlNode, equal,
        infer_indent, infer_quote_style,
    };
    pub use crate::error::{GrafterError, GrafterResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
