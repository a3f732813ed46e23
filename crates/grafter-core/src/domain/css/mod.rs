//! Stylesheet adapter.
//!
//! Unlike scripts, stylesheets keep comments as ordinary nodes. Every parsed
//! node remembers the exact whitespace around it, so an untouched stylesheet
//! prints back byte-for-byte, and new nodes borrow spacing from their
//! siblings or fall back to the file's indentation unit.

pub mod ops;
mod parser;
mod printer;

use tracing::debug;

use crate::domain::convention::Convention;
use crate::domain::equality::{Canonical, squash_whitespace};
use crate::domain::error::DomainResult;

pub use ops::{
    Container, add_at_rule, add_declaration, add_import, add_rule, find_at_rule, find_rule,
    remove_declaration, remove_rule,
};

/// Whitespace and punctuation a node was written with.
///
/// `None` everywhere for nodes built programmatically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Raws {
    /// Whitespace before the node.
    pub(crate) before: Option<String>,
    /// Rules and at-rules: before `{`. Declarations: the colon with its spacing.
    pub(crate) between: Option<String>,
    /// Between an at-rule's name and its params.
    pub(crate) after_name: Option<String>,
    /// Containers: before `}`. Statements: before `;`.
    pub(crate) after: Option<String>,
    /// Whether the container's last statement ended with `;`.
    pub(crate) semicolon: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub selector: String,
    pub nodes: Vec<CssNode>,
    pub(crate) raws: Raws,
}

impl Rule {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            nodes: Vec::new(),
            raws: Raws::default(),
        }
    }
}

/// `@name params;` or `@name params { ... }`.
#[derive(Debug, Clone)]
pub struct AtRule {
    pub name: String,
    pub params: String,
    /// `None` for statement at-rules such as `@import`.
    pub nodes: Option<Vec<CssNode>>,
    pub(crate) raws: Raws,
}

impl AtRule {
    pub fn new(name: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
            nodes: None,
            raws: Raws::default(),
        }
    }

    pub fn has_block(&self) -> bool {
        self.nodes.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Decl {
    pub prop: String,
    pub value: String,
    pub(crate) raws: Raws,
}

impl Decl {
    pub fn new(prop: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            prop: prop.into(),
            value: value.into(),
            raws: Raws::default(),
        }
    }
}

/// `/* text */`, delimiters excluded.
#[derive(Debug, Clone)]
pub struct CssComment {
    pub text: String,
    pub(crate) raws: Raws,
}

impl CssComment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            raws: Raws::default(),
        }
    }
}

/// A statement that is neither a declaration nor an at-rule, kept as written.
#[derive(Debug, Clone)]
pub struct RawCss {
    pub text: String,
    pub(crate) raws: Raws,
}

#[derive(Debug, Clone)]
pub enum CssNode {
    Rule(Rule),
    AtRule(AtRule),
    Decl(Decl),
    Comment(CssComment),
    Raw(RawCss),
}

impl CssNode {
    pub(crate) fn raws(&self) -> &Raws {
        match self {
            Self::Rule(n) => &n.raws,
            Self::AtRule(n) => &n.raws,
            Self::Decl(n) => &n.raws,
            Self::Comment(n) => &n.raws,
            Self::Raw(n) => &n.raws,
        }
    }

    pub(crate) fn raws_mut(&mut self) -> &mut Raws {
        match self {
            Self::Rule(n) => &mut n.raws,
            Self::AtRule(n) => &mut n.raws,
            Self::Decl(n) => &mut n.raws,
            Self::Comment(n) => &mut n.raws,
            Self::Raw(n) => &mut n.raws,
        }
    }

    /// Nodes terminated by `;` rather than a block.
    pub(crate) fn is_statement(&self) -> bool {
        match self {
            Self::Decl(_) | Self::Raw(_) => true,
            Self::AtRule(at) => !at.has_block(),
            Self::Rule(_) | Self::Comment(_) => false,
        }
    }

    /// Built by a mutation rather than parsed.
    pub(crate) fn is_new(&self) -> bool {
        self.raws().before.is_none()
    }

    pub fn as_rule(&self) -> Option<&Rule> {
        match self {
            Self::Rule(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn as_at_rule(&self) -> Option<&AtRule> {
        match self {
            Self::AtRule(at) => Some(at),
            _ => None,
        }
    }

    pub fn as_decl(&self) -> Option<&Decl> {
        match self {
            Self::Decl(decl) => Some(decl),
            _ => None,
        }
    }
}

impl From<Rule> for CssNode {
    fn from(rule: Rule) -> Self {
        Self::Rule(rule)
    }
}

impl From<AtRule> for CssNode {
    fn from(at: AtRule) -> Self {
        Self::AtRule(at)
    }
}

impl From<Decl> for CssNode {
    fn from(decl: Decl) -> Self {
        Self::Decl(decl)
    }
}

impl From<CssComment> for CssNode {
    fn from(comment: CssComment) -> Self {
        Self::Comment(comment)
    }
}

impl Canonical for CssNode {
    fn canonical(&self) -> String {
        match self {
            Self::Rule(rule) => format!(
                "{}{{{}}}",
                squash_whitespace(&rule.selector),
                rule.nodes.canonical()
            ),
            Self::AtRule(at) => {
                let mut out = format!("@{} {}", at.name, squash_whitespace(&at.params));
                if let Some(nodes) = &at.nodes {
                    out.push('{');
                    out.push_str(&nodes.canonical());
                    out.push('}');
                }
                out
            }
            Self::Decl(decl) => format!("{}:{}", decl.prop, squash_whitespace(&decl.value)),
            Self::Comment(comment) => format!("/*{}*/", comment.text.trim()),
            Self::Raw(raw) => squash_whitespace(&raw.text),
        }
    }
}

/// A parsed stylesheet.
#[derive(Debug, Clone)]
pub struct Stylesheet {
    pub nodes: Vec<CssNode>,
    pub(crate) raws: Raws,
    convention: Convention,
    /// Indentation level of the top-level nodes; non-zero inside `<style>`.
    base_level: usize,
}

impl Stylesheet {
    pub fn parse(text: &str) -> DomainResult<Self> {
        Self::parse_with(text, Convention::infer(text), 0)
    }

    /// Parse the body of a markup `<style>` region.
    pub(crate) fn parse_embedded(text: &str, indent: &str, base_level: usize) -> DomainResult<Self> {
        let convention = Convention {
            indent: indent.to_string(),
            quote: None,
        };
        Self::parse_with(text, convention, base_level)
    }

    pub(crate) fn empty_embedded(indent: &str, base_level: usize) -> Self {
        Self {
            nodes: Vec::new(),
            raws: Raws::default(),
            convention: Convention {
                indent: indent.to_string(),
                quote: None,
            },
            base_level,
        }
    }

    fn parse_with(text: &str, convention: Convention, base_level: usize) -> DomainResult<Self> {
        let body = parser::parse(text)?;
        debug!(
            nodes = body.nodes.len(),
            indent = ?convention.indent,
            "parsed stylesheet"
        );
        let raws = Raws {
            // An empty file has nothing to preserve; new content gets a
            // trailing newline.
            after: (!text.is_empty()).then_some(body.after),
            semicolon: body.semicolon,
            ..Raws::default()
        };
        Ok(Self {
            nodes: body.nodes,
            raws,
            convention,
            base_level,
        })
    }

    pub fn generate_code(&self) -> String {
        printer::Printer::new(&self.convention.indent).stylesheet(self)
    }

    pub fn convention(&self) -> &Convention {
        &self.convention
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn base_level(&self) -> usize {
        self.base_level
    }
}
