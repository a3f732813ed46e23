//! Comment-preserving YAML documents.
//!
//! A block-structure model: mappings and sequences are real nodes, while
//! flow collections, block scalars and anchors stay verbatim scalars. Every
//! map entry and sequence item owns the comment and blank lines written
//! above it plus the comment at the end of its line, so an edited document
//! keeps its annotations. Unedited lines print byte for byte.

mod parser;
mod printer;

use crate::domain::convention::infer_indent;
use crate::domain::equality::{Canonical, squash_whitespace};
use crate::domain::error::{DomainError, DomainResult};

use printer::Printer;

/// A comment or blank line kept above an entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Blank,
    /// New comment text, printed as `# text` at the entry's column.
    Comment(String),
    /// A line copied from the source as it was.
    Verbatim(String),
}

/// Scalar text as written, quotes included.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scalar {
    raw: String,
}

impl Scalar {
    /// A string scalar, quoted when plain text would read as something else.
    pub fn new(value: &str) -> Self {
        let raw = if needs_quotes(value) {
            quote(value)
        } else {
            value.to_string()
        };
        Self { raw }
    }

    /// Verbatim scalar text: numbers, booleans, flow collections.
    pub fn raw(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn null() -> Self {
        Self::default()
    }

    pub fn as_raw(&self) -> &str {
        &self.raw
    }

    pub fn is_null(&self) -> bool {
        matches!(self.raw.trim(), "" | "~" | "null" | "Null" | "NULL")
    }

    /// The value with surrounding quotes removed.
    pub fn value(&self) -> String {
        unquote(&self.raw)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    /// Key as written, quotes included.
    pub key: String,
    pub value: YamlNode,
    pub leading: Vec<Annotation>,
    between: Option<String>,
    trailing: Option<String>,
}

impl MapEntry {
    pub fn new(key: &str, value: YamlNode) -> Self {
        let key = if needs_quotes(key) { quote(key) } else { key.to_string() };
        Self {
            key,
            value,
            leading: Vec::new(),
            between: None,
            trailing: None,
        }
    }

    pub fn with_comment(mut self, text: impl Into<String>) -> Self {
        self.leading.push(Annotation::Comment(text.into()));
        self
    }

    pub fn key(&self) -> String {
        unquote(&self.key)
    }

    /// The comment at the end of the entry's line, if any.
    pub fn trailing_comment(&self) -> Option<&str> {
        let text = self.trailing.as_deref()?.trim_start();
        text.strip_prefix('#').map(str::trim)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeqItem {
    pub value: YamlNode,
    pub leading: Vec<Annotation>,
    between: Option<String>,
    trailing: Option<String>,
    /// Collection value starts on the line after the dash.
    block: bool,
}

impl SeqItem {
    pub fn new(value: YamlNode) -> Self {
        Self {
            value,
            leading: Vec::new(),
            between: None,
            trailing: None,
            block: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mapping {
    pub entries: Vec<MapEntry>,
    indent: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sequence {
    pub items: Vec<SeqItem>,
    indent: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum YamlNode {
    Scalar(Scalar),
    Mapping(Mapping),
    Sequence(Sequence),
}

impl YamlNode {
    /// Shorthand for a string scalar node.
    pub fn scalar(value: &str) -> Self {
        Self::Scalar(Scalar::new(value))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "a scalar",
            Self::Mapping(_) => "a mapping",
            Self::Sequence(_) => "a sequence",
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Self::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    /// The node as a mapping; a null or `{}` value becomes an empty one.
    pub fn mapping_mut(&mut self) -> DomainResult<&mut Mapping> {
        let reset = matches!(self, Self::Scalar(s) if s.is_null() || s.raw.trim() == "{}");
        if reset {
            *self = Self::Mapping(Mapping::new());
        }
        match self {
            Self::Mapping(map) => Ok(map),
            other => Err(DomainError::shape("a YAML mapping", other.kind())),
        }
    }

    /// The node as a sequence; a null or `[]` value becomes an empty one.
    pub fn sequence_mut(&mut self) -> DomainResult<&mut Sequence> {
        let reset = matches!(self, Self::Scalar(s) if s.is_null() || s.raw.trim() == "[]");
        if reset {
            *self = Self::Sequence(Sequence::new());
        }
        match self {
            Self::Sequence(seq) => Ok(seq),
            other => Err(DomainError::shape("a YAML sequence", other.kind())),
        }
    }
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.key() == key)
    }

    pub fn get(&self, key: &str) -> Option<&YamlNode> {
        self.position(key).map(|i| &self.entries[i].value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut YamlNode> {
        let index = self.position(key)?;
        Some(&mut self.entries[index].value)
    }

    /// The value of `key`, appending `default()` when the key is missing.
    pub fn entry(&mut self, key: &str, default: impl FnOnce() -> YamlNode) -> &mut YamlNode {
        let index = match self.position(key) {
            Some(index) => index,
            None => {
                self.entries.push(MapEntry::new(key, default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].value
    }

    /// Set `key` to `value`, keeping the comments of an existing entry.
    /// Returns whether the mapping changed.
    pub fn set(&mut self, key: &str, value: YamlNode) -> bool {
        match self.position(key) {
            Some(index) if self.entries[index].value.canonical() == value.canonical() => false,
            Some(index) => {
                self.entries[index].value = value;
                true
            }
            None => {
                self.entries.push(MapEntry::new(key, value));
                true
            }
        }
    }

    /// Append a prepared entry unless its key exists.
    pub fn push(&mut self, entry: MapEntry) -> bool {
        if self.position(&entry.key()).is_some() {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn remove(&mut self, key: &str) -> Option<YamlNode> {
        let index = self.position(key)?;
        Some(self.entries.remove(index).value)
    }
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, value: &YamlNode) -> bool {
        let canonical = value.canonical();
        self.items.iter().any(|item| item.value.canonical() == canonical)
    }

    /// Append `value` unless an equal item exists. Quoting style does not
    /// take part in the comparison.
    pub fn push_unique(&mut self, value: YamlNode) -> bool {
        if self.contains(&value) {
            return false;
        }
        self.items.push(SeqItem::new(value));
        true
    }
}

impl Canonical for YamlNode {
    fn canonical(&self) -> String {
        match self {
            Self::Scalar(scalar) if scalar.is_null() => "~".into(),
            Self::Scalar(scalar) if scalar.raw.contains('\n') => squash_whitespace(&scalar.raw),
            Self::Scalar(scalar) => scalar.value(),
            Self::Mapping(map) => {
                let entries: Vec<String> = map
                    .entries
                    .iter()
                    .map(|e| format!("{}:{}", e.key(), e.value.canonical()))
                    .collect();
                format!("{{{}}}", entries.join(","))
            }
            Self::Sequence(seq) => {
                let items: Vec<String> = seq.items.iter().map(|i| i.value.canonical()).collect();
                format!("[{}]", items.join(","))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct YamlDocument {
    pub root: YamlNode,
    header: Vec<String>,
    footer: Vec<Annotation>,
    unit: usize,
    indentless: bool,
    trailing_newline: bool,
}

impl YamlDocument {
    /// Parse `text`. Empty input is an empty mapping.
    pub fn parse(text: &str) -> DomainResult<Self> {
        let parsed = parser::parse(text)?;
        let indent = infer_indent(text);
        let unit = if indent.starts_with(' ') { indent.len() } else { 2 };
        Ok(Self {
            root: parsed.root,
            header: parsed.header,
            footer: parsed.footer,
            unit,
            indentless: parsed.indentless.unwrap_or(false),
            trailing_newline: text.is_empty() || text.ends_with('\n'),
        })
    }

    pub fn generate_code(&self) -> String {
        let mut printer = Printer::new(self.unit, self.indentless);
        for line in &self.header {
            printer.verbatim(line);
        }
        printer.root(&self.root);
        printer.annotations(&self.footer, 0);
        let mut out = printer.finish();
        if !self.trailing_newline && out.ends_with('\n') {
            out.pop();
        }
        out
    }

    /// The top-level mapping; an empty document becomes one.
    pub fn root_mapping_mut(&mut self) -> DomainResult<&mut Mapping> {
        self.root.mapping_mut()
    }
}

fn needs_quotes(text: &str) -> bool {
    const INDICATORS: [char; 19] = [
        '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@',
        '`',
    ];
    text.is_empty()
        || text != text.trim()
        || text.starts_with(INDICATORS)
        || text.contains(": ")
        || text.contains(" #")
        || text.ends_with(':')
        || text.contains('\n')
        || matches!(
            text.to_ascii_lowercase().as_str(),
            "true" | "false" | "yes" | "no" | "on" | "off" | "null" | "~"
        )
        || text.parse::<f64>().is_ok()
}

fn quote(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    format!("\"{escaped}\"")
}

fn unquote(raw: &str) -> String {
    let raw = raw.trim();
    if raw.len() >= 2 {
        if let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
            return inner.replace("\\\"", "\"").replace("\\\\", "\\");
        }
        if let Some(inner) = raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
            return inner.replace("''", "'");
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = "\
# Site config
title: My site # inline
description: >
  A long
  folded text

nav:
  - title: Home
    url: /
  - title: Blog   # blog
    url: /blog
tags: [a, b]
matrix:
  - - 1
    - 2
empty:
# end
";

    #[test]
    fn unedited_document_round_trips() {
        let doc = YamlDocument::parse(SITE).unwrap();
        assert_eq!(doc.generate_code(), SITE);

        let header = "---\n# c\na: 1\n";
        assert_eq!(YamlDocument::parse(header).unwrap().generate_code(), header);
    }

    #[test]
    fn comments_survive_edits() {
        let mut doc = YamlDocument::parse(SITE).unwrap();
        let root = doc.root_mapping_mut().unwrap();
        assert_eq!(
            root.get("title").and_then(YamlNode::as_scalar).map(Scalar::value),
            Some("My site".to_string())
        );
        let nav = root.entry("nav", || YamlNode::Sequence(Sequence::new()));
        let mut about = Mapping::new();
        about.set("title", YamlNode::scalar("About"));
        about.set("url", YamlNode::scalar("/about"));
        assert!(nav.sequence_mut().unwrap().push_unique(YamlNode::Mapping(about.clone())));
        assert!(!nav.sequence_mut().unwrap().push_unique(YamlNode::Mapping(about)));
        assert!(root.set("title", YamlNode::scalar("Renamed")));

        let out = doc.generate_code();
        assert!(out.starts_with("# Site config\ntitle: Renamed # inline\n"));
        assert!(out.contains("    url: /blog\n  - title: About\n    url: /about\ntags: [a, b]\n"));
        assert!(out.ends_with("empty:\n# end\n"));
    }

    #[test]
    fn new_entries_follow_the_document_layout() {
        let mut doc = YamlDocument::parse("name: app # the app\nplugins:\n  - one\n").unwrap();
        let root = doc.root_mapping_mut().unwrap();
        let plugins = root
            .entry("plugins", || YamlNode::Sequence(Sequence::new()))
            .sequence_mut()
            .unwrap();
        assert!(plugins.push_unique(YamlNode::scalar("two")));
        assert!(!plugins.push_unique(YamlNode::Scalar(Scalar::raw("'one'"))));
        assert!(root.set("version", YamlNode::Scalar(Scalar::raw("2"))));
        assert!(!root.set("version", YamlNode::Scalar(Scalar::raw("2"))));

        let build = root
            .entry("build", || YamlNode::Mapping(Mapping::new()))
            .mapping_mut()
            .unwrap();
        build.set("out", YamlNode::scalar("dist"));
        let steps = build
            .entry("steps", || YamlNode::Sequence(Sequence::new()))
            .sequence_mut()
            .unwrap();
        let mut step = Mapping::new();
        step.set("run", YamlNode::scalar("npm test"));
        steps.push_unique(YamlNode::Mapping(step));

        assert_eq!(
            doc.generate_code(),
            "name: app # the app\nplugins:\n  - one\n  - two\nversion: 2\nbuild:\n  out: dist\n  steps:\n    - run: npm test\n"
        );
    }

    #[test]
    fn indentless_sequences_stay_indentless() {
        let mut doc = YamlDocument::parse("steps:\n- a\n- b\n").unwrap();
        let root = doc.root_mapping_mut().unwrap();
        root.entry("steps", || YamlNode::Sequence(Sequence::new()))
            .sequence_mut()
            .unwrap()
            .push_unique(YamlNode::scalar("c"));
        root.entry("more", || YamlNode::Sequence(Sequence::new()))
            .sequence_mut()
            .unwrap()
            .push_unique(YamlNode::scalar("x"));
        assert_eq!(doc.generate_code(), "steps:\n- a\n- b\n- c\nmore:\n- x\n");
    }

    #[test]
    fn null_values_become_collections() {
        let mut doc = YamlDocument::parse("a: 1\nplugins:\n").unwrap();
        let root = doc.root_mapping_mut().unwrap();
        let entry = MapEntry::new("on", YamlNode::Scalar(Scalar::raw("true"))).with_comment("enabled");
        assert!(root.push(entry));
        root.get_mut("plugins")
            .unwrap()
            .sequence_mut()
            .unwrap()
            .push_unique(YamlNode::scalar("yes"));
        assert_eq!(
            doc.generate_code(),
            "a: 1\nplugins:\n  - \"yes\"\n# enabled\n\"on\": true\n"
        );
        let err = doc.root.as_mapping().unwrap().get("a").cloned().unwrap().mapping_mut().unwrap_err();
        assert!(matches!(err, DomainError::UnexpectedShape { .. }));
    }

    #[test]
    fn empty_and_unterminated_documents() {
        let mut doc = YamlDocument::parse("").unwrap();
        doc.root_mapping_mut().unwrap().set("a", YamlNode::Scalar(Scalar::raw("1")));
        assert_eq!(doc.generate_code(), "a: 1\n");

        let mut doc = YamlDocument::parse("a: 1").unwrap();
        doc.root_mapping_mut().unwrap().set("b", YamlNode::Scalar(Scalar::raw("2")));
        assert_eq!(doc.generate_code(), "a: 1\nb: 2");
    }

    #[test]
    fn trailing_comments_are_readable() {
        let doc = YamlDocument::parse("a: 1   # note\n").unwrap();
        let map = doc.root.as_mapping().unwrap();
        assert_eq!(map.entries[0].trailing_comment(), Some("note"));
    }
}
