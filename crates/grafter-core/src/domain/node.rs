//! Node identity and origin metadata shared by every syntax tree.
//!
//! Identity ([`NodeId`]) keys the comment side-table; origin ([`Origin`])
//! remembers where a parsed node came from so the printers can re-emit an
//! untouched subtree byte-for-byte. Neither takes part in structural equality.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique node identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a fresh identity.
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Where a parsed node came from, plus the fingerprint it had at parse time.
#[derive(Debug, Clone)]
pub struct Origin {
    source: Arc<str>,
    span: Range<usize>,
    fingerprint: u64,
}

impl Origin {
    pub fn new(source: Arc<str>, span: Range<usize>) -> Self {
        Self {
            source,
            span,
            fingerprint: 0,
        }
    }

    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// The original source slice of the node.
    pub fn text(&self) -> &str {
        &self.source[self.span.clone()]
    }

    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub(crate) fn set_fingerprint(&mut self, fingerprint: u64) {
        self.fingerprint = fingerprint;
    }

    pub fn is_multiline(&self) -> bool {
        self.text().contains('\n')
    }

    /// Leading whitespace of the line the node starts on.
    pub fn base_indent(&self) -> &str {
        let line_start = self.source[..self.span.start]
            .rfind('\n')
            .map_or(0, |nl| nl + 1);
        let line = &self.source[line_start..];
        let width = line
            .bytes()
            .take_while(|b| *b == b' ' || *b == b'\t')
            .count();
        &line[..width]
    }

    /// Whether `other` was parsed from the same source text.
    pub fn same_source(&self, other: &Origin) -> bool {
        Arc::ptr_eq(&self.source, &other.source)
    }
}

/// Identity and origin carried by every attachable node.
#[derive(Debug, Clone)]
pub struct Meta {
    pub id: NodeId,
    pub origin: Option<Origin>,
}

impl Meta {
    /// Metadata for a node built programmatically.
    pub fn new() -> Self {
        Self {
            id: NodeId::fresh(),
            origin: None,
        }
    }

    pub fn parsed(id: NodeId, origin: Origin) -> Self {
        Self {
            id,
            origin: Some(origin),
        }
    }

    /// Forget where the node came from; it will be printed structurally.
    pub fn detach(&mut self) {
        self.origin = None;
    }

    /// Whether the node changed since it was parsed, given its current
    /// fingerprint.
    pub(crate) fn unchanged(&self, current: u64) -> Option<&Origin> {
        self.origin
            .as_ref()
            .filter(|origin| origin.fingerprint() == current)
    }
}

impl Default for Meta {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable hash of a formatting-aware print.
pub fn fingerprint(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Move a multi-line slice from one indentation base to another.
///
/// The first line is left alone (it continues whatever the caller already
/// emitted); every following line that starts with `from` gets it replaced
/// by `to`.
pub fn reindent(text: &str, from: &str, to: &str) -> String {
    if from == to || !text.contains('\n') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            match line.strip_prefix(from) {
                Some(rest) if !line.trim().is_empty() => {
                    out.push_str(to);
                    out.push_str(rest);
                }
                _ => out.push_str(line),
            }
        } else {
            out.push_str(line);
        }
    }
    out
}

/// Blank-line detection between two original siblings.
pub(crate) fn blank_line_between(source: &str, end: usize, start: usize) -> bool {
    if end >= start || start > source.len() {
        return false;
    }
    let gap = &source[end..start];
    let lines: Vec<&str> = gap.split('\n').collect();
    lines.len() > 2 && lines[1..lines.len() - 1].iter().any(|l| l.trim().is_empty())
}
