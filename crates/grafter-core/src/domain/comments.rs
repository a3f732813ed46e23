//! Comment side-table.
//!
//! Script grammars do not make comments part of the tree, yet structural
//! mutation moves and regenerates nodes whose comments must follow them. The
//! table associates comments with node *identity*, so two structurally-equal
//! nodes can carry different comments.

use std::collections::HashMap;
use std::ops::Range;

use crate::domain::node::NodeId;

/// Line (`// ...`) or block (`/* ... */`) comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentForm {
    Line,
    Block,
}

/// A comment's form and its text without delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Comment {
    pub form: CommentForm,
    pub text: String,
}

impl Comment {
    pub fn line(text: impl Into<String>) -> Self {
        Self {
            form: CommentForm::Line,
            text: text.into(),
        }
    }

    pub fn block(text: impl Into<String>) -> Self {
        Self {
            form: CommentForm::Block,
            text: text.into(),
        }
    }

    /// Tool directives such as `// @ts-check` or `/* eslint-disable */`.
    pub fn is_pragma(&self) -> bool {
        let text = self.text.trim_start_matches('*').trim_start();
        text.starts_with('@') || text.starts_with("eslint") || text.starts_with("prettier-ignore")
    }

    /// Source form, delimiters included.
    pub fn render(&self) -> String {
        match self.form {
            CommentForm::Line => format!("//{}", self.text),
            CommentForm::Block => format!("/*{}*/", self.text),
        }
    }
}

/// Where a comment sits relative to its owning node.
///
/// `Inner` is only used for containers (blocks, objects, arrays) that hold
/// comments but no items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    #[default]
    Leading,
    Trailing,
    Inner,
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) comment: Comment,
    /// Byte range in the parsed source; `None` for synthesized comments.
    pub(crate) span: Option<Range<usize>>,
    /// Index into the grammar-sourced list, if the comment came from parsing.
    source: Option<usize>,
}

#[derive(Debug, Clone)]
struct SourceComment {
    comment: Comment,
    span: Range<usize>,
    removed: bool,
}

/// Out-of-band node → comments association.
#[derive(Debug, Clone, Default)]
pub struct CommentTable {
    original: Vec<SourceComment>,
    leading: HashMap<NodeId, Vec<Entry>>,
    trailing: HashMap<NodeId, Vec<Entry>>,
    inner: HashMap<NodeId, Vec<Entry>>,
}

impl CommentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a grammar-sourced comment; returns its index.
    pub(crate) fn push_original(&mut self, comment: Comment, span: Range<usize>) -> usize {
        self.original.push(SourceComment {
            comment,
            span,
            removed: false,
        });
        self.original.len() - 1
    }

    /// Attach a grammar-sourced comment to a node.
    pub(crate) fn attach_original(&mut self, index: usize, node: NodeId, placement: Placement) {
        let Some(source) = self.original.get(index) else {
            return;
        };
        let entry = Entry {
            comment: source.comment.clone(),
            span: Some(source.span.clone()),
            source: Some(index),
        };
        self.list_mut(node, placement).push(entry);
    }

    /// Attach `comment` to `node` unless the same text is already there.
    ///
    /// Returns `true` when the comment was added.
    pub fn add(&mut self, node: NodeId, comment: Comment, placement: Placement) -> bool {
        let list = self.list_mut(node, placement);
        if list.iter().any(|e| e.comment.text == comment.text) {
            return false;
        }
        list.push(Entry {
            comment,
            span: None,
            source: None,
        });
        true
    }

    /// Drop grammar-sourced comments matching `predicate`, wherever they were
    /// attached. Returns how many were removed.
    pub fn remove<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Comment) -> bool,
    {
        let mut removed = Vec::new();
        for (index, source) in self.original.iter_mut().enumerate() {
            if !source.removed && predicate(&source.comment) {
                source.removed = true;
                removed.push(index);
            }
        }
        if removed.is_empty() {
            return 0;
        }
        let lists = self
            .leading
            .values_mut()
            .chain(self.trailing.values_mut())
            .chain(self.inner.values_mut());
        for list in lists {
            list.retain(|e| e.source.is_none_or(|i| !removed.contains(&i)));
        }
        removed.len()
    }

    /// Comments printed before `node`.
    pub fn leading(&self, node: NodeId) -> impl Iterator<Item = &Comment> {
        self.leading
            .get(&node)
            .into_iter()
            .flatten()
            .map(|e| &e.comment)
    }

    /// Comments printed after `node`, on the same line.
    pub fn trailing(&self, node: NodeId) -> impl Iterator<Item = &Comment> {
        self.trailing
            .get(&node)
            .into_iter()
            .flatten()
            .map(|e| &e.comment)
    }

    pub fn has_any(&self, node: NodeId) -> bool {
        [Placement::Leading, Placement::Trailing, Placement::Inner]
            .into_iter()
            .any(|p| !self.entries(node, p).is_empty())
    }

    /// Whether any comment around `node` is a line comment, which forces the
    /// surrounding list onto multiple lines.
    pub(crate) fn has_line_comment(&self, node: NodeId) -> bool {
        [Placement::Leading, Placement::Trailing, Placement::Inner]
            .into_iter()
            .flat_map(|p| self.entries(node, p))
            .any(|e| e.comment.form == CommentForm::Line)
    }

    pub(crate) fn entries(&self, node: NodeId, placement: Placement) -> &[Entry] {
        let map = match placement {
            Placement::Leading => &self.leading,
            Placement::Trailing => &self.trailing,
            Placement::Inner => &self.inner,
        };
        map.get(&node).map_or(&[], Vec::as_slice)
    }

    fn list_mut(&mut self, node: NodeId, placement: Placement) -> &mut Vec<Entry> {
        match placement {
            Placement::Leading => self.leading.entry(node).or_default(),
            Placement::Trailing => self.trailing.entry(node).or_default(),
            Placement::Inner => self.inner.entry(node).or_default(),
        }
    }
}
