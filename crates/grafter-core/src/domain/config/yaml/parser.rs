//! Line-oriented block YAML reader.
//!
//! Only the block structure is modelled. Flow collections, block scalars and
//! multi-line plain scalars become verbatim scalars, and comment or blank
//! lines are gathered into the leading annotations of the next entry.

use std::mem;

use crate::domain::error::{DomainError, DomainResult, SyntaxFormat};

use super::{Annotation, MapEntry, Mapping, Scalar, SeqItem, Sequence, YamlNode};

pub(super) struct Parsed {
    pub root: YamlNode,
    pub header: Vec<String>,
    pub footer: Vec<Annotation>,
    /// Whether block sequences under a key sit at the key's own column.
    pub indentless: Option<bool>,
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    raw: &'a str,
    offset: usize,
    indent: usize,
    content: &'a str,
    tabbed: bool,
}

impl<'a> Line<'a> {
    fn new(raw: &'a str, offset: usize) -> Self {
        let indent = raw.len() - raw.trim_start_matches(' ').len();
        let content = raw.trim_start_matches([' ', '\t']);
        let tabbed = raw[..raw.len() - content.len()].contains('\t');
        Self {
            raw,
            offset,
            indent,
            content,
            tabbed,
        }
    }

    fn is_blank(&self) -> bool {
        self.content.trim_end().is_empty()
    }

    fn is_trivia(&self) -> bool {
        self.is_blank() || self.content.starts_with('#')
    }
}

pub(super) fn parse(src: &str) -> DomainResult<Parsed> {
    let body = src.strip_suffix('\n').unwrap_or(src);
    let mut lines = Vec::new();
    if !body.is_empty() {
        let mut offset = 0;
        for raw in body.split('\n') {
            lines.push(Line::new(raw, offset));
            offset += raw.len() + 1;
        }
    }

    let start = header_end(&lines);
    let header = lines[..start].iter().map(|l| l.raw.to_string()).collect();
    let mut parser = Parser {
        src,
        lines,
        pos: start,
        pending: Vec::new(),
        indentless: None,
    };
    let root = parser.root()?;
    if let Some(line) = parser.peek()? {
        return Err(parser.error(&line, "unexpected content after the document"));
    }
    Ok(Parsed {
        root,
        header,
        footer: mem::take(&mut parser.pending),
        indentless: parser.indentless,
    })
}

/// Lines up to and including a leading `---` marker.
fn header_end(lines: &[Line<'_>]) -> usize {
    for (i, line) in lines.iter().enumerate() {
        if line.is_trivia() || line.content.starts_with('%') {
            continue;
        }
        return if line.content.trim_end() == "---" { i + 1 } else { 0 };
    }
    0
}

struct Parser<'a> {
    src: &'a str,
    lines: Vec<Line<'a>>,
    pos: usize,
    pending: Vec<Annotation>,
    indentless: Option<bool>,
}

impl<'a> Parser<'a> {
    fn error(&self, line: &Line<'_>, message: impl Into<String>) -> DomainError {
        DomainError::parse_at(SyntaxFormat::Yaml, self.src, line.offset + line.indent, message)
    }

    /// Next structural line, moving comment and blank lines into `pending`.
    fn peek(&mut self) -> DomainResult<Option<Line<'a>>> {
        while let Some(line) = self.lines.get(self.pos).copied() {
            if !line.is_trivia() {
                if line.tabbed {
                    return Err(self.error(&line, "tabs are not allowed in indentation"));
                }
                return Ok(Some(line));
            }
            self.pending.push(if line.raw.is_empty() {
                Annotation::Blank
            } else {
                Annotation::Verbatim(line.raw.to_string())
            });
            self.pos += 1;
        }
        Ok(None)
    }

    fn root(&mut self) -> DomainResult<YamlNode> {
        match self.peek()? {
            None => Ok(YamlNode::Mapping(Mapping::new())),
            Some(line) if is_item(line.content) || split_key(line.content).is_some() => {
                self.block(line)
            }
            Some(line) => Ok(YamlNode::Scalar(Scalar::raw(self.bare_scalar(line.indent)))),
        }
    }

    fn block(&mut self, line: Line<'a>) -> DomainResult<YamlNode> {
        if is_item(line.content) {
            Ok(YamlNode::Sequence(self.sequence(line.indent)?))
        } else {
            Ok(YamlNode::Mapping(self.mapping(line.indent)?))
        }
    }

    /// The value that follows a `key:` or `-` with nothing after it.
    fn child(&mut self, parent: usize, under_key: bool) -> DomainResult<YamlNode> {
        let Some(line) = self.peek()? else {
            return Ok(YamlNode::Scalar(Scalar::null()));
        };
        if line.indent > parent {
            if is_item(line.content) {
                if under_key {
                    self.indentless.get_or_insert(false);
                }
                return self.block(line);
            }
            if split_key(line.content).is_some() {
                return self.block(line);
            }
            let text = self.bare_scalar(line.indent);
            return Ok(YamlNode::Scalar(Scalar::raw(format!("\n{text}"))));
        }
        if under_key && line.indent == parent && is_item(line.content) {
            self.indentless.get_or_insert(true);
            return Ok(YamlNode::Sequence(self.sequence(parent)?));
        }
        Ok(YamlNode::Scalar(Scalar::null()))
    }

    fn mapping(&mut self, col: usize) -> DomainResult<Mapping> {
        let mut entries = Vec::new();
        while let Some(line) = self.peek()? {
            if line.indent < col {
                break;
            }
            if line.indent > col {
                return Err(self.error(&line, "unexpected indentation"));
            }
            let Some((key, after)) = split_key(line.content) else {
                let message = if line.content.starts_with("---") || line.content.starts_with("...") {
                    "multiple documents are not supported"
                } else if is_item(line.content) {
                    "expected a mapping key, found a sequence item"
                } else {
                    "expected a mapping key"
                };
                return Err(self.error(&line, message));
            };
            let leading = mem::take(&mut self.pending);
            self.pos += 1;

            let entry = if is_empty_value(after) {
                MapEntry {
                    key: key.to_string(),
                    value: self.child(col, true)?,
                    leading,
                    between: None,
                    trailing: non_empty(after),
                }
            } else {
                let (scalar, between, trailing) = self.scalar_value(after, col, &line)?;
                MapEntry {
                    key: key.to_string(),
                    value: YamlNode::Scalar(scalar),
                    leading,
                    between: Some(between),
                    trailing,
                }
            };
            entries.push(entry);
        }
        Ok(Mapping {
            entries,
            indent: Some(col),
        })
    }

    fn sequence(&mut self, col: usize) -> DomainResult<Sequence> {
        let mut items = Vec::new();
        while let Some(line) = self.peek()? {
            if line.indent < col || (line.indent == col && !is_item(line.content)) {
                break;
            }
            if line.indent > col {
                return Err(self.error(&line, "unexpected indentation"));
            }
            let leading = mem::take(&mut self.pending);
            let after = &line.content[1..];
            let rest = after.trim_start_matches(' ');

            let item = if is_empty_value(after) {
                self.pos += 1;
                SeqItem {
                    value: self.child(col, false)?,
                    leading,
                    between: None,
                    trailing: non_empty(after),
                    block: true,
                }
            } else if is_item(rest) || split_key(rest).is_some() {
                // `- key: v` and `- - v` open a collection on the item's own
                // line; re-read that line at the inner column.
                let inner = col + 1 + (after.len() - rest.len());
                if let Some(current) = self.lines.get_mut(self.pos) {
                    current.indent = inner;
                    current.content = rest;
                }
                let value = if is_item(rest) {
                    YamlNode::Sequence(self.sequence(inner)?)
                } else {
                    YamlNode::Mapping(self.mapping(inner)?)
                };
                SeqItem {
                    value,
                    leading,
                    between: None,
                    trailing: None,
                    block: false,
                }
            } else {
                self.pos += 1;
                let (scalar, between, trailing) = self.scalar_value(after, col, &line)?;
                SeqItem {
                    value: YamlNode::Scalar(scalar),
                    leading,
                    between: Some(between),
                    trailing,
                    block: false,
                }
            };
            items.push(item);
        }
        Ok(Sequence {
            items,
            indent: Some(col),
        })
    }

    /// Scalar text after `key:` or `-`, with the whitespace before it and
    /// any trailing comment split off.
    fn scalar_value(
        &mut self,
        after: &'a str,
        col: usize,
        line: &Line<'a>,
    ) -> DomainResult<(Scalar, String, Option<String>)> {
        let body = after.trim_start_matches(' ');
        let between = after[..after.len() - body.len()].to_string();
        let (value, rest) = body.split_at(value_end(body));

        if value.starts_with('|') || value.starts_with('>') {
            let mut raw = body.to_string();
            self.block_scalar_lines(col, &mut raw);
            return Ok((Scalar::raw(raw), between, None));
        }

        if value.starts_with(['[', '{']) {
            let mut depth = flow_depth(value);
            if depth > 0 {
                let mut raw = body.to_string();
                while depth > 0 {
                    let Some(next) = self.lines.get(self.pos).copied() else {
                        return Err(self.error(line, "unclosed flow collection"));
                    };
                    self.pos += 1;
                    raw.push('\n');
                    raw.push_str(next.raw);
                    depth += flow_depth(&next.content[..value_end(next.content)]);
                }
                return Ok((Scalar::raw(raw), between, None));
            }
        }

        // Plain or quoted text folded over more-indented lines.
        let mut raw = String::new();
        while let Some(next) = self.lines.get(self.pos).copied() {
            if next.is_trivia() || next.indent <= col {
                break;
            }
            if raw.is_empty() {
                raw.push_str(body);
            }
            raw.push('\n');
            raw.push_str(next.raw);
            self.pos += 1;
        }
        if !raw.is_empty() {
            return Ok((Scalar::raw(raw), between, None));
        }
        Ok((Scalar::raw(value), between, non_empty(rest)))
    }

    fn block_scalar_lines(&mut self, col: usize, raw: &mut String) {
        let start = self.pos;
        let mut end = start;
        while let Some(next) = self.lines.get(self.pos).copied() {
            if next.is_blank() {
                self.pos += 1;
                continue;
            }
            if next.indent <= col {
                break;
            }
            self.pos += 1;
            end = self.pos;
        }
        // Trailing blank lines separate entries rather than belong to the text.
        self.pos = end;
        for line in &self.lines[start..end] {
            raw.push('\n');
            raw.push_str(line.raw);
        }
    }

    fn bare_scalar(&mut self, col: usize) -> String {
        let mut parts = Vec::new();
        while let Some(line) = self.lines.get(self.pos).copied() {
            if line.is_trivia() || line.indent < col {
                break;
            }
            parts.push(line.raw);
            self.pos += 1;
        }
        parts.join("\n")
    }
}

fn is_item(content: &str) -> bool {
    content == "-" || content.starts_with("- ") || content.starts_with("-\t")
}

fn is_empty_value(after: &str) -> bool {
    let body = after.trim_start();
    body.is_empty() || body.starts_with('#')
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

/// Split `key: rest` into the raw key and the text after the colon.
pub(super) fn split_key(content: &str) -> Option<(&str, &str)> {
    let bytes = content.as_bytes();
    let key_end = match bytes.first()? {
        b'"' | b'\'' => quoted_end(content)?,
        b'[' | b'{' | b'#' | b'|' | b'>' | b'?' | b'&' | b'*' | b'!' | b'%' | b'@' | b'`' => {
            return None;
        }
        _ => {
            for (i, b) in bytes.iter().enumerate() {
                if *b == b'#' && i > 0 && bytes[i - 1] == b' ' {
                    return None;
                }
                if *b == b':' && matches!(bytes.get(i + 1), None | Some(b' ' | b'\t')) {
                    return Some((content[..i].trim_end(), &content[i + 1..]));
                }
            }
            return None;
        }
    };
    let after = content[key_end..].trim_start_matches(' ').strip_prefix(':')?;
    if !(after.is_empty() || after.starts_with([' ', '\t'])) {
        return None;
    }
    Some((&content[..key_end], after))
}

/// Byte index just past the closing quote of a quoted scalar.
fn quoted_end(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let quote = *bytes.first()?;
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quote == b'"' => i += 1,
            b'\'' if quote == b'\'' && bytes.get(i + 1) == Some(&b'\'') => i += 1,
            b if b == quote => return Some(i + 1),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Length of the value part of `body`, excluding a trailing comment and the
/// whitespace before it.
fn value_end(body: &str) -> usize {
    let bytes = body.as_bytes();
    let tracks_quotes = matches!(bytes.first(), Some(b'"' | b'\'' | b'[' | b'{'));
    let mut quote = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' && q == b'"' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None if tracks_quotes && (b == b'"' || b == b'\'') => quote = Some(b),
            None if b == b'#' && (i == 0 || matches!(bytes[i - 1], b' ' | b'\t')) => {
                return body[..i].trim_end().len();
            }
            None => {}
        }
        i += 1;
    }
    body.trim_end().len()
}

fn flow_depth(text: &str) -> i32 {
    let mut depth = 0;
    let mut quote = None;
    for c in text.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '[' | '{' => depth += 1,
                ']' | '}' => depth -= 1,
                _ => {}
            },
        }
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_split_outside_quotes() {
        assert_eq!(split_key("name: app"), Some(("name", " app")));
        assert_eq!(split_key("\"a: b\": 1"), Some(("\"a: b\"", " 1")));
        assert_eq!(split_key("url: http://x"), Some(("url", " http://x")));
        assert_eq!(split_key("http://x"), None);
        assert_eq!(split_key("empty:"), Some(("empty", "")));
        assert_eq!(split_key("text # a: b"), None);
    }

    #[test]
    fn comments_are_split_from_values() {
        assert_eq!(value_end("value # note"), 5);
        assert_eq!(value_end("'a # b' # note"), 7);
        assert_eq!(value_end("a#b"), 3);
        assert_eq!(value_end("# only"), 0);
    }

    #[test]
    fn indentation_is_recorded() {
        let parsed = parse("a:\n- 1\n").unwrap();
        assert_eq!(parsed.indentless, Some(true));
        let parsed = parse("a:\n  - 1\n").unwrap();
        assert_eq!(parsed.indentless, Some(false));
    }

    #[test]
    fn structural_errors_carry_positions() {
        let err = parse("a:\n\tb: 1\n").err().unwrap();
        assert!(matches!(err, DomainError::Parse { line: 2, .. }));

        let err = parse("a: [1,\n  2\n").err().unwrap();
        assert!(matches!(err, DomainError::Parse { line: 1, .. }));

        let err = parse("a: 1\n---\nb: 2\n").err().unwrap();
        assert!(
            matches!(err, DomainError::Parse { ref message, line: 2, .. } if message.contains("multiple documents"))
        );

        let err = parse("  a: 1\nb: 2\n").err().unwrap();
        assert!(matches!(err, DomainError::Parse { line: 2, .. }));
    }
}
