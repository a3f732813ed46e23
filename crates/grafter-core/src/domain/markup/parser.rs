use crate::domain::css::Stylesheet;
use crate::domain::error::{DomainError, DomainResult, SyntaxFormat, line_column};
use crate::domain::script::ScriptTree;

use super::{
    AttrValue, Attribute, Element, MarkupNode, ScriptBlock, StyleBlock, TagRaws, is_void,
};

/// Elements whose end tag may be left out when an ancestor closes.
const OPTIONAL_CLOSE: &[&str] = &[
    "p", "li", "dt", "dd", "option", "optgroup", "tr", "td", "th", "thead", "tbody", "tfoot",
    "colgroup", "rt", "rp",
];

/// Script `type`s whose body is script code.
const SCRIPT_TYPES: &[&str] = &[
    "module",
    "text/javascript",
    "application/javascript",
    "text/typescript",
];

pub(super) fn parse(src: &str, indent: &str) -> DomainResult<Vec<MarkupNode>> {
    let mut parser = Parser { src, pos: 0, indent };
    match parser.children(&mut Vec::new())? {
        (nodes, Close::Eof) => Ok(nodes),
        (_, _) => Err(parser.error(parser.pos, "unexpected closing tag")),
    }
}

/// How a child list ended.
enum Close {
    Eof,
    /// The current element's closing tag, consumed.
    Tag(String),
    /// An ancestor's closing tag, left for the ancestor.
    Implied,
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    indent: &'a str,
}

impl<'a> Parser<'a> {
    fn error(&self, offset: usize, message: impl Into<String>) -> DomainError {
        DomainError::parse_at(SyntaxFormat::Markup, self.src, offset, message)
    }

    /// Move a parse error from an embedded region to file coordinates.
    fn relocate(&self, err: DomainError, offset: usize) -> DomainError {
        let DomainError::Parse {
            format,
            message,
            line,
            column,
        } = err
        else {
            return err;
        };
        let (base_line, base_column) = line_column(self.src, offset);
        DomainError::Parse {
            format,
            message,
            line: base_line + line - 1,
            column: if line == 1 { base_column + column - 1 } else { column },
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) -> &'a str {
        let start = self.pos;
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
        &self.src[start..self.pos]
    }

    fn children(&mut self, open: &mut Vec<String>) -> DomainResult<(Vec<MarkupNode>, Close)> {
        let mut nodes = Vec::new();
        loop {
            let rest = self.rest();
            if rest.is_empty() {
                if let Some(name) = open.last() {
                    return Err(self.error(self.pos, format!("unclosed <{name}>")));
                }
                return Ok((nodes, Close::Eof));
            }

            if rest.starts_with("</") {
                let start = self.pos;
                let name: String = rest[2..]
                    .chars()
                    .take_while(|c| !c.is_whitespace() && *c != '>')
                    .collect();
                let Some(end) = rest.find('>') else {
                    return Err(self.error(start, "unclosed tag"));
                };
                if open.last() == Some(&name) {
                    self.pos += end + 1;
                    return Ok((nodes, Close::Tag(rest[..=end].to_string())));
                }
                let implied = open.last().is_some_and(|current| {
                    OPTIONAL_CLOSE.contains(&current.to_ascii_lowercase().as_str())
                }) && open.contains(&name);
                if implied {
                    return Ok((nodes, Close::Implied));
                }
                return Err(self.error(start, format!("unexpected </{name}>")));
            }

            if rest.starts_with("<!--") {
                let Some(end) = rest.find("-->") else {
                    return Err(self.error(self.pos, "unterminated comment"));
                };
                nodes.push(MarkupNode::Comment(rest[4..end].to_string()));
                self.pos += end + 3;
                continue;
            }

            if rest.starts_with("<!") {
                // Doctype and friends are kept as text.
                let end = rest.find('>').map_or(rest.len(), |i| i + 1);
                push_text(&mut nodes, &rest[..end]);
                self.pos += end;
                continue;
            }

            if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
                let node = self.element(open)?;
                nodes.push(node);
                continue;
            }

            if rest.starts_with('{')
                && let Some(end) = brace_end(rest)
            {
                nodes.push(MarkupNode::Mustache(rest[1..end - 1].to_string()));
                self.pos += end;
                continue;
            }

            let len = text_len(rest);
            push_text(&mut nodes, &rest[..len]);
            self.pos += len;
        }
    }

    fn element(&mut self, open: &mut Vec<String>) -> DomainResult<MarkupNode> {
        let start = self.pos;
        self.pos += 1;
        let name: String = self
            .rest()
            .chars()
            .take_while(|c| !c.is_whitespace() && *c != '>' && *c != '/')
            .collect();
        self.pos += name.len();

        let mut attributes = Vec::new();
        let (tag_end, self_closing) = loop {
            let before = self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("/>") {
                self.pos += 2;
                break (before, true);
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break (before, false);
            }
            if rest.is_empty() {
                return Err(self.error(start, format!("unclosed <{name}> tag")));
            }
            attributes.push(self.attribute(before)?);
        };
        let mut raws = TagRaws {
            tag_end: Some(tag_end.to_string()),
            close: None,
        };

        if self_closing || is_void(&name) {
            return Ok(MarkupNode::Element(Element {
                name,
                attributes,
                children: Vec::new(),
                self_closing,
                raws,
            }));
        }

        let depth = open.len();
        if name.eq_ignore_ascii_case("script") || name.eq_ignore_ascii_case("style") {
            let content_start = self.pos;
            let (content, close) = self.raw_text(&name, start)?;
            raws.close = Some(close);
            let level = content_level(content, self.indent, depth + 1);
            if name.eq_ignore_ascii_case("style") {
                let sheet = Stylesheet::parse_embedded(content, self.indent, level)
                    .map_err(|e| self.relocate(e, content_start))?;
                return Ok(MarkupNode::Style(StyleBlock {
                    attributes,
                    sheet,
                    raws,
                }));
            }
            let is_code = attributes
                .iter()
                .find(|a| a.name == "type")
                .and_then(|a| a.value.text())
                .is_none_or(|ty| SCRIPT_TYPES.contains(&ty));
            if is_code {
                let tree = ScriptTree::parse_embedded(content, self.indent, level)
                    .map_err(|e| self.relocate(e, content_start))?;
                return Ok(MarkupNode::Script(ScriptBlock {
                    attributes,
                    tree,
                    raws,
                }));
            }
            return Ok(MarkupNode::Element(Element {
                name,
                attributes,
                children: vec![MarkupNode::Text(content.to_string())],
                self_closing: false,
                raws,
            }));
        }

        open.push(name.clone());
        let (children, close) = self.children(open)?;
        open.pop();
        raws.close = Some(match close {
            Close::Tag(text) => text,
            Close::Implied => String::new(),
            Close::Eof => return Err(self.error(start, format!("unclosed <{name}>"))),
        });
        Ok(MarkupNode::Element(Element {
            name,
            attributes,
            children,
            self_closing: false,
            raws,
        }))
    }

    fn attribute(&mut self, before: &str) -> DomainResult<Attribute> {
        let start = self.pos;
        let rest = self.rest();

        if rest.starts_with('{') {
            let Some(end) = brace_end(rest) else {
                return Err(self.error(start, "unclosed `{` in tag"));
            };
            self.pos += end;
            return Ok(parsed(&rest[..end], AttrValue::Boolean, before, &self.src[start..self.pos]));
        }

        let name_len = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '=' | '>' | '/'))
            .unwrap_or(rest.len());
        if name_len == 0 {
            return Err(self.error(start, "unexpected character in tag"));
        }
        let name = &rest[..name_len];
        self.pos += name_len;

        let after_name = self.pos;
        self.skip_whitespace();
        if self.peek() != Some(b'=') {
            self.pos = after_name;
            return Ok(parsed(name, AttrValue::Boolean, before, name));
        }
        self.pos += 1;
        self.skip_whitespace();

        let value_start = self.pos;
        let rest = self.rest();
        let value = match rest.as_bytes().first() {
            Some(&q @ (b'"' | b'\'')) => {
                let end = quoted_end(rest, q).ok_or_else(|| self.error(value_start, "unterminated attribute value"))?;
                self.pos += end;
                AttrValue::Quoted {
                    quote: q as char,
                    text: rest[1..end - 1].to_string(),
                }
            }
            Some(b'{') => {
                let end = brace_end(rest).ok_or_else(|| self.error(value_start, "unclosed `{` in attribute"))?;
                self.pos += end;
                AttrValue::Expression(rest[1..end - 1].to_string())
            }
            _ => {
                let len = unquoted_len(rest);
                self.pos += len;
                AttrValue::Unquoted(rest[..len].to_string())
            }
        };
        Ok(parsed(name, value, before, &self.src[start..self.pos]))
    }

    /// Body of a raw-text element up to its closing tag; returns the body and
    /// the closing tag.
    fn raw_text(&mut self, name: &str, start: usize) -> DomainResult<(&'a str, String)> {
        let rest = self.rest();
        let needle = format!("</{}", name.to_ascii_lowercase());
        let Some(body_len) = rest.to_ascii_lowercase().find(&needle) else {
            return Err(self.error(start, format!("unclosed <{name}>")));
        };
        let Some(close_len) = rest[body_len..].find('>') else {
            return Err(self.error(self.pos + body_len, "unclosed tag"));
        };
        self.pos += body_len + close_len + 1;
        Ok((&rest[..body_len], rest[body_len..=body_len + close_len].to_string()))
    }
}

fn parsed(name: &str, value: AttrValue, before: &str, raw: &str) -> Attribute {
    Attribute {
        name: name.to_string(),
        value,
        raw: Some(raw.to_string()),
        before: Some(before.to_string()),
    }
}

fn push_text(nodes: &mut Vec<MarkupNode>, text: &str) {
    if let Some(MarkupNode::Text(last)) = nodes.last_mut() {
        last.push_str(text);
    } else {
        nodes.push(MarkupNode::Text(text.to_string()));
    }
}

/// Length of plain text before the next tag or `{`. Always at least one
/// character so a stray `<` or `{` is taken as text.
fn text_len(rest: &str) -> usize {
    for (i, c) in rest.char_indices().skip(1) {
        let next = rest[i + c.len_utf8()..].chars().next();
        let tag = c == '<' && next.is_some_and(|n| n.is_ascii_alphabetic() || n == '/' || n == '!');
        if tag || c == '{' {
            return i;
        }
    }
    rest.len()
}

fn unquoted_len(rest: &str) -> usize {
    rest.char_indices()
        .find(|&(i, c)| c.is_whitespace() || c == '>' || rest[i..].starts_with("/>"))
        .map_or(rest.len(), |(i, _)| i)
}

/// End (exclusive) of a quoted value starting at `rest[0]`. `{...}` inside
/// the value may contain the quote character.
fn quoted_end(rest: &str, quote: u8) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = 1;
    while let Some(&b) = bytes.get(i) {
        if b == quote {
            return Some(i + 1);
        }
        if b == b'{' {
            i += brace_end(&rest[i..])?;
        } else {
            i += 1;
        }
    }
    None
}

/// End (exclusive) of the balanced `{...}` starting at `rest[0]`.
fn brace_end(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while let Some(&b) = bytes.get(i) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            b'"' | b'\'' | b'`' => {
                i += 1;
                while let Some(&c) = bytes.get(i) {
                    if c == b'\\' {
                        i += 1;
                    } else if c == b {
                        break;
                    }
                    i += 1;
                }
                bytes.get(i)?;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Indentation level of an embedded region's first line, or `fallback` when
/// the region has no line of its own.
fn content_level(content: &str, indent: &str, fallback: usize) -> usize {
    if !content.contains('\n') {
        return fallback;
    }
    let Some(line) = content.lines().find(|l| !l.trim().is_empty()) else {
        return fallback;
    };
    let mut ws = &line[..line.len() - line.trim_start().len()];
    let mut level = 0;
    while !indent.is_empty()
        && let Some(rest) = ws.strip_prefix(indent)
    {
        level += 1;
        ws = rest;
    }
    level
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_forms() {
        let nodes = parse("<input disabled value=\"a {b ? \"c\" : 'd'}\" tabindex=0 on:input={f} {...rest}/>", "\t").unwrap();
        let MarkupNode::Element(input) = &nodes[0] else {
            panic!("expected an element");
        };
        assert!(input.self_closing);
        let values: Vec<_> = input.attributes.iter().map(|a| a.value.clone()).collect();
        assert_eq!(values[0], AttrValue::Boolean);
        assert_eq!(values[1].text(), Some("a {b ? \"c\" : 'd'}"));
        assert_eq!(values[2], AttrValue::Unquoted("0".into()));
        assert_eq!(values[3], AttrValue::Expression("f".into()));
        assert_eq!(input.attributes[4].name, "{...rest}");
    }

    #[test]
    fn optional_end_tags_close_implicitly() {
        let nodes = parse("<ul><li>a<li>b</ul>", "\t").unwrap();
        let MarkupNode::Element(ul) = &nodes[0] else {
            panic!("expected an element");
        };
        assert_eq!(ul.children.len(), 1);
    }

    #[test]
    fn non_code_scripts_stay_text() {
        let src = "<script type=\"application/ld+json\">{\"a\": 1}</script>";
        let nodes = parse(src, "\t").unwrap();
        assert!(matches!(&nodes[0], MarkupNode::Element(el) if el.name == "script"));
    }

    #[test]
    fn embedded_errors_point_into_the_file() {
        let err = parse("<p>x</p>\n<script>\n\tconst a = {;\n</script>", "\t").unwrap_err();
        let DomainError::Parse { format, line, .. } = err else {
            panic!("expected a parse error");
        };
        assert_eq!(format, SyntaxFormat::Script);
        assert_eq!(line, 3);
    }

    #[test]
    fn embedded_level_follows_first_line() {
        assert_eq!(content_level("\n\t\tlet a;\n\t", "\t", 1), 2);
        assert_eq!(content_level("\nlet a;\n", "  ", 1), 0);
        assert_eq!(content_level("", "\t", 1), 1);
    }
}
