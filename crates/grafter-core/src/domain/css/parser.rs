use crate::domain::error::{DomainError, DomainResult, SyntaxFormat};

use super::{AtRule, CssComment, CssNode, Decl, Raws, RawCss, Rule};

/// Children of one container plus the container's closing raws.
pub(super) struct Body {
    pub(super) nodes: Vec<CssNode>,
    pub(super) after: String,
    pub(super) semicolon: Option<bool>,
}

pub(super) fn parse(src: &str) -> DomainResult<Body> {
    Parser { src, pos: 0 }.body(None)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, offset: usize, message: impl Into<String>) -> DomainError {
        DomainError::parse_at(SyntaxFormat::Stylesheet, self.src, offset, message)
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) -> &'a str {
        let start = self.pos;
        let rest = &self.src[start..];
        self.pos += rest.len() - rest.trim_start().len();
        &self.src[start..self.pos]
    }

    /// Parse nodes until the matching `}` (consumed) or end of input.
    /// `open` is the offset of the `{` that started the block.
    fn body(&mut self, open: Option<usize>) -> DomainResult<Body> {
        let mut nodes = Vec::new();
        let mut semicolon = None;

        loop {
            let before = self.skip_whitespace().to_string();
            match self.peek() {
                None => {
                    if let Some(open) = open {
                        return Err(self.error(open, "unclosed block"));
                    }
                    return Ok(Body {
                        nodes,
                        after: before,
                        semicolon,
                    });
                }
                Some(b'}') => {
                    if open.is_none() {
                        return Err(self.error(self.pos, "unexpected `}`"));
                    }
                    self.pos += 1;
                    return Ok(Body {
                        nodes,
                        after: before,
                        semicolon,
                    });
                }
                Some(b'/') if self.src[self.pos..].starts_with("/*") => {
                    let start = self.pos;
                    let end = self.comment_end(start)?;
                    self.pos = end;
                    nodes.push(CssNode::Comment(CssComment {
                        text: self.src[start + 2..end - 2].to_string(),
                        raws: Raws {
                            before: Some(before),
                            ..Raws::default()
                        },
                    }));
                }
                Some(_) => nodes.push(self.node(before, &mut semicolon)?),
            }
        }
    }

    fn node(&mut self, before: String, semicolon: &mut Option<bool>) -> DomainResult<CssNode> {
        let start = self.pos;
        let end = self.scan_prelude(start)?;
        let text = &self.src[start..end];
        let trimmed = text.trim_end();
        let trailing = text[trimmed.len()..].to_string();

        match self.src.as_bytes().get(end) {
            Some(b'{') => {
                self.pos = end + 1;
                let body = self.body(Some(end))?;
                let raws = Raws {
                    before: Some(before),
                    between: Some(trailing),
                    after: Some(body.after),
                    semicolon: body.semicolon,
                    ..Raws::default()
                };
                if let Some(at) = trimmed.strip_prefix('@') {
                    let mut rule = at_rule(at, raws);
                    rule.nodes = Some(body.nodes);
                    Ok(CssNode::AtRule(rule))
                } else {
                    Ok(CssNode::Rule(Rule {
                        selector: trimmed.to_string(),
                        nodes: body.nodes,
                        raws,
                    }))
                }
            }
            Some(b';') => {
                self.pos = end + 1;
                *semicolon = Some(true);
                Ok(statement(trimmed, before, Some(trailing)))
            }
            // `}` or end of input: the whitespace belongs to the container.
            _ => {
                self.pos = start + trimmed.len();
                *semicolon = Some(false);
                Ok(statement(trimmed, before, None))
            }
        }
    }

    /// Offset of the first top-level `{`, `;` or `}` from `start`, or the end
    /// of input. Strings, comments and parentheses are skipped whole.
    fn scan_prelude(&self, start: usize) -> DomainResult<usize> {
        let bytes = self.src.as_bytes();
        let mut depth = 0usize;
        let mut i = start;
        while let Some(&b) = bytes.get(i) {
            match b {
                b'"' | b'\'' => i = self.string_end(i)?,
                b'/' if bytes.get(i + 1) == Some(&b'*') => i = self.comment_end(i)?,
                b'\\' => i += 2,
                b'(' => {
                    depth += 1;
                    i += 1;
                }
                b')' => {
                    depth = depth.saturating_sub(1);
                    i += 1;
                }
                b'{' | b';' | b'}' if depth == 0 => return Ok(i),
                _ => i += 1,
            }
        }
        Ok(bytes.len())
    }

    fn string_end(&self, start: usize) -> DomainResult<usize> {
        let bytes = self.src.as_bytes();
        let quote = bytes[start];
        let mut i = start + 1;
        while let Some(&b) = bytes.get(i) {
            match b {
                b'\\' => i += 2,
                b'\n' => break,
                _ if b == quote => return Ok(i + 1),
                _ => i += 1,
            }
        }
        Err(self.error(start, "unterminated string"))
    }

    fn comment_end(&self, start: usize) -> DomainResult<usize> {
        match self.src[start + 2..].find("*/") {
            Some(offset) => Ok(start + 2 + offset + 2),
            None => Err(self.error(start, "unterminated comment")),
        }
    }
}

/// Split `name params` (text after the `@`).
fn at_rule(text: &str, mut raws: Raws) -> AtRule {
    let name_len = text
        .find(|c: char| c.is_whitespace() || c == '(' || c == '"' || c == '\'')
        .unwrap_or(text.len());
    let rest = &text[name_len..];
    let params = rest.trim_start();
    raws.after_name = Some(rest[..rest.len() - params.len()].to_string());
    AtRule {
        name: text[..name_len].to_string(),
        params: params.to_string(),
        nodes: None,
        raws,
    }
}

fn statement(text: &str, before: String, trailing: Option<String>) -> CssNode {
    let raws = Raws {
        before: Some(before),
        after: trailing,
        ..Raws::default()
    };
    if let Some(at) = text.strip_prefix('@') {
        return CssNode::AtRule(at_rule(at, raws));
    }
    match top_level_colon(text) {
        Some(colon) if !text[..colon].trim().is_empty() => {
            let prop = text[..colon].trim_end();
            let value_start = text[colon + 1..]
                .find(|c: char| !c.is_whitespace())
                .map_or(text.len(), |offset| colon + 1 + offset);
            CssNode::Decl(Decl {
                prop: prop.to_string(),
                value: text[value_start..].to_string(),
                raws: Raws {
                    between: Some(text[prop.len()..value_start].to_string()),
                    ..raws
                },
            })
        }
        _ => CssNode::Raw(RawCss {
            text: text.to_string(),
            raws,
        }),
    }
}

fn top_level_colon(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote = None;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ':') if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}
