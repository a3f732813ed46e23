//! Formatting-convention inference.
//!
//! A [`Convention`] is derived once from a file's *original* text and threaded
//! through to the printers, so newly introduced code matches the surrounding
//! file instead of a fixed house style. Inference never looks at a mutated
//! tree.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// String delimiter preference for newly created literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    Single,
    Double,
}

impl QuoteStyle {
    pub const fn as_char(self) -> char {
        match self {
            Self::Single => '\'',
            Self::Double => '"',
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Double => "double",
        }
    }
}

impl fmt::Display for QuoteStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteStyle {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" | "'" => Ok(Self::Single),
            "double" | "\"" => Ok(Self::Double),
            other => Err(DomainError::InvalidInput(format!(
                "unknown quote style: {other}"
            ))),
        }
    }
}

/// Indentation unit plus optional quote preference for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Convention {
    pub indent: String,
    pub quote: Option<QuoteStyle>,
}

impl Convention {
    /// Infer the indentation unit of `text`. Quote style is script-specific
    /// and filled in by the script adapter.
    pub fn infer(text: &str) -> Self {
        Self {
            indent: infer_indent(text),
            quote: None,
        }
    }

    pub fn with_quote(mut self, quote: Option<QuoteStyle>) -> Self {
        self.quote = quote;
        self
    }

    /// Indentation string for a nesting level.
    pub fn indent_str(&self, level: usize) -> String {
        self.indent.repeat(level)
    }

    /// Quote to use for a new literal, falling back to the adapter default.
    pub fn quote_or(&self, default: QuoteStyle) -> QuoteStyle {
        self.quote.unwrap_or(default)
    }

    /// Width of the indent unit in columns, counting a tab as one unit of
    /// `tab_width`.
    pub fn indent_width(&self, tab_width: usize) -> usize {
        self.indent
            .chars()
            .map(|c| if c == '\t' { tab_width } else { 1 })
            .sum()
    }
}

impl Default for Convention {
    fn default() -> Self {
        Self {
            indent: "\t".into(),
            quote: None,
        }
    }
}

/// Infer the indentation unit of `text`.
///
/// Each non-blank line that starts with whitespace votes for tabs or spaces
/// depending on its first character. Space-led lines also track the minimum
/// run length (ceiling 8), which becomes the space unit. Single-space runs are
/// ignored: they are block-comment continuation lines, not indentation.
/// Spaces win only when they strictly outnumber tabs; otherwise (including no
/// signal at all) the unit is one tab.
pub fn infer_indent(text: &str) -> String {
    let mut tabs = 0usize;
    let mut spaces = 0usize;
    let mut min_spaces = 8usize;

    for line in text.lines() {
        let run = line
            .bytes()
            .take_while(|b| *b == b' ' || *b == b'\t')
            .count();
        if run == 0 || run == line.len() {
            continue;
        }
        if line.starts_with('\t') {
            tabs += 1;
        } else {
            let width = line.bytes().take_while(|b| *b == b' ').count();
            if width > 1 {
                spaces += 1;
                min_spaces = min_spaces.min(width);
            }
        }
    }

    if spaces > tabs {
        " ".repeat(min_spaces.max(1))
    } else {
        "\t".into()
    }
}

/// Vote on the dominant quote character among literal raw texts.
///
/// Every raw of at least two characters contributes up to two votes, one per
/// delimiter. Returns `None` when no quote was ever seen; ties go to double
/// quotes.
pub fn infer_quote_style<'a, I>(raws: I) -> Option<QuoteStyle>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut single = 0usize;
    let mut double = 0usize;

    for raw in raws {
        if raw.len() < 2 {
            continue;
        }
        let ends = [raw.chars().next(), raw.chars().last()];
        for quote in ends.into_iter().flatten() {
            match quote {
                '\'' => single += 1,
                '"' => double += 1,
                _ => {}
            }
        }
    }

    if single == 0 && double == 0 {
        return None;
    }
    if single > double {
        Some(QuoteStyle::Single)
    } else {
        Some(QuoteStyle::Double)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_defaults_to_tab() {
        assert_eq!(infer_indent(""), "\t");
        assert_eq!(infer_indent("single line"), "\t");
    }

    #[test]
    fn two_space_indentation() {
        let src = "a {\n  b: 1;\n  c {\n    d: 2;\n  }\n}\n";
        assert_eq!(infer_indent(src), "  ");
    }

    #[test]
    fn tabs_win_ties() {
        let src = "x\n\ta\n    b\n";
        assert_eq!(infer_indent(src), "\t");
    }

    #[test]
    fn blank_lines_are_ignored() {
        let src = "x\n    \n\t\n\ta\n";
        assert_eq!(infer_indent(src), "\t");
    }

    #[test]
    fn doc_comment_continuations_do_not_vote() {
        let src = "/**\n * hello\n */\nfoo({\n    a: 1,\n    b: 2\n});\n";
        assert_eq!(infer_indent(src), "    ");
    }

    #[test]
    fn quote_votes() {
        assert_eq!(
            infer_quote_style(["'a'", "'b'", "\"c\""]),
            Some(QuoteStyle::Single)
        );
        assert_eq!(
            infer_quote_style(["\"a\"", "\"b\"", "\"c\"", "'d'"]),
            Some(QuoteStyle::Double)
        );
        assert_eq!(infer_quote_style(["'a'", "\"b\""]), Some(QuoteStyle::Double));
        assert_eq!(infer_quote_style(["42", "true"]), None);
        assert_eq!(infer_quote_style(std::iter::empty()), None);
    }

    #[test]
    fn quote_style_parses() {
        assert_eq!("single".parse::<QuoteStyle>().unwrap(), QuoteStyle::Single);
        assert!("backtick".parse::<QuoteStyle>().is_err());
    }
}
