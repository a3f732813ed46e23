//! Component adapter: HTML-like markup with embedded script and style
//! regions.
//!
//! `<script>` and `<style>` bodies are parsed with the script and stylesheet
//! adapters, so the same primitives work on them. Everything else is a plain
//! element tree; `{...}` blocks and directives are kept as written.

pub mod ops;
mod parser;

use tracing::debug;

use crate::domain::convention::Convention;
use crate::domain::css::Stylesheet;
use crate::domain::equality::{Canonical, squash_whitespace};
use crate::domain::error::DomainResult;
use crate::domain::script::ScriptTree;

pub use ops::{Fragment, append_markup, prepend_markup, set_attribute};

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub(crate) fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// `disabled`
    Boolean,
    /// `class="x"`
    Quoted { quote: char, text: String },
    /// `tabindex=0`
    Unquoted(String),
    /// `onclick={handler}`
    Expression(String),
}

impl AttrValue {
    pub fn quoted(text: impl Into<String>) -> Self {
        Self::Quoted {
            quote: '"',
            text: text.into(),
        }
    }

    /// The literal text of a quoted or unquoted value.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Quoted { text, .. } | Self::Unquoted(text) => Some(text),
            Self::Boolean | Self::Expression(_) => None,
        }
    }

    fn canonical(&self) -> String {
        match self {
            Self::Boolean => String::new(),
            Self::Quoted { text, .. } | Self::Unquoted(text) => format!("=\"{text}\""),
            Self::Expression(expr) => format!("={{{}}}", squash_whitespace(expr)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub value: AttrValue,
    /// Source text of the whole attribute while it is unchanged.
    pub(crate) raw: Option<String>,
    pub(crate) before: Option<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: AttrValue) -> Self {
        Self {
            name: name.into(),
            value,
            raw: None,
            before: None,
        }
    }

    fn print(&self, out: &mut String) {
        out.push_str(self.before.as_deref().unwrap_or(" "));
        if let Some(raw) = &self.raw {
            out.push_str(raw);
            return;
        }
        out.push_str(&self.name);
        match &self.value {
            AttrValue::Boolean => {}
            AttrValue::Quoted { quote, text } => {
                out.push('=');
                out.push(*quote);
                out.push_str(text);
                out.push(*quote);
            }
            AttrValue::Unquoted(text) => {
                out.push('=');
                out.push_str(text);
            }
            AttrValue::Expression(expr) => {
                out.push_str("={");
                out.push_str(expr);
                out.push('}');
            }
        }
    }
}

/// How a parsed tag was written.
#[derive(Debug, Clone, Default)]
pub(crate) struct TagRaws {
    /// Whitespace before `>` or `/>`.
    pub(crate) tag_end: Option<String>,
    /// The closing tag as written; empty when it was implied.
    pub(crate) close: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<MarkupNode>,
    pub self_closing: bool,
    pub(crate) raws: TagRaws,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: false,
            raws: TagRaws::default(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct ScriptBlock {
    pub attributes: Vec<Attribute>,
    pub tree: ScriptTree,
    pub(crate) raws: TagRaws,
}

impl ScriptBlock {
    /// `<script module>` / `<script context="module">` run once per module,
    /// not per component instance.
    pub fn is_module(&self) -> bool {
        self.attributes.iter().any(|a| {
            a.name == "module" || (a.name == "context" && a.value.text() == Some("module"))
        })
    }
}

#[derive(Debug, Clone)]
pub struct StyleBlock {
    pub attributes: Vec<Attribute>,
    pub sheet: Stylesheet,
    pub(crate) raws: TagRaws,
}

#[derive(Debug, Clone)]
pub enum MarkupNode {
    Element(Element),
    /// Text exactly as written, whitespace included.
    Text(String),
    /// `<!-- text -->`, delimiters excluded.
    Comment(String),
    /// `{...}`, braces excluded.
    Mustache(String),
    Script(ScriptBlock),
    Style(StyleBlock),
}

impl MarkupNode {
    pub(crate) fn is_whitespace(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }
}

fn print_tag(out: &mut String, name: &str, attributes: &[Attribute], raws: &TagRaws, self_closing: bool) {
    out.push('<');
    out.push_str(name);
    for attribute in attributes {
        attribute.print(out);
    }
    out.push_str(raws.tag_end.as_deref().unwrap_or(if self_closing { " " } else { "" }));
    out.push_str(if self_closing { "/>" } else { ">" });
}

fn print_close(out: &mut String, name: &str, raws: &TagRaws) {
    match &raws.close {
        Some(close) => out.push_str(close),
        None => {
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
    }
}

pub(crate) fn print_nodes(out: &mut String, nodes: &[MarkupNode]) {
    for node in nodes {
        match node {
            MarkupNode::Element(el) => {
                print_tag(out, &el.name, &el.attributes, &el.raws, el.self_closing);
                if el.self_closing || is_void(&el.name) {
                    continue;
                }
                print_nodes(out, &el.children);
                print_close(out, &el.name, &el.raws);
            }
            MarkupNode::Text(text) => out.push_str(text),
            MarkupNode::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            MarkupNode::Mustache(text) => {
                out.push('{');
                out.push_str(text);
                out.push('}');
            }
            MarkupNode::Script(block) => {
                print_tag(out, "script", &block.attributes, &block.raws, false);
                out.push_str(&block.tree.generate_code());
                print_close(out, "script", &block.raws);
            }
            MarkupNode::Style(block) => {
                print_tag(out, "style", &block.attributes, &block.raws, false);
                out.push_str(&block.sheet.generate_code());
                print_close(out, "style", &block.raws);
            }
        }
    }
}

fn attributes_canonical(attributes: &[Attribute]) -> String {
    attributes
        .iter()
        .map(|a| format!(" {}{}", a.name, a.value.canonical()))
        .collect()
}

pub(crate) fn children_canonical(nodes: &[MarkupNode]) -> String {
    nodes
        .iter()
        .filter(|n| !n.is_whitespace())
        .map(Canonical::canonical)
        .collect()
}

impl Canonical for MarkupNode {
    fn canonical(&self) -> String {
        match self {
            Self::Element(el) => format!(
                "<{}{}>{}</{}>",
                el.name,
                attributes_canonical(&el.attributes),
                children_canonical(&el.children),
                el.name
            ),
            Self::Text(text) => squash_whitespace(text),
            Self::Comment(text) => format!("<!--{}-->", text.trim()),
            Self::Mustache(text) => format!("{{{}}}", squash_whitespace(text)),
            Self::Script(block) => format!(
                "<script{}>{}</script>",
                attributes_canonical(&block.attributes),
                block.tree.program.canonical()
            ),
            Self::Style(block) => format!(
                "<style{}>{}</style>",
                attributes_canonical(&block.attributes),
                block.sheet.nodes.canonical()
            ),
        }
    }
}

/// A parsed component file.
#[derive(Debug, Clone)]
pub struct Component {
    pub nodes: Vec<MarkupNode>,
    convention: Convention,
}

impl Component {
    pub fn parse(text: &str) -> DomainResult<Self> {
        let convention = Convention::infer(text);
        let nodes = parser::parse(text, &convention.indent)?;
        debug!(nodes = nodes.len(), indent = ?convention.indent, "parsed component");
        Ok(Self { nodes, convention })
    }

    pub fn generate_code(&self) -> String {
        let mut out = String::new();
        print_nodes(&mut out, &self.nodes);
        out
    }

    pub fn convention(&self) -> &Convention {
        &self.convention
    }

    /// The instance `<script>`, if any.
    pub fn script(&self) -> Option<&ScriptBlock> {
        self.nodes.iter().find_map(|node| match node {
            MarkupNode::Script(block) if !block.is_module() => Some(block),
            _ => None,
        })
    }

    pub fn style(&self) -> Option<&StyleBlock> {
        self.nodes.iter().find_map(|node| match node {
            MarkupNode::Style(block) => Some(block),
            _ => None,
        })
    }

    /// First element named `name`, depth first.
    pub fn find_element(&self, name: &str) -> Option<&Element> {
        find(&self.nodes, name)
    }

    pub fn find_element_mut(&mut self, name: &str) -> Option<&mut Element> {
        find_mut(&mut self.nodes, name)
    }
}

fn find<'a>(nodes: &'a [MarkupNode], name: &str) -> Option<&'a Element> {
    nodes.iter().filter_map(MarkupNode::as_element).find_map(|el| {
        if el.name == name {
            Some(el)
        } else {
            find(&el.children, name)
        }
    })
}

fn find_mut<'a>(nodes: &'a mut [MarkupNode], name: &str) -> Option<&'a mut Element> {
    for node in nodes {
        let MarkupNode::Element(el) = node else {
            continue;
        };
        if el.name == name {
            return Some(el);
        }
        if let Some(found) = find_mut(&mut el.children, name) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;

    #[test]
    fn unchanged_component_round_trips() {
        let inputs = [
            "",
            "<script lang=\"ts\">\n\tlet { data } = $props();\n</script>\n\n<h1 class='title' {hidden}>{data.title}</h1>\n",
            "<!-- note -->\n<div on:click={() => (open = !open)} data-x=1>\n\t<img src=\"a.png\" alt=\"\">\n\t<Button/>\n</div>\n",
            "{#if user}\n\t<p>Hi {user.name}</p>\n{:else}\n\t<a href=\"/login\">Log in</a>\n{/if}\n",
            "<style>\n\th1 {\n\t\tcolor: red;\n\t}\n</style>\n",
            "<!DOCTYPE html>\n<html><body><p>a < b</p></body></html>\n",
        ];
        for input in inputs {
            let component = Component::parse(input).unwrap();
            assert_eq!(component.generate_code(), input);
        }
    }

    #[test]
    fn embedded_regions_are_parsed() {
        let src = "<script>\n\timport a from 'a';\n</script>\n<style>\n\tp { margin: 0; }\n</style>\n";
        let component = Component::parse(src).unwrap();
        assert_eq!(component.script().unwrap().tree.program.body.len(), 1);
        assert_eq!(component.style().unwrap().sheet.nodes.len(), 1);
    }

    #[test]
    fn module_script_is_not_the_instance_script() {
        let component = Component::parse("<script context=\"module\">\n\texport const prerender = true;\n</script>\n").unwrap();
        assert!(component.script().is_none());
    }

    #[test]
    fn elements_are_found_depth_first() {
        let component = Component::parse("<main><section><form method=\"post\"></form></section></main>").unwrap();
        let form = component.find_element("form").unwrap();
        assert_eq!(form.attribute("method").unwrap().value.text(), Some("post"));
        assert!(component.find_element("table").is_none());
    }

    #[test]
    fn unclosed_element_is_a_parse_error() {
        let err = Component::parse("<div><span></div>").unwrap_err();
        assert!(matches!(err, DomainError::Parse { .. }));
        assert!(Component::parse("<div>").is_err());
    }
}
