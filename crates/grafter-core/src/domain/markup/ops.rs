//! Component upserts: script and style regions, attributes, markup splices.

use tracing::debug;

use crate::domain::css::Stylesheet;
use crate::domain::equality::{Canonical, equal};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::script::ScriptTree;

use super::{AttrValue, Attribute, Component, Element, MarkupNode, ScriptBlock, StyleBlock, TagRaws};

/// A node list markup can be spliced into.
pub trait Fragment {
    fn children_mut(&mut self) -> &mut Vec<MarkupNode>;

    /// Top-level component content.
    fn is_root(&self) -> bool {
        false
    }
}

impl Fragment for Component {
    fn children_mut(&mut self) -> &mut Vec<MarkupNode> {
        &mut self.nodes
    }

    fn is_root(&self) -> bool {
        true
    }
}

impl Fragment for Element {
    fn children_mut(&mut self) -> &mut Vec<MarkupNode> {
        &mut self.children
    }
}

impl Component {
    /// The instance `<script>` tree, creating an empty region at the top of
    /// the file if there is none. `lang_ts` tags a new region with
    /// `lang="ts"`; an existing region is left as it is.
    pub fn ensure_script(&mut self, lang_ts: bool) -> DomainResult<&mut ScriptTree> {
        if self.script().is_none() {
            let mut attributes = Vec::new();
            if lang_ts {
                attributes.push(Attribute::new("lang", AttrValue::quoted("ts")));
            }
            let block = ScriptBlock {
                attributes,
                tree: ScriptTree::empty_embedded(&self.convention.indent, 1),
                raws: TagRaws::default(),
            };
            let gap = if self.nodes.is_empty() { "\n" } else { "\n\n" };
            self.nodes
                .splice(0..0, [MarkupNode::Script(block), MarkupNode::Text(gap.into())]);
            debug!(lang_ts, "created script region");
        }
        self.nodes
            .iter_mut()
            .find_map(|node| match node {
                MarkupNode::Script(block) if !block.is_module() => Some(&mut block.tree),
                _ => None,
            })
            .ok_or_else(|| DomainError::shape("a <script> region", "none"))
    }

    /// The `<style>` sheet, creating an empty region at the end of the file
    /// if there is none.
    pub fn ensure_style(&mut self) -> DomainResult<&mut Stylesheet> {
        if self.style().is_none() {
            let block = StyleBlock {
                attributes: Vec::new(),
                sheet: Stylesheet::empty_embedded(&self.convention.indent, 1),
                raws: TagRaws::default(),
            };
            let gap = match self.nodes.last() {
                None => None,
                Some(MarkupNode::Text(text)) if text.ends_with('\n') => Some("\n"),
                Some(_) => Some("\n\n"),
            };
            if let Some(gap) = gap {
                self.nodes.push(MarkupNode::Text(gap.into()));
            }
            self.nodes.push(MarkupNode::Style(block));
            self.nodes.push(MarkupNode::Text("\n".into()));
            debug!("created style region");
        }
        self.nodes
            .iter_mut()
            .find_map(|node| match node {
                MarkupNode::Style(block) => Some(&mut block.sheet),
                _ => None,
            })
            .ok_or_else(|| DomainError::shape("a <style> region", "none"))
    }
}

/// Set an attribute, replacing the value of an existing one. Returns whether
/// the element changed.
pub fn set_attribute(element: &mut Element, name: &str, value: AttrValue) -> bool {
    match element.attributes.iter_mut().find(|a| a.name == name) {
        Some(existing) if existing.value == value => false,
        Some(existing) => {
            existing.value = value;
            existing.raw = None;
            true
        }
        None => {
            element.attributes.push(Attribute::new(name, value));
            true
        }
    }
}

/// Parse `markup` and add its nodes at the end of `target`, before any
/// closing whitespace. Returns `false` when every node is already there.
pub fn append_markup<F: Fragment + ?Sized>(target: &mut F, markup: &str) -> DomainResult<bool> {
    splice(target, markup, true)
}

/// Parse `markup` and add its nodes at the start of `target`, after any
/// leading whitespace and script regions.
pub fn prepend_markup<F: Fragment + ?Sized>(target: &mut F, markup: &str) -> DomainResult<bool> {
    splice(target, markup, false)
}

fn splice<F: Fragment + ?Sized>(target: &mut F, markup: &str, at_end: bool) -> DomainResult<bool> {
    let mut fragment = Component::parse(markup)?.nodes;
    let lead = fragment.iter().take_while(|n| n.is_whitespace()).count();
    fragment.drain(..lead);
    while fragment.last().is_some_and(MarkupNode::is_whitespace) {
        fragment.pop();
    }
    if fragment.is_empty() {
        return Ok(false);
    }

    let root = target.is_root();
    let children = target.children_mut();
    let present = fragment
        .iter()
        .filter(|n| !n.is_whitespace())
        .all(|n| children.iter().any(|c| equal(c, n)));
    if present {
        return Ok(false);
    }

    // Line break plus indentation used between siblings.
    let sep = match children.first() {
        Some(MarkupNode::Text(text)) if text.trim().is_empty() => match text.rfind('\n') {
            Some(nl) => format!("\n{}", &text[nl + 1..]),
            None => text.clone(),
        },
        _ if root => "\n".to_string(),
        _ => String::new(),
    };
    if let Some(indent) = sep.strip_prefix('\n') {
        indent_texts(&mut fragment, indent);
    }
    debug!(
        nodes = fragment.len(),
        at_end,
        canonical = %fragment.iter().map(Canonical::canonical).collect::<String>(),
        "splicing markup"
    );

    if children.is_empty() {
        children.extend(fragment);
        if root {
            children.push(MarkupNode::Text("\n".into()));
        }
        return Ok(true);
    }

    let mut nodes = Vec::with_capacity(fragment.len() + 1);
    if at_end {
        let index = match children.last() {
            Some(last) if last.is_whitespace() && children.len() > 1 => children.len() - 1,
            _ => children.len(),
        };
        if !sep.is_empty() {
            nodes.push(MarkupNode::Text(sep));
        }
        nodes.extend(fragment);
        children.splice(index..index, nodes);
    } else {
        let index = children
            .iter()
            .take_while(|n| n.is_whitespace() || (root && matches!(n, MarkupNode::Script(_))))
            .count();
        nodes.extend(fragment);
        if !sep.is_empty() {
            nodes.push(MarkupNode::Text(sep));
        }
        children.splice(index..index, nodes);
    }
    Ok(true)
}

/// Shift every line break inside new markup to the insertion indentation.
fn indent_texts(nodes: &mut [MarkupNode], indent: &str) {
    if indent.is_empty() {
        return;
    }
    for node in nodes {
        match node {
            MarkupNode::Text(text) => *text = text.replace('\n', &format!("\n{indent}")),
            MarkupNode::Element(el) => indent_texts(&mut el.children, indent),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::script::ops::imports::add_default;

    #[test]
    fn script_region_is_created_once() {
        let mut component = Component::parse("<h1>Hello</h1>\n").unwrap();
        let tree = component.ensure_script(true).unwrap();
        add_default(&mut tree.program, "./Counter.svelte", "Counter");
        let out = component.generate_code();
        assert_eq!(
            out,
            "<script lang=\"ts\">\n\timport Counter from './Counter.svelte';\n</script>\n\n<h1>Hello</h1>\n"
        );

        let mut again = Component::parse(&out).unwrap();
        let tree = again.ensure_script(true).unwrap();
        add_default(&mut tree.program, "./Counter.svelte", "Counter");
        assert_eq!(again.generate_code(), out);
    }

    #[test]
    fn existing_script_gains_import_at_its_indentation() {
        let src = "<script>\n  let count = 0;\n</script>\n\n<button>{count}</button>\n";
        let mut component = Component::parse(src).unwrap();
        let tree = component.ensure_script(false).unwrap();
        add_default(&mut tree.program, "x", "x");
        assert_eq!(
            component.generate_code(),
            "<script>\n  import x from 'x';\n\n  let count = 0;\n</script>\n\n<button>{count}</button>\n"
        );
    }

    #[test]
    fn style_region_is_appended() {
        let mut component = Component::parse("<p>x</p>\n").unwrap();
        let sheet = component.ensure_style().unwrap();
        let rule = crate::domain::css::add_rule(sheet, "p").unwrap();
        crate::domain::css::add_declaration(rule, "color", "red");
        assert_eq!(
            component.generate_code(),
            "<p>x</p>\n\n<style>\n\tp {\n\t\tcolor: red;\n\t}\n</style>\n"
        );
    }

    #[test]
    fn attributes_are_replaced_or_added() {
        let mut component = Component::parse("<html lang='en'>\n</html>\n").unwrap();
        let html = component.find_element_mut("html").unwrap();
        assert!(!set_attribute(html, "lang", AttrValue::Quoted { quote: '\'', text: "en".into() }));
        assert!(set_attribute(html, "lang", AttrValue::quoted("%lang%")));
        assert!(set_attribute(html, "data-theme", AttrValue::quoted("dark")));
        assert_eq!(
            component.generate_code(),
            "<html lang=\"%lang%\" data-theme=\"dark\">\n</html>\n"
        );
    }

    #[test]
    fn markup_is_appended_at_child_indentation() {
        let src = "<div>\n\t<p>a</p>\n</div>\n";
        let mut component = Component::parse(src).unwrap();
        let div = component.find_element_mut("div").unwrap();
        assert!(append_markup(div, "<p>b</p>").unwrap());
        let out = component.generate_code();
        assert_eq!(out, "<div>\n\t<p>a</p>\n\t<p>b</p>\n</div>\n");

        let mut again = Component::parse(&out).unwrap();
        let div = again.find_element_mut("div").unwrap();
        assert!(!append_markup(div, "<p>b</p>").unwrap());
    }

    #[test]
    fn markup_is_prepended_after_the_script() {
        let src = "<script>\n\tlet a = 1;\n</script>\n\n<main>{a}</main>\n";
        let mut component = Component::parse(src).unwrap();
        assert!(prepend_markup(&mut component, "<svelte:head>\n\t<title>x</title>\n</svelte:head>").unwrap());
        assert_eq!(
            component.generate_code(),
            "<script>\n\tlet a = 1;\n</script>\n\n<svelte:head>\n\t<title>x</title>\n</svelte:head>\n<main>{a}</main>\n"
        );
    }

    #[test]
    fn empty_component_gets_markup() {
        let mut component = Component::parse("").unwrap();
        append_markup(&mut component, "<slot />").unwrap();
        assert_eq!(component.generate_code(), "<slot />\n");
    }
}
