//! Stylesheet upserts.
//!
//! Rules match by selector, declarations by property, at-rules by name and
//! params. Matching ignores whitespace differences.

use tracing::debug;

use crate::domain::equality::squash_whitespace;
use crate::domain::error::{DomainError, DomainResult};

use super::printer::tight;
use super::{AtRule, CssNode, Decl, Rule, Stylesheet};

/// Anything that holds stylesheet nodes.
pub trait Container {
    fn nodes(&self) -> &[CssNode];
    fn nodes_mut(&mut self) -> &mut Vec<CssNode>;

    fn is_root(&self) -> bool {
        false
    }
}

impl Container for Stylesheet {
    fn nodes(&self) -> &[CssNode] {
        &self.nodes
    }

    fn nodes_mut(&mut self) -> &mut Vec<CssNode> {
        &mut self.nodes
    }

    fn is_root(&self) -> bool {
        true
    }
}

impl Container for Rule {
    fn nodes(&self) -> &[CssNode] {
        &self.nodes
    }

    fn nodes_mut(&mut self) -> &mut Vec<CssNode> {
        &mut self.nodes
    }
}

impl Container for AtRule {
    fn nodes(&self) -> &[CssNode] {
        self.nodes.as_deref().unwrap_or_default()
    }

    /// Gives a statement at-rule a block.
    fn nodes_mut(&mut self) -> &mut Vec<CssNode> {
        self.nodes.get_or_insert_with(Vec::new)
    }
}

fn same(a: &str, b: &str) -> bool {
    squash_whitespace(a) == squash_whitespace(b)
}

fn is_at_rule(node: &CssNode, name: &str, params: &str) -> bool {
    matches!(node, CssNode::AtRule(at) if at.name == name && same(&at.params, params))
}

/// Insert at `index`. A parsed top-level node pushed off the start of the file
/// gets the spacing a new neighbour would have.
fn insert<C: Container + ?Sized>(parent: &mut C, index: usize, node: CssNode) {
    let root = parent.is_root();
    let nodes = parent.nodes_mut();
    nodes.insert(index, node);
    if root
        && index == 0
        && let [first, second, ..] = nodes.as_mut_slice()
        && second.raws().before.as_deref() == Some("")
    {
        let sep = if tight(first, second) { "\n" } else { "\n\n" };
        second.raws_mut().before = Some(sep.to_string());
    }
}

fn not_found(what: String) -> DomainError {
    DomainError::shape(what, "none after inserting it")
}

pub fn find_rule<'a, C: Container + ?Sized>(parent: &'a C, selector: &str) -> Option<&'a Rule> {
    parent
        .nodes()
        .iter()
        .filter_map(CssNode::as_rule)
        .find(|rule| same(&rule.selector, selector))
}

/// Find the rule for `selector`, appending an empty one if missing.
pub fn add_rule<'a, C: Container + ?Sized>(
    parent: &'a mut C,
    selector: &str,
) -> DomainResult<&'a mut Rule> {
    if find_rule(parent, selector).is_none() {
        parent.nodes_mut().push(Rule::new(selector).into());
        debug!(selector, "added rule");
    }
    parent
        .nodes_mut()
        .iter_mut()
        .find_map(|node| match node {
            CssNode::Rule(rule) if same(&rule.selector, selector) => Some(rule),
            _ => None,
        })
        .ok_or_else(|| not_found(format!("a rule for `{selector}`")))
}

/// Set `prop: value` in a block: overwrite an existing declaration of `prop`,
/// or append one. Returns whether anything changed.
pub fn add_declaration<C: Container + ?Sized>(parent: &mut C, prop: &str, value: &str) -> bool {
    let existing = parent.nodes_mut().iter_mut().find_map(|node| match node {
        CssNode::Decl(decl) if decl.prop == prop => Some(decl),
        _ => None,
    });
    match existing {
        Some(decl) if same(&decl.value, value) => false,
        Some(decl) => {
            decl.value = value.to_string();
            true
        }
        None => {
            parent.nodes_mut().push(Decl::new(prop, value).into());
            true
        }
    }
}

pub fn remove_declaration<C: Container + ?Sized>(parent: &mut C, prop: &str) -> bool {
    let nodes = parent.nodes_mut();
    let before = nodes.len();
    nodes.retain(|node| !matches!(node, CssNode::Decl(decl) if decl.prop == prop));
    nodes.len() != before
}

pub fn find_at_rule<'a, C: Container + ?Sized>(
    parent: &'a C,
    name: &str,
    params: &str,
) -> Option<&'a AtRule> {
    parent
        .nodes()
        .iter()
        .filter(|node| is_at_rule(node, name, params))
        .find_map(CssNode::as_at_rule)
}

/// Find `@name params`, creating it at the end (`append`) or the start of
/// `parent` if missing.
///
/// Prepending always inserts at the start, so several prepends end up in
/// reverse call order.
pub fn add_at_rule<'a, C: Container + ?Sized>(
    parent: &'a mut C,
    name: &str,
    params: &str,
    append: bool,
) -> DomainResult<&'a mut AtRule> {
    if find_at_rule(parent, name, params).is_none() {
        let index = if append { parent.nodes().len() } else { 0 };
        insert(parent, index, AtRule::new(name, params).into());
        debug!(name, params, append, "added at-rule");
    }
    parent
        .nodes_mut()
        .iter_mut()
        .find_map(|node| match node {
            CssNode::AtRule(at) if at.name == name && same(&at.params, params) => Some(at),
            _ => None,
        })
        .ok_or_else(|| not_found(format!("`@{name} {params}`")))
}

/// Add `@import params;` after the last existing import, or at the start.
/// Returns `false` when an equal import exists.
pub fn add_import(sheet: &mut Stylesheet, params: &str) -> bool {
    if find_at_rule(sheet, "import", params).is_some() {
        return false;
    }
    let index = sheet
        .nodes
        .iter()
        .rposition(|node| matches!(node, CssNode::AtRule(at) if at.name == "import"))
        .map_or(0, |last| last + 1);
    insert(sheet, index, AtRule::new("import", params).into());
    true
}

/// Remove the rule for `selector`. The next node inherits its spacing when it
/// was the first one.
pub fn remove_rule<C: Container + ?Sized>(parent: &mut C, selector: &str) -> bool {
    let nodes = parent.nodes_mut();
    let Some(index) = nodes
        .iter()
        .position(|node| matches!(node, CssNode::Rule(rule) if same(&rule.selector, selector)))
    else {
        return false;
    };
    let removed = nodes.remove(index);
    if index == 0
        && let Some(next) = nodes.first_mut()
        && next.raws().before.is_some()
    {
        next.raws_mut().before = removed.raws().before.clone();
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_and_declarations_use_file_indentation() {
        let mut sheet = Stylesheet::parse("body {\n  margin: 0;\n}\n").unwrap();
        let rule = add_rule(&mut sheet, ".btn").unwrap();
        assert!(add_declaration(rule, "color", "red"));
        assert!(add_declaration(rule, "padding", "0 1rem"));
        assert_eq!(
            sheet.generate_code(),
            "body {\n  margin: 0;\n}\n\n.btn {\n  color: red;\n  padding: 0 1rem;\n}\n"
        );
    }

    #[test]
    fn existing_declaration_is_overwritten() {
        let mut sheet = Stylesheet::parse("a {\n\tcolor: red;\n\tmargin: 0;\n}\n").unwrap();
        let rule = add_rule(&mut sheet, "a").unwrap();
        assert!(add_declaration(rule, "color", "blue"));
        assert!(!add_declaration(rule, "margin", "0"));
        assert_eq!(sheet.nodes.len(), 1);
        assert_eq!(sheet.generate_code(), "a {\n\tcolor: blue;\n\tmargin: 0;\n}\n");
    }

    #[test]
    fn single_line_rule_stays_single_line() {
        let mut sheet = Stylesheet::parse("a { color: red }\n").unwrap();
        add_declaration(add_rule(&mut sheet, "a").unwrap(), "margin", "0");
        assert_eq!(sheet.generate_code(), "a { color: red; margin: 0; }\n");
    }

    #[test]
    fn empty_rule_opens_up() {
        let mut sheet = Stylesheet::parse("a {}\n").unwrap();
        add_declaration(add_rule(&mut sheet, "a").unwrap(), "color", "red");
        assert_eq!(sheet.generate_code(), "a {\n\tcolor: red;\n}\n");
    }

    #[test]
    fn prepended_at_rules_come_out_in_reverse_call_order() {
        let mut sheet = Stylesheet::parse("body {\n\tmargin: 0;\n}\n").unwrap();
        add_at_rule(&mut sheet, "import", "'b.css'", false).unwrap();
        add_at_rule(&mut sheet, "import", "'a.css'", false).unwrap();
        let out = sheet.generate_code();
        assert_eq!(
            out,
            "@import 'a.css';\n@import 'b.css';\n\nbody {\n\tmargin: 0;\n}\n"
        );

        let mut again = Stylesheet::parse(&out).unwrap();
        add_at_rule(&mut again, "import", "'b.css'", false).unwrap();
        add_at_rule(&mut again, "import", "'a.css'", false).unwrap();
        assert_eq!(again.generate_code(), out);
    }

    #[test]
    fn imports_go_after_the_last_import() {
        let mut sheet =
            Stylesheet::parse("@import 'a.css';\n@import 'b.css';\n\n.x {}\n").unwrap();
        assert!(add_import(&mut sheet, "'c.css'"));
        assert!(!add_import(&mut sheet, "'a.css'"));
        assert_eq!(
            sheet.generate_code(),
            "@import 'a.css';\n@import 'b.css';\n@import 'c.css';\n\n.x {}\n"
        );

        let mut empty = Stylesheet::parse("").unwrap();
        add_import(&mut empty, "'tailwindcss'");
        assert_eq!(empty.generate_code(), "@import 'tailwindcss';\n");
    }

    #[test]
    fn at_rule_can_gain_a_block() {
        let mut sheet = Stylesheet::parse("@import 'tailwindcss';\n").unwrap();
        let layer = add_at_rule(&mut sheet, "layer", "base", true).unwrap();
        let rule = add_rule(layer, "h1").unwrap();
        add_declaration(rule, "font-weight", "700");
        assert_eq!(
            sheet.generate_code(),
            "@import 'tailwindcss';\n\n@layer base {\n\th1 {\n\t\tfont-weight: 700;\n\t}\n}\n"
        );
        assert!(find_at_rule(&sheet, "layer", "base").is_some_and(AtRule::has_block));
        assert!(find_at_rule(&sheet, "layer", "components").is_none());
    }

    #[test]
    fn removing_the_first_rule_keeps_the_file_start_clean() {
        let mut sheet = Stylesheet::parse("a {}\n\nb {}\n").unwrap();
        assert!(remove_rule(&mut sheet, "a"));
        assert!(!remove_rule(&mut sheet, "a"));
        assert_eq!(sheet.generate_code(), "b {}\n");
    }

    #[test]
    fn declarations_can_be_removed() {
        let mut sheet = Stylesheet::parse("a {\n\tcolor: red;\n\tmargin: 0;\n}\n").unwrap();
        let rule = add_rule(&mut sheet, "a").unwrap();
        assert!(remove_declaration(rule, "color"));
        assert_eq!(sheet.generate_code(), "a {\n\tmargin: 0;\n}\n");
    }
}
