use super::{CssNode, Raws, Stylesheet};

pub(super) struct Printer<'a> {
    indent: &'a str,
    out: String,
}

impl<'a> Printer<'a> {
    pub(super) fn new(indent: &'a str) -> Self {
        Self {
            indent,
            out: String::new(),
        }
    }

    pub(super) fn stylesheet(mut self, sheet: &Stylesheet) -> String {
        let base = sheet.base_level();
        self.nodes(&sheet.nodes, sheet.raws.semicolon, base, true);
        match &sheet.raws.after {
            Some(after) => self.out.push_str(after),
            None if !sheet.nodes.is_empty() => {
                self.out.push('\n');
                self.out.push_str(&self.indent.repeat(base.saturating_sub(1)));
            }
            None => {}
        }
        self.out
    }

    fn nodes(&mut self, nodes: &[CssNode], semicolon: Option<bool>, depth: usize, root: bool) {
        for (i, node) in nodes.iter().enumerate() {
            let before = self.before(nodes, i, depth, root);
            self.out.push_str(&before);
            self.node(node, depth);

            let last = i + 1 == nodes.len();
            if node.is_statement() && (!last || semicolon != Some(false) || node.is_new()) {
                if let Some(after) = &node.raws().after {
                    self.out.push_str(after);
                }
                self.out.push(';');
            }
        }
    }

    fn node(&mut self, node: &CssNode, depth: usize) {
        match node {
            CssNode::Rule(rule) => {
                self.out.push_str(&rule.selector);
                self.block(&rule.nodes, &rule.raws, depth);
            }
            CssNode::AtRule(at) => {
                self.out.push('@');
                self.out.push_str(&at.name);
                let gap = match &at.raws.after_name {
                    Some(gap) => gap.as_str(),
                    None if at.params.is_empty() => "",
                    None => " ",
                };
                self.out.push_str(gap);
                self.out.push_str(&at.params);
                if let Some(nodes) = &at.nodes {
                    self.block(nodes, &at.raws, depth);
                }
            }
            CssNode::Decl(decl) => {
                self.out.push_str(&decl.prop);
                self.out.push_str(decl.raws.between.as_deref().unwrap_or(": "));
                self.out.push_str(&decl.value);
            }
            CssNode::Comment(comment) => {
                self.out.push_str("/*");
                self.out.push_str(&comment.text);
                self.out.push_str("*/");
            }
            CssNode::Raw(raw) => self.out.push_str(&raw.text),
        }
    }

    fn block(&mut self, nodes: &[CssNode], raws: &Raws, depth: usize) {
        self.out.push_str(raws.between.as_deref().unwrap_or(" "));
        self.out.push('{');
        self.nodes(nodes, raws.semicolon, depth + 1, false);

        let close = format!("\n{}", self.indent.repeat(depth));
        let after = match &raws.after {
            None if nodes.is_empty() => String::new(),
            None => close,
            // A block written on one line that now holds nodes on their own
            // lines closes on its own line too.
            Some(after)
                if !after.contains('\n')
                    && !nodes.is_empty()
                    && self.before(nodes, 0, depth + 1, false).contains('\n') =>
            {
                close
            }
            Some(after) => after.clone(),
        };
        self.out.push_str(&after);
        self.out.push('}');
    }

    /// Whitespace before `nodes[i]`: its own, or one derived for a new node.
    fn before(&self, nodes: &[CssNode], i: usize, depth: usize, root: bool) -> String {
        if let Some(before) = &nodes[i].raws().before {
            return before.clone();
        }
        let indent = self.indent.repeat(depth);
        if root {
            if i == 0 {
                return if depth == 0 { String::new() } else { format!("\n{indent}") };
            }
            let sep = if tight(&nodes[i - 1], &nodes[i]) { "\n" } else { "\n\n" };
            return format!("{sep}{indent}");
        }

        // Inside a block, copy a sibling's spacing without its blank lines.
        let sibling = nodes[..i]
            .iter()
            .rev()
            .chain(nodes[i + 1..].iter())
            .find_map(|n| n.raws().before.as_deref());
        match sibling {
            Some(before) => match before.rfind('\n') {
                Some(nl) => format!("\n{}", &before[nl + 1..]),
                None => before.to_string(),
            },
            None => format!("\n{indent}"),
        }
    }
}

/// Top-level neighbours printed without a blank line between them.
pub(super) fn tight(prev: &CssNode, next: &CssNode) -> bool {
    match (prev, next) {
        (CssNode::Comment(_), _) => true,
        (CssNode::AtRule(a), CssNode::AtRule(b)) => !a.has_block() && !b.has_block(),
        _ => false,
    }
}
