//! Script adapter: JavaScript and TypeScript, JSX included.
//!
//! Files are read with tree-sitter grammars and lowered to a small AST.
//! Everything the AST does not model stays a verbatim `Raw` node, so a valid
//! file never fails to parse because it uses a class or a loop.
//! Serializing re-emits untouched nodes as their original text and prints
//! the rest with the file's inferred convention.

mod ast;
pub mod composite;
pub mod ops;
mod parser;
mod printer;
mod strings;
mod visit;

use std::ops::Range;

use tracing::debug;

use crate::domain::comments::{Comment, CommentTable, Placement};
use crate::domain::convention::{Convention, QuoteStyle, infer_quote_style};
use crate::domain::error::{DomainError, DomainResult};

pub use ast::*;
pub use printer::Style;

use parser::{Container, Lowerer, syntax_tree};
use printer::{Detacher, Printer, Sealer};
use visit::VisitMut;

/// A parsed script file together with its comments and conventions.
#[derive(Debug, Clone)]
pub struct ScriptTree {
    pub program: Program,
    pub comments: CommentTable,
    convention: Convention,
    style: Style,
    /// Indentation level of an embedded program, `None` for a whole file.
    base_level: Option<usize>,
}

impl ScriptTree {
    pub fn parse(text: &str) -> DomainResult<Self> {
        Self::parse_with(text, Convention::infer(text), None)
    }

    /// Parse the body of a markup `<script>` region. The indent unit comes
    /// from the enclosing component.
    pub(crate) fn parse_embedded(text: &str, indent: &str, base_level: usize) -> DomainResult<Self> {
        let convention = Convention {
            indent: indent.to_string(),
            quote: None,
        };
        Self::parse_with(text, convention, Some(base_level))
    }

    /// A script region with no statements yet.
    pub(crate) fn empty_embedded(indent: &str, base_level: usize) -> Self {
        Self {
            program: Program::default(),
            comments: CommentTable::new(),
            convention: Convention {
                indent: indent.to_string(),
                quote: None,
            },
            style: Style::default(),
            base_level: Some(base_level),
        }
    }

    fn parse_with(text: &str, convention: Convention, base_level: Option<usize>) -> DomainResult<Self> {
        let (tree, dialect) = syntax_tree(text)?;
        let parsed = Lowerer::new(text).lower_program(tree.root_node(), base_level.is_none());
        let quote = infer_quote_style(parsed.strings.iter().map(|span| &text[span.clone()]));
        let convention = convention.with_quote(quote);

        let mut comments = CommentTable::new();
        attach_comments(&mut comments, text, parsed.comments, &parsed.containers);

        let mut program = parsed.program;
        Sealer::new(&convention, &comments, parsed.style).visit_program(&mut program);

        debug!(
            statements = program.body.len(),
            %dialect,
            indent = ?convention.indent,
            quote = ?convention.quote,
            semicolons = parsed.style.semicolons,
            "parsed script"
        );

        Ok(Self {
            program,
            comments,
            convention,
            style: parsed.style,
            base_level,
        })
    }

    pub fn generate_code(&self) -> String {
        Printer::output(&self.convention, &self.comments, self.style)
            .program(&self.program, self.base_level)
    }

    pub fn convention(&self) -> &Convention {
        &self.convention
    }

    pub fn style(&self) -> Style {
        self.style
    }

    /// Quote for newly created string literals.
    pub fn quote(&self) -> QuoteStyle {
        self.convention.quote_or(QuoteStyle::Single)
    }

    pub fn is_empty(&self) -> bool {
        self.program.body.is_empty()
    }
}

/// Place grammar comments in the side table.
///
/// A comment goes to the innermost container around it. Comments inside an
/// item's own text stay with that item's source slice. Otherwise a comment on
/// the line where an item ends trails that item, and any other comment leads
/// the next item, trails the last one, or sits inside an empty container.
fn attach_comments(
    table: &mut CommentTable,
    src: &str,
    comments: Vec<(Comment, Range<usize>)>,
    containers: &[Container],
) {
    for (comment, span) in comments {
        let index = table.push_original(comment, span.clone());
        let Some(container) = containers
            .iter()
            .filter(|c| c.inner.start <= span.start && span.end <= c.inner.end)
            .min_by_key(|c| c.inner.len())
        else {
            continue;
        };
        let embedded = container
            .items
            .iter()
            .any(|(_, s)| s.start <= span.start && span.end <= s.end);
        if embedded {
            continue;
        }

        let prev = container.items.iter().rev().find(|(_, s)| s.end <= span.start);
        let next = container.items.iter().find(|(_, s)| s.start >= span.end);
        let (node, placement) = match (prev, next) {
            (Some((id, s)), _) if !src[s.end..span.start].contains('\n') => (*id, Placement::Trailing),
            (_, Some((id, _))) => (*id, Placement::Leading),
            (Some((id, _)), None) => (*id, Placement::Trailing),
            (None, None) => (container.id, Placement::Inner),
        };
        table.attach_original(index, node, placement);
    }
}

fn snippet_error(kind: &str, code: &str) -> DomainError {
    DomainError::InvalidInput(format!("expected {kind}, got `{}`", code.trim()))
}

/// Parse a single expression as a detached node.
pub fn parse_expression(code: &str) -> DomainResult<Expr> {
    let trimmed = code.trim().trim_end_matches(';').trim_end();
    if trimmed.is_empty() {
        return Err(snippet_error("a single expression", code));
    }
    let wrapped = format!("(\n{trimmed}\n)");
    let (tree, _) =
        syntax_tree(&wrapped).map_err(|_| snippet_error("a single expression", code))?;
    let mut expr = Lowerer::new(&wrapped)
        .lower_wrapped_expression(tree.root_node())
        .ok_or_else(|| snippet_error("a single expression", code))?;
    Detacher.visit_expr(&mut expr);
    Ok(expr)
}

/// Parse statements as detached nodes. Comments in the snippet are dropped.
pub fn parse_statements(code: &str) -> DomainResult<Vec<Stmt>> {
    let (tree, _) = syntax_tree(code)?;
    let mut program = Lowerer::new(code)
        .lower_program(tree.root_node(), false)
        .program;
    Detacher.visit_program(&mut program);
    Ok(program.body)
}

pub fn parse_statement(code: &str) -> DomainResult<Stmt> {
    let mut body = parse_statements(code)?;
    if body.len() != 1 {
        return Err(snippet_error("a single statement", code));
    }
    Ok(body.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_tree_round_trips_byte_for_byte() {
        let inputs = [
            "",
            "import a from 'a'\nconst x   =  {  y:1 }\n",
            "// header\n\nexport default defineConfig({\n\tplugins: [sveltekit()], // trailing\n});\n",
            "class A { #x = 1; get y() { return this.#x } }\nfor (let i = 0; i < 3; i++) {}\n",
            "const re = /ab+c/g, t = `a${b}c`;",
            "#!/usr/bin/env node\n// @ts-check\n\nmain();\n",
            "'use strict'\nconst el = <App {...props} />\n",
        ];
        for input in inputs {
            let tree = ScriptTree::parse(input).unwrap();
            assert_eq!(tree.generate_code(), input);
        }
    }

    #[test]
    fn jsx_and_tsx_files_parse() {
        let src = "const el = <div className=\"x\">hi</div>;\n";
        let mut tree = ScriptTree::parse(src).unwrap();
        assert!(matches!(tree.program.body[0].kind, StmtKind::Var(_)));
        assert_eq!(tree.generate_code(), src);

        tree.program.body.push(parse_statement("export default el;").unwrap());
        assert_eq!(tree.generate_code(), format!("{src}export default el;\n"));

        let tsx = "const f = (p: Props): JSX.Element => <b>{p.x}</b>;\n";
        assert!(ScriptTree::parse(tsx).is_ok());
    }

    #[test]
    fn fresh_copy_does_not_share_comments() {
        let mut tree = ScriptTree::parse("// original note\nconst a = 1;\n").unwrap();
        let copy = tree.program.body[0].fresh_copy();
        assert_ne!(copy.meta.id, tree.program.body[0].meta.id);
        let id = copy.meta.id;
        tree.program.body.push(copy);
        tree.comments
            .add(id, Comment::line(" only on the copy"), Placement::Leading);

        let out = tree.generate_code();
        assert_eq!(out.matches("only on the copy").count(), 1);
        assert_eq!(out.matches("original note").count(), 1);
    }

    #[test]
    fn comments_attach_to_neighbouring_statements() {
        let tree = ScriptTree::parse("// lead\nconst a = 1; // trail\n").unwrap();
        let id = tree.program.body[0].meta.id;
        let leading: Vec<_> = tree.comments.leading(id).map(|c| c.text.clone()).collect();
        let trailing: Vec<_> = tree.comments.trailing(id).map(|c| c.text.clone()).collect();
        assert_eq!(leading, [" lead"]);
        assert_eq!(trailing, [" trail"]);
    }

    #[test]
    fn comments_survive_sibling_insertion() {
        let mut tree = ScriptTree::parse("// lead\nconst a = 1; // trail\n").unwrap();
        tree.program.body.push(parse_statement("const b = 2;").unwrap());
        assert_eq!(
            tree.generate_code(),
            "// lead\nconst a = 1; // trail\nconst b = 2;\n"
        );
    }

    #[test]
    fn new_property_follows_tab_indentation() {
        let mut tree = ScriptTree::parse("const config = {\n\tkit: {}\n};\n").unwrap();
        let StmtKind::Var(decl) = &mut tree.program.body[0].kind else {
            panic!("expected a declaration");
        };
        let Some(init) = decl.declarations[0].init.as_mut() else {
            panic!("expected an initializer");
        };
        let ExprKind::Object(props) = &mut init.kind else {
            panic!("expected an object");
        };
        props.push(Property::key_value("b", Expr::number(2)));

        assert_eq!(
            tree.generate_code(),
            "const config = {\n\tkit: {},\n\tb: 2\n};\n"
        );
    }

    #[test]
    fn quote_style_comes_from_string_literals() {
        let tree = ScriptTree::parse("import a from \"a\";\nconst b = \"b\";\n").unwrap();
        assert_eq!(tree.quote(), QuoteStyle::Double);
        let tree = ScriptTree::parse("const n = 1;\n").unwrap();
        assert_eq!(tree.quote(), QuoteStyle::Single);
    }

    #[test]
    fn snippets_are_detached() {
        let expr = parse_expression("foo({ a: \"x\" })").unwrap();
        assert!(expr.meta.origin.is_none());
        assert_eq!(expr.callee_name(), Some("foo"));
        assert!(parse_statement("a(); b();").is_err());
        assert!(parse_expression("  ").is_err());
    }

    #[test]
    fn unbalanced_input_is_a_parse_error() {
        let err = ScriptTree::parse("const a = {\n").unwrap_err();
        assert!(matches!(err, DomainError::Parse { .. }));
    }
}
