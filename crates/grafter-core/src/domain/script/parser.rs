//! Lowering from the tree-sitter syntax tree to the script AST.
//!
//! The TypeScript grammar is tried first, then TSX, then plain JavaScript
//! (which also reads JSX). Every production outside the modelled subset is
//! kept as a `Raw` node carrying its exact source slice, so a valid file
//! never fails to lower. Error and missing nodes in the grammar's tree are
//! reported as parse errors.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use tracing::debug;
use tree_sitter::{Language, Node, Parser, Tree};

use crate::domain::comments::Comment;
use crate::domain::error::{DomainError, DomainResult, SyntaxFormat};
use crate::domain::node::{Meta, NodeId, Origin, blank_line_between};

use super::ast::*;
use super::printer::Style;
use super::strings::unescape;

/// Grammar a script was read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dialect {
    TypeScript,
    Tsx,
    JavaScript,
}

impl Dialect {
    fn language(self) -> Language {
        match self {
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }

    pub(crate) const fn as_str(&self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::JavaScript => "javascript",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse `src` with the first grammar that accepts it. The error reported
/// is the TypeScript grammar's.
pub(crate) fn syntax_tree(src: &str) -> DomainResult<(Tree, Dialect)> {
    let tree = parse_with(src, Dialect::TypeScript)?;
    let Some(error) = syntax_error(tree.root_node(), src) else {
        return Ok((tree, Dialect::TypeScript));
    };
    for dialect in [Dialect::Tsx, Dialect::JavaScript] {
        let tree = parse_with(src, dialect)?;
        if !tree.root_node().has_error() {
            debug!(%dialect, "read script with fallback grammar");
            return Ok((tree, dialect));
        }
    }
    Err(error)
}

fn parse_with(src: &str, dialect: Dialect) -> DomainResult<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&dialect.language())
        .map_err(|e| DomainError::InvalidInput(format!("cannot load the {dialect} grammar: {e}")))?;
    parser
        .parse(src, None)
        .ok_or_else(|| DomainError::parse_at(SyntaxFormat::Script, src, 0, "parser gave up"))
}

fn syntax_error(root: Node<'_>, src: &str) -> Option<DomainError> {
    if !root.has_error() {
        return None;
    }
    let Some(node) = first_error(root) else {
        return Some(DomainError::parse_at(SyntaxFormat::Script, src, 0, "syntax error"));
    };
    let message = if node.is_missing() {
        format!("expected `{}`", node.kind())
    } else {
        match src[node.byte_range()].split_whitespace().next() {
            Some(token) => format!("unexpected `{}`", token.chars().take(24).collect::<String>()),
            None => "unexpected end of input".to_string(),
        }
    };
    Some(DomainError::parse_at(
        SyntaxFormat::Script,
        src,
        node.start_byte(),
        message,
    ))
}

fn first_error<'t>(node: Node<'t>) -> Option<Node<'t>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    children(node).into_iter().find_map(first_error)
}

// ── Tree helpers ────────────────────────────────────────────────────────────

fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Named children, comments left out.
fn named<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Whether `node` has the anonymous token `token` as a direct child.
fn has_token(node: Node<'_>, token: &str) -> bool {
    children(node)
        .iter()
        .any(|child| !child.is_named() && child.kind() == token)
}

fn field<'t>(node: Node<'t>, name: &str) -> Option<Node<'t>> {
    node.child_by_field_name(name)
}

/// Range between a bracketed node's first and last token.
fn inner_span(node: Node<'_>) -> Range<usize> {
    let all = children(node);
    let start = all.first().map_or(node.start_byte(), |c| c.end_byte());
    let end = all.last().map_or(node.end_byte(), |c| c.start_byte());
    start..end.max(start)
}

/// Pre-order walk over every node of the tree.
fn walk_tree(root: Node<'_>, mut visit: impl FnMut(Node<'_>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

fn span_of(meta: &Meta) -> Range<usize> {
    meta.origin.as_ref().map_or(0..0, Origin::span)
}

// ── Lowering ────────────────────────────────────────────────────────────────

/// A list of attachable items, used to place comments after parsing.
#[derive(Debug)]
pub(crate) struct Container {
    pub id: NodeId,
    /// Source range between the container's delimiters.
    pub inner: Range<usize>,
    pub items: Vec<(NodeId, Range<usize>)>,
}

pub(crate) struct Parsed {
    pub program: Program,
    pub containers: Vec<Container>,
    /// Comments outside the file header, in source order.
    pub comments: Vec<(Comment, Range<usize>)>,
    /// Spans of every string literal, for quote inference.
    pub strings: Vec<Range<usize>>,
    pub style: Style,
}

#[derive(Clone, Copy)]
struct Checkpoint {
    containers: usize,
    semis: (usize, usize),
    commas: (usize, usize),
}

pub(crate) struct Lowerer<'a> {
    src: &'a str,
    source: Arc<str>,
    containers: Vec<Container>,
    /// (with, without) semicolon votes.
    semis: (usize, usize),
    /// (with, without) trailing-comma votes for multi-line collections.
    commas: (usize, usize),
}

impl<'a> Lowerer<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self {
            src,
            source: Arc::from(src),
            containers: Vec::new(),
            semis: (0, 0),
            commas: (0, 0),
        }
    }

    /// Lower a whole program. With `header`, the hashbang line and the
    /// file's header comments are split off into `Program::header`.
    pub(crate) fn lower_program(mut self, root: Node<'_>, header: bool) -> Parsed {
        let id = NodeId::fresh();
        let mut hashbang_end = None;
        let mut nodes = Vec::new();
        for child in named(root) {
            if child.kind() == "hash_bang_line" {
                hashbang_end = Some(child.end_byte());
            } else {
                nodes.push(child);
            }
        }

        let mut comments = Vec::new();
        let mut strings = Vec::new();
        walk_tree(root, |node| match node.kind() {
            "comment" => comments.push(self.comment(node)),
            // JSX attribute values are double-quoted by convention.
            "string" if node.parent().is_none_or(|p| p.kind() != "jsx_attribute") => {
                strings.push(node.byte_range());
            }
            _ => {}
        });

        let header_len = if header {
            let first = nodes.first().map(Node::start_byte);
            header_end(self.src, hashbang_end, &comments, first)
        } else {
            0
        };
        comments.retain(|(_, span)| span.start >= header_len);

        let body = self.stmt_list(id, header_len..self.src.len(), &nodes);
        let program = Program {
            meta: Meta::parsed(id, Origin::new(self.source.clone(), 0..self.src.len())),
            header: (header_len > 0).then(|| self.src[..header_len].to_string()),
            body,
        };
        Parsed {
            program,
            style: Style {
                semicolons: self.semis.0 >= self.semis.1,
                trailing_comma: self.commas.0 > self.commas.1,
            },
            containers: self.containers,
            comments,
            strings,
        }
    }

    /// Lower the single expression of a `(\n...\n)` wrapped snippet.
    pub(crate) fn lower_wrapped_expression(mut self, root: Node<'_>) -> Option<Expr> {
        let [stmt] = named(root)[..] else {
            return None;
        };
        if stmt.kind() != "expression_statement" {
            return None;
        }
        let [paren] = named(stmt)[..] else {
            return None;
        };
        if paren.kind() != "parenthesized_expression" {
            return None;
        }
        let [inner] = named(paren)[..] else {
            return None;
        };
        Some(self.expr(inner))
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        let src: &'a str = self.src;
        &src[node.byte_range()]
    }

    fn origin(&self, node: Node<'_>) -> Origin {
        Origin::new(self.source.clone(), node.byte_range())
    }

    fn meta(&self, id: NodeId, node: Node<'_>) -> Meta {
        Meta::parsed(id, self.origin(node))
    }

    fn comment(&self, node: Node<'_>) -> (Comment, Range<usize>) {
        let raw = self.text(node);
        let start = node.start_byte();
        match raw.strip_prefix("//") {
            Some(line) => {
                let line = line.trim_end_matches('\r');
                (Comment::line(line), start..start + 2 + line.len())
            }
            None => {
                let body = raw
                    .strip_prefix("/*")
                    .and_then(|rest| rest.strip_suffix("*/"))
                    .unwrap_or(raw);
                (Comment::block(body), node.byte_range())
            }
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            containers: self.containers.len(),
            semis: self.semis,
            commas: self.commas,
        }
    }

    fn restore(&mut self, cp: Checkpoint) {
        self.containers.truncate(cp.containers);
        self.semis = cp.semis;
        self.commas = cp.commas;
    }

    /// Count whether a statement ends with an explicit `;`.
    fn vote_semicolon(&mut self, node: Node<'_>) {
        let explicit = children(node).last().is_some_and(|c| c.kind() == ";");
        if explicit {
            self.semis.0 += 1;
        } else {
            self.semis.1 += 1;
        }
    }

    fn vote_trailing_comma(&mut self, node: Node<'_>, trailing: bool) {
        if self.src[inner_span(node)].contains('\n') {
            if trailing {
                self.commas.0 += 1;
            } else {
                self.commas.1 += 1;
            }
        }
    }

    /// Text of a `: Type` annotation without its colon.
    fn annotation(&self, node: Node<'_>) -> String {
        self.text(node).trim_start_matches(':').trim_start().to_string()
    }

    // ── Statements ──────────────────────────────────────────────────────────

    fn stmt_list(&mut self, id: NodeId, inner: Range<usize>, nodes: &[Node<'_>]) -> Vec<Stmt> {
        let body: Vec<Stmt> = nodes.iter().map(|node| self.stmt(*node)).collect();
        let items = body.iter().map(|s| (s.meta.id, span_of(&s.meta))).collect();
        self.containers.push(Container { id, inner, items });
        body
    }

    fn stmt(&mut self, node: Node<'_>) -> Stmt {
        let cp = self.checkpoint();
        let id = NodeId::fresh();
        let kind = match self.structured_stmt(node, id) {
            Some(kind) => kind,
            None => {
                self.restore(cp);
                StmtKind::Raw(self.text(node).to_string())
            }
        };
        Stmt {
            meta: self.meta(id, node),
            kind,
        }
    }

    fn structured_stmt(&mut self, node: Node<'_>, id: NodeId) -> Option<StmtKind> {
        match node.kind() {
            "import_statement" => self.import(node).map(StmtKind::Import),
            "export_statement" => self.export(node),
            "lexical_declaration" | "variable_declaration" => {
                self.var_decl(node, false).map(StmtKind::Var)
            }
            "function_declaration" | "generator_function_declaration" => {
                self.function(node).map(StmtKind::Function)
            }
            "return_statement" => {
                let arg = named(node).first().map(|arg| self.expr(*arg));
                self.vote_semicolon(node);
                Some(StmtKind::Return(arg))
            }
            "expression_statement" => {
                let [inner] = named(node)[..] else {
                    return None;
                };
                if inner.kind() == "internal_module" {
                    return self.module(inner, false);
                }
                let expr = self.expr(inner);
                self.vote_semicolon(node);
                Some(StmtKind::Expr(expr))
            }
            "interface_declaration" => self.interface(node, false, id),
            "ambient_declaration" => self.ambient(node, id),
            "module" | "internal_module" => self.module(node, false),
            _ => None,
        }
    }

    fn string_lit(&self, node: Node<'_>) -> Literal {
        let raw = self.text(node);
        Literal {
            value: LitValue::Str(unescape(raw)),
            raw: Some(raw.to_string()),
        }
    }

    fn import(&mut self, node: Node<'_>) -> Option<ImportDecl> {
        let source = field(node, "source").filter(|s| s.kind() == "string")?;
        let mut type_only = false;
        let mut specifiers = Vec::new();
        for child in children(node) {
            match child.kind() {
                "import" | "from" | ";" | "comment" | "string" => {}
                "type" if !child.is_named() => type_only = true,
                "import_clause" => self.import_clause(child, &mut specifiers)?,
                _ => return None,
            }
        }
        self.vote_semicolon(node);
        Some(ImportDecl {
            type_only,
            specifiers,
            source: self.string_lit(source),
        })
    }

    fn import_clause(&self, node: Node<'_>, out: &mut Vec<ImportSpecifier>) -> Option<()> {
        for child in named(node) {
            match child.kind() {
                "identifier" => out.push(ImportSpecifier::Default(self.text(child).to_string())),
                "namespace_import" => {
                    let local = named(child)
                        .into_iter()
                        .find(|n| n.kind() == "identifier")?;
                    out.push(ImportSpecifier::Namespace(self.text(local).to_string()));
                }
                "named_imports" => {
                    for spec in named(child) {
                        if spec.kind() != "import_specifier" || has_token(spec, "typeof") {
                            return None;
                        }
                        let name = field(spec, "name").filter(|n| n.kind() == "identifier")?;
                        let imported = self.text(name).to_string();
                        let local = field(spec, "alias")
                            .map_or_else(|| imported.clone(), |a| self.text(a).to_string());
                        out.push(ImportSpecifier::Named {
                            imported,
                            local,
                            type_only: has_token(spec, "type"),
                        });
                    }
                }
                _ => return None,
            }
        }
        Some(())
    }

    fn export(&mut self, node: Node<'_>) -> Option<StmtKind> {
        if children(node).iter().any(|c| c.kind() == "decorator") {
            return None;
        }

        if has_token(node, "default") {
            if let Some(decl) = field(node, "declaration") {
                if !matches!(
                    decl.kind(),
                    "function_declaration" | "generator_function_declaration"
                ) {
                    return None;
                }
                let function = self.function(decl)?;
                let expr = Expr {
                    meta: self.meta(NodeId::fresh(), decl),
                    kind: ExprKind::Function(Box::new(function)),
                };
                return Some(StmtKind::ExportDefault(Box::new(expr)));
            }
            let value = field(node, "value")?;
            if value.kind() == "class" {
                return None;
            }
            let expr = self.expr(value);
            if !matches!(expr.kind, ExprKind::Function(_)) {
                self.vote_semicolon(node);
            }
            return Some(StmtKind::ExportDefault(Box::new(expr)));
        }

        if let Some(decl) = field(node, "declaration") {
            let declaration = self.stmt(decl);
            return Some(StmtKind::ExportNamed(ExportNamed {
                declaration: Some(Box::new(declaration)),
                ..ExportNamed::default()
            }));
        }

        let mut specifiers = None;
        let mut type_only = false;
        for child in children(node) {
            match child.kind() {
                "export" | "from" | ";" | "comment" | "string" => {}
                "type" if !child.is_named() => type_only = true,
                "export_clause" => specifiers = Some(self.export_specifiers(child)?),
                _ => return None,
            }
        }
        let source = field(node, "source").map(|s| self.string_lit(s));
        self.vote_semicolon(node);
        Some(StmtKind::ExportNamed(ExportNamed {
            declaration: None,
            specifiers: specifiers?,
            source,
            type_only,
        }))
    }

    fn export_specifiers(&self, node: Node<'_>) -> Option<Vec<ExportSpecifier>> {
        named(node)
            .into_iter()
            .map(|spec| {
                if spec.kind() != "export_specifier" || has_token(spec, "type") {
                    return None;
                }
                let name = field(spec, "name").filter(|n| n.kind() == "identifier")?;
                let local = self.text(name).to_string();
                let exported = field(spec, "alias")
                    .map_or_else(|| local.clone(), |a| self.text(a).to_string());
                Some(ExportSpecifier { local, exported })
            })
            .collect()
    }

    fn var_decl(&mut self, node: Node<'_>, declare: bool) -> Option<VarDecl> {
        let kind = match node.kind() {
            "variable_declaration" => VarKind::Var,
            _ => match field(node, "kind").map(|k| self.text(k)) {
                Some("const") => VarKind::Const,
                Some("let") => VarKind::Let,
                _ => return None,
            },
        };
        let mut declarations = Vec::new();
        for child in named(node) {
            if child.kind() != "variable_declarator" || has_token(child, "!") {
                return None;
            }
            let name = field(child, "name")?;
            if !matches!(name.kind(), "identifier" | "object_pattern" | "array_pattern") {
                return None;
            }
            declarations.push(Declarator {
                name: self.text(name).to_string(),
                type_annotation: field(child, "type").map(|t| self.annotation(t)),
                init: field(child, "value").map(|v| self.expr(v)),
            });
        }
        if declarations.is_empty() {
            return None;
        }
        self.vote_semicolon(node);
        Some(VarDecl {
            kind,
            declare,
            declarations,
        })
    }

    /// Function declarations and function expressions.
    fn function(&mut self, node: Node<'_>) -> Option<FunctionDecl> {
        let body = self.block(field(node, "body")?)?;
        Some(FunctionDecl {
            is_async: has_token(node, "async"),
            generator: has_token(node, "*"),
            name: field(node, "name").map(|n| self.text(n).to_string()),
            type_params: field(node, "type_parameters").map(|t| self.text(t).to_string()),
            params: self.text(field(node, "parameters")?).to_string(),
            return_type: field(node, "return_type").map(|t| self.annotation(t)),
            body,
        })
    }

    fn block(&mut self, node: Node<'_>) -> Option<Block> {
        if node.kind() != "statement_block" {
            return None;
        }
        let id = NodeId::fresh();
        let body = self.stmt_list(id, inner_span(node), &named(node));
        Some(Block {
            meta: self.meta(id, node),
            body,
        })
    }

    fn ambient(&mut self, node: Node<'_>, id: NodeId) -> Option<StmtKind> {
        if has_token(node, "global") {
            let body = named(node)
                .into_iter()
                .find(|c| c.kind() == "statement_block")?;
            return Some(StmtKind::Module(ModuleDecl {
                declare: true,
                kind: ModuleKind::Global,
                body: self.block(body)?,
            }));
        }
        let [inner] = named(node)[..] else {
            return None;
        };
        match inner.kind() {
            "lexical_declaration" | "variable_declaration" => {
                self.var_decl(inner, true).map(StmtKind::Var)
            }
            "interface_declaration" => self.interface(inner, true, id),
            "module" | "internal_module" => self.module(inner, true),
            _ => None,
        }
    }

    fn module(&mut self, node: Node<'_>, declare: bool) -> Option<StmtKind> {
        let name = field(node, "name")?;
        let kind = match (node.kind(), name.kind()) {
            ("internal_module", _) => ModuleKind::Namespace(self.text(name).to_string()),
            (_, "string") => ModuleKind::Module(self.text(name).to_string()),
            _ => return None,
        };
        let body = self.block(field(node, "body")?)?;
        Some(StmtKind::Module(ModuleDecl {
            declare,
            kind,
            body,
        }))
    }

    fn interface(&mut self, node: Node<'_>, declare: bool, id: NodeId) -> Option<StmtKind> {
        let name = self.text(field(node, "name")?).to_string();
        let body = field(node, "body")?;
        let extends = named(node)
            .into_iter()
            .find(|c| c.kind() == "extends_type_clause")
            .map(|c| self.text(c).trim_start_matches("extends").trim_start().to_string());

        let members: Vec<TsMember> = named(body)
            .into_iter()
            .map(|member| TsMember {
                meta: self.meta(NodeId::fresh(), member),
                kind: self
                    .ts_property(member)
                    .unwrap_or_else(|| TsMemberKind::Raw(self.text(member).to_string())),
            })
            .collect();
        self.containers.push(Container {
            id,
            inner: inner_span(body),
            items: members.iter().map(|m| (m.meta.id, span_of(&m.meta))).collect(),
        });

        Some(StmtKind::Interface(InterfaceDecl {
            declare,
            name,
            type_params: field(node, "type_parameters").map(|t| self.text(t).to_string()),
            extends,
            members,
        }))
    }

    fn ts_property(&self, node: Node<'_>) -> Option<TsMemberKind> {
        if node.kind() != "property_signature" {
            return None;
        }
        let mut readonly = false;
        let mut optional = false;
        for child in children(node) {
            match (child.is_named(), child.kind()) {
                (true, "property_identifier" | "type_annotation" | "comment") => {}
                (false, "readonly") => readonly = true,
                (false, "?") => optional = true,
                _ => return None,
            }
        }
        let name = field(node, "name").filter(|n| n.kind() == "property_identifier")?;
        Some(TsMemberKind::Property {
            readonly,
            name: self.text(name).to_string(),
            optional,
            ty: self.annotation(field(node, "type")?),
        })
    }

    // ── Expressions ─────────────────────────────────────────────────────────

    fn expr(&mut self, node: Node<'_>) -> Expr {
        let cp = self.checkpoint();
        let id = NodeId::fresh();
        let kind = match self.structured_expr(node, id) {
            Some(kind) => kind,
            None => {
                self.restore(cp);
                ExprKind::Raw(self.text(node).to_string())
            }
        };
        Expr {
            meta: self.meta(id, node),
            kind,
        }
    }

    fn first_named_expr(&mut self, node: Node<'_>) -> Option<Box<Expr>> {
        let [inner] = named(node)[..] else {
            return None;
        };
        Some(Box::new(self.expr(inner)))
    }

    fn structured_expr(&mut self, node: Node<'_>, id: NodeId) -> Option<ExprKind> {
        let text = self.text(node);
        let lit = |value: LitValue| {
            ExprKind::Lit(Literal {
                value,
                raw: Some(text.to_string()),
            })
        };
        let kind = match node.kind() {
            "identifier" | "this" | "undefined" => ExprKind::Ident(text.to_string()),
            "string" => ExprKind::Lit(self.string_lit(node)),
            "number" => lit(LitValue::Num(text.to_string())),
            "true" => lit(LitValue::Bool(true)),
            "false" => lit(LitValue::Bool(false)),
            "null" => lit(LitValue::Null),
            "regex" => lit(LitValue::Regex(text.to_string())),
            "template_string" => ExprKind::Template(text.to_string()),
            "array" => return self.array(node, id),
            "object" => return self.object(node, id),
            "call_expression" => return self.call(node, id),
            "new_expression" => {
                if field(node, "type_arguments").is_some() {
                    return None;
                }
                let callee = Box::new(self.expr(field(node, "constructor")?));
                let args = self.args(field(node, "arguments")?, id)?;
                ExprKind::New { callee, args }
            }
            "member_expression" => {
                let property = field(node, "property")?;
                if !matches!(
                    property.kind(),
                    "property_identifier" | "private_property_identifier"
                ) {
                    return None;
                }
                ExprKind::Member {
                    object: Box::new(self.expr(field(node, "object")?)),
                    property: MemberProp::Name(self.text(property).to_string()),
                    optional: is_optional(node),
                }
            }
            "subscript_expression" => ExprKind::Member {
                object: Box::new(self.expr(field(node, "object")?)),
                property: MemberProp::Computed(Box::new(self.expr(field(node, "index")?))),
                optional: is_optional(node),
            },
            "arrow_function" => return self.arrow(node),
            "function_expression" | "function" | "generator_function" => {
                ExprKind::Function(Box::new(self.function(node)?))
            }
            "spread_element" => ExprKind::Spread(self.first_named_expr(node)?),
            "await_expression" => ExprKind::Await(self.first_named_expr(node)?),
            "parenthesized_expression" => ExprKind::Paren(self.first_named_expr(node)?),
            "as_expression" | "satisfies_expression" => {
                let op = if node.kind() == "as_expression" {
                    CastOp::As
                } else {
                    CastOp::Satisfies
                };
                let keyword = children(node)
                    .into_iter()
                    .find(|c| !c.is_named() && c.kind() == op.as_str())?;
                let inner = *named(node).first()?;
                if inner.end_byte() > keyword.start_byte() {
                    return None;
                }
                ExprKind::TypeCast {
                    expr: Box::new(self.expr(inner)),
                    op,
                    ty: self.src[keyword.end_byte()..node.end_byte()].trim().to_string(),
                }
            }
            _ => return None,
        };
        Some(kind)
    }

    fn call(&mut self, node: Node<'_>, id: NodeId) -> Option<ExprKind> {
        let arguments = field(node, "arguments")?;
        if arguments.kind() != "arguments" {
            // Tagged template.
            return None;
        }
        let callee = Box::new(self.expr(field(node, "function")?));
        let type_args = field(node, "type_arguments").map(|t| self.text(t).to_string());
        let args = self.args(arguments, id)?;
        Some(ExprKind::Call {
            callee,
            type_args,
            args,
            optional: is_optional(node),
        })
    }

    fn args(&mut self, node: Node<'_>, id: NodeId) -> Option<Vec<Expr>> {
        if node.kind() != "arguments" {
            return None;
        }
        let args: Vec<Expr> = named(node).into_iter().map(|arg| self.expr(arg)).collect();
        self.containers.push(Container {
            id,
            inner: inner_span(node),
            items: args.iter().map(|a| (a.meta.id, span_of(&a.meta))).collect(),
        });
        Some(args)
    }

    fn arrow(&mut self, node: Node<'_>) -> Option<ExprKind> {
        let params = match (field(node, "parameter"), field(node, "parameters")) {
            (Some(param), _) => self.text(param).to_string(),
            (None, Some(params)) => {
                let start = field(node, "type_parameters").map_or(params.start_byte(), |t| t.start_byte());
                self.src[start..params.end_byte()].to_string()
            }
            (None, None) => return None,
        };
        let return_type = field(node, "return_type").map(|t| self.annotation(t));
        let body = field(node, "body")?;
        let body = if body.kind() == "statement_block" {
            ArrowBody::Block(self.block(body)?)
        } else {
            ArrowBody::Expr(Box::new(self.expr(body)))
        };
        Some(ExprKind::Arrow {
            is_async: has_token(node, "async"),
            params,
            return_type,
            body,
        })
    }

    fn array(&mut self, node: Node<'_>, id: NodeId) -> Option<ExprKind> {
        let mut elements = Vec::new();
        let mut expect_element = true;
        let mut trailing = false;
        for child in children(node) {
            match child.kind() {
                "[" | "]" | "comment" => {}
                "," => {
                    if expect_element {
                        // Holes stay verbatim.
                        return None;
                    }
                    expect_element = true;
                    trailing = true;
                }
                _ => {
                    elements.push(self.expr(child));
                    expect_element = false;
                    trailing = false;
                }
            }
        }
        if !elements.is_empty() {
            self.vote_trailing_comma(node, trailing);
        }
        self.containers.push(Container {
            id,
            inner: inner_span(node),
            items: elements.iter().map(|e| (e.meta.id, span_of(&e.meta))).collect(),
        });
        Some(ExprKind::Array(elements))
    }

    fn object(&mut self, node: Node<'_>, id: NodeId) -> Option<ExprKind> {
        let mut props = Vec::new();
        let mut trailing = false;
        for child in children(node) {
            match child.kind() {
                "{" | "}" | "comment" => {}
                "," => trailing = true,
                _ => {
                    props.push(self.property(child)?);
                    trailing = false;
                }
            }
        }
        if !props.is_empty() {
            self.vote_trailing_comma(node, trailing);
        }
        self.containers.push(Container {
            id,
            inner: inner_span(node),
            items: props.iter().map(|p| (p.meta.id, span_of(&p.meta))).collect(),
        });
        Some(ExprKind::Object(props))
    }

    fn property(&mut self, node: Node<'_>) -> Option<Property> {
        let kind = match node.kind() {
            "pair" => {
                let key = self.prop_key(field(node, "key")?)?;
                let value = self.expr(field(node, "value")?);
                PropKind::KeyValue { key, value }
            }
            "shorthand_property_identifier" => PropKind::Shorthand(self.text(node).to_string()),
            "spread_element" => PropKind::Spread(*self.first_named_expr(node)?),
            "method_definition" => PropKind::Method(self.text(node).to_string()),
            _ => return None,
        };
        Some(Property {
            meta: self.meta(NodeId::fresh(), node),
            kind,
        })
    }

    fn prop_key(&mut self, node: Node<'_>) -> Option<PropKey> {
        match node.kind() {
            "property_identifier" => Some(PropKey::Ident(self.text(node).to_string())),
            "string" => Some(PropKey::Str(self.string_lit(node))),
            "number" => Some(PropKey::Num(self.text(node).to_string())),
            "computed_property_name" => Some(PropKey::Computed(self.first_named_expr(node)?)),
            _ => None,
        }
    }
}

fn is_optional(node: Node<'_>) -> bool {
    children(node).iter().any(|c| c.kind() == "optional_chain")
}

/// Where the file header ends: the hashbang line plus the leading comments
/// that belong to the file rather than to its first statement, with the
/// blank lines after them.
///
/// A leading comment belongs to the file when it is a tool pragma, when a
/// blank line separates it from what follows, or when the file has no
/// statements at all. Everything before such a comment belongs to the file
/// too.
fn header_end(
    src: &str,
    hashbang_end: Option<usize>,
    comments: &[(Comment, Range<usize>)],
    first_stmt: Option<usize>,
) -> usize {
    let limit = first_stmt.unwrap_or(src.len());
    let leading: Vec<&(Comment, Range<usize>)> =
        comments.iter().filter(|(_, span)| span.end <= limit).collect();

    let mut end = hashbang_end.unwrap_or(0);
    for (i, (comment, span)) in leading.iter().enumerate() {
        let next = leading.get(i + 1).map_or(limit, |(_, s)| s.start);
        if first_stmt.is_none() || comment.is_pragma() || blank_line_between(src, span.end, next) {
            end = span.end;
        }
    }
    if end == 0 {
        return 0;
    }

    let rest = &src[end..];
    let gap = &rest[..rest.len() - rest.trim_start().len()];
    end + gap.rfind('\n').map_or(0, |nl| nl + 1)
}
