//! Script printer.
//!
//! One printer, three modes:
//!
//! - `Output` re-emits every node whose fingerprint still matches its parse
//!   as the original source slice, and prints everything else structurally
//!   with the file's convention.
//! - `Fingerprint` prints structurally on one line, raw literal text and
//!   comments included. Its hash is what `Output` compares against.
//! - `Canonical` is `Fingerprint` without raws or comments, with double
//!   quotes everywhere. It backs structural equality.

use crate::domain::comments::{CommentForm, CommentTable, Entry, Placement};
use crate::domain::convention::{Convention, QuoteStyle};
use crate::domain::equality::{Canonical, squash_whitespace};
use crate::domain::node::{Meta, NodeId, Origin, blank_line_between, fingerprint, reindent};

use super::ast::*;
use super::strings::quote;
use super::visit::{self, VisitMut};

/// File-level punctuation habits inferred from the original program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub semicolons: bool,
    pub trailing_comma: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            semicolons: true,
            trailing_comma: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Output,
    Fingerprint,
    Canonical,
}

pub(crate) trait HasMeta {
    fn meta(&self) -> &Meta;
    fn meta_mut(&mut self) -> &mut Meta;
}

pub(crate) trait Print: HasMeta {
    fn print_structure(&self, p: &mut Printer<'_>);
}

macro_rules! has_meta {
    ($($ty:ty),*) => {
        $(impl HasMeta for $ty {
            fn meta(&self) -> &Meta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut Meta {
                &mut self.meta
            }
        })*
    };
}

has_meta!(Program, Stmt, Block, Expr, Property, TsMember);

impl Print for Program {
    fn print_structure(&self, p: &mut Printer<'_>) {
        if let Some(header) = self.header.as_deref().filter(|_| p.mode != Mode::Canonical) {
            p.out.push_str(header);
        }
        p.statements(&self.body, self.meta.id, true);
    }
}

impl Print for Stmt {
    fn print_structure(&self, p: &mut Printer<'_>) {
        p.stmt(self);
    }
}

impl Print for Block {
    fn print_structure(&self, p: &mut Printer<'_>) {
        p.block(self);
    }
}

impl Print for Expr {
    fn print_structure(&self, p: &mut Printer<'_>) {
        p.expr(self);
    }
}

impl Print for Property {
    fn print_structure(&self, p: &mut Printer<'_>) {
        p.property(self);
    }
}

impl Print for TsMember {
    fn print_structure(&self, p: &mut Printer<'_>) {
        p.ts_member(self);
    }
}

macro_rules! canonical {
    ($($ty:ty),*) => {
        $(impl Canonical for $ty {
            fn canonical(&self) -> String {
                Printer::canonical().render(self)
            }
        })*
    };
}

canonical!(Program, Stmt, Expr, Property, TsMember);

/// Delimited, separated list layout.
struct List {
    open: &'static str,
    close: &'static str,
    sep: &'static str,
    multiline: bool,
    pad: bool,
    trailing_sep: bool,
    container: NodeId,
}

pub(crate) struct Printer<'a> {
    mode: Mode,
    comments: Option<&'a CommentTable>,
    indent: &'a str,
    quote: QuoteStyle,
    style: Style,
    level: usize,
    out: String,
}

impl<'a> Printer<'a> {
    pub(crate) fn output(
        convention: &'a Convention,
        comments: &'a CommentTable,
        style: Style,
    ) -> Self {
        Self {
            mode: Mode::Output,
            comments: Some(comments),
            indent: &convention.indent,
            quote: convention.quote_or(QuoteStyle::Single),
            style,
            level: 0,
            out: String::new(),
        }
    }

    pub(crate) fn canonical() -> Printer<'static> {
        Printer {
            mode: Mode::Canonical,
            comments: None,
            indent: "",
            quote: QuoteStyle::Double,
            style: Style::default(),
            level: 0,
            out: String::new(),
        }
    }

    pub(crate) fn render<T: Print + ?Sized>(mut self, node: &T) -> String {
        self.node(node);
        self.out
    }

    /// Print a whole program. Embedded programs (inside a markup `<script>`)
    /// are framed by line breaks and indented by `base_level`.
    pub(crate) fn program(mut self, program: &Program, base_level: Option<usize>) -> String {
        if let Some(origin) = program.meta.unchanged(self.fingerprint_of(program)) {
            return origin.text().to_string();
        }
        let has_inner = !self.entries(program.meta.id, Placement::Inner).is_empty();
        match base_level {
            Some(level) => {
                if program.body.is_empty() && !has_inner {
                    return "\n".into();
                }
                self.level = level;
                self.out.push('\n');
                self.out.push_str(&self.indent_str());
                self.statements(&program.body, program.meta.id, true);
                self.out.push('\n');
            }
            None => {
                if let Some(header) = &program.header {
                    self.out.push_str(header);
                    if !header.ends_with('\n') && !program.body.is_empty() {
                        self.out.push('\n');
                    }
                }
                self.statements(&program.body, program.meta.id, true);
                let keep_newline = program
                    .meta
                    .origin
                    .as_ref()
                    .is_none_or(|o| o.text().is_empty() || o.text().ends_with('\n'));
                if !self.out.is_empty() && !self.out.ends_with('\n') && keep_newline {
                    self.out.push('\n');
                }
            }
        }
        self.out
    }

    pub(crate) fn fingerprint_of<T: Print + ?Sized>(&self, node: &T) -> u64 {
        let mut p = Printer {
            mode: Mode::Fingerprint,
            comments: self.comments,
            indent: self.indent,
            quote: self.quote,
            style: self.style,
            level: 0,
            out: String::new(),
        };
        node.print_structure(&mut p);
        fingerprint(&p.out)
    }

    fn node<T: Print + ?Sized>(&mut self, node: &T) {
        if !self.try_slice(node) {
            node.print_structure(self);
        }
    }

    fn try_slice<T: Print + ?Sized>(&mut self, node: &T) -> bool {
        if self.mode != Mode::Output {
            return false;
        }
        let Some(origin) = node.meta().unchanged(self.fingerprint_of(node)) else {
            return false;
        };
        let text = reindent(origin.text(), origin.base_indent(), &self.indent_str());
        self.out.push_str(&text);
        true
    }

    // ── Layout helpers ──────────────────────────────────────────────────────

    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn indent_str(&self) -> String {
        self.indent.repeat(self.level)
    }

    fn line_break(&mut self, blank: bool) {
        if self.mode != Mode::Output {
            self.out.push(' ');
            return;
        }
        self.out.push('\n');
        if blank {
            self.out.push('\n');
        }
        let indent = self.indent_str();
        self.out.push_str(&indent);
    }

    /// Verbatim text; whitespace-insensitive in canonical mode.
    fn verbatim(&mut self, text: &str) {
        if self.mode == Mode::Canonical {
            let squashed = squash_whitespace(text);
            self.out.push_str(&squashed);
        } else {
            self.out.push_str(text);
        }
    }

    fn semi(&mut self) {
        if self.style.semicolons || self.mode == Mode::Canonical {
            self.out.push(';');
        }
    }

    fn entries(&self, id: NodeId, placement: Placement) -> &'a [Entry] {
        match (self.mode, self.comments) {
            (Mode::Canonical, _) | (_, None) => &[],
            (_, Some(table)) => table.entries(id, placement),
        }
    }

    fn has_line_comment(&self, id: NodeId) -> bool {
        match (self.mode, self.comments) {
            (Mode::Canonical, _) | (_, None) => false,
            (_, Some(table)) => table.has_line_comment(id),
        }
    }

    /// Line breaks and leading comments in front of a list item.
    ///
    /// Blank lines are reproduced where the original had them; for items
    /// with no original position, `fresh_blank` decides.
    fn leading<T: Print>(&mut self, item: &T, prev: Option<&T>, first: bool, fresh_blank: bool) {
        let origin = item.meta().origin.as_ref();
        let item_span = origin.map(Origin::span);
        let mut cursor = prev
            .and_then(|p| p.meta().origin.as_ref())
            .filter(|p| origin.is_some_and(|o| o.same_source(p)))
            .map(|p| p.span().end);
        let mut started = !first;
        let mut inline = false;

        let entries = self.entries(item.meta().id, Placement::Leading);
        for (i, entry) in entries.iter().enumerate() {
            let span = entry
                .span
                .clone()
                .or_else(|| item_span.clone().map(|s| s.start..s.start));
            let blank = match (cursor, &span, origin) {
                (Some(c), Some(s), Some(o)) => blank_line_between(o.source(), c, s.start),
                _ => i == 0 && fresh_blank,
            };
            if started {
                self.line_break(blank);
            }
            started = true;
            self.push(&entry.comment.render());
            inline = entry.comment.form == CommentForm::Block
                && match (&entry.span, origin) {
                    (Some(s), Some(o)) => {
                        s.end <= o.span().start && !o.source()[s.end..o.span().start].contains('\n')
                    }
                    _ => false,
                };
            if let Some(s) = span {
                cursor = Some(s.end);
            }
        }

        let blank = match (cursor, origin) {
            (Some(c), Some(o)) => blank_line_between(o.source(), c, o.span().start),
            _ => entries.is_empty() && fresh_blank,
        };
        if inline {
            self.push(" ");
        } else if started {
            self.line_break(blank);
        }
    }

    fn trailing<T: Print>(&mut self, item: &T) {
        let origin = item.meta().origin.as_ref();
        for entry in self.entries(item.meta().id, Placement::Trailing) {
            let own_line = match (&entry.span, origin) {
                (Some(s), Some(o)) if s.start >= o.span().end => {
                    let gap = &o.source()[o.span().end..s.start];
                    gap.contains('\n').then(|| blank_line_between(o.source(), o.span().end, s.start))
                }
                _ => None,
            };
            match own_line {
                Some(blank) => self.line_break(blank),
                None => self.push(" "),
            }
            self.push(&entry.comment.render());
        }
    }

    fn statements(&mut self, body: &[Stmt], container: NodeId, top: bool) {
        let mut first = top;
        for entry in self.entries(container, Placement::Inner) {
            if !first {
                self.line_break(false);
            }
            first = false;
            self.push(&entry.comment.render());
        }
        let mut prev: Option<&Stmt> = None;
        for stmt in body {
            let fresh_blank = prev.is_some_and(|p| p.is_import() != stmt.is_import());
            self.leading(stmt, prev, first, fresh_blank);
            first = false;
            self.node(stmt);
            self.trailing(stmt);
            prev = Some(stmt);
        }
    }

    fn list<T: Print>(&mut self, items: &[T], list: List) {
        let inner = self.entries(list.container, Placement::Inner);
        self.push(list.open);
        if items.is_empty() && inner.is_empty() {
            self.push(list.close);
            return;
        }

        let multiline = self.mode == Mode::Output
            && (list.multiline
                || inner.iter().any(|e| e.comment.form == CommentForm::Line)
                || items.iter().any(|i| self.has_line_comment(i.meta().id)));

        if multiline {
            self.level += 1;
            for entry in inner {
                self.line_break(false);
                self.push(&entry.comment.render());
            }
            let mut prev: Option<&T> = None;
            for (i, item) in items.iter().enumerate() {
                self.leading(item, prev, false, false);
                self.node(item);
                if i + 1 < items.len() || list.trailing_sep {
                    self.push(list.sep);
                }
                self.trailing(item);
                prev = Some(item);
            }
            self.level -= 1;
            self.line_break(false);
        } else {
            let mut parts_written = 0usize;
            if list.pad {
                self.push(" ");
            }
            for entry in inner {
                if parts_written > 0 {
                    self.push(" ");
                }
                self.push(&entry.comment.render());
                parts_written += 1;
            }
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    self.push(list.sep);
                }
                if parts_written > 0 {
                    self.push(" ");
                }
                for entry in self.entries(item.meta().id, Placement::Leading) {
                    self.push(&entry.comment.render());
                    self.push(" ");
                }
                self.node(item);
                for entry in self.entries(item.meta().id, Placement::Trailing) {
                    self.push(" ");
                    self.push(&entry.comment.render());
                }
                parts_written += 1;
            }
            if list.pad {
                self.push(" ");
            }
        }
        self.push(list.close);
    }

    // ── Statements ──────────────────────────────────────────────────────────

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Import(decl) => {
                self.import(decl);
                self.semi();
            }
            StmtKind::ExportDefault(expr) => {
                self.push("export default ");
                self.node(expr.as_ref());
                let declaration_like = match &expr.kind {
                    ExprKind::Function(_) => true,
                    ExprKind::Raw(text) => text.starts_with("class"),
                    _ => false,
                };
                if !declaration_like {
                    self.semi();
                }
            }
            StmtKind::ExportNamed(named) => {
                self.push("export ");
                if let Some(decl) = &named.declaration {
                    self.node(decl.as_ref());
                    return;
                }
                if named.type_only {
                    self.push("type ");
                }
                let specifiers: Vec<String> = named
                    .specifiers
                    .iter()
                    .map(|s| {
                        if s.local == s.exported {
                            s.local.clone()
                        } else {
                            format!("{} as {}", s.local, s.exported)
                        }
                    })
                    .collect();
                if specifiers.is_empty() {
                    self.push("{}");
                } else {
                    self.push(&format!("{{ {} }}", specifiers.join(", ")));
                }
                if let Some(source) = &named.source {
                    self.push(" from ");
                    self.literal(source);
                }
                self.semi();
            }
            StmtKind::Var(decl) => {
                self.var(decl);
                self.semi();
            }
            StmtKind::Function(function) => self.function(function),
            StmtKind::Return(arg) => {
                self.push("return");
                if let Some(arg) = arg {
                    self.push(" ");
                    self.node(arg);
                }
                self.semi();
            }
            StmtKind::Expr(expr) => {
                self.node(expr);
                self.semi();
            }
            StmtKind::Interface(decl) => {
                if decl.declare {
                    self.push("declare ");
                }
                self.push("interface ");
                self.push(&decl.name);
                if let Some(params) = &decl.type_params {
                    self.verbatim(params);
                }
                if let Some(extends) = &decl.extends {
                    self.push(" extends ");
                    self.verbatim(extends);
                }
                self.push(" ");
                self.list(
                    &decl.members,
                    List {
                        open: "{",
                        close: "}",
                        sep: ";",
                        multiline: true,
                        pad: true,
                        trailing_sep: true,
                        container: stmt.meta.id,
                    },
                );
            }
            StmtKind::Module(decl) => {
                if decl.declare {
                    self.push("declare ");
                }
                match &decl.kind {
                    ModuleKind::Global => self.push("global"),
                    ModuleKind::Namespace(name) => {
                        self.push("namespace ");
                        self.push(name);
                    }
                    ModuleKind::Module(name) => {
                        self.push("module ");
                        self.push(name);
                    }
                }
                self.push(" ");
                self.node(&decl.body);
            }
            StmtKind::Raw(text) => self.verbatim(text),
        }
    }

    fn import(&mut self, decl: &ImportDecl) {
        self.push("import ");
        if decl.type_only {
            self.push("type ");
        }
        if decl.specifiers.is_empty() {
            self.literal(&decl.source);
            return;
        }

        let mut parts = Vec::new();
        let mut named = Vec::new();
        for specifier in &decl.specifiers {
            match specifier {
                ImportSpecifier::Default(local) => parts.push(local.clone()),
                ImportSpecifier::Namespace(local) => parts.push(format!("* as {local}")),
                ImportSpecifier::Named {
                    imported,
                    local,
                    type_only,
                } => {
                    let prefix = if *type_only { "type " } else { "" };
                    if imported == local {
                        named.push(format!("{prefix}{imported}"));
                    } else {
                        named.push(format!("{prefix}{imported} as {local}"));
                    }
                }
            }
        }
        if !named.is_empty() {
            parts.push(format!("{{ {} }}", named.join(", ")));
        }
        self.push(&parts.join(", "));
        self.push(" from ");
        self.literal(&decl.source);
    }

    fn var(&mut self, decl: &VarDecl) {
        if decl.declare {
            self.push("declare ");
        }
        self.push(decl.kind.as_str());
        self.push(" ");
        for (i, declarator) in decl.declarations.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.verbatim(&declarator.name);
            if let Some(ty) = &declarator.type_annotation {
                self.push(": ");
                self.verbatim(ty);
            }
            if let Some(init) = &declarator.init {
                self.push(" = ");
                self.node(init);
            }
        }
    }

    fn function(&mut self, function: &FunctionDecl) {
        if function.is_async {
            self.push("async ");
        }
        self.push("function");
        if function.generator {
            self.push("*");
        }
        if let Some(name) = &function.name {
            self.push(" ");
            self.push(name);
        }
        if let Some(params) = &function.type_params {
            self.verbatim(params);
        }
        self.verbatim(&function.params);
        if let Some(ty) = &function.return_type {
            self.push(": ");
            self.verbatim(ty);
        }
        self.push(" ");
        self.node(&function.body);
    }

    fn block(&mut self, block: &Block) {
        let has_inner = !self.entries(block.meta.id, Placement::Inner).is_empty();
        if block.body.is_empty() && !has_inner {
            self.push("{}");
            return;
        }
        self.push("{");
        self.level += 1;
        self.statements(&block.body, block.meta.id, false);
        self.level -= 1;
        self.line_break(false);
        self.push("}");
    }

    fn ts_member(&mut self, member: &TsMember) {
        match &member.kind {
            TsMemberKind::Property {
                readonly,
                name,
                optional,
                ty,
            } => {
                if *readonly {
                    self.push("readonly ");
                }
                self.push(name);
                if *optional {
                    self.push("?");
                }
                self.push(": ");
                self.verbatim(ty);
            }
            TsMemberKind::Raw(text) => self.verbatim(text),
        }
    }

    // ── Expressions ─────────────────────────────────────────────────────────

    fn literal(&mut self, lit: &Literal) {
        if self.mode != Mode::Canonical
            && let Some(raw) = &lit.raw
        {
            self.push(raw);
            return;
        }
        match &lit.value {
            LitValue::Str(value) => {
                let quoted = quote(value, self.quote.as_char());
                self.push(&quoted);
            }
            LitValue::Num(text) | LitValue::Regex(text) => self.push(text),
            LitValue::Bool(value) => self.push(if *value { "true" } else { "false" }),
            LitValue::Null => self.push("null"),
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(name) => self.push(name),
            ExprKind::Lit(lit) => self.literal(lit),
            ExprKind::Template(text) => self.push(text),
            ExprKind::Array(elements) => {
                let multiline = match &expr.meta.origin {
                    Some(origin) if !was_empty(origin) => origin.is_multiline(),
                    _ => elements.iter().any(spreads_vertically),
                };
                self.list(
                    elements,
                    List {
                        open: "[",
                        close: "]",
                        sep: ",",
                        multiline,
                        pad: false,
                        trailing_sep: self.style.trailing_comma,
                        container: expr.meta.id,
                    },
                );
            }
            ExprKind::Object(props) => {
                let multiline = match &expr.meta.origin {
                    Some(origin) if !was_empty(origin) => origin.is_multiline(),
                    _ => !props.is_empty(),
                };
                self.list(
                    props,
                    List {
                        open: "{",
                        close: "}",
                        sep: ",",
                        multiline,
                        pad: true,
                        trailing_sep: self.style.trailing_comma,
                        container: expr.meta.id,
                    },
                );
            }
            ExprKind::Call {
                callee,
                type_args,
                args,
                optional,
            } => {
                self.node(callee.as_ref());
                if *optional {
                    self.push("?.");
                }
                if let Some(type_args) = type_args {
                    self.verbatim(type_args);
                }
                self.args(expr.meta.id, callee, args);
            }
            ExprKind::New { callee, args } => {
                self.push("new ");
                self.node(callee.as_ref());
                self.args(expr.meta.id, callee, args);
            }
            ExprKind::Member {
                object,
                property,
                optional,
            } => {
                self.node(object.as_ref());
                match property {
                    MemberProp::Name(name) => {
                        self.push(if *optional { "?." } else { "." });
                        self.push(name);
                    }
                    MemberProp::Computed(prop) => {
                        if *optional {
                            self.push("?.");
                        }
                        self.push("[");
                        self.node(prop.as_ref());
                        self.push("]");
                    }
                }
            }
            ExprKind::Arrow {
                is_async,
                params,
                return_type,
                body,
            } => {
                if *is_async {
                    self.push("async ");
                }
                self.verbatim(params);
                if let Some(ty) = return_type {
                    self.push(": ");
                    self.verbatim(ty);
                }
                self.push(" => ");
                match body {
                    ArrowBody::Expr(body) => self.node(body.as_ref()),
                    ArrowBody::Block(block) => self.node(block),
                }
            }
            ExprKind::Function(function) => self.function(function),
            ExprKind::Spread(inner) => {
                self.push("...");
                self.node(inner.as_ref());
            }
            ExprKind::Await(inner) => {
                self.push("await ");
                self.node(inner.as_ref());
            }
            ExprKind::Paren(inner) => {
                self.push("(");
                self.node(inner.as_ref());
                self.push(")");
            }
            ExprKind::TypeCast { expr, op, ty } => {
                self.node(expr.as_ref());
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.verbatim(ty);
            }
            ExprKind::Raw(text) => self.verbatim(text),
        }
    }

    fn args(&mut self, container: NodeId, callee: &Expr, args: &[Expr]) {
        let multiline = match (&callee.meta.origin, args.first().and_then(|a| a.meta.origin.as_ref())) {
            (Some(callee), Some(first)) if callee.same_source(first) => {
                let (end, start) = (callee.span().end, first.span().start);
                end < start && callee.source()[end..start].contains('\n')
            }
            _ => false,
        };
        self.list(
            args,
            List {
                open: "(",
                close: ")",
                sep: ",",
                multiline,
                pad: false,
                trailing_sep: false,
                container,
            },
        );
    }

    fn property(&mut self, prop: &Property) {
        match &prop.kind {
            PropKind::KeyValue { key, value } => {
                match key {
                    PropKey::Ident(name) | PropKey::Num(name) => self.push(name),
                    PropKey::Str(lit) => self.literal(lit),
                    PropKey::Computed(expr) => {
                        self.push("[");
                        self.node(expr.as_ref());
                        self.push("]");
                    }
                }
                self.push(": ");
                self.node(value);
            }
            PropKind::Shorthand(name) => self.push(name),
            PropKind::Spread(expr) => {
                self.push("...");
                self.node(expr);
            }
            PropKind::Method(text) => self.verbatim(text),
        }
    }
}

/// Whether a parsed collection literal had nothing between its delimiters.
/// Such literals are laid out like new ones once they gain items.
fn was_empty(origin: &Origin) -> bool {
    let text = origin.text();
    text.len() >= 2 && text[1..text.len() - 1].trim().is_empty()
}

/// New arrays go vertical when they hold objects or function bodies.
fn spreads_vertically(element: &Expr) -> bool {
    match &element.peel().kind {
        ExprKind::Object(props) => !props.is_empty(),
        ExprKind::Function(_) => true,
        ExprKind::Arrow { body, .. } => matches!(body, ArrowBody::Block(_)),
        _ => false,
    }
}

// ── Fingerprint sealing & detaching ─────────────────────────────────────────

/// Records every parsed node's fingerprint in its origin.
pub(crate) struct Sealer<'a> {
    printer: Printer<'a>,
}

impl<'a> Sealer<'a> {
    pub(crate) fn new(convention: &'a Convention, comments: &'a CommentTable, style: Style) -> Self {
        Self {
            printer: Printer::output(convention, comments, style),
        }
    }

    fn seal<T: Print>(&self, node: &mut T) {
        let fp = self.printer.fingerprint_of(&*node);
        if let Some(origin) = node.meta_mut().origin.as_mut() {
            origin.set_fingerprint(fp);
        }
    }
}

impl VisitMut for Sealer<'_> {
    fn visit_program(&mut self, program: &mut Program) {
        visit::walk_program(self, program);
        self.seal(program);
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        visit::walk_stmt(self, stmt);
        self.seal(stmt);
    }

    fn visit_block(&mut self, block: &mut Block) {
        visit::walk_block(self, block);
        self.seal(block);
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        visit::walk_expr(self, expr);
        self.seal(expr);
    }

    fn visit_property(&mut self, prop: &mut Property) {
        visit::walk_property(self, prop);
        self.seal(prop);
    }

    fn visit_member(&mut self, member: &mut TsMember) {
        self.seal(member);
    }
}

/// Strips origins and raw literal text so a node prints with the target
/// file's conventions.
pub(crate) struct Detacher;

impl VisitMut for Detacher {
    fn visit_program(&mut self, program: &mut Program) {
        program.meta.detach();
        visit::walk_program(self, program);
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        stmt.meta.detach();
        visit::walk_stmt(self, stmt);
    }

    fn visit_block(&mut self, block: &mut Block) {
        block.meta.detach();
        visit::walk_block(self, block);
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        expr.meta.detach();
        visit::walk_expr(self, expr);
    }

    fn visit_property(&mut self, prop: &mut Property) {
        prop.meta.detach();
        visit::walk_property(self, prop);
    }

    fn visit_member(&mut self, member: &mut TsMember) {
        member.meta.detach();
    }

    fn visit_literal(&mut self, lit: &mut Literal) {
        lit.raw = None;
    }
}

/// Gives every node a new identity, keeping origins. Copies made this way
/// no longer share comments with the node they were copied from.
pub(crate) struct Renumber;

impl VisitMut for Renumber {
    fn visit_program(&mut self, program: &mut Program) {
        program.meta.id = NodeId::fresh();
        visit::walk_program(self, program);
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        stmt.meta.id = NodeId::fresh();
        visit::walk_stmt(self, stmt);
    }

    fn visit_block(&mut self, block: &mut Block) {
        block.meta.id = NodeId::fresh();
        visit::walk_block(self, block);
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        expr.meta.id = NodeId::fresh();
        visit::walk_expr(self, expr);
    }

    fn visit_property(&mut self, prop: &mut Property) {
        prop.meta.id = NodeId::fresh();
        visit::walk_property(self, prop);
    }

    fn visit_member(&mut self, member: &mut TsMember) {
        member.meta.id = NodeId::fresh();
    }
}
