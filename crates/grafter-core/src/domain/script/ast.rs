//! Script syntax tree.
//!
//! Only the productions the mutation primitives inspect are modelled.
//! Everything else is kept verbatim in `Raw` variants, which always
//! round-trip and compare by their (whitespace-squashed) text.

use crate::domain::node::Meta;

use super::printer::Renumber;
use super::visit::VisitMut;

// ── Program & statements ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub meta: Meta,
    /// Hashbang line and file-level comments, verbatim. Always printed
    /// first, so insertions at the top of the body land below them.
    pub header: Option<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub meta: Meta,
    pub kind: StmtKind,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Import(ImportDecl),
    ExportDefault(Box<Expr>),
    ExportNamed(ExportNamed),
    Var(VarDecl),
    Function(FunctionDecl),
    Return(Option<Expr>),
    Expr(Expr),
    Interface(InterfaceDecl),
    Module(ModuleDecl),
    Raw(String),
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self {
            meta: Meta::new(),
            kind,
        }
    }

    /// Deep copy with new node ids. `clone()` keeps ids, so a clone would
    /// share the original's comments.
    pub fn fresh_copy(&self) -> Self {
        let mut copy = self.clone();
        Renumber.visit_stmt(&mut copy);
        copy
    }

    pub fn is_import(&self) -> bool {
        matches!(self.kind, StmtKind::Import(_))
    }

    pub fn is_export(&self) -> bool {
        matches!(
            self.kind,
            StmtKind::ExportDefault(_) | StmtKind::ExportNamed(_)
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            StmtKind::Import(_) => "an import declaration",
            StmtKind::ExportDefault(_) => "a default export",
            StmtKind::ExportNamed(_) => "a named export",
            StmtKind::Var(_) => "a variable declaration",
            StmtKind::Function(_) => "a function declaration",
            StmtKind::Return(_) => "a return statement",
            StmtKind::Expr(_) => "an expression statement",
            StmtKind::Interface(_) => "an interface declaration",
            StmtKind::Module(_) => "a module declaration",
            StmtKind::Raw(_) => "an unrecognised statement",
        }
    }

    /// The declaration an `export` wraps, or the statement itself.
    pub fn declaration(&self) -> &Stmt {
        match &self.kind {
            StmtKind::ExportNamed(ExportNamed {
                declaration: Some(decl),
                ..
            }) => decl,
            _ => self,
        }
    }

    pub fn declaration_mut(&mut self) -> &mut Stmt {
        match self.kind {
            StmtKind::ExportNamed(ExportNamed {
                declaration: Some(ref mut decl),
                ..
            }) => decl,
            _ => self,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub type_only: bool,
    pub specifiers: Vec<ImportSpecifier>,
    pub source: Literal,
}

impl ImportDecl {
    pub fn source(&self) -> &str {
        self.source.as_str().unwrap_or_default()
    }

    pub fn has_named(&self) -> bool {
        self.specifiers
            .iter()
            .any(|s| matches!(s, ImportSpecifier::Named { .. }))
    }

    pub fn has_namespace(&self) -> bool {
        self.specifiers
            .iter()
            .any(|s| matches!(s, ImportSpecifier::Namespace(_)))
    }

    /// Local names bound by this declaration.
    pub fn locals(&self) -> impl Iterator<Item = &str> {
        self.specifiers.iter().map(ImportSpecifier::local)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSpecifier {
    Default(String),
    Namespace(String),
    Named {
        imported: String,
        local: String,
        type_only: bool,
    },
}

impl ImportSpecifier {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::Named {
            imported: name.clone(),
            local: name,
            type_only: false,
        }
    }

    pub fn local(&self) -> &str {
        match self {
            Self::Default(local) | Self::Namespace(local) => local,
            Self::Named { local, .. } => local,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExportNamed {
    pub declaration: Option<Box<Stmt>>,
    pub specifiers: Vec<ExportSpecifier>,
    pub source: Option<Literal>,
    pub type_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSpecifier {
    pub local: String,
    pub exported: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Const,
    Let,
    Var,
}

impl VarKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Const => "const",
            Self::Let => "let",
            Self::Var => "var",
        }
    }
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub kind: VarKind,
    pub declare: bool,
    pub declarations: Vec<Declarator>,
}

impl VarDecl {
    pub fn single(kind: VarKind, name: impl Into<String>, init: Option<Expr>) -> Self {
        Self {
            kind,
            declare: false,
            declarations: vec![Declarator {
                name: name.into(),
                type_annotation: None,
                init,
            }],
        }
    }

    pub fn find(&self, name: &str) -> Option<&Declarator> {
        self.declarations.iter().find(|d| d.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Declarator> {
        self.declarations.iter_mut().find(|d| d.name == name)
    }
}

/// One `name: Type = init` binding. Destructuring patterns are kept as their
/// source text in `name`.
#[derive(Debug, Clone)]
pub struct Declarator {
    pub name: String,
    pub type_annotation: Option<String>,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub is_async: bool,
    pub generator: bool,
    pub name: Option<String>,
    pub type_params: Option<String>,
    /// Parameter list including its parentheses.
    pub params: String,
    pub return_type: Option<String>,
    pub body: Block,
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub meta: Meta,
    pub body: Vec<Stmt>,
}

impl Block {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self {
            meta: Meta::new(),
            body,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InterfaceDecl {
    pub declare: bool,
    pub name: String,
    pub type_params: Option<String>,
    pub extends: Option<String>,
    pub members: Vec<TsMember>,
}

#[derive(Debug, Clone)]
pub struct TsMember {
    pub meta: Meta,
    pub kind: TsMemberKind,
}

#[derive(Debug, Clone)]
pub enum TsMemberKind {
    Property {
        readonly: bool,
        name: String,
        optional: bool,
        ty: String,
    },
    Raw(String),
}

impl TsMember {
    pub fn property(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            meta: Meta::new(),
            kind: TsMemberKind::Property {
                readonly: false,
                name: name.into(),
                optional: false,
                ty: ty.into(),
            },
        }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            TsMemberKind::Property { name, .. } => Some(name),
            TsMemberKind::Raw(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModuleDecl {
    pub declare: bool,
    pub kind: ModuleKind,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleKind {
    /// `declare global { ... }`
    Global,
    /// `namespace App { ... }`
    Namespace(String),
    /// `declare module 'name' { ... }`, name kept with its quotes.
    Module(String),
}

// ── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Expr {
    pub meta: Meta,
    pub kind: ExprKind,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Ident(String),
    Lit(Literal),
    /// Template literal, backticks included.
    Template(String),
    Array(Vec<Expr>),
    Object(Vec<Property>),
    Call {
        callee: Box<Expr>,
        type_args: Option<String>,
        args: Vec<Expr>,
        optional: bool,
    },
    New {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: MemberProp,
        optional: bool,
    },
    Arrow {
        is_async: bool,
        /// Parameter list, parentheses included when present.
        params: String,
        return_type: Option<String>,
        body: ArrowBody,
    },
    Function(Box<FunctionDecl>),
    Spread(Box<Expr>),
    Await(Box<Expr>),
    Paren(Box<Expr>),
    TypeCast {
        expr: Box<Expr>,
        op: CastOp,
        ty: String,
    },
    Raw(String),
}

#[derive(Debug, Clone)]
pub enum MemberProp {
    Name(String),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone)]
pub enum ArrowBody {
    Expr(Box<Expr>),
    Block(Block),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOp {
    As,
    Satisfies,
}

impl CastOp {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::As => "as",
            Self::Satisfies => "satisfies",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Literal {
    pub value: LitValue,
    /// Source text as written. Only parsed literals carry one; it keeps the
    /// original quote character.
    pub raw: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LitValue {
    Str(String),
    /// Numeric literal in source form.
    Num(String),
    Bool(bool),
    Null,
    /// Regular expression in source form, slashes and flags included.
    Regex(String),
}

impl Literal {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            value: LitValue::Str(value.into()),
            raw: None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            LitValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self {
            meta: Meta::new(),
            kind,
        }
    }

    /// Deep copy with new node ids. `clone()` keeps ids, so a clone would
    /// share the original's comments.
    pub fn fresh_copy(&self) -> Self {
        let mut copy = self.clone();
        Renumber.visit_expr(&mut copy);
        copy
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Ident(name.into()))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ExprKind::Lit(Literal::string(value)))
    }

    pub fn number(value: impl ToString) -> Self {
        Self::new(ExprKind::Lit(Literal {
            value: LitValue::Num(value.to_string()),
            raw: None,
        }))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ExprKind::Lit(Literal {
            value: LitValue::Bool(value),
            raw: None,
        }))
    }

    pub fn null() -> Self {
        Self::new(ExprKind::Lit(Literal {
            value: LitValue::Null,
            raw: None,
        }))
    }

    pub fn object(props: Vec<Property>) -> Self {
        Self::new(ExprKind::Object(props))
    }

    pub fn array(elements: Vec<Expr>) -> Self {
        Self::new(ExprKind::Array(elements))
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Call {
            callee: Box::new(callee),
            type_args: None,
            args,
            optional: false,
        })
    }

    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// Value of a string literal.
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Lit(lit) => lit.as_str(),
            _ => None,
        }
    }

    /// Name of the called function when this is a call to a plain identifier.
    pub fn callee_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Call { callee, .. } => callee.as_ident(),
            _ => None,
        }
    }

    /// See through parentheses and `as`/`satisfies` casts.
    pub fn peel(&self) -> &Expr {
        match &self.kind {
            ExprKind::Paren(inner) | ExprKind::TypeCast { expr: inner, .. } => inner.peel(),
            _ => self,
        }
    }

    pub fn peel_mut(&mut self) -> &mut Expr {
        match self.kind {
            ExprKind::Paren(ref mut inner) | ExprKind::TypeCast { expr: ref mut inner, .. } => {
                inner.peel_mut()
            }
            _ => self,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ExprKind::Ident(_) => "an identifier",
            ExprKind::Lit(_) => "a literal",
            ExprKind::Template(_) => "a template literal",
            ExprKind::Array(_) => "an array literal",
            ExprKind::Object(_) => "an object literal",
            ExprKind::Call { .. } => "a function call",
            ExprKind::New { .. } => "a constructor call",
            ExprKind::Member { .. } => "a member access",
            ExprKind::Arrow { .. } => "an arrow function",
            ExprKind::Function(_) => "a function expression",
            ExprKind::Spread(_) => "a spread element",
            ExprKind::Await(_) => "an await expression",
            ExprKind::Paren(_) => "a parenthesized expression",
            ExprKind::TypeCast { .. } => "a type assertion",
            ExprKind::Raw(_) => "an unrecognised expression",
        }
    }
}

// ── Object properties ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Property {
    pub meta: Meta,
    pub kind: PropKind,
}

#[derive(Debug, Clone)]
pub enum PropKind {
    KeyValue { key: PropKey, value: Expr },
    Shorthand(String),
    Spread(Expr),
    /// Methods and accessors, verbatim.
    Method(String),
}

#[derive(Debug, Clone)]
pub enum PropKey {
    Ident(String),
    Str(Literal),
    Num(String),
    Computed(Box<Expr>),
}

impl PropKey {
    /// Static key name, if the key is not computed.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Ident(name) | Self::Num(name) => Some(name),
            Self::Str(lit) => lit.as_str(),
            Self::Computed(_) => None,
        }
    }

    /// A bare identifier when `name` is a valid one, a quoted key otherwise.
    pub fn for_name(name: &str) -> Self {
        if is_identifier(name) {
            Self::Ident(name.to_string())
        } else {
            Self::Str(Literal::string(name))
        }
    }
}

impl Property {
    pub fn key_value(name: &str, value: Expr) -> Self {
        Self {
            meta: Meta::new(),
            kind: PropKind::KeyValue {
                key: PropKey::for_name(name),
                value,
            },
        }
    }

    /// Static name of the property. Shorthand properties are named after
    /// their identifier.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            PropKind::KeyValue { key, .. } => key.name(),
            PropKind::Shorthand(name) => Some(name),
            PropKind::Spread(_) | PropKind::Method(_) => None,
        }
    }

    pub fn value(&self) -> Option<&Expr> {
        match &self.kind {
            PropKind::KeyValue { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn value_mut(&mut self) -> Option<&mut Expr> {
        match self.kind {
            PropKind::KeyValue { ref mut value, .. } => Some(value),
            _ => None,
        }
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peel_sees_through_casts() {
        let inner = Expr::object(vec![]);
        let cast = Expr::new(ExprKind::TypeCast {
            expr: Box::new(Expr::new(ExprKind::Paren(Box::new(inner)))),
            op: CastOp::Satisfies,
            ty: "Config".into(),
        });
        assert!(matches!(cast.peel().kind, ExprKind::Object(_)));
    }

    #[test]
    fn prop_keys_quote_when_needed() {
        assert!(matches!(PropKey::for_name("plugins"), PropKey::Ident(_)));
        assert!(matches!(PropKey::for_name("$lib"), PropKey::Ident(_)));
        assert!(matches!(PropKey::for_name("my-key"), PropKey::Str(_)));
        assert_eq!(PropKey::for_name("my-key").name(), Some("my-key"));
    }

    #[test]
    fn shorthand_properties_have_names() {
        let prop = Property {
            meta: Meta::new(),
            kind: PropKind::Shorthand("adapter".into()),
        };
        assert_eq!(prop.name(), Some("adapter"));
        assert!(prop.value().is_none());
    }
}
