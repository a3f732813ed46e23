//! Composable handler-chain splice.
//!
//! A hooks file exports one handler. Adding a second one means composing
//! both through a sequence helper:
//!
//! ```text
//! export const handle = handleA;                     // before
//! export const handle = sequence(handleA, handleB);  // after
//! ```
//!
//! A handler written inline is first moved to `originalHandle` so the export
//! can become the composition.

use tracing::debug;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::script::ast::*;
use crate::domain::script::ops::exports::export_declaration;
use crate::domain::script::ops::imports::add_named;
use crate::domain::script::ops::{create_call, find_declaration, insert_before_exports};

/// A type imported by name, e.g. `Handle` from `@sveltejs/kit`.
#[derive(Debug, Clone)]
pub struct TypeRef {
    pub name: String,
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct HandlerChain {
    /// Name of the exported handler.
    pub export_name: String,
    /// Variable the new handler is declared as.
    pub handler_name: String,
    pub handler: Expr,
    /// Type annotation for both declarations, imported as a type.
    pub handler_type: Option<TypeRef>,
    pub sequence_fn: String,
    pub sequence_source: String,
    /// Name an inline handler is moved to before composing.
    pub original_name: String,
}

impl HandlerChain {
    pub fn new(handler_name: impl Into<String>, handler: Expr) -> Self {
        Self {
            export_name: "handle".into(),
            handler_name: handler_name.into(),
            handler,
            handler_type: None,
            sequence_fn: "sequence".into(),
            sequence_source: "@sveltejs/kit/hooks".into(),
            original_name: "originalHandle".into(),
        }
    }

    pub fn typed(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.handler_type = Some(TypeRef {
            name: name.into(),
            source: source.into(),
        });
        self
    }

    fn type_name(&self) -> Option<String> {
        self.handler_type.as_ref().map(|t| t.name.clone())
    }

    fn sequence(&self, first: &str) -> Expr {
        create_call(
            &self.sequence_fn,
            vec![Expr::ident(first), Expr::ident(&self.handler_name)],
        )
    }
}

fn typed_const(name: &str, ty: Option<String>, init: Expr) -> Stmt {
    let mut decl = VarDecl::single(VarKind::Const, name, Some(init));
    decl.declarations[0].type_annotation = ty;
    Stmt::new(StmtKind::Var(decl))
}

/// Declare the chain's handler and splice it into the exported handler.
pub fn splice_handler(program: &mut Program, chain: &HandlerChain) -> DomainResult<bool> {
    let mut changed = false;
    if let Some(ty) = &chain.handler_type {
        changed |= add_named(program, &ty.source, [ty.name.as_str()], true);
    }
    if find_declaration(&program.body, &chain.handler_name).is_none() {
        let decl = typed_const(&chain.handler_name, chain.type_name(), chain.handler.fresh_copy());
        insert_before_exports(program, decl);
        changed = true;
    }

    let export_name = chain.export_name.as_str();
    let Some(index) = program.body.iter().position(|stmt| {
        matches!(&stmt.declaration().kind, StmtKind::Var(decl) if decl.find(export_name).is_some())
    }) else {
        let decl = typed_const(export_name, chain.type_name(), Expr::ident(&chain.handler_name));
        program.body.push(export_declaration(decl));
        debug!(export = export_name, "created handler export");
        return Ok(true);
    };

    let stmt = &mut program.body[index];
    let exported = stmt.is_export();
    let StmtKind::Var(decl) = &mut stmt.declaration_mut().kind else {
        return Err(DomainError::shape(
            format!("a variable declaration of `{export_name}`"),
            "something else",
        ));
    };
    let single = decl.declarations.len() == 1;
    let Some(declarator) = decl.find_mut(export_name) else {
        return Err(DomainError::shape(
            format!("a declaration of `{export_name}`"),
            "none",
        ));
    };
    let type_annotation = declarator.type_annotation.clone();
    let Some(current) = declarator.init.as_mut().map(Expr::peel_mut) else {
        return Err(DomainError::shape(
            format!("an initializer for `{export_name}`"),
            "a bare declaration",
        ));
    };

    if current.callee_name() == Some(chain.sequence_fn.as_str()) {
        if let ExprKind::Call { args, .. } = &mut current.kind
            && !args.iter().any(|a| a.as_ident() == Some(chain.handler_name.as_str()))
        {
            args.push(Expr::ident(&chain.handler_name));
            return Ok(true);
        }
        return Ok(changed);
    }

    match current.as_ident().map(str::to_string) {
        Some(name) if name == chain.handler_name => return Ok(changed),
        Some(name) => {
            *current = chain.sequence(&name);
            add_named(program, &chain.sequence_source, [chain.sequence_fn.as_str()], false);
            debug!(export = export_name, "composed aliased handler");
            return Ok(true);
        }
        None => {}
    }

    if !single {
        return Err(DomainError::shape(
            format!("`{export_name}` declared on its own"),
            "several bindings in one declaration",
        ));
    }
    declarator.name = chain.original_name.clone();

    if exported {
        let stmt = program.body.remove(index);
        let inner = match stmt.kind {
            StmtKind::ExportNamed(ExportNamed {
                declaration: Some(declaration),
                ..
            }) => *declaration,
            kind => Stmt {
                meta: stmt.meta,
                kind,
            },
        };
        program.body.insert(index, inner);
    }

    let composed = typed_const(export_name, type_annotation, chain.sequence(&chain.original_name));
    let composed = if exported {
        export_declaration(composed)
    } else {
        composed
    };
    program.body.insert(index + 1, composed);
    add_named(program, &chain.sequence_source, [chain.sequence_fn.as_str()], false);
    debug!(
        export = export_name,
        original = %chain.original_name,
        "moved inline handler and composed"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::script::{ScriptTree, parse_expression};

    fn splice(src: &str, name: &str, handler: &str) -> String {
        let mut t = ScriptTree::parse(src).unwrap();
        let chain = HandlerChain::new(name, parse_expression(handler).unwrap());
        splice_handler(&mut t.program, &chain).unwrap();
        t.generate_code()
    }

    #[test]
    fn empty_file_gets_aliasing_export() {
        let out = splice("", "newHandler", "async ({ event, resolve }) => resolve(event)");
        assert_eq!(
            out,
            "const newHandler = async ({ event, resolve }) => resolve(event);\nexport const handle = newHandler;\n"
        );
        assert_eq!(splice(&out, "newHandler", "async ({ event, resolve }) => resolve(event)"), out);
    }

    #[test]
    fn inline_handler_is_renamed_once() {
        let src = "export const handle = async ({ event, resolve }) => {\n\treturn resolve(event);\n};\n";
        let once = splice(src, "newHandler", "(input) => input.resolve(input.event)");
        assert_eq!(
            once,
            "import { sequence } from '@sveltejs/kit/hooks';\n\n\
             const newHandler = (input) => input.resolve(input.event);\n\
             const originalHandle = async ({ event, resolve }) => {\n\treturn resolve(event);\n};\n\
             export const handle = sequence(originalHandle, newHandler);\n"
        );

        let twice = splice(&once, "secondHandler", "(input) => input.resolve(input.event)");
        assert!(twice.contains("export const handle = sequence(originalHandle, newHandler, secondHandler);"));
        assert_eq!(twice.matches("originalHandle =").count(), 1);
        assert_eq!(splice(&twice, "secondHandler", "(input) => input.resolve(input.event)"), twice);
    }

    #[test]
    fn aliased_handler_is_composed_without_renaming() {
        let src = "const first = (i) => i;\nexport const handle = first;\n";
        let out = splice(src, "second", "(i) => i");
        assert!(out.contains("export const handle = sequence(first, second);"));
        assert!(!out.contains("originalHandle"));
        assert!(out.starts_with("import { sequence } from '@sveltejs/kit/hooks';"));
    }

    #[test]
    fn typed_handlers_import_the_type() {
        let mut t = ScriptTree::parse("").unwrap();
        let chain = HandlerChain::new("handleAuth", parse_expression("auth.handler").unwrap())
            .typed("Handle", "@sveltejs/kit");
        splice_handler(&mut t.program, &chain).unwrap();
        assert_eq!(
            t.generate_code(),
            "import type { Handle } from '@sveltejs/kit';\n\n\
             const handleAuth: Handle = auth.handler;\n\
             export const handle: Handle = handleAuth;\n"
        );
    }

    #[test]
    fn spliced_handler_is_a_distinct_node() {
        use crate::domain::comments::{Comment, Placement};

        let chain = HandlerChain::new("newHandler", parse_expression("(i) => i").unwrap());
        let mut t = ScriptTree::parse("").unwrap();
        splice_handler(&mut t.program, &chain).unwrap();
        let StmtKind::Var(decl) = &t.program.body[0].kind else {
            panic!("expected the handler declaration");
        };
        let spliced = decl.declarations[0].init.as_ref().unwrap();
        assert_ne!(spliced.meta.id, chain.handler.meta.id);

        t.comments
            .add(spliced.meta.id, Comment::line(" added"), Placement::Leading);
        assert!(!t.comments.has_any(chain.handler.meta.id));
    }
}
