//! Default and named export upserts.

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::script::ast::*;

fn default_value_mut(stmt: &mut Stmt) -> Option<&mut Expr> {
    match stmt.kind {
        StmtKind::ExportDefault(ref mut expr) => Some(expr),
        _ => None,
    }
}

/// Initializer of the top-level variable `name`, exported or not.
fn initializer_mut<'a>(program: &'a mut Program, name: &str) -> Option<&'a mut Expr> {
    for stmt in &mut program.body {
        if let StmtKind::Var(decl) = &mut stmt.declaration_mut().kind
            && let Some(init) = decl.find_mut(name).and_then(|d| d.init.as_mut())
        {
            return Some(init);
        }
    }
    None
}

/// The value currently exported as default.
///
/// - No default export: `export default <fallback>` is appended.
/// - `export default name`: the initializer of `name`'s declaration.
/// - Anything else: the exported expression itself.
///
/// Parentheses and `as`/`satisfies` casts are seen through in every case.
pub fn default_export(program: &mut Program, fallback: Expr) -> DomainResult<&mut Expr> {
    let index = program
        .body
        .iter()
        .position(|stmt| matches!(stmt.kind, StmtKind::ExportDefault(_)));

    let Some(index) = index else {
        program
            .body
            .push(Stmt::new(StmtKind::ExportDefault(Box::new(fallback))));
        return program
            .body
            .last_mut()
            .and_then(default_value_mut)
            .map(Expr::peel_mut)
            .ok_or_else(|| DomainError::shape("a default export", "nothing"));
    };

    let alias = match &program.body[index].kind {
        StmtKind::ExportDefault(expr) => expr.peel().as_ident().map(str::to_string),
        _ => None,
    };
    if let Some(name) = alias {
        return initializer_mut(program, &name)
            .map(Expr::peel_mut)
            .ok_or_else(|| {
                DomainError::shape(
                    format!("a declaration of `{name}` with an initializer"),
                    format!("`export default {name}` with no such declaration"),
                )
            });
    }

    default_value_mut(&mut program.body[index])
        .map(Expr::peel_mut)
        .ok_or_else(|| DomainError::shape("a default export", "nothing"))
}

/// The exported variable declaration that binds `name`, installing
/// `export <fallback>` at the end of the program when there is none.
pub fn named_export<'a>(
    program: &'a mut Program,
    name: &str,
    fallback: VarDecl,
) -> DomainResult<&'a mut VarDecl> {
    let existing = program.body.iter().position(|stmt| {
        stmt.is_export() && matches!(&stmt.declaration().kind, StmtKind::Var(decl) if decl.find(name).is_some())
    });

    let index = existing.unwrap_or_else(|| {
        program.body.push(export_declaration(Stmt::new(StmtKind::Var(fallback))));
        program.body.len() - 1
    });

    let stmt = &mut program.body[index];
    let found = stmt.kind_name();
    match &mut stmt.declaration_mut().kind {
        StmtKind::Var(decl) => Ok(decl),
        _ => Err(DomainError::shape(
            format!("an exported variable `{name}`"),
            found,
        )),
    }
}

/// `export <declaration>`
pub fn export_declaration(declaration: Stmt) -> Stmt {
    Stmt::new(StmtKind::ExportNamed(ExportNamed {
        declaration: Some(Box::new(declaration)),
        ..ExportNamed::default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::script::{ScriptTree, parse_expression};

    fn tree(text: &str) -> ScriptTree {
        ScriptTree::parse(text).unwrap()
    }

    #[test]
    fn missing_default_export_is_created() {
        let mut t = tree("import a from 'a';\n");
        let value = default_export(&mut t.program, Expr::object(Vec::new())).unwrap();
        assert!(matches!(value.kind, ExprKind::Object(_)));
        assert_eq!(
            t.generate_code(),
            "import a from 'a';\n\nexport default {};\n"
        );
    }

    #[test]
    fn default_export_resolves_identifier_to_initializer() {
        let mut t = tree("const config = { kit: {} } satisfies Config;\n\nexport default config;\n");
        let value = default_export(&mut t.program, Expr::object(Vec::new())).unwrap();
        let ExprKind::Object(props) = &value.kind else {
            panic!("expected the object behind the cast");
        };
        assert_eq!(props[0].name(), Some("kit"));
    }

    #[test]
    fn default_export_returns_inline_value() {
        let mut t = tree("export default defineConfig({});\n");
        let value = default_export(&mut t.program, Expr::object(Vec::new())).unwrap();
        assert_eq!(value.callee_name(), Some("defineConfig"));
    }

    #[test]
    fn unresolvable_alias_is_a_shape_error() {
        let mut t = tree("import App from './App';\nexport default App;\n");
        let err = default_export(&mut t.program, Expr::object(Vec::new())).unwrap_err();
        assert!(matches!(err, DomainError::UnexpectedShape { .. }));
    }

    #[test]
    fn named_export_is_found_or_installed() {
        let mut t = tree("export const handle = first;\n");
        let decl = named_export(
            &mut t.program,
            "handle",
            VarDecl::single(VarKind::Const, "handle", None),
        )
        .unwrap();
        assert_eq!(
            decl.find("handle").and_then(|d| d.init.as_ref()).and_then(Expr::as_ident),
            Some("first")
        );

        let fallback = VarDecl::single(
            VarKind::Const,
            "load",
            Some(parse_expression("() => ({})").unwrap()),
        );
        named_export(&mut t.program, "load", fallback).unwrap();
        assert_eq!(
            t.generate_code(),
            "export const handle = first;\nexport const load = () => ({});\n"
        );
    }
}
