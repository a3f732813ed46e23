//! Variable declaration lookup and construction.

use crate::domain::script::ast::*;

/// Result of [`declaration`]: the declaration already in the statement list,
/// or a new one the caller still has to insert.
#[derive(Debug)]
pub enum Declaration<'a> {
    Existing(&'a mut VarDecl),
    New(VarDecl),
}

impl Declaration<'_> {
    pub fn is_new(&self) -> bool {
        matches!(self, Self::New(_))
    }
}

/// The declaration binding `name` among `body`, seeing through `export`.
/// `body` is a program's or a block's statement list.
pub fn find_declaration<'a>(body: &'a [Stmt], name: &str) -> Option<&'a VarDecl> {
    body.iter().find_map(|stmt| match &stmt.declaration().kind {
        StmtKind::Var(decl) if decl.find(name).is_some() => Some(decl),
        _ => None,
    })
}

fn find_declaration_mut<'a>(body: &'a mut [Stmt], name: &str) -> Option<&'a mut VarDecl> {
    body.iter_mut().find_map(|stmt| match stmt.declaration_mut().kind {
        StmtKind::Var(ref mut decl) if decl.find(name).is_some() => Some(decl),
        _ => None,
    })
}

/// Find the declaration of `name`, or build `kind name = init` without
/// inserting it.
pub fn declaration<'a>(
    body: &'a mut [Stmt],
    kind: VarKind,
    name: &str,
    init: Option<Expr>,
) -> Declaration<'a> {
    match find_declaration_mut(body, name) {
        Some(decl) => Declaration::Existing(decl),
        None => Declaration::New(VarDecl::single(kind, name, init)),
    }
}

/// Insert `stmt` before the first export, or at the end.
pub fn insert_before_exports(program: &mut Program, stmt: Stmt) -> usize {
    let index = program
        .body
        .iter()
        .position(Stmt::is_export)
        .unwrap_or(program.body.len());
    program.body.insert(index, stmt);
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::script::ScriptTree;

    #[test]
    fn existing_declaration_is_returned() {
        let mut t = ScriptTree::parse("export const a = 1, b = 2;\n").unwrap();
        match declaration(&mut t.program.body, VarKind::Let, "b", None) {
            Declaration::Existing(decl) => assert_eq!(decl.kind, VarKind::Const),
            Declaration::New(_) => panic!("expected the existing declaration"),
        }
        assert!(find_declaration(&t.program.body, "c").is_none());
    }

    #[test]
    fn new_declaration_is_not_inserted() {
        let mut t = ScriptTree::parse("import x from 'x';\nexport default x;\n").unwrap();
        let Declaration::New(decl) =
            declaration(&mut t.program.body, VarKind::Const, "y", Some(Expr::number(1)))
        else {
            panic!("expected a new declaration");
        };
        assert_eq!(t.program.body.len(), 2);
        insert_before_exports(&mut t.program, Stmt::new(StmtKind::Var(decl)));
        assert_eq!(
            t.generate_code(),
            "import x from 'x';\n\nconst y = 1;\nexport default x;\n"
        );
    }
}
