//! Import upserts.
//!
//! New import statements go to the top of the program, below any directive
//! prologue (`'use strict'`) and the file header. Named bindings merge into
//! an existing import from the same source when its form allows it.

use tracing::debug;

use crate::domain::equality::equal;
use crate::domain::script::ast::*;

/// One `imported as local` binding of a named import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedImport {
    pub imported: String,
    pub local: String,
}

impl NamedImport {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            imported: name.clone(),
            local: name,
        }
    }

    pub fn aliased(imported: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            imported: imported.into(),
            local: local.into(),
        }
    }
}

impl From<&str> for NamedImport {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<(&str, &str)> for NamedImport {
    fn from((imported, local): (&str, &str)) -> Self {
        Self::aliased(imported, local)
    }
}

fn import_stmt(from: &str, specifiers: Vec<ImportSpecifier>, type_only: bool) -> Stmt {
    Stmt::new(StmtKind::Import(ImportDecl {
        type_only,
        specifiers,
        source: Literal::string(from),
    }))
}

/// Index of the first statement after the directive prologue.
fn top_index(program: &Program) -> usize {
    program
        .body
        .iter()
        .take_while(|stmt| matches!(&stmt.kind, StmtKind::Expr(expr) if expr.as_str().is_some()))
        .count()
}

/// Insert `stmt` at the top unless an equal statement exists.
fn insert_unique(program: &mut Program, stmt: Stmt) -> bool {
    if program.body.iter().any(|existing| equal(existing, &stmt)) {
        return false;
    }
    program.body.insert(top_index(program), stmt);
    true
}

/// Import declarations from `from`.
pub fn find_by_source<'a>(program: &'a Program, from: &'a str) -> impl Iterator<Item = &'a ImportDecl> {
    program.body.iter().filter_map(move |stmt| match &stmt.kind {
        StmtKind::Import(decl) if decl.source() == from => Some(decl),
        _ => None,
    })
}

/// `import local from 'from'`
pub fn add_default(program: &mut Program, from: &str, local: &str) -> bool {
    insert_unique(
        program,
        import_stmt(from, vec![ImportSpecifier::Default(local.to_string())], false),
    )
}

/// `import * as local from 'from'`
pub fn add_namespace(program: &mut Program, from: &str, local: &str) -> bool {
    insert_unique(
        program,
        import_stmt(from, vec![ImportSpecifier::Namespace(local.to_string())], false),
    )
}

/// `import 'from'`, skipped when anything is already imported from there.
pub fn add_empty(program: &mut Program, from: &str) -> bool {
    if find_by_source(program, from).next().is_some() {
        return false;
    }
    program.body.insert(top_index(program), import_stmt(from, Vec::new(), false));
    true
}

/// `import { a, b as c } from 'from'`
///
/// Merges into an existing non-namespace import from the same source with
/// the same `type` modifier. A binding is skipped when its imported name or
/// its local alias is already bound by that import.
pub fn add_named<I, N>(program: &mut Program, from: &str, names: I, type_only: bool) -> bool
where
    I: IntoIterator<Item = N>,
    N: Into<NamedImport>,
{
    let names: Vec<NamedImport> = names.into_iter().map(Into::into).collect();
    if names.is_empty() {
        return false;
    }

    let existing = program.body.iter_mut().find_map(|stmt| match &mut stmt.kind {
        StmtKind::Import(decl)
            if decl.source() == from && decl.type_only == type_only && !decl.has_namespace() =>
        {
            Some(decl)
        }
        _ => None,
    });

    let Some(decl) = existing else {
        let specifiers = dedup(&names)
            .map(|n| ImportSpecifier::Named {
                imported: n.imported.clone(),
                local: n.local.clone(),
                type_only: false,
            })
            .collect();
        let at = top_index(program);
        program.body.insert(at, import_stmt(from, specifiers, type_only));
        debug!(from, "inserted named import");
        return true;
    };

    let mut changed = false;
    for name in dedup(&names) {
        let taken = decl.specifiers.iter().any(|s| match s {
            ImportSpecifier::Named { imported, local, .. } => {
                *imported == name.imported || *local == name.local
            }
            other => other.local() == name.local,
        });
        if taken {
            continue;
        }
        decl.specifiers.push(ImportSpecifier::Named {
            imported: name.imported.clone(),
            local: name.local.clone(),
            type_only: false,
        });
        changed = true;
    }
    changed
}

fn dedup(names: &[NamedImport]) -> impl Iterator<Item = &NamedImport> {
    names
        .iter()
        .enumerate()
        .filter(|(i, name)| !names[..*i].iter().any(|prev| prev.local == name.local))
        .map(|(_, name)| name)
}
