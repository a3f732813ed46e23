//! Named-interface member upsert inside `declare global`.
//!
//! ```text
//! declare global {
//!     namespace App {
//!         interface Locals {
//!             user: User;
//!         }
//!     }
//! }
//!
//! export {};
//! ```

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::script::ast::*;

#[derive(Debug, Clone)]
pub struct GlobalMember {
    pub namespace: String,
    pub interface: String,
    pub member: String,
    pub ty: String,
}

impl GlobalMember {
    pub fn new(
        interface: impl Into<String>,
        member: impl Into<String>,
        ty: impl Into<String>,
    ) -> Self {
        Self {
            namespace: "App".into(),
            interface: interface.into(),
            member: member.into(),
            ty: ty.into(),
        }
    }
}

fn module_body<'a>(
    body: &'a mut Vec<Stmt>,
    kind: &ModuleKind,
    declare: bool,
) -> DomainResult<&'a mut Vec<Stmt>> {
    let exists = body
        .iter()
        .any(|stmt| matches!(&stmt.kind, StmtKind::Module(m) if m.kind == *kind));
    if !exists {
        body.push(Stmt::new(StmtKind::Module(ModuleDecl {
            declare,
            kind: kind.clone(),
            body: Block::default(),
        })));
    }
    body.iter_mut()
        .find_map(|stmt| match &mut stmt.kind {
            StmtKind::Module(module) if module.kind == *kind => Some(&mut module.body.body),
            _ => None,
        })
        .ok_or_else(|| DomainError::shape("a module block", "none"))
}

fn interface<'a>(body: &'a mut Vec<Stmt>, name: &str) -> DomainResult<&'a mut Vec<TsMember>> {
    let exists = body
        .iter()
        .any(|stmt| matches!(&stmt.kind, StmtKind::Interface(i) if i.name == name));
    if !exists {
        body.push(Stmt::new(StmtKind::Interface(InterfaceDecl {
            declare: false,
            name: name.to_string(),
            type_params: None,
            extends: None,
            members: Vec::new(),
        })));
    }
    body.iter_mut()
        .find_map(|stmt| match &mut stmt.kind {
            StmtKind::Interface(decl) if decl.name == name => Some(&mut decl.members),
            _ => None,
        })
        .ok_or_else(|| DomainError::shape(format!("interface `{name}`"), "none"))
}

/// Find or create `declare global { namespace N { interface I { member: ty } } }`.
/// Returns whether the member was added.
pub fn ensure_global_member(program: &mut Program, target: &GlobalMember) -> DomainResult<bool> {
    let is_module = program.body.iter().any(|s| s.is_import() || s.is_export());
    let before = program.body.len();

    let global = module_body(&mut program.body, &ModuleKind::Global, true)?;
    let namespace = module_body(global, &ModuleKind::Namespace(target.namespace.clone()), false)?;
    let members = interface(namespace, &target.interface)?;

    let mut changed = false;
    if !members.iter().any(|m| m.name() == Some(target.member.as_str())) {
        members.push(TsMember::property(&target.member, &target.ty));
        changed = true;
    }

    if program.body.len() != before && !is_module {
        // `declare global` is only allowed in modules.
        program.body.push(Stmt::new(StmtKind::ExportNamed(ExportNamed::default())));
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::script::ScriptTree;

    #[test]
    fn missing_blocks_are_created_with_module_marker() {
        let mut t = ScriptTree::parse("").unwrap();
        assert!(
            ensure_global_member(&mut t.program, &GlobalMember::new("Locals", "user", "User | null"))
                .unwrap()
        );
        assert_eq!(
            t.generate_code(),
            "declare global {\n\tnamespace App {\n\t\tinterface Locals {\n\t\t\tuser: User | null;\n\t\t}\n\t}\n}\nexport {};\n"
        );
    }

    #[test]
    fn existing_interface_gains_member_once() {
        let src = "// See https://svelte.dev/docs/kit/types#app.d.ts\ndeclare global {\n  namespace App {\n    // interface Error {}\n    interface Locals {\n      session: string;\n    }\n  }\n}\n\nexport {};\n";
        let mut t = ScriptTree::parse(src).unwrap();
        let member = GlobalMember::new("Locals", "user", "User");
        assert!(ensure_global_member(&mut t.program, &member).unwrap());
        let out = t.generate_code();
        assert_eq!(
            out,
            "// See https://svelte.dev/docs/kit/types#app.d.ts\ndeclare global {\n  namespace App {\n    // interface Error {}\n    interface Locals {\n      session: string;\n      user: User;\n    }\n  }\n}\n\nexport {};\n"
        );

        let mut again = ScriptTree::parse(&out).unwrap();
        assert!(!ensure_global_member(&mut again.program, &member).unwrap());
        assert_eq!(again.generate_code(), out);
    }

    #[test]
    fn commented_out_namespace_gets_interface() {
        let src = "declare global {\n\tnamespace App {\n\t\t// interface Error {}\n\t}\n}\n\nexport {};\n";
        let mut t = ScriptTree::parse(src).unwrap();
        ensure_global_member(&mut t.program, &GlobalMember::new("PageData", "title", "string")).unwrap();
        assert_eq!(
            t.generate_code(),
            "declare global {\n\tnamespace App {\n\t\t// interface Error {}\n\t\tinterface PageData {\n\t\t\ttitle: string;\n\t\t}\n\t}\n}\n\nexport {};\n"
        );
    }
}
