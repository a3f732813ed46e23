//! Mutable tree walk over script nodes.

use super::ast::*;

pub(crate) trait VisitMut {
    fn visit_program(&mut self, program: &mut Program) {
        walk_program(self, program);
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_block(&mut self, block: &mut Block) {
        walk_block(self, block);
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        walk_expr(self, expr);
    }

    fn visit_property(&mut self, prop: &mut Property) {
        walk_property(self, prop);
    }

    fn visit_member(&mut self, _member: &mut TsMember) {}

    fn visit_literal(&mut self, _lit: &mut Literal) {}
}

pub(crate) fn walk_program<V: VisitMut + ?Sized>(v: &mut V, program: &mut Program) {
    for stmt in &mut program.body {
        v.visit_stmt(stmt);
    }
}

pub(crate) fn walk_block<V: VisitMut + ?Sized>(v: &mut V, block: &mut Block) {
    for stmt in &mut block.body {
        v.visit_stmt(stmt);
    }
}

pub(crate) fn walk_stmt<V: VisitMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::Import(decl) => v.visit_literal(&mut decl.source),
        StmtKind::ExportDefault(expr) => v.visit_expr(expr),
        StmtKind::ExportNamed(named) => {
            if let Some(decl) = named.declaration.as_deref_mut() {
                v.visit_stmt(decl);
            }
            if let Some(source) = named.source.as_mut() {
                v.visit_literal(source);
            }
        }
        StmtKind::Var(decl) => {
            for declarator in &mut decl.declarations {
                if let Some(init) = declarator.init.as_mut() {
                    v.visit_expr(init);
                }
            }
        }
        StmtKind::Function(function) => v.visit_block(&mut function.body),
        StmtKind::Return(arg) => {
            if let Some(arg) = arg.as_mut() {
                v.visit_expr(arg);
            }
        }
        StmtKind::Expr(expr) => v.visit_expr(expr),
        StmtKind::Interface(decl) => {
            for member in &mut decl.members {
                v.visit_member(member);
            }
        }
        StmtKind::Module(decl) => v.visit_block(&mut decl.body),
        StmtKind::Raw(_) => {}
    }
}

pub(crate) fn walk_expr<V: VisitMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match &mut expr.kind {
        ExprKind::Lit(lit) => v.visit_literal(lit),
        ExprKind::Array(elements) => {
            for element in elements {
                v.visit_expr(element);
            }
        }
        ExprKind::Object(props) => {
            for prop in props {
                v.visit_property(prop);
            }
        }
        ExprKind::Call { callee, args, .. } | ExprKind::New { callee, args } => {
            v.visit_expr(callee);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        ExprKind::Member {
            object, property, ..
        } => {
            v.visit_expr(object);
            if let MemberProp::Computed(prop) = property {
                v.visit_expr(prop);
            }
        }
        ExprKind::Arrow { body, .. } => match body {
            ArrowBody::Expr(body) => v.visit_expr(body),
            ArrowBody::Block(block) => v.visit_block(block),
        },
        ExprKind::Function(function) => v.visit_block(&mut function.body),
        ExprKind::Spread(inner)
        | ExprKind::Await(inner)
        | ExprKind::Paren(inner)
        | ExprKind::TypeCast { expr: inner, .. } => v.visit_expr(inner),
        ExprKind::Ident(_) | ExprKind::Template(_) | ExprKind::Raw(_) => {}
    }
}

pub(crate) fn walk_property<V: VisitMut + ?Sized>(v: &mut V, prop: &mut Property) {
    match &mut prop.kind {
        PropKind::KeyValue { key, value } => {
            match key {
                PropKey::Str(lit) => v.visit_literal(lit),
                PropKey::Computed(expr) => v.visit_expr(expr),
                PropKey::Ident(_) | PropKey::Num(_) => {}
            }
            v.visit_expr(value);
        }
        PropKind::Spread(expr) => v.visit_expr(expr),
        PropKind::Shorthand(_) | PropKind::Method(_) => {}
    }
}
