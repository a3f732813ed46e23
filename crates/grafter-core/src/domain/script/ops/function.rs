//! Call and function accessors.

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::script::ast::*;

/// `name(args...)`
pub fn create_call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::call(Expr::ident(name), args)
}

/// The argument at `index`, pushing `fallback` when the call has fewer
/// arguments.
pub fn get_argument(call: &mut Expr, index: usize, fallback: Expr) -> DomainResult<&mut Expr> {
    let call = call.peel_mut();
    let found = call.kind_name();
    let args = match call.kind {
        ExprKind::Call { ref mut args, .. } | ExprKind::New { ref mut args, .. } => args,
        _ => return Err(DomainError::shape("a function call", found)),
    };
    if index >= args.len() {
        args.push(fallback);
    }
    let last = args.len() - 1;
    Ok(&mut args[index.min(last)])
}

/// The object an arrow function returns.
///
/// `() => ({...})` yields the object; a block body yields the argument of
/// its `return`, and a block without one gets `return {}` appended.
pub fn arrow_return_object(arrow: &mut Expr) -> DomainResult<&mut Expr> {
    let arrow = arrow.peel_mut();
    let found = arrow.kind_name();
    let ExprKind::Arrow { ref mut body, .. } = arrow.kind else {
        return Err(DomainError::shape("an arrow function", found));
    };
    match body {
        ArrowBody::Expr(expr) => Ok(expr.peel_mut()),
        ArrowBody::Block(block) => {
            let position = block
                .body
                .iter()
                .position(|stmt| matches!(stmt.kind, StmtKind::Return(Some(_))));
            let index = position.unwrap_or_else(|| {
                block
                    .body
                    .push(Stmt::new(StmtKind::Return(Some(Expr::object(Vec::new())))));
                block.body.len() - 1
            });
            match block.body[index].kind {
                StmtKind::Return(Some(ref mut value)) => Ok(value.peel_mut()),
                _ => Err(DomainError::shape("a return statement", "nothing")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::script::{ScriptTree, parse_expression};

    #[test]
    fn missing_argument_is_pushed() {
        let mut call = parse_expression("defineConfig()").unwrap();
        let arg = get_argument(&mut call, 0, Expr::object(Vec::new())).unwrap();
        assert!(matches!(arg.kind, ExprKind::Object(_)));

        let again = get_argument(&mut call, 0, Expr::null()).unwrap();
        assert!(matches!(again.kind, ExprKind::Object(_)));
        assert!(get_argument(&mut Expr::ident("x"), 0, Expr::null()).is_err());
    }

    #[test]
    fn arrow_expression_body_is_peeled() {
        let mut arrow = parse_expression("() => ({ a: 1 })").unwrap();
        let object = arrow_return_object(&mut arrow).unwrap();
        assert!(matches!(object.kind, ExprKind::Object(_)));
    }

    #[test]
    fn arrow_block_without_return_gets_one() {
        let mut t = ScriptTree::parse("export default defineConfig(() => {\n\tconst a = 1;\n});\n").unwrap();
        let StmtKind::ExportDefault(export) = &mut t.program.body[0].kind else {
            panic!("expected default export");
        };
        let arg = get_argument(export, 0, Expr::null()).unwrap();
        arrow_return_object(arg).unwrap();
        assert_eq!(
            t.generate_code(),
            "export default defineConfig(() => {\n\tconst a = 1;\n\treturn {};\n});\n"
        );
    }

    #[test]
    fn create_call_names_the_callee() {
        assert_eq!(create_call("sequence", Vec::new()).callee_name(), Some("sequence"));
    }
}
