//! Array-literal element upserts.

use crate::domain::equality::equal;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::script::ast::*;

/// An element to add to an array literal.
///
/// Primitives are compared by value against existing literal elements, so
/// `'a'` and `"a"` are the same element. Nodes are compared structurally.
#[derive(Debug, Clone)]
pub enum ArrayItem {
    Primitive(LitValue),
    Node(Expr),
}

impl ArrayItem {
    fn exists_in(&self, elements: &[Expr]) -> bool {
        match self {
            Self::Primitive(value) => elements
                .iter()
                .any(|e| matches!(&e.kind, ExprKind::Lit(lit) if lit.value == *value)),
            Self::Node(node) => elements.iter().any(|e| equal(e, node)),
        }
    }

    fn into_expr(self) -> Expr {
        match self {
            Self::Primitive(value) => Expr::new(ExprKind::Lit(Literal { value, raw: None })),
            Self::Node(node) => node,
        }
    }
}

impl From<&str> for ArrayItem {
    fn from(value: &str) -> Self {
        Self::Primitive(LitValue::Str(value.to_string()))
    }
}

impl From<bool> for ArrayItem {
    fn from(value: bool) -> Self {
        Self::Primitive(LitValue::Bool(value))
    }
}

impl From<i64> for ArrayItem {
    fn from(value: i64) -> Self {
        Self::Primitive(LitValue::Num(value.to_string()))
    }
}

impl From<Expr> for ArrayItem {
    fn from(value: Expr) -> Self {
        Self::Node(value)
    }
}

fn elements_mut(array: &mut Expr) -> DomainResult<&mut Vec<Expr>> {
    let array = array.peel_mut();
    let found = array.kind_name();
    match array.kind {
        ExprKind::Array(ref mut elements) => Ok(elements),
        _ => Err(DomainError::shape("an array literal", found)),
    }
}

/// Add `item` at the end unless an equal element exists.
pub fn append(array: &mut Expr, item: impl Into<ArrayItem>) -> DomainResult<bool> {
    insert(array, item.into(), false)
}

/// Add `item` at the start unless an equal element exists.
pub fn prepend(array: &mut Expr, item: impl Into<ArrayItem>) -> DomainResult<bool> {
    insert(array, item.into(), true)
}

fn insert(array: &mut Expr, item: ArrayItem, front: bool) -> DomainResult<bool> {
    let elements = elements_mut(array)?;
    if item.exists_in(elements) {
        return Ok(false);
    }
    let expr = item.into_expr();
    if front {
        elements.insert(0, expr);
    } else {
        elements.push(expr);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::script::{ScriptTree, parse_expression};

    fn array_of(t: &mut ScriptTree) -> &mut Expr {
        let StmtKind::Var(decl) = &mut t.program.body[0].kind else {
            panic!("expected a declaration");
        };
        decl.declarations[0].init.as_mut().unwrap()
    }

    #[test]
    fn primitive_append_dedups_by_value() {
        let mut t = ScriptTree::parse("const list = ['a'];\n").unwrap();
        assert!(!append(array_of(&mut t), "a").unwrap());
        assert_eq!(t.generate_code(), "const list = ['a'];\n");

        assert!(append(array_of(&mut t), "b").unwrap());
        assert_eq!(t.generate_code(), "const list = ['a', 'b'];\n");
    }

    #[test]
    fn node_append_dedups_structurally() {
        let mut t = ScriptTree::parse("const plugins = [sveltekit(), tailwind({ a: \"x\" })];\n").unwrap();
        let again = parse_expression("tailwind({\n  a: 'x'\n})").unwrap();
        assert!(!append(array_of(&mut t), again).unwrap());
        assert!(prepend(array_of(&mut t), parse_expression("mdsvex()").unwrap()).unwrap());
        assert_eq!(
            t.generate_code(),
            "const plugins = [mdsvex(), sveltekit(), tailwind({ a: \"x\" })];\n"
        );
    }

    #[test]
    fn multiline_arrays_stay_multiline() {
        let mut t = ScriptTree::parse("const list = [\n  'a',\n  'b',\n];\n").unwrap();
        append(array_of(&mut t), "c").unwrap();
        assert_eq!(t.generate_code(), "const list = [\n  'a',\n  'b',\n  'c',\n];\n");
    }

    #[test]
    fn non_array_is_a_shape_error() {
        let mut expr = Expr::ident("x");
        assert!(matches!(
            append(&mut expr, "a"),
            Err(DomainError::UnexpectedShape { .. })
        ));
    }
}
