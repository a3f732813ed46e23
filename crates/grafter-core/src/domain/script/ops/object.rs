//! Object-literal property upserts.

use tracing::debug;

use crate::domain::equality::equal;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::script::ast::*;

/// A value to merge into an object literal.
///
/// `Object` is a plain map of nested properties and merges deeply into an
/// existing object literal. `Node` is a pre-built expression inserted as is.
#[derive(Debug, Clone)]
pub enum PropValue {
    Str(String),
    Number(String),
    Bool(bool),
    Null,
    Array(Vec<PropValue>),
    Object(Vec<(String, PropValue)>),
    Node(Expr),
}

impl PropValue {
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, PropValue)>) -> Self {
        Self::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn into_expr(self) -> Expr {
        match self {
            Self::Str(value) => Expr::string(value),
            Self::Number(value) => Expr::number(value),
            Self::Bool(value) => Expr::bool(value),
            Self::Null => Expr::null(),
            Self::Array(items) => Expr::array(items.into_iter().map(Self::into_expr).collect()),
            Self::Object(entries) => create(entries),
            Self::Node(expr) => expr,
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Number(value.to_string())
    }
}

impl From<Expr> for PropValue {
    fn from(value: Expr) -> Self {
        Self::Node(value)
    }
}

/// Build a new object literal.
pub fn create<K: AsRef<str>>(entries: impl IntoIterator<Item = (K, PropValue)>) -> Expr {
    Expr::object(
        entries
            .into_iter()
            .map(|(key, value)| Property::key_value(key.as_ref(), value.into_expr()))
            .collect(),
    )
}

fn props_mut(object: &mut Expr) -> DomainResult<&mut Vec<Property>> {
    let object = object.peel_mut();
    let found = object.kind_name();
    match object.kind {
        ExprKind::Object(ref mut props) => Ok(props),
        _ => Err(DomainError::shape("an object literal", found)),
    }
}

/// Value slot of the property `name`. A shorthand `{ name }` is expanded to
/// `{ name: name }` so it can be replaced.
fn slot<'a>(props: &'a mut [Property], name: &str) -> Option<&'a mut Expr> {
    let prop = props.iter_mut().find(|p| p.name() == Some(name))?;
    if let PropKind::Shorthand(ident) = &prop.kind {
        prop.kind = PropKind::KeyValue {
            key: PropKey::Ident(ident.clone()),
            value: Expr::ident(ident.clone()),
        };
    }
    prop.value_mut()
}

/// The value of property `name`, installing `fallback` when it is missing.
pub fn property<'a>(object: &'a mut Expr, name: &str, fallback: Expr) -> DomainResult<&'a mut Expr> {
    let props = props_mut(object)?;
    let index = match props.iter().position(|p| p.name() == Some(name)) {
        Some(index) => index,
        None => {
            props.push(Property::key_value(name, fallback));
            props.len() - 1
        }
    };
    slot(&mut props[index..], name).ok_or_else(|| DomainError::shape("a property value", "nothing"))
}

/// The value of a `key: value` property, without inserting anything.
pub fn property_mut<'a>(object: &'a mut Expr, name: &str) -> Option<&'a mut Expr> {
    let props = props_mut(object).ok()?;
    props
        .iter_mut()
        .find(|p| p.name() == Some(name))
        .and_then(Property::value_mut)
}

pub fn remove_property(object: &mut Expr, name: &str) -> DomainResult<bool> {
    let props = props_mut(object)?;
    let before = props.len();
    props.retain(|p| p.name() != Some(name));
    Ok(props.len() != before)
}

/// Deep merge `entries` into `object`.
///
/// A nested `PropValue::Object` recurses into an existing object literal.
/// When the existing value is anything else it is replaced outright. Leaves
/// that are already structurally equal are left untouched, so their
/// original formatting survives.
pub fn override_properties<K: AsRef<str>>(
    object: &mut Expr,
    entries: impl IntoIterator<Item = (K, PropValue)>,
) -> DomainResult<()> {
    let props = props_mut(object)?;
    for (key, value) in entries {
        merge(props, key.as_ref(), value);
    }
    Ok(())
}

fn merge(props: &mut Vec<Property>, key: &str, value: PropValue) {
    let Some(current) = slot(props, key) else {
        props.push(Property::key_value(key, value.into_expr()));
        return;
    };
    match value {
        PropValue::Object(entries) if matches!(current.peel().kind, ExprKind::Object(_)) => {
            if let ExprKind::Object(nested) = &mut current.peel_mut().kind {
                for (key, value) in entries {
                    merge(nested, &key, value);
                }
            }
        }
        value => {
            let replacement = value.into_expr();
            if !equal(&*current, &replacement) {
                debug!(key, replaced = current.kind_name(), "replacing property value");
                *current = replacement;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::script::{ScriptTree, parse_expression};
    use crate::domain::script::ops::exports::default_export;

    fn tree(text: &str) -> ScriptTree {
        ScriptTree::parse(text).unwrap()
    }

    #[test]
    fn deep_merge_replaces_leaf_and_keeps_siblings() {
        let mut t = tree("export default { kit: { adapter: x(), alias: {} } };\n");
        let config = default_export(&mut t.program, Expr::object(Vec::new())).unwrap();
        override_properties(
            config,
            [(
                "kit",
                PropValue::object([("adapter", PropValue::Node(parse_expression("y()").unwrap()))]),
            )],
        )
        .unwrap();
        assert_eq!(
            t.generate_code(),
            "export default { kit: { adapter: y(), alias: {} } };\n"
        );
    }

    #[test]
    fn override_is_idempotent() {
        let src = "export default {\n\tkit: {\n\t\tadapter: y()\n\t}\n};\n";
        let mut t = tree(src);
        let config = default_export(&mut t.program, Expr::object(Vec::new())).unwrap();
        override_properties(
            config,
            [("kit", PropValue::object([("adapter", PropValue::Node(parse_expression("y()").unwrap()))]))],
        )
        .unwrap();
        assert_eq!(t.generate_code(), src);
    }

    #[test]
    fn non_object_value_is_replaced() {
        let mut obj = parse_expression("{ kit: load() }").unwrap();
        override_properties(&mut obj, [("kit", PropValue::object([("a", PropValue::from(1_i64))]))]).unwrap();
        let kit = property_mut(&mut obj, "kit").unwrap();
        assert!(matches!(kit.kind, ExprKind::Object(_)));
    }

    #[test]
    fn property_returns_existing_or_fallback() {
        let mut obj = parse_expression("{ a: 1, b }").unwrap();
        let a = property(&mut obj, "a", Expr::number(9)).unwrap();
        assert!(matches!(&a.kind, ExprKind::Lit(l) if l.value == LitValue::Num("1".into())));
        let b = property(&mut obj, "b", Expr::number(9)).unwrap();
        assert_eq!(b.as_ident(), Some("b"));
        property(&mut obj, "c-d", Expr::bool(true)).unwrap();

        let ExprKind::Object(props) = &obj.kind else {
            panic!("expected object");
        };
        assert_eq!(props.len(), 3);
        assert_eq!(props[2].name(), Some("c-d"));
    }

    #[test]
    fn new_nested_objects_print_multiline() {
        let mut t = tree("export default {};\n");
        let config = default_export(&mut t.program, Expr::object(Vec::new())).unwrap();
        override_properties(
            config,
            [
                ("kit", PropValue::object([("alias", PropValue::object([("$lib", PropValue::from("src/lib"))]))])),
                ("flags", PropValue::Array(vec![PropValue::from(true)])),
            ],
        )
        .unwrap();
        assert_eq!(
            t.generate_code(),
            "export default {\n\tkit: {\n\t\talias: {\n\t\t\t$lib: 'src/lib'\n\t\t}\n\t},\n\tflags: [true]\n};\n"
        );
    }

    #[test]
    fn remove_property_reports_change() {
        let mut obj = parse_expression("{ a: 1 }").unwrap();
        assert!(remove_property(&mut obj, "a").unwrap());
        assert!(!remove_property(&mut obj, "a").unwrap());
        assert!(remove_property(&mut Expr::ident("x"), "a").is_err());
    }
}
