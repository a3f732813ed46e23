//! JSON documents.
//!
//! Objects keep their key order (`serde_json` is built with
//! `preserve_order`). Output is pretty-printed with the indentation the file
//! already used; a document that ended with a newline keeps it.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::convention::infer_indent;
use crate::domain::error::{DomainError, DomainResult, SyntaxFormat};

#[derive(Debug, Clone, PartialEq)]
pub struct JsonDocument {
    pub value: Value,
    indent: String,
    trailing_newline: bool,
}

impl JsonDocument {
    /// Parse `text`. Empty or blank input is an empty object.
    pub fn parse(text: &str) -> DomainResult<Self> {
        let value = if text.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(text).map_err(|e| DomainError::Parse {
                format: SyntaxFormat::Json,
                message: e.to_string(),
                line: e.line(),
                column: e.column(),
            })?
        };
        Ok(Self {
            value,
            indent: infer_indent(text),
            trailing_newline: text.is_empty() || text.ends_with('\n'),
        })
    }

    pub fn generate_code(&self) -> String {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(self.indent.as_bytes());
        let mut serializer = Serializer::with_formatter(&mut buf, formatter);
        // Writing a `Value` into memory cannot fail.
        if let Err(err) = self.value.serialize(&mut serializer) {
            debug!(%err, "json serialization failed");
        }
        let mut out = String::from_utf8_lossy(&buf).into_owned();
        if self.trailing_newline {
            out.push('\n');
        }
        out
    }

    pub fn indent(&self) -> &str {
        &self.indent
    }

    /// The top-level object.
    pub fn root_mut(&mut self) -> DomainResult<&mut Map<String, Value>> {
        as_object(&mut self.value)
    }

    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(&self.value, |value, key| value.get(key))
    }

    /// Set the value at `path`, creating intermediate objects. Returns whether
    /// the document changed.
    pub fn set_path(&mut self, path: &[&str], value: Value) -> DomainResult<bool> {
        let Some((last, parents)) = path.split_last() else {
            return Err(DomainError::InvalidInput("empty JSON path".into()));
        };
        let mut object = self.root_mut()?;
        for key in parents {
            object = as_object(property(object, key, Value::Object(Map::new())))?;
        }
        if object.get(*last) == Some(&value) {
            return Ok(false);
        }
        object.insert((*last).to_string(), value);
        Ok(true)
    }

    /// Push `item` onto the array at `path`, creating it and any
    /// intermediate objects, unless an equal element exists.
    pub fn append_path(&mut self, path: &[&str], item: Value) -> DomainResult<bool> {
        let Some((last, parents)) = path.split_last() else {
            return Err(DomainError::InvalidInput("empty JSON path".into()));
        };
        let mut object = self.root_mut()?;
        for key in parents {
            object = as_object(property(object, key, Value::Object(Map::new())))?;
        }
        append_unique(property(object, last, Value::Array(Vec::new())), item)
    }
}

fn as_object(value: &mut Value) -> DomainResult<&mut Map<String, Value>> {
    let found = kind(value);
    value
        .as_object_mut()
        .ok_or_else(|| DomainError::shape("a JSON object", found))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The value of `key`, inserting `fallback` at the end if missing.
pub fn property<'a>(object: &'a mut Map<String, Value>, key: &str, fallback: Value) -> &'a mut Value {
    object.entry(key).or_insert(fallback)
}

/// Push `item` unless an equal element exists. Returns whether it was added.
pub fn append_unique(array: &mut Value, item: Value) -> DomainResult<bool> {
    let found = kind(array);
    let Some(items) = array.as_array_mut() else {
        return Err(DomainError::shape("a JSON array", found));
    };
    if items.contains(&item) {
        return Ok(false);
    }
    items.push(item);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_key_order_and_indentation() {
        let src = "{\n  \"name\": \"app\",\n  \"scripts\": {\n    \"dev\": \"vite dev\"\n  }\n}\n";
        let mut doc = JsonDocument::parse(src).unwrap();
        assert_eq!(doc.generate_code(), src);

        assert!(doc.set_path(&["scripts", "test"], json!("vitest")).unwrap());
        assert!(!doc.set_path(&["scripts", "test"], json!("vitest")).unwrap());
        assert_eq!(
            doc.generate_code(),
            "{\n  \"name\": \"app\",\n  \"scripts\": {\n    \"dev\": \"vite dev\",\n    \"test\": \"vitest\"\n  }\n}\n"
        );
    }

    #[test]
    fn tabs_and_missing_newline_are_kept() {
        let src = "{\n\t\"a\": [\n\t\t1\n\t]\n}";
        let mut doc = JsonDocument::parse(src).unwrap();
        let root = doc.root_mut().unwrap();
        let list = property(root, "a", json!([]));
        assert!(append_unique(list, json!(2)).unwrap());
        assert!(!append_unique(list, json!(1)).unwrap());
        assert_eq!(doc.generate_code(), "{\n\t\"a\": [\n\t\t1,\n\t\t2\n\t]\n}");
    }

    #[test]
    fn empty_input_is_an_empty_object() {
        let mut doc = JsonDocument::parse("").unwrap();
        doc.set_path(&["compilerOptions", "strict"], json!(true)).unwrap();
        assert_eq!(doc.get_path(&["compilerOptions", "strict"]), Some(&json!(true)));
        assert_eq!(
            doc.generate_code(),
            "{\n\t\"compilerOptions\": {\n\t\t\"strict\": true\n\t}\n}\n"
        );
    }

    #[test]
    fn append_path_creates_the_array_once() {
        let mut doc = JsonDocument::parse("{\n  \"name\": \"app\"\n}\n").unwrap();
        assert!(doc.append_path(&["workspaces"], json!("packages/*")).unwrap());
        assert!(!doc.append_path(&["workspaces"], json!("packages/*")).unwrap());
        assert_eq!(doc.get_path(&["workspaces"]), Some(&json!(["packages/*"])));
    }

    #[test]
    fn shape_and_parse_errors() {
        let mut doc = JsonDocument::parse("{\"a\": 1}").unwrap();
        let err = doc.set_path(&["a", "b"], json!(1)).unwrap_err();
        assert!(matches!(err, DomainError::UnexpectedShape { .. }));

        let err = JsonDocument::parse("{\n  \"a\": 1,\n}").unwrap_err();
        assert!(matches!(err, DomainError::Parse { format: SyntaxFormat::Json, line: 3, .. }));
    }
}
