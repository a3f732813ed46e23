//! TOML documents.
//!
//! Tables keep their key order. Serialization is the `toml` crate's own, so
//! comments and custom spacing are normalized away; use the YAML document
//! when annotations have to survive.

use ::toml::{Table, Value};
use tracing::debug;

use crate::domain::error::{DomainError, DomainResult, SyntaxFormat};

#[derive(Debug, Clone, PartialEq)]
pub struct TomlDocument {
    pub table: Table,
}

impl TomlDocument {
    pub fn parse(text: &str) -> DomainResult<Self> {
        let table = text.parse::<Table>().map_err(|e| {
            let offset = e.span().map_or(0, |span| span.start);
            DomainError::parse_at(SyntaxFormat::Toml, text, offset, e.message())
        })?;
        Ok(Self { table })
    }

    pub fn generate_code(&self) -> String {
        match ::toml::to_string(&self.table) {
            Ok(text) => text,
            Err(err) => {
                // Only unrepresentable values fail, and a parsed table has none.
                debug!(%err, "toml serialization failed");
                String::new()
            }
        }
    }

    /// The table at `path`, creating missing tables along the way.
    pub fn table_mut(&mut self, path: &[&str]) -> DomainResult<&mut Table> {
        let mut table = &mut self.table;
        for key in path {
            let value = table
                .entry(key.to_string())
                .or_insert_with(|| Value::Table(Table::new()));
            let found = value.type_str();
            table = value
                .as_table_mut()
                .ok_or_else(|| DomainError::shape(format!("a table at `{key}`"), found))?;
        }
        Ok(table)
    }
}

/// Set `key` to `value`. Returns whether the table changed.
pub fn set(table: &mut Table, key: &str, value: Value) -> bool {
    if table.get(key) == Some(&value) {
        return false;
    }
    table.insert(key.to_string(), value);
    true
}

/// Push `item` onto the array at `key` (created if missing) unless an equal
/// element exists.
pub fn array_append_unique(table: &mut Table, key: &str, item: Value) -> DomainResult<bool> {
    let value = table
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    let found = value.type_str();
    let Some(items) = value.as_array_mut() else {
        return Err(DomainError::shape(format!("an array at `{key}`"), found));
    };
    if items.contains(&item) {
        return Ok(false);
    }
    items.push(item);
    Ok(true)
}
