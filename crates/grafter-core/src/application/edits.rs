//! File edits: the unit of work an addon registers.
//!
//! An edit is a function from a file's current content to its new content.
//! The typed helpers below do the parse, mutate, serialize round so that an
//! addon only writes the mutation.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::domain::{
    Component, DomainResult, JsonDocument, RelativePath, ScriptTree, Stylesheet, SyntaxFormat,
    TomlDocument, YamlDocument,
};

/// Adapter family selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Script,
    Stylesheet,
    Component,
    Json,
    Toml,
    Yaml,
    Text,
}

impl FileKind {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("js" | "ts" | "mjs" | "cjs" | "mts" | "cts") => Self::Script,
            Some("css" | "postcss" | "pcss") => Self::Stylesheet,
            Some("svelte" | "html" | "htm") => Self::Component,
            Some("json") => Self::Json,
            Some("toml") => Self::Toml,
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Text,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Stylesheet => "stylesheet",
            Self::Component => "component",
            Self::Json => "json",
            Self::Toml => "toml",
            Self::Yaml => "yaml",
            Self::Text => "text",
        }
    }

    /// The syntax a parser for this kind reports errors in.
    pub const fn syntax(&self) -> Option<SyntaxFormat> {
        match self {
            Self::Script => Some(SyntaxFormat::Script),
            Self::Stylesheet => Some(SyntaxFormat::Stylesheet),
            Self::Component => Some(SyntaxFormat::Markup),
            Self::Json => Some(SyntaxFormat::Json),
            Self::Toml => Some(SyntaxFormat::Toml),
            Self::Yaml => Some(SyntaxFormat::Yaml),
            Self::Text => None,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values an addon hands from one of its edits to a later one, keyed by
/// name. Each addon gets its own map for the length of a run.
pub type Signals = BTreeMap<String, String>;

type EditFn = Box<dyn Fn(&str, &mut Signals) -> DomainResult<String> + Send + Sync>;

/// One registered `(path, edit)` pair.
pub struct FileEdit {
    pub addon: String,
    pub path: RelativePath,
    edit: EditFn,
}

impl FileEdit {
    pub fn kind(&self) -> FileKind {
        FileKind::from_path(&self.path)
    }

    pub fn apply(&self, content: &str, signals: &mut Signals) -> DomainResult<String> {
        (self.edit)(content, signals)
    }
}

impl fmt::Debug for FileEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileEdit")
            .field("addon", &self.addon)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Edits in registration order.
#[derive(Debug, Default)]
pub struct EditPlan {
    edits: Vec<FileEdit>,
}

impl EditPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `edit` for `path` on behalf of `addon`. The function receives
    /// the file's current content, empty when the file does not exist yet,
    /// and must return the same output for the same input.
    pub fn register_file_edit<F>(
        &mut self,
        addon: impl Into<String>,
        path: &str,
        edit: F,
    ) -> DomainResult<&mut Self>
    where
        F: Fn(&str) -> DomainResult<String> + Send + Sync + 'static,
    {
        self.register_file_edit_with(addon, path, move |content, _| edit(content))
    }

    /// Like [`register_file_edit`](Self::register_file_edit), with access to
    /// the addon's signals.
    pub fn register_file_edit_with<F>(
        &mut self,
        addon: impl Into<String>,
        path: &str,
        edit: F,
    ) -> DomainResult<&mut Self>
    where
        F: Fn(&str, &mut Signals) -> DomainResult<String> + Send + Sync + 'static,
    {
        let path = RelativePath::try_new(path)?;
        let addon = addon.into();
        debug!(%addon, %path, "registered file edit");
        self.edits.push(FileEdit {
            addon,
            path,
            edit: Box::new(edit),
        });
        Ok(self)
    }

    pub fn edits(&self) -> &[FileEdit] {
        &self.edits
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Parse `content` as a script, run `mutate`, print the result.
pub fn edit_script(
    content: &str,
    mutate: impl FnOnce(&mut ScriptTree) -> DomainResult<()>,
) -> DomainResult<String> {
    let mut tree = ScriptTree::parse(content)?;
    mutate(&mut tree)?;
    Ok(tree.generate_code())
}

pub fn edit_css(
    content: &str,
    mutate: impl FnOnce(&mut Stylesheet) -> DomainResult<()>,
) -> DomainResult<String> {
    let mut sheet = Stylesheet::parse(content)?;
    mutate(&mut sheet)?;
    Ok(sheet.generate_code())
}

pub fn edit_component(
    content: &str,
    mutate: impl FnOnce(&mut Component) -> DomainResult<()>,
) -> DomainResult<String> {
    let mut component = Component::parse(content)?;
    mutate(&mut component)?;
    Ok(component.generate_code())
}

pub fn edit_json(
    content: &str,
    mutate: impl FnOnce(&mut JsonDocument) -> DomainResult<()>,
) -> DomainResult<String> {
    let mut doc = JsonDocument::parse(content)?;
    let before = doc.value.clone();
    mutate(&mut doc)?;
    // Reprinting an untouched document would still normalize its spacing.
    if doc.value == before {
        return Ok(content.to_string());
    }
    Ok(doc.generate_code())
}

pub fn edit_toml(
    content: &str,
    mutate: impl FnOnce(&mut TomlDocument) -> DomainResult<()>,
) -> DomainResult<String> {
    let mut doc = TomlDocument::parse(content)?;
    let before = doc.table.clone();
    mutate(&mut doc)?;
    if doc.table == before {
        return Ok(content.to_string());
    }
    Ok(doc.generate_code())
}

pub fn edit_yaml(
    content: &str,
    mutate: impl FnOnce(&mut YamlDocument) -> DomainResult<()>,
) -> DomainResult<String> {
    let mut doc = YamlDocument::parse(content)?;
    mutate(&mut doc)?;
    Ok(doc.generate_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use crate::domain::script::ops::imports::{add_default, add_named};
    use serde_json::json;

    #[test]
    fn kinds_follow_extensions() {
        assert_eq!(FileKind::from_path("vite.config.ts"), FileKind::Script);
        assert_eq!(FileKind::from_path("src/app.CSS"), FileKind::Stylesheet);
        assert_eq!(FileKind::from_path("src/routes/+page.svelte"), FileKind::Component);
        assert_eq!(FileKind::from_path("src/app.html"), FileKind::Component);
        assert_eq!(FileKind::from_path("package.json"), FileKind::Json);
        assert_eq!(FileKind::from_path(".github/workflows/ci.yml"), FileKind::Yaml);
        assert_eq!(FileKind::from_path(".env"), FileKind::Text);
        assert_eq!(FileKind::Text.syntax(), None);
    }

    #[test]
    fn script_edits_keep_the_hashbang_first() {
        let out = edit_script("#!/usr/bin/env node\nimport a from 'a';\n", |tree| {
            add_default(&mut tree.program, "b", "b");
            Ok(())
        })
        .unwrap();
        assert_eq!(
            out,
            "#!/usr/bin/env node\nimport b from 'b';\nimport a from 'a';\n"
        );
    }

    #[test]
    fn registration_rejects_absolute_paths() {
        let mut plan = EditPlan::new();
        let err = plan
            .register_file_edit("lint", "/etc/hosts", |c| Ok(c.to_string()))
            .unwrap_err();
        assert!(matches!(err, DomainError::AbsolutePathNotAllowed { .. }));
        assert!(plan.is_empty());
    }

    #[test]
    fn registered_edits_keep_their_order() {
        let mut plan = EditPlan::new();
        plan.register_file_edit("a", "x.ts", |c| Ok(format!("{c}a")))
            .unwrap()
            .register_file_edit("b", "x.ts", |c| Ok(format!("{c}b")))
            .unwrap();
        let mut signals = Signals::new();
        let out = plan
            .edits()
            .iter()
            .try_fold(String::new(), |text, edit| edit.apply(&text, &mut signals))
            .unwrap();
        assert_eq!(out, "ab");
        assert_eq!(plan.edits()[1].kind(), FileKind::Script);
    }

    #[test]
    fn typed_helpers_round_trip() {
        let out = edit_script("", |tree| {
            add_named(&mut tree.program, "pkg", ["foo", "bar"], false);
            Ok(())
        })
        .unwrap();
        assert_eq!(out, "import { foo, bar } from 'pkg';\n");

        let src = "{ \"a\": 1 }";
        assert_eq!(edit_json(src, |_| Ok(())).unwrap(), src);
        let out = edit_json(src, |doc| doc.set_path(&["b"], json!(2)).map(drop)).unwrap();
        assert!(out.contains("\"b\": 2"));
    }
}
