//! Declarative edit recipes.
//!
//! A recipe is a TOML file listing the edits one addon makes. Loading it
//! registers every step with an [`EditPlan`], so recipes run through the
//! same service as hand-written edits.
//!
//! # Format
//!
//! ```toml
//! [recipe]
//! name        = "tailwind"            # addon id reported in errors
//! description = "Tailwind via Vite"   # optional
//!
//! [[steps]]
//! op   = "plugin"
//! path = "vite.config.ts"
//! expr = "tailwindcss()"
//! import = { from = "@tailwindcss/vite", default = "tailwindcss" }
//!
//! [[steps]]
//! op     = "css-import"
//! path   = "src/app.css"
//! params = "'tailwindcss'"
//!
//! [[steps]]
//! op    = "json-set"
//! path  = "package.json"
//! key   = "devDependencies.tailwindcss"
//! value = "^4.0.0"
//! ```
//!
//! Keys are dotted paths; use an array (`key = ["exports", "./x"]`) when a
//! segment itself contains a dot. Script steps accept component files and
//! edit their `<script>` region; stylesheet steps edit their `<style>`.

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Deserialize;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use grafter_core::{
    application::{
        ApplicationError, EditPlan, FileKind, edit_component, edit_css, edit_json, edit_script,
        edit_toml, edit_yaml,
    },
    domain::{
        DomainError, DomainResult, ScriptTree, Stylesheet,
        config::{Mapping, Sequence, YamlNode, toml as toml_doc},
        css::{add_declaration, add_import, add_rule},
        markup::{append_markup, prepend_markup},
        parse_expression,
        script::{
            Program,
            composite::{
                GlobalMember, HandlerChain, PluginList, add_plugin, ensure_global_member,
                splice_handler,
            },
            ops::imports::{add_default, add_empty, add_named, add_namespace},
        },
    },
    error::GrafterResult,
};

// ── Manifest types ────────────────────────────────────────────────────────────

/// A parsed recipe file.
#[derive(Debug, Clone, Deserialize)]
pub struct Recipe {
    pub recipe: RecipeSection,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// `[recipe]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeSection {
    pub name: String,
    pub description: Option<String>,
}

/// A key path, dotted or pre-split.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum KeyPath {
    Dotted(String),
    Segments(Vec<String>),
}

impl KeyPath {
    pub fn segments(&self) -> Vec<&str> {
        match self {
            Self::Dotted(key) => key.split('.').collect(),
            Self::Segments(keys) => keys.iter().map(String::as_str).collect(),
        }
    }
}

/// Bindings pulled from one module.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ImportSpec {
    pub from: String,
    pub default: Option<String>,
    pub namespace: Option<String>,
    #[serde(default)]
    pub named: Vec<String>,
    #[serde(default)]
    pub type_only: bool,
}

/// One `[[steps]]` entry, selected by its `op` field.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Step {
    /// Upsert an import. With no bindings it becomes a side-effect import.
    Import {
        path: String,
        #[serde(flatten)]
        import: ImportSpec,
    },
    /// Add an expression to the config's plugin array.
    Plugin {
        path: String,
        expr: String,
        import: Option<ImportSpec>,
        property: Option<String>,
        #[serde(default)]
        prepend: bool,
    },
    CssImport {
        path: String,
        params: String,
    },
    /// Set declarations on the rule for `selector`.
    CssRule {
        path: String,
        selector: String,
        declarations: toml::Table,
    },
    JsonSet {
        path: String,
        key: KeyPath,
        value: toml::Value,
    },
    JsonAppend {
        path: String,
        key: KeyPath,
        value: toml::Value,
    },
    TomlSet {
        path: String,
        key: KeyPath,
        value: toml::Value,
    },
    TomlAppend {
        path: String,
        key: KeyPath,
        value: toml::Value,
    },
    YamlSet {
        path: String,
        key: KeyPath,
        value: String,
    },
    YamlAppend {
        path: String,
        key: KeyPath,
        value: String,
    },
    /// Splice markup into the component, or into the first `element`.
    Markup {
        path: String,
        markup: String,
        element: Option<String>,
        #[serde(default)]
        prepend: bool,
    },
    /// Compose a handler into the exported `handle` chain.
    Handler {
        path: String,
        name: String,
        handler: String,
        handler_type: Option<String>,
        type_source: Option<String>,
    },
    /// Declare a member on an interface of the global `App` namespace.
    Global {
        path: String,
        interface: String,
        member: String,
        #[serde(rename = "type")]
        ty: String,
    },
}

impl FromStr for Recipe {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let recipe: Recipe = toml::from_str(s)
            .map_err(|e| DomainError::InvalidInput(format!("invalid recipe: {e}")))?;
        if recipe.recipe.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("recipe name must not be empty".into()));
        }
        Ok(recipe)
    }
}

impl Recipe {
    pub fn name(&self) -> &str {
        &self.recipe.name
    }

    /// Register every step with `plan` under the recipe's name.
    ///
    /// # Errors
    ///
    /// Fails on the first step whose path is absolute or escapes the project.
    pub fn register(&self, plan: &mut EditPlan) -> DomainResult<()> {
        for step in &self.steps {
            let step = step.clone();
            let path = step.path().to_string();
            plan.register_file_edit(self.name(), &path, move |content| step.apply(content))?;
        }
        debug!(recipe = %self.name(), steps = self.steps.len(), "registered recipe");
        Ok(())
    }
}

impl Step {
    pub fn path(&self) -> &str {
        match self {
            Self::Import { path, .. }
            | Self::Plugin { path, .. }
            | Self::CssImport { path, .. }
            | Self::CssRule { path, .. }
            | Self::JsonSet { path, .. }
            | Self::JsonAppend { path, .. }
            | Self::TomlSet { path, .. }
            | Self::TomlAppend { path, .. }
            | Self::YamlSet { path, .. }
            | Self::YamlAppend { path, .. }
            | Self::Markup { path, .. }
            | Self::Handler { path, .. }
            | Self::Global { path, .. } => path,
        }
    }

    /// Run the step against a file's current content.
    pub fn apply(&self, content: &str) -> DomainResult<String> {
        let kind = FileKind::from_path(self.path());
        match self {
            Self::Import { import, .. } => on_script(kind, content, |tree| {
                add_imports(&mut tree.program, import);
                Ok(())
            }),
            Self::Plugin {
                expr,
                import,
                property,
                prepend,
                ..
            } => on_script(kind, content, |tree| {
                let plugin = parse_expression(expr)?;
                if let Some(import) = import {
                    add_imports(&mut tree.program, import);
                }
                let mut list = PluginList {
                    append: !prepend,
                    ..PluginList::default()
                };
                if let Some(property) = property {
                    list.property = property.clone();
                }
                add_plugin(&mut tree.program, plugin, &list).map(drop)
            }),
            Self::CssImport { params, .. } => on_stylesheet(kind, content, |sheet| {
                add_import(sheet, params);
                Ok(())
            }),
            Self::CssRule {
                selector,
                declarations,
                ..
            } => on_stylesheet(kind, content, |sheet| {
                let rule = add_rule(sheet, selector)?;
                for (prop, value) in declarations {
                    add_declaration(rule, prop, &css_value(value));
                }
                Ok(())
            }),
            Self::JsonSet { key, value, .. } => {
                expect_kind(kind, FileKind::Json)?;
                let value = json_value(value)?;
                edit_json(content, |doc| doc.set_path(&key.segments(), value).map(drop))
            }
            Self::JsonAppend { key, value, .. } => {
                expect_kind(kind, FileKind::Json)?;
                let value = json_value(value)?;
                edit_json(content, |doc| doc.append_path(&key.segments(), value).map(drop))
            }
            Self::TomlSet { key, value, .. } => {
                expect_kind(kind, FileKind::Toml)?;
                let (last, parents) = split(key)?;
                edit_toml(content, |doc| {
                    toml_doc::set(doc.table_mut(&parents)?, last, value.clone());
                    Ok(())
                })
            }
            Self::TomlAppend { key, value, .. } => {
                expect_kind(kind, FileKind::Toml)?;
                let (last, parents) = split(key)?;
                edit_toml(content, |doc| {
                    toml_doc::array_append_unique(doc.table_mut(&parents)?, last, value.clone())
                        .map(drop)
                })
            }
            Self::YamlSet { key, value, .. } => {
                expect_kind(kind, FileKind::Yaml)?;
                let (last, parents) = split(key)?;
                edit_yaml(content, |doc| {
                    let map = yaml_mapping(doc.root_mapping_mut()?, &parents)?;
                    map.set(last, YamlNode::scalar(value));
                    Ok(())
                })
            }
            Self::YamlAppend { key, value, .. } => {
                expect_kind(kind, FileKind::Yaml)?;
                let (last, parents) = split(key)?;
                edit_yaml(content, |doc| {
                    let map = yaml_mapping(doc.root_mapping_mut()?, &parents)?;
                    map.entry(last, || YamlNode::Sequence(Sequence::new()))
                        .sequence_mut()?
                        .push_unique(YamlNode::scalar(value));
                    Ok(())
                })
            }
            Self::Markup {
                markup,
                element,
                prepend,
                ..
            } => {
                expect_kind(kind, FileKind::Component)?;
                edit_component(content, |component| {
                    let changed = match element {
                        Some(name) => {
                            let target = component.find_element_mut(name).ok_or_else(|| {
                                DomainError::shape(format!("a <{name}> element"), "none")
                            })?;
                            if *prepend {
                                prepend_markup(target, markup)?
                            } else {
                                append_markup(target, markup)?
                            }
                        }
                        None if *prepend => prepend_markup(component, markup)?,
                        None => append_markup(component, markup)?,
                    };
                    debug!(changed, "markup step");
                    Ok(())
                })
            }
            Self::Handler {
                name,
                handler,
                handler_type,
                type_source,
                ..
            } => on_script(kind, content, |tree| {
                let mut chain = HandlerChain::new(name, parse_expression(handler)?);
                if let (Some(ty), Some(source)) = (handler_type, type_source) {
                    chain = chain.typed(ty, source);
                }
                splice_handler(&mut tree.program, &chain).map(drop)
            }),
            Self::Global {
                interface,
                member,
                ty,
                ..
            } => on_script(kind, content, |tree| {
                let target = GlobalMember::new(interface, member, ty);
                ensure_global_member(&mut tree.program, &target).map(drop)
            }),
        }
    }
}

// ── Step helpers ──────────────────────────────────────────────────────────────

fn wrong_kind(expected: &str, found: FileKind) -> DomainError {
    DomainError::shape(expected, format!("a {found} file"))
}

fn expect_kind(kind: FileKind, expected: FileKind) -> DomainResult<()> {
    if kind == expected {
        Ok(())
    } else {
        Err(wrong_kind(&format!("a {expected} file"), kind))
    }
}

fn on_script(
    kind: FileKind,
    content: &str,
    mutate: impl FnOnce(&mut ScriptTree) -> DomainResult<()>,
) -> DomainResult<String> {
    match kind {
        FileKind::Script => edit_script(content, mutate),
        FileKind::Component => edit_component(content, |c| mutate(c.ensure_script(false)?)),
        other => Err(wrong_kind("a script or component file", other)),
    }
}

fn on_stylesheet(
    kind: FileKind,
    content: &str,
    mutate: impl FnOnce(&mut Stylesheet) -> DomainResult<()>,
) -> DomainResult<String> {
    match kind {
        FileKind::Stylesheet => edit_css(content, mutate),
        FileKind::Component => edit_component(content, |c| mutate(c.ensure_style()?)),
        other => Err(wrong_kind("a stylesheet or component file", other)),
    }
}

fn add_imports(program: &mut Program, spec: &ImportSpec) -> bool {
    let mut changed = false;
    if let Some(local) = &spec.default {
        changed |= add_default(program, &spec.from, local);
    }
    if let Some(local) = &spec.namespace {
        changed |= add_namespace(program, &spec.from, local);
    }
    if !spec.named.is_empty() {
        changed |= add_named(
            program,
            &spec.from,
            spec.named.iter().map(String::as_str),
            spec.type_only,
        );
    }
    if spec.default.is_none() && spec.namespace.is_none() && spec.named.is_empty() {
        changed |= add_empty(program, &spec.from);
    }
    changed
}

fn split(key: &KeyPath) -> DomainResult<(&str, Vec<&str>)> {
    let mut segments = key.segments();
    let last = segments
        .pop()
        .filter(|last| !last.is_empty())
        .ok_or_else(|| DomainError::InvalidInput("empty key path".into()))?;
    Ok((last, segments))
}

fn json_value(value: &toml::Value) -> DomainResult<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| DomainError::InvalidInput(format!("value has no JSON form: {e}")))
}

fn css_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn yaml_mapping<'a>(mut map: &'a mut Mapping, path: &[&str]) -> DomainResult<&'a mut Mapping> {
    for key in path {
        map = map
            .entry(key, || YamlNode::Mapping(Mapping::new()))
            .mapping_mut()?;
    }
    Ok(map)
}

// ── Loader ────────────────────────────────────────────────────────────────────

/// Loads recipe files from disk.
pub struct RecipeLoader {
    dir: PathBuf,
}

impl RecipeLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load one recipe file.
    ///
    /// # Errors
    ///
    /// [`ApplicationError::ContentUnavailable`] when the file cannot be read,
    /// [`DomainError::InvalidInput`] when it is not a valid recipe.
    #[instrument]
    pub fn load_file(path: &Path) -> GrafterResult<Recipe> {
        let raw = fs::read_to_string(path).map_err(|e| ApplicationError::ContentUnavailable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let recipe = raw.parse::<Recipe>().map_err(|e| match e {
            DomainError::InvalidInput(message) => {
                DomainError::InvalidInput(format!("{}: {message}", path.display()))
            }
            other => other,
        })?;
        debug!(name = %recipe.name(), steps = recipe.steps.len(), "loaded recipe");
        Ok(recipe)
    }

    /// Load every `*.toml` recipe under the directory, sorted by file name.
    ///
    /// Invalid recipes are skipped with a `WARN` log so one bad file does not
    /// block the rest.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::ContentUnavailable`] if the directory is
    /// missing.
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn load_all(&self) -> GrafterResult<Vec<Recipe>> {
        if !self.dir.is_dir() {
            return Err(ApplicationError::ContentUnavailable {
                path: self.dir.display().to_string(),
                reason: "recipe directory not found".into(),
            }
            .into());
        }

        let mut recipes = Vec::new();
        let entries = WalkDir::new(&self.dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "toml"));

        for entry in entries {
            match Self::load_file(entry.path()) {
                Ok(recipe) => recipes.push(recipe),
                Err(e) => warn!(
                    file = %entry.path().display(),
                    error = %e,
                    "skipping recipe due to load error"
                ),
            }
        }

        debug!(count = recipes.len(), "finished loading recipes");
        Ok(recipes)
    }
}
