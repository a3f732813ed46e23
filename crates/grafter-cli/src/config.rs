//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables: `GRAFTER_<SECTION>__<KEY>`, e.g.
//!    `GRAFTER_EDITS__DRY_RUN=true`
//! 3. Config file: `--config`, else `.grafter.toml` in the current
//!    directory, else the platform config directory
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Name of the per-project configuration file.
pub const LOCAL_CONFIG: &str = ".grafter.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub output: OutputConfig,
    pub edits: EditsConfig,
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    /// `auto`, `human`, `plain` or `json`.
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditsConfig {
    /// Never write files unless `--dry-run` is turned off here.
    pub dry_run: bool,
    /// Skip a failing addon instead of aborting the run.
    pub keep_going: bool,
    /// Where `grafter apply` looks when given no recipes.
    pub recipe_dir: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Report plain-text files in `grafter inspect`.
    pub include_text: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "auto".into(),
        }
    }
}

impl Default for EditsConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            keep_going: false,
            recipe_dir: PathBuf::from(".grafter/recipes"),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the
    /// environment.
    ///
    /// An explicit `config_file` must exist; the implicit locations are
    /// optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let (path, required) = match config_file {
            Some(path) => (path.clone(), true),
            None => (Self::config_path(), false),
        };
        debug!(path = %path.display(), required, "loading configuration");
        Self::load_from(&path, required, "GRAFTER")
    }

    fn load_from(path: &Path, required: bool, env_prefix: &str) -> anyhow::Result<Self> {
        let defaults = toml::to_string(&Self::default()).context("serialising defaults")?;
        let config = Config::builder()
            .add_source(File::from_str(&defaults, FileFormat::Toml))
            .add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(required),
            )
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("reading configuration from {}", path.display()))?;
        config
            .try_deserialize()
            .context("configuration has invalid values")
    }

    /// Path to the active configuration file.
    ///
    /// `.grafter.toml` in the current directory wins over the platform
    /// config directory when it exists.
    pub fn config_path() -> PathBuf {
        let local = PathBuf::from(LOCAL_CONFIG);
        if local.is_file() {
            return local;
        }
        Self::global_path()
    }

    /// Path of the per-user configuration file.
    pub fn global_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "grafter", "grafter")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG))
    }

    /// The value of a dotted key, rendered as text.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = toml::Value::try_from(self).ok()?;
        let found = key
            .split('.')
            .try_fold(&value, |value, segment| value.get(segment))?;
        Some(match found {
            toml::Value::String(text) => text.clone(),
            other => other.to_string(),
        })
    }

    /// Return a copy with `key` set to `value`. The value is read as a TOML
    /// literal when it parses as one, else as a string.
    pub fn with_value(&self, key: &str, value: &str) -> anyhow::Result<Self> {
        if self.get(key).is_none() {
            anyhow::bail!("unknown configuration key `{key}`");
        }
        let toml::Value::Table(mut table) =
            toml::Value::try_from(self).context("serialising configuration")?
        else {
            anyhow::bail!("configuration is not a table");
        };
        let segments: Vec<&str> = key.split('.').collect();
        let Some((last, parents)) = segments.split_last() else {
            anyhow::bail!("empty configuration key");
        };
        let mut current = &mut table;
        for segment in parents {
            current = current
                .get_mut(*segment)
                .and_then(toml::Value::as_table_mut)
                .with_context(|| format!("`{segment}` is not a section"))?;
        }
        current.insert((*last).to_string(), literal(value));
        toml::Value::Table(table)
            .try_into()
            .with_context(|| format!("invalid value for `{key}`: {value}"))
    }
}

/// Parse `raw` as a TOML value, falling back to a plain string.
pub fn literal(raw: &str) -> toml::Value {
    format!("v = {raw}")
        .parse::<toml::Table>()
        .ok()
        .and_then(|mut table| table.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let cfg = AppConfig::default();
        assert!(!cfg.edits.dry_run);
        assert_eq!(cfg.output.format, "auto");
        assert_eq!(cfg.edits.recipe_dir, PathBuf::from(".grafter/recipes"));
    }

    #[test]
    fn missing_optional_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let cfg = AppConfig::load_from(&temp.path().join("none.toml"), false, "GRAFTER_TEST_NONE")
            .unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(AppConfig::load_from(&temp.path().join("none.toml"), true, "GRAFTER_TEST_NONE").is_err());
    }

    #[test]
    fn file_values_override_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[edits]\ndry_run = true\n\n[output]\nformat = \"json\"\n").unwrap();
        let cfg = AppConfig::load_from(&path, true, "GRAFTER_TEST_FILE").unwrap();
        assert!(cfg.edits.dry_run);
        assert_eq!(cfg.output.format, "json");
        assert!(!cfg.edits.keep_going);
    }

    #[test]
    fn get_known_and_unknown_keys() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.get("edits.dry_run").as_deref(), Some("false"));
        assert_eq!(cfg.get("output.format").as_deref(), Some("auto"));
        assert_eq!(cfg.get("does.not.exist"), None);
    }

    #[test]
    fn with_value_parses_literals() {
        let cfg = AppConfig::default().with_value("edits.keep_going", "true").unwrap();
        assert!(cfg.edits.keep_going);
        let cfg = cfg.with_value("output.format", "plain").unwrap();
        assert_eq!(cfg.output.format, "plain");
        assert!(cfg.with_value("edits.dry_run", "maybe").is_err());
        assert!(cfg.with_value("nope", "1").is_err());
    }

    #[test]
    fn literal_fallbacks() {
        assert_eq!(literal("3"), toml::Value::Integer(3));
        assert_eq!(literal("eslint ."), toml::Value::String("eslint .".into()));
        assert_eq!(literal("\"1.0\""), toml::Value::String("1.0".into()));
    }
}
