//! `grafter inspect`: report the conventions inferred for files.
//!
//! Useful to predict how new code will be formatted before running an edit,
//! and to find files grafter cannot parse.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, instrument};

use grafter_adapters::ProjectScanner;
use grafter_core::{
    application::FileKind,
    domain::{
        Component, Convention, JsonDocument, ScriptTree, Stylesheet, TomlDocument, YamlDocument,
        infer_indent,
    },
};

use crate::{
    cli::InspectArgs,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// What grafter sees in one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub path: String,
    pub kind: &'static str,
    /// Indent unit, spelled out (`tab`, `2 spaces`).
    pub indent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semicolons: Option<bool>,
    /// Parse failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[instrument(skip_all, fields(path = %args.path.display()))]
pub fn execute(args: InspectArgs, config: &AppConfig, output: &OutputManager) -> CliResult<()> {
    let targets = targets(&args.path, args.all || config.scan.include_text)?;
    debug!(count = targets.len(), "inspecting files");

    let mut reports = Vec::with_capacity(targets.len());
    for (display, full) in targets {
        let text = std::fs::read_to_string(&full).map_err(|e| CliError::IoError {
            message: format!("failed to read {}", full.display()),
            source: e,
        })?;
        reports.push(inspect(display, &text));
    }

    if output.is_json() {
        output.json(&reports)?;
        return Ok(());
    }

    if reports.is_empty() {
        output.info("No editable files found")?;
        return Ok(());
    }
    for report in &reports {
        let mut details = vec![report.kind.to_string(), report.indent.clone()];
        if let Some(quote) = report.quote {
            details.push(format!("{quote} quotes"));
        }
        if let Some(semicolons) = report.semicolons {
            details.push(if semicolons { "semicolons" } else { "no semicolons" }.into());
        }
        let line = format!("{}  ({})", report.path, details.join(", "));
        match &report.error {
            Some(error) => output.warning(&format!("{line}: {error}"))?,
            None => output.print(&line)?,
        }
    }
    Ok(())
}

/// Files to inspect as `(display path, filesystem path)`.
fn targets(path: &Path, include_text: bool) -> CliResult<Vec<(String, PathBuf)>> {
    if path.is_file() {
        return Ok(vec![(path.display().to_string(), path.to_path_buf())]);
    }
    if !path.is_dir() {
        return Err(CliError::InvalidInput {
            message: format!("{} does not exist", path.display()),
            source: None,
        });
    }
    let files = ProjectScanner::new(path).include_text(include_text).scan()?;
    Ok(files
        .into_iter()
        .map(|file| (file.path.to_string(), path.join(&file.path)))
        .collect())
}

/// Parse `text` with the adapter for `path` and describe its conventions.
pub fn inspect(path: String, text: &str) -> FileReport {
    let kind = FileKind::from_path(&path);
    let mut report = FileReport {
        kind: kind.as_str(),
        indent: describe_indent(&infer_indent(text)),
        quote: None,
        semicolons: None,
        error: None,
        path,
    };

    let convention: Result<Option<Convention>, String> = match kind {
        FileKind::Script => ScriptTree::parse(text)
            .map(|tree| {
                report.semicolons = Some(tree.style().semicolons);
                Some(tree.convention().clone())
            })
            .map_err(|e| e.to_string()),
        FileKind::Stylesheet => Stylesheet::parse(text)
            .map(|sheet| Some(sheet.convention().clone()))
            .map_err(|e| e.to_string()),
        FileKind::Component => Component::parse(text)
            .map(|component| Some(component.convention().clone()))
            .map_err(|e| e.to_string()),
        FileKind::Json => JsonDocument::parse(text)
            .map(|doc| {
                Some(Convention {
                    indent: doc.indent().to_string(),
                    quote: None,
                })
            })
            .map_err(|e| e.to_string()),
        FileKind::Toml => TomlDocument::parse(text).map(|_| None).map_err(|e| e.to_string()),
        FileKind::Yaml => YamlDocument::parse(text).map(|_| None).map_err(|e| e.to_string()),
        FileKind::Text => Ok(None),
    };

    match convention {
        Ok(Some(convention)) => {
            report.indent = describe_indent(&convention.indent);
            report.quote = convention.quote.map(|q| q.as_str());
        }
        Ok(None) => {}
        Err(error) => report.error = Some(error),
    }
    report
}

fn describe_indent(unit: &str) -> String {
    match unit {
        "\t" => "tab".into(),
        spaces if !spaces.is_empty() && spaces.chars().all(|c| c == ' ') => {
            format!("{} spaces", spaces.len())
        }
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_conventions() {
        let report = inspect(
            "vite.config.ts".into(),
            "import a from \"a\"\n\nexport default {\n  plugins: [a()]\n}\n",
        );
        assert_eq!(report.kind, "script");
        assert_eq!(report.indent, "2 spaces");
        assert_eq!(report.quote, Some("double"));
        assert_eq!(report.semicolons, Some(false));
        assert_eq!(report.error, None);
    }

    #[test]
    fn json_reports_document_indent() {
        let report = inspect("package.json".into(), "{\n\t\"name\": \"app\"\n}\n");
        assert_eq!(report.indent, "tab");
        assert_eq!(report.quote, None);
    }

    #[test]
    fn parse_errors_are_reported_not_raised() {
        let report = inspect("package.json".into(), "{ \"a\": }");
        assert!(report.error.is_some());
    }

    #[test]
    fn indent_descriptions() {
        assert_eq!(describe_indent("\t"), "tab");
        assert_eq!(describe_indent("    "), "4 spaces");
    }
}
