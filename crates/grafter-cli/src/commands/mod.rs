//! Command handlers.
//!
//! Each handler translates arguments into engine calls and renders the
//! result. Commands that write files share [`run_plan`].

pub mod apply;
pub mod completions;
pub mod config;
pub mod edit;
pub mod init;
pub mod inspect;

use serde::Serialize;
use tracing::{info, instrument};

use grafter_adapters::LocalContent;
use grafter_core::application::{EditPlan, EditReport, EditService, FailurePolicy, FileStatus};

use crate::{
    cli::EditArgs,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Apply `plan` to the project under `edit.root` and print the report.
#[instrument(skip_all, fields(root = %edit.root.display(), edits = plan.len()))]
pub fn run_plan(
    plan: &EditPlan,
    edit: &EditArgs,
    config: &AppConfig,
    policy: FailurePolicy,
    output: &OutputManager,
) -> CliResult<EditReport> {
    if !edit.root.is_dir() {
        return Err(CliError::InvalidInput {
            message: format!("project root {} is not a directory", edit.root.display()),
            source: None,
        });
    }

    let dry_run = edit.dry_run || config.edits.dry_run;
    let content = LocalContent::new(&edit.root);
    let service = EditService::new(Box::new(content.clone()), Box::new(content))
        .with_policy(policy)
        .dry_run(dry_run);

    let report = service.apply(plan)?;
    info!(changed = report.changed().count(), dry_run, "plan finished");
    render_report(&report, dry_run, output)?;
    Ok(report)
}

#[derive(Debug, Serialize)]
struct ReportView<'a> {
    dry_run: bool,
    files: Vec<FileView<'a>>,
    failures: Vec<FailureView>,
}

#[derive(Debug, Serialize)]
struct FileView<'a> {
    path: String,
    kind: &'static str,
    status: &'static str,
    addons: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct FailureView {
    addon: Option<String>,
    message: String,
}

fn status_str(status: FileStatus) -> &'static str {
    match status {
        FileStatus::Created => "created",
        FileStatus::Modified => "modified",
        FileStatus::Unchanged => "unchanged",
    }
}

fn render_report(report: &EditReport, dry_run: bool, output: &OutputManager) -> CliResult<()> {
    if output.is_json() {
        let view = ReportView {
            dry_run,
            files: report
                .files
                .iter()
                .map(|file| FileView {
                    path: file.path.to_string(),
                    kind: file.kind.as_str(),
                    status: status_str(file.status),
                    addons: &file.addons,
                    content: (dry_run && file.status != FileStatus::Unchanged)
                        .then_some(file.content.as_str()),
                })
                .collect(),
            failures: report
                .failures
                .iter()
                .map(|failure| FailureView {
                    addon: failure.addon().map(str::to_string),
                    message: failure.to_string(),
                })
                .collect(),
        };
        output.json(&view)?;
        return Ok(());
    }

    for file in &report.files {
        let line = format!("{} {}", status_str(file.status), file.path);
        match file.status {
            FileStatus::Unchanged => output.dim(&format!("  {line}"))?,
            _ => output.success(&line)?,
        }
        if dry_run && file.status != FileStatus::Unchanged {
            output.header(&format!("--- {} ---", file.path))?;
            output.print(file.content.trim_end_matches('\n'))?;
        }
    }
    for failure in &report.failures {
        output.warning(&failure.to_string())?;
    }

    let changed = report.changed().count();
    let summary = match (dry_run, changed) {
        (true, 0) => "Dry run: nothing would change".to_string(),
        (true, n) => format!("Dry run: {n} file(s) would change, nothing written"),
        (false, 0) => "Nothing to do, every edit was already applied".to_string(),
        (false, n) => format!("{n} file(s) updated"),
    };
    output.info(&summary)?;
    Ok(())
}
