//! Edit Service - applies a plan of file edits.
//!
//! Edits run in registration order. Each edit sees the latest content of its
//! file, so two addons touching the same file compose instead of racing.
//! Every write is final: a failing edit never undoes earlier writes.

use std::collections::BTreeMap;

use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        edits::{EditPlan, FileEdit, FileKind, Signals},
        ports::{ContentProvider, ContentSink},
    },
    domain::RelativePath,
    error::GrafterResult,
};

/// What to do when one addon's edit fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the whole run and return the error.
    #[default]
    Abort,
    /// Skip the rest of the failing addon's edits and keep going.
    SkipAddon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Created,
    Modified,
    Unchanged,
}

/// Final state of one touched file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub path: RelativePath,
    pub kind: FileKind,
    pub status: FileStatus,
    /// Addons whose edits ran on this file, in order.
    pub addons: Vec<String>,
    pub content: String,
}

/// Result of applying a plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditReport {
    pub files: Vec<FileOutcome>,
    /// Edits that failed under [`FailurePolicy::SkipAddon`].
    pub failures: Vec<ApplicationError>,
    /// Signals each addon left behind, keyed by addon.
    pub signals: BTreeMap<String, Signals>,
}

impl EditReport {
    pub fn changed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.status != FileStatus::Unchanged)
    }

    pub fn unchanged(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.status == FileStatus::Unchanged)
    }

    pub fn file(&self, path: &str) -> Option<&FileOutcome> {
        self.files.iter().find(|f| f.path.as_path().to_str() == Some(path))
    }
}

struct Tracked {
    existed: bool,
    original: String,
    current: String,
    addons: Vec<String>,
}

/// Applies edit plans through the content ports.
pub struct EditService {
    provider: Box<dyn ContentProvider>,
    sink: Box<dyn ContentSink>,
    policy: FailurePolicy,
    dry_run: bool,
}

impl EditService {
    pub fn new(provider: Box<dyn ContentProvider>, sink: Box<dyn ContentSink>) -> Self {
        Self {
            provider,
            sink,
            policy: FailurePolicy::default(),
            dry_run: false,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Compute the report without writing anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[instrument(skip_all, fields(edits = plan.len(), dry_run = self.dry_run))]
    pub fn apply(&self, plan: &EditPlan) -> GrafterResult<EditReport> {
        let mut tracked: Vec<(RelativePath, Tracked)> = Vec::new();
        let mut report = EditReport::default();
        let mut failed: Vec<String> = Vec::new();

        for edit in plan.edits() {
            if failed.contains(&edit.addon) {
                debug!(addon = %edit.addon, path = %edit.path, "skipping edit of failed addon");
                continue;
            }

            let index = match tracked.iter().position(|(path, _)| *path == edit.path) {
                Some(index) => index,
                None => {
                    let existed = self.provider.exists(&edit.path);
                    tracked.push((
                        edit.path.clone(),
                        Tracked {
                            existed,
                            original: String::new(),
                            current: String::new(),
                            addons: Vec::new(),
                        },
                    ));
                    tracked.len() - 1
                }
            };

            let current = self.current_content(&edit.path, &tracked[index].1)?;
            if tracked[index].1.addons.is_empty() {
                tracked[index].1.original = current.clone();
            }

            let signals = report.signals.entry(edit.addon.clone()).or_default();
            match self.run(edit, &current, signals) {
                Ok(updated) => {
                    let entry = &mut tracked[index].1;
                    entry.addons.push(edit.addon.clone());
                    if updated != current && !self.dry_run {
                        self.sink.write(&edit.path, &updated)?;
                    }
                    entry.current = updated;
                }
                Err(err) if self.policy == FailurePolicy::SkipAddon => {
                    warn!(error = %err, "edit failed, skipping the rest of the addon");
                    failed.push(edit.addon.clone());
                    report.failures.push(err);
                }
                Err(err) => return Err(err.into()),
            }
        }

        report.files = tracked
            .into_iter()
            .filter(|(_, t)| !t.addons.is_empty())
            .map(|(path, t)| {
                let status = if t.current == t.original {
                    FileStatus::Unchanged
                } else if t.existed {
                    FileStatus::Modified
                } else {
                    FileStatus::Created
                };
                FileOutcome {
                    kind: FileKind::from_path(&path),
                    path,
                    status,
                    addons: t.addons,
                    content: t.current,
                }
            })
            .collect();

        info!(
            changed = report.changed().count(),
            unchanged = report.unchanged().count(),
            failures = report.failures.len(),
            "edit plan applied"
        );
        Ok(report)
    }

    /// Latest content of a file. Without a dry run the file is re-read from
    /// the provider, which already holds the previous edit's write.
    fn current_content(&self, path: &RelativePath, tracked: &Tracked) -> GrafterResult<String> {
        if self.dry_run && !tracked.addons.is_empty() {
            return Ok(tracked.current.clone());
        }
        self.provider.read(path)
    }

    fn run(&self, edit: &FileEdit, content: &str, signals: &mut Signals) -> Result<String, ApplicationError> {
        debug!(addon = %edit.addon, path = %edit.path, kind = %edit.kind(), "running edit");
        edit.apply(content, signals)
            .map_err(|source| ApplicationError::EditFailed {
                addon: edit.addon.clone(),
                path: edit.path.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::edits::edit_script;
    use crate::application::ports::{MockContentProvider, MockContentSink};
    use crate::domain::DomainError;
    use crate::domain::script::ops::imports::add_default;
    use crate::error::GrafterError;

    fn provider_with(content: &'static str) -> MockContentProvider {
        let mut provider = MockContentProvider::new();
        provider.expect_exists().return_const(!content.is_empty());
        provider
            .expect_read()
            .returning(move |_| Ok(content.to_string()));
        provider
    }

    fn import_plan(addon: &str, from: &'static str, local: &'static str) -> EditPlan {
        let mut plan = EditPlan::new();
        plan.register_file_edit(addon, "src/app.ts", move |content| {
            edit_script(content, |tree| {
                add_default(&mut tree.program, from, local);
                Ok(())
            })
        })
        .unwrap();
        plan
    }

    #[test]
    fn changed_file_is_written_once() {
        let provider = provider_with("run();\n");
        let mut sink = MockContentSink::new();
        sink.expect_write()
            .withf(|_, content| content == "import a from 'a';\n\nrun();\n")
            .times(1)
            .returning(|_, _| Ok(()));

        let service = EditService::new(Box::new(provider), Box::new(sink));
        let report = service.apply(&import_plan("a", "a", "a")).unwrap();
        let file = report.file("src/app.ts").unwrap();
        assert_eq!(file.status, FileStatus::Modified);
        assert_eq!(file.kind, FileKind::Script);
        assert_eq!(file.addons, ["a"]);
    }

    #[test]
    fn unchanged_file_is_not_written() {
        let provider = provider_with("import a from 'a';\n");
        let mut sink = MockContentSink::new();
        sink.expect_write().never();

        let service = EditService::new(Box::new(provider), Box::new(sink));
        let report = service.apply(&import_plan("a", "a", "a")).unwrap();
        assert_eq!(report.unchanged().count(), 1);
        assert_eq!(report.changed().count(), 0);
    }

    #[test]
    fn dry_run_chains_edits_in_memory() {
        let provider = provider_with("");
        let mut sink = MockContentSink::new();
        sink.expect_write().never();

        let mut plan = import_plan("a", "a", "a");
        plan.register_file_edit("b", "src/app.ts", |content| {
            edit_script(content, |tree| {
                add_default(&mut tree.program, "b", "b");
                Ok(())
            })
        })
        .unwrap();

        let service = EditService::new(Box::new(provider), Box::new(sink)).dry_run(true);
        let report = service.apply(&plan).unwrap();
        let file = report.file("src/app.ts").unwrap();
        assert_eq!(file.status, FileStatus::Created);
        assert_eq!(file.content, "import b from 'b';\nimport a from 'a';\n");
        assert_eq!(file.addons, ["a", "b"]);
    }

    fn failing_plan() -> EditPlan {
        let mut plan = EditPlan::new();
        plan.register_file_edit("broken", "a.ts", |_| {
            Err(DomainError::shape("a default export", "none"))
        })
        .unwrap()
        .register_file_edit("broken", "b.ts", |c| Ok(format!("{c}x")))
        .unwrap()
        .register_file_edit("fine", "c.ts", |c| Ok(format!("{c}y")))
        .unwrap();
        plan
    }

    #[test]
    fn failure_names_addon_and_file() {
        let service = EditService::new(Box::new(provider_with("")), Box::new(MockContentSink::new()));
        let err = service.apply(&failing_plan()).unwrap_err();
        match err {
            GrafterError::Application(ApplicationError::EditFailed { addon, path, .. }) => {
                assert_eq!(addon, "broken");
                assert_eq!(path, "a.ts");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn skip_policy_keeps_other_addons() {
        let mut sink = MockContentSink::new();
        sink.expect_write()
            .withf(|path, _| path.to_string() == "c.ts")
            .times(1)
            .returning(|_, _| Ok(()));
        let service = EditService::new(Box::new(provider_with("")), Box::new(sink))
            .with_policy(FailurePolicy::SkipAddon);
        let report = service.apply(&failing_plan()).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].addon(), Some("broken"));
        assert!(report.file("b.ts").is_none());
        assert_eq!(report.file("c.ts").unwrap().status, FileStatus::Created);
    }

    #[test]
    fn signals_flow_between_edits_of_one_addon() {
        let mut plan = EditPlan::new();
        plan.register_file_edit_with("db", "package.json", |content, signals| {
            if content.contains("\"drizzle-orm\"") {
                signals.insert("orm".into(), "drizzle".into());
            }
            Ok(content.to_string())
        })
        .unwrap();
        let mut provider = MockContentProvider::new();
        provider.expect_exists().return_const(true);
        provider
            .expect_read()
            .returning(|_| Ok("{ \"dependencies\": { \"drizzle-orm\": \"1\" } }".into()));
        let service = EditService::new(Box::new(provider), Box::new(MockContentSink::new()));
        let report = service.apply(&plan).unwrap();
        assert_eq!(report.signals["db"].get("orm").map(String::as_str), Some("drizzle"));
    }
}
