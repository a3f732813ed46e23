//! Project file discovery.
//!
//! Walks a project tree and reports every file grafter has an adapter for,
//! skipping dependency and build output directories.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};
use walkdir::{DirEntry, WalkDir};

use grafter_core::{
    application::{ApplicationError, FileKind},
    domain::RelativePath,
    error::GrafterResult,
};

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".svelte-kit",
    "target",
    "dist",
    "build",
    ".output",
];

/// One discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: RelativePath,
    pub kind: FileKind,
}

/// Lists editable files under a project root.
#[derive(Debug, Clone)]
pub struct ProjectScanner {
    root: PathBuf,
    include_text: bool,
}

impl ProjectScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include_text: false,
        }
    }

    /// Also report files without a structural adapter.
    pub fn include_text(mut self, include: bool) -> Self {
        self.include_text = include;
        self
    }

    /// Every matching file, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::ContentUnavailable`] when the root does
    /// not exist or the walk hits an unreadable directory.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn scan(&self) -> GrafterResult<Vec<ScannedFile>> {
        if !self.root.is_dir() {
            return Err(ApplicationError::ContentUnavailable {
                path: self.root.display().to_string(),
                reason: "not a directory".into(),
            }
            .into());
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_skipped(entry));

        for entry in walker {
            let entry = entry.map_err(|e| ApplicationError::ContentUnavailable {
                path: e
                    .path()
                    .unwrap_or(&self.root)
                    .display()
                    .to_string(),
                reason: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(path) = relative(&self.root, entry.path()) else {
                warn!(path = %entry.path().display(), "skipping file outside the project root");
                continue;
            };
            let kind = FileKind::from_path(&path);
            if kind == FileKind::Text && !self.include_text {
                continue;
            }
            files.push(ScannedFile { path, kind });
        }

        debug!(count = files.len(), "scanned project");
        Ok(files)
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn relative(root: &Path, path: &Path) -> Option<RelativePath> {
    let rel = path.strip_prefix(root).ok()?;
    RelativePath::try_new(rel).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project(files: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for file in files {
            let path = temp.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
        temp
    }

    fn paths(files: &[ScannedFile]) -> Vec<String> {
        files.iter().map(|f| f.path.to_string()).collect()
    }

    #[test]
    fn finds_adapted_files_and_skips_dependencies() {
        let temp = project(&[
            "package.json",
            "README.md",
            "src/app.css",
            "src/routes/+page.svelte",
            "node_modules/pkg/index.js",
            ".svelte-kit/types.d.ts",
            "vite.config.ts",
        ]);
        let files = ProjectScanner::new(temp.path()).scan().unwrap();
        let found = paths(&files);
        assert!(found.contains(&"package.json".to_string()));
        assert!(found.contains(&"vite.config.ts".to_string()));
        assert!(!found.iter().any(|p| p.contains("node_modules")));
        assert!(!found.iter().any(|p| p.contains(".svelte-kit")));
        assert!(!found.contains(&"README.md".to_string()));

        let page = files
            .iter()
            .find(|f| f.path.to_string().ends_with("+page.svelte"))
            .unwrap();
        assert_eq!(page.kind, FileKind::Component);
    }

    #[test]
    fn text_files_on_request() {
        let temp = project(&["README.md", ".env"]);
        let files = ProjectScanner::new(temp.path())
            .include_text(true)
            .scan()
            .unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.kind == FileKind::Text));
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = TempDir::new().unwrap();
        let result = ProjectScanner::new(temp.path().join("nope")).scan();
        assert!(result.is_err());
    }
}
