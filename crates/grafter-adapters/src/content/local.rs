//! Project directory adapter using std::fs.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use grafter_core::{
    application::{
        ApplicationError,
        ports::{ContentProvider, ContentSink},
    },
    domain::RelativePath,
    error::{GrafterError, GrafterResult},
};

/// Reads and writes files under a project root.
#[derive(Debug, Clone)]
pub struct LocalContent {
    root: PathBuf,
}

impl LocalContent {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &RelativePath) -> PathBuf {
        self.root.join(path)
    }
}

impl ContentProvider for LocalContent {
    fn read(&self, path: &RelativePath) -> GrafterResult<String> {
        match std::fs::read_to_string(self.resolve(path)) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(%path, "file does not exist yet, starting empty");
                Ok(String::new())
            }
            Err(e) => Err(unavailable(path, e)),
        }
    }

    fn exists(&self, path: &RelativePath) -> bool {
        self.resolve(path).is_file()
    }
}

impl ContentSink for LocalContent {
    fn write(&self, path: &RelativePath, content: &str) -> GrafterResult<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_failed(path, e))?;
        }
        std::fs::write(&full, content).map_err(|e| write_failed(path, e))?;
        debug!(%path, bytes = content.len(), "wrote file");
        Ok(())
    }
}

fn unavailable(path: &RelativePath, e: io::Error) -> GrafterError {
    ApplicationError::ContentUnavailable {
        path: path.to_string(),
        reason: e.to_string(),
    }
    .into()
}

fn write_failed(path: &RelativePath, e: io::Error) -> GrafterError {
    ApplicationError::WriteFailed {
        path: path.to_string(),
        reason: e.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rel(path: &str) -> RelativePath {
        RelativePath::try_new(path).unwrap()
    }

    #[test]
    fn missing_file_reads_empty() {
        let temp = TempDir::new().unwrap();
        let content = LocalContent::new(temp.path());
        assert_eq!(content.read(&rel("src/app.ts")).unwrap(), "");
        assert!(!content.exists(&rel("src/app.ts")));
    }

    #[test]
    fn write_creates_parent_directories() {
        let temp = TempDir::new().unwrap();
        let content = LocalContent::new(temp.path());
        content.write(&rel("src/lib/a.ts"), "export {};\n").unwrap();
        assert!(content.exists(&rel("src/lib/a.ts")));
        assert_eq!(content.read(&rel("src/lib/a.ts")).unwrap(), "export {};\n");
    }

    #[test]
    fn directory_in_the_way_is_unavailable() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("src/app.ts")).unwrap();
        let content = LocalContent::new(temp.path());
        let err = content.read(&rel("src/app.ts")).unwrap_err();
        assert!(matches!(
            err,
            GrafterError::Application(ApplicationError::ContentUnavailable { .. })
        ));
    }
}
