//! In-memory content adapter for testing and dry runs.

use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

use grafter_core::{
    application::ports::{ContentProvider, ContentSink},
    domain::RelativePath,
    error::{GrafterError, GrafterResult},
};

/// Files held in memory. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryContent {
    files: Arc<RwLock<BTreeMap<RelativePath, String>>>,
}

impl MemoryContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file (testing helper).
    pub fn with_file(self, path: &str, content: &str) -> GrafterResult<Self> {
        let path = RelativePath::try_new(path)?;
        self.write(&path, content)?;
        Ok(self)
    }

    /// Read a file's content (testing helper).
    pub fn get(&self, path: &str) -> Option<String> {
        let path = RelativePath::try_new(path).ok()?;
        let files = self.files.read().ok()?;
        files.get(&path).cloned()
    }

    /// List all files.
    pub fn paths(&self) -> Vec<RelativePath> {
        self.files
            .read()
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }
}

fn poisoned() -> GrafterError {
    GrafterError::Internal {
        message: "in-memory content lock poisoned".into(),
    }
}

impl ContentProvider for MemoryContent {
    fn read(&self, path: &RelativePath) -> GrafterResult<String> {
        let files = self.files.read().map_err(|_| poisoned())?;
        Ok(files.get(path).cloned().unwrap_or_default())
    }

    fn exists(&self, path: &RelativePath) -> bool {
        self.files
            .read()
            .map(|files| files.contains_key(path))
            .unwrap_or(false)
    }
}

impl ContentSink for MemoryContent {
    fn write(&self, path: &RelativePath, content: &str) -> GrafterResult<()> {
        let mut files = self.files.write().map_err(|_| poisoned())?;
        files.insert(path.clone(), content.to_string());
        Ok(())
    }
}
