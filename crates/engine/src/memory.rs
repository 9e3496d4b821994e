//! In-memory vault for embedding hosts and tests.

use crate::paths::is_markdown;
use crate::ports::VaultHost;
use crate::{EngineError, Result};
use async_trait::async_trait;
use firstline_title::Frontmatter;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryVault {
    files: Mutex<BTreeMap<String, String>>,
    failing_renames: Mutex<HashSet<String>>,
    rename_log: Mutex<Vec<(String, String)>>,
}

impl MemoryVault {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&self, path: &str, content: &str) {
        lock(&self.files).insert(path.to_string(), content.to_string());
    }

    pub fn remove(&self, path: &str) -> Option<String> {
        lock(&self.files).remove(path)
    }

    #[must_use]
    pub fn content(&self, path: &str) -> Option<String> {
        lock(&self.files).get(path).cloned()
    }

    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        lock(&self.files).keys().cloned().collect()
    }

    /// Every successful rename, in commit order.
    #[must_use]
    pub fn renames(&self) -> Vec<(String, String)> {
        lock(&self.rename_log).clone()
    }

    /// Make renames of `path` fail with a host error.
    pub fn fail_renames_of(&self, path: &str) {
        lock(&self.failing_renames).insert(path.to_string());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl VaultHost for MemoryVault {
    async fn read_content(&self, path: &str) -> Result<String> {
        self.content(path)
            .ok_or_else(|| EngineError::host("read", path, "no such file"))
    }

    async fn write_whole_file(&self, path: &str, content: &str) -> Result<()> {
        self.insert(path, content);
        Ok(())
    }

    async fn rename_path(&self, old_path: &str, new_path: &str) -> Result<()> {
        if lock(&self.failing_renames).contains(old_path) {
            return Err(EngineError::host("rename", old_path, "simulated failure"));
        }
        let mut files = lock(&self.files);
        if files.contains_key(new_path) {
            return Err(EngineError::host("rename", new_path, "destination exists"));
        }
        let content = files
            .remove(old_path)
            .ok_or_else(|| EngineError::host("rename", old_path, "no such file"))?;
        files.insert(new_path.to_string(), content);
        drop(files);
        lock(&self.rename_log).push((old_path.to_string(), new_path.to_string()));
        Ok(())
    }

    async fn path_exists(&self, path: &str) -> Result<bool> {
        Ok(lock(&self.files).contains_key(path))
    }

    async fn list_markdown_files(&self) -> Result<Vec<String>> {
        Ok(lock(&self.files)
            .keys()
            .filter(|path| is_markdown(path))
            .cloned()
            .collect())
    }

    async fn frontmatter(&self, path: &str) -> Result<Option<Frontmatter>> {
        Ok(self
            .content(path)
            .map(|content| firstline_title::frontmatter(&content)))
    }
}
