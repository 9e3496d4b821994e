use async_trait::async_trait;
use firstline_engine::{is_markdown, EngineError, Result, VaultHost};
use firstline_title::Frontmatter;
use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};

/// Vault backed by a directory on disk.
///
/// Vault paths are relative to the root and always use `/`. Hidden
/// directories (`.obsidian`, `.git`, `.trash`) and ignored files are not
/// listed.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Open an existing directory, resolving it to an absolute path.
    pub fn open(root: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self::new(root.as_ref().canonicalize()?))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn absolute(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }

    /// Vault path of `path`, or `None` when it lies outside the root.
    #[must_use]
    pub fn relative(&self, path: &Path) -> Option<String> {
        let rest = path.strip_prefix(&self.root).ok()?;
        let mut parts = Vec::new();
        for component in rest.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str()?.to_string()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        (!parts.is_empty()).then(|| parts.join("/"))
    }

    /// Markdown files under the root, sorted.
    #[must_use]
    pub fn scan(&self) -> Vec<String> {
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true);

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("Skipping unreadable entry: {err}");
                    continue;
                }
            };
            let Some(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }
            if let Some(path) = self.relative(entry.path()).filter(|p| is_markdown(p)) {
                files.push(path);
            }
        }
        files.sort();
        files
    }
}

fn io_error(op: &'static str, path: &str, err: &std::io::Error) -> EngineError {
    EngineError::host(op, path, err.to_string())
}

#[async_trait]
impl VaultHost for FsVault {
    async fn read_content(&self, path: &str) -> Result<String> {
        tokio::fs::read_to_string(self.absolute(path))
            .await
            .map_err(|e| io_error("read", path, &e))
    }

    async fn write_whole_file(&self, path: &str, content: &str) -> Result<()> {
        tokio::fs::write(self.absolute(path), content)
            .await
            .map_err(|e| io_error("write", path, &e))
    }

    async fn rename_path(&self, old_path: &str, new_path: &str) -> Result<()> {
        let case_only = old_path.to_lowercase() == new_path.to_lowercase();
        if !case_only && self.path_exists(new_path).await? {
            return Err(EngineError::host("rename", new_path, "destination exists"));
        }
        tokio::fs::rename(self.absolute(old_path), self.absolute(new_path))
            .await
            .map_err(|e| io_error("rename", old_path, &e))
    }

    async fn path_exists(&self, path: &str) -> Result<bool> {
        tokio::fs::try_exists(self.absolute(path))
            .await
            .map_err(|e| io_error("stat", path, &e))
    }

    async fn list_markdown_files(&self) -> Result<Vec<String>> {
        let vault = self.clone();
        tokio::task::spawn_blocking(move || vault.scan())
            .await
            .map_err(|e| EngineError::Other(format!("vault scan failed: {e}")))
    }

    /// Plain directories carry no metadata cache; the gate parses the
    /// frontmatter from the content instead.
    async fn frontmatter(&self, _path: &str) -> Result<Option<Frontmatter>> {
        Ok(None)
    }
}
