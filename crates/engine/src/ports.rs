//! Capabilities the engine consumes from its host application.

use crate::Result;
use async_trait::async_trait;
use firstline_title::Frontmatter;
use std::sync::Arc;
use std::time::Duration;

/// File storage and metadata cache of the host.
///
/// Paths are vault-relative and use `/` separators.
#[async_trait]
pub trait VaultHost: Send + Sync {
    async fn read_content(&self, path: &str) -> Result<String>;

    async fn write_whole_file(&self, path: &str, content: &str) -> Result<()>;

    async fn rename_path(&self, old_path: &str, new_path: &str) -> Result<()>;

    async fn path_exists(&self, path: &str) -> Result<bool>;

    async fn list_markdown_files(&self) -> Result<Vec<String>>;

    /// Cached frontmatter of `path`; `None` when the host has no entry yet.
    async fn frontmatter(&self, path: &str) -> Result<Option<Frontmatter>>;
}

/// Editor surface: unsaved buffers of open notes.
pub trait EditorPort: Send + Sync {
    /// In-editor text for `path`, which may be ahead of the saved file.
    fn buffer_text(&self, path: &str) -> Option<String>;
}

/// Fire-and-forget user-visible messages.
pub trait Notifier: Send + Sync {
    fn notice(&self, message: &str, duration: Option<Duration>);
}

/// Alias bookkeeping after a rename; implemented outside the engine.
#[async_trait]
pub trait AliasSink: Send + Sync {
    async fn record_alias(&self, path: &str, previous_title: &str) -> Result<()>;
}

/// Editor port for hosts without an editor (CLI, batch tools).
pub struct NoEditor;

impl EditorPort for NoEditor {
    fn buffer_text(&self, _path: &str) -> Option<String> {
        None
    }
}

/// Notifier that forwards notices to the `log` facade under target `notice`.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notice(&self, message: &str, _duration: Option<Duration>) {
        log::info!(target: "notice", "{message}");
    }
}

pub struct NoAliases;

#[async_trait]
impl AliasSink for NoAliases {
    async fn record_alias(&self, _path: &str, _previous_title: &str) -> Result<()> {
        Ok(())
    }
}

/// Everything the engine talks to, bundled.
#[derive(Clone)]
pub struct Host {
    pub vault: Arc<dyn VaultHost>,
    pub editor: Arc<dyn EditorPort>,
    pub notifier: Arc<dyn Notifier>,
    pub aliases: Arc<dyn AliasSink>,
}

impl Host {
    pub fn new(vault: Arc<dyn VaultHost>) -> Self {
        Self {
            vault,
            editor: Arc::new(NoEditor),
            notifier: Arc::new(LogNotifier),
            aliases: Arc::new(NoAliases),
        }
    }

    #[must_use]
    pub fn with_editor(mut self, editor: Arc<dyn EditorPort>) -> Self {
        self.editor = editor;
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn with_aliases(mut self, aliases: Arc<dyn AliasSink>) -> Self {
        self.aliases = aliases;
        self
    }
}
