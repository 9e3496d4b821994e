use crate::gate::{self, GateDecision, GateInput};
use crate::lru::LruCache;
use crate::outcome::{BatchSummary, ProcessOptions, ProcessOutcome, SkipReason};
use crate::paths::{base_name, is_markdown, parent_dir};
use crate::ports::Host;
use crate::resolver::{resolve_path, ReservedPaths, Resolution};
use crate::Result;
use firstline_settings::RenameSettings;
use firstline_title::{derive_file_name, first_line, UNTITLED};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;

/// Quiet window after a file is created, so template plugins can finish
/// writing the initial content.
pub const CREATION_DELAY: Duration = Duration::from_millis(600);

const CONTENT_CACHE_CAPACITY: usize = 1000;
const SUMMARY_NOTICE: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct FileRenameState {
    /// First line of the latest observed change or processed content.
    last_first_line: Option<String>,
    throttle_deadline: Option<Instant>,
    creation_deadline: Option<Instant>,
    /// Operation holding the lock; survives rekeying by rename notifications.
    locked: Option<u64>,
    self_ref_notified: bool,
}

struct EngineState {
    files: HashMap<String, FileRenameState>,
    /// Content seen the last time each path was processed.
    content: LruCache<String, String>,
    reserved: ReservedPaths,
    next_op: u64,
}

/// What a content change did to the path's throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// No interval configured; check now.
    Immediate,
    Scheduled(Instant),
    /// A timer is already running and will pick up this change.
    Coalesced,
    /// The first line did not change since the last timer started.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueKind {
    Throttle,
    Creation,
}

/// A timer that has fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueCheck {
    pub path: String,
    pub kind: DueKind,
}

/// Owns every piece of per-session rename state.
///
/// All state sits behind one mutex that is never held across an await, so
/// rekeying on a rename notification is atomic with respect to the content
/// cache, the reservations and the timers.
pub struct RenameEngine {
    host: Host,
    settings: RwLock<Arc<RenameSettings>>,
    state: Mutex<EngineState>,
}

impl RenameEngine {
    #[must_use]
    pub fn new(host: Host, mut settings: RenameSettings) -> Self {
        settings.validate();
        Self {
            host,
            settings: RwLock::new(Arc::new(settings)),
            state: Mutex::new(EngineState {
                files: HashMap::new(),
                content: LruCache::new(CONTENT_CACHE_CAPACITY),
                reserved: ReservedPaths::new(),
                next_op: 0,
            }),
        }
    }

    #[must_use]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[must_use]
    pub fn settings(&self) -> Arc<RenameSettings> {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update_settings(&self, mut settings: RenameSettings) {
        settings.validate();
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(settings);
        debug!("rename settings updated");
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `content` as already processed, e.g. when a host starts up
    /// with existing notes.
    pub fn seed_content(&self, path: &str, content: &str) {
        let line = first_line(content, &self.settings());
        let mut state = self.lock_state();
        state.content.set(path.to_string(), content.to_string());
        state.files.entry(path.to_string()).or_default().last_first_line = line;
    }

    #[must_use]
    pub fn cached_content(&self, path: &str) -> Option<String> {
        self.lock_state().content.get(&path.to_string()).cloned()
    }

    /// Editor buffer when the editor has one, saved content otherwise.
    pub async fn current_content(&self, path: &str) -> Result<String> {
        match self.host.editor.buffer_text(path) {
            Some(text) => Ok(text),
            None => self.host.vault.read_content(path).await,
        }
    }

    /// Apply the throttle rules to a content change of `path`.
    pub fn note_content_change(&self, path: &str, content: &str, now: Instant) -> ThrottleDecision {
        let settings = self.settings();
        if settings.check_interval_ms == 0 {
            return ThrottleDecision::Immediate;
        }
        let line = first_line(content, &settings);

        let mut state = self.lock_state();
        let file = state.files.entry(path.to_string()).or_default();
        if file.throttle_deadline.is_some() {
            file.last_first_line = line;
            return ThrottleDecision::Coalesced;
        }
        if file.last_first_line == line {
            return ThrottleDecision::Unchanged;
        }
        let deadline = now + Duration::from_millis(settings.check_interval_ms);
        file.throttle_deadline = Some(deadline);
        file.last_first_line = line;
        debug!("throttling {path} for {}ms", settings.check_interval_ms);
        ThrottleDecision::Scheduled(deadline)
    }

    /// Returns whether a timer was pending. Cancelling twice is a no-op.
    pub fn cancel_throttle(&self, path: &str) -> bool {
        self.lock_state()
            .files
            .get_mut(path)
            .and_then(|file| file.throttle_deadline.take())
            .is_some()
    }

    #[must_use]
    pub fn has_pending_throttle(&self, path: &str) -> bool {
        self.lock_state()
            .files
            .get(path)
            .is_some_and(|file| file.throttle_deadline.is_some())
    }

    /// Start the creation-delay window for a new file.
    pub fn note_created(&self, path: &str, now: Instant) -> Instant {
        let deadline = now + CREATION_DELAY;
        self.lock_state()
            .files
            .entry(path.to_string())
            .or_default()
            .creation_deadline = Some(deadline);
        deadline
    }

    #[must_use]
    pub fn in_creation_delay(&self, path: &str) -> bool {
        self.lock_state()
            .files
            .get(path)
            .is_some_and(|file| file.creation_deadline.is_some())
    }

    /// Earliest pending throttle or creation deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.lock_state()
            .files
            .values()
            .flat_map(|file| [file.throttle_deadline, file.creation_deadline])
            .flatten()
            .min()
    }

    /// Clear and return every timer due at `now`.
    pub fn take_due(&self, now: Instant) -> Vec<DueCheck> {
        let mut state = self.lock_state();
        let mut due = Vec::new();
        for (path, file) in &mut state.files {
            if file.creation_deadline.is_some_and(|d| d <= now) {
                file.creation_deadline = None;
                due.push(DueCheck {
                    path: path.clone(),
                    kind: DueKind::Creation,
                });
            }
            if file.throttle_deadline.is_some_and(|d| d <= now) {
                file.throttle_deadline = None;
                due.push(DueCheck {
                    path: path.clone(),
                    kind: DueKind::Throttle,
                });
            }
        }
        due.sort_by(|a, b| a.path.cmp(&b.path));
        due
    }

    /// Move all state of `old_path` to `new_path`. The creation window of a
    /// renamed file is cancelled.
    pub fn handle_rename(&self, old_path: &str, new_path: &str) {
        let mut state = self.lock_state();
        if let Some(mut file) = state.files.remove(old_path) {
            file.creation_deadline = None;
            state.files.insert(new_path.to_string(), file);
        }
        if let Some(content) = state.content.delete(&old_path.to_string()) {
            state.content.set(new_path.to_string(), content);
        }
        state.reserved.rekey(old_path, new_path);
        debug!("rekeyed {old_path} -> {new_path}");
    }

    pub fn handle_delete(&self, path: &str) {
        let mut state = self.lock_state();
        state.files.remove(path);
        state.content.delete(&path.to_string());
        state.reserved.release(path);
        debug!("forgot {path}");
    }

    #[must_use]
    pub fn tracked_paths(&self) -> usize {
        self.lock_state().files.len()
    }

    /// Run the gate and, when it passes, rename `path` after its first line.
    ///
    /// Never returns an error: host failures are logged, shown as a notice
    /// and reported as [`ProcessOutcome::Failed`].
    pub async fn process_file(&self, path: &str, options: ProcessOptions) -> ProcessOutcome {
        self.process(path, options, false).await
    }

    /// Process every markdown file in the vault, one at a time.
    pub async fn rename_all(&self, options: ProcessOptions) -> Result<BatchSummary> {
        let paths = self.host.vault.list_markdown_files().await?;
        info!("renaming {} notes", paths.len());

        let mut summary = BatchSummary::default();
        for path in &paths {
            let outcome = self.process(path, options, true).await;
            summary.record(path, &outcome);
        }
        self.lock_state().reserved.clear();

        info!("{}", summary.headline());
        self.host
            .notifier
            .notice(&summary.headline(), Some(SUMMARY_NOTICE));
        Ok(summary)
    }

    async fn process(&self, path: &str, options: ProcessOptions, in_batch: bool) -> ProcessOutcome {
        if !is_markdown(path) {
            return ProcessOutcome::skipped(SkipReason::NotMarkdown);
        }
        let op = match self.try_lock(path, options) {
            Ok(op) => op,
            Err(reason) => return ProcessOutcome::skipped(reason),
        };

        let outcome = match self.run(path, options, in_batch).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("Failed to rename {path}: {err}");
                self.host
                    .notifier
                    .notice(&format!("Failed to rename {}: {err}", base_name(path)), None);
                ProcessOutcome::Failed {
                    error: err.to_string(),
                }
            }
        };

        self.unlock(op);
        outcome
    }

    fn try_lock(
        &self,
        path: &str,
        options: ProcessOptions,
    ) -> std::result::Result<u64, SkipReason> {
        let mut state = self.lock_state();
        let op = state.next_op + 1;
        let file = state.files.entry(path.to_string()).or_default();
        if !options.no_delay && file.creation_deadline.is_some() {
            debug!("{path} is in its creation window");
            return Err(SkipReason::CreationDelay);
        }
        if file.locked.is_some() {
            debug!("{path} is already being processed");
            return Err(SkipReason::Locked);
        }
        file.locked = Some(op);
        state.next_op = op;
        Ok(op)
    }

    fn unlock(&self, op: u64) {
        let mut state = self.lock_state();
        if let Some(file) = state
            .files
            .values_mut()
            .find(|file| file.locked == Some(op))
        {
            file.locked = None;
        }
    }

    async fn run(
        &self,
        path: &str,
        options: ProcessOptions,
        in_batch: bool,
    ) -> Result<ProcessOutcome> {
        let settings = self.settings();
        let content = self.current_content(path).await?;
        let cached_frontmatter = match self.host.vault.frontmatter(path).await {
            Ok(fm) => fm,
            Err(err) => {
                warn!("metadata lookup failed for {path}: {err}");
                None
            }
        };
        let previous = self.cached_content(path);

        let decision = gate::evaluate(
            &GateInput {
                path,
                content: &content,
                cached_frontmatter: cached_frontmatter.as_ref(),
                previous_content: previous.as_deref(),
            },
            &settings,
            &options,
        );
        self.remember_processed(path, &content, &settings);
        self.note_self_reference(path, &decision);

        let stem = match decision {
            GateDecision::Skip(reason) => {
                debug!("skipping {path}: {reason}");
                return Ok(ProcessOutcome::skipped(reason));
            }
            GateDecision::RenameToUntitled => UNTITLED.to_string(),
            GateDecision::Proceed { first_line } => derive_file_name(&first_line, &settings),
        };
        self.commit(path, &stem, in_batch).await
    }

    fn remember_processed(&self, path: &str, content: &str, settings: &RenameSettings) {
        let line = first_line(content, settings);
        let mut state = self.lock_state();
        state.content.set(path.to_string(), content.to_string());
        if let Some(file) = state.files.get_mut(path) {
            file.last_first_line = line;
        }
    }

    fn note_self_reference(&self, path: &str, decision: &GateDecision) {
        let blocked = *decision == GateDecision::Skip(SkipReason::SelfReferential);
        let notify = {
            let mut state = self.lock_state();
            let Some(file) = state.files.get_mut(path) else {
                return;
            };
            let first_block = blocked && !file.self_ref_notified;
            file.self_ref_notified = blocked;
            first_block
        };
        if notify {
            self.host.notifier.notice(
                &format!(
                    "Not renaming \"{}\": its first line links to the note itself",
                    base_name(path)
                ),
                None,
            );
        }
    }

    async fn commit(&self, path: &str, stem: &str, in_batch: bool) -> Result<ProcessOutcome> {
        let dir = parent_dir(path);
        let target = loop {
            let reserved = self.lock_state().reserved.clone();
            match resolve_path(stem, dir, path, self.host.vault.as_ref(), &reserved).await? {
                Resolution::SamePath => return Ok(ProcessOutcome::AlreadyNamed),
                Resolution::Target(target) => {
                    if self.lock_state().reserved.reserve(&target) {
                        break target;
                    }
                }
            }
        };

        let renamed = self.host.vault.rename_path(path, &target).await;
        if !in_batch || renamed.is_err() {
            self.lock_state().reserved.release(&target);
        }
        renamed?;

        info!("Renamed {path} -> {target}");
        self.handle_rename(path, &target);

        let old_title = base_name(path);
        if !old_title.starts_with(UNTITLED) {
            if let Err(err) = self.host.aliases.record_alias(&target, old_title).await {
                warn!("alias update failed for {target}: {err}");
            }
        }

        Ok(ProcessOutcome::Renamed {
            from: path.to_string(),
            to: target,
        })
    }
}
