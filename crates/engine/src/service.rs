use crate::engine::{DueKind, RenameEngine, ThrottleDecision};
use crate::outcome::{ProcessOptions, ProcessOutcome};
use crate::tracker::{EditorTracker, TrackerAction};
use crate::{EngineError, Result};
use log::{debug, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Instant};

/// Host events the service reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// `content` is the editor buffer when the host has it; otherwise the
    /// service reads the note itself.
    ContentChanged {
        path: String,
        content: Option<String>,
    },
    FocusChanged {
        path: Option<String>,
    },
    TabClosed {
        path: String,
    },
    FileCreated {
        path: String,
    },
    FileRenamed {
        old_path: String,
        new_path: String,
    },
    FileDeleted {
        path: String,
    },
}

/// What made the service process a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trigger {
    Edit,
    Throttle,
    TabClose,
    Focus,
    Creation,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenameUpdate {
    pub path: String,
    pub trigger: Trigger,
    pub outcome: ProcessOutcome,
    pub completed_at: SystemTime,
}

#[derive(Debug, Clone, Copy)]
pub struct ServiceConfig {
    pub command_capacity: usize,
    pub update_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            command_capacity: 256,
            update_capacity: 64,
        }
    }
}

/// Event loop driving a [`RenameEngine`] from editor events and timers.
///
/// Clones share the loop; it stops when the last handle is dropped.
#[derive(Clone)]
pub struct RenameService {
    inner: Arc<RenameServiceInner>,
}

struct RenameServiceInner {
    engine: Arc<RenameEngine>,
    command_tx: mpsc::Sender<ServiceCommand>,
    update_tx: broadcast::Sender<RenameUpdate>,
}

enum ServiceCommand {
    Event(EditorEvent),
    Shutdown,
}

impl RenameService {
    /// Spawn the loop on the current tokio runtime.
    #[must_use]
    pub fn start(engine: Arc<RenameEngine>, config: ServiceConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity.max(1));
        let (update_tx, _) = broadcast::channel(config.update_capacity.max(1));

        spawn_event_loop(engine.clone(), command_rx, update_tx.clone());

        Self {
            inner: Arc::new(RenameServiceInner {
                engine,
                command_tx,
                update_tx,
            }),
        }
    }

    pub async fn send(&self, event: EditorEvent) -> Result<()> {
        self.inner
            .command_tx
            .send(ServiceCommand::Event(event))
            .await
            .map_err(|e| EngineError::Other(format!("failed to send editor event: {e}")))
    }

    #[must_use]
    pub fn subscribe_updates(&self) -> broadcast::Receiver<RenameUpdate> {
        self.inner.update_tx.subscribe()
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<RenameEngine> {
        &self.inner.engine
    }
}

impl Drop for RenameService {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            let _ = self.inner.command_tx.try_send(ServiceCommand::Shutdown);
        }
    }
}

fn spawn_event_loop(
    engine: Arc<RenameEngine>,
    mut command_rx: mpsc::Receiver<ServiceCommand>,
    update_tx: broadcast::Sender<RenameUpdate>,
) {
    tokio::spawn(async move {
        let mut tracker = EditorTracker::new();

        loop {
            let next_deadline = engine.next_deadline();

            tokio::select! {
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(ServiceCommand::Event(event)) => {
                            handle_event(&engine, &mut tracker, event, &update_tx).await;
                        }
                        Some(ServiceCommand::Shutdown) | None => break,
                    }
                }
                () = async {
                    if let Some(deadline) = next_deadline {
                        time::sleep_until(deadline).await;
                    }
                }, if next_deadline.is_some() => {
                    for due in engine.take_due(Instant::now()) {
                        let trigger = match due.kind {
                            DueKind::Throttle => Trigger::Throttle,
                            DueKind::Creation => Trigger::Creation,
                        };
                        spawn_process(
                            &engine,
                            due.path,
                            trigger,
                            ProcessOptions::on_edit(),
                            &update_tx,
                        );
                    }
                }
            }
        }
        debug!("rename service stopped");
    });
}

async fn handle_event(
    engine: &Arc<RenameEngine>,
    tracker: &mut EditorTracker,
    event: EditorEvent,
    update_tx: &broadcast::Sender<RenameUpdate>,
) {
    let rename_on_focus = engine.settings().rename_on_focus;
    match tracker.on_event(event, rename_on_focus) {
        TrackerAction::CheckContent { path, content } => {
            let content = match content {
                Some(content) => content,
                None => match engine.current_content(&path).await {
                    Ok(content) => content,
                    Err(err) => {
                        warn!("cannot read {path} after change: {err}");
                        return;
                    }
                },
            };
            match engine.note_content_change(&path, &content, Instant::now()) {
                ThrottleDecision::Immediate => {
                    spawn_process(
                        engine,
                        path,
                        Trigger::Edit,
                        ProcessOptions::on_edit(),
                        update_tx,
                    );
                }
                ThrottleDecision::Scheduled(_)
                | ThrottleDecision::Coalesced
                | ThrottleDecision::Unchanged => {}
            }
        }
        TrackerAction::Flush(path) => {
            if engine.cancel_throttle(&path) {
                spawn_process(
                    engine,
                    path,
                    Trigger::TabClose,
                    ProcessOptions::on_edit(),
                    update_tx,
                );
            }
        }
        TrackerAction::FocusGained(path) => {
            if engine.has_pending_throttle(&path) {
                debug!("focus on {path} deferred to its pending throttle");
            } else {
                let options = ProcessOptions {
                    skip_unchanged: false,
                    ..ProcessOptions::on_edit()
                };
                spawn_process(engine, path, Trigger::Focus, options, update_tx);
            }
        }
        TrackerAction::GuardCreation(path) => {
            engine.note_created(&path, Instant::now());
        }
        TrackerAction::Rekey { old_path, new_path } => {
            engine.handle_rename(&old_path, &new_path);
        }
        TrackerAction::Forget(path) => engine.handle_delete(&path),
        TrackerAction::Nothing => {}
    }
}

fn spawn_process(
    engine: &Arc<RenameEngine>,
    path: String,
    trigger: Trigger,
    options: ProcessOptions,
    update_tx: &broadcast::Sender<RenameUpdate>,
) {
    let engine = engine.clone();
    let update_tx = update_tx.clone();
    tokio::spawn(async move {
        let outcome = engine.process_file(&path, options).await;
        let _ = update_tx.send(RenameUpdate {
            path,
            trigger,
            outcome,
            completed_at: SystemTime::now(),
        });
    });
}
