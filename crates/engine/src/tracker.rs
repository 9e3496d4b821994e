use crate::service::EditorEvent;
use std::collections::HashSet;

/// What the service should do for one editor event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerAction {
    /// Content changed; run it through the throttle.
    CheckContent {
        path: String,
        content: Option<String>,
    },
    /// The tab closed; a pending throttle must fire now.
    Flush(String),
    /// The note gained focus and rename-on-focus is on.
    FocusGained(String),
    GuardCreation(String),
    Rekey { old_path: String, new_path: String },
    Forget(String),
    Nothing,
}

/// Tracks open and active notes and turns raw editor events into actions.
#[derive(Debug, Default)]
pub struct EditorTracker {
    open: HashSet<String>,
    active: Option<String>,
}

impl EditorTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    #[must_use]
    pub fn is_open(&self, path: &str) -> bool {
        self.open.contains(path)
    }

    pub fn on_event(&mut self, event: EditorEvent, rename_on_focus: bool) -> TrackerAction {
        match event {
            EditorEvent::ContentChanged { path, content } => {
                TrackerAction::CheckContent { path, content }
            }
            EditorEvent::FocusChanged { path: None } => {
                self.active = None;
                TrackerAction::Nothing
            }
            EditorEvent::FocusChanged { path: Some(path) } => {
                if self.active.as_deref() == Some(path.as_str()) {
                    return TrackerAction::Nothing;
                }
                self.open.insert(path.clone());
                self.active = Some(path.clone());
                if rename_on_focus {
                    TrackerAction::FocusGained(path)
                } else {
                    TrackerAction::Nothing
                }
            }
            EditorEvent::TabClosed { path } => {
                self.open.remove(&path);
                if self.active.as_deref() == Some(path.as_str()) {
                    self.active = None;
                }
                TrackerAction::Flush(path)
            }
            EditorEvent::FileCreated { path } => TrackerAction::GuardCreation(path),
            EditorEvent::FileRenamed { old_path, new_path } => {
                if self.open.remove(&old_path) {
                    self.open.insert(new_path.clone());
                }
                if self.active.as_deref() == Some(old_path.as_str()) {
                    self.active = Some(new_path.clone());
                }
                TrackerAction::Rekey { old_path, new_path }
            }
            EditorEvent::FileDeleted { path } => {
                self.open.remove(&path);
                if self.active.as_deref() == Some(path.as_str()) {
                    self.active = None;
                }
                TrackerAction::Forget(path)
            }
        }
    }
}
