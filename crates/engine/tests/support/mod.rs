#![allow(dead_code)]

use async_trait::async_trait;
use firstline_engine::memory::MemoryVault;
use firstline_engine::{AliasSink, EditorPort, Host, Notifier, RenameEngine, Result};
use firstline_settings::RenameSettings;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notice(&self, message: &str, _duration: Option<Duration>) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
pub struct RecordingAliases {
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingAliases {
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AliasSink for RecordingAliases {
    async fn record_alias(&self, path: &str, previous_title: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((path.to_string(), previous_title.to_string()));
        Ok(())
    }
}

/// Editor whose buffers run ahead of the vault.
#[derive(Default)]
pub struct FakeEditor {
    buffers: Mutex<HashMap<String, String>>,
}

impl FakeEditor {
    pub fn type_text(&self, path: &str, text: &str) {
        self.buffers
            .lock()
            .unwrap()
            .insert(path.to_string(), text.to_string());
    }
}

impl EditorPort for FakeEditor {
    fn buffer_text(&self, path: &str) -> Option<String> {
        self.buffers.lock().unwrap().get(path).cloned()
    }
}

pub struct Harness {
    pub vault: Arc<MemoryVault>,
    pub notifier: Arc<RecordingNotifier>,
    pub aliases: Arc<RecordingAliases>,
    pub engine: Arc<RenameEngine>,
}

impl Harness {
    pub fn new(vault: MemoryVault, settings: RenameSettings) -> Self {
        let vault = Arc::new(vault);
        let notifier = Arc::new(RecordingNotifier::default());
        let aliases = Arc::new(RecordingAliases::default());
        let host = Host::new(vault.clone())
            .with_notifier(notifier.clone())
            .with_aliases(aliases.clone());
        Self {
            engine: Arc::new(RenameEngine::new(host, settings)),
            vault,
            notifier,
            aliases,
        }
    }
}
