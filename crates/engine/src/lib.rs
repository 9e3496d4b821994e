//! # Firstline Engine
//!
//! Decides when a note should be renamed after its first line, and does it.
//!
//! ## Architecture
//!
//! ```text
//! Host event (edit, focus, tab close, create, rename, delete)
//!     │
//!     ├──> EditorTracker: open/active notes, focus dedupe
//!     │
//!     ├──> RenameEngine timers
//!     │      ├─> throttle per path (coalesce, skip unchanged first line)
//!     │      └─> creation delay
//!     │
//!     └──> RenameEngine::process_file
//!            ├─> per-path lock
//!            ├─> gate (exclusions, disable property, safewords, self-reference, no-op)
//!            ├─> firstline_title::derive_file_name
//!            ├─> resolve_path (existing + reserved paths)
//!            └─> VaultHost::rename_path, rekey state, alias sink
//! ```
//!
//! The engine talks to its host only through the ports in [`ports`]. An
//! in-memory host lives in [`memory`].
//!
//! ## Example
//!
//! ```rust
//! use firstline_engine::{memory::MemoryVault, Host, ProcessOptions, RenameEngine};
//! use firstline_settings::RenameSettings;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let vault = Arc::new(MemoryVault::new().with_file("Untitled.md", "# Weekly review\n"));
//! let engine = RenameEngine::new(Host::new(vault.clone()), RenameSettings::default());
//!
//! let outcome = engine.process_file("Untitled.md", ProcessOptions::manual()).await;
//! assert_eq!(outcome.new_path(), Some("Weekly review.md"));
//! # }
//! ```

mod engine;
mod error;
mod gate;
mod lru;
pub mod memory;
mod outcome;
mod paths;
pub mod ports;
mod resolver;
mod service;
mod tracker;

pub use engine::{DueCheck, DueKind, RenameEngine, ThrottleDecision, CREATION_DELAY};
pub use error::{EngineError, Result};
pub use gate::{evaluate, references_self, GateDecision, GateInput};
pub use lru::LruCache;
pub use outcome::{BatchSummary, ProcessOptions, ProcessOutcome, SkipReason};
pub use paths::{base_name, is_markdown, parent_dir};
pub use ports::{
    AliasSink, EditorPort, Host, LogNotifier, NoAliases, NoEditor, Notifier, VaultHost,
};
pub use resolver::{resolve_path, ReservedPaths, Resolution};
pub use service::{EditorEvent, RenameService, RenameUpdate, ServiceConfig, Trigger};
pub use tracker::{EditorTracker, TrackerAction};
