use crate::fs_host::FsVault;
use anyhow::{Context, Result};
use firstline_engine::{
    is_markdown, EditorEvent, ProcessOutcome, RenameEngine, RenameService, RenameUpdate,
    ServiceConfig, VaultHost,
};
use log::{debug, info, warn};
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Watch the vault and rename notes as they change, until Ctrl-C.
pub async fn run(vault: Arc<FsVault>, engine: Arc<RenameEngine>) -> Result<()> {
    let seeded = seed_existing(&vault, &engine).await?;
    info!("Watching {} ({seeded} notes)", vault.root().display());

    let service = RenameService::start(engine, ServiceConfig::default());
    let mut updates = service.subscribe_updates();

    let (event_tx, mut event_rx) = mpsc::channel(1024);
    let _watcher = create_fs_watcher(vault.root(), event_tx)?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(event) = event_rx.recv() => {
                match event {
                    Ok(event) => {
                        for editor_event in translate_event(&vault, &event) {
                            service
                                .send(editor_event)
                                .await
                                .context("rename service stopped")?;
                        }
                    }
                    Err(err) => warn!("Watcher error: {err}"),
                }
            }
            update = updates.recv() => {
                match update {
                    Ok(update) => report(&update),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("Missed {missed} rename updates");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = &mut shutdown => {
                info!("Stopping watcher");
                break;
            }
        }
    }
    Ok(())
}

/// Record current content so that edits are compared against what is on
/// disk now, not against nothing.
async fn seed_existing(vault: &FsVault, engine: &RenameEngine) -> Result<usize> {
    let paths = vault
        .list_markdown_files()
        .await
        .context("Failed to list notes")?;
    for path in &paths {
        match vault.read_content(path).await {
            Ok(content) => engine.seed_content(path, &content),
            Err(err) => warn!("Cannot read {path}: {err}"),
        }
    }
    Ok(paths.len())
}

fn create_fs_watcher(
    root: &Path,
    sender: mpsc::Sender<notify::Result<Event>>,
) -> Result<RecommendedWatcher> {
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = sender.blocking_send(res);
        },
        NotifyConfig::default(),
    )
    .context("watcher init failed")?;
    watcher
        .watch(root, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {}", root.display()))?;
    Ok(watcher)
}

/// Map a raw file system event onto editor events for markdown notes.
///
/// Inotify reports a rename as `From`, `To` and finally `Both`; only `Both`
/// rekeys, `To` alone means a note moved into the vault.
#[must_use]
pub fn translate_event(vault: &FsVault, event: &Event) -> Vec<EditorEvent> {
    let notes: Vec<String> = event
        .paths
        .iter()
        .filter_map(|path| vault.relative(path))
        .filter(|path| is_markdown(path))
        .collect();

    match event.kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => notes
            .into_iter()
            .map(|path| EditorEvent::FileCreated { path })
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let old = event.paths.first().and_then(|p| vault.relative(p));
            let new = event.paths.get(1).and_then(|p| vault.relative(p));
            match (old, new) {
                (Some(old_path), Some(new_path))
                    if is_markdown(&old_path) && is_markdown(&new_path) =>
                {
                    vec![EditorEvent::FileRenamed { old_path, new_path }]
                }
                (Some(path), _) if is_markdown(&path) => vec![EditorEvent::FileDeleted { path }],
                (_, Some(path)) if is_markdown(&path) => vec![EditorEvent::FileCreated { path }],
                _ => Vec::new(),
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Vec::new(),
        EventKind::Modify(ModifyKind::Name(_)) => notes
            .into_iter()
            .map(|path| {
                if vault.absolute(&path).exists() {
                    EditorEvent::FileCreated { path }
                } else {
                    EditorEvent::FileDeleted { path }
                }
            })
            .collect(),
        EventKind::Modify(_) => notes
            .into_iter()
            .map(|path| EditorEvent::ContentChanged {
                path,
                content: None,
            })
            .collect(),
        EventKind::Remove(_) => notes
            .into_iter()
            .map(|path| EditorEvent::FileDeleted { path })
            .collect(),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

fn report(update: &RenameUpdate) {
    match &update.outcome {
        ProcessOutcome::Renamed { from, to } => println!("{from} -> {to}"),
        ProcessOutcome::AlreadyNamed => debug!("{} already named", update.path),
        ProcessOutcome::Skipped { reason } => debug!("{} skipped: {reason}", update.path),
        ProcessOutcome::Failed { error } => warn!("{} failed: {error}", update.path),
    }
}
