mod support;

use firstline_engine::memory::MemoryVault;
use firstline_engine::{
    EditorEvent, ProcessOutcome, RenameService, RenameUpdate, ServiceConfig, SkipReason, Trigger,
};
use firstline_settings::RenameSettings;
use std::time::Duration;
use support::Harness;
use tokio::sync::broadcast;
use tokio::time::timeout;

fn changed(path: &str) -> EditorEvent {
    EditorEvent::ContentChanged {
        path: path.to_string(),
        content: None,
    }
}

async fn next_update(rx: &mut broadcast::Receiver<RenameUpdate>) -> RenameUpdate {
    timeout(Duration::from_secs(60), rx.recv())
        .await
        .expect("update before timeout")
        .expect("update channel open")
}

async fn assert_quiet(rx: &mut broadcast::Receiver<RenameUpdate>) {
    assert!(
        timeout(Duration::from_secs(30), rx.recv()).await.is_err(),
        "unexpected extra update"
    );
}

fn throttled(ms: u64) -> RenameSettings {
    RenameSettings {
        check_interval_ms: ms,
        ..RenameSettings::default()
    }
}

#[tokio::test(start_paused = true)]
async fn edit_without_interval_renames_immediately() {
    let h = Harness::new(
        MemoryVault::new().with_file("Untitled.md", "Hello World"),
        RenameSettings::default(),
    );
    let service = RenameService::start(h.engine.clone(), ServiceConfig::default());
    let mut updates = service.subscribe_updates();

    service.send(changed("Untitled.md")).await.expect("send");

    let update = next_update(&mut updates).await;
    assert_eq!(update.trigger, Trigger::Edit);
    assert_eq!(update.outcome.new_path(), Some("Hello World.md"));
}

#[tokio::test(start_paused = true)]
async fn keystroke_burst_yields_one_throttled_rename() {
    let h = Harness::new(
        MemoryVault::new().with_file("Untitled.md", ""),
        throttled(1_000),
    );
    let service = RenameService::start(h.engine.clone(), ServiceConfig::default());
    let mut updates = service.subscribe_updates();

    for text in ["H", "He", "Hel", "Hello"] {
        h.vault.insert("Untitled.md", text);
        service.send(changed("Untitled.md")).await.expect("send");
    }

    let update = next_update(&mut updates).await;
    assert_eq!(update.trigger, Trigger::Throttle);
    assert_eq!(update.outcome.new_path(), Some("Hello.md"));
    assert_eq!(h.vault.renames().len(), 1);
    assert_quiet(&mut updates).await;
}

#[tokio::test(start_paused = true)]
async fn closing_the_tab_flushes_a_pending_throttle() {
    let h = Harness::new(
        MemoryVault::new().with_file("Untitled.md", "Meeting notes"),
        throttled(10_000),
    );
    let service = RenameService::start(h.engine.clone(), ServiceConfig::default());
    let mut updates = service.subscribe_updates();

    service.send(changed("Untitled.md")).await.expect("send");
    service
        .send(EditorEvent::TabClosed {
            path: "Untitled.md".into(),
        })
        .await
        .expect("send");

    let update = next_update(&mut updates).await;
    assert_eq!(update.trigger, Trigger::TabClose);
    assert_eq!(update.outcome.new_path(), Some("Meeting notes.md"));
    assert!(!h.engine.has_pending_throttle("Meeting notes.md"));
    assert_quiet(&mut updates).await;
}

#[tokio::test(start_paused = true)]
async fn new_files_wait_out_the_creation_delay() {
    let h = Harness::new(
        MemoryVault::new().with_file("Untitled.md", "Template title"),
        RenameSettings::default(),
    );
    let service = RenameService::start(h.engine.clone(), ServiceConfig::default());
    let mut updates = service.subscribe_updates();

    service
        .send(EditorEvent::FileCreated {
            path: "Untitled.md".into(),
        })
        .await
        .expect("send");
    service.send(changed("Untitled.md")).await.expect("send");

    let held = next_update(&mut updates).await;
    assert_eq!(
        held.outcome,
        ProcessOutcome::Skipped {
            reason: SkipReason::CreationDelay
        }
    );

    let fired = next_update(&mut updates).await;
    assert_eq!(fired.trigger, Trigger::Creation);
    assert_eq!(fired.outcome.new_path(), Some("Template title.md"));
}

#[tokio::test(start_paused = true)]
async fn focus_renames_when_enabled() {
    let settings = RenameSettings {
        rename_on_focus: true,
        ..RenameSettings::default()
    };
    let h = Harness::new(MemoryVault::new().with_file("a.md", "Focused"), settings);
    let service = RenameService::start(h.engine.clone(), ServiceConfig::default());
    let mut updates = service.subscribe_updates();

    let focus = EditorEvent::FocusChanged {
        path: Some("a.md".into()),
    };
    service.send(focus.clone()).await.expect("send");
    let update = next_update(&mut updates).await;
    assert_eq!(update.trigger, Trigger::Focus);
    assert_eq!(update.outcome.new_path(), Some("Focused.md"));

    service.send(focus).await.expect("send");
    assert_quiet(&mut updates).await;
}

#[tokio::test(start_paused = true)]
async fn host_rename_and_delete_events_move_state() {
    let h = Harness::new(MemoryVault::new(), RenameSettings::default());
    h.engine.seed_content("a.md", "A");
    let service = RenameService::start(h.engine.clone(), ServiceConfig::default());

    service
        .send(EditorEvent::FileRenamed {
            old_path: "a.md".into(),
            new_path: "b.md".into(),
        })
        .await
        .expect("send");
    service
        .send(EditorEvent::FileDeleted {
            path: "c.md".into(),
        })
        .await
        .expect("send");
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(h.engine.cached_content("a.md"), None);
    assert_eq!(h.engine.cached_content("b.md").as_deref(), Some("A"));

    service
        .send(EditorEvent::FileDeleted {
            path: "b.md".into(),
        })
        .await
        .expect("send");
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(h.engine.tracked_paths(), 0);
}
