mod support;

use firstline_engine::memory::MemoryVault;
use firstline_engine::{Host, ProcessOptions, ProcessOutcome, RenameEngine, SkipReason};
use firstline_settings::{CustomReplacement, ForbiddenChar, RenameSettings, Safeword};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use support::{FakeEditor, Harness};
use tokio::time::Instant;

fn renamed(from: &str, to: &str) -> ProcessOutcome {
    ProcessOutcome::Renamed {
        from: from.to_string(),
        to: to.to_string(),
    }
}

#[tokio::test]
async fn typing_into_an_empty_note_names_it() {
    let h = Harness::new(
        MemoryVault::new().with_file("Untitled.md", ""),
        RenameSettings::default(),
    );
    h.engine.seed_content("Untitled.md", "");
    h.vault.insert("Untitled.md", "Hello World\n");

    let outcome = h
        .engine
        .process_file("Untitled.md", ProcessOptions::on_edit())
        .await;

    assert_eq!(outcome, renamed("Untitled.md", "Hello World.md"));
    assert_eq!(h.vault.content("Hello World.md").as_deref(), Some("Hello World\n"));
    assert!(h.aliases.calls().is_empty(), "untitled names are not aliased");
    assert_eq!(
        h.engine.cached_content("Hello World.md").as_deref(),
        Some("Hello World\n")
    );
}

#[tokio::test]
async fn emptied_note_falls_back_to_untitled() {
    let h = Harness::new(
        MemoryVault::new().with_file("notes/Hello.md", "Hello"),
        RenameSettings::default(),
    );
    h.engine.seed_content("notes/Hello.md", "Hello");
    h.vault.insert("notes/Hello.md", "");

    let outcome = h
        .engine
        .process_file("notes/Hello.md", ProcessOptions::on_edit())
        .await;
    assert_eq!(outcome, renamed("notes/Hello.md", "notes/Untitled.md"));
}

#[tokio::test]
async fn emptied_note_takes_next_free_untitled() {
    let h = Harness::new(
        MemoryVault::new()
            .with_file("Hello.md", "Hello")
            .with_file("Untitled.md", ""),
        RenameSettings::default(),
    );
    h.engine.seed_content("Hello.md", "Hello");
    h.vault.insert("Hello.md", "");

    let outcome = h
        .engine
        .process_file("Hello.md", ProcessOptions::on_edit())
        .await;
    assert_eq!(outcome, renamed("Hello.md", "Untitled 1.md"));
}

#[tokio::test]
async fn new_empty_note_is_left_alone() {
    let h = Harness::new(
        MemoryVault::new().with_file("Untitled.md", "\n\n"),
        RenameSettings::default(),
    );
    let outcome = h
        .engine
        .process_file("Untitled.md", ProcessOptions::on_edit())
        .await;
    assert_eq!(outcome, ProcessOutcome::Skipped { reason: SkipReason::EmptyContent });
}

#[tokio::test]
async fn matching_name_issues_no_rename() {
    let h = Harness::new(
        MemoryVault::new().with_file("Hello.md", "# Hello\nbody"),
        RenameSettings::default(),
    );

    for _ in 0..2 {
        let outcome = h
            .engine
            .process_file("Hello.md", ProcessOptions::manual())
            .await;
        assert_eq!(outcome, ProcessOutcome::AlreadyNamed);
        assert!(outcome.success());
    }
    assert!(h.vault.renames().is_empty());
}

#[tokio::test]
async fn unchanged_content_is_skipped_on_edit() {
    let h = Harness::new(
        MemoryVault::new().with_file("a.md", "Hello"),
        RenameSettings::default(),
    );
    h.engine.seed_content("a.md", "Hello");
    assert_eq!(
        h.engine.process_file("a.md", ProcessOptions::on_edit()).await,
        ProcessOutcome::Skipped { reason: SkipReason::Unchanged }
    );
    assert_eq!(
        h.engine.process_file("a.md", ProcessOptions::manual()).await,
        renamed("a.md", "Hello.md")
    );
}

#[tokio::test]
async fn safeword_at_start_protects_file_name() {
    let mut settings = RenameSettings::default();
    let mut word = Safeword::new("Draft");
    word.set_match_at_start(true);
    settings.safewords = vec![word];
    let h = Harness::new(
        MemoryVault::new()
            .with_file("Draft report.md", "Quarterly numbers")
            .with_file("My Draft.md", "Quarterly numbers"),
        settings,
    );

    assert_eq!(
        h.engine
            .process_file("Draft report.md", ProcessOptions::manual())
            .await,
        ProcessOutcome::Skipped { reason: SkipReason::Safeword }
    );
    assert_eq!(
        h.engine
            .process_file("My Draft.md", ProcessOptions::manual())
            .await,
        renamed("My Draft.md", "Quarterly numbers.md")
    );
}

#[tokio::test]
async fn self_reference_blocks_once_then_yields_to_custom_rules() {
    let h = Harness::new(
        MemoryVault::new().with_file("Apple.md", "See [[Apple]] for details"),
        RenameSettings::default(),
    );

    for _ in 0..2 {
        let outcome = h
            .engine
            .process_file("Apple.md", ProcessOptions::manual())
            .await;
        assert_eq!(outcome.reason().as_deref(), Some("self-referential"));
    }
    assert_eq!(h.notifier.messages().len(), 1, "notice is shown once");

    let mut settings = RenameSettings::default();
    settings.custom_replacements = vec![CustomReplacement::new("[[Apple]]", "apples")];
    h.engine.update_settings(settings);

    let outcome = h
        .engine
        .process_file("Apple.md", ProcessOptions::manual())
        .await;
    assert_eq!(outcome, renamed("Apple.md", "See apples for details.md"));
}

#[tokio::test]
async fn forbidden_slash_uses_configured_replacement() {
    let mut settings = RenameSettings::default();
    settings.enable_forbidden_char_replacements = true;
    settings.char_replacements.enable(ForbiddenChar::Slash, "∕");
    let h = Harness::new(MemoryVault::new().with_file("x.md", "A/B"), settings);

    let outcome = h.engine.process_file("x.md", ProcessOptions::manual()).await;
    assert_eq!(outcome, renamed("x.md", "A∕B.md"));
}

#[tokio::test]
async fn previous_title_becomes_an_alias() {
    let h = Harness::new(
        MemoryVault::new().with_file("Old name.md", "New name"),
        RenameSettings::default(),
    );
    h.engine
        .process_file("Old name.md", ProcessOptions::manual())
        .await;
    assert_eq!(
        h.aliases.calls(),
        vec![("New name.md".to_string(), "Old name".to_string())]
    );
}

#[tokio::test]
async fn disable_property_wins_over_ignore_exclusions() {
    let mut settings = RenameSettings::default();
    settings.excluded_folders = vec!["Archive".into()];
    let h = Harness::new(
        MemoryVault::new()
            .with_file("Archive/old.md", "Kept")
            .with_file("pinned.md", "---\nrename: OFF\n---\nPinned"),
        settings,
    );
    let forced = ProcessOptions::manual().ignoring_exclusions();

    assert_eq!(
        h.engine
            .process_file("Archive/old.md", ProcessOptions::manual())
            .await,
        ProcessOutcome::Skipped { reason: SkipReason::ExcludedFolder }
    );
    assert_eq!(
        h.engine.process_file("Archive/old.md", forced).await,
        renamed("Archive/old.md", "Archive/Kept.md")
    );
    assert_eq!(
        h.engine.process_file("pinned.md", forced).await,
        ProcessOutcome::Skipped { reason: SkipReason::DisabledByProperty }
    );
}

#[tokio::test]
async fn host_failure_is_reported_and_releases_the_lock() {
    let h = Harness::new(
        MemoryVault::new().with_file("a.md", "Boom"),
        RenameSettings::default(),
    );
    h.vault.fail_renames_of("a.md");

    for _ in 0..2 {
        let outcome = h.engine.process_file("a.md", ProcessOptions::manual()).await;
        assert!(
            matches!(
                outcome,
                ProcessOutcome::Failed { ref error } if error.contains("simulated failure")
            ),
            "unexpected outcome {outcome:?}"
        );
    }
    assert_eq!(h.notifier.messages().len(), 2);
    assert!(h.vault.content("a.md").is_some());
}

#[tokio::test]
async fn missing_file_fails_without_panicking() {
    let h = Harness::new(MemoryVault::new(), RenameSettings::default());
    let outcome = h
        .engine
        .process_file("gone.md", ProcessOptions::manual())
        .await;
    assert_eq!(
        outcome,
        ProcessOutcome::Failed {
            error: "read gone.md: no such file".to_string()
        }
    );
}

#[tokio::test]
async fn non_markdown_paths_are_ignored() {
    let h = Harness::new(
        MemoryVault::new().with_file("image.png", "Hello"),
        RenameSettings::default(),
    );
    assert_eq!(
        h.engine
            .process_file("image.png", ProcessOptions::manual())
            .await,
        ProcessOutcome::Skipped { reason: SkipReason::NotMarkdown }
    );
}

#[tokio::test]
async fn creation_window_holds_edits_but_not_manual_runs() {
    let h = Harness::new(
        MemoryVault::new().with_file("Untitled.md", "From template"),
        RenameSettings::default(),
    );
    h.engine.note_created("Untitled.md", Instant::now());

    assert_eq!(
        h.engine
            .process_file("Untitled.md", ProcessOptions::on_edit())
            .await,
        ProcessOutcome::Skipped { reason: SkipReason::CreationDelay }
    );
    assert_eq!(
        h.engine
            .process_file("Untitled.md", ProcessOptions::manual())
            .await,
        renamed("Untitled.md", "From template.md")
    );
}

#[tokio::test]
async fn editor_buffer_is_preferred_over_saved_content() {
    let vault = Arc::new(MemoryVault::new().with_file("a.md", "Saved"));
    let editor = Arc::new(FakeEditor::default());
    editor.type_text("a.md", "Typed");
    let engine = RenameEngine::new(
        Host::new(vault.clone()).with_editor(editor),
        RenameSettings::default(),
    );

    let outcome = engine.process_file("a.md", ProcessOptions::manual()).await;
    assert_eq!(outcome, renamed("a.md", "Typed.md"));
    assert_eq!(vault.content("Typed.md").as_deref(), Some("Saved"));
}

#[tokio::test]
async fn batch_continues_past_failures_and_avoids_collisions() {
    let h = Harness::new(
        MemoryVault::new()
            .with_file("a.md", "Same")
            .with_file("b.md", "Same")
            .with_file("c.md", "---\nrename: off\n---\nPinned")
            .with_file("d.md", "Boom")
            .with_file("Same.md", "Same"),
        RenameSettings::default(),
    );
    h.vault.fail_renames_of("d.md");

    let summary = h
        .engine
        .rename_all(ProcessOptions::manual())
        .await
        .expect("list files");

    assert_eq!(summary.renamed, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.unchanged, 1);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].starts_with("d.md: "));

    let mut paths = h.vault.paths();
    paths.sort();
    assert_eq!(
        paths,
        vec!["Same 1.md", "Same 2.md", "Same.md", "c.md", "d.md"]
    );
    assert!(h
        .notifier
        .messages()
        .iter()
        .any(|m| m == "Renamed 2 of 5 notes, skipped 1, 1 failed"));
}
