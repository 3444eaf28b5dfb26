//! Story: Recording events out of order
//!
//! Scenario: events are remembered late, so they arrive in arbitrary date
//! order. The git history must still read as a chronological diary.

#[path = "common/mod.rs"]
mod common;

use std::fs;
use std::path::PathBuf;

use common::{TestRepo, event};
use lifeline::backend::{Backend, BackendError};
use lifeline::engine::InsertionEngine;
use lifeline::git::GitExecutor;
use lifeline::model::{CommitTimeline, EventRecord};
use lifeline::{InsertOutcome, Lifeline, LifelineError, NewEvent, ValidationError};

fn open(repo: &TestRepo) -> Lifeline {
    Lifeline::open(repo.path()).unwrap()
}

#[test]
fn story_first_event_in_empty_repository() {
    skip_if_no_git!();
    let repo = TestRepo::new();
    let mut lifeline = open(&repo);

    let outcome = lifeline.add_event(&event("Born", "1990-03-14"), None).unwrap();

    assert!(matches!(outcome, InsertOutcome::Appended { .. }));
    assert_eq!(repo.subjects(), vec!["Add event: Born"]);
    assert_eq!(repo.author_dates(), vec!["1990-03-14"]);
    assert!(repo.is_clean());
    assert!(
        repo.read_file("events/1990-03-14_born.md")
            .contains("title: \"Born\"")
    );
}

#[test]
fn story_event_between_two_others() {
    skip_if_no_git!();
    let repo = TestRepo::new();
    let mut lifeline = open(&repo);
    lifeline.add_event(&event("New year", "2024-01-01"), None).unwrap();
    lifeline.add_event(&event("Spring", "2024-03-01"), None).unwrap();

    let outcome = lifeline.add_event(&event("February", "2024-02-01"), None).unwrap();

    let InsertOutcome::Relocated { commit, before, .. } = outcome else {
        panic!("expected relocation, got {:?}", outcome);
    };
    assert_eq!(before.message, "Add event: Spring");
    assert_eq!(commit.date().to_string(), "2024-02-01");
    assert_eq!(
        repo.subjects(),
        vec!["Add event: New year", "Add event: February", "Add event: Spring"]
    );
    assert_eq!(
        repo.author_dates(),
        vec!["2024-01-01", "2024-02-01", "2024-03-01"]
    );
    assert_eq!(repo.committer_dates(), repo.author_dates());
    assert!(lifeline.check().unwrap().is_chronological());
}

#[test]
fn story_event_before_all_history() {
    skip_if_no_git!();
    let repo = TestRepo::new();
    let mut lifeline = open(&repo);
    lifeline.add_event(&event("New year", "2024-01-01"), None).unwrap();

    let outcome = lifeline.add_event(&event("December", "2023-12-01"), None).unwrap();

    assert!(outcome.rewrote_history());
    assert_eq!(repo.author_dates(), vec!["2023-12-01", "2024-01-01"]);
    assert_eq!(lifeline.list_events().unwrap().len(), 2);
}

#[test]
fn story_latest_event_never_rewrites() {
    skip_if_no_git!();
    let repo = TestRepo::new();
    let mut lifeline = open(&repo);
    lifeline.add_event(&event("One", "2024-01-01"), None).unwrap();
    let before = repo.git(&["rev-parse", "HEAD"]);

    let outcome = lifeline.add_event(&event("Two", "2024-06-01"), None).unwrap();

    assert!(!outcome.rewrote_history());
    assert_eq!(repo.subjects().len(), 2);
    assert_eq!(repo.git(&["rev-parse", "HEAD~1"]), before);
}

#[test]
fn story_same_day_events_keep_arrival_order() {
    skip_if_no_git!();
    let repo = TestRepo::new();
    let mut lifeline = open(&repo);
    lifeline.add_event(&event("Later", "2024-05-01"), None).unwrap();
    lifeline.add_event(&event("Morning", "2024-03-01"), None).unwrap();
    lifeline.add_event(&event("Evening", "2024-03-01"), None).unwrap();

    assert_eq!(
        repo.subjects(),
        vec!["Add event: Morning", "Add event: Evening", "Add event: Later"]
    );
}

#[test]
fn story_media_is_copied_and_committed() {
    skip_if_no_git!();
    let repo = TestRepo::new();
    let source = tempfile::TempDir::new().unwrap();
    let photo = source.path().join("cake.jpg");
    fs::write(&photo, b"jpeg").unwrap();
    let mut lifeline = open(&repo);

    let input = NewEvent {
        media: vec![photo],
        description: "Thirty candles".to_string(),
        ..event("Birthday", "2020-03-14")
    };
    lifeline.add_event(&input, None).unwrap();

    let tracked = repo.git(&["ls-files"]);
    assert!(tracked.contains("events/2020-03-14-birthday/cake.jpg"));
    assert!(tracked.contains("events/2020-03-14_birthday.md"));
    assert!(
        repo.read_file("events/2020-03-14_birthday.md")
            .contains("![cake.jpg](2020-03-14-birthday/cake.jpg)")
    );
    assert!(repo.is_clean());
}

#[test]
fn story_invalid_input_leaves_repository_untouched() {
    skip_if_no_git!();
    let repo = TestRepo::new();
    let mut lifeline = open(&repo);
    lifeline.add_event(&event("Born", "1990-03-14"), None).unwrap();

    let bad_type = NewEvent {
        event_type: "party".to_string(),
        ..event("Bash", "2000-01-01")
    };
    assert!(matches!(
        lifeline.add_event(&bad_type, None),
        Err(LifelineError::Validation(_))
    ));
    assert!(matches!(
        lifeline.add_event(&event("Bash", "2000-02-30"), None),
        Err(LifelineError::Validation(_))
    ));
    // git cannot record commit dates before the epoch
    assert!(matches!(
        lifeline.add_event(&event("Grandparents married", "1965-05-01"), None),
        Err(LifelineError::Validation(ValidationError::DateOutOfRange { .. }))
    ));
    assert_eq!(repo.subjects().len(), 1);
    assert!(repo.is_clean());
}

#[test]
fn story_rejected_commit_can_be_retried() {
    skip_if_no_git!();
    let repo = TestRepo::new();
    let mut lifeline = open(&repo);
    lifeline.add_event(&event("Born", "1990-03-14"), None).unwrap();
    repo.install_hook("pre-commit", "#!/bin/sh\nexit 1\n");

    let err = lifeline.add_event(&event("First word", "1991-05-01"), None).unwrap_err();

    assert!(matches!(
        err,
        LifelineError::Backend(BackendError::CommandFailed { .. })
    ));
    assert!(repo.is_clean());
    assert!(!repo.path().join("events/1991-05-01_first-word.md").exists());

    repo.remove_hook("pre-commit");
    lifeline.add_event(&event("First word", "1991-05-01"), None).unwrap();
    assert_eq!(
        repo.subjects(),
        vec!["Add event: Born", "Add event: First word"]
    );
    assert!(repo.is_clean());
}

#[test]
fn story_rejected_first_commit_leaves_empty_repository() {
    skip_if_no_git!();
    let repo = TestRepo::new();
    let mut lifeline = open(&repo);
    repo.install_hook("pre-commit", "#!/bin/sh\nexit 1\n");

    assert!(lifeline.add_event(&event("Born", "1990-03-14"), None).is_err());

    assert!(repo.is_clean());
    assert!(lifeline.list_events().unwrap().is_empty());
}

#[test]
fn story_dirty_tree_is_refused() {
    skip_if_no_git!();
    let repo = TestRepo::new();
    let mut lifeline = open(&repo);
    repo.write_file("scratch.txt", "draft");

    let err = lifeline.add_event(&event("Born", "1990-03-14"), None).unwrap_err();

    assert!(matches!(err, LifelineError::DirtyWorkingTree(ref paths) if paths.contains(&"scratch.txt".to_string())));
    assert!(!repo.path().join("events").exists());
}

#[test]
fn story_conflict_keeps_event_retrievable() {
    skip_if_no_git!();
    let repo = TestRepo::new();
    repo.commit_file("events/index.md", "start\n", "Start index", "2020-01-01");
    repo.commit_file("events/index.md", "march\n", "Add event: March", "2024-03-01");

    // The past event edits the same shared file as a later commit
    let mut git = GitExecutor::open(repo.path()).unwrap();
    let types = vec!["life".to_string()];
    let past = EventRecord::new("January", "2024-01-01", "life", "", &types).unwrap();
    let file = PathBuf::from("events").join(past.filename());
    repo.write_file(&file.to_string_lossy(), "---\ntitle: January\n---\n");
    repo.write_file("events/index.md", "january\n");

    let outcome = InsertionEngine::new(&mut git)
        .insert(&past, &[file, PathBuf::from("events/index.md")])
        .unwrap();

    let InsertOutcome::NeedsManualResolution { commit, before, .. } = outcome else {
        panic!("expected a paused rewrite, got {:?}", outcome);
    };
    assert_eq!(before.message, "Add event: March");
    assert!(git.rewrite_in_progress().unwrap());
    let timeline = CommitTimeline::build(&git).unwrap();
    assert_eq!(
        timeline.find_by_message("Add event: January").map(|e| &e.id),
        Some(&commit.id)
    );

    // Nothing else may happen until the rewrite is settled
    let mut lifeline = open(&repo);
    assert!(matches!(
        lifeline.add_event(&event("Another", "2022-01-01"), None),
        Err(LifelineError::Backend(BackendError::RewriteInProgress))
    ));

    lifeline.abort_rewrite().unwrap();
    assert_eq!(
        repo.subjects(),
        vec!["Start index", "Add event: March", "Add event: January"]
    );
    let report = lifeline.check().unwrap();
    assert_eq!(report.violations.len(), 1);
}
