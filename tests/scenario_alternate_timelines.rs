//! Story: Alternate timelines
//!
//! Scenario: branch off the main timeline to record "what if" events, then
//! move between timelines.

#[path = "common/mod.rs"]
mod common;

use common::{TestRepo, event};
use lifeline::backend::BackendError;
use lifeline::{Lifeline, LifelineError};

#[test]
fn story_branch_from_earlier_commit() {
    skip_if_no_git!();
    let repo = TestRepo::new();
    let mut lifeline = Lifeline::open(repo.path()).unwrap();
    let school = lifeline
        .add_event(&event("Finished school", "2008-06-30"), None)
        .unwrap();
    lifeline.add_event(&event("Went to university", "2008-10-01"), None).unwrap();

    lifeline
        .create_branch("gap-year", Some(school.commit().id.as_str()))
        .unwrap();
    lifeline.add_event(&event("Backpacking", "2008-11-01"), None).unwrap();

    assert_eq!(lifeline.current_branch().unwrap().as_deref(), Some("gap-year"));
    assert_eq!(
        repo.subjects(),
        vec!["Add event: Finished school", "Add event: Backpacking"]
    );
    let titles: Vec<String> = lifeline
        .list_events()
        .unwrap()
        .into_iter()
        .map(|e| e.title)
        .collect();
    assert_eq!(titles, vec!["Finished school", "Backpacking"]);

    lifeline.switch_branch("main").unwrap();
    assert_eq!(
        repo.subjects(),
        vec!["Add event: Finished school", "Add event: Went to university"]
    );
}

#[test]
fn story_past_event_on_alternate_timeline_stays_there() {
    skip_if_no_git!();
    let repo = TestRepo::new();
    let mut lifeline = Lifeline::open(repo.path()).unwrap();
    lifeline.add_event(&event("Jan", "2024-01-01"), None).unwrap();
    lifeline.add_event(&event("Mar", "2024-03-01"), None).unwrap();
    lifeline.create_branch("alt", None).unwrap();

    let outcome = lifeline.add_event(&event("Feb", "2024-02-01"), None).unwrap();

    assert!(outcome.rewrote_history());
    assert_eq!(lifeline.current_branch().unwrap().as_deref(), Some("alt"));
    assert_eq!(
        repo.subjects_of("alt"),
        vec!["Add event: Jan", "Add event: Feb", "Add event: Mar"]
    );
    assert_eq!(
        repo.subjects_of("main"),
        vec!["Add event: Jan", "Add event: Mar"]
    );
    assert!(lifeline.check().unwrap().is_chronological());
}

#[test]
fn story_add_with_branch_creates_timeline() {
    skip_if_no_git!();
    let repo = TestRepo::new();
    let mut lifeline = Lifeline::open(repo.path()).unwrap();
    lifeline.add_event(&event("Moved abroad", "2015-01-01"), None).unwrap();

    let outcome = lifeline
        .add_event(&event("Stayed home", "2014-12-01"), Some("stayed"))
        .unwrap();

    assert!(!outcome.rewrote_history());
    assert_eq!(lifeline.current_branch().unwrap().as_deref(), Some("stayed"));
    let branches: Vec<String> = lifeline
        .branches()
        .unwrap()
        .into_iter()
        .map(|b| format!("{} {}", b.marker(), b.name))
        .collect();
    assert_eq!(branches, vec!["  main", "* stayed"]);
}

#[test]
fn story_failed_branch_add_keeps_current_timeline() {
    skip_if_no_git!();
    let repo = TestRepo::new();
    let mut lifeline = Lifeline::open(repo.path()).unwrap();
    lifeline.add_event(&event("Moved abroad", "2015-01-01"), None).unwrap();
    repo.install_hook("pre-commit", "#!/bin/sh\nexit 1\n");

    assert!(
        lifeline
            .add_event(&event("Stayed home", "2014-12-01"), Some("stayed"))
            .is_err()
    );

    assert_eq!(lifeline.current_branch().unwrap().as_deref(), Some("main"));
    let names: Vec<String> = lifeline.branches().unwrap().into_iter().map(|b| b.name).collect();
    assert_eq!(names, vec!["main"]);
    assert!(repo.is_clean());
}

#[test]
fn story_branch_name_collision() {
    skip_if_no_git!();
    let repo = TestRepo::new();
    let mut lifeline = Lifeline::open(repo.path()).unwrap();
    lifeline.add_event(&event("Start", "2015-01-01"), None).unwrap();

    let err = lifeline.create_branch("main", None).unwrap_err();
    assert!(matches!(
        err,
        LifelineError::Backend(BackendError::BranchExists(ref name)) if name == "main"
    ));
    let err = lifeline.switch_branch("nowhere").unwrap_err();
    assert!(matches!(
        err,
        LifelineError::Backend(BackendError::BranchNotFound(_))
    ));
}
