//! Error types for timeline operations

use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::backend::BackendError;
use crate::model::CommitId;

/// Problems with user input, caught before the repository is touched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid date format: {0}. Expected format: YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Date {date} is outside the supported range {earliest} to {latest}")]
    DateOutOfRange {
        date: NaiveDate,
        earliest: NaiveDate,
        latest: NaiveDate,
    },

    #[error("Invalid event type: {given}. Allowed types: {}", .allowed.join(", "))]
    DisallowedType { given: String, allowed: Vec<String> },

    #[error("Event title must not be empty")]
    EmptyTitle,

    #[error("Event title {0:?} has no characters usable in a filename")]
    UnsluggableTitle(String),

    #[error("Media file not found: {0}")]
    MediaNotFound(PathBuf),
}

/// Errors surfaced by timeline operations
#[derive(Error, Debug)]
pub enum LifelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Working tree has uncommitted changes: {}", .0.join(", "))]
    DirtyWorkingTree(Vec<String>),

    #[error("An event file already exists at {0}")]
    DuplicateEvent(PathBuf),

    /// The event is committed, but moving it into place failed
    #[error("Event saved as {}, but chronological order is not guaranteed: {source}", .commit.short())]
    OrderingNotGuaranteed {
        commit: CommitId,
        #[source]
        source: BackendError,
    },

    #[error("Invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
