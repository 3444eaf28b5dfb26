//! Commit data model

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};

/// Opaque commit identifier assigned by the backend
///
/// Stable until a history rewrite replays the commit, which issues a new id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display (first 8 characters)
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommitId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One commit on a timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEntry {
    pub id: CommitId,

    /// Authored timestamp (the event date, not the creation time)
    pub timestamp: DateTime<FixedOffset>,

    /// First line of the commit message
    pub message: String,
}

impl CommitEntry {
    /// Calendar date of the authored timestamp, in the commit's own offset
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}
