//! Commit timeline index
//!
//! An oldest-first view of the checked-out branch, rebuilt from the backend
//! on every query. A rewrite invalidates commit ids, so a timeline must never
//! outlive the operation that built it.

use chrono::NaiveDate;

use super::commit::{CommitEntry, CommitId};
use crate::backend::{Backend, BackendError, LogOrder};

/// Ordered commits of one branch, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitTimeline {
    entries: Vec<CommitEntry>,
}

impl CommitTimeline {
    /// Enumerate the backend's history oldest-first
    pub fn build<B: Backend + ?Sized>(backend: &B) -> Result<Self, BackendError> {
        let entries = backend
            .commits(LogOrder::OldestFirst)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Wrap entries that are already oldest-first
    pub fn from_entries(entries: Vec<CommitEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CommitEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommitEntry> {
        self.entries.iter()
    }

    /// First commit dated strictly after `target`
    ///
    /// Commits on the same day as `target` do not count as after it, so a new
    /// event lands behind any events already recorded for that day. `None`
    /// means appending at the tip is already chronological.
    pub fn find_insertion_point(&self, target: NaiveDate) -> Option<&CommitEntry> {
        self.entries.iter().find(|entry| entry.date() > target)
    }

    /// Index of a commit in the timeline
    pub fn position(&self, id: &CommitId) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.id == id)
    }

    /// Newest commit whose message contains `needle`
    pub fn find_by_message(&self, needle: &str) -> Option<&CommitEntry> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.message.contains(needle))
    }

    /// Adjacent pairs whose dates go backwards
    pub fn out_of_order(&self) -> Vec<(&CommitEntry, &CommitEntry)> {
        self.entries
            .windows(2)
            .filter(|pair| pair[0].date() > pair[1].date())
            .map(|pair| (&pair[0], &pair[1]))
            .collect()
    }

    /// Whether dates are non-decreasing oldest to newest
    pub fn is_chronological(&self) -> bool {
        self.entries
            .windows(2)
            .all(|pair| pair[0].date() <= pair[1].date())
    }
}
