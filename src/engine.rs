//! Chronological insertion engine
//!
//! Every event is first committed at the tip of the checked-out branch, so the
//! repository always holds it. When an existing commit is dated after the
//! event, the new commit is then moved to sit immediately before the first
//! such commit by replaying the history from that point.
//!
//! States per request:
//! 1. committed at tip
//! 2. evaluate: insertion point on the timeline as it was before the commit
//! 3. rewrite, if there is an insertion point
//! 4. done, or paused for manual resolution after a conflict
//!
//! Failures after step 1 never roll the commit back.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::backend::{Backend, BackendError, RewriteOutcome};
use crate::error::LifelineError;
use crate::model::{CommitEntry, CommitId, CommitTimeline, EventRecord};

/// Where an insertion ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Appending at the tip was already chronological
    Appended { commit: CommitEntry },

    /// The new commit was moved before `before`; replayed commits have new ids
    Relocated {
        commit: CommitEntry,
        before: CommitEntry,
        replayed: usize,
    },

    /// The rewrite stopped on a conflict and the repository is paused
    ///
    /// `commit` is still on the branch, at the tip, out of chronological order.
    NeedsManualResolution {
        commit: CommitEntry,
        before: CommitEntry,
        detail: String,
    },
}

impl InsertOutcome {
    pub fn rewrote_history(&self) -> bool {
        matches!(self, Self::Relocated { .. })
    }

    pub fn needs_manual_resolution(&self) -> bool {
        matches!(self, Self::NeedsManualResolution { .. })
    }

    /// The event commit as last seen
    pub fn commit(&self) -> &CommitEntry {
        match self {
            Self::Appended { commit }
            | Self::Relocated { commit, .. }
            | Self::NeedsManualResolution { commit, .. } => commit,
        }
    }
}

/// How to replay history so a new tip commit lands before an insertion point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewritePlan {
    /// Last commit left untouched (`None` when replaying from the root)
    pub base: Option<CommitId>,

    /// New commit first, then the insertion point and everything after it in
    /// their original order
    pub sequence: Vec<CommitId>,

    /// Index the new commit will have in the rewritten timeline
    pub target_index: usize,
}

impl RewritePlan {
    /// Plan moving `new_commit` before the entry at `index` of `prior`
    ///
    /// `prior` is the timeline before `new_commit` was created.
    pub fn relocate(prior: &CommitTimeline, index: usize, new_commit: &CommitId) -> Self {
        let entries = prior.entries();
        let base = index
            .checked_sub(1)
            .and_then(|i| entries.get(i))
            .map(|entry| entry.id.clone());
        let sequence = std::iter::once(new_commit.clone())
            .chain(entries[index.min(entries.len())..].iter().map(|e| e.id.clone()))
            .collect();
        Self {
            base,
            sequence,
            target_index: index,
        }
    }
}

/// Inserts events into the checked-out branch in chronological position
pub struct InsertionEngine<'a, B: Backend + ?Sized> {
    backend: &'a mut B,
}

impl<'a, B: Backend + ?Sized> InsertionEngine<'a, B> {
    pub fn new(backend: &'a mut B) -> Self {
        Self { backend }
    }

    /// Commit `event` (with its files at `paths`) and move it into place
    pub fn insert(
        &mut self,
        event: &EventRecord,
        paths: &[PathBuf],
    ) -> Result<InsertOutcome, LifelineError> {
        let prior = CommitTimeline::build(&*self.backend)?;
        let commit = self.commit_at_tip(event, paths)?;
        let id = commit.id.clone();
        self.place(&prior, commit, event)
            .map_err(|source| LifelineError::OrderingNotGuaranteed { commit: id, source })
    }

    /// Commit `event` at the tip without reordering
    ///
    /// Used for new alternate timelines, which always append.
    pub fn append(
        &mut self,
        event: &EventRecord,
        paths: &[PathBuf],
    ) -> Result<InsertOutcome, LifelineError> {
        let commit = self.commit_at_tip(event, paths)?;
        Ok(InsertOutcome::Appended { commit })
    }

    /// Stage and commit with the event date as authored and committed time
    ///
    /// If either step fails, `paths` are unstaged again.
    pub fn commit_at_tip(
        &mut self,
        event: &EventRecord,
        paths: &[PathBuf],
    ) -> Result<CommitEntry, BackendError> {
        let at = event.authored_at();
        let committed = self
            .backend
            .stage(paths)
            .and_then(|()| self.backend.commit(&event.commit_message(), at, at));
        match committed {
            Ok(commit) => {
                info!(commit = commit.id.short(), date = %event.date, "committed event at tip");
                Ok(commit)
            }
            Err(err) => {
                if let Err(unstage_err) = self.backend.unstage(paths) {
                    warn!(%unstage_err, "could not unstage event files after failed commit");
                }
                Err(err)
            }
        }
    }

    /// Move a just-created tip commit to its chronological position
    ///
    /// `prior` must be the timeline from before `commit` was created.
    pub fn place(
        &mut self,
        prior: &CommitTimeline,
        commit: CommitEntry,
        event: &EventRecord,
    ) -> Result<InsertOutcome, BackendError> {
        let Some(point) = prior.find_insertion_point(event.date) else {
            info!(commit = commit.id.short(), "event is the latest; no rewrite needed");
            return Ok(InsertOutcome::Appended { commit });
        };
        let before = point.clone();
        let index = prior
            .position(&before.id)
            .ok_or_else(|| BackendError::UnknownCommit(before.id.to_string()))?;

        let plan = RewritePlan::relocate(prior, index, &commit.id);
        info!(
            commit = commit.id.short(),
            before = before.id.short(),
            replayed = plan.sequence.len(),
            "relocating past event"
        );

        match self
            .backend
            .rewrite_history(plan.base.as_ref(), &plan.sequence)?
        {
            RewriteOutcome::Success => {
                let rewritten = CommitTimeline::build(&*self.backend)?;
                let relocated = rewritten
                    .entries()
                    .get(plan.target_index)
                    .filter(|entry| entry.message == commit.message)
                    .cloned()
                    .or_else(|| rewritten.find_by_message(&commit.message).cloned())
                    .unwrap_or(commit);
                Ok(InsertOutcome::Relocated {
                    commit: relocated,
                    before,
                    replayed: plan.sequence.len(),
                })
            }
            RewriteOutcome::Conflict { detail } => {
                warn!(
                    commit = commit.id.short(),
                    "rewrite paused on conflict; event is saved but out of order"
                );
                Ok(InsertOutcome::NeedsManualResolution {
                    commit,
                    before,
                    detail,
                })
            }
        }
    }
}
