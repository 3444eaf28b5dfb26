//! Repository accessor
//!
//! The [`Backend`] trait is the capability set the insertion engine needs from
//! a revision-control system. [`crate::git::GitExecutor`] drives a real `git`
//! binary; [`MemoryBackend`] keeps everything in memory for tests.
//!
//! Mutating operations take `&mut self`: the working tree and index are shared
//! state, and callers must serialize writes against one repository.

mod memory;

pub use memory::MemoryBackend;

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::model::{BranchInfo, CommitEntry, CommitId};

/// Errors that can occur when talking to the revision-control backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Nothing staged to commit")]
    NothingStaged,

    #[error("Branch already exists: {0}")]
    BranchExists(String),

    #[error("Branch not found: {0}")]
    BranchNotFound(String),

    #[error("Cannot delete the checked-out branch: {0}")]
    BranchCheckedOut(String),

    #[error("A history rewrite is paused; run `lifeline rewrite continue` or `lifeline rewrite abort`")]
    RewriteInProgress,

    #[error("No history rewrite is in progress")]
    NoRewriteInProgress,

    #[error("Unknown commit: {0}")]
    UnknownCommit(String),

    #[error("Invalid rewrite sequence: {0}")]
    InvalidRewrite(String),

    #[error("git {command} failed (exit code {exit_code}): {stderr}")]
    CommandFailed {
        command: String,
        stderr: String,
        exit_code: i32,
    },

    #[error("Failed to parse git output: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("git is not installed or not in PATH")]
    GitNotFound,
}

/// Traversal order for [`Backend::commits`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOrder {
    OldestFirst,
    NewestFirst,
}

/// Result of replaying commits in a new order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// Every commit was replayed; replayed commits have new ids
    Success,

    /// Replay stopped on a conflict and the repository is paused
    Conflict { detail: String },
}

/// Lazy, finite sequence of commits. Call [`Backend::commits`] again to restart.
pub type CommitIter<'a> = Box<dyn Iterator<Item = Result<CommitEntry, BackendError>> + 'a>;

/// Revision-control capabilities used by the timeline
pub trait Backend {
    /// Repository root (working tree top level)
    fn root(&self) -> &Path;

    /// Paths with staged, unstaged, or untracked changes
    fn dirty_paths(&self) -> Result<Vec<PathBuf>, BackendError>;

    /// True iff [`Backend::dirty_paths`] is empty
    fn is_clean(&self) -> Result<bool, BackendError> {
        Ok(self.dirty_paths()?.is_empty())
    }

    /// Paths left unmerged by a paused rewrite
    fn conflicted_paths(&self) -> Result<Vec<PathBuf>, BackendError>;

    /// Mark repository-relative paths for the next commit
    fn stage(&mut self, paths: &[PathBuf]) -> Result<(), BackendError>;

    /// Take staged paths back out of the next commit, leaving the files as they are
    fn unstage(&mut self, paths: &[PathBuf]) -> Result<(), BackendError>;

    /// Commit staged changes with explicit authored and committed timestamps
    fn commit(
        &mut self,
        message: &str,
        authored_at: DateTime<FixedOffset>,
        committed_at: DateTime<FixedOffset>,
    ) -> Result<CommitEntry, BackendError>;

    /// Enumerate the checked-out branch's history
    ///
    /// While a rewrite is paused this is the history of the branch being
    /// rewritten, as it was before the rewrite started.
    fn commits(&self, order: LogOrder) -> Result<CommitIter<'_>, BackendError>;

    /// Create a branch at `from` (HEAD when `None`) without switching to it
    fn create_branch(&mut self, name: &str, from: Option<&CommitId>) -> Result<(), BackendError>;

    /// Delete a branch that is not checked out
    fn delete_branch(&mut self, name: &str) -> Result<(), BackendError>;

    /// Switch the working state to `name`
    fn checkout(&mut self, name: &str) -> Result<(), BackendError>;

    /// Name of the checked-out branch (`None` when detached)
    fn current_branch(&self) -> Result<Option<String>, BackendError>;

    /// All local branches
    fn branches(&self) -> Result<Vec<BranchInfo>, BackendError>;

    /// Replay the commits after `base` (after the root when `None`) in the order of `sequence`
    ///
    /// `sequence` must hold exactly the commits that follow `base` on the
    /// checked-out branch.
    fn rewrite_history(
        &mut self,
        base: Option<&CommitId>,
        sequence: &[CommitId],
    ) -> Result<RewriteOutcome, BackendError>;

    /// Whether a rewrite is paused waiting for manual resolution
    fn rewrite_in_progress(&self) -> Result<bool, BackendError>;

    /// Resume a paused rewrite
    fn continue_rewrite(&mut self) -> Result<RewriteOutcome, BackendError>;

    /// Discard a paused rewrite, restoring the branch as it was before
    fn abort_rewrite(&mut self) -> Result<(), BackendError>;
}

/// Check that `sequence` reorders exactly the commits in `expected`
pub(crate) fn check_rewrite_sequence(
    expected: &[CommitId],
    sequence: &[CommitId],
) -> Result<(), BackendError> {
    let mut want: Vec<&CommitId> = expected.iter().collect();
    let mut got: Vec<&CommitId> = sequence.iter().collect();
    want.sort();
    got.sort();
    if want != got {
        return Err(BackendError::InvalidRewrite(format!(
            "expected a permutation of {} commit(s) after the base, got {}",
            expected.len(),
            sequence.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<CommitId> {
        raw.iter().map(|id| CommitId::from(*id)).collect()
    }

    #[test]
    fn test_permutation_accepted() {
        assert!(check_rewrite_sequence(&ids(&["a", "b", "c"]), &ids(&["c", "a", "b"])).is_ok());
    }

    #[test]
    fn test_missing_or_extra_commit_rejected() {
        let expected = ids(&["a", "b"]);
        assert!(matches!(
            check_rewrite_sequence(&expected, &ids(&["a"])),
            Err(BackendError::InvalidRewrite(_))
        ));
        assert!(matches!(
            check_rewrite_sequence(&expected, &ids(&["a", "b", "x"])),
            Err(BackendError::InvalidRewrite(_))
        ));
        assert!(matches!(
            check_rewrite_sequence(&expected, &ids(&["a", "a"])),
            Err(BackendError::InvalidRewrite(_))
        ));
    }
}
