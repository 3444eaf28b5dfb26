//! In-memory backend
//!
//! A linear-history stand-in for git, used to exercise the insertion engine
//! without spawning processes. Files are tracked by path only; contents are
//! never stored.
//!
//! Replaying commits in a new order conflicts when a commit is moved ahead of
//! an earlier commit that touched one of the same paths, which is when a real
//! rebase would have to merge two edits of one file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};

use super::{
    Backend, BackendError, CommitIter, LogOrder, RewriteOutcome, check_rewrite_sequence,
};
use crate::model::{BranchInfo, CommitEntry, CommitId};

/// Name of the branch a fresh [`MemoryBackend`] starts on
pub const DEFAULT_BRANCH: &str = "main";

#[derive(Debug, Clone)]
struct MemoryCommit {
    entry: CommitEntry,
    paths: BTreeSet<PathBuf>,
}

/// A rewrite stopped on a conflict
#[derive(Debug, Clone)]
struct PausedRewrite {
    branch: String,
    /// Ids of the rewritten range in their original order
    original_order: Vec<CommitId>,
    /// Commits kept as-is below the rewritten range
    kept: Vec<MemoryCommit>,
    /// Replayed so far, in the new order
    applied: Vec<MemoryCommit>,
    /// Still to replay; the first one is the commit that conflicted
    remaining: Vec<MemoryCommit>,
}

/// In-memory [`Backend`] for tests
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    root: PathBuf,
    branches: BTreeMap<String, Vec<MemoryCommit>>,
    head: String,
    files: BTreeSet<PathBuf>,
    dirty: BTreeSet<PathBuf>,
    staged: BTreeSet<PathBuf>,
    next_id: u64,
    paused: Option<PausedRewrite>,
    /// Set while commits fail the way a rejecting hook makes them fail
    commit_rejection: Option<String>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Empty repository on [`DEFAULT_BRANCH`] with no commits
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("."))
    }

    pub fn with_root(root: PathBuf) -> Self {
        let mut branches = BTreeMap::new();
        branches.insert(DEFAULT_BRANCH.to_string(), Vec::new());
        Self {
            root,
            branches,
            head: DEFAULT_BRANCH.to_string(),
            files: BTreeSet::new(),
            dirty: BTreeSet::new(),
            staged: BTreeSet::new(),
            next_id: 1,
            paused: None,
            commit_rejection: None,
        }
    }

    /// Create or modify a file in the working tree (leaves the tree dirty)
    pub fn write_file(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.files.insert(path.clone());
        self.dirty.insert(path);
    }

    /// Fail every commit with `reason` until [`MemoryBackend::accept_commits`]
    pub fn reject_commits(&mut self, reason: impl Into<String>) {
        self.commit_rejection = Some(reason.into());
    }

    pub fn accept_commits(&mut self) {
        self.commit_rejection = None;
    }

    /// Paths touched by a commit on the current branch
    pub fn paths_of(&self, id: &CommitId) -> Option<Vec<PathBuf>> {
        self.head_commits()
            .iter()
            .find(|c| &c.entry.id == id)
            .map(|c| c.paths.iter().cloned().collect())
    }

    fn head_commits(&self) -> &[MemoryCommit] {
        let branch = self
            .paused
            .as_ref()
            .map(|p| p.branch.as_str())
            .unwrap_or(&self.head);
        self.branches.get(branch).map(Vec::as_slice).unwrap_or(&[])
    }

    fn fresh_id(&mut self) -> CommitId {
        let id = CommitId::new(format!("{:040x}", self.next_id));
        self.next_id += 1;
        id
    }

    fn ensure_not_paused(&self) -> Result<(), BackendError> {
        if self.paused.is_some() {
            return Err(BackendError::RewriteInProgress);
        }
        Ok(())
    }

    /// Replay `paused.remaining` until done or the next conflict
    ///
    /// `resolved` skips the conflict check for the first remaining commit,
    /// which the user has just resolved by hand.
    fn replay(&mut self, mut paused: PausedRewrite, resolved: bool) -> RewriteOutcome {
        let mut skip_check = resolved;
        while !paused.remaining.is_empty() {
            let next = &paused.remaining[0];
            if !skip_check
                && let Some(path) =
                    conflicting_path(next, &paused.remaining[1..], &paused.original_order)
            {
                let detail = format!(
                    "CONFLICT (content): Merge conflict in {}\nerror: could not apply {}... {}",
                    path.display(),
                    next.entry.id.short(),
                    next.entry.message
                );
                self.paused = Some(paused);
                return RewriteOutcome::Conflict { detail };
            }
            skip_check = false;

            let mut commit = paused.remaining.remove(0);
            commit.entry.id = self.fresh_id();
            paused.applied.push(commit);
        }

        let mut history = paused.kept;
        history.extend(paused.applied);
        self.branches.insert(paused.branch, history);
        self.paused = None;
        RewriteOutcome::Success
    }
}

/// A path `commit` shares with a commit that originally came before it but is
/// still waiting to be replayed
fn conflicting_path<'a>(
    commit: &'a MemoryCommit,
    later: &[MemoryCommit],
    original_order: &[CommitId],
) -> Option<&'a PathBuf> {
    let rank = |c: &MemoryCommit| original_order.iter().position(|id| *id == c.entry.id);
    let own = rank(commit);
    later
        .iter()
        .filter(|other| rank(other) < own)
        .find_map(|other| commit.paths.iter().find(|p| other.paths.contains(*p)))
}

impl Backend for MemoryBackend {
    fn root(&self) -> &Path {
        &self.root
    }

    fn dirty_paths(&self) -> Result<Vec<PathBuf>, BackendError> {
        Ok(self.dirty.union(&self.staged).cloned().collect())
    }

    fn conflicted_paths(&self) -> Result<Vec<PathBuf>, BackendError> {
        let Some(paused) = &self.paused else {
            return Ok(Vec::new());
        };
        let conflict = paused.remaining.split_first().and_then(|(next, rest)| {
            conflicting_path(next, rest, &paused.original_order).cloned()
        });
        Ok(conflict.into_iter().collect())
    }

    fn stage(&mut self, paths: &[PathBuf]) -> Result<(), BackendError> {
        // Files written to disk under the root count as present too
        if let Some(missing) = paths
            .iter()
            .find(|p| !self.files.contains(*p) && !self.root.join(p).exists())
        {
            return Err(BackendError::PathNotFound(missing.clone()));
        }
        for path in paths {
            self.dirty.remove(path);
            self.staged.insert(path.clone());
        }
        Ok(())
    }

    fn unstage(&mut self, paths: &[PathBuf]) -> Result<(), BackendError> {
        // Files on disk are not scanned, so only in-memory files turn dirty again
        for path in paths {
            if self.staged.remove(path) && self.files.contains(path) {
                self.dirty.insert(path.clone());
            }
        }
        Ok(())
    }

    fn commit(
        &mut self,
        message: &str,
        authored_at: DateTime<FixedOffset>,
        _committed_at: DateTime<FixedOffset>,
    ) -> Result<CommitEntry, BackendError> {
        self.ensure_not_paused()?;
        if let Some(reason) = &self.commit_rejection {
            return Err(BackendError::CommandFailed {
                command: "commit".to_string(),
                stderr: reason.clone(),
                exit_code: 1,
            });
        }
        if self.staged.is_empty() {
            return Err(BackendError::NothingStaged);
        }

        let entry = CommitEntry {
            id: self.fresh_id(),
            timestamp: authored_at,
            message: message.lines().next().unwrap_or_default().to_string(),
        };
        let paths = std::mem::take(&mut self.staged);
        self.branches
            .entry(self.head.clone())
            .or_default()
            .push(MemoryCommit {
                entry: entry.clone(),
                paths,
            });
        Ok(entry)
    }

    fn commits(&self, order: LogOrder) -> Result<CommitIter<'_>, BackendError> {
        let entries = self.head_commits().iter().map(|c| Ok(c.entry.clone()));
        Ok(match order {
            LogOrder::OldestFirst => Box::new(entries),
            LogOrder::NewestFirst => Box::new(entries.rev()),
        })
    }

    fn create_branch(&mut self, name: &str, from: Option<&CommitId>) -> Result<(), BackendError> {
        if self.branches.contains_key(name) {
            return Err(BackendError::BranchExists(name.to_string()));
        }
        let history = self.head_commits();
        let prefix = match from {
            None => history.to_vec(),
            Some(id) => {
                let idx = history
                    .iter()
                    .position(|c| &c.entry.id == id)
                    .ok_or_else(|| BackendError::UnknownCommit(id.to_string()))?;
                history[..=idx].to_vec()
            }
        };
        self.branches.insert(name.to_string(), prefix);
        Ok(())
    }

    fn delete_branch(&mut self, name: &str) -> Result<(), BackendError> {
        if name == self.head {
            return Err(BackendError::BranchCheckedOut(name.to_string()));
        }
        self.branches
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| BackendError::BranchNotFound(name.to_string()))
    }

    fn checkout(&mut self, name: &str) -> Result<(), BackendError> {
        self.ensure_not_paused()?;
        if !self.branches.contains_key(name) {
            return Err(BackendError::BranchNotFound(name.to_string()));
        }
        self.head = name.to_string();
        Ok(())
    }

    fn current_branch(&self) -> Result<Option<String>, BackendError> {
        Ok(Some(self.head.clone()))
    }

    fn branches(&self) -> Result<Vec<BranchInfo>, BackendError> {
        Ok(self
            .branches
            .keys()
            .map(|name| BranchInfo {
                name: name.clone(),
                is_current: *name == self.head,
            })
            .collect())
    }

    fn rewrite_history(
        &mut self,
        base: Option<&CommitId>,
        sequence: &[CommitId],
    ) -> Result<RewriteOutcome, BackendError> {
        self.ensure_not_paused()?;
        let history = self.head_commits().to_vec();
        let split = match base {
            None => 0,
            Some(id) => {
                history
                    .iter()
                    .position(|c| &c.entry.id == id)
                    .ok_or_else(|| BackendError::UnknownCommit(id.to_string()))?
                    + 1
            }
        };
        let (kept, range) = history.split_at(split);
        let range_ids: Vec<CommitId> = range.iter().map(|c| c.entry.id.clone()).collect();
        check_rewrite_sequence(&range_ids, sequence)?;

        let remaining = sequence
            .iter()
            .filter_map(|id| range.iter().find(|c| &c.entry.id == id).cloned())
            .collect();
        let paused = PausedRewrite {
            branch: self.head.clone(),
            original_order: range_ids,
            kept: kept.to_vec(),
            applied: Vec::new(),
            remaining,
        };
        Ok(self.replay(paused, false))
    }

    fn rewrite_in_progress(&self) -> Result<bool, BackendError> {
        Ok(self.paused.is_some())
    }

    fn continue_rewrite(&mut self) -> Result<RewriteOutcome, BackendError> {
        let paused = self.paused.take().ok_or(BackendError::NoRewriteInProgress)?;
        Ok(self.replay(paused, true))
    }

    fn abort_rewrite(&mut self) -> Result<(), BackendError> {
        self.paused.take().ok_or(BackendError::NoRewriteInProgress)?;
        Ok(())
    }
}
