//! Timeline operations on one repository
//!
//! [`Lifeline`] ties the pieces together: settings, the event files on disk,
//! and the backend that records them. Each method is one user-level action.

use std::path::{Path, PathBuf};

use scopeguard::ScopeGuard;
use tracing::{info, warn};

use crate::backend::{Backend, BackendError, RewriteOutcome};
use crate::config::Config;
use crate::engine::{InsertOutcome, InsertionEngine};
use crate::error::LifelineError;
use crate::git::GitExecutor;
use crate::model::{BranchInfo, CommitEntry, CommitId, CommitTimeline, EventRecord, EventSummary};
use crate::store::EventStore;

/// User input for a new event, before validation
#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub title: String,
    pub date: String,
    pub event_type: String,
    pub description: String,
    pub media: Vec<PathBuf>,
}

/// Result of checking the current timeline's order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReport {
    pub branch: Option<String>,
    pub commits: usize,
    /// Adjacent pairs where the later commit is dated before the earlier one
    pub violations: Vec<(CommitEntry, CommitEntry)>,
}

impl OrderReport {
    pub fn is_chronological(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A life timeline kept in a repository
#[derive(Debug)]
pub struct Lifeline<B: Backend = GitExecutor> {
    backend: B,
    store: EventStore,
    config: Config,
}

impl Lifeline<GitExecutor> {
    /// Open the git repository containing `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LifelineError> {
        Self::with_backend(GitExecutor::open(path)?)
    }
}

impl<B: Backend> Lifeline<B> {
    /// Use an already-open backend, loading settings from its root
    pub fn with_backend(backend: B) -> Result<Self, LifelineError> {
        let config = Config::load(backend.root())?;
        Ok(Self::with_config(backend, config))
    }

    pub fn with_config(backend: B, config: Config) -> Self {
        let store = EventStore::new(backend.root());
        Self {
            backend,
            store,
            config,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    /// Validate raw input against the configured event types
    pub fn validate(&self, input: &NewEvent) -> Result<EventRecord, LifelineError> {
        let event = EventRecord::new(
            &input.title,
            &input.date,
            &input.event_type,
            &input.description,
            &self.config.event_types,
        )?
        .with_media(input.media.clone())?;
        Ok(event)
    }

    /// Record an event in chronological position
    ///
    /// With `branch`, a new alternate timeline is created from the current
    /// one, checked out, and the event is appended to it.
    ///
    /// Until the event is committed, a failure leaves the repository as it
    /// was: written files are unstaged and removed, and a branch created for
    /// the event is deleted again.
    pub fn add_event(
        &mut self,
        input: &NewEvent,
        branch: Option<&str>,
    ) -> Result<InsertOutcome, LifelineError> {
        let event = self.validate(input)?;
        self.ensure_ready()?;
        self.store.ensure_absent(&event)?;

        let store = &self.store;
        let written = scopeguard::guard(store.write(&event)?, |paths| {
            store.discard(&event, &paths);
        });

        // Untracked event files carry over when switching to the new branch
        let previous = match branch {
            Some(name) => {
                let previous = self.backend.current_branch()?;
                self.backend.create_branch(name, None)?;
                if let Err(err) = self.backend.checkout(name) {
                    undo_branch(&mut self.backend, name, None);
                    return Err(err.into());
                }
                info!(branch = name, "switched to new timeline");
                previous
            }
            None => None,
        };

        let mut engine = InsertionEngine::new(&mut self.backend);
        let outcome = if branch.is_some() {
            engine.append(&event, &written)
        } else {
            engine.insert(&event, &written)
        };

        match &outcome {
            // From here on the event lives in a commit
            Ok(_) | Err(LifelineError::OrderingNotGuaranteed { .. }) => {
                ScopeGuard::into_inner(written);
            }
            Err(err) => {
                warn!(%err, "event was not committed; removing its files");
                if let Some(name) = branch {
                    undo_branch(&mut self.backend, name, previous.as_deref());
                }
            }
        }
        outcome
    }

    /// Create an alternate timeline at `from` (the tip when `None`) and switch to it
    pub fn create_branch(&mut self, name: &str, from: Option<&str>) -> Result<(), LifelineError> {
        self.ensure_ready()?;
        let from = from.map(CommitId::from);
        self.backend.create_branch(name, from.as_ref())?;
        self.backend.checkout(name)?;
        Ok(())
    }

    pub fn switch_branch(&mut self, name: &str) -> Result<(), LifelineError> {
        self.ensure_ready()?;
        self.backend.checkout(name)?;
        Ok(())
    }

    pub fn branches(&self) -> Result<Vec<BranchInfo>, LifelineError> {
        Ok(self.backend.branches()?)
    }

    pub fn current_branch(&self) -> Result<Option<String>, LifelineError> {
        Ok(self.backend.current_branch()?)
    }

    /// Events present in the working tree, by date
    pub fn list_events(&self) -> Result<Vec<EventSummary>, LifelineError> {
        self.store.list()
    }

    /// Compare commit order with commit dates on the current timeline
    pub fn check(&self) -> Result<OrderReport, LifelineError> {
        let timeline = CommitTimeline::build(&self.backend)?;
        let violations = timeline
            .out_of_order()
            .into_iter()
            .map(|(earlier, later)| (earlier.clone(), later.clone()))
            .collect();
        Ok(OrderReport {
            branch: self.backend.current_branch()?,
            commits: timeline.len(),
            violations,
        })
    }

    /// Resume a rewrite paused on a conflict, after the user resolved it
    pub fn continue_rewrite(&mut self) -> Result<RewriteOutcome, LifelineError> {
        Ok(self.backend.continue_rewrite()?)
    }

    /// Files the paused rewrite left unmerged
    pub fn conflicted_files(&self) -> Result<Vec<PathBuf>, LifelineError> {
        Ok(self.backend.conflicted_paths()?)
    }

    /// Abandon a paused rewrite; events stay committed at the tip
    pub fn abort_rewrite(&mut self) -> Result<(), LifelineError> {
        self.backend.abort_rewrite()?;
        Ok(())
    }

    /// Refuse to touch history while a rewrite is paused or the tree is dirty
    fn ensure_ready(&self) -> Result<(), LifelineError> {
        if self.backend.rewrite_in_progress()? {
            return Err(BackendError::RewriteInProgress.into());
        }
        let dirty = self.backend.dirty_paths()?;
        if !dirty.is_empty() {
            return Err(LifelineError::DirtyWorkingTree(
                dirty
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect(),
            ));
        }
        Ok(())
    }
}

/// Drop a branch created for an event that was never committed, switching
/// back to `previous` first when the branch is checked out
fn undo_branch<B: Backend>(backend: &mut B, name: &str, previous: Option<&str>) {
    if let Some(previous) = previous
        && let Err(err) = backend.checkout(previous)
    {
        warn!(branch = previous, %err, "could not switch back");
        return;
    }
    if let Err(err) = backend.delete_branch(name) {
        warn!(branch = name, %err, "could not delete branch created for the event");
    }
}
