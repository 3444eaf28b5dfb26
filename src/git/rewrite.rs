//! History rewrite via interactive rebase
//!
//! git asks an editor for the rebase todo list; these methods hand it a
//! prepared list instead by pointing `GIT_SEQUENCE_EDITOR` at a copy command.
//! Separated from executor.rs because a stopped rebase is an expected outcome
//! here rather than a command failure.

use std::io::Write;
use std::process::Output;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::constants::{commands, env, errors, flags, special};
use super::executor::GitExecutor;
use crate::backend::{Backend, BackendError, RewriteOutcome, check_rewrite_sequence};
use crate::model::CommitId;

impl GitExecutor {
    /// Replay the commits after `base` in the order of `sequence`
    ///
    /// Runs `git rebase -i` from `base` (or `--root`) with a todo list of one
    /// `pick` per commit. Author dates are kept and committer dates follow
    /// them. A stop on conflict leaves the rebase paused and is reported as
    /// [`RewriteOutcome::Conflict`].
    pub fn rebase_reordered(
        &self,
        base: Option<&CommitId>,
        sequence: &[CommitId],
    ) -> Result<RewriteOutcome, BackendError> {
        if self.rewrite_in_progress()? {
            return Err(BackendError::RewriteInProgress);
        }
        let replayed = self.commits_after(base)?;
        check_rewrite_sequence(&replayed, sequence)?;

        let mut todo = NamedTempFile::new()?;
        for id in sequence {
            writeln!(todo, "pick {}", id)?;
        }
        todo.flush()?;
        let editor = format!("cp {}", shell_quote(&todo.path().to_string_lossy()));

        let mut args = vec![
            commands::REBASE,
            flags::INTERACTIVE,
            flags::COMMITTER_DATE_IS_AUTHOR_DATE,
        ];
        match base {
            Some(id) => args.push(id.as_str()),
            None => args.push(flags::ROOT),
        }

        debug!(base = ?base.map(CommitId::short), commits = sequence.len(), "rebasing");
        let output = self.output(
            &args,
            [
                (env::SEQUENCE_EDITOR, editor.as_str()),
                (env::EDITOR, special::NO_OP_EDITOR),
            ],
        )?;
        self.rebase_outcome(&args, &output)
    }

    /// Resume a paused rebase after the user staged their resolution
    pub fn rebase_continue(&self) -> Result<RewriteOutcome, BackendError> {
        if !self.rewrite_in_progress()? {
            return Err(BackendError::NoRewriteInProgress);
        }
        let args = [commands::REBASE, flags::CONTINUE];
        let output = self.output(&args, [(env::EDITOR, special::NO_OP_EDITOR)])?;
        self.rebase_outcome(&args, &output)
    }

    /// Abandon a paused rebase, restoring the branch
    pub fn rebase_abort(&self) -> Result<(), BackendError> {
        if !self.rewrite_in_progress()? {
            return Err(BackendError::NoRewriteInProgress);
        }
        self.run(&[commands::REBASE, flags::ABORT])?;
        Ok(())
    }

    /// Non-merge commits after `base` on HEAD, oldest first
    ///
    /// This is the set `git rebase` will replay.
    fn commits_after(&self, base: Option<&CommitId>) -> Result<Vec<CommitId>, BackendError> {
        let range = match base {
            Some(id) => format!("{}..{}", id, special::HEAD),
            None => special::HEAD.to_string(),
        };
        let output = self.run(&[
            commands::REV_LIST,
            flags::REVERSE,
            flags::NO_MERGES,
            &range,
            flags::END_OF_OPTIONS,
        ])?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(CommitId::new)
            .collect())
    }

    fn rebase_outcome(&self, args: &[&str], output: &Output) -> Result<RewriteOutcome, BackendError> {
        if output.status.success() {
            return Ok(RewriteOutcome::Success);
        }
        if self.rewrite_in_progress()? {
            let detail = conflict_detail(output);
            warn!(%detail, "rebase stopped");
            return Ok(RewriteOutcome::Conflict { detail });
        }
        Err(self.failure(args, output))
    }
}

/// Lines of rebase output that describe why it stopped
fn conflict_detail(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stdout
        .lines()
        .chain(stderr.lines())
        .filter(|line| {
            errors::CONFLICT_MARKERS
                .iter()
                .any(|marker| line.starts_with(marker))
        })
        .collect();
    if lines.is_empty() {
        stderr.trim().to_string()
    } else {
        lines.join("\n")
    }
}

/// Single-quote a string for `sh`
fn shell_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', r"'\''"))
}
