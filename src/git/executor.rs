//! git command executor
//!
//! Handles running git commands and capturing their output.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use chrono::{DateTime, FixedOffset};
use tracing::debug;

use super::constants::{self, commands, env, errors, flags, special};
use super::parser::Parser;
use super::template::Templates;
use crate::backend::{Backend, BackendError, CommitIter, LogOrder, RewriteOutcome};
use crate::model::{BranchInfo, CommitEntry, CommitId, Status};

/// Executor for git commands against one repository
#[derive(Debug, Clone)]
pub struct GitExecutor {
    /// Working tree top level
    root: PathBuf,
}

impl GitExecutor {
    /// Open the repository containing `path`
    ///
    /// Fails with [`BackendError::NotARepository`] when no git metadata exists
    /// at or above `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BackendError::NotARepository(path.to_path_buf()));
        }
        let probe = Self {
            root: path.to_path_buf(),
        };
        let toplevel = probe
            .run(&[commands::REV_PARSE, flags::SHOW_TOPLEVEL])
            .map_err(|e| match e {
                BackendError::NotARepository(_) => BackendError::NotARepository(path.to_path_buf()),
                other => other,
            })?;
        let root = PathBuf::from(toplevel.trim());
        debug!(root = %root.display(), "opened repository");
        Ok(Self { root })
    }

    /// Spawn git with the given arguments and environment, capturing output
    ///
    /// Does not interpret the exit status.
    pub(super) fn output<I, K, V>(&self, args: &[&str], envs: I) -> Result<Output, BackendError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        let mut cmd = Command::new(constants::GIT_COMMAND);
        cmd.arg(flags::REPO_PATH).arg(&self.root);
        cmd.args(args);
        cmd.env(env::LOCALE, "C");
        cmd.envs(envs);

        let output = cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BackendError::GitNotFound
            } else {
                BackendError::IoError(e)
            }
        })?;
        debug!(
            args = ?args,
            code = ?output.status.code(),
            "git"
        );
        Ok(output)
    }

    /// Run a git command, returning stdout on success
    pub fn run(&self, args: &[&str]) -> Result<String, BackendError> {
        self.run_with_env(args, std::iter::empty::<(&str, &str)>())
    }

    /// Run a git command with extra environment variables
    pub fn run_with_env<I, K, V>(&self, args: &[&str], envs: I) -> Result<String, BackendError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        let output = self.output(args, envs)?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(self.failure(args, &output))
        }
    }

    /// Run a git command whose exit status is the answer (0 = yes, 1 = no)
    pub fn run_check(&self, args: &[&str]) -> Result<bool, BackendError> {
        let output = self.output(args, std::iter::empty::<(&str, &str)>())?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(self.failure(args, &output)),
        }
    }

    /// Build the error for a failed command
    pub(super) fn failure(&self, args: &[&str], output: &Output) -> BackendError {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if stderr.contains(errors::NOT_A_REPO) {
            return BackendError::NotARepository(self.root.clone());
        }
        BackendError::CommandFailed {
            command: args.first().copied().unwrap_or_default().to_string(),
            stderr: stderr.trim().to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        }
    }

    /// Run `git status --porcelain`
    pub fn status(&self) -> Result<Status, BackendError> {
        let output = self.run(&[commands::STATUS, flags::PORCELAIN, flags::UNTRACKED_ALL])?;
        Parser::parse_status(&output)
    }

    /// Whether HEAD points at a commit (false on an unborn branch)
    pub fn has_commits(&self) -> Result<bool, BackendError> {
        self.run_check(&[
            commands::REV_PARSE,
            flags::VERIFY,
            flags::QUIET_SHORT,
            special::HEAD,
        ])
    }

    /// Whether a local branch exists
    pub fn branch_exists(&self, name: &str) -> Result<bool, BackendError> {
        let reference = format!("{}{}", special::HEADS_PREFIX, name);
        self.run_check(&[commands::SHOW_REF, flags::VERIFY, flags::QUIET, &reference])
    }

    /// Resolve a path inside the git directory (e.g. `rebase-merge`)
    pub fn git_path(&self, name: &str) -> Result<PathBuf, BackendError> {
        let output = self.run(&[commands::REV_PARSE, flags::GIT_PATH, name])?;
        let path = PathBuf::from(output.trim());
        Ok(if path.is_absolute() {
            path
        } else {
            self.root.join(path)
        })
    }

    /// Ref whose history makes up the current timeline
    ///
    /// During a paused rebase HEAD is detached partway through the replay, so
    /// the branch being rebased is used instead.
    fn timeline_ref(&self) -> Result<String, BackendError> {
        let head_name = self
            .git_path(special::REBASE_MERGE_DIR)?
            .join(special::REBASE_HEAD_NAME);
        match std::fs::read_to_string(&head_name) {
            Ok(name) if !name.trim().is_empty() => Ok(name.trim().to_string()),
            _ => Ok(special::HEAD.to_string()),
        }
    }

    /// Run `git log` for the current timeline
    pub fn log_raw(&self, order: LogOrder) -> Result<String, BackendError> {
        let reference = self.timeline_ref()?;
        let mut args = vec![commands::LOG, flags::FIRST_PARENT, Templates::log()];
        if order == LogOrder::OldestFirst {
            args.push(flags::REVERSE);
        }
        args.push(&reference);
        args.push(flags::END_OF_OPTIONS);
        self.run(&args)
    }

    /// Read back a single commit
    fn show_commit(&self, rev: &str) -> Result<CommitEntry, BackendError> {
        let output = self.run(&[commands::LOG, flags::MAX_ONE, Templates::log(), rev, flags::END_OF_OPTIONS])?;
        let line = output.lines().next().unwrap_or_default();
        Parser::parse_log_record(line)
    }
}

/// Commits from captured `git log` output, parsed one line at a time
struct LogRecords {
    output: String,
    offset: usize,
}

impl Iterator for LogRecords {
    type Item = Result<CommitEntry, BackendError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.offset >= self.output.len() {
                return None;
            }
            let rest = &self.output[self.offset..];
            let end = rest.find('\n').unwrap_or(rest.len());
            let line = &rest[..end];
            self.offset += end + 1;
            if !line.trim().is_empty() {
                return Some(Parser::parse_log_record(line));
            }
        }
    }
}

impl Backend for GitExecutor {
    fn root(&self) -> &Path {
        &self.root
    }

    fn dirty_paths(&self) -> Result<Vec<PathBuf>, BackendError> {
        Ok(self
            .status()?
            .files
            .into_iter()
            .map(|f| PathBuf::from(f.path))
            .collect())
    }

    fn conflicted_paths(&self) -> Result<Vec<PathBuf>, BackendError> {
        Ok(self
            .status()?
            .conflicted()
            .map(|f| PathBuf::from(&f.path))
            .collect())
    }

    fn stage(&mut self, paths: &[PathBuf]) -> Result<(), BackendError> {
        if let Some(missing) = paths.iter().find(|p| !self.root.join(p).exists()) {
            return Err(BackendError::PathNotFound(missing.clone()));
        }
        let path_args: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        let mut args = vec![commands::ADD, flags::END_OF_OPTIONS];
        args.extend(path_args.iter().map(String::as_str));
        self.run(&args)?;
        Ok(())
    }

    fn unstage(&mut self, paths: &[PathBuf]) -> Result<(), BackendError> {
        if paths.is_empty() {
            return Ok(());
        }
        // Also works on an unborn branch, where the index is reset to empty
        let path_args: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        let mut args = vec![commands::RESET, flags::QUIET_SHORT, flags::END_OF_OPTIONS];
        args.extend(path_args.iter().map(String::as_str));
        self.run(&args)?;
        Ok(())
    }

    fn commit(
        &mut self,
        message: &str,
        authored_at: DateTime<FixedOffset>,
        committed_at: DateTime<FixedOffset>,
    ) -> Result<CommitEntry, BackendError> {
        // `diff --cached --quiet` exits 0 when the index matches HEAD
        if self.run_check(&[commands::DIFF, flags::CACHED, flags::QUIET])? {
            return Err(BackendError::NothingStaged);
        }

        let author_date = format!("{}={}", flags::DATE, authored_at.to_rfc3339());
        self.run_with_env(
            &[commands::COMMIT, flags::MESSAGE, message, &author_date],
            [(env::COMMITTER_DATE, committed_at.to_rfc3339())],
        )?;
        self.show_commit(special::HEAD)
    }

    fn commits(&self, order: LogOrder) -> Result<CommitIter<'_>, BackendError> {
        if !self.has_commits()? {
            return Ok(Box::new(std::iter::empty()));
        }
        let output = self.log_raw(order)?;
        Ok(Box::new(LogRecords { output, offset: 0 }))
    }

    fn create_branch(&mut self, name: &str, from: Option<&CommitId>) -> Result<(), BackendError> {
        if self.branch_exists(name)? {
            return Err(BackendError::BranchExists(name.to_string()));
        }
        let mut args = vec![commands::BRANCH, name];
        if let Some(id) = from {
            args.push(id.as_str());
        }
        self.run(&args)?;
        Ok(())
    }

    fn delete_branch(&mut self, name: &str) -> Result<(), BackendError> {
        if self.current_branch()?.as_deref() == Some(name) {
            return Err(BackendError::BranchCheckedOut(name.to_string()));
        }
        if !self.branch_exists(name)? {
            return Err(BackendError::BranchNotFound(name.to_string()));
        }
        self.run(&[commands::BRANCH, flags::FORCE_DELETE, name])?;
        Ok(())
    }

    fn checkout(&mut self, name: &str) -> Result<(), BackendError> {
        if self.rewrite_in_progress()? {
            return Err(BackendError::RewriteInProgress);
        }
        if !self.branch_exists(name)? {
            return Err(BackendError::BranchNotFound(name.to_string()));
        }
        self.run(&[commands::SWITCH, name])?;
        Ok(())
    }

    fn current_branch(&self) -> Result<Option<String>, BackendError> {
        let output = self.run(&[commands::BRANCH, flags::SHOW_CURRENT])?;
        let name = output.trim();
        Ok((!name.is_empty()).then(|| name.to_string()))
    }

    fn branches(&self) -> Result<Vec<BranchInfo>, BackendError> {
        let format = format!("{}={}", flags::FORMAT, Templates::branch_list());
        let output = self.run(&[commands::BRANCH, flags::LIST, &format])?;
        Ok(Parser::parse_branch_list(&output))
    }

    fn rewrite_history(
        &mut self,
        base: Option<&CommitId>,
        sequence: &[CommitId],
    ) -> Result<RewriteOutcome, BackendError> {
        self.rebase_reordered(base, sequence)
    }

    fn rewrite_in_progress(&self) -> Result<bool, BackendError> {
        Ok(self.git_path(special::REBASE_MERGE_DIR)?.is_dir())
    }

    fn continue_rewrite(&mut self) -> Result<RewriteOutcome, BackendError> {
        self.rebase_continue()
    }

    fn abort_rewrite(&mut self) -> Result<(), BackendError> {
        self.rebase_abort()
    }
}
