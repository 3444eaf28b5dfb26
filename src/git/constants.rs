//! git-specific constants
//!
//! Centralized definitions for git command names, flags, and special values.

/// git command binary name
pub const GIT_COMMAND: &str = "git";

/// git subcommands
pub mod commands {
    pub const REV_PARSE: &str = "rev-parse";
    pub const STATUS: &str = "status";
    pub const ADD: &str = "add";
    pub const RESET: &str = "reset";
    pub const COMMIT: &str = "commit";
    pub const DIFF: &str = "diff";
    pub const LOG: &str = "log";
    pub const BRANCH: &str = "branch";
    pub const SHOW_REF: &str = "show-ref";
    pub const SWITCH: &str = "switch";
    pub const REBASE: &str = "rebase";
    pub const REV_LIST: &str = "rev-list";
}

/// git command flags
pub mod flags {
    /// Run as if git was started in the given directory
    pub const REPO_PATH: &str = "-C";
    /// Machine-readable status output
    pub const PORCELAIN: &str = "--porcelain";
    /// Include untracked files in status output
    pub const UNTRACKED_ALL: &str = "--untracked-files=all";
    /// Compare the index instead of the working tree
    pub const CACHED: &str = "--cached";
    /// Exit with 1 when differences exist, print nothing
    pub const QUIET: &str = "--quiet";
    /// Verify a ref without output
    pub const VERIFY: &str = "--verify";
    /// Quiet mode for ref verification and reset
    pub const QUIET_SHORT: &str = "-q";
    /// Follow only the first parent (the main timeline)
    pub const FIRST_PARENT: &str = "--first-parent";
    /// Oldest-first traversal
    pub const REVERSE: &str = "--reverse";
    /// Commit message
    pub const MESSAGE: &str = "-m";
    /// Author date override
    pub const DATE: &str = "--date";
    /// Interactive rebase
    pub const INTERACTIVE: &str = "-i";
    /// Rebase from the root commit
    pub const ROOT: &str = "--root";
    /// Keep committer dates equal to the (event) author dates on replay
    pub const COMMITTER_DATE_IS_AUTHOR_DATE: &str = "--committer-date-is-author-date";
    /// Continue a paused rebase
    pub const CONTINUE: &str = "--continue";
    /// Abort a paused rebase
    pub const ABORT: &str = "--abort";
    /// Repository top-level directory
    pub const SHOW_TOPLEVEL: &str = "--show-toplevel";
    /// Resolve a path inside the git directory
    pub const GIT_PATH: &str = "--git-path";
    /// Name of the checked-out branch
    pub const SHOW_CURRENT: &str = "--show-current";
    /// List branches
    pub const LIST: &str = "--list";
    /// Delete a branch even if it is not merged
    pub const FORCE_DELETE: &str = "-D";
    /// Skip merge commits
    pub const NO_MERGES: &str = "--no-merges";
    /// Limit output to one commit
    pub const MAX_ONE: &str = "-1";
    /// Branch listing format
    pub const FORMAT: &str = "--format";
    /// End of options
    pub const END_OF_OPTIONS: &str = "--";
}

/// Environment variables understood by git
pub mod env {
    /// Forces untranslated messages so error patterns match
    pub const LOCALE: &str = "LC_ALL";
    pub const COMMITTER_DATE: &str = "GIT_COMMITTER_DATE";
    pub const SEQUENCE_EDITOR: &str = "GIT_SEQUENCE_EDITOR";
    pub const EDITOR: &str = "GIT_EDITOR";
}

/// Special git values
pub mod special {
    pub const HEAD: &str = "HEAD";
    /// Prefix of local branch refs
    pub const HEADS_PREFIX: &str = "refs/heads/";
    /// Directory git keeps while an interactive rebase is in progress
    pub const REBASE_MERGE_DIR: &str = "rebase-merge";
    /// File inside the rebase directory naming the branch being rebased
    pub const REBASE_HEAD_NAME: &str = "head-name";
    /// Editor command that accepts whatever git prepared
    pub const NO_OP_EDITOR: &str = "true";
}

/// Error detection patterns in git output
pub mod errors {
    /// Pattern indicating not a git repository
    pub const NOT_A_REPO: &str = "not a git repository";
    /// Line prefixes git uses to describe a stopped rebase
    pub const CONFLICT_MARKERS: &[&str] = &["CONFLICT", "error: could not apply", "Could not apply"];
}
