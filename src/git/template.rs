//! git format definitions for stable output parsing
//!
//! These formats ensure consistent, parseable output from git commands
//! regardless of user configuration.

/// Separator used between fields in formatted output (tab character)
pub const FIELD_SEPARATOR: char = '\t';

/// Formats for git commands
pub struct Templates;

impl Templates {
    /// Format for `git log` output
    ///
    /// Fields (separated by tab):
    /// 1. commit hash (full)
    /// 2. author date (strict ISO 8601)
    /// 3. subject (first line of the message)
    ///
    /// Notes:
    /// - `%x09` is git's escape for a literal tab.
    /// - The subject goes last so a stray tab in it cannot shift other fields.
    pub fn log() -> &'static str {
        "--format=%H%x09%aI%x09%s"
    }

    /// Format for `git branch --list`
    ///
    /// Fields (separated by tab):
    /// 1. `*` for the checked-out branch, blank otherwise
    /// 2. short branch name
    pub fn branch_list() -> &'static str {
        "%(HEAD)%09%(refname:short)"
    }
}
