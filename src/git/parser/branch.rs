//! Branch list parser (git branch --format)

use super::super::template::FIELD_SEPARATOR;
use super::Parser;
use crate::model::BranchInfo;

impl Parser {
    /// Parse `git branch --list --format=<Templates::branch_list>` output
    ///
    /// Lines without a separator (detached HEAD placeholders) are skipped.
    pub fn parse_branch_list(output: &str) -> Vec<BranchInfo> {
        output
            .lines()
            .filter_map(|line| {
                let (marker, name) = line.split_once(FIELD_SEPARATOR)?;
                let name = name.trim();
                if name.is_empty() || name.starts_with('(') {
                    return None;
                }
                Some(BranchInfo {
                    name: name.to_string(),
                    is_current: marker.trim() == "*",
                })
            })
            .collect()
    }
}
