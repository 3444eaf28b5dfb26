//! Status output parser (git status --porcelain)

use super::Parser;
use crate::backend::BackendError;
use crate::model::{FileState, FileStatus, Status};

/// Characters git uses in the two-letter porcelain v1 status code
const STATUS_CODES: &str = " MTADRCU?!";

impl Parser {
    /// Parse `git status --porcelain` (v1) output
    pub fn parse_status(output: &str) -> Result<Status, BackendError> {
        let mut files = Vec::new();

        for line in output.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let file_status = Self::parse_status_line(line).ok_or_else(|| {
                BackendError::ParseError(format!("Unrecognized status line: {:?}", line))
            })?;
            files.push(file_status);
        }

        Ok(Status { files })
    }

    /// Parse a single porcelain line into FileStatus
    ///
    /// Formats:
    /// - "XY path" (X = index, Y = working tree, "??" untracked)
    /// - "R  old -> new", "C  old -> new" (renamed or copied)
    /// - "UU path", "AA path", ... (unmerged)
    pub(super) fn parse_status_line(line: &str) -> Option<FileStatus> {
        let code = line.get(..2)?;
        let rest = line.get(3..)?.trim();
        if rest.is_empty() {
            return None;
        }

        let mut chars = code.chars();
        let index = chars.next()?;
        let worktree = chars.next()?;
        if !STATUS_CODES.contains(index) || !STATUS_CODES.contains(worktree) {
            return None;
        }

        let path = match (index, worktree) {
            ('R' | 'C', _) | (_, 'R' | 'C') => rest.split_once(" -> ").map_or(rest, |(_, to)| to),
            _ => rest,
        };
        let state = match (index, worktree) {
            ('U', _) | (_, 'U') | ('A', 'A') | ('D', 'D') => FileState::Conflicted,
            _ => FileState::Changed,
        };

        Some(FileStatus {
            path: unquote(path),
            state,
        })
    }
}

/// Undo the C-style quoting git applies to unusual paths
///
/// Non-ASCII bytes arrive as octal escapes (`\303\251`) and are decoded back
/// to UTF-8.
fn unquote(path: &str) -> String {
    let Some(inner) = path.strip_prefix('"').and_then(|p| p.strip_suffix('"')) else {
        return path.to_string();
    };

    let raw = inner.as_bytes();
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] != b'\\' || i + 1 == raw.len() {
            bytes.push(raw[i]);
            i += 1;
            continue;
        }
        let octal = raw
            .get(i + 1..i + 4)
            .filter(|digits| digits.iter().all(|d| (b'0'..=b'7').contains(d)));
        if let Some(digits) = octal {
            bytes.push(
                digits
                    .iter()
                    .fold(0u8, |acc, d| acc.wrapping_mul(8).wrapping_add(d - b'0')),
            );
            i += 4;
            continue;
        }
        bytes.push(match raw[i + 1] {
            b'a' => 0x07,
            b'b' => 0x08,
            b'f' => 0x0c,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'v' => 0x0b,
            other => other,
        });
        i += 2;
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
