//! Working tree status data model

/// Overall working tree status
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Status {
    /// Changed, staged, untracked, and unmerged files
    pub files: Vec<FileStatus>,
}

impl Status {
    /// Files left unmerged by a stopped rewrite
    pub fn conflicted(&self) -> impl Iterator<Item = &FileStatus> {
        self.files
            .iter()
            .filter(|f| matches!(f.state, FileState::Conflicted))
    }
}

/// Status of a single file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    /// Repository-relative path (the new path for renames and copies)
    pub path: String,

    pub state: FileState,
}

/// Possible states for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Any staged, unstaged, or untracked change
    Changed,
    /// Unmerged after a stopped rewrite
    Conflicted,
}
