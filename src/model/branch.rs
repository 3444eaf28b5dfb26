//! Branch model (alternate timelines)

/// A local branch as listed by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInfo {
    /// Branch name (e.g., "main", "moved-to-lisbon")
    pub name: String,
    /// Whether this branch is checked out
    pub is_current: bool,
}

impl BranchInfo {
    /// Marker shown next to the branch name in listings
    pub fn marker(&self) -> char {
        if self.is_current { '*' } else { ' ' }
    }
}
