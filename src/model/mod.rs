//! Data models for lifeline
//!
//! This module contains backend-independent data structures: the event being
//! recorded, the commits that record it, and the timeline they form.

mod branch;
mod commit;
mod event;
mod file_status;
mod timeline;

pub use branch::BranchInfo;
pub use commit::{CommitEntry, CommitId};
pub use event::{EARLIEST_DATE, EventRecord, EventSummary, LATEST_DATE, parse_date, slugify};
pub use file_status::{FileState, FileStatus, Status};
pub use timeline::CommitTimeline;
