//! Lifeline - a life timeline kept in git
//!
//! Events are markdown files committed to a git repository, one commit per
//! event, dated when the event happened. Adding an event from the past
//! rewrites history so commits stay in chronological order; branches hold
//! alternate timelines.
//!
//! This library provides:
//! - [`app`]: User-level timeline operations
//! - [`backend`]: Repository accessor trait and in-memory implementation
//! - [`config`]: Per-repository settings
//! - [`engine`]: Chronological insertion of new commits
//! - [`git`]: git command execution and parsing
//! - [`model`]: Domain models
//! - [`store`]: Event files in the working tree

pub mod app;
pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod git;
pub mod model;
pub mod store;

pub use app::{Lifeline, NewEvent, OrderReport};
pub use engine::InsertOutcome;
pub use error::{LifelineError, ValidationError};
