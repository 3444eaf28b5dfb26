//! git command execution layer
//!
//! This module handles executing git commands and parsing their output.
//! [`GitExecutor`] is the production [`crate::backend::Backend`].

pub mod constants;
mod executor;
/// Parser module (public for integration testing)
pub mod parser;
mod rewrite;
mod template;

pub use executor::GitExecutor;
