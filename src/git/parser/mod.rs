//! git output parser
//!
//! Parses the output from git commands into structured data.

mod branch;
mod log;
mod status;


/// Parser for git command output
pub struct Parser;
