//! Log output parser (git log)

use chrono::DateTime;

use super::super::template::FIELD_SEPARATOR;
use super::Parser;
use crate::backend::BackendError;
use crate::model::{CommitEntry, CommitId};

impl Parser {
    /// Parse `git log` output into commit entries, in output order
    pub fn parse_log(output: &str) -> Result<Vec<CommitEntry>, BackendError> {
        output
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(Self::parse_log_record)
            .collect()
    }

    /// Parse a single log record (one line, tab-separated fields)
    ///
    /// Fields: hash, author date (strict ISO 8601), subject
    pub fn parse_log_record(record: &str) -> Result<CommitEntry, BackendError> {
        let mut fields = record.splitn(3, FIELD_SEPARATOR);
        let (Some(hash), Some(date)) = (fields.next(), fields.next()) else {
            return Err(BackendError::ParseError(format!(
                "Expected hash and date fields: {:?}",
                record
            )));
        };

        let hash = hash.trim();
        if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(BackendError::ParseError(format!(
                "Invalid commit hash: {:?}",
                hash
            )));
        }

        let timestamp = DateTime::parse_from_rfc3339(date.trim()).map_err(|e| {
            BackendError::ParseError(format!("Invalid author date {:?}: {}", date, e))
        })?;

        Ok(CommitEntry {
            id: CommitId::new(hash),
            timestamp,
            message: fields.next().unwrap_or_default().to_string(),
        })
    }
}
