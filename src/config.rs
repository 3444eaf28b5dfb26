//! Per-repository settings read from `.lifeline.toml`

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::LifelineError;

/// Settings file name, at the repository root
pub const CONFIG_FILE: &str = ".lifeline.toml";

/// Event types used when no settings file says otherwise
pub const DEFAULT_EVENT_TYPES: &[&str] = &["life", "education", "work", "travel", "health"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Closed set of allowed event types
    #[serde(default = "default_event_types")]
    pub event_types: Vec<String>,
}

fn default_event_types() -> Vec<String> {
    DEFAULT_EVENT_TYPES.iter().map(|t| t.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            event_types: default_event_types(),
        }
    }
}

impl Config {
    /// Load `.lifeline.toml` from `root`, or defaults when it is absent
    pub fn load(root: &Path) -> Result<Self, LifelineError> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)?;
        Self::parse(&raw).map_err(|message| LifelineError::Config { path, message })
    }

    fn parse(raw: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(raw).map_err(|err| err.message().to_string())?;
        if config.event_types.is_empty() {
            return Err("event_types must not be empty".to_string());
        }
        if let Some(blank) = config.event_types.iter().find(|t| t.trim().is_empty()) {
            return Err(format!("event type {:?} is blank", blank));
        }
        Ok(config)
    }

    pub fn path(root: &Path) -> PathBuf {
        root.join(CONFIG_FILE)
    }
}
