use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use corkboard_core::config::CorkboardConfig;

use crate::error::CliError;

/// Built-in defaults, then the optional JSON file, then `CORKBOARD_*` variables.
pub fn load_config(path: Option<&Path>) -> Result<CorkboardConfig, CliError> {
    let config = match path {
        Some(path) => CorkboardConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => CorkboardConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, CliError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| CliError::InvalidTimestamp(raw.to_string()))
}

pub fn default_prefs_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("corkboard"))
}
