use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] corkboard_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Invalid timestamp {0:?}: expected RFC 3339, e.g. 2026-05-01T08:00:00Z")]
    InvalidTimestamp(String),
    #[error("Share code count must be at least 1")]
    EmptyCodeCount,
    #[error("Could not determine a configuration directory; pass --prefs-dir")]
    NoConfigDir,
    #[error("Save was superseded before it ran")]
    SaveSuperseded,
}
