//! Runtime configuration for sync timing and gesture limits.
//!
//! Values come from built-in defaults, an optional JSON document, and
//! `CORKBOARD_*` environment overrides, applied in that order.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::ScaleRange;

pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 10;

const ENV_DEBOUNCE_MS: &str = "CORKBOARD_DEBOUNCE_MS";
const ENV_MAX_CONFLICT_RETRIES: &str = "CORKBOARD_MAX_CONFLICT_RETRIES";

/// Save protocol tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SyncConfig {
    /// Quiet period before a requested save is sent
    pub debounce_ms: u64,
    /// Conflicting saves tolerated before giving up
    pub max_conflict_retries: u32,
}

impl SyncConfig {
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

/// Clamp ranges applied when a gesture resizes an item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GestureLimits {
    pub sticky_note_scale: ScaleRange,
    pub sticker_scale: ScaleRange,
    /// Side of the square board image frame, in points
    pub board_image_frame: ScaleRange,
}

impl Default for GestureLimits {
    fn default() -> Self {
        Self {
            sticky_note_scale: ScaleRange::new(0.5, 3.0),
            sticker_scale: ScaleRange::new(0.5, 2.0),
            board_image_frame: ScaleRange::new(150.0, 400.0),
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CorkboardConfig {
    pub sync: SyncConfig,
    pub gestures: GestureLimits,
}

impl CorkboardConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(payload: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(payload)
            .map_err(|error| Error::Config(format!("invalid config JSON: {error}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CORKBOARD_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (testable without env vars).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(value) = override_number(&lookup, ENV_DEBOUNCE_MS)? {
            self.sync.debounce_ms = value;
        }
        if let Some(value) = override_number(&lookup, ENV_MAX_CONFLICT_RETRIES)? {
            self.sync.max_conflict_retries = value;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        let limits = [
            ("sticky_note_scale", self.gestures.sticky_note_scale),
            ("sticker_scale", self.gestures.sticker_scale),
            ("board_image_frame", self.gestures.board_image_frame),
        ];
        for (name, range) in limits {
            if !range.is_valid() {
                return Err(Error::Config(format!(
                    "gesture limit '{name}' must satisfy 0 < min <= max"
                )));
            }
        }
        Ok(())
    }
}

/// Parse an override; unset or blank values leave the setting alone.
fn override_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got '{raw}'")))
}
