//! Small helpers shared by the sync layer and the CLI.

const LOG_EXCERPT_CHARS: usize = 180;

/// Trimmed, length-capped text for warnings about records that could not be
/// mapped.
#[must_use]
pub fn log_excerpt(value: &str) -> String {
    value.trim().chars().take(LOG_EXCERPT_CHARS).collect()
}

/// Wall-clock time as Unix milliseconds, used for export file names.
#[must_use]
pub fn unix_millis_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
