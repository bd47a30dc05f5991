use serde::Deserialize;

use super::Instant;
use crate::error::TimeSyncError;

/// Instant reported when no authoritative time could be obtained.
pub const FALLBACK_INSTANT: Instant = Instant::new(2025, 5, 24, 18, 30, 0);
/// Source label paired with `FALLBACK_INSTANT`.
pub const FALLBACK_LABEL: &str = "EST?";

/// Body returned by the time service. All three fields are required.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimeApiResponse {
    pub datetime: String,
    pub unixtime: i64,
    pub abbreviation: String,
}

/// Outcome of one acquisition cycle. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSyncResult {
    pub instant: Instant,
    pub source_label: String,
    pub is_fallback: bool,
    pub failure: Option<TimeSyncError>,
}

impl TimeSyncResult {
    pub fn synced(instant: Instant, source_label: impl Into<String>) -> Self {
        Self {
            instant,
            source_label: source_label.into(),
            is_fallback: false,
            failure: None,
        }
    }

    pub fn fallback(failure: TimeSyncError) -> Self {
        Self {
            instant: FALLBACK_INSTANT,
            source_label: FALLBACK_LABEL.to_string(),
            is_fallback: true,
            failure: Some(failure),
        }
    }
}
