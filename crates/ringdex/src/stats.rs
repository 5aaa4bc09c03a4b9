//! Stats namespace keys and the public stats snapshot.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Namespace names the cache opens on the shared store.
pub mod ns {
    /// Slot → record.
    pub const RING: &str = "ring";
    /// Id → slot.
    pub const INDEX: &str = "index";
    /// Counters and control flags.
    pub const STATS: &str = "stats";
}

/// Keys inside the `stats` namespace.
pub(crate) mod key {
    /// Monotonic insert cursor.
    pub const POS: &str = "pos";
    /// Current ring capacity.
    pub const CURRENT_SIZE: &str = "currentSize";
    /// New-id insertions in the open monitoring window.
    pub const ITEM_COUNT: &str = "itemCount";
    /// Wall-clock start of the open monitoring window.
    pub const PERIOD_START: &str = "periodStart";
    /// Lifetime request count (inserts + updates).
    pub const TOTAL_REQ_COUNT: &str = "totalReqCount";
    /// Lifetime new-id insert count.
    pub const TOTAL_ITEM_COUNT: &str = "totalItemCount";
    /// Process start wall-clock.
    pub const SERVER_START: &str = "serverStart";
    /// Presence-flag mutex for the resize-decision path.
    pub const LOCKED: &str = "locked";
    /// Most recent computed mean residency, minutes.
    pub const LAST_PERIOD_AVG_MINS: &str = "lastPeriodAvgMins";
}

/// Key inside the `ring` namespace gating writes during a full drain.
pub(crate) const DRAINING_KEY: &str = "draining";

/// Point-in-time view of the cache, as returned by
/// [`IndexedRing::stats`](crate::IndexedRing::stats).
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// Current ring capacity.
    pub current_size: u64,
    /// Lifetime requests (inserts + updates).
    pub total_req_count: u64,
    /// Lifetime new-id inserts.
    pub total_item_count: u64,
    /// Lifetime requests per second.
    pub req_per_sec: f64,
    /// Lifetime new-id inserts per second.
    pub item_per_sec: f64,
    /// Mean residency computed at the last controller decision, minutes.
    /// `None` until the first completed window with samples.
    pub last_period_avg_mins: Option<f64>,
    /// Whether a full drain is in flight.
    pub draining: bool,
    /// Process start, ISO-8601 UTC.
    pub server_start: String,
}

/// Renders epoch seconds as ISO-8601 UTC (`2026-08-01T09:30:00Z`).
pub(crate) fn iso8601_utc(epoch_secs: u64) -> String {
    DateTime::<Utc>::from_timestamp(epoch_secs as i64, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| format!("@{epoch_secs}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_renders_as_iso8601_utc() {
        assert_eq!(iso8601_utc(0), "1970-01-01T00:00:00Z");
        assert_eq!(iso8601_utc(1_700_000_000), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let snapshot = StatsSnapshot {
            current_size: 1_000,
            total_req_count: 5,
            total_item_count: 3,
            req_per_sec: 0.5,
            item_per_sec: 0.3,
            last_period_avg_mins: Some(12.5),
            draining: false,
            server_start: iso8601_utc(0),
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["current_size"], 1_000);
        assert_eq!(json["server_start"], "1970-01-01T00:00:00Z");
    }
}
