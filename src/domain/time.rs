//! Local time handling
//!
//! All timestamps in the pipeline are attached to one configured IANA zone.
//! Naive local wall-clock readings are resolved without ever failing:
//! ambiguous readings (the repeated hour when clocks fall back) are invalid,
//! nonexistent readings (the skipped hour when clocks spring forward) are
//! moved to the first valid instant after the gap.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A timestamp attached to the configured local zone
pub type TimePoint = DateTime<Tz>;

/// Longest daylight-saving gap we search across when shifting forward
const MAX_GAP_MINUTES: i64 = 24 * 60;

/// Resolve a naive local reading into the zone.
///
/// Returns `None` for ambiguous readings.
pub fn localize(naive: NaiveDateTime, tz: Tz) -> Option<TimePoint> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => Some(t),
        LocalResult::Ambiguous(_, _) => None,
        LocalResult::None => shift_forward(naive, tz),
    }
}

fn shift_forward(naive: NaiveDateTime, tz: Tz) -> Option<TimePoint> {
    let mut candidate = naive.with_second(0)?.with_nanosecond(0)?;
    for _ in 0..MAX_GAP_MINUTES {
        candidate += Duration::minutes(1);
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(t) => return Some(t),
            LocalResult::Ambiguous(earliest, _) => return Some(earliest),
            LocalResult::None => continue,
        }
    }
    None
}

const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Lenient wall-clock parsing for third-party tables.
///
/// Readings carrying an offset keep their local wall-clock part.
pub fn parse_wall_clock(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.naive_local());
    }
    if let Ok(t) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(t.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Convert epoch seconds to a local time point
pub fn from_epoch_seconds(secs: i64, tz: Tz) -> Option<TimePoint> {
    DateTime::<Utc>::from_timestamp(secs, 0).map(|utc| utc.with_timezone(&tz))
}

/// Convert fractional epoch seconds to a local time point.
///
/// Sub-second parts are kept to the nanosecond; non-finite input is rejected.
pub fn from_epoch_fractional(secs: f64, tz: Tz) -> Option<TimePoint> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    if whole < i64::MIN as f64 || whole >= i64::MAX as f64 {
        return None;
    }
    let nanos = ((secs - whole) * 1e9).round() as i64;
    from_epoch_seconds(whole as i64, tz).map(|t| t + Duration::nanoseconds(nanos))
}

/// The bounded future range a forecast is requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ForecastWindow {
    /// Window of `horizon_hours` beginning at `now` truncated to the hour
    pub fn starting_at(now: DateTime<Utc>, horizon_hours: u32) -> Self {
        let secs = now.timestamp();
        let truncated = secs - secs.rem_euclid(3600);
        let start = DateTime::<Utc>::from_timestamp(truncated, 0).unwrap_or(now);
        Self {
            start,
            end: start + Duration::hours(i64::from(horizon_hours)),
        }
    }

    pub fn from_now(horizon_hours: u32) -> Self {
        Self::starting_at(Utc::now(), horizon_hours)
    }

    /// ISO-8601 UTC form expected by the forecast source
    pub fn start_param(&self) -> String {
        self.start.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}
