//! Session window derivation
//!
//! Computes the `[start, end]` wall-clock interval a session occupied.
//! `end` is the timestamp embedded in the file name; `start` is resolved from
//! the recorded start clock time, the first event row, or a fixed fallback.

use crate::watcher::types::StatsMap;
use chrono::{DateTime, Duration, Local, LocalResult, NaiveDateTime, NaiveTime, TimeZone};

/// Stats key carrying the session's start clock time (time-of-day only).
const CHALLENGE_START_KEY: &str = "Challenge Start";

/// Assumed session length when no start information is available.
const FALLBACK_SESSION_SECS: i64 = 60;

/// Derive the `[start, end]` window of a session.
///
/// Start resolution order: the explicit start clock time from stats, the
/// clock time of the first event row, then `end - 60s`. Clock times carry no
/// date and are combined with the session's date; a start that lands after
/// `end` crossed midnight and is shifted back one day. The returned pair
/// always satisfies `start <= end`.
///
/// "Fight Time" is deliberately not used: its units vary and it often
/// reflects active time, not wall-clock duration.
pub fn derive_session_window(
    end: NaiveDateTime,
    stats: &StatsMap,
    events: &[Vec<String>],
) -> (NaiveDateTime, NaiveDateTime) {
    let mut start = stats
        .get(CHALLENGE_START_KEY)
        .and_then(|value| value.as_str())
        .and_then(|clock| parse_clock_on_date(clock, end));

    if start.is_none() {
        if let Some(first) = events.first() {
            if let Some(clock) = first.get(1) {
                start = parse_clock_on_date(clock, end);
            }
        }
    }

    let mut start = start.unwrap_or_else(|| end - Duration::seconds(FALLBACK_SESSION_SECS));
    if start > end {
        // crossed midnight
        start -= Duration::days(1);
    }
    (start, end)
}

/// Parse a clock-time string (`HH:MM:SS` with optional fractional seconds)
/// onto the provided date.
fn parse_clock_on_date(clock: &str, date: NaiveDateTime) -> Option<NaiveDateTime> {
    NaiveTime::parse_from_str(clock.trim(), "%H:%M:%S%.f")
        .ok()
        .map(|time| date.date().and_time(time))
}

/// Resolve a naive local wall-clock time to a `DateTime<Local>`, taking the
/// earlier instant when DST makes the reading ambiguous.
pub fn resolve_local(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earlier, _) => Some(earlier),
        LocalResult::None => None,
    }
}
