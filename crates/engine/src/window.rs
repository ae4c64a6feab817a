//! Time Window Evaluator.
//!
//! Pure scheduling math over the weekly allowed intervals of a node,
//! interpreted in the single operational timezone.  The executor consults it
//! before a fresh direct-contact attempt and the retry planner consults it
//! for every subsequent attempt — identical windows, identical math.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::EngineError;
use crate::models::TimeWindow;

/// Forward scan horizon for [`next_allowed`].  Eight calendar days re-check
/// every weekday at least once, so a non-empty window set always terminates.
pub const SCAN_DAYS: i64 = 8;

/// Is this instant inside some window?  An empty window set allows
/// everything.
pub fn is_allowed(instant: DateTime<Utc>, windows: &[TimeWindow], tz: Tz) -> bool {
    if windows.is_empty() {
        return true;
    }
    let local = instant.with_timezone(&tz);
    windows
        .iter()
        .any(|w| w.contains(local.weekday(), local.time()))
}

/// The earliest window start at or after `instant`.
///
/// Scans forward day by day for up to [`SCAN_DAYS`] calendar days and
/// evaluates each window's start time on every day-tag it names.  A
/// non-empty window set that never matches is a fatal configuration error.
pub fn next_allowed(
    instant: DateTime<Utc>,
    windows: &[TimeWindow],
    tz: Tz,
) -> Result<DateTime<Utc>, EngineError> {
    if windows.is_empty() {
        return Ok(instant);
    }

    let local = instant.with_timezone(&tz);
    for offset in 0..SCAN_DAYS {
        let date = local.date_naive() + Duration::days(offset);
        let mut best: Option<DateTime<Utc>> = None;
        for window in windows {
            if !window.covers_day(date.weekday()) {
                continue;
            }
            let Some(candidate) = localize(tz, date.and_time(window.start)) else {
                continue;
            };
            if candidate < instant {
                continue;
            }
            if best.map_or(true, |b| candidate < b) {
                best = Some(candidate);
            }
        }
        if let Some(found) = best {
            return Ok(found);
        }
    }

    Err(EngineError::NoUpcomingWindow(SCAN_DAYS))
}

/// `instant` itself when allowed, otherwise the next allowed instant.  The
/// clamp only ever pushes later, never earlier.
pub fn clamp_to_windows(
    instant: DateTime<Utc>,
    windows: &[TimeWindow],
    tz: Tz,
) -> Result<DateTime<Utc>, EngineError> {
    if is_allowed(instant, windows, tz) {
        Ok(instant)
    } else {
        next_allowed(instant, windows, tz)
    }
}

/// Resolve a wall-clock time in the operational timezone.  DST fold takes
/// the earlier instant; a DST gap pushes the clock forward an hour.
pub(crate) fn localize(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earlier, _) => Some(earlier.with_timezone(&Utc)),
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}
