//! Retry/Backoff Planner.
//!
//! Given a node's retry policy and the run's retry counter, decide whether
//! the just-failed call gets another attempt, when, and which one-shot
//! intervention (if any) fires first.

use actions::config::{BackoffKind, Intervention, RetryPolicy};
use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::error::EngineError;
use crate::models::TimeWindow;
use crate::window;

/// Outcome of planning one retry.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    /// Schedule another attempt at `at`, optionally running `intervention`
    /// first.
    Retry {
        at: DateTime<Utc>,
        intervention: Option<Intervention>,
    },
    /// Attempts are exhausted; the node is permanently failed and the run
    /// proceeds to branch resolution with a failure outcome.
    Exhausted,
}

/// Plan the next attempt after a failure.
///
/// `retry_count` counts retries already scheduled, so the attempt that just
/// failed is number `retry_count + 1`.  The policy's `max_attempts` bounds
/// *total* attempts: with `max_attempts = 3` the counter never exceeds 2 by
/// the time branch resolution sees the final failure.
///
/// The backoff instant is clamped by the node's declared time windows; the
/// clamp only pushes later, never earlier.
pub fn plan_retry(
    policy: &RetryPolicy,
    retry_count: u32,
    windows: &[TimeWindow],
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<RetryDecision, EngineError> {
    let failed_attempt = retry_count + 1;
    if policy.max_attempts <= 1 || failed_attempt >= policy.max_attempts {
        return Ok(RetryDecision::Exhausted);
    }

    let mut candidate = match policy.backoff {
        BackoffKind::FixedInterval => now + Duration::hours(24),
        BackoffKind::SmartDaypart => smart_daypart(now, tz),
    };

    if policy.one_attempt_per_window {
        if let Some(window_exit) = end_of_current_window(now, windows, tz) {
            candidate = candidate.max(window_exit);
        }
    }

    if !windows.is_empty() {
        candidate = window::clamp_to_windows(candidate, windows, tz)?;
    }

    let intervention = policy
        .interventions
        .iter()
        .find(|i| i.after_attempt == failed_attempt)
        .cloned();

    Ok(RetryDecision::Retry {
        at: candidate,
        intervention,
    })
}

/// Two-slot daily cycle in the operational timezone: failures before 09:00
/// wait for 09:00, failures before 16:00 wait for 16:00, anything later
/// waits for 09:00 the next day.  Calls therefore get at most a morning and
/// an evening slot per day no matter how often the planner runs.
fn smart_daypart(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local = now.with_timezone(&tz);
    let nine = NaiveTime::from_hms_opt(9, 0, 0).expect("valid time");
    let sixteen = NaiveTime::from_hms_opt(16, 0, 0).expect("valid time");

    let (date, slot) = if local.time() < nine {
        (local.date_naive(), nine)
    } else if local.time() < sixteen {
        (local.date_naive(), sixteen)
    } else {
        (local.date_naive() + Duration::days(1), nine)
    };

    window::localize(tz, date.and_time(slot))
        // A slot falling into a DST gap twice over is not representable;
        // keep the flat fallback rather than failing the retry.
        .unwrap_or(now + Duration::hours(24))
}

/// First instant strictly after the window containing `now`, if any.
fn end_of_current_window(
    now: DateTime<Utc>,
    windows: &[TimeWindow],
    tz: Tz,
) -> Option<DateTime<Utc>> {
    let local = now.with_timezone(&tz);
    windows
        .iter()
        .filter(|w| w.contains(local.weekday(), local.time()))
        .filter_map(|w| window::localize(tz, local.date_naive().and_time(w.end)))
        .map(|end| end + Duration::minutes(1))
        .max()
}
