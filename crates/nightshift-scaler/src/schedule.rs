//! Schedule evaluation
//!
//! Decides whether a config or group should currently be active (scaled up)
//! based on its recurring windows and the manual override. Pure over the
//! injected [`Clock`].

use chrono::{Datelike, NaiveDateTime, Timelike};
use chrono_tz::Tz;
use tracing::warn;

use nightshift_common::crd::ScalingSchedule;

use crate::clock::Clock;

/// Whether the target should currently be active.
///
/// Precedence:
/// 1. A manual override (present `true` or `false`) wins unconditionally.
/// 2. Otherwise any valid schedule whose window contains "now" activates
///    the target. A schedule is valid iff it names at least one day.
/// 3. Valid schedules exist but none match: inactive.
/// 4. No valid schedules at all: default-active.
pub fn is_active(
    schedules: &[ScalingSchedule],
    manual_active: Option<bool>,
    clock: &dyn Clock,
) -> bool {
    if let Some(forced) = manual_active {
        return forced;
    }

    let mut has_valid_schedule = false;
    for schedule in schedules {
        if !schedule.is_valid() {
            continue;
        }
        has_valid_schedule = true;

        let now = now_in_schedule_zone(schedule.timezone.as_deref(), clock);
        let weekday = now.weekday().num_days_from_sunday();
        if !schedule.days.contains(&weekday) {
            continue;
        }

        let now_minutes = now.hour() * 60 + now.minute();
        let start = parse_minutes(&schedule.start_time);
        let end = parse_minutes(&schedule.end_time);

        // Inclusive on both ends; start > end never matches (windows do
        // not wrap through midnight).
        if now_minutes >= start && now_minutes <= end {
            return true;
        }
    }

    if has_valid_schedule {
        return false;
    }
    true
}

/// Wall time in the schedule's declared timezone.
///
/// Unknown timezone names must never fail a reconcile: fall back to
/// operator-local time.
fn now_in_schedule_zone(timezone: Option<&str>, clock: &dyn Clock) -> NaiveDateTime {
    match timezone {
        Some(name) => match name.parse::<Tz>() {
            Ok(tz) => clock.now_utc().with_timezone(&tz).naive_local(),
            Err(_) => {
                warn!(timezone = name, "unknown timezone, using operator-local time");
                clock.now_local()
            }
        },
        None => clock.now_local(),
    }
}

/// Parse "HH:MM" (or "H:MM") into minutes since midnight.
///
/// Malformed input parses to 0, which makes the window effectively never
/// match rather than failing the reconcile.
pub fn parse_minutes(hhmm: &str) -> u32 {
    let Some((h, m)) = hhmm.split_once(':') else {
        return 0;
    };
    let hours: u32 = h.trim().parse().unwrap_or(0);
    let minutes: u32 = m.trim().parse().unwrap_or(0);
    hours * 60 + minutes
}
