//! Wall-clock helpers for scheduled tasks.

use chrono::{DateTime, Days, Local, NaiveTime, TimeZone};

/// The next occurrence of `hour:00` local time strictly after `now`.
///
/// Falls back to 24 hours from `now` when the local time does not exist
/// (a DST gap) or `hour` is out of range.
pub fn next_daily_at(now: DateTime<Local>, hour: u32) -> DateTime<Local> {
    let fallback = now + chrono::Duration::days(1);
    let Some(time) = NaiveTime::from_hms_opt(hour, 0, 0) else {
        return fallback;
    };

    let today = now.date_naive().and_time(time);
    let candidate = if Local.from_local_datetime(&today).earliest().is_some_and(|t| t > now) {
        Some(today)
    } else {
        today.checked_add_days(Days::new(1))
    };

    candidate
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .unwrap_or(fallback)
}
