use crate::timespan::TimeSpan;
use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DayWindowError {
    #[error("The date {0} cannot be represented in the timezone {1}")]
    Unrepresentable(NaiveDate, Tz),
}

// A DST gap never spans more than a few hours; scanning in half-hour steps
// also covers the 30-minute transition zones.
const GAP_SCAN_STEP_MINS: i64 = 30;
const GAP_SCAN_LIMIT: i64 = 6;

/// Resolves the absolute instants bounding the civil day `date` in `tz`:
/// 00:00:00 local up to and including 23:59:59 local.
///
/// The UTC offset is derived from `date` itself, never from the offset in
/// force at the caller's "now", so windows computed across a
/// standard/daylight transition land on the correct hour. When the local
/// midnight does not exist (zones that spring forward over 00:00) the start
/// rolls to the first representable instant of the day; ambiguous wall times
/// resolve to the earliest offset for the start and the latest for the end.
pub fn day_window(date: NaiveDate, tz: Tz) -> Result<TimeSpan, DayWindowError> {
    let midnight = NaiveTime::from_hms_opt(0, 0, 0).expect("00:00:00 is a valid time");
    let last_second = NaiveTime::from_hms_opt(23, 59, 59).expect("23:59:59 is a valid time");

    let start = resolve_forward(date, midnight, tz)?;
    let end = resolve_backward(date, last_second, tz)?;

    TimeSpan::create(start, end).map_err(|_| DayWindowError::Unrepresentable(date, tz))
}

/// First representable instant at or after `time` local, scanning forward
/// across a possible DST gap.
fn resolve_forward(
    date: NaiveDate,
    time: NaiveTime,
    tz: Tz,
) -> Result<chrono::DateTime<Utc>, DayWindowError> {
    let local = date.and_time(time);
    for step in 0..=GAP_SCAN_LIMIT {
        let candidate = local + Duration::minutes(step * GAP_SCAN_STEP_MINS);
        if let Some(resolved) = tz.from_local_datetime(&candidate).earliest() {
            return Ok(resolved.with_timezone(&Utc));
        }
    }
    Err(DayWindowError::Unrepresentable(date, tz))
}

/// Last representable instant at or before `time` local, scanning backward
/// across a possible DST gap.
fn resolve_backward(
    date: NaiveDate,
    time: NaiveTime,
    tz: Tz,
) -> Result<chrono::DateTime<Utc>, DayWindowError> {
    let local = date.and_time(time);
    for step in 0..=GAP_SCAN_LIMIT {
        let candidate = local - Duration::minutes(step * GAP_SCAN_STEP_MINS);
        if let Some(resolved) = tz.from_local_datetime(&candidate).latest() {
            return Ok(resolved.with_timezone(&Utc));
        }
    }
    Err(DayWindowError::Unrepresentable(date, tz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use chrono_tz::America::{New_York, Sao_Paulo};
    use chrono_tz::Europe::Oslo;
    use chrono_tz::UTC;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn plain_day_spans_24_hours_inclusive() {
        let span = day_window(date(2025, 6, 15), Oslo).unwrap();
        assert_eq!(span.duration(), Duration::hours(24) - Duration::seconds(1));
        // Oslo is UTC+2 in June
        assert_eq!(span.start(), Utc.with_ymd_and_hms(2025, 6, 14, 22, 0, 0).unwrap());
        assert_eq!(span.end(), Utc.with_ymd_and_hms(2025, 6, 15, 21, 59, 59).unwrap());
    }

    #[test]
    fn spring_forward_day_spans_23_hours() {
        // US DST starts 2025-03-09 02:00 EST -> 03:00 EDT
        let span = day_window(date(2025, 3, 9), New_York).unwrap();
        assert_eq!(span.duration(), Duration::hours(23) - Duration::seconds(1));
        assert_eq!(span.start(), Utc.with_ymd_and_hms(2025, 3, 9, 5, 0, 0).unwrap());
        assert_eq!(span.end(), Utc.with_ymd_and_hms(2025, 3, 10, 3, 59, 59).unwrap());
    }

    #[test]
    fn fall_back_day_spans_25_hours() {
        // US DST ends 2025-11-02 02:00 EDT -> 01:00 EST
        let span = day_window(date(2025, 11, 2), New_York).unwrap();
        assert_eq!(span.duration(), Duration::hours(25) - Duration::seconds(1));
        assert_eq!(span.start(), Utc.with_ymd_and_hms(2025, 11, 2, 4, 0, 0).unwrap());
        assert_eq!(span.end(), Utc.with_ymd_and_hms(2025, 11, 3, 4, 59, 59).unwrap());
    }

    #[test]
    fn skipped_midnight_rolls_start_forward() {
        // Brazil DST 2018 started at midnight: 2018-11-04 00:00 -> 01:00
        let span = day_window(date(2018, 11, 4), Sao_Paulo).unwrap();
        let local_start = span.start().with_timezone(&Sao_Paulo);
        assert_eq!(local_start.time(), NaiveTime::from_hms_opt(1, 0, 0).unwrap());
        assert_eq!(span.duration(), Duration::hours(23) - Duration::seconds(1));
    }

    #[test]
    fn boundary_offsets_follow_the_target_date_not_the_reference() {
        // The day after the US transition must already use the DST offset,
        // no matter what offset is in force when the window is computed.
        let span = day_window(date(2025, 3, 10), New_York).unwrap();
        assert_eq!(span.start(), Utc.with_ymd_and_hms(2025, 3, 10, 4, 0, 0).unwrap());
        assert_eq!(span.duration(), Duration::hours(24) - Duration::seconds(1));
    }

    #[test]
    fn every_day_of_the_year_is_23_24_or_25_hours() {
        let mut odd_days = Vec::new();
        for d in date(2025, 1, 1).iter_days().take_while(|d| d.year() == 2025) {
            let span = day_window(d, New_York).unwrap();
            let secs = span.duration().num_seconds() + 1;
            if secs != 24 * 3600 {
                odd_days.push((d, secs));
            }
        }
        assert_eq!(
            odd_days,
            vec![
                (date(2025, 3, 9), 23 * 3600),
                (date(2025, 11, 2), 25 * 3600),
            ]
        );
    }

    #[test]
    fn utc_never_shifts() {
        for d in [date(2025, 3, 9), date(2025, 11, 2), date(2025, 7, 1)] {
            let span = day_window(d, UTC).unwrap();
            assert_eq!(span.duration(), Duration::hours(24) - Duration::seconds(1));
        }
    }
}
