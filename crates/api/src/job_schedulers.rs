use crate::reminder::run_trigger;
use crate::shared::state::SchedulerState;
use chrono::{DateTime, Days, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::info;
use varsel_domain::ReminderKind;
use varsel_infra::{ISys, VarselContext};

pub fn start_reminder_jobs(ctx: VarselContext, state: Arc<SchedulerState>) {
    start_daily_trigger_job(ctx.clone(), state.clone(), ReminderKind::DayBefore);
    start_daily_trigger_job(ctx.clone(), state.clone(), ReminderKind::DayOf);
    start_one_hour_trigger_job(ctx, state);
}

fn daily_trigger_time(ctx: &VarselContext, kind: ReminderKind) -> NaiveTime {
    match kind {
        ReminderKind::DayBefore => ctx.config.day_before_trigger_time,
        ReminderKind::DayOf => ctx.config.day_of_trigger_time,
        ReminderKind::OneHour => unreachable!("The one hour kind is interval driven"),
    }
}

fn start_daily_trigger_job(ctx: VarselContext, state: Arc<SchedulerState>, kind: ReminderKind) {
    tokio::spawn(async move {
        loop {
            let now = ctx.sys.now();
            let fire_at =
                next_local_occurrence(now, daily_trigger_time(&ctx, kind), ctx.config.timezone);
            info!(%kind, %fire_at, "Next firing scheduled");

            let delay = (fire_at - now).to_std().unwrap_or_default();
            tokio::time::sleep(delay).await;
            run_trigger(kind, &ctx, &state).await;
        }
    });
}

fn start_one_hour_trigger_job(ctx: VarselContext, state: Arc<SchedulerState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(ctx.config.one_hour_poll_interval);
        // A firing that runs longer than the interval delays the next tick
        // instead of stacking a concurrent one.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            run_trigger(ReminderKind::OneHour, &ctx, &state).await;
        }
    });
}

/// The next absolute instant at which the local wall clock in `tz` reads
/// `time`, strictly after `now`.
///
/// Recomputed before every occurrence rather than adding 24 hours, so the
/// absolute firing instant moves with the local clock across DST
/// transitions. A trigger time swallowed by a spring-forward gap fires at
/// the first representable instant after it.
pub fn next_local_occurrence(now: DateTime<Utc>, time: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let mut date = now.with_timezone(&tz).date_naive();
    loop {
        for step in 0..=6 {
            let candidate = date.and_time(time) + Duration::minutes(step * 30);
            if let Some(resolved) = tz.from_local_datetime(&candidate).earliest() {
                let resolved = resolved.with_timezone(&Utc);
                if resolved > now {
                    return resolved;
                }
                // Representable but already past: move on to the next day
                break;
            }
        }
        date = date
            .checked_add_days(Days::new(1))
            .expect("The next day is representable");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;
    use chrono_tz::Europe::Oslo;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn fires_later_today_when_the_time_is_still_ahead() {
        // 10:00 local in Oslo (UTC+2 in June)
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 8, 0, 0).unwrap();
        let next = next_local_occurrence(now, time(16, 0), Oslo);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 15, 14, 0, 0).unwrap());
    }

    #[test]
    fn rolls_to_tomorrow_when_the_time_has_passed() {
        // 18:00 local in Oslo
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 16, 0, 0).unwrap();
        let next = next_local_occurrence(now, time(16, 0), Oslo);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 16, 14, 0, 0).unwrap());
    }

    #[test]
    fn the_absolute_instant_shifts_with_the_local_clock_across_dst() {
        // Exactly 07:00 EST on the day before the US spring transition:
        // "strictly after" pushes to the next day, which is on EDT.
        let now = Utc.with_ymd_and_hms(2025, 3, 8, 12, 0, 0).unwrap();
        let next = next_local_occurrence(now, time(7, 0), New_York);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 3, 9, 11, 0, 0).unwrap());
        // 23 wall-clock hours later, 07:00 local both days
        assert_eq!(next - now, Duration::hours(23));
    }

    #[test]
    fn a_trigger_time_inside_the_dst_gap_fires_right_after_it() {
        // 2025-03-09 02:30 does not exist in New York; the clock jumps
        // 02:00 -> 03:00
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 5, 0, 0).unwrap();
        let next = next_local_occurrence(now, time(2, 30), New_York);
        let local = next.with_timezone(&New_York);
        assert_eq!(local.time(), time(3, 0));
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 3, 9, 7, 0, 0).unwrap());
    }
}
