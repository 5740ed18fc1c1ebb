//! Cron — fires the daily broadcast on a schedule.
//!
//! [`ScheduleSpec`] says when; [`service::BroadcastScheduler`] is the
//! component that sleeps until then and runs the broadcast. Wall-clock
//! schedules are evaluated in UTC.

pub mod service;

use std::time::Duration;

use chrono::{DateTime, Days, NaiveTime, Utc};

pub use service::BroadcastScheduler;

/// Upper bound on interval schedules (about ten years).
const MAX_INTERVAL_SECS: u64 = 10 * 366 * 24 * 3600;

/// Longest single sleep toward a wall-clock target. The clock is re-read
/// after every slice, so clock steps and suspend/resume shift a daily fire by
/// at most this much.
pub const MAX_SLEEP_SLICE: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleSpec {
    /// Fire every `every_secs` seconds, first fire one interval after start.
    Interval { every_secs: u64 },
    /// Fire once a day at `hour:minute` UTC.
    Daily { hour: u32, minute: u32 },
}

impl ScheduleSpec {
    /// Next fire time strictly after `now`.
    pub fn next_fire(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            ScheduleSpec::Interval { every_secs } => {
                let secs = every_secs.clamp(1, MAX_INTERVAL_SECS) as i64;
                now + chrono::Duration::seconds(secs)
            }
            ScheduleSpec::Daily { hour, minute } => {
                let at = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
                let today = now.date_naive().and_time(at).and_utc();
                if today > now {
                    today
                } else {
                    now.date_naive()
                        .checked_add_days(Days::new(1))
                        .map(|d| d.and_time(at).and_utc())
                        .unwrap_or(today)
                }
            }
        }
    }

    /// How long to sleep from `now` until the next fire.
    pub fn delay_from(&self, now: DateTime<Utc>) -> Duration {
        (self.next_fire(now) - now).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Next sleep toward `target`, capped at [`MAX_SLEEP_SLICE`]. `None` once
/// `now` has reached the target.
pub fn sleep_slice(target: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
    if now >= target {
        return None;
    }
    let left = (target - now).to_std().unwrap_or(Duration::ZERO);
    Some(left.min(MAX_SLEEP_SLICE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, h, m, s).unwrap()
    }

    #[test]
    fn daily_later_today() {
        let spec = ScheduleSpec::Daily { hour: 9, minute: 0 };
        assert_eq!(spec.next_fire(at(8, 59, 30)), at(9, 0, 0));
        assert_eq!(spec.delay_from(at(8, 59, 30)), Duration::from_secs(30));
    }

    #[test]
    fn daily_rolls_to_tomorrow() {
        let spec = ScheduleSpec::Daily { hour: 9, minute: 0 };
        let tomorrow = Utc.with_ymd_and_hms(2024, 3, 11, 9, 0, 0).unwrap();
        assert_eq!(spec.next_fire(at(9, 0, 0)), tomorrow);
        assert_eq!(spec.next_fire(at(23, 30, 0)), tomorrow);
    }

    #[test]
    fn daily_crosses_month_end() {
        let spec = ScheduleSpec::Daily { hour: 0, minute: 15 };
        let now = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
        assert_eq!(spec.next_fire(now), Utc.with_ymd_and_hms(2024, 3, 1, 0, 15, 0).unwrap());
    }

    #[test]
    fn sleep_slice_caps_long_waits() {
        assert_eq!(sleep_slice(at(9, 0, 0), at(8, 0, 0)), Some(MAX_SLEEP_SLICE));
        assert_eq!(sleep_slice(at(9, 0, 0), at(8, 59, 45)), Some(Duration::from_secs(15)));
    }

    #[test]
    fn sleep_slice_due_at_or_after_target() {
        assert_eq!(sleep_slice(at(9, 0, 0), at(9, 0, 0)), None);
        // Clock stepped forward past the target while asleep.
        assert_eq!(sleep_slice(at(9, 0, 0), at(11, 30, 0)), None);
    }

    #[test]
    fn sleep_slice_after_clock_steps_back() {
        // Target fixed before the step; the remaining wait grows again but
        // stays capped, so the fire still lands on the wall-clock target.
        let target = at(9, 0, 0);
        assert_eq!(sleep_slice(target, at(8, 59, 50)), Some(Duration::from_secs(10)));
        assert_eq!(sleep_slice(target, at(7, 0, 0)), Some(MAX_SLEEP_SLICE));
    }

    #[test]
    fn interval_adds_period() {
        let spec = ScheduleSpec::Interval { every_secs: 90 };
        assert_eq!(spec.next_fire(at(10, 0, 0)), at(10, 1, 30));
        assert_eq!(spec.delay_from(at(10, 0, 0)), Duration::from_secs(90));
    }
}
