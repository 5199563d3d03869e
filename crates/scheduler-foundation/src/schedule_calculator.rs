//! The concrete [`ScheduleCalculator`] implementation (§4.4).
//!
//! Mirrors the kernel/foundation split used throughout this stack: the
//! trait is defined in `scheduler-kernel`, the date arithmetic lives here so
//! the kernel crate never depends on `chrono`'s calendar routines directly.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use scheduler_kernel::schedule::{NextRun, ScheduleCalculator, ScheduleConfig, ScheduleKind};

/// Computes next occurrences per §4.4. Deterministic: same
/// `(config, anchor, occurrence_count)` always yields the same [`NextRun`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultScheduleCalculator;

impl ScheduleCalculator for DefaultScheduleCalculator {
    fn next_run(
        &self,
        config: &ScheduleConfig,
        anchor: DateTime<Utc>,
        occurrence_count: u32,
    ) -> NextRun {
        if let Some(max) = config.max_occurrences {
            if occurrence_count >= max {
                return NextRun::Terminal;
            }
        }

        let candidate = match &config.kind {
            ScheduleKind::Once { .. } => return NextRun::Terminal,
            ScheduleKind::Daily {
                hour,
                minute,
                interval_days,
            } => next_daily(anchor, *hour, *minute, interval_days.unwrap_or(1).max(1)),
            ScheduleKind::Weekly {
                weekdays,
                hour,
                minute,
                interval_weeks,
            } => {
                if weekdays.is_empty() {
                    return NextRun::Terminal;
                }
                next_weekly(anchor, weekdays, *hour, *minute, interval_weeks.unwrap_or(1).max(1))
            }
            ScheduleKind::Monthly {
                day_of_month,
                hour,
                minute,
                interval_months,
            } => next_monthly(
                anchor,
                *day_of_month,
                *hour,
                *minute,
                interval_months.unwrap_or(1).max(1),
            ),
            ScheduleKind::Yearly {
                month,
                day,
                hour,
                minute,
                interval_years,
            } => next_yearly(
                anchor,
                *month,
                *day,
                *hour,
                *minute,
                interval_years.unwrap_or(1).max(1),
            ),
            ScheduleKind::Custom { interval_minutes } => {
                anchor + Duration::minutes(*interval_minutes as i64)
            }
        };

        if let Some(end_date) = config.end_date {
            if candidate > end_date {
                return NextRun::Terminal;
            }
        }

        NextRun::At(candidate)
    }
}

fn at_hms(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    let naive = date
        .and_hms_opt(hour.min(23), minute.min(59), 0)
        .unwrap_or_else(|| date.and_hms_opt(0, 0, 0).unwrap());
    Utc.from_utc_datetime(&naive)
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap()
        .pred_opt()
        .unwrap()
        .day()
}

fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    let day = day.min(last_day_of_month(year, month)).max(1);
    NaiveDate::from_ymd_opt(year, month, day).expect("clamped day is always valid")
}

fn next_daily(anchor: DateTime<Utc>, hour: u32, minute: u32, interval_days: u32) -> DateTime<Utc> {
    let date = anchor.date_naive() + Duration::days(interval_days as i64);
    at_hms(date, hour, minute)
}

fn next_weekly(
    anchor: DateTime<Utc>,
    weekdays: &[u8],
    hour: u32,
    minute: u32,
    interval_weeks: u32,
) -> DateTime<Utc> {
    let mut sorted = weekdays.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let anchor_date = anchor.date_naive();
    let anchor_dow = anchor_date.weekday().num_days_from_monday();
    let monday = anchor_date - Duration::days(anchor_dow as i64);

    for &wd in &sorted {
        let day = monday + Duration::days(wd.min(6) as i64);
        let candidate = at_hms(day, hour, minute);
        if candidate > anchor {
            return candidate;
        }
    }

    let next_monday = monday + Duration::weeks(interval_weeks as i64);
    let day = next_monday + Duration::days(sorted[0].min(6) as i64);
    at_hms(day, hour, minute)
}

fn next_monthly(
    anchor: DateTime<Utc>,
    day_of_month: u32,
    hour: u32,
    minute: u32,
    interval_months: u32,
) -> DateTime<Utc> {
    let anchor_date = anchor.date_naive();
    let total_months = anchor_date.year() as i64 * 12 + (anchor_date.month() as i64 - 1) + interval_months as i64;
    let year = (total_months.div_euclid(12)) as i32;
    let month = (total_months.rem_euclid(12) + 1) as u32;
    let date = clamped_date(year, month, day_of_month);
    at_hms(date, hour, minute)
}

fn next_yearly(
    anchor: DateTime<Utc>,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    interval_years: u32,
) -> DateTime<Utc> {
    let year = anchor.date_naive().year() + interval_years as i32;
    let date = clamped_date(year, month.clamp(1, 12), day);
    at_hms(date, hour, minute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn cfg(kind: ScheduleKind) -> ScheduleConfig {
        ScheduleConfig {
            kind,
            end_date: None,
            max_occurrences: None,
        }
    }

    #[test]
    fn once_is_always_terminal() {
        let calc = DefaultScheduleCalculator;
        let config = ScheduleConfig::once(utc(2025, 1, 10, 9, 0));
        assert_eq!(
            calc.next_run(&config, utc(2025, 1, 10, 9, 0), 0),
            NextRun::Terminal
        );
    }

    #[test]
    fn daily_advances_one_day_preserving_time() {
        let calc = DefaultScheduleCalculator;
        let config = cfg(ScheduleKind::Daily {
            hour: 7,
            minute: 0,
            interval_days: None,
        });
        let anchor = utc(2025, 1, 10, 7, 0);
        assert_eq!(
            calc.next_run(&config, anchor, 0),
            NextRun::At(utc(2025, 1, 11, 7, 0))
        );
    }

    #[test]
    fn weekly_single_day_is_exactly_n_weeks_apart() {
        let calc = DefaultScheduleCalculator;
        let config = cfg(ScheduleKind::Weekly {
            weekdays: vec![2], // Wednesday
            hour: 9,
            minute: 30,
            interval_weeks: Some(2),
        });
        // 2025-01-08 is a Wednesday.
        let anchor = utc(2025, 1, 8, 9, 30);
        let next = calc.next_run(&config, anchor, 0);
        assert_eq!(next, NextRun::At(utc(2025, 1, 22, 9, 30)));
        if let NextRun::At(t) = next {
            assert_eq!((t - anchor).num_days(), 14);
        }
    }

    #[test]
    fn weekly_picks_next_listed_day_within_same_week() {
        let calc = DefaultScheduleCalculator;
        let config = cfg(ScheduleKind::Weekly {
            weekdays: vec![0, 3], // Monday, Thursday
            hour: 8,
            minute: 0,
            interval_weeks: None,
        });
        // 2025-01-06 is a Monday; next listed day is Thursday the 9th.
        let anchor = utc(2025, 1, 6, 8, 0);
        assert_eq!(
            calc.next_run(&config, anchor, 0),
            NextRun::At(utc(2025, 1, 9, 8, 0))
        );
    }

    #[test]
    fn monthly_clamps_to_last_day_of_shorter_month() {
        let calc = DefaultScheduleCalculator;
        let config = cfg(ScheduleKind::Monthly {
            day_of_month: 31,
            hour: 12,
            minute: 0,
            interval_months: None,
        });
        let anchor = utc(2025, 1, 31, 12, 0);
        assert_eq!(
            calc.next_run(&config, anchor, 0),
            NextRun::At(utc(2025, 2, 28, 12, 0))
        );
    }

    #[test]
    fn monthly_clamps_on_leap_year() {
        let calc = DefaultScheduleCalculator;
        let config = cfg(ScheduleKind::Monthly {
            day_of_month: 31,
            hour: 0,
            minute: 0,
            interval_months: None,
        });
        let anchor = utc(2024, 1, 31, 0, 0);
        assert_eq!(
            calc.next_run(&config, anchor, 0),
            NextRun::At(utc(2024, 2, 29, 0, 0))
        );
    }

    #[test]
    fn yearly_advances_by_interval_years() {
        let calc = DefaultScheduleCalculator;
        let config = cfg(ScheduleKind::Yearly {
            month: 12,
            day: 25,
            hour: 0,
            minute: 0,
            interval_years: Some(1),
        });
        let anchor = utc(2024, 12, 25, 0, 0);
        assert_eq!(
            calc.next_run(&config, anchor, 0),
            NextRun::At(utc(2025, 12, 25, 0, 0))
        );
    }

    #[test]
    fn custom_adds_interval_minutes() {
        let calc = DefaultScheduleCalculator;
        let config = cfg(ScheduleKind::Custom {
            interval_minutes: 45,
        });
        let anchor = utc(2025, 1, 1, 0, 0);
        assert_eq!(
            calc.next_run(&config, anchor, 0),
            NextRun::At(utc(2025, 1, 1, 0, 45))
        );
    }

    #[test]
    fn max_occurrences_caps_recurrence() {
        let calc = DefaultScheduleCalculator;
        let config = ScheduleConfig {
            kind: ScheduleKind::Custom { interval_minutes: 10 },
            end_date: None,
            max_occurrences: Some(3),
        };
        let anchor = utc(2025, 1, 1, 0, 0);
        assert!(matches!(calc.next_run(&config, anchor, 2), NextRun::At(_)));
        assert_eq!(calc.next_run(&config, anchor, 3), NextRun::Terminal);
    }

    #[test]
    fn end_date_caps_recurrence() {
        let calc = DefaultScheduleCalculator;
        let config = ScheduleConfig {
            kind: ScheduleKind::Daily {
                hour: 7,
                minute: 0,
                interval_days: None,
            },
            end_date: Some(utc(2025, 1, 10, 12, 0)),
            max_occurrences: None,
        };
        assert_eq!(
            calc.next_run(&config, utc(2025, 1, 9, 7, 0), 0),
            NextRun::At(utc(2025, 1, 10, 7, 0))
        );
        assert_eq!(
            calc.next_run(&config, utc(2025, 1, 10, 7, 0), 1),
            NextRun::Terminal
        );
    }
}
