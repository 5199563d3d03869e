//! Hand-written natural-language / ISO-8601 time grammar (§4.3, §9).
//!
//! A library was deliberately not reached for here: the accepted dialects
//! are part of the public contract, and a hand-rolled grammar keeps that
//! contract explicit and easy to extend without chasing a dependency's
//! own interpretation of ambiguous phrases.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scheduler_kernel::error::ParseError;
use scheduler_kernel::time::TimeParser;

static IN_RELATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^in\s+(\d+)\s+(minute|minutes|hour|hours|day|days|week|weeks)$").unwrap()
});
static TOMORROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^tomorrow(?:\s+at\s+(.+))?$").unwrap());
static TODAY_AT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^today\s+at\s+(.+)$").unwrap());
static SHORT_FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})[ T](\d{2}:\d{2})$").unwrap());
static CLOCK_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d{1,2})(?::(\d{2}))?\s*(am|pm)?$").unwrap());

/// Implements [`TimeParser`] per the grammar enumerated in §4.3.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTimeParser;

impl TimeParser for DefaultTimeParser {
    fn parse(&self, input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ParseError::new(input, "input is empty"));
        }

        if let Some(dt) = try_iso8601(trimmed) {
            return Ok(dt);
        }
        if let Some(dt) = try_short_form(trimmed) {
            return Ok(dt);
        }
        if let Some(caps) = IN_RELATIVE.captures(trimmed) {
            return parse_relative(&caps, now, input);
        }
        if let Some(caps) = TOMORROW.captures(trimmed) {
            return parse_tomorrow(&caps, now, input);
        }
        if let Some(caps) = TODAY_AT.captures(trimmed) {
            let clock = caps.get(1).unwrap().as_str();
            let (hour, minute) = parse_clock(clock).ok_or_else(|| {
                ParseError::new(input, format!("unrecognized time of day: {clock}"))
            })?;
            return Ok(roll_to_future(now, hour, minute, now.date_naive()));
        }
        if let Some((hour, minute)) = parse_clock(trimmed) {
            return Ok(roll_to_future(now, hour, minute, now.date_naive()));
        }

        Err(ParseError::new(input, "unrecognized time expression"))
    }
}

fn try_iso8601(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

fn try_short_form(s: &str) -> Option<DateTime<Utc>> {
    let caps = SHORT_FORM.captures(s)?;
    let combined = format!("{} {}", &caps[1], &caps[2]);
    let naive = NaiveDateTime::parse_from_str(&combined, "%Y-%m-%d %H:%M").ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

fn parse_relative(
    caps: &regex::Captures,
    now: DateTime<Utc>,
    original: &str,
) -> Result<DateTime<Utc>, ParseError> {
    let amount: i64 = caps[1]
        .parse()
        .map_err(|_| ParseError::new(original, "relative amount is not a number"))?;
    let unit = caps[2].to_ascii_lowercase();
    let delta = match unit.as_str() {
        "minute" | "minutes" => Duration::minutes(amount),
        "hour" | "hours" => Duration::hours(amount),
        "day" | "days" => Duration::days(amount),
        "week" | "weeks" => Duration::weeks(amount),
        other => return Err(ParseError::new(original, format!("unknown unit: {other}"))),
    };
    Ok(now + delta)
}

fn parse_tomorrow(
    caps: &regex::Captures,
    now: DateTime<Utc>,
    original: &str,
) -> Result<DateTime<Utc>, ParseError> {
    let tomorrow_date = now.date_naive() + Duration::days(1);
    match caps.get(1) {
        Some(clock) => {
            let (hour, minute) = parse_clock(clock.as_str()).ok_or_else(|| {
                ParseError::new(original, format!("unrecognized time of day: {}", clock.as_str()))
            })?;
            Ok(at(tomorrow_date, hour, minute))
        }
        None => Ok(at(tomorrow_date, 0, 0)),
    }
}

/// Resolves a bare clock-time token against `today`'s date, rolling to
/// tomorrow if that instant has already passed relative to `now`.
fn roll_to_future(now: DateTime<Utc>, hour: u32, minute: u32, today: NaiveDate) -> DateTime<Utc> {
    let candidate = at(today, hour, minute);
    if candidate > now {
        candidate
    } else {
        at(today + Duration::days(1), hour, minute)
    }
}

fn at(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    let naive = date.and_hms_opt(hour, minute, 0).unwrap();
    Utc.from_utc_datetime(&naive)
}

/// Parses `"9"`, `"9:30"`, `"9am"`, `"9:30 pm"`, or 24-hour `"21:30"` into
/// `(hour, minute)` in 24-hour form. Returns `None` for anything else.
fn parse_clock(s: &str) -> Option<(u32, u32)> {
    let caps = CLOCK_TIME.captures(s.trim())?;
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps
        .get(2)
        .map(|m| m.as_str().parse().ok())
        .flatten()
        .unwrap_or(0);
    if minute > 59 {
        return None;
    }

    match caps.get(3).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(meridiem) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            if meridiem == "am" {
                hour %= 12;
            } else if hour != 12 {
                hour += 12;
            }
            Some((hour, minute))
        }
        None => {
            if hour > 23 {
                return None;
            }
            Some((hour, minute))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn parses_iso8601() {
        let parser = DefaultTimeParser;
        let now = utc(2025, 1, 10, 8, 0);
        let result = parser.parse("2025-01-11T09:00:00Z", now).unwrap();
        assert_eq!(result, utc(2025, 1, 11, 9, 0));
    }

    #[test]
    fn parses_short_form() {
        let parser = DefaultTimeParser;
        let now = utc(2025, 1, 10, 8, 0);
        let result = parser.parse("2025-01-11 09:00", now).unwrap();
        assert_eq!(result, utc(2025, 1, 11, 9, 0));
    }

    #[test]
    fn parses_relative_phrase() {
        let parser = DefaultTimeParser;
        let now = utc(2025, 1, 10, 8, 0);
        let result = parser.parse("in 30 minutes", now).unwrap();
        assert_eq!(result, utc(2025, 1, 10, 8, 30));
    }

    #[test]
    fn parses_tomorrow_with_time() {
        let parser = DefaultTimeParser;
        let now = utc(2025, 1, 10, 8, 0);
        let result = parser.parse("tomorrow at 9:00", now).unwrap();
        assert_eq!(result, utc(2025, 1, 11, 9, 0));
    }

    #[test]
    fn bare_hhmm_rolls_to_tomorrow_when_past() {
        let parser = DefaultTimeParser;
        let now = utc(2025, 1, 10, 8, 0);
        let result = parser.parse("07:00", now).unwrap();
        assert_eq!(result, utc(2025, 1, 11, 7, 0));
    }

    #[test]
    fn bare_hhmm_stays_today_when_future() {
        let parser = DefaultTimeParser;
        let now = utc(2025, 1, 10, 8, 0);
        let result = parser.parse("20:00", now).unwrap();
        assert_eq!(result, utc(2025, 1, 10, 20, 0));
    }

    #[test]
    fn parses_am_pm_phrase() {
        let parser = DefaultTimeParser;
        let now = utc(2025, 1, 10, 8, 0);
        let result = parser.parse("9pm", now).unwrap();
        assert_eq!(result, utc(2025, 1, 10, 21, 0));
    }

    #[test]
    fn today_at_past_rolls_to_tomorrow() {
        let parser = DefaultTimeParser;
        let now = utc(2025, 1, 10, 8, 0);
        let result = parser.parse("today at 7am", now).unwrap();
        assert_eq!(result, utc(2025, 1, 11, 7, 0));
    }

    #[test]
    fn invalid_input_is_rejected_with_offending_token() {
        let parser = DefaultTimeParser;
        let now = utc(2025, 1, 10, 8, 0);
        let err = parser.parse("whenever", now).unwrap_err();
        assert_eq!(err.offending_token, "whenever");
    }

    #[test]
    fn referentially_transparent_given_fixed_now() {
        let parser = DefaultTimeParser;
        let now = utc(2025, 1, 10, 8, 0);
        let a = parser.parse("in 2 hours", now).unwrap();
        let b = parser.parse("in 2 hours", now).unwrap();
        assert_eq!(a, b);
    }
}
