//! Parsing of the date, duration and percentage arguments the tools accept.

use crate::error::{LifeError, Result};
use chrono::{Datelike, Duration, Local, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse `today`, `yesterday`, `tomorrow`, `YYYY-MM-DD`, `+Nd` or `-Nd`
/// relative to `base`.
pub fn parse_date_from(input: &str, base: NaiveDate) -> Result<NaiveDate> {
    let s = input.trim().to_lowercase();
    match s.as_str() {
        "today" => return Ok(base),
        "yesterday" => return Ok(base - Duration::days(1)),
        "tomorrow" => return Ok(base + Duration::days(1)),
        _ => {}
    }
    if let Some(caps) = offset_re().captures(&s) {
        let days: i64 = caps[2]
            .parse()
            .map_err(|_| LifeError::InvalidDate(input.to_string()))?;
        return match &caps[1] {
            "-" => Ok(base - Duration::days(days)),
            _ => Ok(base + Duration::days(days)),
        };
    }
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| LifeError::InvalidDate(input.to_string()))
}

pub fn parse_date(input: &str) -> Result<NaiveDate> {
    parse_date_from(input, today())
}

/// Parse an optional date argument, defaulting to today.
pub fn date_or_today(input: Option<&str>) -> Result<NaiveDate> {
    input.map(parse_date).transpose().map(|d| d.unwrap_or_else(today))
}

static OFFSET_RE: OnceLock<Regex> = OnceLock::new();
static DURATION_RE: OnceLock<Regex> = OnceLock::new();
static MONTH_RE: OnceLock<Regex> = OnceLock::new();

fn offset_re() -> &'static Regex {
    OFFSET_RE.get_or_init(|| Regex::new(r"^([+-])(\d{1,4})d$").expect("static regex"))
}

fn duration_re() -> &'static Regex {
    DURATION_RE.get_or_init(|| {
        Regex::new(r"^(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?$").expect("static regex")
    })
}

fn month_re() -> &'static Regex {
    MONTH_RE.get_or_init(|| Regex::new(r"^(\d{4})-(\d{2})$").expect("static regex"))
}

/// Parse a duration into seconds. A bare number means minutes.
pub fn parse_duration_secs(input: &str) -> Result<u64> {
    let s = input.trim().to_lowercase();
    let invalid = || LifeError::InvalidDuration(input.to_string());
    if s.is_empty() {
        return Err(invalid());
    }
    if let Ok(minutes) = s.parse::<u64>() {
        return match minutes {
            0 => Err(invalid()),
            m => m.checked_mul(60).ok_or_else(invalid),
        };
    }
    let caps = duration_re().captures(&s).ok_or_else(invalid)?;
    let part = |i: usize| -> Result<u64> {
        caps.get(i)
            .map(|m| m.as_str().parse::<u64>().map_err(|_| invalid()))
            .transpose()
            .map(|v| v.unwrap_or(0))
    };
    let (h, m, sec) = (part(1)?, part(2)?, part(3)?);
    let secs = h
        .checked_mul(3600)
        .and_then(|hs| hs.checked_add(m.checked_mul(60)?))
        .and_then(|hm| hm.checked_add(sec))
        .ok_or_else(invalid)?;
    if secs == 0 {
        return Err(invalid());
    }
    Ok(secs)
}

/// Duration in whole minutes, rounding partial minutes up.
pub fn parse_duration_minutes(input: &str) -> Result<u64> {
    Ok(parse_duration_secs(input)?.div_ceil(60))
}

/// Integer percentage in `[0, 100]`.
pub fn parse_percentage(input: &str) -> Result<u8> {
    let trimmed = input.trim().trim_end_matches('%');
    match trimmed.parse::<u8>() {
        Ok(p) if p <= 100 => Ok(p),
        _ => Err(LifeError::InvalidPercentage(input.to_string())),
    }
}

/// Parse `YYYY-MM` into `(year, month)`.
pub fn parse_month(input: &str) -> Result<(i32, u32)> {
    let invalid = || LifeError::InvalidInput(format!("invalid month '{input}': expected YYYY-MM"));
    let caps = month_re().captures(input.trim()).ok_or_else(invalid)?;
    let year: i32 = caps[1].parse().map_err(|_| invalid())?;
    let month: u32 = caps[2].parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

/// First day of the week containing `date`.
pub fn week_start(date: NaiveDate, monday_first: bool) -> NaiveDate {
    let offset = if monday_first {
        date.weekday().num_days_from_monday()
    } else {
        date.weekday().num_days_from_sunday()
    };
    date - Duration::days(offset as i64)
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// "1h 05m" / "45m".
pub fn format_minutes(minutes: u64) -> String {
    let h = minutes / 60;
    let m = minutes % 60;
    if h == 0 {
        format!("{m}m")
    } else {
        format!("{h}h {m:02}m")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn keywords_resolve_relative_to_base() {
        let base = d("2024-03-01");
        assert_eq!(parse_date_from("today", base).unwrap(), base);
        assert_eq!(parse_date_from("Yesterday", base).unwrap(), d("2024-02-29"));
        assert_eq!(parse_date_from("tomorrow", base).unwrap(), d("2024-03-02"));
    }

    #[test]
    fn offsets() {
        let base = d("2024-03-01");
        assert_eq!(parse_date_from("+7d", base).unwrap(), d("2024-03-08"));
        assert_eq!(parse_date_from("-1d", base).unwrap(), d("2024-02-29"));
    }

    #[test]
    fn iso_dates_and_rejections() {
        let base = d("2024-03-01");
        assert_eq!(parse_date_from("2023-12-25", base).unwrap(), d("2023-12-25"));
        for bad in ["2023-13-01", "2023-02-30", "next week", "12/25/2023", ""] {
            assert!(
                matches!(parse_date_from(bad, base), Err(LifeError::InvalidDate(_))),
                "expected invalid: {bad}"
            );
        }
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration_secs("25").unwrap(), 1500);
        assert_eq!(parse_duration_secs("25m").unwrap(), 1500);
        assert_eq!(parse_duration_secs("1h30m").unwrap(), 5400);
        assert_eq!(parse_duration_secs("90s").unwrap(), 90);
        assert_eq!(parse_duration_minutes("90s").unwrap(), 2);
        for bad in ["0", "0m", "", "abc", "1x", "h"] {
            assert!(parse_duration_secs(bad).is_err(), "expected invalid: {bad}");
        }
    }

    #[test]
    fn oversized_durations_rejected() {
        for bad in ["400000000000000000", "9999999999999999h", "18446744073709551615m"] {
            assert!(
                matches!(parse_duration_secs(bad), Err(LifeError::InvalidDuration(_))),
                "expected invalid: {bad}"
            );
        }
        assert!(parse_duration_minutes("400000000000000000").is_err());
    }

    #[test]
    fn percentages() {
        assert_eq!(parse_percentage("0").unwrap(), 0);
        assert_eq!(parse_percentage("100").unwrap(), 100);
        assert_eq!(parse_percentage("42%").unwrap(), 42);
        for bad in ["101", "-1", "abc", "50.5", ""] {
            assert!(
                matches!(parse_percentage(bad), Err(LifeError::InvalidPercentage(_))),
                "expected invalid: {bad}"
            );
        }
    }

    #[test]
    fn months() {
        assert_eq!(parse_month("2024-02").unwrap(), (2024, 2));
        assert!(parse_month("2024-13").is_err());
        assert!(parse_month("24-02").is_err());
    }

    #[test]
    fn week_start_monday_and_sunday() {
        // 2024-03-06 is a Wednesday.
        let wed = d("2024-03-06");
        assert_eq!(week_start(wed, true), d("2024-03-04"));
        assert_eq!(week_start(wed, false), d("2024-03-03"));
    }

    #[test]
    fn minutes_formatting() {
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(65), "1h 05m");
    }
}
