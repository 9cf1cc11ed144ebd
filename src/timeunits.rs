//! UDUNITS time handling.
//!
//! Time coordinates are stored as offsets ("3600 seconds since
//! 1970-01-01 00:00:00"). [`TimeUnits`] parses the unit string once and
//! converts raw time values into UTC timestamps. Deployment times may be
//! given either as a full UDUNITS instant or as an ISO-8601 date.

use crate::error::{Result, TrajectoryError};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

static UNITS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([a-z]+)\s+since\s+(.+?)\s*$").expect("valid units regex")
});

static EPOCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(\d{1,4})-(\d{1,2})-(\d{1,2})(?:[T\s]+(\d{1,2}):(\d{1,2})(?::(\d{1,2})(?:\.(\d+))?)?)?\s*(Z|UTC|GMT|[+-]\d{1,2}(?::?\d{2})?)?$",
    )
    .expect("valid epoch regex")
});

static INSTANT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([-+]?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)\s+(.+)$").expect("valid instant regex")
});

/// Parsed `"<unit> since <epoch>"` string
#[derive(Debug, Clone, PartialEq)]
pub struct TimeUnits {
    text: String,
    unit_seconds: f64,
    epoch: DateTime<Utc>,
}

impl TimeUnits {
    pub fn parse(units: &str) -> Result<Self> {
        let captures = UNITS_RE.captures(units).ok_or_else(|| {
            TrajectoryError::invalid_time_units(units, "expected '<unit> since <date>'")
        })?;

        let unit_seconds = unit_in_seconds(&captures[1]).ok_or_else(|| {
            TrajectoryError::invalid_time_units(units, format!("unknown unit '{}'", &captures[1]))
        })?;
        let epoch = parse_date(&captures[2]).ok_or_else(|| {
            TrajectoryError::invalid_time_units(
                units,
                format!("cannot parse reference date '{}'", &captures[2]),
            )
        })?;

        Ok(Self {
            text: units.trim().to_string(),
            unit_seconds,
            epoch,
        })
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Timestamp of a raw time value, `None` for NaN or out-of-range values
    pub fn to_datetime(&self, value: f64) -> Option<DateTime<Utc>> {
        if !value.is_finite() {
            return None;
        }
        let millis = (value * self.unit_seconds * 1000.0).round();
        if millis.abs() >= i64::MAX as f64 {
            return None;
        }
        let delta = TimeDelta::try_milliseconds(millis as i64)?;
        self.epoch.checked_add_signed(delta)
    }
}

/// Parse a deployment time: `"1 day since 2011-09-07 00:00:00"` or an ISO date
pub fn parse_instant(text: &str) -> Result<DateTime<Utc>> {
    if let Some(captures) = INSTANT_RE.captures(text) {
        if UNITS_RE.is_match(&captures[2]) {
            let value: f64 = captures[1].parse().map_err(|_| {
                TrajectoryError::invalid_time_units(text, "invalid numeric offset")
            })?;
            let units = TimeUnits::parse(&captures[2])?;
            return units
                .to_datetime(value)
                .ok_or_else(|| TrajectoryError::invalid_time_units(text, "time out of range"));
        }
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(text.trim()) {
        return Ok(instant.with_timezone(&Utc));
    }

    parse_date(text).ok_or_else(|| {
        TrajectoryError::invalid_time_units(text, "expected a UDUNITS time or an ISO-8601 date")
    })
}

fn unit_in_seconds(unit: &str) -> Option<f64> {
    match unit.to_lowercase().as_str() {
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => Some(0.001),
        "s" | "sec" | "secs" | "second" | "seconds" => Some(1.0),
        "min" | "mins" | "minute" | "minutes" => Some(60.0),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(3_600.0),
        "d" | "day" | "days" => Some(86_400.0),
        "week" | "weeks" => Some(604_800.0),
        _ => None,
    }
}

/// Reference dates as UDUNITS writes them: `1970-1-1`, `1970-01-01 00:00:00`,
/// `1970-01-01T00:00:00Z`, with an optional zone offset
fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let captures = EPOCH_RE.captures(text.trim())?;
    let number = |i: usize| -> Option<u32> {
        captures
            .get(i)
            .map(|m| m.as_str().parse().ok())
            .unwrap_or(Some(0))
    };

    let year: i32 = captures[1].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, number(2)?, number(3)?)?;

    let nanos = match captures.get(7) {
        Some(fraction) => {
            let digits: String = fraction.as_str().chars().take(9).collect();
            let scale = 10u32.pow(9 - digits.len() as u32);
            digits.parse::<u32>().ok()? * scale
        }
        None => 0,
    };
    let time = NaiveTime::from_hms_nano_opt(number(4)?, number(5)?, number(6)?, nanos)?;
    let naive = NaiveDateTime::new(date, time);

    let offset_seconds = match captures.get(8).map(|m| m.as_str().to_uppercase()) {
        None => 0,
        Some(zone) if zone == "Z" || zone == "UTC" || zone == "GMT" => 0,
        Some(zone) => parse_offset(&zone)?,
    };
    let offset = FixedOffset::east_opt(offset_seconds)?;
    let local = offset.from_local_datetime(&naive).single()?;
    Some(local.with_timezone(&Utc))
}

/// `+1`, `-0130`, `+01:30` to seconds east of UTC
fn parse_offset(zone: &str) -> Option<i32> {
    let sign = if zone.starts_with('-') { -1 } else { 1 };
    let digits: String = zone[1..].chars().filter(|c| c.is_ascii_digit()).collect();
    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i32>().ok()?, 0),
        3 | 4 => {
            let split = digits.len() - 2;
            (
                digits[..split].parse::<i32>().ok()?,
                digits[split..].parse::<i32>().ok()?,
            )
        }
        _ => return None,
    };
    Some(sign * (hours * 3_600 + minutes * 60))
}
