use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use thiserror::Error;

use crate::network::Timestamp;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid time '{0}', expected H:MM or H:MM:SS.")]
pub struct TimeParseError(pub String);

fn parse_time_impl(h: &str, m: &str, s: &str) -> Result<Timestamp, std::num::ParseIntError> {
    let hours: i32 = h.parse()?;
    let minutes: i32 = m.parse()?;
    let seconds: i32 = s.parse()?;
    Ok(hours * 3600 + minutes * 60 + seconds)
}

/// Parses `"10:05"` or `"10:05:30"` into seconds since midnight. Hours may exceed 24 for trips running past midnight.
pub fn parse_time(s: &str) -> Result<Timestamp, TimeParseError> {
    let parts: Vec<&str> = s.split(':').collect();
    let (hour, min, sec) = match parts.as_slice() {
        [h, m] => (*h, *m, "00"),
        [h, m, s] => (*h, *m, *s),
        _ => return Err(TimeParseError(s.to_owned())),
    };
    if hour.is_empty() || min.len() != 2 || sec.len() != 2 {
        return Err(TimeParseError(s.to_owned()));
    }
    let time = parse_time_impl(hour, min, sec).map_err(|_| TimeParseError(s.to_owned()))?;
    if time < 0 {
        return Err(TimeParseError(s.to_owned()));
    }
    Ok(time)
}

pub fn get_time_str(time: Timestamp) -> String {
    let sign = if time < 0 { "-" } else { "" };
    let time = time.abs();
    let hours = time / 3600;
    let minutes = (time % 3600) / 60;
    let seconds = time % 60;
    format!("{sign}{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Like [`get_time_str`], but drops the seconds when they are zero.
pub fn get_compact_time_str(time: Timestamp) -> String {
    if time % 60 == 0 {
        let full = get_time_str(time);
        full[..full.len() - 3].to_string()
    } else {
        get_time_str(time)
    }
}

/// Formats a duration as `1h2m`, `5m`, `1m30s` or `0s`.
pub fn get_duration_str(duration: i32) -> String {
    if duration == 0 {
        return "0s".to_string();
    }
    let sign = if duration < 0 { "-" } else { "" };
    let duration = duration.abs();
    let (h, m, s) = (duration / 3600, (duration % 3600) / 60, duration % 60);
    let mut out = String::from(sign);
    if h > 0 {
        out.push_str(&format!("{h}h"));
    }
    if m > 0 {
        out.push_str(&format!("{m}m"));
    }
    if s > 0 {
        out.push_str(&format!("{s}s"));
    }
    out
}

/// Converts a service-day time into a date-time. Times past midnight roll over into the next day.
pub fn to_date_time(service_date: NaiveDate, time: Timestamp) -> Option<NaiveDateTime> {
    let midnight = service_date.and_hms_opt(0, 0, 0)?;
    midnight.checked_add_signed(TimeDelta::try_seconds(time as i64)?)
}
