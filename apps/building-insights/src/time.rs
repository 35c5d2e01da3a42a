use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a sensor or query timestamp. Offsets are normalised to UTC and dropped so
/// every timestamp in the table compares on the same naive wall clock.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("timestamp is empty".to_string());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    Err(format!("unrecognised timestamp '{trimmed}'"))
}

/// Lower window bound. A bare date starts at midnight.
pub fn parse_window_start(raw: &str) -> Result<NaiveDateTime, String> {
    parse_timestamp(raw)
}

/// Upper window bound. A bare date covers the whole day, so `end_date=2024-01-10`
/// includes readings taken during the 10th.
pub fn parse_window_end(raw: &str) -> Result<NaiveDateTime, String> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return date
            .and_hms_nano_opt(23, 59, 59, 999_999_999)
            .ok_or_else(|| format!("unable to build end of day for {trimmed}"));
    }
    parse_timestamp(trimmed)
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S").to_string()
}
