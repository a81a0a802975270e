use std::cmp::Reverse;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::record::{RecordTime, VerificationRecord};

/// Numeric times at or above this are epoch milliseconds; below it, seconds.
pub const MILLIS_THRESHOLD: i64 = 10_000_000_000;

/// Resolve a record time to an instant. Unparseable values resolve to `now_ms`.
pub fn interpret_time(time: &RecordTime, now_ms: i64) -> DateTime<Utc> {
    let millis = match time {
        RecordTime::Number(number) => number_to_millis(number),
        RecordTime::Text(text) => parse_text(text).map(|dt| dt.timestamp_millis()),
    };
    millis
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_else(|| from_millis(now_ms))
}

/// Newest first. Records with equal instants keep their input order.
pub fn sort_by_recency(records: &mut [VerificationRecord], now_ms: i64) {
    records.sort_by_cached_key(|record| Reverse(interpret_time(&record.time, now_ms)));
}

pub fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

/// Human readable age of `then` relative to `now`.
pub fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return plural(minutes, "minute");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return plural(hours, "hour");
    }
    let days = hours / 24;
    if days < 30 {
        return plural(days, "day");
    }
    let months = days / 30;
    if months < 12 {
        return plural(months, "month");
    }
    plural(months / 12, "year")
}

/// `MM-DD HH:MM:SS`
pub fn format_absolute(time: DateTime<Utc>) -> String {
    time.format("%m-%d %H:%M:%S").to_string()
}

/// `YYYY-MM-DD HH:MM:SS`
pub fn format_full(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

fn number_to_millis(number: &serde_json::Number) -> Option<i64> {
    if let Some(value) = number.as_i64() {
        return if value >= MILLIS_THRESHOLD {
            Some(value)
        } else {
            value.checked_mul(1000)
        };
    }
    let value = number.as_f64().filter(|v| v.is_finite())?;
    let millis = if value >= MILLIS_THRESHOLD as f64 {
        value
    } else {
        value * 1000.0
    };
    Some(millis as i64)
}

fn parse_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    // Offset-less forms are taken as UTC.
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
