//! Typed field access over raw JSON host records.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{DedupError, Result};

pub(super) type Record = Map<String, Value>;

pub(super) fn as_record<'a>(raw: &'a Value, source: &str) -> Result<&'a Record> {
    raw.as_object()
        .ok_or_else(|| DedupError::normalization(source, "record is not a JSON object"))
}

/// First key present with a non-null value
pub(super) fn first<'a>(record: &'a Record, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !value.is_null())
}

/// String or number rendered as text; anything else is empty
pub(super) fn text(record: &Record, keys: &[&str]) -> String {
    match first(record, keys) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Strings collected across `keys`; each value may be a string or an array
pub(super) fn text_list(record: &Record, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .flat_map(|value| match value {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        })
        .collect()
}

pub(super) fn count(record: &Record, keys: &[&str], source: &str) -> Result<u32> {
    let Some(value) = first(record, keys) else {
        return Ok(0);
    };

    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    parsed
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| DedupError::normalization(source, format!("invalid count: {value}")))
}

pub(super) fn flag(record: &Record, keys: &[&str], default: bool) -> bool {
    first(record, keys).and_then(Value::as_bool).unwrap_or(default)
}

pub(super) fn timestamp(
    record: &Record,
    keys: &[&str],
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    Ok(optional_timestamp(record, keys)?.unwrap_or(now))
}

pub(super) fn optional_timestamp(record: &Record, keys: &[&str]) -> Result<Option<DateTime<Utc>>> {
    match first(record, keys) {
        None => Ok(None),
        Some(Value::String(s)) => parse_timestamp(s).map(Some),
        Some(other) => Err(DedupError::InvalidTimestamp(other.to_string())),
    }
}

/// RFC 3339, or a naive ISO-8601 datetime / date taken as UTC
pub(super) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Ok(at.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| DedupError::InvalidTimestamp(s.to_string()))
}
