//! Field extraction over a raw JSON object.
//!
//! A [`RawRecord`] owns a copy of the payload's map. Each `take_*` call looks
//! up an ordered list of accepted keys, keeps the first non-null value and
//! removes every listed key, so whatever is left at the end is exactly the
//! set of fields nobody mapped.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

pub(crate) struct RawRecord {
    fields: Map<String, Value>,
}

impl RawRecord {
    /// `None` unless `raw` is a JSON object.
    pub fn from_value(raw: &Value) -> Option<Self> {
        match raw {
            Value::Object(map) => Some(Self {
                fields: map.clone(),
            }),
            _ => None,
        }
    }

    /// First non-null value among `keys`, consuming all of them.
    pub fn take(&mut self, keys: &[&str]) -> Option<Value> {
        let mut found = None;
        for key in keys {
            if let Some(value) = self.fields.remove(*key) {
                if found.is_none() && !value.is_null() {
                    found = Some(value);
                }
            }
        }
        found
    }

    pub fn take_string(&mut self, keys: &[&str]) -> Option<String> {
        self.take(keys).and_then(|v| as_string(&v))
    }

    pub fn take_i64(&mut self, keys: &[&str]) -> Option<i64> {
        self.take(keys).and_then(|v| as_i64(&v))
    }

    /// Non-negative count; negative inputs floor at zero.
    pub fn take_u32(&mut self, keys: &[&str]) -> Option<u32> {
        self.take_i64(keys)
            .map(|n| n.clamp(0, i64::from(u32::MAX)) as u32)
    }

    pub fn take_f64(&mut self, keys: &[&str]) -> Option<f64> {
        self.take(keys).and_then(|v| as_f64(&v))
    }

    pub fn take_datetime(&mut self, keys: &[&str]) -> Option<DateTime<Utc>> {
        let value = self.take(keys)?;
        let parsed = as_datetime(&value);
        if parsed.is_none() {
            tracing::debug!(value = %value, "Unrecognised timestamp, dropping");
        }
        parsed
    }

    pub fn into_extra(self) -> Map<String, Value> {
        self.fields
    }
}

pub(crate) fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Integers arrive as JSON numbers, or as strings from DECIMAL/BIGINT columns.
pub(crate) fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// RFC 3339, naive `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS` (taken as
/// UTC), bare dates, or epoch milliseconds.
pub(crate) fn as_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
