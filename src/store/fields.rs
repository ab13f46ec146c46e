//! Lenient field decoding for request bodies.
//!
//! The frontend posts form values, so numbers may arrive as strings and dates
//! as either a plain day or a full timestamp.

use chrono::{DateTime, NaiveDate};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::fmt::Display;
use std::str::FromStr;

pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Calendar day of `raw`. Timestamps keep the day of their own offset.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let t = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(t, DAY_FORMAT) {
        return Some(d);
    }
    DateTime::parse_from_rfc3339(t).ok().map(|dt| dt.date_naive())
}

pub fn day_key(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

pub fn day<'de, D>(d: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(d)?;
    parse_day(&raw).ok_or_else(|| D::Error::custom(format!("invalid date: {raw}")))
}

pub fn day_opt<'de, D>(d: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(d)?;
    match raw {
        None => Ok(None),
        Some(s) => parse_day(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid date: {s}"))),
    }
}

fn number_from_value<T, E>(v: serde_json::Value) -> Result<T, E>
where
    T: FromStr,
    T::Err: Display,
    E: serde::de::Error,
{
    let text = match v {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        other => return Err(E::custom(format!("expected a number, got {other}"))),
    };
    text.parse::<T>()
        .map_err(|e| E::custom(format!("invalid number {text:?}: {e}")))
}

pub fn number<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let v = serde_json::Value::deserialize(d)?;
    number_from_value(v)
}

pub fn number_opt<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let v = serde_json::Value::deserialize(d)?;
    if v.is_null() {
        return Ok(None);
    }
    number_from_value(v).map(Some)
}
