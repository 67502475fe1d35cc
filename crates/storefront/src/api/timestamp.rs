//! Lenient timestamp decoding.
//!
//! Backend builds disagree on timestamps: some send epoch seconds as a
//! float, others Python `isoformat()` strings with or without an offset.
//! Use with `#[serde(default, deserialize_with = "timestamp::deserialize")]`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Seconds(f64),
    Text(String),
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<Raw>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match raw {
        Raw::Seconds(secs) => Ok(from_epoch_seconds(secs)),
        Raw::Text(text) => parse_text(&text)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp '{text}'"))),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn from_epoch_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let millis = (secs * 1000.0).round() as i64;
    DateTime::from_timestamp_millis(millis)
}

fn parse_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}
