//! Timestamps as the watcher service emits them.
//!
//! The service is inconsistent: log entries carry a raw epoch float
//! (`time.time()`), while status snapshots carry an ISO-8601 string.  Both
//! decode to `DateTime<Utc>` here.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Epoch(f64),
    Text(String),
}

fn convert(raw: Raw) -> Option<DateTime<Utc>> {
    match raw {
        Raw::Epoch(secs) => {
            if !secs.is_finite() {
                return None;
            }
            let whole = secs.trunc() as i64;
            let nanos = ((secs - secs.trunc()) * 1e9) as u32;
            Utc.timestamp_opt(whole, nanos).single()
        }
        Raw::Text(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            // Some snapshots omit the offset entirely; treat those as UTC.
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| Utc.from_utc_datetime(&naive))
        }
    }
}

/// For `Option<DateTime<Utc>>` fields: missing, null, or unparseable all
/// become `None`.
pub(crate) fn de_opt<'de, D>(de: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Raw> = Option::deserialize(de)?;
    Ok(raw.and_then(convert))
}

/// For patch fields (`Option<Option<DateTime<Utc>>>`): the outer `Some`
/// records that the key was present at all, so an explicit null can clear
/// the prior value while an absent key leaves it alone.
pub(crate) fn de_patch<'de, D>(de: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Raw> = Option::deserialize(de)?;
    Ok(Some(raw.and_then(convert)))
}
