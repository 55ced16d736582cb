//! Flexible attack-timestamp parsing
//!
//! Attack pods report timestamps in one of two layouts depending on their
//! runtime version: RFC 3339 with timezone, or a naive Python-isoformat
//! style without one. Both are accepted and normalized to UTC.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer};
use thiserror::Error;

/// Layout for timestamps without timezone info, like Python's
/// `datetime.isoformat()`. Interpreted in the server's local timezone.
const LAYOUT_WITHOUT_TIMEZONE: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Error)]
#[error("failed to parse time {value:?} with any known layout")]
pub struct ParseTimeError {
    value: String,
}

/// A timestamp that deserializes from either accepted layout.
///
/// JSON `null` is tolerated and maps to the default (Unix epoch), matching
/// the zero-value behavior sensors rely on when self-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlexibleTime(DateTime<Utc>);

impl Default for FlexibleTime {
    fn default() -> Self {
        Self(DateTime::UNIX_EPOCH)
    }
}

impl FlexibleTime {
    pub fn parse(s: &str) -> Result<Self, ParseTimeError> {
        // Try the timezone-aware standard format first.
        if let Ok(t) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(t.with_timezone(&Utc)));
        }

        // Fall back to the naive layout in local time.
        NaiveDateTime::parse_from_str(s, LAYOUT_WITHOUT_TIMEZONE)
            .ok()
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
            .map(|t| Self(t.with_timezone(&Utc)))
            .ok_or_else(|| ParseTimeError {
                value: s.to_string(),
            })
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Short local-time rendering for the ingestion log line.
    pub fn format_local(&self) -> String {
        self.0
            .with_timezone(&Local)
            .format("%d.%m. %H:%M:%S")
            .to_string()
    }
}

impl From<DateTime<Utc>> for FlexibleTime {
    fn from(t: DateTime<Utc>) -> Self {
        Self(t)
    }
}

impl<'de> Deserialize<'de> for FlexibleTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(Self::default()),
            Some(s) => Self::parse(&s).map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_with_zulu() {
        let t = FlexibleTime::parse("2024-01-01T10:00:00Z").unwrap();
        assert_eq!(t.timestamp_millis(), 1_704_103_200_000);
    }

    #[test]
    fn parses_rfc3339_with_offset_and_fraction() {
        let a = FlexibleTime::parse("2024-01-01T10:00:00.250Z").unwrap();
        let b = FlexibleTime::parse("2024-01-01T12:00:00.250+02:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.timestamp_millis(), 1_704_103_200_250);
    }

    #[test]
    fn parses_naive_layout_in_local_time() {
        let t = FlexibleTime::parse("2024-01-01T10:00:00.123456").unwrap();
        let naive =
            NaiveDateTime::parse_from_str("2024-01-01T10:00:00.123456", "%Y-%m-%dT%H:%M:%S%.f")
                .unwrap();
        let expected = Local.from_local_datetime(&naive).earliest().unwrap();
        assert_eq!(t.timestamp_millis(), expected.timestamp_millis());
    }

    #[test]
    fn rejects_unknown_layouts() {
        assert!(FlexibleTime::parse("01.02.2024 10:00").is_err());
        assert!(FlexibleTime::parse("not a time").is_err());
        assert!(FlexibleTime::parse("").is_err());
    }

    #[test]
    fn null_is_tolerated() {
        #[derive(Deserialize)]
        struct Probe {
            #[serde(default)]
            ts: FlexibleTime,
        }
        let p: Probe = serde_json::from_str(r#"{"ts": null}"#).unwrap();
        assert_eq!(p.ts, FlexibleTime::default());
        let p: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(p.ts, FlexibleTime::default());
    }
}
