use crate::model::{Axis, PeakRecord};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

/// Canonical field name paired with every wire spelling accepted for it.
/// Older service versions sent `frequency_*`, newer ones `freq_*`.
pub const FIELD_ALIASES: &[(&str, &[&str])] = &[
    ("timestamp", &["timestamp"]),
    ("ppv_x", &["ppv_x"]),
    ("ppv_y", &["ppv_y"]),
    ("ppv_z", &["ppv_z"]),
    ("freq_x", &["freq_x", "frequency_x"]),
    ("freq_y", &["freq_y", "frequency_y"]),
    ("freq_z", &["freq_z", "frequency_z"]),
];

/// Unix timestamps below this are taken to be seconds, at or above it
/// milliseconds. 10^10 seconds is year 2286, 10^10 ms is March 1970.
const MILLIS_CUTOFF: f64 = 10_000_000_000.0;

/// Converts one raw peak record, as received from the service, into its
/// canonical form. Total over arbitrary JSON: every missing or unparseable
/// field degrades to zero (or an unknown timestamp), never an error.
pub fn normalize(raw: &Value) -> PeakRecord {
    let ppv_x = number(raw, "ppv_x");
    let ppv_y = number(raw, "ppv_y");
    let ppv_z = number(raw, "ppv_z");
    let freq_x = number(raw, "freq_x");
    let freq_y = number(raw, "freq_y");
    let freq_z = number(raw, "freq_z");

    let ppv_max = ppv_x.max(ppv_y).max(ppv_z);
    // First axis reaching the max wins: X, then Y, then Z.
    let (max_axis, dominant) = if ppv_x >= ppv_y && ppv_x >= ppv_z {
        (Axis::X, freq_x)
    } else if ppv_y >= ppv_z {
        (Axis::Y, freq_y)
    } else {
        (Axis::Z, freq_z)
    };

    PeakRecord {
        timestamp: parse_timestamp(raw),
        ppv_x,
        ppv_y,
        ppv_z,
        freq_x,
        freq_y,
        freq_z,
        ppv_max,
        max_axis,
        dominant_freq: dominant.round() as i64,
    }
}

fn aliases(canonical: &str) -> &'static [&'static str] {
    FIELD_ALIASES
        .iter()
        .find(|(name, _)| *name == canonical)
        .map(|(_, spellings)| *spellings)
        .unwrap_or(&[])
}

/// Numeric field lookup across all accepted spellings. Numbers and numeric
/// strings both count; anything else is 0.
fn number(raw: &Value, canonical: &str) -> f64 {
    for name in aliases(canonical) {
        let Some(value) = raw.get(name) else { continue };
        if let Some(n) = value.as_f64() {
            return n;
        }
        if let Some(s) = value.as_str() {
            if let Ok(n) = s.trim().parse::<f64>() {
                return n;
            }
        }
    }
    0.0
}

fn parse_timestamp(raw: &Value) -> Option<DateTime<Utc>> {
    let value = raw.get("timestamp")?;
    if let Some(n) = value.as_f64() {
        return from_epoch(n);
    }
    if let Some(s) = value.as_str() {
        if let Ok(n) = s.trim().parse::<f64>() {
            return from_epoch(n);
        }
        if let Ok(t) = DateTime::parse_from_rfc3339(s) {
            return Some(t.with_timezone(&Utc));
        }
    }
    None
}

fn from_epoch(n: f64) -> Option<DateTime<Utc>> {
    let millis = if n < MILLIS_CUTOFF { n * 1000.0 } else { n };
    Utc.timestamp_millis_opt(millis as i64).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_object_defaults_to_zeros() {
        let record = normalize(&json!({}));
        assert_eq!(record.ppv_x, 0.0);
        assert_eq!(record.ppv_y, 0.0);
        assert_eq!(record.ppv_z, 0.0);
        assert_eq!(record.freq_x, 0.0);
        assert_eq!(record.ppv_max, 0.0);
        assert_eq!(record.dominant_freq, 0);
        assert!(record.timestamp.is_none());
        assert_eq!(record.date_string(), "unknown");
    }

    #[test]
    fn test_non_object_input_is_tolerated() {
        for raw in [json!(null), json!(42), json!("text"), json!([1, 2])] {
            let record = normalize(&raw);
            assert_eq!(record.ppv_max, 0.0);
            assert!(record.timestamp.is_none());
        }
    }

    #[test]
    fn test_dominant_axis_and_frequency() {
        let record = normalize(&json!({
            "ppv_x": 1.8, "ppv_y": 2.1, "ppv_z": 4.8,
            "freq_x": 12.0, "freq_y": 15.0, "freq_z": 17.6
        }));
        assert_eq!(record.ppv_max, 4.8);
        assert_eq!(record.max_axis, Axis::Z);
        assert_eq!(record.dominant_freq, 18);
    }

    #[test]
    fn test_tie_break_prefers_x_then_y() {
        let record = normalize(&json!({"ppv_x": 5.0, "ppv_y": 5.0, "ppv_z": 5.0}));
        assert_eq!(record.max_axis, Axis::X);

        let record = normalize(&json!({"ppv_x": 1.0, "ppv_y": 5.0, "ppv_z": 5.0}));
        assert_eq!(record.max_axis, Axis::Y);
    }

    #[test]
    fn test_frequency_aliases() {
        let record = normalize(&json!({
            "ppv_x": 3.0,
            "frequency_x": 21.0, "frequency_y": 9.0, "frequency_z": 4.0
        }));
        assert_eq!(record.freq_x, 21.0);
        assert_eq!(record.freq_y, 9.0);
        assert_eq!(record.dominant_freq, 21);
    }

    #[test]
    fn test_timestamp_seconds_and_millis_agree() {
        let secs = normalize(&json!({"timestamp": 1_700_000_000i64}));
        let millis = normalize(&json!({"timestamp": 1_700_000_000_000i64}));
        assert_eq!(secs.timestamp, millis.timestamp);
        assert_eq!(secs.date_string(), millis.date_string());
        assert!(secs.timestamp.is_some());
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let record = normalize(&json!({
            "timestamp": "1700000000",
            "ppv_x": "3.5", "ppv_y": "bogus", "freq_x": "10"
        }));
        assert_eq!(record.ppv_x, 3.5);
        assert_eq!(record.ppv_y, 0.0);
        assert_eq!(record.freq_x, 10.0);
        assert!(record.timestamp.is_some());
    }

    #[test]
    fn test_rfc3339_timestamp_accepted() {
        let record = normalize(&json!({"timestamp": "2026-01-16T14:23:18Z"}));
        assert_eq!(record.time_string(), "14:23:18");
        assert_eq!(record.date_string(), "16-01-2026");
    }
}
