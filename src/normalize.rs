//! Record normalization: raw backend payloads into dated, defaulted records

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::Result;
use crate::models::{NormalizedRecord, RawRecord, Workload};

/// Naive datetime layouts accepted besides RFC 3339; seconds are optional
const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Offset datetimes without seconds (`2024-01-05T10:00+09:00`)
const OFFSET_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M%#z", "%Y-%m-%d %H:%M%#z"];

/// Decode a timeseries payload.
///
/// A payload that is valid JSON but not an array carries no records and
/// yields an empty list. Only a JSON syntax error is reported.
pub fn parse_records(payload: &str) -> Result<Vec<RawRecord>> {
    let value: Value = serde_json::from_str(payload)?;
    Ok(records_from_value(value))
}

/// Split an already decoded JSON value into raw records
pub fn records_from_value(value: Value) -> Vec<RawRecord> {
    match value {
        Value::Array(items) => items.into_iter().map(RawRecord::from).collect(),
        other => {
            debug!(kind = json_kind(&other), "Timeseries payload is not an array");
            Vec::new()
        }
    }
}

/// Parse an ISO date or datetime string into a UTC instant.
///
/// Date-only strings are midnight UTC. Naive datetimes are read as UTC.
pub fn parse_record_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    if let Some(dt) = OFFSET_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }

    // A trailing `Z` marks UTC; without it the datetime is read as UTC anyway
    let naive = s.strip_suffix(|c: char| c == 'Z' || c == 'z').unwrap_or(s);
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
        .map(|dt| dt.and_utc())
}

impl NormalizedRecord {
    /// Normalize a single raw record; `None` when its date is unusable
    pub fn from_raw(raw: &RawRecord) -> Option<Self> {
        let date = raw.date()?;
        let date_obj = parse_record_date(date)?;

        let workload = raw
            .workload()
            .map(|w| Workload::new(w.clone()))
            .unwrap_or_default();

        let loads = raw
            .fields()
            .iter()
            .filter(|(k, _)| k.as_str() != "date" && k.as_str() != "workload")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Some(NormalizedRecord {
            date: date.to_string(),
            date_obj,
            workload,
            loads,
        })
    }
}

/// Normalize raw records.
///
/// Records whose date cannot be parsed are dropped silently. Survivors keep
/// their relative payload order; sorting is left to [`crate::models::Series`].
pub fn normalize(raw_records: &[RawRecord]) -> Vec<NormalizedRecord> {
    let normalized: Vec<NormalizedRecord> = raw_records
        .iter()
        .filter_map(|raw| {
            let record = NormalizedRecord::from_raw(raw);
            if record.is_none() {
                trace!(date = ?raw.field("date"), "Dropping record with unparseable date");
            }
            record
        })
        .collect();

    let dropped = raw_records.len() - normalized.len();
    if dropped > 0 {
        debug!(
            total = raw_records.len(),
            dropped, "Dropped records without a valid date"
        );
    }

    normalized
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use proptest::prelude::*;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        RawRecord::from(value)
    }

    #[test]
    fn test_parse_record_date_formats() {
        let d = parse_record_date("2024-01-15").unwrap();
        assert_eq!((d.year(), d.month(), d.day(), d.hour()), (2024, 1, 15, 0));

        let d = parse_record_date("2024-01-15T18:30:00+09:00").unwrap();
        assert_eq!((d.day(), d.hour()), (15, 9));

        let d = parse_record_date("2024-01-15 06:00:00").unwrap();
        assert_eq!(d.hour(), 6);

        assert!(parse_record_date("").is_none());
        assert!(parse_record_date("not a date").is_none());
        assert!(parse_record_date("2024-02-30").is_none());
    }

    #[test]
    fn test_parse_record_date_without_seconds() {
        let d = parse_record_date("2024-01-05T10:00").unwrap();
        assert_eq!((d.day(), d.hour(), d.minute()), (5, 10, 0));

        let d = parse_record_date("2024-01-05 10:15").unwrap();
        assert_eq!((d.hour(), d.minute()), (10, 15));

        let d = parse_record_date("2024-01-05T10:00Z").unwrap();
        assert_eq!((d.day(), d.hour()), (5, 10));

        let d = parse_record_date("2024-01-05T10:00+09:00").unwrap();
        assert_eq!((d.day(), d.hour()), (5, 1));

        let d = parse_record_date("2024-01-05T01:30-0500").unwrap();
        assert_eq!((d.day(), d.hour(), d.minute()), (5, 6, 30));

        assert!(parse_record_date("2024-01-05T25:00").is_none());
        assert!(parse_record_date("2024-01-05Z").is_none());
    }

    #[test]
    fn test_normalize_drops_invalid_dates() {
        let records = vec![
            raw(json!({"date": "2024-01-01", "total_distance": 5000})),
            raw(json!({"date": "garbage"})),
            raw(json!({"total_distance": 3000})),
            raw(json!(null)),
            raw(json!({"date": 20240103})),
            raw(json!({"date": "2024-01-02", "workload": {"acwr_hsr": 1.1}})),
        ];

        let normalized = normalize(&records);

        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].date, "2024-01-01");
        assert_eq!(normalized[1].date, "2024-01-02");
    }

    #[test]
    fn test_normalize_preserves_order() {
        let records = vec![
            raw(json!({"date": "2024-03-01"})),
            raw(json!({"date": "2024-01-01"})),
            raw(json!({"date": "2024-02-01"})),
        ];

        let dates: Vec<_> = normalize(&records).into_iter().map(|r| r.date).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-01-01", "2024-02-01"]);
    }

    #[test]
    fn test_normalize_defaults_workload() {
        let records = vec![
            raw(json!({"date": "2024-01-01"})),
            raw(json!({"date": "2024-01-02", "workload": null})),
            raw(json!({"date": "2024-01-03", "workload": [1, 2]})),
        ];

        let normalized = normalize(&records);
        assert_eq!(normalized.len(), 3);
        assert!(normalized.iter().all(|r| r.workload.is_empty()));
    }

    #[test]
    fn test_normalize_keeps_load_fields() {
        let records = vec![raw(json!({
            "date": "2024-01-01",
            "total_distance": 6120.5,
            "static_anomaly": true,
            "workload": {"acwr_hsr": 1.2}
        }))];

        let record = &normalize(&records)[0];
        assert_eq!(record.number("total_distance"), Some(6120.5));
        assert_eq!(record.loads.get("static_anomaly"), Some(&json!(true)));
        assert!(!record.loads.contains_key("date"));
        assert!(!record.loads.contains_key("workload"));
        assert_eq!(record.workload.number("acwr_hsr"), Some(1.2));
    }

    #[test]
    fn test_parse_records_payload_shapes() {
        let records = parse_records(r#"[{"date": "2024-01-01"}, 5, "x"]"#).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(normalize(&records).len(), 1);

        assert!(parse_records(r#"{"detail": "not found"}"#).unwrap().is_empty());
        assert!(parse_records("[{").is_err());
    }

    #[test]
    fn test_normalize_is_repeatable() {
        let records = vec![
            raw(json!({"date": "2024-01-01", "workload": {"risk_level": "caution"}})),
            raw(json!({"date": "bad"})),
        ];
        assert_eq!(normalize(&records), normalize(&records));
    }

    proptest! {
        #[test]
        fn test_normalize_never_grows(
            dates in proptest::collection::vec(
                prop_oneof![
                    (2000i32..2030, 1u32..13, 1u32..29)
                        .prop_map(|(y, m, d)| format!("{:04}-{:02}-{:02}", y, m, d)),
                    "[a-z0-9 -]{0,12}",
                ],
                0..40,
            )
        ) {
            let records: Vec<RawRecord> = dates
                .iter()
                .map(|d| RawRecord::from(json!({"date": d})))
                .collect();

            let normalized = normalize(&records);

            prop_assert!(normalized.len() <= records.len());
            for record in &normalized {
                prop_assert!(parse_record_date(&record.date).is_some());
            }
        }
    }
}
