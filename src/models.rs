use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::numeric::to_number;

/// One calendar day of workload data for one athlete, as received from the backend.
///
/// The payload is kept as an open JSON object: any field may be absent or
/// non-numeric, and absence means "not computed", never zero. Deserializing
/// a non-object JSON value yields an empty record rather than an error, so a
/// single malformed array element cannot poison a whole payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: Map<String, Value>,
}

impl RawRecord {
    /// Raw `date` field, if it is a string
    pub fn date(&self) -> Option<&str> {
        self.fields.get("date").and_then(Value::as_str)
    }

    /// Any top-level field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Nested `workload` object, if present and an object
    pub fn workload(&self) -> Option<&Map<String, Value>> {
        self.fields.get("workload").and_then(Value::as_object)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => RawRecord { fields },
            _ => RawRecord::default(),
        }
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(fields: Map<String, Value>) -> Self {
        RawRecord { fields }
    }
}

impl<'de> Deserialize<'de> for RawRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(RawRecord::from(value))
    }
}

/// Derived per-day metrics computed upstream (ACWR, monotony, asymmetry, risk)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Workload(Map<String, Value>);

impl Workload {
    pub fn new(fields: Map<String, Value>) -> Self {
        Workload(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Finite numeric value of a workload field
    pub fn number(&self, key: &str) -> Option<f64> {
        to_number(self.0.get(key))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A raw record whose date parsed to a valid instant.
///
/// `workload` is always present (empty when the payload had none) and
/// `loads` keeps every other top-level field verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    /// Date string as received
    pub date: String,

    /// Parsed calendar instant
    pub date_obj: DateTime<Utc>,

    /// Derived metrics, defaulted to empty
    pub workload: Workload,

    /// Remaining top-level fields (raw loads, anomaly flags, ...)
    #[serde(flatten)]
    pub loads: Map<String, Value>,
}

impl NormalizedRecord {
    /// Calendar day of the record (UTC)
    pub fn day(&self) -> NaiveDate {
        self.date_obj.date_naive()
    }

    /// Finite numeric value of a top-level field
    pub fn number(&self, key: &str) -> Option<f64> {
        to_number(self.loads.get(key))
    }

    /// Typed metric lookup
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        metric.extract(self)
    }
}

/// Time-ordered sequence of normalized records.
///
/// Invariant: records are sorted ascending by `date_obj` (duplicates are
/// kept); the latest record is the last element.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Series {
    records: Vec<NormalizedRecord>,
}

impl Series {
    /// Build a series by sorting records ascending by date.
    ///
    /// The sort is stable, so same-day records keep their payload order.
    pub fn from_records(mut records: Vec<NormalizedRecord>) -> Self {
        records.sort_by_key(|r| r.date_obj);
        Series { records }
    }

    /// Wrap records that are already sorted (a sub-slice of a series)
    pub(crate) fn from_sorted(records: Vec<NormalizedRecord>) -> Self {
        debug_assert!(records.windows(2).all(|w| w[0].date_obj <= w[1].date_obj));
        Series { records }
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NormalizedRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&NormalizedRecord> {
        self.records.first()
    }

    /// Most recent record
    pub fn latest(&self) -> Option<&NormalizedRecord> {
        self.records.last()
    }

    pub fn into_records(self) -> Vec<NormalizedRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a NormalizedRecord;
    type IntoIter = std::slice::Iter<'a, NormalizedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Where a metric lives in the record payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSource {
    /// Top-level raw load field
    Record,
    /// Field of the nested `workload` object
    Workload,
}

/// Known metric identifiers with typed extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TotalDistance,
    TotalPlayerLoad,
    HsrDistance,
    TotalDiveLoad,
    TotalJumps,
    AcwrTotalDistance,
    AcwrHsr,
    AcwrLoad,
    AcwrDive,
    AcwrJump,
    MonotonyLoad,
    ValAsymmetry,
    EfficiencyIndex,
    TimeToFeet,
}

impl Metric {
    pub const ALL: [Metric; 14] = [
        Metric::TotalDistance,
        Metric::TotalPlayerLoad,
        Metric::HsrDistance,
        Metric::TotalDiveLoad,
        Metric::TotalJumps,
        Metric::AcwrTotalDistance,
        Metric::AcwrHsr,
        Metric::AcwrLoad,
        Metric::AcwrDive,
        Metric::AcwrJump,
        Metric::MonotonyLoad,
        Metric::ValAsymmetry,
        Metric::EfficiencyIndex,
        Metric::TimeToFeet,
    ];

    /// Payload key
    pub fn key(&self) -> &'static str {
        match self {
            Metric::TotalDistance => "total_distance",
            Metric::TotalPlayerLoad => "total_player_load",
            Metric::HsrDistance => "hsr_distance",
            Metric::TotalDiveLoad => "total_dive_load",
            Metric::TotalJumps => "total_jumps",
            Metric::AcwrTotalDistance => "acwr_total_distance",
            Metric::AcwrHsr => "acwr_hsr",
            Metric::AcwrLoad => "acwr_load",
            Metric::AcwrDive => "acwr_dive",
            Metric::AcwrJump => "acwr_jump",
            Metric::MonotonyLoad => "monotony_load",
            Metric::ValAsymmetry => "val_asymmetry",
            Metric::EfficiencyIndex => "efficiency_index",
            Metric::TimeToFeet => "time_to_feet",
        }
    }

    pub fn source(&self) -> MetricSource {
        match self {
            Metric::TotalDistance
            | Metric::TotalPlayerLoad
            | Metric::HsrDistance
            | Metric::TotalDiveLoad
            | Metric::TotalJumps => MetricSource::Record,
            _ => MetricSource::Workload,
        }
    }

    pub fn from_key(key: &str) -> Option<Metric> {
        Metric::ALL.iter().copied().find(|m| m.key() == key)
    }

    /// Extract this metric from a record; absent or non-numeric is `None`
    pub fn extract(&self, record: &NormalizedRecord) -> Option<f64> {
        match self.source() {
            MetricSource::Record => record.number(self.key()),
            MetricSource::Workload => record.workload.number(self.key()),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Selector for a metric named by its payload key.
///
/// Unknown keys select nothing (every record yields `None`) instead of failing.
pub fn metric_selector(key: &str) -> impl Fn(&NormalizedRecord) -> Option<f64> {
    let metric = Metric::from_key(key);
    move |record: &NormalizedRecord| metric.and_then(|m| m.extract(record))
}

/// Playing position, which decides the metric set shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[default]
    #[serde(rename = "FP")]
    FieldPlayer,
    #[serde(rename = "GK")]
    Goalkeeper,
}

impl Position {
    pub fn code(&self) -> &'static str {
        match self {
            Position::FieldPlayer => "FP",
            Position::Goalkeeper => "GK",
        }
    }

    /// Lenient parse of a payload position; anything but GK is a field player
    pub fn from_payload(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_uppercase()) {
            Some(v) if v == "GK" => Position::Goalkeeper,
            _ => Position::FieldPlayer,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fp" | "field" | "field_player" => Ok(Position::FieldPlayer),
            "gk" | "goalkeeper" | "keeper" => Ok(Position::Goalkeeper),
            _ => Err(format!("Invalid position: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn record(day: u32, workload: Value, loads: Value) -> NormalizedRecord {
        NormalizedRecord {
            date: format!("2024-01-{:02}", day),
            date_obj: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            workload: Workload::new(workload.as_object().cloned().unwrap_or_default()),
            loads: loads.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_raw_record_from_non_object() {
        let raw: RawRecord = serde_json::from_value(json!(42)).unwrap();
        assert!(raw.fields().is_empty());
        assert_eq!(raw.date(), None);

        let raw: RawRecord = serde_json::from_value(json!({"date": 20240101})).unwrap();
        assert_eq!(raw.date(), None);
        assert!(raw.field("date").is_some());
    }

    #[test]
    fn test_metric_extraction() {
        let r = record(
            1,
            json!({"acwr_hsr": 1.4, "monotony_load": "n/a"}),
            json!({"total_distance": 5400.0}),
        );

        assert_eq!(r.metric(Metric::AcwrHsr), Some(1.4));
        assert_eq!(r.metric(Metric::MonotonyLoad), None);
        assert_eq!(r.metric(Metric::TotalDistance), Some(5400.0));
        assert_eq!(r.metric(Metric::AcwrDive), None);
    }

    #[test]
    fn test_unknown_metric_key_selects_nothing() {
        let r = record(1, json!({"acwr_hsr": 1.4}), json!({}));
        let known = metric_selector("acwr_hsr");
        let unknown = metric_selector("acwr_nonexistent");

        assert_eq!(known(&r), Some(1.4));
        assert_eq!(unknown(&r), None);
    }

    #[test]
    fn test_metric_keys_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(Metric::from_key(metric.key()), Some(metric));
            let json = serde_json::to_value(metric).unwrap();
            assert_eq!(json, json!(metric.key()));
        }
    }

    #[test]
    fn test_series_sorts_stably() {
        let a = record(3, json!({}), json!({"tag": "a"}));
        let b = record(1, json!({}), json!({"tag": "b"}));
        let c = record(3, json!({}), json!({"tag": "c"}));

        let series = Series::from_records(vec![a, b, c]);
        let tags: Vec<_> = series
            .iter()
            .map(|r| r.loads["tag"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(tags, vec!["b", "a", "c"]);
        assert_eq!(series.latest().unwrap().loads["tag"], json!("c"));
    }

    #[test]
    fn test_position_parsing() {
        assert_eq!("gk".parse::<Position>().unwrap(), Position::Goalkeeper);
        assert_eq!("FP".parse::<Position>().unwrap(), Position::FieldPlayer);
        assert!("striker".parse::<Position>().is_err());
        assert_eq!(Position::from_payload(Some(" gk ")), Position::Goalkeeper);
        assert_eq!(Position::from_payload(None), Position::FieldPlayer);
    }
}
