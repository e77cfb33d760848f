//! Chart-ready datasets built from a windowed series

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::axis::{AxisConfig, AxisScale, AxisScaler};
use crate::models::{Metric, NormalizedRecord, Position, Series};

/// Suggested axis headroom above a bar chart threshold
const THRESHOLD_HEADROOM: f64 = 1.3;

/// Condition metrics drawn as bars against a fixed threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    Monotony,
    Asymmetry,
}

impl ConditionKind {
    pub fn threshold(&self) -> f64 {
        match self {
            ConditionKind::Monotony => 2.0,
            ConditionKind::Asymmetry => 20.0,
        }
    }

    pub fn metric(&self) -> Metric {
        match self {
            ConditionKind::Monotony => Metric::MonotonyLoad,
            ConditionKind::Asymmetry => Metric::ValAsymmetry,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBar {
    pub day: NaiveDate,
    pub value: Option<f64>,
    /// Strictly above the threshold
    pub exceeded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBars {
    pub threshold: f64,
    pub suggested_max: f64,
    pub bars: Vec<ThresholdBar>,
}

/// One bar per record, flagged when the value is above `threshold`
pub fn threshold_bars<F>(series: &Series, selector: F, threshold: f64) -> ThresholdBars
where
    F: Fn(&NormalizedRecord) -> Option<f64>,
{
    let bars = series
        .iter()
        .map(|record| {
            let value = selector(record).filter(|v| v.is_finite());
            ThresholdBar {
                day: record.day(),
                value,
                exceeded: value.is_some_and(|v| v > threshold),
            }
        })
        .collect();

    ThresholdBars {
        threshold,
        suggested_max: threshold * THRESHOLD_HEADROOM,
        bars,
    }
}

pub fn condition_bars(series: &Series, kind: ConditionKind) -> ThresholdBars {
    let metric = kind.metric();
    threshold_bars(series, |r| metric.extract(r), kind.threshold())
}

/// A day flagged by the upstream anomaly detectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyMarker {
    pub day: NaiveDate,
    pub value: Option<f64>,
    pub dynamic: bool,
    pub r#static: bool,
}

/// Anomaly markers for a load metric; days without a flag are skipped
pub fn anomaly_markers(series: &Series, metric: Metric) -> Vec<AnomalyMarker> {
    series
        .iter()
        .filter_map(|record| {
            let dynamic = record
                .loads
                .get("dynamic")
                .and_then(|d| d.get("dyn_anomaly"))
                .is_some_and(flag);
            let r#static = record.loads.get("static_anomaly").is_some_and(flag);

            (dynamic || r#static).then(|| AnomalyMarker {
                day: record.day(),
                value: metric.extract(record),
                dynamic,
                r#static,
            })
        })
        .collect()
}

fn flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}

/// Combined daily load bars and ACWR line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub days: Vec<NaiveDate>,
    /// Daily player load; missing days plot as 0
    pub loads: Vec<f64>,
    pub acwr: Vec<Option<f64>>,
    pub acwr_axis: AxisScale,
}

/// ACWR line drawn for a position
pub fn position_acwr(position: Position) -> Metric {
    match position {
        Position::FieldPlayer => Metric::AcwrLoad,
        Position::Goalkeeper => Metric::AcwrDive,
    }
}

/// Timeline over the final `days` records of a window
pub fn timeline(series: &Series, position: Position, days: usize, axis: &AxisConfig) -> Timeline {
    let records = series.records();
    let start = records.len().saturating_sub(days);
    let slice = &records[start..];

    let acwr_metric = position_acwr(position);
    let tail = Series::from_sorted(slice.to_vec());
    let acwr_axis = AxisScaler::with_config(axis.clone()).scale(&tail, |r| acwr_metric.extract(r));

    Timeline {
        days: slice.iter().map(NormalizedRecord::day).collect(),
        loads: slice
            .iter()
            .map(|r| Metric::TotalPlayerLoad.extract(r).unwrap_or(0.0))
            .collect(),
        acwr: slice.iter().map(|r| acwr_metric.extract(r)).collect(),
        acwr_axis,
    }
}
