//! Adaptive chart axis scaling.
//!
//! The value axis grows to fit outliers instead of clipping them, but never
//! shrinks below a floor, so a reference band (e.g. the ACWR safe zone of
//! 0.8 to 1.3) stays legible even on sparse data.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::models::{NormalizedRecord, Series};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Headroom added above the highest value before rounding up
const OUTLIER_MARGIN: f64 = 0.05;

/// Minimum gap kept above the hard floor when the axis expands
const FLOOR_SEPARATION: f64 = 0.1;

/// Axis scaling settings for one displayed metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    /// Reference ceiling; values above it expand the axis (2.0 for ACWR)
    pub configured_max: f64,

    /// The axis maximum never goes below this
    pub hard_floor: f64,

    /// Number of value ticks from 0 to the maximum
    pub y_tick_count: usize,

    /// Number of evenly spaced date ticks
    pub date_tick_count: usize,
}

impl Default for AxisConfig {
    fn default() -> Self {
        AxisConfig {
            configured_max: 2.0,
            hard_floor: 1.3,
            y_tick_count: 5,
            date_tick_count: 4,
        }
    }
}

impl AxisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("configured_max", self.configured_max),
            ("hard_floor", self.hard_floor),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidAxis {
                    parameter: name.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Scaled axis for a windowed series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisScale {
    /// Axis maximum; never below any plotted value
    pub max_value: f64,

    /// True when the highest value is above `configured_max`, or when
    /// `configured_max` is not finite and there is any value
    pub exceeded_max: bool,

    /// Highest finite value in the series
    pub highest: Option<f64>,

    pub y_ticks: Vec<f64>,

    pub date_ticks: Vec<NaiveDate>,
}

/// Axis scaling engine
pub struct AxisScaler {
    config: AxisConfig,
}

impl AxisScaler {
    /// Create new scaler with default (ACWR) configuration
    pub fn new() -> Self {
        AxisScaler {
            config: AxisConfig::default(),
        }
    }

    /// Create new scaler with custom configuration
    pub fn with_config(config: AxisConfig) -> Self {
        AxisScaler { config }
    }

    pub fn config(&self) -> &AxisConfig {
        &self.config
    }

    /// Scale the axis for the values `selector` picks out of `series`.
    ///
    /// Non-finite and missing values are ignored.
    pub fn scale<F>(&self, series: &Series, selector: F) -> AxisScale
    where
        F: Fn(&NormalizedRecord) -> Option<f64>,
    {
        let highest = series
            .iter()
            .filter_map(&selector)
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));

        let (max_value, exceeded_max) = self.max_value(highest);

        if exceeded_max {
            debug!(
                highest = ?highest,
                configured_max = self.config.configured_max,
                max_value,
                "Axis expanded to fit outlier"
            );
        }

        AxisScale {
            max_value,
            exceeded_max,
            highest,
            y_ticks: y_ticks(max_value, self.config.y_tick_count),
            date_ticks: series_date_ticks(series, self.config.date_tick_count),
        }
    }

    /// Axis maximum for the highest plotted value, and whether it exceeded the reference
    pub fn max_value(&self, highest: Option<f64>) -> (f64, bool) {
        let AxisConfig {
            configured_max,
            hard_floor,
            ..
        } = self.config;

        // A non-finite reference cannot bound anything, so any data expands the axis
        match highest {
            Some(h) if h > configured_max || !configured_max.is_finite() => {
                let adjusted = ((h + OUTLIER_MARGIN) * 10.0).ceil() / 10.0;
                (adjusted.max(hard_floor + FLOOR_SEPARATION), true)
            }
            _ => (configured_max.max(hard_floor), false),
        }
    }
}

impl Default for AxisScaler {
    fn default() -> Self {
        Self::new()
    }
}

/// Scale an axis with the default tick counts
pub fn scale_axis<F>(series: &Series, selector: F, configured_max: f64, hard_floor: f64) -> AxisScale
where
    F: Fn(&NormalizedRecord) -> Option<f64>,
{
    AxisScaler::with_config(AxisConfig {
        configured_max,
        hard_floor,
        ..AxisConfig::default()
    })
    .scale(series, selector)
}

/// `count` evenly spaced values from 0 to `max_value` inclusive
pub fn y_ticks(max_value: f64, count: usize) -> Vec<f64> {
    if count <= 1 {
        return vec![max_value];
    }
    let step = max_value / (count - 1) as f64;
    (0..count)
        .map(|i| if i == count - 1 { max_value } else { step * i as f64 })
        .collect()
}

/// Date ticks spanning the series; empty for an empty series
pub fn series_date_ticks(series: &Series, count: usize) -> Vec<NaiveDate> {
    let min = series.iter().map(|r| r.date_obj).min();
    let max = series.iter().map(|r| r.date_obj).max();
    match (min, max) {
        (Some(min), Some(max)) => date_ticks(min, max, count),
        _ => Vec::new(),
    }
}

/// Evenly spaced date ticks between two instants, rounded to whole days.
///
/// The calendar days of `min` and `max` are always included and bound every
/// other tick; the result is deduplicated and ascending. When `min >= max`
/// the result is `[min]`.
pub fn date_ticks(min: DateTime<Utc>, max: DateTime<Utc>, count: usize) -> Vec<NaiveDate> {
    let min_day = min.date_naive();
    let max_day = max.date_naive();

    if min >= max {
        return vec![min_day];
    }

    let start = min.timestamp_millis();
    let span = (max.timestamp_millis() - start) as f64;

    let mut ticks: Vec<NaiveDate> = Vec::with_capacity(count + 2);
    if count >= 2 {
        for i in 0..count {
            let t = start as f64 + span * i as f64 / (count - 1) as f64;
            if let Some(day) = round_to_day(t) {
                ticks.push(day.clamp(min_day, max_day));
            }
        }
    }
    ticks.push(min_day);
    ticks.push(max_day);

    ticks.sort();
    ticks.dedup();
    ticks
}

fn round_to_day(millis: f64) -> Option<NaiveDate> {
    let days = (millis / DAY_MS as f64).round() as i64;
    DateTime::from_timestamp_millis(days.checked_mul(DAY_MS)?).map(|dt| dt.date_naive())
}
