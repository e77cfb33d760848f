//! Gauge geometry for KPI cards: value and threshold markers mapped onto [0, 1]

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::numeric::{clamp, finite};

/// Range and thresholds of one gauge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub min: f64,
    pub max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warn: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub danger: Option<f64>,
}

impl MetricSpec {
    pub fn new(min: f64, max: f64) -> Self {
        MetricSpec {
            min,
            max,
            warn: None,
            danger: None,
        }
    }

    pub fn with_warn(mut self, warn: f64) -> Self {
        self.warn = Some(warn);
        self
    }

    pub fn with_danger(mut self, danger: f64) -> Self {
        self.danger = Some(danger);
        self
    }

    /// Width of the range; an empty or inverted range counts as 1
    pub fn range(&self) -> f64 {
        let range = self.max - self.min;
        if range > 0.0 {
            range
        } else {
            1.0
        }
    }

    /// Map a raw value onto [0, 1]
    pub fn position_of(&self, raw: f64) -> f64 {
        clamp((raw - self.min) / self.range(), 0.0, 1.0)
    }

    /// Config-time check; `build_gauge` itself accepts any spec
    pub fn validate(&self, metric: &str) -> Result<(), ConfigError> {
        let fields = [
            ("min", Some(self.min)),
            ("max", Some(self.max)),
            ("warn", self.warn),
            ("danger", self.danger),
        ];
        for (field, value) in fields {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(ConfigError::NonFinite {
                    metric: metric.to_string(),
                    field: field.to_string(),
                });
            }
        }

        if self.max <= self.min {
            return Err(ConfigError::InvalidRange {
                metric: metric.to_string(),
                min: self.min,
                max: self.max,
            });
        }

        Ok(())
    }
}

/// Drawing positions for one gauge, recomputed on every render
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaugeState {
    /// Value that was plotted, `None` when absent (no indicator is drawn)
    pub value: Option<f64>,
    pub position: f64,
    pub warn_pos: Option<f64>,
    pub danger_pos: Option<f64>,
}

/// Build gauge geometry for a value.
///
/// A missing or non-finite value pins the gauge at the minimum.
pub fn build_gauge(spec: &MetricSpec, value: Option<f64>) -> GaugeState {
    let value = finite(value);
    let safe_value = clamp(value.unwrap_or(spec.min), spec.min, spec.max);

    GaugeState {
        value,
        position: spec.position_of(safe_value),
        warn_pos: spec.warn.map(|w| spec.position_of(w)),
        danger_pos: spec.danger.map(|d| spec.position_of(d)),
    }
}
