//! Headline KPI cards for the latest day

use serde::{Deserialize, Serialize};

use crate::models::{Metric, NormalizedRecord, Position};
use crate::numeric::format_number;

/// Colour status of a KPI card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiStatus {
    Neutral,
    Good,
    Warning,
    Danger,
}

/// Status thresholds for KPI cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiThresholds {
    /// ACWR above this is danger
    pub acwr_danger: f64,
    /// ACWR below this is a warning (undertraining)
    pub acwr_low: f64,
    /// Monotony above this is danger
    pub monotony_danger: f64,
    /// Asymmetry (%) above this is a warning
    pub asymmetry_warning: f64,
}

impl Default for KpiThresholds {
    fn default() -> Self {
        KpiThresholds {
            acwr_danger: 1.5,
            acwr_low: 0.8,
            monotony_danger: 2.0,
            asymmetry_warning: 15.0,
        }
    }
}

impl KpiThresholds {
    /// Status of an ACWR value; absent or zero is neutral
    pub fn acwr_status(&self, value: Option<f64>) -> KpiStatus {
        match value {
            None => KpiStatus::Neutral,
            Some(v) if v == 0.0 => KpiStatus::Neutral,
            Some(v) if v > self.acwr_danger => KpiStatus::Danger,
            Some(v) if v < self.acwr_low => KpiStatus::Warning,
            Some(_) => KpiStatus::Good,
        }
    }

    pub fn monotony_status(&self, value: Option<f64>) -> KpiStatus {
        match value {
            Some(v) if v > self.monotony_danger => KpiStatus::Danger,
            _ => KpiStatus::Good,
        }
    }

    pub fn asymmetry_status(&self, value: Option<f64>) -> KpiStatus {
        match value {
            Some(v) if v > self.asymmetry_warning => KpiStatus::Warning,
            _ => KpiStatus::Good,
        }
    }
}

/// Latest-day headline values, position dependent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub date: String,
    pub position: Position,
    /// Distance (FP) or dive load (GK)
    pub main_load: Option<f64>,
    /// HSR distance (FP) or jumps (GK)
    pub sub_load: Option<f64>,
    pub acwr_main: Option<f64>,
    pub acwr_sub: Option<f64>,
    pub monotony: Option<f64>,
    pub asymmetry: Option<f64>,
}

/// One rendered card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiCard {
    pub title: String,
    pub value: String,
    pub unit: Option<String>,
    pub status: Option<KpiStatus>,
}

impl KpiSummary {
    /// Summarize the latest record; `None` when there is no record
    pub fn from_latest(latest: Option<&NormalizedRecord>, position: Position) -> Option<Self> {
        let record = latest?;
        let (main, sub, acwr_main, acwr_sub) = match position {
            Position::FieldPlayer => (
                Metric::TotalDistance,
                Metric::HsrDistance,
                Metric::AcwrTotalDistance,
                Metric::AcwrHsr,
            ),
            Position::Goalkeeper => (
                Metric::TotalDiveLoad,
                Metric::TotalJumps,
                Metric::AcwrDive,
                Metric::AcwrJump,
            ),
        };

        Some(KpiSummary {
            date: record.date.clone(),
            position,
            main_load: record.metric(main),
            sub_load: record.metric(sub),
            acwr_main: record.metric(acwr_main),
            acwr_sub: record.metric(acwr_sub),
            monotony: record.metric(Metric::MonotonyLoad),
            asymmetry: record.metric(Metric::ValAsymmetry),
        })
    }

    pub fn cards(&self, thresholds: &KpiThresholds) -> Vec<KpiCard> {
        let is_gk = self.position == Position::Goalkeeper;

        let asymmetry = match self.asymmetry {
            Some(_) => format_number(self.asymmetry, 1),
            None => "0".to_string(),
        };

        vec![
            KpiCard {
                title: if is_gk { "Daily Dive Load" } else { "Daily Distance" }.to_string(),
                value: format_number(self.main_load, 0),
                unit: Some(if is_gk { "au" } else { "m" }.to_string()),
                status: None,
            },
            KpiCard {
                title: if is_gk { "ACWR (Dive)" } else { "ACWR (Dist)" }.to_string(),
                value: format_number(self.acwr_main, 2),
                unit: None,
                status: Some(thresholds.acwr_status(self.acwr_main)),
            },
            KpiCard {
                title: "Monotony".to_string(),
                value: format_number(self.monotony, 2),
                unit: None,
                status: Some(thresholds.monotony_status(self.monotony)),
            },
            KpiCard {
                title: "Asymmetry".to_string(),
                value: format!("{}%", asymmetry),
                unit: None,
                status: Some(thresholds.asymmetry_status(self.asymmetry)),
            },
        ]
    }
}
