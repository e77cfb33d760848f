//! Dashboard pipeline: normalize, sort, window, classify, scale and build gauges.
//!
//! Every derived value in a [`DashboardView`] is computed from the same
//! windowed series, so the latest record, the axis and the panels can never
//! disagree about which slice is on screen.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::axis::{AxisConfig, AxisScale, AxisScaler};
use crate::chart::{
    anomaly_markers, condition_bars, position_acwr, timeline, AnomalyMarker, ConditionKind,
    ThresholdBars, Timeline,
};
use crate::gauge::{build_gauge, GaugeState, MetricSpec};
use crate::kpi::{KpiCard, KpiSummary, KpiThresholds};
use crate::models::{Metric, Position, RawRecord, Series};
use crate::normalize::normalize;
use crate::numeric::format_metric_value;
use crate::risk::{classify_with_fallback, RiskAssessment, RiskFactor, RiskFlags};
use crate::window::{window, WindowMode};

/// Records shown in the combined load/ACWR timeline
pub const TIMELINE_DAYS: usize = 45;

/// One decision metric card: what to read, how to draw it, when to highlight it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPanel {
    pub key: String,
    pub label: String,
    pub metric: Metric,
    pub gauge: MetricSpec,
    /// Human-readable threshold legend
    pub threshold: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<RiskFactor>,
    #[serde(default = "default_digits")]
    pub digits: usize,
}

fn default_digits() -> usize {
    2
}

impl MetricPanel {
    pub fn new(key: &str, label: &str, metric: Metric, gauge: MetricSpec, threshold: &str) -> Self {
        MetricPanel {
            key: key.to_string(),
            label: label.to_string(),
            metric,
            gauge,
            threshold: threshold.to_string(),
            unit: None,
            note: None,
            factor: None,
            digits: default_digits(),
        }
    }

    pub fn with_factor(mut self, factor: RiskFactor) -> Self {
        self.factor = Some(factor);
        self
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }
}

/// Decision panels per position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSet {
    pub field_player: Vec<MetricPanel>,
    pub goalkeeper: Vec<MetricPanel>,
}

impl PanelSet {
    pub fn for_position(&self, position: Position) -> &[MetricPanel] {
        match position {
            Position::FieldPlayer => &self.field_player,
            Position::Goalkeeper => &self.goalkeeper,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricPanel> {
        self.field_player.iter().chain(self.goalkeeper.iter())
    }
}

impl Default for PanelSet {
    fn default() -> Self {
        let monotony = MetricPanel::new(
            "monotony",
            "Monotony",
            Metric::MonotonyLoad,
            MetricSpec::new(0.0, 4.0).with_warn(2.5),
            ">= 2.5 : Caution",
        )
        .with_factor(RiskFactor::HighMonotony);

        PanelSet {
            field_player: vec![
                MetricPanel::new(
                    "acwr_hsr",
                    "HSR ACWR",
                    Metric::AcwrHsr,
                    MetricSpec::new(0.0, 2.5).with_warn(1.3).with_danger(1.5),
                    ">= 1.3 : Caution / >= 1.5 : Risky",
                )
                .with_factor(RiskFactor::HsrAcwr),
                MetricPanel::new(
                    "acwr_load",
                    "Load ACWR",
                    Metric::AcwrLoad,
                    MetricSpec::new(0.0, 2.5).with_warn(1.5),
                    ">= 1.5 : Caution",
                )
                .with_factor(RiskFactor::DistanceAcwr),
                monotony.clone(),
                MetricPanel::new(
                    "efficiency",
                    "Efficiency",
                    Metric::EfficiencyIndex,
                    MetricSpec::new(0.0, 1.2).with_warn(0.5),
                    "<= 0.5 : Caution",
                )
                .with_factor(RiskFactor::LowEfficiency)
                .with_note("lower is riskier"),
            ],
            goalkeeper: vec![
                MetricPanel::new(
                    "acwr_dive",
                    "Dive ACWR",
                    Metric::AcwrDive,
                    MetricSpec::new(0.0, 2.5).with_danger(1.5),
                    ">= 1.5 : Risky",
                )
                .with_factor(RiskFactor::DiveAcwr),
                MetricPanel::new(
                    "time_to_feet",
                    "Time to Feet",
                    Metric::TimeToFeet,
                    MetricSpec::new(0.0, 3.0).with_warn(1.5).with_danger(2.0),
                    ">= 1.5 : Caution / >= 2.0 : Risky",
                )
                .with_factor(RiskFactor::RecoveryTime)
                .with_unit("s"),
                MetricPanel::new(
                    "asymmetry",
                    "Asymmetry",
                    Metric::ValAsymmetry,
                    MetricSpec::new(0.0, 1.0).with_warn(0.4),
                    ">= 0.4 : Caution",
                )
                .with_factor(RiskFactor::HighAsymmetry),
                monotony,
            ],
        }
    }
}

/// Settings for one dashboard render
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSettings {
    pub window: WindowMode,
    pub axis: AxisConfig,
    pub panels: PanelSet,
    pub kpi: KpiThresholds,
}

/// A decision panel filled in from the latest record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelView {
    pub key: String,
    pub label: String,
    pub value: Option<f64>,
    pub formatted: String,
    pub threshold: String,
    pub note: Option<String>,
    pub highlight: bool,
    pub gauge: GaugeState,
}

/// Everything a dashboard screen draws for one athlete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub position: Position,
    pub window: WindowMode,
    /// Records received / kept by normalization / inside the window
    pub received: usize,
    pub normalized: usize,
    pub windowed: usize,
    pub latest_date: Option<NaiveDate>,
    pub risk: RiskAssessment,
    pub flags: RiskFlags,
    pub acwr_axis: AxisScale,
    pub panels: Vec<PanelView>,
    pub kpi: Option<KpiSummary>,
    pub kpi_cards: Vec<KpiCard>,
    pub monotony: ThresholdBars,
    pub asymmetry: ThresholdBars,
    pub anomalies: Vec<AnomalyMarker>,
    pub timeline: Timeline,
}

/// Dashboard builder
pub struct Dashboard {
    settings: DashboardSettings,
}

impl Dashboard {
    /// Create new dashboard with default settings
    pub fn new() -> Self {
        Dashboard {
            settings: DashboardSettings::default(),
        }
    }

    /// Create new dashboard with custom settings
    pub fn with_settings(settings: DashboardSettings) -> Self {
        Dashboard { settings }
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    /// Build the view with the configured window
    pub fn build(
        &self,
        raw: &[RawRecord],
        position: Position,
        athlete_level: Option<&str>,
    ) -> DashboardView {
        self.build_with_window(raw, position, athlete_level, self.settings.window)
    }

    pub fn build_with_window(
        &self,
        raw: &[RawRecord],
        position: Position,
        athlete_level: Option<&str>,
        mode: WindowMode,
    ) -> DashboardView {
        let normalized = normalize(raw);
        let normalized_len = normalized.len();
        let series = Series::from_records(normalized);
        let view = window(&series, mode);
        let latest = view.latest();

        let risk = classify_with_fallback(latest, athlete_level);
        let flags = risk.flags();

        let acwr_metric = position_acwr(position);
        let acwr_axis = AxisScaler::with_config(self.settings.axis.clone())
            .scale(&view, |r| acwr_metric.extract(r));

        let panels = self
            .settings
            .panels
            .for_position(position)
            .iter()
            .map(|panel| {
                let value = latest.and_then(|r| panel.metric.extract(r));
                PanelView {
                    key: panel.key.clone(),
                    label: panel.label.clone(),
                    value,
                    formatted: format_metric_value(value, panel.digits, panel.unit.as_deref()),
                    threshold: panel.threshold.clone(),
                    note: panel.note.clone(),
                    highlight: panel.factor.is_some_and(|f| flags.is_flagged(f)),
                    gauge: build_gauge(&panel.gauge, value),
                }
            })
            .collect();

        let kpi = KpiSummary::from_latest(latest, position);
        let kpi_cards = kpi
            .as_ref()
            .map(|k| k.cards(&self.settings.kpi))
            .unwrap_or_default();

        info!(
            received = raw.len(),
            normalized = normalized_len,
            windowed = view.len(),
            tier = %risk.tier,
            position = %position,
            "Dashboard built"
        );
        if !flags.unmatched.is_empty() {
            debug!(unmatched = ?flags.unmatched, "Risk reasons outside the highlight vocabulary");
        }

        DashboardView {
            position,
            window: mode,
            received: raw.len(),
            normalized: normalized_len,
            windowed: view.len(),
            latest_date: latest.map(|r| r.day()),
            panels,
            kpi,
            kpi_cards,
            monotony: condition_bars(&view, ConditionKind::Monotony),
            asymmetry: condition_bars(&view, ConditionKind::Asymmetry),
            anomalies: anomaly_markers(&view, Metric::TotalPlayerLoad),
            timeline: timeline(&view, position, TIMELINE_DAYS, &self.settings.axis),
            acwr_axis,
            risk,
            flags,
        }
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}
