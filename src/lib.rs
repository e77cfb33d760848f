// Library interface for LoadWatch modules
// The CLI, integration tests and benchmarks all go through these re-exports

pub mod athletes;
pub mod axis;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod gauge;
pub mod kpi;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod numeric;
pub mod risk;
pub mod window;

// Re-export commonly used types for convenience
pub use models::*;
pub use athletes::{group_by_tier, normalize_athletes, AthleteSummary, TierGroups};
pub use axis::{scale_axis, AxisConfig, AxisScale, AxisScaler};
pub use chart::{ConditionKind, ThresholdBars, Timeline};
pub use config::AppConfig;
pub use dashboard::{Dashboard, DashboardSettings, DashboardView, MetricPanel, PanelSet};
pub use error::{ConfigError, LoadWatchError, Result};
pub use gauge::{build_gauge, GaugeState, MetricSpec};
pub use kpi::{KpiCard, KpiStatus, KpiSummary, KpiThresholds};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use normalize::{normalize, parse_records};
pub use risk::{classify, classify_with_fallback, RiskAssessment, RiskFactor, RiskFlags, RiskTier};
pub use window::{window, WindowMode};
