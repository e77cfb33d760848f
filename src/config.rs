use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::axis::AxisConfig;
use crate::dashboard::{DashboardSettings, PanelSet};
use crate::error::ConfigError;
use crate::kpi::KpiThresholds;
use crate::logging::LogConfig;
use crate::window::WindowMode;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Default window for the detail view
    pub window: WindowMode,

    /// ACWR chart axis
    pub axis: AxisConfig,

    /// Decision metric panels per position
    pub panels: PanelSet,

    /// KPI card status thresholds
    pub kpi: KpiThresholds,

    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        ConfigMetadata {
            version: "1.0".to_string(),
            updated_at: Utc::now(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            metadata: ConfigMetadata::default(),
            window: WindowMode::default(),
            axis: AxisConfig::default(),
            panels: PanelSet::default(),
            kpi: KpiThresholds::default(),
            logging: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::FileNotFound { path: path.to_path_buf() })
                .with_context(|| format!("Failed to read config file: {}", path.display()));
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
            .with_context(|| "Failed to parse TOML configuration")?;

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".loadwatch")
            .join("config.toml")
    }

    /// Load configuration from the default path, or defaults when it is missing or invalid
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        if !config_path.exists() {
            return Self::default();
        }

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %config_path.display(), error = %format!("{:#}", e), "Using default configuration");
                Self::default()
            }
        }
    }

    /// Save to the default path
    pub fn save_default(&mut self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to_file(config_path)
    }

    /// Check gauge ranges and axis constants
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.axis.validate()?;

        for panel in self.panels.iter() {
            panel.gauge.validate(&panel.key)?;
        }

        if let WindowMode::CalendarDays(0) | WindowMode::LastN(0) = self.window {
            warn!(window = ?self.window, "Configured window is empty; every view will be blank");
        }

        Ok(())
    }

    /// Settings handed to the dashboard pipeline
    pub fn dashboard_settings(&self) -> DashboardSettings {
        DashboardSettings {
            window: self.window,
            axis: self.axis.clone(),
            panels: self.panels.clone(),
            kpi: self.kpi.clone(),
        }
    }
}
