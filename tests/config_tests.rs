use loadwatch::{AppConfig, Dashboard, LogLevel, Metric, MetricSpec, Position, WindowMode};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_file_drives_dashboard() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let mut config = AppConfig::default();
    config.window = WindowMode::LastN(2);
    config.axis.configured_max = 1.0;
    config.panels.field_player[0].gauge = MetricSpec::new(0.0, 2.0).with_warn(1.0);
    config.logging.level = LogLevel::Debug;
    config.save_to_file(&config_path).unwrap();

    let loaded = AppConfig::load_from_file(&config_path).unwrap();
    assert_eq!(loaded.logging.level, LogLevel::Debug);

    let records = loadwatch::parse_records(
        r#"[
            {"date": "2024-04-01", "workload": {"acwr_hsr": 0.5, "acwr_load": 0.7}},
            {"date": "2024-04-02", "workload": {"acwr_hsr": 1.0, "acwr_load": 1.2}},
            {"date": "2024-04-03", "workload": {"acwr_hsr": 1.5, "acwr_load": 0.9}}
        ]"#,
    )
    .unwrap();

    let view = Dashboard::with_settings(loaded.dashboard_settings()).build(&records, Position::FieldPlayer, None);

    assert_eq!(view.windowed, 2);
    assert!(view.acwr_axis.exceeded_max);
    assert!((view.acwr_axis.max_value - 1.4).abs() < 1e-9);

    let hsr = &view.panels[0];
    assert_eq!(hsr.key, "acwr_hsr");
    assert!((hsr.gauge.position - 0.75).abs() < 1e-9);
    assert_eq!(hsr.gauge.warn_pos, Some(0.5));
}

#[test]
fn test_hand_written_panels() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    fs::write(
        &config_path,
        r#"
window = { calendar_days = 14 }

[[panels.field_player]]
key = "distance_acwr"
label = "Distance ACWR"
metric = "acwr_total_distance"
threshold = ">= 1.5 : Caution"
factor = "distance_acwr"

[panels.field_player.gauge]
min = 0.0
max = 2.5
warn = 1.5

[[panels.goalkeeper]]
key = "jumps"
label = "Jump ACWR"
metric = "acwr_jump"
threshold = ""
digits = 1

[panels.goalkeeper.gauge]
min = 0.0
max = 2.0
"#,
    )
    .unwrap();

    let config = AppConfig::load_from_file(&config_path).unwrap();
    assert_eq!(config.window, WindowMode::CalendarDays(14));
    assert_eq!(config.panels.field_player.len(), 1);
    assert_eq!(config.panels.field_player[0].metric, Metric::AcwrTotalDistance);
    assert_eq!(config.panels.field_player[0].digits, 2);
    assert_eq!(config.panels.goalkeeper[0].digits, 1);
    assert_eq!(config.panels.goalkeeper[0].factor, None);
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    fs::write(
        &config_path,
        "[axis]\nconfigured_max = nan\nhard_floor = 1.3\ny_tick_count = 5\ndate_tick_count = 4\n",
    )
    .unwrap();
    let err = AppConfig::load_from_file(&config_path).unwrap_err();
    assert!(format!("{:#}", err).contains("configured_max"));

    fs::write(&config_path, "window = [").unwrap();
    let err = AppConfig::load_from_file(&config_path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse TOML"));
}

#[test]
fn test_default_config_path() {
    let path = AppConfig::default_config_path();
    assert!(path.ends_with(".loadwatch/config.toml"));
}
