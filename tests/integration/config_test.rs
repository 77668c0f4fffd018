use devmon::core::device_monitor::{DeviceKind, ParsePolicy};
use devmon::MonitorConfig;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_config_default() {
    let config = MonitorConfig::default();
    assert_eq!(config.devices, DeviceKind::ALL.to_vec());
    assert_eq!(config.parse_policy, ParsePolicy::Skip);
    assert_eq!(config.run_budget_secs, Some(100));
}

#[test]
fn test_supervisor_config_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("devmon.json");
    std::fs::write(
        &path,
        r#"{
            "devices": ["humidity"],
            "thresholds": {"humidity": 80},
            "report_period_secs": 2,
            "run_budget_secs": 10
        }"#,
    )
    .unwrap();

    let config = MonitorConfig::load_from(&path).unwrap();
    let supervisor_config = config.supervisor_config();

    assert_eq!(supervisor_config.threshold(DeviceKind::Humidity), 80);
    assert_eq!(supervisor_config.threshold(DeviceKind::Temperature), 99);
    assert_eq!(supervisor_config.reporter.period, Duration::from_secs(2));
    assert_eq!(supervisor_config.reporter.max_cycles, Some(5));
}

#[test]
fn test_unknown_device_in_file_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("devmon.json");
    std::fs::write(&path, r#"{"devices": ["pressure"]}"#).unwrap();

    assert!(MonitorConfig::load_from(&path).is_err());
}

#[test]
fn test_empty_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("devmon.json");
    std::fs::write(&path, "").unwrap();

    assert_eq!(MonitorConfig::load_from(&path).unwrap(), MonitorConfig::default());
}
