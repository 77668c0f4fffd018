use std::process::Command;
use tempfile::TempDir;

fn devmon() -> Command {
    Command::new(env!("CARGO_BIN_EXE_devmon"))
}

#[test]
fn test_version_command() {
    let output = devmon().arg("version").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_run_demo_once_prints_report_and_summary() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("devmon.json");
    std::fs::write(&config_path, r#"{"report_period_secs": 1}"#).unwrap();

    let output = devmon()
        .env("NO_COLOR", "1")
        .args(["run", "--demo", "--once", "--config"])
        .arg(&config_path)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("temperature: 6 reading(s) [21, 22, 24, 23, 27, 31]"),
        "{}",
        stdout
    );
    assert!(stdout.contains("humidity: 7 reading(s)"), "{}", stdout);
    assert!(stdout.contains("tripped at 104 (threshold 99)"), "{}", stdout);
}

#[test]
fn test_run_rejects_unknown_device() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("devmon.json");
    std::fs::write(&config_path, "{}").unwrap();

    let output = devmon()
        .args(["run", "--demo", "--once", "--devices", "pressure", "--config"])
        .arg(&config_path)
        .output()
        .unwrap();

    assert!(!output.status.success());
}

#[test]
fn test_run_rejects_oversized_period() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("devmon.json");
    std::fs::write(&config_path, "{}").unwrap();

    let output = devmon()
        .args(["run", "--demo", "--once", "--period", "18446744073709551615", "--config"])
        .arg(&config_path)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("report_period_secs"), "{}", stderr);
}

#[test]
fn test_run_with_missing_source_dir_still_shuts_down() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("devmon.json");
    std::fs::write(&config_path, r#"{"report_period_secs": 1}"#).unwrap();

    let output = devmon()
        .env("NO_COLOR", "1")
        .args(["run", "--once", "--config"])
        .arg(&config_path)
        .arg("--source-dir")
        .arg(temp_dir.path().join("missing"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("temperature: 0 reading(s) []"), "{}", stdout);
    assert!(stdout.contains("source unavailable"), "{}", stdout);
}
