// End-to-end ingestion scenarios driven through the supervisor

use devmon::core::device_monitor::{
    DeviceKind, FileSource, MemorySource, Report, ReportReceiver, ReporterConfig, Supervisor,
    SupervisorConfig, WorkerOutcome, WorkerState,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn fast_config() -> SupervisorConfig {
    SupervisorConfig {
        reporter: ReporterConfig {
            period: Duration::from_millis(25),
            max_cycles: None,
        },
        ..Default::default()
    }
}

fn wait_until_finished(supervisor: &Supervisor) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !supervisor.all_workers_finished() {
        assert!(Instant::now() < deadline, "workers did not finish in time");
        thread::sleep(Duration::from_millis(5));
    }
}

/// Wait for a report produced strictly after `after_cycle`.
fn next_report_after(rx: &mut ReportReceiver, after_cycle: u32) -> Arc<Report> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(report) = rx.borrow_and_update().clone() {
            if report.cycle > after_cycle {
                return report;
            }
        }
        assert!(Instant::now() < deadline, "no report published in time");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_temperature_trip_keeps_earlier_readings() {
    let source =
        MemorySource::new().with_lines(DeviceKind::Temperature, ["20", "55", "101", "30"]);
    let supervisor =
        Supervisor::initialize(&[DeviceKind::Temperature], fast_config(), Arc::new(source))
            .unwrap();
    wait_until_finished(&supervisor);

    assert_eq!(
        supervisor.aggregate().snapshot().unwrap().values(DeviceKind::Temperature),
        vec![20, 55]
    );

    let summary = supervisor.deinitialize();
    assert_eq!(
        summary.workers[0].outcome,
        WorkerOutcome::Tripped {
            value: 101,
            threshold: 99
        }
    );
    assert_eq!(summary.workers[0].accepted, 2);
}

#[test]
fn test_humidity_trip() {
    let source = MemorySource::new().with_lines(DeviceKind::Humidity, ["40", "600"]);
    let supervisor =
        Supervisor::initialize(&[DeviceKind::Humidity], fast_config(), Arc::new(source)).unwrap();
    wait_until_finished(&supervisor);

    let summary = supervisor.deinitialize();
    assert_eq!(summary.drained.values(DeviceKind::Humidity), vec![40]);
    assert_eq!(summary.workers[0].outcome.state(), WorkerState::Tripped);
}

#[test]
fn test_missing_temperature_file_does_not_affect_humidity() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("humidity_device.txt"), "40\n41\n42\n").unwrap();

    let supervisor = Supervisor::initialize(
        &DeviceKind::ALL,
        fast_config(),
        Arc::new(FileSource::new(dir.path())),
    )
    .unwrap();
    wait_until_finished(&supervisor);

    let summary = supervisor.deinitialize();
    let temperature = &summary.workers[0];
    let humidity = &summary.workers[1];

    assert_eq!(temperature.device, DeviceKind::Temperature);
    assert_eq!(temperature.outcome.state(), WorkerState::SourceUnavailable);
    assert_eq!(temperature.accepted, 0);

    assert_eq!(humidity.outcome, WorkerOutcome::Exhausted);
    assert_eq!(summary.drained.values(DeviceKind::Humidity), vec![40, 41, 42]);
    assert_eq!(summary.drained.count(DeviceKind::Temperature), 0);
}

#[test]
fn test_report_after_exhaustion_lists_all_values() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("temperature_device.txt"), "20\n21\n22\n").unwrap();
    std::fs::write(dir.path().join("humidity_device.txt"), "40\n45\n").unwrap();

    let supervisor = Supervisor::initialize(
        &DeviceKind::ALL,
        fast_config(),
        Arc::new(FileSource::new(dir.path())),
    )
    .unwrap();
    let mut reports = supervisor.subscribe_reports();
    wait_until_finished(&supervisor);

    // The cycle after the current one is guaranteed to snapshot after the workers ended.
    let seen = reports.borrow_and_update().as_ref().map_or(0, |r| r.cycle);
    let report = next_report_after(&mut reports, seen + 1);
    let text = report.to_string();

    assert!(text.contains("temperature: 3 reading(s) [20, 21, 22]"), "{}", text);
    assert!(text.contains("humidity: 2 reading(s) [40, 45]"), "{}", text);

    let summary = supervisor.deinitialize();
    assert!(summary.report_cycles >= 1);
    assert!(summary
        .workers
        .iter()
        .all(|w| w.outcome == WorkerOutcome::Exhausted));
}

#[test]
fn test_no_reading_after_trip_across_long_stream() {
    let mut lines: Vec<String> = (0..1000).map(|v| (v % 90).to_string()).collect();
    lines.insert(600, "250".to_string());

    let source = MemorySource::new()
        .with_lines(DeviceKind::Temperature, lines)
        .with_lines(DeviceKind::Humidity, (0..1000).map(|v| v.to_string()));

    let supervisor =
        Supervisor::initialize(&DeviceKind::ALL, fast_config(), Arc::new(source)).unwrap();
    wait_until_finished(&supervisor);
    let summary = supervisor.deinitialize();

    let temperature = summary.drained.values(DeviceKind::Temperature);
    assert_eq!(temperature.len(), 600);
    assert_eq!(temperature, (0..600).map(|v| v % 90).collect::<Vec<i64>>());

    // Humidity trips at 501, keeping 0..=500 in order.
    assert_eq!(
        summary.drained.values(DeviceKind::Humidity),
        (0..=500).collect::<Vec<i64>>()
    );
}
