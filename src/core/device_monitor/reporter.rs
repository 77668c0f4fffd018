//! Periodic reporter.
//!
//! Runs as a task on its own small Tokio runtime. Each tick takes an atomic snapshot
//! of the aggregate, prints a summary and publishes it on a watch channel.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::{broadcast, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::aggregate::{Aggregate, AggregateSnapshot};
use super::device::DeviceKind;
use crate::error::{MonitorError, Result};

/// Latest published report, `None` until the first cycle completes.
pub type ReportReceiver = watch::Receiver<Option<Arc<Report>>>;

#[derive(Debug, Clone)]
pub struct ReporterConfig {
    pub period: Duration,
    /// Stop on its own after this many cycles. `None` runs until shutdown.
    pub max_cycles: Option<u32>,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(5),
            max_cycles: Some(20), // 100s run budget at 5s
        }
    }
}

/// Summary of the aggregate at one instant.
#[derive(Debug, Clone)]
pub struct Report {
    pub cycle: u32,
    pub generated_at: DateTime<Local>,
    /// Registered devices, listed even when they have no readings yet.
    pub devices: Vec<DeviceKind>,
    pub snapshot: AggregateSnapshot,
}

impl Report {
    pub fn new(cycle: u32, devices: &[DeviceKind], snapshot: AggregateSnapshot) -> Self {
        let mut devices = devices.to_vec();
        for device in snapshot.devices.keys() {
            if !devices.contains(device) {
                devices.push(*device);
            }
        }

        Self {
            cycle,
            generated_at: Local::now(),
            devices,
            snapshot,
        }
    }

    /// One line per device: `<device>: <count> reading(s) [v1, v2, ...]`.
    pub fn device_line(&self, device: DeviceKind) -> String {
        let values: Vec<String> = self
            .snapshot
            .values(device)
            .iter()
            .map(i64::to_string)
            .collect();

        format!(
            "{}: {} reading(s) [{}]",
            device,
            self.snapshot.count(device),
            values.join(", ")
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[devmon] report #{} at {}",
            self.cycle,
            self.generated_at.format("%H:%M:%S")
        )?;
        for device in &self.devices {
            writeln!(f, "  {}", self.device_line(*device))?;
        }
        Ok(())
    }
}

/// Handle to the running reporter task.
pub struct Reporter {
    shutdown_tx: broadcast::Sender<()>,
    report_rx: ReportReceiver,
    task: tokio::task::JoinHandle<u32>,
    runtime: tokio::runtime::Runtime,
}

impl Reporter {
    pub fn start(
        aggregate: Arc<Aggregate>,
        devices: Vec<DeviceKind>,
        config: ReporterConfig,
    ) -> Result<Self> {
        if config.period.is_zero() {
            return Err(MonitorError::config("report period must be greater than zero"));
        }
        // First report one full period after start.
        let first_tick = Instant::now().checked_add(config.period).ok_or_else(|| {
            MonitorError::config(format!(
                "report period of {}s is too large",
                config.period.as_secs()
            ))
        })?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_time()
            .thread_name("devmon-reporter")
            .build()
            .map_err(MonitorError::ReporterStart)?;

        let (report_tx, report_rx) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

        let task = runtime.spawn(reporter_task(
            aggregate,
            first_tick,
            devices,
            config,
            report_tx,
            shutdown_rx,
        ));

        log::info!("Reporter initialization succeeded");

        Ok(Self {
            shutdown_tx,
            report_rx,
            task,
            runtime,
        })
    }

    pub fn subscribe(&self) -> ReportReceiver {
        self.report_rx.clone()
    }

    /// Signal shutdown and wait for the task. Returns the number of completed cycles.
    pub fn stop(self) -> u32 {
        log::info!("Reporter deinitialization started");

        // Fails only when the task already ended on its cycle budget.
        let _ = self.shutdown_tx.send(());

        let cycles = self.runtime.block_on(self.task).unwrap_or_else(|e| {
            log::error!("Reporter task failed: {}", e);
            0
        });

        log::info!("Reporter deinitialization succeeded after {} cycle(s)", cycles);
        cycles
    }
}

async fn reporter_task(
    aggregate: Arc<Aggregate>,
    first_tick: Instant,
    devices: Vec<DeviceKind>,
    config: ReporterConfig,
    report_tx: watch::Sender<Option<Arc<Report>>>,
    mut shutdown: broadcast::Receiver<()>,
) -> u32 {
    let mut ticker = interval_at(first_tick, config.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut cycles = 0u32;

    loop {
        if config.max_cycles.is_some_and(|max| cycles >= max) {
            log::info!("Reporter run budget used up after {} cycle(s)", cycles);
            break;
        }

        tokio::select! {
            biased;

            _ = shutdown.recv() => {
                break;
            }
            _ = ticker.tick() => {
                cycles += 1;
                match aggregate.snapshot() {
                    Ok(snapshot) => {
                        let report = Report::new(cycles, &devices, snapshot);
                        print!("{}", report);
                        // No receivers left is fine.
                        let _ = report_tx.send(Some(Arc::new(report)));
                    }
                    Err(e) => {
                        log::warn!("Reporter cycle {} skipped: {}", cycles, e);
                    }
                }
            }
        }
    }

    cycles
}
