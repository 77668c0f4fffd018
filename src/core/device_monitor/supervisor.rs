//! Lifecycle owner for the aggregate, the reporter and the device workers.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::aggregate::{Aggregate, AggregateSnapshot};
use super::device::DeviceKind;
use super::reading::ParsePolicy;
use super::reporter::{ReportReceiver, Reporter, ReporterConfig};
use super::source::LineSource;
use super::worker::{start_worker, DeviceWorker, WorkerHandle, WorkerReport};
use crate::error::Result;

/// Runtime settings for one supervised run.
#[derive(Debug, Clone, Default)]
pub struct SupervisorConfig {
    pub thresholds: BTreeMap<DeviceKind, i64>,
    pub parse_policy: ParsePolicy,
    pub reporter: ReporterConfig,
}

impl SupervisorConfig {
    pub fn threshold(&self, device: DeviceKind) -> i64 {
        self.thresholds
            .get(&device)
            .copied()
            .unwrap_or_else(|| device.default_threshold())
    }
}

/// What `deinitialize` collected while tearing down.
#[derive(Debug, Clone)]
pub struct ShutdownSummary {
    pub report_cycles: u32,
    /// Contents of the aggregate at the moment it was destroyed.
    pub drained: AggregateSnapshot,
    /// One entry per started worker, in device order.
    pub workers: Vec<WorkerReport>,
}

pub struct Supervisor {
    aggregate: Arc<Aggregate>,
    reporter: Reporter,
    workers: Vec<WorkerHandle>,
    devices: Vec<DeviceKind>,
    failed: Vec<(DeviceKind, String)>,
}

impl Supervisor {
    /// Create the aggregate, start the reporter, then one worker per device.
    ///
    /// Fails only if the reporter cannot be started. A worker that fails to start is
    /// logged and recorded in [`Supervisor::failed_devices`]; the others still run.
    /// Repeated devices are started once.
    pub fn initialize(
        devices: &[DeviceKind],
        config: SupervisorConfig,
        source: Arc<dyn LineSource>,
    ) -> Result<Self> {
        let mut registered: Vec<DeviceKind> = Vec::with_capacity(devices.len());
        for device in devices {
            if registered.contains(device) {
                log::warn!("initialize(): {} listed more than once, ignoring duplicate", device);
                continue;
            }
            registered.push(*device);
        }

        let aggregate = Arc::new(Aggregate::new());
        let reporter = Reporter::start(
            Arc::clone(&aggregate),
            registered.clone(),
            config.reporter.clone(),
        )?;

        let mut workers = Vec::with_capacity(registered.len());
        let mut failed = Vec::new();

        for device in &registered {
            log::info!("Start initialization of {} device", device);

            let worker = DeviceWorker::new(
                *device,
                config.threshold(*device),
                config.parse_policy,
                Arc::clone(&source),
                Arc::clone(&aggregate),
            );

            match start_worker(worker) {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    log::error!("Failed to start {} worker: {}", device, e);
                    failed.push((*device, e.to_string()));
                }
            }
        }

        Ok(Self {
            aggregate,
            reporter,
            workers,
            devices: registered,
            failed,
        })
    }

    pub fn aggregate(&self) -> &Arc<Aggregate> {
        &self.aggregate
    }

    pub fn devices(&self) -> &[DeviceKind] {
        &self.devices
    }

    /// Devices whose worker could not be started, with the reason.
    pub fn failed_devices(&self) -> &[(DeviceKind, String)] {
        &self.failed
    }

    pub fn subscribe_reports(&self) -> ReportReceiver {
        self.reporter.subscribe()
    }

    /// True once every started worker has reached a terminal state.
    pub fn all_workers_finished(&self) -> bool {
        self.workers.iter().all(WorkerHandle::is_finished)
    }

    /// Stop the reporter, destroy the aggregate, then join the workers in device order.
    pub fn deinitialize(self) -> ShutdownSummary {
        let report_cycles = self.reporter.stop();

        let drained = self.aggregate.destroy().unwrap_or_else(|e| {
            log::warn!("deinitialize(): {}", e);
            AggregateSnapshot::default()
        });

        let workers = self
            .workers
            .into_iter()
            .map(|handle| {
                log::info!("Start deinitialization of {} device", handle.device());
                let report = handle.join();
                log::info!("{} device deinitialized", report.device);
                report
            })
            .collect();

        ShutdownSummary {
            report_cycles,
            drained,
            workers,
        }
    }
}
