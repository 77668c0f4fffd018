//! Per-device ingestion worker.
//!
//! A worker opens its device's line source, parses every line, stops the device when a
//! reading goes above its threshold and appends everything else to the aggregate.
//!
//! ```text
//! Starting ─► Running ─► Exhausted | Tripped | ReadFailed | Aborted | Detached ─► Stopped
//!    └──────► SourceUnavailable ─────────────────────────────────────────────────► Stopped
//! ```

use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde::Serialize;

use super::aggregate::Aggregate;
use super::device::DeviceKind;
use super::reading::{parse_reading, ParsePolicy, Reading};
use super::source::LineSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkerState {
    Starting,
    Running,
    Exhausted,
    Tripped,
    SourceUnavailable,
    ReadFailed,
    Aborted,
    Detached,
    Panicked,
    Stopped,
}

/// Why a worker stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum WorkerOutcome {
    /// The source produced no more lines.
    Exhausted,
    /// A reading above the threshold was seen; it was not stored.
    Tripped { value: i64, threshold: i64 },
    /// The source could not be opened.
    SourceUnavailable(String),
    /// Reading from an open source failed.
    ReadFailed(String),
    /// A malformed line under [`ParsePolicy::Abort`].
    Aborted { line: String },
    /// The aggregate was destroyed while the worker was still running.
    Detached,
    /// The worker thread panicked.
    Panicked,
}

impl WorkerOutcome {
    /// Terminal state reached before `Stopped`.
    pub fn state(&self) -> WorkerState {
        match self {
            WorkerOutcome::Exhausted => WorkerState::Exhausted,
            WorkerOutcome::Tripped { .. } => WorkerState::Tripped,
            WorkerOutcome::SourceUnavailable(_) => WorkerState::SourceUnavailable,
            WorkerOutcome::ReadFailed(_) => WorkerState::ReadFailed,
            WorkerOutcome::Aborted { .. } => WorkerState::Aborted,
            WorkerOutcome::Detached => WorkerState::Detached,
            WorkerOutcome::Panicked => WorkerState::Panicked,
        }
    }
}

impl fmt::Display for WorkerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerOutcome::Exhausted => write!(f, "source exhausted"),
            WorkerOutcome::Tripped { value, threshold } => {
                write!(f, "tripped at {} (threshold {})", value, threshold)
            }
            WorkerOutcome::SourceUnavailable(e) => write!(f, "source unavailable: {}", e),
            WorkerOutcome::ReadFailed(e) => write!(f, "read failed: {}", e),
            WorkerOutcome::Aborted { line } => write!(f, "aborted on malformed line '{}'", line),
            WorkerOutcome::Detached => write!(f, "aggregate closed while running"),
            WorkerOutcome::Panicked => write!(f, "worker panicked"),
        }
    }
}

/// Result returned by a worker thread when it is joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    pub device: DeviceKind,
    pub outcome: WorkerOutcome,
    pub accepted: usize,
    pub parse_failures: usize,
}

/// Everything one device's worker needs, captured by value into its thread.
pub struct DeviceWorker {
    device: DeviceKind,
    threshold: i64,
    policy: ParsePolicy,
    source: Arc<dyn LineSource>,
    aggregate: Arc<Aggregate>,
    state: WorkerState,
}

impl DeviceWorker {
    pub fn new(
        device: DeviceKind,
        threshold: i64,
        policy: ParsePolicy,
        source: Arc<dyn LineSource>,
        aggregate: Arc<Aggregate>,
    ) -> Self {
        Self {
            device,
            threshold,
            policy,
            source,
            aggregate,
            state: WorkerState::Starting,
        }
    }

    pub fn device(&self) -> DeviceKind {
        self.device
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    fn transition(&mut self, next: WorkerState) {
        log::debug!("{} worker: {:?} -> {:?}", self.device, self.state, next);
        self.state = next;
    }

    /// Run the worker to completion on the current thread.
    pub fn run(mut self) -> WorkerReport {
        log::info!("Start monitoring {} device", self.device);

        let mut accepted = 0;
        let mut parse_failures = 0;
        let outcome = self.ingest(&mut accepted, &mut parse_failures);

        self.transition(outcome.state());
        self.transition(WorkerState::Stopped);

        log::info!(
            "{} worker stopped: {} ({} accepted, {} malformed)",
            self.device,
            outcome,
            accepted,
            parse_failures
        );

        WorkerReport {
            device: self.device,
            outcome,
            accepted,
            parse_failures,
        }
    }

    fn ingest(&mut self, accepted: &mut usize, parse_failures: &mut usize) -> WorkerOutcome {
        let lines = match self.source.open(self.device) {
            Ok(lines) => lines,
            Err(e) => {
                log::error!("{} worker: {}", self.device, e);
                return WorkerOutcome::SourceUnavailable(e.to_string());
            }
        };

        self.transition(WorkerState::Running);

        for line in lines {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::error!("{} worker: read failed: {}", self.device, e);
                    return WorkerOutcome::ReadFailed(e.to_string());
                }
            };

            let reading = match parse_reading(&line) {
                Ok(reading) => reading,
                Err(e) => {
                    *parse_failures += 1;
                    match self.policy {
                        ParsePolicy::Skip => {
                            log::warn!("{} worker: skipping line: {}", self.device, e);
                            continue;
                        }
                        ParsePolicy::Abort => {
                            log::error!("{} worker: aborting: {}", self.device, e);
                            return WorkerOutcome::Aborted {
                                line: line.trim().to_string(),
                            };
                        }
                        ParsePolicy::Zero => {
                            log::warn!("{} worker: {} (stored as 0)", self.device, e);
                            Reading::new(0, line.trim())
                        }
                    }
                }
            };

            if reading.value > self.threshold {
                log::warn!(
                    "!!! {} device is in danger !!! last received value is {} (threshold {})",
                    self.device,
                    reading.value,
                    self.threshold
                );
                return WorkerOutcome::Tripped {
                    value: reading.value,
                    threshold: self.threshold,
                };
            }

            let value = reading.value;
            if self.aggregate.append(self.device, reading).is_err() {
                return WorkerOutcome::Detached;
            }
            *accepted += 1;
            log::debug!("{} worker: registered {}", self.device, value);
        }

        WorkerOutcome::Exhausted
    }
}

/// A running worker, joined by the supervisor at shutdown.
#[derive(Debug)]
pub struct WorkerHandle {
    device: DeviceKind,
    handle: JoinHandle<WorkerReport>,
}

impl WorkerHandle {
    pub fn device(&self) -> DeviceKind {
        self.device
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker to stop.
    pub fn join(self) -> WorkerReport {
        let device = self.device;
        self.handle.join().unwrap_or_else(|_| {
            log::error!("{} worker panicked", device);
            WorkerReport {
                device,
                outcome: WorkerOutcome::Panicked,
                accepted: 0,
                parse_failures: 0,
            }
        })
    }
}

/// Spawn `worker` on its own named thread and hand back its handle.
pub fn start_worker(worker: DeviceWorker) -> io::Result<WorkerHandle> {
    let device = worker.device();
    let handle = thread::Builder::new()
        .name(format!("{}-worker", device))
        .spawn(move || worker.run())?;

    Ok(WorkerHandle { device, handle })
}
