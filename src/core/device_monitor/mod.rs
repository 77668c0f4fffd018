//! Device monitoring core.
//!
//! One worker thread per device ingests that device's line source into a shared,
//! lock-protected aggregate. A reporter task summarizes the aggregate on a fixed
//! period. The [`Supervisor`] owns all of it between `initialize` and `deinitialize`.

mod aggregate;
mod device;
mod reading;
mod reporter;
mod source;
mod supervisor;
mod worker;

pub use aggregate::{Aggregate, AggregateError, AggregateSnapshot};
pub use device::{DeviceKind, MAX_HUMIDITY, MAX_TEMPERATURE};
pub use reading::{parse_reading, ParseError, ParsePolicy, Reading};
pub use reporter::{Report, ReportReceiver, Reporter, ReporterConfig};
pub use source::{FileSource, LineSource, Lines, MemorySource, SourceError};
pub use supervisor::{ShutdownSummary, Supervisor, SupervisorConfig};
pub use worker::{
    start_worker, DeviceWorker, WorkerHandle, WorkerOutcome, WorkerReport, WorkerState,
};
