//! Shared storage of accepted readings, keyed by device.
//!
//! Every access goes through a single lock. The table lives from construction until
//! [`Aggregate::destroy`]; afterwards each operation is a logged no-op that returns
//! [`AggregateError::Unavailable`].

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

use super::device::DeviceKind;
use super::reading::Reading;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateError {
    #[error("aggregate is not available (not initialized or already destroyed)")]
    Unavailable,
}

type Table = BTreeMap<DeviceKind, Vec<Reading>>;

#[derive(Debug)]
pub struct Aggregate {
    table: Mutex<Option<Table>>,
}

/// Copy of the aggregate taken atomically under its lock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateSnapshot {
    pub devices: BTreeMap<DeviceKind, Vec<Reading>>,
}

impl AggregateSnapshot {
    pub fn count(&self, device: DeviceKind) -> usize {
        self.devices.get(&device).map_or(0, Vec::len)
    }

    pub fn values(&self, device: DeviceKind) -> Vec<i64> {
        self.devices
            .get(&device)
            .map(|readings| readings.iter().map(|r| r.value).collect())
            .unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.devices.values().map(Vec::len).sum()
    }
}

impl Aggregate {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(Some(Table::new())),
        }
    }

    /// Append `reading` to the sequence of `device`.
    pub fn append(&self, device: DeviceKind, reading: Reading) -> Result<(), AggregateError> {
        let mut guard = self.table.lock();
        let table = guard.as_mut().ok_or_else(|| {
            log::warn!("append({}): aggregate unavailable, reading dropped", device);
            AggregateError::Unavailable
        })?;

        table.entry(device).or_default().push(reading);
        Ok(())
    }

    pub fn snapshot(&self) -> Result<AggregateSnapshot, AggregateError> {
        let guard = self.table.lock();
        match guard.as_ref() {
            Some(table) => Ok(AggregateSnapshot {
                devices: table.clone(),
            }),
            None => {
                log::warn!("snapshot(): aggregate unavailable");
                Err(AggregateError::Unavailable)
            }
        }
    }

    /// Take every stored sequence out of the table, leaving the aggregate unavailable.
    ///
    /// Returns the released contents so the caller can summarize them.
    pub fn destroy(&self) -> Result<AggregateSnapshot, AggregateError> {
        let mut guard = self.table.lock();
        match guard.take() {
            Some(table) => {
                let released = AggregateSnapshot { devices: table };
                log::info!(
                    "Aggregate destroyed, {} reading(s) released",
                    released.total()
                );
                Ok(released)
            }
            None => {
                log::warn!("destroy(): aggregate already destroyed");
                Err(AggregateError::Unavailable)
            }
        }
    }

    pub fn is_live(&self) -> bool {
        self.table.lock().is_some()
    }

    pub fn len(&self, device: DeviceKind) -> usize {
        self.table
            .lock()
            .as_ref()
            .and_then(|table| table.get(&device))
            .map_or(0, Vec::len)
    }

    pub fn readings(&self, device: DeviceKind) -> Vec<Reading> {
        self.table
            .lock()
            .as_ref()
            .and_then(|table| table.get(&device).cloned())
            .unwrap_or_default()
    }
}

impl Default for Aggregate {
    fn default() -> Self {
        Self::new()
    }
}
