//! Device identities and their per-device defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default inclusive upper bound for temperature readings (degrees).
pub const MAX_TEMPERATURE: i64 = 99;

/// Default inclusive upper bound for humidity readings.
pub const MAX_HUMIDITY: i64 = 500;

/// A monitored device. The set is closed; every device has its own worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Temperature,
    Humidity,
}

impl DeviceKind {
    /// All known devices, in reporting order.
    pub const ALL: [DeviceKind; 2] = [DeviceKind::Temperature, DeviceKind::Humidity];

    pub fn name(self) -> &'static str {
        match self {
            DeviceKind::Temperature => "temperature",
            DeviceKind::Humidity => "humidity",
        }
    }

    /// Threshold used when the configuration does not name one.
    pub fn default_threshold(self) -> i64 {
        match self {
            DeviceKind::Temperature => MAX_TEMPERATURE,
            DeviceKind::Humidity => MAX_HUMIDITY,
        }
    }

    /// File name a [`FileSource`](super::FileSource) looks for inside its directory.
    pub fn default_source_file(self) -> &'static str {
        match self {
            DeviceKind::Temperature => "temperature_device.txt",
            DeviceKind::Humidity => "humidity_device.txt",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "temperature" | "temp" => Ok(DeviceKind::Temperature),
            "humidity" | "hum" => Ok(DeviceKind::Humidity),
            other => Err(format!("unknown device '{}'", other)),
        }
    }
}
