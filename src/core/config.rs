use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::device_monitor::{
    DeviceKind, ParsePolicy, ReporterConfig, SupervisorConfig,
};

/// Longest accepted report period (one day).
pub const MAX_REPORT_PERIOD_SECS: u64 = 24 * 60 * 60;

/// User-facing configuration, stored as JSON.
///
/// Every field is optional in the file; missing ones take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Devices to monitor, in start/join order.
    pub devices: Vec<DeviceKind>,
    /// Inclusive upper bound per device. Devices not listed use their built-in default.
    pub thresholds: BTreeMap<DeviceKind, i64>,
    pub report_period_secs: u64,
    /// Total reporting time; the reporter stops after `budget / period` cycles.
    /// `None` reports until shutdown.
    pub run_budget_secs: Option<u64>,
    /// Directory holding `<device>_device.txt` files
    pub source_dir: PathBuf,
    pub parse_policy: ParsePolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            devices: DeviceKind::ALL.to_vec(),
            thresholds: DeviceKind::ALL
                .iter()
                .map(|d| (*d, d.default_threshold()))
                .collect(),
            report_period_secs: 5,
            run_budget_secs: Some(100),
            source_dir: PathBuf::from("."),
            parse_policy: ParsePolicy::default(),
        }
    }
}

impl MonitorConfig {
    /// Load from the default location, falling back to defaults when the file is absent.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            log::debug!("No config at {:?}, using defaults", config_path);
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Self = if data.trim().is_empty() {
            Self::default()
        } else {
            serde_json::from_str(&data)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, data).with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("devmon").join("config.json"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.report_period_secs == 0 {
            anyhow::bail!("report_period_secs must be greater than zero");
        }
        if self.report_period_secs > MAX_REPORT_PERIOD_SECS {
            anyhow::bail!(
                "report_period_secs must be at most {} (got {})",
                MAX_REPORT_PERIOD_SECS,
                self.report_period_secs
            );
        }
        if self.devices.is_empty() {
            anyhow::bail!("at least one device must be configured");
        }
        Ok(())
    }

    pub fn threshold(&self, device: DeviceKind) -> i64 {
        self.thresholds
            .get(&device)
            .copied()
            .unwrap_or_else(|| device.default_threshold())
    }

    pub fn reporter_config(&self) -> ReporterConfig {
        let period = self.report_period_secs.max(1);
        ReporterConfig {
            period: Duration::from_secs(period),
            max_cycles: self
                .run_budget_secs
                .map(|budget| (budget / period).clamp(1, u32::MAX as u64) as u32),
        }
    }

    /// Runtime settings handed to the supervisor.
    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            thresholds: self
                .devices
                .iter()
                .map(|d| (*d, self.threshold(*d)))
                .collect(),
            parse_policy: self.parse_policy,
            reporter: self.reporter_config(),
        }
    }
}
