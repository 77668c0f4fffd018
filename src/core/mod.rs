// Core business logic module

pub mod config;
pub mod device_monitor;

// Re-export commonly used items
pub use config::MonitorConfig;
pub use device_monitor::{DeviceKind, Supervisor, SupervisorConfig};
