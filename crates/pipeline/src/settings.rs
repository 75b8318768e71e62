//! Pipeline settings

use alarm::AlarmConfig;
use config::{Config, ConfigError, Environment, File};
use monitor::MonitorConfig;
use serde::Deserialize;
use sos::SosConfig;

/// Externally supplied configuration for one vehicle installation
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Monitor thresholds and dwell times
    pub monitor: MonitorConfig,
    /// Alarm tone and volume
    pub alarm: AlarmConfig,
    /// SOS broker and vehicle identity
    pub sos: SosConfig,
    /// Emergency contact for the SOS escalation
    pub emergency_contact: String,
    /// Dispatch SOS over MQTT; logs only when false
    pub use_mqtt: bool,
}

impl Settings {
    /// Load from an optional config file plus `DRIVESAFE_` env overrides
    /// (e.g. `DRIVESAFE_EMERGENCY_CONTACT`, `DRIVESAFE_MONITOR__WARNING_DWELL_MS`)
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        builder
            .add_source(Environment::with_prefix("DRIVESAFE").separator("__"))
            .build()?
            .try_deserialize()
    }
}
