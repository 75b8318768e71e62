//! Monitor configuration

use serde::{Deserialize, Serialize};

/// Thresholds driving the per-frame state evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Eye openness below this counts as closed
    pub eye_closed_threshold: f32,

    /// Head yaw magnitude above this counts as looking away (degrees)
    pub yaw_limit_deg: f32,

    /// Head pitch below this counts as looking down (degrees)
    pub pitch_floor_deg: f32,

    /// Sustained look-away before the distracted state fires (ms)
    pub distraction_dwell_ms: u64,

    /// Sustained eye closure before the drowsy warning fires (ms)
    pub warning_dwell_ms: u64,

    /// Sustained eye closure before the critical state and SOS fire (ms)
    pub critical_dwell_ms: u64,

    /// Blink-rate reporting window (ms)
    pub blink_window_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            eye_closed_threshold: 0.25,
            yaw_limit_deg: 25.0,
            pitch_floor_deg: -20.0,
            distraction_dwell_ms: 2000,
            warning_dwell_ms: 1000,
            critical_dwell_ms: 10_000,
            blink_window_ms: 60_000,
        }
    }
}

impl MonitorConfig {
    /// Strict preset (lower dwell times)
    pub fn strict() -> Self {
        Self {
            distraction_dwell_ms: 1500,
            warning_dwell_ms: 750,
            critical_dwell_ms: 6000,
            ..Default::default()
        }
    }

    /// Lenient preset (higher dwell times)
    pub fn lenient() -> Self {
        Self {
            distraction_dwell_ms: 3000,
            warning_dwell_ms: 1500,
            critical_dwell_ms: 15_000,
            ..Default::default()
        }
    }
}
