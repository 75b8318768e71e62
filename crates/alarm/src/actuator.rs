//! Alarm actuator implementations

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Selectable alarm tone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlarmTone {
    #[default]
    Tone1,
    Tone2,
    Tone3,
    Tone4,
}

/// Alarm playback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfig {
    pub tone: AlarmTone,
    /// Playback volume [0, 1]
    pub volume: f32,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            tone: AlarmTone::default(),
            volume: 1.0,
        }
    }
}

/// Alarm playback actuator.
///
/// Implementations must no-op on redundant calls: the monitor only commands
/// transitions, but the actuator is the last line of defense against
/// restarting an already-playing alarm.
pub trait AlarmActuator: Send {
    fn set_active(&mut self, active: bool);

    fn is_active(&self) -> bool;
}

/// Software alarm backed by the host audio service.
///
/// Tracks commanded state and logs transitions; the actual playback call
/// lives behind the host's audio sink.
pub struct SoftwareAlarm {
    config: AlarmConfig,
    active: bool,
}

impl SoftwareAlarm {
    pub fn new(config: AlarmConfig) -> Self {
        Self {
            config: AlarmConfig {
                volume: config.volume.clamp(0.0, 1.0),
                ..config
            },
            active: false,
        }
    }

    pub fn config(&self) -> &AlarmConfig {
        &self.config
    }
}

impl AlarmActuator for SoftwareAlarm {
    fn set_active(&mut self, active: bool) {
        if self.active == active {
            debug!(active, "redundant alarm command ignored");
            return;
        }
        self.active = active;
        if active {
            info!(tone = ?self.config.tone, volume = self.config.volume, "alarm started");
        } else {
            info!("alarm stopped");
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// No-op alarm for tests and headless runs
#[derive(Default)]
pub struct NullAlarm {
    active: bool,
    /// Transition count, for assertions
    pub transitions: u32,
}

impl AlarmActuator for NullAlarm {
    fn set_active(&mut self, active: bool) {
        if self.active != active {
            self.active = active;
            self.transitions += 1;
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redundant_calls_are_noops() {
        let mut alarm = NullAlarm::default();
        alarm.set_active(true);
        alarm.set_active(true);
        alarm.set_active(true);
        assert!(alarm.is_active());
        assert_eq!(alarm.transitions, 1);

        alarm.set_active(false);
        assert_eq!(alarm.transitions, 2);
    }

    #[test]
    fn test_software_alarm_tracks_state() {
        let mut alarm = SoftwareAlarm::new(AlarmConfig::default());
        assert!(!alarm.is_active());
        alarm.set_active(true);
        assert!(alarm.is_active());
        alarm.set_active(false);
        assert!(!alarm.is_active());
    }

    #[test]
    fn test_volume_clamped() {
        let alarm = SoftwareAlarm::new(AlarmConfig {
            tone: AlarmTone::Tone3,
            volume: 2.5,
        });
        assert_eq!(alarm.config().volume, 1.0);
    }
}
