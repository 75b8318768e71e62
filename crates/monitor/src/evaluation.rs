//! Per-frame evaluation output

use serde::{Deserialize, Serialize};

use crate::state::{DriverState, SessionStats};

/// Edge-triggered monitor events, at most one per episode per category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorEvent {
    /// Sustained look-away crossed the distraction dwell
    DistractionStarted,
    /// Yawn episode began
    YawnDetected,
    /// Eye closure crossed the warning dwell
    DrowsyWarning,
    /// Eye closure crossed the critical dwell
    DrowsyCritical,
    /// SOS escalation requested for this critical episode
    SosRequested,
    /// Eyes reopened after a closure (one completed blink cycle)
    BlinkCompleted,
    /// Blink-rate window elapsed and was reset
    BlinkRate { per_minute: u32 },
}

/// Actuator commands, issued in the order the causing transitions occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start or stop the audible alarm
    SetAlarm(bool),
    /// Dispatch the emergency notification
    SendSos,
}

/// Result of evaluating one frame.
///
/// Emitted on every evaluation for passive observers (presentation), with
/// commands for the host to dispatch to the actuators.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Current driver state after this frame
    pub state: DriverState,
    /// Events edge-triggered by this frame
    pub events: Vec<MonitorEvent>,
    /// Actuator commands caused by this frame, in order
    pub commands: Vec<Command>,
    /// Session totals snapshot
    pub stats: SessionStats,
    /// Blinks counted so far in the current rate window
    pub blink_window_count: u32,
}

impl Evaluation {
    /// Evaluation produced while no session is active
    pub(crate) fn offline() -> Self {
        Self {
            state: DriverState::Offline,
            events: Vec::new(),
            commands: Vec::new(),
            stats: SessionStats::default(),
            blink_window_count: 0,
        }
    }

    /// Whether this frame requested the SOS escalation
    pub fn requested_sos(&self) -> bool {
        self.commands.contains(&Command::SendSos)
    }
}
