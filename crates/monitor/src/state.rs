//! Driver state and session tracking types

use serde::{Deserialize, Serialize};

/// Discrete driver safety state. Exactly one is current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DriverState {
    /// No monitoring session active
    #[default]
    Offline,
    /// Eyes open, head forward
    Attentive,
    /// Yawn in progress
    Yawning,
    /// Head turned or tilted away for longer than the distraction dwell
    Distracted,
    /// Eyes closed past the warning dwell
    DrowsyWarning,
    /// Eyes closed past the critical dwell; SOS escalation territory
    DrowsyCritical,
}

impl DriverState {
    /// Display label matching the in-cabin status readout
    pub fn label(&self) -> &'static str {
        match self {
            DriverState::Offline => "OFFLINE",
            DriverState::Attentive => "ATTENTIVE",
            DriverState::Yawning => "YAWNING!",
            DriverState::Distracted => "DISTRACTED!",
            DriverState::DrowsyWarning => "WAKE UP!",
            DriverState::DrowsyCritical => "PULL OVER!",
        }
    }
}

/// Edge-trigger latches, one per alert category.
///
/// A latch is set when the event for the current episode has been counted
/// and acted on, and clears only when the triggering condition clears, so a
/// condition persisting across frames is never double-counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EpisodeFlags {
    pub distraction_fired: bool,
    pub yawn_fired: bool,
    pub warning_fired: bool,
    pub critical_fired: bool,
    pub sos_sent: bool,
}

impl EpisodeFlags {
    /// Clear the eye-closure episode latches (on reopen)
    pub fn clear_eye_episode(&mut self) {
        self.warning_fired = false;
        self.critical_fired = false;
        self.sos_sent = false;
    }
}

/// Aggregated totals for one monitoring session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: i64,
    pub started_at_ms: u64,
    pub blinks: u32,
    pub yawns: u32,
    pub distractions: u32,
    pub warnings: u32,
    pub criticals: u32,
}

impl SessionStats {
    pub fn new(session_id: i64, started_at_ms: u64) -> Self {
        Self {
            session_id,
            started_at_ms,
            ..Default::default()
        }
    }

    /// Finalize into the record flushed to the session store
    pub fn finish(&self, now_ms: u64) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id,
            duration_sec: (now_ms.saturating_sub(self.started_at_ms) / 1000) as u32,
            warnings: self.warnings,
            criticals: self.criticals,
            blinks: self.blinks,
            yawns: self.yawns,
            distractions: self.distractions,
        }
    }
}

/// Final session totals, produced exactly once per session by `stop`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: i64,
    pub duration_sec: u32,
    pub warnings: u32,
    pub criticals: u32,
    pub blinks: u32,
    pub yawns: u32,
    pub distractions: u32,
}

/// Rolling blink counter, reported and reset once per window.
///
/// Independent of the session blink total; feeds the blinks-per-minute
/// readout only.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BlinkRateWindow {
    pub window_start_ms: u64,
    pub count: u32,
}

impl BlinkRateWindow {
    pub fn start(now_ms: u64) -> Self {
        Self {
            window_start_ms: now_ms,
            count: 0,
        }
    }

    pub fn record_blink(&mut self) {
        self.count += 1;
    }

    /// Report and reset when the window has elapsed
    pub fn roll(&mut self, now_ms: u64, window_ms: u64) -> Option<u32> {
        if now_ms.saturating_sub(self.window_start_ms) >= window_ms {
            let rate = self.count;
            self.count = 0;
            self.window_start_ms = now_ms;
            Some(rate)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_labels() {
        assert_eq!(DriverState::Attentive.label(), "ATTENTIVE");
        assert_eq!(DriverState::DrowsyCritical.label(), "PULL OVER!");
    }

    #[test]
    fn test_eye_episode_clear_leaves_other_latches() {
        let mut flags = EpisodeFlags {
            distraction_fired: true,
            yawn_fired: true,
            warning_fired: true,
            critical_fired: true,
            sos_sent: true,
        };
        flags.clear_eye_episode();
        assert!(flags.distraction_fired);
        assert!(flags.yawn_fired);
        assert!(!flags.warning_fired);
        assert!(!flags.critical_fired);
        assert!(!flags.sos_sent);
    }

    #[test]
    fn test_summary_duration() {
        let stats = SessionStats::new(7, 10_000);
        let summary = stats.finish(73_500);
        assert_eq!(summary.session_id, 7);
        assert_eq!(summary.duration_sec, 63);
    }

    #[test]
    fn test_blink_window_roll() {
        let mut window = BlinkRateWindow::start(0);
        window.record_blink();
        window.record_blink();
        assert_eq!(window.roll(59_999, 60_000), None);
        assert_eq!(window.roll(60_000, 60_000), Some(2));
        assert_eq!(window.count, 0);
        assert_eq!(window.window_start_ms, 60_000);
    }
}
