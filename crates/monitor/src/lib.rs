//! Driver State Monitor
//!
//! Real-time driver alertness classification from per-frame facial metrics:
//! - Eye-closure dwell tracking (drowsy warning / critical)
//! - Head pose distraction detection
//! - Yawn episode counting
//! - Blink-rate window and per-session statistics
//! - Alarm and SOS escalation policy
//!
//! The monitor is pure temporal logic: it ingests one `FrameMetrics` sample
//! at a time, in submission order, and emits an `Evaluation` describing the
//! resulting state, edge-triggered events, and actuator commands. All side
//! effects are carried out by the host.

pub mod config;
pub mod evaluation;
pub mod rules;
pub mod state;

pub use config::MonitorConfig;
pub use evaluation::{Command, Evaluation, MonitorEvent};
pub use rules::{RuleKind, RULE_ORDER};
pub use state::{
    BlinkRateWindow, DriverState, EpisodeFlags, SessionStats, SessionSummary,
};

use frame_metrics::FrameMetrics;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Monitor error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MonitorError {
    #[error("monitoring session already active")]
    AlreadyMonitoring,
}

/// Stateful driver alertness classifier.
///
/// Single-producer: exactly one ordered stream of frames drives it, and all
/// state mutation happens in submission order. Nothing here blocks; dwell
/// comparisons are reads of the frame timestamp.
pub struct DriverMonitor {
    config: MonitorConfig,
    monitoring: bool,
    state: DriverState,
    flags: EpisodeFlags,
    stats: SessionStats,
    blink_window: BlinkRateWindow,
    /// Set on the first closed-eye frame, cleared on reopen. One timer
    /// spans the warning and critical thresholds.
    eye_closed_since: Option<u64>,
    /// Pending blink: eyes were closed and have not reopened yet
    eyes_were_closed: bool,
    /// Set on the first look-away frame, cleared when the head recenters
    distraction_since: Option<u64>,
    /// Last alarm state commanded to the actuator
    alarm_commanded: bool,
    /// Whether the session clock has been rebased onto the frame timebase
    timebase_seeded: bool,
}

impl DriverMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            monitoring: false,
            state: DriverState::Offline,
            flags: EpisodeFlags::default(),
            stats: SessionStats::default(),
            blink_window: BlinkRateWindow::default(),
            eye_closed_since: None,
            eyes_were_closed: false,
            distraction_since: None,
            alarm_commanded: false,
            timebase_seeded: false,
        }
    }

    /// Begin a monitoring session. Fails if one is already active.
    pub fn start(&mut self, session_id: i64, now_ms: u64) -> Result<(), MonitorError> {
        if self.monitoring {
            return Err(MonitorError::AlreadyMonitoring);
        }

        self.monitoring = true;
        self.state = DriverState::Attentive;
        self.flags = EpisodeFlags::default();
        self.stats = SessionStats::new(session_id, now_ms);
        self.blink_window = BlinkRateWindow::start(now_ms);
        self.eye_closed_since = None;
        self.eyes_were_closed = false;
        self.distraction_since = None;
        self.alarm_commanded = false;
        self.timebase_seeded = false;

        info!(session_id, "monitoring session started");
        Ok(())
    }

    /// End the session and produce the final totals.
    ///
    /// Idempotent: returns `None` when no session is active. Leaves no
    /// pending timers or latches, so it is safe between any two frames.
    pub fn stop(&mut self, now_ms: u64) -> Option<SessionSummary> {
        if !self.monitoring {
            return None;
        }

        let summary = self.stats.finish(now_ms);
        self.monitoring = false;
        self.state = DriverState::Offline;
        self.flags = EpisodeFlags::default();
        self.eye_closed_since = None;
        self.eyes_were_closed = false;
        self.distraction_since = None;
        self.alarm_commanded = false;

        info!(
            session_id = summary.session_id,
            duration_sec = summary.duration_sec,
            "monitoring session stopped"
        );
        Some(summary)
    }

    /// Evaluate one frame. Never fails for any input; frames received while
    /// no session is active are classified `Offline` and otherwise ignored.
    pub fn submit_frame(&mut self, frame: FrameMetrics) -> Evaluation {
        if !self.monitoring {
            return Evaluation::offline();
        }

        let now = frame.timestamp_ms;

        // The detector owns the clock. The first frame rebases the session
        // start and the blink window onto its timebase, so a wall-clock
        // `start` timestamp cannot skew window or duration math when the
        // detector reports boot-monotonic time.
        if !self.timebase_seeded {
            self.timebase_seeded = true;
            self.stats.started_at_ms = now;
            self.blink_window = BlinkRateWindow::start(now);
        }

        let mut events = Vec::new();
        let mut commands = Vec::new();

        let previous = self.state;
        let mut claimed = false;
        for rule in RULE_ORDER {
            claimed = match rule {
                RuleKind::Distraction => {
                    self.check_distraction(&frame, now, &mut events, &mut commands)
                }
                RuleKind::Yawn => self.check_yawn(&frame, &mut events),
                RuleKind::EyeClosure => {
                    self.check_eye_closure(&frame, now, &mut events, &mut commands)
                }
            };
            if claimed {
                break;
            }
        }
        if !claimed {
            self.settle_attentive(&mut events, &mut commands);
        }

        if self.state != previous {
            debug!(from = ?previous, to = ?self.state, "driver state transition");
        }

        // Independent of which rule claimed the frame
        if let Some(per_minute) = self.blink_window.roll(now, self.config.blink_window_ms) {
            events.push(MonitorEvent::BlinkRate { per_minute });
        }

        Evaluation {
            state: self.state,
            events,
            commands,
            stats: self.stats.clone(),
            blink_window_count: self.blink_window.count,
        }
    }

    /// Rule 1: head turned or tilted away.
    ///
    /// Claims the frame only once the dwell threshold is crossed; a fresh
    /// look-away starts the timer and falls through to the other rules.
    fn check_distraction(
        &mut self,
        frame: &FrameMetrics,
        now: u64,
        events: &mut Vec<MonitorEvent>,
        commands: &mut Vec<Command>,
    ) -> bool {
        let looking_away = frame.head_yaw_deg.abs() > self.config.yaw_limit_deg
            || frame.head_pitch_deg < self.config.pitch_floor_deg;

        if !looking_away {
            self.distraction_since = None;
            self.flags.distraction_fired = false;
            return false;
        }

        let since = *self.distraction_since.get_or_insert(now);
        if now.saturating_sub(since) < self.config.distraction_dwell_ms {
            return false;
        }

        self.state = DriverState::Distracted;
        if !self.flags.distraction_fired {
            self.flags.distraction_fired = true;
            self.stats.distractions += 1;
            events.push(MonitorEvent::DistractionStarted);
        }
        self.alarm(true, commands);
        true
    }

    /// Rule 2: yawn in progress
    fn check_yawn(&mut self, frame: &FrameMetrics, events: &mut Vec<MonitorEvent>) -> bool {
        if !frame.yawning {
            self.flags.yawn_fired = false;
            return false;
        }

        self.state = DriverState::Yawning;
        if !self.flags.yawn_fired {
            self.flags.yawn_fired = true;
            self.stats.yawns += 1;
            events.push(MonitorEvent::YawnDetected);
        }
        true
    }

    /// Rule 3: eye closure dwell.
    ///
    /// Claims every closed-eye frame. Below the warning dwell the frame is
    /// transitional: the timer runs but the state, alarm, and counters are
    /// untouched.
    fn check_eye_closure(
        &mut self,
        frame: &FrameMetrics,
        now: u64,
        events: &mut Vec<MonitorEvent>,
        commands: &mut Vec<Command>,
    ) -> bool {
        if frame.eye_openness >= self.config.eye_closed_threshold {
            return false;
        }

        self.eyes_were_closed = true;
        let since = *self.eye_closed_since.get_or_insert(now);
        let closed_ms = now.saturating_sub(since);

        if closed_ms >= self.config.critical_dwell_ms {
            self.state = DriverState::DrowsyCritical;
            self.alarm(true, commands);
            if !self.flags.critical_fired {
                self.flags.critical_fired = true;
                self.stats.criticals += 1;
                events.push(MonitorEvent::DrowsyCritical);
            }
            if !self.flags.sos_sent {
                self.flags.sos_sent = true;
                commands.push(Command::SendSos);
                events.push(MonitorEvent::SosRequested);
                warn!(closed_ms, "critical drowsiness, requesting SOS escalation");
            }
        } else if closed_ms >= self.config.warning_dwell_ms {
            self.state = DriverState::DrowsyWarning;
            self.alarm(true, commands);
            if !self.flags.warning_fired {
                self.flags.warning_fired = true;
                self.stats.warnings += 1;
                events.push(MonitorEvent::DrowsyWarning);
            }
        }
        true
    }

    /// Default branch: eyes open, head forward, no yawn
    fn settle_attentive(&mut self, events: &mut Vec<MonitorEvent>, commands: &mut Vec<Command>) {
        if self.eyes_were_closed {
            // Completed open -> closed -> open cycle
            self.eyes_were_closed = false;
            self.stats.blinks += 1;
            self.blink_window.record_blink();
            self.flags.clear_eye_episode();
            events.push(MonitorEvent::BlinkCompleted);
        }
        self.eye_closed_since = None;
        self.state = DriverState::Attentive;
        self.alarm(false, commands);
    }

    /// Emit an alarm command only on transitions
    fn alarm(&mut self, active: bool, commands: &mut Vec<Command>) {
        if self.alarm_commanded != active {
            self.alarm_commanded = active;
            commands.push(Command::SetAlarm(active));
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

impl Default for DriverMonitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}
