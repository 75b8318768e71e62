//! Monitoring runtime

use std::sync::Arc;

use alarm::AlarmActuator;
use frame_metrics::{RawFrameMetrics, SanitizeConfig};
use monitor::{Command, DriverMonitor, DriverState, Evaluation, MonitorError, SessionStats};
use serde::Serialize;
use session_store::{SessionId, SessionRecord, SessionStore, StorageError};
use sos::{compose_sos_message, EmergencyNotifier};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Runtime error types
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error(transparent)]
    Store(#[from] StorageError),
}

/// State published to passive observers after every evaluation
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub state: DriverState,
    pub stats: SessionStats,
    pub blink_window_count: u32,
    /// Last SOS dispatch failure this session, for the user-visible
    /// readout. Dispatch is never retried; the message sticks until the
    /// next session starts.
    pub sos_error: Option<String>,
}

/// Owns the monitor and dispatches its actuator commands.
///
/// Frames reach the monitor through a single mpsc consumer, so concurrent
/// producers are serialized and state mutation happens strictly in
/// submission order. Commands are dispatched synchronously per frame, in
/// the order the monitor issued them.
pub struct MonitorRuntime {
    monitor: DriverMonitor,
    sanitize: SanitizeConfig,
    alarm: Box<dyn AlarmActuator>,
    notifier: Arc<dyn EmergencyNotifier>,
    store: Arc<dyn SessionStore>,
    emergency_contact: String,
    /// Best-effort last-known coordinates for the SOS message
    location: Option<(f64, f64)>,
    /// Last SOS dispatch failure, cleared on session start
    sos_error: Option<String>,
    /// Timestamp of the most recent frame. Session duration is measured on
    /// the detector's timebase, so this is also the `stop` timestamp.
    last_timestamp_ms: u64,
    session_started_at_ms: u64,
    snapshot_tx: watch::Sender<Snapshot>,
}

impl MonitorRuntime {
    pub fn new(
        monitor: DriverMonitor,
        alarm: Box<dyn AlarmActuator>,
        notifier: Arc<dyn EmergencyNotifier>,
        store: Arc<dyn SessionStore>,
        emergency_contact: String,
    ) -> (Self, watch::Receiver<Snapshot>) {
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());
        (
            Self {
                monitor,
                sanitize: SanitizeConfig::default(),
                alarm,
                notifier,
                store,
                emergency_contact,
                location: None,
                sos_error: None,
                last_timestamp_ms: 0,
                session_started_at_ms: 0,
                snapshot_tx,
            },
            snapshot_rx,
        )
    }

    /// Open a store record and start the monitor
    pub fn start_session(&mut self, now_ms: u64) -> Result<SessionId, RuntimeError> {
        if self.monitor.is_monitoring() {
            return Err(MonitorError::AlreadyMonitoring.into());
        }
        let session_id = self.store.begin_session(now_ms)?;
        self.monitor.start(session_id, now_ms)?;
        self.session_started_at_ms = now_ms;
        self.last_timestamp_ms = now_ms;
        self.sos_error = None;
        Ok(session_id)
    }

    /// Stop the monitor and flush the final totals. Idempotent; safe to
    /// call between any two frames.
    ///
    /// The stop timestamp is the last frame's, keeping the duration on the
    /// detector's timebase regardless of the wall clock passed to
    /// `start_session`.
    pub fn stop_session(&mut self) {
        let Some(summary) = self.monitor.stop(self.last_timestamp_ms) else {
            return;
        };
        self.alarm.set_active(false);

        let record = SessionRecord {
            id: summary.session_id,
            started_at_ms: self.session_started_at_ms,
            duration_sec: summary.duration_sec,
            warnings: summary.warnings,
            criticals: summary.criticals,
            blinks: summary.blinks,
            yawns: summary.yawns,
            distractions: summary.distractions,
            finished: true,
        };
        if let Err(e) = self.store.end_session(record) {
            warn!("failed to flush session record: {}", e);
        }

        // Final snapshot keeps the session totals visible after stop
        let _ = self.snapshot_tx.send(Snapshot {
            state: DriverState::Offline,
            stats: self.monitor.stats().clone(),
            blink_window_count: 0,
            sos_error: self.sos_error.clone(),
        });
    }

    /// Feed best-effort coordinates for the SOS message
    pub fn update_location(&mut self, location: Option<(f64, f64)>) {
        self.location = location;
    }

    /// Evaluate one raw frame and dispatch the resulting commands
    pub fn handle_frame(&mut self, raw: RawFrameMetrics) -> Evaluation {
        let sample = raw.sanitize(&self.sanitize);
        self.last_timestamp_ms = sample.timestamp_ms;

        let eval = self.monitor.submit_frame(sample);
        for command in &eval.commands {
            match command {
                Command::SetAlarm(active) => self.alarm.set_active(*active),
                Command::SendSos => self.dispatch_sos(),
            }
        }

        let _ = self.snapshot_tx.send(Snapshot {
            state: eval.state,
            stats: eval.stats.clone(),
            blink_window_count: eval.blink_window_count,
            sos_error: self.sos_error.clone(),
        });

        eval
    }

    /// Consume frames until the channel closes
    pub async fn run(&mut self, mut frames: mpsc::Receiver<RawFrameMetrics>) {
        info!("monitor runtime running");
        while let Some(raw) = frames.recv().await {
            self.handle_frame(raw);
        }
        debug!("frame channel closed");
    }

    /// One SOS per critical episode; failure is non-fatal and not retried
    /// (the monitor's latch stays set either way). Failures are surfaced
    /// on the snapshot channel so presentation can show them.
    fn dispatch_sos(&mut self) {
        let message = compose_sos_message(self.location);
        match self
            .notifier
            .send_sos(&self.emergency_contact, &message, self.location)
        {
            Ok(()) => info!("SOS dispatched to {}", self.emergency_contact),
            Err(e) => {
                warn!("SOS dispatch failed (not retried): {}", e);
                self.sos_error = Some(e.to_string());
            }
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.is_monitoring()
    }
}

impl Drop for MonitorRuntime {
    /// Abnormal teardown behaves like an explicit stop: an open session is
    /// never silently lost.
    fn drop(&mut self) {
        if self.monitor.is_monitoring() {
            warn!("runtime dropped mid-session, flushing session record");
            self.stop_session();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alarm::NullAlarm;
    use session_store::MemoryStore;
    use sos::NotifyError;
    use std::sync::Mutex;

    struct RecordingNotifier {
        calls: Mutex<Vec<(String, String, Option<(f64, f64)>)>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn new(fail: bool) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl EmergencyNotifier for RecordingNotifier {
        fn send_sos(
            &self,
            contact: &str,
            message: &str,
            location: Option<(f64, f64)>,
        ) -> Result<(), NotifyError> {
            self.calls
                .lock()
                .unwrap()
                .push((contact.to_string(), message.to_string(), location));
            if self.fail {
                Err(NotifyError::Dispatch("broker unreachable".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn closed_eyes(t: u64) -> RawFrameMetrics {
        RawFrameMetrics {
            timestamp_ms: t,
            left_eye_open: Some(0.05),
            right_eye_open: Some(0.05),
            head_yaw_deg: 0.0,
            head_pitch_deg: 0.0,
            yawning: false,
        }
    }

    fn open_eyes(t: u64) -> RawFrameMetrics {
        RawFrameMetrics {
            timestamp_ms: t,
            left_eye_open: Some(0.95),
            right_eye_open: Some(0.95),
            head_yaw_deg: 0.0,
            head_pitch_deg: 0.0,
            yawning: false,
        }
    }

    fn runtime(
        notifier: Arc<RecordingNotifier>,
        store: Arc<MemoryStore>,
    ) -> (MonitorRuntime, watch::Receiver<Snapshot>) {
        MonitorRuntime::new(
            DriverMonitor::default(),
            Box::new(NullAlarm::default()),
            notifier,
            store,
            "+15550100".to_string(),
        )
    }

    #[test]
    fn test_session_flushes_to_store_on_stop() {
        let notifier = Arc::new(RecordingNotifier::new(false));
        let store = Arc::new(MemoryStore::new());
        let (mut rt, _rx) = runtime(notifier, store.clone());

        let id = rt.start_session(0).unwrap();
        rt.handle_frame(closed_eyes(100));
        rt.handle_frame(closed_eyes(1500));
        rt.handle_frame(closed_eyes(11_000));
        rt.handle_frame(open_eyes(11_100));
        rt.stop_session();

        let recent = store.recent(1).unwrap();
        assert_eq!(recent[0].id, id);
        assert!(recent[0].finished);
        assert_eq!(recent[0].criticals, 1);
        assert_eq!(recent[0].warnings, 1);
        assert_eq!(recent[0].blinks, 1);
        // First frame 100 to last frame 11_100, on the detector's clock
        assert_eq!(recent[0].duration_sec, 11);
    }

    #[test]
    fn test_duration_uses_detector_timebase_not_wall_clock() {
        let notifier = Arc::new(RecordingNotifier::new(false));
        let store = Arc::new(MemoryStore::new());
        let (mut rt, _rx) = runtime(notifier, store.clone());

        // Wall-clock session start, boot-monotonic frame timestamps
        rt.start_session(1_700_000_000_000).unwrap();
        rt.handle_frame(open_eyes(2000));
        rt.handle_frame(open_eyes(32_000));
        rt.stop_session();

        let recent = store.recent(1).unwrap();
        assert_eq!(recent[0].duration_sec, 30);
    }

    #[test]
    fn test_sos_dispatched_once_with_location() {
        let notifier = Arc::new(RecordingNotifier::new(false));
        let store = Arc::new(MemoryStore::new());
        let (mut rt, _rx) = runtime(notifier.clone(), store);

        rt.start_session(0).unwrap();
        rt.update_location(Some((48.1, 11.6)));
        rt.handle_frame(closed_eyes(100));
        rt.handle_frame(closed_eyes(11_000));
        rt.handle_frame(closed_eyes(12_000));

        assert_eq!(notifier.call_count(), 1);
        let calls = notifier.calls.lock().unwrap();
        assert_eq!(calls[0].0, "+15550100");
        assert!(calls[0].1.contains("maps.google.com"));
        assert_eq!(calls[0].2, Some((48.1, 11.6)));
    }

    #[test]
    fn test_sos_failure_is_not_retried() {
        let notifier = Arc::new(RecordingNotifier::new(true));
        let store = Arc::new(MemoryStore::new());
        let (mut rt, _rx) = runtime(notifier.clone(), store);

        rt.start_session(0).unwrap();
        rt.handle_frame(closed_eyes(100));
        rt.handle_frame(closed_eyes(11_000));
        // Still critical: the latch holds even though dispatch failed
        rt.handle_frame(closed_eyes(13_000));
        rt.handle_frame(closed_eyes(15_000));

        assert_eq!(notifier.call_count(), 1);
        assert!(rt.is_monitoring());
    }

    #[test]
    fn test_sos_failure_surfaced_on_snapshot() {
        let notifier = Arc::new(RecordingNotifier::new(true));
        let store = Arc::new(MemoryStore::new());
        let (mut rt, rx) = runtime(notifier, store);

        rt.start_session(0).unwrap();
        rt.handle_frame(closed_eyes(100));
        assert!(rx.borrow().sos_error.is_none());

        rt.handle_frame(closed_eyes(11_000));
        let error = rx.borrow().sos_error.clone().unwrap();
        assert!(error.contains("broker unreachable"));

        // Sticks for the user-visible readout on later frames too
        rt.handle_frame(closed_eyes(12_000));
        assert!(rx.borrow().sos_error.is_some());

        // A fresh session clears it
        rt.stop_session();
        rt.start_session(20_000).unwrap();
        rt.handle_frame(open_eyes(20_100));
        assert!(rx.borrow().sos_error.is_none());
    }

    #[test]
    fn test_drop_flushes_open_session() {
        let notifier = Arc::new(RecordingNotifier::new(false));
        let store = Arc::new(MemoryStore::new());
        {
            let (mut rt, _rx) = runtime(notifier, store.clone());
            rt.start_session(0).unwrap();
            rt.handle_frame(open_eyes(1000));
            rt.handle_frame(open_eyes(6000));
            // Dropped without an explicit stop
        }

        let recent = store.recent(1).unwrap();
        assert!(recent[0].finished);
        assert_eq!(recent[0].duration_sec, 5);
    }

    #[test]
    fn test_stop_publishes_final_totals() {
        let notifier = Arc::new(RecordingNotifier::new(false));
        let store = Arc::new(MemoryStore::new());
        let (mut rt, rx) = runtime(notifier, store);

        rt.start_session(0).unwrap();
        rt.handle_frame(closed_eyes(100));
        rt.handle_frame(closed_eyes(1500));
        rt.handle_frame(open_eyes(1600));
        rt.stop_session();

        let snapshot = rx.borrow();
        assert_eq!(snapshot.state, DriverState::Offline);
        assert_eq!(snapshot.stats.warnings, 1);
        assert_eq!(snapshot.stats.blinks, 1);
    }

    #[test]
    fn test_snapshot_published_per_frame() {
        let notifier = Arc::new(RecordingNotifier::new(false));
        let store = Arc::new(MemoryStore::new());
        let (mut rt, rx) = runtime(notifier, store);

        rt.start_session(0).unwrap();
        rt.handle_frame(closed_eyes(100));
        rt.handle_frame(closed_eyes(1200));

        let snapshot = rx.borrow();
        assert_eq!(snapshot.state, DriverState::DrowsyWarning);
        assert_eq!(snapshot.stats.warnings, 1);
    }

    #[tokio::test]
    async fn test_run_consumes_channel_in_order() {
        let notifier = Arc::new(RecordingNotifier::new(false));
        let store = Arc::new(MemoryStore::new());
        let (mut rt, rx) = runtime(notifier, store);
        rt.start_session(0).unwrap();

        let (tx, frames) = mpsc::channel(16);
        for t in [100u64, 1200, 2400] {
            tx.send(closed_eyes(t)).await.unwrap();
        }
        drop(tx);

        rt.run(frames).await;
        assert_eq!(rx.borrow().state, DriverState::DrowsyWarning);
        assert_eq!(rx.borrow().stats.warnings, 1);
    }

    #[test]
    fn test_double_start_surfaces_monitor_error() {
        let notifier = Arc::new(RecordingNotifier::new(false));
        let store = Arc::new(MemoryStore::new());
        let (mut rt, _rx) = runtime(notifier, store);

        rt.start_session(0).unwrap();
        assert!(matches!(
            rt.start_session(100),
            Err(RuntimeError::Monitor(MonitorError::AlreadyMonitoring))
        ));
    }
}
