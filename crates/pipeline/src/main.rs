//! DriveSafe Monitor - Main Entry Point

use std::sync::Arc;

use alarm::SoftwareAlarm;
use monitor::DriverMonitor;
use pipeline::{init_logging, stdin_frames, MonitorRuntime, Settings};
use session_store::MemoryStore;
use sos::{EmergencyNotifier, LogNotifier, MqttNotifier};
use tokio::sync::mpsc;
use tracing::{info, warn};

fn unix_millis() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== DriveSafe Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load(std::env::args().nth(1).as_deref())?;
    if settings.emergency_contact.is_empty() {
        warn!("no emergency contact configured, SOS dispatch will fail");
    }

    let notifier: Arc<dyn EmergencyNotifier> = if settings.use_mqtt {
        let mut mqtt = MqttNotifier::new(settings.sos.clone());
        mqtt.connect().await?;
        Arc::new(mqtt)
    } else {
        Arc::new(LogNotifier)
    };

    let (mut runtime, mut snapshots) = MonitorRuntime::new(
        DriverMonitor::new(settings.monitor.clone()),
        Box::new(SoftwareAlarm::new(settings.alarm.clone())),
        notifier,
        Arc::new(MemoryStore::new()),
        settings.emergency_contact.clone(),
    );

    let session_id = runtime.start_session(unix_millis())?;
    info!(session_id, "drive session started");

    // Passive status readout
    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            info!(
                state = snapshot.state.label(),
                blinks = snapshot.stats.blinks,
                "status"
            );
        }
    });

    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(stdin_frames(tx));

    tokio::select! {
        _ = runtime.run(rx) => info!("frame source ended"),
        _ = tokio::signal::ctrl_c() => info!("shutdown requested"),
    }

    runtime.stop_session();
    info!("session saved");
    Ok(())
}
