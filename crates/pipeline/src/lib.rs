//! DriveSafe Monitoring Pipeline
//!
//! Wires the external frame source to the driver state monitor and its
//! actuators: a single-consumer frame queue serializes producers, actuator
//! commands are dispatched in the order the monitor issued them, and every
//! evaluation is published on a watch channel for passive observers.

mod runtime;
mod settings;
mod source;

pub use runtime::{MonitorRuntime, RuntimeError, Snapshot};
pub use settings::Settings;
pub use source::{read_frames, stdin_frames};

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize the global tracing subscriber
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
