//! Alarm Actuator
//!
//! Audible alarm abstraction driven by the monitor's `SetAlarm` commands.
//! Actuators are idempotent: redundant start/stop calls are no-ops.

mod actuator;

pub use actuator::{AlarmActuator, AlarmConfig, AlarmTone, NullAlarm, SoftwareAlarm};
