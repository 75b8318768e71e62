//! Per-frame facial metrics
//!
//! Input data model for the driver state monitor:
//! - `RawFrameMetrics`: what the external face detector reports
//! - `FrameMetrics`: sanitized sample the monitor consumes
//!
//! Sanitization is total: a degraded sensor reading degrades to a safe
//! default (eyes open, head centered) instead of producing an error.

mod sample;

pub use sample::{FrameMetrics, RawFrameMetrics, SanitizeConfig};
