//! Frame sample types and sanitization

use serde::{Deserialize, Serialize};

/// Sanitization limits for raw detector output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizeConfig {
    /// Head yaw clamp range (degrees)
    pub yaw_range_deg: (f32, f32),
    /// Head pitch clamp range (degrees)
    pub pitch_range_deg: (f32, f32),
    /// Eye openness assumed when the detector reports no probability
    pub default_eye_open: f32,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            yaw_range_deg: (-90.0, 90.0),
            pitch_range_deg: (-90.0, 90.0),
            default_eye_open: 1.0,
        }
    }
}

/// One sample as produced by the external face detector.
///
/// Eye-open probabilities are per eye and optional: the detector omits them
/// when eye classification did not run on that frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFrameMetrics {
    /// Monotonic capture timestamp (ms)
    pub timestamp_ms: u64,
    /// Left eye open probability [0, 1], if classified
    pub left_eye_open: Option<f32>,
    /// Right eye open probability [0, 1], if classified
    pub right_eye_open: Option<f32>,
    /// Head rotation around the vertical axis (degrees, signed)
    pub head_yaw_deg: f32,
    /// Head rotation around the side axis (degrees, negative = down)
    pub head_pitch_deg: f32,
    /// Whether the mouth geometry indicates a yawn
    pub yawning: bool,
}

/// Sanitized per-frame sample consumed by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameMetrics {
    /// Monotonic capture timestamp (ms)
    pub timestamp_ms: u64,
    /// Mean eye openness [0, 1]
    pub eye_openness: f32,
    /// Head yaw (degrees, signed)
    pub head_yaw_deg: f32,
    /// Head pitch (degrees, negative = down)
    pub head_pitch_deg: f32,
    /// Yawn flag from the detector
    pub yawning: bool,
}

impl RawFrameMetrics {
    /// Sanitize into a monitor-ready sample. Total: never fails.
    ///
    /// A missing eye probability counts as fully open and NaN angles count
    /// as centered. Under-alerting on a sensor gap is preferred over a
    /// false alarm.
    pub fn sanitize(&self, config: &SanitizeConfig) -> FrameMetrics {
        let left = eye_or_default(self.left_eye_open, config.default_eye_open);
        let right = eye_or_default(self.right_eye_open, config.default_eye_open);

        FrameMetrics {
            timestamp_ms: self.timestamp_ms,
            eye_openness: (left + right) / 2.0,
            head_yaw_deg: clamp_angle(self.head_yaw_deg, config.yaw_range_deg),
            head_pitch_deg: clamp_angle(self.head_pitch_deg, config.pitch_range_deg),
            yawning: self.yawning,
        }
    }
}

impl FrameMetrics {
    /// Convenience constructor for fully-observed samples
    pub fn new(timestamp_ms: u64, eye_openness: f32, yaw: f32, pitch: f32, yawning: bool) -> Self {
        RawFrameMetrics {
            timestamp_ms,
            left_eye_open: Some(eye_openness),
            right_eye_open: Some(eye_openness),
            head_yaw_deg: yaw,
            head_pitch_deg: pitch,
            yawning,
        }
        .sanitize(&SanitizeConfig::default())
    }
}

fn eye_or_default(value: Option<f32>, default: f32) -> f32 {
    match value {
        Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
        _ => default,
    }
}

fn clamp_angle(value: f32, range: (f32, f32)) -> f32 {
    if value.is_finite() {
        value.clamp(range.0, range.1)
    } else {
        0.0
    }
}
