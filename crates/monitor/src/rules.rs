//! Ranked rule evaluation order
//!
//! The per-frame classification walks an explicit ordered list of rules and
//! the first rule that claims the frame wins. Distraction and yawning rank
//! above the drowsiness readout even though drowsiness is the more severe
//! hazard: both are transient head-motion/mouth events the driver can
//! resolve immediately, so they take over the readout while they last.

/// One category of per-frame check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Head turned/tilted away past the dwell threshold
    Distraction,
    /// Yawn flag set by the detector
    Yawn,
    /// Eye closure dwell (warning, critical, or transitional)
    EyeClosure,
}

/// Evaluation order. First claim wins; the attentive default applies when
/// no rule claims the frame.
pub const RULE_ORDER: [RuleKind; 3] = [RuleKind::Distraction, RuleKind::Yawn, RuleKind::EyeClosure];
