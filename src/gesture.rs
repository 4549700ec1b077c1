//! Hands-up gesture classifier.
//!
//! Compares limb directions on both arms using dot products of unit vectors:
//! the upper arm against the torso (is the arm raised?) and the forearm
//! against the upper arm (is the elbow straight?). The weakest of the four
//! cosines drives a two-threshold hysteresis so the signal does not flicker
//! when the pose hovers near a single cutoff.

use glam::Vec3;

use crate::pose::{ArmChain, Pose};

/// Hysteresis band for the hands-up signal, expressed as cosines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Signal turns on when the weakest cosine is strictly above this
    pub on: f32,
    /// Signal turns off when the weakest cosine is strictly below this
    pub off: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { on: 0.8, off: 0.7 }
    }
}

impl Thresholds {
    /// Apply the hysteresis rule. Values inside `[off, on]` keep `previous`.
    pub fn next_state(&self, cos_min: f32, previous: bool) -> bool {
        if cos_min > self.on {
            true
        } else if cos_min < self.off {
            false
        } else {
            previous
        }
    }
}

/// The four alignment cosines, each in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimbCosines {
    /// Upper arm vs. torso, left side
    pub arm_l: f32,
    /// Upper arm vs. torso, right side
    pub arm_r: f32,
    /// Forearm vs. upper arm, left side
    pub fore_arm_l: f32,
    /// Forearm vs. upper arm, right side
    pub fore_arm_r: f32,
}

impl LimbCosines {
    pub fn min(&self) -> f32 {
        self.arm_l
            .min(self.arm_r)
            .min(self.fore_arm_l)
            .min(self.fore_arm_r)
    }
}

/// Result of classifying one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// New gesture state
    pub hands_up: bool,
    /// Midpoint between the wrists; `None` when no pose was detected
    pub marker_position: Option<Vec3>,
    /// Weakest limb cosine; `None` when no pose was detected
    pub cos_min: Option<f32>,
}

/// (arm_cos, fore_arm_cos) for one side.
///
/// Coincident joints give a zero direction, so the cosine involving them is 0.
fn arm_cosines(chain: &ArmChain) -> (f32, f32) {
    let torso = (chain.shoulder - chain.hip).normalize_or_zero();
    let upper_arm = (chain.elbow - chain.shoulder).normalize_or_zero();
    let fore_arm = (chain.wrist - chain.elbow).normalize_or_zero();

    (torso.dot(upper_arm), fore_arm.dot(upper_arm))
}

/// Compute all four alignment cosines for a pose.
pub fn limb_cosines(pose: &Pose) -> LimbCosines {
    let (arm_l, fore_arm_l) = arm_cosines(&pose.left_arm());
    let (arm_r, fore_arm_r) = arm_cosines(&pose.right_arm());

    LimbCosines {
        arm_l,
        arm_r,
        fore_arm_l,
        fore_arm_r,
    }
}

/// Classify one frame. Pure given `(pose, previous)`.
///
/// A frame without a pose always reads as "hands not up" and carries no
/// marker position, so the caller leaves the marker where it was.
pub fn classify(pose: Option<&Pose>, previous: bool, thresholds: &Thresholds) -> Classification {
    let Some(pose) = pose else {
        return Classification {
            hands_up: false,
            marker_position: None,
            cos_min: None,
        };
    };

    let cos_min = limb_cosines(pose).min();

    Classification {
        hands_up: thresholds.next_state(cos_min, previous),
        marker_position: Some(pose.wrist_l.lerp(pose.wrist_r, 0.5)),
        cos_min: Some(cos_min),
    }
}

/// Stateful wrapper that keeps the gesture state across frames.
#[derive(Debug, Clone)]
pub struct HandsUpDetector {
    thresholds: Thresholds,
    hands_up: bool,
}

impl HandsUpDetector {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            hands_up: false,
        }
    }

    /// Current gesture state
    pub fn hands_up(&self) -> bool {
        self.hands_up
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Classify a frame and store the new state.
    ///
    /// Returns the classification and whether the state flipped.
    pub fn update(&mut self, pose: Option<&Pose>) -> (Classification, bool) {
        let result = classify(pose, self.hands_up, &self.thresholds);
        let changed = result.hands_up != self.hands_up;
        self.hands_up = result.hands_up;
        (result, changed)
    }

    /// Drop back to "hands not up", e.g. when a new avatar is loaded.
    pub fn reset(&mut self) {
        self.hands_up = false;
    }
}

impl Default for HandsUpDetector {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}
