//! Pose data model
//!
//! A pose is the eight upper-body joints the hands-up heuristic needs. Poses
//! come from an external estimator as a map of landmark name to world
//! position (glTF coordinates, meters).

use glam::Vec3;
use std::collections::HashMap;

/// A named joint the classifier reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    HipL,
    HipR,
    ShoulderL,
    ShoulderR,
    ElbowL,
    ElbowR,
    WristL,
    WristR,
}

impl Joint {
    pub const ALL: [Joint; 8] = [
        Self::HipL,
        Self::HipR,
        Self::ShoulderL,
        Self::ShoulderR,
        Self::ElbowL,
        Self::ElbowR,
        Self::WristL,
        Self::WristR,
    ];

    /// Landmark key used by the tracker for this joint
    pub fn landmark_name(&self) -> &'static str {
        match self {
            Self::HipL => "leftHip",
            Self::HipR => "rightHip",
            Self::ShoulderL => "leftShoulder",
            Self::ShoulderR => "rightShoulder",
            Self::ElbowL => "leftElbow",
            Self::ElbowR => "rightElbow",
            Self::WristL => "leftWrist",
            Self::WristR => "rightWrist",
        }
    }
}

impl std::fmt::Display for Joint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.landmark_name())
    }
}

/// One side of the body: hip → shoulder → elbow → wrist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmChain {
    pub hip: Vec3,
    pub shoulder: Vec3,
    pub elbow: Vec3,
    pub wrist: Vec3,
}

/// A single detected pose with all eight joints present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub hip_l: Vec3,
    pub hip_r: Vec3,
    pub shoulder_l: Vec3,
    pub shoulder_r: Vec3,
    pub elbow_l: Vec3,
    pub elbow_r: Vec3,
    pub wrist_l: Vec3,
    pub wrist_r: Vec3,
}

impl Pose {
    /// Build a pose from a tracker landmark map.
    ///
    /// Returns `None` if any of the eight joints is missing.
    pub fn from_landmarks(landmarks: &HashMap<String, [f32; 3]>) -> Option<Self> {
        let get = |joint: Joint| landmarks.get(joint.landmark_name()).map(|&p| Vec3::from(p));

        Some(Self {
            hip_l: get(Joint::HipL)?,
            hip_r: get(Joint::HipR)?,
            shoulder_l: get(Joint::ShoulderL)?,
            shoulder_r: get(Joint::ShoulderR)?,
            elbow_l: get(Joint::ElbowL)?,
            elbow_r: get(Joint::ElbowR)?,
            wrist_l: get(Joint::WristL)?,
            wrist_r: get(Joint::WristR)?,
        })
    }

    /// Position of a single joint
    pub fn joint(&self, joint: Joint) -> Vec3 {
        match joint {
            Joint::HipL => self.hip_l,
            Joint::HipR => self.hip_r,
            Joint::ShoulderL => self.shoulder_l,
            Joint::ShoulderR => self.shoulder_r,
            Joint::ElbowL => self.elbow_l,
            Joint::ElbowR => self.elbow_r,
            Joint::WristL => self.wrist_l,
            Joint::WristR => self.wrist_r,
        }
    }

    pub fn left_arm(&self) -> ArmChain {
        ArmChain {
            hip: self.hip_l,
            shoulder: self.shoulder_l,
            elbow: self.elbow_l,
            wrist: self.wrist_l,
        }
    }

    pub fn right_arm(&self) -> ArmChain {
        ArmChain {
            hip: self.hip_r,
            shoulder: self.shoulder_r,
            elbow: self.elbow_r,
            wrist: self.wrist_r,
        }
    }
}

/// Output of the pose estimator for one frame: zero or one pose.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoseResult {
    /// Detected pose, if any
    pub pose: Option<Pose>,
    /// Capture timestamp reported by the tracker (milliseconds)
    pub timestamp_ms: Option<u64>,
}

impl PoseResult {
    /// A frame with no detection
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_pose(pose: Pose) -> Self {
        Self {
            pose: Some(pose),
            timestamp_ms: None,
        }
    }

    pub fn is_detected(&self) -> bool {
        self.pose.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_landmarks() -> HashMap<String, [f32; 3]> {
        Joint::ALL
            .iter()
            .enumerate()
            .map(|(i, j)| (j.landmark_name().to_string(), [i as f32, 0.0, 0.0]))
            .collect()
    }

    #[test]
    fn test_from_landmarks() {
        let pose = Pose::from_landmarks(&full_landmarks()).unwrap();
        for (i, joint) in Joint::ALL.iter().enumerate() {
            assert_eq!(pose.joint(*joint), Vec3::new(i as f32, 0.0, 0.0));
        }
        assert_eq!(pose.left_arm().wrist, pose.wrist_l);
        assert_eq!(pose.right_arm().hip, pose.hip_r);
    }

    #[test]
    fn test_missing_joint_yields_none() {
        let mut landmarks = full_landmarks();
        landmarks.remove("rightElbow");
        assert!(Pose::from_landmarks(&landmarks).is_none());
    }

    #[test]
    fn test_extra_landmarks_ignored() {
        let mut landmarks = full_landmarks();
        landmarks.insert("nose".to_string(), [9.0, 9.0, 9.0]);
        assert!(Pose::from_landmarks(&landmarks).is_some());
    }

    #[test]
    fn test_empty_result() {
        let result = PoseResult::empty();
        assert!(!result.is_detected());
        assert!(result.timestamp_ms.is_none());
    }
}
