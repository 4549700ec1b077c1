//! Pose tracking input
//!
//! The pose estimator runs out of process and streams body landmarks as
//! JSON over UDP:
//! - `receiver`: socket + packet parsing into `PoseResult`
//! - `subprocess`: optional launcher for the tracker script

pub mod receiver;
pub mod subprocess;

pub use receiver::{PosePacket, PoseReceiver};
pub use subprocess::{RestartStatus, TrackerProcess};
