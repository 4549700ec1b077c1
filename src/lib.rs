//! posestage - avatar scene with a hands-up marker
//!
//! Wires a pose stream into an avatar scene:
//! - Loads the avatar, lights, environment and a floating text marker
//! - Classifies a "hands up" pose per frame with hysteresis
//! - Shows the marker between the wrists while the hands are up
//! - Hot-swaps avatar models and outfit parameters
//!
//! Rendering and pose estimation stay external: the renderer is injected
//! through [`scene::SceneBackend`], poses arrive over UDP from a tracker
//! process.

pub mod config;
pub mod error;
pub mod gesture;
pub mod pose;
pub mod scene;
pub mod tracking;

pub use config::Config;
pub use error::{Result, StageError};
pub use gesture::{classify, Classification, HandsUpDetector, Thresholds};
pub use pose::{Joint, Pose, PoseResult};
pub use scene::{SceneBinding, StageOptions};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
