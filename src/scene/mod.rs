//! Scene integration
//!
//! The renderer is an injected collaborator. This module defines the
//! capability surface the binding needs from it, plus:
//! - Asset path resolution
//! - A headless glTF-backed implementation
//! - `SceneBinding`, the per-frame adapter driving the hands-up marker

pub mod assets;
pub mod binding;
pub mod headless;

pub use assets::AssetPaths;
pub use binding::{SceneBinding, StageOptions};
pub use headless::{HeadlessOutfit, HeadlessScene, HeadlessSurface};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::SceneError;
use crate::pose::PoseResult;

/// Handle to a loaded asset container (model, text marker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetHandle(pub u64);

/// Handle to a single node inside the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Handle to a light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightId(pub u64);

/// How the camera frame is fitted into the output container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Letterbox the whole frame inside the container
    #[default]
    Fit,
    /// Fill the container, cropping the overflow
    Crop,
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayMode::Fit => write!(f, "fit"),
            DisplayMode::Crop => write!(f, "crop"),
        }
    }
}

impl std::str::FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fit" => Ok(Self::Fit),
            "crop" => Ok(Self::Crop),
            other => Err(format!("unknown display mode '{}' (expected fit or crop)", other)),
        }
    }
}

/// Light description handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightSpec {
    /// Sky/ground ambient light
    Hemispheric { intensity: f32, up: Vec3 },
    /// Key light
    Directional { intensity: f32, direction: Vec3 },
}

/// Outfit parameters. Opaque here, interpreted by the outfit plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutfitParams(BTreeMap<String, serde_json::Value>);

impl OutfitParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.0.insert(key.into(), value);
    }

    pub fn with(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.insert(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Capabilities the binding needs from a renderer.
///
/// Calls are expected from one task; nothing here is synchronized.
#[allow(async_fn_in_trait)]
pub trait SceneBackend {
    /// Render target, forwarded untouched to `render`
    type Surface;

    /// Apply display mode and mirroring to the viewport
    fn configure_view(&mut self, mode: DisplayMode, mirror: bool);

    /// Load an asset container from disk. Not yet attached to the scene.
    async fn load_asset(&mut self, path: &Path) -> Result<AssetHandle, SceneError>;

    /// Attach a loaded asset to the scene
    fn add_to_scene(&mut self, asset: AssetHandle) -> Result<(), SceneError>;

    /// Detach and release an asset and all its nodes
    fn dispose(&mut self, asset: AssetHandle);

    /// Look up a node by id inside an asset
    fn find_node(&self, asset: AssetHandle, id: &str) -> Option<NodeId>;

    fn set_position(&mut self, node: NodeId, position: Vec3);

    fn set_enabled(&mut self, node: NodeId, enabled: bool);

    fn add_light(&mut self, light: LightSpec) -> LightId;

    /// Load and apply an environment map
    async fn set_environment(&mut self, path: &Path) -> Result<(), SceneError>;

    /// Draw one frame
    fn render(&mut self, surface: &mut Self::Surface);
}

/// Binds outfit meshes onto the avatar and follows the pose.
pub trait OutfitPlugin {
    /// (Re)bind the outfit to an avatar
    fn bind(&mut self, avatar: AssetHandle, params: &OutfitParams);

    /// Per-frame pose update
    fn update(&mut self, result: &PoseResult);
}
