//! Headless scene backend.
//!
//! Loads glTF/GLB containers with the `gltf` crate and keeps a flat record of
//! their nodes so the binding can find, move and toggle them. No GPU work is
//! done; `render` just counts frames. Useful for running the stage without a
//! window and for integration tests.

use glam::Vec3;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::SceneError;
use crate::pose::PoseResult;

use super::{
    AssetHandle, DisplayMode, LightId, LightSpec, NodeId, OutfitParams, OutfitPlugin, SceneBackend,
};

/// A node loaded from an asset container
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessNode {
    pub asset: AssetHandle,
    pub name: Option<String>,
    pub position: Vec3,
    pub enabled: bool,
}

/// A loaded asset container
#[derive(Debug, Clone)]
pub struct HeadlessAsset {
    pub path: PathBuf,
    pub nodes: Vec<NodeId>,
    pub mesh_count: usize,
    pub attached: bool,
}

/// Placeholder render target
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    pub width: u32,
    pub height: u32,
    /// Frames drawn into this surface
    pub frames_presented: u64,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frames_presented: 0,
        }
    }
}

/// In-memory scene graph
#[derive(Debug, Default)]
pub struct HeadlessScene {
    next_id: u64,
    assets: HashMap<AssetHandle, HeadlessAsset>,
    nodes: HashMap<NodeId, HeadlessNode>,
    lights: Vec<(LightId, LightSpec)>,
    /// Environment map path and size in bytes
    environment: Option<(PathBuf, usize)>,
    view: (DisplayMode, bool),
    frames: u64,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn asset(&self, handle: AssetHandle) -> Option<&HeadlessAsset> {
        self.assets.get(&handle)
    }

    pub fn node(&self, node: NodeId) -> Option<&HeadlessNode> {
        self.nodes.get(&node)
    }

    /// Number of assets currently attached to the scene
    pub fn attached_count(&self) -> usize {
        self.assets.values().filter(|a| a.attached).count()
    }

    pub fn lights(&self) -> &[(LightId, LightSpec)] {
        &self.lights
    }

    pub fn environment(&self) -> Option<(&Path, usize)> {
        self.environment
            .as_ref()
            .map(|(path, size)| (path.as_path(), *size))
    }

    pub fn view(&self) -> (DisplayMode, bool) {
        self.view
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// Node names, translations and mesh count of a glTF container.
fn read_gltf(path: &Path) -> Result<(Vec<(Option<String>, Vec3)>, usize), String> {
    let (document, _buffers, _images) =
        gltf::import(path).map_err(|e| format!("Failed to load glTF: {}", e))?;

    let nodes = document
        .nodes()
        .map(|node| {
            let (translation, _rotation, _scale) = node.transform().decomposed();
            (node.name().map(str::to_string), Vec3::from(translation))
        })
        .collect();

    Ok((nodes, document.meshes().count()))
}

impl SceneBackend for HeadlessScene {
    type Surface = HeadlessSurface;

    fn configure_view(&mut self, mode: DisplayMode, mirror: bool) {
        self.view = (mode, mirror);
    }

    async fn load_asset(&mut self, path: &Path) -> Result<AssetHandle, SceneError> {
        let owned = path.to_path_buf();
        let loaded = tokio::task::spawn_blocking(move || read_gltf(&owned))
            .await
            .map_err(|e| SceneError::AssetLoad {
                path: path.display().to_string(),
                message: format!("Loader task failed: {}", e),
            })?;

        let (gltf_nodes, mesh_count) = loaded.map_err(|message| SceneError::AssetLoad {
            path: path.display().to_string(),
            message,
        })?;

        let handle = AssetHandle(self.next_id());
        let mut node_ids = Vec::with_capacity(gltf_nodes.len());
        for (name, position) in gltf_nodes {
            let id = NodeId(self.next_id());
            self.nodes.insert(
                id,
                HeadlessNode {
                    asset: handle,
                    name,
                    position,
                    enabled: true,
                },
            );
            node_ids.push(id);
        }

        tracing::debug!(
            "Loaded {} ({} nodes, {} meshes)",
            path.display(),
            node_ids.len(),
            mesh_count
        );

        self.assets.insert(
            handle,
            HeadlessAsset {
                path: path.to_path_buf(),
                nodes: node_ids,
                mesh_count,
                attached: false,
            },
        );

        Ok(handle)
    }

    fn add_to_scene(&mut self, asset: AssetHandle) -> Result<(), SceneError> {
        let entry = self
            .assets
            .get_mut(&asset)
            .ok_or(SceneError::UnknownAsset(asset.0))?;
        entry.attached = true;
        Ok(())
    }

    fn dispose(&mut self, asset: AssetHandle) {
        match self.assets.remove(&asset) {
            Some(entry) => {
                for node in entry.nodes {
                    self.nodes.remove(&node);
                }
                tracing::debug!("Disposed {}", entry.path.display());
            }
            None => tracing::warn!("Dispose of unknown asset {}", asset.0),
        }
    }

    fn find_node(&self, asset: AssetHandle, id: &str) -> Option<NodeId> {
        self.assets.get(&asset)?.nodes.iter().copied().find(|node| {
            self.nodes
                .get(node)
                .and_then(|n| n.name.as_deref())
                .is_some_and(|name| name == id)
        })
    }

    fn set_position(&mut self, node: NodeId, position: Vec3) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.position = position;
        }
    }

    fn set_enabled(&mut self, node: NodeId, enabled: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.enabled = enabled;
        }
    }

    fn add_light(&mut self, light: LightSpec) -> LightId {
        let id = LightId(self.next_id());
        self.lights.push((id, light));
        id
    }

    async fn set_environment(&mut self, path: &Path) -> Result<(), SceneError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| SceneError::Environment {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        tracing::debug!("Environment {} ({} bytes)", path.display(), bytes.len());
        self.environment = Some((path.to_path_buf(), bytes.len()));
        Ok(())
    }

    fn render(&mut self, surface: &mut HeadlessSurface) {
        self.frames += 1;
        surface.frames_presented += 1;
    }
}

/// Outfit plugin stand-in that records what it was asked to do.
#[derive(Debug, Default)]
pub struct HeadlessOutfit {
    bound: Option<(AssetHandle, OutfitParams)>,
    frames: u64,
    detected_frames: u64,
}

impl HeadlessOutfit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound(&self) -> Option<&(AssetHandle, OutfitParams)> {
        self.bound.as_ref()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames that carried a detected pose
    pub fn detected_frames(&self) -> u64 {
        self.detected_frames
    }
}

impl OutfitPlugin for HeadlessOutfit {
    fn bind(&mut self, avatar: AssetHandle, params: &OutfitParams) {
        tracing::debug!("Outfit bound to asset {} ({} params)", avatar.0, params.len());
        self.bound = Some((avatar, params.clone()));
    }

    fn update(&mut self, result: &PoseResult) {
        self.frames += 1;
        if result.is_detected() {
            self.detected_frames += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LightingConfig;
    use crate::gesture::Thresholds;
    use crate::pose::Pose;
    use crate::scene::{SceneBinding, StageOptions};
    use tempfile::TempDir;

    const TEXT_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0, 1] } ],
        "nodes": [
            { "name": "text", "translation": [0.0, 1.5, 0.0] },
            { "name": "frame" }
        ]
    }"#;

    const AVATAR_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [ { "name": "Armature" } ]
    }"#;

    fn write_assets() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("text.gltf"), TEXT_GLTF).unwrap();
        std::fs::write(dir.path().join("onesie.gltf"), AVATAR_GLTF).unwrap();
        std::fs::write(dir.path().join("suit.gltf"), AVATAR_GLTF).unwrap();
        std::fs::write(dir.path().join("environment.env"), [0u8; 16]).unwrap();
        dir
    }

    fn options(dir: &Path) -> StageOptions {
        StageOptions {
            display_mode: DisplayMode::Fit,
            mirror: false,
            model_path: dir.join("onesie.gltf"),
            text_marker_path: dir.join("text.gltf"),
            environment_path: dir.join("environment.env"),
            marker_node: "text".to_string(),
            thresholds: Thresholds::default(),
            lighting: LightingConfig::default(),
            outfit: OutfitParams::new(),
        }
    }

    #[tokio::test]
    async fn test_load_and_find_node() {
        let dir = write_assets();
        let mut scene = HeadlessScene::new();

        let handle = scene.load_asset(&dir.path().join("text.gltf")).await.unwrap();
        assert_eq!(scene.asset(handle).unwrap().nodes.len(), 2);
        assert_eq!(scene.attached_count(), 0);

        scene.add_to_scene(handle).unwrap();
        assert_eq!(scene.attached_count(), 1);

        let node = scene.find_node(handle, "text").unwrap();
        assert_eq!(scene.node(node).unwrap().position, Vec3::new(0.0, 1.5, 0.0));
        assert!(scene.find_node(handle, "missing").is_none());

        scene.dispose(handle);
        assert!(scene.asset(handle).is_none());
        assert!(scene.node(node).is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_load_error() {
        let dir = TempDir::new().unwrap();
        let mut scene = HeadlessScene::new();

        let err = scene
            .load_asset(&dir.path().join("nope.glb"))
            .await
            .unwrap_err();
        assert!(matches!(err, SceneError::AssetLoad { .. }));

        let err = scene
            .set_environment(&dir.path().join("nope.env"))
            .await
            .unwrap_err();
        assert!(matches!(err, SceneError::Environment { .. }));
    }

    #[tokio::test]
    async fn test_binding_over_headless_scene() {
        let dir = write_assets();
        let mut binding =
            SceneBinding::new(HeadlessScene::new(), HeadlessOutfit::new(), options(dir.path()));
        binding.setup().await.unwrap();

        let scene = binding.backend();
        assert_eq!(scene.environment().map(|(_, size)| size), Some(16));
        assert_eq!(scene.lights().len(), 2);
        assert_eq!(scene.attached_count(), 2);

        let marker = binding.marker().unwrap();
        assert!(!binding.backend().node(marker).unwrap().enabled);

        let pose = Pose {
            hip_l: Vec3::new(0.2, 0.9, 0.0),
            hip_r: Vec3::new(-0.2, 0.9, 0.0),
            shoulder_l: Vec3::new(0.2, 1.4, 0.0),
            shoulder_r: Vec3::new(-0.2, 1.4, 0.0),
            elbow_l: Vec3::new(0.2, 1.7, 0.0),
            elbow_r: Vec3::new(-0.2, 1.7, 0.0),
            wrist_l: Vec3::new(0.2, 2.0, 0.0),
            wrist_r: Vec3::new(-0.2, 2.0, 0.0),
        };

        let mut surface = HeadlessSurface::new(640, 480);
        binding.update(&PoseResult::with_pose(pose), &mut surface);
        binding.update(&PoseResult::empty(), &mut surface);
        binding.update(&PoseResult::with_pose(pose), &mut surface);

        let node = binding.backend().node(marker).unwrap();
        assert!(node.enabled);
        assert_eq!(node.position, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(surface.frames_presented, 3);
        assert_eq!(binding.backend().frames(), 3);
        assert_eq!(binding.outfit_plugin().frames(), 3);
        assert_eq!(binding.outfit_plugin().detected_frames(), 2);

        let first = binding.avatar().unwrap();
        binding.set_model(dir.path().join("suit.gltf")).await.unwrap();
        assert!(binding.backend().asset(first).is_none());
        assert_eq!(binding.backend().attached_count(), 2);
        assert_eq!(
            binding.outfit_plugin().bound().map(|(avatar, _)| *avatar),
            binding.avatar()
        );
    }
}
