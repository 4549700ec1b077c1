//! Per-frame adapter between the pose stream, the hands-up classifier and
//! the scene.
//!
//! The binding owns the avatar asset exclusively. A swap loads and attaches
//! the new avatar before the old one is disposed, so a failed load leaves
//! the previous avatar in place.

use glam::Vec3;
use std::path::{Path, PathBuf};

use crate::config::{Config, LightingConfig};
use crate::error::Result;
use crate::gesture::{Classification, HandsUpDetector, Thresholds};
use crate::pose::PoseResult;

use super::{
    AssetHandle, AssetPaths, DisplayMode, LightId, LightSpec, NodeId, OutfitParams, OutfitPlugin,
    SceneBackend,
};

/// Construction options for a `SceneBinding`
#[derive(Debug, Clone)]
pub struct StageOptions {
    pub display_mode: DisplayMode,
    pub mirror: bool,
    pub model_path: PathBuf,
    pub text_marker_path: PathBuf,
    pub environment_path: PathBuf,
    /// Node id of the marker inside the text asset
    pub marker_node: String,
    pub thresholds: Thresholds,
    pub lighting: LightingConfig,
    pub outfit: OutfitParams,
}

impl StageOptions {
    /// Build options from configuration, resolving asset paths
    pub fn from_config(config: &Config) -> Self {
        let paths = AssetPaths::new(&config.assets);

        Self {
            display_mode: config.display.mode,
            mirror: config.display.mirror,
            model_path: paths.model().to_path_buf(),
            text_marker_path: paths.text_marker().to_path_buf(),
            environment_path: paths.environment().to_path_buf(),
            marker_node: config.gesture.marker_node.clone(),
            thresholds: config.gesture.thresholds(),
            lighting: config.lighting.clone(),
            outfit: config.outfit.clone(),
        }
    }
}

/// Drives the hands-up marker and owns the avatar lifecycle.
pub struct SceneBinding<B: SceneBackend, P: OutfitPlugin> {
    backend: B,
    outfit: P,
    options: StageOptions,
    detector: HandsUpDetector,
    /// Current avatar (exclusively owned)
    avatar: Option<AssetHandle>,
    avatar_path: Option<PathBuf>,
    /// Text asset containing the marker node
    text_asset: Option<AssetHandle>,
    marker: Option<NodeId>,
    lights: Vec<LightId>,
}

impl<B: SceneBackend, P: OutfitPlugin> SceneBinding<B, P> {
    /// Create a binding. Nothing is loaded until `setup` runs.
    pub fn new(backend: B, outfit: P, options: StageOptions) -> Self {
        let detector = HandsUpDetector::new(options.thresholds);

        Self {
            backend,
            outfit,
            options,
            detector,
            avatar: None,
            avatar_path: None,
            text_asset: None,
            marker: None,
            lights: Vec::new(),
        }
    }

    /// One-time scene setup: view, lights, environment, text marker, avatar.
    pub async fn setup(&mut self) -> Result<()> {
        self.backend.configure_view(self.options.display_mode, self.options.mirror);

        let lighting = &self.options.lighting;
        let hemi = self.backend.add_light(LightSpec::Hemispheric {
            intensity: lighting.hemispheric_intensity,
            up: Vec3::Y,
        });
        let key = self.backend.add_light(LightSpec::Directional {
            intensity: lighting.directional_intensity,
            direction: Vec3::from(lighting.directional_direction).normalize_or_zero(),
        });
        self.lights = vec![hemi, key];

        self.backend.set_environment(&self.options.environment_path).await?;

        let text_path = self.options.text_marker_path.clone();
        let text_asset = self.backend.load_asset(&text_path).await?;
        self.backend.add_to_scene(text_asset)?;
        self.text_asset = Some(text_asset);

        self.marker = self.backend.find_node(text_asset, &self.options.marker_node);
        match self.marker {
            Some(node) => self.backend.set_enabled(node, false),
            None => tracing::debug!(
                "Marker node '{}' not found in {}, marker updates disabled",
                self.options.marker_node,
                text_path.display()
            ),
        }

        let model_path = self.options.model_path.clone();
        self.set_model(&model_path).await?;

        tracing::info!(
            "Scene ready (mode: {}, mirror: {}, marker: {})",
            self.options.display_mode,
            self.options.mirror,
            self.marker.is_some()
        );

        Ok(())
    }

    /// Replace the avatar: load, attach, dispose the old one, swap, rebind.
    pub async fn set_model<Q: AsRef<Path>>(&mut self, path: Q) -> Result<()> {
        let path = path.as_ref();
        let new_avatar = self.backend.load_asset(path).await?;
        if let Err(e) = self.backend.add_to_scene(new_avatar) {
            self.backend.dispose(new_avatar);
            return Err(e.into());
        }

        if let Some(old) = self.avatar.replace(new_avatar) {
            self.backend.dispose(old);
        }
        self.avatar_path = Some(path.to_path_buf());

        self.outfit.bind(new_avatar, &self.options.outfit);

        tracing::info!("Avatar loaded: {}", path.display());
        Ok(())
    }

    /// Replace outfit parameters and rebind against the current avatar.
    pub fn set_outfit(&mut self, params: OutfitParams) {
        self.options.outfit = params;

        match self.avatar {
            Some(avatar) => {
                self.outfit.bind(avatar, &self.options.outfit);
                tracing::info!("Outfit rebound ({} params)", self.options.outfit.len());
            }
            None => tracing::debug!("Outfit stored, no avatar loaded yet"),
        }
    }

    /// Per-frame update: classify, move and toggle the marker, then render.
    pub fn update(&mut self, result: &PoseResult, surface: &mut B::Surface) -> Classification {
        self.outfit.update(result);

        let (classification, changed) = self.detector.update(result.pose.as_ref());

        if changed {
            tracing::info!(
                "Hands up: {} (cos_min: {:?})",
                classification.hands_up,
                classification.cos_min
            );
        }

        if let Some(marker) = self.marker {
            if let Some(position) = classification.marker_position {
                self.backend.set_position(marker, position);
            }
            self.backend.set_enabled(marker, classification.hands_up);
        }

        self.backend.render(surface);
        classification
    }

    /// Release every asset owned by the binding.
    pub fn dispose(&mut self) {
        if let Some(avatar) = self.avatar.take() {
            self.backend.dispose(avatar);
        }
        if let Some(text) = self.text_asset.take() {
            self.backend.dispose(text);
        }
        self.avatar_path = None;
        self.marker = None;
        self.detector.reset();
    }

    pub fn hands_up(&self) -> bool {
        self.detector.hands_up()
    }

    pub fn avatar(&self) -> Option<AssetHandle> {
        self.avatar
    }

    pub fn avatar_path(&self) -> Option<&Path> {
        self.avatar_path.as_deref()
    }

    pub fn marker(&self) -> Option<NodeId> {
        self.marker
    }

    pub fn lights(&self) -> &[LightId] {
        &self.lights
    }

    pub fn outfit_params(&self) -> &OutfitParams {
        &self.options.outfit
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn outfit_plugin(&self) -> &P {
        &self.outfit
    }
}
