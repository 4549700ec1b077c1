//! Configuration parsing and management for posestage

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, StageError};
use crate::gesture::Thresholds;
use crate::scene::{DisplayMode, OutfitParams};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub assets: AssetsConfig,
    pub gesture: GestureConfig,
    pub lighting: LightingConfig,
    pub outfit: OutfitParams,
    pub tracking: TrackingConfig,
    pub render: RenderConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StageError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> Result<Self, StageError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, StageError> {
        let paths = [
            PathBuf::from("posestage.toml"),
            PathBuf::from("config/posestage.toml"),
            dirs_path().join("config.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), StageError> {
        let on = self.gesture.on_threshold;
        let off = self.gesture.off_threshold;

        if !(0.0..=1.0).contains(&on) || !(0.0..=1.0).contains(&off) {
            return Err(ConfigError::InvalidValue {
                field: "gesture".to_string(),
                message: "Thresholds must be cosines between 0.0 and 1.0".to_string(),
            }
            .into());
        }

        if off >= on {
            return Err(ConfigError::InvalidValue {
                field: "gesture.off_threshold".to_string(),
                message: format!(
                    "Off threshold ({}) must be below on threshold ({})",
                    off, on
                ),
            }
            .into());
        }

        if self.gesture.marker_node.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "gesture.marker_node".to_string(),
                message: "Marker node id must not be empty".to_string(),
            }
            .into());
        }

        if self.assets.model.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "assets.model".to_string(),
                message: "Model path must not be empty".to_string(),
            }
            .into());
        }

        if self.render.fps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "render.fps".to_string(),
                message: "Frame rate must be greater than 0".to_string(),
            }
            .into());
        }

        if self.tracking.enabled && self.tracking.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tracking.port".to_string(),
                message: "Port must be greater than 0".to_string(),
            }
            .into());
        }

        if self.tracking.auto_launch && !Path::new(&self.tracking.tracker_script).exists() {
            tracing::warn!(
                "Tracker auto_launch enabled but script not found at: {}",
                self.tracking.tracker_script
            );
        }

        Ok(())
    }
}

/// Viewport presentation options, forwarded to the renderer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// How the camera frame is fitted into the container: "fit" or "crop"
    pub mode: DisplayMode,
    /// Mirror the output horizontally (selfie view)
    pub mirror: bool,
}

/// Asset locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory relative paths are resolved against
    pub dir: PathBuf,
    /// Avatar model
    pub model: PathBuf,
    /// Floating text marker shown when hands are up
    pub text_marker: PathBuf,
    /// Prefiltered environment map
    pub environment: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./assets"),
            model: PathBuf::from("onesie.glb"),
            text_marker: PathBuf::from("text.glb"),
            environment: PathBuf::from("environment.env"),
        }
    }
}

/// Hands-up gesture tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Cosine the weakest limb alignment must exceed to raise the marker
    pub on_threshold: f32,
    /// Cosine the weakest limb alignment must drop below to hide the marker
    pub off_threshold: f32,
    /// Node id of the marker inside the text asset
    pub marker_node: String,
}

impl GestureConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            on: self.on_threshold,
            off: self.off_threshold,
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        let thresholds = Thresholds::default();
        Self {
            on_threshold: thresholds.on,
            off_threshold: thresholds.off,
            marker_node: "text".to_string(),
        }
    }
}

/// Scene lighting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Ambient hemispheric light intensity
    pub hemispheric_intensity: f32,
    /// Key light intensity
    pub directional_intensity: f32,
    /// Key light direction (points from the light toward the scene)
    pub directional_direction: [f32; 3],
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            hemispheric_intensity: 0.7,
            directional_intensity: 1.0,
            directional_direction: [0.0, -1.0, 1.0],
        }
    }
}

/// Pose tracker input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Enable the pose receiver
    pub enabled: bool,
    /// Listen address for the UDP socket
    pub listen_address: String,
    /// UDP port to receive pose packets on
    pub port: u16,
    /// Auto-launch the tracker subprocess
    pub auto_launch: bool,
    /// Path to the tracker script
    pub tracker_script: String,
    /// Camera device index passed to the tracker
    pub camera_device: u32,
    /// Auto-restart subprocess on crash
    pub auto_restart: bool,
    /// Delay before restarting crashed subprocess (seconds)
    pub restart_delay_secs: u64,
    /// A pose older than this is treated as "no detection" (milliseconds)
    pub stale_after_ms: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_address: "127.0.0.1".to_string(),
            port: 12346,
            auto_launch: false,
            tracker_script: "scripts/pose_tracker.py".to_string(),
            camera_device: 0,
            auto_restart: true,
            restart_delay_secs: 3,
            stale_after_ms: 500,
        }
    }
}

/// Frame loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Target frames per second of the update loop
    pub fps: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { fps: 30 }
    }
}

/// Get the platform-specific configuration directory
fn dirs_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir).join("posestage");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/posestage");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Application Support/posestage");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("posestage");
        }
    }

    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.assets.model, PathBuf::from("onesie.glb"));
        assert_eq!(config.assets.text_marker, PathBuf::from("text.glb"));
        assert_eq!(config.assets.environment, PathBuf::from("environment.env"));
        assert_eq!(config.display.mode, DisplayMode::Fit);
        assert!(!config.display.mirror);
        assert_eq!(config.gesture.on_threshold, 0.8);
        assert_eq!(config.gesture.off_threshold, 0.7);
        assert!(config.outfit.is_empty());
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut config = Config::default();
        config.gesture.on_threshold = 0.6;
        config.gesture.off_threshold = 0.7;
        assert!(config.validate().is_err());

        config.gesture.on_threshold = 0.7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_fps_rejected() {
        let mut config = Config::default();
        config.render.fps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [display]
            mode = "crop"
            mirror = true

            [assets]
            model = "suit.glb"

            [gesture]
            on_threshold = 0.9

            [outfit]
            top = "hoodie"
            layers = 2
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.display.mode, DisplayMode::Crop);
        assert!(config.display.mirror);
        assert_eq!(config.assets.model, PathBuf::from("suit.glb"));
        assert_eq!(config.assets.text_marker, PathBuf::from("text.glb"));
        assert_eq!(config.gesture.on_threshold, 0.9);
        assert_eq!(config.gesture.off_threshold, 0.7);
        assert_eq!(config.outfit.get("top"), Some(&serde_json::json!("hoodie")));
        assert_eq!(config.outfit.get("layers"), Some(&serde_json::json!(2)));
    }

    #[test]
    fn test_bundled_config_matches_defaults() {
        let config = Config::from_str(include_str!("../config/posestage.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.assets.model, AssetsConfig::default().model);
        assert_eq!(config.tracking.port, TrackingConfig::default().port);
        assert_eq!(config.gesture.thresholds(), Thresholds::default());
    }

    #[test]
    fn test_parse_invalid_mode() {
        let toml = r#"
            [display]
            mode = "stretch"
        "#;
        assert!(Config::from_str(toml).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("posestage.toml");
        std::fs::write(&path, "[render]\nfps = 60\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.render.fps, 60);

        let missing = Config::from_file(dir.path().join("missing.toml"));
        assert!(matches!(
            missing,
            Err(StageError::Config(ConfigError::ReadFile(_)))
        ));
    }
}
