//! Asset path resolution

use std::path::{Path, PathBuf};

use crate::config::AssetsConfig;

/// Resolved locations of the scene assets
#[derive(Debug, Clone, PartialEq)]
pub struct AssetPaths {
    /// Base directory for relative paths
    base_dir: PathBuf,
    model: PathBuf,
    text_marker: PathBuf,
    environment: PathBuf,
}

impl AssetPaths {
    /// Resolve all asset paths from configuration
    pub fn new(config: &AssetsConfig) -> Self {
        let base_dir = if config.dir.is_absolute() {
            config.dir.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&config.dir)
        };

        Self {
            model: join_asset(&base_dir, &config.model),
            text_marker: join_asset(&base_dir, &config.text_marker),
            environment: join_asset(&base_dir, &config.environment),
            base_dir,
        }
    }

    /// Resolve an arbitrary asset path (e.g. a model chosen at runtime)
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        join_asset(&self.base_dir, path.as_ref())
    }

    pub fn model(&self) -> &Path {
        &self.model
    }

    pub fn text_marker(&self) -> &Path {
        &self.text_marker
    }

    pub fn environment(&self) -> &Path {
        &self.environment
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Log missing assets. Returns the number found.
    pub fn check(&self) -> usize {
        if !self.base_dir.exists() {
            tracing::warn!(
                "Assets directory does not exist: {}",
                self.base_dir.display()
            );
        }

        let mut found = 0;
        for (kind, path) in [
            ("model", &self.model),
            ("text marker", &self.text_marker),
            ("environment", &self.environment),
        ] {
            if path.exists() {
                tracing::debug!("Found {} asset: {}", kind, path.display());
                found += 1;
            } else {
                tracing::warn!("{} asset not found: {}", kind, path.display());
            }
        }
        found
    }
}

fn join_asset(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_assets() -> (TempDir, AssetsConfig) {
        let dir = TempDir::new().unwrap();

        std::fs::write(dir.path().join("onesie.glb"), b"fake glb data").unwrap();
        std::fs::write(dir.path().join("text.glb"), b"fake glb data").unwrap();

        let config = AssetsConfig {
            dir: dir.path().to_path_buf(),
            ..AssetsConfig::default()
        };

        (dir, config)
    }

    #[test]
    fn test_resolve_relative_paths() {
        let (dir, config) = create_test_assets();
        let paths = AssetPaths::new(&config);

        assert_eq!(paths.base_dir(), dir.path());
        assert_eq!(paths.model(), dir.path().join("onesie.glb"));
        assert_eq!(paths.text_marker(), dir.path().join("text.glb"));
        assert_eq!(paths.environment(), dir.path().join("environment.env"));
    }

    #[test]
    fn test_absolute_path_passes_through() {
        let (dir, mut config) = create_test_assets();
        let elsewhere = dir.path().join("other").join("suit.glb");
        config.model = elsewhere.clone();

        let paths = AssetPaths::new(&config);
        assert_eq!(paths.model(), elsewhere);
        assert_eq!(paths.resolve(&elsewhere), elsewhere);
        assert_eq!(paths.resolve("hat.glb"), dir.path().join("hat.glb"));
    }

    #[test]
    fn test_check_counts_present_assets() {
        let (_dir, config) = create_test_assets();
        let paths = AssetPaths::new(&config);
        // environment.env was not written
        assert_eq!(paths.check(), 2);
    }
}
