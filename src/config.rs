use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Client-side tuning for the GMAP subsystem.
///
/// All fields have workable defaults; a config file is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Grid width assumed until a map descriptor declares the real one.
    pub default_grid_width: i32,
    /// Grid height assumed until a map descriptor declares the real one.
    pub default_grid_height: i32,
    /// Parsed descriptors kept around per session.
    pub descriptor_cache_capacity: usize,
    /// When set, the embedding client should pass this to
    /// `telemetry::logging::init` to get log files.
    pub log_root: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            default_grid_width: 3,
            default_grid_height: 3,
            descriptor_cache_capacity: 8,
            log_root: None,
        }
    }
}

impl ClientConfig {
    pub fn from_yaml(bytes: &[u8]) -> Result<Self, String> {
        let config: ClientConfig = serde_yaml::from_slice(bytes)
            .map_err(|err| format!("client config parse failed: {}", err))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let bytes = std::fs::read(path)
            .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
        Self::from_yaml(&bytes)
    }

    fn validate(&self) -> Result<(), String> {
        if self.default_grid_width <= 0 || self.default_grid_height <= 0 {
            return Err(format!(
                "default grid {}x{} must be positive",
                self.default_grid_width, self.default_grid_height
            ));
        }
        if self.descriptor_cache_capacity == 0 {
            return Err("descriptor cache capacity must be at least 1".to_string());
        }
        Ok(())
    }
}
