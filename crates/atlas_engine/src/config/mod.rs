//! Engine configuration
//!
//! All tunables the renderer and run loop consume: window extent, asset root,
//! shader identifiers, frames in flight, and the frame fence timeout.
//! Configurations are serializable (TOML) and validated at startup; a missing
//! shader file is a fatal configuration error, not a soft warning.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a configuration file
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a configuration file
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A setting failed validation
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// A configured asset does not exist on disk
    #[error("missing asset: {}", .0.display())]
    MissingAsset(PathBuf),
}

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Application name, used for the window title and Vulkan instance
    pub app_name: String,
    /// Initial window width in pixels
    pub window_width: u32,
    /// Initial window height in pixels
    pub window_height: u32,
    /// Root directory all asset identifiers are resolved under
    pub asset_root: PathBuf,
    /// Vertex shader SPIR-V, relative to `asset_root`
    pub vertex_shader: String,
    /// Fragment shader SPIR-V, relative to `asset_root`
    pub fragment_shader: String,
    /// Number of frames the CPU may record ahead of the GPU
    pub frames_in_flight: usize,
    /// Timeout for the per-frame fence wait, in nanoseconds
    pub fence_timeout_ns: u64,
    /// Enable Vulkan validation layers; `None` auto-detects from build type
    pub enable_validation: Option<bool>,
    /// Camera movement speed in units per second
    pub camera_speed: f32,
    /// Mouse look sensitivity in degrees per pixel
    pub mouse_sensitivity: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_name: "Atlas".to_string(),
            window_width: 1700,
            window_height: 900,
            asset_root: PathBuf::from("assets"),
            vertex_shader: "shaders/tri_mesh.vert.spv".to_string(),
            fragment_shader: "shaders/default.frag.spv".to_string(),
            frames_in_flight: 2,
            fence_timeout_ns: 1_000_000_000,
            enable_validation: None,
            camera_speed: 5.0,
            mouse_sensitivity: 0.1,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        config.validate_settings()?;
        Ok(config)
    }

    /// Resolve an asset identifier against the configured root
    pub fn asset_path(&self, relative: &str) -> PathBuf {
        self.asset_root.join(relative)
    }

    /// Whether validation layers should be enabled
    pub fn validation_enabled(&self) -> bool {
        self.enable_validation.unwrap_or(cfg!(debug_assertions))
    }

    /// Validate settings that do not require filesystem access
    pub fn validate_settings(&self) -> Result<(), ConfigError> {
        if self.app_name.is_empty() {
            return Err(ConfigError::Invalid("app name cannot be empty".into()));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(ConfigError::Invalid("window extent must be non-zero".into()));
        }
        if self.frames_in_flight == 0 {
            return Err(ConfigError::Invalid("frames in flight must be at least 1".into()));
        }
        if self.frames_in_flight > 8 {
            return Err(ConfigError::Invalid("frames in flight must not exceed 8".into()));
        }
        if self.fence_timeout_ns == 0 {
            return Err(ConfigError::Invalid("fence timeout must be non-zero".into()));
        }
        Ok(())
    }

    /// Validate that all configured assets exist on disk.
    ///
    /// Called once at startup; a missing shader is fatal here rather than a
    /// logged warning at pipeline-build time.
    pub fn validate_assets(&self) -> Result<(), ConfigError> {
        for shader in [&self.vertex_shader, &self.fragment_shader] {
            let path = self.asset_path(shader);
            if !path.exists() {
                return Err(ConfigError::MissingAsset(path));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate_settings().is_ok());
        assert_eq!(config.frames_in_flight, 2);
        assert_eq!(config.window_width, 1700);
        assert_eq!(config.window_height, 900);
    }

    #[test]
    fn zero_frames_in_flight_is_rejected() {
        let config = EngineConfig {
            frames_in_flight: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate_settings(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_extent_is_rejected() {
        let config = EngineConfig {
            window_height: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate_settings().is_err());
    }

    #[test]
    fn config_parses_from_toml() {
        let text = r#"
            app_name = "Atlas"
            window_width = 800
            window_height = 600
            asset_root = "assets"
            vertex_shader = "shaders/tri_mesh.vert.spv"
            fragment_shader = "shaders/default.frag.spv"
            frames_in_flight = 3
            fence_timeout_ns = 2000000000
            camera_speed = 2.5
            mouse_sensitivity = 0.2
        "#;
        let config: EngineConfig = toml::from_str(text).unwrap();
        assert_eq!(config.frames_in_flight, 3);
        assert_eq!(config.fence_timeout_ns, 2_000_000_000);
        assert!(config.enable_validation.is_none());
        assert_eq!(
            config.asset_path(&config.vertex_shader),
            PathBuf::from("assets/shaders/tri_mesh.vert.spv")
        );
    }

    #[test]
    fn missing_shader_is_a_fatal_config_error() {
        let config = EngineConfig {
            asset_root: PathBuf::from("/nonexistent/atlas-test-assets"),
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate_assets(), Err(ConfigError::MissingAsset(_))));
    }
}
