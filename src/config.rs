//! Application configuration, stored as RON
//!
//! Every field has a default, so a config file only needs the values it
//! changes. A missing file means "all defaults".

use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::rasterizer::{CameraSettings, LightingSettings, RasterSettings, HEIGHT, WIDTH};

/// Texture set for one material name (matches `usemtl` in the mesh)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    pub name: String,
    pub diffuse: Option<PathBuf>,
    pub normal: Option<PathBuf>,
    pub specular: Option<PathBuf>,
}

/// Input rates for the interactive viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    /// Camera rotation per pixel of mouse travel (before camera sensitivity)
    pub mouse_sensitivity: f32,
    /// Radians per second
    pub model_rotation_speed: f32,
    /// World units per second
    pub model_move_speed: f32,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 0.05,
            model_rotation_speed: 2.0,
            model_move_speed: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub width: usize,
    pub height: usize,
    /// Mesh to load; the built-in cube when absent
    pub model: Option<PathBuf>,
    /// Dimensions of headerless `.raw` textures
    pub raw_texture_size: (usize, usize),
    pub materials: Vec<MaterialConfig>,
    pub camera: CameraSettings,
    pub lighting: LightingSettings,
    pub raster: RasterSettings,
    pub controls: ControlSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            model: None,
            raw_texture_size: (2048, 2048),
            materials: Vec::new(),
            camera: CameraSettings::default(),
            lighting: LightingSettings::default(),
            raster: RasterSettings::default(),
            controls: ControlSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load `path` if it exists, otherwise fall back to defaults.
    /// A file that exists but fails to parse is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            load_config(path)
        } else {
            info!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Reject values the renderer cannot work with: broken camera bounds and
    /// buffer sizes that overflow
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.camera.validate().map_err(ConfigError::Invalid)?;

        if self.width.checked_mul(self.height).is_none() {
            return Err(ConfigError::Invalid(format!(
                "framebuffer {}x{} is too large",
                self.width, self.height
            )));
        }

        let (w, h) = self.raw_texture_size;
        if w == 0 || h == 0 || w.checked_mul(h).and_then(|n| n.checked_mul(3)).is_none() {
            return Err(ConfigError::Invalid(format!("raw_texture_size {}x{} is not usable", w, h)));
        }
        Ok(())
    }

    /// Texture paths configured for a mesh material: by name, then by position
    pub fn material_for(&self, name: &str, index: usize) -> Option<&MaterialConfig> {
        self.materials
            .iter()
            .find(|m| m.name == name)
            .or_else(|| self.materials.get(index))
    }
}

/// Load a config from a RON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    load_config_from_str(&contents)
}

/// Parse and validate a config from a RON string
pub fn load_config_from_str(s: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = ron::from_str(s)?;
    config.validate()?;
    Ok(config)
}

/// Write a config as pretty RON
pub fn save_config<P: AsRef<Path>>(config: &AppConfig, path: P) -> Result<(), ConfigError> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(3)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    Ok(())
}
