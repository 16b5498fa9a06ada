//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Placement of the tiled region.
    pub surface: SurfaceConfig,
    /// LOD selection policy.
    pub lod: LodConfig,
    /// Camera the views are derived from.
    pub camera: CameraConfig,
    /// Patches inserted in order; later entries win where they overlap.
    pub patches: Vec<PatchConfig>,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Tiled region placement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SurfaceConfig {
    /// World location; XY is snapped to the tile grid.
    pub location: [f32; 3],
    /// Leaf tile size in world units.
    pub tile_size: f32,
    /// Half-size of the region in tiles, per axis.
    pub extent_in_tiles: [i32; 2],
    /// Prune redundant nodes after building.
    pub prune: bool,
    /// Invisible surfaces build an empty tree.
    pub visible: bool,
}

/// LOD selection policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LodConfig {
    /// Multiplier on every LOD distance band (higher = finer tiles further out).
    pub lod_scale: f32,
    /// Incomplete homogeneous subtrees collapse above this density level.
    pub force_collapse_density_level: i32,
    /// Density buckets per material.
    pub density_count: u32,
    /// Enable LOD morphing between density buckets.
    pub morphing: bool,
    /// Finest LOD level the distance pass stops at.
    pub lowest_lod: u32,
    /// Morph height for tiles at `lowest_lod`.
    pub height_morph: f32,
}

/// Perspective camera.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Eye position of the first view.
    pub position: [f32; 3],
    /// Point every view looks at.
    pub target: [f32; 3],
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    /// Width over height.
    pub aspect: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
    /// Number of views traversed in parallel, spread around the target.
    pub view_count: u32,
}

/// One surface patch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatchConfig {
    /// Minimum corner (X, Y, Z).
    pub min: [f32; 3],
    /// Maximum corner (X, Y, Z).
    pub max: [f32; 3],
    /// Material name. Patches sharing a name share a material; `None` makes
    /// the patch invisible.
    pub material: Option<String>,
    /// Height the patch's tiles are drawn at.
    pub base_height: f32,
    /// Highlighted in the selection outline.
    pub selected: bool,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for Config {
    fn default() -> Self {
        Self {
            surface: SurfaceConfig::default(),
            lod: LodConfig::default(),
            camera: CameraConfig::default(),
            patches: vec![
                PatchConfig {
                    min: [-4800.0, -4800.0, 0.0],
                    max: [4800.0, 4800.0, 0.0],
                    material: Some("water".to_string()),
                    base_height: 0.0,
                    selected: false,
                },
                PatchConfig {
                    min: [-800.0, -600.0, 0.0],
                    max: [900.0, 700.0, 40.0],
                    material: Some("sand".to_string()),
                    base_height: 20.0,
                    selected: false,
                },
            ],
            debug: DebugConfig::default(),
        }
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            location: [0.0, 0.0, 0.0],
            tile_size: 100.0,
            extent_in_tiles: [64, 64],
            prune: true,
            visible: true,
        }
    }
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            lod_scale: 1.0,
            force_collapse_density_level: 0,
            density_count: 3,
            morphing: true,
            lowest_lod: 0,
            height_morph: 0.0,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, -2000.0, 800.0],
            target: [0.0, 0.0, 0.0],
            fov_deg: 60.0,
            aspect: 16.0 / 9.0,
            near: 1.0,
            far: 100_000.0,
            view_count: 1,
        }
    }
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            min: [0.0; 3],
            max: [0.0; 3],
            material: None,
            base_height: 0.0,
            selected: false,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(false)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
