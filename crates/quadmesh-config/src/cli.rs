//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// quadmesh command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "quadmesh", about = "Quadtree surface LOD selection")]
pub struct CliArgs {
    /// Leaf tile size in world units.
    #[arg(long)]
    pub tile_size: Option<f32>,

    /// Region half-size in tiles, applied to both axes.
    #[arg(long)]
    pub extent: Option<i32>,

    /// LOD distance multiplier.
    #[arg(long)]
    pub lod_scale: Option<f32>,

    /// Camera position as three numbers: X Y Z.
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    pub observer: Option<Vec<f32>>,

    /// Number of views traversed in parallel.
    #[arg(long)]
    pub views: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(tile_size) = args.tile_size {
            self.surface.tile_size = tile_size;
        }
        if let Some(extent) = args.extent {
            self.surface.extent_in_tiles = [extent, extent];
        }
        if let Some(scale) = args.lod_scale {
            self.lod.lod_scale = scale;
        }
        if let Some([x, y, z]) = args.observer.as_deref() {
            self.camera.position = [*x, *y, *z];
        }
        if let Some(views) = args.views {
            self.camera.view_count = views;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
