//! `quadmesh`: build a quadtree surface from `config.ron` and report the LOD
//! selection for one or more views.
//!
//! Run with: `cargo run -p quadmesh-cli -- --views 4`

mod platform;
mod scene;

use std::process::ExitCode;

use clap::Parser;
use glam::Vec2;
use quadmesh_config::{CliArgs, Config, ConfigError};
use quadmesh_surface::{QuadtreeSurface, SurfaceError, ViewState};
use quadmesh_tree::{QuadTree, TraversalOutput};
use tracing::{error, info, warn};

use crate::platform::{PlatformDirs, PlatformError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid surface settings: {0}")]
    Surface(#[from] SurfaceError),
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The subscriber may not be installed if setup failed early.
            eprintln!("quadmesh: {e}");
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<(), CliError> {
    let dirs = match &args.config {
        Some(root) => PlatformDirs::resolve_with_root(root),
        None => PlatformDirs::resolve()?,
    };
    dirs.create_dirs()?;

    let mut config = Config::load_or_create(&dirs.config_dir)?;
    config.apply_cli_overrides(args);

    quadmesh_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));
    info!("Config directory: {}", dirs.config_dir.display());
    info!(
        "Surface: tile={} extent={:?} lod_scale={} patches={}",
        config.surface.tile_size,
        config.surface.extent_in_tiles,
        config.lod.lod_scale,
        config.patches.len()
    );

    let mut surface = QuadtreeSurface::new(scene::surface_settings(&config))?;
    surface.set_patches(scene::surface_patches(&config));
    surface.update()?;

    let tree = surface.tree();
    let bounds = surface.calc_bounds();
    info!(
        "Tree: depth={} nodes={} materials={} bounds={:?}..{:?}",
        tree.tree_depth(),
        tree.node_count(),
        tree.materials().len(),
        bounds.min,
        bounds.max
    );

    let views = scene::view_states(&config.camera);
    let outputs = traverse_views(&surface, &views);
    for (index, (view, output)) in views.iter().zip(&outputs).enumerate() {
        report_view(index, view, output, &tree);
    }

    for view in &views {
        report_queries(&tree, view.view_origin.truncate());
    }
    Ok(())
}

/// Traverse every view on its own scoped thread against the same tree.
fn traverse_views(surface: &QuadtreeSurface, views: &[ViewState]) -> Vec<TraversalOutput> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = views
            .iter()
            .enumerate()
            .map(|(index, view)| {
                std::thread::Builder::new()
                    .name(format!("view-{index}"))
                    .spawn_scoped(scope, move || surface.traverse(view))
            })
            .collect();

        handles
            .into_iter()
            .zip(views)
            .map(|(handle, view)| match handle {
                Ok(handle) => handle
                    .join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload)),
                Err(e) => {
                    warn!("Could not spawn view thread, traversing inline: {e}");
                    surface.traverse(view)
                }
            })
            .collect()
    })
}

fn report_view(index: usize, view: &ViewState, output: &TraversalOutput, tree: &QuadTree) {
    let lods = output.instances.iter().map(|d| d.instance.lod_level());
    let finest = lods.clone().min().unwrap_or(0);
    let coarsest = lods.max().unwrap_or(0);
    info!(
        "View {index} at {:?}: {} instances, LOD {finest}..={coarsest}",
        view.view_origin, output.instance_count
    );

    let density_count = (output.bucket_instance_counts.len() / tree.materials().len().max(1)).max(1);
    for batch in output.batches() {
        let bucket = batch.bucket_index as usize;
        let material = tree
            .materials()
            .get(bucket / density_count)
            .map_or("?", |m| m.material().name.as_str());
        info!(
            "  bucket {bucket}: material={material} density={} instances={} first={}",
            bucket % density_count,
            batch.instance_count,
            batch.first_instance
        );
    }
}

fn report_queries(tree: &QuadTree, point: Vec2) {
    let height = tree.query_base_height(point);
    let smooth = tree.query_interpolated_base_height(point);
    let tile = tree.query_tile_bounds(point);
    if height.is_found() {
        info!(
            "Query {point}: height={} interpolated={} (found={}) tile={:?}..{:?}",
            height.value(),
            smooth.value(),
            smooth.is_found(),
            tile.value().min,
            tile.value().max
        );
    } else {
        info!("Query {point}: no surface under observer");
    }
}
