//! The surface component: settings, patches, rebuilds and per-view traversal.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use quadmesh_math::{Aabb, Rect, grid_snap};
use quadmesh_tree::{QuadTree, QuadTreeBuilder, TraversalDesc, TraversalOutput};
use tracing::{debug, info, warn};

use crate::{SurfacePatch, SurfaceError, SurfaceSettings, ViewState};

/// Z range reported by [`QuadtreeSurface::calc_bounds`] when no patch has
/// set one.
const FALLBACK_Z_RANGE: (f32, f32) = (0.0, 100.0);

/// What a call to [`QuadtreeSurface::mark_for_rebuild`] asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RebuildRequest {
    /// Rebuild the quadtree from the current settings and patches.
    Mesh,
    /// Refresh the per-surface info texture.
    InfoTexture,
    All,
}

#[derive(Clone, Copy, Debug, Default)]
struct PendingRebuild {
    mesh: bool,
    info_texture: bool,
}

/// Owns the patch list and the current sealed tree of one surface.
///
/// Mutators only record what changed; [`update`](Self::update) applies it.
/// The tree is swapped as a whole, so an `Arc` obtained from
/// [`tree`](Self::tree) stays valid and unchanged across rebuilds.
#[derive(Debug)]
pub struct QuadtreeSurface {
    settings: SurfaceSettings,
    patches: Vec<SurfacePatch>,
    tessellated_bounds: Option<Rect>,
    tree: Arc<QuadTree>,
    pending: PendingRebuild,
    rebuild_count: u64,
}

impl QuadtreeSurface {
    /// Create a surface with no patches. The first [`update`](Self::update)
    /// builds its tree.
    pub fn new(settings: SurfaceSettings) -> Result<Self, SurfaceError> {
        settings.validate()?;
        let tree = Arc::new(build_tree(&settings, &[]));
        Ok(Self {
            settings,
            patches: Vec::new(),
            tessellated_bounds: None,
            tree,
            pending: PendingRebuild {
                mesh: true,
                info_texture: true,
            },
            rebuild_count: 0,
        })
    }

    pub fn settings(&self) -> &SurfaceSettings {
        &self.settings
    }

    pub fn patches(&self) -> &[SurfacePatch] {
        &self.patches
    }

    /// The current sealed tree.
    pub fn tree(&self) -> Arc<QuadTree> {
        Arc::clone(&self.tree)
    }

    /// Number of completed mesh rebuilds.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuild_count
    }

    pub fn needs_rebuild(&self) -> bool {
        self.pending.mesh
    }

    pub fn set_settings(&mut self, settings: SurfaceSettings) {
        self.settings = settings;
        self.mark_for_rebuild(RebuildRequest::All);
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.settings.visible != visible {
            self.settings.visible = visible;
            self.mark_for_rebuild(RebuildRequest::All);
        }
    }

    pub fn set_patches(&mut self, patches: Vec<SurfacePatch>) {
        self.patches = patches;
        self.mark_for_rebuild(RebuildRequest::Mesh);
    }

    /// Append a patch with priority over every patch already present.
    pub fn push_patch(&mut self, patch: SurfacePatch) {
        self.patches.push(patch);
        self.mark_for_rebuild(RebuildRequest::Mesh);
    }

    pub fn mark_for_rebuild(&mut self, request: RebuildRequest) {
        match request {
            RebuildRequest::Mesh => self.pending.mesh = true,
            RebuildRequest::InfoTexture => self.pending.info_texture = true,
            RebuildRequest::All => {
                self.pending.mesh = true;
                self.pending.info_texture = true;
            }
        }
    }

    /// Apply pending rebuild requests.
    ///
    /// Returns `Ok(true)` when a new tree was swapped in. Invalid settings
    /// leave the old tree and the pending request in place.
    pub fn update(&mut self) -> Result<bool, SurfaceError> {
        if self.pending.info_texture {
            // Nothing is derived per surface outside the tree yet.
            debug!("Info texture refresh acknowledged");
            self.pending.info_texture = false;
        }
        if !self.pending.mesh {
            return Ok(false);
        }

        self.settings.validate()?;
        let patches: &[SurfacePatch] = if self.settings.visible {
            &self.patches
        } else {
            &[]
        };
        let tree = build_tree(&self.settings, patches);
        info!(
            "Rebuilt surface quadtree: {} patches, {} nodes, {} materials, depth {}",
            patches.len(),
            tree.node_count(),
            tree.materials().len(),
            tree.tree_depth()
        );

        self.tree = Arc::new(tree);
        self.pending.mesh = false;
        self.rebuild_count += 1;
        Ok(true)
    }

    /// Bounds of the current tree, with a placeholder Z range when nothing
    /// set one.
    pub fn calc_bounds(&self) -> Aabb {
        let mut bounds = self.tree.bounds();
        if bounds.min.z >= bounds.max.z {
            (bounds.min.z, bounds.max.z) = FALLBACK_Z_RANGE;
        }
        bounds
    }

    /// Margin by which culling bounds are grown to cover morphing tiles.
    pub fn dynamic_extent(&self) -> Vec3 {
        let tile = self.settings.tile_size;
        Vec3::new(tile * 2.0, tile * 2.0, 0.0)
    }

    pub fn tessellated_bounds(&self) -> Option<Rect> {
        self.tessellated_bounds
    }

    /// Restrict traversals to leaf tiles inside `bounds`, or lift the
    /// restriction with `None`.
    pub fn set_tessellated_bounds(&mut self, bounds: Option<Rect>) {
        if let Some(rect) = bounds.filter(|rect| rect.area() <= 0.0) {
            warn!("Ignoring empty tessellated bounds {:?}..{:?}", rect.min, rect.max);
            return;
        }
        self.tessellated_bounds = bounds;
    }

    /// Traversal description for `view` under the current settings.
    pub fn traversal_desc(&self, view: &ViewState) -> TraversalDesc {
        TraversalDesc {
            frustum: view.frustum(),
            observer_position: view.view_origin,
            pre_view_translation: view.pre_view_translation(),
            lod_scale: self.settings.lod_scale,
            lowest_lod: self.settings.lowest_lod,
            force_collapse_density_level: self.settings.force_collapse_density_level,
            density_count: self.settings.density_count,
            lod_morphing_enabled: self.settings.lod_morphing_enabled,
            height_morph: self.settings.height_morph,
            tessellated_bounds: self.tessellated_bounds,
        }
    }

    /// Select draw instances for one view against the current tree.
    pub fn traverse(&self, view: &ViewState) -> TraversalOutput {
        self.tree.build_instances(&self.traversal_desc(view))
    }
}

/// Build and seal a tree for `settings` holding `patches` in priority order.
fn build_tree(settings: &SurfaceSettings, patches: &[SurfacePatch]) -> QuadTree {
    let tile = settings.tile_size;
    let grid_position = Vec2::new(
        grid_snap(settings.location.x, tile),
        grid_snap(settings.location.y, tile),
    );
    let world_extent = settings.extent_in_tiles.as_vec2() * tile;
    let region = Rect::new(grid_position - world_extent, grid_position + world_extent);

    let mut builder = QuadTreeBuilder::new(region, tile, settings.extent_in_tiles);
    for patch in patches {
        let index = builder.add_surface_render_data(patch.render_data());
        builder.add_surface_patch(patch.bounds, index);
    }
    builder.seal(settings.prune)
}
