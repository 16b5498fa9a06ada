//! Mutable construction phase of the quadtree.

use glam::{IVec2, Vec2};
use quadmesh_math::{Aabb, Rect, round_up_pow2};
use tracing::{debug, trace, warn};

use crate::QuadTree;
use crate::materials::assign_material_buckets;
use crate::node::{INVALID_PARENT, Node};
use crate::render_data::{MaterialRef, SurfaceRenderData};
use crate::store::{NodeData, full_tree_node_count};

/// A quadtree under construction.
///
/// Created by [`QuadTreeBuilder::new`], filled with surface records and
/// patches, then consumed by [`seal`](Self::seal) which produces the
/// immutable [`QuadTree`]. A sealed tree can never be mutated again; rebuild
/// by starting a fresh builder.
#[derive(Debug, Clone)]
pub struct QuadTreeBuilder {
    data: NodeData,
    materials: Vec<MaterialRef>,
    tile_region: Rect,
    leaf_size: f32,
    extent_in_tiles: IVec2,
    tree_depth: u32,
}

impl QuadTreeBuilder {
    /// Initialise an empty tree over `region` with leaf tiles of `tile_size`.
    ///
    /// The tree is sized to the smallest power-of-two tile count holding
    /// twice the larger extent; its depth is the log2 of that count. The root
    /// spans that many tiles from `region.min` and starts with an invalid Z
    /// range.
    ///
    /// # Panics
    ///
    /// Panics if the region has no area, the tile size is not positive, or
    /// either extent component is not positive.
    pub fn new(region: Rect, tile_size: f32, extent_in_tiles: IVec2) -> Self {
        assert!(region.area() > 0.0, "tile region must have a positive area");
        assert!(tile_size > 0.0, "tile size must be positive");
        assert!(
            extent_in_tiles.x > 0 && extent_in_tiles.y > 0,
            "extent in tiles must be positive, got {extent_in_tiles}"
        );

        let max_dim = (extent_in_tiles.x.max(extent_in_tiles.y) * 2) as u32;
        let root_dim = round_up_pow2(max_dim);
        let tree_depth = root_dim.trailing_zeros();
        let root_world_size = root_dim as f32 * tile_size;

        // Full-tree capacity: insertion never grows the array.
        let mut data = NodeData::with_capacity(full_tree_node_count(root_dim));
        let (min_z, max_z) = Aabb::INVALID_Z;
        let root_rect = Rect::new(region.min, region.min + Vec2::splat(root_world_size));
        data.allocate_node(Aabb::from_rect(root_rect, min_z, max_z), INVALID_PARENT);

        debug!(
            "Initialised quadtree: depth={tree_depth}, root_dim={root_dim}, capacity={}",
            data.nodes.capacity()
        );

        Self {
            data,
            materials: Vec::new(),
            tile_region: region,
            leaf_size: tile_size,
            extent_in_tiles,
            tree_depth,
        }
    }

    /// Append a surface record and return its index for
    /// [`add_surface_patch`](Self::add_surface_patch).
    pub fn add_surface_render_data(&mut self, render_data: SurfaceRenderData) -> u32 {
        self.data.render_data.push(render_data);
        (self.data.render_data.len() - 1) as u32
    }

    /// Claim every tile overlapping `bounds` in XY for `surface_index`.
    ///
    /// Later patches take priority over earlier ones where they overlap. A
    /// patch that does not overlap the tile region is skipped.
    ///
    /// # Panics
    ///
    /// Panics if `surface_index` does not name a record.
    pub fn add_surface_patch(&mut self, bounds: Aabb, surface_index: u32) {
        assert!(
            (surface_index as usize) < self.data.render_data.len(),
            "unknown surface record {surface_index}"
        );
        if !bounds.rect().overlaps(&self.tile_region) {
            warn!(
                "Surface patch {surface_index} at {:?}..{:?} lies outside the tile region, skipped",
                bounds.min, bounds.max
            );
            return;
        }

        let nodes_before = self.data.nodes.len();
        self.data.add_nodes(
            0,
            &self.tile_region,
            &bounds,
            surface_index,
            self.tree_depth,
        );
        trace!(
            "Surface patch {surface_index} allocated {} nodes",
            self.data.nodes.len() - nodes_before
        );
    }

    /// Insert a patch shrunk by a quarter leaf tile on each side, so that
    /// tiles merely touching its edge are left alone.
    pub fn add_quad_mesh(&mut self, bounds: Aabb, surface_index: u32) {
        let shrink = Vec2::splat(self.leaf_size * 0.25);
        let rect = bounds.rect().shrink_by(shrink);
        self.add_surface_patch(
            Aabb::from_rect(rect, bounds.min.z, bounds.max.z),
            surface_index,
        );
    }

    /// Assign material bucket indices to all surface records.
    ///
    /// Returns the distinct materials indexed by bucket. [`seal`](Self::seal)
    /// runs this again, so calling it is only needed to inspect buckets
    /// before sealing.
    pub fn assign_material_buckets(&mut self) -> &[MaterialRef] {
        self.materials = assign_material_buckets(&mut self.data.render_data);
        &self.materials
    }

    /// Make the tree read-only, optionally pruning redundant nodes first.
    pub fn seal(mut self, prune: bool) -> QuadTree {
        let nodes_before = self.data.nodes.len();
        if prune {
            let removed = self.data.prune_redundant_nodes();
            debug!("Pruned {removed} of {nodes_before} quadtree nodes");
        }
        self.materials = assign_material_buckets(&mut self.data.render_data);

        debug!(
            "Sealed quadtree: {} nodes, {} surface records, {} materials",
            self.data.nodes.len(),
            self.data.render_data.len(),
            self.materials.len()
        );

        QuadTree {
            data: self.data,
            materials: self.materials,
            tile_region: self.tile_region,
            leaf_size: self.leaf_size,
            extent_in_tiles: self.extent_in_tiles,
            tree_depth: self.tree_depth,
        }
    }

    /// Root bounds. Z stays invalid until the first patch is inserted.
    pub fn bounds(&self) -> Aabb {
        self.data.nodes[0].bounds
    }

    pub fn nodes(&self) -> &[Node] {
        &self.data.nodes
    }

    pub fn node_count(&self) -> usize {
        self.data.nodes.len()
    }

    pub fn render_data(&self) -> &[SurfaceRenderData] {
        &self.data.render_data
    }

    pub fn tree_depth(&self) -> u32 {
        self.tree_depth
    }

    pub fn leaf_size(&self) -> f32 {
        self.leaf_size
    }

    pub fn tile_region(&self) -> Rect {
        self.tile_region
    }

    pub fn extent_in_tiles(&self) -> IVec2 {
        self.extent_in_tiles
    }
}
