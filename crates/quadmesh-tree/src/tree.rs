//! The sealed, read-only quadtree.

use std::borrow::Cow;

use glam::IVec2;
use quadmesh_math::{Aabb, Rect};
use tracing::trace;

use crate::node::Node;
use crate::render_data::{HitProxyId, MaterialRef, SurfaceRenderData};
use crate::store::NodeData;
use crate::traversal::{Traversal, TraversalDesc, TraversalOutput};

/// An immutable quadtree produced by [`QuadTreeBuilder::seal`](crate::QuadTreeBuilder::seal).
///
/// Holds only plain data, so any number of traversals and point queries can
/// run against it concurrently from shared references.
#[derive(Debug, Clone)]
pub struct QuadTree {
    pub(crate) data: NodeData,
    pub(crate) materials: Vec<MaterialRef>,
    pub(crate) tile_region: Rect,
    pub(crate) leaf_size: f32,
    pub(crate) extent_in_tiles: IVec2,
    pub(crate) tree_depth: u32,
}

impl QuadTree {
    /// Always true: a sealed tree cannot be mutated.
    pub fn is_read_only(&self) -> bool {
        true
    }

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

    /// Distinct materials, indexed by bucket.
    pub fn materials(&self) -> &[MaterialRef] {
        &self.materials
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

    /// Number of bucket counters a traversal with `density_count` needs.
    pub fn bucket_count(&self, density_count: u32) -> usize {
        self.materials.len() * density_count as usize
    }

    /// Hit-proxy ids of every surface record, default record included.
    pub fn hit_proxies(&self) -> impl Iterator<Item = HitProxyId> + '_ {
        self.data.render_data.iter().map(|data| data.hit_proxy)
    }

    /// Run a fresh traversal and return its output.
    ///
    /// Uses the bounded pass when `desc` carries tessellated bounds and the
    /// distance pass otherwise.
    pub fn build_instances(&self, desc: &TraversalDesc) -> TraversalOutput {
        let mut output = TraversalOutput::new(self.bucket_count(desc.density_count));
        if desc.tessellated_bounds.is_some() {
            self.select_lod_within_bounds(desc, &mut output);
        } else {
            self.select_lod(desc, &mut output);
        }
        output
    }

    /// Distance-band LOD selection from the root.
    ///
    /// Appends to `output`, growing its bucket counters if they are too few.
    pub fn select_lod(&self, desc: &TraversalDesc, output: &mut TraversalOutput) {
        let Some(root) = self.prepare(desc, output) else {
            return;
        };
        let desc = self.clamp_lowest_lod(desc);
        let before = output.instance_count;
        Traversal::new(&self.data, &desc, self.leaf_size, output).select_lod(&root, self.tree_depth);
        trace!(
            "select_lod emitted {} instances",
            output.instance_count - before
        );
    }

    /// Forced refinement from the root, starting at `density_level`.
    ///
    /// Ignores observer distance: emits the coarsest stored nodes that can be
    /// drawn whole, all tagged with the root LOD level.
    pub fn select_lod_refinement(
        &self,
        desc: &TraversalDesc,
        density_level: i32,
        output: &mut TraversalOutput,
    ) {
        let Some(root) = self.prepare(desc, output) else {
            return;
        };
        Traversal::new(&self.data, desc, self.leaf_size, output).select_lod_refinement(
            &root,
            density_level,
            self.tree_depth,
        );
    }

    /// Emit every populated leaf tile lying inside-or-on the tessellated bounds.
    ///
    /// # Panics
    ///
    /// Panics if `desc.tessellated_bounds` is `None`.
    pub fn select_lod_within_bounds(&self, desc: &TraversalDesc, output: &mut TraversalOutput) {
        let bounds = desc
            .tessellated_bounds
            .expect("bounded traversal requires tessellated bounds");
        let Some(root) = self.prepare(desc, output) else {
            return;
        };
        let before = output.instance_count;
        Traversal::new(&self.data, desc, self.leaf_size, output).select_lod_within_bounds(
            &root,
            self.tree_depth,
            &bounds,
        );
        trace!(
            "select_lod_within_bounds emitted {} instances",
            output.instance_count - before
        );
    }

    /// Size the bucket counters and return the root, or `None` when nothing
    /// was ever inserted.
    fn prepare(&self, desc: &TraversalDesc, output: &mut TraversalOutput) -> Option<Node> {
        let bucket_count = self.bucket_count(desc.density_count);
        if output.bucket_instance_counts.len() < bucket_count {
            output.bucket_instance_counts.resize(bucket_count, 0);
        }
        let root = self.data.nodes[0];
        root.bounds.has_valid_z().then_some(root)
    }

    fn clamp_lowest_lod<'d>(&self, desc: &'d TraversalDesc) -> Cow<'d, TraversalDesc> {
        if desc.lowest_lod <= self.tree_depth {
            return Cow::Borrowed(desc);
        }
        let mut clamped = desc.clone();
        clamped.lowest_lod = self.tree_depth;
        Cow::Owned(clamped)
    }
}
