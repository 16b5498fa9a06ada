//! Point queries against a sealed tree: base height and tile bounds.

use glam::Vec2;
use quadmesh_math::{Aabb, bilerp};

use crate::QuadTree;
use crate::node::{NO_CHILD, Node};
use crate::store::NodeData;

/// Outcome of a point query.
///
/// `Fallback` carries a best-effort value (the deepest node reached) when no
/// populated tile contains the point. Callers near the tree boundary or over
/// unpopulated area must check before trusting the value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sample<T> {
    Found(T),
    Fallback(T),
}

impl<T> Sample<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Sample::Found(_))
    }

    /// The sampled value, whether found or not.
    pub fn value(self) -> T {
        match self {
            Sample::Found(v) | Sample::Fallback(v) => v,
        }
    }

    /// The sampled value only if it was found.
    pub fn found(self) -> Option<T> {
        match self {
            Sample::Found(v) => Some(v),
            Sample::Fallback(_) => None,
        }
    }
}

impl NodeData {
    fn base_height(&self, node: &Node) -> f32 {
        self.render_data[node.surface_index as usize].surface_base_height
    }

    /// Stored child whose footprint contains `point`, min edges inclusive and
    /// max edges exclusive.
    fn child_containing(&self, node: &Node, point: Vec2) -> Option<&Node> {
        node.children
            .iter()
            .filter(|&&child| child != NO_CHILD)
            .map(|&child| &self.nodes[child as usize])
            .find(|child| child.bounds.rect().contains_half_open(point))
    }

    fn query_base_height(&self, node: &Node, point: Vec2) -> Sample<f32> {
        // Nothing finer is stored below a complete homogeneous node once
        // pruned, so it answers for its whole footprint.
        if node.is_collapsible() {
            return Sample::Found(self.base_height(node));
        }

        match self.child_containing(node, point) {
            Some(child) => self.query_base_height(child, point),
            None => Sample::Fallback(self.base_height(node)),
        }
    }

    fn query_tile_bounds(&self, node: &Node, lod_level: u32, point: Vec2) -> Sample<Aabb> {
        if !node.is_childless() {
            return match self.child_containing(node, point) {
                Some(child) => self.query_tile_bounds(child, lod_level.saturating_sub(1), point),
                None => Sample::Fallback(node.bounds),
            };
        }

        // A childless collapsible node above leaf depth had its subtree
        // pruned. Resolve the leaf tile it stands for.
        if lod_level > 0 && node.is_collapsible() {
            let child = node
                .implicit_children()
                .into_iter()
                .find(|child| child.bounds.rect().contains_half_open(point));
            return match child {
                Some(child) => self.query_tile_bounds(&child, lod_level - 1, point),
                None => Sample::Fallback(node.bounds),
            };
        }

        Sample::Found(node.bounds)
    }
}

impl QuadTree {
    fn root_contains(&self, point: Vec2) -> bool {
        let root = &self.data.nodes[0];
        root.bounds.has_valid_z() && root.bounds.rect().contains_half_open(point)
    }

    /// Base height of the surface owning the tile at `point`.
    pub fn query_base_height(&self, point: Vec2) -> Sample<f32> {
        let root = &self.data.nodes[0];
        if !self.root_contains(point) {
            return Sample::Fallback(self.data.base_height(root));
        }
        self.data.query_base_height(root, point)
    }

    /// Base height bilinearly interpolated between the four surrounding
    /// leaf-tile centers. Found only if all four samples were found.
    pub fn query_interpolated_base_height(&self, point: Vec2) -> Sample<f32> {
        let leaf_size = self.leaf_size;
        // The sample grid sits on leaf tile centers.
        let grid_origin = self.tile_region.min - Vec2::splat(leaf_size * 0.5);
        let normalized = (point - grid_origin) / leaf_size;
        let corner = normalized.floor() * leaf_size + grid_origin;
        let frac = normalized - normalized.floor();

        let samples = [
            corner,
            corner + Vec2::new(leaf_size, 0.0),
            corner + Vec2::new(0.0, leaf_size),
            corner + Vec2::new(leaf_size, leaf_size),
        ]
        .map(|position| self.query_base_height(position));

        let all_found = samples.iter().all(Sample::is_found);
        let [h00, h10, h01, h11] = samples.map(Sample::value);
        let height = bilerp(h00, h10, h01, h11, frac.x, frac.y);

        if all_found {
            Sample::Found(height)
        } else {
            Sample::Fallback(height)
        }
    }

    /// Bounds of the leaf tile containing `point`.
    pub fn query_tile_bounds(&self, point: Vec2) -> Sample<Aabb> {
        let root = &self.data.nodes[0];
        if !self.root_contains(point) {
            return Sample::Fallback(root.bounds);
        }
        self.data.query_tile_bounds(root, self.tree_depth, point)
    }
}
