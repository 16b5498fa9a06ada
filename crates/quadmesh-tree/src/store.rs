//! Flat node array plus the surface record table, and the insertion descent.

use quadmesh_math::{Aabb, Rect};

use crate::node::{NO_CHILD, Node, QUADRANT_OFFSETS};
use crate::render_data::SurfaceRenderData;

/// Number of nodes in a full quadtree whose finest level is `dim x dim` tiles.
pub(crate) fn full_tree_node_count(dim: u32) -> usize {
    let dim = dim as usize;
    (4 * dim * dim - 1) / 3
}

/// Index-addressed storage shared by the builder and the sealed tree.
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeData {
    pub nodes: Vec<Node>,
    /// Slot 0 is the default record every new node points at.
    pub render_data: Vec<SurfaceRenderData>,
}

impl NodeData {
    /// Create a store with room for `node_capacity` nodes, holding only the
    /// default surface record.
    pub fn with_capacity(node_capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(node_capacity),
            render_data: vec![SurfaceRenderData::default()],
        }
    }

    /// Append a node and return its index.
    ///
    /// # Panics
    ///
    /// Panics if the store is full: capacity is sized for a full tree at init
    /// and must never grow during insertion.
    pub fn allocate_node(&mut self, bounds: Aabb, parent_index: u32) -> u32 {
        assert!(
            self.nodes.len() < self.nodes.capacity(),
            "node store overflow: {} nodes allocated",
            self.nodes.len()
        );
        let index = self.nodes.len() as u32;
        self.nodes.push(Node {
            bounds,
            parent_index,
            ..Node::default()
        });
        index
    }

    /// Insert `patch` into the subtree rooted at `node_index`.
    ///
    /// Every visited node takes ownership for `surface_index`, grows its Z
    /// range and has its summary flags recomputed from its children on the
    /// way back up. `lod_level` is the number of levels left below this
    /// node; zero means leaf.
    pub fn add_nodes(
        &mut self,
        node_index: u32,
        mesh_bounds: &Rect,
        patch: &Aabb,
        surface_index: u32,
        lod_level: u32,
    ) {
        let has_material = self.render_data[surface_index as usize].material.is_some();

        let node = &mut self.nodes[node_index as usize];
        node.bounds.union_z(patch.min.z, patch.max.z);
        node.transition_surface_index = surface_index;
        node.surface_index = surface_index;
        node.has_material = has_material;

        // Leaves stay complete and homogeneous so they can be implicitly
        // subdivided later. Interior nodes are recomputed below.
        node.is_subtree_same_surface = true;
        node.has_complete_subtree = true;

        if lod_level == 0 {
            return;
        }

        let node_rect = node.bounds.rect();
        let half = node_rect.size() * 0.5;
        let patch_rect = patch.rect();

        let mut is_same_surface = true;
        let mut is_complete = true;
        // Children must also match the node's own, freshly written surface,
        // or a patch that reached no child would claim the whole subtree.
        let mut prev = self.nodes[node_index as usize];

        for (i, offset) in QUADRANT_OFFSETS.iter().enumerate() {
            let mut child_index = self.nodes[node_index as usize].children[i];

            if child_index != NO_CHILD {
                if self.nodes[child_index as usize]
                    .bounds
                    .rect()
                    .overlaps(&patch_rect)
                {
                    self.add_nodes(child_index, mesh_bounds, patch, surface_index, lod_level - 1);
                }
            } else {
                let child_min = node_rect.min + half * *offset;
                let child_rect = Rect::new(child_min, child_min + half);

                if child_rect.overlaps(&patch_rect) && child_rect.overlaps(mesh_bounds) {
                    let child_bounds = Aabb::from_rect(child_rect, patch.min.z, patch.max.z);
                    child_index = self.allocate_node(child_bounds, node_index);
                    self.nodes[node_index as usize].children[i] = child_index;
                    self.add_nodes(child_index, mesh_bounds, patch, surface_index, lod_level - 1);
                }
            }

            if child_index == NO_CHILD {
                // A missing quadrant breaks completeness but not homogeneity.
                is_complete = false;
                continue;
            }

            let child = self.nodes[child_index as usize];
            if !child.is_subtree_same_surface || !child.can_merge(&prev) {
                is_same_surface = false;
            }
            if !child.has_complete_subtree {
                is_complete = false;
            }
            prev = child;
        }

        let node = &mut self.nodes[node_index as usize];
        node.is_subtree_same_surface = is_same_surface;
        node.has_complete_subtree = is_complete;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    use crate::node::INVALID_PARENT;
    use crate::render_data::{MaterialRef, SurfaceMaterial};

    /// Root spanning 4x4 unit tiles (two levels below the root).
    fn store_with_root() -> NodeData {
        let mut data = NodeData::with_capacity(full_tree_node_count(4));
        let (lo, hi) = Aabb::INVALID_Z;
        let root = Rect::new(Vec2::ZERO, Vec2::splat(4.0));
        data.allocate_node(Aabb::from_rect(root, lo, hi), INVALID_PARENT);
        data.render_data.push(SurfaceRenderData::with_material(
            MaterialRef::new(SurfaceMaterial::named("m")),
            1.0,
        ));
        data
    }

    fn mesh_bounds() -> Rect {
        Rect::new(Vec2::ZERO, Vec2::splat(4.0))
    }

    #[test]
    fn test_full_tree_node_count() {
        assert_eq!(full_tree_node_count(1), 1);
        assert_eq!(full_tree_node_count(2), 5);
        assert_eq!(full_tree_node_count(4), 21);
        assert_eq!(full_tree_node_count(8), 85);
    }

    #[test]
    fn test_single_tile_patch_allocates_one_path() {
        let mut data = store_with_root();
        let patch = Aabb::new(Vec3::new(0.0, 0.0, -1.0), Vec3::new(1.0, 1.0, 2.0));
        data.add_nodes(0, &mesh_bounds(), &patch, 1, 2);

        // Root, one level-1 node, one leaf.
        assert_eq!(data.nodes.len(), 3);
        let root = data.nodes[0];
        assert_eq!(root.children, [1, 0, 0, 0]);
        assert!(!root.has_complete_subtree);
        assert!(root.is_subtree_same_surface);
        assert_eq!((root.bounds.min.z, root.bounds.max.z), (-1.0, 2.0));

        let leaf = data.nodes[2];
        assert_eq!(leaf.parent_index, 1);
        assert!(leaf.is_collapsible());
        assert!(leaf.has_material);
        assert_eq!(leaf.surface_index, 1);
    }

    #[test]
    fn test_children_always_follow_parents() {
        let mut data = store_with_root();
        let patch = Aabb::new(Vec3::new(0.5, 0.5, 0.0), Vec3::new(3.5, 3.5, 0.0));
        data.add_nodes(0, &mesh_bounds(), &patch, 1, 2);
        for (index, node) in data.nodes.iter().enumerate() {
            for &child in &node.children {
                assert!(child == NO_CHILD || child as usize > index);
            }
        }
    }

    #[test]
    fn test_full_cover_is_complete_and_homogeneous() {
        let mut data = store_with_root();
        let patch = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(4.0, 4.0, 0.0));
        data.add_nodes(0, &mesh_bounds(), &patch, 1, 2);
        assert_eq!(data.nodes.len(), full_tree_node_count(4));
        assert!(data.nodes[0].is_collapsible());
    }

    #[test]
    fn test_overwrite_breaks_homogeneity_then_restores_it() {
        let mut data = store_with_root();
        data.render_data.push(SurfaceRenderData::with_material(
            MaterialRef::new(SurfaceMaterial::named("n")),
            2.0,
        ));
        let full = Aabb::new(Vec3::ZERO, Vec3::new(4.0, 4.0, 0.0));
        let corner = Aabb::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0));

        data.add_nodes(0, &mesh_bounds(), &full, 1, 2);
        data.add_nodes(0, &mesh_bounds(), &corner, 2, 2);
        assert!(data.nodes[0].has_complete_subtree);
        assert!(!data.nodes[0].is_subtree_same_surface);

        data.add_nodes(0, &mesh_bounds(), &full, 1, 2);
        assert!(data.nodes[0].is_collapsible());
    }

    #[test]
    fn test_patch_reaching_no_child_does_not_claim_subtree() {
        let mut data = store_with_root();
        data.render_data.push(SurfaceRenderData::with_material(
            MaterialRef::new(SurfaceMaterial::named("n")),
            2.0,
        ));
        let full = Aabb::new(Vec3::ZERO, Vec3::new(4.0, 4.0, 0.0));
        let outside = Aabb::new(Vec3::new(10.0, 10.0, 0.0), Vec3::new(11.0, 11.0, 0.0));

        data.add_nodes(0, &mesh_bounds(), &full, 1, 2);
        let count = data.nodes.len();
        data.add_nodes(0, &mesh_bounds(), &outside, 2, 2);

        assert_eq!(data.nodes.len(), count);
        let root = data.nodes[0];
        assert_eq!(root.surface_index, 2);
        assert!(root.has_complete_subtree);
        assert!(!root.is_subtree_same_surface);
        for &child in &root.children {
            assert_eq!(data.nodes[child as usize].surface_index, 1);
            assert!(data.nodes[child as usize].is_collapsible());
        }
    }
}
