//! One-shot compaction of redundant nodes, run while sealing.

use crate::node::NO_CHILD;
use crate::store::NodeData;

impl NodeData {
    /// Remove nodes that can be reconstructed from their parent, or that are
    /// materialless filler, and return how many were removed.
    ///
    /// Walks from the back of the array to index 1. Children always sit
    /// behind their parents, so every subtree is processed bottom-up and a
    /// removed node never has surviving children.
    pub(crate) fn prune_redundant_nodes(&mut self) -> usize {
        let Some(mut end_index) = self.nodes.len().checked_sub(1) else {
            return 0;
        };
        let initial_len = self.nodes.len();

        for node_index in (1..=end_index).rev() {
            let parent_index = self.nodes[node_index].parent_index as usize;
            let parent = self.nodes[parent_index];
            let node = self.nodes[node_index];

            if parent.is_collapsible() {
                // The parent regenerates this node on demand. Drop every child
                // pointer so none dangle once the siblings are gone too.
                self.nodes[parent_index].children = [NO_CHILD; 4];
                self.swap_remove(node_index, end_index);
                end_index -= 1;
            } else if !node.has_material && node.is_collapsible() {
                for child in self.nodes[parent_index].children.iter_mut() {
                    if *child == node_index as u32 {
                        *child = NO_CHILD;
                    }
                }
                self.swap_remove(node_index, end_index);
                end_index -= 1;
            }
        }

        self.nodes.truncate(end_index + 1);
        self.nodes.shrink_to_fit();
        initial_len - self.nodes.len()
    }

    /// Move the live node at `end_index` into `node_index` and patch the
    /// references to it. The node previously at `node_index` ends up past the
    /// live range.
    fn swap_remove(&mut self, node_index: usize, end_index: usize) {
        if node_index == end_index {
            return;
        }
        self.nodes.swap(node_index, end_index);

        let moved = self.nodes[node_index];
        let parent_index = moved.parent_index as usize;
        for i in 0..4 {
            let child = moved.children[i];
            if child != NO_CHILD {
                self.nodes[child as usize].parent_index = node_index as u32;
            }
            if self.nodes[parent_index].children[i] == end_index as u32 {
                self.nodes[parent_index].children[i] = node_index as u32;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};
    use quadmesh_math::{Aabb, Rect};

    use crate::node::{INVALID_PARENT, NO_CHILD};
    use crate::render_data::{MaterialRef, SurfaceMaterial, SurfaceRenderData};
    use crate::store::{NodeData, full_tree_node_count};

    fn store(dim: u32) -> NodeData {
        let mut data = NodeData::with_capacity(full_tree_node_count(dim));
        let (lo, hi) = Aabb::INVALID_Z;
        let root = Rect::new(Vec2::ZERO, Vec2::splat(dim as f32));
        data.allocate_node(Aabb::from_rect(root, lo, hi), INVALID_PARENT);
        data.render_data.push(SurfaceRenderData::with_material(
            MaterialRef::new(SurfaceMaterial::named("m")),
            3.0,
        ));
        data
    }

    fn patch(min: Vec2, max: Vec2) -> Aabb {
        Aabb::new(min.extend(0.0), max.extend(1.0))
    }

    /// Every parent/child link must be mutual after compaction.
    fn assert_links_consistent(data: &NodeData) {
        for (index, node) in data.nodes.iter().enumerate() {
            for &child in &node.children {
                if child != NO_CHILD {
                    assert!((child as usize) < data.nodes.len(), "dangling child {child}");
                    assert!(child as usize > index);
                    assert_eq!(data.nodes[child as usize].parent_index, index as u32);
                }
            }
            if index > 0 {
                let parent = &data.nodes[node.parent_index as usize];
                assert!(parent.children.contains(&(index as u32)));
            }
        }
    }

    #[test]
    fn test_full_cover_prunes_to_root() {
        let mut data = store(4);
        let mesh = Rect::new(Vec2::ZERO, Vec2::splat(4.0));
        data.add_nodes(0, &mesh, &patch(Vec2::ZERO, Vec2::splat(4.0)), 1, 2);
        assert_eq!(data.nodes.len(), 21);

        let removed = data.prune_redundant_nodes();
        assert_eq!(removed, 20);
        assert_eq!(data.nodes.len(), 1);
        assert!(data.nodes[0].is_childless());
        assert!(data.nodes[0].is_collapsible());
    }

    #[test]
    fn test_partial_cover_keeps_links_consistent() {
        let mut data = store(8);
        let mesh = Rect::new(Vec2::ZERO, Vec2::splat(8.0));
        data.add_nodes(0, &mesh, &patch(Vec2::ZERO, Vec2::splat(4.0)), 1, 3);
        data.add_nodes(0, &mesh, &patch(Vec2::new(5.0, 5.0), Vec2::new(7.0, 6.0)), 1, 3);
        let before = data.nodes.len();

        let removed = data.prune_redundant_nodes();
        assert!(removed > 0);
        assert_eq!(data.nodes.len(), before - removed);
        assert_links_consistent(&data);

        // The fully covered quadrant collapsed into a single childless node.
        let quadrant = data.nodes[data.nodes[0].children[0] as usize];
        assert!(quadrant.is_collapsible());
        assert!(quadrant.is_childless());
    }

    #[test]
    fn test_materialless_filler_is_removed() {
        let mut data = store(4);
        let mesh = Rect::new(Vec2::ZERO, Vec2::splat(4.0));
        // Slot 0 is the null record with no material.
        data.add_nodes(0, &mesh, &patch(Vec2::ZERO, Vec2::splat(2.0)), 0, 2);
        data.add_nodes(0, &mesh, &patch(Vec2::new(2.0, 2.0), Vec2::splat(4.0)), 1, 2);

        data.prune_redundant_nodes();
        assert_links_consistent(&data);
        let root = data.nodes[0];
        assert_eq!(root.children[0], NO_CHILD);
        assert_ne!(root.children[3], NO_CHILD);
    }

    #[test]
    fn test_prune_on_root_only_is_noop() {
        let mut data = store(4);
        assert_eq!(data.prune_redundant_nodes(), 0);
        assert_eq!(data.nodes.len(), 1);
    }
}
