//! Quadtree node record and the per-node policy predicates.

use glam::{Vec2, Vec3};
use quadmesh_math::Aabb;

use crate::render_data::SurfaceRenderData;

/// Parent index stored on the root node.
pub const INVALID_PARENT: u32 = u32::MAX;

/// Child slot value meaning "no child allocated". Index 0 is the root, which
/// can never be anybody's child.
pub const NO_CHILD: u32 = 0;

/// Quadrant offsets in child slot order: (-,-), (+,-), (-,+), (+,+).
pub(crate) const QUADRANT_OFFSETS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 1.0),
];

/// A node in the flat node array.
///
/// Nodes are addressed by `u32` index. Child indices are always greater than
/// the index of their parent, since children are allocated after parents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    /// XY fixed at creation, Z is the union of every patch that reached this node.
    pub bounds: Aabb,
    /// Index of the parent node, [`INVALID_PARENT`] on the root.
    pub parent_index: u32,
    /// Child indices in quadrant order, [`NO_CHILD`] when absent.
    pub children: [u32; 4],
    /// Surface record owning this node. The last inserted patch wins.
    pub surface_index: u32,
    /// Surface record to morph towards at the edge of this node. Insertion
    /// sets it together with `surface_index`.
    pub transition_surface_index: u32,
    /// Cached `material.is_some()` of the owning surface record.
    pub has_material: bool,
    /// Every node below (stored or implicit) resolves to the same surface.
    pub is_subtree_same_surface: bool,
    /// All four children exist, recursively, down to leaf depth.
    pub has_complete_subtree: bool,
}

impl Default for Node {
    fn default() -> Self {
        let (min_z, max_z) = Aabb::INVALID_Z;
        Self {
            bounds: Aabb {
                min: Vec3::new(0.0, 0.0, min_z),
                max: Vec3::new(0.0, 0.0, max_z),
            },
            parent_index: INVALID_PARENT,
            children: [NO_CHILD; 4],
            surface_index: 0,
            transition_surface_index: 0,
            has_material: false,
            is_subtree_same_surface: false,
            has_complete_subtree: false,
        }
    }
}

impl Node {
    /// True if no child slot is populated.
    pub fn is_childless(&self) -> bool {
        self.children.iter().all(|&c| c == NO_CHILD)
    }

    /// Complete and homogeneous: the node stands for its whole subtree and
    /// can be subdivided on demand without reading storage.
    pub fn is_collapsible(&self) -> bool {
        self.has_complete_subtree && self.is_subtree_same_surface
    }

    /// Sibling merge predicate: same surface and same transition surface.
    pub fn can_merge(&self, other: &Node) -> bool {
        self.surface_index == other.surface_index
            && self.transition_surface_index == other.transition_surface_index
    }

    /// Whether this node can be drawn as a single instance at `density_level`.
    pub fn can_render(
        &self,
        density_level: i32,
        force_collapse_density_level: i32,
        render_data: &SurfaceRenderData,
    ) -> bool {
        render_data.material.is_some()
            && self.is_subtree_same_surface
            && (density_level > force_collapse_density_level || self.has_complete_subtree)
    }

    /// Synthesize the four implicit children of a collapsible node.
    ///
    /// Children get halved XY bounds, the parent's full Z range and inherit
    /// surface ownership and the complete+homogeneous flags. They are
    /// temporaries and never enter the node array.
    pub fn implicit_children(&self) -> [Node; 4] {
        let half = self.bounds.extents().truncate();
        QUADRANT_OFFSETS.map(|offset| {
            let min = self.bounds.min.truncate() + half * offset;
            let max = min + half;
            Node {
                bounds: Aabb {
                    min: min.extend(self.bounds.min.z),
                    max: max.extend(self.bounds.max.z),
                },
                parent_index: INVALID_PARENT,
                children: [NO_CHILD; 4],
                surface_index: self.surface_index,
                transition_surface_index: self.transition_surface_index,
                has_material: self.has_material,
                is_subtree_same_surface: true,
                has_complete_subtree: true,
            }
        })
    }
}
