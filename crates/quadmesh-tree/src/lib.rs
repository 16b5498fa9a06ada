//! Quadtree LOD index over a rectangular world region.
//!
//! A [`QuadTreeBuilder`] collects surface patches with last-writer-wins
//! overwrite semantics, then [`QuadTreeBuilder::seal`] prunes and freezes it
//! into a [`QuadTree`]. The sealed tree selects morph-aware draw instances
//! per camera and answers base-height and tile-bounds point queries.

mod builder;
mod lod_distance;
mod materials;
mod node;
mod prune;
mod query;
mod render_data;
mod store;
mod traversal;
mod tree;

pub use builder::QuadTreeBuilder;
pub use lod_distance::LodDistances;
pub use materials::assign_material_buckets;
pub use node::{INVALID_PARENT, NO_CHILD, Node};
pub use query::Sample;
pub use render_data::{HitProxyId, MaterialRef, SurfaceMaterial, SurfaceRenderData};
#[cfg(feature = "selection")]
pub use traversal::TileSelection;
pub use traversal::{
    CAN_MORPH_TWICE_BIT, DrawInstance, InstanceBatch, SHOULD_MORPH_BIT, TileInstance,
    TraversalDesc, TraversalOutput,
};
pub use tree::QuadTree;
