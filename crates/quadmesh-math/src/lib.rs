//! f32 box types, view frustum culling and scalar helpers for the quadmesh crates.

mod aabb;
mod frustum;
mod scalar;

pub use aabb::{Aabb, Rect};
pub use frustum::Frustum;
pub use scalar::{bilerp, grid_snap, round_up_pow2};
