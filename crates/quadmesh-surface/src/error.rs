//! Surface error types.

use glam::IVec2;

/// Settings rejected by [`QuadtreeSurface`](crate::QuadtreeSurface) before a
/// rebuild. The previous tree stays in place when one is returned.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SurfaceError {
    #[error("tile size must be positive and finite, got {0}")]
    InvalidTileSize(f32),

    #[error("extent in tiles must be positive on both axes, got {0}")]
    InvalidExtent(IVec2),

    #[error("density count must be at least 1")]
    InvalidDensityCount,

    #[error("lod scale must be positive and finite, got {0}")]
    InvalidLodScale(f32),
}
