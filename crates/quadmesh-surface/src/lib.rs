//! Owning component for a quadtree surface.
//!
//! [`QuadtreeSurface`] holds the placement settings and the patch list,
//! turns explicit rebuild requests into fresh sealed trees on
//! [`update`](QuadtreeSurface::update), and runs per-view traversals against
//! the current tree.

mod error;
mod settings;
mod surface;
mod view;

pub use error::SurfaceError;
pub use settings::{SurfacePatch, SurfaceSettings};
pub use surface::{QuadtreeSurface, RebuildRequest};
pub use view::ViewState;
