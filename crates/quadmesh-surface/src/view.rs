use glam::{Mat4, Vec3};
use quadmesh_math::Frustum;

/// Per-view camera state handed to [`QuadtreeSurface::traverse`](crate::QuadtreeSurface::traverse).
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    /// Reverse-Z view-projection used for culling.
    pub view_projection: Mat4,
    /// Camera position. Drives LOD distance and is subtracted from emitted
    /// positions so instances come out view-relative.
    pub view_origin: Vec3,
}

impl ViewState {
    /// Perspective camera at `eye` looking at `target` with +Z up.
    ///
    /// `near` and `far` are swapped into the projection to produce reverse-Z.
    pub fn look_at(eye: Vec3, target: Vec3, fov_y_deg: f32, aspect: f32, near: f32, far: f32) -> Self {
        let forward = (target - eye).normalize_or_zero();
        // Looking straight along Z leaves +Z degenerate as the up vector.
        let up = if forward.cross(Vec3::Z).length_squared() < 1e-6 {
            Vec3::Y
        } else {
            Vec3::Z
        };
        let view = Mat4::look_at_rh(eye, target, up);
        let proj = Mat4::perspective_rh(fov_y_deg.to_radians(), aspect, far, near);
        Self {
            view_projection: proj * view,
            view_origin: eye,
        }
    }

    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection)
    }

    pub fn pre_view_translation(&self) -> Vec3 {
        -self.view_origin
    }
}
