//! View frustum culling of world-space AABBs against view-projection planes.

use glam::{Mat4, Vec3, Vec4};

use crate::Aabb;

/// Plane indices into the frustum planes array.
const LEFT: usize = 0;
const RIGHT: usize = 1;
const BOTTOM: usize = 2;
const TOP: usize = 3;
const NEAR: usize = 4;
const FAR: usize = 5;

/// A view frustum defined by six inward-pointing planes extracted from
/// the view-projection matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Frustum {
    /// Six planes: left, right, bottom, top, near, far.
    /// Each `Vec4(a, b, c, d)` where `(a,b,c)` is the normalized inward
    /// normal and `d` is the signed distance term.
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a combined view-projection matrix
    /// using the Griggs-Hartmann method.
    ///
    /// Expects a reverse-Z projection (near maps to z=1, far to z=0).
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let rows = [vp.row(0), vp.row(1), vp.row(2), vp.row(3)];

        let mut planes = [Vec4::ZERO; 6];
        planes[LEFT] = rows[3] + rows[0];
        planes[RIGHT] = rows[3] - rows[0];
        planes[BOTTOM] = rows[3] + rows[1];
        planes[TOP] = rows[3] - rows[1];
        // Reverse-Z: row3-row2 bounds the near clip, row2 alone the far clip.
        planes[NEAR] = rows[3] - rows[2];
        planes[FAR] = rows[2];

        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                *plane /= len;
            }
        }

        Self { planes }
    }

    /// A frustum that accepts every box. Handy for tools and tests that
    /// want LOD selection without view culling.
    pub fn everything() -> Self {
        Self {
            planes: [Vec4::W; 6],
        }
    }

    /// Test whether an AABB is at least partially inside the frustum.
    ///
    /// Uses the p-vertex method: for each plane, find the corner of the AABB
    /// furthest along the plane normal. If that corner is behind the plane,
    /// the entire AABB is outside. Conservative near frustum corners.
    pub fn is_visible(&self, aabb: &Aabb) -> bool {
        for plane in &self.planes {
            let normal = plane.truncate();
            let d = plane.w;

            let p = Vec3::new(
                if normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );

            if normal.dot(p) + d < 0.0 {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Camera 500 units above the origin looking straight down -Z, with +Y up
    /// on screen.
    fn top_down_vp() -> Mat4 {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 500.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(
            std::f32::consts::FRAC_PI_2,
            1.0,
            10_000.0, // reverse-Z: far as near param
            1.0,      // reverse-Z: near as far param
        );
        proj * view
    }

    #[test]
    fn test_box_below_camera_visible() {
        let frustum = Frustum::from_view_projection(&top_down_vp());
        let b = Aabb::new(Vec3::new(-50.0, -50.0, 0.0), Vec3::new(50.0, 50.0, 1.0));
        assert!(frustum.is_visible(&b));
    }

    #[test]
    fn test_box_above_camera_not_visible() {
        let frustum = Frustum::from_view_projection(&top_down_vp());
        let b = Aabb::new(Vec3::new(-5.0, -5.0, 600.0), Vec3::new(5.0, 5.0, 700.0));
        assert!(!frustum.is_visible(&b));
    }

    #[test]
    fn test_box_far_to_the_side_not_visible() {
        let frustum = Frustum::from_view_projection(&top_down_vp());
        // 90 degree fov at 500 units covers roughly +-500 on the ground.
        let b = Aabb::new(Vec3::new(3000.0, -5.0, 0.0), Vec3::new(3100.0, 5.0, 1.0));
        assert!(!frustum.is_visible(&b));
    }

    #[test]
    fn test_box_partially_inside_visible() {
        let frustum = Frustum::from_view_projection(&top_down_vp());
        let b = Aabb::new(Vec3::new(400.0, -5.0, 0.0), Vec3::new(3000.0, 5.0, 1.0));
        assert!(frustum.is_visible(&b));
    }

    #[test]
    fn test_everything_accepts_any_box() {
        let frustum = Frustum::everything();
        let b = Aabb::new(Vec3::splat(-1.0e9), Vec3::splat(-1.0e9 + 1.0));
        assert!(frustum.is_visible(&b));
    }

    #[test]
    fn test_planes_normalized() {
        let frustum = Frustum::from_view_projection(&top_down_vp());
        for plane in &frustum.planes {
            let normal_len = plane.truncate().length();
            assert!(
                (normal_len - 1.0).abs() < 1e-4,
                "plane normal not normalized: {normal_len}"
            );
        }
    }
}
