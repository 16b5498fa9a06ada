use glam::{Vec2, Vec3};

/// Axis-aligned rectangle in world XY.
///
/// Unlike [`Aabb::new`], the constructor does not sort its corners: an empty
/// or inverted rectangle is representable and reports a non-positive area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Create a rectangle from its min and max corners.
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Size along each axis.
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Area of the rectangle. Non-positive for empty or inverted rectangles.
    pub fn area(&self) -> f32 {
        let size = self.size();
        if size.x <= 0.0 || size.y <= 0.0 {
            return 0.0;
        }
        size.x * size.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Returns true if the point lies inside or on the boundary.
    pub fn contains_inclusive(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Returns true if the point lies inside, counting the min edges but not
    /// the max edges. Adjacent rectangles therefore never both claim a point.
    pub fn contains_half_open(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Returns true if `other` lies entirely inside or on this rectangle.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.contains_inclusive(other.min) && self.contains_inclusive(other.max)
    }

    /// Returns true if the interiors overlap. Rectangles that only share an
    /// edge or a corner do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Squared distance from the point to the closest point of the rectangle.
    /// Zero when the point is inside.
    pub fn distance_squared_to_point(&self, p: Vec2) -> f32 {
        let closest = p.clamp(self.min, self.max);
        p.distance_squared(closest)
    }

    /// Returns a rectangle shrunk by `margin` on every side.
    pub fn shrink_by(&self, margin: Vec2) -> Rect {
        Rect {
            min: self.min + margin,
            max: self.max - margin,
        }
    }
}

/// Axis-aligned bounding box in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An inverted box that any union will replace. Used to seed running Z
    /// bounds before the first insertion.
    pub const INVALID_Z: (f32, f32) = (f32::MAX, f32::MIN);

    /// Create a box from two corners. Components are sorted so that
    /// min <= max on every axis.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create a box from a footprint and a Z range, without sorting.
    pub fn from_rect(rect: Rect, min_z: f32, max_z: f32) -> Self {
        Self {
            min: rect.min.extend(min_z),
            max: rect.max.extend(max_z),
        }
    }

    /// XY footprint of the box.
    pub fn rect(&self) -> Rect {
        Rect::new(self.min.truncate(), self.max.truncate())
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half-size along each axis.
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Returns true if the Z range has been narrowed by at least one union,
    /// i.e. min.z <= max.z.
    pub fn has_valid_z(&self) -> bool {
        self.min.z <= self.max.z
    }

    /// Grow the Z range to include `[min_z, max_z]`.
    pub fn union_z(&mut self, min_z: f32, max_z: f32) {
        self.min.z = self.min.z.min(min_z);
        self.max.z = self.max.z.max(max_z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_area_of_inverted_rect_is_zero() {
        let r = Rect::new(Vec2::new(10.0, 0.0), Vec2::new(0.0, 10.0));
        assert_eq!(r.area(), 0.0);
        let r = Rect::new(Vec2::ZERO, Vec2::new(4.0, 5.0));
        assert_eq!(r.area(), 20.0);
    }

    #[test]
    fn test_half_open_containment_excludes_max_edge() {
        let r = Rect::new(Vec2::ZERO, Vec2::splat(10.0));
        assert!(r.contains_half_open(Vec2::ZERO));
        assert!(r.contains_half_open(Vec2::splat(9.999)));
        assert!(!r.contains_half_open(Vec2::new(10.0, 5.0)));
        assert!(!r.contains_half_open(Vec2::new(5.0, 10.0)));
        assert!(r.contains_inclusive(Vec2::splat(10.0)));
    }

    #[test]
    fn test_touching_rects_do_not_overlap() {
        let a = Rect::new(Vec2::ZERO, Vec2::splat(10.0));
        let b = Rect::new(Vec2::new(10.0, 0.0), Vec2::new(20.0, 10.0));
        let c = Rect::new(Vec2::new(9.0, 9.0), Vec2::new(20.0, 20.0));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn test_distance_to_point() {
        let r = Rect::new(Vec2::ZERO, Vec2::splat(10.0));
        assert_eq!(r.distance_squared_to_point(Vec2::new(5.0, 5.0)), 0.0);
        assert_eq!(r.distance_squared_to_point(Vec2::new(13.0, 14.0)), 25.0);
        assert_eq!(r.distance_squared_to_point(Vec2::new(-2.0, 5.0)), 4.0);
    }

    #[test]
    fn test_aabb_new_sorts_corners() {
        let b = Aabb::new(Vec3::new(5.0, -1.0, 2.0), Vec3::new(1.0, 3.0, -2.0));
        assert_eq!(b.min, Vec3::new(1.0, -1.0, -2.0));
        assert_eq!(b.max, Vec3::new(5.0, 3.0, 2.0));
    }

    #[test]
    fn test_union_z_from_invalid() {
        let (lo, hi) = Aabb::INVALID_Z;
        let mut b = Aabb::from_rect(Rect::new(Vec2::ZERO, Vec2::ONE), lo, hi);
        assert!(!b.has_valid_z());
        b.union_z(-3.0, 4.0);
        assert!(b.has_valid_z());
        b.union_z(0.0, 10.0);
        assert_eq!((b.min.z, b.max.z), (-3.0, 10.0));
    }

    #[test]
    fn test_center_and_extents() {
        let b = Aabb::new(Vec3::new(-2.0, -3.0, -4.0), Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(b.center(), Vec3::ZERO);
        assert_eq!(b.extents(), Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(b.rect().size(), Vec2::new(4.0, 6.0));
    }
}
