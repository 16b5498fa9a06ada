//! Per-level LOD distance bands.

/// Distance bands for LOD selection, derived from the leaf tile size.
///
/// Level `n` covers observers up to `2^(n+1) * leaf_size * lod_scale` away,
/// so every level is twice as wide as the one below it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodDistances {
    leaf_size: f32,
    lod_scale: f32,
}

impl LodDistances {
    /// # Panics
    ///
    /// Panics if either value is not positive.
    pub fn new(leaf_size: f32, lod_scale: f32) -> Self {
        assert!(leaf_size > 0.0, "leaf size must be positive");
        assert!(lod_scale > 0.0, "lod scale must be positive");
        Self {
            leaf_size,
            lod_scale,
        }
    }

    /// Maximum observer distance for which `level` is fine enough.
    pub fn distance(&self, level: u32) -> f32 {
        2.0_f32.powi(level as i32 + 1) * self.leaf_size * self.lod_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_doubles_per_level() {
        let lod = LodDistances::new(100.0, 1.0);
        assert_eq!(lod.distance(0), 200.0);
        assert_eq!(lod.distance(1), 400.0);
        assert_eq!(lod.distance(4), 3200.0);
    }

    #[test]
    fn test_bands_grow_with_level() {
        let lod = LodDistances::new(50.0, 0.3);
        for level in 0..16 {
            assert!(lod.distance(level + 1) > lod.distance(level), "level {level}");
        }
    }

    #[test]
    fn test_lod_scale_scales_bands() {
        let lod = LodDistances::new(100.0, 2.5);
        assert_eq!(lod.distance(0), 500.0);
    }

    #[test]
    #[should_panic(expected = "lod scale must be positive")]
    fn test_non_positive_scale_panics() {
        LodDistances::new(1.0, 0.0);
    }
}
