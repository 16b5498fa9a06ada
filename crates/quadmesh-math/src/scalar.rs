//! Scalar helpers shared by the tree builder and the surface component.

/// Smallest power of two greater than or equal to `value`. Zero rounds to one.
///
/// # Panics
///
/// Panics if the result does not fit in a `u32`.
pub fn round_up_pow2(value: u32) -> u32 {
    value
        .checked_next_power_of_two()
        .expect("power of two overflows u32")
}

/// Snap `value` to the nearest multiple of `grid`. A non-positive grid
/// returns the value unchanged.
pub fn grid_snap(value: f32, grid: f32) -> f32 {
    if grid <= 0.0 {
        return value;
    }
    (value / grid + 0.5).floor() * grid
}

/// Bilinear interpolation between four corner samples.
///
/// `p00` at (0,0), `p10` at (1,0), `p01` at (0,1), `p11` at (1,1).
pub fn bilerp(p00: f32, p10: f32, p01: f32, p11: f32, x: f32, y: f32) -> f32 {
    let bottom = p00 + (p10 - p00) * x;
    let top = p01 + (p11 - p01) * x;
    bottom + (top - bottom) * y
}
