//! 2D vector helpers
//!
//! `glam::DVec2` is the vector type; these helpers add the few operations the
//! engine needs with the zero-vector cases pinned down (never NaN).

use glam::DVec2;

/// Position/velocity vector used throughout the simulation
pub type Vector2D = DVec2;

/// Unit vector in the direction of `v`, or zero for a degenerate vector
#[inline]
pub fn safe_normalize(v: DVec2) -> DVec2 {
    v.normalize_or_zero()
}

/// Rotate `v` counter-clockwise by `theta` radians
#[inline]
pub fn rotate(v: DVec2, theta: f64) -> DVec2 {
    if !theta.is_finite() {
        return v;
    }
    DVec2::from_angle(theta).rotate(v)
}

/// Signed angle from `from` to `to` in (-π, π]; zero if either is degenerate
pub fn signed_angle(from: DVec2, to: DVec2) -> f64 {
    if from.length_squared() == 0.0 || to.length_squared() == 0.0 {
        return 0.0;
    }
    from.perp_dot(to).atan2(from.dot(to))
}

/// Component of `v` perpendicular to the unit vector `dir` (positive = left of `dir`)
#[inline]
pub fn perpendicular_component(v: DVec2, dir: DVec2) -> f64 {
    v.dot(dir.perp())
}

/// Clamp the length of `v` to `max` (zero-safe)
#[inline]
pub fn clamp_length(v: DVec2, max: f64) -> DVec2 {
    if max <= 0.0 {
        return DVec2::ZERO;
    }
    v.clamp_length_max(max)
}
