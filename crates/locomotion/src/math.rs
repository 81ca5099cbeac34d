//! Small vector helpers and numeric tolerances shared by the movement code.
//!
//! The simulator works in a Z-up world (X forward, Y right) measured in
//! engine units (centimetres). Most horizontal quantities are therefore the
//! XY part of a [`Vec3`], which these helpers make explicit.

use glam::{Vec2, Vec3};

/// Generic "close enough to zero" tolerance.
pub const KINDA_SMALL_NUMBER: f32 = 1.0e-4;

/// Tighter tolerance for squared lengths and normalisation guards.
pub const SMALL_NUMBER: f32 = 1.0e-8;

/// Any simulation step shorter than this is ignored.
pub const MIN_TICK_TIME: f32 = 1.0e-6;

/// Horizontal (XY) length of a vector.
#[inline]
pub fn size_2d(v: Vec3) -> f32 {
    v.truncate().length()
}

/// Squared horizontal (XY) length of a vector.
#[inline]
pub fn size_squared_2d(v: Vec3) -> f32 {
    v.truncate().length_squared()
}

/// Unit vector of the XY part, or zero when the XY part is degenerate.
#[inline]
pub fn safe_normal_2d(v: Vec3) -> Vec3 {
    let flat = v.truncate();
    let len_sq = flat.length_squared();
    if len_sq < SMALL_NUMBER {
        Vec3::ZERO
    } else {
        (flat / len_sq.sqrt()).extend(0.0)
    }
}

/// Scale the XY part down to at most `max` while keeping Z untouched.
#[inline]
pub fn clamped_to_max_size_2d(v: Vec3, max: f32) -> Vec3 {
    if max < KINDA_SMALL_NUMBER {
        return Vec3::new(0.0, 0.0, v.z);
    }

    let len_sq = size_squared_2d(v);
    if len_sq > max * max {
        let scale = max / len_sq.sqrt();
        Vec3::new(v.x * scale, v.y * scale, v.z)
    } else {
        v
    }
}

/// True when every component lies within `tolerance` of zero.
#[inline]
pub fn is_nearly_zero(v: Vec3, tolerance: f32) -> bool {
    v.x.abs() <= tolerance && v.y.abs() <= tolerance && v.z.abs() <= tolerance
}

#[inline]
pub fn is_nearly_equal(a: f32, b: f32, tolerance: f32) -> bool {
    (a - b).abs() <= tolerance
}

/// Project `v` onto the (assumed unit) `normal`.
#[inline]
pub fn project_onto_normal(v: Vec3, normal: Vec3) -> Vec3 {
    normal * v.dot(normal)
}

/// Remove the `normal` component from `v`.
#[inline]
pub fn plane_project(v: Vec3, normal: Vec3) -> Vec3 {
    v - project_onto_normal(v, normal)
}

#[inline]
pub fn lerp(a: f32, b: f32, alpha: f32) -> f32 {
    a + (b - a) * alpha
}

/// Forward direction on the ground plane for a yaw angle (radians).
#[inline]
pub fn yaw_forward(yaw: f32) -> Vec3 {
    let (sin, cos) = yaw.sin_cos();
    Vec3::new(cos, sin, 0.0)
}

/// Right direction on the ground plane for a yaw angle (radians).
#[inline]
pub fn yaw_right(yaw: f32) -> Vec3 {
    let (sin, cos) = yaw.sin_cos();
    Vec3::new(-sin, cos, 0.0)
}

/// Rotate a local wish vector (x = right, y = forward) into world space.
pub fn wish_to_world(wish: Vec2, yaw: f32) -> Vec3 {
    yaw_forward(yaw) * wish.y + yaw_right(yaw) * wish.x
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_clamped_to_max_size_2d_keeps_z() {
        let v = Vec3::new(30.0, 40.0, 7.0);
        let clamped = clamped_to_max_size_2d(v, 10.0);
        assert!((size_2d(clamped) - 10.0).abs() < 1e-4);
        assert_eq!(clamped.z, 7.0);

        // Under the cap: untouched
        assert_eq!(clamped_to_max_size_2d(v, 100.0), v);
    }

    #[test]
    fn test_safe_normal_2d_degenerate() {
        assert_eq!(safe_normal_2d(Vec3::new(0.0, 0.0, 5.0)), Vec3::ZERO);
        let n = safe_normal_2d(Vec3::new(3.0, 4.0, 9.0));
        assert!((n - Vec3::new(0.6, 0.8, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_wish_to_world() {
        // Facing +X: forward input moves along +X, right input along +Y
        let w = wish_to_world(Vec2::new(0.0, 1.0), 0.0);
        assert!((w - Vec3::X).length() < 1e-6);
        let w = wish_to_world(Vec2::new(1.0, 0.0), 0.0);
        assert!((w - Vec3::Y).length() < 1e-6);

        // Facing +Y
        let w = wish_to_world(Vec2::new(0.0, 1.0), FRAC_PI_2);
        assert!((w - Vec3::Y).length() < 1e-6);
    }
}
