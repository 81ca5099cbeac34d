//! Camera roll while strafing.

use glam::Vec3;

use crate::math::yaw_right;

/// Roll angle (degrees) for strafing at `velocity` while facing `yaw`.
///
/// Ramps linearly with sideways speed up to `speed`, then holds at `angle`.
/// Positive when moving right. Either parameter at zero disables the roll.
pub fn camera_roll(velocity: Vec3, yaw: f32, angle: f32, speed: f32) -> f32 {
    if angle == 0.0 || speed == 0.0 {
        return 0.0;
    }

    let side = velocity.dot(yaw_right(yaw));
    let magnitude = side.abs();

    let roll = if magnitude < speed {
        magnitude * angle / speed
    } else {
        angle
    };

    roll.copysign(side)
}
