//! Overridable movement decisions.
//!
//! [`MovementPolicy`] collects the handful of rules a game is expected to
//! customise. Every method has a default, so an implementation only
//! overrides what it needs. [`DefaultPolicy`] uses all of them unchanged.

use glam::Vec3;

use crate::collision::CollisionHit;
use crate::math::{size_2d, yaw_right, KINDA_SMALL_NUMBER};

use super::config::MovementConfig;
use super::friction::friction_from_hit;
use super::jump::can_attempt_jump;
use super::state::{AgentState, FloorResult};

/// Game-specific movement rules.
pub trait MovementPolicy {
    /// Cruise speed: walk speed while the walk toggle is held, base speed otherwise.
    fn max_speed(&self, state: &AgentState, config: &MovementConfig) -> f32 {
        if state.wants_to_walk {
            config.walk_speed
        } else {
            config.base_speed
        }
    }

    /// Whether falling should stop acceleration from pushing into walls.
    fn should_limit_air_control(&self, _state: &AgentState, _fall_acceleration: Vec3) -> bool {
        false
    }

    /// Whether moving from `old_floor` to `new_floor` launches the agent.
    ///
    /// Fast agents with little friction leave the ground when the ramp gets
    /// steeper under them, if they were heading up it or strafing across it.
    fn should_catch_air(
        &self,
        state: &AgentState,
        config: &MovementConfig,
        old_floor: &FloorResult,
        new_floor: &FloorResult,
    ) -> bool {
        let speed = size_2d(state.velocity);
        if speed <= KINDA_SMALL_NUMBER {
            return false;
        }

        let old_friction = self.surface_friction_from_hit(&old_floor.hit);
        let speed_mod = config.max_slope_speed / speed;
        let ramp_diff = new_floor.hit.impact_normal.z - old_floor.hit.impact_normal.z;
        let slope = state.velocity.dot(old_floor.hit.impact_normal);
        let strafe = state
            .last_input_vector
            .dot(yaw_right(state.orientation_yaw))
            .abs();

        let sliding = old_friction * speed_mod < config.slide_limit;
        let gaining_ramp = ramp_diff >= 0.0;
        let going_up_ramp = slope < 0.0;
        let strafing_off_ramp = strafe > 0.0;

        sliding && gaining_ramp && (going_up_ramp || strafing_off_ramp)
    }

    /// Friction multiplier for standing on the surface in `hit`.
    fn surface_friction_from_hit(&self, hit: &CollisionHit) -> f32 {
        friction_from_hit(hit)
    }

    /// Whether a jump may be attempted from the current state.
    fn can_attempt_jump(&self, state: &AgentState, config: &MovementConfig) -> bool {
        can_attempt_jump(state, config)
    }
}

/// The stock rule set.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl MovementPolicy for DefaultPolicy {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::SurfaceMaterial;

    fn floor(normal: Vec3, friction: Option<f32>) -> FloorResult {
        let mut hit = CollisionHit::blocking(0.1, Vec3::ZERO, Vec3::ZERO, normal);
        hit.material = friction.map(SurfaceMaterial::new);
        FloorResult {
            hit,
            walkable: true,
            floor_dist: 2.0,
        }
    }

    #[test]
    fn test_max_speed_follows_walk_toggle() {
        let config = MovementConfig::default();
        let mut state = AgentState::new(&config);

        assert_eq!(DefaultPolicy.max_speed(&state, &config), 609.6);
        state.wants_to_walk = true;
        assert_eq!(DefaultPolicy.max_speed(&state, &config), 285.75);
    }

    #[test]
    fn test_catch_air_when_sliding_up_steeper_ramp() {
        let config = MovementConfig::default();
        let mut state = AgentState::new(&config);

        let old_normal = Vec3::new(-0.6, 0.0, 0.8);
        let new_normal = Vec3::new(-0.3, 0.0, 0.954).normalize();

        // Fast and slippery, running up the ramp (+X, into the old normal)
        state.velocity = Vec3::new(2000.0, 0.0, 0.0);
        let old_floor = floor(old_normal, Some(0.2));
        let new_floor = floor(new_normal, None);
        assert!(DefaultPolicy.should_catch_air(&state, &config, &old_floor, &new_floor));

        // Full friction keeps the agent grounded
        let grippy = floor(old_normal, None);
        assert!(!DefaultPolicy.should_catch_air(&state, &config, &grippy, &new_floor));

        // Going down the ramp without strafing stays grounded
        state.velocity = Vec3::new(-2000.0, 0.0, 0.0);
        assert!(!DefaultPolicy.should_catch_air(&state, &config, &old_floor, &new_floor));

        // ...unless strafing across it
        state.last_input_vector = Vec3::Y;
        assert!(DefaultPolicy.should_catch_air(&state, &config, &old_floor, &new_floor));
    }

    #[test]
    fn test_no_catch_air_at_rest() {
        let config = MovementConfig::default();
        let state = AgentState::new(&config);
        let floor = floor(Vec3::Z, Some(0.0));
        assert!(!DefaultPolicy.should_catch_air(&state, &config, &floor, &floor));
    }
}
