//! Agent state, per-tick input and movement events.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::collision::{CollisionHit, CollisionShape};

use super::config::MovementConfig;
use super::jump::JumpState;

/// Which physics phase runs each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementMode {
    /// Moving along a floor.
    Walking,
    /// Airborne under gravity.
    #[default]
    Falling,
    /// Free flight with fluid friction, no gravity.
    Flying,
    /// Not moving at all.
    None,
}

/// Last known floor under the agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorResult {
    /// Raw probe result.
    pub hit: CollisionHit,

    /// Whether the floor can be stood on.
    pub walkable: bool,

    /// Gap between the capsule base and the floor.
    pub floor_dist: f32,
}

impl FloorResult {
    /// Whether the probe found a blocking surface.
    #[inline]
    pub fn blocking_hit(&self) -> bool {
        self.hit.blocking
    }

    #[inline]
    pub fn is_walkable_floor(&self) -> bool {
        self.walkable && self.hit.blocking
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Complete movement state for one agent.
///
/// Owned by a single simulator and mutated only by the movement phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// Capsule centre in world space.
    pub position: Vec3,

    /// Facing angle around +Z (radians).
    pub orientation_yaw: f32,

    /// Linear velocity (cm/s).
    pub velocity: Vec3,

    /// Input acceleration applied this tick.
    pub acceleration: Vec3,

    /// Magnitude of the wish vector in [0, 1].
    pub analog_input_modifier: f32,

    /// World-space wish vector of the current tick.
    pub last_input_vector: Vec3,

    pub mode: MovementMode,

    pub current_floor: FloorResult,

    /// Multiplier in [0, 1] on acceleration and braking, refreshed every tick.
    pub surface_friction: f32,

    /// True once the agent has spent a whole tick on the ground.
    pub braking_tolerated: bool,

    /// Step height, scaled down with speed.
    pub max_step_height: f32,

    /// Walkable floor normal Z, scaled up with speed.
    pub walkable_floor_z: f32,

    /// Collision volume; without one every movement call is a no-op.
    pub capsule: Option<CollisionShape>,

    /// Walk toggle held.
    pub wants_to_walk: bool,

    /// Velocity is driven externally.
    pub root_motion_active: bool,

    pub jump: JumpState,

    /// Apex splits spent this tick.
    pub jump_apex_attempts: u32,

    /// Cosmetic camera roll.
    pub camera_roll: f32,
}

impl AgentState {
    /// Create a state at rest at the origin, with the config's capsule.
    pub fn new(config: &MovementConfig) -> Self {
        Self {
            position: Vec3::ZERO,
            orientation_yaw: 0.0,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            analog_input_modifier: 0.0,
            last_input_vector: Vec3::ZERO,
            mode: MovementMode::default(),
            current_floor: FloorResult::default(),
            surface_friction: 1.0,
            braking_tolerated: false,
            max_step_height: config.default_step_height,
            walkable_floor_z: config.default_walkable_floor_z,
            capsule: Some(CollisionShape::capsule(
                config.capsule_radius,
                config.capsule_half_height,
            )),
            wants_to_walk: false,
            root_motion_active: false,
            jump: JumpState::new(),
            jump_apex_attempts: 0,
            camera_roll: 0.0,
        }
    }

    /// Whether the agent has a collision volume to move.
    #[inline]
    pub fn has_valid_data(&self) -> bool {
        self.capsule.is_some()
    }

    #[inline]
    pub fn is_falling(&self) -> bool {
        self.mode == MovementMode::Falling
    }

    #[inline]
    pub fn is_moving_on_ground(&self) -> bool {
        self.mode == MovementMode::Walking
    }

    /// Capsule radius and half height, zero without a capsule.
    pub fn capsule_size(&self) -> (f32, f32) {
        self.capsule
            .map(|shape| (shape.radius(), shape.half_height()))
            .unwrap_or((0.0, 0.0))
    }
}

/// Input for a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementInput {
    /// Desired direction in the agent's frame (x = right, y = forward), length ≤ 1.
    pub wish: Vec2,

    /// Jump button state; a jump triggers on the press edge.
    pub jump_pressed: bool,

    /// Walk toggle.
    pub wants_to_walk: bool,

    /// Explicit airborne slide request (lowers friction while rising).
    pub sliding: bool,

    /// View delta (pitch, yaw) in radians. Carried for the driver; the
    /// simulator does not read it.
    pub look_delta: Vec2,
}

impl MovementInput {
    /// Input with only a wish direction.
    pub fn wish(wish: Vec2) -> Self {
        Self {
            wish,
            ..Default::default()
        }
    }

    /// Check if any movement input is active.
    #[inline]
    pub fn has_movement_input(&self) -> bool {
        self.wish.length_squared() > 0.0
    }
}

/// Something noteworthy that happened during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MovementEvent {
    ModeChanged {
        from: MovementMode,
        to: MovementMode,
    },
    Jumped,
    /// The agent landed with `remaining_time` of the tick left to simulate.
    Landed {
        remaining_time: f32,
    },
    /// Vertical velocity went negative after a jump.
    JumpApex,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_uses_config_defaults() {
        let config = MovementConfig::default();
        let state = AgentState::new(&config);

        assert!(state.has_valid_data());
        assert_eq!(state.mode, MovementMode::Falling);
        assert_eq!(state.surface_friction, 1.0);
        assert_eq!(state.max_step_height, config.default_step_height);
        assert_eq!(state.walkable_floor_z, config.default_walkable_floor_z);
        assert_eq!(state.capsule_size(), (42.0, 96.0));
    }

    #[test]
    fn test_no_capsule_is_invalid() {
        let mut state = AgentState::new(&MovementConfig::default());
        state.capsule = None;
        assert!(!state.has_valid_data());
        assert_eq!(state.capsule_size(), (0.0, 0.0));
    }

    #[test]
    fn test_floor_result_walkable_needs_blocking_hit() {
        let mut floor = FloorResult {
            walkable: true,
            ..Default::default()
        };
        assert!(!floor.is_walkable_floor());

        floor.hit.blocking = true;
        assert!(floor.is_walkable_floor());

        floor.clear();
        assert!(!floor.blocking_hit());
    }
}
