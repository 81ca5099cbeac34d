//! Movement configuration.
//!
//! All movement tunables are grouped here for easy tuning. Values are in
//! engine units: centimetres, seconds and cm/s.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by [`MovementConfig::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("{low} ({low_value}) must not exceed {high} ({high_value})")]
    InvertedRange {
        low: &'static str,
        low_value: f32,
        high: &'static str,
        high_value: f32,
    },

    #[error("{field} must be finite")]
    NotFinite { field: &'static str },

    #[error("max_simulation_iterations must be at least 1")]
    NoIterations,
}

/// Configuration for agent movement physics.
///
/// Read-only to the simulator: nothing in the movement code writes to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    // ========================================================================
    // Collision Volume
    // ========================================================================
    pub capsule_radius: f32,

    /// Centre to tip of either cap.
    pub capsule_half_height: f32,

    // ========================================================================
    // Speeds and Acceleration
    // ========================================================================
    /// Magnitude of the input acceleration for a full-length wish vector.
    pub max_acceleration: f32,

    /// Cruise speed when not walking.
    pub base_speed: f32,

    /// Cruise speed while the walk toggle is held.
    pub walk_speed: f32,

    /// Lowest max speed a partial analog input can produce while grounded or falling.
    pub min_analog_walk_speed: f32,

    /// Below this horizontal speed the step height and walkable slope reset to defaults.
    pub max_walk_speed_crouched: f32,

    pub ground_acceleration_modifier: f32,
    pub air_acceleration_modifier: f32,

    /// Cap on the wish speed used for air acceleration.
    pub air_speed_cap: f32,

    /// Hard per-axis velocity clamp.
    pub axis_speed_limit: f32,

    // ========================================================================
    // Friction and Braking
    // ========================================================================
    pub ground_friction: f32,
    pub braking_friction: f32,
    /// Use `braking_friction` instead of the phase friction when braking.
    pub use_separate_braking_friction: bool,
    pub braking_friction_factor: f32,
    /// Braking is integrated in slices of this length (clamped to [1/75, 1/20]).
    pub braking_sub_step_time: f32,
    pub braking_deceleration_walking: f32,
    pub braking_deceleration_falling: f32,
    pub braking_deceleration_flying: f32,
    pub falling_lateral_friction: f32,
    /// Friction of the surrounding fluid while flying.
    pub fluid_friction: f32,

    // ========================================================================
    // Gravity and Jumping
    // ========================================================================
    /// Vertical gravity acceleration (negative is down).
    pub gravity_z: f32,

    /// Maximum fall speed magnitude.
    pub terminal_velocity: f32,

    /// Takeoff vertical velocity.
    pub jump_z_velocity: f32,

    /// Vertical speed that still counts as "ascending through a jump".
    ///
    /// Landings that would deflect upward faster than this are rejected, and
    /// surface friction is restored once the agent is past it.
    pub jump_velocity_threshold: f32,

    /// How long holding jump keeps the jump force applied.
    pub jump_max_hold_time: f32,

    /// Jumps allowed before landing again.
    pub jump_max_count: u32,

    /// Keep applying gravity while the jump force window is open.
    pub apply_gravity_while_jumping: bool,

    pub can_jump: bool,
    pub can_fly: bool,

    // ========================================================================
    // Steps and Slopes
    // ========================================================================
    pub default_step_height: f32,

    /// Step height reached at full slide speed.
    pub min_step_height: f32,

    /// Minimum floor normal Z to be walkable when not sliding.
    /// 0.7 ≈ 45 degrees.
    pub default_walkable_floor_z: f32,

    /// Walkable floor normal Z reached at full slide speed.
    pub steep_walkable_floor_z: f32,

    /// Speed at which step/slope scaling starts.
    pub min_slope_speed: f32,

    /// Speed at which step/slope scaling is complete.
    pub max_slope_speed: f32,

    /// Friction-scaled speed ratio below which a ramp launches the agent.
    pub slide_limit: f32,

    /// Surface friction used while explicitly sliding in the air.
    pub sliding_surface_friction: f32,

    /// Hovering band above the floor.
    pub min_floor_dist: f32,
    pub max_floor_dist: f32,

    /// Treat the capsule bottom as flat for landing and floor checks.
    pub use_flat_base_for_floor_checks: bool,

    /// Ledge perch recovery is enabled when positive.
    pub perch_radius_threshold: f32,

    // ========================================================================
    // Simulation
    // ========================================================================
    pub max_simulation_time_step: f32,
    pub max_simulation_iterations: u32,
    /// Apex splits allowed per tick.
    pub max_jump_apex_attempts: u32,

    // ========================================================================
    // Camera
    // ========================================================================
    /// Maximum roll angle.
    pub cam_roll_angle: f32,

    /// Lateral speed at which the full roll angle is reached.
    pub cam_roll_speed: f32,

    /// Extra normal rejection when sliding off surfaces in the air.
    pub cam_bounce_modifier: f32,

    // ========================================================================
    // Physical Interaction (not used by the movement code)
    // ========================================================================
    pub mass: f32,
    pub push_force_factor: f32,
    pub initial_push_force_factor: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        let base_speed = 609.6;

        Self {
            // Collision volume
            capsule_radius: 42.0,
            capsule_half_height: 96.0,

            // Speeds
            max_acceleration: 857.25,
            base_speed,
            walk_speed: 285.75,
            min_analog_walk_speed: 20.0,
            max_walk_speed_crouched: 300.0,
            ground_acceleration_modifier: 10.0,
            air_acceleration_modifier: 10.0,
            air_speed_cap: 57.15,
            axis_speed_limit: 6667.5,

            // Friction
            ground_friction: 4.0,
            braking_friction: 4.0,
            use_separate_braking_friction: false,
            braking_friction_factor: 1.0,
            braking_sub_step_time: 0.015,
            braking_deceleration_walking: 190.5,
            braking_deceleration_falling: 0.0,
            braking_deceleration_flying: 190.5,
            falling_lateral_friction: 0.0,
            fluid_friction: 0.3,

            // Gravity and jumping
            gravity_z: -1143.0,
            terminal_velocity: 4000.0,
            jump_z_velocity: 304.8,
            jump_velocity_threshold: 266.7,
            jump_max_hold_time: 0.0,
            jump_max_count: 1,
            apply_gravity_while_jumping: true,
            can_jump: true,
            can_fly: true,

            // Steps and slopes
            default_step_height: 34.29,
            min_step_height: 10.0,
            default_walkable_floor_z: 0.7,
            steep_walkable_floor_z: 0.9848,
            min_slope_speed: base_speed * 1.7,
            max_slope_speed: base_speed * 2.5,
            slide_limit: 0.5,
            sliding_surface_friction: 0.25,
            min_floor_dist: 1.9,
            max_floor_dist: 2.4,
            use_flat_base_for_floor_checks: true,
            perch_radius_threshold: 0.0,

            // Simulation
            max_simulation_time_step: 0.5,
            max_simulation_iterations: 1,
            max_jump_apex_attempts: 2,

            // Camera
            cam_roll_angle: 0.0,
            cam_roll_speed: 0.0,
            cam_bounce_modifier: 0.0,

            // Physical interaction
            mass: 85.0,
            push_force_factor: 500.0,
            initial_push_force_factor: 100.0,
        }
    }
}

impl MovementConfig {
    /// Create a "fast arcade" config: bouncier slides, camera roll and
    /// finer sub-stepping.
    pub fn arcade() -> Self {
        Self {
            air_speed_cap: 76.2,
            cam_roll_angle: 2.0,
            cam_roll_speed: 400.0,
            cam_bounce_modifier: 0.5,
            max_simulation_iterations: 8,
            max_simulation_time_step: 0.05,
            perch_radius_threshold: 1.0,
            jump_max_count: 2,
            ..Default::default()
        }
    }

    /// Create a "tactical" config: slower, grippier and with little air control.
    pub fn tactical() -> Self {
        let base_speed = 457.2;
        Self {
            base_speed,
            walk_speed: 228.6,
            min_slope_speed: base_speed * 1.7,
            max_slope_speed: base_speed * 2.5,
            air_speed_cap: 30.0,
            ground_friction: 6.0,
            braking_friction: 6.0,
            jump_z_velocity: 266.7,
            max_simulation_iterations: 4,
            max_simulation_time_step: 0.05,
            ..Default::default()
        }
    }

    /// Average of the hovering band above the floor.
    #[inline]
    pub fn floor_dist_midpoint(&self) -> f32 {
        (self.min_floor_dist + self.max_floor_dist) * 0.5
    }

    /// Check the config for values the simulator cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("gravity_z", self.gravity_z),
            ("max_acceleration", self.max_acceleration),
            ("ground_friction", self.ground_friction),
            ("braking_friction", self.braking_friction),
            ("jump_z_velocity", self.jump_z_velocity),
            ("cam_bounce_modifier", self.cam_bounce_modifier),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field });
            }
        }

        let positive = [
            ("capsule_radius", self.capsule_radius),
            ("base_speed", self.base_speed),
            ("walk_speed", self.walk_speed),
            ("axis_speed_limit", self.axis_speed_limit),
            ("terminal_velocity", self.terminal_velocity),
            ("braking_sub_step_time", self.braking_sub_step_time),
            ("max_simulation_time_step", self.max_simulation_time_step),
            ("max_floor_dist", self.max_floor_dist),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        if self.max_simulation_iterations == 0 {
            return Err(ConfigError::NoIterations);
        }

        let unit = [
            ("default_walkable_floor_z", self.default_walkable_floor_z),
            ("steep_walkable_floor_z", self.steep_walkable_floor_z),
            ("sliding_surface_friction", self.sliding_surface_friction),
        ];
        for (field, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }

        let ordered = [
            (
                ("capsule_radius", self.capsule_radius),
                ("capsule_half_height", self.capsule_half_height),
            ),
            (
                ("min_step_height", self.min_step_height),
                ("default_step_height", self.default_step_height),
            ),
            (
                ("min_floor_dist", self.min_floor_dist),
                ("max_floor_dist", self.max_floor_dist),
            ),
        ];
        for ((low, low_value), (high, high_value)) in ordered {
            if low_value > high_value {
                return Err(ConfigError::InvertedRange {
                    low,
                    low_value,
                    high,
                    high_value,
                });
            }
        }

        // Equal slope speeds would divide by zero in the step scaling
        if self.min_slope_speed >= self.max_slope_speed {
            return Err(ConfigError::InvertedRange {
                low: "min_slope_speed",
                low_value: self.min_slope_speed,
                high: "max_slope_speed",
                high_value: self.max_slope_speed,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MovementConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.walk_speed, 285.75);
        assert!((config.min_slope_speed - 1036.32).abs() < 1e-3);
        assert!((config.max_slope_speed - 1524.0).abs() < 1e-3);
        assert!((config.floor_dist_midpoint() - 2.15).abs() < 1e-6);
    }

    #[test]
    fn test_presets_validate() {
        assert!(MovementConfig::arcade().validate().is_ok());
        assert!(MovementConfig::tactical().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = MovementConfig {
            capsule_radius: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { field: "capsule_radius", .. })
        ));

        let config = MovementConfig {
            max_simulation_iterations: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoIterations));

        let config = MovementConfig {
            min_floor_dist: 3.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange { low: "min_floor_dist", .. })
        ));

        let config = MovementConfig {
            min_slope_speed: 2000.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = MovementConfig {
            default_walkable_floor_z: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::OutOfRange { .. })));
    }

    #[test]
    fn test_error_message() {
        let err = ConfigError::NotPositive {
            field: "walk_speed",
            value: -1.0,
        };
        assert_eq!(err.to_string(), "walk_speed must be positive, got -1");
    }
}
