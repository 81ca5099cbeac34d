//! Velocity integration for grounded, airborne and flying movement.
//!
//! [`calc_velocity`] applies braking, fluid friction and bounded input
//! acceleration, then rescales the step height and walkable slope from the
//! resulting horizontal speed. [`apply_velocity_braking`] is the sub-stepped
//! deceleration it uses on the ground.

use glam::Vec3;

use crate::math::{
    clamped_to_max_size_2d, is_nearly_zero, lerp, safe_normal_2d, size_2d, size_squared_2d,
    KINDA_SMALL_NUMBER, MIN_TICK_TIME, SMALL_NUMBER,
};

use super::config::MovementConfig;
use super::context::TickContext;
use super::state::{AgentState, MovementMode};

/// Braking never runs slices longer or shorter than these.
const MIN_BRAKING_SUB_STEP: f32 = 1.0 / 75.0;
const MAX_BRAKING_SUB_STEP: f32 = 1.0 / 20.0;

/// Speeds within this of zero on every axis are left to settle on their own.
const BRAKING_REST_TOLERANCE: f32 = 0.1;

/// A velocity is "over max" only past this fraction of max speed squared.
const OVER_VELOCITY_PERCENT: f32 = 1.01;

// ============================================================================
// Time Steps and Decelerations
// ============================================================================

/// Length of the next sub-step.
///
/// Long remaining times are halved (capped at `max_simulation_time_step`)
/// while iterations are left. On the last iteration the whole remainder is
/// consumed.
pub fn simulation_time_step(config: &MovementConfig, remaining_time: f32, iterations: u32) -> f32 {
    let mut step = remaining_time;
    if remaining_time > config.max_simulation_time_step
        && iterations < config.max_simulation_iterations
    {
        step = config.max_simulation_time_step.min(remaining_time * 0.5);
    }
    step.max(MIN_TICK_TIME)
}

/// Braking deceleration for a movement mode.
pub fn max_braking_deceleration(config: &MovementConfig, mode: MovementMode) -> f32 {
    match mode {
        MovementMode::Walking => config.braking_deceleration_walking,
        MovementMode::Falling => config.braking_deceleration_falling,
        MovementMode::Flying => config.braking_deceleration_flying,
        MovementMode::None => 0.0,
    }
}

/// Lowest max speed partial analog input can produce in this mode.
fn min_analog_speed(config: &MovementConfig, mode: MovementMode) -> f32 {
    match mode {
        MovementMode::Walking | MovementMode::Falling => config.min_analog_walk_speed,
        MovementMode::Flying | MovementMode::None => 0.0,
    }
}

// ============================================================================
// Velocity
// ============================================================================

/// Update `state.velocity` for one sub-step.
///
/// No-op without a capsule, under root motion, or for steps shorter than
/// [`MIN_TICK_TIME`].
pub fn calc_velocity(
    ctx: &TickContext,
    state: &mut AgentState,
    dt: f32,
    friction: f32,
    fluid: bool,
    braking_deceleration: f32,
) {
    if !state.has_valid_data() || state.root_motion_active || dt < MIN_TICK_TIME {
        return;
    }

    let config = ctx.config;
    let friction = friction.max(0.0);
    let max_speed = (ctx.policy.max_speed(state, config) * state.analog_input_modifier)
        .max(min_analog_speed(config, state.mode));

    let zero_acceleration = is_nearly_zero(state.acceleration, KINDA_SMALL_NUMBER);
    let ground_move = state.is_moving_on_ground() && state.braking_tolerated;

    if ground_move {
        let over_max =
            state.velocity.length_squared() > max_speed * max_speed * OVER_VELOCITY_PERCENT;
        let old_velocity = state.velocity;

        let braking_friction = if config.use_separate_braking_friction {
            config.braking_friction
        } else {
            friction
        };
        apply_velocity_braking(
            config,
            state,
            dt,
            braking_friction * state.surface_friction,
            braking_deceleration,
        );

        // Braking may not pull an accelerating agent below max speed
        if over_max
            && state.velocity.length_squared() < max_speed * max_speed
            && state.acceleration.dot(old_velocity) > 0.0
        {
            state.velocity = old_velocity.normalize_or_zero() * max_speed;
        }

        // Braking skips speeds under its rest tolerance, so coasting ends here
        if zero_acceleration && is_nearly_zero(state.velocity, BRAKING_REST_TOLERANCE) {
            state.velocity = Vec3::ZERO;
        }
    }

    if fluid {
        state.velocity *= 1.0 - (friction * dt).min(1.0);
    }

    clamp_horizontal(state, config.axis_speed_limit);

    if !zero_acceleration {
        state.acceleration = clamped_to_max_size_2d(state.acceleration, max_speed);

        let accel_dir = safe_normal_2d(state.acceleration);
        let veer = state.velocity.x * accel_dir.x + state.velocity.y * accel_dir.y;

        let wish = if ground_move {
            state.acceleration
        } else {
            clamped_to_max_size_2d(state.acceleration, config.air_speed_cap)
        };
        let add_speed = size_2d(wish) - veer;

        if add_speed > 0.0 {
            let modifier = if ground_move {
                config.ground_acceleration_modifier
            } else {
                config.air_acceleration_modifier
            };
            let delta = state.acceleration * modifier * state.surface_friction * dt;
            state.velocity += clamped_to_max_size_2d(delta, add_speed);
        }
    }

    clamp_horizontal(state, config.axis_speed_limit);

    update_step_and_slope(config, state);
}

/// Decelerate against the current velocity in bounded slices.
///
/// Stops at exactly zero instead of reversing direction.
pub fn apply_velocity_braking(
    config: &MovementConfig,
    state: &mut AgentState,
    dt: f32,
    friction: f32,
    braking_deceleration: f32,
) {
    if is_nearly_zero(state.velocity, BRAKING_REST_TOLERANCE)
        || !state.has_valid_data()
        || state.root_motion_active
        || dt < MIN_TICK_TIME
    {
        return;
    }

    let speed = size_2d(state.velocity);
    let friction = (friction * config.braking_friction_factor.max(0.0)).max(0.0);
    let deceleration = braking_deceleration.max(speed).max(0.0);

    if friction.abs() <= SMALL_NUMBER || deceleration == 0.0 {
        return;
    }

    let old_velocity = state.velocity;
    let reverse = -old_velocity.normalize_or_zero();
    let max_step = config
        .braking_sub_step_time
        .clamp(MIN_BRAKING_SUB_STEP, MAX_BRAKING_SUB_STEP);

    let mut remaining = dt;
    while remaining >= MIN_TICK_TIME {
        let step = if remaining > max_step {
            max_step.min(remaining * 0.5)
        } else {
            remaining
        };
        remaining -= step;

        state.velocity += reverse * (friction * deceleration * step);

        // Overshot: stop dead rather than reverse
        if state.velocity.dot(old_velocity) <= 0.0 {
            state.velocity = Vec3::ZERO;
            return;
        }
    }

    if is_nearly_zero(state.velocity, KINDA_SMALL_NUMBER) {
        state.velocity = Vec3::ZERO;
    }
}

fn clamp_horizontal(state: &mut AgentState, limit: f32) {
    state.velocity.x = state.velocity.x.clamp(-limit, limit);
    state.velocity.y = state.velocity.y.clamp(-limit, limit);
}

/// Lower the step height and raise the walkable slope as speed grows.
fn update_step_and_slope(config: &MovementConfig, state: &mut AgentState) {
    let speed_sq = size_squared_2d(state.velocity);
    let crouched = config.max_walk_speed_crouched;

    if speed_sq <= crouched * crouched {
        state.max_step_height = config.default_step_height;
        state.walkable_floor_z = config.default_walkable_floor_z;
        return;
    }

    let scale = (speed_sq.sqrt() - config.min_slope_speed)
        / (config.max_slope_speed - config.min_slope_speed);
    let mut multiplier = scale.clamp(0.0, 1.0);
    multiplier *= multiplier;
    if !state.is_falling() {
        // Grippy ground cancels the effect
        multiplier = ((1.0 - state.surface_friction) * multiplier).max(0.0);
    }

    state.max_step_height = lerp(config.default_step_height, config.min_step_height, multiplier);
    state.walkable_floor_z = lerp(
        config.default_walkable_floor_z,
        config.steep_walkable_floor_z,
        multiplier,
    );
}
