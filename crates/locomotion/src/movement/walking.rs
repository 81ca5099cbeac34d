//! Ground physics.
//!
//! Walking keeps the capsule hovering over a walkable floor. Each sub-step
//! moves along the floor (following ramps), steps up onto low obstacles,
//! slides along walls, re-probes the floor and then either snaps back to the
//! floor band or hands the remaining time over to the falling phase.

use glam::Vec3;

use crate::collision::CollisionHit;
use crate::math::{is_nearly_zero, size_2d, KINDA_SMALL_NUMBER, MIN_TICK_TIME};

use super::context::TickContext;
use super::floor::{adjust_floor_height, find_floor, is_walkable};
use super::landing::is_within_edge_tolerance;
use super::mode::{set_movement_mode, start_new_physics};
use super::slide::{move_component, resolve_penetration, safe_move, slide_along_surface};
use super::state::{AgentState, FloorResult, MovementMode};
use super::velocity::{calc_velocity, max_braking_deceleration, simulation_time_step};

/// Steps whose side face is flatter than this may leave the agent without a floor.
const MAX_STEP_SIDE_Z: f32 = 0.08;

/// Floor found at the end of a successful step up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepDownResult {
    /// `None` when the step-down sweep found nothing to validate.
    pub floor: Option<FloorResult>,
}

// ============================================================================
// Walking Phase
// ============================================================================

/// Simulate `delta_time` of walking.
///
/// Losing the floor switches to falling and continues with the time that
/// was not used up by the horizontal move.
pub fn phys_walking(
    ctx: &mut TickContext,
    state: &mut AgentState,
    delta_time: f32,
    iterations: u32,
) {
    if delta_time < MIN_TICK_TIME || !state.has_valid_data() {
        return;
    }

    let config = ctx.config;
    let mut iterations = iterations;
    let mut remaining_time = delta_time;

    while remaining_time >= MIN_TICK_TIME && iterations < config.max_simulation_iterations {
        iterations += 1;
        let tick = simulation_time_step(config, remaining_time, iterations);
        remaining_time -= tick;

        let old_location = state.position;
        let old_floor = state.current_floor.clone();

        state.velocity.z = 0.0;
        state.acceleration.z = 0.0;

        if !state.root_motion_active {
            let max_deceleration = max_braking_deceleration(config, state.mode);
            calc_velocity(ctx, state, tick, config.ground_friction, false, max_deceleration);
        }

        let delta = state.velocity * tick;
        let zero_delta = is_nearly_zero(delta, KINDA_SMALL_NUMBER);
        let mut stepped_floor = None;

        if zero_delta {
            remaining_time = 0.0;
        } else {
            let velocity = state.velocity;
            stepped_floor = move_along_floor(ctx, state, velocity, tick);
        }

        state.current_floor = match stepped_floor {
            Some(floor) => floor,
            None => find_floor(ctx, state, state.position),
        };

        if state.current_floor.is_walkable_floor() {
            let catch_air = ctx
                .policy
                .should_catch_air(state, config, &old_floor, &state.current_floor);
            if catch_air {
                log::trace!("catching air at {}", state.position);
                start_falling(ctx, state, iterations, remaining_time, tick, delta, old_location);
                return;
            }

            adjust_floor_height(ctx, state);
        } else if state.current_floor.hit.start_penetrating && remaining_time <= 0.0 {
            let hit = state.current_floor.hit.clone();
            resolve_penetration(ctx, state, &hit);
        }

        if !state.current_floor.is_walkable_floor() && !state.current_floor.hit.start_penetrating
        {
            start_falling(ctx, state, iterations, remaining_time, tick, delta, old_location);
            return;
        }

        if state.is_moving_on_ground() {
            state.velocity = (state.position - old_location) / tick;
            state.velocity.z = 0.0;
        }

        if state.position == old_location {
            break;
        }
    }

    if state.is_moving_on_ground() {
        state.velocity.z = 0.0;
    }
}

/// Switch from walking to falling mid-step and simulate the rest of the time.
///
/// Time the blocked part of the move did not use is handed to the new phase.
pub fn start_falling(
    ctx: &mut TickContext,
    state: &mut AgentState,
    iterations: u32,
    remaining_time: f32,
    tick: f32,
    delta: Vec3,
    sub_location: Vec3,
) {
    let desired_dist = delta.length();
    let actual_dist = size_2d(state.position - sub_location);

    let remaining_time = if desired_dist < KINDA_SMALL_NUMBER {
        0.0
    } else {
        remaining_time + tick * (1.0 - (actual_dist / desired_dist).min(1.0))
    };

    if state.is_moving_on_ground() {
        set_movement_mode(ctx, state, MovementMode::Falling);
    }

    start_new_physics(ctx, state, remaining_time, iterations);
}

// ============================================================================
// Ground Moves
// ============================================================================

/// Move horizontally along the current floor for `dt`.
///
/// Returns the floor found by a step up, if one happened.
pub fn move_along_floor(
    ctx: &TickContext,
    state: &mut AgentState,
    velocity: Vec3,
    dt: f32,
) -> Option<FloorResult> {
    if !state.current_floor.is_walkable_floor() {
        return None;
    }

    let delta = Vec3::new(velocity.x, velocity.y, 0.0) * dt;
    let ramp = compute_ground_movement_delta(state, delta, &state.current_floor.hit);
    let mut hit = safe_move(ctx, state, ramp);

    if hit.start_penetrating {
        let normal = hit.normal;
        slide_along_surface(ctx, state, delta, 1.0, normal, &mut hit);
        if hit.start_penetrating {
            log::debug!("stuck in geometry at {}", state.position);
        }
        return None;
    }

    if !hit.is_valid_blocking_hit() {
        return None;
    }

    let mut percent_applied = hit.time;

    // Ran onto a new ramp partway through: follow it for the rest of the move
    if hit.time > 0.0 && hit.normal.z > KINDA_SMALL_NUMBER && is_walkable(state, &hit) {
        let initial_remaining = 1.0 - percent_applied;
        let ramp = compute_ground_movement_delta(state, delta * initial_remaining, &hit);
        hit = safe_move(ctx, state, ramp);

        let second_percent = hit.time * initial_remaining;
        percent_applied = (percent_applied + second_percent).clamp(0.0, 1.0);
    }

    if !hit.is_valid_blocking_hit() {
        return None;
    }

    match step_up(ctx, state, delta * (1.0 - percent_applied), &hit) {
        Some(step) => step.floor,
        None => {
            let normal = hit.normal;
            slide_along_surface(ctx, state, delta, 1.0 - percent_applied, normal, &mut hit);
            None
        }
    }
}

/// Tilt a horizontal `delta` so it runs parallel to a walkable ramp.
///
/// Horizontal speed is kept; only Z changes. Flat floors, steep surfaces
/// and non-walkable hits return `delta` unchanged.
pub fn compute_ground_movement_delta(state: &AgentState, delta: Vec3, ramp: &CollisionHit) -> Vec3 {
    let floor_normal = ramp.impact_normal;
    let contact_normal = ramp.normal;

    if floor_normal.z < 1.0 - KINDA_SMALL_NUMBER
        && floor_normal.z > KINDA_SMALL_NUMBER
        && contact_normal.z > KINDA_SMALL_NUMBER
        && is_walkable(state, ramp)
    {
        let floor_dot_delta = floor_normal.dot(delta);
        return Vec3::new(delta.x, delta.y, -floor_dot_delta / floor_normal.z);
    }

    delta
}

fn can_step_up(state: &AgentState, hit: &CollisionHit) -> bool {
    hit.is_valid_blocking_hit() && state.has_valid_data() && !state.is_falling()
}

/// Try to climb over the obstacle in `hit` by moving up, forward, then down.
///
/// On failure the position is restored and `None` is returned.
pub fn step_up(
    ctx: &TickContext,
    state: &mut AgentState,
    delta: Vec3,
    hit: &CollisionHit,
) -> Option<StepDownResult> {
    if !can_step_up(state, hit) || state.max_step_height <= 0.0 {
        return None;
    }

    let config = ctx.config;
    let old_location = state.position;
    let (radius, half_height) = state.capsule_size();

    // Don't bother if the top of the capsule is what hit
    let initial_impact_z = hit.impact_point.z;
    if initial_impact_z > old_location.z + (half_height - radius) {
        return None;
    }

    let mut step_travel_up = state.max_step_height;
    let mut step_travel_down = step_travel_up;
    let step_side_z = hit.impact_normal.z;
    let mut initial_floor_base_z = old_location.z - half_height;
    let mut floor_point_z = initial_floor_base_z;

    if state.is_moving_on_ground() && state.current_floor.is_walkable_floor() {
        let floor_dist = state.current_floor.floor_dist.max(0.0);
        initial_floor_base_z -= floor_dist;
        step_travel_up = (step_travel_up - floor_dist).max(0.0);
        step_travel_down = state.max_step_height + config.max_floor_dist * 2.0;

        let hit_vertical_face = !is_within_edge_tolerance(hit.location, hit.impact_point, radius);
        if hit_vertical_face {
            floor_point_z -= state.current_floor.floor_dist;
        } else {
            floor_point_z = state.current_floor.hit.impact_point.z;
        }
    }

    // Impact below the feet: nothing to step onto
    if initial_impact_z <= initial_floor_base_z {
        return None;
    }

    let revert = |state: &mut AgentState| -> Option<StepDownResult> {
        state.position = old_location;
        None
    };

    let up_hit = move_component(ctx, state, Vec3::Z * step_travel_up);
    if up_hit.start_penetrating {
        return revert(state);
    }

    let mut forward_hit = move_component(ctx, state, delta);
    if forward_hit.blocking {
        if forward_hit.start_penetrating {
            return revert(state);
        }

        let forward_time = forward_hit.time;
        let normal = forward_hit.normal;
        let slide_amount =
            slide_along_surface(ctx, state, delta, 1.0 - forward_time, normal, &mut forward_hit);

        if forward_time == 0.0 && slide_amount == 0.0 {
            return revert(state);
        }
    }

    let down_hit = move_component(ctx, state, -Vec3::Z * step_travel_down);
    if down_hit.start_penetrating {
        return revert(state);
    }

    let mut result = StepDownResult::default();

    if down_hit.is_valid_blocking_hit() {
        let delta_z = down_hit.impact_point.z - floor_point_z;
        if delta_z > state.max_step_height {
            log::trace!("step of {delta_z:.2} too high");
            return revert(state);
        }

        if !is_walkable(state, &down_hit) {
            // Unwalkable face turned toward us, or ending up above the start
            if delta.dot(down_hit.impact_normal) < 0.0 || down_hit.location.z > old_location.z {
                return revert(state);
            }
        }

        if !is_within_edge_tolerance(down_hit.location, down_hit.impact_point, radius) {
            return revert(state);
        }

        if delta_z > 0.0 && !can_step_up(state, &down_hit) {
            return revert(state);
        }

        let floor = find_floor(ctx, state, state.position);
        if down_hit.location.z > old_location.z
            && !floor.blocking_hit()
            && step_side_z < MAX_STEP_SIDE_Z
        {
            return revert(state);
        }

        result.floor = Some(floor);
    }

    Some(result)
}
