//! Airborne physics.
//!
//! A falling tick is split into sub-steps. Each sub-step applies air control
//! and gravity, splits itself at the apex of a jump, moves with the average
//! of the old and new velocity, and then resolves whatever it ran into:
//! landing, sliding along one or two surfaces, or escaping a ditch or a
//! ledge perch.

use glam::Vec3;
use rand::Rng;

use crate::collision::CollisionHit;
use crate::math::{
    is_nearly_zero, plane_project, safe_normal_2d, size_squared_2d, KINDA_SMALL_NUMBER,
    MIN_TICK_TIME, SMALL_NUMBER,
};

use super::config::MovementConfig;
use super::context::TickContext;
use super::floor::find_floor;
use super::landing::{is_valid_landing_spot, should_check_for_valid_landing_spot};
use super::mode::process_landed;
use super::scoped::{field, ScopedValue};
use super::slide::{compute_slide_vector, safe_move, two_wall_adjust};
use super::state::{AgentState, MovementEvent};
use super::velocity::{calc_velocity, max_braking_deceleration, simulation_time_step};

/// Apex splits shorter than this are not worth a sub-step.
const APEX_TIME_MIN: f32 = 1.0e-4;

const VERTICAL_SLOPE_NORMAL_Z: f32 = 0.001;

/// Horizontal speeds squared below this snap to zero at the end of a sub-step.
const REST_SPEED_SQ: f32 = KINDA_SMALL_NUMBER * 10.0;

// ============================================================================
// Falling Phase
// ============================================================================

/// Simulate `delta_time` of falling.
///
/// Hands over to the walking phase on landing. Stops early once
/// `max_simulation_iterations` is used up; the leftover time is dropped.
pub fn phys_falling(
    ctx: &mut TickContext,
    state: &mut AgentState,
    delta_time: f32,
    iterations: u32,
) {
    if delta_time < MIN_TICK_TIME {
        return;
    }

    let config = ctx.config;
    let mut iterations = iterations;

    let mut fall_acceleration = state.acceleration;
    fall_acceleration.z = 0.0;
    let limited_air_control = ctx.policy.should_limit_air_control(state, fall_acceleration);

    let mut remaining_time = delta_time;

    while remaining_time >= MIN_TICK_TIME && iterations < config.max_simulation_iterations {
        iterations += 1;
        let mut tick = simulation_time_step(config, remaining_time, iterations);
        remaining_time -= tick;

        let old_location = state.position;
        let old_velocity = state.velocity;
        let max_deceleration = max_braking_deceleration(config, state.mode);

        // Air control, with the vertical velocity left out
        if !state.root_motion_active {
            let mut air = ScopedValue::replace(state, field::acceleration, fall_acceleration);
            air.velocity.z = 0.0;
            calc_velocity(
                ctx,
                &mut air,
                tick,
                config.falling_lateral_friction,
                false,
                max_deceleration,
            );
            air.velocity.z = old_velocity.z;
        }

        // Gravity, suppressed while the jump force holds
        let gravity = Vec3::new(0.0, 0.0, config.gravity_z);
        let mut gravity_time = tick;
        let mut ending_jump_force = false;

        if state.jump.force_time_remaining > 0.0 {
            let jump_force_time = state.jump.force_time_remaining.min(tick);
            if !config.apply_gravity_while_jumping {
                gravity_time = (tick - jump_force_time).max(0.0);
            }
            state.jump.force_time_remaining -= jump_force_time;

            if state.jump.force_time_remaining <= 0.0 {
                state.jump.end_force();
                ending_jump_force = true;
            }
        }

        state.velocity = new_fall_velocity(config, state.velocity, gravity, gravity_time);

        if old_velocity.z > 0.0
            && state.velocity.z <= 0.0
            && state.jump_apex_attempts < config.max_jump_apex_attempts
        {
            let apex = solve_apex(old_velocity, state.velocity, tick);
            if let Some((apex_time, apex_velocity)) = apex {
                log::trace!("apex split at {apex_time:.5}s of {tick:.5}s");
                state.velocity = apex_velocity;
                remaining_time += tick - apex_time;
                tick = apex_time;
                // The apex split does not use up an iteration
                iterations -= 1;
                state.jump_apex_attempts += 1;
            }
        }

        if state.jump.notify_apex && state.velocity.z < 0.0 {
            state.jump.notify_apex = false;
            ctx.emit(MovementEvent::JumpApex);
        }

        let mut adjusted = (old_velocity + state.velocity) * 0.5 * tick;
        if ending_jump_force && !config.apply_gravity_while_jumping {
            let non_gravity_time = (tick - gravity_time).max(0.0);
            adjusted = old_velocity * non_gravity_time
                + (old_velocity + state.velocity) * 0.5 * gravity_time;
        }

        let mut hit = safe_move(ctx, state, adjusted);

        let mut last_move_time_slice = tick;
        let mut sub_time_tick_remaining = tick * (1.0 - hit.time);

        if hit.blocking {
            if is_valid_landing_spot(ctx, state, state.position, &hit) {
                remaining_time += sub_time_tick_remaining;
                process_landed(ctx, state, &hit, remaining_time, iterations);
                return;
            }

            // Clipped a ledge edge: the top may still be walkable
            if !hit.start_penetrating && should_check_for_valid_landing_spot(ctx, state, &hit) {
                let floor = find_floor(ctx, state, state.position);
                if floor.is_walkable_floor()
                    && is_valid_landing_spot(ctx, state, state.position, &floor.hit)
                {
                    remaining_time += sub_time_tick_remaining;
                    process_landed(ctx, state, &floor.hit, remaining_time, iterations);
                    return;
                }
            }

            let mut velocity_no_air_control = old_velocity;
            let mut air_control_acceleration = state.acceleration;

            if limited_air_control {
                {
                    let mut no_accel =
                        ScopedValue::replace(state, field::acceleration, Vec3::ZERO);
                    let mut replay =
                        ScopedValue::replace(&mut no_accel, field::velocity, old_velocity);
                    replay.velocity.z = 0.0;
                    calc_velocity(
                        ctx,
                        &mut replay,
                        tick,
                        config.falling_lateral_friction,
                        false,
                        max_deceleration,
                    );
                    replay.velocity.z = old_velocity.z;
                    velocity_no_air_control =
                        new_fall_velocity(config, replay.velocity, gravity, gravity_time);
                }

                // The first slide uses the input acceleration, later ones what air control added
                let air_control_delta_velocity =
                    limit_air_control(air_control_acceleration, &hit) * last_move_time_slice;
                air_control_acceleration = (state.velocity - velocity_no_air_control) / tick;
                adjusted = (velocity_no_air_control + air_control_delta_velocity)
                    * last_move_time_slice;
            }

            let old_hit_normal = hit.normal;
            let old_hit_impact_normal = hit.impact_normal;
            let mut delta =
                compute_slide_vector(state, config, adjusted, 1.0 - hit.time, old_hit_normal, &hit);
            let delta_step = compute_slide_vector(
                state,
                config,
                state.velocity * tick,
                1.0 - hit.time,
                old_hit_normal,
                &hit,
            );

            if sub_time_tick_remaining > KINDA_SMALL_NUMBER {
                state.velocity = delta_step / sub_time_tick_remaining;
            }

            if sub_time_tick_remaining > KINDA_SMALL_NUMBER && delta.dot(adjusted) > 0.0 {
                hit = safe_move(ctx, state, delta);

                if hit.blocking {
                    last_move_time_slice = sub_time_tick_remaining;
                    sub_time_tick_remaining *= 1.0 - hit.time;

                    if is_valid_landing_spot(ctx, state, state.position, &hit) {
                        remaining_time += sub_time_tick_remaining;
                        process_landed(ctx, state, &hit, remaining_time, iterations);
                        return;
                    }

                    if limited_air_control && hit.normal.z > VERTICAL_SLOPE_NORMAL_Z {
                        let last_move_no_air_control =
                            velocity_no_air_control * last_move_time_slice;
                        delta = compute_slide_vector(
                            state,
                            config,
                            last_move_no_air_control,
                            1.0,
                            old_hit_normal,
                            &hit,
                        );
                    }

                    delta = two_wall_adjust(state, config, delta, &hit, old_hit_normal);

                    if limited_air_control {
                        let air_control_delta_velocity = limit_air_control(
                            air_control_acceleration,
                            &hit,
                        ) * sub_time_tick_remaining;
                        if air_control_delta_velocity.dot(old_hit_normal) > 0.0 {
                            delta += air_control_delta_velocity * sub_time_tick_remaining;
                        }
                    }

                    if sub_time_tick_remaining > KINDA_SMALL_NUMBER {
                        state.velocity = delta / sub_time_tick_remaining;
                    }

                    // Wedged between two opposing slopes that can't be walked on
                    let in_ditch = old_hit_impact_normal.z > 0.0
                        && hit.impact_normal.z > 0.0
                        && delta.z.abs() <= KINDA_SMALL_NUMBER
                        && hit.impact_normal.dot(old_hit_impact_normal) < 0.0;

                    hit = safe_move(ctx, state, delta);

                    if hit.time == 0.0 {
                        // No progress: try a small sidestep
                        let mut side_delta = safe_normal_2d(old_hit_normal + hit.impact_normal);
                        if is_nearly_zero(side_delta, KINDA_SMALL_NUMBER) {
                            side_delta = Vec3::new(old_hit_normal.y, -old_hit_normal.x, 0.0)
                                .normalize_or_zero();
                        }
                        hit = safe_move(ctx, state, side_delta);
                    }

                    if in_ditch
                        || is_valid_landing_spot(ctx, state, state.position, &hit)
                        || hit.time == 0.0
                    {
                        process_landed(ctx, state, &hit, 0.0, iterations);
                        return;
                    }

                    if config.perch_radius_threshold > 0.0
                        && hit.time == 1.0
                        && old_hit_impact_normal.z >= state.walkable_floor_z
                    {
                        let z_distance = (state.position.z - old_location.z).abs();
                        let move_dist_2d_sq = size_squared_2d(state.position - old_location);

                        if z_distance <= 0.2 * tick && move_dist_2d_sq <= 4.0 * tick {
                            let max_speed = ctx.policy.max_speed(state, config);
                            state.velocity = perch_nudge(
                                &mut *ctx.rng,
                                state.velocity,
                                max_speed,
                                config.jump_z_velocity,
                            );
                            log::trace!("perched, nudging to {}", state.velocity);
                            let nudge = state.velocity * tick;
                            safe_move(ctx, state, nudge);
                        }
                    }
                }
            }
        }

        if size_squared_2d(state.velocity) <= REST_SPEED_SQ {
            state.velocity.x = 0.0;
            state.velocity.y = 0.0;
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Apply gravity for `dt`, then clamp to terminal velocity and the vertical axis limit.
pub fn new_fall_velocity(config: &MovementConfig, velocity: Vec3, gravity: Vec3, dt: f32) -> Vec3 {
    let mut result = velocity;

    if dt > 0.0 {
        result += gravity * dt;

        let terminal = config.terminal_velocity.abs();
        if result.length_squared() > terminal * terminal {
            let gravity_dir = gravity.normalize_or_zero();
            if result.dot(gravity_dir) > terminal {
                result = plane_project(result, gravity_dir) + gravity_dir * terminal;
            }
        }
    }

    result.z = result.z.clamp(-config.axis_speed_limit, config.axis_speed_limit);
    result
}

/// Find where vertical velocity crosses zero inside a sub-step.
///
/// Returns the time to the apex and the velocity there (with zero Z), or
/// `None` when the crossing is too close to either end of the step.
pub fn solve_apex(old_velocity: Vec3, new_velocity: Vec3, tick: f32) -> Option<(f32, Vec3)> {
    let derived_acceleration = (new_velocity - old_velocity) / tick;
    if derived_acceleration.z.abs() <= SMALL_NUMBER {
        return None;
    }

    let time_to_apex = -old_velocity.z / derived_acceleration.z;
    if !(APEX_TIME_MIN..tick).contains(&time_to_apex) {
        return None;
    }

    let mut apex_velocity = old_velocity + derived_acceleration * time_to_apex;
    apex_velocity.z = 0.0;
    Some((time_to_apex, apex_velocity))
}

/// Keep air control from pushing into a steep wall.
///
/// Acceleration into the wall is flattened onto it. When starting inside
/// geometry only acceleration out of it survives.
pub fn limit_air_control(fall_acceleration: Vec3, hit: &CollisionHit) -> Vec3 {
    if hit.is_valid_blocking_hit() && hit.normal.z > VERTICAL_SLOPE_NORMAL_Z {
        if fall_acceleration.dot(hit.normal) < 0.0 {
            return plane_project(fall_acceleration, safe_normal_2d(hit.normal));
        }
    } else if hit.start_penetrating {
        return if fall_acceleration.dot(hit.normal) > 0.0 {
            fall_acceleration
        } else {
            Vec3::ZERO
        };
    }

    fall_acceleration
}

/// Random kick off a ledge the agent got stuck on.
pub fn perch_nudge<R: Rng + ?Sized>(
    rng: &mut R,
    velocity: Vec3,
    max_speed: f32,
    jump_z_velocity: f32,
) -> Vec3 {
    let jitter = 0.25 * max_speed;
    Vec3::new(
        velocity.x + jitter * (rng.gen::<f32>() - 0.5),
        velocity.y + jitter * (rng.gen::<f32>() - 0.5),
        (jump_z_velocity * 0.25).max(1.0),
    )
}
