//! Flying physics.
//!
//! No gravity and no floor. Velocity is damped by half the fluid friction;
//! blocked moves try a step up before sliding.

use glam::Vec3;

use crate::math::MIN_TICK_TIME;

use super::context::TickContext;
use super::slide::{safe_move, slide_along_surface};
use super::state::AgentState;
use super::velocity::{calc_velocity, max_braking_deceleration};
use super::walking::step_up;

/// Flying velocity is damped by this share of the fluid friction.
const FLYING_FRICTION_SCALE: f32 = 0.5;

/// Simulate `delta_time` of flight in a single move.
pub fn phys_flying(
    ctx: &mut TickContext,
    state: &mut AgentState,
    delta_time: f32,
    _iterations: u32,
) {
    if delta_time < MIN_TICK_TIME || !state.has_valid_data() {
        return;
    }

    let config = ctx.config;

    if !state.root_motion_active {
        let friction = FLYING_FRICTION_SCALE * config.fluid_friction;
        let max_deceleration = max_braking_deceleration(config, state.mode);
        calc_velocity(ctx, state, delta_time, friction, true, max_deceleration);
    }

    let mut old_location = state.position;
    let adjusted = state.velocity * delta_time;
    let mut hit = safe_move(ctx, state, adjusted);

    if hit.time < 1.0 {
        let up_down = -Vec3::Z.dot(state.velocity.normalize_or_zero());
        let mut stepped_up = false;

        if hit.impact_normal.z.abs() < 0.2 && up_down < 0.5 && up_down > -0.2 {
            let step_z = state.position.z;
            if step_up(ctx, state, adjusted * (1.0 - hit.time), &hit).is_some() {
                stepped_up = true;
                old_location.z = state.position.z + (old_location.z - step_z);
            }
        }

        if !stepped_up {
            let normal = hit.normal;
            slide_along_surface(ctx, state, adjusted, 1.0 - hit.time, normal, &mut hit);
        }
    }

    if !state.root_motion_active {
        state.velocity = (state.position - old_location) / delta_time;
    }
}
