//! Movement mode transitions and phase dispatch.

use glam::Vec3;
use log::debug;

use crate::collision::CollisionHit;
use crate::math::MIN_TICK_TIME;

use super::context::TickContext;
use super::falling::phys_falling;
use super::floor::{adjust_floor_height, find_floor};
use super::flying::phys_flying;
use super::state::{AgentState, MovementEvent, MovementMode};
use super::walking::phys_walking;

/// Switch to `mode`, running the entry rules of the new mode.
///
/// Entering walking drops vertical velocity, re-probes the floor and resets
/// the jump count. Entering `None` stops the agent. Leaving the ground
/// forgets the floor.
pub fn set_movement_mode(ctx: &mut TickContext, state: &mut AgentState, mode: MovementMode) {
    if state.mode == mode {
        return;
    }

    let from = state.mode;
    state.mode = mode;
    debug!("movement mode {from:?} -> {mode:?}");
    ctx.emit(MovementEvent::ModeChanged { from, to: mode });

    match mode {
        MovementMode::Walking => {
            state.velocity.z = 0.0;
            state.current_floor = find_floor(ctx, state, state.position);
            adjust_floor_height(ctx, state);
            state.jump.reset();
        }
        MovementMode::None => {
            state.velocity = Vec3::ZERO;
            state.current_floor.clear();
            state.jump.reset();
        }
        MovementMode::Falling | MovementMode::Flying => {
            state.current_floor.clear();
        }
    }
}

/// Finish a fall on `hit` and continue with the time that is left.
pub fn process_landed(
    ctx: &mut TickContext,
    state: &mut AgentState,
    hit: &CollisionHit,
    remaining_time: f32,
    iterations: u32,
) {
    debug!(
        "landed at {} on {} with {remaining_time:.4}s left",
        state.position, hit.impact_normal
    );
    ctx.emit(MovementEvent::Landed { remaining_time });

    if state.is_falling() {
        set_movement_mode(ctx, state, MovementMode::Walking);
    }

    start_new_physics(ctx, state, remaining_time, iterations);
}

/// Run the phase for the current mode over `delta_time`.
///
/// Does nothing once the time or the iteration budget is used up.
pub fn start_new_physics(
    ctx: &mut TickContext,
    state: &mut AgentState,
    delta_time: f32,
    iterations: u32,
) {
    if delta_time < MIN_TICK_TIME
        || iterations >= ctx.config.max_simulation_iterations
        || !state.has_valid_data()
    {
        return;
    }

    match state.mode {
        MovementMode::Walking => phys_walking(ctx, state, delta_time, iterations),
        MovementMode::Falling => phys_falling(ctx, state, delta_time, iterations),
        MovementMode::Flying => phys_flying(ctx, state, delta_time, iterations),
        MovementMode::None => {}
    }
}
