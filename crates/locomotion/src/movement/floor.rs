//! Floor detection.
//!
//! The agent hovers a small distance above the floor instead of resting on
//! it. The probe sweeps the capsule straight down and reports what it found,
//! whether it can be stood on, and how far below it is.

use glam::Vec3;

use crate::collision::CollisionHit;
use crate::math::KINDA_SMALL_NUMBER;

use super::context::TickContext;
use super::slide::safe_move;
use super::state::{AgentState, FloorResult};

/// Whether `hit` is a surface the agent can stand on at its current slope limit.
pub fn is_walkable(state: &AgentState, hit: &CollisionHit) -> bool {
    if !hit.is_valid_blocking_hit() {
        return false;
    }

    // Never walk up vertical surfaces
    if hit.impact_normal.z < KINDA_SMALL_NUMBER {
        return false;
    }

    hit.impact_normal.z >= state.walkable_floor_z
}

/// Probe for a floor below `location`.
///
/// Sweeps `max_floor_dist + max_step_height`, so floors a step below still
/// count and the walking phase can snap down onto them.
pub fn find_floor(ctx: &TickContext, state: &AgentState, location: Vec3) -> FloorResult {
    let Some(shape) = state.capsule else {
        return FloorResult::default();
    };

    let sweep_distance = ctx.config.max_floor_dist + state.max_step_height;
    let end = location - Vec3::Z * sweep_distance;

    match ctx.sweep(&shape, location, end, &ctx.query_params()) {
        Some(hit) => FloorResult {
            walkable: is_walkable(state, &hit),
            floor_dist: hit.time * sweep_distance,
            hit,
        },
        None => FloorResult {
            hit: CollisionHit::no_hit(end),
            walkable: false,
            floor_dist: 0.0,
        },
    }
}

/// Long probe used to sample the floor's material.
pub fn trace_character_floor(ctx: &TickContext, state: &AgentState) -> Option<CollisionHit> {
    let shape = state.capsule?;
    let end = state.position - Vec3::Z * (ctx.config.max_floor_dist * 10.0);
    let params = ctx.query_params().with_material();
    ctx.sweep(&shape, state.position, end, &params)
}

/// Move vertically so the floor gap sits inside `[min_floor_dist, max_floor_dist]`.
pub fn adjust_floor_height(ctx: &TickContext, state: &mut AgentState) {
    if !state.current_floor.is_walkable_floor() {
        return;
    }

    let config = ctx.config;
    let old_floor_dist = state.current_floor.floor_dist;
    if old_floor_dist >= config.min_floor_dist && old_floor_dist <= config.max_floor_dist {
        return;
    }

    let initial_z = state.position.z;
    let move_dist = config.floor_dist_midpoint() - old_floor_dist;
    let hit = safe_move(ctx, state, Vec3::Z * move_dist);

    if !hit.is_valid_blocking_hit() {
        state.current_floor.floor_dist += move_dist;
    } else {
        state.current_floor.floor_dist += state.position.z - initial_z;
        if move_dist < 0.0 && is_walkable(state, &hit) {
            state.current_floor.hit = hit;
        }
    }
}
