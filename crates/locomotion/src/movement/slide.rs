//! Swept moves and sliding along what they hit.

use glam::Vec3;

use crate::collision::CollisionHit;
use crate::math::{
    is_nearly_zero, plane_project, project_onto_normal, safe_normal_2d, KINDA_SMALL_NUMBER,
};

use super::config::MovementConfig;
use super::context::TickContext;
use super::floor::is_walkable;
use super::state::AgentState;

/// Impact normals flatter than this are treated as vertical walls.
const VERTICAL_SLOPE_NORMAL_Z: f32 = 0.001;

/// Extra distance pushed out of a penetration.
const PENETRATION_PULLBACK: f32 = 0.125;

/// Depth assumed when a penetrating hit reports none.
const DEFAULT_PENETRATION_DEPTH: f32 = 0.125;

const MAX_PENETRATION_ITERATIONS: usize = 4;

/// Two hits closer than this to parallel count as the same wall.
const SAME_WALL_TOLERANCE: f32 = KINDA_SMALL_NUMBER;

const SAME_WALL_NUDGE: f32 = 0.01;

/// Floors with normal Z within this of 1 are flat.
const FLAT_FLOOR_TOLERANCE: f32 = 1.0e-5;

// ============================================================================
// Moves
// ============================================================================

/// Sweep the capsule by `delta` and move to where it stops.
///
/// Returns a non-blocking hit at the end location when nothing was in the way.
pub fn move_component(ctx: &TickContext, state: &mut AgentState, delta: Vec3) -> CollisionHit {
    let start = state.position;
    let end = start + delta;

    let Some(shape) = state.capsule else {
        return CollisionHit::no_hit(start);
    };
    if is_nearly_zero(delta, 0.0) {
        return CollisionHit::no_hit(start);
    }

    match ctx.sweep(&shape, start, end, &ctx.query_params()) {
        Some(hit) => {
            state.position = hit.location;
            hit
        }
        None => {
            state.position = end;
            CollisionHit::no_hit(end)
        }
    }
}

/// [`move_component`], first pushing out of any penetration it starts in.
pub fn safe_move(ctx: &TickContext, state: &mut AgentState, delta: Vec3) -> CollisionHit {
    let hit = move_component(ctx, state, delta);

    if hit.start_penetrating && resolve_penetration(ctx, state, &hit) {
        return move_component(ctx, state, delta);
    }

    hit
}

fn penetration_adjustment(hit: &CollisionHit) -> Vec3 {
    let depth = if hit.penetration_depth > 0.0 {
        hit.penetration_depth
    } else {
        DEFAULT_PENETRATION_DEPTH
    };
    hit.normal * (depth + PENETRATION_PULLBACK)
}

/// Teleport out of the overlap described by `hit`.
///
/// Returns false when no free spot was found; the position is then unchanged.
pub fn resolve_penetration(ctx: &TickContext, state: &mut AgentState, hit: &CollisionHit) -> bool {
    let Some(shape) = state.capsule else {
        return false;
    };

    let params = ctx.query_params();
    let mut adjustment = penetration_adjustment(hit);

    for _ in 0..MAX_PENETRATION_ITERATIONS {
        let proposed = state.position + adjustment;
        match ctx.sweep(&shape, proposed, proposed, &params) {
            Some(overlap) if overlap.start_penetrating => {
                adjustment += penetration_adjustment(&overlap);
            }
            _ => {
                log::trace!("resolved penetration by {adjustment}");
                state.position = proposed;
                return true;
            }
        }
    }

    false
}

// ============================================================================
// Slide Vectors
// ============================================================================

/// Remove the part of `delta` pushing into `normal`, scaled by `time`.
///
/// While falling the rejection is boosted so the agent pops off steep slopes.
pub fn compute_slide_vector(
    state: &AgentState,
    config: &MovementConfig,
    delta: Vec3,
    time: f32,
    normal: Vec3,
    hit: &CollisionHit,
) -> Vec3 {
    if state.is_falling() {
        slope_boosted_slide(state, config, delta, time, normal, hit)
    } else {
        plane_project(delta, normal) * time
    }
}

fn slope_boosted_slide(
    state: &AgentState,
    config: &MovementConfig,
    delta: Vec3,
    time: f32,
    normal: Vec3,
    hit: &CollisionHit,
) -> Vec3 {
    let wall_angle = hit.impact_normal.z.abs();

    // Cap near-vertical and perfectly flat impact normals
    let impact_normal = if wall_angle <= VERTICAL_SLOPE_NORMAL_Z || wall_angle == 1.0 {
        normal
    } else {
        hit.impact_normal
    };

    let bounce = 1.0 + config.cam_bounce_modifier * (1.0 - state.surface_friction);
    (delta - project_onto_normal(delta, impact_normal) * bounce) * time
}

/// Redirect `delta` after hitting a second surface.
///
/// Walls at 90° or less form a crease to slide along; otherwise the delta
/// slides along the new wall. While walking, climbing is limited to walkable
/// slopes and the step height, and the agent is never pushed into the floor.
pub fn two_wall_adjust(
    state: &AgentState,
    config: &MovementConfig,
    delta: Vec3,
    hit: &CollisionHit,
    old_hit_normal: Vec3,
) -> Vec3 {
    let in_delta = delta;
    let hit_normal = hit.normal;
    let mut delta = delta;

    if old_hit_normal.dot(hit_normal) <= 0.0 {
        let crease = hit_normal.cross(old_hit_normal).normalize_or_zero();
        delta = crease * (delta.dot(crease) * (1.0 - hit.time));
        if in_delta.dot(delta) < 0.0 {
            delta = -delta;
        }
    } else {
        delta = compute_slide_vector(state, config, delta, 1.0 - hit.time, hit_normal, hit);
        if delta.dot(in_delta) <= 0.0 {
            delta = Vec3::ZERO;
        } else if (hit_normal.dot(old_hit_normal) - 1.0).abs() < SAME_WALL_TOLERANCE {
            // Precision kept us on the same wall
            delta += hit_normal * SAME_WALL_NUDGE;
        }
    }

    if !state.is_moving_on_ground() {
        return delta;
    }

    if delta.z > 0.0 {
        if (hit.normal.z >= state.walkable_floor_z || is_walkable(state, hit))
            && hit.normal.z > KINDA_SMALL_NUMBER
        {
            // Keep the horizontal speed going up the slope
            let time = 1.0 - hit.time;
            let scaled = delta.normalize_or_zero() * in_delta.length();
            delta = Vec3::new(in_delta.x, in_delta.y, scaled.z / hit.normal.z) * time;

            if delta.z > state.max_step_height {
                delta *= state.max_step_height / delta.z;
            }
        } else {
            delta.z = 0.0;
        }
    } else if delta.z < 0.0
        && state.current_floor.floor_dist < config.min_floor_dist
        && state.current_floor.blocking_hit()
    {
        delta.z = 0.0;
    }

    delta
}

/// Slide the rest of a blocked move along the surface in `hit`.
///
/// Makes up to two moves, adjusting for a second wall between them. `hit` is
/// updated with the last collision. Returns the fraction of `time` applied.
pub fn slide_along_surface(
    ctx: &TickContext,
    state: &mut AgentState,
    delta: Vec3,
    time: f32,
    normal: Vec3,
    hit: &mut CollisionHit,
) -> f32 {
    if !hit.blocking {
        return 0.0;
    }

    let mut normal = normal;
    if state.is_moving_on_ground() {
        if normal.z > 0.0 {
            // Unwalkable slopes act as walls
            if !is_walkable(state, hit) {
                normal = safe_normal_2d(normal);
            }
        } else if normal.z < -KINDA_SMALL_NUMBER
            && state.current_floor.floor_dist < ctx.config.min_floor_dist
            && state.current_floor.blocking_hit()
        {
            // Ceiling: don't get pushed down into the floor
            let floor_normal = state.current_floor.hit.normal;
            let floor_opposed =
                delta.dot(floor_normal) < 0.0 && floor_normal.z < 1.0 - FLAT_FLOOR_TOLERANCE;
            if floor_opposed {
                normal = floor_normal;
            }
            normal = safe_normal_2d(normal);
        }
    }

    let old_hit_normal = normal;
    let mut slide_delta = compute_slide_vector(state, ctx.config, delta, time, normal, hit);
    if slide_delta.dot(delta) <= 0.0 {
        return 0.0;
    }

    *hit = safe_move(ctx, state, slide_delta);
    let first_hit_percent = hit.time;
    let mut percent_applied = first_hit_percent;

    if hit.is_valid_blocking_hit() {
        slide_delta = two_wall_adjust(state, ctx.config, slide_delta, hit, old_hit_normal);

        if !is_nearly_zero(slide_delta, 1.0e-3) && slide_delta.dot(delta) > 0.0 {
            *hit = safe_move(ctx, state, slide_delta);
            percent_applied += hit.time * (1.0 - first_hit_percent);
        }
    }

    percent_applied.clamp(0.0, 1.0)
}
