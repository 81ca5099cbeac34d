//! Landing-spot acceptance.

use glam::Vec3;

use crate::collision::CollisionHit;
use crate::math::{size_squared_2d, KINDA_SMALL_NUMBER};

use super::context::TickContext;
use super::floor::{find_floor, is_walkable};
use super::slide::compute_slide_vector;
use super::state::AgentState;

/// Impact points this close to the capsule rim are edge hits.
const SWEEP_EDGE_REJECT_DISTANCE: f32 = 0.15;

/// Whether `impact_point` lies far enough inside the capsule footprint.
pub fn is_within_edge_tolerance(capsule_location: Vec3, impact_point: Vec3, radius: f32) -> bool {
    let dist_sq = size_squared_2d(impact_point - capsule_location);
    let reduced = (SWEEP_EDGE_REJECT_DISTANCE + KINDA_SMALL_NUMBER)
        .max(radius - SWEEP_EDGE_REJECT_DISTANCE);
    dist_sq < reduced * reduced
}

/// Whether a rejected hit is worth a floor probe to find a ledge top.
///
/// Edge hits on the lower hemisphere report a normal that differs from the
/// impact normal; a probe straight down may still find walkable ground.
pub fn should_check_for_valid_landing_spot(
    ctx: &TickContext,
    state: &AgentState,
    hit: &CollisionHit,
) -> bool {
    if ctx.config.use_flat_base_for_floor_checks {
        return false;
    }

    if hit.normal.z > KINDA_SMALL_NUMBER
        && !hit
            .normal
            .abs_diff_eq(hit.impact_normal, KINDA_SMALL_NUMBER)
    {
        let (radius, _) = state.capsule_size();
        return is_within_edge_tolerance(state.position, hit.impact_point, radius);
    }

    false
}

/// Decide whether the agent can land on `hit` with the capsule at `location`.
pub fn is_valid_landing_spot(
    ctx: &TickContext,
    state: &AgentState,
    location: Vec3,
    hit: &CollisionHit,
) -> bool {
    if !hit.blocking {
        return false;
    }

    let config = ctx.config;

    if !hit.start_penetrating {
        if !is_walkable(state, hit) {
            return false;
        }

        let (radius, half_height) = state.capsule_size();

        if config.use_flat_base_for_floor_checks {
            let lower_hemisphere_z = hit.location.z - half_height + config.max_floor_dist;
            if (hit.impact_normal.z < state.walkable_floor_z || hit.impact_normal.z == 1.0)
                && hit.impact_point.z > lower_hemisphere_z
            {
                return false;
            }
        } else {
            let lower_hemisphere_z = hit.location.z - half_height + radius;
            if hit.impact_point.z >= lower_hemisphere_z {
                return false;
            }
        }

        if !is_within_edge_tolerance(hit.location, hit.impact_point, radius) {
            return false;
        }
    } else if hit.normal.z < KINDA_SMALL_NUMBER {
        // Pushed out sideways: not a floor
        return false;
    }

    if !find_floor(ctx, state, location).is_walkable_floor() {
        return false;
    }

    // Still climbing through a jump arc after deflecting off the surface
    if hit.normal.z < 1.0 && state.velocity.dot(hit.normal) < 0.0 {
        let mut deflect = state.velocity;
        deflect.z += 0.5 * config.gravity_z * ctx.delta_time;
        let deflect = compute_slide_vector(state, config, deflect, 1.0, hit.normal, hit);

        if deflect.z > config.jump_velocity_threshold {
            return false;
        }
    }

    true
}
