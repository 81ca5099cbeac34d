//! Surface friction sampling.
//!
//! The cached `surface_friction` scales both acceleration and braking. On the
//! ground it comes from the floor's material; in the air it follows a couple
//! of velocity rules.

use crate::collision::CollisionHit;

use super::context::TickContext;
use super::floor::trace_character_floor;
use super::state::AgentState;

/// Material friction is scaled by this before clamping to 1.
const MATERIAL_FRICTION_SCALE: f32 = 1.25;

/// Friction multiplier for a surface: `min(1, friction * 1.25)`, or 1 without a material.
pub fn friction_from_hit(hit: &CollisionHit) -> f32 {
    match hit.material {
        Some(material) => (material.friction * MATERIAL_FRICTION_SCALE).min(1.0),
        None => 1.0,
    }
}

/// Refresh the cached surface friction after movement.
pub fn update_surface_friction(ctx: &TickContext, state: &mut AgentState, sliding: bool) {
    if !state.is_falling() && state.current_floor.is_walkable_floor() {
        state.surface_friction = trace_character_floor(ctx, state)
            .map(|hit| ctx.policy.surface_friction_from_hit(&hit))
            .unwrap_or(1.0);
        return;
    }

    let vertical = state.velocity.z;
    // Past the jump takeoff speed or no longer rising
    if vertical > ctx.config.jump_velocity_threshold || vertical <= 0.0 {
        state.surface_friction = 1.0;
    } else if sliding {
        state.surface_friction = ctx.config.sliding_surface_friction;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CollisionPlane, PlaneWorld, SurfaceMaterial};
    use crate::movement::testing::Harness;
    use crate::movement::MovementMode;
    use glam::Vec3;

    #[test]
    fn test_friction_from_material() {
        let mut hit = CollisionHit::blocking(0.5, Vec3::ZERO, Vec3::ZERO, Vec3::Z);
        assert_eq!(friction_from_hit(&hit), 1.0);

        hit.material = Some(SurfaceMaterial::new(0.4));
        assert!((friction_from_hit(&hit) - 0.5).abs() < 1e-6);

        hit.material = Some(SurfaceMaterial::new(2.0));
        assert_eq!(friction_from_hit(&hit), 1.0);
    }

    #[test]
    fn test_grounded_friction_samples_floor_material() {
        let world = PlaneWorld::new().with_plane(
            CollisionPlane::new(Vec3::Z, Vec3::ZERO).with_material(SurfaceMaterial::new(0.4)),
        );
        let mut harness = Harness::new(world);
        harness.place_on_floor(Vec3::new(0.0, 0.0, 98.15));

        let (ctx, state) = harness.split();
        update_surface_friction(&ctx, state, false);
        assert!((state.surface_friction - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_airborne_friction_rules() {
        let mut harness = Harness::new(PlaneWorld::new());
        let (ctx, state) = harness.split();
        state.mode = MovementMode::Falling;

        // Rising slowly while sliding
        state.surface_friction = 0.7;
        state.velocity.z = 100.0;
        update_surface_friction(&ctx, state, true);
        assert_eq!(state.surface_friction, 0.25);

        // Rising slowly without sliding: unchanged
        state.surface_friction = 0.7;
        update_surface_friction(&ctx, state, false);
        assert_eq!(state.surface_friction, 0.7);

        // Descending
        state.velocity.z = -10.0;
        update_surface_friction(&ctx, state, true);
        assert_eq!(state.surface_friction, 1.0);

        // Faster than the jump takeoff threshold
        state.surface_friction = 0.7;
        state.velocity.z = 300.0;
        update_surface_friction(&ctx, state, true);
        assert_eq!(state.surface_friction, 1.0);
    }
}
