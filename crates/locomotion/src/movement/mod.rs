//! Agent movement physics.
//!
//! This module implements kinematic capsule movement with:
//!
//! - Walking with ramp following, step-ups and a hovering floor gap
//! - Sub-stepped falling with apex splitting and landing validation
//! - Flying with fluid friction
//! - Ground and air acceleration, sub-stepped braking and surface friction
//! - Multi-surface sliding and ledge recovery
//! - Edge-triggered jumping with multi-jump support
//!
//! # Design
//!
//! Movement is driven by the [`CharacterMover`], which takes an input each
//! tick and updates the agent's [`AgentState`] through a
//! [`CollisionQueryService`](crate::collision::CollisionQueryService).
//! The phases themselves are free functions over the state and a
//! [`TickContext`]; project rules that vary between games sit behind
//! [`MovementPolicy`].
//!
//! All movement is deterministic: the same inputs, world and seed always
//! produce the same outputs.

mod camera;
mod config;
mod context;
mod controller;
mod falling;
mod floor;
mod flying;
mod friction;
mod jump;
mod landing;
mod mode;
mod policy;
mod scoped;
mod slide;
mod state;
mod velocity;
mod walking;

#[cfg(test)]
pub(crate) mod testing;

pub use camera::camera_roll;
pub use config::{ConfigError, MovementConfig};
pub use context::TickContext;
pub use controller::{CharacterMover, DEFAULT_SEED};
pub use falling::{limit_air_control, new_fall_velocity, phys_falling};
pub use floor::{adjust_floor_height, find_floor, is_walkable};
pub use flying::phys_flying;
pub use friction::{friction_from_hit, update_surface_friction};
pub use jump::{attempt_jump, can_attempt_jump, JumpState};
pub use landing::{is_valid_landing_spot, should_check_for_valid_landing_spot};
pub use mode::{process_landed, set_movement_mode, start_new_physics};
pub use policy::{DefaultPolicy, MovementPolicy};
pub use scoped::{field, ScopedValue};
pub use slide::{compute_slide_vector, safe_move, slide_along_surface, two_wall_adjust};
pub use state::{AgentState, FloorResult, MovementEvent, MovementInput, MovementMode};
pub use velocity::{apply_velocity_braking, calc_velocity, simulation_time_step};
pub use walking::{phys_walking, start_falling, step_up, StepDownResult};
