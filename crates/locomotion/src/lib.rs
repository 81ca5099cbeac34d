//! Alpha Locomotion
//!
//! A kinematic capsule locomotion simulator. Each tick turns a wish
//! direction and a time step into a new position, velocity and movement
//! mode, using swept collision queries against static geometry.
//!
//! # Architecture
//!
//! The simulator is split into two main systems:
//!
//! - **Collision**: Sweeps capsules/boxes through the world, returns hit information
//! - **Movement**: Uses collision sweeps to implement walking, falling and flying
//!
//! # Design Principles
//!
//! 1. **Determinism**: Same inputs and seed always produce the same outputs
//! 2. **Injected world**: Geometry is only reached through [`CollisionQueryService`]
//! 3. **Infallible ticks**: Bad tunables are rejected up front; a tick never fails

pub mod collision;
pub mod math;
pub mod movement;

// Re-export commonly used types
pub use collision::{
    AgentId, CollisionChannel, CollisionHit, CollisionPlane, CollisionQueryService,
    CollisionShape, PlaneWorld, QueryParams, SurfaceMaterial,
};
pub use movement::{
    AgentState, CharacterMover, ConfigError, DefaultPolicy, FloorResult, MovementConfig,
    MovementEvent, MovementInput, MovementMode, MovementPolicy,
};
