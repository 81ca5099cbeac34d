//! Collision queries for agent movement.
//!
//! The movement code only sees the world through a
//! [`CollisionQueryService`]: sweep a shape from one point to another and get
//! back the first blocking contact.
//!
//! # Key Types
//!
//! - [`CollisionQueryService`]: The sweep interface a world implements
//! - [`CollisionHit`]: Output from a sweep
//! - [`CollisionShape`]: Shape used for sweeping (capsule, box or point)
//! - [`PlaneWorld`]: Deterministic half-space world for tests and headless runs

mod channel;
mod hit;
mod plane_world;
mod query;

pub use channel::CollisionChannel;
pub use hit::{CollisionHit, CollisionShape, SurfaceMaterial};
pub use plane_world::{CollisionPlane, PlaneWorld, SWEEP_SKIN};
pub use query::{AgentId, CollisionQueryService, QueryParams};
