//! The world query boundary.
//!
//! The movement code never owns geometry. It asks a [`CollisionQueryService`]
//! to sweep a shape and acts on the first blocking contact.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::channel::CollisionChannel;
use super::hit::{CollisionHit, CollisionShape};

/// Identifies a movement agent so its own body can be skipped by sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AgentId(pub u32);

/// Per-query options.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QueryParams {
    /// Geometry owned by this agent is ignored.
    pub ignore_agent: Option<AgentId>,

    /// Ask for per-triangle precision instead of simplified collision.
    pub trace_complex: bool,

    /// Fill [`CollisionHit::material`] when the surface has one.
    pub return_material: bool,
}

impl QueryParams {
    /// Options for a sweep made on behalf of `agent`.
    pub fn for_agent(agent: AgentId) -> Self {
        Self {
            ignore_agent: Some(agent),
            ..Default::default()
        }
    }

    /// Same options, but also request the surface material.
    pub fn with_material(mut self) -> Self {
        self.trace_complex = true;
        self.return_material = true;
        self
    }
}

/// Answers shape sweeps against world geometry.
///
/// Implementations must be side-effect free from the caller's point of view
/// and return synchronously.
pub trait CollisionQueryService {
    /// Sweep `shape` from `start` to `end`.
    ///
    /// Returns `None` when nothing on `channel` was touched, otherwise the
    /// earliest blocking contact.
    fn sweep(
        &self,
        shape: &CollisionShape,
        start: Vec3,
        end: Vec3,
        rotation: Quat,
        channel: CollisionChannel,
        params: &QueryParams,
    ) -> Option<CollisionHit>;
}

impl<T: CollisionQueryService + ?Sized> CollisionQueryService for &T {
    fn sweep(
        &self,
        shape: &CollisionShape,
        start: Vec3,
        end: Vec3,
        rotation: Quat,
        channel: CollisionChannel,
        params: &QueryParams,
    ) -> Option<CollisionHit> {
        (**self).sweep(shape, start, end, rotation, channel, params)
    }
}
