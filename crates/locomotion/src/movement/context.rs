//! Everything a movement phase needs besides the agent state.

use glam::{Quat, Vec3};
use rand::rngs::StdRng;

use crate::collision::{
    AgentId, CollisionChannel, CollisionHit, CollisionQueryService, CollisionShape, QueryParams,
};

use super::config::MovementConfig;
use super::policy::MovementPolicy;
use super::state::MovementEvent;

/// Borrowed collaborators for one tick.
///
/// Built by the simulator at the start of every tick and handed down to each
/// phase alongside the mutable [`AgentState`](super::AgentState).
pub struct TickContext<'a> {
    pub config: &'a MovementConfig,
    pub world: &'a dyn CollisionQueryService,
    pub policy: &'a dyn MovementPolicy,
    /// Agent being moved; its own geometry is ignored by sweeps.
    pub agent: AgentId,
    /// Channels movement sweeps are blocked by.
    pub channel: CollisionChannel,
    pub rng: &'a mut StdRng,
    pub events: &'a mut Vec<MovementEvent>,
    /// Length of the whole tick.
    pub delta_time: f32,
}

impl TickContext<'_> {
    /// Query options for a plain movement sweep.
    #[inline]
    pub fn query_params(&self) -> QueryParams {
        QueryParams::for_agent(self.agent)
    }

    /// Sweep `shape` through the world on the movement channel.
    pub fn sweep(
        &self,
        shape: &CollisionShape,
        start: Vec3,
        end: Vec3,
        params: &QueryParams,
    ) -> Option<CollisionHit> {
        self.world
            .sweep(shape, start, end, Quat::IDENTITY, self.channel, params)
    }

    /// Record an event for the caller.
    #[inline]
    pub fn emit(&mut self, event: MovementEvent) {
        self.events.push(event);
    }
}
