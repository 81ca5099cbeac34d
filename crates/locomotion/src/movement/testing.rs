//! Test fixture owning everything a [`TickContext`] borrows.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::collision::{AgentId, CollisionChannel, PlaneWorld};

use super::config::MovementConfig;
use super::context::TickContext;
use super::floor::find_floor;
use super::policy::DefaultPolicy;
use super::state::{AgentState, MovementEvent, MovementMode};

pub(crate) struct Harness {
    pub config: MovementConfig,
    pub state: AgentState,
    pub world: PlaneWorld,
    pub policy: DefaultPolicy,
    pub rng: StdRng,
    pub events: Vec<MovementEvent>,
    pub delta_time: f32,
}

impl Harness {
    pub fn new(world: PlaneWorld) -> Self {
        Self::with_config(MovementConfig::default(), world)
    }

    pub fn with_config(config: MovementConfig, world: PlaneWorld) -> Self {
        let state = AgentState::new(&config);
        Self {
            config,
            state,
            world,
            policy: DefaultPolicy,
            rng: StdRng::seed_from_u64(0),
            events: Vec::new(),
            delta_time: 1.0 / 60.0,
        }
    }

    /// Borrow a context and the agent state side by side.
    pub fn split(&mut self) -> (TickContext<'_>, &mut AgentState) {
        let ctx = TickContext {
            config: &self.config,
            world: &self.world,
            policy: &self.policy,
            agent: AgentId(0),
            channel: CollisionChannel::MASK_PAWN_MOVEMENT,
            rng: &mut self.rng,
            events: &mut self.events,
            delta_time: self.delta_time,
        };
        (ctx, &mut self.state)
    }

    /// Put the agent in walking mode at `position` with a fresh floor probe.
    pub fn place_on_floor(&mut self, position: Vec3) {
        let (ctx, state) = self.split();
        state.position = position;
        state.mode = MovementMode::Walking;
        state.current_floor = find_floor(&ctx, state, position);
    }
}
