//! Character mover.
//!
//! This is the main entry point for agent movement. It owns the agent state,
//! the tunables, the world it queries and the random source, and advances
//! the simulation one tick at a time.

use glam::Vec3;
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::collision::{AgentId, CollisionChannel, CollisionQueryService};
use crate::math::{wish_to_world, MIN_TICK_TIME};

use super::camera::camera_roll;
use super::config::{ConfigError, MovementConfig};
use super::context::TickContext;
use super::floor::{adjust_floor_height, find_floor};
use super::friction::update_surface_friction;
use super::jump::attempt_jump;
use super::mode::{set_movement_mode, start_new_physics};
use super::policy::{DefaultPolicy, MovementPolicy};
use super::state::{AgentState, FloorResult, MovementEvent, MovementInput, MovementMode};

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 0x5EED;

/// Spawn probes start this far above the requested point.
const SPAWN_PROBE_LIFT: f32 = 1.0;

/// Kinematic capsule mover.
///
/// # Example
///
/// ```ignore
/// let world = PlaneWorld::new().with_floor(0.0);
/// let mut mover = CharacterMover::new(MovementConfig::default(), world)?;
/// mover.spawn_at(Vec3::new(0.0, 0.0, 100.0));
///
/// // Each frame:
/// for event in mover.tick(&input, delta_time) {
///     // react to jumps and landings
/// }
/// ```
pub struct CharacterMover<W, P = DefaultPolicy> {
    config: MovementConfig,
    world: W,
    policy: P,
    state: AgentState,
    agent: AgentId,
    channel: CollisionChannel,
    rng: StdRng,
    events: Vec<MovementEvent>,
}

impl<W: CollisionQueryService> CharacterMover<W> {
    /// Create a mover with the default policy.
    ///
    /// The agent starts falling at the origin; use [`Self::spawn_at`] to
    /// place it.
    pub fn new(config: MovementConfig, world: W) -> Result<Self, ConfigError> {
        config.validate()?;

        let state = AgentState::new(&config);
        Ok(Self {
            config,
            world,
            policy: DefaultPolicy,
            state,
            agent: AgentId::default(),
            channel: CollisionChannel::MASK_PAWN_MOVEMENT,
            rng: StdRng::seed_from_u64(DEFAULT_SEED),
            events: Vec::new(),
        })
    }
}

impl<W: CollisionQueryService, P: MovementPolicy> CharacterMover<W, P> {
    /// Swap in a different movement policy.
    pub fn with_policy<Q: MovementPolicy>(self, policy: Q) -> CharacterMover<W, Q> {
        CharacterMover {
            config: self.config,
            world: self.world,
            policy,
            state: self.state,
            agent: self.agent,
            channel: self.channel,
            rng: self.rng,
            events: self.events,
        }
    }

    /// Reseed the random source used for ledge recovery.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Agent id used to skip the agent's own geometry in sweeps.
    pub fn with_agent_id(mut self, agent: AgentId) -> Self {
        self.agent = agent;
        self
    }

    /// Channels the agent is blocked by.
    pub fn with_channel(mut self, channel: CollisionChannel) -> Self {
        self.channel = channel;
        self
    }

    fn split(&mut self, delta_time: f32) -> (TickContext<'_>, &mut AgentState) {
        let ctx = TickContext {
            config: &self.config,
            world: &self.world,
            policy: &self.policy,
            agent: self.agent,
            channel: self.channel,
            rng: &mut self.rng,
            events: &mut self.events,
            delta_time,
        };
        (ctx, &mut self.state)
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    /// Place the agent at `position`.
    ///
    /// Probes down from slightly above the spawn point. A walkable floor in
    /// range puts the agent on it in walking mode; otherwise the agent keeps
    /// the position and starts falling.
    pub fn spawn_at(&mut self, position: Vec3) {
        let (ctx, state) = self.split(0.0);

        state.velocity = Vec3::ZERO;
        state.acceleration = Vec3::ZERO;
        state.jump.reset();

        let probe_start = position + Vec3::Z * SPAWN_PROBE_LIFT;
        let floor = find_floor(&ctx, state, probe_start);

        if floor.is_walkable_floor() {
            state.position = floor.hit.location;
            state.current_floor = find_floor(&ctx, state, state.position);
            adjust_floor_height(&ctx, state);
            state.mode = MovementMode::Walking;
            state.braking_tolerated = true;
        } else {
            state.position = position;
            state.current_floor = FloorResult::default();
            state.mode = MovementMode::Falling;
            state.braking_tolerated = false;
        }

        debug!("spawned at {} ({:?})", state.position, state.mode);
    }

    /// Advance the simulation by `delta_time` seconds.
    ///
    /// Returns the events raised during this tick. Without a capsule, or for
    /// a step shorter than the minimum tick time, nothing changes.
    pub fn tick(&mut self, input: &MovementInput, delta_time: f32) -> &[MovementEvent] {
        self.events.clear();

        if delta_time < MIN_TICK_TIME || !self.state.has_valid_data() {
            return &self.events;
        }

        let (mut ctx, state) = self.split(delta_time);
        let config = ctx.config;

        state.wants_to_walk = input.wants_to_walk;

        let wish = input.wish.clamp_length_max(1.0);
        state.last_input_vector = wish_to_world(wish, state.orientation_yaw);
        state.analog_input_modifier = wish.length().clamp(0.0, 1.0);
        state.acceleration = state.last_input_vector * config.max_acceleration;

        if state.is_moving_on_ground() {
            state.current_floor = find_floor(&ctx, state, state.position);
        }

        if state.jump.update(input.jump_pressed) {
            attempt_jump(&mut ctx, state);
        }

        let axis_limit = config.axis_speed_limit;
        state.velocity.z = state.velocity.z.clamp(-axis_limit, axis_limit);
        state.jump_apex_attempts = 0;

        start_new_physics(&mut ctx, state, delta_time, 0);

        state.velocity.x = state.velocity.x.clamp(-axis_limit, axis_limit);
        state.velocity.y = state.velocity.y.clamp(-axis_limit, axis_limit);

        update_surface_friction(&ctx, state, input.sliding);
        state.braking_tolerated = state.is_moving_on_ground();
        state.camera_roll = camera_roll(
            state.velocity,
            state.orientation_yaw,
            config.cam_roll_angle,
            config.cam_roll_speed,
        );

        &self.events
    }

    /// Try to jump right now, outside the input edge detection.
    pub fn attempt_jump(&mut self) -> bool {
        self.events.clear();
        let (mut ctx, state) = self.split(0.0);
        attempt_jump(&mut ctx, state)
    }

    /// Force a movement mode, running its entry rules.
    pub fn set_movement_mode(&mut self, mode: MovementMode) {
        self.events.clear();
        let (mut ctx, state) = self.split(0.0);
        set_movement_mode(&mut ctx, state, mode);
    }

    /// Face `yaw` radians around Z; the wish vector is relative to it.
    pub fn set_orientation_yaw(&mut self, yaw: f32) {
        self.state.orientation_yaw = yaw;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AgentState {
        &mut self.state
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Events raised by the last call that advanced or changed the agent.
    pub fn events(&self) -> &[MovementEvent] {
        &self.events
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.state.position
    }

    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.state.velocity
    }

    #[inline]
    pub fn acceleration(&self) -> Vec3 {
        self.state.acceleration
    }

    #[inline]
    pub fn mode(&self) -> MovementMode {
        self.state.mode
    }

    #[inline]
    pub fn current_floor(&self) -> &FloorResult {
        &self.state.current_floor
    }

    #[inline]
    pub fn is_walkable_floor(&self) -> bool {
        self.state.current_floor.is_walkable_floor()
    }

    #[inline]
    pub fn braking_tolerated(&self) -> bool {
        self.state.braking_tolerated
    }

    /// Speed cap for the current walk toggle, before analog scaling.
    pub fn max_speed(&self) -> f32 {
        self.policy.max_speed(&self.state, &self.config)
    }

    #[inline]
    pub fn camera_roll(&self) -> f32 {
        self.state.camera_roll
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::PlaneWorld;
    use glam::Vec2;

    const DT: f32 = 1.0 / 60.0;

    fn mover() -> CharacterMover<PlaneWorld> {
        let world = PlaneWorld::new().with_floor(0.0);
        CharacterMover::new(MovementConfig::default(), world).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = MovementConfig {
            max_simulation_iterations: 0,
            ..Default::default()
        };
        let result = CharacterMover::new(config, PlaneWorld::new());
        assert!(matches!(result, Err(ConfigError::NoIterations)));
    }

    #[test]
    fn test_gravity() {
        let mut mover = CharacterMover::new(MovementConfig::default(), PlaneWorld::new()).unwrap();
        mover.spawn_at(Vec3::new(0.0, 0.0, 1000.0));
        assert_eq!(mover.mode(), MovementMode::Falling);

        mover.tick(&MovementInput::default(), DT);
        assert!(mover.velocity().z < 0.0);
        assert!(mover.position().z < 1000.0);
    }

    #[test]
    fn test_spawn_at_finds_ground() {
        let mut mover = mover();
        mover.spawn_at(Vec3::new(0.0, 0.0, 100.0));

        assert_eq!(mover.mode(), MovementMode::Walking);
        assert!(mover.is_walkable_floor());
        assert!(mover.braking_tolerated());
        let gap = mover.position().z - 96.0;
        assert!(gap >= 1.9 && gap <= 2.4 + 0.02);
    }

    #[test]
    fn test_spawn_at_no_ground() {
        let mut mover = mover();
        mover.spawn_at(Vec3::new(0.0, 0.0, 500.0));

        assert_eq!(mover.mode(), MovementMode::Falling);
        assert_eq!(mover.position(), Vec3::new(0.0, 0.0, 500.0));
        assert!(!mover.is_walkable_floor());
    }

    #[test]
    fn test_forward_movement() {
        let mut mover = mover();
        mover.spawn_at(Vec3::new(0.0, 0.0, 100.0));
        let start = mover.position();

        let input = MovementInput::wish(Vec2::new(0.0, 1.0));
        for _ in 0..30 {
            mover.tick(&input, DT);
        }

        assert_eq!(mover.mode(), MovementMode::Walking);
        assert!(mover.position().x > start.x + 50.0);
        assert!((mover.position().y - start.y).abs() < 1e-3);
        assert!(mover.velocity().x > 0.0);
        assert!(mover.velocity().x <= mover.max_speed() + 1e-2);
    }

    #[test]
    fn test_jump() {
        let mut mover = mover();
        mover.spawn_at(Vec3::new(0.0, 0.0, 100.0));

        let press = MovementInput {
            jump_pressed: true,
            ..Default::default()
        };
        let events = mover.tick(&press, DT).to_vec();
        assert!(events.contains(&MovementEvent::Jumped));
        assert_eq!(mover.mode(), MovementMode::Falling);
        assert!(mover.velocity().z > 0.0);

        // Holding does not jump again
        let events = mover.tick(&press, DT).to_vec();
        assert!(!events.contains(&MovementEvent::Jumped));
    }

    #[test]
    fn test_yaw_rotates_wish() {
        let mut mover = mover();
        mover.spawn_at(Vec3::new(0.0, 0.0, 100.0));
        mover.set_orientation_yaw(std::f32::consts::FRAC_PI_2);

        mover.tick(&MovementInput::wish(Vec2::new(0.0, 1.0)), DT);
        assert!(mover.velocity().y > 0.0);
        assert!(mover.velocity().x.abs() < 1e-3);
    }

    #[test]
    fn test_events_cleared_each_tick() {
        let mut mover = mover();
        mover.spawn_at(Vec3::new(0.0, 0.0, 100.0));

        mover.set_movement_mode(MovementMode::Flying);
        assert_eq!(mover.events().len(), 1);

        mover.tick(&MovementInput::default(), DT);
        assert!(mover.events().is_empty());
    }

    #[test]
    fn test_without_capsule_nothing_moves() {
        let mut mover = mover();
        mover.spawn_at(Vec3::new(0.0, 0.0, 500.0));
        mover.state_mut().capsule = None;
        let before = mover.state().clone();

        let input = MovementInput {
            wish: Vec2::new(1.0, 1.0),
            jump_pressed: true,
            ..Default::default()
        };
        assert!(mover.tick(&input, DT).is_empty());
        assert_eq!(*mover.state(), before);
    }
}
