//! Jump input and jump bookkeeping.
//!
//! A jump is only attempted on the tick the jump input goes from released to
//! pressed. Holding jump never re-triggers. Between landings the number of
//! jumps is counted so multi-jump configs can allow air jumps.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::math::{is_nearly_equal, KINDA_SMALL_NUMBER};

use super::config::MovementConfig;
use super::context::TickContext;
use super::mode::set_movement_mode;
use super::state::{AgentState, MovementEvent, MovementMode};

/// Jump state machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JumpState {
    /// Previous tick's jump input (for edge detection).
    prev_pressed: bool,

    /// Jumps performed since the agent last landed.
    pub current_count: u32,

    /// Time left on the jump force window (seconds).
    pub force_time_remaining: f32,

    /// Emit an apex event the next time vertical velocity goes negative.
    pub notify_apex: bool,
}

impl JumpState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed this tick's jump input; returns `true` on the press edge.
    pub fn update(&mut self, pressed: bool) -> bool {
        let just_pressed = pressed && !self.prev_pressed;
        self.prev_pressed = pressed;
        just_pressed
    }

    /// Whether the jump input was held last tick.
    #[inline]
    pub fn is_held(&self) -> bool {
        self.prev_pressed
    }

    /// Whether another jump fits in the count budget.
    ///
    /// Walking off a ledge uses up the ground jump, so a falling agent that
    /// has not jumped yet needs room for one extra.
    pub fn has_jump_available(&self, max_count: u32, falling_without_jump: bool) -> bool {
        if falling_without_jump {
            self.current_count + 1 < max_count
        } else {
            self.current_count < max_count
        }
    }

    /// Record a successful jump.
    pub fn start(&mut self, hold_time: f32) {
        self.current_count += 1;
        self.force_time_remaining = hold_time.max(0.0);
        self.notify_apex = true;
    }

    /// End the jump force window.
    #[inline]
    pub fn end_force(&mut self) {
        self.force_time_remaining = 0.0;
    }

    /// Clear everything but the edge detector, as on landing.
    pub fn reset(&mut self) {
        self.current_count = 0;
        self.force_time_remaining = 0.0;
        self.notify_apex = false;
    }
}

// ============================================================================
// Jumping
// ============================================================================

/// Whether the current mode and floor allow a jump at all.
///
/// Walking agents need a floor that is walkable at their current slope
/// limit. Falling agents may jump if they have air jumps left.
pub fn can_attempt_jump(state: &AgentState, config: &MovementConfig) -> bool {
    if !config.can_jump {
        return false;
    }

    match state.mode {
        MovementMode::Walking => {
            let floor_z = state.current_floor.hit.impact_normal.z;
            floor_z >= state.walkable_floor_z
                || is_nearly_equal(floor_z, state.walkable_floor_z, KINDA_SMALL_NUMBER)
        }
        MovementMode::Falling => true,
        MovementMode::Flying | MovementMode::None => false,
    }
}

/// Launch the agent if a jump is allowed.
///
/// On success the vertical velocity is set to the jump speed, the jump is
/// counted and the agent starts falling. A refused jump changes nothing.
pub fn attempt_jump(ctx: &mut TickContext, state: &mut AgentState) -> bool {
    let config = ctx.config;

    if !state.has_valid_data() || !ctx.policy.can_attempt_jump(state, config) {
        return false;
    }

    // Walking off a ledge spent the ground jump
    let falling_without_jump = state.is_falling() && state.jump.current_count == 0;
    if !state
        .jump
        .has_jump_available(config.jump_max_count, falling_without_jump)
    {
        return false;
    }

    if falling_without_jump {
        state.jump.current_count += 1;
    }

    state.velocity.z = config.jump_z_velocity;
    state.jump.start(config.jump_max_hold_time);
    debug!(
        "jump {}/{} at {}",
        state.jump.current_count, config.jump_max_count, state.position
    );
    ctx.emit(MovementEvent::Jumped);

    set_movement_mode(ctx, state, MovementMode::Falling);
    true
}

// ============================================================================
// Tests
// ============================================================================
