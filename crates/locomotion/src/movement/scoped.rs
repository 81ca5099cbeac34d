//! Temporarily overriding a state field.
//!
//! Some phases run a sub-computation with a field swapped out (e.g. the
//! acceleration while integrating air control) and need the old value back
//! on every exit path. [`ScopedValue`] puts the saved value back on drop.

use std::ops::{Deref, DerefMut};

use glam::Vec3;

use super::state::AgentState;

/// Accessor for one field of [`AgentState`].
pub type FieldAccess<T> = fn(&mut AgentState) -> &mut T;

/// Field accessors usable with [`ScopedValue`].
pub mod field {
    use super::*;

    pub fn acceleration(state: &mut AgentState) -> &mut Vec3 {
        &mut state.acceleration
    }

    pub fn velocity(state: &mut AgentState) -> &mut Vec3 {
        &mut state.velocity
    }
}

/// Guard that restores a field of [`AgentState`] when dropped.
///
/// Derefs to the guarded state so the caller keeps full access.
pub struct ScopedValue<'s, T: Copy> {
    state: &'s mut AgentState,
    access: FieldAccess<T>,
    saved: T,
}

impl<'s, T: Copy> ScopedValue<'s, T> {
    /// Save the field and leave its current value in place.
    pub fn save(state: &'s mut AgentState, access: FieldAccess<T>) -> Self {
        let saved = *access(state);
        Self {
            state,
            access,
            saved,
        }
    }

    /// Save the field and overwrite it with `value` until the guard drops.
    pub fn replace(state: &'s mut AgentState, access: FieldAccess<T>, value: T) -> Self {
        let saved = std::mem::replace(access(state), value);
        Self {
            state,
            access,
            saved,
        }
    }

    /// The value that will be restored.
    pub fn saved(&self) -> T {
        self.saved
    }
}

impl<T: Copy> Deref for ScopedValue<'_, T> {
    type Target = AgentState;

    fn deref(&self) -> &Self::Target {
        self.state
    }
}

impl<T: Copy> DerefMut for ScopedValue<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.state
    }
}

impl<T: Copy> Drop for ScopedValue<'_, T> {
    fn drop(&mut self) {
        *(self.access)(self.state) = self.saved;
    }
}
