//! Collision channels for filtering sweeps.
//!
//! Every piece of world geometry belongs to one or more object channels, and
//! a query names the channels it wants to be blocked by.

use serde::{Deserialize, Serialize};

/// Bit set of collision object channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CollisionChannel(pub u32);

impl CollisionChannel {
    /// Matches nothing.
    pub const NONE: Self = Self(0);

    /// Static level geometry - floors, walls, ramps.
    pub const WORLD_STATIC: Self = Self(1 << 0);

    /// Movable level geometry - doors, platforms.
    pub const WORLD_DYNAMIC: Self = Self(1 << 1);

    /// Other movement agents.
    pub const PAWN: Self = Self(1 << 2);

    /// Volumes that only block agents (invisible walls).
    pub const PAWN_CLIP: Self = Self(1 << 3);

    /// Non-blocking volumes.
    pub const TRIGGER: Self = Self(1 << 4);

    /// Standard channel set for agent movement sweeps.
    pub const MASK_PAWN_MOVEMENT: Self = Self(
        Self::WORLD_STATIC.0 | Self::WORLD_DYNAMIC.0 | Self::PAWN.0 | Self::PAWN_CLIP.0,
    );

    /// Check if all of `other`'s channels are set.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any channel is shared.
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for CollisionChannel {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for CollisionChannel {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
