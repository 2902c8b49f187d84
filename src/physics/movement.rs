//! Player movement capabilities

use serde::{Deserialize, Serialize};

use crate::graph::Capabilities;

/// Physical movement limits of the player character, in tile units.
/// Read-only input to reachability checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementProfile {
    pub max_jump_height: f32,
    pub max_jump_distance: f32,
    /// Downward acceleration, tiles/s^2
    pub gravity: f32,
    /// Horizontal speed, tiles/s
    pub move_speed: f32,
    pub has_double_jump: bool,
    pub has_wall_jump: bool,
    pub has_dash: bool,
}

impl MovementProfile {
    /// Starting character: single jump, no abilities
    pub fn standard() -> Self {
        Self {
            max_jump_height: 4.0,
            max_jump_distance: 6.0,
            gravity: 30.0,
            move_speed: 8.0,
            has_double_jump: false,
            has_wall_jump: false,
            has_dash: false,
        }
    }

    pub fn with_jump_height(mut self, height: f32) -> Self {
        self.max_jump_height = height;
        self
    }

    /// Turn on ability flags present in `caps`. Abilities already on stay on.
    pub fn with_capabilities(mut self, caps: Capabilities) -> Self {
        self.has_double_jump |= caps.contains(Capabilities::DOUBLE_JUMP);
        self.has_wall_jump |= caps.contains(Capabilities::WALL_JUMP);
        self.has_dash |= caps.contains(Capabilities::DASH);
        self
    }

    /// Ability flags as a capability mask
    pub fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::NONE;
        if self.has_double_jump {
            caps = caps | Capabilities::DOUBLE_JUMP;
        }
        if self.has_wall_jump {
            caps = caps | Capabilities::WALL_JUMP;
        }
        if self.has_dash {
            caps = caps | Capabilities::DASH;
        }
        caps
    }

    /// Initial upward velocity of a single jump
    pub fn jump_velocity(&self) -> f32 {
        if self.gravity <= 0.0 || self.max_jump_height <= 0.0 {
            0.0
        } else {
            (2.0 * self.gravity * self.max_jump_height).sqrt()
        }
    }
}

impl Default for MovementProfile {
    fn default() -> Self {
        Self::standard()
    }
}
