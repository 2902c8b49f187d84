//! Hierarchical node identity
//!
//! Nodes form a tree from the world root down to individual rooms. Each node
//! stores coordinates local to its parent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer 2D coordinates. Used both for node grid cells and tile positions
/// inside a room (x right, y up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean length of the vector from the origin
    pub fn length(&self) -> f32 {
        let x = self.x as f32;
        let y = self.y as f32;
        (x * x + y * y).sqrt()
    }

    /// Manhattan distance to another position
    pub fn distance(&self, other: &Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Chebyshev distance (allows diagonal)
    pub fn chebyshev_distance(&self, other: &Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Shifted position, clamped at the edges of the `i32` range
    pub fn offset(&self, dx: i32, dy: i32) -> Position {
        Position::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Sum of two positions, `None` if either axis overflows
    pub fn checked_add(&self, other: Position) -> Option<Position> {
        Some(Position::new(self.x.checked_add(other.x)?, self.y.checked_add(other.y)?))
    }
}

/// Saturating; use [`Position::checked_add`] to detect overflow
impl std::ops::Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        self.offset(rhs.x, rhs.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Depth of a node in the world hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeLevel {
    World = 0,
    Region = 1,
    District = 2,
    Sector = 3,
    Room = 4,
}

impl NodeLevel {
    pub fn depth(self) -> u8 {
        self as u8
    }

    /// The level directly above this one, `None` for the world root
    pub fn parent_level(self) -> Option<NodeLevel> {
        match self {
            NodeLevel::World => None,
            NodeLevel::Region => Some(NodeLevel::World),
            NodeLevel::District => Some(NodeLevel::Region),
            NodeLevel::Sector => Some(NodeLevel::District),
            NodeLevel::Room => Some(NodeLevel::Sector),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeLevel::World => "world",
            NodeLevel::Region => "region",
            NodeLevel::District => "district",
            NodeLevel::Sector => "sector",
            NodeLevel::Room => "room",
        }
    }
}

/// Identity of a node: unique value, hierarchy level, parent and local
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    pub value: u32,
    pub level: NodeLevel,
    pub parent: Option<u32>,
    pub coordinates: Position,
}

impl NodeId {
    pub fn new(value: u32, level: NodeLevel, parent: Option<u32>, coordinates: Position) -> Self {
        Self {
            value,
            level,
            parent,
            coordinates,
        }
    }

    /// The world root
    pub fn root(value: u32) -> Self {
        Self::new(value, NodeLevel::World, None, Position::ORIGIN)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.level.name(), self.value, self.coordinates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length() {
        assert_eq!(Position::new(3, 4).length(), 5.0);
        assert_eq!(Position::ORIGIN.length(), 0.0);
    }

    #[test]
    fn test_addition_never_overflows() {
        let edge = Position::new(i32::MAX, i32::MIN);
        assert_eq!(edge + Position::new(1, -1), edge);
        assert_eq!(edge.offset(5, -5), edge);
        assert_eq!(edge.checked_add(Position::new(1, 0)), None);
        assert_eq!(edge.checked_add(Position::new(-1, 1)), Some(Position::new(i32::MAX - 1, i32::MIN + 1)));
        assert_eq!(Position::new(2, 3) + Position::new(-1, 4), Position::new(1, 7));
    }

    #[test]
    fn test_parent_levels() {
        assert_eq!(NodeLevel::World.parent_level(), None);
        assert_eq!(NodeLevel::Room.parent_level(), Some(NodeLevel::Sector));
        assert_eq!(NodeLevel::District.depth(), 2);
    }
}
