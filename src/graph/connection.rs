//! Edges between nodes and their traversal metadata

use serde::{Deserialize, Serialize};

/// Minimum traversal cost of any connection
pub const MIN_TRAVERSAL_COST: f32 = 0.1;

/// How a connection can be traversed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionType {
    Bidirectional,
    OneWay,
    /// Fall from a ledge; cannot be climbed back
    Drop,
    /// Updraft or pipe that only pushes one way
    Vent,
    /// Passable both ways once broken
    Breakable,
    Teleport,
    /// Opens when an external condition is met
    Conditional,
}

impl ConnectionType {
    /// Whether traversal is limited to from -> to
    pub fn is_directed(self) -> bool {
        matches!(self, ConnectionType::OneWay | ConnectionType::Drop | ConnectionType::Vent)
    }
}

/// Movement abilities, as a bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Capabilities(pub u32);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    pub const DOUBLE_JUMP: Capabilities = Capabilities(1 << 0);
    pub const WALL_JUMP: Capabilities = Capabilities(1 << 1);
    pub const DASH: Capabilities = Capabilities(1 << 2);
    pub const SWIM: Capabilities = Capabilities(1 << 3);
    pub const GLIDE: Capabilities = Capabilities(1 << 4);
    pub const BREAK_WALLS: Capabilities = Capabilities(1 << 5);
    pub const HEAT_RESIST: Capabilities = Capabilities(1 << 6);
    pub const COLD_RESIST: Capabilities = Capabilities(1 << 7);

    pub fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: Capabilities) -> Capabilities {
        Capabilities(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        self.union(rhs)
    }
}

/// An edge in the spatial graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub from: u32,
    pub to: u32,
    pub kind: ConnectionType,
    pub required: Capabilities,
    /// Always at least [`MIN_TRAVERSAL_COST`]
    pub traversal_cost: f32,
    pub active: bool,
}

impl Connection {
    pub fn new(from: u32, to: u32, kind: ConnectionType) -> Self {
        Self {
            from,
            to,
            kind,
            required: Capabilities::NONE,
            traversal_cost: 1.0,
            active: true,
        }
    }

    pub fn bidirectional(from: u32, to: u32) -> Self {
        Self::new(from, to, ConnectionType::Bidirectional)
    }

    pub fn with_requirement(mut self, required: Capabilities) -> Self {
        self.required = required;
        self
    }

    pub fn with_cost(mut self, cost: f32) -> Self {
        self.traversal_cost = if cost.is_finite() {
            cost.max(MIN_TRAVERSAL_COST)
        } else {
            MIN_TRAVERSAL_COST
        };
        self
    }

    /// Whether the edge touches `node`
    pub fn touches(&self, node: u32) -> bool {
        self.from == node || self.to == node
    }

    /// The other endpoint seen from `node`
    pub fn other(&self, node: u32) -> Option<u32> {
        if self.from == node {
            Some(self.to)
        } else if self.to == node {
            Some(self.from)
        } else {
            None
        }
    }

    /// Can a traveller with `caps` go from `from` to `to` over this edge?
    pub fn permits(&self, from: u32, to: u32, caps: Capabilities) -> bool {
        if !self.active || !caps.contains(self.required) {
            return false;
        }
        if self.from == from && self.to == to {
            return true;
        }
        !self.kind.is_directed() && self.from == to && self.to == from
    }
}
