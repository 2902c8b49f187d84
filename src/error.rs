//! Error types
//!
//! District contradictions surface to the caller as a report; room failures
//! stay isolated to their room. Recovery (re-seed, relax, accept a
//! placeholder) is left to whoever called in.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generation::GeneratorType;
use crate::graph::{NodeLevel, Position};
use crate::solver::{DistrictType, GenerationState};

/// Structural problems when building a [`crate::graph::SpatialNodeGraph`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("node {0} already exists")]
    DuplicateNode(u32),
    #[error("world node {0} cannot have a parent")]
    RootWithParent(u32),
    #[error("node {0} needs a parent")]
    MissingParentRef(u32),
    #[error("parent {parent} of node {node} does not exist")]
    MissingParent { node: u32, parent: u32 },
    #[error("node {node} is a {} but its parent is a {}", .level.name(), .parent_level.name())]
    LevelMismatch {
        node: u32,
        level: NodeLevel,
        parent_level: NodeLevel,
    },
    #[error("node {node} shares coordinates {coordinates} with sibling {sibling}")]
    DuplicateCoordinates {
        node: u32,
        sibling: u32,
        coordinates: Position,
    },
    #[error("unknown node {0}")]
    UnknownNode(u32),
    #[error("node {0} cannot connect to itself")]
    SelfConnection(u32),
    #[error("node {0} is not a district")]
    NotADistrict(u32),
}

/// Why a district node ended up without a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContradictionReason {
    /// Every candidate was invalidated
    CandidatesExhausted,
    /// Iteration ceiling reached with forced collapse disabled
    IterationCeiling,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContradictionEntry {
    pub node: u32,
    pub coordinates: Position,
    pub state: GenerationState,
    pub iterations: u32,
    pub reason: ContradictionReason,
}

/// Returned when at least one district could not be resolved. Carries the
/// types that did resolve so a caller can re-seed just the failing subgraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContradictionReport {
    pub seed: u64,
    pub entries: Vec<ContradictionEntry>,
    pub partial: BTreeMap<u32, DistrictType>,
}

impl ContradictionReport {
    pub fn nodes(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.node).collect()
    }
}

impl fmt::Display for ContradictionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} district(s) unresolved with seed {}:",
            self.entries.len(),
            self.seed
        )?;
        for e in &self.entries {
            write!(f, " {} at {} ({:?})", e.node, e.coordinates, e.reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for ContradictionReport {}

/// A generator could not satisfy its constraints
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum GeneratorError {
    #[error("profile cannot climb a single tile")]
    NoVerticalReach,
    #[error("profile cannot cross a single tile")]
    NoHorizontalReach,
    #[error("gap of {gap} tiles at height {height} cannot be bridged")]
    UnbridgeableGap { height: i32, gap: i32 },
    #[error("layer {0} has no platform reachable from below")]
    DisconnectedLayer(usize),
    #[error("nothing could be placed")]
    Empty,
}

/// A room that could not be generated. The room is marked failed; siblings
/// carry on.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum RoomFailure {
    #[error("room {room}: {width}x{height} is too small at step {step} (needs {min_width}x{min_height})")]
    InsufficientSpace {
        room: u32,
        step: u8,
        width: i32,
        height: i32,
        min_width: i32,
        min_height: i32,
    },
    #[error("room {room}: {generator:?} failed: {source}")]
    GeneratorContradiction {
        room: u32,
        generator: GeneratorType,
        #[source]
        source: GeneratorError,
    },
    #[error("room {room}: invalid request: {reason}")]
    InvalidRequest { room: u32, reason: String },
}

impl RoomFailure {
    pub fn room(&self) -> u32 {
        match self {
            RoomFailure::InsufficientSpace { room, .. }
            | RoomFailure::GeneratorContradiction { room, .. }
            | RoomFailure::InvalidRequest { room, .. } => *room,
        }
    }

    /// Pipeline step the failure happened in
    pub fn step(&self) -> u8 {
        match self {
            RoomFailure::InsufficientSpace { step, .. } => *step,
            RoomFailure::GeneratorContradiction { .. } => 4,
            RoomFailure::InvalidRequest { .. } => 1,
        }
    }
}

/// A late-detected unreachable pair. Reported alongside the room, never
/// repaired.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("room {room}: feature {from} at {from_position} cannot reach feature {to} at {to_position}")]
pub struct ValidationFailure {
    pub room: u32,
    pub from: u32,
    pub from_position: Position,
    pub to: u32,
    pub to_position: Position,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

/// Top-level failure of a whole-world run
#[derive(Debug, Error)]
pub enum WorldGenError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Contradiction(#[from] ContradictionReport),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid blueprint: {0}")]
    InvalidBlueprint(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_failure_accessors() {
        let f = RoomFailure::InsufficientSpace {
            room: 7,
            step: 4,
            width: 2,
            height: 2,
            min_width: 8,
            min_height: 8,
        };
        assert_eq!(f.room(), 7);
        assert_eq!(f.step(), 4);
        assert!(f.to_string().contains("too small"));
    }

    #[test]
    fn test_report_display_lists_nodes() {
        let report = ContradictionReport {
            seed: 42,
            entries: vec![ContradictionEntry {
                node: 11,
                coordinates: Position::new(20, 20),
                state: GenerationState::Contradiction,
                iterations: 1,
                reason: ContradictionReason::CandidatesExhausted,
            }],
            partial: BTreeMap::new(),
        };
        let text = report.to_string();
        assert!(text.contains("seed 42"));
        assert!(text.contains("(20, 20)"));
        assert_eq!(report.nodes(), vec![11]);
    }

    #[test]
    fn test_graph_error_message() {
        let e = GraphError::LevelMismatch {
            node: 4,
            level: NodeLevel::Room,
            parent_level: NodeLevel::Region,
        };
        assert_eq!(e.to_string(), "node 4 is a room but its parent is a region");
    }
}
