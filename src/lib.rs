//! Riftweave - seeded world generation for metroidvania platformers
//!
//! Districts are typed by a wave-function-collapse style solver, then every
//! room is filled by one of four generators and checked against the jump
//! physics of the player.

pub mod seeds;
pub mod graph;
pub mod complexity;
pub mod solver;
pub mod physics;
pub mod room;
pub mod generation;
pub mod world;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::GenerationConfig;
pub use error::{ContradictionReport, GraphError, RoomFailure, ValidationFailure, WorldGenError};
pub use graph::{Capabilities, Connection, ConnectionType, NodeId, NodeLevel, Position, SpatialNodeGraph};
pub use physics::{MovementProfile, ReachabilityValidator};
pub use room::{Biome, BiomeType, Polarity, RoomGenerationRequest, RoomLayout, RoomPipeline};
pub use generation::{GeneratorType, RoomBounds};
pub use solver::{solve_district_graph, DistrictType, ResolvedGraph};
pub use world::{generate_world, World, WorldBlueprint};
