//! Whole-world generation
//!
//! Solves every district first, then generates every room. The district
//! solve is the only barrier: rooms read the resolved types and never each
//! other, so they are generated in parallel.

pub mod blueprint;

pub use blueprint::{RoomSlot, WorldBlueprint, WorldLayout};

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::error::{RoomFailure, WorldGenError};
use crate::graph::SpatialNodeGraph;
use crate::room::{BiomeType, RoomGenerationRequest, RoomLayout, RoomPipeline};
use crate::solver::{solve_district_graph, DistrictType, NodeSolveState};

/// A generated world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub seed: u64,
    /// The graph with every district typed
    pub graph: SpatialNodeGraph,
    /// Solve states of the unpinned districts
    pub districts: BTreeMap<u32, NodeSolveState>,
    pub solve_passes: u32,
    pub rooms: BTreeMap<u32, RoomLayout>,
    /// Rooms that could not be generated, by room id
    pub failures: Vec<RoomFailure>,
}

impl World {
    pub fn district_counts(&self) -> BTreeMap<DistrictType, usize> {
        let mut counts = BTreeMap::new();
        for node in self.graph.nodes() {
            if let Some(t) = node.district_type {
                *counts.entry(t).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn biome_counts(&self) -> BTreeMap<BiomeType, usize> {
        let mut counts = BTreeMap::new();
        for room in self.rooms.values() {
            *counts.entry(room.biome.biome_type).or_insert(0) += 1;
        }
        counts
    }

    pub fn feature_count(&self) -> usize {
        self.rooms.values().map(|r| r.features.len()).sum()
    }

    /// Rooms with at least one unreachable feature
    pub fn rooms_with_unreachable(&self) -> usize {
        self.rooms.values().filter(|r| !r.validation_failures.is_empty()).count()
    }
}

fn room_request(layout: &WorldLayout, blueprint: &WorldBlueprint, slot: &RoomSlot) -> Option<RoomGenerationRequest> {
    let graph = &layout.graph;
    let district_type = graph.node(slot.district)?.district_type?;
    let neighbors = graph
        .neighbors(slot.district)
        .into_iter()
        .filter_map(|n| graph.node(n).and_then(|node| node.district_type))
        .collect();
    Some(
        RoomGenerationRequest::new(slot.room, slot.coordinates, district_type, blueprint.seed)
            .with_neighbors(neighbors)
            .with_capabilities(blueprint.capabilities_for(slot.region)),
    )
}

/// Build, solve and fill a world.
///
/// A district contradiction aborts with the report so the caller can
/// re-seed. Room failures are collected and the rest of the world is kept.
pub fn generate_world(blueprint: &WorldBlueprint, config: &GenerationConfig) -> Result<World, WorldGenError> {
    let mut layout = blueprint.build()?;
    log::info!(
        "Generating world {}: {} districts, {} rooms",
        blueprint.seed,
        layout.districts.len(),
        layout.rooms.len()
    );

    let resolved = solve_district_graph(&layout.graph, blueprint.seed, &config.solver)?;
    layout.graph = resolved.graph;

    let pipeline = RoomPipeline::new(config);
    let chunk_size = config.solver.chunk_size.max(1);
    let results: Vec<Result<RoomLayout, RoomFailure>> = layout
        .rooms
        .par_chunks(chunk_size)
        .flat_map_iter(|chunk| {
            chunk.iter().map(|slot| {
                let mut request = room_request(&layout, blueprint, slot).ok_or_else(|| RoomFailure::InvalidRequest {
                    room: slot.room,
                    reason: format!("district {} has no type", slot.district),
                })?;
                pipeline.generate_room(&mut request, slot.bounds, None, &blueprint.movement, blueprint.seed)
            })
        })
        .collect();

    let mut rooms = BTreeMap::new();
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(room) => {
                rooms.insert(room.room_id, room);
            }
            Err(failure) => failures.push(failure),
        }
    }

    let world = World {
        seed: blueprint.seed,
        graph: layout.graph,
        districts: resolved.outcomes,
        solve_passes: resolved.passes,
        rooms,
        failures,
    };
    log::info!(
        "World {} done: {} rooms, {} failed, {} features",
        world.seed,
        world.rooms.len(),
        world.failures.len(),
        world.feature_count()
    );
    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Districts without links never constrain each other
    fn unlinked(seed: u64) -> WorldBlueprint {
        WorldBlueprint {
            seed,
            regions: 1,
            districts_per_region: 4,
            link_districts: false,
            ..WorldBlueprint::default()
        }
    }

    #[test]
    fn test_generate_world_is_deterministic() {
        let config = GenerationConfig::default();
        let blueprint = WorldBlueprint::default().with_seed(42);
        let a = generate_world(&blueprint, &config).unwrap();
        let b = generate_world(&blueprint, &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.seed, 42);
        assert!(!a.rooms.is_empty());
    }

    #[test]
    fn test_every_room_is_accounted_for() {
        let config = GenerationConfig::default();
        let blueprint = unlinked(7);
        let world = generate_world(&blueprint, &config).unwrap();
        assert_eq!(world.rooms.len() + world.failures.len(), blueprint.room_count() as usize);
        assert!(!world.rooms.is_empty());
        assert_eq!(world.district_counts().values().sum::<usize>(), blueprint.district_count() as usize);
        assert!(world.district_counts().get(&DistrictType::Hub).copied().unwrap_or(0) >= 1);
        // Only the room chains are linked
        let room_level = Some(crate::graph::NodeLevel::Room);
        assert!(world
            .graph
            .connections()
            .iter()
            .all(|c| world.graph.node(c.from).map(|n| n.level()) == room_level));
    }

    #[test]
    fn test_room_failures_stay_isolated() {
        let config = GenerationConfig::default();
        // Too small for every generator
        let blueprint = WorldBlueprint {
            room_bounds: crate::generation::RoomBounds::new(5, 5),
            room_size_variation: 0,
            ..unlinked(3)
        };
        let world = generate_world(&blueprint, &config).unwrap();
        assert!(world.rooms.is_empty());
        assert_eq!(world.failures.len(), blueprint.room_count() as usize);
        assert!(world.failures.iter().all(|f| f.step() == 4));
    }

    #[test]
    fn test_rooms_follow_their_district() {
        let config = GenerationConfig::default();
        let blueprint = unlinked(11);
        let world = generate_world(&blueprint, &config).unwrap();
        let layout = blueprint.build().unwrap();
        for slot in &layout.rooms {
            assert!(world.graph.node(slot.district).and_then(|n| n.district_type).is_some());
            if let Some(room) = world.rooms.get(&slot.room) {
                assert_eq!(room.bounds, slot.bounds);
            }
        }
        assert_eq!(world.solve_passes, 1);
    }

    #[test]
    fn test_invalid_blueprint_is_rejected() {
        let blueprint = WorldBlueprint { rooms_per_sector: 0, ..WorldBlueprint::default() };
        assert!(matches!(
            generate_world(&blueprint, &GenerationConfig::default()),
            Err(WorldGenError::InvalidBlueprint(_))
        ));
    }
}
