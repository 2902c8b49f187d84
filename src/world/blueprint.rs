//! World blueprints
//!
//! A blueprint describes the shape of a world: how many regions are stacked,
//! how many districts each holds, and how those break down into sectors and
//! rooms. Building it yields the spatial graph the solver and the room
//! pipeline run over.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, WorldGenError};
use crate::generation::RoomBounds;
use crate::graph::{Capabilities, Connection, ConnectionType, NodeId, NodeLevel, Position, SpatialNodeGraph};
use crate::physics::MovementProfile;
use crate::seeds::{stream, SeedPurpose};
use crate::solver::DistrictType;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldBlueprint {
    pub seed: u64,
    /// Regions are stacked bottom to top
    pub regions: u32,
    pub districts_per_region: u32,
    pub sectors_per_district: u32,
    pub rooms_per_sector: u32,
    /// Grid cells between neighbouring districts
    pub district_spacing: i32,
    /// Link each district to its grid neighbours
    pub link_districts: bool,
    /// Smallest room size
    pub room_bounds: RoomBounds,
    /// Random extra width and height per room, up to this many tiles
    pub room_size_variation: i32,
    pub movement: MovementProfile,
    /// Abilities unlocked on entering each region, cumulative
    pub region_capabilities: Vec<Capabilities>,
    /// Designer-fixed district types, keyed by district ordinal
    pub pinned: BTreeMap<u32, DistrictType>,
    /// Extra district links, by district ordinal
    pub extra_links: Vec<(u32, u32)>,
}

impl Default for WorldBlueprint {
    fn default() -> Self {
        Self {
            seed: 42,
            regions: 2,
            districts_per_region: 6,
            sectors_per_district: 2,
            rooms_per_sector: 3,
            district_spacing: 5,
            link_districts: true,
            room_bounds: RoomBounds::new(40, 28),
            room_size_variation: 8,
            movement: MovementProfile::standard(),
            region_capabilities: vec![
                Capabilities::NONE,
                Capabilities::DOUBLE_JUMP,
                Capabilities::DASH | Capabilities::WALL_JUMP,
            ],
            pinned: BTreeMap::from([(0, DistrictType::Hub)]),
            extra_links: Vec::new(),
        }
    }
}

/// A room node and what the pipeline needs to know about where it sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSlot {
    pub room: u32,
    pub district: u32,
    pub region: usize,
    pub coordinates: Position,
    pub bounds: RoomBounds,
}

/// The built graph plus the lookups used when generating rooms
#[derive(Debug, Clone)]
pub struct WorldLayout {
    pub graph: SpatialNodeGraph,
    /// District node ids by ordinal
    pub districts: Vec<u32>,
    pub rooms: Vec<RoomSlot>,
}

impl WorldBlueprint {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn district_count(&self) -> u32 {
        self.regions * self.districts_per_region
    }

    pub fn room_count(&self) -> u32 {
        self.district_count() * self.sectors_per_district * self.rooms_per_sector
    }

    pub fn validate(&self) -> Result<(), WorldGenError> {
        let invalid = |msg: String| Err(WorldGenError::InvalidBlueprint(msg));
        if self.regions == 0 || self.districts_per_region == 0 {
            return invalid("a world needs at least one district".into());
        }
        if self.sectors_per_district == 0 || self.rooms_per_sector == 0 {
            return invalid("every district needs at least one room".into());
        }
        if self.district_spacing < 1 {
            return invalid(format!("district spacing {} must be positive", self.district_spacing));
        }
        if self.room_bounds.width < 1 || self.room_bounds.height < 1 || self.room_size_variation < 0 {
            return invalid(format!(
                "room bounds {}x{} (+{}) are not usable",
                self.room_bounds.width, self.room_bounds.height, self.room_size_variation
            ));
        }
        let count = self.district_count();
        if let Some(&ordinal) = self.pinned.keys().find(|&&o| o >= count) {
            return invalid(format!("pinned district {} out of {}", ordinal, count));
        }
        if let Some(&(a, b)) = self.extra_links.iter().find(|(a, b)| *a >= count || *b >= count) {
            return invalid(format!("link {}-{} names a district out of {}", a, b, count));
        }
        Ok(())
    }

    /// Abilities available anywhere in a region
    pub fn capabilities_for(&self, region: usize) -> Capabilities {
        self.region_capabilities
            .iter()
            .take(region + 1)
            .fold(Capabilities::NONE, |acc, c| acc | *c)
    }

    fn grid_columns(&self) -> i32 {
        (self.districts_per_region as f32).sqrt().ceil().max(1.0) as i32
    }

    /// Local cell of the `index`th district of a region
    fn district_cell(&self, index: u32) -> Position {
        let cols = self.grid_columns();
        let i = index as i32;
        Position::new((i % cols) * self.district_spacing, (i / cols) * self.district_spacing)
    }

    fn room_bounds_for(&self, room: u32) -> RoomBounds {
        if self.room_size_variation == 0 {
            return self.room_bounds;
        }
        let mut rng = stream(self.seed, room as u64, SeedPurpose::WorldLayout);
        RoomBounds::new(
            self.room_bounds.width + rng.gen_range(0..=self.room_size_variation),
            self.room_bounds.height + rng.gen_range(0..=self.room_size_variation),
        )
    }

    /// Build the spatial graph: world root, stacked regions, a grid of
    /// districts per region, and a chain of sectors and rooms per district
    pub fn build(&self) -> Result<WorldLayout, WorldGenError> {
        self.validate()?;

        let mut graph = SpatialNodeGraph::new();
        let mut next_id = 0u32;
        let mut alloc = || {
            let id = next_id;
            next_id += 1;
            id
        };

        let root = alloc();
        graph.add_node(NodeId::root(root))?;

        let rows = (self.districts_per_region as i32 + self.grid_columns() - 1) / self.grid_columns();
        let region_height = rows * self.district_spacing + self.district_spacing;

        let mut districts: Vec<u32> = Vec::new();
        let mut pending_rooms: Vec<(u32, u32, usize)> = Vec::new();
        let mut region_ids: Vec<u32> = Vec::new();

        for r in 0..self.regions as usize {
            let region = alloc();
            graph.add_node(NodeId::new(region, NodeLevel::Region, Some(root), Position::new(0, r as i32 * region_height)))?;
            region_ids.push(region);

            let first_in_region = districts.len();
            for d in 0..self.districts_per_region {
                let district = alloc();
                graph.add_node(NodeId::new(district, NodeLevel::District, Some(region), self.district_cell(d)))?;
                districts.push(district);

                let mut previous_room: Option<u32> = None;
                for s in 0..self.sectors_per_district {
                    let sector = alloc();
                    graph.add_node(NodeId::new(sector, NodeLevel::Sector, Some(district), Position::new(0, s as i32)))?;
                    for k in 0..self.rooms_per_sector {
                        let room = alloc();
                        graph.add_node(NodeId::new(room, NodeLevel::Room, Some(sector), Position::new(k as i32, 0)))?;
                        if let Some(prev) = previous_room {
                            graph.add_connection(Connection::bidirectional(prev, room))?;
                        }
                        previous_room = Some(room);
                        pending_rooms.push((room, district, r));
                    }
                }
            }

            // Grid neighbours to the right and above
            let cols = self.grid_columns() as usize;
            let in_region = if self.link_districts { &districts[first_in_region..] } else { &[][..] };
            for (i, &district) in in_region.iter().enumerate() {
                if (i + 1) % cols != 0 {
                    if let Some(&right) = in_region.get(i + 1) {
                        graph.add_connection(Connection::bidirectional(district, right))?;
                    }
                }
                if let Some(&up) = in_region.get(i + cols) {
                    graph.add_connection(Connection::bidirectional(district, up))?;
                }
            }

            // The way up from the region below needs that region's abilities
            if r > 0 && self.link_districts {
                let below = districts[first_in_region - self.districts_per_region as usize];
                let link = Connection::new(below, districts[first_in_region], ConnectionType::Conditional)
                    .with_requirement(self.capabilities_for(r));
                graph.add_connection(link)?;
            }
        }

        for &(a, b) in &self.extra_links {
            graph.add_connection(Connection::bidirectional(districts[a as usize], districts[b as usize]))?;
        }
        for (&ordinal, &district_type) in &self.pinned {
            graph.pin_district(districts[ordinal as usize], district_type)?;
        }

        let rooms = pending_rooms
            .into_iter()
            .map(|(room, district, region)| {
                let coordinates = graph
                    .absolute_coordinates(room)
                    .ok_or(GraphError::UnknownNode(room))?;
                Ok(RoomSlot {
                    room,
                    district,
                    region,
                    coordinates,
                    bounds: self.room_bounds_for(room),
                })
            })
            .collect::<Result<Vec<_>, GraphError>>()?;

        log::debug!(
            "built world graph: {} regions, {} districts, {} rooms, {} nodes",
            region_ids.len(),
            districts.len(),
            rooms.len(),
            graph.len()
        );

        Ok(WorldLayout { graph, districts, rooms })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_counts() {
        let blueprint = WorldBlueprint::default();
        let layout = blueprint.build().unwrap();
        assert_eq!(layout.districts.len() as u32, blueprint.district_count());
        assert_eq!(layout.rooms.len() as u32, blueprint.room_count());
        // root + regions + districts + sectors + rooms
        let expected = 1 + 2 + 12 + 24 + 72;
        assert_eq!(layout.graph.len(), expected);
        assert_eq!(layout.graph.node(layout.districts[0]).unwrap().district_type, Some(DistrictType::Hub));
    }

    #[test]
    fn test_rooms_belong_to_their_district() {
        let layout = WorldBlueprint::default().build().unwrap();
        for slot in &layout.rooms {
            assert_eq!(layout.graph.district_of(slot.room), Some(slot.district));
            assert_eq!(layout.graph.absolute_coordinates(slot.room), Some(slot.coordinates));
        }
    }

    #[test]
    fn test_regions_stack_upwards() {
        let layout = WorldBlueprint::default().build().unwrap();
        let low = layout.rooms.iter().filter(|s| s.region == 0).map(|s| s.coordinates.y).max().unwrap();
        let high = layout.rooms.iter().filter(|s| s.region == 1).map(|s| s.coordinates.y).min().unwrap();
        assert!(high > low);
    }

    #[test]
    fn test_room_sizes_are_seeded() {
        let blueprint = WorldBlueprint::default();
        let a = blueprint.build().unwrap();
        let b = blueprint.build().unwrap();
        assert_eq!(a.rooms, b.rooms);
        for slot in &a.rooms {
            assert!(slot.bounds.fits(40, 28));
            assert!(RoomBounds::new(48, 36).fits(slot.bounds.width, slot.bounds.height));
        }
    }

    #[test]
    fn test_capabilities_accumulate() {
        let blueprint = WorldBlueprint::default();
        assert_eq!(blueprint.capabilities_for(0), Capabilities::NONE);
        assert_eq!(blueprint.capabilities_for(1), Capabilities::DOUBLE_JUMP);
        let top = blueprint.capabilities_for(5);
        assert!(top.contains(Capabilities::DOUBLE_JUMP | Capabilities::DASH | Capabilities::WALL_JUMP));
    }

    #[test]
    fn test_invalid_blueprints() {
        let empty = WorldBlueprint { regions: 0, ..WorldBlueprint::default() };
        assert!(matches!(empty.build(), Err(WorldGenError::InvalidBlueprint(_))));
        let mut bad_pin = WorldBlueprint::default();
        bad_pin.pinned.insert(99, DistrictType::Exotic);
        assert!(matches!(bad_pin.build(), Err(WorldGenError::InvalidBlueprint(_))));
        let bad_link = WorldBlueprint { extra_links: vec![(0, 0)], ..WorldBlueprint::default() };
        assert!(matches!(bad_link.build(), Err(WorldGenError::Graph(GraphError::SelfConnection(_)))));
    }
}
