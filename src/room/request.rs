//! Room generation requests

use serde::{Deserialize, Serialize};

use super::biome::{BiomeType, Polarity};
use crate::error::RoomFailure;
use crate::generation::GeneratorType;
use crate::graph::{Capabilities, Position};
use crate::solver::DistrictType;

/// Overall shape of a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutType {
    Vertical,
    Horizontal,
    Mixed,
    Sky,
}

impl LayoutType {
    /// Generator that fills rooms of this layout
    pub fn generator(self) -> GeneratorType {
        match self {
            LayoutType::Vertical => GeneratorType::StackedSegment,
            LayoutType::Horizontal => GeneratorType::LinearCorridor,
            LayoutType::Mixed => GeneratorType::HeightmapTerrain,
            LayoutType::Sky => GeneratorType::PlatformCloud,
        }
    }
}

/// Per-room state carried through the six pipeline steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomGenerationRequest {
    pub room_id: u32,
    /// Absolute world coordinates of the room
    pub coordinates: Position,
    /// Collapsed type of the owning district
    pub district_type: DistrictType,
    pub neighbor_districts: Vec<DistrictType>,
    /// Set at step 3
    pub generator_type: Option<GeneratorType>,
    /// World seed the room streams derive from
    pub seed: u64,
    /// Step about to run, 1 through 6
    pub current_step: u8,
    pub is_complete: bool,
    /// Set at step 2 unless already given
    pub layout_type: Option<LayoutType>,
    pub target_biome: Option<BiomeType>,
    pub target_polarity: Option<Polarity>,
    /// Abilities the player is expected to have here
    pub available_capabilities: Capabilities,
    /// Why the room stopped, if it did
    pub failure: Option<RoomFailure>,
}

impl RoomGenerationRequest {
    pub fn new(room_id: u32, coordinates: Position, district_type: DistrictType, seed: u64) -> Self {
        Self {
            room_id,
            coordinates,
            district_type,
            neighbor_districts: Vec::new(),
            generator_type: None,
            seed,
            current_step: 1,
            is_complete: false,
            layout_type: None,
            target_biome: None,
            target_polarity: None,
            available_capabilities: Capabilities::NONE,
            failure: None,
        }
    }

    pub fn with_neighbors(mut self, neighbors: Vec<DistrictType>) -> Self {
        self.neighbor_districts = neighbors;
        self
    }

    pub fn with_target_biome(mut self, biome: BiomeType) -> Self {
        self.target_biome = Some(biome);
        self
    }

    pub fn with_target_polarity(mut self, polarity: Polarity) -> Self {
        self.target_polarity = Some(polarity);
        self
    }

    pub fn with_layout(mut self, layout: LayoutType) -> Self {
        self.layout_type = Some(layout);
        self
    }

    pub fn with_capabilities(mut self, caps: Capabilities) -> Self {
        self.available_capabilities = caps;
        self
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_generator_mapping() {
        assert_eq!(LayoutType::Vertical.generator(), GeneratorType::StackedSegment);
        assert_eq!(LayoutType::Horizontal.generator(), GeneratorType::LinearCorridor);
        assert_eq!(LayoutType::Mixed.generator(), GeneratorType::HeightmapTerrain);
        assert_eq!(LayoutType::Sky.generator(), GeneratorType::PlatformCloud);
    }

    #[test]
    fn test_new_request_starts_at_step_one() {
        let r = RoomGenerationRequest::new(3, Position::new(1, 2), DistrictType::Hub, 42);
        assert_eq!(r.current_step, 1);
        assert!(!r.is_complete);
        assert!(!r.is_failed());
        assert_eq!(r.generator_type, None);
    }
}
