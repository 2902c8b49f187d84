//! Room content generators
//!
//! Four layout algorithms share one contract: bounds, biome, movement profile
//! and complexity in, an ordered feature list out. All randomness comes from
//! the room's own RNG stream so a room regenerates bit for bit.

pub mod stacked;
pub mod corridor;
pub mod terrain;
pub mod cloud;

pub use stacked::{StackedConfig, StackedSegmentGenerator};
pub use corridor::{beat_probabilities, Beat, BeatKind, BeatProbabilities, CorridorConfig, LinearCorridorGenerator};
pub use terrain::{HeightmapTerrainGenerator, TerrainConfig};
pub use cloud::{CloudConfig, CloudMotion, PlatformCloudGenerator};

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::complexity::ComplexityProfile;
use crate::error::GeneratorError;
use crate::physics::{MovementProfile, ReachabilityValidator};
use crate::room::{Biome, BiomeProfile, PlacedFeature};
use crate::seeds::{stream, SeedPurpose};

/// Which algorithm fills a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneratorType {
    /// Vertical shafts
    StackedSegment,
    /// Rhythm-paced horizontal runs
    LinearCorridor,
    /// Noise-driven open terrain
    HeightmapTerrain,
    /// Layered floating platforms
    PlatformCloud,
}

/// Room size in tiles. Origin is bottom-left, y grows upwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomBounds {
    pub width: i32,
    pub height: i32,
}

impl RoomBounds {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn fits(&self, width: i32, height: i32) -> bool {
        self.width >= width && self.height >= height
    }
}

/// Everything a generator reads
#[derive(Debug, Clone, Copy)]
pub struct GeneratorContext<'a> {
    pub room_id: u32,
    /// World seed; the room stream is derived from it
    pub seed: u64,
    pub bounds: RoomBounds,
    pub biome: Biome,
    pub profile: &'a BiomeProfile,
    pub movement: &'a MovementProfile,
    pub validator: &'a ReachabilityValidator,
    pub complexity: ComplexityProfile,
}

impl<'a> GeneratorContext<'a> {
    /// Fresh per-room RNG. Every call returns the same stream.
    pub fn rng(&self) -> ChaCha8Rng {
        stream(self.seed, self.room_id as u64, SeedPurpose::Room)
    }

    /// Distance complexity scaled by the biome
    pub fn difficulty(&self) -> f32 {
        self.complexity.distance * self.biome.difficulty_modifier
    }

    /// Whole tiles the profile can climb. Generators cannot work below one.
    pub fn vertical_reach(&self) -> Result<i32, GeneratorError> {
        let reach = self.validator.vertical_reach_tiles(self.movement);
        if reach < 1 {
            return Err(GeneratorError::NoVerticalReach);
        }
        Ok(reach)
    }

    /// Whole tiles the profile can cross when landing `dy` tiles higher
    pub fn horizontal_reach(&self, dy: i32) -> i32 {
        self.validator.horizontal_reach(self.movement, dy as f32).floor().max(0.0) as i32
    }
}

/// What a generator produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorOutput {
    pub features: Vec<PlacedFeature>,
    /// Corridor pacing, empty for other generators
    pub beats: Vec<Beat>,
    /// Sky room motion pattern
    pub cloud_motion: Option<CloudMotion>,
}

/// Per-generator tuning
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub stacked: StackedConfig,
    pub corridor: CorridorConfig,
    pub terrain: TerrainConfig,
    pub cloud: CloudConfig,
}

impl GeneratorSettings {
    /// Smallest room the generator can work in
    pub fn min_bounds(&self, generator: GeneratorType) -> RoomBounds {
        match generator {
            GeneratorType::StackedSegment => self.stacked.min_bounds(),
            GeneratorType::LinearCorridor => self.corridor.min_bounds(),
            GeneratorType::HeightmapTerrain => self.terrain.min_bounds(),
            GeneratorType::PlatformCloud => self.cloud.min_bounds(),
        }
    }
}

/// Run the generator of the given type
pub fn generate(
    generator: GeneratorType,
    settings: &GeneratorSettings,
    ctx: &GeneratorContext<'_>,
) -> Result<GeneratorOutput, GeneratorError> {
    let output = match generator {
        GeneratorType::StackedSegment => StackedSegmentGenerator::new(&settings.stacked).generate(ctx)?,
        GeneratorType::LinearCorridor => LinearCorridorGenerator::new(&settings.corridor).generate(ctx)?,
        GeneratorType::HeightmapTerrain => HeightmapTerrainGenerator::new(&settings.terrain).generate(ctx)?,
        GeneratorType::PlatformCloud => PlatformCloudGenerator::new(&settings.cloud).generate(ctx)?,
    };

    if output.features.is_empty() {
        return Err(GeneratorError::Empty);
    }
    log::debug!(
        "room {}: {:?} placed {} features",
        ctx.room_id,
        generator,
        output.features.len()
    );
    Ok(output)
}

/// Leftmost x for a platform of width `w` so that its nearest edge is within
/// `reach` tiles of `anchor`, clamped to the room. Returns the inclusive
/// range of valid left edges.
pub(crate) fn reachable_span(anchor: &PlacedFeature, w: i32, reach: i32, room_width: i32) -> (i32, i32) {
    let lo = (anchor.position.x - reach - w + 1).max(0);
    let hi = (anchor.right() + reach).min(room_width - w).max(lo);
    (lo, hi)
}


#[cfg(test)]
mod tests {
    use super::test_support::Fixture;
    use super::*;
    use crate::room::{FeatureType, BiomeType};
    use crate::graph::Position;

    #[test]
    fn test_reachable_span_stays_in_room() {
        let anchor = PlacedFeature::new(0, FeatureType::Platform, Position::new(18, 0), 2);
        let (lo, hi) = reachable_span(&anchor, 3, 4, 20);
        assert_eq!(hi, 17);
        assert_eq!(lo, 12);
        let anchor = PlacedFeature::new(0, FeatureType::Platform, Position::new(0, 0), 2);
        assert_eq!(reachable_span(&anchor, 3, 4, 20), (0, 5));
    }

    #[test]
    fn test_every_generator_is_deterministic() {
        let fixture = Fixture::new(BiomeType::Ruins);
        let settings = GeneratorSettings::default();
        let ctx = fixture.context(3, 99, RoomBounds::new(48, 30), ComplexityProfile::neutral());
        for generator in [
            GeneratorType::StackedSegment,
            GeneratorType::LinearCorridor,
            GeneratorType::HeightmapTerrain,
            GeneratorType::PlatformCloud,
        ] {
            let a = generate(generator, &settings, &ctx).unwrap();
            let b = generate(generator, &settings, &ctx).unwrap();
            assert_eq!(a, b, "{generator:?}");
            assert!(!a.features.is_empty());
        }
    }

    #[test]
    fn test_zero_jump_profile_is_rejected() {
        let mut fixture = Fixture::new(BiomeType::Verdant);
        fixture.movement = fixture.movement.with_jump_height(0.5);
        let ctx = fixture.context(1, 1, RoomBounds::new(20, 30), ComplexityProfile::neutral());
        assert_eq!(ctx.vertical_reach(), Err(GeneratorError::NoVerticalReach));
        let err = generate(GeneratorType::StackedSegment, &GeneratorSettings::default(), &ctx).unwrap_err();
        assert_eq!(err, GeneratorError::NoVerticalReach);
    }
}
