//! Six-step room pipeline
//!
//! Biome selection, layout classification, generator choice, content pass,
//! biome overrides and navigation hints, strictly in that order. Any step can
//! fail the room; failures are recorded on the request and never retried
//! here.

use serde::{Deserialize, Serialize};

use super::biome::{Biome, BiomeTable, BiomeType, Polarity};
use super::feature::{FeatureType, PlacedFeature};
use super::navigation::{navigation_hints, validate_reachability, NavigationHint};
use super::request::{LayoutType, RoomGenerationRequest};
use crate::complexity::ComplexityProfile;
use crate::config::GenerationConfig;
use crate::error::{RoomFailure, ValidationFailure};
use crate::generation::{self, Beat, CloudMotion, GeneratorContext, GeneratorSettings, GeneratorType, RoomBounds};
use crate::physics::{MovementProfile, ReachabilityValidator};
use crate::seeds::{derive_salted, unit_f32, SeedPurpose};
use crate::solver::{weighted_pick, DistrictType};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rooms at or above this absolute height are sky rooms
    pub sky_altitude: i32,
    /// Weight of neighbouring districts against the room's own district
    pub neighbor_influence: f32,
    /// Spread of the hashed tie-breaker in biome scoring
    pub biome_jitter: f32,
    /// Run the reachability post-pass after the content step
    pub validate_reachability: bool,
    /// Derive navigation hints in the last step
    pub navigation_hints: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sky_altitude: 20,
            neighbor_influence: 0.5,
            biome_jitter: 0.4,
            validate_reachability: true,
            navigation_hints: true,
        }
    }
}

/// A generated room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomLayout {
    pub room_id: u32,
    pub bounds: RoomBounds,
    pub biome: Biome,
    pub layout_type: LayoutType,
    pub generator_type: GeneratorType,
    /// Ordered as placed
    pub features: Vec<PlacedFeature>,
    pub beats: Vec<Beat>,
    pub cloud_motion: Option<CloudMotion>,
    pub navigation: Vec<NavigationHint>,
    /// Unreachable pairs found after generation. Reported, not repaired.
    pub validation_failures: Vec<ValidationFailure>,
}

/// How well a biome suits a district type, before neighbour influence
fn district_affinity(district: DistrictType, biome: BiomeType) -> f32 {
    use BiomeType::*;
    match (district, biome) {
        (_, Sky) => 0.0,
        (DistrictType::Hub, Verdant) => 1.0,
        (DistrictType::Hub, Ruins) => 0.6,
        (DistrictType::Hub, Frozen) => 0.3,
        (DistrictType::Hub, Crystal) => 0.2,
        (DistrictType::Hub, Volcanic) => 0.1,
        (DistrictType::Settlement, Verdant) => 0.8,
        (DistrictType::Settlement, Frozen) => 0.6,
        (DistrictType::Settlement, Ruins) => 0.5,
        (DistrictType::Settlement, Crystal) => 0.3,
        (DistrictType::Settlement, Volcanic) => 0.2,
        (DistrictType::Frontier, Frozen) => 0.7,
        (DistrictType::Frontier, Volcanic) => 0.6,
        (DistrictType::Frontier, Ruins) => 0.6,
        (DistrictType::Frontier, Crystal) => 0.4,
        (DistrictType::Frontier, Verdant) => 0.3,
        (DistrictType::Exotic, Crystal) => 1.0,
        (DistrictType::Exotic, Volcanic) => 0.8,
        (DistrictType::Exotic, Frozen) => 0.4,
        (DistrictType::Exotic, Ruins) => 0.3,
        (DistrictType::Exotic, Verdant) => 0.1,
    }
}

/// Relative odds of Vertical, Horizontal and Mixed layouts per biome
fn layout_weights(biome: BiomeType) -> [f32; 3] {
    match biome {
        BiomeType::Verdant => [1.0, 1.0, 2.0],
        BiomeType::Frozen => [1.0, 2.0, 1.0],
        BiomeType::Volcanic => [2.0, 1.0, 1.0],
        BiomeType::Crystal => [2.0, 1.0, 1.0],
        BiomeType::Ruins => [1.0, 2.0, 1.0],
        BiomeType::Sky => [0.0, 0.0, 1.0],
    }
}

/// Fallback reclassification by primary polarity when the biome table has
/// nothing for a feature
fn polarity_override(polarity: Polarity, feature: FeatureType) -> Option<FeatureType> {
    match (polarity, feature) {
        (Polarity::Heat, FeatureType::Hazard) => Some(FeatureType::LavaVent),
        (Polarity::Cold, FeatureType::Hazard) => Some(FeatureType::Spikes),
        (Polarity::Moon, FeatureType::Obstacle) => Some(FeatureType::CrystalShard),
        (Polarity::Earth, FeatureType::Obstacle) => Some(FeatureType::Thorns),
        _ => None,
    }
}

/// Runs requests through the six steps
pub struct RoomPipeline<'a> {
    config: &'a PipelineConfig,
    generators: &'a GeneratorSettings,
    biomes: &'a BiomeTable,
    validator: ReachabilityValidator,
}

impl<'a> RoomPipeline<'a> {
    pub fn new(config: &'a GenerationConfig) -> Self {
        Self {
            config: &config.pipeline,
            generators: &config.generators,
            biomes: &config.biomes,
            validator: ReachabilityValidator::new(config.physics.clone()),
        }
    }

    pub fn validator(&self) -> &ReachabilityValidator {
        &self.validator
    }

    /// Generate one room. `biome`, when given, pins the biome outright;
    /// otherwise the request's target biome or the selection rules decide.
    /// `seed` is the world seed every room stream derives from.
    ///
    /// The request must be fresh (step 1, not complete). On return it is
    /// either complete or carries the failure.
    pub fn generate_room(
        &self,
        request: &mut RoomGenerationRequest,
        bounds: RoomBounds,
        biome: Option<Biome>,
        movement: &MovementProfile,
        seed: u64,
    ) -> Result<RoomLayout, RoomFailure> {
        match self.run_steps(request, bounds, biome, movement, seed) {
            Ok(layout) => {
                request.is_complete = true;
                log::debug!(
                    "room {}: {:?}/{:?} with {} features",
                    request.room_id,
                    layout.biome.biome_type,
                    layout.layout_type,
                    layout.features.len()
                );
                Ok(layout)
            }
            Err(failure) => {
                log::warn!("{}", failure);
                request.failure = Some(failure.clone());
                Err(failure)
            }
        }
    }

    fn run_steps(
        &self,
        request: &mut RoomGenerationRequest,
        bounds: RoomBounds,
        pinned_biome: Option<Biome>,
        movement: &MovementProfile,
        seed: u64,
    ) -> Result<RoomLayout, RoomFailure> {
        let room = request.room_id;
        if request.is_complete || request.current_step != 1 || request.failure.is_some() {
            return Err(RoomFailure::InvalidRequest {
                room,
                reason: format!("request already processed up to step {}", request.current_step),
            });
        }
        if bounds.width <= 0 || bounds.height <= 0 {
            return Err(RoomFailure::InvalidRequest {
                room,
                reason: format!("bounds {}x{} are empty", bounds.width, bounds.height),
            });
        }
        request.seed = seed;

        // 1. Biome
        let biome = self.select_biome(request, pinned_biome);
        request.target_biome = Some(biome.biome_type);

        // 2. Layout
        request.current_step = 2;
        let layout_type = match request.layout_type {
            Some(layout) => layout,
            None => self.classify_layout(room, seed, biome.biome_type),
        };
        request.layout_type = Some(layout_type);

        // 3. Generator
        request.current_step = 3;
        let generator_type = layout_type.generator();
        request.generator_type = Some(generator_type);

        // 4. Content
        request.current_step = 4;
        let min = self.generators.min_bounds(generator_type);
        if !bounds.fits(min.width, min.height) {
            return Err(RoomFailure::InsufficientSpace {
                room,
                step: 4,
                width: bounds.width,
                height: bounds.height,
                min_width: min.width,
                min_height: min.height,
            });
        }
        let movement = movement.with_capabilities(request.available_capabilities);
        let profile = self.biomes.profile(biome.biome_type);
        let ctx = GeneratorContext {
            room_id: room,
            seed,
            bounds,
            biome,
            profile: profile.as_ref(),
            movement: &movement,
            validator: &self.validator,
            complexity: ComplexityProfile::at(request.coordinates),
        };
        let output = generation::generate(generator_type, self.generators, &ctx).map_err(|source| {
            RoomFailure::GeneratorContradiction {
                room,
                generator: generator_type,
                source,
            }
        })?;
        let mut features = output.features;
        let validation_failures = if self.config.validate_reachability {
            validate_reachability(room, &features, &movement, &self.validator)
        } else {
            Vec::new()
        };
        if !validation_failures.is_empty() {
            log::warn!("room {}: {} unreachable feature(s)", room, validation_failures.len());
        }

        // 5. Biome overrides
        request.current_step = 5;
        self.apply_overrides(room, seed, &biome, &mut features);

        // 6. Navigation
        request.current_step = 6;
        let navigation = if self.config.navigation_hints {
            navigation_hints(&features, &movement, &self.validator)
        } else {
            Vec::new()
        };

        Ok(RoomLayout {
            room_id: room,
            bounds,
            biome,
            layout_type,
            generator_type,
            features,
            beats: output.beats,
            cloud_motion: output.cloud_motion,
            navigation,
            validation_failures,
        })
    }

    /// Step 1. Explicit biome, then the request's target, then sky by
    /// altitude, then district and neighbour scoring.
    fn select_biome(&self, request: &RoomGenerationRequest, pinned: Option<Biome>) -> Biome {
        let biome = if let Some(biome) = pinned {
            biome
        } else if let Some(target) = request.target_biome {
            self.biomes.biome(target)
        } else if request.coordinates.y >= self.config.sky_altitude {
            self.biomes.biome(BiomeType::Sky)
        } else {
            let chosen = self.score_biomes(request);
            self.biomes.biome(chosen)
        };
        match request.target_polarity {
            Some(polarity) => biome.with_polarity(polarity),
            None => biome,
        }
    }

    fn score_biomes(&self, request: &RoomGenerationRequest) -> BiomeType {
        let neighbors = &request.neighbor_districts;
        let mut best = (BiomeType::Verdant, f32::MIN);
        for biome in BiomeType::ALL.into_iter().filter(|b| *b != BiomeType::Sky) {
            let own = district_affinity(request.district_type, biome);
            let influence = if neighbors.is_empty() {
                0.0
            } else {
                neighbors.iter().map(|n| district_affinity(*n, biome)).sum::<f32>() / neighbors.len() as f32
            };
            let hash = derive_salted(request.seed, request.room_id as u64, SeedPurpose::Biome, biome.tag());
            let score = own + self.config.neighbor_influence * influence + unit_f32(hash) * self.config.biome_jitter;
            if score > best.1 {
                best = (biome, score);
            }
        }
        best.0
    }

    /// Step 2. A hashed draw over per-biome layout odds.
    fn classify_layout(&self, room: u32, seed: u64, biome: BiomeType) -> LayoutType {
        if biome == BiomeType::Sky {
            return LayoutType::Sky;
        }
        let weights = layout_weights(biome);
        let total: f32 = weights.iter().sum();
        let draw = unit_f32(derive_salted(seed, room as u64, SeedPurpose::Layout, biome.tag())) * total;
        match weighted_pick(&weights, draw) {
            Some(0) => LayoutType::Vertical,
            Some(1) => LayoutType::Horizontal,
            _ => LayoutType::Mixed,
        }
    }

    /// Step 5. Reclassify in place with probability `polarity_strength`;
    /// positions and ids are untouched.
    fn apply_overrides(&self, room: u32, seed: u64, biome: &Biome, features: &mut [PlacedFeature]) {
        let profile = self.biomes.profile(biome.biome_type);
        let mut changed = 0;
        for feature in features.iter_mut() {
            let replacement = profile
                .override_for(feature.feature_type)
                .or_else(|| polarity_override(biome.primary_polarity, feature.feature_type));
            let Some(to) = replacement else { continue };
            // Never turn a standing surface into a hazard or the reverse
            if to.is_walkable() != feature.feature_type.is_walkable() {
                continue;
            }
            let roll = unit_f32(derive_salted(seed, room as u64, SeedPurpose::Override, feature.id as u64));
            if roll < biome.polarity_strength {
                feature.feature_type = to;
                changed += 1;
            }
        }
        log::trace!("room {}: {} feature(s) overridden", room, changed);
    }
}
