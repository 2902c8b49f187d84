//! Platform cloud generator
//!
//! Sky rooms built from stacked layers of floating islands. Altitude
//! complexity drives how many islands a layer holds, how small they get and
//! how many of them move. Every layer is anchored on the layer below.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{reachable_span, GeneratorContext, GeneratorOutput, RoomBounds};
use crate::error::GeneratorError;
use crate::graph::Position;
use crate::physics::MovementProfile;
use crate::room::{Biome, BiomeType, FeatureList, FeatureType, PlacedFeature, Polarity};

/// How moving cloud platforms behave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloudMotion {
    /// Slow bobbing
    Gentle,
    /// Sudden sideways shoves
    Gusty,
    /// Steady drift in one direction
    Conveyor,
    /// Periodically charged and unsafe to stand on
    Electric,
}

impl CloudMotion {
    /// Motion pattern for a biome. Polarity wins over biome type.
    pub fn for_biome(biome: &Biome) -> CloudMotion {
        match biome.primary_polarity {
            Polarity::Wind => CloudMotion::Gusty,
            Polarity::Tech => CloudMotion::Conveyor,
            Polarity::Heat | Polarity::Moon if biome.polarity_strength >= 0.5 => CloudMotion::Electric,
            _ => match biome.biome_type {
                BiomeType::Volcanic | BiomeType::Crystal => CloudMotion::Electric,
                BiomeType::Ruins => CloudMotion::Conveyor,
                BiomeType::Sky => CloudMotion::Gusty,
                _ => CloudMotion::Gentle,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Layer spacing as a share of vertical reach
    pub layer_spacing: f32,
    /// Islands per layer at altitude complexity 1.0
    pub base_platforms: f32,
    pub max_platforms: u32,
    pub min_island: i32,
    pub max_island: i32,
    /// Share of islands that move, per unit of altitude complexity
    pub moving_share: f32,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            layer_spacing: 0.75,
            base_platforms: 3.0,
            max_platforms: 8,
            min_island: 2,
            max_island: 6,
            moving_share: 0.15,
        }
    }
}

impl CloudConfig {
    pub fn min_bounds(&self) -> RoomBounds {
        RoomBounds::new(self.max_island * 2, 8)
    }

    pub fn platforms_per_layer(&self, altitude: f32) -> u32 {
        ((self.base_platforms * altitude).round().max(1.0) as u32).clamp(1, self.max_platforms.max(1))
    }

    /// Islands shrink as altitude complexity grows
    pub fn island_width(&self, altitude: f32) -> i32 {
        let min = self.min_island.max(1);
        ((self.max_island as f32 / altitude.max(0.1)).round() as i32).clamp(min, self.max_island.max(min))
    }
}

pub struct PlatformCloudGenerator<'a> {
    config: &'a CloudConfig,
}

impl<'a> PlatformCloudGenerator<'a> {
    pub fn new(config: &'a CloudConfig) -> Self {
        Self { config }
    }

    pub fn generate(&self, ctx: &GeneratorContext<'_>) -> Result<GeneratorOutput, GeneratorError> {
        // Islands float free, there is no wall to kick off
        let airborne = MovementProfile { has_wall_jump: false, ..*ctx.movement };
        let ctx = &GeneratorContext { movement: &airborne, ..*ctx };
        let reach = ctx.vertical_reach()?;
        let mut rng = ctx.rng();
        let bounds = ctx.bounds;
        let altitude = ctx.complexity.altitude;
        let motion = CloudMotion::for_biome(&ctx.biome);

        let spacing = ((reach as f32 * self.config.layer_spacing).round() as i32).clamp(1, reach);
        let per_layer = self.config.platforms_per_layer(altitude);
        let island = self.config.island_width(altitude).min(bounds.width);
        let moving_share = (self.config.moving_share * altitude).clamp(0.0, 0.6) as f64;

        let mut features = FeatureList::new();

        // Entry island at the bottom centre
        let entry_x = (bounds.width - island) / 2;
        let entry = features.push(FeatureType::CloudPlatform, Position::new(entry_x, 0), island);
        let mut below: Vec<PlacedFeature> = vec![features.as_slice()[entry as usize]];

        let mut layer_index = 0usize;
        let mut y = spacing;
        while y < bounds.height - 1 {
            layer_index += 1;
            let mut layer: Vec<PlacedFeature> = Vec::new();
            let count = rng.gen_range(1..=per_layer);
            for n in 0..count {
                // The first island hangs off the layer below; the rest may
                // also hang off islands already in this layer
                let (anchor, dy) = if n == 0 || layer.is_empty() {
                    (pick(&below, &mut rng), spacing)
                } else if rng.gen_bool(0.5) {
                    (pick(&layer, &mut rng), 0)
                } else {
                    (pick(&below, &mut rng), spacing)
                };
                let Some(anchor) = anchor else { continue };
                let (lo, hi) = reachable_span(&anchor, island, ctx.horizontal_reach(dy), bounds.width);
                let x = rng.gen_range(lo..=hi);
                let kind = if rng.gen_bool(moving_share) {
                    FeatureType::MovingPlatform
                } else {
                    FeatureType::CloudPlatform
                };
                let id = features.push(kind, Position::new(x, anchor.position.y + dy), island);
                layer.push(features.as_slice()[id as usize]);
            }

            let connected = layer.iter().any(|p| {
                below.iter().any(|b| {
                    let (from, to) = b.nearest_points(p);
                    ctx.validator.is_reachable(from, to, ctx.movement)
                })
            });
            if !connected {
                return Err(GeneratorError::DisconnectedLayer(layer_index));
            }

            // Electric clouds carry a hazard on one island per layer
            if motion == CloudMotion::Electric {
                if let Some(p) = layer.last() {
                    features.push(FeatureType::Hazard, Position::new(p.center().x, p.position.y + 1), 1);
                }
            }

            below = layer;
            y += spacing;
        }

        if let Some(top) = below.first() {
            features.push(FeatureType::Pickup, Position::new(top.center().x, top.position.y + 1), 1);
        }

        log::trace!(
            "cloud room {}: {} layers, {:?} motion, {} per layer",
            ctx.room_id,
            layer_index,
            motion,
            per_layer
        );

        Ok(GeneratorOutput {
            features: features.into_vec(),
            beats: Vec::new(),
            cloud_motion: Some(motion),
        })
    }
}

fn pick<R: Rng>(from: &[PlacedFeature], rng: &mut R) -> Option<PlacedFeature> {
    from.choose(rng).copied()
}
