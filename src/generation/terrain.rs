//! Heightmap terrain generator
//!
//! Open rooms with rolling ground. A Perlin profile shaped by the biome
//! (smooth ice, jagged lava) sets the ground height per column; column
//! steps are limited to what the player can climb. Features cluster where a
//! seeded sine wave peaks.

use std::f32::consts::TAU;

use noise::{NoiseFn, Perlin, Seedable};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{GeneratorContext, GeneratorOutput, RoomBounds};
use crate::error::GeneratorError;
use crate::graph::Position;
use crate::room::{FeatureList, FeatureType};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    /// Resting ground level as a share of room height
    pub base_level: f32,
    /// Peak placement chance where the sine term is at its crest
    pub feature_chance: f32,
    /// Tiles between clustering peaks
    pub cluster_wavelength: f32,
    /// Columns at each end kept clear for entrances
    pub clear_margin: i32,
    /// Rows kept free above the highest ground
    pub headroom: i32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            octaves: 3,
            persistence: 0.5,
            lacunarity: 2.0,
            base_level: 0.25,
            feature_chance: 0.35,
            cluster_wavelength: 12.0,
            clear_margin: 2,
            headroom: 4,
        }
    }
}

impl TerrainConfig {
    pub fn min_bounds(&self) -> RoomBounds {
        RoomBounds::new(self.clear_margin * 2 + 8, self.headroom + 4)
    }
}

/// Fractal sum of Perlin octaves, roughly within `[-1, 1]`
fn fbm(noise: &Perlin, x: f64, scale: f64, config: &TerrainConfig) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = scale;
    let mut norm = 0.0;
    for _ in 0..config.octaves.max(1) {
        total += noise.get([x * frequency, 0.5]) * amplitude;
        norm += amplitude;
        amplitude *= config.persistence;
        frequency *= config.lacunarity;
    }
    total / norm
}

/// Placement chance at column `x`: the base chance modulated by a sine wave
/// whose phase comes from the room seed
pub fn clustered_chance(x: i32, phase: f32, base: f32, wavelength: f32) -> f32 {
    let wave = (x as f32 * TAU / wavelength.max(1.0) + phase).sin();
    (base * (0.5 + 0.5 * wave)).clamp(0.0, 1.0)
}

pub struct HeightmapTerrainGenerator<'a> {
    config: &'a TerrainConfig,
}

impl<'a> HeightmapTerrainGenerator<'a> {
    pub fn new(config: &'a TerrainConfig) -> Self {
        Self { config }
    }

    /// Ground height per column, clamped to the room and with no step taller
    /// than `max_step`
    pub fn heightmap(&self, ctx: &GeneratorContext<'_>, noise_seed: u32, max_step: i32) -> Vec<i32> {
        let noise = Perlin::new(1).set_seed(noise_seed);
        let bounds = ctx.bounds;
        let max_ground = (bounds.height - self.config.headroom).max(0);
        let base = bounds.height as f32 * self.config.base_level;
        let amplitude = ctx.profile.height_variation * ctx.difficulty().max(0.5);

        let mut heights: Vec<i32> = Vec::with_capacity(bounds.width as usize);
        for x in 0..bounds.width {
            let n = fbm(&noise, x as f64, ctx.profile.noise_scale, self.config) as f32;
            let mut h = (base + n * amplitude).round() as i32;
            h = h.clamp(0, max_ground);
            if let Some(&prev) = heights.last() {
                h = h.clamp(prev - max_step, prev + max_step);
            }
            heights.push(h);
        }
        heights
    }

    pub fn generate(&self, ctx: &GeneratorContext<'_>) -> Result<GeneratorOutput, GeneratorError> {
        let reach = ctx.vertical_reach()?;
        // Tallest step that can still be taken from the adjacent column
        let max_step = (0..=reach).rev().find(|&dy| ctx.horizontal_reach(dy) >= 1);
        let Some(max_step) = max_step else {
            return Err(GeneratorError::NoHorizontalReach);
        };

        let mut rng = ctx.rng();
        let heights = self.heightmap(ctx, rng.gen::<u32>(), max_step);
        let phase = rng.gen_range(0.0..TAU);

        let mut features = FeatureList::new();

        // Runs of equal height become one ground segment
        let mut start = 0usize;
        for x in 1..=heights.len() {
            if x == heights.len() || heights[x] != heights[start] {
                features.push(
                    FeatureType::Ground,
                    Position::new(start as i32, heights[start]),
                    (x - start) as i32,
                );
                start = x;
            }
        }

        let width = ctx.bounds.width;
        let margin = self.config.clear_margin;
        let chance = self.config.feature_chance * ctx.difficulty().clamp(0.5, 2.0);
        let mut last_feature: Option<i32> = None;
        for x in margin..(width - margin) {
            let p = clustered_chance(x, phase, chance, self.config.cluster_wavelength);
            if rng.gen::<f32>() >= p {
                continue;
            }
            if last_feature.map_or(false, |l| x - l < 2) {
                continue;
            }
            let mut kind = match rng.gen_range(0..4) {
                0 | 1 => ctx.profile.feature_type,
                2 => FeatureType::Hazard,
                _ => FeatureType::Pickup,
            };
            // A challenge must be jumpable from the column before it
            if kind.is_challenge() && !crossable(ctx, &heights, x) {
                kind = FeatureType::Pickup;
            }
            features.push(kind, Position::new(x, heights[x as usize] + 1), 1);
            last_feature = Some(x);
        }

        log::trace!(
            "terrain room {}: {} columns, max step {}, {} features",
            ctx.room_id,
            width,
            max_step,
            features.len()
        );

        Ok(GeneratorOutput {
            features: features.into_vec(),
            ..GeneratorOutput::default()
        })
    }
}

/// Whether the player can jump over column `x` between the ground tops on
/// either side of it
fn crossable(ctx: &GeneratorContext<'_>, heights: &[i32], x: i32) -> bool {
    if x < 1 {
        return false;
    }
    let (Some(&left), Some(&right)) = (heights.get(x as usize - 1), heights.get(x as usize + 1)) else {
        return false;
    };
    ctx.validator
        .is_reachable(Position::new(x - 1, left), Position::new(x + 1, right), ctx.movement)
}
