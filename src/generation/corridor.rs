//! Linear corridor generator
//!
//! Horizontal rooms paced in fixed-size beats. Each beat is a challenge, a
//! rest or a secret; the first and last fifth of the corridor lean towards
//! rest so the room eases in and out.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{GeneratorContext, GeneratorOutput, RoomBounds};
use crate::error::GeneratorError;
use crate::graph::Position;
use crate::room::{FeatureList, FeatureType};
use crate::solver::weighted_pick;

/// Pacing role of a beat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeatKind {
    Challenge,
    Rest,
    Secret,
}

/// One fixed-size slice of a corridor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beat {
    pub index: usize,
    pub kind: BeatKind,
    pub start_x: i32,
    pub length: i32,
}

/// Classification weights for one beat, normalized to sum to 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeatProbabilities {
    pub challenge: f32,
    pub rest: f32,
    pub secret: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorridorConfig {
    /// Tiles per beat
    pub beat_length: i32,
    /// Base challenge weight, scaled by rhythm
    pub challenge_weight: f32,
    /// Base rest weight
    pub rest_weight: f32,
    /// Base secret chance before the complexity tier bonus
    pub secret_density: f32,
    /// Share of beats at each end that lean towards rest
    pub edge_fraction: f32,
    /// Rest multiplier on edge beats
    pub edge_rest_bias: f32,
    /// Challenge multiplier on edge beats
    pub edge_challenge_damping: f32,
    /// Highest the corridor floor may climb, below the ceiling
    pub headroom: i32,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            beat_length: 8,
            challenge_weight: 0.45,
            rest_weight: 0.45,
            secret_density: 0.12,
            edge_fraction: 0.2,
            edge_rest_bias: 2.0,
            edge_challenge_damping: 0.5,
            headroom: 3,
        }
    }
}

impl CorridorConfig {
    pub fn min_bounds(&self) -> RoomBounds {
        RoomBounds::new(self.beat_length.max(4) * 2, self.headroom + 3)
    }
}

/// Extra secret chance by rhythm tier: 0%, 10%, 20% or 30%
pub fn secret_tier_bonus(rhythm: f32) -> f32 {
    if rhythm < 0.9 {
        0.0
    } else if rhythm < 1.2 {
        0.1
    } else if rhythm < 1.6 {
        0.2
    } else {
        0.3
    }
}

/// Weights for beat `index` of `total`. Beats in the first and last
/// `edge_fraction` (rounded up, at least one) get the rest bias.
pub fn beat_probabilities(index: usize, total: usize, rhythm: f32, config: &CorridorConfig) -> BeatProbabilities {
    let rhythm = rhythm.max(0.0);
    let mut challenge = config.challenge_weight.max(0.0) * rhythm;
    let mut rest = config.rest_weight.max(0.0);
    let secret = (config.secret_density * (1.0 + secret_tier_bonus(rhythm))).clamp(0.0, 1.0);

    let edge = ((total as f32 * config.edge_fraction).ceil() as usize).max(1);
    if index < edge || index + edge >= total {
        rest *= config.edge_rest_bias;
        challenge *= config.edge_challenge_damping;
    }

    let sum = challenge + rest + secret;
    if sum <= 0.0 {
        return BeatProbabilities { challenge: 0.0, rest: 1.0, secret: 0.0 };
    }
    BeatProbabilities {
        challenge: challenge / sum,
        rest: rest / sum,
        secret: secret / sum,
    }
}

pub struct LinearCorridorGenerator<'a> {
    config: &'a CorridorConfig,
}

impl<'a> LinearCorridorGenerator<'a> {
    pub fn new(config: &'a CorridorConfig) -> Self {
        Self { config }
    }

    /// Split the room width into beats and classify each one
    pub fn plan_beats<R: Rng>(&self, width: i32, rhythm: f32, rng: &mut R) -> Vec<Beat> {
        let length = self.config.beat_length.max(1);
        let total = (width / length).max(1) as usize;
        (0..total)
            .map(|index| {
                let p = beat_probabilities(index, total, rhythm, self.config);
                let draw = rng.gen::<f32>();
                let kind = match weighted_pick(&[p.challenge, p.rest, p.secret], draw) {
                    Some(0) => BeatKind::Challenge,
                    Some(2) => BeatKind::Secret,
                    _ => BeatKind::Rest,
                };
                let start_x = index as i32 * length;
                // The last beat absorbs the remainder
                let length = if index + 1 == total { width - start_x } else { length };
                Beat { index, kind, start_x, length }
            })
            .collect()
    }

    pub fn generate(&self, ctx: &GeneratorContext<'_>) -> Result<GeneratorOutput, GeneratorError> {
        let reach = ctx.vertical_reach()?;
        if ctx.horizontal_reach(0) < 1 {
            return Err(GeneratorError::NoHorizontalReach);
        }
        let mut rng = ctx.rng();
        let rhythm = ctx.complexity.rhythm;
        let beats = self.plan_beats(ctx.bounds.width, rhythm, &mut rng);

        // Rhythm spans roughly 0.48..2.4; map it onto a spacing difficulty
        let difficulty = ((rhythm - 0.48) / 1.92 * ctx.biome.difficulty_modifier).clamp(0.0, 1.0);
        let spacing = ctx.validator.min_safe_spacing(ctx.movement, difficulty);
        let (gap_tiles, step_tiles) = spacing.tiles();
        let ceiling = (ctx.bounds.height - self.config.headroom).max(0);

        let mut features = FeatureList::new();
        let mut floor = 0;

        for beat in &beats {
            let mid = beat.start_x + beat.length / 2;
            match beat.kind {
                BeatKind::Rest => {
                    features.push(FeatureType::Platform, Position::new(beat.start_x, floor), beat.length);
                    if rng.gen_bool(0.3) {
                        features.push(FeatureType::Checkpoint, Position::new(mid, floor + 1), 1);
                    }
                }
                BeatKind::Secret => {
                    features.push(FeatureType::Platform, Position::new(beat.start_x, floor), beat.length);
                    // Tucked just above a normal jump
                    let y = (floor + reach + 1).min(ceiling.max(floor + 1));
                    features.push(FeatureType::Secret, Position::new(mid, y), 1);
                    features.push(FeatureType::Pickup, Position::new(mid, y), 1);
                }
                BeatKind::Challenge => {
                    // The far side may step up or down within reach
                    let step = step_tiles.clamp(0, reach);
                    let next_floor = match rng.gen_range(0..3) {
                        0 if floor + step <= ceiling => floor + step,
                        1 if floor - step >= 0 => floor - step,
                        _ => floor,
                    };
                    let dy = (next_floor - floor).abs();

                    // Distance between the two standing edges; at least one
                    // tile of floor stays on each side
                    let span = gap_tiles
                        .min(ctx.horizontal_reach(dy))
                        .clamp(1, (beat.length - 2).max(1));
                    let left = ((beat.length - span + 1) / 2).max(1);
                    let right_x = beat.start_x + left - 1 + span;
                    let right_len = (beat.start_x + beat.length - right_x).max(1);

                    features.push(FeatureType::Platform, Position::new(beat.start_x, floor), left);
                    if span > 1 {
                        let hazard = if rng.gen_bool(0.5) { FeatureType::Spikes } else { FeatureType::Hazard };
                        features.push(hazard, Position::new(beat.start_x + left, 0), span - 1);
                    }
                    features.push(FeatureType::Platform, Position::new(right_x, next_floor), right_len);
                    floor = next_floor;
                }
            }
        }

        log::trace!(
            "corridor room {}: {} beats, rhythm {:.2}, gap {}",
            ctx.room_id,
            beats.len(),
            rhythm,
            gap_tiles
        );

        Ok(GeneratorOutput {
            features: features.into_vec(),
            beats,
            cloud_motion: None,
        })
    }
}
