//! Stacked segment generator
//!
//! Vertical rooms. The height is cut into segments, each segment gets a few
//! platforms, and any climb taller than the player's reach is split by
//! bridging platforms. Every platform is placed within jumping distance of
//! the one below it.

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{reachable_span, GeneratorContext, GeneratorOutput, RoomBounds};
use crate::error::GeneratorError;
use crate::graph::Position;
use crate::room::{FeatureList, FeatureType, PlacedFeature};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StackedConfig {
    /// Rows per vertical segment
    pub segment_height: i32,
    /// Upper bound on platforms per segment at any complexity
    pub max_platforms_per_segment: u32,
    pub min_platform_width: i32,
    pub max_platform_width: i32,
    pub bridge_width: i32,
    /// Platforms between challenge features at complexity 1.0
    pub challenge_interval: f32,
}

impl Default for StackedConfig {
    fn default() -> Self {
        Self {
            segment_height: 6,
            max_platforms_per_segment: 4,
            min_platform_width: 2,
            max_platform_width: 5,
            bridge_width: 2,
            challenge_interval: 6.0,
        }
    }
}

impl StackedConfig {
    pub fn min_bounds(&self) -> RoomBounds {
        RoomBounds::new(self.max_platform_width + 2, self.segment_height + 2)
    }

    /// Platforms per segment scale with difficulty, between 1 and the cap
    pub fn platforms_per_segment(&self, difficulty: f32) -> u32 {
        ((2.0 * difficulty).round().max(1.0) as u32).clamp(1, self.max_platforms_per_segment.max(1))
    }

    /// Every this many platforms a challenge is placed; never below 2
    pub fn challenge_every(&self, difficulty: f32) -> usize {
        (self.challenge_interval / difficulty.max(0.1)).round().max(2.0) as usize
    }
}

pub struct StackedSegmentGenerator<'a> {
    config: &'a StackedConfig,
}

impl<'a> StackedSegmentGenerator<'a> {
    pub fn new(config: &'a StackedConfig) -> Self {
        Self { config }
    }

    pub fn generate(&self, ctx: &GeneratorContext<'_>) -> Result<GeneratorOutput, GeneratorError> {
        let reach = ctx.vertical_reach()?;
        let mut rng = ctx.rng();
        let bounds = ctx.bounds;
        let difficulty = ctx.difficulty();
        let top = bounds.height - 1;

        // Plan platform rows segment by segment
        let per_segment = self.config.platforms_per_segment(difficulty);
        let segment = self.config.segment_height.max(1);
        let mut rows = Vec::new();
        let mut start = 1;
        while start <= top {
            let end = (start + segment - 1).min(top);
            let len = (end - start + 1) as usize;
            let count = (rng.gen_range(1..=per_segment) as usize).min(len);
            // Distinct rows, two platforms never share a row in one segment
            rows.extend(index::sample(&mut rng, len, count).into_iter().map(|i| start + i as i32));
            start += segment;
        }
        rows.sort_unstable();

        let mut features = FeatureList::new();
        let ground = features.push(FeatureType::Platform, Position::new(0, 0), bounds.width);
        let mut below = features.as_slice()[ground as usize];

        let challenge_every = self.config.challenge_every(difficulty);
        let min_w = self.config.min_platform_width.max(1).min(bounds.width);
        let max_w = self.config.max_platform_width.max(min_w).min(bounds.width);
        let mut placed = 0usize;

        for y in rows {
            let gap = y - below.position.y;
            if gap > reach {
                below = self.bridge(ctx, &mut features, below, gap, reach);
            }

            let w = rng.gen_range(min_w..=max_w);
            let (lo, hi) = reachable_span(&below, w, ctx.horizontal_reach(y - below.position.y), bounds.width);
            let x = rng.gen_range(lo..=hi);
            let id = features.push(FeatureType::Platform, Position::new(x, y), w);
            below = features.as_slice()[id as usize];
            placed += 1;

            if placed % challenge_every == 0 {
                let kind = if rng.gen_bool(0.5) { FeatureType::Hazard } else { FeatureType::Obstacle };
                let spot = below.center();
                features.push(kind, Position::new(spot.x, (y + 1).min(top)), 1);
            }
        }

        log::trace!(
            "stacked room {}: {} platforms, reach {}, challenge every {}",
            ctx.room_id,
            placed,
            reach,
            challenge_every
        );

        Ok(GeneratorOutput {
            features: features.into_vec(),
            ..GeneratorOutput::default()
        })
    }

    /// Split a climb of `gap` rows above `from` into `ceil(gap / reach)`
    /// evenly spaced steps, none taller than `reach`. Returns the topmost
    /// bridge.
    fn bridge(
        &self,
        ctx: &GeneratorContext<'_>,
        features: &mut FeatureList,
        from: PlacedFeature,
        gap: i32,
        reach: i32,
    ) -> PlacedFeature {
        let bridges = (gap + reach - 1) / reach - 1;
        let base = from.position.y;
        let w = self.config.bridge_width.max(1).min(ctx.bounds.width);
        let mut below = from;
        for k in 1..=bridges {
            let y = base + gap * k / (bridges + 1);
            let (lo, hi) = reachable_span(&below, w, ctx.horizontal_reach(y - below.position.y), ctx.bounds.width);
            let id = features.push(FeatureType::BridgePlatform, Position::new((lo + hi) / 2, y), w);
            below = features.as_slice()[id as usize];
        }
        below
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complexity::ComplexityProfile;
    use crate::generation::test_support::{walkable_heights, Fixture};
    use crate::room::BiomeType;

    fn complexity(distance: f32) -> ComplexityProfile {
        ComplexityProfile { distance, ..ComplexityProfile::neutral() }
    }

    #[test]
    fn test_tall_room_never_exceeds_jump_height() {
        // Height 30 with a 4-tile jump
        let fixture = Fixture::new(BiomeType::Verdant);
        assert_eq!(fixture.movement.max_jump_height, 4.0);
        let config = StackedConfig::default();
        for seed in 0..25 {
            for distance in [0.63, 1.0, 1.98] {
                let ctx = fixture.context(seed as u32, seed, RoomBounds::new(24, 30), complexity(distance));
                let out = StackedSegmentGenerator::new(&config).generate(&ctx).unwrap();
                let ys = walkable_heights(&out.features);
                for pair in ys.windows(2) {
                    assert!(pair[1] - pair[0] <= 4, "seed {seed}: {:?}", ys);
                }
                assert!(out.features.iter().all(|f| f.position.y < 30 && f.position.x >= 0 && f.right() < 24));
            }
        }
    }

    #[test]
    fn test_bridges_split_large_gaps() {
        let fixture = Fixture::new(BiomeType::Verdant);
        let config = StackedConfig {
            segment_height: 29,
            max_platforms_per_segment: 1,
            ..StackedConfig::default()
        };
        for seed in 0..20 {
            let ctx = fixture.context(1, seed, RoomBounds::new(16, 30), ComplexityProfile::neutral());
            let out = StackedSegmentGenerator::new(&config).generate(&ctx).unwrap();
            let platform = out
                .features
                .iter()
                .filter(|f| f.feature_type == FeatureType::Platform && f.position.y > 0)
                .collect::<Vec<_>>();
            assert_eq!(platform.len(), 1);
            let y = platform[0].position.y;
            let bridges = out.features.iter().filter(|f| f.feature_type == FeatureType::BridgePlatform).count() as i32;
            assert_eq!(bridges, (y + 3) / 4 - 1, "platform at {y}");
        }
    }

    #[test]
    fn test_consecutive_platforms_are_reachable() {
        let fixture = Fixture::new(BiomeType::Crystal);
        let config = StackedConfig::default();
        let ctx = fixture.context(8, 1234, RoomBounds::new(30, 40), complexity(1.5));
        let out = StackedSegmentGenerator::new(&config).generate(&ctx).unwrap();
        let walkable: Vec<_> = out.features.iter().filter(|f| f.feature_type.is_walkable()).collect();
        for pair in walkable.windows(2) {
            let (a, b) = pair[0].nearest_points(pair[1]);
            assert!(fixture.validator.is_reachable(a, b, &fixture.movement), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_complexity_adds_platforms_and_challenges() {
        let fixture = Fixture::new(BiomeType::Verdant);
        let config = StackedConfig::default();
        let count = |distance: f32, wanted: fn(FeatureType) -> bool| -> usize {
            (0..10)
                .map(|seed| {
                    let ctx = fixture.context(2, seed, RoomBounds::new(24, 36), complexity(distance));
                    let out = StackedSegmentGenerator::new(&config).generate(&ctx).unwrap();
                    out.features.iter().filter(|f| wanted(f.feature_type)).count()
                })
                .sum()
        };
        assert!(count(0.63, |t| t == FeatureType::Platform) < count(1.98, |t| t == FeatureType::Platform));
        assert!(count(0.63, FeatureType::is_challenge) < count(1.98, FeatureType::is_challenge));
        assert!(config.challenge_every(1.98) < config.challenge_every(0.63));
    }

    #[test]
    fn test_walkable_features_never_overlap() {
        let fixture = Fixture::new(BiomeType::Ruins);
        let config = StackedConfig::default();
        for seed in 0..40 {
            let ctx = fixture.context(seed as u32, seed, RoomBounds::new(40, 30), complexity(1.98));
            let out = StackedSegmentGenerator::new(&config).generate(&ctx).unwrap();
            let walkable: Vec<_> = out.features.iter().filter(|f| f.feature_type.is_walkable()).collect();
            for (i, a) in walkable.iter().enumerate() {
                for b in &walkable[i + 1..] {
                    let shared = a.position.y == b.position.y
                        && a.position.x <= b.right()
                        && b.position.x <= a.right();
                    assert!(!shared, "seed {seed}: {:?} overlaps {:?}", a, b);
                }
            }
        }
    }
}
