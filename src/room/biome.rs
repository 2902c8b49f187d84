//! Biome definitions and lookup table
//!
//! Each biome type maps to one profile record: terrain noise shape, the
//! feature it favours and how it reclassifies generic features. The table is
//! built from defaults and can be replaced from config.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::feature::FeatureType;

/// Environmental classification of a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BiomeType {
    Verdant,
    Frozen,
    Volcanic,
    Crystal,
    Ruins,
    Sky,
}

impl BiomeType {
    pub const ALL: [BiomeType; 6] = [
        BiomeType::Verdant,
        BiomeType::Frozen,
        BiomeType::Volcanic,
        BiomeType::Crystal,
        BiomeType::Ruins,
        BiomeType::Sky,
    ];

    pub fn tag(self) -> u64 {
        self as u64
    }

    pub fn name(self) -> &'static str {
        match self {
            BiomeType::Verdant => "Verdant",
            BiomeType::Frozen => "Frozen",
            BiomeType::Volcanic => "Volcanic",
            BiomeType::Crystal => "Crystal",
            BiomeType::Ruins => "Ruins",
            BiomeType::Sky => "Sky",
        }
    }
}

/// Secondary environmental tag used for gating and feature overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Polarity {
    #[default]
    None,
    Sun,
    Moon,
    Heat,
    Cold,
    Earth,
    Wind,
    Tech,
}

/// The biome of one room
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Biome {
    pub biome_type: BiomeType,
    pub primary_polarity: Polarity,
    pub secondary_polarity: Polarity,
    /// In `[0, 1]`; chance that a generic feature takes the biome's form
    pub polarity_strength: f32,
    /// Multiplier applied on top of the complexity field
    pub difficulty_modifier: f32,
}

impl Biome {
    pub fn new(
        biome_type: BiomeType,
        primary_polarity: Polarity,
        secondary_polarity: Polarity,
        polarity_strength: f32,
        difficulty_modifier: f32,
    ) -> Self {
        Self {
            biome_type,
            primary_polarity,
            secondary_polarity,
            polarity_strength: if polarity_strength.is_nan() { 0.0 } else { polarity_strength.clamp(0.0, 1.0) },
            difficulty_modifier: difficulty_modifier.max(0.0),
        }
    }

    /// Biome using the profile's default polarities
    pub fn from_profile(biome_type: BiomeType, profile: &BiomeProfile) -> Self {
        Self::new(
            biome_type,
            profile.primary_polarity,
            profile.secondary_polarity,
            profile.polarity_strength,
            profile.difficulty_modifier,
        )
    }

    /// Swap in a different primary polarity; the old primary becomes
    /// secondary
    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        if polarity != self.primary_polarity {
            self.secondary_polarity = self.primary_polarity;
            self.primary_polarity = polarity;
        }
        self
    }

    pub fn has_polarity(&self, polarity: Polarity) -> bool {
        self.primary_polarity == polarity || self.secondary_polarity == polarity
    }
}

/// One generic-to-biome feature reclassification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureOverride {
    pub from: FeatureType,
    pub to: FeatureType,
}

/// Generation parameters for a biome type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomeProfile {
    /// Noise frequency; low is smooth, high is jagged
    pub noise_scale: f64,
    /// Terrain amplitude in tiles
    pub height_variation: f32,
    /// Signature feature placed by the terrain generator
    pub feature_type: FeatureType,
    pub primary_polarity: Polarity,
    pub secondary_polarity: Polarity,
    pub polarity_strength: f32,
    pub difficulty_modifier: f32,
    /// Applied by the override step
    pub overrides: Vec<FeatureOverride>,
}

impl BiomeProfile {
    /// Built-in profile for a biome type
    pub fn default_for(biome_type: BiomeType) -> Self {
        let o = |from, to| FeatureOverride { from, to };
        match biome_type {
            BiomeType::Verdant => BiomeProfile {
                noise_scale: 0.08,
                height_variation: 4.0,
                feature_type: FeatureType::Thorns,
                primary_polarity: Polarity::Sun,
                secondary_polarity: Polarity::Earth,
                polarity_strength: 0.3,
                difficulty_modifier: 1.0,
                overrides: vec![
                    o(FeatureType::Hazard, FeatureType::Thorns),
                    o(FeatureType::Obstacle, FeatureType::Thorns),
                ],
            },
            BiomeType::Frozen => BiomeProfile {
                noise_scale: 0.04,
                height_variation: 3.0,
                feature_type: FeatureType::IceSlick,
                primary_polarity: Polarity::Cold,
                secondary_polarity: Polarity::Moon,
                polarity_strength: 0.6,
                difficulty_modifier: 1.1,
                overrides: vec![
                    o(FeatureType::Platform, FeatureType::IceSlick),
                    o(FeatureType::Hazard, FeatureType::Spikes),
                ],
            },
            BiomeType::Volcanic => BiomeProfile {
                noise_scale: 0.15,
                height_variation: 8.0,
                feature_type: FeatureType::LavaVent,
                primary_polarity: Polarity::Heat,
                secondary_polarity: Polarity::Earth,
                polarity_strength: 0.7,
                difficulty_modifier: 1.3,
                overrides: vec![
                    o(FeatureType::Hazard, FeatureType::LavaVent),
                    o(FeatureType::Obstacle, FeatureType::LavaVent),
                ],
            },
            BiomeType::Crystal => BiomeProfile {
                noise_scale: 0.1,
                height_variation: 6.0,
                feature_type: FeatureType::CrystalShard,
                primary_polarity: Polarity::Moon,
                secondary_polarity: Polarity::Tech,
                polarity_strength: 0.5,
                difficulty_modifier: 1.2,
                overrides: vec![o(FeatureType::Hazard, FeatureType::CrystalShard)],
            },
            BiomeType::Ruins => BiomeProfile {
                noise_scale: 0.12,
                height_variation: 5.0,
                feature_type: FeatureType::Crumbling,
                primary_polarity: Polarity::Tech,
                secondary_polarity: Polarity::Earth,
                polarity_strength: 0.4,
                difficulty_modifier: 1.15,
                overrides: vec![
                    o(FeatureType::Platform, FeatureType::Crumbling),
                    o(FeatureType::Hazard, FeatureType::Spikes),
                ],
            },
            BiomeType::Sky => BiomeProfile {
                noise_scale: 0.05,
                height_variation: 2.0,
                feature_type: FeatureType::CloudPlatform,
                primary_polarity: Polarity::Wind,
                secondary_polarity: Polarity::Sun,
                polarity_strength: 0.5,
                difficulty_modifier: 1.25,
                overrides: vec![o(FeatureType::Platform, FeatureType::CloudPlatform)],
            },
        }
    }

    /// Replacement type for `feature_type`, if this biome has one
    pub fn override_for(&self, feature_type: FeatureType) -> Option<FeatureType> {
        self.overrides
            .iter()
            .find(|o| o.from == feature_type)
            .map(|o| o.to)
    }
}

/// Lookup table keyed by biome type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BiomeTable {
    profiles: BTreeMap<BiomeType, BiomeProfile>,
}

impl BiomeTable {
    pub fn new() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, biome_type: BiomeType, profile: BiomeProfile) {
        self.profiles.insert(biome_type, profile);
    }

    pub fn get(&self, biome_type: BiomeType) -> Option<&BiomeProfile> {
        self.profiles.get(&biome_type)
    }

    /// Profile for `biome_type`, falling back to the built-in one when a
    /// loaded table leaves it out
    pub fn profile(&self, biome_type: BiomeType) -> Cow<'_, BiomeProfile> {
        match self.profiles.get(&biome_type) {
            Some(p) => Cow::Borrowed(p),
            None => Cow::Owned(BiomeProfile::default_for(biome_type)),
        }
    }

    /// Default biome of a type according to this table
    pub fn biome(&self, biome_type: BiomeType) -> Biome {
        Biome::from_profile(biome_type, &self.profile(biome_type))
    }
}

impl Default for BiomeTable {
    fn default() -> Self {
        let profiles = BiomeType::ALL
            .iter()
            .map(|&t| (t, BiomeProfile::default_for(t)))
            .collect();
        Self { profiles }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity_strength_clamped() {
        let b = Biome::new(BiomeType::Frozen, Polarity::Cold, Polarity::None, 1.7, 1.0);
        assert_eq!(b.polarity_strength, 1.0);
        let b = Biome::new(BiomeType::Frozen, Polarity::Cold, Polarity::None, -0.5, 1.0);
        assert_eq!(b.polarity_strength, 0.0);
        let b = Biome::new(BiomeType::Frozen, Polarity::Cold, Polarity::None, f32::NAN, 1.0);
        assert_eq!(b.polarity_strength, 0.0);
    }

    #[test]
    fn test_table_covers_all_types() {
        let table = BiomeTable::default();
        for t in BiomeType::ALL {
            assert!(table.get(t).is_some(), "{}", t.name());
        }
        // Smooth ice, jagged lava
        assert!(table.profile(BiomeType::Frozen).noise_scale < table.profile(BiomeType::Volcanic).noise_scale);
    }

    #[test]
    fn test_missing_profile_falls_back() {
        let table = BiomeTable::new();
        assert!(table.get(BiomeType::Sky).is_none());
        assert_eq!(table.profile(BiomeType::Sky).feature_type, FeatureType::CloudPlatform);
    }

    #[test]
    fn test_with_polarity_demotes_primary() {
        let b = BiomeTable::default().biome(BiomeType::Volcanic).with_polarity(Polarity::Cold);
        assert_eq!(b.primary_polarity, Polarity::Cold);
        assert_eq!(b.secondary_polarity, Polarity::Heat);
        assert!(b.has_polarity(Polarity::Heat));
    }

    #[test]
    fn test_overrides() {
        let frozen = BiomeProfile::default_for(BiomeType::Frozen);
        assert_eq!(frozen.override_for(FeatureType::Platform), Some(FeatureType::IceSlick));
        assert_eq!(frozen.override_for(FeatureType::Secret), None);
    }
}
