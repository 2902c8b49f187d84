//! Placed room features

use serde::{Deserialize, Serialize};

use crate::graph::Position;

/// What a placed feature is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureType {
    /// Standing surface
    Platform,
    /// Extra platform inserted to split a gap the player cannot jump
    BridgePlatform,
    /// Floating platform in a sky room
    CloudPlatform,
    /// Cloud platform that drifts with the room's motion pattern
    MovingPlatform,
    /// Ground segment of a terrain room
    Ground,
    Obstacle,
    Hazard,
    Spikes,
    LavaVent,
    IceSlick,
    CrystalShard,
    Thorns,
    Crumbling,
    Secret,
    Pickup,
    Switch,
    Checkpoint,
}

impl FeatureType {
    /// Features the player can stand on
    pub fn is_walkable(self) -> bool {
        matches!(
            self,
            FeatureType::Platform
                | FeatureType::BridgePlatform
                | FeatureType::CloudPlatform
                | FeatureType::MovingPlatform
                | FeatureType::Ground
                | FeatureType::IceSlick
                | FeatureType::Crumbling
        )
    }

    /// Features that hurt or block the player
    pub fn is_challenge(self) -> bool {
        matches!(
            self,
            FeatureType::Obstacle
                | FeatureType::Hazard
                | FeatureType::Spikes
                | FeatureType::LavaVent
                | FeatureType::CrystalShard
                | FeatureType::Thorns
        )
    }
}

/// A feature placed in a room. `position` is the left end of the feature at
/// floor level; only `feature_type` may change after placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedFeature {
    pub id: u32,
    pub feature_type: FeatureType,
    pub position: Position,
    /// Horizontal extent in tiles, at least 1
    pub width: i32,
}

impl PlacedFeature {
    pub fn new(id: u32, feature_type: FeatureType, position: Position, width: i32) -> Self {
        Self {
            id,
            feature_type,
            position,
            width: width.max(1),
        }
    }

    /// Rightmost tile covered
    pub fn right(&self) -> i32 {
        self.position.x + self.width - 1
    }

    pub fn center(&self) -> Position {
        Position::new(self.position.x + (self.width - 1) / 2, self.position.y)
    }

    /// Closest pair of standing tiles between two features, used for
    /// reachability between wide platforms
    pub fn nearest_points(&self, other: &PlacedFeature) -> (Position, Position) {
        let (a, b) = if other.position.x > self.right() {
            (self.right(), other.position.x)
        } else if self.position.x > other.right() {
            (self.position.x, other.right())
        } else {
            // Overlapping spans: stand right above/below each other
            let x = self.position.x.max(other.position.x);
            (x, x)
        };
        (Position::new(a, self.position.y), Position::new(b, other.position.y))
    }
}

/// Appends features with sequential ids
#[derive(Debug, Default)]
pub struct FeatureList {
    features: Vec<PlacedFeature>,
}

impl FeatureList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, feature_type: FeatureType, position: Position, width: i32) -> u32 {
        let id = self.features.len() as u32;
        self.features.push(PlacedFeature::new(id, feature_type, position, width));
        id
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn as_slice(&self) -> &[PlacedFeature] {
        &self.features
    }

    pub fn into_vec(self) -> Vec<PlacedFeature> {
        self.features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_points() {
        let a = PlacedFeature::new(0, FeatureType::Platform, Position::new(0, 0), 4);
        let b = PlacedFeature::new(1, FeatureType::Platform, Position::new(8, 3), 2);
        assert_eq!(a.nearest_points(&b), (Position::new(3, 0), Position::new(8, 3)));
        assert_eq!(b.nearest_points(&a), (Position::new(8, 3), Position::new(3, 0)));

        let c = PlacedFeature::new(2, FeatureType::Platform, Position::new(2, 5), 3);
        assert_eq!(a.nearest_points(&c), (Position::new(2, 0), Position::new(2, 5)));
    }

    #[test]
    fn test_feature_list_ids() {
        let mut list = FeatureList::new();
        assert_eq!(list.push(FeatureType::Platform, Position::new(0, 0), 0), 0);
        assert_eq!(list.push(FeatureType::Secret, Position::new(1, 0), 1), 1);
        assert_eq!(list.as_slice()[0].width, 1);
        assert_eq!(list.len(), 2);
    }
}
