//! Complexity field
//!
//! Pure functions from a node's world coordinates to difficulty and density
//! multipliers. Every generator reads these, so the clamp bounds and the order
//! of operations are fixed: changing either changes every seeded world.

use serde::{Deserialize, Serialize};

use crate::graph::Position;

/// Density multiplier driven by distance from the world origin, with a
/// checkerboard bias on coordinate parity. Always within `[0.63, 1.98]`.
pub fn distance_complexity(coords: Position) -> f32 {
    let base = (coords.length() / 20.0).clamp(0.7, 1.8);
    let parity = if (coords.x ^ coords.y) & 1 == 0 { 1.1 } else { 0.9 };
    base * parity
}

/// Pacing multiplier for corridor beats. The `(x + y) mod 5` term uses the
/// euclidean remainder so negative coordinates stay within `0..5`.
pub fn rhythm_complexity(coords: Position) -> f32 {
    let base = (coords.length() / 15.0).clamp(0.6, 2.0);
    let phase = (coords.x + coords.y).rem_euclid(5) as f32;
    base * (0.8 + 0.1 * phase)
}

/// Multiplier for sky rooms; `y` is altitude.
pub fn altitude_complexity(coords: Position) -> f32 {
    let altitude = (coords.y as f32 / 10.0 + 1.0).clamp(0.8, 2.5);
    let spread = (coords.length() / 25.0).clamp(0.7, 1.6);
    altitude * spread
}

/// All three multipliers for one node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexityProfile {
    pub distance: f32,
    pub rhythm: f32,
    pub altitude: f32,
}

impl ComplexityProfile {
    pub fn at(coords: Position) -> Self {
        Self {
            distance: distance_complexity(coords),
            rhythm: rhythm_complexity(coords),
            altitude: altitude_complexity(coords),
        }
    }

    /// Neutral multipliers, handy for tests and tooling
    pub fn neutral() -> Self {
        Self {
            distance: 1.0,
            rhythm: 1.0,
            altitude: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_distance_bounds() {
        for x in -60..=60 {
            for y in -60..=60 {
                let c = distance_complexity(Position::new(x, y));
                assert!(c >= 0.63 - EPS && c <= 1.98 + EPS, "({x},{y}) -> {c}");
            }
        }
        let far = distance_complexity(Position::new(i32::MAX / 2, 0));
        assert!(far <= 1.98 + EPS);
    }

    #[test]
    fn test_distance_values() {
        // origin: clamp to 0.7, even parity
        assert!((distance_complexity(Position::new(0, 0)) - 0.77).abs() < EPS);
        // (20, 1): len ~20.02 -> ~1.001, odd parity
        let c = distance_complexity(Position::new(20, 1));
        assert!((c - (20.024984f32 / 20.0) * 0.9).abs() < EPS);
        // far away clamps to 1.8
        assert!((distance_complexity(Position::new(100, 0)) - 1.98).abs() < EPS);
    }

    #[test]
    fn test_rhythm_values() {
        assert!((rhythm_complexity(Position::new(0, 0)) - 0.48).abs() < EPS);
        // (3, 4): len 5 -> clamp 0.6, phase 2 -> 0.6 * 1.0
        assert!((rhythm_complexity(Position::new(3, 4)) - 0.6).abs() < EPS);
        // negative sum still in range
        let c = rhythm_complexity(Position::new(-1, 0));
        assert!((c - 0.6 * 1.2).abs() < EPS);
    }

    #[test]
    fn test_altitude_values() {
        // y = 0 -> altitude factor 1.0, len 0 -> spread 0.7
        assert!((altitude_complexity(Position::new(0, 0)) - 0.7).abs() < EPS);
        // high up: both clamps saturate
        assert!((altitude_complexity(Position::new(0, 100)) - 2.5 * 1.6).abs() < EPS);
        // deep below clamps altitude to 0.8
        assert!((altitude_complexity(Position::new(0, -30)) - 0.8 * 1.2).abs() < EPS);
    }

    #[test]
    fn test_profile_matches_functions() {
        let p = Position::new(7, -3);
        let profile = ComplexityProfile::at(p);
        assert_eq!(profile.distance, distance_complexity(p));
        assert_eq!(profile.rhythm, rhythm_complexity(p));
        assert_eq!(profile.altitude, altitude_complexity(p));
    }
}
