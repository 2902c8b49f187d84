//! Reachability post-pass and navigation hints
//!
//! Both work on the walkable features of a finished room. Links between
//! features use the closest pair of standing tiles.

use std::collections::VecDeque;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::feature::PlacedFeature;
use crate::error::ValidationFailure;
use crate::physics::{MovementProfile, ReachabilityValidator};

/// How the player gets from one feature to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationKind {
    /// Adjacent at the same height
    Walk,
    Jump,
    /// Only possible with a dash
    Dash,
    /// One-way fall
    Drop,
}

/// A directed hint for AI and map tooling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationHint {
    pub from: u32,
    pub to: u32,
    pub kind: NavigationKind,
}

fn walkable(features: &[PlacedFeature]) -> Vec<&PlacedFeature> {
    features.iter().filter(|f| f.feature_type.is_walkable()).collect()
}

/// Mutually reachable pairs among `walkable`, as indices into it
fn links(walkable: &[&PlacedFeature], movement: &MovementProfile, validator: &ReachabilityValidator) -> Vec<(usize, usize)> {
    (0..walkable.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            (i + 1..walkable.len())
                .filter(move |&j| {
                    let (a, b) = walkable[i].nearest_points(walkable[j]);
                    validator.is_reachable(a, b, movement)
                })
                .map(move |j| (i, j))
        })
        .collect()
}

/// Report every walkable feature that cannot be reached from the first one.
/// Each failure names the closest reachable feature as its source.
pub fn validate_reachability(
    room: u32,
    features: &[PlacedFeature],
    movement: &MovementProfile,
    validator: &ReachabilityValidator,
) -> Vec<ValidationFailure> {
    let walkable = walkable(features);
    if walkable.len() < 2 {
        return Vec::new();
    }

    let mut adjacency = vec![Vec::new(); walkable.len()];
    for (i, j) in links(&walkable, movement, validator) {
        adjacency[i].push(j);
        adjacency[j].push(i);
    }

    let mut seen = vec![false; walkable.len()];
    let mut queue = VecDeque::from([0usize]);
    seen[0] = true;
    while let Some(i) = queue.pop_front() {
        for &j in &adjacency[i] {
            if !seen[j] {
                seen[j] = true;
                queue.push_back(j);
            }
        }
    }

    let reached: Vec<&PlacedFeature> = walkable.iter().zip(&seen).filter(|(_, s)| **s).map(|(f, _)| *f).collect();
    walkable
        .iter()
        .zip(&seen)
        .filter(|(_, s)| !**s)
        .filter_map(|(f, _)| {
            let closest = reached.iter().min_by_key(|r| {
                let (a, b) = r.nearest_points(f);
                a.distance(&b)
            })?;
            Some(ValidationFailure {
                room,
                from: closest.id,
                from_position: closest.position,
                to: f.id,
                to_position: f.position,
            })
        })
        .collect()
}

/// Directed hints between walkable features, ordered by `(from, to)`
pub fn navigation_hints(
    features: &[PlacedFeature],
    movement: &MovementProfile,
    validator: &ReachabilityValidator,
) -> Vec<NavigationHint> {
    let walkable = walkable(features);
    let grounded = MovementProfile { has_dash: false, ..*movement };

    let mut hints: Vec<NavigationHint> = (0..walkable.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let walkable = &walkable;
            let grounded = &grounded;
            (0..walkable.len()).filter(move |&j| j != i).filter_map(move |j| {
                let (from, to) = (walkable[i], walkable[j]);
                let (a, b) = from.nearest_points(to);
                let kind = if validator.is_reachable(a, b, movement) {
                    if a.y == b.y && (a.x - b.x).abs() <= 1 {
                        NavigationKind::Walk
                    } else if !validator.is_reachable(a, b, grounded) {
                        NavigationKind::Dash
                    } else {
                        NavigationKind::Jump
                    }
                } else if b.y < a.y && validator.can_traverse(a, b, movement) {
                    NavigationKind::Drop
                } else {
                    return None;
                };
                Some(NavigationHint { from: from.id, to: to.id, kind })
            })
        })
        .collect();
    hints.sort_by_key(|h| (h.from, h.to));
    hints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Position;
    use crate::room::feature::FeatureType;

    fn platform(id: u32, x: i32, y: i32, w: i32) -> PlacedFeature {
        PlacedFeature::new(id, FeatureType::Platform, Position::new(x, y), w)
    }

    #[test]
    fn test_connected_room_has_no_failures() {
        let features = [platform(0, 0, 0, 10), platform(1, 12, 3, 3), platform(2, 14, 6, 3)];
        let failures = validate_reachability(1, &features, &MovementProfile::standard(), &ReachabilityValidator::default());
        assert!(failures.is_empty());
    }

    #[test]
    fn test_floating_platform_is_reported() {
        let features = [
            platform(0, 0, 0, 10),
            PlacedFeature::new(1, FeatureType::Spikes, Position::new(3, 1), 1),
            platform(2, 5, 12, 2),
        ];
        let failures = validate_reachability(9, &features, &MovementProfile::standard(), &ReachabilityValidator::default());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].room, 9);
        assert_eq!(failures[0].from, 0);
        assert_eq!(failures[0].to, 2);
    }

    #[test]
    fn test_hint_kinds() {
        let features = [
            platform(0, 0, 0, 4),
            platform(1, 4, 0, 4),
            platform(2, 10, 2, 3),
            platform(3, 20, 2, 2),
            platform(4, 0, 10, 2),
        ];
        let validator = ReachabilityValidator::default();
        let dasher = MovementProfile { has_dash: true, ..MovementProfile::standard() };
        let hints = navigation_hints(&features, &dasher, &validator);
        let kind = |from, to| hints.iter().find(|h| h.from == from && h.to == to).map(|h| h.kind);

        assert_eq!(kind(0, 1), Some(NavigationKind::Walk));
        assert_eq!(kind(1, 2), Some(NavigationKind::Jump));
        // Eight tiles across: only with the dash
        assert_eq!(kind(2, 3), Some(NavigationKind::Dash));
        assert_eq!(kind(4, 0), Some(NavigationKind::Drop));
        assert_eq!(kind(0, 4), None);
        assert!(hints.windows(2).all(|w| (w[0].from, w[0].to) < (w[1].from, w[1].to)));
    }
}
