//! Reachability validator
//!
//! Closed-form jump arc feasibility. A single jump launched with velocity
//! `v0 = sqrt(2 g h)` lands at relative height `dy` after
//! `t(dy) = (v0 + sqrt(v0^2 - 2 g dy)) / g`; horizontal range at that height
//! is the flat-ground range scaled by `t(dy) / t(0)`.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::movement::MovementProfile;
use crate::graph::Position;

const EPSILON: f32 = 1e-4;

/// Tuning for ability bonuses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Vertical reach multiplier with double jump
    pub double_jump_height_factor: f32,
    /// Horizontal reach multiplier with double jump
    pub double_jump_distance_factor: f32,
    /// Extra horizontal tiles covered by a dash
    pub dash_distance: f32,
    /// Extra vertical reach from wall jumping, as a fraction of jump height.
    /// Only applied when `assume_walls` is set.
    pub wall_jump_height_bonus: f32,
    /// Treat every climb as having a wall to kick off. Rooms are enclosed
    /// and terrain steps are cliff faces, so this holds unless a generator
    /// builds free-floating platforms.
    pub assume_walls: bool,
    /// Longest drop that is still a valid directed traversal
    pub max_safe_fall: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            double_jump_height_factor: 1.8,
            double_jump_distance_factor: 1.5,
            dash_distance: 3.0,
            wall_jump_height_bonus: 0.5,
            assume_walls: true,
            max_safe_fall: 12.0,
        }
    }
}

/// Horizontal/vertical spacing between two platforms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
    pub horizontal: f32,
    pub vertical: f32,
}

impl Spacing {
    /// Spacing rounded down to whole tiles
    pub fn tiles(&self) -> (i32, i32) {
        (self.horizontal.floor() as i32, self.vertical.floor() as i32)
    }
}

/// Physics-based traversal checks between points
#[derive(Debug, Clone, Default)]
pub struct ReachabilityValidator {
    config: PhysicsConfig,
}

impl ReachabilityValidator {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Highest climb the profile can make between free-standing platforms
    pub fn vertical_reach(&self, profile: &MovementProfile) -> f32 {
        let base = profile.max_jump_height.max(0.0);
        let mut reach = if profile.has_double_jump {
            base * self.config.double_jump_height_factor
        } else {
            base
        };
        if profile.has_wall_jump && self.config.assume_walls {
            reach += base * self.config.wall_jump_height_bonus;
        }
        if profile.gravity > 0.0 {
            reach
        } else {
            0.0
        }
    }

    /// Vertical reach rounded down to whole tiles
    pub fn vertical_reach_tiles(&self, profile: &MovementProfile) -> i32 {
        (self.vertical_reach(profile) + EPSILON).floor() as i32
    }

    /// Horizontal range of a flat jump: the physical range from speed and
    /// airtime, capped by the profile's max jump distance, then extended by
    /// double jump and dash.
    fn flat_range(&self, profile: &MovementProfile) -> f32 {
        let v0 = profile.jump_velocity();
        let airtime = if profile.gravity > 0.0 { 2.0 * v0 / profile.gravity } else { 0.0 };
        let physical = profile.move_speed.max(0.0) * airtime;
        let mut range = physical.min(profile.max_jump_distance.max(0.0));
        if profile.has_double_jump {
            range *= self.config.double_jump_distance_factor;
        }
        if profile.has_dash {
            range += self.config.dash_distance;
        }
        range
    }

    /// Horizontal range when landing `dy` tiles above (positive) or below
    /// (negative) the launch point. Zero when `dy` is out of vertical reach.
    pub fn horizontal_reach(&self, profile: &MovementProfile, dy: f32) -> f32 {
        let apex = self.vertical_reach(profile);
        if dy > apex + EPSILON {
            return 0.0;
        }
        let flat = self.flat_range(profile);
        if apex <= 0.0 || profile.gravity <= 0.0 {
            // No jump to speak of: only a dash across level ground
            return if dy.abs() <= EPSILON && profile.has_dash {
                self.config.dash_distance
            } else {
                0.0
            };
        }

        let g = profile.gravity;
        let v0 = (2.0 * g * apex).sqrt();
        let t_flat = 2.0 * v0 / g;
        let disc = (v0 * v0 - 2.0 * g * dy).max(0.0);
        let t = (v0 + disc.sqrt()) / g;
        flat * (t / t_flat)
    }

    /// Direction-agnostic reachability: can the profile travel between `a`
    /// and `b` in both directions? Uses the climb from the lower point, so
    /// `is_reachable(a, b) == is_reachable(b, a)`.
    pub fn is_reachable(&self, a: Position, b: Position, profile: &MovementProfile) -> bool {
        let dx = (b.x - a.x).abs() as f32;
        let dy = (b.y - a.y).abs() as f32;
        if dy > self.vertical_reach(profile) + EPSILON {
            return false;
        }
        dx <= self.horizontal_reach(profile, dy) + EPSILON
    }

    /// Directed traversal: climbs behave as in [`Self::is_reachable`], drops
    /// up to `max_safe_fall` use the longer falling arc.
    pub fn can_traverse(&self, from: Position, to: Position, profile: &MovementProfile) -> bool {
        let dy = (to.y - from.y) as f32;
        if dy >= 0.0 {
            return self.is_reachable(from, to, profile);
        }
        if -dy > self.config.max_safe_fall + EPSILON {
            return false;
        }
        let dx = (to.x - from.x).abs() as f32;
        // Walking off a ledge always works straight down
        dx <= self.horizontal_reach(profile, dy).max(1.0) + EPSILON
    }

    /// All index pairs `(i, j)`, `i < j`, whose positions are mutually
    /// reachable. Rows are evaluated in parallel; order is ascending.
    pub fn reachable_pairs(&self, positions: &[Position], profile: &MovementProfile) -> Vec<(usize, usize)> {
        (0..positions.len())
            .into_par_iter()
            .flat_map_iter(|i| {
                (i + 1..positions.len())
                    .filter(move |&j| self.is_reachable(positions[i], positions[j], profile))
                    .map(move |j| (i, j))
            })
            .collect()
    }

    /// Spacing near the edge of reachability. `difficulty` in `[0, 1]` moves
    /// the result from half the reach (easy) to 95% of it (hard); the
    /// returned spacing is always reachable.
    pub fn min_safe_spacing(&self, profile: &MovementProfile, difficulty: f32) -> Spacing {
        let fraction = 0.5 + 0.45 * difficulty.clamp(0.0, 1.0);
        let vertical = self.vertical_reach(profile) * fraction;
        let horizontal = self.horizontal_reach(profile, vertical) * fraction;
        Spacing { horizontal, vertical }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> ReachabilityValidator {
        ReachabilityValidator::default()
    }

    #[test]
    fn test_flat_jump() {
        let v = validator();
        let p = MovementProfile::standard();
        assert!(v.is_reachable(Position::new(0, 0), Position::new(6, 0), &p));
        assert!(!v.is_reachable(Position::new(0, 0), Position::new(7, 0), &p));
    }

    #[test]
    fn test_height_limit() {
        let v = validator();
        let p = MovementProfile::standard();
        assert!(v.is_reachable(Position::new(0, 0), Position::new(0, 4), &p));
        assert!(!v.is_reachable(Position::new(0, 0), Position::new(0, 5), &p));
        // At full height there is no horizontal range left beyond the apex point
        assert!(v.horizontal_reach(&p, 4.0) < v.horizontal_reach(&p, 0.0));
    }

    #[test]
    fn test_abilities_extend_reach() {
        let v = validator();
        let base = MovementProfile::standard();
        let double = MovementProfile { has_double_jump: true, ..base };
        let dash = MovementProfile { has_dash: true, ..base };
        assert!(v.vertical_reach(&double) > v.vertical_reach(&base));
        assert!(v.is_reachable(Position::new(0, 0), Position::new(0, 7), &double));
        assert!(v.horizontal_reach(&dash, 0.0) > v.horizontal_reach(&base, 0.0));
        assert!(v.is_reachable(Position::new(0, 0), Position::new(8, 0), &dash));
    }

    #[test]
    fn test_wall_jump_extends_reach() {
        let v = validator();
        let base = MovementProfile::standard();
        let wall = MovementProfile { has_wall_jump: true, ..base };
        assert_eq!(v.vertical_reach(&base), 4.0);
        assert_eq!(v.vertical_reach(&wall), 6.0);
        assert!(v.is_reachable(Position::new(0, 0), Position::new(1, 6), &wall));
        assert!(!v.is_reachable(Position::new(0, 0), Position::new(1, 6), &base));

        let open = ReachabilityValidator::new(PhysicsConfig { assume_walls: false, ..PhysicsConfig::default() });
        assert_eq!(open.vertical_reach(&wall), 4.0);
    }

    #[test]
    fn test_symmetry() {
        let v = validator();
        let profiles = [
            MovementProfile::standard(),
            MovementProfile { has_double_jump: true, has_dash: true, ..MovementProfile::standard() },
        ];
        for p in &profiles {
            for ax in -3..=3 {
                for ay in -3..=3 {
                    for bx in -8..=8 {
                        for by in -8..=8 {
                            let a = Position::new(ax, ay);
                            let b = Position::new(bx, by);
                            assert_eq!(v.is_reachable(a, b, p), v.is_reachable(b, a, p));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_drops_are_directed() {
        let v = validator();
        let p = MovementProfile::standard();
        let top = Position::new(0, 10);
        let bottom = Position::new(3, 0);
        assert!(v.can_traverse(top, bottom, &p));
        assert!(!v.can_traverse(bottom, top, &p));
        assert!(!v.can_traverse(Position::new(0, 20), Position::new(0, 0), &p));
    }

    #[test]
    fn test_reachable_pairs() {
        let v = validator();
        let p = MovementProfile::standard();
        let pts = [Position::new(0, 0), Position::new(5, 0), Position::new(4, 3), Position::new(40, 0)];
        let pairs = v.reachable_pairs(&pts, &p);
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn test_spacing_contract() {
        let v = validator();
        let p = MovementProfile::standard();
        let easy = v.min_safe_spacing(&p, 0.0);
        let hard = v.min_safe_spacing(&p, 1.0);
        assert!(hard.vertical > easy.vertical);
        assert!(hard.horizontal > easy.horizontal);
        for d in [0.0, 0.25, 0.5, 0.75, 1.0, 3.0] {
            let s = v.min_safe_spacing(&p, d);
            let (h, vt) = s.tiles();
            assert!(v.is_reachable(Position::new(0, 0), Position::new(h, vt), &p), "difficulty {d}");
        }
    }

    #[test]
    fn test_degenerate_profile() {
        let v = validator();
        let p = MovementProfile { gravity: 0.0, ..MovementProfile::standard() };
        assert_eq!(v.vertical_reach(&p), 0.0);
        assert!(v.is_reachable(Position::new(0, 0), Position::new(0, 0), &p));
        assert!(!v.is_reachable(Position::new(0, 0), Position::new(1, 0), &p));
    }
}
