//! Candidate validators
//!
//! Three independent checks run against every remaining candidate on each
//! propagation iteration. A candidate failing any of them is removed.

use rand::Rng;

use super::state::DistrictType;
use super::SolverConfig;
use crate::graph::Position;

/// Which check rejected a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Spatial,
    Polarity,
    Adjacency,
}

/// Spatial/biome compatibility. Hubs grow rarer beyond `hub_radius`: the
/// rejection chance rises linearly with the overshoot, capped at 90% per
/// iteration. Exotic districts never sit inside `exotic_min_radius`.
pub fn spatial_compatible<R: Rng>(
    candidate: DistrictType,
    coords: Position,
    config: &SolverConfig,
    rng: &mut R,
) -> bool {
    let distance = coords.length();
    match candidate {
        DistrictType::Hub if distance > config.hub_radius => {
            let overshoot = (distance - config.hub_radius) / config.hub_radius.max(1.0);
            let reject_chance = overshoot.min(0.9) as f64;
            !rng.gen_bool(reject_chance)
        }
        DistrictType::Exotic => distance >= config.exotic_min_radius,
        _ => true,
    }
}

/// Polarity compatibility. Cells alternate between two environmental phases
/// on a checkerboard: Frontier needs an odd cell, Exotic an even one.
pub fn polarity_compatible(candidate: DistrictType, coords: Position) -> bool {
    let odd = (coords.x + coords.y).rem_euclid(2) == 1;
    match candidate {
        DistrictType::Frontier => odd,
        DistrictType::Exotic => !odd,
        _ => true,
    }
}

/// Adjacency/socket compatibility with already-collapsed neighbours. With no
/// neighbour data this always passes.
pub fn adjacency_compatible(candidate: DistrictType, neighbors: &[DistrictType]) -> bool {
    neighbors.iter().all(|n| candidate.compatible_with(*n))
}

/// Run all three checks, reporting the first failure
pub fn check<R: Rng>(
    candidate: DistrictType,
    coords: Position,
    neighbors: &[DistrictType],
    config: &SolverConfig,
    rng: &mut R,
) -> Result<(), Rejection> {
    if !spatial_compatible(candidate, coords, config, rng) {
        return Err(Rejection::Spatial);
    }
    if !polarity_compatible(candidate, coords) {
        return Err(Rejection::Polarity);
    }
    if !adjacency_compatible(candidate, neighbors) {
        return Err(Rejection::Adjacency);
    }
    Ok(())
}
