//! Single-node district solve
//!
//! Initialize candidates, propagate until one remains or the iteration
//! ceiling is hit, then force a weighted collapse. The result depends only on
//! the node, the seed and the neighbour snapshot handed in.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::state::{Candidate, DistrictType, GenerationState, NodeSolveState};
use super::validators;
use super::SolverConfig;
use crate::graph::Position;
use crate::seeds::{derive_salted, unit_f32, SeedPurpose};

/// Base weight of a type at normalized distance `d` (0 = origin, 1 = rim).
/// Near nodes lean towards Hub, far nodes towards Exotic.
fn base_weight(district_type: DistrictType, d: f32) -> f32 {
    let near = 1.0 - d;
    match district_type {
        DistrictType::Hub => 0.05 + 0.95 * near * near,
        DistrictType::Settlement => 0.3 + 0.5 * near,
        DistrictType::Frontier => 0.2 + 0.6 * d,
        DistrictType::Exotic => 0.05 + 0.95 * d * d,
    }
}

/// Pick an index from `weights` with a cumulative-sum walk. `draw` must be in
/// `[0, total)`. A draw landing exactly on a boundary goes to the candidate
/// whose weight pushes the running sum past it.
pub fn weighted_pick(weights: &[f32], draw: f32) -> Option<usize> {
    let mut acc = 0.0f32;
    for (i, w) in weights.iter().enumerate() {
        acc += w.max(0.0);
        if draw < acc {
            return Some(i);
        }
    }
    // Rounding can leave the draw a hair above the final sum
    weights.iter().rposition(|w| *w > 0.0)
}

/// Runs the collapse loop for one district node
#[derive(Debug, Clone, Copy)]
pub struct DistrictSolver<'a> {
    config: &'a SolverConfig,
}

impl<'a> DistrictSolver<'a> {
    pub fn new(config: &'a SolverConfig) -> Self {
        Self { config }
    }

    /// Solve one node. `salt` distinguishes re-solve passes.
    pub fn solve(
        &self,
        node: u32,
        coordinates: Position,
        seed: u64,
        salt: u64,
        neighbors: &[DistrictType],
    ) -> NodeSolveState {
        let mut state = NodeSolveState::new(node, coordinates);
        self.initialize(&mut state, seed);

        let mut rng = ChaCha8Rng::seed_from_u64(derive_salted(seed, node as u64, SeedPurpose::Propagation, salt));

        while !state.state.is_terminal() {
            if state.iterations >= self.config.iteration_ceiling {
                self.force_collapse(&mut state, &mut rng);
                break;
            }
            self.propagate_once(&mut state, neighbors, &mut rng);
        }

        log::debug!(
            "district {} at {} -> {:?} ({:?}, {} iterations{})",
            node,
            coordinates,
            state.resolved,
            state.state,
            state.iterations,
            if state.forced { ", forced" } else { "" }
        );
        state
    }

    /// Seed the fixed candidate set with distance-based weights plus a small
    /// jitter hashed from the node id.
    pub fn initialize(&self, state: &mut NodeSolveState, seed: u64) {
        let radius = self.config.normalization_radius.max(1.0);
        let d = (state.coordinates.length() / radius).clamp(0.0, 1.0);

        state.candidates = DistrictType::ALL
            .iter()
            .map(|&t| {
                let hash = derive_salted(seed, state.node as u64, SeedPurpose::CandidateJitter, t.type_id() as u64);
                let jitter = 1.0 + (unit_f32(hash) * 2.0 - 1.0) * self.config.initial_jitter;
                Candidate::new(t, base_weight(t, d) * jitter)
            })
            .collect();
        state.advance(GenerationState::CandidatesInitialized);
        state.record_entropy();
    }

    /// One propagation iteration: validate, decay, jitter, prune.
    pub fn propagate_once<R: Rng>(&self, state: &mut NodeSolveState, neighbors: &[DistrictType], rng: &mut R) {
        state.advance(GenerationState::InProgress);
        state.iterations += 1;

        let coords = state.coordinates;
        state
            .candidates
            .retain(|c| validators::check(c.district_type, coords, neighbors, self.config, rng).is_ok());

        if state.candidates.is_empty() {
            state.record_entropy();
            state.advance(GenerationState::Contradiction);
            return;
        }

        for c in state.candidates.iter_mut() {
            let jitter = 1.0 + rng.gen_range(-self.config.jitter..=self.config.jitter);
            c.weight = (c.weight * self.config.weight_decay * jitter).max(0.0);
        }

        // Decayed-out candidates are invalidated, but the strongest survives
        if let Some(strongest) = strongest_index(&state.candidates) {
            let keep = state.candidates[strongest].district_type;
            let floor = self.config.prune_floor;
            state
                .candidates
                .retain(|c| c.district_type == keep || c.weight >= floor);
        }

        state.record_entropy();
        if state.candidates.len() == 1 {
            let only = state.candidates[0].district_type;
            state.collapse_to(only);
        }
    }

    /// Weighted draw after the ceiling; uniform when every weight is zero
    pub fn force_collapse<R: Rng>(&self, state: &mut NodeSolveState, rng: &mut R) {
        if !self.config.allow_forced_collapse || state.candidates.is_empty() {
            state.advance(GenerationState::Failed);
            return;
        }

        let weights: Vec<f32> = state.candidates.iter().map(|c| c.weight).collect();
        let total: f32 = weights.iter().sum();
        let index = if total > 0.0 && total.is_finite() {
            let draw = rng.gen_range(0.0..total);
            weighted_pick(&weights, draw).unwrap_or(0)
        } else {
            rng.gen_range(0..state.candidates.len())
        };

        let chosen = state.candidates[index].district_type;
        state.forced = true;
        state.collapse_to(chosen);
    }
}

/// Index of the highest weight; ties go to the earliest candidate
fn strongest_index(candidates: &[Candidate]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, c) in candidates.iter().enumerate() {
        match best {
            Some(b) if candidates[b].weight >= c.weight => {}
            _ => best = Some(i),
        }
    }
    best
}
