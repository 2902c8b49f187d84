//! District constraint solver
//!
//! Wave-function-collapse style resolution of district node types. Each node
//! starts with a small weighted candidate set that validators whittle down
//! until a single type remains.

pub mod state;
pub mod validators;
pub mod district;
pub mod batch;

pub use state::{Candidate, DistrictType, GenerationState, NodeSolveState};
pub use district::{weighted_pick, DistrictSolver};
pub use batch::{solve_district_graph, ResolvedGraph};

use serde::{Deserialize, Serialize};

/// Solver tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Propagation iterations before a forced weighted collapse
    pub iteration_ceiling: u32,
    /// Multiplier applied to surviving weights every iteration
    pub weight_decay: f32,
    /// Bounded multiplicative jitter per iteration (0.05 = +/-5%)
    pub jitter: f32,
    /// Jitter on the initial weights, hashed from the node id
    pub initial_jitter: f32,
    /// Candidates decayed below this weight are invalidated
    pub prune_floor: f32,
    /// Distance mapped to 1.0 when normalizing for initial weights
    pub normalization_radius: f32,
    /// Beyond this distance hubs become increasingly rare
    pub hub_radius: f32,
    /// Exotic districts never appear closer than this
    pub exotic_min_radius: f32,
    /// When false, hitting the ceiling marks the node Failed
    pub allow_forced_collapse: bool,
    /// Solve passes used to settle stale neighbour conflicts
    pub max_passes: u32,
    /// Nodes per parallel work chunk
    pub chunk_size: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iteration_ceiling: 100,
            weight_decay: 0.9,
            jitter: 0.05,
            initial_jitter: 0.05,
            prune_floor: 0.05,
            normalization_radius: 30.0,
            hub_radius: 12.0,
            exotic_min_radius: 8.0,
            allow_forced_collapse: true,
            max_passes: 3,
            chunk_size: 16,
        }
    }
}
