//! Solver state types
//!
//! District types, weighted candidates and the per-node generation state
//! machine.

use serde::{Deserialize, Serialize};

use crate::graph::Position;

/// Resolved type of a district node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DistrictType {
    /// Central crossroads, save rooms and shops
    Hub,
    Settlement,
    Frontier,
    /// Far-flung, strange regions
    Exotic,
}

impl DistrictType {
    pub const ALL: [DistrictType; 4] = [
        DistrictType::Hub,
        DistrictType::Settlement,
        DistrictType::Frontier,
        DistrictType::Exotic,
    ];

    pub fn type_id(self) -> u8 {
        self as u8
    }

    /// Socket compatibility between two neighbouring districts. Symmetric.
    pub fn compatible_with(self, other: DistrictType) -> bool {
        use DistrictType::*;
        !matches!(
            (self, other),
            (Hub, Hub) | (Hub, Exotic) | (Exotic, Hub) | (Settlement, Exotic) | (Exotic, Settlement)
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            DistrictType::Hub => "Hub",
            DistrictType::Settlement => "Settlement",
            DistrictType::Frontier => "Frontier",
            DistrictType::Exotic => "Exotic",
        }
    }
}

/// A possible type for a node and how strongly it is favoured
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub district_type: DistrictType,
    /// Never negative
    pub weight: f32,
}

impl Candidate {
    pub fn new(district_type: DistrictType, weight: f32) -> Self {
        Self {
            district_type,
            weight: weight.max(0.0),
        }
    }
}

/// Lifecycle of a district node during solving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenerationState {
    Uninitialized,
    CandidatesInitialized,
    InProgress,
    Collapsed,
    Contradiction,
    Failed,
}

impl GenerationState {
    /// Transitions only move forward; `InProgress` may repeat.
    pub fn can_transition_to(self, next: GenerationState) -> bool {
        use GenerationState::*;
        matches!(
            (self, next),
            (Uninitialized, CandidatesInitialized)
                | (CandidatesInitialized, InProgress)
                | (CandidatesInitialized, Collapsed)
                | (CandidatesInitialized, Contradiction)
                | (CandidatesInitialized, Failed)
                | (InProgress, InProgress)
                | (InProgress, Collapsed)
                | (InProgress, Contradiction)
                | (InProgress, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GenerationState::Collapsed | GenerationState::Contradiction | GenerationState::Failed
        )
    }
}

/// Everything the solver knows about one district node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSolveState {
    pub node: u32,
    /// Absolute world coordinates
    pub coordinates: Position,
    pub state: GenerationState,
    pub candidates: Vec<Candidate>,
    pub iterations: u32,
    /// Entropy after initialization and after every propagation iteration
    pub entropy_trace: Vec<usize>,
    pub resolved: Option<DistrictType>,
    /// Resolved by the weighted draw after hitting the iteration ceiling
    pub forced: bool,
}

impl NodeSolveState {
    pub fn new(node: u32, coordinates: Position) -> Self {
        Self {
            node,
            coordinates,
            state: GenerationState::Uninitialized,
            candidates: Vec::new(),
            iterations: 0,
            entropy_trace: Vec::new(),
            resolved: None,
            forced: false,
        }
    }

    /// Number of remaining candidates
    pub fn entropy(&self) -> usize {
        self.candidates.len()
    }

    pub(crate) fn advance(&mut self, next: GenerationState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {:?} for node {}",
            self.state,
            next,
            self.node
        );
        self.state = next;
    }

    pub(crate) fn record_entropy(&mut self) {
        self.entropy_trace.push(self.candidates.len());
    }

    /// Settle on `district_type` and drop the rest
    pub(crate) fn collapse_to(&mut self, district_type: DistrictType) {
        self.candidates.retain(|c| c.district_type == district_type);
        self.resolved = Some(district_type);
        self.advance(GenerationState::Collapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compatibility_is_symmetric() {
        for a in DistrictType::ALL {
            for b in DistrictType::ALL {
                assert_eq!(a.compatible_with(b), b.compatible_with(a));
            }
        }
        assert!(!DistrictType::Hub.compatible_with(DistrictType::Hub));
        assert!(DistrictType::Frontier.compatible_with(DistrictType::Exotic));
    }

    #[test]
    fn test_forward_transitions() {
        use GenerationState::*;
        assert!(Uninitialized.can_transition_to(CandidatesInitialized));
        assert!(InProgress.can_transition_to(InProgress));
        assert!(!Collapsed.can_transition_to(InProgress));
        assert!(!InProgress.can_transition_to(Uninitialized));
        assert!(!Failed.can_transition_to(Collapsed));
        assert!(Collapsed.is_terminal());
    }

    #[test]
    fn test_candidate_weight_floor() {
        assert_eq!(Candidate::new(DistrictType::Hub, -1.0).weight, 0.0);
    }
}
