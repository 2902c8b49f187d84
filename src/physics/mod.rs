//! Movement physics
//!
//! Movement profiles and the jump-arc reachability validator used by every
//! generator and by the post-generation validation pass.

pub mod movement;
pub mod reachability;

pub use movement::MovementProfile;
pub use reachability::{PhysicsConfig, ReachabilityValidator, Spacing};
