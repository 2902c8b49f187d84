//! Spatial node graph
//!
//! Hierarchical world nodes and the traversal edges between them.

pub mod node;
pub mod connection;
pub mod spatial;

pub use node::{NodeId, NodeLevel, Position};
pub use connection::{Capabilities, Connection, ConnectionType, MIN_TRAVERSAL_COST};
pub use spatial::{GraphNode, SpatialNodeGraph};
