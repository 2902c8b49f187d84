//! The spatial node graph
//!
//! Holds the node hierarchy and the traversal edges between nodes. The
//! constraint solver writes resolved district types back into it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::connection::{Capabilities, Connection};
use super::node::{NodeId, NodeLevel, Position};
use crate::error::GraphError;
use crate::solver::DistrictType;

/// A node plus its resolution state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    /// Resolved district type (district nodes only)
    pub district_type: Option<DistrictType>,
    /// Designer-fixed; the solver treats it as pre-collapsed
    pub pinned: bool,
}

impl GraphNode {
    pub fn value(&self) -> u32 {
        self.id.value
    }

    pub fn level(&self) -> NodeLevel {
        self.id.level
    }
}

/// Hierarchical nodes and the edges between them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialNodeGraph {
    nodes: BTreeMap<u32, GraphNode>,
    connections: Vec<Connection>,
}

impl SpatialNodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, enforcing the hierarchy invariants: the parent exists and
    /// is exactly one level shallower, and no sibling shares the coordinates.
    pub fn add_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        if self.nodes.contains_key(&id.value) {
            return Err(GraphError::DuplicateNode(id.value));
        }

        match (id.level.parent_level(), id.parent) {
            (None, Some(_)) => return Err(GraphError::RootWithParent(id.value)),
            (None, None) => {}
            (Some(_), None) => return Err(GraphError::MissingParentRef(id.value)),
            (Some(expected), Some(parent)) => {
                let parent_node = self.nodes.get(&parent).ok_or(GraphError::MissingParent {
                    node: id.value,
                    parent,
                })?;
                if parent_node.level() != expected {
                    return Err(GraphError::LevelMismatch {
                        node: id.value,
                        level: id.level,
                        parent_level: parent_node.level(),
                    });
                }
            }
        }

        if let Some(sibling) = self
            .nodes
            .values()
            .find(|n| n.id.parent == id.parent && n.id.level == id.level && n.id.coordinates == id.coordinates)
        {
            return Err(GraphError::DuplicateCoordinates {
                node: id.value,
                sibling: sibling.value(),
                coordinates: id.coordinates,
            });
        }

        self.nodes.insert(
            id.value,
            GraphNode {
                id,
                district_type: None,
                pinned: false,
            },
        );
        Ok(())
    }

    /// Fix a district node's type ahead of solving
    pub fn pin_district(&mut self, value: u32, district_type: DistrictType) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&value).ok_or(GraphError::UnknownNode(value))?;
        if node.level() != NodeLevel::District {
            return Err(GraphError::NotADistrict(value));
        }
        node.district_type = Some(district_type);
        node.pinned = true;
        Ok(())
    }

    /// Add an edge between two existing nodes
    pub fn add_connection(&mut self, connection: Connection) -> Result<(), GraphError> {
        if connection.from == connection.to {
            return Err(GraphError::SelfConnection(connection.from));
        }
        for end in [connection.from, connection.to] {
            if !self.nodes.contains_key(&end) {
                return Err(GraphError::UnknownNode(end));
            }
        }
        self.connections.push(connection);
        Ok(())
    }

    pub fn node(&self, value: u32) -> Option<&GraphNode> {
        self.nodes.get(&value)
    }

    /// All nodes in ascending id order
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn nodes_at(&self, level: NodeLevel) -> Vec<&GraphNode> {
        self.nodes.values().filter(|n| n.level() == level).collect()
    }

    pub fn children(&self, parent: u32) -> Vec<&GraphNode> {
        self.nodes.values().filter(|n| n.id.parent == Some(parent)).collect()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connections_of(&self, value: u32) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.touches(value))
    }

    /// Ids of nodes linked to `value` by an active edge, sorted and deduplicated
    pub fn neighbors(&self, value: u32) -> Vec<u32> {
        let mut out: Vec<u32> = self
            .connections_of(value)
            .filter(|c| c.active)
            .filter_map(|c| c.other(value))
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Coordinates in world space: local coordinates summed up the ancestor
    /// chain. `None` for unknown nodes or when the sum overflows.
    pub fn absolute_coordinates(&self, value: u32) -> Option<Position> {
        let mut node = self.nodes.get(&value)?;
        let mut pos = node.id.coordinates;
        while let Some(parent) = node.id.parent {
            node = self.nodes.get(&parent)?;
            pos = pos.checked_add(node.id.coordinates)?;
        }
        Some(pos)
    }

    /// The district a node belongs to (itself if it is a district)
    pub fn district_of(&self, value: u32) -> Option<u32> {
        let mut node = self.nodes.get(&value)?;
        loop {
            match node.level() {
                NodeLevel::District => return Some(node.value()),
                NodeLevel::World | NodeLevel::Region => return None,
                _ => node = self.nodes.get(&node.id.parent?)?,
            }
        }
    }

    /// Is there an edge that lets `caps` move directly from one node to the other?
    pub fn can_traverse(&self, from: u32, to: u32, caps: Capabilities) -> bool {
        self.connections.iter().any(|c| c.permits(from, to, caps))
    }

    pub(crate) fn assign(&mut self, value: u32, district_type: DistrictType) {
        if let Some(node) = self.nodes.get_mut(&value) {
            node.district_type = Some(district_type);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ConnectionType;

    fn small_graph() -> SpatialNodeGraph {
        let mut g = SpatialNodeGraph::new();
        g.add_node(NodeId::root(0)).unwrap();
        g.add_node(NodeId::new(1, NodeLevel::Region, Some(0), Position::ORIGIN)).unwrap();
        g.add_node(NodeId::new(2, NodeLevel::District, Some(1), Position::new(5, 5))).unwrap();
        g.add_node(NodeId::new(3, NodeLevel::District, Some(1), Position::new(6, 5))).unwrap();
        g.add_node(NodeId::new(4, NodeLevel::Sector, Some(2), Position::ORIGIN)).unwrap();
        g.add_node(NodeId::new(5, NodeLevel::Room, Some(4), Position::new(1, 2))).unwrap();
        g
    }

    #[test]
    fn test_hierarchy_invariants() {
        let mut g = small_graph();
        // Room directly under a district skips a level
        let err = g
            .add_node(NodeId::new(9, NodeLevel::Room, Some(2), Position::ORIGIN))
            .unwrap_err();
        assert!(matches!(err, GraphError::LevelMismatch { .. }));

        let err = g
            .add_node(NodeId::new(9, NodeLevel::District, Some(1), Position::new(5, 5)))
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateCoordinates { sibling: 2, .. }));

        let err = g
            .add_node(NodeId::new(9, NodeLevel::District, Some(77), Position::ORIGIN))
            .unwrap_err();
        assert!(matches!(err, GraphError::MissingParent { .. }));

        assert_eq!(g.add_node(NodeId::root(0)).unwrap_err(), GraphError::DuplicateNode(0));
    }

    #[test]
    fn test_same_coordinates_under_different_parents() {
        let mut g = small_graph();
        g.add_node(NodeId::new(6, NodeLevel::Sector, Some(3), Position::ORIGIN)).unwrap();
        g.add_node(NodeId::new(7, NodeLevel::Room, Some(6), Position::new(1, 2))).unwrap();
    }

    #[test]
    fn test_absolute_coordinates_and_district() {
        let g = small_graph();
        assert_eq!(g.absolute_coordinates(5), Some(Position::new(6, 7)));
        assert_eq!(g.district_of(5), Some(2));
        assert_eq!(g.district_of(1), None);
    }

    #[test]
    fn test_absolute_coordinates_overflow() {
        let mut g = small_graph();
        g.add_node(NodeId::new(6, NodeLevel::District, Some(1), Position::new(i32::MAX, 0))).unwrap();
        g.add_node(NodeId::new(7, NodeLevel::Sector, Some(6), Position::new(1, 0))).unwrap();
        g.add_node(NodeId::new(8, NodeLevel::Sector, Some(6), Position::new(-1, 0))).unwrap();
        assert_eq!(g.absolute_coordinates(6), Some(Position::new(i32::MAX, 0)));
        assert_eq!(g.absolute_coordinates(7), None);
        assert_eq!(g.absolute_coordinates(8), Some(Position::new(i32::MAX - 1, 0)));
    }

    #[test]
    fn test_neighbors_and_traversal() {
        let mut g = small_graph();
        g.add_connection(Connection::new(2, 3, ConnectionType::Drop)).unwrap();
        assert_eq!(g.neighbors(2), vec![3]);
        assert_eq!(g.neighbors(3), vec![2]);
        assert!(g.can_traverse(2, 3, Capabilities::NONE));
        assert!(!g.can_traverse(3, 2, Capabilities::NONE));
        assert_eq!(
            g.add_connection(Connection::bidirectional(2, 99)).unwrap_err(),
            GraphError::UnknownNode(99)
        );
    }

    #[test]
    fn test_pin_requires_district() {
        let mut g = small_graph();
        assert!(g.pin_district(2, DistrictType::Hub).is_ok());
        assert!(g.node(2).unwrap().pinned);
        assert_eq!(g.pin_district(5, DistrictType::Hub).unwrap_err(), GraphError::NotADistrict(5));
    }
}
