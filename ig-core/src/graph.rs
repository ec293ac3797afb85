//! The mutable node/edge attribute store.
//!
//! `GraphStore` is the single source of truth for the engine: renderers
//! and interaction code hold only identifiers and read or write through
//! it. Nodes and edges live in [`IndexMap`]s, so iteration order is
//! insertion order; callers that need a tie-break (nearest-neighbour
//! search) rely on that ordering being stable.

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use crate::attributes::{EdgeAttributes, NodeAttributes};

/// Opaque node identifier, stable for the node's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// An edge is identified by its ordered endpoint pair. `(a, b)` and
/// `(b, a)` are distinct edges; self-loops are permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub source: NodeId,
    pub target: NodeId,
}

impl EdgeKey {
    #[must_use]
    pub const fn new(source: NodeId, target: NodeId) -> Self {
        Self { source, target }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("no node with id `{0}`")]
    UnknownNode(NodeId),
    #[error("no edge `{0}`")]
    UnknownEdge(EdgeKey),
    #[error("node `{0}` already exists")]
    DuplicateNode(NodeId),
    #[error("edge `{0}` already exists")]
    DuplicateEdge(EdgeKey),
}

#[derive(Default)]
pub struct GraphStore {
    nodes: IndexMap<NodeId, NodeAttributes>,
    edges: IndexMap<EdgeKey, EdgeAttributes>,
    next_id: u64,
}

impl GraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a fresh identifier, never reused within this store.
    pub fn fresh_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn add_node(&mut self, id: NodeId, attrs: NodeAttributes) -> Result<(), StoreError> {
        // Keep the fresh-id counter ahead of externally supplied ids.
        self.next_id = self.next_id.max(id.0 + 1);
        if self.nodes.contains_key(&id) {
            return Err(StoreError::DuplicateNode(id));
        }
        self.nodes.insert(id, attrs);
        Ok(())
    }

    /// Removes a node and every edge incident to it, so the store can
    /// never hold an edge with a missing endpoint.
    pub fn remove_node(&mut self, id: NodeId) -> Result<NodeAttributes, StoreError> {
        let attrs = self
            .nodes
            .shift_remove(&id)
            .ok_or(StoreError::UnknownNode(id))?;
        let before = self.edges.len();
        self.edges.retain(|key, _| key.source != id && key.target != id);
        debug!("removed node {id} and {} incident edges", before - self.edges.len());
        Ok(attrs)
    }

    #[must_use]
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Result<&NodeAttributes, StoreError> {
        self.nodes.get(&id).ok_or(StoreError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeAttributes, StoreError> {
        self.nodes.get_mut(&id).ok_or(StoreError::UnknownNode(id))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &NodeAttributes)> {
        self.nodes.iter().map(|(id, attrs)| (*id, attrs))
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Fails if either endpoint is missing: edges may never dangle.
    pub fn add_edge(&mut self, key: EdgeKey, attrs: EdgeAttributes) -> Result<(), StoreError> {
        if !self.nodes.contains_key(&key.source) {
            return Err(StoreError::UnknownNode(key.source));
        }
        if !self.nodes.contains_key(&key.target) {
            return Err(StoreError::UnknownNode(key.target));
        }
        if self.edges.contains_key(&key) {
            return Err(StoreError::DuplicateEdge(key));
        }
        self.edges.insert(key, attrs);
        Ok(())
    }

    pub fn remove_edge(&mut self, key: EdgeKey) -> Result<EdgeAttributes, StoreError> {
        self.edges
            .shift_remove(&key)
            .ok_or(StoreError::UnknownEdge(key))
    }

    pub fn edge(&self, key: EdgeKey) -> Result<&EdgeAttributes, StoreError> {
        self.edges.get(&key).ok_or(StoreError::UnknownEdge(key))
    }

    pub fn edge_mut(&mut self, key: EdgeKey) -> Result<&mut EdgeAttributes, StoreError> {
        self.edges.get_mut(&key).ok_or(StoreError::UnknownEdge(key))
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, &EdgeAttributes)> {
        self.edges.iter().map(|(key, attrs)| (*key, attrs))
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_nodes(count: usize) -> (GraphStore, Vec<NodeId>) {
        let mut store = GraphStore::new();
        let ids = (0..count)
            .map(|i| {
                let id = store.fresh_node_id();
                store
                    .add_node(id, NodeAttributes::at(i as f32, 0.0))
                    .unwrap();
                id
            })
            .collect();
        (store, ids)
    }

    #[test]
    fn fresh_ids_are_unique() {
        let mut store = GraphStore::new();
        let a = store.fresh_node_id();
        let b = store.fresh_node_id();
        assert_ne!(a, b);
    }

    #[test]
    fn add_node_rejects_duplicates() {
        let (mut store, ids) = store_with_nodes(1);
        assert_eq!(
            store.add_node(ids[0], NodeAttributes::default()),
            Err(StoreError::DuplicateNode(ids[0]))
        );
    }

    #[test]
    fn edges_require_existing_endpoints() {
        let (mut store, ids) = store_with_nodes(1);
        let ghost = NodeId(999);
        assert_eq!(
            store.add_edge(EdgeKey::new(ids[0], ghost), EdgeAttributes::default()),
            Err(StoreError::UnknownNode(ghost))
        );
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn removing_a_node_removes_incident_edges() {
        let (mut store, ids) = store_with_nodes(3);
        store
            .add_edge(EdgeKey::new(ids[0], ids[1]), EdgeAttributes::default())
            .unwrap();
        store
            .add_edge(EdgeKey::new(ids[1], ids[2]), EdgeAttributes::default())
            .unwrap();
        store
            .add_edge(EdgeKey::new(ids[2], ids[0]), EdgeAttributes::default())
            .unwrap();

        store.remove_node(ids[1]).unwrap();

        assert!(!store.contains_node(ids[1]));
        assert_eq!(store.edge_count(), 1);
        assert!(store.edge(EdgeKey::new(ids[2], ids[0])).is_ok());
    }

    #[test]
    fn removing_an_unknown_node_fails() {
        let mut store = GraphStore::new();
        let id = store.fresh_node_id();
        assert_eq!(store.remove_node(id), Err(StoreError::UnknownNode(id)));
    }

    #[test]
    fn iteration_order_is_insertion_order() {
        let (mut store, ids) = store_with_nodes(4);
        store.remove_node(ids[1]).unwrap();
        let id = store.fresh_node_id();
        store.add_node(id, NodeAttributes::default()).unwrap();

        let order: Vec<_> = store.node_ids().collect();
        assert_eq!(order, vec![ids[0], ids[2], ids[3], id]);
    }

    #[test]
    fn attribute_writes_are_visible_to_reads() {
        let (mut store, ids) = store_with_nodes(1);
        store.node_mut(ids[0]).unwrap().highlighted = true;
        assert!(store.node(ids[0]).unwrap().highlighted);
        store.node_mut(ids[0]).unwrap().highlighted = false;
        assert!(!store.node(ids[0]).unwrap().highlighted);
    }

    #[test]
    fn self_loops_are_allowed() {
        let (mut store, ids) = store_with_nodes(1);
        store
            .add_edge(EdgeKey::new(ids[0], ids[0]), EdgeAttributes::default())
            .unwrap();
        assert_eq!(store.edge_count(), 1);
    }
}
