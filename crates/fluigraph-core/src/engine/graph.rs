//! # Directed graph substrate
//!
//! Generic directed graph shared by sketches, executable machines, and
//! protocol graphs. Nodes are keyed by a stable integer id, edges by their
//! `(source, target)` pair, and both are iterated in insertion order.
//!
//! Deterministic ordering is load-bearing: serialized forms, path enumeration
//! and mapping candidate order all derive from insertion order, which is what
//! makes digest-based regression testing possible.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;

use crate::engine::errors::EngineError;

/// A unique identifier for a node within one graph.
///
/// Implements `Ord` for stable, deterministic iteration and serializes as a
/// bare number.
#[repr(transparent)]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Ord,
    PartialOrd,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        NodeId(id)
    }
}

/// Identity of an edge inside a graph: its ordered endpoint pair.
pub type EdgeKey = (NodeId, NodeId);

/// A node that can live in a [`DirectedGraph`].
pub trait GraphNode {
    fn id(&self) -> NodeId;
}

/// An edge that can live in a [`DirectedGraph`].
pub trait GraphEdge: Clone {
    fn source(&self) -> NodeId;
    fn target(&self) -> NodeId;

    /// The `(source, target)` pair identifying this edge.
    fn key(&self) -> EdgeKey {
        (self.source(), self.target())
    }
}

/// A plain node carrying nothing beyond its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub id: NodeId,
}

impl Node {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self { id: id.into() }
    }
}

impl GraphNode for Node {
    fn id(&self) -> NodeId {
        self.id
    }
}

/// A plain directed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl GraphEdge for Edge {
    fn source(&self) -> NodeId {
        self.source
    }

    fn target(&self) -> NodeId {
        self.target
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}

type IncidenceList = SmallVec<[EdgeKey; 4]>;

/// Directed graph with stable insertion-order iteration and incidence
/// indexes per node.
///
/// At most one edge per ordered `(source, target)` pair is permitted; the
/// typed layers validate the same uniqueness on their own inserts. Incidence
/// lookups distinguish an absent node (`None`) from a present node with no
/// incident edges (`Some` of an empty collection).
#[derive(Debug, Clone)]
pub struct DirectedGraph<N, E> {
    nodes: FxHashMap<NodeId, N>,
    node_order: Vec<NodeId>,
    edges: FxHashMap<EdgeKey, E>,
    edge_order: Vec<EdgeKey>,
    arriving: FxHashMap<NodeId, IncidenceList>,
    leaving: FxHashMap<NodeId, IncidenceList>,
}

impl<N, E> Default for DirectedGraph<N, E> {
    fn default() -> Self {
        Self {
            nodes: FxHashMap::default(),
            node_order: Vec::new(),
            edges: FxHashMap::default(),
            edge_order: Vec::new(),
            arriving: FxHashMap::default(),
            leaving: FxHashMap::default(),
        }
    }
}

impl<N: GraphNode, E: GraphEdge> DirectedGraph<N, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node. Fails if a node with the same id is already present.
    pub fn add_node(&mut self, node: N) -> Result<(), EngineError> {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(EngineError::InvalidGraph(format!(
                "node {id} is already present"
            )));
        }
        self.nodes.insert(id, node);
        self.node_order.push(id);
        self.arriving.insert(id, IncidenceList::new());
        self.leaving.insert(id, IncidenceList::new());
        Ok(())
    }

    /// Inserts an edge. Fails if either endpoint is missing or an edge with
    /// the same `(source, target)` pair is already present.
    pub fn add_edge(&mut self, edge: E) -> Result<(), EngineError> {
        let key = edge.key();
        let (source, target) = key;
        if !self.nodes.contains_key(&source) {
            return Err(EngineError::InvalidGraph(format!(
                "edge {source}->{target} references missing source node"
            )));
        }
        if !self.nodes.contains_key(&target) {
            return Err(EngineError::InvalidGraph(format!(
                "edge {source}->{target} references missing target node"
            )));
        }
        if self.edges.contains_key(&key) {
            return Err(EngineError::InvalidGraph(format!(
                "edge {source}->{target} is already present"
            )));
        }
        self.edges.insert(key, edge);
        self.edge_order.push(key);
        if let Some(keys) = self.leaving.get_mut(&source) {
            keys.push(key);
        }
        if let Some(keys) = self.arriving.get_mut(&target) {
            keys.push(key);
        }
        Ok(())
    }

    /// Removes a single edge and returns it. Fails if absent.
    pub fn remove_edge(
        &mut self,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Result<E, EngineError> {
        let key = (source.into(), target.into());
        let edge = self.edges.remove(&key).ok_or_else(|| {
            EngineError::InvalidGraph(format!("edge {}->{} is not present", key.0, key.1))
        })?;
        self.edge_order.retain(|k| *k != key);
        if let Some(keys) = self.leaving.get_mut(&key.0) {
            keys.retain(|k| *k != key);
        }
        if let Some(keys) = self.arriving.get_mut(&key.1) {
            keys.retain(|k| *k != key);
        }
        Ok(edge)
    }

    /// Removes a node together with every incident edge and returns it.
    /// Fails if absent. Subsequent incidence lookups for the id return
    /// `None`.
    pub fn remove_node(&mut self, id: impl Into<NodeId>) -> Result<N, EngineError> {
        let id = id.into();
        let node = self
            .nodes
            .remove(&id)
            .ok_or_else(|| EngineError::InvalidGraph(format!("node {id} is not present")))?;
        let mut incident: Vec<EdgeKey> = Vec::new();
        if let Some(keys) = self.arriving.remove(&id) {
            incident.extend(keys);
        }
        if let Some(keys) = self.leaving.remove(&id) {
            incident.extend(keys);
        }
        for key in incident {
            if self.edges.remove(&key).is_none() {
                continue; // self-loop listed in both indexes
            }
            self.edge_order.retain(|k| *k != key);
            if let Some(keys) = self.leaving.get_mut(&key.0) {
                keys.retain(|k| *k != key);
            }
            if let Some(keys) = self.arriving.get_mut(&key.1) {
                keys.retain(|k| *k != key);
            }
        }
        self.node_order.retain(|n| *n != id);
        Ok(node)
    }

    pub fn node(&self, id: impl Into<NodeId>) -> Option<&N> {
        self.nodes.get(&id.into())
    }

    pub fn contains_node(&self, id: impl Into<NodeId>) -> bool {
        self.nodes.contains_key(&id.into())
    }

    pub fn edge(&self, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Option<&E> {
        self.edges.get(&(source.into(), target.into()))
    }

    pub(crate) fn edge_mut(
        &mut self,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Option<&mut E> {
        self.edges.get_mut(&(source.into(), target.into()))
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.node_order.iter().map(|id| &self.nodes[id])
    }

    /// Node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.node_order.iter().copied()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &E> {
        self.edge_order.iter().map(|key| &self.edges[key])
    }

    /// Edge keys in insertion order.
    pub fn edge_keys(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.edge_order.iter().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges arriving at `id`, in insertion order. `None` when the node is
    /// absent, as opposed to `Some` of an empty list.
    pub fn arriving(&self, id: impl Into<NodeId>) -> Option<Vec<&E>> {
        self.arriving
            .get(&id.into())
            .map(|keys| keys.iter().map(|key| &self.edges[key]).collect())
    }

    /// Edges leaving `id`, in insertion order. `None` when the node is
    /// absent.
    pub fn leaving(&self, id: impl Into<NodeId>) -> Option<Vec<&E>> {
        self.leaving
            .get(&id.into())
            .map(|keys| keys.iter().map(|key| &self.edges[key]).collect())
    }

    /// Keys of the edges leaving `id`, in insertion order. Cheap view used by
    /// the path enumerator.
    pub(crate) fn leaving_keys(&self, id: NodeId) -> Option<&[EdgeKey]> {
        self.leaving.get(&id).map(|keys| keys.as_slice())
    }

    pub fn in_degree(&self, id: impl Into<NodeId>) -> Option<usize> {
        self.arriving.get(&id.into()).map(|keys| keys.len())
    }

    pub fn out_degree(&self, id: impl Into<NodeId>) -> Option<usize> {
        self.leaving.get(&id.into()).map(|keys| keys.len())
    }
}
