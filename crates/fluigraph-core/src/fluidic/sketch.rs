//! Abstract fluidic sketches.
//!
//! A sketch is the graph a protocol is written against: logical containers
//! with `(movement, role)` types connected by plain directed edges. It knows
//! nothing about pumps or valves; realizing it on hardware is the mapping
//! engine's job.

use crate::engine::errors::EngineError;
use crate::engine::graph::{DirectedGraph, Edge, NodeId};
use crate::fluidic::container::{ContainerNode, ContainerNodeType};

/// The abstract container graph a protocol manipulates.
#[derive(Debug, Clone, Default)]
pub struct SketchGraph {
    name: String,
    graph: DirectedGraph<ContainerNode, Edge>,
}

impl SketchGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graph: DirectedGraph::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a logical container. Fails on a duplicate id.
    pub fn add_container(
        &mut self,
        id: impl Into<NodeId>,
        kind: ContainerNodeType,
        capacity: f64,
    ) -> Result<(), EngineError> {
        self.graph
            .add_node(ContainerNode::new(id.into(), kind, capacity))
    }

    /// Connects two containers with a directed edge. Fails if either is
    /// missing or the edge already exists.
    pub fn connect(
        &mut self,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Result<(), EngineError> {
        self.graph.add_edge(Edge::new(source.into(), target.into()))
    }

    pub fn container(&self, id: impl Into<NodeId>) -> Option<&ContainerNode> {
        self.graph.node(id)
    }

    /// Containers in insertion order.
    pub fn containers(&self) -> impl Iterator<Item = &ContainerNode> {
        self.graph.nodes()
    }

    /// Connections in insertion order.
    pub fn connections(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edges()
    }

    pub fn container_count(&self) -> usize {
        self.graph.node_count()
    }

    pub(crate) fn graph(&self) -> &DirectedGraph<ContainerNode, Edge> {
        &self.graph
    }
}
