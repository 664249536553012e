//! # Protocol operation graphs
//!
//! In-memory form of a protocol: operation nodes connected by guarded edges,
//! reusing the directed-graph substrate. Parsing external protocol dialects
//! into this form is a collaborator's job; the core only walks the graph to
//! learn which sketch flows the protocol will exercise at run time
//! ([`prepass`]).

pub mod prepass;

use crate::engine::errors::EngineError;
use crate::engine::graph::{DirectedGraph, GraphEdge, GraphNode, NodeId};

/// Comparison operators usable in guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Equal,
    NotEqual,
}

/// Guard on a protocol edge: either always taken, or a comparison against a
/// protocol variable.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Condition {
    Always,
    Compare {
        variable: String,
        op: CompareOp,
        value: f64,
    },
}

impl Condition {
    pub fn compare(variable: impl Into<String>, op: CompareOp, value: f64) -> Self {
        Condition::Compare {
            variable: variable.into(),
            op,
            value,
        }
    }
}

/// One protocol step. Container ids refer to sketch containers.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Fill a container from whatever feeds it upstream.
    LoadContainer { container: NodeId, volume: f64 },
    /// Establish a continuous flow between two containers.
    SetContinuousFlow { from: NodeId, to: NodeId, rate: f64 },
    /// Move a bounded volume between two containers.
    Transfer { from: NodeId, to: NodeId, volume: f64 },
    /// Mix a container's contents; recirculating through `via` when the
    /// hardware has no dedicated mixer.
    Mix {
        container: NodeId,
        via: Option<NodeId>,
    },
    /// Read the optical density sensor of a container.
    MeasureOd { container: NodeId },
    ApplyTemperature { container: NodeId, degrees: f64 },
    ApplyLight { container: NodeId, intensity: f64 },
    /// Advance protocol time by one step.
    TimeStep,
    /// Bind a protocol variable.
    Assign { variable: String, value: f64 },
    /// Loop while the condition holds.
    Loop { condition: Condition },
    /// Two-way conditional branch.
    Branch { condition: Condition },
}

/// An operation node in the protocol graph.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationNode {
    id: NodeId,
    op: Operation,
}

impl OperationNode {
    pub fn op(&self) -> &Operation {
        &self.op
    }
}

impl GraphNode for OperationNode {
    fn id(&self) -> NodeId {
        self.id
    }
}

/// A guarded transition between two operations.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolEdge {
    source: NodeId,
    target: NodeId,
    guard: Condition,
}

impl ProtocolEdge {
    pub fn guard(&self) -> &Condition {
        &self.guard
    }
}

impl GraphEdge for ProtocolEdge {
    fn source(&self) -> NodeId {
        self.source
    }

    fn target(&self) -> NodeId {
        self.target
    }
}

/// The protocol: operations wired into a control-flow graph.
#[derive(Debug, Clone, Default)]
pub struct ProtocolGraph {
    name: String,
    graph: DirectedGraph<OperationNode, ProtocolEdge>,
    start: Option<NodeId>,
}

impl ProtocolGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graph: DirectedGraph::new(),
            start: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds an operation under the given id. Fails on duplicates.
    pub fn add_operation(
        &mut self,
        id: impl Into<NodeId>,
        op: Operation,
    ) -> Result<(), EngineError> {
        self.graph.add_node(OperationNode { id: id.into(), op })
    }

    /// Wires one operation to the next under a guard.
    pub fn connect(
        &mut self,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        guard: Condition,
    ) -> Result<(), EngineError> {
        self.graph.add_edge(ProtocolEdge {
            source: source.into(),
            target: target.into(),
            guard,
        })
    }

    /// Marks the entry operation. Fails if absent.
    pub fn set_start(&mut self, id: impl Into<NodeId>) -> Result<(), EngineError> {
        let id = id.into();
        if !self.graph.contains_node(id) {
            return Err(EngineError::InvalidGraph(format!(
                "start operation {id} is not present"
            )));
        }
        self.start = Some(id);
        Ok(())
    }

    pub fn start(&self) -> Option<NodeId> {
        self.start
    }

    pub fn operation(&self, id: impl Into<NodeId>) -> Option<&OperationNode> {
        self.graph.node(id)
    }

    /// Operations in insertion order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationNode> {
        self.graph.nodes()
    }

    pub(crate) fn graph(&self) -> &DirectedGraph<OperationNode, ProtocolEdge> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_validates_wiring() {
        let mut protocol = ProtocolGraph::new("demo");
        protocol
            .add_operation(0, Operation::LoadContainer {
                container: NodeId(1),
                volume: 65.0,
            })
            .unwrap();
        protocol.add_operation(1, Operation::TimeStep).unwrap();
        protocol.connect(0, 1, Condition::Always).unwrap();

        assert!(protocol.connect(0, 9, Condition::Always).is_err());
        assert!(protocol.set_start(9).is_err());
        protocol.set_start(0).unwrap();
        assert_eq!(protocol.start(), Some(NodeId(0)));
        assert_eq!(protocol.operations().count(), 2);
    }
}
