//! # Fluigraph Core
//!
//! Core engine for realizing fluidic protocol sketches on physical machines:
//! a typed directed-graph substrate, lazy simple-path enumeration, and a
//! backtracking mapping search that assigns every sketch container and edge
//! to compatible, edge-disjoint machine resources.

pub mod engine;
pub mod fluidic;
pub mod protocol;

// Re-export commonly used types
pub use engine::errors::EngineError;
pub use engine::flow::{Flow, FlowSet};
pub use engine::graph::{DirectedGraph, Edge, GraphEdge, GraphNode, Node, NodeId};
pub use engine::mapping::MappingEngine;
pub use fluidic::container::{ContainerNode, ContainerNodeType, Movement, Role};
pub use fluidic::machine::{FlowTerminal, MachineContainer, MachineEdge, MachineGraph};
pub use fluidic::sketch::SketchGraph;
pub use protocol::ProtocolGraph;

/// Plan the mapping for one protocol run.
///
/// This is a convenience function that combines the protocol pre-pass with
/// the mapping search: it collects the sketch flows the protocol needs, then
/// solves for a complete assignment that keeps them all realizable. The
/// returned engine answers `mapped_container_id` / `mapped_edge` queries for
/// the executor.
pub fn plan_mapping<'a>(
    sketch: &'a SketchGraph,
    machine: &'a MachineGraph,
    protocol: &ProtocolGraph,
) -> Result<MappingEngine<'a>, EngineError> {
    let required = protocol::prepass::collect_required_flows(protocol, sketch)?;
    let mut engine = MappingEngine::new(sketch, machine);
    engine.start_mapping_with(&required)?;
    Ok(engine)
}
