//! Required-flow extraction.
//!
//! Before mapping, the protocol graph is scanned for every operation that
//! moves fluid between sketch containers; the union of the sketch flows those
//! operations need is handed to the mapping engine, which guarantees they all
//! stay realizable at once. Both sides of a conditional branch contribute —
//! whichever way a run goes, its flows must exist.

use rustc_hash::FxHashSet;

use crate::engine::errors::EngineError;
use crate::engine::flow::{Flow, FlowSet};
use crate::engine::graph::{Edge, GraphEdge, NodeId};
use crate::fluidic::container::Role;
use crate::fluidic::sketch::SketchGraph;
use crate::protocol::{Operation, ProtocolGraph};

/// Collects the sketch flows the protocol exercises at run time.
///
/// Walks operations from the start node (falling back to every operation in
/// insertion order when no start is set), visiting successors in edge
/// insertion order. The result is de-duplicated by canonical flow text. An
/// operation naming a connection the sketch does not have is an error.
pub fn collect_required_flows(
    protocol: &ProtocolGraph,
    sketch: &SketchGraph,
) -> Result<FlowSet, EngineError> {
    let mut required = FlowSet::new();
    for id in walk_order(protocol) {
        let Some(node) = protocol.operation(id) else {
            continue;
        };
        match node.op() {
            Operation::SetContinuousFlow { from, to, .. }
            | Operation::Transfer { from, to, .. } => {
                required.insert(single_edge_flow(sketch, *from, *to)?);
            }
            Operation::Mix {
                container,
                via: Some(via),
            } => {
                let mut recirculation = single_edge_flow(sketch, *container, *via)?;
                recirculation.append_flow(single_edge_flow(sketch, *via, *container)?)?;
                required.insert(recirculation);
            }
            Operation::LoadContainer { container, .. } => {
                for edge in upstream_inlet_edges(sketch, *container) {
                    required.insert(Flow::from_edges([edge])?);
                }
            }
            _ => {}
        }
    }
    tracing::debug!(
        protocol = protocol.name(),
        flows = required.len(),
        "required flows collected"
    );
    Ok(required)
}

/// Operation visit order: depth-first from the start node, successors in
/// insertion order; without a start node, every operation in insertion order.
fn walk_order(protocol: &ProtocolGraph) -> Vec<NodeId> {
    let graph = protocol.graph();
    let Some(start) = protocol.start() else {
        return graph.node_ids().collect();
    };
    let mut order = Vec::with_capacity(graph.node_count());
    let mut seen = FxHashSet::default();
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        order.push(id);
        if let Some(leaving) = graph.leaving(id) {
            // reversed so the first-inserted successor is visited first
            for edge in leaving.iter().rev() {
                stack.push(edge.target());
            }
        }
    }
    order
}

fn single_edge_flow(
    sketch: &SketchGraph,
    from: NodeId,
    to: NodeId,
) -> Result<Flow<Edge>, EngineError> {
    let Some(edge) = sketch.graph().edge(from, to) else {
        return Err(EngineError::InvalidGraph(format!(
            "protocol moves fluid over missing sketch connection {from}->{to}"
        )));
    };
    Flow::from_edges([*edge])
}

/// Edges feeding `container` from an inlet-role upstream container.
fn upstream_inlet_edges(sketch: &SketchGraph, container: NodeId) -> Vec<Edge> {
    let Some(arriving) = sketch.graph().arriving(container) else {
        return Vec::new();
    };
    arriving
        .into_iter()
        .filter(|edge| {
            sketch
                .container(edge.source())
                .map(|upstream| {
                    matches!(
                        upstream.kind.role,
                        Role::Inlet | Role::ConvergentSwitchInlet
                    )
                })
                .unwrap_or(false)
        })
        .copied()
        .collect()
}
