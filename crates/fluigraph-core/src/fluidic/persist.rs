//! Stable persisted forms for sketches and machines.
//!
//! Two formats, both with insertion-order output so a fixed builder sequence
//! serializes to identical bytes on every run:
//!
//! - a JSON document `{name, containers, connections}`, the interchange form;
//! - a line-oriented dump (`name`, then `N <id> <type>` and `E <src> <tgt>`
//!   lines), the cheap fingerprinting form for regression tests.
//!
//! Loading rebuilds the graph through the ordinary builders, so every
//! structural and capability rule is re-validated on the way in.

use serde::{Deserialize, Serialize};

use crate::engine::errors::EngineError;
use crate::engine::graph::{Edge, GraphEdge, GraphNode, NodeId};
use crate::fluidic::actuators::CapabilitySlots;
use crate::fluidic::container::ContainerNodeType;
use crate::fluidic::machine::{MachineContainer, MachineGraph};
use crate::fluidic::sketch::SketchGraph;

#[derive(Debug, Serialize, Deserialize)]
struct ContainerDoc {
    id: NodeId,
    #[serde(rename = "type")]
    kind: ContainerNodeType,
    capacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    capabilities: Option<CapabilitySlots>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ConnectionDoc {
    source: NodeId,
    target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    allowed: Option<Vec<Edge>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GraphDoc {
    name: String,
    containers: Vec<ContainerDoc>,
    connections: Vec<ConnectionDoc>,
}

fn malformed(err: serde_json::Error) -> EngineError {
    EngineError::InvalidGraph(format!("malformed document: {err}"))
}

/// Serializes a sketch to its JSON document.
pub fn sketch_to_json(sketch: &SketchGraph) -> Result<String, EngineError> {
    let doc = GraphDoc {
        name: sketch.name().to_string(),
        containers: sketch
            .containers()
            .map(|container| ContainerDoc {
                id: container.id,
                kind: container.kind,
                capacity: container.capacity,
                capabilities: None,
            })
            .collect(),
        connections: sketch
            .connections()
            .map(|edge| ConnectionDoc {
                source: edge.source,
                target: edge.target,
                allowed: None,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&doc).map_err(malformed)
}

/// Rebuilds a sketch from its JSON document.
pub fn sketch_from_json(json: &str) -> Result<SketchGraph, EngineError> {
    let doc: GraphDoc = serde_json::from_str(json).map_err(malformed)?;
    let mut sketch = SketchGraph::new(doc.name);
    for container in doc.containers {
        if container.capabilities.is_some() {
            return Err(EngineError::InvalidGraph(format!(
                "sketch container {} must not carry capabilities",
                container.id
            )));
        }
        sketch.add_container(container.id, container.kind, container.capacity)?;
    }
    for connection in doc.connections {
        if connection.allowed.is_some() {
            return Err(EngineError::InvalidGraph(format!(
                "sketch connection {}->{} must not carry an allowed set",
                connection.source, connection.target
            )));
        }
        sketch.connect(connection.source, connection.target)?;
    }
    Ok(sketch)
}

/// Serializes an executable machine to its JSON document.
pub fn machine_to_json(machine: &MachineGraph) -> Result<String, EngineError> {
    let doc = GraphDoc {
        name: machine.name().to_string(),
        containers: machine
            .containers()
            .map(|container| ContainerDoc {
                id: container.id(),
                kind: container.kind(),
                capacity: container.capacity(),
                capabilities: Some(container.slots().clone()),
            })
            .collect(),
        connections: machine
            .connections()
            .map(|edge| {
                let allowed = edge.allowed_predecessors();
                ConnectionDoc {
                    source: edge.source(),
                    target: edge.target(),
                    allowed: (!allowed.is_empty()).then(|| {
                        allowed
                            .iter()
                            .map(|&(source, target)| Edge::new(source, target))
                            .collect()
                    }),
                }
            })
            .collect(),
    };
    serde_json::to_string_pretty(&doc).map_err(malformed)
}

/// Rebuilds an executable machine from its JSON document.
///
/// Plain connections are inserted first and allowed sets installed second, so
/// a conditional connection may reference any connection in the document
/// regardless of order.
pub fn machine_from_json(json: &str) -> Result<MachineGraph, EngineError> {
    let doc: GraphDoc = serde_json::from_str(json).map_err(malformed)?;
    let mut machine = MachineGraph::new(doc.name);
    for container in doc.containers {
        let Some(slots) = container.capabilities else {
            return Err(EngineError::InvalidGraph(format!(
                "machine container {} is missing its capabilities",
                container.id
            )));
        };
        machine.add_container(MachineContainer::from_parts(
            container.id,
            container.kind,
            container.capacity,
            slots,
        )?)?;
    }
    for connection in &doc.connections {
        machine.connect(connection.source, connection.target)?;
    }
    for connection in &doc.connections {
        if let Some(allowed) = &connection.allowed {
            let pairs: Vec<(u32, u32)> = allowed
                .iter()
                .map(|edge| (edge.source.0, edge.target.0))
                .collect();
            machine.restrict(connection.source, connection.target, &pairs)?;
        }
    }
    Ok(machine)
}

/// Line-oriented dump of a sketch, for fingerprinting.
pub fn sketch_dump(sketch: &SketchGraph) -> String {
    let mut out = String::from(sketch.name());
    out.push('\n');
    for container in sketch.containers() {
        out.push_str(&format!("N {} {}\n", container.id, container.kind));
    }
    for edge in sketch.connections() {
        out.push_str(&format!("E {} {}\n", edge.source, edge.target));
    }
    out
}

/// Line-oriented dump of a machine, for fingerprinting.
pub fn machine_dump(machine: &MachineGraph) -> String {
    let mut out = String::from(machine.name());
    out.push('\n');
    for container in machine.containers() {
        out.push_str(&format!("N {} {}\n", container.id(), container.kind()));
    }
    for edge in machine.connections() {
        out.push_str(&format!("E {} {}\n", edge.source(), edge.target()));
    }
    out
}
