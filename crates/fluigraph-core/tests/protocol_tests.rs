//! End-to-end planning: protocol pre-pass feeding the mapping engine.

mod common;

use common::{continuous, dummy_injector, mapping_machine, pump, turbidostat_sketch};
use fluigraph_core::protocol::prepass::collect_required_flows;
use fluigraph_core::protocol::{CompareOp, Condition, Operation};
use fluigraph_core::{
    plan_mapping, MachineContainer, MachineGraph, NodeId, ProtocolGraph, Role, SketchGraph,
};

/// The continuous-culture protocol: load the vessel, then keep medium
/// flowing in and spent culture flowing out while the clock runs.
fn culture_protocol() -> ProtocolGraph {
    let mut protocol = ProtocolGraph::new("simpleProtocol");
    protocol
        .add_operation(0, Operation::LoadContainer {
            container: NodeId(1),
            volume: 65.0,
        })
        .unwrap();
    protocol
        .add_operation(1, Operation::Loop {
            condition: Condition::compare("time", CompareOp::LessEq, 60000.0),
        })
        .unwrap();
    protocol
        .add_operation(2, Operation::SetContinuousFlow {
            from: NodeId(1),
            to: NodeId(2),
            rate: 0.001,
        })
        .unwrap();
    protocol
        .add_operation(3, Operation::SetContinuousFlow {
            from: NodeId(2),
            to: NodeId(3),
            rate: 0.001,
        })
        .unwrap();
    protocol.add_operation(4, Operation::TimeStep).unwrap();

    protocol.connect(0, 1, Condition::Always).unwrap();
    protocol
        .connect(1, 2, Condition::compare("time", CompareOp::LessEq, 60000.0))
        .unwrap();
    protocol.connect(2, 3, Condition::Always).unwrap();
    protocol.connect(3, 4, Condition::Always).unwrap();
    protocol.connect(4, 1, Condition::Always).unwrap();
    protocol.set_start(0).unwrap();
    protocol
}

#[test]
fn culture_protocol_requires_both_stages() {
    let sketch = turbidostat_sketch();
    let required = collect_required_flows(&culture_protocol(), &sketch).unwrap();
    assert_eq!(required.len(), 2);
    assert!(required.contains_text("1->2:1->2;"));
    assert!(required.contains_text("2->3:2->3;"));
}

#[test]
fn planning_realizes_the_required_flows() {
    let sketch = turbidostat_sketch();
    let machine = mapping_machine();
    let engine = plan_mapping(&sketch, &machine, &culture_protocol()).unwrap();

    assert!(engine.is_complete());
    for edge in sketch.connections() {
        let flow = engine.mapped_edge(edge).unwrap();
        assert_eq!(flow.start(), engine.mapped_container_id(edge.source));
        assert_eq!(flow.end(), engine.mapped_container_id(edge.target));
    }
}

#[test]
fn recirculating_mix_plans_a_round_trip() {
    // vessel and buffer joined both ways so the mix can recirculate
    let mut sketch = SketchGraph::new("mixer");
    sketch
        .add_container(1, continuous(Role::Flow), 100.0)
        .unwrap();
    sketch
        .add_container(2, continuous(Role::Flow), 100.0)
        .unwrap();
    sketch.connect(1, 2).unwrap();
    sketch.connect(2, 1).unwrap();

    let mut machine = MachineGraph::new("loopRig");
    machine
        .add_container(MachineContainer::flow(3, 100.0, pump(), dummy_injector()))
        .unwrap();
    machine
        .add_container(MachineContainer::flow(4, 100.0, pump(), dummy_injector()))
        .unwrap();
    machine.connect(3, 4).unwrap();
    machine.connect(4, 3).unwrap();

    let mut protocol = ProtocolGraph::new("mixing");
    protocol
        .add_operation(0, Operation::Mix {
            container: NodeId(1),
            via: Some(NodeId(2)),
        })
        .unwrap();
    protocol.set_start(0).unwrap();

    let required = collect_required_flows(&protocol, &sketch).unwrap();
    assert_eq!(required.len(), 1);
    assert!(required.contains_text("1->1:1->2;2->1;"));

    let engine = plan_mapping(&sketch, &machine, &protocol).unwrap();
    let out = engine
        .mapped_edge(sketch.connections().next().unwrap())
        .unwrap();
    let back = engine
        .mapped_edge(sketch.connections().nth(1).unwrap())
        .unwrap();
    assert_eq!(out.end(), back.start());
    assert_eq!(back.end(), out.start());
}

#[test]
fn protocol_over_a_missing_connection_fails_fast() {
    let sketch = turbidostat_sketch();
    let machine = mapping_machine();
    let mut protocol = ProtocolGraph::new("backwards");
    protocol
        .add_operation(0, Operation::Transfer {
            from: NodeId(3),
            to: NodeId(1),
            volume: 5.0,
        })
        .unwrap();
    protocol.set_start(0).unwrap();

    assert!(plan_mapping(&sketch, &machine, &protocol).is_err());
}
