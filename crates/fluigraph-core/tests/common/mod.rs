//! Shared fixtures: the seven-node mapping rig and the sketches exercised
//! against it.
#![allow(dead_code)]

use fluigraph_core::fluidic::actuators::{ActuatorDescriptor, ActuatorHandle, ChannelId};
use fluigraph_core::{
    ContainerNodeType, MachineContainer, MachineGraph, Movement, Role, SketchGraph,
};

pub fn control_valve() -> ActuatorHandle {
    ActuatorDescriptor::new(ChannelId(1), "Evoprog4WayValve")
        .with_parameter("address", "46")
        .with_parameter("closePos", "0")
        .into_handle()
}

pub fn pump() -> ActuatorHandle {
    ActuatorDescriptor::new(ChannelId(1), "EvoprogV2Pump")
        .with_parameter("address", "7")
        .with_parameter("direction", "0")
        .into_handle()
}

pub fn dummy_injector() -> ActuatorHandle {
    ActuatorDescriptor::new(ChannelId(1), "EvoprogDummyInjector").into_handle()
}

pub fn od_sensor() -> ActuatorHandle {
    ActuatorDescriptor::new(ChannelId(1), "EvoprogOdSensor")
        .with_parameter("pinNumber", "14")
        .into_handle()
}

/// The seven-container rig every mapping scenario runs against: two plain
/// inlets, a divergent switch sink, a flow container, a convergent switch
/// inlet, a bidirectional switch carrying the optical density sensor, and a
/// convergent switch.
pub fn mapping_machine() -> MachineGraph {
    let control = control_valve();
    let extractor = pump();
    let injector = dummy_injector();

    let mut machine = MachineGraph::new("mappingMachine");
    machine
        .add_container(MachineContainer::inlet(1, 100.0, extractor.clone()))
        .unwrap();
    machine
        .add_container(MachineContainer::divergent_switch_sink(
            2,
            100.0,
            injector.clone(),
            extractor.clone(),
            control.clone(),
        ))
        .unwrap();
    machine
        .add_container(MachineContainer::flow(
            3,
            100.0,
            extractor.clone(),
            injector.clone(),
        ))
        .unwrap();
    machine
        .add_container(MachineContainer::inlet(4, 100.0, extractor.clone()))
        .unwrap();
    machine
        .add_container(MachineContainer::convergent_switch_inlet(
            5,
            100.0,
            injector.clone(),
            extractor.clone(),
            control.clone(),
        ))
        .unwrap();
    machine
        .add_container(
            MachineContainer::bidirectional_switch(
                6,
                100.0,
                extractor.clone(),
                injector.clone(),
                control.clone(),
                control.clone(),
            )
            .with_od_sensor(od_sensor()),
        )
        .unwrap();
    machine
        .add_container(MachineContainer::convergent_switch(
            7,
            100.0,
            injector.clone(),
            control.clone(),
        ))
        .unwrap();

    machine.connect(1, 5).unwrap();
    machine.connect(2, 5).unwrap();
    machine.connect(3, 6).unwrap();
    machine.connect(4, 6).unwrap();
    machine.connect(5, 7).unwrap();
    machine.connect(6, 7).unwrap();
    machine.connect(6, 2).unwrap();
    machine.connect(2, 3).unwrap();
    machine
}

pub fn continuous(role: Role) -> ContainerNodeType {
    ContainerNodeType::new(Movement::Continuous, role)
}

pub fn irrelevant(role: Role) -> ContainerNodeType {
    ContainerNodeType::new(Movement::Irrelevant, role)
}

/// Inlet feeding a culture vessel draining into a sink.
pub fn turbidostat_sketch() -> SketchGraph {
    let mut sketch = SketchGraph::new("sketchTurbidostat");
    sketch
        .add_container(1, continuous(Role::Inlet), 100.0)
        .unwrap();
    sketch
        .add_container(2, continuous(Role::Flow), 100.0)
        .unwrap();
    sketch
        .add_container(3, irrelevant(Role::Sink), 100.0)
        .unwrap();
    sketch.connect(1, 2).unwrap();
    sketch.connect(2, 3).unwrap();
    sketch
}

/// Seven containers using every junction role the rig offers.
pub fn complex_sketch() -> SketchGraph {
    let mut sketch = SketchGraph::new("sketchComplex");
    sketch
        .add_container(1, continuous(Role::Inlet), 100.0)
        .unwrap();
    sketch
        .add_container(2, continuous(Role::DivergentSwitchSink), 100.0)
        .unwrap();
    sketch
        .add_container(3, continuous(Role::Flow), 100.0)
        .unwrap();
    sketch
        .add_container(4, continuous(Role::Inlet), 100.0)
        .unwrap();
    sketch
        .add_container(5, continuous(Role::ConvergentSwitchInlet), 100.0)
        .unwrap();
    sketch
        .add_container(6, continuous(Role::BidirectionalSwitch), 100.0)
        .unwrap();
    sketch
        .add_container(7, irrelevant(Role::ConvergentSwitch), 100.0)
        .unwrap();

    sketch.connect(1, 5).unwrap();
    sketch.connect(5, 7).unwrap();
    sketch.connect(2, 5).unwrap();
    sketch.connect(2, 3).unwrap();
    sketch.connect(6, 2).unwrap();
    sketch.connect(6, 7).unwrap();
    sketch.connect(3, 6).unwrap();
    sketch.connect(4, 6).unwrap();
    sketch
}

/// The complex sketch plus one inlet too many for the rig.
pub fn impossible_sketch() -> SketchGraph {
    let mut sketch = complex_sketch();
    sketch
        .add_container(8, continuous(Role::Inlet), 100.0)
        .unwrap();
    sketch.connect(8, 6).unwrap();
    sketch
}
