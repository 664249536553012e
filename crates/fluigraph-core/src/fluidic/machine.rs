//! # Executable machine graphs
//!
//! The machine graph describes real hardware: containers with actuator
//! capability slots, connected by tubing edges that may carry a
//! conditional-traversal predicate (`allowed_predecessors`). Machine graphs
//! are explicitly cyclic — bidirectional switches create loops — and path
//! enumeration stays finite through the enumerator's visited set.

use crate::engine::errors::EngineError;
use crate::engine::graph::{DirectedGraph, EdgeKey, GraphEdge, GraphNode, NodeId};
use crate::engine::path_iter::PathIter;
use crate::fluidic::actuators::{ActuatorHandle, CapabilitySlots};
use crate::fluidic::container::{ContainerNodeType, Movement, Role};

/// A physical container with its actuator slots.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineContainer {
    id: NodeId,
    kind: ContainerNodeType,
    capacity: f64,
    slots: CapabilitySlots,
}

impl MachineContainer {
    fn with_role(id: impl Into<NodeId>, role: Role, capacity: f64, slots: CapabilitySlots) -> Self {
        Self {
            id: id.into(),
            kind: ContainerNodeType::new(Movement::Continuous, role),
            capacity,
            slots,
        }
    }

    pub fn inlet(id: impl Into<NodeId>, capacity: f64, extractor: ActuatorHandle) -> Self {
        Self::with_role(
            id,
            Role::Inlet,
            capacity,
            CapabilitySlots {
                extractor: Some(extractor),
                ..Default::default()
            },
        )
    }

    pub fn sink(id: impl Into<NodeId>, capacity: f64, injector: ActuatorHandle) -> Self {
        Self::with_role(
            id,
            Role::Sink,
            capacity,
            CapabilitySlots {
                injector: Some(injector),
                ..Default::default()
            },
        )
    }

    pub fn flow(
        id: impl Into<NodeId>,
        capacity: f64,
        extractor: ActuatorHandle,
        injector: ActuatorHandle,
    ) -> Self {
        Self::with_role(
            id,
            Role::Flow,
            capacity,
            CapabilitySlots {
                injector: Some(injector),
                extractor: Some(extractor),
                ..Default::default()
            },
        )
    }

    pub fn convergent_switch(
        id: impl Into<NodeId>,
        capacity: f64,
        injector: ActuatorHandle,
        control: ActuatorHandle,
    ) -> Self {
        Self::with_role(
            id,
            Role::ConvergentSwitch,
            capacity,
            CapabilitySlots {
                injector: Some(injector),
                control_valves: vec![control],
                ..Default::default()
            },
        )
    }

    pub fn divergent_switch(
        id: impl Into<NodeId>,
        capacity: f64,
        extractor: ActuatorHandle,
        control: ActuatorHandle,
    ) -> Self {
        Self::with_role(
            id,
            Role::DivergentSwitch,
            capacity,
            CapabilitySlots {
                extractor: Some(extractor),
                control_valves: vec![control],
                ..Default::default()
            },
        )
    }

    pub fn bidirectional_switch(
        id: impl Into<NodeId>,
        capacity: f64,
        extractor: ActuatorHandle,
        injector: ActuatorHandle,
        control_a: ActuatorHandle,
        control_b: ActuatorHandle,
    ) -> Self {
        Self::with_role(
            id,
            Role::BidirectionalSwitch,
            capacity,
            CapabilitySlots {
                injector: Some(injector),
                extractor: Some(extractor),
                control_valves: vec![control_a, control_b],
                ..Default::default()
            },
        )
    }

    pub fn convergent_switch_inlet(
        id: impl Into<NodeId>,
        capacity: f64,
        injector: ActuatorHandle,
        extractor: ActuatorHandle,
        control: ActuatorHandle,
    ) -> Self {
        Self::with_role(
            id,
            Role::ConvergentSwitchInlet,
            capacity,
            CapabilitySlots {
                injector: Some(injector),
                extractor: Some(extractor),
                control_valves: vec![control],
                ..Default::default()
            },
        )
    }

    pub fn divergent_switch_sink(
        id: impl Into<NodeId>,
        capacity: f64,
        injector: ActuatorHandle,
        extractor: ActuatorHandle,
        control: ActuatorHandle,
    ) -> Self {
        Self::with_role(
            id,
            Role::DivergentSwitchSink,
            capacity,
            CapabilitySlots {
                injector: Some(injector),
                extractor: Some(extractor),
                control_valves: vec![control],
                ..Default::default()
            },
        )
    }

    /// Rebuilds a container from its persisted parts, revalidating the
    /// role/slot contract.
    pub fn from_parts(
        id: impl Into<NodeId>,
        kind: ContainerNodeType,
        capacity: f64,
        slots: CapabilitySlots,
    ) -> Result<Self, EngineError> {
        let id = id.into();
        slots.validate_for_role(id, kind.role)?;
        Ok(Self {
            id,
            kind,
            capacity,
            slots,
        })
    }

    pub fn with_movement(mut self, movement: Movement) -> Self {
        self.kind.movement = movement;
        self
    }

    pub fn with_od_sensor(mut self, sensor: ActuatorHandle) -> Self {
        self.slots.od_sensor = Some(sensor);
        self
    }

    pub fn with_mixer(mut self, mixer: ActuatorHandle) -> Self {
        self.slots.mixer = Some(mixer);
        self
    }

    pub fn with_temperature(mut self, temperature: ActuatorHandle) -> Self {
        self.slots.temperature = Some(temperature);
        self
    }

    pub fn with_light(mut self, light: ActuatorHandle) -> Self {
        self.slots.light = Some(light);
        self
    }

    pub fn kind(&self) -> ContainerNodeType {
        self.kind
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn slots(&self) -> &CapabilitySlots {
        &self.slots
    }

    /// Whether this container can stand in for the given abstract type:
    /// movement must be compatible and the filled slots must cover the
    /// role's demand. This is the relation behind type-predicate path
    /// endpoints ("any inlet" means anything that can extract).
    pub fn can_serve_as(&self, kind: &ContainerNodeType) -> bool {
        self.kind.movement.matches(kind.movement) && self.slots.satisfies(&kind.role.demand())
    }
}

impl GraphNode for MachineContainer {
    fn id(&self) -> NodeId {
        self.id
    }
}

/// A tubing connection, possibly guarded by an allowed-predecessor set.
///
/// An empty set means the edge is unrestricted. A non-empty set permits the
/// edge inside a flow only when the flow's immediately preceding edge is a
/// member; in particular such an edge can never open a flow.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineEdge {
    source: NodeId,
    target: NodeId,
    allowed: Vec<EdgeKey>,
}

impl MachineEdge {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            allowed: Vec::new(),
        }
    }

    pub fn allowed_predecessors(&self) -> &[EdgeKey] {
        &self.allowed
    }

    pub fn is_conditional(&self) -> bool {
        !self.allowed.is_empty()
    }

    /// Whether a flow may traverse this edge right after `previous`.
    pub fn allows_after(&self, previous: Option<EdgeKey>) -> bool {
        if self.allowed.is_empty() {
            return true;
        }
        previous.is_some_and(|prev| self.allowed.contains(&prev))
    }
}

impl GraphEdge for MachineEdge {
    fn source(&self) -> NodeId {
        self.source
    }

    fn target(&self) -> NodeId {
        self.target
    }
}

/// One endpoint of a path enumeration: a concrete container or a container
/// type standing for every container that can serve as it.
#[derive(Debug, Clone, Copy)]
pub enum FlowTerminal {
    Container(NodeId),
    Kind(ContainerNodeType),
}

impl From<NodeId> for FlowTerminal {
    fn from(id: NodeId) -> Self {
        FlowTerminal::Container(id)
    }
}

impl From<u32> for FlowTerminal {
    fn from(id: u32) -> Self {
        FlowTerminal::Container(NodeId(id))
    }
}

impl From<ContainerNodeType> for FlowTerminal {
    fn from(kind: ContainerNodeType) -> Self {
        FlowTerminal::Kind(kind)
    }
}

/// The executable machine: physical containers plus their tubing topology.
#[derive(Debug, Clone, Default)]
pub struct MachineGraph {
    name: String,
    graph: DirectedGraph<MachineContainer, MachineEdge>,
}

impl MachineGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graph: DirectedGraph::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a container after validating its role/slot contract.
    pub fn add_container(&mut self, container: MachineContainer) -> Result<(), EngineError> {
        container
            .slots
            .validate_for_role(container.id, container.kind.role)?;
        self.graph.add_node(container)
    }

    /// Connects two containers with an unrestricted edge.
    pub fn connect(
        &mut self,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Result<(), EngineError> {
        self.graph
            .add_edge(MachineEdge::new(source.into(), target.into()))
    }

    /// Connects two containers with a conditional edge whose traversal
    /// requires one of `allowed` as the preceding edge. Every allowed edge
    /// must already exist, and the edge may not allow itself; a rejected
    /// allowed set leaves the graph untouched.
    pub fn connect_conditional(
        &mut self,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        allowed: &[(u32, u32)],
    ) -> Result<(), EngineError> {
        let (source, target) = (source.into(), target.into());
        self.validated_keys(source, target, allowed)?;
        self.connect(source, target)?;
        self.restrict(source, target, allowed)
    }

    /// Installs an allowed-predecessor set on an existing edge.
    pub(crate) fn restrict(
        &mut self,
        source: NodeId,
        target: NodeId,
        allowed: &[(u32, u32)],
    ) -> Result<(), EngineError> {
        let keys = self.validated_keys(source, target, allowed)?;
        let Some(edge) = self.graph.edge_mut(source, target) else {
            return Err(EngineError::InvalidGraph(format!(
                "edge {source}->{target} is not present"
            )));
        };
        edge.allowed = keys;
        Ok(())
    }

    fn validated_keys(
        &self,
        source: NodeId,
        target: NodeId,
        allowed: &[(u32, u32)],
    ) -> Result<Vec<EdgeKey>, EngineError> {
        let mut keys: Vec<EdgeKey> = Vec::with_capacity(allowed.len());
        for &(a, b) in allowed {
            let key = (NodeId(a), NodeId(b));
            if key == (source, target) {
                return Err(EngineError::InvalidGraph(format!(
                    "conditional edge {source}->{target} cannot allow itself"
                )));
            }
            if self.graph.edge(key.0, key.1).is_none() {
                return Err(EngineError::InvalidGraph(format!(
                    "conditional edge {source}->{target} allows unknown edge {a}->{b}"
                )));
            }
            keys.push(key);
        }
        Ok(keys)
    }

    pub fn container(&self, id: impl Into<NodeId>) -> Option<&MachineContainer> {
        self.graph.node(id)
    }

    /// Containers in insertion order.
    pub fn containers(&self) -> impl Iterator<Item = &MachineContainer> {
        self.graph.nodes()
    }

    /// Connections in insertion order.
    pub fn connections(&self) -> impl Iterator<Item = &MachineEdge> {
        self.graph.edges()
    }

    pub fn edge(
        &self,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Option<&MachineEdge> {
        self.graph.edge(source, target)
    }

    pub fn container_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Lazy enumeration of simple flows between two terminals. A type
    /// terminal stands for every container that can serve as it, visited in
    /// ascending id order.
    pub fn flows(
        &self,
        from: impl Into<FlowTerminal>,
        to: impl Into<FlowTerminal>,
    ) -> PathIter<'_, MachineContainer, MachineEdge> {
        let sources = match from.into() {
            FlowTerminal::Container(id) => vec![id],
            FlowTerminal::Kind(kind) => self.containers_serving(kind),
        };
        match to.into() {
            FlowTerminal::Container(id) => PathIter::many_to_node(&self.graph, sources, id),
            FlowTerminal::Kind(kind) => {
                PathIter::many_to_matching(&self.graph, sources, move |node: &MachineContainer| {
                    node.can_serve_as(&kind)
                })
            }
        }
    }

    /// Ids of containers able to serve as `kind`, ascending.
    fn containers_serving(&self, kind: ContainerNodeType) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .graph
            .nodes()
            .filter(|node| node.can_serve_as(&kind))
            .map(|node| node.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub(crate) fn graph(&self) -> &DirectedGraph<MachineContainer, MachineEdge> {
        &self.graph
    }
}
