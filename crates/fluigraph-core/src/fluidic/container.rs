//! # Container typing
//!
//! Containers carry a `(movement, role)` type tag. The role family is a small
//! fixed set modeled as a tagged variant with companion capability data — the
//! role/requirement tables below are data, not an inheritance hierarchy.

use std::fmt;

use crate::engine::graph::{GraphNode, NodeId};

/// How fluid moves through a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Movement {
    Continuous,
    Discrete,
    /// Wildcard: matches any movement.
    Irrelevant,
}

impl Movement {
    pub fn as_str(self) -> &'static str {
        match self {
            Movement::Continuous => "continuous",
            Movement::Discrete => "discrete",
            Movement::Irrelevant => "irrelevant",
        }
    }

    /// Componentwise match with `Irrelevant` as a wildcard on either side.
    pub fn matches(self, other: Movement) -> bool {
        self == Movement::Irrelevant || other == Movement::Irrelevant || self == other
    }
}

/// The fluidic role a container plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Inlet,
    Flow,
    Sink,
    ConvergentSwitch,
    DivergentSwitch,
    BidirectionalSwitch,
    ConvergentSwitchInlet,
    DivergentSwitchSink,
    Unknown,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Inlet => "inlet",
            Role::Flow => "flow",
            Role::Sink => "sink",
            Role::ConvergentSwitch => "convergent_switch",
            Role::DivergentSwitch => "divergent_switch",
            Role::BidirectionalSwitch => "bidirectional_switch",
            Role::ConvergentSwitchInlet => "convergent_switch_inlet",
            Role::DivergentSwitchSink => "divergent_switch_sink",
            Role::Unknown => "unknown",
        }
    }

    /// Machine roles a sketch container of this role may be assigned to.
    ///
    /// A sketch role is acceptable on a machine node whose role is the same
    /// or a strictly more capable junction; a bidirectional switch can stand
    /// in for anything.
    pub fn admissible_machine_roles(self) -> &'static [Role] {
        use Role::*;
        match self {
            Inlet => &[Inlet, ConvergentSwitchInlet, BidirectionalSwitch],
            Sink => &[Sink, DivergentSwitchSink, BidirectionalSwitch],
            Flow => &[Flow, BidirectionalSwitch],
            ConvergentSwitch => &[ConvergentSwitch, BidirectionalSwitch, ConvergentSwitchInlet],
            DivergentSwitch => &[DivergentSwitch, BidirectionalSwitch, DivergentSwitchSink],
            BidirectionalSwitch => &[BidirectionalSwitch],
            ConvergentSwitchInlet => &[ConvergentSwitchInlet, BidirectionalSwitch],
            DivergentSwitchSink => &[DivergentSwitchSink, BidirectionalSwitch],
            Unknown => &[],
        }
    }

    /// Actuators a container must carry to play this role.
    pub fn demand(self) -> CapabilityDemand {
        use Role::*;
        match self {
            Inlet => CapabilityDemand::new(false, true, 0),
            Sink => CapabilityDemand::new(true, false, 0),
            Flow => CapabilityDemand::new(true, true, 0),
            ConvergentSwitch => CapabilityDemand::new(true, false, 1),
            DivergentSwitch => CapabilityDemand::new(false, true, 1),
            BidirectionalSwitch => CapabilityDemand::new(true, true, 2),
            ConvergentSwitchInlet => CapabilityDemand::new(true, true, 1),
            DivergentSwitchSink => CapabilityDemand::new(true, true, 1),
            Unknown => CapabilityDemand::new(false, false, 0),
        }
    }

    /// Ordering weight for the mapping engine: roles with fewer admissible
    /// machine roles bind earlier.
    pub(crate) fn specificity(self) -> u8 {
        use Role::*;
        match self {
            BidirectionalSwitch => 5,
            ConvergentSwitchInlet | DivergentSwitchSink => 4,
            ConvergentSwitch | DivergentSwitch => 3,
            Flow => 2,
            Inlet | Sink => 1,
            Unknown => 0,
        }
    }
}

/// The actuator set a role requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityDemand {
    pub injector: bool,
    pub extractor: bool,
    pub min_controls: usize,
}

impl CapabilityDemand {
    const fn new(injector: bool, extractor: bool, min_controls: usize) -> Self {
        Self {
            injector,
            extractor,
            min_controls,
        }
    }
}

/// A container type: movement paired with role. Equality is componentwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ContainerNodeType {
    pub movement: Movement,
    pub role: Role,
}

impl ContainerNodeType {
    pub const fn new(movement: Movement, role: Role) -> Self {
        Self { movement, role }
    }
}

impl fmt::Display for ContainerNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.movement.as_str(), self.role.as_str())
    }
}

/// An abstract sketch container: id, type, capacity. Immutable once built.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ContainerNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: ContainerNodeType,
    pub capacity: f64,
}

impl ContainerNode {
    pub fn new(id: impl Into<NodeId>, kind: ContainerNodeType, capacity: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            capacity,
        }
    }
}

impl GraphNode for ContainerNode {
    fn id(&self) -> NodeId {
        self.id
    }
}
