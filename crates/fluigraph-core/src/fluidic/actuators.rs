//! # Actuator descriptors and capability slots
//!
//! Actuators (pumps, valves, sensors) are shared by many container nodes, so
//! containers hold `Arc` handles to immutable descriptors rather than owning
//! devices. A descriptor carries its plugin configuration and the id of the
//! communications channel that performs the actual device I/O; command
//! delivery itself sits behind the [`CommandSink`] boundary trait and is never
//! invoked during mapping.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::engine::errors::EngineError;
use crate::engine::graph::NodeId;
use crate::fluidic::container::{CapabilityDemand, Role};

/// Reference to an externally managed command sink.
#[repr(transparent)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ChannelId(pub u32);

/// Boundary interface to device I/O (serial port, file-backed logger, ...).
///
/// Implementations live outside the core; the executor resolves a
/// [`ChannelId`] to a sink when a protocol actually runs.
pub trait CommandSink {
    /// Delivers one instruction and returns the device's reply.
    fn send_instruction(&mut self, instruction: &str) -> Result<String, EngineError>;
}

/// Immutable description of one actuator: which plugin drives it, over which
/// channel, with which parameters.
///
/// Parameters use a `BTreeMap` so serialized machines are byte-stable.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ActuatorDescriptor {
    pub communications_channel_id: ChannelId,
    pub plugin_name: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl ActuatorDescriptor {
    pub fn new(channel: ChannelId, plugin_name: impl Into<String>) -> Self {
        Self {
            communications_channel_id: channel,
            plugin_name: plugin_name.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Wraps the descriptor into a shareable handle.
    pub fn into_handle(self) -> ActuatorHandle {
        Arc::new(self)
    }
}

/// Shared, immutable actuator reference.
pub type ActuatorHandle = Arc<ActuatorDescriptor>;

/// The option-valued capability record of an executable container.
///
/// Which slots must be filled is decided by the container's role; extra
/// sensors never disqualify a node.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CapabilitySlots {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injector: Option<ActuatorHandle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extractor: Option<ActuatorHandle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub od_sensor: Option<ActuatorHandle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixer: Option<ActuatorHandle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<ActuatorHandle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<ActuatorHandle>,
    #[serde(default)]
    pub control_valves: Vec<ActuatorHandle>,
}

impl CapabilitySlots {
    pub fn satisfies(&self, demand: &CapabilityDemand) -> bool {
        (!demand.injector || self.injector.is_some())
            && (!demand.extractor || self.extractor.is_some())
            && self.control_valves.len() >= demand.min_controls
    }

    /// Validates that the filled slots cover `role`'s demand.
    pub(crate) fn validate_for_role(&self, id: NodeId, role: Role) -> Result<(), EngineError> {
        let demand = role.demand();
        if demand.injector && self.injector.is_none() {
            return Err(EngineError::InvalidGraph(format!(
                "container {id} with role {} is missing an injector",
                role.as_str()
            )));
        }
        if demand.extractor && self.extractor.is_none() {
            return Err(EngineError::InvalidGraph(format!(
                "container {id} with role {} is missing an extractor",
                role.as_str()
            )));
        }
        if self.control_valves.len() < demand.min_controls {
            return Err(EngineError::InvalidGraph(format!(
                "container {id} with role {} needs at least {} control valve(s), has {}",
                role.as_str(),
                demand.min_controls,
                self.control_valves.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(plugin: &str) -> ActuatorHandle {
        ActuatorDescriptor::new(ChannelId(1), plugin).into_handle()
    }

    #[test]
    fn descriptor_parameters_are_ordered() {
        let descriptor = ActuatorDescriptor::new(ChannelId(3), "EvoprogV2Pump")
            .with_parameter("direction", "0")
            .with_parameter("address", "7");
        let json = serde_json::to_string(&descriptor).unwrap();
        // BTreeMap keeps keys sorted regardless of insertion order
        assert!(json.find("address").unwrap() < json.find("direction").unwrap());
    }

    #[test]
    fn satisfies_checks_every_slot() {
        let mut slots = CapabilitySlots {
            injector: Some(handle("dummy")),
            extractor: Some(handle("pump")),
            ..Default::default()
        };
        assert!(slots.satisfies(&Role::Flow.demand()));
        assert!(!slots.satisfies(&Role::BidirectionalSwitch.demand()));

        slots.control_valves.push(handle("valve"));
        slots.control_valves.push(handle("valve"));
        assert!(slots.satisfies(&Role::BidirectionalSwitch.demand()));
    }

    #[test]
    fn validation_names_the_missing_slot() {
        let slots = CapabilitySlots::default();
        let err = slots
            .validate_for_role(NodeId(6), Role::BidirectionalSwitch)
            .unwrap_err();
        assert!(err.to_string().contains("injector"));
    }

    #[test]
    fn shared_handles_point_at_one_descriptor() {
        let shared = handle("Evoprog4WayValve");
        let a = Arc::clone(&shared);
        let b = Arc::clone(&shared);
        assert!(Arc::ptr_eq(&a, &b));
    }
}
