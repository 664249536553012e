//! Typed fluidic graphs: containers, capabilities, sketches, and machines.
//!
//! This module provides:
//! - **container**: `(movement, role)` container types and capability demands
//! - **actuators**: shared actuator descriptors and the command-sink boundary
//! - **sketch**: the abstract container graph protocols are written against
//! - **machine**: the executable machine graph with conditional tubing edges
//! - **persist**: the stable JSON and line-dump forms

pub mod actuators;
pub mod container;
pub mod machine;
pub mod persist;
pub mod sketch;
