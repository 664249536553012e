//! The mapping engine and its graph substrate.
//!
//! This module provides:
//! - **errors**: Error types for construction and search failures
//! - **graph**: Generic directed graph with stable insertion-order iteration
//! - **flow**: Contiguous edge sequences and their canonical text form
//! - **path_iter**: Lazy enumeration of simple directed paths
//! - **assembly**: Reassembly of an unordered edge bag into one flow
//! - **mapping**: Backtracking assignment of sketches onto machines

pub mod assembly;
pub mod errors;
pub mod flow;
pub mod graph;
pub mod mapping;
pub mod path_iter;
