//! # Sketch-to-machine mapping
//!
//! Backtracking assignment of each sketch container to a distinct machine
//! container and of each sketch edge to a machine flow, such that node types
//! are compatible, capability demands are met, chosen flows are pairwise
//! edge-disjoint, and conditional-edge predicates hold. The engine snapshots
//! used-edge sets rather than mutating the graphs, so both inputs stay
//! immutable for the whole search.
//!
//! The search is deterministic: sketch nodes bind most-constrained-first
//! (role specificity, then degree, ties by ascending id), machine candidates
//! are tried in ascending id order, and the first feasible flow returned by
//! the path enumerator wins.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::engine::assembly::assemble_flow;
use crate::engine::graph::GraphNode;
use crate::engine::errors::EngineError;
use crate::engine::flow::{Flow, FlowSet};
use crate::engine::graph::{Edge, EdgeKey, GraphEdge, NodeId};
use crate::fluidic::container::ContainerNode;
use crate::fluidic::machine::{MachineContainer, MachineEdge, MachineGraph};
use crate::fluidic::sketch::SketchGraph;

/// Checks a flow's conditional predicates against its own edge sequence.
fn respects_predecessors(flow: &Flow<MachineEdge>) -> bool {
    let mut previous: Option<EdgeKey> = None;
    for edge in flow.edges() {
        if !edge.allows_after(previous) {
            return false;
        }
        previous = Some(edge.key());
    }
    true
}

/// Backtracking solver binding one sketch onto one machine.
///
/// A solved engine keeps its assignment until the next `start_mapping` call;
/// a failed or interrupted search leaves no partial state behind.
pub struct MappingEngine<'a> {
    sketch: &'a SketchGraph,
    machine: &'a MachineGraph,
    node_map: FxHashMap<NodeId, NodeId>,
    image: FxHashSet<NodeId>,
    edge_flows: FxHashMap<EdgeKey, Flow<MachineEdge>>,
    used: FxHashSet<EdgeKey>,
    cancel: Option<&'a AtomicBool>,
    deadline: Option<Instant>,
    solved: bool,
}

impl<'a> MappingEngine<'a> {
    pub fn new(sketch: &'a SketchGraph, machine: &'a MachineGraph) -> Self {
        Self {
            sketch,
            machine,
            node_map: FxHashMap::default(),
            image: FxHashSet::default(),
            edge_flows: FxHashMap::default(),
            used: FxHashSet::default(),
            cancel: None,
            deadline: None,
            solved: false,
        }
    }

    /// Installs a cooperative cancellation flag, consulted between node
    /// choices.
    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Installs a wall-clock budget, consulted between node choices.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Searches for a complete mapping with no protocol-required flows.
    pub fn start_mapping(&mut self) -> Result<(), EngineError> {
        self.start_mapping_with(&FlowSet::new())
    }

    /// Searches for a complete mapping that additionally keeps every flow in
    /// `required` realizable.
    pub fn start_mapping_with(&mut self, required: &FlowSet) -> Result<(), EngineError> {
        self.reset();
        self.precheck()?;
        let order = self.search_order();
        tracing::debug!(
            sketch = self.sketch.name(),
            machine = self.machine.name(),
            nodes = order.len(),
            required = required.len(),
            "mapping search started"
        );
        if self.solve(&order, 0, required)? {
            self.solved = true;
            Ok(())
        } else {
            self.reset();
            Err(EngineError::Infeasible)
        }
    }

    /// The machine container a sketch container was assigned to.
    pub fn mapped_container_id(&self, sketch_id: impl Into<NodeId>) -> Option<NodeId> {
        self.node_map.get(&sketch_id.into()).copied()
    }

    /// The machine flow a sketch edge was assigned to.
    pub fn mapped_edge(&self, edge: &Edge) -> Option<&Flow<MachineEdge>> {
        self.edge_flows.get(&edge.key())
    }

    pub fn is_complete(&self) -> bool {
        self.solved
    }

    fn reset(&mut self) {
        self.node_map.clear();
        self.image.clear();
        self.edge_flows.clear();
        self.used.clear();
        self.solved = false;
    }

    /// Rejects sketches no search could ever place: any sketch container
    /// without a single compatible machine container.
    fn precheck(&self) -> Result<(), EngineError> {
        for container in self.sketch.containers() {
            let any = self
                .machine
                .containers()
                .any(|candidate| self.compatible(container, candidate));
            if !any {
                return Err(EngineError::IncompatibleSketch(format!(
                    "container {} ({}) has no compatible machine container",
                    container.id, container.kind
                )));
            }
        }
        Ok(())
    }

    /// Sketch node ids, most constrained first: role specificity descending,
    /// then total degree descending, ties by ascending id.
    fn search_order(&self) -> Vec<NodeId> {
        let graph = self.sketch.graph();
        let mut ids: Vec<NodeId> = graph.node_ids().collect();
        let degree = |id: NodeId| -> usize {
            graph.in_degree(id).unwrap_or(0) + graph.out_degree(id).unwrap_or(0)
        };
        let specificity = |id: NodeId| -> u8 {
            graph
                .node(id)
                .map(|n| n.kind.role.specificity())
                .unwrap_or(0)
        };
        ids.sort_by(|&a, &b| {
            specificity(b)
                .cmp(&specificity(a))
                .then(degree(b).cmp(&degree(a)))
                .then(a.cmp(&b))
        });
        ids
    }

    fn compatible(&self, sketch: &ContainerNode, machine: &MachineContainer) -> bool {
        let machine_kind = machine.kind();
        if !sketch
            .kind
            .role
            .admissible_machine_roles()
            .contains(&machine_kind.role)
        {
            return false;
        }
        if !sketch.kind.movement.matches(machine_kind.movement) {
            return false;
        }
        if !machine.slots().satisfies(&sketch.kind.role.demand()) {
            return false;
        }
        let sketch_graph = self.sketch.graph();
        let machine_graph = self.machine.graph();
        let s_in = sketch_graph.in_degree(sketch.id).unwrap_or(0);
        let s_out = sketch_graph.out_degree(sketch.id).unwrap_or(0);
        let m_in = machine_graph.in_degree(machine.id()).unwrap_or(0);
        let m_out = machine_graph.out_degree(machine.id()).unwrap_or(0);
        s_in <= m_in && s_out <= m_out
    }

    fn check_budget(&self) -> Result<(), EngineError> {
        if let Some(flag) = self.cancel {
            if flag.load(Ordering::Relaxed) {
                return Err(EngineError::Cancelled);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(EngineError::Timeout);
            }
        }
        Ok(())
    }

    fn solve(
        &mut self,
        order: &[NodeId],
        index: usize,
        required: &FlowSet,
    ) -> Result<bool, EngineError> {
        self.check_budget()?;
        let Some(&sketch_id) = order.get(index) else {
            return Ok(self.check_required(required));
        };
        let sketch_node = self.sketch.graph().node(sketch_id).cloned().ok_or_else(|| {
            EngineError::InvalidGraph(format!("sketch container {sketch_id} vanished mid-search"))
        })?;

        let mut candidates: Vec<NodeId> = self
            .machine
            .containers()
            .filter(|candidate| {
                !self.image.contains(&candidate.id()) && self.compatible(&sketch_node, candidate)
            })
            .map(|candidate| candidate.id())
            .collect();
        candidates.sort_unstable();

        for machine_id in candidates {
            tracing::debug!(sketch = %sketch_id, machine = %machine_id, "binding container");
            self.node_map.insert(sketch_id, machine_id);
            self.image.insert(machine_id);

            match self.resolve_pending_edges() {
                Some(resolved) => {
                    match self.solve(order, index + 1, required) {
                        Ok(true) => return Ok(true),
                        Ok(false) => {}
                        Err(interrupt) => {
                            self.unwind(sketch_id, machine_id, &resolved);
                            return Err(interrupt);
                        }
                    }
                    self.unwind(sketch_id, machine_id, &resolved);
                }
                None => {
                    self.node_map.remove(&sketch_id);
                    self.image.remove(&machine_id);
                }
            }
            tracing::debug!(sketch = %sketch_id, machine = %machine_id, "backtracking");
        }
        Ok(false)
    }

    /// Finds machine flows for every sketch edge whose endpoints are now both
    /// mapped. Returns the newly resolved sketch edges, or `None` when some
    /// edge has no feasible flow (in which case nothing is kept).
    fn resolve_pending_edges(&mut self) -> Option<Vec<EdgeKey>> {
        let pending: Vec<EdgeKey> = self
            .sketch
            .graph()
            .edge_keys()
            .filter(|key| !self.edge_flows.contains_key(key))
            .filter(|(u, v)| self.node_map.contains_key(u) && self.node_map.contains_key(v))
            .collect();

        let mut resolved: Vec<EdgeKey> = Vec::with_capacity(pending.len());
        for key in pending {
            let from = self.node_map[&key.0];
            let to = self.node_map[&key.1];
            match self.find_flow(from, to) {
                Some(flow) => {
                    for edge in flow.edges() {
                        self.used.insert(edge.key());
                    }
                    self.edge_flows.insert(key, flow);
                    resolved.push(key);
                }
                None => {
                    for key in &resolved {
                        self.discard_flow(key);
                    }
                    return None;
                }
            }
        }
        Some(resolved)
    }

    /// First machine flow from `from` to `to` that avoids every used edge
    /// and satisfies each conditional predicate along its own sequence.
    fn find_flow(&self, from: NodeId, to: NodeId) -> Option<Flow<MachineEdge>> {
        self.machine.flows(from, to).find(|flow| {
            flow.edges()
                .iter()
                .all(|edge| !self.used.contains(&edge.key()))
                && respects_predecessors(flow)
        })
    }

    fn discard_flow(&mut self, key: &EdgeKey) {
        if let Some(flow) = self.edge_flows.remove(key) {
            for edge in flow.edges() {
                self.used.remove(&edge.key());
            }
        }
    }

    fn unwind(&mut self, sketch_id: NodeId, machine_id: NodeId, resolved: &[EdgeKey]) {
        for key in resolved {
            self.discard_flow(key);
        }
        self.node_map.remove(&sketch_id);
        self.image.remove(&machine_id);
    }

    /// Verifies that every required sketch flow is realizable from the
    /// per-edge machine flows chosen by the search.
    fn check_required(&self, required: &FlowSet) -> bool {
        required.iter().all(|flow| self.realize_required(flow).is_some())
    }

    /// Concatenates the machine flows of a required sketch flow's edges, in
    /// order, falling back to bag reassembly when concatenation does not
    /// chain, and re-checks conditional predicates across the seams.
    fn realize_required(&self, sketch_flow: &Flow<Edge>) -> Option<Flow<MachineEdge>> {
        let mut parts: Vec<&Flow<MachineEdge>> = Vec::with_capacity(sketch_flow.len());
        for edge in sketch_flow.edges() {
            parts.push(self.edge_flows.get(&edge.key())?);
        }
        let mut combined = Flow::new();
        let mut chained = true;
        for part in &parts {
            if combined.append_flow((*part).clone()).is_err() {
                chained = false;
                break;
            }
        }
        if !chained {
            let bag: Vec<MachineEdge> = parts
                .iter()
                .flat_map(|part| part.edges().iter().cloned())
                .collect();
            combined = assemble_flow(&bag).ok()?;
        }
        respects_predecessors(&combined).then_some(combined)
    }
}
