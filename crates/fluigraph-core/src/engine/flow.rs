//! # Flows
//!
//! A flow is an ordered sequence of directed edges in which each edge starts
//! where the previous one ended. Flows carry their start and end node ids and
//! render to a canonical text form that doubles as their stable identity for
//! de-duplication and tests.

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashSet;

use crate::engine::errors::EngineError;
use crate::engine::graph::{Edge, GraphEdge, NodeId};

/// A contiguous sequence of directed edges.
///
/// The empty flow is permitted transiently during construction; appends keep
/// the sequence contiguous. Simplicity (no repeated vertex) is not enforced
/// here — the path enumerator is responsible for producing simple flows, and
/// reassembled protocol flows such as recirculation loops may legitimately
/// revisit their start.
#[derive(Debug, Clone, PartialEq)]
pub struct Flow<E> {
    edges: Vec<E>,
    start: Option<NodeId>,
    end: Option<NodeId>,
}

impl<E> Default for Flow<E> {
    fn default() -> Self {
        Self {
            edges: Vec::new(),
            start: None,
            end: None,
        }
    }
}

impl<E: GraphEdge> Flow<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a flow from an already contiguous edge sequence.
    pub fn from_edges(edges: impl IntoIterator<Item = E>) -> Result<Self, EngineError> {
        let mut flow = Self::new();
        for edge in edges {
            flow.append_edge(edge)?;
        }
        Ok(flow)
    }

    /// Internal constructor for callers that guarantee contiguity.
    pub(crate) fn from_contiguous(edges: Vec<E>) -> Self {
        let start = edges.first().map(|e| e.source());
        let end = edges.last().map(|e| e.target());
        Self { edges, start, end }
    }

    /// Appends one edge. Fails unless the flow is empty or the edge starts at
    /// the current end.
    pub fn append_edge(&mut self, edge: E) -> Result<(), EngineError> {
        match self.end {
            Some(end) if edge.source() != end => {
                return Err(EngineError::InvalidGraph(format!(
                    "edge {}->{} does not continue a flow ending at {}",
                    edge.source(),
                    edge.target(),
                    end
                )));
            }
            Some(_) => {}
            None => self.start = Some(edge.source()),
        }
        self.end = Some(edge.target());
        self.edges.push(edge);
        Ok(())
    }

    /// Appends a whole flow. Fails unless this flow ends where `other`
    /// starts (either side may be empty).
    pub fn append_flow(&mut self, other: Flow<E>) -> Result<(), EngineError> {
        let (Some(end), Some(other_start)) = (self.end, other.start) else {
            if self.edges.is_empty() {
                *self = other;
            }
            return Ok(());
        };
        if end != other_start {
            return Err(EngineError::InvalidGraph(format!(
                "flow ending at {end} cannot continue with a flow starting at {other_start}"
            )));
        }
        self.edges.extend(other.edges);
        self.end = other.end;
        Ok(())
    }

    /// Whether `id` occurs anywhere along the flow, endpoints included.
    pub fn contains_vertex(&self, id: impl Into<NodeId>) -> bool {
        let id = id.into();
        self.start == Some(id) || self.edges.iter().any(|e| e.target() == id)
    }

    pub fn edges(&self) -> &[E] {
        &self.edges
    }

    pub fn start(&self) -> Option<NodeId> {
        self.start
    }

    pub fn end(&self) -> Option<NodeId> {
        self.end
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Canonical text form: `"<start>-><end>:s1->t1;s2->t2;…;"`.
    ///
    /// The empty flow renders as the empty string.
    pub fn to_text(&self) -> String {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return String::new();
        };
        let mut out = format!("{start}->{end}:");
        for edge in &self.edges {
            out.push_str(&format!("{}->{};", edge.source(), edge.target()));
        }
        out
    }
}

impl<E: GraphEdge> fmt::Display for Flow<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

fn parse_pair(text: &str) -> Result<(NodeId, NodeId), EngineError> {
    let bad = || EngineError::InvalidGraph(format!("malformed flow segment '{text}'"));
    let (src, tgt) = text.split_once("->").ok_or_else(bad)?;
    let src: u32 = src.trim().parse().map_err(|_| bad())?;
    let tgt: u32 = tgt.trim().parse().map_err(|_| bad())?;
    Ok((NodeId(src), NodeId(tgt)))
}

impl FromStr for Flow<Edge> {
    type Err = EngineError;

    /// Parses the canonical text form back into a flow of plain edges.
    /// Printing the result reproduces the input exactly.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (head, body) = text.split_once(':').ok_or_else(|| {
            EngineError::InvalidGraph(format!("flow text '{text}' is missing its endpoint header"))
        })?;
        let (start, end) = parse_pair(head)?;
        let body = body.strip_suffix(';').ok_or_else(|| {
            EngineError::InvalidGraph(format!("flow text '{text}' is missing its terminator"))
        })?;
        let mut flow = Flow::new();
        for segment in body.split(';') {
            let (src, tgt) = parse_pair(segment)?;
            flow.append_edge(Edge::new(src, tgt))?;
        }
        if flow.start() != Some(start) || flow.end() != Some(end) {
            return Err(EngineError::InvalidGraph(format!(
                "flow text '{text}' declares endpoints its edges do not realize"
            )));
        }
        Ok(flow)
    }
}

/// An insertion-ordered set of flows, de-duplicated by canonical text.
///
/// The protocol pre-pass accumulates required flows here; the mapping engine
/// consumes them in insertion order.
#[derive(Debug, Clone, Default)]
pub struct FlowSet {
    flows: Vec<Flow<Edge>>,
    seen: FxHashSet<String>,
}

impl FlowSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a flow unless an identical one (by text) is already present.
    /// Returns whether the flow was new.
    pub fn insert(&mut self, flow: Flow<Edge>) -> bool {
        let text = flow.to_text();
        if self.seen.contains(&text) {
            return false;
        }
        self.seen.insert(text);
        self.flows.push(flow);
        true
    }

    pub fn contains_text(&self, text: &str) -> bool {
        self.seen.contains(text)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flow<Edge>> {
        self.flows.iter()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}
