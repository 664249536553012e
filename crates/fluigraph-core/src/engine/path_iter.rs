//! # Simple-path enumeration
//!
//! Lazy, restartable enumeration of simple directed paths. The iterator runs
//! an iterative depth-first traversal with an explicit stack; each frame holds
//! a node and a cursor into its outgoing edges, and a shared visited set keeps
//! paths simple. Dropping the iterator cancels the traversal.
//!
//! Paths are yielded in the lexicographic order induced by edge insertion
//! order at each branch, which makes enumeration deterministic for a fixed
//! builder sequence. Conditional-edge predicates are *not* evaluated here;
//! filtering flows by their predecessors is the mapping engine's concern.

use rustc_hash::FxHashSet;

use crate::engine::flow::Flow;
use crate::engine::graph::{DirectedGraph, EdgeKey, GraphEdge, GraphNode, NodeId};

/// Where an enumeration stops: a concrete node, or any node matching a
/// predicate.
enum Goal<'g, N> {
    Node(NodeId),
    Matching(Box<dyn Fn(&N) -> bool + 'g>),
}

struct Frame {
    node: NodeId,
    cursor: usize,
}

/// Pull-driven iterator over simple directed paths.
///
/// Multiple start nodes are traversed one after another in the order given;
/// within one start node the traversal is depth-first. A yielded path never
/// repeats a vertex and never has zero edges. When the goal is a predicate, a
/// matched node is still traversed through, since a longer path may reach
/// another matching node.
pub struct PathIter<'g, N, E> {
    graph: &'g DirectedGraph<N, E>,
    sources: std::vec::IntoIter<NodeId>,
    goal: Goal<'g, N>,
    stack: Vec<Frame>,
    path: Vec<EdgeKey>,
    visited: FxHashSet<NodeId>,
}

impl<'g, N: GraphNode, E: GraphEdge> PathIter<'g, N, E> {
    /// Enumerates simple paths from `source` to the concrete node `target`.
    pub fn between(graph: &'g DirectedGraph<N, E>, source: NodeId, target: NodeId) -> Self {
        Self::from_sources(graph, vec![source], Goal::Node(target))
    }

    /// Enumerates simple paths from `source` to any node matching `pred`.
    pub fn to_matching(
        graph: &'g DirectedGraph<N, E>,
        source: NodeId,
        pred: impl Fn(&N) -> bool + 'g,
    ) -> Self {
        Self::from_sources(graph, vec![source], Goal::Matching(Box::new(pred)))
    }

    /// Enumerates simple paths from each of `sources` (in order) to the
    /// concrete node `target`.
    pub fn many_to_node(
        graph: &'g DirectedGraph<N, E>,
        sources: Vec<NodeId>,
        target: NodeId,
    ) -> Self {
        Self::from_sources(graph, sources, Goal::Node(target))
    }

    /// Enumerates simple paths from each of `sources` (in order) to any node
    /// matching `pred`.
    pub fn many_to_matching(
        graph: &'g DirectedGraph<N, E>,
        sources: Vec<NodeId>,
        pred: impl Fn(&N) -> bool + 'g,
    ) -> Self {
        Self::from_sources(graph, sources, Goal::Matching(Box::new(pred)))
    }

    fn from_sources(graph: &'g DirectedGraph<N, E>, sources: Vec<NodeId>, goal: Goal<'g, N>) -> Self {
        Self {
            graph,
            sources: sources.into_iter(),
            goal,
            stack: Vec::new(),
            path: Vec::new(),
            visited: FxHashSet::default(),
        }
    }

    fn goal_hit(&self, id: NodeId) -> bool {
        match &self.goal {
            Goal::Node(target) => *target == id,
            Goal::Matching(pred) => self.graph.node(id).is_some_and(|node| pred(node)),
        }
    }

    fn current_flow(&self) -> Flow<E> {
        let edges = self
            .path
            .iter()
            .filter_map(|key| self.graph.edge(key.0, key.1))
            .cloned()
            .collect();
        Flow::from_contiguous(edges)
    }
}

impl<N: GraphNode, E: GraphEdge> Iterator for PathIter<'_, N, E> {
    type Item = Flow<E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(frame) = self.stack.last() else {
                // current start node exhausted, move to the next one
                let source = self.sources.next()?;
                if !self.graph.contains_node(source) {
                    continue;
                }
                self.path.clear();
                self.visited.clear();
                self.visited.insert(source);
                self.stack.push(Frame {
                    node: source,
                    cursor: 0,
                });
                continue;
            };

            let (node, cursor) = (frame.node, frame.cursor);
            let graph = self.graph;
            let keys = graph.leaving_keys(node).unwrap_or(&[]);
            let Some(&key) = keys.get(cursor) else {
                if let Some(done) = self.stack.pop() {
                    self.visited.remove(&done.node);
                }
                self.path.pop();
                continue;
            };

            if let Some(top) = self.stack.last_mut() {
                top.cursor += 1;
            }
            let (_, next_node) = key;
            if self.visited.contains(&next_node) {
                continue;
            }

            self.path.push(key);
            self.visited.insert(next_node);
            self.stack.push(Frame {
                node: next_node,
                cursor: 0,
            });
            if self.goal_hit(next_node) {
                let flow = self.current_flow();
                tracing::trace!(path = %flow, "path yielded");
                return Some(flow);
            }
        }
    }
}
