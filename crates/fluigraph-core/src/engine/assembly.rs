//! Reassembly of an unordered edge bag into one contiguous flow.
//!
//! Used by the mapping engine when stitching the machine flows of a required
//! protocol flow back together, and directly useful when a caller holds the
//! edges of a path without their order. Inputs are small in practice (tens of
//! edges), so a plain backtracking search is enough.

use crate::engine::errors::EngineError;
use crate::engine::flow::Flow;
use crate::engine::graph::{GraphEdge, NodeId};

/// Assembles `edges` into a single flow using every input edge exactly once.
///
/// Every edge is tried as the starting edge in the order given; from there
/// the search appends any remaining edge whose source matches the current
/// end, undoing on dead ends. The first complete assembly wins. Fails with
/// [`EngineError::AssemblyFailure`] when no ordering forms one contiguous
/// flow.
pub fn assemble_flow<E: GraphEdge>(edges: &[E]) -> Result<Flow<E>, EngineError> {
    if edges.is_empty() {
        return Err(EngineError::AssemblyFailure(
            "cannot assemble an empty edge bag".into(),
        ));
    }
    let mut used = vec![false; edges.len()];
    let mut sequence: Vec<usize> = Vec::with_capacity(edges.len());
    for start in 0..edges.len() {
        used[start] = true;
        sequence.push(start);
        if extend(edges, &mut used, &mut sequence, edges[start].target()) {
            let ordered = sequence.iter().map(|&i| edges[i].clone()).collect();
            return Ok(Flow::from_contiguous(ordered));
        }
        sequence.pop();
        used[start] = false;
    }
    Err(EngineError::AssemblyFailure(format!(
        "{} edges do not form a contiguous flow",
        edges.len()
    )))
}

fn extend<E: GraphEdge>(
    edges: &[E],
    used: &mut [bool],
    sequence: &mut Vec<usize>,
    end: NodeId,
) -> bool {
    if sequence.len() == edges.len() {
        return true;
    }
    for (i, edge) in edges.iter().enumerate() {
        if used[i] || edge.source() != end {
            continue;
        }
        used[i] = true;
        sequence.push(i);
        if extend(edges, used, sequence, edge.target()) {
            return true;
        }
        sequence.pop();
        used[i] = false;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graph::Edge;

    fn bag(pairs: &[(u32, u32)]) -> Vec<Edge> {
        pairs.iter().map(|&(s, t)| Edge::new(s, t)).collect()
    }

    #[test]
    fn reassembles_a_shuffled_chain() {
        let edges = bag(&[(4, 5), (2, 3), (3, 4), (1, 2)]);
        let flow = assemble_flow(&edges).unwrap();
        assert_eq!(flow.to_text(), "1->5:1->2;2->3;3->4;4->5;");
    }

    #[test]
    fn reassembles_the_remaining_middle() {
        let edges = bag(&[(2, 3), (3, 4)]);
        let flow = assemble_flow(&edges).unwrap();
        assert_eq!(flow.to_text(), "2->4:2->3;3->4;");
    }

    #[test]
    fn disconnected_bag_fails() {
        let edges = bag(&[(1, 2), (3, 4)]);
        assert!(matches!(
            assemble_flow(&edges),
            Err(EngineError::AssemblyFailure(_))
        ));
    }

    #[test]
    fn empty_bag_fails() {
        assert!(assemble_flow::<Edge>(&[]).is_err());
    }

    #[test]
    fn recirculation_loop_assembles() {
        let edges = bag(&[(7, 2), (2, 7)]);
        let flow = assemble_flow(&edges).unwrap();
        assert_eq!(flow.start(), flow.end());
        assert_eq!(flow.len(), 2);
    }
}
