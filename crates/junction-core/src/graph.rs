//! Graph algorithms over the diagram model.
//!
//! Every operation here is a free function that borrows a [`Diagram`] and
//! never mutates it; transformations return a new diagram. Results are
//! deterministic: where an algorithm has a choice, node insertion order and
//! then edge insertion order decide.
//!
//! Edges whose source or target is not a node of the diagram are ignored by
//! every operation. Call [`Diagram::validate`] first to reject them instead.
//!
//! Path and cycle enumeration are exponential on dense graphs.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, VecDeque},
    fmt::{self, Display},
};

use indexmap::IndexMap;
use log::debug;

use crate::{
    diagram::{Diagram, EdgeType, NodeType},
    error::{CyclicGraphError, ValidationError},
};

/// Index-based view of a diagram's connected edges.
///
/// Node `i` is the `i`-th inserted node. `successors[i]` lists one entry per
/// edge in edge insertion order; `edges` keeps `(source, target, position)`
/// where `position` is the index into [`Diagram::edges`].
struct IndexedGraph<'a> {
    ids: Vec<&'a str>,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
    edges: Vec<(usize, usize, usize)>,
}

impl<'a> IndexedGraph<'a> {
    fn new(diagram: &'a Diagram) -> Self {
        let ids: Vec<&str> = diagram.nodes().map(|node| node.id()).collect();
        let mut successors = vec![Vec::new(); ids.len()];
        let mut predecessors = vec![Vec::new(); ids.len()];
        let mut edges = Vec::new();

        for (position, edge) in diagram.edges().iter().enumerate() {
            let (Some(from), Some(to)) = (
                diagram.node_index(edge.source()),
                diagram.node_index(edge.target()),
            ) else {
                continue;
            };
            successors[from].push(to);
            predecessors[to].push(from);
            edges.push((from, to, position));
        }

        Self {
            ids,
            successors,
            predecessors,
            edges,
        }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    /// Successors with parallel edges collapsed, first occurrence wins.
    fn distinct_successors(&self, node: usize) -> Vec<usize> {
        let mut seen = vec![false; self.len()];
        self.successors[node]
            .iter()
            .copied()
            .filter(|&next| !std::mem::replace(&mut seen[next], true))
            .collect()
    }

    /// BFS over `successors` from the direct successors of `from`.
    ///
    /// Returns nodes in discovery order. `from` itself appears only when it
    /// lies on a cycle.
    fn reachable_from(&self, from: usize) -> Vec<usize> {
        let mut visited = vec![false; self.len()];
        let mut order = Vec::new();
        let mut queue: VecDeque<usize> = VecDeque::new();

        for &next in &self.successors[from] {
            if !visited[next] {
                visited[next] = true;
                order.push(next);
                queue.push_back(next);
            }
        }
        while let Some(node) = queue.pop_front() {
            for &next in &self.successors[node] {
                if !visited[next] {
                    visited[next] = true;
                    order.push(next);
                    queue.push_back(next);
                }
            }
        }
        order
    }

    fn names(&self, indices: &[usize]) -> Vec<String> {
        indices.iter().map(|&i| self.ids[i].to_string()).collect()
    }
}

/// Every node reachable from `from` through one or more edges.
///
/// Nodes are returned in breadth-first discovery order. `from` is included
/// only when it lies on a cycle. An unknown `from` yields an empty list.
pub fn reachable(diagram: &Diagram, from: &str) -> Vec<String> {
    let Some(start) = diagram.node_index(from) else {
        return Vec::new();
    };
    let graph = IndexedGraph::new(diagram);
    graph.names(&graph.reachable_from(start))
}

/// Whether `to` can be reached from `from` through one or more edges.
pub fn is_reachable(diagram: &Diagram, from: &str, to: &str) -> bool {
    match (diagram.node_index(from), diagram.node_index(to)) {
        (Some(start), Some(target)) => IndexedGraph::new(diagram)
            .reachable_from(start)
            .contains(&target),
        _ => false,
    }
}

/// All simple paths from `start` to `end`.
///
/// Paths are node id sequences. Depth-first search explores neighbors in
/// edge insertion order, with parallel edges to the same neighbor explored
/// once, so the result order is deterministic. A node never repeats within a
/// path, which guarantees termination on cyclic graphs.
///
/// Unknown or unreachable endpoints yield an empty list. `start == end`
/// yields the single trivial path `[start]`.
pub fn find_paths(diagram: &Diagram, start: &str, end: &str) -> Vec<Vec<String>> {
    let (Some(from), Some(to)) = (diagram.node_index(start), diagram.node_index(end)) else {
        return Vec::new();
    };
    if from == to {
        return vec![vec![start.to_string()]];
    }

    let graph = IndexedGraph::new(diagram);
    let neighbors: Vec<Vec<usize>> = (0..graph.len())
        .map(|node| graph.distinct_successors(node))
        .collect();

    let mut paths = Vec::new();
    let mut path = vec![from];
    let mut on_path = vec![false; graph.len()];
    on_path[from] = true;

    // Explicit stack of (node, next neighbor slot) frames
    let mut stack: Vec<(usize, usize)> = vec![(from, 0)];
    while let Some((node, slot)) = stack.last_mut() {
        let node = *node;
        let Some(&next) = neighbors[node].get(*slot) else {
            stack.pop();
            path.pop();
            on_path[node] = false;
            continue;
        };
        *slot += 1;

        if next == to {
            let mut found = path.clone();
            found.push(to);
            paths.push(graph.names(&found));
        } else if !on_path[next] {
            on_path[next] = true;
            path.push(next);
            stack.push((next, 0));
        }
    }

    debug!(start, end, count = paths.len(); "Enumerated paths");
    paths
}

/// Whether the diagram contains a directed cycle, self-loops included.
pub fn has_cycle(diagram: &Diagram) -> bool {
    kahn_order(&IndexedGraph::new(diagram)).len() < diagram.node_count()
}

/// All elementary cycles.
///
/// Each cycle is a node id sequence without the closing repetition, rotated
/// to start at its earliest-inserted node. Cycles that differ only by
/// parallel edges are reported once. The list is sorted by the insertion
/// indices of its nodes. A self-loop is a cycle of length one.
pub fn find_cycles(diagram: &Diagram) -> Vec<Vec<String>> {
    let graph = IndexedGraph::new(diagram);
    let neighbors: Vec<Vec<usize>> = (0..graph.len())
        .map(|node| graph.distinct_successors(node))
        .collect();

    let mut cycles: Vec<Vec<usize>> = Vec::new();
    for root in 0..graph.len() {
        // Only nodes inserted after `root` may appear, so each cycle is
        // found exactly once: from its smallest member.
        let mut path = vec![root];
        let mut on_path = vec![false; graph.len()];
        on_path[root] = true;
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];

        while let Some((node, slot)) = stack.last_mut() {
            let node = *node;
            let Some(&next) = neighbors[node].get(*slot) else {
                stack.pop();
                path.pop();
                on_path[node] = false;
                continue;
            };
            *slot += 1;

            if next == root {
                cycles.push(path.clone());
            } else if next > root && !on_path[next] {
                on_path[next] = true;
                path.push(next);
                stack.push((next, 0));
            }
        }
    }

    cycles.sort();
    cycles.dedup();
    debug!(count = cycles.len(); "Enumerated cycles");
    cycles.iter().map(|cycle| graph.names(cycle)).collect()
}

/// Order the nodes so every edge points forward.
///
/// Kahn's algorithm with the ready set ordered by insertion index: among the
/// nodes whose predecessors are all placed, the earliest inserted goes next.
/// The result is therefore unique for a given diagram.
///
/// # Errors
///
/// Returns [`CyclicGraphError`] naming an edge that lies on a cycle when the
/// diagram is not acyclic.
pub fn topological_sort(diagram: &Diagram) -> Result<Vec<String>, CyclicGraphError> {
    let graph = IndexedGraph::new(diagram);
    let order = kahn_order(&graph);

    if order.len() == graph.len() {
        return Ok(graph.names(&order));
    }

    let (from, to) = cycle_edge(&graph, &order);
    debug!(from = graph.ids[from], to = graph.ids[to]; "Topological sort hit a cycle");
    Err(CyclicGraphError::new(graph.ids[from], graph.ids[to]))
}

fn kahn_order(graph: &IndexedGraph) -> Vec<usize> {
    let mut in_degree: Vec<usize> = graph.predecessors.iter().map(Vec::len).collect();
    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(node, _)| Reverse(node))
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for &next in &graph.successors[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }
    order
}

/// Find an edge on a cycle among the nodes Kahn's algorithm could not place.
///
/// Every unplaced node has an unplaced predecessor, so walking predecessors
/// backwards from the earliest unplaced node must revisit a node.
fn cycle_edge(graph: &IndexedGraph, placed: &[usize]) -> (usize, usize) {
    let mut remaining = vec![true; graph.len()];
    for &node in placed {
        remaining[node] = false;
    }

    let mut seen = vec![false; graph.len()];
    let mut current = remaining.iter().position(|&r| r).unwrap_or_default();
    seen[current] = true;
    loop {
        let Some(&previous) = graph.predecessors[current]
            .iter()
            .find(|&&pred| remaining[pred])
        else {
            // Unreachable for a Kahn remainder; report the node as a self-edge.
            return (current, current);
        };
        if seen[previous] {
            return (previous, current);
        }
        seen[previous] = true;
        current = previous;
    }
}

/// Options for [`simplify_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimplifyOptions {
    /// Drop nodes left with no incident edges.
    pub remove_isolated: bool,
}

/// Remove transitive edges. See [`simplify_with`].
pub fn simplify(diagram: &Diagram) -> Diagram {
    simplify_with(diagram, SimplifyOptions::default())
}

/// Remove transitive edges.
///
/// Edges are examined in insertion order. An edge `u -> v` is removed when
/// `v` is still reachable from `u` through at least one edge of the current
/// working set with that edge excluded. Reachability is recomputed for each
/// candidate against the edges that survived so far, so removals never
/// change which nodes can reach which, and simplifying the result again
/// changes nothing.
///
/// Of two parallel edges the earlier one is redundant and the later one
/// survives. A self-loop is removed only when its node lies on another
/// cycle. Dangling edges are carried over unchanged.
pub fn simplify_with(diagram: &Diagram, options: SimplifyOptions) -> Diagram {
    let graph = IndexedGraph::new(diagram);
    let mut alive = vec![true; graph.edges.len()];

    for candidate in 0..graph.edges.len() {
        let (from, to, _) = graph.edges[candidate];
        if reachable_without(&graph, &alive, candidate, from, to) {
            alive[candidate] = false;
        }
    }

    let removed_positions: Vec<usize> = graph
        .edges
        .iter()
        .zip(&alive)
        .filter(|(_, keep)| !**keep)
        .map(|((_, _, position), _)| *position)
        .collect();

    let mut result = diagram.clone();
    let mut position = 0;
    result.retain_edges(|_| {
        let keep = !removed_positions.contains(&position);
        position += 1;
        keep
    });

    if options.remove_isolated {
        let mut touched = vec![false; graph.len()];
        for (&(from, to, _), _) in graph.edges.iter().zip(&alive).filter(|(_, keep)| **keep) {
            touched[from] = true;
            touched[to] = true;
        }
        let mut index = 0;
        result.retain_nodes(|_| {
            let keep = touched[index];
            index += 1;
            keep
        });
    }

    debug!(
        removed_edges = removed_positions.len(),
        remaining_nodes = result.node_count();
        "Simplified diagram"
    );
    result
}

/// Whether `to` is reachable from `from` through one or more live edges,
/// ignoring edge `skip`.
fn reachable_without(
    graph: &IndexedGraph,
    alive: &[bool],
    skip: usize,
    from: usize,
    to: usize,
) -> bool {
    let mut visited = vec![false; graph.len()];
    let mut queue = VecDeque::from([from]);

    while let Some(node) = queue.pop_front() {
        for (index, &(edge_from, edge_to, _)) in graph.edges.iter().enumerate() {
            if edge_from != node || index == skip || !alive[index] {
                continue;
            }
            if edge_to == to {
                return true;
            }
            if !visited[edge_to] {
                visited[edge_to] = true;
                queue.push_back(edge_to);
            }
        }
    }
    false
}

/// Summary counts for a diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    pub node_count: usize,
    pub edge_count: usize,
    pub isolated_nodes: usize,
    pub has_cycles: bool,
    pub max_in_degree: usize,
    pub max_out_degree: usize,
    /// Counts per node type in enum order, zero counts omitted
    pub node_types: IndexMap<NodeType, usize>,
    /// Counts per edge type in enum order, zero counts omitted
    pub edge_types: IndexMap<EdgeType, usize>,
}

impl Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Nodes: {}", self.node_count)?;
        writeln!(f, "Edges: {}", self.edge_count)?;
        writeln!(f, "Isolated nodes: {}", self.isolated_nodes)?;
        writeln!(f, "Has cycles: {}", if self.has_cycles { "yes" } else { "no" })?;
        writeln!(f, "Max in-degree: {}", self.max_in_degree)?;
        writeln!(f, "Max out-degree: {}", self.max_out_degree)?;
        if !self.node_types.is_empty() {
            writeln!(f, "Node types:")?;
            for (node_type, count) in &self.node_types {
                writeln!(f, "  {node_type}: {count}")?;
            }
        }
        if !self.edge_types.is_empty() {
            writeln!(f, "Edge types:")?;
            for (edge_type, count) in &self.edge_types {
                writeln!(f, "  {edge_type}: {count}")?;
            }
        }
        Ok(())
    }
}

/// Compute [`Statistics`] for a diagram.
///
/// `edge_count` counts every edge, dangling ones included; degrees and
/// isolation only consider connected edges.
pub fn statistics(diagram: &Diagram) -> Statistics {
    let graph = IndexedGraph::new(diagram);

    let node_types = NodeType::ALL
        .into_iter()
        .map(|t| (t, diagram.nodes().filter(|n| n.node_type() == t).count()))
        .filter(|(_, count)| *count > 0)
        .collect();
    let edge_types = EdgeType::ALL
        .into_iter()
        .map(|t| (t, diagram.edges().iter().filter(|e| e.edge_type() == t).count()))
        .filter(|(_, count)| *count > 0)
        .collect();

    Statistics {
        node_count: diagram.node_count(),
        edge_count: diagram.edge_count(),
        isolated_nodes: (0..graph.len())
            .filter(|&n| graph.successors[n].is_empty() && graph.predecessors[n].is_empty())
            .count(),
        has_cycles: kahn_order(&graph).len() < graph.len(),
        max_in_degree: graph.predecessors.iter().map(Vec::len).max().unwrap_or(0),
        max_out_degree: graph.successors.iter().map(Vec::len).max().unwrap_or(0),
        node_types,
        edge_types,
    }
}

/// Extract the part of a diagram reachable from `root`.
///
/// Keeps `root` and every node within `max_depth` hops of it (`None` means
/// unlimited), in their original insertion order, together with every edge
/// between kept nodes. Metadata is copied.
///
/// # Errors
///
/// Returns [`ValidationError::UnknownNode`] when `root` is not a node.
pub fn extract_subgraph(
    diagram: &Diagram,
    root: &str,
    max_depth: Option<usize>,
) -> Result<Diagram, ValidationError> {
    let start = diagram
        .node_index(root)
        .ok_or_else(|| ValidationError::UnknownNode(root.to_string()))?;
    let graph = IndexedGraph::new(diagram);

    let mut depth: Vec<Option<usize>> = vec![None; graph.len()];
    depth[start] = Some(0);
    let mut queue = VecDeque::from([start]);
    while let Some(node) = queue.pop_front() {
        let Some(current) = depth[node] else {
            continue;
        };
        if max_depth.is_some_and(|limit| current >= limit) {
            continue;
        }
        for &next in &graph.successors[node] {
            if depth[next].is_none() {
                depth[next] = Some(current + 1);
                queue.push_back(next);
            }
        }
    }

    let mut result = diagram.clone();
    let mut index = 0;
    result.retain_nodes(|_| {
        let keep = depth[index].is_some();
        index += 1;
        keep
    });
    let kept = |id: &str| diagram.node_index(id).is_some_and(|i| depth[i].is_some());
    result.retain_edges(|edge| kept(edge.source()) && kept(edge.target()));

    debug!(root, nodes = result.node_count(), edges = result.edge_count(); "Extracted subgraph");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{Edge, Node};

    fn diagram(nodes: &[&str], edges: &[(&str, &str)]) -> Diagram {
        let mut diagram = Diagram::new();
        for id in nodes {
            diagram.add_node(Node::new(*id, id.to_uppercase())).unwrap();
        }
        for (from, to) in edges {
            diagram.add_edge(Edge::new(*from, *to));
        }
        diagram
    }

    fn edge_pairs(diagram: &Diagram) -> Vec<(String, String)> {
        diagram
            .edges()
            .iter()
            .map(|e| (e.source().to_string(), e.target().to_string()))
            .collect()
    }

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_paths_in_order() {
        let d = diagram(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("a", "d")],
        );
        assert_eq!(
            find_paths(&d, "a", "d"),
            vec![ids(&["a", "b", "c", "d"]), ids(&["a", "d"])]
        );
    }

    #[test]
    fn test_find_paths_terminates_on_cycles() {
        let d = diagram(
            &["a", "b", "c"],
            &[("a", "b"), ("b", "a"), ("b", "c"), ("c", "b")],
        );
        assert_eq!(find_paths(&d, "a", "c"), vec![ids(&["a", "b", "c"])]);
    }

    #[test]
    fn test_find_paths_edge_cases() {
        let d = diagram(&["a", "b", "c"], &[("a", "b"), ("a", "b")]);
        assert_eq!(find_paths(&d, "a", "b"), vec![ids(&["a", "b"])]);
        assert_eq!(find_paths(&d, "a", "a"), vec![ids(&["a"])]);
        assert!(find_paths(&d, "a", "c").is_empty());
        assert!(find_paths(&d, "a", "zzz").is_empty());
        assert!(find_paths(&d, "b", "a").is_empty());
    }

    #[test]
    fn test_reachable_bfs_order() {
        let d = diagram(
            &["a", "b", "c", "d", "e"],
            &[("a", "c"), ("a", "b"), ("b", "d"), ("c", "a"), ("x", "e")],
        );
        assert_eq!(reachable(&d, "a"), ids(&["c", "b", "a", "d"]));
        assert!(is_reachable(&d, "b", "d"));
        assert!(!is_reachable(&d, "d", "b"));
        assert!(!is_reachable(&d, "x", "e"));
        assert!(reachable(&d, "missing").is_empty());
    }

    #[test]
    fn test_find_cycles_rotated_and_sorted() {
        let d = diagram(
            &["a", "b", "c"],
            &[("b", "c"), ("c", "a"), ("a", "b")],
        );
        assert!(has_cycle(&d));
        assert_eq!(find_cycles(&d), vec![ids(&["a", "b", "c"])]);
    }

    #[test]
    fn test_three_node_cycle() {
        let d = diagram(
            &["a", "b", "c"],
            &[("a", "b"), ("b", "c"), ("c", "a")],
        );
        assert!(has_cycle(&d));
        assert_eq!(find_cycles(&d), vec![ids(&["a", "b", "c"])]);

        let err = topological_sort(&d).unwrap_err();
        let cycle_edges = [("a", "b"), ("b", "c"), ("c", "a")];
        assert!(cycle_edges.contains(&(err.source_id(), err.target_id())));
    }

    #[test]
    fn test_find_cycles_self_loop_and_multi_edges() {
        let d = diagram(
            &["a", "b", "c"],
            &[("a", "b"), ("b", "a"), ("b", "a"), ("c", "c")],
        );
        assert_eq!(find_cycles(&d), vec![ids(&["a", "b"]), ids(&["c"])]);
    }

    #[test]
    fn test_acyclic_graph_has_no_cycles() {
        let d = diagram(&["a", "b", "c"], &[("a", "b"), ("a", "c"), ("b", "c")]);
        assert!(!has_cycle(&d));
        assert!(find_cycles(&d).is_empty());
    }

    #[test]
    fn test_topological_sort_breaks_ties_by_insertion() {
        let d = diagram(
            &["d", "c", "b", "a"],
            &[("a", "b"), ("c", "b")],
        );
        assert_eq!(topological_sort(&d).unwrap(), ids(&["d", "c", "a", "b"]));
    }

    #[test]
    fn test_topological_sort_reports_cycle_edge() {
        let d = diagram(
            &["s", "a", "b", "c"],
            &[("s", "a"), ("a", "b"), ("b", "c"), ("c", "a")],
        );
        let err = topological_sort(&d).unwrap_err();
        let cycle_edges = [("a", "b"), ("b", "c"), ("c", "a")];
        assert!(cycle_edges.contains(&(err.source_id(), err.target_id())));
        assert_eq!((err.source_id(), err.target_id()), ("a", "b"));
    }

    #[test]
    fn test_topological_sort_self_loop() {
        let d = diagram(&["a", "b"], &[("a", "b"), ("b", "b")]);
        let err = topological_sort(&d).unwrap_err();
        assert_eq!((err.source_id(), err.target_id()), ("b", "b"));
    }

    #[test]
    fn test_operations_ignore_dangling_edges() {
        let d = diagram(&["a", "b"], &[("a", "ghost"), ("ghost", "a"), ("a", "b")]);
        assert_eq!(topological_sort(&d).unwrap(), ids(&["a", "b"]));
        assert!(!has_cycle(&d));
    }

    #[test]
    fn test_simplify_removes_transitive_edge() {
        let d = diagram(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("a", "c")]);
        let simplified = simplify(&d);
        assert_eq!(
            edge_pairs(&simplified),
            vec![
                ("a".to_string(), "b".to_string()),
                ("b".to_string(), "c".to_string())
            ]
        );
        // Input untouched
        assert_eq!(d.edge_count(), 3);
    }

    #[test]
    fn test_simplify_keeps_later_parallel_edge() {
        let mut d = diagram(&["a", "b"], &[]);
        d.add_edge(Edge::new("a", "b").with_label("first"));
        d.add_edge(Edge::new("a", "b").with_label("second"));
        let simplified = simplify(&d);
        assert_eq!(simplified.edge_count(), 1);
        assert_eq!(simplified.edges()[0].label(), Some("second"));
    }

    #[test]
    fn test_simplify_self_loops() {
        let lone = diagram(&["a"], &[("a", "a")]);
        assert_eq!(simplify(&lone).edge_count(), 1);

        let on_cycle = diagram(&["a", "b"], &[("a", "a"), ("a", "b"), ("b", "a")]);
        assert_eq!(
            edge_pairs(&simplify(&on_cycle)),
            vec![
                ("a".to_string(), "b".to_string()),
                ("b".to_string(), "a".to_string())
            ]
        );
    }

    #[test]
    fn test_simplify_remove_isolated() {
        let d = diagram(&["a", "lonely", "b"], &[("a", "b")]);
        let kept = simplify(&d);
        assert_eq!(kept.node_count(), 3);

        let trimmed = simplify_with(
            &d,
            SimplifyOptions {
                remove_isolated: true,
            },
        );
        let names: Vec<_> = trimmed.nodes().map(|n| n.id()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_statistics() {
        let mut d = diagram(&["a", "b", "c", "d"], &[("a", "b"), ("a", "c")]);
        d.add_edge(Edge::new("c", "a").with_type(EdgeType::LoopBack));
        let stats = statistics(&d);

        assert_eq!(stats.node_count, 4);
        assert_eq!(stats.edge_count, 3);
        assert_eq!(stats.isolated_nodes, 1);
        assert!(stats.has_cycles);
        assert_eq!(stats.max_out_degree, 2);
        assert_eq!(stats.max_in_degree, 1);
        assert_eq!(stats.node_types.get(&NodeType::Unspecified), Some(&4));
        assert_eq!(
            stats.edge_types.keys().copied().collect::<Vec<_>>(),
            vec![EdgeType::Plain, EdgeType::LoopBack]
        );
        assert!(stats.to_string().contains("Has cycles: yes"));
    }

    #[test]
    fn test_extract_subgraph_depth() {
        let mut d = diagram(
            &["a", "b", "c", "d", "x"],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("x", "a"), ("d", "b")],
        );
        d.set_metadata("title", "Flow");

        let limited = extract_subgraph(&d, "b", Some(1)).unwrap();
        let names: Vec<_> = limited.nodes().map(|n| n.id()).collect();
        assert_eq!(names, vec!["b", "c"]);
        assert_eq!(edge_pairs(&limited), vec![("b".to_string(), "c".to_string())]);
        assert_eq!(limited.title(), Some("Flow"));

        let full = extract_subgraph(&d, "b", None).unwrap();
        let names: Vec<_> = full.nodes().map(|n| n.id()).collect();
        assert_eq!(names, vec!["b", "c", "d"]);
        assert_eq!(full.edge_count(), 3);
    }

    #[test]
    fn test_extract_subgraph_unknown_root() {
        let d = diagram(&["a"], &[]);
        assert_eq!(
            extract_subgraph(&d, "nope", None).unwrap_err(),
            ValidationError::UnknownNode("nope".to_string())
        );
    }
}
