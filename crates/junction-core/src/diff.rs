//! Structural comparison and merging of diagrams.
//!
//! [`compare`] reports which nodes were added, removed or modified (matched
//! by id) and which edges were added or removed. Edges have no identity of
//! their own, so they are matched by `(source, target, label, type)`; a
//! diagram holding the same edge twice differs from one holding it once.
//!
//! [`merge`] combines two descendants of a common base with a
//! [`MergeStrategy`], and [`History`] keeps named snapshots for changelogs.

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    diagram::{Diagram, Edge, EdgeType, Node},
    error::UnsupportedOptionError,
};

type EdgeKey<'a> = (&'a str, &'a str, Option<&'a str>, EdgeType);

fn edge_key(edge: &Edge) -> EdgeKey<'_> {
    (edge.source(), edge.target(), edge.label(), edge.edge_type())
}

/// Differences between an old and a new diagram.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    /// Nodes only in the new diagram, in its order
    pub added_nodes: Vec<Node>,
    /// Nodes only in the old diagram, in its order
    pub removed_nodes: Vec<Node>,
    /// `(old, new)` pairs sharing an id but differing in label, type or attributes
    pub modified_nodes: Vec<(Node, Node)>,
    pub added_edges: Vec<Edge>,
    pub removed_edges: Vec<Edge>,
}

impl Changes {
    pub fn has_changes(&self) -> bool {
        self.total_changes() > 0
    }

    pub fn total_changes(&self) -> usize {
        self.added_nodes.len()
            + self.removed_nodes.len()
            + self.modified_nodes.len()
            + self.added_edges.len()
            + self.removed_edges.len()
    }

    /// Human-readable multi-line report.
    pub fn report(&self) -> String {
        if !self.has_changes() {
            return "No changes detected.".to_string();
        }

        let mut lines = vec![format!("Total changes: {}", self.total_changes())];
        if !self.added_nodes.is_empty() {
            lines.push(format!("\nAdded nodes ({}):", self.added_nodes.len()));
            for node in &self.added_nodes {
                lines.push(format!("  + {}", NodeSummary(node)));
            }
        }
        if !self.removed_nodes.is_empty() {
            lines.push(format!("\nRemoved nodes ({}):", self.removed_nodes.len()));
            for node in &self.removed_nodes {
                lines.push(format!("  - {}", NodeSummary(node)));
            }
        }
        if !self.modified_nodes.is_empty() {
            lines.push(format!("\nModified nodes ({}):", self.modified_nodes.len()));
            for (old, new) in &self.modified_nodes {
                lines.push(format!("  ~ {}:", old.id()));
                if old.label() != new.label() {
                    lines.push(format!("      label: {} -> {}", old.label(), new.label()));
                }
                if old.node_type() != new.node_type() {
                    lines.push(format!("      type: {} -> {}", old.node_type(), new.node_type()));
                }
                if old.attributes() != new.attributes() {
                    lines.push("      attributes changed".to_string());
                }
            }
        }
        if !self.added_edges.is_empty() {
            lines.push(format!("\nAdded edges ({}):", self.added_edges.len()));
            for edge in &self.added_edges {
                lines.push(format!("  + {}", EdgeSummary(edge)));
            }
        }
        if !self.removed_edges.is_empty() {
            lines.push(format!("\nRemoved edges ({}):", self.removed_edges.len()));
            for edge in &self.removed_edges {
                lines.push(format!("  - {}", EdgeSummary(edge)));
            }
        }

        let mut report = lines.join("\n");
        report.push('\n');
        report
    }
}

struct NodeSummary<'a>(&'a Node);

impl Display for NodeSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.0.id(), self.0.label(), self.0.node_type())
    }
}

struct EdgeSummary<'a>(&'a Edge);

impl Display for EdgeSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.0.source(), self.0.target())?;
        if let Some(label) = self.0.label() {
            write!(f, " ({label})")?;
        }
        if self.0.edge_type() != EdgeType::Plain {
            write!(f, " [{}]", self.0.edge_type())?;
        }
        Ok(())
    }
}

/// Compare two diagrams.
pub fn compare(old: &Diagram, new: &Diagram) -> Changes {
    let mut changes = Changes::default();

    for node in new.nodes() {
        match old.node(node.id()) {
            None => changes.added_nodes.push(node.clone()),
            Some(previous) if previous != node => {
                changes.modified_nodes.push((previous.clone(), node.clone()))
            }
            Some(_) => {}
        }
    }
    changes.removed_nodes = old
        .nodes()
        .filter(|node| !new.contains_node(node.id()))
        .cloned()
        .collect();

    changes.added_edges = unmatched_edges(new, old);
    changes.removed_edges = unmatched_edges(old, new);

    debug!(total = changes.total_changes(); "Compared diagrams");
    changes
}

/// Edges of `from` left over after matching each one against `against`.
fn unmatched_edges(from: &Diagram, against: &Diagram) -> Vec<Edge> {
    let mut available: IndexMap<EdgeKey<'_>, usize> = IndexMap::new();
    for edge in against.edges() {
        *available.entry(edge_key(edge)).or_default() += 1;
    }
    from.edges()
        .iter()
        .filter(|edge| match available.get_mut(&edge_key(edge)) {
            Some(count) if *count > 0 => {
                *count -= 1;
                false
            }
            _ => true,
        })
        .cloned()
        .collect()
}

/// How [`merge`] resolves two descendants of a common base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Everything from all three; later versions win node conflicts.
    #[default]
    Union,
    /// Only nodes and connections present in both descendants.
    Intersection,
    Ours,
    Theirs,
}

impl Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MergeStrategy::Union => "union",
            MergeStrategy::Intersection => "intersection",
            MergeStrategy::Ours => "ours",
            MergeStrategy::Theirs => "theirs",
        };
        write!(f, "{name}")
    }
}

impl FromStr for MergeStrategy {
    type Err = UnsupportedOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "union" => Ok(MergeStrategy::Union),
            "intersection" => Ok(MergeStrategy::Intersection),
            "ours" => Ok(MergeStrategy::Ours),
            "theirs" => Ok(MergeStrategy::Theirs),
            _ => Err(UnsupportedOptionError::new(
                "merge strategy",
                s,
                "union, intersection, ours, theirs",
            )),
        }
    }
}

/// Merge two descendants of `base`.
///
/// - `Union`: nodes from base, ours and theirs keyed by id, where a later
///   version replaces an earlier one's node but keeps its position; edges
///   from all three with duplicates (same source, target, label and type)
///   dropped; metadata from ours.
/// - `Intersection`: nodes whose id is in both descendants, taken from ours;
///   edges whose endpoints are both in both descendants, taken from ours
///   once per pair; metadata from base.
/// - `Ours` / `Theirs`: a copy of that descendant.
pub fn merge(base: &Diagram, ours: &Diagram, theirs: &Diagram, strategy: MergeStrategy) -> Diagram {
    let merged = match strategy {
        MergeStrategy::Ours => ours.clone(),
        MergeStrategy::Theirs => theirs.clone(),
        MergeStrategy::Union => merge_union(base, ours, theirs),
        MergeStrategy::Intersection => merge_intersection(base, ours, theirs),
    };
    debug!(
        strategy:% = strategy,
        nodes = merged.node_count(),
        edges = merged.edge_count();
        "Merged diagrams"
    );
    merged
}

fn merge_union(base: &Diagram, ours: &Diagram, theirs: &Diagram) -> Diagram {
    let mut merged = Diagram::from_nodes(
        base.nodes().chain(ours.nodes()).chain(theirs.nodes()),
        ours.metadata_entries(),
    );

    let mut seen: Vec<EdgeKey<'_>> = Vec::new();
    for edge in base.edges().iter().chain(ours.edges()).chain(theirs.edges()) {
        let key = edge_key(edge);
        if !seen.contains(&key) {
            seen.push(key);
            merged.add_edge(edge.clone());
        }
    }
    merged
}

fn merge_intersection(base: &Diagram, ours: &Diagram, theirs: &Diagram) -> Diagram {
    let mut merged = Diagram::from_nodes(
        ours.nodes().filter(|node| theirs.contains_node(node.id())),
        base.metadata_entries(),
    );

    let mut seen: Vec<(&str, &str)> = Vec::new();
    for edge in ours.edges() {
        let pair = (edge.source(), edge.target());
        let in_theirs = theirs
            .edges()
            .iter()
            .any(|other| (other.source(), other.target()) == pair);
        if in_theirs
            && merged.contains_node(pair.0)
            && merged.contains_node(pair.1)
            && !seen.contains(&pair)
        {
            seen.push(pair);
            merged.add_edge(edge.clone());
        }
    }
    merged
}

/// Named snapshots of a diagram over time.
#[derive(Debug, Clone, Default)]
pub struct History {
    versions: Vec<(String, Diagram)>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot. Names need not be unique; lookups find the first.
    pub fn add_version(&mut self, name: impl Into<String>, diagram: Diagram) {
        self.versions.push((name.into(), diagram));
    }

    pub fn version(&self, name: &str) -> Option<&Diagram> {
        self.versions
            .iter()
            .find(|(version, _)| version == name)
            .map(|(_, diagram)| diagram)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.versions.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Compare two named versions. `None` when either name is unknown.
    pub fn compare_versions(&self, old: &str, new: &str) -> Option<Changes> {
        Some(compare(self.version(old)?, self.version(new)?))
    }

    /// Summary of the changes between each pair of consecutive versions.
    pub fn changelog(&self) -> String {
        if self.versions.len() < 2 {
            return "No version history to compare.".to_string();
        }

        let mut lines = vec![format!("Changelog ({} versions):", self.versions.len())];
        for pair in self.versions.windows(2) {
            let ((previous, old), (current, new)) = (&pair[0], &pair[1]);
            let changes = compare(old, new);
            if !changes.has_changes() {
                continue;
            }
            lines.push(String::new());
            lines.push(format!("{previous} -> {current}:"));
            lines.push(format!("  Changes: {}", changes.total_changes()));
            lines.push(format!(
                "    Nodes: +{} -{} ~{}",
                changes.added_nodes.len(),
                changes.removed_nodes.len(),
                changes.modified_nodes.len()
            ));
            lines.push(format!(
                "    Edges: +{} -{}",
                changes.added_edges.len(),
                changes.removed_edges.len()
            ));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::NodeType;

    fn diagram(nodes: &[(&str, &str)], edges: &[(&str, &str)]) -> Diagram {
        let mut diagram = Diagram::new();
        for (id, label) in nodes {
            diagram.add_node(Node::new(*id, *label)).unwrap();
        }
        for (from, to) in edges {
            diagram.add_edge(Edge::new(*from, *to));
        }
        diagram
    }

    fn node_ids(diagram: &Diagram) -> Vec<&str> {
        diagram.nodes().map(|n| n.id()).collect()
    }

    #[test]
    fn test_compare_identical() {
        let d = diagram(&[("a", "A"), ("b", "B")], &[("a", "b")]);
        let changes = compare(&d, &d.clone());
        assert!(!changes.has_changes());
        assert_eq!(changes.report(), "No changes detected.");
    }

    #[test]
    fn test_compare_nodes_and_edges() {
        let old = diagram(&[("a", "A"), ("b", "B"), ("c", "C")], &[("a", "b"), ("b", "c")]);
        let mut new = diagram(&[("a", "A"), ("b", "Bee"), ("d", "D")], &[("a", "b")]);
        new.add_edge(Edge::new("b", "d").with_label("next"));

        let changes = compare(&old, &new);
        assert_eq!(changes.added_nodes[0].id(), "d");
        assert_eq!(changes.removed_nodes[0].id(), "c");
        assert_eq!(changes.modified_nodes.len(), 1);
        assert_eq!(changes.modified_nodes[0].1.label(), "Bee");
        assert_eq!(changes.added_edges, vec![Edge::new("b", "d").with_label("next")]);
        assert_eq!(changes.removed_edges, vec![Edge::new("b", "c")]);
        assert_eq!(changes.total_changes(), 5);

        let report = changes.report();
        assert!(report.starts_with("Total changes: 5\n"));
        assert!(report.contains("  + d: D [unspecified]"));
        assert!(report.contains("      label: B -> Bee"));
        assert!(report.contains("  + b -> d (next)"));
        assert!(report.contains("  - b -> c"));
    }

    #[test]
    fn test_report_layout() {
        let old = diagram(&[("a", "A"), ("b", "B")], &[("a", "b")]);
        let mut new = diagram(&[("a", "Start")], &[]);
        new.add_node(Node::new("c", "C").with_type(NodeType::End)).unwrap();
        new.add_edge(Edge::new("a", "c").with_type(EdgeType::LoopBack));

        assert_eq!(
            compare(&old, &new).report(),
            "Total changes: 5\n\
             \nAdded nodes (1):\n  + c: C [end]\n\
             \nRemoved nodes (1):\n  - b: B [unspecified]\n\
             \nModified nodes (1):\n  ~ a:\n      label: A -> Start\n\
             \nAdded edges (1):\n  + a -> c [loop_back]\n\
             \nRemoved edges (1):\n  - a -> b\n"
        );
    }

    #[test]
    fn test_compare_counts_parallel_edges() {
        let old = diagram(&[("a", "A"), ("b", "B")], &[("a", "b")]);
        let new = diagram(&[("a", "A"), ("b", "B")], &[("a", "b"), ("a", "b")]);
        let changes = compare(&old, &new);
        assert_eq!(changes.added_edges.len(), 1);
        assert!(changes.removed_edges.is_empty());
    }

    #[test]
    fn test_compare_edge_type_change() {
        let old = diagram(&[("a", "A"), ("b", "B")], &[("a", "b")]);
        let mut new = diagram(&[("a", "A"), ("b", "B")], &[]);
        new.add_edge(Edge::new("a", "b").with_type(EdgeType::Conditional));
        let changes = compare(&old, &new);
        assert_eq!(changes.added_edges.len(), 1);
        assert_eq!(changes.removed_edges.len(), 1);
        assert!(changes.report().contains("  + a -> b [conditional]"));
    }

    #[test]
    fn test_merge_union_later_wins() {
        let base = diagram(&[("a", "A"), ("b", "B")], &[("a", "b")]);
        let mut ours = diagram(&[("a", "A"), ("b", "Ours B"), ("c", "C")], &[("a", "b"), ("b", "c")]);
        ours.set_metadata("title", "Ours");
        let theirs = diagram(&[("a", "A"), ("b", "Their B"), ("d", "D")], &[("a", "b"), ("b", "d")]);

        let merged = merge(&base, &ours, &theirs, MergeStrategy::Union);
        assert_eq!(node_ids(&merged), vec!["a", "b", "c", "d"]);
        assert_eq!(merged.node("b").unwrap().label(), "Their B");
        assert_eq!(merged.edge_count(), 3);
        assert_eq!(merged.title(), Some("Ours"));
    }

    #[test]
    fn test_merge_intersection() {
        let base = diagram(&[("a", "A")], &[]);
        let ours = diagram(&[("a", "A"), ("b", "B"), ("c", "C")], &[("a", "b"), ("a", "b"), ("b", "c")]);
        let theirs = diagram(&[("b", "B2"), ("a", "A"), ("d", "D")], &[("a", "b"), ("b", "d")]);

        let merged = merge(&base, &ours, &theirs, MergeStrategy::Intersection);
        assert_eq!(node_ids(&merged), vec!["a", "b"]);
        assert_eq!(merged.node("b").unwrap().label(), "B");
        assert_eq!(merged.edges(), &[Edge::new("a", "b")]);
    }

    #[test]
    fn test_merge_ours_and_theirs() {
        let base = diagram(&[("a", "A")], &[]);
        let ours = diagram(&[("o", "O")], &[]);
        let theirs = diagram(&[("t", "T")], &[]);
        assert_eq!(merge(&base, &ours, &theirs, MergeStrategy::Ours), ours);
        assert_eq!(merge(&base, &ours, &theirs, MergeStrategy::Theirs), theirs);
    }

    #[test]
    fn test_merge_strategy_from_str() {
        assert_eq!("Union".parse::<MergeStrategy>(), Ok(MergeStrategy::Union));
        assert_eq!("theirs".parse::<MergeStrategy>(), Ok(MergeStrategy::Theirs));
        let err = "rebase".parse::<MergeStrategy>().unwrap_err();
        assert_eq!(err.option(), "merge strategy");
    }

    #[test]
    fn test_history_changelog() {
        let mut history = History::new();
        assert_eq!(history.changelog(), "No version history to compare.");

        let v1 = diagram(&[("a", "A")], &[]);
        let mut v2 = v1.clone();
        v2.add_node(Node::new("b", "B").with_type(NodeType::End)).unwrap();
        v2.add_edge(Edge::new("a", "b"));
        history.add_version("v1", v1.clone());
        history.add_version("v1-again", v1);
        history.add_version("v2", v2);

        assert_eq!(history.names().collect::<Vec<_>>(), vec!["v1", "v1-again", "v2"]);
        assert_eq!(history.version("v2").unwrap().node_count(), 2);
        assert!(history.compare_versions("v1", "missing").is_none());
        assert_eq!(history.compare_versions("v1", "v2").unwrap().total_changes(), 2);

        let changelog = history.changelog();
        assert_eq!(
            changelog,
            "Changelog (3 versions):\n\nv1-again -> v2:\n  Changes: 2\n    Nodes: +1 -0 ~0\n    Edges: +1 -0"
        );
    }
}
