//! The diagram graph model shared by every front end and back end.
//!
//! A [`Diagram`] owns an ordered collection of [`Node`]s, an ordered
//! collection of [`Edge`]s and a metadata map. Insertion order is
//! significant everywhere: it drives rendering order and breaks ties in the
//! graph algorithms, so the same construction sequence always produces the
//! same output.
//!
//! Edges refer to nodes by id rather than by reference. Whether an edge
//! dangles is therefore checked on demand with [`Diagram::validate`] instead
//! of being prevented by the type system.
//!
//! # Example
//!
//! ```
//! use junction_core::{Diagram, Edge, EdgeType, Node, NodeType};
//!
//! let mut diagram = Diagram::new();
//! diagram.add_node(Node::new("check", "Valid?").with_type(NodeType::Decision))?;
//! diagram.add_node(Node::new("ok", "Accept"))?;
//! diagram.add_edge(
//!     Edge::new("check", "ok")
//!         .with_label("yes")
//!         .with_type(EdgeType::Conditional),
//! );
//!
//! assert!(diagram.validate().is_ok());
//! assert_eq!(diagram.out_adjacency()["check"], vec!["ok".to_string()]);
//! # Ok::<(), junction_core::error::ValidationError>(())
//! ```

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use indexmap::IndexMap;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::{UnsupportedOptionError, ValidationError};

/// Metadata key holding the diagram title.
pub const TITLE_KEY: &str = "title";

/// Metadata key holding the layout direction hint recovered by a parser.
pub const DIRECTION_KEY: &str = "direction";

/// Ordered mapping from node id to the ids of its neighbors.
///
/// Every node of the diagram has an entry, in node insertion order. Each
/// edge contributes one neighbor entry, so parallel edges appear twice.
pub type Adjacency = IndexMap<String, Vec<String>>;

/// Closed classification of a diagram step.
///
/// The node type drives shape selection at render time.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Start,
    End,
    Process,
    Decision,
    Data,
    Subprocess,
    #[default]
    Unspecified,
}

impl NodeType {
    /// All node types in declaration order.
    pub const ALL: [NodeType; 7] = [
        NodeType::Start,
        NodeType::End,
        NodeType::Process,
        NodeType::Decision,
        NodeType::Data,
        NodeType::Subprocess,
        NodeType::Unspecified,
    ];

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Start => "start",
            NodeType::End => "end",
            NodeType::Process => "process",
            NodeType::Decision => "decision",
            NodeType::Data => "data",
            NodeType::Subprocess => "subprocess",
            NodeType::Unspecified => "unspecified",
        }
    }
}

impl Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = UnsupportedOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|node_type| node_type.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                UnsupportedOptionError::new(
                    "node type",
                    s,
                    "start, end, process, decision, data, subprocess, unspecified",
                )
            })
    }
}

/// Kind of connection between two nodes.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    /// Ordinary sequential flow
    #[default]
    Plain,
    /// A branch taken under a condition, usually labelled
    Conditional,
    /// A back-edge closing a loop
    LoopBack,
}

impl EdgeType {
    /// All edge types in declaration order.
    pub const ALL: [EdgeType; 3] = [EdgeType::Plain, EdgeType::Conditional, EdgeType::LoopBack];

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Plain => "plain",
            EdgeType::Conditional => "conditional",
            EdgeType::LoopBack => "loop_back",
        }
    }
}

impl Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EdgeType {
    type Err = UnsupportedOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeType::ALL
            .into_iter()
            .find(|edge_type| edge_type.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                UnsupportedOptionError::new("edge type", s, "plain, conditional, loop_back")
            })
    }
}

/// A single step of a diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: String,
    label: String,
    node_type: NodeType,
    attributes: IndexMap<String, String>,
}

impl Node {
    /// Create a node of type [`NodeType::Unspecified`] with no attributes.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            node_type: NodeType::default(),
            attributes: IndexMap::new(),
        }
    }

    /// Set the node type.
    pub fn with_type(mut self, node_type: NodeType) -> Self {
        self.node_type = node_type;
        self
    }

    /// Add a format-specific attribute such as a styling hint.
    ///
    /// Setting an existing key replaces its value in place.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Get the node id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the display label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Get the node type.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Get all attributes in insertion order.
    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    /// Get one attribute value.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// A directed connection between two nodes, referenced by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    source: String,
    target: String,
    label: Option<String>,
    edge_type: EdgeType,
}

impl Edge {
    /// Create an unlabelled [`EdgeType::Plain`] edge.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: None,
            edge_type: EdgeType::default(),
        }
    }

    /// Set the edge label, e.g. a branch condition.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the edge type.
    pub fn with_type(mut self, edge_type: EdgeType) -> Self {
        self.edge_type = edge_type;
        self
    }

    /// Source node id.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Target node id.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Edge label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Edge type.
    pub fn edge_type(&self) -> EdgeType {
        self.edge_type
    }

    /// Whether source and target are the same node.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// The root of the graph model.
///
/// Nodes are unique by id. Adding a node whose id already exists is rejected
/// with [`ValidationError::DuplicateNode`] and leaves the diagram unchanged.
/// Edges are never validated on insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagram {
    nodes: IndexMap<String, Node>,
    edges: Vec<Edge>,
    metadata: IndexMap<String, String>,
}

impl Diagram {
    /// Create an empty diagram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty diagram with a title.
    pub fn with_title(title: impl Into<String>) -> Self {
        let mut diagram = Self::new();
        diagram.set_metadata(TITLE_KEY, title);
        diagram
    }

    /// Append a node.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyId`] for an empty id and
    /// [`ValidationError::DuplicateNode`] when the id is already taken.
    pub fn add_node(&mut self, node: Node) -> Result<(), ValidationError> {
        if node.id.is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.nodes.contains_key(&node.id) {
            return Err(ValidationError::DuplicateNode(node.id));
        }

        trace!(id = node.id, node_type:% = node.node_type; "Adding node");
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Append an edge. Endpoints are not checked.
    pub fn add_edge(&mut self, edge: Edge) {
        trace!(source = edge.source, target = edge.target; "Adding edge");
        self.edges.push(edge);
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Whether a node with this id exists.
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Insertion index of a node.
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.get_index_of(id)
    }

    /// Iterate over nodes in insertion order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &Node> + DoubleEndedIterator {
        self.nodes.values()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the diagram has neither nodes nor edges.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Get a metadata value.
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Set a metadata value, replacing any previous value in place.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// All metadata in insertion order.
    pub fn metadata_entries(&self) -> &IndexMap<String, String> {
        &self.metadata
    }

    /// The diagram title, if one is set.
    pub fn title(&self) -> Option<&str> {
        self.metadata(TITLE_KEY)
    }

    /// Whether both endpoints of an edge exist.
    pub fn is_connected_edge(&self, edge: &Edge) -> bool {
        self.contains_node(&edge.source) && self.contains_node(&edge.target)
    }

    /// Edges with at least one missing endpoint, in insertion order.
    pub fn dangling_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges
            .iter()
            .filter(|edge| !self.is_connected_edge(edge))
    }

    /// Check that every edge references existing nodes.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DanglingEdge`] for the first dangling edge
    /// in insertion order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.dangling_edges().next() {
            None => Ok(()),
            Some(edge) => {
                let missing = if self.contains_node(&edge.source) {
                    edge.target.clone()
                } else {
                    edge.source.clone()
                };
                Err(ValidationError::DanglingEdge {
                    from: edge.source.clone(),
                    to: edge.target.clone(),
                    missing,
                })
            }
        }
    }

    /// Compute the out-adjacency of every node.
    ///
    /// Computed fresh on every call. Dangling edges are skipped.
    pub fn out_adjacency(&self) -> Adjacency {
        self.adjacency(|edge| (&edge.source, &edge.target))
    }

    /// Compute the in-adjacency of every node.
    ///
    /// Computed fresh on every call. Dangling edges are skipped.
    pub fn in_adjacency(&self) -> Adjacency {
        self.adjacency(|edge| (&edge.target, &edge.source))
    }

    /// Keep only the nodes matching `keep`, preserving order.
    ///
    /// Edges are left untouched; combine with [`Diagram::retain_edges`] to
    /// drop edges that would otherwise dangle.
    pub fn retain_nodes<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Node) -> bool,
    {
        self.nodes.retain(|_, node| keep(node));
    }

    /// Keep only the edges matching `keep`, preserving order.
    pub fn retain_edges<F>(&mut self, keep: F)
    where
        F: FnMut(&Edge) -> bool,
    {
        self.edges.retain(keep);
    }

    /// Diagram of `nodes` and a copy of `metadata`, with no edges.
    ///
    /// A node whose id was already seen replaces the earlier one and keeps
    /// its position. Nodes are expected to come from other diagrams, so ids
    /// are not checked for emptiness.
    pub fn from_nodes<'a>(
        nodes: impl IntoIterator<Item = &'a Node>,
        metadata: &IndexMap<String, String>,
    ) -> Diagram {
        Diagram {
            nodes: nodes
                .into_iter()
                .map(|node| (node.id.clone(), node.clone()))
                .collect(),
            edges: Vec::new(),
            metadata: metadata.clone(),
        }
    }

    fn adjacency<'a, F>(&'a self, endpoints: F) -> Adjacency
    where
        F: Fn(&'a Edge) -> (&'a String, &'a String),
    {
        let mut adjacency: Adjacency = self
            .nodes
            .keys()
            .map(|id| (id.clone(), Vec::new()))
            .collect();

        for edge in self.edges.iter().filter(|edge| self.is_connected_edge(edge)) {
            let (from, to) = endpoints(edge);
            if let Some(neighbors) = adjacency.get_mut(from) {
                neighbors.push(to.clone());
            }
        }

        adjacency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Diagram {
        let mut diagram = Diagram::new();
        for id in ["a", "b", "c"] {
            diagram.add_node(Node::new(id, id.to_uppercase())).unwrap();
        }
        diagram
    }

    #[test]
    fn test_add_node_rejects_duplicate() {
        let mut diagram = abc();
        let err = diagram
            .add_node(Node::new("b", "Another B").with_type(NodeType::Process))
            .unwrap_err();

        assert_eq!(err, ValidationError::DuplicateNode("b".to_string()));
        // Original node is untouched
        assert_eq!(diagram.node("b").unwrap().label(), "B");
        assert_eq!(diagram.node("b").unwrap().node_type(), NodeType::Unspecified);
        assert_eq!(diagram.node_count(), 3);
    }

    #[test]
    fn test_add_node_rejects_empty_id() {
        let mut diagram = Diagram::new();
        assert_eq!(
            diagram.add_node(Node::new("", "nothing")),
            Err(ValidationError::EmptyId)
        );
        assert!(diagram.is_empty());
    }

    #[test]
    fn test_lookup_missing_node_is_none() {
        let diagram = abc();
        assert!(diagram.node("z").is_none());
        assert!(!diagram.contains_node("z"));
        assert_eq!(diagram.node_index("c"), Some(2));
        assert_eq!(diagram.node_index("z"), None);
    }

    #[test]
    fn test_nodes_iterate_in_insertion_order() {
        let mut diagram = Diagram::new();
        for id in ["z", "a", "m"] {
            diagram.add_node(Node::new(id, id)).unwrap();
        }
        let ids: Vec<_> = diagram.nodes().map(Node::id).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_adjacency_keeps_multi_edges_and_skips_dangling() {
        let mut diagram = abc();
        diagram.add_edge(Edge::new("a", "b").with_label("yes"));
        diagram.add_edge(Edge::new("a", "b").with_label("no"));
        diagram.add_edge(Edge::new("b", "c"));
        diagram.add_edge(Edge::new("c", "ghost"));

        let out = diagram.out_adjacency();
        assert_eq!(out["a"], vec!["b".to_string(), "b".to_string()]);
        assert_eq!(out["b"], vec!["c".to_string()]);
        assert!(out["c"].is_empty());

        let incoming = diagram.in_adjacency();
        assert_eq!(incoming["b"], vec!["a".to_string(), "a".to_string()]);
        assert!(incoming["a"].is_empty());
        assert!(!incoming.contains_key("ghost"));
    }

    #[test]
    fn test_adjacency_reflects_later_mutation() {
        let mut diagram = abc();
        assert!(diagram.out_adjacency()["a"].is_empty());
        diagram.add_edge(Edge::new("a", "c"));
        assert_eq!(diagram.out_adjacency()["a"], vec!["c".to_string()]);
    }

    #[test]
    fn test_validate_reports_dangling_edge() {
        let mut diagram = abc();
        diagram.add_edge(Edge::new("a", "b"));
        assert!(diagram.validate().is_ok());

        diagram.add_edge(Edge::new("ghost", "c"));
        assert_eq!(
            diagram.validate(),
            Err(ValidationError::DanglingEdge {
                from: "ghost".to_string(),
                to: "c".to_string(),
                missing: "ghost".to_string(),
            })
        );
        assert_eq!(diagram.dangling_edges().count(), 1);
    }

    #[test]
    fn test_self_loop_is_allowed() {
        let mut diagram = abc();
        diagram.add_edge(Edge::new("a", "a"));
        assert!(diagram.edges()[0].is_self_loop());
        assert_eq!(diagram.out_adjacency()["a"], vec!["a".to_string()]);
    }

    #[test]
    fn test_metadata_and_title() {
        let mut diagram = Diagram::with_title("Checkout");
        diagram.set_metadata(DIRECTION_KEY, "LR");
        assert_eq!(diagram.title(), Some("Checkout"));
        assert_eq!(diagram.metadata(DIRECTION_KEY), Some("LR"));
        assert_eq!(diagram.metadata("missing"), None);
    }

    #[test]
    fn test_node_type_names_round_trip() {
        for node_type in NodeType::ALL {
            assert_eq!(node_type.as_str().parse::<NodeType>(), Ok(node_type));
        }
        assert!("triangle".parse::<NodeType>().is_err());
        assert_eq!("LOOP_BACK".parse::<EdgeType>(), Ok(EdgeType::LoopBack));
    }

    #[test]
    fn test_from_nodes_replaces_in_place() {
        let mut source = abc();
        source.add_edge(Edge::new("a", "b"));
        let other = Node::new("a", "Again").with_type(NodeType::Start);

        let diagram =
            Diagram::from_nodes(source.nodes().chain([&other]), &Diagram::with_title("T").metadata);
        let ids: Vec<_> = diagram.nodes().map(Node::id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(diagram.node("a"), Some(&other));
        assert_eq!(diagram.edge_count(), 0);
        assert_eq!(diagram.title(), Some("T"));
    }

    #[test]
    fn test_node_attributes_keep_order() {
        let node = Node::new("a", "A")
            .with_attribute("fill", "#f9f")
            .with_attribute("stroke", "#333");
        let keys: Vec<_> = node.attributes().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["fill", "stroke"]);
        assert_eq!(node.attribute("fill"), Some("#f9f"));
    }
}
