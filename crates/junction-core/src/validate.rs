//! Rule-based diagram validation and style linting.
//!
//! A [`Validator`] runs a list of [`Rule`]s over a diagram and collects the
//! resulting [`Issue`]s into a [`ValidationReport`]. A report is valid when
//! it holds no error-level issue; warnings and infos are advisory.
//!
//! Rules are addressed by stable kebab-case names so they can be selected
//! from a command line or a configuration file:
//!
//! | name | severity |
//! |---|---|
//! | `no-orphaned-nodes` | warning |
//! | `no-cycles` | error |
//! | `require-start-end` | error |
//! | `max-complexity` | warning |
//! | `unique-labels` | info |
//! | `valid-edges` | error |
//! | `no-self-loops` | warning |
//! | `connected-graph` | warning |
//! | `max-nodes-N` | error |
//! | `max-edges-N` | error |
//!
//! The [`Linter`] is separate and only reports style suggestions.

use std::{
    collections::VecDeque,
    fmt::{self, Display},
    str::FromStr,
};

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    diagram::{Diagram, NodeType},
    error::UnsupportedOptionError,
    graph,
};

/// Node count above which `max-complexity` warns.
const COMPLEXITY_NODE_LIMIT: usize = 50;
/// Out-degree above which `max-complexity` warns.
const COMPLEXITY_BRANCH_LIMIT: usize = 10;
/// Label length above which the linter suggests shortening.
const LABEL_LENGTH_LIMIT: usize = 50;
/// Number of generic `n<digits>` ids tolerated by the linter.
const GENERIC_ID_LIMIT: usize = 5;
/// Disconnected ids listed in a `connected-graph` message.
const DISCONNECTED_LISTED: usize = 5;

/// How serious an [`Issue`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The diagram is invalid.
    Error,
    /// Likely a mistake, but the diagram is usable.
    Warning,
    /// A suggestion.
    Info,
}

impl Severity {
    /// Returns `true` if this is an error severity.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Returns `true` if this is a warning severity.
    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A single finding produced by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
    /// Id of the node the issue is about, when it is about one node
    pub location: Option<String>,
    /// Name of the rule that produced the issue
    pub rule: String,
}

impl Issue {
    fn new(severity: Severity, rule: &Rule, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            location: None,
            rule: rule.name(),
        }
    }

    fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.severity, self.message, self.rule)
    }
}

/// A validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    NoOrphanedNodes,
    NoCycles,
    RequireStartEnd,
    MaxComplexity,
    UniqueLabels,
    ValidEdges,
    NoSelfLoops,
    ConnectedGraph,
    MaxNodes(usize),
    MaxEdges(usize),
}

impl Rule {
    /// Rules run by [`Validator::default`], in order.
    pub const DEFAULTS: [Rule; 8] = [
        Rule::NoOrphanedNodes,
        Rule::NoCycles,
        Rule::RequireStartEnd,
        Rule::MaxComplexity,
        Rule::UniqueLabels,
        Rule::ValidEdges,
        Rule::NoSelfLoops,
        Rule::ConnectedGraph,
    ];

    /// Stable rule name.
    pub fn name(&self) -> String {
        match self {
            Rule::NoOrphanedNodes => "no-orphaned-nodes".to_string(),
            Rule::NoCycles => "no-cycles".to_string(),
            Rule::RequireStartEnd => "require-start-end".to_string(),
            Rule::MaxComplexity => "max-complexity".to_string(),
            Rule::UniqueLabels => "unique-labels".to_string(),
            Rule::ValidEdges => "valid-edges".to_string(),
            Rule::NoSelfLoops => "no-self-loops".to_string(),
            Rule::ConnectedGraph => "connected-graph".to_string(),
            Rule::MaxNodes(limit) => format!("max-nodes-{limit}"),
            Rule::MaxEdges(limit) => format!("max-edges-{limit}"),
        }
    }

    /// Run this rule over a diagram.
    pub fn check(&self, diagram: &Diagram) -> Vec<Issue> {
        match self {
            Rule::NoOrphanedNodes => self.check_orphans(diagram),
            Rule::NoCycles => graph::find_cycles(diagram)
                .into_iter()
                .map(|cycle| {
                    Issue::new(
                        Severity::Error,
                        self,
                        format!("cycle detected: {}", cycle.join(" -> ")),
                    )
                })
                .collect(),
            Rule::RequireStartEnd => [(NodeType::Start, "START"), (NodeType::End, "END")]
                .into_iter()
                .filter(|(node_type, _)| !diagram.nodes().any(|n| n.node_type() == *node_type))
                .map(|(_, name)| Issue::new(Severity::Error, self, format!("missing {name} node")))
                .collect(),
            Rule::MaxComplexity => self.check_complexity(diagram),
            Rule::UniqueLabels => self.check_labels(diagram),
            Rule::ValidEdges => self.check_edges(diagram),
            Rule::NoSelfLoops => diagram
                .edges()
                .iter()
                .filter(|edge| edge.is_self_loop())
                .map(|edge| {
                    Issue::new(
                        Severity::Warning,
                        self,
                        format!("self-loop on node `{}`", edge.source()),
                    )
                    .at(edge.source())
                })
                .collect(),
            Rule::ConnectedGraph => self.check_connected(diagram),
            Rule::MaxNodes(limit) if diagram.node_count() > *limit => vec![Issue::new(
                Severity::Error,
                self,
                format!("too many nodes: {} > {limit}", diagram.node_count()),
            )],
            Rule::MaxEdges(limit) if diagram.edge_count() > *limit => vec![Issue::new(
                Severity::Error,
                self,
                format!("too many edges: {} > {limit}", diagram.edge_count()),
            )],
            Rule::MaxNodes(_) | Rule::MaxEdges(_) => Vec::new(),
        }
    }

    fn check_orphans(&self, diagram: &Diagram) -> Vec<Issue> {
        diagram
            .nodes()
            .filter(|node| !matches!(node.node_type(), NodeType::Start | NodeType::End))
            .filter(|node| {
                !diagram
                    .edges()
                    .iter()
                    .any(|edge| edge.source() == node.id() || edge.target() == node.id())
            })
            .map(|node| {
                Issue::new(
                    Severity::Warning,
                    self,
                    format!("orphaned node `{}` ({})", node.id(), node.label()),
                )
                .at(node.id())
            })
            .collect()
    }

    fn check_complexity(&self, diagram: &Diagram) -> Vec<Issue> {
        let stats = graph::statistics(diagram);
        let mut issues = Vec::new();
        if stats.node_count > COMPLEXITY_NODE_LIMIT {
            issues.push(Issue::new(
                Severity::Warning,
                self,
                format!("high node count: {} (consider splitting)", stats.node_count),
            ));
        }
        if stats.max_out_degree > COMPLEXITY_BRANCH_LIMIT {
            issues.push(Issue::new(
                Severity::Warning,
                self,
                format!(
                    "high branching factor: {} edges from one node",
                    stats.max_out_degree
                ),
            ));
        }
        issues
    }

    fn check_labels(&self, diagram: &Diagram) -> Vec<Issue> {
        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for node in diagram.nodes().filter(|n| !n.label().is_empty()) {
            *counts.entry(node.label()).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(label, count)| {
                Issue::new(
                    Severity::Info,
                    self,
                    format!("duplicate label '{label}' used {count} times"),
                )
            })
            .collect()
    }

    fn check_edges(&self, diagram: &Diagram) -> Vec<Issue> {
        let mut issues = Vec::new();
        for edge in diagram.edges() {
            for (role, id) in [("source", edge.source()), ("target", edge.target())] {
                if !diagram.contains_node(id) {
                    issues.push(Issue::new(
                        Severity::Error,
                        self,
                        format!("edge references non-existent {role} node `{id}`"),
                    ));
                }
            }
        }
        issues
    }

    /// Undirected BFS from the first node.
    fn check_connected(&self, diagram: &Diagram) -> Vec<Issue> {
        let Some(first) = diagram.nodes().next() else {
            return Vec::new();
        };

        let mut neighbors: IndexMap<&str, Vec<&str>> =
            diagram.nodes().map(|n| (n.id(), Vec::new())).collect();
        for edge in diagram.edges() {
            neighbors
                .entry(edge.source())
                .or_default()
                .push(edge.target());
            neighbors
                .entry(edge.target())
                .or_default()
                .push(edge.source());
        }

        let mut visited = vec![first.id()];
        let mut queue = VecDeque::from([first.id()]);
        while let Some(id) = queue.pop_front() {
            for &next in neighbors.get(id).into_iter().flatten() {
                if !visited.contains(&next) {
                    visited.push(next);
                    queue.push_back(next);
                }
            }
        }

        let disconnected: Vec<&str> = diagram
            .nodes()
            .map(|n| n.id())
            .filter(|id| !visited.contains(id))
            .collect();
        if disconnected.is_empty() {
            return Vec::new();
        }
        let listed: Vec<&str> = disconnected.iter().copied().take(DISCONNECTED_LISTED).collect();
        vec![Issue::new(
            Severity::Warning,
            self,
            format!(
                "graph is not fully connected; disconnected nodes: {}",
                listed.join(", ")
            ),
        )]
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Rule {
    type Err = UnsupportedOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = || {
            UnsupportedOptionError::new(
                "validation rule",
                s,
                "no-orphaned-nodes, no-cycles, require-start-end, max-complexity, \
                 unique-labels, valid-edges, no-self-loops, connected-graph, \
                 max-nodes-N, max-edges-N",
            )
        };

        if let Some(limit) = s.strip_prefix("max-nodes-") {
            return limit.parse().map(Rule::MaxNodes).map_err(|_| unsupported());
        }
        if let Some(limit) = s.strip_prefix("max-edges-") {
            return limit.parse().map(Rule::MaxEdges).map_err(|_| unsupported());
        }
        Rule::DEFAULTS
            .into_iter()
            .find(|rule| rule.name() == s)
            .ok_or_else(unsupported)
    }
}

/// Issues found by a [`Validator`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    issues: Vec<Issue>,
}

impl ValidationReport {
    /// `true` when no issue has error severity.
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(|issue| issue.severity.is_error())
    }

    /// All issues in rule order.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.with_severity(Severity::Warning)
    }

    pub fn infos(&self) -> impl Iterator<Item = &Issue> {
        self.with_severity(Severity::Info)
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(move |issue| issue.severity == severity)
    }
}

/// Runs a fixed list of rules over diagrams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    rules: Vec<Rule>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(Rule::DEFAULTS.to_vec())
    }
}

impl Validator {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Build a validator from rule names.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedOptionError`] for the first unknown name.
    pub fn from_names<I, S>(names: I) -> Result<Self, UnsupportedOptionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = names
            .into_iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<Rule>, _>>()?;
        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Run every rule in order.
    pub fn validate(&self, diagram: &Diagram) -> ValidationReport {
        let issues: Vec<Issue> = self
            .rules
            .iter()
            .flat_map(|rule| rule.check(diagram))
            .collect();
        debug!(rules = self.rules.len(), issues = issues.len(); "Validated diagram");
        ValidationReport { issues }
    }
}

/// Style suggestions that never make a diagram invalid.
///
/// Checks overly long labels, heavy use of generated `n<digits>` ids and a
/// missing title. Every issue has [`Severity::Info`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Linter;

impl Linter {
    pub fn lint(&self, diagram: &Diagram) -> Vec<Issue> {
        let mut issues = Vec::new();

        for node in diagram.nodes() {
            if node.label().chars().count() > LABEL_LENGTH_LIMIT {
                let preview: String = node.label().chars().take(40).collect();
                issues.push(Issue {
                    severity: Severity::Info,
                    message: format!("long label in `{}`: '{preview}...'", node.id()),
                    location: Some(node.id().to_string()),
                    rule: "label-length".to_string(),
                });
            }
        }

        let generic = diagram.nodes().filter(|n| is_generic_id(n.id())).count();
        if generic > GENERIC_ID_LIMIT {
            issues.push(Issue {
                severity: Severity::Info,
                message: format!("many generic node ids (n1, n2, ...): {generic} nodes"),
                location: None,
                rule: "naming-conventions".to_string(),
            });
        }

        if diagram.title().is_none_or(str::is_empty) {
            issues.push(Issue {
                severity: Severity::Info,
                message: "consider adding a title to the diagram".to_string(),
                location: None,
                rule: "metadata-title".to_string(),
            });
        }

        issues
    }
}

fn is_generic_id(id: &str) -> bool {
    id.strip_prefix('n')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{Edge, Node};

    fn flow() -> Diagram {
        let mut diagram = Diagram::new();
        diagram
            .add_node(Node::new("s", "Start").with_type(NodeType::Start))
            .unwrap();
        diagram
            .add_node(Node::new("p", "Work").with_type(NodeType::Process))
            .unwrap();
        diagram
            .add_node(Node::new("e", "End").with_type(NodeType::End))
            .unwrap();
        diagram.add_edge(Edge::new("s", "p"));
        diagram.add_edge(Edge::new("p", "e"));
        diagram
    }

    fn rules_hit(report: &ValidationReport) -> Vec<&str> {
        report.issues().iter().map(|i| i.rule.as_str()).collect()
    }

    #[test]
    fn test_clean_flow_is_valid() {
        let report = Validator::default().validate(&flow());
        assert!(report.is_valid());
        assert!(report.issues().is_empty(), "{:?}", report.issues());
    }

    #[test]
    fn test_cycles_and_missing_terminals_are_errors() {
        let mut diagram = Diagram::new();
        diagram.add_node(Node::new("a", "A")).unwrap();
        diagram.add_node(Node::new("b", "B")).unwrap();
        diagram.add_edge(Edge::new("a", "b"));
        diagram.add_edge(Edge::new("b", "a"));

        let report = Validator::default().validate(&diagram);
        assert!(!report.is_valid());
        let errors: Vec<_> = report.errors().map(|i| i.message.as_str()).collect();
        assert_eq!(
            errors,
            vec![
                "cycle detected: a -> b",
                "missing START node",
                "missing END node"
            ]
        );
    }

    #[test]
    fn test_orphans_self_loops_and_dangling_edges() {
        let mut diagram = flow();
        diagram.add_node(Node::new("x", "Lonely")).unwrap();
        diagram.add_node(Node::new("y", "Spin")).unwrap();
        diagram.add_edge(Edge::new("y", "y"));
        diagram.add_edge(Edge::new("p", "ghost"));

        let report = Validator::default().validate(&diagram);
        let orphan = report
            .warnings()
            .find(|i| i.rule == "no-orphaned-nodes")
            .unwrap();
        assert_eq!(orphan.location.as_deref(), Some("x"));
        assert!(report.warnings().any(|i| i.rule == "no-self-loops"));
        let dangling: Vec<_> = report
            .errors()
            .filter(|i| i.rule == "valid-edges")
            .collect();
        assert_eq!(dangling.len(), 1);
        assert!(dangling[0].message.contains("ghost"));
        let connected = report
            .warnings()
            .find(|i| i.rule == "connected-graph")
            .unwrap();
        assert!(connected.message.ends_with("x, y"));
    }

    #[test]
    fn test_connected_graph_walks_edges_both_ways() {
        let mut diagram = Diagram::new();
        for id in ["a", "b", "c", "d", "e", "f", "g", "h"] {
            diagram.add_node(Node::new(id, id.to_uppercase())).unwrap();
        }
        diagram.add_edge(Edge::new("b", "a"));
        diagram.add_edge(Edge::new("h", "b"));

        let report = Validator::new(vec![Rule::ConnectedGraph]).validate(&diagram);
        assert_eq!(report.warnings().count(), 1);
        assert_eq!(
            report.issues()[0].message,
            "graph is not fully connected; disconnected nodes: c, d, e, f, g"
        );

        let mut joined = diagram.clone();
        for id in ["c", "d", "e", "f", "g"] {
            joined.add_edge(Edge::new(id, "h"));
        }
        let report = Validator::new(vec![Rule::ConnectedGraph]).validate(&joined);
        assert!(report.issues().is_empty());
    }

    #[test]
    fn test_unique_labels_is_info() {
        let mut diagram = flow();
        diagram.add_node(Node::new("p2", "Work")).unwrap();
        diagram.add_edge(Edge::new("p2", "e"));
        let report = Validator::new(vec![Rule::UniqueLabels]).validate(&diagram);
        assert!(report.is_valid());
        assert_eq!(report.infos().count(), 1);
        assert_eq!(
            report.issues()[0].message,
            "duplicate label 'Work' used 2 times"
        );
    }

    #[test]
    fn test_parameterized_limits() {
        let validator = Validator::from_names(["max-nodes-2", "max-edges-5"]).unwrap();
        let report = validator.validate(&flow());
        assert_eq!(rules_hit(&report), vec!["max-nodes-2"]);
        assert_eq!(report.issues()[0].message, "too many nodes: 3 > 2");
    }

    #[test]
    fn test_complexity_warns_on_branching() {
        let mut diagram = Diagram::new();
        diagram.add_node(Node::new("hub", "Hub")).unwrap();
        for i in 0..11 {
            let id = format!("leaf{i}");
            diagram.add_node(Node::new(id.clone(), "Leaf")).unwrap();
            diagram.add_edge(Edge::new("hub", id));
        }
        let report = Validator::new(vec![Rule::MaxComplexity]).validate(&diagram);
        assert_eq!(report.warnings().count(), 1);
        assert!(report.issues()[0].message.contains("11 edges"));
    }

    #[test]
    fn test_rule_names_round_trip() {
        for rule in Rule::DEFAULTS {
            assert_eq!(rule.name().parse::<Rule>(), Ok(rule));
        }
        assert_eq!("max-nodes-10".parse::<Rule>(), Ok(Rule::MaxNodes(10)));
        let err = "no-such-rule".parse::<Rule>().unwrap_err();
        assert_eq!(err.value(), "no-such-rule");
        assert!("max-nodes-many".parse::<Rule>().is_err());
        assert!(Validator::from_names(["no-cycles", "bogus"]).is_err());
    }

    #[test]
    fn test_linter() {
        let mut diagram = Diagram::new();
        for i in 0..6 {
            diagram.add_node(Node::new(format!("n{i}"), "Step")).unwrap();
        }
        diagram
            .add_node(Node::new("long", "x".repeat(60)))
            .unwrap();

        let rules: Vec<_> = Linter
            .lint(&diagram)
            .into_iter()
            .map(|i| i.rule)
            .collect();
        assert_eq!(
            rules,
            vec!["label-length", "naming-conventions", "metadata-title"]
        );

        let mut titled = flow();
        titled.set_metadata("title", "Flow");
        assert!(Linter.lint(&titled).is_empty());
    }
}
