//! Builds a [`Diagram`] from parsed chains.
//!
//! Every step becomes a fresh node with a synthetic id (`n0`, `n1`, ...).
//! Each item is built into a [`Fragment`], the nodes where it is entered
//! and the nodes where it is left, so groups and plain steps join the chain
//! the same way.

use log::trace;

use junction_core::{Diagram, Edge, EdgeType, Node, NodeType};

use super::{
    TextOptions,
    classify::classify,
    parser::{Chain, Item, Link, Separator},
};
use crate::error::{Diagnostic, ErrorCode, Result};

/// Entry and exit nodes of a built item, as indices into the node list.
#[derive(Debug, Clone, Default)]
struct Fragment {
    heads: Vec<usize>,
    tails: Vec<usize>,
}

/// An open branch point and the tails of the arms that already ended.
#[derive(Debug)]
struct Fork {
    points: Vec<usize>,
    closed_arms: Vec<usize>,
}

#[derive(Debug, Default)]
pub(crate) struct Builder {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the diagram for a parsed flow.
    pub fn build(mut self, flow: &Chain, options: &TextOptions) -> Result<Diagram> {
        if !flow.links.is_empty() {
            self.chain(flow)?;
        }
        if options.positional_terminals && is_linear(flow) {
            self.apply_positional_terminals();
        }

        let mut diagram = match &options.title {
            Some(title) => Diagram::with_title(title.as_str()),
            None => Diagram::new(),
        };
        for node in self.nodes {
            // Synthetic ids are unique and never empty.
            if let Err(err) = diagram.add_node(node) {
                return Err(Diagnostic::error(err.to_string()).with_code(ErrorCode::E201));
            }
        }
        for edge in self.edges {
            diagram.add_edge(edge);
        }
        Ok(diagram)
    }

    fn step(&mut self, label: &str) -> Fragment {
        let index = self.nodes.len();
        let node_type = classify(label);
        trace!(label, node_type:%; "Classified step");
        self.nodes
            .push(Node::new(format!("n{index}"), label).with_type(node_type));
        Fragment {
            heads: vec![index],
            tails: vec![index],
        }
    }

    /// Add an edge from every source to every target.
    fn connect(&mut self, sources: &[usize], targets: &[usize], edge_type: EdgeType, label: Option<&str>) {
        let at = self.edges.len();
        self.connect_at(at, sources, targets, edge_type, label);
    }

    /// Like [`Self::connect`], inserting the edges at position `at` so they
    /// precede the edges built inside the target item.
    fn connect_at(
        &mut self,
        at: usize,
        sources: &[usize],
        targets: &[usize],
        edge_type: EdgeType,
        label: Option<&str>,
    ) {
        let mut edges = Vec::with_capacity(sources.len() * targets.len());
        for &source in sources {
            for &target in targets {
                let mut edge = Edge::new(self.nodes[source].id(), self.nodes[target].id())
                    .with_type(edge_type);
                if let Some(label) = label {
                    edge = edge.with_label(label);
                }
                edges.push(edge);
            }
        }
        self.edges.splice(at..at, edges);
    }

    /// A branch point whose label gave no stronger type becomes a decision.
    fn promote_to_decision(&mut self, indices: &[usize]) {
        for &index in indices {
            let node = &mut self.nodes[index];
            if node.node_type() == NodeType::Process {
                *node = node.clone().with_type(NodeType::Decision);
            }
        }
    }

    fn item(&mut self, item: &Item) -> Result<Fragment> {
        match item {
            Item::Step(label) => Ok(self.step(label)),
            Item::Parallel(lanes) => {
                let mut fragment = Fragment::default();
                for lane in lanes {
                    let lane = self.chain(lane)?;
                    fragment.heads.extend(lane.heads);
                    fragment.tails.extend(lane.tails);
                }
                Ok(fragment)
            }
            Item::Loop { label, body } => {
                let body = self.chain(body)?;
                self.connect(&body.tails, &body.heads, EdgeType::LoopBack, label.as_deref());
                Ok(body)
            }
        }
    }

    fn chain(&mut self, chain: &Chain) -> Result<Fragment> {
        let mut heads = Vec::new();
        let mut current: Vec<usize> = Vec::new();
        let mut fork: Option<Fork> = None;

        for Link {
            separator,
            label,
            item,
        } in &chain.links
        {
            // `=>` closes the open fork: every arm tail joins the next item.
            let mut sources = std::mem::take(&mut current);
            if *separator == Separator::Merge {
                if let Some(open) = fork.take() {
                    let mut merged = open.closed_arms;
                    merged.extend(sources);
                    sources = merged;
                }
            }

            if *separator == Separator::Start {
                if let Some(label) = label {
                    return Err(Diagnostic::error("the first step cannot be a branch")
                        .with_code(ErrorCode::E104)
                        .with_label(label.span(), ErrorCode::E104.description())
                        .with_help("put the branching step before the label: `Valid? -> [yes] Ship`"));
                }
            }

            let at = self.edges.len();
            let fragment = self.item(item.inner())?;
            match label {
                Some(label) => {
                    let points = match fork.as_mut() {
                        Some(open) => {
                            open.closed_arms.extend(sources);
                            open.points.clone()
                        }
                        None => {
                            fork = Some(Fork {
                                points: sources.clone(),
                                closed_arms: Vec::new(),
                            });
                            sources
                        }
                    };
                    self.promote_to_decision(&points);
                    self.connect_at(
                        at,
                        &points,
                        &fragment.heads,
                        EdgeType::Conditional,
                        Some(label.inner()),
                    );
                }
                None => self.connect_at(at, &sources, &fragment.heads, EdgeType::Plain, None),
            }

            if *separator == Separator::Start {
                heads = fragment.heads.clone();
            }
            current = fragment.tails;
        }

        // An unmerged fork leaves every arm as an exit.
        let mut tails = fork.map(|open| open.closed_arms).unwrap_or_default();
        tails.extend(current);
        Ok(Fragment { heads, tails })
    }

    fn apply_positional_terminals(&mut self) {
        let last = self.nodes.len().saturating_sub(1);
        for (index, node_type) in [(0, NodeType::Start), (last, NodeType::End)] {
            if let Some(node) = self.nodes.get_mut(index) {
                if node.node_type() == NodeType::Process {
                    *node = node.clone().with_type(node_type);
                }
            }
        }
    }
}

/// Whether the flow is a chain of at least two plain steps without labels.
fn is_linear(flow: &Chain) -> bool {
    flow.links.len() >= 2
        && flow
            .links
            .iter()
            .all(|link| link.label.is_none() && matches!(link.item.inner(), Item::Step(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{lexer::tokenize, parser::parse_flow};

    fn build(input: &str, options: &TextOptions) -> Result<Diagram> {
        let tokens = tokenize(input).expect("Failed to tokenize");
        let flow = parse_flow(&tokens)?;
        Builder::new().build(&flow, options)
    }

    fn edges(diagram: &Diagram) -> Vec<(&str, &str, Option<&str>, EdgeType)> {
        diagram
            .edges()
            .iter()
            .map(|e| (e.source(), e.target(), e.label(), e.edge_type()))
            .collect()
    }

    #[test]
    fn test_branch_and_merge() {
        let diagram = build(
            "Order valid -> [yes] Ship -> [no] Reject => Notify",
            &TextOptions::default(),
        )
        .unwrap();

        assert_eq!(
            diagram.node("n0").unwrap().node_type(),
            NodeType::Decision
        );
        assert_eq!(
            edges(&diagram),
            vec![
                ("n0", "n1", Some("yes"), EdgeType::Conditional),
                ("n0", "n2", Some("no"), EdgeType::Conditional),
                ("n1", "n3", None, EdgeType::Plain),
                ("n2", "n3", None, EdgeType::Plain),
            ]
        );
    }

    #[test]
    fn test_arm_continues_until_next_label() {
        let diagram = build("Ok? -> [yes] A -> B -> [no] C", &TextOptions::default()).unwrap();
        assert_eq!(
            edges(&diagram),
            vec![
                ("n0", "n1", Some("yes"), EdgeType::Conditional),
                ("n1", "n2", None, EdgeType::Plain),
                ("n0", "n3", Some("no"), EdgeType::Conditional),
            ]
        );
    }

    #[test]
    fn test_branch_point_keeps_keyword_type() {
        let diagram = build("Save order -> [ok] Done", &TextOptions::default()).unwrap();
        assert_eq!(diagram.node("n0").unwrap().node_type(), NodeType::Data);
    }

    #[test]
    fn test_parallel_lanes_share_neighbours() {
        let diagram = build("A -> parallel(B | C -> D) -> E", &TextOptions::default()).unwrap();
        assert_eq!(
            edges(&diagram),
            vec![
                ("n0", "n1", None, EdgeType::Plain),
                ("n0", "n2", None, EdgeType::Plain),
                ("n2", "n3", None, EdgeType::Plain),
                ("n1", "n4", None, EdgeType::Plain),
                ("n3", "n4", None, EdgeType::Plain),
            ]
        );
    }

    #[test]
    fn test_loop_adds_back_edge() {
        let diagram = build("A -> loop[retry](B -> C) -> D", &TextOptions::default()).unwrap();
        assert_eq!(
            edges(&diagram),
            vec![
                ("n0", "n1", None, EdgeType::Plain),
                ("n1", "n2", None, EdgeType::Plain),
                ("n2", "n1", Some("retry"), EdgeType::LoopBack),
                ("n2", "n3", None, EdgeType::Plain),
            ]
        );
    }

    #[test]
    fn test_merge_without_fork_is_plain() {
        let diagram = build("A => B", &TextOptions::default()).unwrap();
        assert_eq!(edges(&diagram), vec![("n0", "n1", None, EdgeType::Plain)]);
    }

    #[test]
    fn test_label_on_first_step() {
        let err = build("[yes] A -> B", &TextOptions::default()).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E104));
        let err = build("A -> parallel([x] B | C)", &TextOptions::default()).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E104));
    }

    #[test]
    fn test_positional_terminals() {
        let options = TextOptions {
            positional_terminals: true,
            ..TextOptions::default()
        };
        let diagram = build("Receive -> Pack -> Ship", &options).unwrap();
        let types: Vec<_> = diagram.nodes().map(|n| n.node_type()).collect();
        assert_eq!(
            types,
            vec![NodeType::Start, NodeType::Process, NodeType::End]
        );

        // Branching flows are not linear.
        let diagram = build("Receive -> [a] Pack -> [b] Ship", &options).unwrap();
        assert_eq!(diagram.node("n0").unwrap().node_type(), NodeType::Decision);
        assert_eq!(diagram.node("n2").unwrap().node_type(), NodeType::Process);
    }
}
