//! Order-independent collection of node and edge declarations.
//!
//! Structured formats may reference a node before declaring it. Parsers
//! therefore record declarations as they meet them and only resolve
//! references once the whole input has been read. Every problem is
//! collected, so one parse reports all undeclared and duplicate nodes.

use indexmap::IndexMap;
use log::debug;

use junction_core::{
    Diagram, Edge, Node,
    diagram::{DIRECTION_KEY, TITLE_KEY},
    format::Direction,
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
};

#[derive(Debug)]
struct EdgeDecl {
    edge: Edge,
    source_span: Span,
    target_span: Span,
}

#[derive(Debug)]
struct StyleDecl {
    id: String,
    span: Span,
    attributes: Vec<(String, String)>,
}

/// Declarations gathered from one source text.
#[derive(Debug, Default)]
pub(crate) struct Declarations {
    nodes: IndexMap<String, (Node, Span)>,
    edges: Vec<EdgeDecl>,
    styles: Vec<StyleDecl>,
    title: Option<String>,
    direction: Option<Direction>,
    diagnostics: DiagnosticCollector,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a node. A second declaration of the same id is an error.
    pub fn declare_node(&mut self, node: Node, span: Span) {
        if node.id().is_empty() {
            self.diagnostics.emit(
                Diagnostic::error("node id must not be empty")
                    .with_code(ErrorCode::E100)
                    .with_label(span, "empty id"),
            );
            return;
        }
        if let Some((_, first)) = self.nodes.get(node.id()) {
            let first = *first;
            self.diagnostics.emit(
                Diagnostic::error(format!("node `{}` is declared multiple times", node.id()))
                    .with_code(ErrorCode::E201)
                    .with_label(span, "duplicate declaration")
                    .with_secondary_label(first, "first declared here")
                    .with_help("remove the duplicate or use a different id"),
            );
            return;
        }
        self.nodes.insert(node.id().to_string(), (node, span));
    }

    /// Record an edge; its endpoints are resolved in [`Self::finish`].
    pub fn connect(&mut self, edge: Edge, source_span: Span, target_span: Span) {
        self.edges.push(EdgeDecl {
            edge,
            source_span,
            target_span,
        });
    }

    /// Record extra attributes for a node declared anywhere in the input.
    pub fn style(&mut self, id: impl Into<String>, span: Span, attributes: Vec<(String, String)>) {
        self.styles.push(StyleDecl {
            id: id.into(),
            span,
            attributes,
        });
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = Some(direction);
    }

    /// Report a diagnostic found while reading statements.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.emit(diagnostic);
    }

    /// Resolve references and build the diagram.
    ///
    /// Fails with every collected diagnostic if any error was reported.
    pub fn finish(mut self, source: &str) -> Result<Diagram, ParseError> {
        for edge in &self.edges {
            for (id, span) in [
                (edge.edge.source(), edge.source_span),
                (edge.edge.target(), edge.target_span),
            ] {
                if !self.nodes.contains_key(id) {
                    self.diagnostics.emit(undeclared(id, span));
                }
            }
        }
        for style in self.styles.drain(..) {
            match self.nodes.get_mut(&style.id) {
                Some((node, _)) => {
                    let mut styled = node.clone();
                    for (key, value) in style.attributes {
                        styled = styled.with_attribute(key, value);
                    }
                    *node = styled;
                }
                None => self.diagnostics.emit(undeclared(&style.id, style.span)),
            }
        }
        self.diagnostics.finish(source)?;

        let mut diagram = match self.title {
            Some(title) => Diagram::with_title(title),
            None => Diagram::new(),
        };
        if let Some(direction) = self.direction {
            diagram.set_metadata(DIRECTION_KEY, direction.to_string());
        }
        for (_, (node, span)) in self.nodes {
            diagram.add_node(node).map_err(|err| {
                ParseError::from(
                    Diagnostic::error(err.to_string())
                        .with_code(ErrorCode::E100)
                        .with_label(span, "invalid declaration")
                        .locate(source),
                )
            })?;
        }
        for edge in self.edges {
            diagram.add_edge(edge.edge);
        }

        debug!(
            nodes = diagram.node_count(),
            edges = diagram.edge_count(),
            titled = diagram.metadata(TITLE_KEY).is_some();
            "Resolved declarations"
        );
        Ok(diagram)
    }
}

fn undeclared(id: &str, span: Span) -> Diagnostic {
    Diagnostic::error(format!("node `{id}` is not declared"))
        .with_code(ErrorCode::E200)
        .with_label(span, "not declared")
        .with_help("declare the node before or after this reference")
}

#[cfg(test)]
mod tests {
    use super::*;
    use junction_core::NodeType;

    #[test]
    fn test_edges_may_precede_nodes() {
        let mut decls = Declarations::new();
        decls.connect(Edge::new("a", "b"), Span::new(0..1), Span::new(5..6));
        decls.declare_node(Node::new("a", "A"), Span::new(10..11));
        decls.declare_node(
            Node::new("b", "B").with_type(NodeType::End),
            Span::new(12..13),
        );

        let diagram = decls.finish("a -> b\na\nb").unwrap();
        assert_eq!(diagram.node_count(), 2);
        assert_eq!(diagram.edges()[0].target(), "b");
        assert_eq!(diagram.node("b").unwrap().node_type(), NodeType::End);
    }

    #[test]
    fn test_undeclared_references_are_all_reported() {
        let mut decls = Declarations::new();
        decls.declare_node(Node::new("a", "A"), Span::new(0..1));
        decls.connect(Edge::new("a", "x"), Span::new(2..3), Span::new(7..8));
        decls.connect(Edge::new("y", "a"), Span::new(9..10), Span::new(14..15));

        let err = decls.finish("a\na -> x\ny -> a").unwrap_err();
        let codes: Vec<_> = err.diagnostics().iter().map(|d| d.code()).collect();
        assert_eq!(codes, vec![Some(ErrorCode::E200), Some(ErrorCode::E200)]);
        assert_eq!(err.diagnostics()[0].line(), Some(2));
        assert_eq!(err.diagnostics()[1].line(), Some(3));
    }

    #[test]
    fn test_duplicate_declaration_points_at_both() {
        let mut decls = Declarations::new();
        decls.declare_node(Node::new("a", "A"), Span::new(0..1));
        decls.declare_node(Node::new("a", "Again"), Span::new(2..3));

        let err = decls.finish("a\na").unwrap_err();
        let diag = &err.diagnostics()[0];
        assert_eq!(diag.code(), Some(ErrorCode::E201));
        assert_eq!(diag.labels().len(), 2);
        assert_eq!(diag.labels()[1].span(), Span::new(0..1));
    }

    #[test]
    fn test_styles_apply_to_declared_nodes() {
        let mut decls = Declarations::new();
        decls.style(
            "a",
            Span::new(0..5),
            vec![("fill".to_string(), "#f9f".to_string())],
        );
        decls.declare_node(Node::new("a", "A"), Span::new(6..7));
        decls.set_title("Flow");
        decls.set_direction(Direction::LeftRight);

        let diagram = decls.finish("style\na").unwrap();
        assert_eq!(diagram.node("a").unwrap().attribute("fill"), Some("#f9f"));
        assert_eq!(diagram.title(), Some("Flow"));
        assert_eq!(diagram.metadata(DIRECTION_KEY), Some("LR"));
    }
}
