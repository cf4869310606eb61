//! Graphviz DOT output.
//!
//! ```text
//! digraph G {
//!     label="Order flow";
//!     labelloc="t";
//!     rankdir=LR;
//!     n0 [label="Start", shape=ellipse];
//!     n1 [label="Valid?", shape=diamond, fillcolor="#f9f"];
//!     n0 -> n1;
//!     n1 -> n0 [label="retry", style=dashed];
//! }
//! ```

use log::debug;

use junction_core::{Diagram, escape::quote_escaped, format::Format, shape};

use super::{INDENT, RenderOptions, Renderer, finish};

const KEYWORDS: &[&str] = &["node", "edge", "graph", "digraph", "subgraph", "strict"];

#[derive(Debug, Default, Clone, Copy)]
pub struct DotRenderer;

impl Renderer for DotRenderer {
    fn format(&self) -> Format {
        Format::Dot
    }

    fn render(&self, diagram: &Diagram, options: &RenderOptions) -> String {
        let mut lines = Vec::with_capacity(diagram.node_count() + diagram.edge_count() + 5);

        lines.push("digraph G {".to_string());
        if let Some(title) = diagram.title() {
            lines.push(format!("{INDENT}label={};", quote_escaped(title)));
            lines.push(format!("{INDENT}labelloc=\"t\";"));
        }
        lines.push(format!(
            "{INDENT}rankdir={};",
            shape::dot_rankdir(options.direction)
        ));

        for node in diagram.nodes() {
            let mut attrs = vec![format!("label={}", quote_escaped(node.label()))];
            if let Some(shape) = shape::node_shape(node.node_type()).dot_shape {
                attrs.push(format!("shape={shape}"));
            }
            for (key, value) in node.attributes() {
                if key == "shape" || key == "label" {
                    debug!(node = node.id(), key = key.as_str(); "Skipping DOT attribute");
                    continue;
                }
                attrs.push(format!("{}={}", id(key), quote_escaped(value)));
            }
            lines.push(format!("{INDENT}{} [{}];", id(node.id()), attrs.join(", ")));
        }

        for edge in diagram.edges() {
            let mut attrs = Vec::new();
            if let Some(label) = edge.label() {
                attrs.push(format!("label={}", quote_escaped(label)));
            }
            if let Some(style) = shape::edge_style(edge.edge_type()).dot_style {
                attrs.push(format!("style={style}"));
            }
            let list = if attrs.is_empty() {
                String::new()
            } else {
                format!(" [{}]", attrs.join(", "))
            };
            lines.push(format!(
                "{INDENT}{} -> {}{list};",
                id(edge.source()),
                id(edge.target())
            ));
        }

        lines.push("}".to_string());
        finish(lines)
    }
}

/// A bare DOT identifier when the text is one, otherwise a quoted string.
fn id(text: &str) -> String {
    let mut chars = text.chars();
    let bare = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !KEYWORDS.iter().any(|word| word.eq_ignore_ascii_case(text));
    if bare {
        text.to_string()
    } else {
        quote_escaped(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use junction_core::{Edge, EdgeType, Node, NodeType};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_digraph() {
        let mut diagram = Diagram::with_title("Order \"flow\"");
        diagram
            .add_node(Node::new("start", "Start").with_type(NodeType::Start))
            .unwrap();
        diagram
            .add_node(
                Node::new("check", "Valid?")
                    .with_type(NodeType::Decision)
                    .with_attribute("fillcolor", "#f9f"),
            )
            .unwrap();
        diagram.add_node(Node::new("node", "Any")).unwrap();
        diagram.add_edge(Edge::new("start", "check"));
        diagram.add_edge(
            Edge::new("check", "start")
                .with_type(EdgeType::LoopBack)
                .with_label("retry"),
        );
        diagram.add_edge(Edge::new("check", "node").with_type(EdgeType::Conditional));

        let output = DotRenderer.render(&diagram, &RenderOptions::default());
        assert_eq!(
            output,
            r##"digraph G {
    label="Order \"flow\"";
    labelloc="t";
    rankdir=TB;
    start [label="Start", shape=ellipse];
    check [label="Valid?", shape=diamond, fillcolor="#f9f"];
    "node" [label="Any"];
    start -> check;
    check -> start [label="retry", style=dashed];
    check -> "node" [style=bold];
}
"##
        );
    }

    #[test]
    fn test_ids() {
        assert_eq!(id("n0"), "n0");
        assert_eq!(id("_x"), "_x");
        assert_eq!(id("0a"), "\"0a\"");
        assert_eq!(id("a b"), "\"a b\"");
        assert_eq!(id("Graph"), "\"Graph\"");
        assert_eq!(id(""), "\"\"");
    }
}
