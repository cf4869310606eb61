//! Mermaid flowchart output.
//!
//! ```text
//! ---
//! title: "Order flow"
//! ---
//! flowchart LR
//!     n0([Start])
//!     n1{Valid?}
//!     n0 --> n1
//!     n1 ==>|yes| n0
//!     style n1 fill:#f9f
//! ```
//!
//! Node attributes become `style` statements. Attribute keys containing
//! `:` or `,` and values containing `,` or `;` cannot be read back.

use junction_core::{
    Diagram,
    escape::{mermaid_label, quote_escaped},
    format::Format,
    shape,
};

use super::{INDENT, IdMap, RenderOptions, Renderer, finish};

/// Words that would start a non-node statement when used as an edge source.
const RESERVED: &[&str] = &[
    "subgraph",
    "end",
    "classDef",
    "class",
    "click",
    "linkStyle",
    "direction",
    "accTitle",
    "accDescr",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct MermaidRenderer;

impl Renderer for MermaidRenderer {
    fn format(&self) -> Format {
        Format::Mermaid
    }

    fn render(&self, diagram: &Diagram, options: &RenderOptions) -> String {
        let ids = IdMap::new(diagram, |id| RESERVED.contains(&id));
        let mut lines = Vec::with_capacity(diagram.node_count() + diagram.edge_count() + 4);

        if let Some(title) = diagram.title() {
            lines.push("---".to_string());
            lines.push(format!("title: {}", quote_escaped(title)));
            lines.push("---".to_string());
        }
        lines.push(format!("flowchart {}", options.direction.code()));

        for node in diagram.nodes() {
            let shape = shape::node_shape(node.node_type());
            lines.push(format!(
                "{INDENT}{}{}{}{}",
                ids.get(node.id()),
                shape.mermaid_open,
                mermaid_label(node.label()),
                shape.mermaid_close
            ));
        }

        for edge in diagram.edges() {
            let arrow = shape::edge_style(edge.edge_type()).mermaid_arrow;
            let label = edge
                .label()
                .map(|label| format!("|{}|", mermaid_label(label)))
                .unwrap_or_default();
            lines.push(format!(
                "{INDENT}{} {arrow}{label} {}",
                ids.get(edge.source()),
                ids.get(edge.target())
            ));
        }

        for node in diagram.nodes().filter(|node| !node.attributes().is_empty()) {
            let properties: Vec<String> = node
                .attributes()
                .iter()
                .map(|(key, value)| format!("{key}:{value}"))
                .collect();
            lines.push(format!(
                "{INDENT}style {} {}",
                ids.get(node.id()),
                properties.join(",")
            ));
        }

        finish(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use junction_core::{Edge, EdgeType, Node, NodeType, format::Direction};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_text_example() {
        let mut diagram = Diagram::new();
        diagram
            .add_node(Node::new("n0", "Start").with_type(NodeType::Start))
            .unwrap();
        diagram
            .add_node(Node::new("n1", "Process data").with_type(NodeType::Process))
            .unwrap();
        diagram
            .add_node(Node::new("n2", "Make decision").with_type(NodeType::Process))
            .unwrap();
        diagram
            .add_node(Node::new("n3", "End").with_type(NodeType::End))
            .unwrap();
        diagram.add_edge(Edge::new("n0", "n1"));
        diagram.add_edge(Edge::new("n1", "n2"));
        diagram.add_edge(Edge::new("n2", "n3"));

        let output = MermaidRenderer.render(&diagram, &RenderOptions::default());
        assert_eq!(
            output,
            "flowchart TD\n    n0([Start])\n    n1[Process data]\n    n2[Make decision]\n    n3(((End)))\n    n0 --> n1\n    n1 --> n2\n    n2 --> n3\n"
        );
    }

    #[test]
    fn test_render_title_labels_and_styles() {
        let mut diagram = Diagram::with_title("Say \"hi\"");
        diagram
            .add_node(
                Node::new("check", "Ok? [y/n]")
                    .with_type(NodeType::Decision)
                    .with_attribute("fill", "#f9f"),
            )
            .unwrap();
        diagram
            .add_node(Node::new("db", "Orders").with_type(NodeType::Data))
            .unwrap();
        diagram.add_edge(
            Edge::new("check", "db")
                .with_type(EdgeType::Conditional)
                .with_label("yes"),
        );
        diagram.add_edge(Edge::new("db", "check").with_type(EdgeType::LoopBack));

        let output = MermaidRenderer.render(&diagram, &RenderOptions::new(Direction::LeftRight));
        assert_eq!(
            output,
            r#"---
title: "Say \"hi\""
---
flowchart LR
    check{"Ok? [y/n]"}
    db[(Orders)]
    check ==>|yes| db
    db -.-> check
    style check fill:#f9f
"#
        );
    }

    #[test]
    fn test_reserved_ids_are_renamed() {
        let mut diagram = Diagram::new();
        diagram.add_node(Node::new("end", "End")).unwrap();
        diagram.add_node(Node::new("x", "X")).unwrap();
        diagram.add_edge(Edge::new("end", "x"));

        let output = MermaidRenderer.render(&diagram, &RenderOptions::default());
        assert!(output.contains("    end_1(End)\n"));
        assert!(output.contains("    end_1 --> x\n"));
    }
}
