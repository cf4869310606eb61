//! D2 output.
//!
//! ```text
//! direction: right
//! title: "Order flow" {near: top-center; shape: text}
//! n0: "Start" {shape: oval}
//! n1: "Valid?" {shape: diamond; style.fill: "#f9f"}
//! n0 -> n1
//! n1 -> n0: "retry" {style.stroke-dash: 3}
//! ```
//!
//! Keys that are not plain words, or that D2 treats specially at the top
//! level, are quoted. Node attributes named `shape` or `label` are not
//! written because they would change the node itself.

use log::debug;

use junction_core::{Diagram, escape::quote_escaped, format::Format, shape};

use super::{RenderOptions, Renderer, finish};

/// Top-level keys with a meaning of their own.
const SPECIAL_KEYS: &[&str] = &[
    "direction",
    "title",
    "classes",
    "vars",
    "layers",
    "scenarios",
    "steps",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct D2Renderer;

impl Renderer for D2Renderer {
    fn format(&self) -> Format {
        Format::D2
    }

    fn render(&self, diagram: &Diagram, options: &RenderOptions) -> String {
        let mut lines = Vec::with_capacity(diagram.node_count() + diagram.edge_count() + 2);

        lines.push(format!("direction: {}", shape::d2_direction(options.direction)));
        if let Some(title) = diagram.title() {
            lines.push(format!(
                "title: {} {{near: top-center; shape: text}}",
                quote_escaped(title)
            ));
        }

        for node in diagram.nodes() {
            let mut entries = Vec::new();
            if let Some(shape) = shape::node_shape(node.node_type()).d2_shape {
                entries.push(format!("shape: {shape}"));
            }
            for (key, value) in node.attributes() {
                if key == "shape" || key == "label" {
                    debug!(node = node.id(), key = key.as_str(); "Skipping D2 attribute");
                    continue;
                }
                entries.push(format!("{}: {}", map_key(key), quote_escaped(value)));
            }
            lines.push(format!(
                "{}: {}{}",
                node_key(node.id()),
                quote_escaped(node.label()),
                map(&entries)
            ));
        }

        for edge in diagram.edges() {
            let mut line = format!("{} -> {}", node_key(edge.source()), node_key(edge.target()));
            let style = shape::edge_style(edge.edge_type())
                .d2_style
                .map(|(key, value)| format!("{key}: {value}"));
            if edge.label().is_some() || style.is_some() {
                line.push(':');
            }
            if let Some(label) = edge.label() {
                line.push(' ');
                line.push_str(&quote_escaped(label));
            }
            line.push_str(&map(style.as_slice()));
            lines.push(line);
        }

        finish(lines)
    }
}

/// ` {a; b}`, or nothing for no entries.
fn map(entries: &[String]) -> String {
    if entries.is_empty() {
        String::new()
    } else {
        format!(" {{{}}}", entries.join("; "))
    }
}

fn is_word(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn node_key(id: &str) -> String {
    if is_word(id) && !SPECIAL_KEYS.iter().any(|key| key.eq_ignore_ascii_case(id)) {
        id.to_string()
    } else {
        quote_escaped(id)
    }
}

/// Map keys may be dotted paths such as `style.fill`.
fn map_key(key: &str) -> String {
    let dotted = key.split('.').all(|part| {
        !part.is_empty() && part.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    });
    if dotted && !key.contains("--") {
        key.to_string()
    } else {
        quote_escaped(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use junction_core::{Edge, EdgeType, Node, NodeType, format::Direction};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_shapes_and_connections() {
        let mut diagram = Diagram::with_title("Order flow");
        diagram
            .add_node(Node::new("start", "Start").with_type(NodeType::Start))
            .unwrap();
        diagram
            .add_node(
                Node::new("check", "Valid?")
                    .with_type(NodeType::Decision)
                    .with_attribute("style.fill", "#f9f"),
            )
            .unwrap();
        diagram.add_node(Node::new("note", "Plain")).unwrap();
        diagram.add_edge(Edge::new("start", "check"));
        diagram.add_edge(
            Edge::new("check", "start")
                .with_type(EdgeType::LoopBack)
                .with_label("retry"),
        );
        diagram.add_edge(Edge::new("check", "note").with_type(EdgeType::Conditional));
        diagram.add_edge(Edge::new("note", "start").with_label("done"));

        let output = D2Renderer.render(&diagram, &RenderOptions::new(Direction::LeftRight));
        assert_eq!(
            output,
            r##"direction: right
title: "Order flow" {near: top-center; shape: text}
start: "Start" {shape: oval}
check: "Valid?" {shape: diamond; style.fill: "#f9f"}
note: "Plain"
start -> check
check -> start: "retry" {style.stroke-dash: 3}
check -> note: {style.bold: true}
note -> start: "done"
"##
        );
    }

    #[test]
    fn test_special_and_unusual_keys_are_quoted() {
        assert_eq!(node_key("direction"), "\"direction\"");
        assert_eq!(node_key("a.b"), "\"a.b\"");
        assert_eq!(node_key("a-b"), "\"a-b\"");
        assert_eq!(node_key("order_1"), "order_1");
        assert_eq!(map_key("style.stroke-width"), "style.stroke-width");
        assert_eq!(map_key("a--b"), "\"a--b\"");
        assert_eq!(map_key("with space"), "\"with space\"");
    }

    #[test]
    fn test_shape_and_label_attributes_are_skipped() {
        let mut diagram = Diagram::new();
        diagram
            .add_node(
                Node::new("a", "A")
                    .with_type(NodeType::Process)
                    .with_attribute("shape", "cloud")
                    .with_attribute("label", "other"),
            )
            .unwrap();
        let output = D2Renderer.render(&diagram, &RenderOptions::default());
        assert_eq!(output, "direction: down\na: \"A\" {shape: rectangle}\n");
    }
}
