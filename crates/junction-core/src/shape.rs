//! Per-format vocabulary shared by parsers and renderers.
//!
//! Every structured format spells node types, edge types and directions
//! differently. The tables here are the single source for both directions
//! of that mapping: renderers look a type up by value, parsers look a token
//! up by text. Keeping one table per concern is what makes
//! `parse(render(diagram))` lossless for node and edge types.
//!
//! Reverse lookups return `None` for tokens outside the table. Parsers
//! decide the fallback (PROCESS for node shapes).

use crate::{
    diagram::{EdgeType, NodeType},
    format::Direction,
};

/// How one node type is spelled in every format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeShape {
    pub node_type: NodeType,
    /// Mermaid opening bracket sequence, e.g. `([`
    pub mermaid_open: &'static str,
    /// Mermaid closing bracket sequence, e.g. `])`
    pub mermaid_close: &'static str,
    /// PlantUML element keyword
    pub plantuml_element: &'static str,
    /// PlantUML stereotype that disambiguates elements sharing a keyword
    pub plantuml_stereotype: Option<&'static str>,
    /// D2 `shape` value, `None` when the node carries no shape entry
    pub d2_shape: Option<&'static str>,
    /// DOT `shape` attribute, `None` when the node carries no shape attribute
    pub dot_shape: Option<&'static str>,
}

/// How one edge type is spelled in every format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeStyle {
    pub edge_type: EdgeType,
    pub mermaid_arrow: &'static str,
    pub plantuml_arrow: &'static str,
    /// D2 style entry as `(key, value)` inside the edge map
    pub d2_style: Option<(&'static str, &'static str)>,
    /// DOT `style` attribute value
    pub dot_style: Option<&'static str>,
}

pub const NODE_SHAPES: [NodeShape; 7] = [
    NodeShape {
        node_type: NodeType::Start,
        mermaid_open: "([",
        mermaid_close: "])",
        plantuml_element: "usecase",
        plantuml_stereotype: Some("start"),
        d2_shape: Some("oval"),
        dot_shape: Some("ellipse"),
    },
    NodeShape {
        node_type: NodeType::End,
        mermaid_open: "(((",
        mermaid_close: ")))",
        plantuml_element: "usecase",
        plantuml_stereotype: Some("end"),
        d2_shape: Some("circle"),
        dot_shape: Some("doublecircle"),
    },
    NodeShape {
        node_type: NodeType::Process,
        mermaid_open: "[",
        mermaid_close: "]",
        plantuml_element: "rectangle",
        plantuml_stereotype: None,
        d2_shape: Some("rectangle"),
        dot_shape: Some("box"),
    },
    NodeShape {
        node_type: NodeType::Decision,
        mermaid_open: "{",
        mermaid_close: "}",
        plantuml_element: "hexagon",
        plantuml_stereotype: None,
        d2_shape: Some("diamond"),
        dot_shape: Some("diamond"),
    },
    NodeShape {
        node_type: NodeType::Data,
        mermaid_open: "[(",
        mermaid_close: ")]",
        plantuml_element: "database",
        plantuml_stereotype: None,
        d2_shape: Some("cylinder"),
        dot_shape: Some("cylinder"),
    },
    NodeShape {
        node_type: NodeType::Subprocess,
        mermaid_open: "[[",
        mermaid_close: "]]",
        plantuml_element: "component",
        plantuml_stereotype: None,
        d2_shape: Some("package"),
        dot_shape: Some("box3d"),
    },
    NodeShape {
        node_type: NodeType::Unspecified,
        mermaid_open: "(",
        mermaid_close: ")",
        plantuml_element: "card",
        plantuml_stereotype: None,
        d2_shape: None,
        dot_shape: None,
    },
];

pub const EDGE_STYLES: [EdgeStyle; 3] = [
    EdgeStyle {
        edge_type: EdgeType::Plain,
        mermaid_arrow: "-->",
        plantuml_arrow: "-->",
        d2_style: None,
        dot_style: None,
    },
    EdgeStyle {
        edge_type: EdgeType::Conditional,
        mermaid_arrow: "==>",
        plantuml_arrow: "-[bold]->",
        d2_style: Some(("style.bold", "true")),
        dot_style: Some("bold"),
    },
    EdgeStyle {
        edge_type: EdgeType::LoopBack,
        mermaid_arrow: "-.->",
        plantuml_arrow: "..>",
        d2_style: Some(("style.stroke-dash", "3")),
        dot_style: Some("dashed"),
    },
];

/// Look up the spelling of a node type.
pub fn node_shape(node_type: NodeType) -> &'static NodeShape {
    NODE_SHAPES
        .iter()
        .find(|shape| shape.node_type == node_type)
        .unwrap_or(&NODE_SHAPES[6])
}

/// Look up the spelling of an edge type.
pub fn edge_style(edge_type: EdgeType) -> &'static EdgeStyle {
    EDGE_STYLES
        .iter()
        .find(|style| style.edge_type == edge_type)
        .unwrap_or(&EDGE_STYLES[0])
}

/// Mermaid opening sequences, longest first, so a scanner can match greedily.
pub fn mermaid_openers() -> impl Iterator<Item = &'static NodeShape> {
    let mut shapes: Vec<&'static NodeShape> = NODE_SHAPES.iter().collect();
    shapes.sort_by_key(|shape| std::cmp::Reverse(shape.mermaid_open.len()));
    shapes.into_iter()
}

pub fn node_type_from_plantuml(element: &str, stereotype: Option<&str>) -> Option<NodeType> {
    NODE_SHAPES
        .iter()
        .find(|shape| {
            shape.plantuml_element.eq_ignore_ascii_case(element)
                && match (shape.plantuml_stereotype, stereotype) {
                    (Some(expected), Some(found)) => expected.eq_ignore_ascii_case(found),
                    (None, _) => true,
                    (Some(_), None) => false,
                }
        })
        .map(|shape| shape.node_type)
}

pub fn node_type_from_d2_shape(shape: &str) -> Option<NodeType> {
    NODE_SHAPES
        .iter()
        .find(|entry| entry.d2_shape.is_some_and(|s| s.eq_ignore_ascii_case(shape)))
        .map(|entry| entry.node_type)
}

pub fn node_type_from_dot_shape(shape: &str) -> Option<NodeType> {
    NODE_SHAPES
        .iter()
        .find(|entry| entry.dot_shape.is_some_and(|s| s.eq_ignore_ascii_case(shape)))
        .map(|entry| entry.node_type)
}

pub fn edge_type_from_mermaid_arrow(arrow: &str) -> Option<EdgeType> {
    EDGE_STYLES
        .iter()
        .find(|style| style.mermaid_arrow == arrow)
        .map(|style| style.edge_type)
}

pub fn edge_type_from_plantuml_arrow(arrow: &str) -> Option<EdgeType> {
    EDGE_STYLES
        .iter()
        .find(|style| style.plantuml_arrow == arrow)
        .map(|style| style.edge_type)
}

/// Match a D2 edge style entry. Entries outside the table yield `None`.
pub fn edge_type_from_d2_style(key: &str, value: &str) -> Option<EdgeType> {
    EDGE_STYLES
        .iter()
        .find(|style| style.d2_style == Some((key, value)))
        .map(|style| style.edge_type)
}

pub fn edge_type_from_dot_style(style: &str) -> Option<EdgeType> {
    EDGE_STYLES
        .iter()
        .find(|entry| entry.dot_style.is_some_and(|s| s.eq_ignore_ascii_case(style)))
        .map(|entry| entry.edge_type)
}

/// D2 `direction` value.
pub fn d2_direction(direction: Direction) -> &'static str {
    match direction {
        Direction::TopDown => "down",
        Direction::LeftRight => "right",
        Direction::BottomUp => "up",
        Direction::RightLeft => "left",
    }
}

pub fn direction_from_d2(value: &str) -> Option<Direction> {
    Direction::ALL
        .into_iter()
        .find(|direction| d2_direction(*direction).eq_ignore_ascii_case(value))
}

/// DOT `rankdir` value.
pub fn dot_rankdir(direction: Direction) -> &'static str {
    match direction {
        Direction::TopDown => "TB",
        Direction::LeftRight => "LR",
        Direction::BottomUp => "BT",
        Direction::RightLeft => "RL",
    }
}

pub fn direction_from_dot(value: &str) -> Option<Direction> {
    Direction::ALL
        .into_iter()
        .find(|direction| dot_rankdir(*direction).eq_ignore_ascii_case(value))
}

/// PlantUML direction statement.
///
/// PlantUML only knows the two axes, so bottom-up renders as top-down and
/// right-left as left-right.
pub fn plantuml_direction(direction: Direction) -> &'static str {
    if direction.is_horizontal() {
        "left to right direction"
    } else {
        "top to bottom direction"
    }
}

pub fn direction_from_plantuml(statement: &str) -> Option<Direction> {
    let normalized = statement.split_whitespace().collect::<Vec<_>>().join(" ");
    match normalized.to_ascii_lowercase().as_str() {
        "left to right direction" => Some(Direction::LeftRight),
        "top to bottom direction" => Some(Direction::TopDown),
        _ => None,
    }
}
