//! PlantUML output.
//!
//! ```text
//! @startuml
//! title Order flow
//! left to right direction
//! usecase "Start" as n0 <<start>>
//! hexagon "Valid?" as n1
//! n0 --> n1
//! n1 -[bold]-> n0 : yes
//! @enduml
//! ```
//!
//! PlantUML has two layout axes, so bottom-up output is top-down and
//! right-left output is left-right. Node attributes and empty edge labels
//! are not written.

use junction_core::{Diagram, escape::plantuml_label, format::Format, shape};

use super::{IdMap, RenderOptions, Renderer, finish};

/// First words that would not be read as an arrow statement.
const RESERVED: &[&str] = &["title", "skinparam", "hide", "show", "scale"];

#[derive(Debug, Default, Clone, Copy)]
pub struct PlantUmlRenderer;

impl Renderer for PlantUmlRenderer {
    fn format(&self) -> Format {
        Format::PlantUml
    }

    fn render(&self, diagram: &Diagram, options: &RenderOptions) -> String {
        let ids = IdMap::new(diagram, |id| {
            RESERVED.iter().any(|word| word.eq_ignore_ascii_case(id))
        });
        let mut lines = Vec::with_capacity(diagram.node_count() + diagram.edge_count() + 4);

        lines.push("@startuml".to_string());
        if let Some(title) = diagram.title() {
            lines.push(format!("title {}", encode_padded(title)).trim_end().to_string());
        }
        lines.push(shape::plantuml_direction(options.direction).to_string());

        for node in diagram.nodes() {
            let shape = shape::node_shape(node.node_type());
            let mut line = format!(
                "{} \"{}\" as {}",
                shape.plantuml_element,
                plantuml_label(node.label()),
                ids.get(node.id())
            );
            if let Some(stereotype) = shape.plantuml_stereotype {
                line.push_str(&format!(" <<{stereotype}>>"));
            }
            lines.push(line);
        }

        for edge in diagram.edges() {
            let arrow = shape::edge_style(edge.edge_type()).plantuml_arrow;
            let mut line = format!(
                "{} {arrow} {}",
                ids.get(edge.source()),
                ids.get(edge.target())
            );
            if let Some(label) = edge.label().filter(|label| !label.is_empty()) {
                line.push_str(" : ");
                line.push_str(&encode_padded(label));
            }
            lines.push(line);
        }

        lines.push("@enduml".to_string());
        finish(lines)
    }
}

/// Encode a label whose surrounding whitespace must survive the trimming
/// applied to titles and edge labels.
fn encode_padded(text: &str) -> String {
    let encoded = plantuml_label(text);
    let body = encoded.trim();
    let leading = &encoded[..encoded.len() - encoded.trim_start().len()];
    let trailing = if body.is_empty() {
        ""
    } else {
        &encoded[leading.len() + body.len()..]
    };
    format!("{}{body}{}", code_points(leading), code_points(trailing))
}

fn code_points(text: &str) -> String {
    text.chars()
        .map(|ch| format!("<U+{:04X}>", u32::from(ch)))
        .collect()
}
