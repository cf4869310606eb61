//! Renderers from the diagram model to diagram-as-code text.
//!
//! This module provides the [`Renderer`] trait, the interface every output
//! format implements. It is the final stage of a conversion.
//!
//! # Pipeline Position
//!
//! ```text
//! Source Text
//!     ↓ parse (junction-parser)
//! Diagram
//!     ↓ transform (optional simplify)
//! Diagram
//!     ↓ render (this module)
//! Output Text
//! ```
//!
//! # Available Backends
//!
//! - [`mermaid`] - Mermaid flowcharts via [`mermaid::MermaidRenderer`]
//! - [`plantuml`] - PlantUML element diagrams via [`plantuml::PlantUmlRenderer`]
//! - [`d2`] - D2 via [`d2::D2Renderer`]
//! - [`dot`] - Graphviz DOT via [`dot::DotRenderer`]
//!
//! Each renderer is the inverse of the parser of the same name: parsing
//! its output yields the same nodes, edges and title. Where a format
//! cannot express something the renderer documents the loss.

pub mod d2;
pub mod dot;
pub mod mermaid;
pub mod plantuml;

use std::collections::{HashMap, HashSet};

use log::debug;
use serde::Deserialize;

use junction_core::{
    Diagram,
    diagram::DIRECTION_KEY,
    format::{Direction, Format},
};

/// Indentation of statements inside a diagram body.
const INDENT: &str = "    ";

/// Abstraction for diagram output formats.
///
/// Rendering is deterministic, never fails and never modifies the diagram.
/// Nodes are written in insertion order, then edges in insertion order.
pub trait Renderer {
    /// The format this renderer writes.
    fn format(&self) -> Format;

    /// Render `diagram` as source text of [`Self::format`].
    fn render(&self, diagram: &Diagram, options: &RenderOptions) -> String;
}

/// Options shared by every renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RenderOptions {
    /// Layout direction written into the output
    pub direction: Direction,
}

impl RenderOptions {
    pub fn new(direction: Direction) -> Self {
        Self { direction }
    }

    /// Options that keep the direction stored in the diagram's metadata,
    /// falling back to top-down.
    pub fn for_diagram(diagram: &Diagram) -> Self {
        let direction = diagram
            .metadata(DIRECTION_KEY)
            .and_then(|code| code.parse().ok())
            .unwrap_or_default();
        Self { direction }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Output ids for formats whose node ids are bare words.
///
/// Ids that are already plain words are written unchanged. Any other id
/// has its other characters replaced by `_`, and ids that are keywords of
/// the format or that collide with an earlier id get a numeric suffix.
/// Edge endpoints that name no node are mapped the same way.
#[derive(Debug)]
pub(crate) struct IdMap {
    ids: HashMap<String, String>,
}

impl IdMap {
    pub fn new(diagram: &Diagram, is_reserved: impl Fn(&str) -> bool) -> Self {
        let mut order: Vec<&str> = Vec::new();
        let mut seen = HashSet::new();
        let all = diagram.nodes().map(|node| node.id()).chain(
            diagram
                .edges()
                .iter()
                .flat_map(|edge| [edge.source(), edge.target()]),
        );
        for id in all {
            if seen.insert(id) {
                order.push(id);
            }
        }

        let is_plain =
            |id: &str| !id.is_empty() && id.chars().all(is_word_char) && !is_reserved(id);
        let mut taken: HashSet<String> = order
            .iter()
            .filter(|id| is_plain(id))
            .map(|id| id.to_string())
            .collect();

        let mut ids = HashMap::with_capacity(order.len());
        for id in order {
            if is_plain(id) {
                ids.insert(id.to_string(), id.to_string());
                continue;
            }
            let mut base: String = id
                .chars()
                .map(|c| if is_word_char(c) { c } else { '_' })
                .collect();
            if base.is_empty() {
                base.push_str("node");
            }
            let mut candidate = base.clone();
            let mut suffix = 1;
            while taken.contains(&candidate) || is_reserved(&candidate) {
                candidate = format!("{base}_{suffix}");
                suffix += 1;
            }
            debug!(id, renamed = candidate.as_str(); "Renamed node id for output");
            taken.insert(candidate.clone());
            ids.insert(id.to_string(), candidate);
        }
        Self { ids }
    }

    /// The output id for `id`.
    pub fn get<'a>(&'a self, id: &'a str) -> &'a str {
        self.ids.get(id).map_or(id, String::as_str)
    }
}

/// Join output lines, ending the text with a newline.
fn finish(lines: Vec<String>) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}
