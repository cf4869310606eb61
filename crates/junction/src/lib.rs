//! Junction - convert flowcharts between free-form text and diagram-as-code
//! formats.
//!
//! Sources are parsed into one graph model (see [`junction_core`]), which
//! can be analyzed and transformed before it is rendered as Mermaid,
//! PlantUML, D2 or Graphviz DOT.

pub mod config;
pub mod export;

mod error;

pub use junction_core::{
    Diagram, Edge, EdgeType, Node, NodeType, diff, escape, format, graph, shape, validate,
};
pub use junction_core::error::{CyclicGraphError, UnsupportedOptionError, ValidationError};
pub use junction_parser::{ErrorCode, ParseError, text::TextOptions};

pub use error::JunctionError;
pub use export::{RenderOptions, Renderer};

use indexmap::IndexMap;
use log::{debug, info, trace};

use junction_core::format::{Direction, Format, SourceFormat};

use config::AppConfig;
use export::{
    d2::D2Renderer, dot::DotRenderer, mermaid::MermaidRenderer, plantuml::PlantUmlRenderer,
};

/// Parses, transforms and renders diagrams.
///
/// Holds the configuration and a registry with one [`Renderer`] per output
/// [`Format`], built once on construction.
///
/// # Examples
///
/// ```
/// use junction::{Converter, format::{Format, SourceFormat}};
///
/// let converter = Converter::default();
/// let mermaid = converter
///     .convert(
///         "Start -> Process data -> Make decision -> End",
///         SourceFormat::Text,
///         Format::Mermaid,
///         None,
///     )
///     .expect("Failed to convert");
///
/// assert_eq!(
///     mermaid,
///     "flowchart TD\n    n0([Start])\n    n1[Process data]\n    n2[Make decision]\n    n3(((End)))\n    n0 --> n1\n    n1 --> n2\n    n2 --> n3\n"
/// );
/// ```
pub struct Converter {
    config: AppConfig,
    renderers: IndexMap<Format, Box<dyn Renderer>>,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl Converter {
    /// Create a converter with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        let renderers: Vec<Box<dyn Renderer>> = vec![
            Box::new(MermaidRenderer),
            Box::new(PlantUmlRenderer),
            Box::new(D2Renderer),
            Box::new(DotRenderer),
        ];
        let renderers = renderers
            .into_iter()
            .map(|renderer| (renderer.format(), renderer))
            .collect();
        Self { config, renderers }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The renderer registered for `format`.
    pub fn renderer(&self, format: Format) -> Option<&dyn Renderer> {
        self.renderers.get(&format).map(Box::as_ref)
    }

    /// Parse source text into a diagram.
    ///
    /// Text sources use the `[text]` options of the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`JunctionError::Parse`] with the source attached.
    pub fn parse(&self, source: &str, format: SourceFormat) -> Result<Diagram, JunctionError> {
        info!(format:%; "Parsing diagram");

        let diagram = junction_parser::parse(source, format, self.config.text())
            .map_err(|err| JunctionError::new_parse_error(err, source))?;

        debug!(nodes = diagram.node_count(), edges = diagram.edge_count(); "Diagram parsed successfully");
        trace!(diagram:?; "Parsed diagram");
        Ok(diagram)
    }

    /// Apply the `[transform]` section of the configuration.
    pub fn transform(&self, diagram: Diagram) -> Diagram {
        let transform = self.config.transform();
        if !transform.simplify() {
            return diagram;
        }
        graph::simplify_with(&diagram, transform.simplify_options())
    }

    /// Render a diagram.
    ///
    /// The direction is, in order of preference: `direction`, the configured
    /// default, the direction stored in the diagram, top-down.
    ///
    /// # Errors
    ///
    /// Returns [`JunctionError::Option`] when no renderer is registered for
    /// `format`.
    pub fn render(
        &self,
        diagram: &Diagram,
        format: Format,
        direction: Option<Direction>,
    ) -> Result<String, JunctionError> {
        let renderer = self.renderer(format).ok_or_else(|| {
            UnsupportedOptionError::new("output format", format.as_str(), "mermaid, plantuml, d2, dot")
        })?;

        let mut options = RenderOptions::for_diagram(diagram);
        if let Some(direction) = direction.or(self.config.render().direction()) {
            options.direction = direction;
        }

        info!(format:%, direction:% = options.direction; "Rendering diagram");
        Ok(renderer.render(diagram, &options))
    }

    /// Parse, transform and render in one step.
    ///
    /// # Errors
    ///
    /// Returns the error of the failing step.
    pub fn convert(
        &self,
        source: &str,
        source_format: SourceFormat,
        target_format: Format,
        direction: Option<Direction>,
    ) -> Result<String, JunctionError> {
        let diagram = self.parse(source, source_format)?;
        let diagram = self.transform(diagram);
        self.render(&diagram, target_format, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RenderConfig, TransformConfig};

    #[test]
    fn test_registry_covers_every_format() {
        let converter = Converter::default();
        for format in Format::ALL {
            assert_eq!(converter.renderer(format).map(|r| r.format()), Some(format));
        }
    }

    #[test]
    fn test_parse_error_keeps_source() {
        let err = Converter::default()
            .parse("flowchart TD\na --> b", Format::Mermaid.into())
            .unwrap_err();
        match err {
            JunctionError::Parse { err, src } => {
                assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E200));
                assert_eq!(src, "flowchart TD\na --> b");
            }
            other => panic!("Expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_direction_precedence() {
        let source = "digraph { rankdir=LR; a [label=\"A\"]; }";
        let default = Converter::default();
        let output = default
            .convert(source, Format::Dot.into(), Format::Mermaid, None)
            .unwrap();
        assert!(output.starts_with("flowchart LR\n"));

        let output = default
            .convert(source, Format::Dot.into(), Format::Mermaid, Some(Direction::BottomUp))
            .unwrap();
        assert!(output.starts_with("flowchart BT\n"));

        let configured = Converter::new(AppConfig::new(
            RenderConfig::new(Some(Direction::RightLeft)),
            TextOptions::default(),
            TransformConfig::default(),
        ));
        let output = configured
            .convert(source, Format::Dot.into(), Format::Mermaid, None)
            .unwrap();
        assert!(output.starts_with("flowchart RL\n"));
    }

    #[test]
    fn test_convert_simplifies_when_configured() {
        let source = "digraph { a; b; c; a -> b; b -> c; a -> c; }";
        let converter = Converter::new(AppConfig::new(
            RenderConfig::default(),
            TextOptions::default(),
            TransformConfig::new(true, false),
        ));
        let output = converter
            .convert(source, Format::Dot.into(), Format::Dot, None)
            .unwrap();
        assert!(output.contains("a -> b;"));
        assert!(output.contains("b -> c;"));
        assert!(!output.contains("a -> c;"));
    }
}
