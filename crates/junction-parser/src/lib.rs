//! # Junction Parser
//!
//! Front ends that turn source text into a [`junction_core::Diagram`]:
//!
//! - [`text`]: free-form arrow-chain text with branch, parallel and loop
//!   markers, typed by a keyword classifier
//! - [`mermaid`], [`plantuml`], [`d2`], [`dot`]: the structured
//!   diagram-as-code syntaxes that Junction also renders
//!
//! Every parser returns either a complete diagram or a [`ParseError`]
//! holding one or more located diagnostics. No parser returns a partial
//! diagram.
//!
//! ## Usage
//!
//! ```
//! # use junction_core::format::{Format, SourceFormat};
//! # use junction_parser::{parse, text::TextOptions, ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = "flowchart TD\n    a[Order] --> b{Paid?}\n";
//!     let diagram = parse(source, SourceFormat::Structured(Format::Mermaid), &TextOptions::default())?;
//!     assert_eq!(diagram.node_count(), 2);
//!     Ok(())
//! }
//! ```

mod declarations;
pub mod error;
mod scan;
mod source;
mod span;

pub mod d2;
pub mod dot;
pub mod mermaid;
pub mod plantuml;
pub mod text;

pub use error::{Diagnostic, ErrorCode, ParseError};
pub use source::line_number;
pub use span::Span;

use log::debug;

use junction_core::{
    Diagram,
    format::{Format, SourceFormat},
};

use text::TextOptions;

/// Parse source text in the given format.
///
/// The structured parsers run in three steps:
///
/// 1. **Split** - blank comments and split the text into statements
/// 2. **Read** - parse each statement into node, edge and metadata declarations
/// 3. **Resolve** - check references and duplicates, then build the diagram
///
/// `options` only affects [`SourceFormat::Text`].
///
/// # Errors
///
/// Returns every diagnostic the parser collected.
pub fn parse(
    source: &str,
    format: SourceFormat,
    options: &TextOptions,
) -> Result<Diagram, ParseError> {
    debug!(format:%, bytes = source.len(); "Parsing source");
    match format {
        SourceFormat::Text => text::parse(source, options),
        SourceFormat::Structured(Format::Mermaid) => mermaid::parse(source),
        SourceFormat::Structured(Format::PlantUml) => plantuml::parse(source),
        SourceFormat::Structured(Format::D2) => d2::parse(source),
        SourceFormat::Structured(Format::Dot) => dot::parse(source),
    }
}
