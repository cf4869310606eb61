//! Free-form arrow-chain text front end.
//!
//! Turns text such as `Start -> Check stock? -> [yes] Ship -> [no] Reorder`
//! into a [`Diagram`]. The syntax:
//!
//! ```text
//! flow      := sep* chain? sep* EOF
//! chain     := item ( sep+ item )*
//! sep       := "->" | "=>" | NEWLINE
//! item      := ( "[" label "]" )? ( group | step )
//! group     := "parallel" "(" chain ( "|" chain )* ")"
//!            | "loop" ( "[" label "]" )? "(" chain ")"
//! step      := quoted-string | bare-text
//! comment   := "//" ... end of line
//! ```
//!
//! - `->` and newlines join consecutive items with plain edges.
//! - `[label] item` starts a branch arm from the item before the first
//!   arm. Later `[label]` items start more arms from the same point, and
//!   `=>` merges every arm into the next item. A branch point without a
//!   stronger keyword type becomes a DECISION.
//! - `parallel(A | B -> C)` makes the lanes siblings: each lane head is
//!   entered from the predecessor and each lane tail leads to the
//!   successor.
//! - `loop[label](A -> B)` adds a loop-back edge from the body's last step
//!   to its first.
//! - Bare text stops at the tokens above; quoted steps (`"..."` with
//!   `\"`, `\\`, `\n` and `\t` escapes) may contain anything.
//!
//! Step node types come from the [`classify`] keyword table.

mod builder;
mod classify;
mod lexer;
mod parser;
mod tokens;

use log::debug;
use serde::{Deserialize, Serialize};

use junction_core::Diagram;

pub use classify::{KEYWORD_RULES, KeywordRule, Matcher, classify};

use crate::error::ParseError;

/// Options for the text front end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextOptions {
    /// Diagram title
    pub title: Option<String>,
    /// Make the first and last step of a purely linear flow START and END
    /// when their labels have no stronger keyword type
    pub positional_terminals: bool,
}

/// Parse arrow-chain text into a diagram.
///
/// # Errors
///
/// Returns every lexical error at once, or the first grammar error.
///
/// # Example
///
/// ```
/// use junction_core::NodeType;
/// use junction_parser::text::{self, TextOptions};
///
/// let diagram = text::parse(
///     "Start -> Process data -> Make decision -> End",
///     &TextOptions::default(),
/// )
/// .unwrap();
/// let types: Vec<_> = diagram.nodes().map(|n| n.node_type()).collect();
/// assert_eq!(
///     types,
///     [NodeType::Start, NodeType::Process, NodeType::Process, NodeType::End]
/// );
/// assert_eq!(diagram.edge_count(), 3);
/// ```
pub fn parse(source: &str, options: &TextOptions) -> Result<Diagram, ParseError> {
    let tokens = lexer::tokenize(source)?;
    let flow = parser::parse_flow(&tokens).map_err(|d| d.locate(source))?;
    let diagram = builder::Builder::new()
        .build(&flow, options)
        .map_err(|d| d.locate(source))?;

    debug!(
        nodes = diagram.node_count(),
        edges = diagram.edge_count();
        "Built diagram from text"
    );
    Ok(diagram)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_title_option() {
        let options = TextOptions {
            title: Some("Flow".to_string()),
            ..TextOptions::default()
        };
        let diagram = parse("A -> B", &options).unwrap();
        assert_eq!(diagram.title(), Some("Flow"));
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let err = parse("A\n-> B\n-> [x]", &TextOptions::default()).unwrap_err();
        let diag = &err.diagnostics()[0];
        assert_eq!(diag.code(), Some(ErrorCode::E106));
        assert_eq!(diag.line(), Some(3));
    }

    #[test]
    fn test_empty_input_is_empty_diagram() {
        let diagram = parse("", &TextOptions::default()).unwrap();
        assert!(diagram.is_empty());
    }
}
