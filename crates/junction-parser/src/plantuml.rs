//! PlantUML parser.
//!
//! Reads element declarations and arrows between `@startuml` and `@enduml`:
//!
//! ```text
//! @startuml
//! title Order flow
//! left to right direction
//! usecase "Start" as start <<start>>
//! hexagon "Valid?" as check
//! start --> check
//! check -[bold]-> ship : yes
//! check ..> start : retry
//! @enduml
//! ```
//!
//! The element keyword (and for `usecase` the stereotype) gives the node
//! type. Keywords outside the node-type table, such as `actor`, `cloud` or
//! `queue`, are read as PROCESS. Arrows are classified by style: `[bold]`
//! marks a conditional edge, dotted arrows a loop-back edge. `skinparam`,
//! `hide`, `show` and `scale` lines are skipped.

use log::debug;
use winnow::{Parser as _, combinator::opt};

use junction_core::{
    Diagram, Edge, EdgeType, Node, NodeType, escape::decode_plantuml_label, shape,
};

use crate::{
    declarations::Declarations,
    error::{Diagnostic, ErrorCode, ParseError, Result},
    scan::{
        self, Context, IResult, Input, expected, failure, identifier, keyword, raw_string, ws0,
        ws1,
    },
    source::{self, Statement, Syntax},
    span::Span,
};

const SYNTAX: Syntax = Syntax {
    line_comments: &[],
    line_start_comments: &["'"],
    block_comment: Some(("/'", "'/")),
    semicolons: false,
    nesting: &[],
    escapes: false,
};

/// Element keywords read as PROCESS.
const FALLBACK_ELEMENTS: &[&str] = &[
    "actor",
    "agent",
    "artifact",
    "boundary",
    "cloud",
    "collections",
    "control",
    "entity",
    "file",
    "folder",
    "frame",
    "interface",
    "label",
    "node",
    "package",
    "person",
    "queue",
    "stack",
    "storage",
];

/// Layout and styling statements that do not affect the graph.
const IGNORED: &[&str] = &["skinparam", "hide", "show", "scale"];

/// Statements with no counterpart in the diagram model.
const UNSUPPORTED: &[&str] = &[
    "note",
    "legend",
    "header",
    "footer",
    "caption",
    "together",
    "class",
    "enum",
    "abstract",
    "partition",
];

#[derive(Debug)]
struct Element<'a> {
    keyword: &'a str,
    id: &'a str,
    label: Option<&'a str>,
    stereotype: Option<&'a str>,
}

#[derive(Debug)]
struct Arrow<'a> {
    source: &'a str,
    target: &'a str,
    edge_type: EdgeType,
    label: Option<String>,
}

/// Parse a PlantUML diagram.
pub fn parse(source: &str) -> std::result::Result<Diagram, ParseError> {
    let blanked = source::blank_comments(source, &SYNTAX).map_err(|d| d.locate(source))?;
    let statements =
        source::split_statements(&blanked, 0, &SYNTAX).map_err(|d| d.locate(source))?;

    let mut statements = statements.iter();
    let first = statements.next();
    if !first.is_some_and(|statement| first_word(statement.text).eq_ignore_ascii_case("@startuml"))
    {
        let span = first.map_or(Span::new(0..0), Statement::span);
        return Err(Diagnostic::error("missing @startuml")
            .with_code(ErrorCode::E102)
            .with_label(span, "expected `@startuml`")
            .with_help("start the diagram with `@startuml`")
            .locate(source)
            .into());
    }

    let mut decls = Declarations::new();
    let mut closed = false;
    for statement in statements {
        if closed {
            decls.emit(
                Diagnostic::error("unexpected content after @enduml")
                    .with_code(ErrorCode::E100)
                    .with_label(statement.span(), "after the end of the diagram"),
            );
            break;
        }
        if first_word(statement.text).eq_ignore_ascii_case("@enduml") {
            closed = true;
            continue;
        }
        if let Err(diagnostic) = read_statement(&mut decls, statement) {
            decls.emit(diagnostic);
        }
    }
    if !closed {
        let end = source.len();
        decls.emit(
            Diagnostic::error("missing @enduml")
                .with_code(ErrorCode::E107)
                .with_label(Span::new(end..end), "diagram ends here")
                .with_help("close the diagram with `@enduml`"),
        );
    }
    decls.finish(source)
}

fn first_word(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or_default()
}

fn read_statement(decls: &mut Declarations, statement: &Statement<'_>) -> Result<()> {
    let word = first_word(statement.text);
    let lower = word.to_ascii_lowercase();

    if lower == "title" {
        let title = statement.text[word.len()..].trim();
        decls.set_title(decode_plantuml_label(title));
        return Ok(());
    }
    if let Some(direction) = shape::direction_from_plantuml(statement.text) {
        decls.set_direction(direction);
        return Ok(());
    }
    if IGNORED.contains(&lower.as_str()) {
        debug!(statement = word; "Skipping PlantUML layout statement");
        return Ok(());
    }
    if word.starts_with('!') {
        return Err(unsupported(statement, word));
    }

    let is_element_keyword = statement.text.len() > word.len()
        && (shape::NODE_SHAPES
            .iter()
            .any(|shape| shape.plantuml_element == lower)
            || FALLBACK_ELEMENTS.contains(&lower.as_str()));
    let element_error = if is_element_keyword {
        match scan::run(statement, element) {
            Ok(element) => {
                declare_element(decls, statement, element);
                return Ok(());
            }
            Err(diagnostic) => Some(diagnostic),
        }
    } else {
        None
    };

    match scan::run(statement, arrow) {
        Ok(arrow) => {
            let mut edge = Edge::new(arrow.source, arrow.target).with_type(arrow.edge_type);
            if let Some(label) = arrow.label {
                edge = edge.with_label(label);
            }
            decls.connect(
                edge,
                statement.span_of(arrow.source),
                statement.span_of(arrow.target),
            );
            Ok(())
        }
        Err(_) if UNSUPPORTED.contains(&lower.as_str()) => Err(unsupported(statement, word)),
        Err(diagnostic) => Err(element_error.unwrap_or(diagnostic)),
    }
}

fn unsupported(statement: &Statement<'_>, word: &str) -> Diagnostic {
    Diagnostic::error(format!("`{word}` statements are not supported"))
        .with_code(ErrorCode::E103)
        .with_label(statement.span(), ErrorCode::E103.description())
        .with_help("only element declarations and arrows are read")
}

fn declare_element(decls: &mut Declarations, statement: &Statement<'_>, element: Element<'_>) {
    let node_type = shape::node_type_from_plantuml(element.keyword, element.stereotype)
        .unwrap_or_else(|| {
            debug!(
                element = element.keyword,
                stereotype:? = element.stereotype;
                "Unknown PlantUML element read as process"
            );
            NodeType::Process
        });
    let label = element
        .label
        .map_or_else(|| element.id.to_string(), decode_plantuml_label);
    decls.declare_node(
        Node::new(element.id, label).with_type(node_type),
        statement.span_of(element.id),
    );
}

/// Parse `keyword "label" as id <<stereotype>>` or `keyword id as "label"`.
fn element<'a>(input: &mut Input<'a>) -> IResult<Element<'a>> {
    let keyword_text = identifier
        .context(Context::Label("element keyword"))
        .parse_next(input)?;
    ws1(input)?;

    let (id, label) = if input.starts_with('"') {
        let label = raw_string(input)?;
        (ws1, keyword("as"), ws1).parse_next(input)?;
        let id = identifier
            .context(Context::Label("element id"))
            .parse_next(input)?;
        (id, Some(label))
    } else {
        let id = identifier
            .context(Context::Label("element id"))
            .parse_next(input)?;
        let label = opt((ws1, keyword("as"), ws1, raw_string).map(|(_, _, _, label)| label))
            .parse_next(input)?;
        (id, label)
    };

    ws0(input)?;
    let stereotype = opt(stereotype).parse_next(input)?;
    ws0(input)?;
    // Inline colors such as `#LightBlue` only affect styling.
    opt(('#', identifier)).parse_next(input)?;

    Ok(Element {
        keyword: keyword_text,
        id,
        label,
        stereotype,
    })
}

fn stereotype<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    let start = input.len();
    let Some(body) = input.strip_prefix("<<") else {
        return Err(expected("stereotype"));
    };
    let Some(end) = body.find(">>") else {
        return Err(failure(
            ErrorCode::E004,
            "unclosed stereotype",
            Some("close the stereotype with `>>`"),
            start,
        ));
    };
    *input = &body[end + 2..];
    Ok(body[..end].trim())
}

/// Parse `source ARROW target ( : label )?`.
fn arrow<'a>(input: &mut Input<'a>) -> IResult<Arrow<'a>> {
    let first = identifier
        .context(Context::Label("node id"))
        .parse_next(input)?;
    ws0(input)?;
    let start = input.len();
    let token = arrow_token
        .context(Context::Label("arrow"))
        .parse_next(input)?;
    let (edge_type, reversed) = arrow_type(token).ok_or_else(|| {
        failure(
            ErrorCode::E100,
            "unknown arrow",
            Some("use `-->`, `-[bold]->` or `..>`"),
            start,
        )
    })?;
    ws0(input)?;
    let second = identifier
        .context(Context::Label("node id"))
        .parse_next(input)?;

    ws0(input)?;
    let label = if let Some(rest) = input.strip_prefix(':') {
        *input = "";
        Some(decode_plantuml_label(rest.trim())).filter(|label| !label.is_empty())
    } else {
        None
    };

    let (source, target) = if reversed {
        (second, first)
    } else {
        (first, second)
    };
    Ok(Arrow {
        source,
        target,
        edge_type,
        label,
    })
}

/// Scan an arrow such as `-->`, `-[bold]->`, `..>`, `-up->` or `<--`.
fn arrow_token<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    let text = *input;
    let mut len = 0;
    while let Some(ch) = text[len..].chars().next() {
        let rest = &text[len..];
        match ch {
            '-' | '.' | '<' | '>' | '*' | '|' => len += 1,
            '[' => match rest.find(']') {
                Some(close) => len += close + 1,
                None => break,
            },
            c if c.is_ascii_alphabetic() && text[..len].ends_with('-') => {
                let word = rest
                    .find(|c: char| !c.is_ascii_alphabetic())
                    .unwrap_or(rest.len());
                if rest[word..].starts_with('-') {
                    len += word;
                } else {
                    break;
                }
            }
            _ => break,
        }
    }
    let token = &text[..len];
    if !token.contains(['-', '.']) {
        return Err(expected("arrow"));
    }
    *input = &text[len..];
    Ok(token)
}

/// Classify an arrow, returning its edge type and whether it points left.
fn arrow_type(token: &str) -> Option<(EdgeType, bool)> {
    if let Some(edge_type) = shape::edge_type_from_plantuml_arrow(token) {
        return Some((edge_type, false));
    }
    let reversed = token.starts_with('<') && !token.ends_with('>');
    if token.starts_with('<') && token.ends_with('>') {
        return None;
    }
    let edge_type = if token.contains("[bold") {
        EdgeType::Conditional
    } else if token.contains('.') {
        EdgeType::LoopBack
    } else {
        EdgeType::Plain
    };
    Some((edge_type, reversed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use junction_core::{diagram::DIRECTION_KEY, format::Direction};

    fn parse_ok(source: &str) -> Diagram {
        parse(source).expect("Failed to parse")
    }

    fn codes(source: &str) -> Vec<Option<ErrorCode>> {
        parse(source)
            .unwrap_err()
            .diagnostics()
            .iter()
            .map(|d| d.code())
            .collect()
    }

    #[test]
    fn test_parse_elements_and_arrows() {
        let diagram = parse_ok(
            "@startuml\n\
             title Order flow\n\
             left to right direction\n\
             usecase \"Start\" as s <<start>>\n\
             hexagon \"Valid?\" as check\n\
             usecase \"Done\" as e <<end>>\n\
             s --> check\n\
             check -[bold]-> e : yes\n\
             check ..> s : retry\n\
             @enduml\n",
        );

        assert_eq!(diagram.title(), Some("Order flow"));
        assert_eq!(
            diagram.metadata(DIRECTION_KEY),
            Some(Direction::LeftRight.to_string().as_str())
        );
        let types: Vec<_> = diagram.nodes().map(|n| n.node_type()).collect();
        assert_eq!(
            types,
            vec![NodeType::Start, NodeType::Decision, NodeType::End]
        );
        let edges = diagram.edges();
        assert_eq!(edges[1].edge_type(), EdgeType::Conditional);
        assert_eq!(edges[1].label(), Some("yes"));
        assert_eq!(edges[2].edge_type(), EdgeType::LoopBack);
        assert_eq!(edges[2].label(), Some("retry"));
    }

    #[test]
    fn test_every_table_element_is_read() {
        let diagram = parse_ok(
            "@startuml\n\
             usecase \"a\" as a <<start>>\n\
             usecase \"b\" as b <<end>>\n\
             rectangle \"c\" as c\n\
             hexagon \"d\" as d\n\
             database \"e\" as e\n\
             component \"f\" as f\n\
             card \"g\" as g\n\
             @enduml",
        );
        let types: Vec<_> = diagram.nodes().map(|n| n.node_type()).collect();
        assert_eq!(types, NodeType::ALL.to_vec());
    }

    #[test]
    fn test_alias_forms_and_fallback_elements() {
        let diagram = parse_ok(
            "@startuml\n\
             actor user\n\
             cloud api as \"Public API\"\n\
             usecase \"Plain\" as p\n\
             user -> api\n\
             api <-- p\n\
             @enduml",
        );

        assert_eq!(diagram.node("user").unwrap().label(), "user");
        assert_eq!(diagram.node("api").unwrap().label(), "Public API");
        assert!(diagram.nodes().all(|n| n.node_type() == NodeType::Process));
        let pairs: Vec<_> = diagram
            .edges()
            .iter()
            .map(|e| (e.source(), e.target()))
            .collect();
        assert_eq!(pairs, vec![("user", "api"), ("p", "api")]);
    }

    #[test]
    fn test_comments_and_skinparams_are_skipped() {
        let diagram = parse_ok(
            "@startuml\n\
             ' a comment\n\
             /' block\n comment '/\n\
             skinparam monochrome true\n\
             rectangle \"A\" as a #LightBlue\n\
             a -down-> a\n\
             @enduml",
        );
        assert_eq!(diagram.node_count(), 1);
        assert_eq!(diagram.edges()[0].edge_type(), EdgeType::Plain);
    }

    #[test]
    fn test_encoded_labels_are_decoded() {
        let diagram = parse_ok(
            "@startuml\n\
             rectangle \"say <U+0022>hi<U+0022>\\nnow\" as a\n\
             a --> a : it<U+0027>s\n\
             @enduml",
        );
        assert_eq!(diagram.node("a").unwrap().label(), "say \"hi\"\nnow");
        assert_eq!(diagram.edges()[0].label(), Some("it's"));
    }

    #[test]
    fn test_missing_markers() {
        assert_eq!(codes("rectangle a\n@enduml"), vec![Some(ErrorCode::E102)]);
        assert_eq!(
            codes("@startuml\nrectangle a"),
            vec![Some(ErrorCode::E107)]
        );
    }

    #[test]
    fn test_reference_errors() {
        assert_eq!(
            codes("@startuml\nrectangle a\na --> b\n@enduml"),
            vec![Some(ErrorCode::E200)]
        );
        assert_eq!(
            codes("@startuml\nrectangle a\ncard a\n@enduml"),
            vec![Some(ErrorCode::E201)]
        );
    }

    #[test]
    fn test_unsupported_and_malformed_statements() {
        assert_eq!(
            codes("@startuml\nnote left of a\n@enduml"),
            vec![Some(ErrorCode::E103)]
        );
        assert_eq!(
            codes("@startuml\nrectangle \"x\" a\n@enduml"),
            vec![Some(ErrorCode::E100)]
        );
    }

    #[test]
    fn test_arrow_classification() {
        assert_eq!(arrow_type("-->"), Some((EdgeType::Plain, false)));
        assert_eq!(arrow_type("->"), Some((EdgeType::Plain, false)));
        assert_eq!(arrow_type("-[bold]->"), Some((EdgeType::Conditional, false)));
        assert_eq!(arrow_type("..>"), Some((EdgeType::LoopBack, false)));
        assert_eq!(arrow_type("<--"), Some((EdgeType::Plain, true)));
        assert_eq!(arrow_type("<-->"), None);
    }
}
