//! Mermaid flowchart parser.
//!
//! Reads the flowchart subset that Junction renders, plus common
//! hand-written forms:
//!
//! ```text
//! ---
//! title: Order flow
//! ---
//! flowchart LR
//!     start([Start]) --> check{Valid?}
//!     check ==>|yes| ship[[Ship order]]
//!     check -.->|retry| start
//!     style ship fill:#f9f,stroke:#333
//! ```
//!
//! - The `graph`/`flowchart` header is required; its direction is optional.
//! - Nodes are declared by an id followed by a shape, either on their own
//!   line or inline at an edge endpoint. A bare id on its own line declares
//!   a rectangle labelled with the id. Bare ids inside edges are references
//!   and must be declared somewhere in the input.
//! - Shapes outside the node-type table (`((circle))`, `{{hexagon}}`,
//!   `>flag]`, `[/slanted/]`) are read as PROCESS.
//! - Labels may be quoted; entity codes such as `#quot;` are decoded.
//! - `subgraph`, `classDef` and the other styling statements are rejected.

use log::debug;
use winnow::{
    Parser as _,
    combinator::{alt, opt, preceded},
    token::take_while,
};

use junction_core::{
    Diagram, Edge, EdgeType, Node, NodeType, escape::decode_mermaid_entities,
    format::Direction, shape,
};

use crate::{
    declarations::Declarations,
    error::{Diagnostic, ErrorCode, ParseError, Result},
    scan::{
        self, Context, IResult, Input, expected, failure, identifier, is_id_char, keyword,
        raw_string, ws0, ws1,
    },
    source::{self, Statement, Syntax},
    span::Span,
};

const SYNTAX: Syntax = Syntax {
    line_comments: &["%%"],
    line_start_comments: &[],
    block_comment: None,
    semicolons: true,
    nesting: &[],
    escapes: false,
};

/// Statements that are valid Mermaid but have no place in the diagram model.
const UNSUPPORTED: &[&str] = &[
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

/// Mermaid shapes outside the node-type table, read as PROCESS.
const FALLBACK_SHAPES: &[(&str, &[&str])] = &[
    ("((", &["))"]),
    ("{{", &["}}"]),
    ("[/", &["/]", "\\]"]),
    ("[\\", &["\\]", "/]"]),
    (">", &["]"]),
];

/// An opening bracket sequence and the closers that may end it.
#[derive(Debug, Clone)]
struct Opener {
    open: &'static str,
    closers: Vec<&'static str>,
    node_type: Option<NodeType>,
}

fn openers() -> Vec<Opener> {
    let mut openers: Vec<Opener> = shape::NODE_SHAPES
        .iter()
        .map(|shape| Opener {
            open: shape.mermaid_open,
            closers: vec![shape.mermaid_close],
            node_type: Some(shape.node_type),
        })
        .chain(FALLBACK_SHAPES.iter().map(|(open, closers)| Opener {
            open,
            closers: closers.to_vec(),
            node_type: None,
        }))
        .collect();
    openers.sort_by_key(|opener| std::cmp::Reverse(opener.open.len()));
    openers
}

/// A node reference, with its shape when the reference also declares it.
#[derive(Debug)]
struct Endpoint<'a> {
    id: &'a str,
    shape: Option<(NodeType, String)>,
    /// The id and shape as written
    text: &'a str,
}

#[derive(Debug)]
struct Link {
    edge_type: EdgeType,
    label: Option<String>,
}

#[derive(Debug)]
struct Chain<'a> {
    first: Endpoint<'a>,
    rest: Vec<(Link, Endpoint<'a>)>,
}

/// Parse a Mermaid flowchart.
pub fn parse(source: &str) -> std::result::Result<Diagram, ParseError> {
    let (title, body_start) = front_matter(source)?;
    let body = &source[body_start..];
    let blanked = source::blank_comments(body, &SYNTAX).map_err(|d| d.locate(source))?;
    let statements = source::split_statements(&blanked, body_start, &SYNTAX)
        .map_err(|d| d.locate(source))?;

    let mut decls = Declarations::new();
    if let Some(title) = title {
        decls.set_title(title);
    }

    let mut statements = statements.iter();
    let Some(first) = statements.next() else {
        let end = source.len();
        return Err(missing_header(Span::new(end..end)).locate(source).into());
    };
    let direction =
        scan::run(first, header).map_err(|_| missing_header(first.span()).locate(source))?;
    if let Some(code) = direction {
        match code.parse::<Direction>() {
            Ok(direction) => decls.set_direction(direction),
            Err(err) => {
                return Err(Diagnostic::error(err.to_string())
                    .with_code(ErrorCode::E102)
                    .with_label(first.span_of(code), "unknown direction")
                    .with_help("use one of TD, TB, LR, BT, RL")
                    .locate(source)
                    .into());
            }
        }
    }

    let openers = openers();
    for statement in statements {
        if let Err(diagnostic) = read_statement(&mut decls, statement, &openers) {
            decls.emit(diagnostic);
        }
    }
    decls.finish(source)
}

fn missing_header(span: Span) -> Diagnostic {
    Diagnostic::error("missing flowchart header")
        .with_code(ErrorCode::E102)
        .with_label(span, "expected `flowchart` or `graph`")
        .with_help("start the diagram with a header such as `flowchart TD`")
}

fn read_statement(
    decls: &mut Declarations,
    statement: &Statement<'_>,
    openers: &[Opener],
) -> Result<()> {
    let word = statement
        .text
        .split(|c: char| !is_id_char(c))
        .next()
        .unwrap_or_default();
    let keyword_like = statement.text[word.len()..]
        .chars()
        .next()
        .is_none_or(char::is_whitespace);

    if keyword_like && UNSUPPORTED.contains(&word) {
        return Err(Diagnostic::error(format!("`{word}` statements are not supported"))
            .with_code(ErrorCode::E103)
            .with_label(statement.span(), ErrorCode::E103.description())
            .with_help("remove the statement; only nodes, edges and `style` are read"));
    }

    let style_error = if keyword_like && word == "style" {
        match scan::run(statement, style) {
            Ok((id, attributes)) => {
                decls.style(id, statement.span_of(id), attributes);
                return Ok(());
            }
            Err(diagnostic) => Some(diagnostic),
        }
    } else {
        None
    };

    match scan::run(statement, |input| chain(input, openers)) {
        Ok(chain) => {
            declare_chain(decls, statement, chain);
            Ok(())
        }
        Err(diagnostic) => Err(style_error.unwrap_or(diagnostic)),
    }
}

fn declare_chain(decls: &mut Declarations, statement: &Statement<'_>, chain: Chain<'_>) {
    if chain.rest.is_empty() {
        // A lone node statement always declares.
        let Endpoint { id, shape, text } = chain.first;
        let (node_type, label) = shape.unwrap_or((NodeType::Process, id.to_string()));
        decls.declare_node(
            Node::new(id, label).with_type(node_type),
            statement.span_of(text),
        );
        return;
    }

    let mut previous = chain.first;
    declare_shaped(decls, statement, &previous);
    for (link, target) in chain.rest {
        declare_shaped(decls, statement, &target);
        let mut edge = Edge::new(previous.id, target.id).with_type(link.edge_type);
        if let Some(label) = link.label {
            edge = edge.with_label(label);
        }
        decls.connect(
            edge,
            statement.span_of(previous.id),
            statement.span_of(target.id),
        );
        previous = target;
    }
}

fn declare_shaped(decls: &mut Declarations, statement: &Statement<'_>, endpoint: &Endpoint<'_>) {
    if let Some((node_type, label)) = &endpoint.shape {
        decls.declare_node(
            Node::new(endpoint.id, label.clone()).with_type(*node_type),
            statement.span_of(endpoint.text),
        );
    }
}

/// Parse `flowchart` or `graph` with an optional direction code.
fn header<'a>(input: &mut Input<'a>) -> IResult<Option<&'a str>> {
    alt((keyword("flowchart"), keyword("graph"))).parse_next(input)?;
    opt(preceded(ws1, identifier)).parse_next(input)
}

fn chain<'a>(input: &mut Input<'a>, openers: &[Opener]) -> IResult<Chain<'a>> {
    let first = endpoint(input, openers)?;
    let mut rest = Vec::new();
    loop {
        let checkpoint = *input;
        ws0(input)?;
        if input.is_empty() {
            *input = checkpoint;
            break;
        }
        let link = link(input)?;
        ws0(input)?;
        let target = endpoint(input, openers)?;
        rest.push((link, target));
    }
    Ok(Chain { first, rest })
}

fn endpoint<'a>(input: &mut Input<'a>, openers: &[Opener]) -> IResult<Endpoint<'a>> {
    let start = *input;
    let id = identifier
        .context(Context::Label("node id"))
        .parse_next(input)?;
    let shape = if openers.iter().any(|opener| input.starts_with(opener.open)) {
        Some(node_shape(input, openers)?)
    } else {
        None
    };
    let consumed = start.len() - input.len();
    Ok(Endpoint {
        id,
        shape,
        text: &start[..consumed],
    })
}

/// Parse a bracketed node shape and its label.
fn node_shape(input: &mut Input<'_>, openers: &[Opener]) -> IResult<(NodeType, String)> {
    let start = input.len();
    let Some(opener) = openers.iter().find(|opener| input.starts_with(opener.open)) else {
        return Err(expected("node shape"));
    };
    *input = &input[opener.open.len()..];

    let unclosed = || {
        failure(
            ErrorCode::E004,
            "unclosed node shape",
            Some("close the shape with its matching bracket"),
            start,
        )
    };

    let label = if input.trim_start().starts_with('"') {
        ws0(input)?;
        let raw = raw_string(input)?;
        ws0(input)?;
        let closer = opener
            .closers
            .iter()
            .find(|closer| input.starts_with(**closer))
            .ok_or_else(unclosed)?;
        *input = &input[closer.len()..];
        decode_mermaid_entities(raw)
    } else {
        let (at, len) = opener
            .closers
            .iter()
            .filter_map(|closer| input.find(closer).map(|at| (at, closer.len())))
            .min()
            .ok_or_else(unclosed)?;
        let raw = &input[..at];
        *input = &input[at + len..];
        decode_mermaid_entities(raw.trim())
    };

    let node_type = match opener.node_type {
        Some(node_type) => node_type,
        None => {
            debug!(shape = opener.open; "Unknown Mermaid shape read as process");
            NodeType::Process
        }
    };
    Ok((node_type, label))
}

/// Parse an arrow with an optional `|label|`.
fn link(input: &mut Input<'_>) -> IResult<Link> {
    let start = input.len();
    let arrow = take_while(2.., ['-', '.', '=', '>'])
        .context(Context::Label("arrow"))
        .parse_next(input)?;
    let edge_type = arrow_type(arrow).ok_or_else(|| {
        failure(
            ErrorCode::E100,
            "unknown arrow",
            Some("use `-->`, `==>` or `-.->`"),
            start,
        )
    })?;

    let checkpoint = *input;
    ws0(input)?;
    let label = if input.starts_with('|') {
        Some(pipe_label(input)?)
    } else {
        *input = checkpoint;
        None
    };
    Ok(Link { edge_type, label })
}

fn arrow_type(arrow: &str) -> Option<EdgeType> {
    if let Some(edge_type) = shape::edge_type_from_mermaid_arrow(arrow) {
        return Some(edge_type);
    }
    let body = arrow.strip_suffix('>').unwrap_or(arrow);
    let headed = body.len() < arrow.len();
    if body.contains('>') {
        return None;
    }
    if body.contains('.') {
        return headed.then_some(EdgeType::LoopBack);
    }
    if body.chars().all(|c| c == '=') && body.len() >= 2 {
        return Some(EdgeType::Conditional);
    }
    if body.chars().all(|c| c == '-') && (body.len() >= 3 || (headed && body.len() >= 2)) {
        return Some(EdgeType::Plain);
    }
    None
}

fn pipe_label(input: &mut Input<'_>) -> IResult<String> {
    let start = input.len();
    *input = &input[1..];
    let unclosed = || {
        failure(
            ErrorCode::E004,
            "unclosed edge label",
            Some("close the label with `|`"),
            start,
        )
    };
    if input.trim_start().starts_with('"') {
        ws0(input)?;
        let raw = raw_string(input)?;
        ws0(input)?;
        if !input.starts_with('|') {
            return Err(unclosed());
        }
        *input = &input[1..];
        Ok(decode_mermaid_entities(raw))
    } else {
        let at = input.find('|').ok_or_else(unclosed)?;
        let raw = &input[..at];
        *input = &input[at + 1..];
        Ok(decode_mermaid_entities(raw.trim()))
    }
}

/// Parse `style id key:value,key:value`.
fn style<'a>(input: &mut Input<'a>) -> IResult<(&'a str, Vec<(String, String)>)> {
    keyword("style").parse_next(input)?;
    ws1(input)?;
    let id = identifier.parse_next(input)?;
    ws1(input)?;
    let start = input.len();
    let rest = std::mem::take(input);
    let mut attributes = Vec::new();
    for entry in rest.split(',') {
        let (key, value) = entry.split_once(':').unwrap_or((entry, ""));
        let key = key.trim();
        if key.is_empty() {
            return Err(failure(
                ErrorCode::E100,
                "empty style property",
                Some("write properties as `key:value`"),
                start,
            ));
        }
        attributes.push((key.to_string(), value.trim().to_string()));
    }
    Ok((id, attributes))
}

/// Read `---`-delimited front matter.
///
/// Returns the title, if any, and the offset where the flowchart begins.
fn front_matter(source: &str) -> Result<(Option<String>, usize)> {
    let trimmed = source.trim_start();
    let open_at = source.len() - trimmed.len();
    let mut lines = trimmed.split_inclusive('\n');
    match lines.next() {
        Some(line) if line.trim() == "---" => {}
        _ => return Ok((None, 0)),
    }

    let mut offset = open_at + trimmed.split_inclusive('\n').next().map_or(0, str::len);
    let mut title = None;
    for line in lines {
        let end = offset + line.len();
        let content = line.trim();
        if content == "---" {
            return Ok((title, end));
        }
        if let Some(value) = content.strip_prefix("title:") {
            title = Some(front_matter_value(value.trim()));
        }
        offset = end;
    }

    Err(Diagnostic::error("unterminated front matter")
        .with_code(ErrorCode::E004)
        .with_label(Span::new(open_at..open_at + 3), "opened here")
        .with_help("close the front matter with a `---` line")
        .locate(source))
}

fn front_matter_value(value: &str) -> String {
    if value.starts_with('"') {
        let mut input = value;
        if let Ok(decoded) = scan::escaped_string(&mut input) {
            return decoded;
        }
    }
    if let Some(inner) = value
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        return inner.replace("''", "'");
    }
    value.to_string()
}
