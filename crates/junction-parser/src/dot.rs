//! Graphviz DOT parser.
//!
//! Reads one directed graph:
//!
//! ```text
//! digraph G {
//!     label="Order flow";
//!     rankdir=LR;
//!     node [fontname="Helvetica"];
//!     start [label="Start", shape=ellipse];
//!     check [label="Valid?", shape=diamond];
//!     start -> check;
//!     check -> start [label="retry", style=dashed];
//! }
//! ```
//!
//! The `shape` attribute gives the node type. A node without one is
//! UNSPECIFIED and an unknown shape is read as PROCESS. `node [...]` and
//! `edge [...]` defaults apply to the statements that follow them. The graph
//! `label` becomes the title and `rankdir` the direction. Undirected graphs,
//! subgraphs, ports and HTML strings are rejected.

use log::debug;
use winnow::{
    Parser as _,
    combinator::{alt, opt},
    token::take_while,
};

use junction_core::{Diagram, Edge, EdgeType, Node, NodeType, shape};

use crate::{
    declarations::Declarations,
    error::{Diagnostic, ErrorCode, ParseError, Result},
    scan::{
        self, Context, IResult, Input, escaped_string, failure, is_id_char, keyword, ws0, ws1,
    },
    source::{self, Statement, Syntax},
    span::Span,
};

const SYNTAX: Syntax = Syntax {
    line_comments: &["//"],
    line_start_comments: &["#"],
    block_comment: Some(("/*", "*/")),
    semicolons: true,
    nesting: &[('{', '}'), ('[', ']')],
    escapes: true,
};

/// A DOT identifier with its source text.
#[derive(Debug)]
struct Id<'a> {
    value: String,
    raw: &'a str,
}

#[derive(Debug, Clone)]
struct Attr {
    key: String,
    value: String,
}

#[derive(Debug)]
enum Stmt<'a> {
    /// `graph [...]`, `node [...]` or `edge [...]`
    Defaults { kind: Kind, attrs: Vec<Attr> },
    /// `key = value` at graph level
    GraphAttr(Attr),
    /// A node (one id) or an edge chain (several ids)
    Chain { ids: Vec<Id<'a>>, attrs: Vec<Attr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Graph,
    Node,
    Edge,
}

/// Attribute defaults in effect at a point of the graph body.
#[derive(Debug, Default)]
struct Defaults {
    node: Vec<Attr>,
    edge: Vec<Attr>,
}

/// Parse a DOT digraph.
pub fn parse(source: &str) -> std::result::Result<Diagram, ParseError> {
    let blanked = source::blank_comments(source, &SYNTAX).map_err(|d| d.locate(source))?;
    let outer = source::split_statements(&blanked, 0, &SYNTAX).map_err(|d| d.locate(source))?;

    let Some(graph) = outer.first() else {
        return Err(Diagnostic::error("missing digraph")
            .with_code(ErrorCode::E102)
            .with_label(Span::new(0..0), "expected `digraph { ... }`")
            .locate(source)
            .into());
    };
    let body = graph_body(graph).map_err(|d| d.locate(source))?;
    let statements =
        source::split_statements(body.text, body.offset, &SYNTAX).map_err(|d| d.locate(source))?;

    let mut decls = Declarations::new();
    for extra in outer.iter().skip(1) {
        decls.emit(
            Diagnostic::error("unexpected content after the graph")
                .with_code(ErrorCode::E100)
                .with_label(extra.span(), "only one graph is read"),
        );
    }

    let mut defaults = Defaults::default();
    for statement in &statements {
        if let Err(diagnostic) = read_statement(&mut decls, &mut defaults, statement) {
            decls.emit(diagnostic);
        }
    }
    decls.finish(source)
}

/// Check the `strict? digraph ID? {` header and return the text inside the
/// braces.
fn graph_body<'a>(graph: &Statement<'a>) -> Result<Statement<'a>> {
    let mut input: Input<'a> = graph.text;
    header(&mut input)
        .map_err(|error| scan::convert_error(error, graph, input.len()).with_code(ErrorCode::E102))?;

    let open = graph.text.len() - input.len();
    let close = graph.text.rfind('}').filter(|close| *close >= open).ok_or_else(|| {
        Diagnostic::error("unclosed graph body")
            .with_code(ErrorCode::E004)
            .with_label(graph.span_at(open - 1..open), "opened here")
    })?;
    let trailing = graph.text[close + 1..].trim();
    if !trailing.is_empty() {
        return Err(Diagnostic::error("unexpected content after the graph")
            .with_code(ErrorCode::E100)
            .with_label(graph.span_of(trailing), "only one graph is read"));
    }
    Ok(Statement {
        text: &graph.text[open..close],
        offset: graph.offset + open,
    })
}

fn header(input: &mut Input<'_>) -> IResult<()> {
    opt((keyword("strict"), ws1)).parse_next(input)?;
    let start = input.len();
    let kind = alt((keyword("digraph"), keyword("graph")))
        .context(Context::Label("`digraph`"))
        .parse_next(input)?;
    if kind.eq_ignore_ascii_case("graph") {
        return Err(failure(
            ErrorCode::E102,
            "undirected graphs are not supported",
            Some("use `digraph` with `->` edges"),
            start,
        ));
    }
    ws0(input)?;
    opt(id).parse_next(input)?;
    ws0(input)?;
    '{'.context(Context::Label("`{`")).parse_next(input)?;
    Ok(())
}

fn read_statement(
    decls: &mut Declarations,
    defaults: &mut Defaults,
    statement: &Statement<'_>,
) -> Result<()> {
    let first_word = statement
        .text
        .split(|c: char| !is_id_char(c))
        .next()
        .unwrap_or_default();
    if first_word.eq_ignore_ascii_case("subgraph") || statement.text.starts_with('{') {
        return Err(Diagnostic::error("subgraphs are not supported")
            .with_code(ErrorCode::E103)
            .with_label(statement.span(), ErrorCode::E103.description())
            .with_help("declare nodes and edges at the top level"));
    }

    match scan::run(statement, body_statement)? {
        Stmt::Defaults {
            kind: Kind::Graph,
            attrs,
        } => {
            for attr in &attrs {
                graph_attribute(decls, statement, attr)?;
            }
        }
        Stmt::Defaults {
            kind: Kind::Node,
            attrs,
        } => defaults.node.extend(attrs),
        Stmt::Defaults {
            kind: Kind::Edge,
            attrs,
        } => defaults.edge.extend(attrs),
        Stmt::GraphAttr(attr) => graph_attribute(decls, statement, &attr)?,
        Stmt::Chain { ids, attrs } if ids.len() == 1 => {
            let merged: Vec<&Attr> = defaults.node.iter().chain(&attrs).collect();
            declare_node(decls, statement, &ids[0], &merged);
        }
        Stmt::Chain { ids, attrs } => {
            let merged: Vec<&Attr> = defaults.edge.iter().chain(&attrs).collect();
            for pair in ids.windows(2) {
                connect(decls, statement, &pair[0], &pair[1], &merged);
            }
        }
    }
    Ok(())
}

/// Last value of `key`, later attributes overriding earlier ones.
fn lookup<'a>(attrs: &[&'a Attr], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .rev()
        .find(|attr| attr.key == key)
        .map(|attr| attr.value.as_str())
}

fn graph_attribute(decls: &mut Declarations, statement: &Statement<'_>, attr: &Attr) -> Result<()> {
    match attr.key.as_str() {
        "label" => decls.set_title(attr.value.as_str()),
        "rankdir" => {
            let direction = shape::direction_from_dot(&attr.value).ok_or_else(|| {
                Diagnostic::error(format!("unknown rankdir `{}`", attr.value))
                    .with_code(ErrorCode::E100)
                    .with_label(statement.span(), "expected TB, LR, BT or RL")
            })?;
            decls.set_direction(direction);
        }
        other => debug!(attribute = other; "Ignoring DOT graph attribute"),
    }
    Ok(())
}

fn declare_node(decls: &mut Declarations, statement: &Statement<'_>, id: &Id<'_>, attrs: &[&Attr]) {
    let node_type = match lookup(attrs, "shape") {
        Some(shape_name) => shape::node_type_from_dot_shape(shape_name).unwrap_or_else(|| {
            debug!(shape = shape_name; "Unknown DOT shape read as process");
            NodeType::Process
        }),
        None => NodeType::Unspecified,
    };
    let label = match lookup(attrs, "label") {
        Some("\\N") | None => id.value.clone(),
        Some(label) => label.to_string(),
    };

    let mut node = Node::new(id.value.as_str(), label).with_type(node_type);
    for attr in attrs {
        if attr.key != "shape" && attr.key != "label" {
            node = node.with_attribute(attr.key.as_str(), attr.value.as_str());
        }
    }
    decls.declare_node(node, statement.span_of(id.raw));
}

fn connect(
    decls: &mut Declarations,
    statement: &Statement<'_>,
    source: &Id<'_>,
    target: &Id<'_>,
    attrs: &[&Attr],
) {
    // `style` may list several styles, e.g. `dashed,bold`.
    let edge_type = lookup(attrs, "style")
        .and_then(|styles| {
            styles
                .split(',')
                .find_map(|style| shape::edge_type_from_dot_style(style.trim()))
        })
        .unwrap_or(EdgeType::Plain);
    let mut edge = Edge::new(source.value.as_str(), target.value.as_str()).with_type(edge_type);
    if let Some(label) = lookup(attrs, "label") {
        edge = edge.with_label(label);
    }
    decls.connect(
        edge,
        statement.span_of(source.raw),
        statement.span_of(target.raw),
    );
}

fn body_statement<'a>(input: &mut Input<'a>) -> IResult<Stmt<'a>> {
    alt((defaults_statement, graph_assignment, chain)).parse_next(input)
}

fn defaults_statement<'a>(input: &mut Input<'a>) -> IResult<Stmt<'a>> {
    let word = alt((keyword("graph"), keyword("node"), keyword("edge"))).parse_next(input)?;
    let kind = match word.to_ascii_lowercase().as_str() {
        "graph" => Kind::Graph,
        "node" => Kind::Node,
        _ => Kind::Edge,
    };
    ws0(input)?;
    let attrs = attr_lists(input)?;
    Ok(Stmt::Defaults { kind, attrs })
}

fn graph_assignment<'a>(input: &mut Input<'a>) -> IResult<Stmt<'a>> {
    let key = id(input)?;
    ws0(input)?;
    '='.parse_next(input)?;
    ws0(input)?;
    let value = id(input)?;
    Ok(Stmt::GraphAttr(Attr {
        key: key.value,
        value: value.value,
    }))
}

/// Parse `id (-> id)* [attrs]*`.
fn chain<'a>(input: &mut Input<'a>) -> IResult<Stmt<'a>> {
    let mut ids = vec![id.context(Context::Label("node id")).parse_next(input)?];
    loop {
        ws0(input)?;
        let start = input.len();
        let arrow: Option<&str> = opt(alt(("->", "--"))).parse_next(input)?;
        match arrow {
            None => break,
            Some("->") => {}
            Some(_) => {
                return Err(failure(
                    ErrorCode::E100,
                    "undirected edge in a digraph",
                    Some("use `->`"),
                    start,
                ));
            }
        }
        ws0(input)?;
        ids.push(id.context(Context::Label("node id")).parse_next(input)?);
    }
    let attrs = if input.starts_with('[') {
        attr_lists(input)?
    } else {
        Vec::new()
    };
    Ok(Stmt::Chain { ids, attrs })
}

/// Parse one or more `[key=value, ...]` lists.
fn attr_lists(input: &mut Input<'_>) -> IResult<Vec<Attr>> {
    let mut attrs = Vec::new();
    attr_list(input, &mut attrs)?;
    loop {
        ws0(input)?;
        if !input.starts_with('[') {
            return Ok(attrs);
        }
        attr_list(input, &mut attrs)?;
    }
}

fn attr_list(input: &mut Input<'_>, attrs: &mut Vec<Attr>) -> IResult<()> {
    let start = input.len();
    '['.context(Context::Label("`[`")).parse_next(input)?;
    loop {
        take_while(0.., |c: char| c.is_whitespace() || c == ',' || c == ';')
            .void()
            .parse_next(input)?;
        if let Some(rest) = input.strip_prefix(']') {
            *input = rest;
            return Ok(());
        }
        if input.is_empty() {
            return Err(failure(
                ErrorCode::E004,
                "unclosed attribute list",
                Some("add the closing `]`"),
                start,
            ));
        }
        let key = id.context(Context::Label("attribute")).parse_next(input)?;
        ws0(input)?;
        let value = if opt('=').parse_next(input)?.is_some() {
            ws0(input)?;
            id.context(Context::Label("attribute value"))
                .parse_next(input)?
                .value
        } else {
            "true".to_string()
        };
        attrs.push(Attr {
            key: key.value,
            value,
        });
    }
}

/// Parse an identifier, numeral or quoted string.
fn id<'a>(input: &mut Input<'a>) -> IResult<Id<'a>> {
    if input.starts_with('"') {
        let (value, raw) = escaped_string.with_taken().parse_next(input)?;
        return Ok(Id { value, raw });
    }
    if input.starts_with('<') {
        return Err(failure(
            ErrorCode::E103,
            "HTML strings are not supported",
            Some("use a quoted string"),
            input.len(),
        ));
    }
    let raw = take_while(1.., |c: char| is_id_char(c) || c == '.')
        .context(Context::Label("identifier"))
        .parse_next(input)?;
    Ok(Id {
        value: raw.to_string(),
        raw,
    })
}
