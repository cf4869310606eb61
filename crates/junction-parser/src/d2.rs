//! D2 parser.
//!
//! Reads shapes and connections with their style maps:
//!
//! ```text
//! direction: right
//! title: "Order flow" {near: top-center; shape: text}
//! start: "Start" {shape: oval}
//! check: "Valid?" {shape: diamond}
//! start -> check
//! check -> start: "retry" {style.stroke-dash: 3}
//! ```
//!
//! A shape's `shape` entry gives its node type; a shape without one is
//! UNSPECIFIED and an unknown shape is read as PROCESS. Other map entries
//! become node attributes, with nested maps flattened into dotted keys.
//! Connections may be chained (`a -> b -> c`) and point either way; their
//! style entries select the edge type. Containers, classes, variables and
//! layers are rejected.

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
    scan::{self, Context, IResult, Input, escaped_string, expected, failure, ws0},
    source::{self, Statement, Syntax},
};

const SYNTAX: Syntax = Syntax {
    line_comments: &["#"],
    line_start_comments: &[],
    block_comment: None,
    semicolons: true,
    nesting: &[('{', '}')],
    escapes: true,
};

/// Top-level keys with special meaning that the diagram model cannot hold.
const RESERVED: &[&str] = &["classes", "vars", "layers", "scenarios", "steps"];

#[derive(Debug)]
struct Key<'a> {
    name: String,
    /// Source text of the key, quotes included
    raw: &'a str,
    quoted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    key: String,
    value: String,
}

#[derive(Debug)]
struct Declaration<'a> {
    first: Key<'a>,
    /// Each following key with whether its arrow points back (`<-`)
    links: Vec<(bool, Key<'a>)>,
    label: Option<String>,
    map: Vec<Entry>,
}

impl Declaration<'_> {
    fn entry(&self, key: &str) -> Option<&str> {
        self.map
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_str())
    }
}

/// Parse a D2 diagram.
pub fn parse(source: &str) -> std::result::Result<Diagram, ParseError> {
    let blanked = source::blank_comments(source, &SYNTAX).map_err(|d| d.locate(source))?;
    let statements =
        source::split_statements(&blanked, 0, &SYNTAX).map_err(|d| d.locate(source))?;

    let mut decls = Declarations::new();
    for statement in &statements {
        if let Err(diagnostic) = read_statement(&mut decls, statement) {
            decls.emit(diagnostic);
        }
    }
    decls.finish(source)
}

fn read_statement(decls: &mut Declarations, statement: &Statement<'_>) -> Result<()> {
    if statement.text.starts_with('(') {
        return Err(unsupported(statement, "connection references"));
    }
    let decl = scan::run(statement, declaration)?;

    if decl.links.is_empty() {
        return read_shape(decls, statement, decl);
    }

    let mut previous = &decl.first;
    let edge_type = decl
        .map
        .iter()
        .find_map(|entry| shape::edge_type_from_d2_style(&entry.key, &entry.value))
        .unwrap_or(EdgeType::Plain);
    let label = decl
        .label
        .clone()
        .or_else(|| decl.entry("label").map(str::to_string));

    for (reversed, next) in &decl.links {
        for key in [previous, next] {
            check_key(statement, key)?;
        }
        let (source, target) = if *reversed {
            (next, previous)
        } else {
            (previous, next)
        };
        let mut edge = Edge::new(source.name.as_str(), target.name.as_str()).with_type(edge_type);
        if let Some(label) = &label {
            edge = edge.with_label(label.as_str());
        }
        decls.connect(
            edge,
            statement.span_of(source.raw),
            statement.span_of(target.raw),
        );
        previous = next;
    }
    Ok(())
}

fn read_shape(
    decls: &mut Declarations,
    statement: &Statement<'_>,
    decl: Declaration<'_>,
) -> Result<()> {
    let key = &decl.first;
    if !key.quoted {
        let name = key.name.to_ascii_lowercase();
        if name == "direction" && decl.map.is_empty() {
            let value = decl.label.as_deref().unwrap_or_default();
            let direction = shape::direction_from_d2(value).ok_or_else(|| {
                Diagnostic::error(format!("unknown direction `{value}`"))
                    .with_code(ErrorCode::E100)
                    .with_label(statement.span(), "expected up, down, left or right")
            })?;
            decls.set_direction(direction);
            return Ok(());
        }
        if name == "title" && decl.entry("near").is_some() {
            let title = decl
                .label
                .clone()
                .or_else(|| decl.entry("label").map(str::to_string))
                .unwrap_or_default();
            decls.set_title(title);
            return Ok(());
        }
        if RESERVED.contains(&name.as_str()) {
            return Err(unsupported(statement, &key.name));
        }
    }
    check_key(statement, key)?;

    let node_type = match decl.entry("shape") {
        Some(shape_name) => shape::node_type_from_d2_shape(shape_name).unwrap_or_else(|| {
            debug!(shape = shape_name; "Unknown D2 shape read as process");
            NodeType::Process
        }),
        None => NodeType::Unspecified,
    };
    let label = decl
        .label
        .clone()
        .or_else(|| decl.entry("label").map(str::to_string))
        .unwrap_or_else(|| key.name.clone());

    let mut node = Node::new(key.name.as_str(), label).with_type(node_type);
    for entry in &decl.map {
        if entry.key != "shape" && entry.key != "label" {
            node = node.with_attribute(entry.key.as_str(), entry.value.as_str());
        }
    }
    decls.declare_node(node, statement.span_of(key.raw));
    Ok(())
}

/// Reject container paths such as `outer.inner`.
fn check_key(statement: &Statement<'_>, key: &Key<'_>) -> Result<()> {
    if !key.quoted && key.name.contains('.') {
        return Err(Diagnostic::error("containers are not supported")
            .with_code(ErrorCode::E103)
            .with_label(statement.span_of(key.raw), "container path")
            .with_help("quote the key to use a dot inside an id"));
    }
    Ok(())
}

fn unsupported(statement: &Statement<'_>, what: &str) -> Diagnostic {
    Diagnostic::error(format!("`{what}` is not supported"))
        .with_code(ErrorCode::E103)
        .with_label(statement.span(), ErrorCode::E103.description())
        .with_help("only shapes and connections are read")
}

/// Parse `key (ARROW key)* ( : label? map? )?`.
fn declaration<'a>(input: &mut Input<'a>) -> IResult<Declaration<'a>> {
    let first = key.context(Context::Label("key")).parse_next(input)?;

    let mut links = Vec::new();
    loop {
        ws0(input)?;
        let start = input.len();
        let arrow: Option<&str> = opt(alt(("<->", "->", "<-", "--"))).parse_next(input)?;
        let reversed = match arrow {
            None => break,
            Some("->") => false,
            Some("<-") => true,
            Some(_) => {
                return Err(failure(
                    ErrorCode::E100,
                    "undirected connections are not supported",
                    Some("use `->` or `<-`"),
                    start,
                ));
            }
        };
        ws0(input)?;
        let next = key.context(Context::Label("key")).parse_next(input)?;
        links.push((reversed, next));
    }

    let mut label = None;
    let mut map = Vec::new();
    if opt(':').parse_next(input)?.is_some() {
        ws0(input)?;
        if !input.starts_with('{') {
            label = Some(value(input)?);
            ws0(input)?;
        }
        if input.starts_with('{') {
            map_entries(input, "", &mut map)?;
        }
    }

    Ok(Declaration {
        first,
        links,
        label,
        map,
    })
}

/// Parse a quoted or bare key, stopping before `:`, `;`, braces or an arrow.
fn key<'a>(input: &mut Input<'a>) -> IResult<Key<'a>> {
    if input.starts_with('"') {
        let (name, raw) = escaped_string.with_taken().parse_next(input)?;
        return Ok(Key {
            name,
            raw,
            quoted: true,
        });
    }

    let text = *input;
    let mut end = 0;
    for (i, ch) in text.char_indices() {
        let rest = &text[i..];
        if matches!(ch, ':' | ';' | '{' | '}' | '"' | '\n')
            || rest.starts_with("->")
            || rest.starts_with("<-")
            || rest.starts_with("--")
        {
            break;
        }
        end = i + ch.len_utf8();
    }
    let raw = text[..end].trim_end();
    if raw.is_empty() {
        return Err(expected("key"));
    }
    *input = &text[raw.len()..];
    Ok(Key {
        name: raw.to_string(),
        raw,
        quoted: false,
    })
}

/// Parse a label or map value: a quoted string or bare text to the end of
/// the entry.
fn value(input: &mut Input<'_>) -> IResult<String> {
    if input.starts_with('"') {
        return escaped_string(input);
    }
    let bare: &str = take_while(0.., |c: char| !matches!(c, ';' | '\n' | '{' | '}'))
        .parse_next(input)?;
    Ok(bare.trim().to_string())
}

/// Parse `{ key: value; key: { ... } }`, flattening nested keys with dots.
fn map_entries(input: &mut Input<'_>, prefix: &str, entries: &mut Vec<Entry>) -> IResult<()> {
    let start = input.len();
    '{'.parse_next(input)?;
    loop {
        take_while(0.., |c: char| c.is_whitespace() || c == ';')
            .void()
            .parse_next(input)?;
        if let Some(rest) = input.strip_prefix('}') {
            *input = rest;
            return Ok(());
        }
        if input.is_empty() {
            return Err(failure(
                ErrorCode::E004,
                "unclosed map",
                Some("add the closing `}`"),
                start,
            ));
        }

        let entry_start = input.len();
        let entry_key = key.context(Context::Label("map key")).parse_next(input)?;
        take_while(0.., [' ', '\t']).void().parse_next(input)?;
        if opt(':').parse_next(input)?.is_none() {
            return Err(failure(
                ErrorCode::E103,
                "nested declarations are not supported",
                Some("move the shape or connection to the top level"),
                entry_start,
            ));
        }
        take_while(0.., [' ', '\t']).void().parse_next(input)?;

        let full_key = if prefix.is_empty() {
            entry_key.name
        } else {
            format!("{prefix}.{}", entry_key.name)
        };
        if input.starts_with('{') {
            map_entries(input, &full_key, entries)?;
        } else {
            let value = value(input)?;
            entries.push(Entry {
                key: full_key,
                value,
            });
        }
    }
}
