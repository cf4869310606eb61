//! CLI logic for the Junction flowchart tool.
//!
//! Each subcommand reads one or more diagram files, runs one library
//! operation and writes the result to a file or to standard output.

pub mod error_adapter;

mod args;
mod config;

pub use args::{
    Args, Command, ConvertArgs, DiffArgs, ExtractArgs, InputArgs, OutputArgs, PathsArgs,
    SimplifyArgs, ValidateArgs,
};

use std::{
    ffi::OsStr,
    fs,
    io::{self, Write},
    path::Path,
};

use log::{debug, info, warn};

use junction::{
    Converter, Diagram, JunctionError, ValidationError, diff,
    format::{Format, SourceFormat},
    graph::{self, SimplifyOptions},
    validate::{Linter, Validator},
};

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Every file was read, but at least one check reported an error.
    ChecksFailed,
}

/// Run the Junction CLI application, writing results to standard output.
///
/// # Errors
///
/// Returns `JunctionError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parsing errors
/// - Unknown node ids, rule names and formats
/// - Cycles when a topological order is requested
pub fn run(args: &Args) -> Result<Outcome, JunctionError> {
    let stdout = io::stdout();
    run_with_output(args, &mut stdout.lock())
}

/// Run the application, writing results to `out`.
///
/// # Errors
///
/// See [`run`].
pub fn run_with_output(args: &Args, out: &mut impl Write) -> Result<Outcome, JunctionError> {
    let app_config = config::load_config(args.config.as_ref())?;
    let converter = Converter::new(app_config);

    match &args.command {
        Command::Convert(cmd) => convert(&converter, cmd, out),
        Command::Validate(cmd) => validate(&converter, cmd, out),
        Command::Stats(input) => {
            let diagram = read_diagram(&converter, input)?;
            write!(out, "{}", graph::statistics(&diagram))?;
            Ok(Outcome::Success)
        }
        Command::Simplify(cmd) => simplify(&converter, cmd, out),
        Command::Diff(cmd) => diff_files(&converter, cmd, out),
        Command::Extract(cmd) => extract(&converter, cmd, out),
        Command::Paths(cmd) => paths(&converter, cmd, out),
        Command::Order(input) => {
            let diagram = read_diagram(&converter, input)?;
            for id in graph::topological_sort(&diagram)? {
                writeln!(out, "{id}")?;
            }
            Ok(Outcome::Success)
        }
    }
}

fn convert(
    converter: &Converter,
    cmd: &ConvertArgs,
    out: &mut impl Write,
) -> Result<Outcome, JunctionError> {
    let source_format = source_format(&cmd.input.input, cmd.input.from);
    let target = target_format(&cmd.output, Format::Mermaid);
    info!(
        input_path = cmd.input.input,
        source_format:%,
        target_format:% = target;
        "Converting diagram"
    );

    let source = fs::read_to_string(&cmd.input.input)?;
    let diagram = converter.parse(&source, source_format)?;
    let diagram = converter.transform(diagram);
    let rendered = converter.render(&diagram, target, cmd.output.direction)?;
    write_output(cmd.output.output.as_deref(), &rendered, out)?;
    Ok(Outcome::Success)
}

fn validate(
    converter: &Converter,
    cmd: &ValidateArgs,
    out: &mut impl Write,
) -> Result<Outcome, JunctionError> {
    let validator = if cmd.rules.is_empty() {
        Validator::default()
    } else {
        Validator::from_names(&cmd.rules)?
    };
    debug!(rules = validator.rules().len(); "Validator ready");

    let mut outcome = Outcome::Success;
    for path in &cmd.inputs {
        let input = InputArgs {
            input: path.clone(),
            from: cmd.from,
        };
        let diagram = read_diagram(converter, &input)?;
        let report = validator.validate(&diagram);

        let errors = report.errors().count();
        let warnings = report.warnings().count();
        if report.is_valid() {
            writeln!(out, "{path}: valid ({warnings} warning(s))")?;
        } else {
            warn!(path = path.as_str(), errors; "Diagram failed validation");
            writeln!(out, "{path}: invalid ({errors} error(s), {warnings} warning(s))")?;
            outcome = Outcome::ChecksFailed;
        }
        for issue in report.issues() {
            writeln!(out, "  {issue}")?;
        }
        if cmd.lint {
            for issue in Linter.lint(&diagram) {
                writeln!(out, "  {issue}")?;
            }
        }
    }
    Ok(outcome)
}

fn simplify(
    converter: &Converter,
    cmd: &SimplifyArgs,
    out: &mut impl Write,
) -> Result<Outcome, JunctionError> {
    let diagram = read_diagram(converter, &cmd.input)?;
    let options = SimplifyOptions {
        remove_isolated: !cmd.keep_isolated,
    };
    let simplified = graph::simplify_with(&diagram, options);
    info!(
        removed_edges = diagram.edge_count() - simplified.edge_count(),
        removed_nodes = diagram.node_count() - simplified.node_count();
        "Diagram simplified"
    );

    let fallback = structured_or_mermaid(source_format(&cmd.input.input, cmd.input.from));
    let rendered = converter.render(
        &simplified,
        target_format(&cmd.output, fallback),
        cmd.output.direction,
    )?;
    write_output(cmd.output.output.as_deref(), &rendered, out)?;
    Ok(Outcome::Success)
}

fn diff_files(
    converter: &Converter,
    cmd: &DiffArgs,
    out: &mut impl Write,
) -> Result<Outcome, JunctionError> {
    let read = |path: &String| {
        read_diagram(
            converter,
            &InputArgs {
                input: path.clone(),
                from: cmd.from,
            },
        )
    };
    let old = read(&cmd.old)?;
    let new = read(&cmd.new)?;
    let changes = diff::compare(&old, &new);

    if cmd.verbose {
        writeln!(out, "{}", changes.report().trim_end())?;
    } else if changes.has_changes() {
        writeln!(
            out,
            "{} change(s): {} node(s) added, {} removed, {} modified; {} edge(s) added, {} removed",
            changes.total_changes(),
            changes.added_nodes.len(),
            changes.removed_nodes.len(),
            changes.modified_nodes.len(),
            changes.added_edges.len(),
            changes.removed_edges.len()
        )?;
    } else {
        writeln!(out, "No changes detected.")?;
    }
    Ok(Outcome::Success)
}

fn extract(
    converter: &Converter,
    cmd: &ExtractArgs,
    out: &mut impl Write,
) -> Result<Outcome, JunctionError> {
    let diagram = read_diagram(converter, &cmd.input)?;
    let subgraph = graph::extract_subgraph(&diagram, &cmd.root, cmd.depth)?;
    debug!(root = cmd.root, nodes = subgraph.node_count(); "Subgraph extracted");

    let fallback = structured_or_mermaid(source_format(&cmd.input.input, cmd.input.from));
    let rendered = converter.render(
        &subgraph,
        target_format(&cmd.output, fallback),
        cmd.output.direction,
    )?;
    write_output(cmd.output.output.as_deref(), &rendered, out)?;
    Ok(Outcome::Success)
}

fn paths(
    converter: &Converter,
    cmd: &PathsArgs,
    out: &mut impl Write,
) -> Result<Outcome, JunctionError> {
    let diagram = read_diagram(converter, &cmd.input)?;
    for id in [&cmd.start, &cmd.end] {
        if !diagram.contains_node(id) {
            return Err(ValidationError::UnknownNode(id.clone()).into());
        }
    }

    let found = graph::find_paths(&diagram, &cmd.start, &cmd.end);
    if found.is_empty() {
        writeln!(out, "No path from {} to {}", cmd.start, cmd.end)?;
    }
    for path in found {
        writeln!(out, "{}", path.join(" -> "))?;
    }
    Ok(Outcome::Success)
}

fn read_diagram(converter: &Converter, input: &InputArgs) -> Result<Diagram, JunctionError> {
    let format = source_format(&input.input, input.from);
    debug!(input_path = input.input, format:%; "Reading diagram");
    let source = fs::read_to_string(&input.input)?;
    converter.parse(&source, format)
}

/// The explicit format, else the one implied by the file extension, else
/// free-form text.
fn source_format(path: &str, explicit: Option<SourceFormat>) -> SourceFormat {
    explicit.unwrap_or_else(|| {
        extension_format(path).map_or(SourceFormat::Text, SourceFormat::from)
    })
}

/// The explicit format, else the one implied by the output extension, else
/// `fallback`.
fn target_format(output: &OutputArgs, fallback: Format) -> Format {
    output
        .to
        .or_else(|| output.output.as_deref().and_then(extension_format))
        .unwrap_or(fallback)
}

fn extension_format(path: &str) -> Option<Format> {
    Path::new(path)
        .extension()
        .and_then(OsStr::to_str)
        .and_then(Format::from_extension)
}

fn structured_or_mermaid(format: SourceFormat) -> Format {
    match format {
        SourceFormat::Structured(format) => format,
        SourceFormat::Text => Format::Mermaid,
    }
}

fn write_output(path: Option<&str>, text: &str, out: &mut impl Write) -> Result<(), JunctionError> {
    match path {
        Some(path) => {
            fs::write(path, text)?;
            info!(output_file = path; "Diagram written");
        }
        None => out.write_all(text.as_bytes())?,
    }
    Ok(())
}
