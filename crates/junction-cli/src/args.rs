//! Command-line argument definitions for the Junction CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. A subcommand selects the operation; configuration file
//! selection and logging verbosity apply to every subcommand.

use clap::{Parser, Subcommand};

use junction::format::{Direction, Format, SourceFormat};

/// Command-line arguments for the Junction flowchart tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a diagram to another format
    Convert(ConvertArgs),
    /// Check diagrams against validation rules
    Validate(ValidateArgs),
    /// Print node, edge and degree statistics
    Stats(InputArgs),
    /// Remove transitive edges
    Simplify(SimplifyArgs),
    /// Compare two diagrams
    Diff(DiffArgs),
    /// Keep the part of a diagram reachable from one node
    Extract(ExtractArgs),
    /// List every simple path between two nodes
    Paths(PathsArgs),
    /// Print the nodes in topological order
    Order(InputArgs),
}

/// A diagram file and its format.
#[derive(clap::Args, Debug, Clone)]
pub struct InputArgs {
    /// Path to the input diagram
    pub input: String,

    /// Input format (text, mermaid, plantuml, d2, dot); detected from the
    /// file extension when omitted, falling back to text
    #[arg(long)]
    pub from: Option<SourceFormat>,
}

/// Where and how to write a rendered diagram.
#[derive(clap::Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output file; standard output when omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Output format (mermaid, plantuml, d2, dot); detected from the output
    /// file extension when omitted
    #[arg(long)]
    pub to: Option<Format>,

    /// Layout direction (TD, LR, BT, RL)
    #[arg(long)]
    pub direction: Option<Direction>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Diagram files to check
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Input format for every file; detected per file when omitted
    #[arg(long)]
    pub from: Option<SourceFormat>,

    /// Rule to run, repeatable (e.g. `no-cycles`, `max-nodes-20`); the
    /// default rule set when omitted
    #[arg(long = "rule")]
    pub rules: Vec<String>,

    /// Also report style suggestions
    #[arg(long)]
    pub lint: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SimplifyArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Keep nodes left without edges
    #[arg(long)]
    pub keep_isolated: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct DiffArgs {
    /// The old diagram
    pub old: String,

    /// The new diagram
    pub new: String,

    /// Input format for both files; detected per file when omitted
    #[arg(long)]
    pub from: Option<SourceFormat>,

    /// List every change instead of a summary
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Id of the node to start from
    pub root: String,

    /// Maximum number of hops from the root
    #[arg(long)]
    pub depth: Option<usize>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct PathsArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Id of the first node
    pub start: String,

    /// Id of the last node
    pub end: String,
}
