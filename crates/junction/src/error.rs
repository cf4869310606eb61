//! Error types for Junction operations.
//!
//! This module provides the main error type [`JunctionError`] which wraps
//! every failure of the conversion pipeline.

use std::io;

use thiserror::Error;

use junction_core::error::{CyclicGraphError, UnsupportedOptionError, ValidationError};
use junction_parser::error::ParseError;

/// The main error type for Junction operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the source text next to the diagnostics so
/// that callers can render annotated snippets.
#[derive(Debug, Error)]
pub enum JunctionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Invalid diagram: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Cycle(#[from] CyclicGraphError),

    #[error("{0}")]
    Option(#[from] UnsupportedOptionError),
}

impl JunctionError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
