//! Error and diagnostic system for the Junction parsers.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Multiple labeled spans for rich error context
//! - Severity levels (shared with [`junction_core::validate`])
//! - Diagnostic collector for accumulating multiple errors
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error or warning message with optional error code, multiple source
//! locations, help text and the 1-based line of the primary location.
//! Multiple diagnostics are wrapped in [`ParseError`] for returning from a
//! parser. A parser never returns a partial diagram: any error-severity
//! diagnostic fails the whole parse.
//!
//! # Example
//!
//! ```
//! # use junction_parser::error::{Diagnostic, ErrorCode};
//! # use junction_parser::Span;
//!
//! let span = Span::new(40..45);
//! let original_span = Span::new(10..15);
//!
//! let diag = Diagnostic::error("node `check` is declared multiple times")
//!     .with_code(ErrorCode::E201)
//!     .with_label(span, "duplicate declaration")
//!     .with_secondary_label(original_span, "first declared here")
//!     .with_line(3);
//!
//! assert_eq!(
//!     diag.to_string(),
//!     "error[E201]: node `check` is declared multiple times (line 3)"
//! );
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;

pub(crate) use collector::DiagnosticCollector;
pub(crate) use parse_error::Result;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use junction_core::validate::Severity;
pub use label::{Label, LabelRole};
pub use parse_error::ParseError;
