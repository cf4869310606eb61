//! The error returned by every parser entry point.

use std::fmt;

use crate::error::Diagnostic;

/// Result of a single parsing step that stops at its first problem.
pub type Result<T> = std::result::Result<T, Diagnostic>;

/// One or more diagnostics, in the order they were found. Never empty when
/// produced by a parser.
#[derive(Debug, Clone)]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.diagnostics.first() {
            write!(f, "{}", first)?;
            if self.diagnostics.len() > 1 {
                write!(f, " (+{} more)", self.diagnostics.len() - 1)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}

impl From<Vec<Diagnostic>> for ParseError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_single_diagnostic() {
        let diag = Diagnostic::error("expected `-->` after `a`").with_code(ErrorCode::E100);
        let err: ParseError = diag.into();

        assert_eq!(err.diagnostics().len(), 1);
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E100));
        assert_eq!(err.to_string(), "error[E100]: expected `-->` after `a`");
    }

    #[test]
    fn test_display_counts_remaining_diagnostics() {
        let err: ParseError = vec![
            Diagnostic::error("node `b` is not declared").with_line(2),
            Diagnostic::error("node `c` is not declared").with_line(3),
            Diagnostic::error("node `d` is not declared").with_line(3),
        ]
        .into();

        assert_eq!(
            err.to_string(),
            "error: node `b` is not declared (line 2) (+2 more)"
        );
    }
}
