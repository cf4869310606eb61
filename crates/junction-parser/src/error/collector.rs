//! Accumulates diagnostics across a parse so that every undeclared reference
//! or unbalanced delimiter in a file is reported at once.

use log::debug;

use crate::error::{Diagnostic, ParseError};

#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    errors: usize,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.errors += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Fails with every collected diagnostic, each resolved to its line in
    /// `source`, when at least one of them is an error. Warnings alone are
    /// dropped.
    pub fn finish(self, source: &str) -> Result<(), ParseError> {
        if self.errors == 0 {
            return Ok(());
        }

        debug!(
            errors = self.errors,
            warnings = self.diagnostics.len() - self.errors;
            "Parse failed"
        );
        Err(ParseError::new(
            self.diagnostics
                .into_iter()
                .map(|diagnostic| diagnostic.locate(source))
                .collect(),
        ))
    }
}
