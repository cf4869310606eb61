//! Bridges [`JunctionError`] to miette's graphical reports.
//!
//! A parse error becomes one [`Report`] per parser diagnostic, each carrying
//! the diagram source so that miette can underline the offending statement.
//! Every other error becomes a single report without source.

use std::{error::Error, fmt};

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, Severity, SourceCode, SourceSpan};

use junction::JunctionError;
use junction_parser::{Span, error::Diagnostic};

/// One renderable error.
#[derive(Debug)]
pub struct Report<'a> {
    message: String,
    code: Option<String>,
    severity: Severity,
    help: Option<String>,
    source_code: Option<&'a str>,
    labels: Vec<LabeledSpan>,
    cause: Option<&'a (dyn Error + 'static)>,
}

impl<'a> Report<'a> {
    fn from_diagnostic(diag: &Diagnostic, src: &'a str) -> Self {
        let labels = diag
            .labels()
            .iter()
            .map(|label| {
                let message = Some(label.message().to_string());
                let span = to_source_span(label.span());
                if label.is_primary() {
                    LabeledSpan::new_primary_with_span(message, span)
                } else {
                    LabeledSpan::new_with_span(message, span)
                }
            })
            .collect();

        Self {
            message: diag.message().to_string(),
            code: diag.code().map(|code| code.to_string()),
            severity: if diag.severity().is_warning() {
                Severity::Warning
            } else {
                Severity::Error
            },
            help: diag.help().map(str::to_string),
            source_code: Some(src),
            labels,
            cause: None,
        }
    }

    fn from_error(err: &'a JunctionError) -> Self {
        let code = match err {
            JunctionError::Io(_) => "junction::io",
            JunctionError::Parse { .. } => "junction::parse",
            JunctionError::Validation(_) => "junction::validation",
            JunctionError::Cycle(_) => "junction::cycle",
            JunctionError::Option(_) => "junction::option",
        };
        let help = match err {
            JunctionError::Cycle(_) => {
                Some("run `junction validate --rule no-cycles` to list every cycle".to_string())
            }
            JunctionError::Option(_) => Some("see `junction --help` for accepted values".to_string()),
            _ => None,
        };

        Self {
            message: err.to_string(),
            code: Some(code.to_string()),
            severity: Severity::Error,
            help,
            source_code: None,
            labels: Vec::new(),
            cause: err.source(),
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for Report<'_> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
    }
}

impl MietteDiagnostic for Report<'_> {
    fn code<'b>(&'b self) -> Option<Box<dyn fmt::Display + 'b>> {
        self.code
            .as_deref()
            .map(|code| Box::new(code) as Box<dyn fmt::Display + 'b>)
    }

    fn severity(&self) -> Option<Severity> {
        Some(self.severity)
    }

    fn help<'b>(&'b self) -> Option<Box<dyn fmt::Display + 'b>> {
        self.help
            .as_deref()
            .map(|help| Box::new(help) as Box<dyn fmt::Display + 'b>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.source_code
            .as_ref()
            .map(|src| src as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        if self.labels.is_empty() {
            None
        } else {
            Some(Box::new(self.labels.iter().cloned()))
        }
    }
}

fn to_source_span(span: Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}

/// Split an error into the reports the CLI prints, one per parser
/// diagnostic.
pub fn to_reports(err: &JunctionError) -> Vec<Report<'_>> {
    match err {
        JunctionError::Parse { err: parse_err, src } => parse_err
            .diagnostics()
            .iter()
            .map(|diag| Report::from_diagnostic(diag, src))
            .collect(),
        _ => vec![Report::from_error(err)],
    }
}

#[cfg(test)]
mod tests {
    use junction::{Diagram, Edge, Node, format::Format, graph::topological_sort};
    use junction_parser::error::{ErrorCode, ParseError};

    use super::*;

    fn code_of(report: &Report<'_>) -> Option<String> {
        report.code().map(|code| code.to_string())
    }

    #[test]
    fn test_parse_diagnostic_keeps_source_and_help() {
        let diag = Diagnostic::error("node `y` is not declared")
            .with_code(ErrorCode::E200)
            .with_label(Span::new(6..7), "not declared")
            .with_help("declare the node first");
        let err = JunctionError::new_parse_error(ParseError::from(diag), "x --> y");

        let reports = to_reports(&err);
        assert_eq!(reports.len(), 1);

        let report = &reports[0];
        assert_eq!(report.to_string(), "node `y` is not declared");
        assert_eq!(code_of(report), Some("E200".to_string()));
        assert_eq!(report.severity(), Some(Severity::Error));
        assert!(report.source_code().is_some());
        assert_eq!(
            report.help().map(|help| help.to_string()),
            Some("declare the node first".to_string())
        );
    }

    #[test]
    fn test_one_report_per_diagnostic() {
        let diags = vec![
            Diagnostic::error("node `b` is not declared")
                .with_code(ErrorCode::E200)
                .with_label(Span::new(5..6), "not declared"),
            Diagnostic::error("node `a` is declared multiple times")
                .with_code(ErrorCode::E201)
                .with_label(Span::new(10..11), "duplicate declaration"),
            Diagnostic::warning("shape `cloud` read as a process"),
        ];
        let err = JunctionError::new_parse_error(ParseError::from(diags), "a --> b\na[A]");

        let reports = to_reports(&err);
        let messages: Vec<_> = reports.iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            [
                "node `b` is not declared",
                "node `a` is declared multiple times",
                "shape `cloud` read as a process",
            ]
        );
        assert_eq!(reports[2].severity(), Some(Severity::Warning));
        assert!(reports[2].labels().is_none());
    }

    #[test]
    fn test_errors_without_source() {
        let err = JunctionError::from("svg".parse::<Format>().unwrap_err());
        let reports = to_reports(&err);
        assert_eq!(reports.len(), 1);
        assert_eq!(code_of(&reports[0]), Some("junction::option".to_string()));
        assert!(reports[0].source_code().is_none());

        let mut diagram = Diagram::new();
        diagram.add_node(Node::new("a", "A")).unwrap();
        diagram.add_edge(Edge::new("a", "a"));
        let err = JunctionError::from(topological_sort(&diagram).unwrap_err());
        let reports = to_reports(&err);
        assert_eq!(code_of(&reports[0]), Some("junction::cycle".to_string()));
        assert!(reports[0].help().is_some());
    }

    #[test]
    fn test_primary_flag_on_labels() {
        let diag = Diagnostic::error("node `a` is declared multiple times")
            .with_label(Span::new(10..11), "declared again here")
            .with_secondary_label(Span::new(0..1), "first declared here");
        let report = Report::from_diagnostic(&diag, "a[A]\nb[B]\na[C]");

        let labels: Vec<_> = report.labels().unwrap().collect();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].label(), Some("declared again here"));
        assert!(labels[0].primary());
        assert!(!labels[1].primary());
    }
}
