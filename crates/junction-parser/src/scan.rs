//! Shared winnow building blocks for the statement parsers.
//!
//! Each structured format is split into [`Statement`]s first (see
//! [`source`](crate::source)). A statement is then parsed by a winnow parser
//! over its text, and failures are converted into [`Diagnostic`]s that point
//! at the absolute source position via [`run`].

use winnow::{
    Parser as _,
    error::{ContextError, ErrMode},
    token::{any, take_while},
};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    source::Statement,
};

/// Context type for statement parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what is currently being parsed
    Label(&'static str),
    /// A specific failure with its own error code.
    ///
    /// `start` is the remaining input length where the failing construct
    /// began, so the span runs from there to the error position.
    Failure {
        code: ErrorCode,
        message: &'static str,
        help: Option<&'static str>,
        start: usize,
    },
}

pub(crate) type Input<'a> = &'a str;
pub(crate) type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;

/// Build a cut error carrying a specific failure.
pub(crate) fn failure(
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    start: usize,
) -> ErrMode<ContextError<Context>> {
    let mut e = ContextError::new();
    e.push(Context::Failure {
        code,
        message,
        help,
        start,
    });
    ErrMode::Cut(e)
}

/// Build a backtrack error labelled with what was expected.
pub(crate) fn expected(label: &'static str) -> ErrMode<ContextError<Context>> {
    let mut e = ContextError::new();
    e.push(Context::Label(label));
    ErrMode::Backtrack(e)
}

pub(crate) fn is_id_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Skip any whitespace, newlines included.
pub(crate) fn ws0(input: &mut Input<'_>) -> IResult<()> {
    take_while(0.., char::is_whitespace)
        .void()
        .parse_next(input)
}

pub(crate) fn ws1(input: &mut Input<'_>) -> IResult<()> {
    take_while(1.., char::is_whitespace)
        .void()
        .context(Context::Label("whitespace"))
        .parse_next(input)
}

/// Parse a word of letters, digits and underscores.
pub(crate) fn identifier<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    take_while(1.., is_id_char)
        .context(Context::Label("identifier"))
        .parse_next(input)
}

/// Parse a whole word equal to `word`, ignoring ASCII case.
pub(crate) fn keyword<'a>(word: &'static str) -> impl FnMut(&mut Input<'a>) -> IResult<&'a str> {
    move |input: &mut Input<'a>| {
        take_while(1.., is_id_char)
            .verify(|found: &str| found.eq_ignore_ascii_case(word))
            .context(Context::Label(word))
            .parse_next(input)
    }
}

/// Parse a double-quoted string without escapes, returning its raw content.
pub(crate) fn raw_string<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    let start = input.len();
    if !input.starts_with('"') {
        return Err(expected("quoted string"));
    }
    let Some(close) = input[1..].find('"') else {
        return Err(failure(
            ErrorCode::E001,
            "unterminated string literal",
            Some("add closing `\"`"),
            start,
        ));
    };
    let content = &input[1..1 + close];
    *input = &input[close + 2..];
    Ok(content)
}

/// Parse a double-quoted string with backslash escapes.
///
/// `\"`, `\\`, `\n` and `\t` are decoded. Any other escape is kept as
/// written, which is how DOT and D2 tooling treat them.
pub(crate) fn escaped_string(input: &mut Input<'_>) -> IResult<String> {
    let start = input.len();
    if !input.starts_with('"') {
        return Err(expected("quoted string"));
    }
    *input = &input[1..];

    let mut value = String::new();
    loop {
        let chunk: &str = take_while(0.., |c: char| c != '"' && c != '\\').parse_next(input)?;
        value.push_str(chunk);
        let next: IResult<char> = any.parse_next(input);
        match next {
            Ok('"') => return Ok(value),
            Ok('\\') => {
                let escaped: IResult<char> = any.parse_next(input);
                match escaped {
                    Ok('"') => value.push('"'),
                    Ok('\\') => value.push('\\'),
                    Ok('n') => value.push('\n'),
                    Ok('t') => value.push('\t'),
                    Ok(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    Err(_) => break,
                }
            }
            _ => break,
        }
    }
    Err(failure(
        ErrorCode::E001,
        "unterminated string literal",
        Some("add closing `\"`"),
        start,
    ))
}

/// Run `parser` over a whole statement.
///
/// The parser must consume the statement up to trailing whitespace.
/// Failures become diagnostics positioned in the original source.
pub(crate) fn run<'a, O, P>(statement: &Statement<'a>, mut parser: P) -> Result<O>
where
    P: FnMut(&mut Input<'a>) -> IResult<O>,
{
    let mut input: Input<'a> = statement.text;
    let parsed = parser(&mut input).and_then(|value| {
        ws0(&mut input)?;
        if input.is_empty() {
            Ok(value)
        } else {
            Err(expected("end of statement"))
        }
    });
    parsed.map_err(|error| convert_error(error, statement, input.len()))
}

/// Convert a winnow error into a diagnostic for `statement`.
///
/// `remaining` is the unparsed input length at the point of failure.
pub(crate) fn convert_error(
    error: ErrMode<ContextError<Context>>,
    statement: &Statement<'_>,
    remaining: usize,
) -> Diagnostic {
    let text = statement.text;
    let position = text.len().saturating_sub(remaining);

    let context_error = match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e,
        ErrMode::Incomplete(_) => ContextError::new(),
    };

    let failure = context_error.context().find_map(|ctx| match ctx {
        Context::Failure {
            code,
            message,
            help,
            start,
        } => Some((*code, *message, *help, *start)),
        Context::Label(_) => None,
    });
    if let Some((code, message, help, start)) = failure {
        let from = text.len().saturating_sub(start).min(position);
        let to = position.max(from + 1).min(text.len()).max(from);
        let mut diag = Diagnostic::error(message)
            .with_code(code)
            .with_label(statement.span_at(from..to), code.description());
        if let Some(help) = help {
            diag = diag.with_help(help);
        }
        return diag;
    }

    let expected: Vec<&str> = context_error
        .context()
        .filter_map(|ctx| match ctx {
            Context::Label(label) => Some(*label),
            Context::Failure { .. } => None,
        })
        .collect();
    let expectation = if expected.is_empty() {
        "a valid statement".to_string()
    } else {
        expected.join(" or ")
    };

    let rest = &text[position.min(text.len())..];
    match rest.chars().next() {
        Some(found) => {
            let span = statement.span_at(position..position + found.len_utf8());
            Diagnostic::error(format!("unexpected `{found}`, expected {expectation}"))
                .with_code(ErrorCode::E100)
                .with_label(span, format!("expected {expectation}"))
        }
        None => Diagnostic::error(format!("incomplete statement, expected {expectation}"))
            .with_code(ErrorCode::E101)
            .with_label(statement.span(), ErrorCode::E101.description()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    fn statement(text: &str) -> Statement<'_> {
        Statement { text, offset: 10 }
    }

    #[test]
    fn test_identifier_and_keyword() {
        let mut input = "Style rest";
        assert_eq!(keyword("style")(&mut input).unwrap(), "Style");
        assert_eq!(input, " rest");

        let mut input = "styles";
        assert!(keyword("style")(&mut input).is_err());
    }

    #[test]
    fn test_raw_string() {
        let mut input = "\"a #quot; b\" tail";
        assert_eq!(raw_string(&mut input).unwrap(), "a #quot; b");
        assert_eq!(input, " tail");
    }

    #[test]
    fn test_escaped_string_decodes_known_escapes() {
        let mut input = r#""say \"hi\"\n\\ \l""#;
        assert_eq!(escaped_string(&mut input).unwrap(), "say \"hi\"\n\\ \\l");
        assert!(input.is_empty());
    }

    #[test]
    fn test_quote_escaped_inverts_escaped_string() {
        let text = "tab\there \"quoted\" back\\slash\nline";
        let quoted = junction_core::escape::quote_escaped(text);
        let mut input = quoted.as_str();
        assert_eq!(escaped_string(&mut input).unwrap(), text);
    }

    #[test]
    fn test_run_requires_whole_statement() {
        let stmt = statement("abc def");
        let err = run(&stmt, identifier).unwrap_err();

        assert_eq!(err.code(), Some(ErrorCode::E100));
        assert_eq!(err.primary_span(), Some(Span::new(14..15)));
    }

    #[test]
    fn test_run_reports_incomplete_input() {
        let stmt = statement("abc");
        let err = run(&stmt, |input| (identifier, ws1, identifier).parse_next(input)).unwrap_err();

        assert_eq!(err.code(), Some(ErrorCode::E101));
    }

    #[test]
    fn test_run_reports_failure_span() {
        let stmt = statement("x \"open");
        let err =
            run(&stmt, |input| (identifier, ws1, escaped_string).parse_next(input)).unwrap_err();

        assert_eq!(err.code(), Some(ErrorCode::E001));
        assert_eq!(err.primary_span(), Some(Span::new(12..17)));
    }
}
