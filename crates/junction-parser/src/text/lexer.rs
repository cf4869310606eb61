//! Lexical analyzer for the arrow-chain text syntax.
//!
//! Step text is free-form, so the lexer only recognizes the separators,
//! delimiters, quoted strings and comments of the grammar. Everything else
//! up to the next such token becomes a [`Token::Text`] run with its
//! surrounding whitespace split off.

use winnow::{
    Parser as _,
    combinator::{alt, not, repeat},
    error::{ContextError, ErrMode},
    stream::{LocatingSlice, Location, Stream},
    token::{any, one_of, take_while},
};

use super::tokens::{PositionedToken, Token};
use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
};

/// Rich diagnostic information for lexer errors.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = Result<O, ErrMode<ContextError<LexerDiagnostic>>>;

fn lexer_error(
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    start: usize,
) -> ErrMode<ContextError<LexerDiagnostic>> {
    let mut e = ContextError::new();
    e.push(LexerDiagnostic {
        code,
        message,
        help,
        start,
    });
    ErrMode::Cut(e)
}

/// Parse an escape sequence in a quoted string, starting at the backslash.
fn string_escape(input: &mut Input<'_>) -> IResult<char> {
    let escape_start = input.current_token_start();
    '\\'.parse_next(input)?;

    let escaped: IResult<char> = any.parse_next(input);
    match escaped {
        Ok('"') => Ok('"'),
        Ok('\\') => Ok('\\'),
        Ok('n') => Ok('\n'),
        Ok('t') => Ok('\t'),
        _ => Err(lexer_error(
            ErrorCode::E003,
            "invalid escape sequence",
            Some("valid escapes: `\\\"`, `\\\\`, `\\n`, `\\t`"),
            escape_start,
        )),
    }
}

/// Parse a double-quoted string. Strings end at the closing quote and may
/// not span lines.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start = input.current_token_start();
    '"'.parse_next(input)?;

    let mut value = String::new();
    loop {
        let chunk: &str =
            take_while(0.., |c: char| !matches!(c, '"' | '\\' | '\n')).parse_next(input)?;
        value.push_str(chunk);
        match input.peek_token() {
            Some('"') => {
                input.next_token();
                return Ok(Token::Quoted(value));
            }
            Some('\\') => value.push(string_escape(input)?),
            _ => {
                return Err(lexer_error(
                    ErrorCode::E001,
                    "unterminated string literal",
                    Some("add closing `\"`"),
                    start,
                ));
            }
        }
    }
}

/// Parse line comment starting with '//'
fn line_comment<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    ("//", take_while(0.., |c| c != '\n'))
        .map(|(_, comment)| Token::LineComment(comment))
        .parse_next(input)
}

/// Anything that ends a word of step text.
fn word_end(input: &mut Input<'_>) -> IResult<()> {
    alt((
        "->".void(),
        "=>".void(),
        "//".void(),
        one_of(['|', '(', ')', '[', ']', '"']).void(),
        one_of(|c: char| c.is_whitespace()).void(),
    ))
    .parse_next(input)
}

fn word(input: &mut Input<'_>) -> IResult<()> {
    repeat(1.., (not(word_end), any).void()).parse_next(input)
}

fn horizontal_space<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    take_while(1.., |c: char| c.is_whitespace() && c != '\n').parse_next(input)
}

/// Parse step text: words separated by spaces, without the trailing space.
fn text<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    (word, repeat(0.., (horizontal_space, word).void()).map(|()| ()))
        .take()
        .map(Token::Text)
        .parse_next(input)
}

fn punctuation<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        "->".value(Token::Arrow),
        "=>".value(Token::FatArrow),
        '|'.value(Token::Pipe),
        '('.value(Token::LeftParen),
        ')'.value(Token::RightParen),
        '['.value(Token::LeftBracket),
        ']'.value(Token::RightBracket),
    ))
    .parse_next(input)
}

/// Parse whitespace (spaces, tabs, etc. but not newlines)
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    horizontal_space.value(Token::Whitespace).parse_next(input)
}

fn newline<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

/// Parse a single token with position tracking
fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        line_comment,   // Must come before text
        string_literal, // Must come before text
        punctuation,
        newline, // Must come before whitespace
        whitespace,
        text,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    Ok(PositionedToken::new(token, Span::new(start_pos..end_pos)))
}

/// Lexer that accumulates tokens and diagnostics during tokenization.
struct Lexer<'a> {
    tokens: Vec<PositionedToken<'a>>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Tokenize the input, collecting tokens and errors.
    fn tokenize(&mut self, mut input: Input<'a>) {
        while !input.is_empty() {
            match positioned_token(&mut input) {
                Ok(token) => self.tokens.push(token),
                Err(e) => {
                    let error_pos = input.current_token_start();
                    let diagnostic = Self::convert_err_mode(e, error_pos);
                    let in_string = diagnostic.code() == Some(ErrorCode::E003);
                    self.diagnostics.emit(diagnostic);
                    Self::recover(&mut input, in_string);
                }
            }
        }
    }

    /// Skip past the failed input. After a bad escape the rest of the
    /// string is skipped too, so its closing quote does not open a new one.
    fn recover(input: &mut Input<'a>, in_string: bool) {
        if !in_string {
            input.next_token();
            return;
        }
        while let Some(c) = input.next_token() {
            match c {
                '"' | '\n' => break,
                '\\' => {
                    input.next_token();
                }
                _ => {}
            }
        }
    }

    fn finish(self, source: &str) -> Result<Vec<PositionedToken<'a>>, ParseError> {
        self.diagnostics.finish(source).map(|()| self.tokens)
    }

    /// Convert an ErrMode and error position to a Diagnostic.
    ///
    /// Falls back to E002 (unexpected character) if the error carries no
    /// diagnostic context.
    fn convert_err_mode(
        err: ErrMode<ContextError<LexerDiagnostic>>,
        error_pos: usize,
    ) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let span = Span::new(*start..error_pos.max(*start + 1));
            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(span, code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            return diag;
        }

        let span = Span::new(error_pos..error_pos.saturating_add(1));
        Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(span, ErrorCode::E002.description())
    }
}

/// Tokenize arrow-chain text, collecting every lexical error.
pub(crate) fn tokenize(input: &str) -> Result<Vec<PositionedToken<'_>>, ParseError> {
    let mut lexer = Lexer::new();
    lexer.tokenize(LocatingSlice::new(input));
    lexer.finish(input)
}
