use std::fmt;

use crate::span::Span;

/// Token types for the arrow-chain text syntax
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token<'src> {
    /// Bare step or label text, trimmed
    Text(&'src str),
    /// Decoded content of a double-quoted string
    Quoted(String),

    // Separators
    Arrow,    // ->
    FatArrow, // =>
    Newline,

    // Punctuation
    Pipe,         // |
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]

    // Comments
    LineComment(&'src str), // // comment

    Whitespace,
}

impl Token<'_> {
    /// Whether the token separates two items of a chain.
    pub fn is_separator(&self) -> bool {
        matches!(self, Token::Arrow | Token::FatArrow | Token::Newline)
    }

    /// Whether the token carries no meaning for the parser.
    pub fn is_trivia(&self) -> bool {
        matches!(self, Token::Whitespace | Token::LineComment(_))
    }
}

/// A token with its position in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Text(text) => write!(f, "`{text}`"),
            Token::Quoted(text) => write!(f, "\"{text}\""),
            Token::Arrow => write!(f, "`->`"),
            Token::FatArrow => write!(f, "`=>`"),
            Token::Newline => write!(f, "newline"),
            Token::Pipe => write!(f, "`|`"),
            Token::LeftParen => write!(f, "`(`"),
            Token::RightParen => write!(f, "`)`"),
            Token::LeftBracket => write!(f, "`[`"),
            Token::RightBracket => write!(f, "`]`"),
            Token::LineComment(_) => write!(f, "comment"),
            Token::Whitespace => write!(f, "whitespace"),
        }
    }
}
