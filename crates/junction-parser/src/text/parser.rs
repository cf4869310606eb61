//! Parser for arrow-chain tokens.
//!
//! Turns the token stream from the [`lexer`](super::lexer) into a tree of
//! [`Chain`]s. Grouping and delimiter errors are reported here; the
//! branch rules that depend on chain position are checked by the
//! [`builder`](super::builder).

use winnow::stream::{Stream, TokenSlice};

use super::tokens::{PositionedToken, Token};
use crate::{
    error::{Diagnostic, ErrorCode, Result},
    span::{Span, Spanned},
};

/// How an item is joined to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Separator {
    /// First item of a chain
    Start,
    /// `->` or a newline
    Then,
    /// `=>`, closing an open fork
    Merge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Chain {
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Link {
    pub separator: Separator,
    /// Branch label written as `[label]` before the item
    pub label: Option<Spanned<String>>,
    pub item: Spanned<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Item {
    Step(String),
    Parallel(Vec<Chain>),
    Loop { label: Option<String>, body: Chain },
}

/// Parse a whole token stream. Empty input yields an empty chain.
pub(crate) fn parse_flow(tokens: &[PositionedToken<'_>]) -> Result<Chain> {
    let mut parser = Parser {
        input: TokenSlice::new(tokens),
        end: tokens.last().map_or(0, |t| t.span.end()),
    };
    parser.flow()
}

struct Parser<'src> {
    input: TokenSlice<'src, PositionedToken<'src>>,
    /// Offset just past the last token
    end: usize,
}

impl<'src> Parser<'src> {
    fn flow(&mut self) -> Result<Chain> {
        self.separators();
        if self.peek().is_none() {
            return Ok(Chain { links: Vec::new() });
        }

        let chain = self.chain()?;
        match self.peek() {
            None => Ok(chain),
            Some(token) => Err(match token.token {
                Token::RightParen | Token::RightBracket => unexpected_closer(token),
                Token::Pipe => Diagnostic::error("`|` outside a parallel group")
                    .with_code(ErrorCode::E100)
                    .with_label(token.span, "unexpected `|`")
                    .with_help("separate lanes inside `parallel( ... )`"),
                _ => self.unexpected(Some(token), "`->`, `=>` or a newline"),
            }),
        }
    }

    /// Skip whitespace and comments, then look at the next token.
    fn peek(&mut self) -> Option<&'src PositionedToken<'src>> {
        while self.input.peek_token().is_some_and(|t| t.token.is_trivia()) {
            self.input.next_token();
        }
        self.input.peek_token()
    }

    fn peek_is(&mut self, expected: &Token<'_>) -> bool {
        self.peek().is_some_and(|t| t.token == *expected)
    }

    fn bump(&mut self) {
        self.input.next_token();
    }

    /// Consume separators, returning how they join the surrounding items.
    fn separators(&mut self) -> Option<Separator> {
        let mut found = None;
        while let Some(token) = self.peek().filter(|t| t.token.is_separator()) {
            self.bump();
            if token.token == Token::FatArrow {
                found = Some(Separator::Merge);
            } else if found.is_none() {
                found = Some(Separator::Then);
            }
        }
        found
    }

    /// Whether the current chain ends at the next token.
    fn at_chain_end(&mut self) -> bool {
        self.peek().is_none_or(|t| {
            matches!(
                t.token,
                Token::RightParen | Token::RightBracket | Token::Pipe
            )
        })
    }

    fn chain(&mut self) -> Result<Chain> {
        let mut links = Vec::new();
        let mut separator = Separator::Start;
        loop {
            links.push(self.link(separator)?);
            match self.separators() {
                Some(next) if !self.at_chain_end() => separator = next,
                _ => return Ok(Chain { links }),
            }
        }
    }

    fn link(&mut self, separator: Separator) -> Result<Link> {
        let label = if self.peek_is(&Token::LeftBracket) {
            Some(self.bracket_label()?)
        } else {
            None
        };

        if let Some(label) = &label {
            let dangling =
                self.at_chain_end() || self.peek().is_some_and(|t| t.token.is_separator());
            if dangling {
                return Err(Diagnostic::error("branch label is not followed by a step")
                    .with_code(ErrorCode::E106)
                    .with_label(label.span(), ErrorCode::E106.description())
                    .with_help("write the branch target after the label: `[yes] Ship`"));
            }
        }

        let item = self.item()?;
        Ok(Link {
            separator,
            label,
            item,
        })
    }

    /// Parse `[label]`. A label may not span lines.
    fn bracket_label(&mut self) -> Result<Spanned<String>> {
        let open = self.input.next_token().map(|t| t.span).unwrap_or_default();
        let text = match self.peek() {
            Some(PositionedToken {
                token: Token::Text(text),
                ..
            }) => text.to_string(),
            Some(PositionedToken {
                token: Token::Quoted(text),
                ..
            }) => text.clone(),
            Some(PositionedToken {
                token: Token::RightBracket,
                span,
            }) => {
                return Err(Diagnostic::error("empty label")
                    .with_code(ErrorCode::E100)
                    .with_label(open.union(*span), "label has no text"));
            }
            other => return Err(self.unclosed_or_unexpected(other, open, "`]`", "label text")),
        };
        self.bump();

        match self.peek() {
            Some(PositionedToken {
                token: Token::RightBracket,
                span,
            }) => {
                self.bump();
                Ok(Spanned::new(text, open.union(*span)))
            }
            other => Err(self.unclosed_or_unexpected(other, open, "`]`", "`]`")),
        }
    }

    fn item(&mut self) -> Result<Spanned<Item>> {
        let Some(token) = self.peek() else {
            return Err(self.unexpected(None, "a step"));
        };
        match &token.token {
            Token::Text(word) if word.eq_ignore_ascii_case("parallel") && self.opens_group() => {
                self.parallel()
            }
            Token::Text(word) if word.eq_ignore_ascii_case("loop") && self.opens_group() => {
                self.loop_group()
            }
            Token::Text(text) => {
                self.bump();
                Ok(Spanned::new(Item::Step(text.to_string()), token.span))
            }
            Token::Quoted(text) => {
                self.bump();
                Ok(Spanned::new(Item::Step(text.clone()), token.span))
            }
            Token::RightParen | Token::RightBracket => Err(unexpected_closer(token)),
            _ => Err(self.unexpected(Some(token), "a step")),
        }
    }

    /// Whether the keyword at the cursor is followed by `(` or `[`.
    fn opens_group(&mut self) -> bool {
        let checkpoint = self.input.checkpoint();
        self.bump();
        let opens = self
            .peek()
            .is_some_and(|t| matches!(t.token, Token::LeftParen | Token::LeftBracket));
        self.input.reset(&checkpoint);
        opens
    }

    /// Parse `parallel( chain | chain ... )`.
    fn parallel(&mut self) -> Result<Spanned<Item>> {
        let keyword = self.input.next_token().map(|t| t.span).unwrap_or_default();
        let open = self.expect_open_paren()?;

        let mut lanes = Vec::new();
        loop {
            self.separators();
            if self.at_chain_end() {
                return Err(self.empty_group(keyword, open, "parallel lane"));
            }
            lanes.push(self.chain()?);
            self.separators();

            match self.peek() {
                Some(PositionedToken {
                    token: Token::Pipe, ..
                }) => self.bump(),
                Some(PositionedToken {
                    token: Token::RightParen,
                    span,
                }) => {
                    self.bump();
                    return Ok(Spanned::new(Item::Parallel(lanes), keyword.union(*span)));
                }
                other => {
                    return Err(self.unclosed_or_unexpected(other, open, "`)`", "`|` or `)`"));
                }
            }
        }
    }

    /// Parse `loop [label]? ( chain )`.
    fn loop_group(&mut self) -> Result<Spanned<Item>> {
        let keyword = self.input.next_token().map(|t| t.span).unwrap_or_default();
        let label = if self.peek_is(&Token::LeftBracket) {
            Some(self.bracket_label()?.into_inner())
        } else {
            None
        };
        let open = self.expect_open_paren()?;

        self.separators();
        if self.at_chain_end() {
            return Err(self.empty_group(keyword, open, "loop body"));
        }
        let body = self.chain()?;
        self.separators();

        match self.peek() {
            Some(PositionedToken {
                token: Token::RightParen,
                span,
            }) => {
                self.bump();
                Ok(Spanned::new(Item::Loop { label, body }, keyword.union(*span)))
            }
            other => Err(self.unclosed_or_unexpected(other, open, "`)`", "`)`")),
        }
    }

    fn expect_open_paren(&mut self) -> Result<Span> {
        match self.peek() {
            Some(PositionedToken {
                token: Token::LeftParen,
                span,
            }) => {
                self.bump();
                Ok(*span)
            }
            other => Err(self.unexpected(other, "`(`")),
        }
    }

    /// Error for a group lane or body that ends before any item.
    fn empty_group(&mut self, keyword: Span, open: Span, what: &str) -> Diagnostic {
        match self.peek() {
            Some(PositionedToken {
                token: Token::RightParen | Token::Pipe,
                span,
            }) => Diagnostic::error(format!("empty {what}"))
                .with_code(ErrorCode::E105)
                .with_label(keyword.union(*span), ErrorCode::E105.description())
                .with_help("put at least one step inside the group"),
            other => self.unclosed_or_unexpected(other, open, "`)`", "a step"),
        }
    }

    /// At the end of input (or of the line, for labels) the delimiter
    /// opened at `open` is unclosed; otherwise the token is unexpected.
    fn unclosed_or_unexpected(
        &self,
        token: Option<&PositionedToken<'_>>,
        open: Span,
        closer: &str,
        expected: &str,
    ) -> Diagnostic {
        let line_ends = token.is_some_and(|t| t.token == Token::Newline) && closer == "`]`";
        match token {
            None => unclosed(open, closer),
            Some(_) if line_ends => unclosed(open, closer),
            Some(token) if matches!(token.token, Token::RightParen | Token::RightBracket) => {
                unexpected_closer(token)
            }
            Some(token) => self.unexpected(Some(token), expected),
        }
    }

    fn unexpected(&self, token: Option<&PositionedToken<'_>>, expected: &str) -> Diagnostic {
        match token {
            Some(token) => {
                Diagnostic::error(format!("unexpected {}, expected {expected}", token.token))
                    .with_code(ErrorCode::E100)
                    .with_label(token.span, format!("expected {expected}"))
            }
            None => Diagnostic::error(format!("unexpected end of input, expected {expected}"))
                .with_code(ErrorCode::E101)
                .with_label(
                    Span::new(self.end..self.end),
                    ErrorCode::E101.description(),
                ),
        }
    }
}

fn unclosed(open: Span, closer: &str) -> Diagnostic {
    Diagnostic::error("unclosed delimiter")
        .with_code(ErrorCode::E004)
        .with_label(open, "opened here")
        .with_help(format!("add the closing {closer}"))
}

fn unexpected_closer(token: &PositionedToken<'_>) -> Diagnostic {
    Diagnostic::error(format!("unexpected closing delimiter {}", token.token))
        .with_code(ErrorCode::E005)
        .with_label(token.span, ErrorCode::E005.description())
}
