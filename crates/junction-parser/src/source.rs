//! Comment stripping and statement splitting for line-oriented formats.
//!
//! Mermaid, PlantUML, D2 and DOT all read as a sequence of statements
//! separated by newlines (and, for some, semicolons). Statements may span
//! lines while a bracket or brace is open. This module turns a source text
//! into [`Statement`]s that keep their absolute byte offset, so every later
//! diagnostic can point back at the original text.
//!
//! Comments are blanked rather than removed: each comment character is
//! replaced by spaces of the same byte width, so offsets in the blanked
//! text are offsets in the source.

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    span::Span,
};

/// Lexical conventions of one format.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Syntax {
    /// Markers that comment out the rest of the line anywhere outside quotes.
    pub line_comments: &'static [&'static str],
    /// Markers that comment out a line only as its first non-blank text.
    pub line_start_comments: &'static [&'static str],
    pub block_comment: Option<(&'static str, &'static str)>,
    /// Whether `;` ends a statement at nesting depth zero.
    pub semicolons: bool,
    /// Bracket pairs that keep a statement open across newlines.
    pub nesting: &'static [(char, char)],
    /// Whether a backslash escapes the next character inside quotes.
    pub escapes: bool,
}

/// One statement of a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Statement<'a> {
    /// Trimmed statement text.
    pub text: &'a str,
    /// Absolute byte offset of `text` in the source.
    pub offset: usize,
}

impl<'a> Statement<'a> {
    pub fn span(&self) -> Span {
        Span::new(self.offset..self.offset + self.text.len())
    }

    /// Span of `part`, which must be a subslice of this statement's text.
    pub fn span_of(&self, part: &str) -> Span {
        let start = (part.as_ptr() as usize).saturating_sub(self.text.as_ptr() as usize);
        let start = start.min(self.text.len());
        Span::new(self.offset + start..self.offset + start + part.len())
    }

    /// Span covering `range` relative to the statement start.
    pub fn span_at(&self, range: std::ops::Range<usize>) -> Span {
        Span::new(range).shifted(self.offset)
    }
}

/// 1-based line of a byte offset.
pub fn line_number(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    source.as_bytes()[..end]
        .iter()
        .filter(|&&byte| byte == b'\n')
        .count()
        + 1
}

/// Replace every comment in `source` with spaces, keeping newlines.
///
/// Comment markers inside double-quoted strings are left alone.
pub(crate) fn blank_comments(source: &str, syntax: &Syntax) -> Result<String> {
    let mut comments: Vec<std::ops::Range<usize>> = Vec::new();
    let mut pos = 0;
    let mut at_line_start = true;
    let mut quoted = false;

    while let Some(ch) = source[pos..].chars().next() {
        let rest = &source[pos..];
        if ch == '\n' {
            quoted = false;
            at_line_start = true;
            pos += 1;
            continue;
        }
        if quoted {
            if syntax.escapes && ch == '\\' {
                pos += 1;
                if let Some(next) = source[pos..].chars().next().filter(|c| *c != '\n') {
                    pos += next.len_utf8();
                }
                continue;
            }
            if ch == '"' {
                quoted = false;
            }
            pos += ch.len_utf8();
            continue;
        }

        if let Some((open, close)) = syntax
            .block_comment
            .filter(|(open, _)| rest.starts_with(open))
        {
            let Some(close_at) = rest[open.len()..].find(close) else {
                return Err(Diagnostic::error("unterminated block comment")
                    .with_code(ErrorCode::E006)
                    .with_label(Span::new(pos..pos + open.len()), "comment starts here")
                    .with_help(format!("close the comment with `{close}`")));
            };
            let end = pos + open.len() + close_at + close.len();
            comments.push(pos..end);
            pos = end;
            continue;
        }

        let line_comment = syntax.line_comments.iter().any(|m| rest.starts_with(m))
            || (at_line_start && syntax.line_start_comments.iter().any(|m| rest.starts_with(m)));
        if line_comment {
            let end = rest.find('\n').map_or(source.len(), |i| pos + i);
            comments.push(pos..end);
            pos = end;
            continue;
        }

        if ch == '"' {
            quoted = true;
        }
        if !ch.is_whitespace() {
            at_line_start = false;
        }
        pos += ch.len_utf8();
    }

    if comments.is_empty() {
        return Ok(source.to_string());
    }

    let mut blanked = String::with_capacity(source.len());
    let mut ranges = comments.iter().peekable();
    for (i, ch) in source.char_indices() {
        while ranges.peek().is_some_and(|range| range.end <= i) {
            ranges.next();
        }
        let in_comment = ranges.peek().is_some_and(|range| range.contains(&i));
        if in_comment && ch != '\n' {
            blanked.extend(std::iter::repeat_n(' ', ch.len_utf8()));
        } else {
            blanked.push(ch);
        }
    }
    Ok(blanked)
}

/// Split `text` into statements.
///
/// `base` is the absolute offset of `text` in the source. A statement ends
/// at a newline (or `;` when enabled) outside quotes and outside any
/// nesting pair. Blank statements are skipped. Quoted strings never span
/// lines.
pub(crate) fn split_statements<'a>(
    text: &'a str,
    base: usize,
    syntax: &Syntax,
) -> Result<Vec<Statement<'a>>> {
    let mut statements = Vec::new();
    // (closer, offset of the opener)
    let mut open: Vec<(char, usize)> = Vec::new();
    let mut quote_start: Option<usize> = None;
    let mut start = 0;
    let mut escaped = false;

    let push = |statements: &mut Vec<Statement<'a>>, from: usize, to: usize| {
        let raw = &text[from..to];
        let trimmed = raw.trim_start();
        let leading = raw.len() - trimmed.len();
        let trimmed = trimmed.trim_end();
        if !trimmed.is_empty() {
            statements.push(Statement {
                text: trimmed,
                offset: base + from + leading,
            });
        }
    };

    for (i, ch) in text.char_indices() {
        if let Some(quote_at) = quote_start {
            if ch == '\n' {
                return Err(unterminated_string(base + quote_at, base + i));
            }
            if escaped {
                escaped = false;
            } else if syntax.escapes && ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                quote_start = None;
            }
            continue;
        }

        if ch == '"' {
            quote_start = Some(i);
            continue;
        }
        if let Some(&(_, closer)) = syntax.nesting.iter().find(|(opener, _)| *opener == ch) {
            open.push((closer, i));
            continue;
        }
        if syntax.nesting.iter().any(|(_, closer)| *closer == ch) {
            match open.pop() {
                Some((expected, _)) if expected == ch => {}
                Some((expected, opened_at)) => {
                    return Err(Diagnostic::error(format!(
                        "mismatched closing delimiter `{ch}`"
                    ))
                    .with_code(ErrorCode::E005)
                    .with_label(Span::new(base + i..base + i + 1), "unexpected delimiter")
                    .with_secondary_label(
                        Span::new(base + opened_at..base + opened_at + 1),
                        "opened here",
                    )
                    .with_help(format!("expected `{expected}`")));
                }
                None => {
                    return Err(Diagnostic::error(format!("unexpected closing delimiter `{ch}`"))
                        .with_code(ErrorCode::E005)
                        .with_label(
                            Span::new(base + i..base + i + 1),
                            ErrorCode::E005.description(),
                        ));
                }
            }
            continue;
        }
        if open.is_empty() && (ch == '\n' || (syntax.semicolons && ch == ';')) {
            push(&mut statements, start, i);
            start = i + 1;
        }
    }

    if let Some(quote_at) = quote_start {
        return Err(unterminated_string(base + quote_at, base + text.len()));
    }
    if let Some(&(closer, opened_at)) = open.last() {
        return Err(Diagnostic::error("unclosed delimiter")
            .with_code(ErrorCode::E004)
            .with_label(
                Span::new(base + opened_at..base + opened_at + 1),
                "opened here",
            )
            .with_help(format!("add the closing `{closer}`")));
    }
    push(&mut statements, start, text.len());
    Ok(statements)
}

fn unterminated_string(start: usize, end: usize) -> Diagnostic {
    Diagnostic::error("unterminated string literal")
        .with_code(ErrorCode::E001)
        .with_label(Span::new(start..end), ErrorCode::E001.description())
        .with_help("add closing `\"` before the end of the line")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: Syntax = Syntax {
        line_comments: &["//"],
        line_start_comments: &["#"],
        block_comment: Some(("/*", "*/")),
        semicolons: true,
        nesting: &[('{', '}'), ('[', ']')],
        escapes: true,
    };

    const LINES: Syntax = Syntax {
        line_comments: &[],
        line_start_comments: &["'"],
        block_comment: None,
        semicolons: false,
        nesting: &[],
        escapes: false,
    };

    fn texts<'a>(statements: &[Statement<'a>]) -> Vec<&'a str> {
        statements.iter().map(|s| s.text).collect()
    }

    #[test]
    fn test_line_number() {
        let source = "one\ntwo\nthree";
        assert_eq!(line_number(source, 0), 1);
        assert_eq!(line_number(source, 4), 2);
        assert_eq!(line_number(source, 8), 3);
        assert_eq!(line_number(source, 999), 3);
    }

    #[test]
    fn test_blank_comments_preserves_offsets() {
        let source = "a -> b; // trailing é\n/* block\nspans */ c";
        let blanked = blank_comments(source, &HASH).unwrap();

        assert_eq!(blanked.len(), source.len());
        assert_eq!(blanked.lines().count(), source.lines().count());
        assert!(!blanked.contains("trailing"));
        assert!(!blanked.contains("block"));
        assert_eq!(blanked.find('c'), source.rfind('c'));
    }

    #[test]
    fn test_blank_comments_ignores_markers_in_quotes() {
        let source = "a [label=\"http://x\"]";
        assert_eq!(blank_comments(source, &HASH).unwrap(), source);
    }

    #[test]
    fn test_line_start_comment_only_at_line_start() {
        let source = "' note\nA --> B : it's";
        let blanked = blank_comments(source, &LINES).unwrap();
        assert!(blanked.starts_with("      \n"));
        assert!(blanked.ends_with("it's"));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = blank_comments("a /* b", &HASH).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E006));
    }

    #[test]
    fn test_split_on_newlines_and_semicolons() {
        let statements = split_statements("  a;b\n\n c  \n", 10, &HASH).unwrap();

        assert_eq!(texts(&statements), vec!["a", "b", "c"]);
        assert_eq!(statements[0].offset, 12);
        assert_eq!(statements[2].offset, 18);
    }

    #[test]
    fn test_nesting_keeps_statement_open() {
        let statements = split_statements("a {\n  b; c\n}\nd", 0, &HASH).unwrap();
        assert_eq!(texts(&statements), vec!["a {\n  b; c\n}", "d"]);
    }

    #[test]
    fn test_quotes_hide_separators() {
        let statements = split_statements("a [label=\"x; }\"]; b", 0, &HASH).unwrap();
        assert_eq!(texts(&statements), vec!["a [label=\"x; }\"]", "b"]);
    }

    #[test]
    fn test_delimiter_errors() {
        let unclosed = split_statements("a {\n b", 0, &HASH).unwrap_err();
        assert_eq!(unclosed.code(), Some(ErrorCode::E004));

        let unexpected = split_statements("a }", 0, &HASH).unwrap_err();
        assert_eq!(unexpected.code(), Some(ErrorCode::E005));

        let mismatched = split_statements("a [ }", 0, &HASH).unwrap_err();
        assert_eq!(mismatched.code(), Some(ErrorCode::E005));
    }

    #[test]
    fn test_unterminated_string() {
        let err = split_statements("a \"open\nb", 0, &HASH).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E001));
        assert_eq!(err.primary_span(), Some(Span::new(2..7)));
    }

    #[test]
    fn test_span_of_subslice() {
        let statements = split_statements("xx  hello world", 100, &LINES).unwrap();
        let statement = statements[0];
        let world = &statement.text[statement.text.len() - 5..];

        assert_eq!(statement.span_of(world), Span::new(110..115));
    }
}
