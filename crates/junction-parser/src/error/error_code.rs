//! Error codes for the Junction diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexical errors (strings, delimiters, characters)
//! - `E1xx` - Syntax errors (headers, statements, flow markers)
//! - `E2xx` - Reference errors (node declarations and uses)

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexical Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    ///
    /// A string was opened with a quote but never closed on the same line.
    E001,

    /// Unexpected character.
    E002,

    /// Invalid escape sequence.
    ///
    /// Valid escapes are `\n`, `\t`, `\\` and `\"`.
    E003,

    /// Unclosed delimiter.
    ///
    /// A bracket, brace or parenthesis was opened but never closed.
    E004,

    /// Unexpected closing delimiter.
    E005,

    /// Unterminated block comment.
    E006,

    // =========================================================================
    // Syntax Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    E100,

    /// Incomplete input.
    ///
    /// The input ended before a complete construct was parsed.
    E101,

    /// Missing or invalid header.
    ///
    /// Every structured format starts with a header such as `flowchart TD`,
    /// `@startuml` or `digraph {`.
    E102,

    /// Unrecognized statement.
    ///
    /// The statement is valid in the format but not supported by Junction.
    E103,

    /// Branch label on the first step.
    ///
    /// A branch needs a preceding step to branch from.
    E104,

    /// Empty group.
    ///
    /// A `parallel(...)` lane or `loop(...)` body has no steps.
    E105,

    /// Dangling branch label.
    ///
    /// A `[label]` is not followed by a step.
    E106,

    /// Missing footer.
    ///
    /// A closing marker such as `@enduml` is missing.
    E107,

    // =========================================================================
    // Reference Errors (E2xx)
    // =========================================================================
    /// Undeclared node reference.
    E200,

    /// Duplicate node declaration.
    E201,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexical errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E006 => "E006",
            // Syntax errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            ErrorCode::E105 => "E105",
            ErrorCode::E106 => "E106",
            ErrorCode::E107 => "E107",
            // Reference errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Lexical errors
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "invalid escape sequence",
            ErrorCode::E004 => "unclosed delimiter",
            ErrorCode::E005 => "unexpected closing delimiter",
            ErrorCode::E006 => "unterminated block comment",
            // Syntax errors
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete input",
            ErrorCode::E102 => "missing or invalid header",
            ErrorCode::E103 => "unrecognized statement",
            ErrorCode::E104 => "branch label on first step",
            ErrorCode::E105 => "empty group",
            ErrorCode::E106 => "dangling branch label",
            ErrorCode::E107 => "missing footer",
            // Reference errors
            ErrorCode::E200 => "undeclared node",
            ErrorCode::E201 => "duplicate node declaration",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
