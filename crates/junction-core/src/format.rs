//! Format identifiers and layout directions.
//!
//! [`Format`] is the closed set of structured diagram-as-code syntaxes with
//! both a parser and a renderer. [`SourceFormat`] adds the free-form text
//! front end, which can only be parsed. [`Direction`] is the layout hint
//! every renderer understands.
//!
//! All three parse from strings and reject anything outside their set with
//! [`UnsupportedOptionError`] rather than falling back to a default.

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::error::UnsupportedOptionError;

/// A structured diagram syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// Mermaid flowchart syntax
    #[serde(alias = "mmd")]
    Mermaid,
    /// PlantUML element/arrow syntax
    #[serde(alias = "puml")]
    PlantUml,
    /// D2 declarative diagram syntax
    D2,
    /// Graphviz DOT syntax
    #[serde(alias = "graphviz", alias = "gv")]
    Dot,
}

impl Format {
    /// All formats in declaration order.
    pub const ALL: [Format; 4] = [Format::Mermaid, Format::PlantUml, Format::D2, Format::Dot];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Mermaid => "mermaid",
            Format::PlantUml => "plantuml",
            Format::D2 => "d2",
            Format::Dot => "dot",
        }
    }

    /// Preferred file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Mermaid => "mmd",
            Format::PlantUml => "puml",
            Format::D2 => "d2",
            Format::Dot => "dot",
        }
    }

    /// Detect a format from a file extension (without the dot).
    ///
    /// Returns `None` for extensions that belong to no structured format.
    pub fn from_extension(extension: &str) -> Option<Format> {
        match extension.to_ascii_lowercase().as_str() {
            "mmd" | "mermaid" => Some(Format::Mermaid),
            "puml" | "plantuml" | "pu" => Some(Format::PlantUml),
            "d2" => Some(Format::D2),
            "dot" | "gv" => Some(Format::Dot),
            _ => None,
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Format {
    type Err = UnsupportedOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mermaid" | "mmd" => Ok(Format::Mermaid),
            "plantuml" | "puml" => Ok(Format::PlantUml),
            "d2" => Ok(Format::D2),
            "dot" | "graphviz" | "gv" => Ok(Format::Dot),
            _ => Err(UnsupportedOptionError::new(
                "format",
                s,
                "mermaid, plantuml, d2, dot",
            )),
        }
    }
}

/// Where a source string comes from: free-form text or a structured format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// Arrow-chained text handled by the text front end
    Text,
    /// One of the structured syntaxes
    Structured(Format),
}

impl Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Text => write!(f, "text"),
            SourceFormat::Structured(format) => write!(f, "{format}"),
        }
    }
}

impl FromStr for SourceFormat {
    type Err = UnsupportedOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("text") || s.eq_ignore_ascii_case("txt") {
            return Ok(SourceFormat::Text);
        }
        s.parse::<Format>()
            .map(SourceFormat::Structured)
            .map_err(|_| {
                UnsupportedOptionError::new("source format", s, "text, mermaid, plantuml, d2, dot")
            })
    }
}

impl From<Format> for SourceFormat {
    fn from(format: Format) -> Self {
        SourceFormat::Structured(format)
    }
}

/// Layout direction hint.
///
/// Configuration strings use kebab-case (`left-right`); the two-letter
/// codes used by flowchart syntaxes (`LR`) are accepted as aliases.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    #[default]
    #[serde(alias = "TD", alias = "TB")]
    TopDown,
    #[serde(alias = "LR")]
    LeftRight,
    #[serde(alias = "BT")]
    BottomUp,
    #[serde(alias = "RL")]
    RightLeft,
}

impl Direction {
    /// All directions in declaration order.
    pub const ALL: [Direction; 4] = [
        Direction::TopDown,
        Direction::LeftRight,
        Direction::BottomUp,
        Direction::RightLeft,
    ];

    /// Two-letter code (`TD`, `LR`, `BT`, `RL`).
    pub fn code(&self) -> &'static str {
        match self {
            Direction::TopDown => "TD",
            Direction::LeftRight => "LR",
            Direction::BottomUp => "BT",
            Direction::RightLeft => "RL",
        }
    }

    /// Whether the main axis is horizontal.
    pub fn is_horizontal(&self) -> bool {
        matches!(self, Direction::LeftRight | Direction::RightLeft)
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Direction {
    type Err = UnsupportedOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "td" | "tb" | "top-down" | "top_down" | "topdown" => Ok(Direction::TopDown),
            "lr" | "left-right" | "left_right" | "leftright" => Ok(Direction::LeftRight),
            "bt" | "bottom-up" | "bottom_up" | "bottomup" => Ok(Direction::BottomUp),
            "rl" | "right-left" | "right_left" | "rightleft" => Ok(Direction::RightLeft),
            _ => Err(UnsupportedOptionError::new(
                "direction",
                s,
                "TD, LR, BT, RL (top-down, left-right, bottom-up, right-left)",
            )),
        }
    }
}
