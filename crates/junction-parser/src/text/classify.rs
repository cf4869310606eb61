//! Keyword-based node-type inference for step labels.

use junction_core::NodeType;

/// How a rule decides whether it matches a label.
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// Any whole word of the label, compared case-insensitively
    Words(&'static [&'static str]),
    /// Any of the words, or the trimmed label ends with the suffix
    WordsOrSuffix(&'static [&'static str], char),
}

/// One row of the classification table.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub matcher: Matcher,
    pub node_type: NodeType,
}

/// Rules in priority order; the first match wins. Labels that match none
/// are PROCESS.
pub const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        matcher: Matcher::Words(&["start", "begin"]),
        node_type: NodeType::Start,
    },
    KeywordRule {
        matcher: Matcher::Words(&["end", "finish", "stop", "done"]),
        node_type: NodeType::End,
    },
    KeywordRule {
        matcher: Matcher::WordsOrSuffix(
            &["decide", "check", "if", "whether", "verify", "validate"],
            '?',
        ),
        node_type: NodeType::Decision,
    },
    KeywordRule {
        matcher: Matcher::Words(&[
            "database", "db", "store", "storage", "cache", "save", "persist",
        ]),
        node_type: NodeType::Data,
    },
    KeywordRule {
        matcher: Matcher::Words(&["subprocess", "subroutine", "procedure", "call"]),
        node_type: NodeType::Subprocess,
    },
];

impl Matcher {
    fn matches(&self, label: &str, words: &[String]) -> bool {
        let has_word = |keywords: &[&str]| words.iter().any(|w| keywords.contains(&w.as_str()));
        match self {
            Matcher::Words(keywords) => has_word(keywords),
            Matcher::WordsOrSuffix(keywords, suffix) => {
                label.trim_end().ends_with(*suffix) || has_word(keywords)
            }
        }
    }
}

/// Infer the node type of a step from its label.
///
/// ```
/// use junction_core::NodeType;
/// use junction_parser::text::classify;
///
/// assert_eq!(classify("Begin checkout"), NodeType::Start);
/// assert_eq!(classify("Payment ok?"), NodeType::Decision);
/// assert_eq!(classify("Send email"), NodeType::Process);
/// ```
pub fn classify(label: &str) -> NodeType {
    let words: Vec<String> = label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect();

    KEYWORD_RULES
        .iter()
        .find(|rule| rule.matcher.matches(label, &words))
        .map_or(NodeType::Process, |rule| rule.node_type)
}
