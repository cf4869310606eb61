//! Label escaping for each output format.
//!
//! Every encoder here has a decoder with the inverse behavior, so a label
//! written by a renderer is read back unchanged by the matching parser.

/// Characters that force a Mermaid label into quotes.
const MERMAID_RESERVED: &[char] = &[
    '[', ']', '(', ')', '{', '}', '|', '"', '<', '>', '#', '&', ';', '%', '\n', '\r',
];

/// Leading characters that would extend a `[` opener into `[/` or `[\`.
const MERMAID_RESERVED_START: &[char] = &['/', '\\'];

/// Write a Mermaid node or edge label, quoting it when needed.
///
/// Quoted labels encode `#`, `"` and newlines as Mermaid entity codes
/// (`#35;`, `#quot;`, `#10;`).
///
/// # Example
///
/// ```
/// use junction_core::escape::mermaid_label;
///
/// assert_eq!(mermaid_label("Start"), "Start");
/// assert_eq!(mermaid_label("Say \"hi\""), "\"Say #quot;hi#quot;\"");
/// ```
pub fn mermaid_label(label: &str) -> String {
    let needs_quotes = label.is_empty()
        || label.trim() != label
        || label.starts_with(MERMAID_RESERVED_START)
        || label.contains(MERMAID_RESERVED);
    if !needs_quotes {
        return label.to_string();
    }
    let mut quoted = String::with_capacity(label.len() + 2);
    quoted.push('"');
    for ch in label.chars() {
        match ch {
            '#' => quoted.push_str("#35;"),
            '"' => quoted.push_str("#quot;"),
            '\n' => quoted.push_str("#10;"),
            '\r' => quoted.push_str("#13;"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

/// Decode Mermaid entity codes (`#quot;`, `#35;`, ...) in a label.
///
/// Unknown entities are kept as written.
pub fn decode_mermaid_entities(text: &str) -> String {
    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(hash) = rest.find('#') {
        decoded.push_str(&rest[..hash]);
        let candidate = &rest[hash + 1..];
        let entity = candidate
            .find(';')
            .and_then(|end| entity_char(&candidate[..end]).map(|ch| (ch, end)));
        match entity {
            Some((ch, end)) => {
                decoded.push(ch);
                rest = &candidate[end + 1..];
            }
            None => {
                decoded.push('#');
                rest = candidate;
            }
        }
    }
    decoded.push_str(rest);
    decoded
}

fn entity_char(name: &str) -> Option<char> {
    match name {
        "quot" => Some('"'),
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ if !name.is_empty() && name.len() <= 7 && name.bytes().all(|b| b.is_ascii_digit()) => {
            name.parse::<u32>().ok().and_then(char::from_u32)
        }
        _ => None,
    }
}

/// Encode a PlantUML label.
///
/// PlantUML has no string escapes, so characters that would end a string
/// or start a comment are written as `<U+XXXX>` code points, and newlines
/// as `\n`.
pub fn plantuml_label(label: &str) -> String {
    let mut encoded = String::with_capacity(label.len());
    let mut chars = label.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => encoded.push_str("<U+0022>"),
            '\\' => encoded.push_str("<U+005C>"),
            '\'' => encoded.push_str("<U+0027>"),
            '\n' => encoded.push_str("\\n"),
            '\r' => encoded.push_str("<U+000D>"),
            '<' if chars.peek() == Some(&'U') => encoded.push_str("<U+003C>"),
            other => encoded.push(other),
        }
    }
    encoded
}

/// Decode a PlantUML label written by [`plantuml_label`] or by hand.
pub fn decode_plantuml_label(text: &str) -> String {
    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find(['<', '\\']) {
        decoded.push_str(&rest[..at]);
        let tail = &rest[at..];
        if let Some(after) = tail.strip_prefix("\\n") {
            decoded.push('\n');
            rest = after;
        } else if let Some((ch, len)) = code_point(tail) {
            decoded.push(ch);
            rest = &tail[len..];
        } else {
            let ch_len = tail.chars().next().map_or(1, char::len_utf8);
            decoded.push_str(&tail[..ch_len]);
            rest = &tail[ch_len..];
        }
    }
    decoded.push_str(rest);
    decoded
}

/// Parse a leading `<U+XXXX>` and return the character and consumed length.
fn code_point(text: &str) -> Option<(char, usize)> {
    let body = text.strip_prefix("<U+")?;
    let end = body.find('>')?;
    let hex = &body[..end];
    if hex.is_empty() || hex.len() > 6 {
        return None;
    }
    let ch = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)?;
    Some((ch, 3 + end + 1))
}

/// Write a double-quoted string with `\"`, `\\`, `\n` and `\t` escapes.
///
/// This is the string syntax of DOT and D2.
pub fn quote_escaped(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}
