//! Repair passes for model-generated mermaid source.
//!
//! The model emits diagram source inside JSON strings and is sloppy about
//! fences, escaping and line structure. `normalize` runs an ordered list of
//! pure string passes; `repair_fallback` is the heavier rewrite used only
//! after the engine rejected the normalized source once.

use regex::Regex;
use std::sync::LazyLock;

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:(?i:mermaid)\b)?").unwrap());
static LANGUAGE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i:mermaid)(?:[ \t]*\r?\n|[ \t]*\\n|[ \t]+)").unwrap());
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:graph|flowchart)[ \t]+(?:TD|TB|BT|RL|LR))[ \t]+(\S)").unwrap()
});
static ADJACENT_NODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([\]\)\}"])[ \t]*([A-Z][A-Za-z0-9_]*[ \t]*(?:\[|\(|\{|--|==|-\.|&))"#)
        .unwrap()
});

/// A single source-to-source repair.
pub type Pass = fn(&str) -> String;

/// The passes `normalize` applies, in order.
pub const PASSES: [(&str, Pass); 4] = [
    ("strip_fences", strip_fences),
    ("unescape_newlines", unescape_newlines),
    ("break_after_header", break_after_header),
    ("split_adjacent_nodes", split_adjacent_nodes),
];

/// Best-effort cleanup of raw diagram source. Never fails.
pub fn normalize(raw: &str) -> String {
    PASSES
        .iter()
        .fold(raw.to_string(), |source, (_, pass)| pass(&source))
}

/// Remove code fences and a leading `mermaid` language tag.
pub fn strip_fences(source: &str) -> String {
    let without_fences = FENCE_RE.replace_all(source, "");
    let trimmed = without_fences.trim();
    LANGUAGE_TAG_RE.replace(trimmed, "").trim().to_string()
}

/// Turn literal `\n` sequences into real line breaks.
pub fn unescape_newlines(source: &str) -> String {
    source.replace("\\r\\n", "\n").replace("\\n", "\n").trim().to_string()
}

/// `graph TD A-->B` becomes `graph TD` / `A-->B`.
pub fn break_after_header(source: &str) -> String {
    HEADER_RE.replace(source, "$1\n$2").into_owned()
}

/// `A[Start] B[End]` becomes `A[Start]` / `B[End]`.
pub fn split_adjacent_nodes(source: &str) -> String {
    ADJACENT_NODE_RE.replace_all(source, "$1\n$2").into_owned()
}

/// Rewrite round-paren node shapes (`Id(label)`) as square brackets.
///
/// Only parens that directly follow a node identifier outside any label,
/// quoted string or edge label are rewritten. Parens inside labels are kept.
pub fn repair_fallback(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut in_edge_label = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\n' => {
                depth = 0;
                in_quote = false;
                in_edge_label = false;
                out.push(c);
            }
            '"' => {
                in_quote = !in_quote;
                out.push(c);
            }
            _ if in_quote => out.push(c),
            '|' if depth == 0 => {
                in_edge_label = !in_edge_label;
                out.push(c);
            }
            _ if in_edge_label => out.push(c),
            '(' if depth == 0 && i > 0 && is_ident_char(chars[i - 1]) => {
                if let Some(close) = matching_paren(&chars, i) {
                    out.push('[');
                    out.extend(&chars[i + 1..close]);
                    out.push(']');
                    i = close + 1;
                    continue;
                }
                depth += 1;
                out.push(c);
            }
            '[' | '(' | '{' => {
                depth += 1;
                out.push(c);
            }
            ']' | ')' | '}' => {
                depth = depth.saturating_sub(1);
                out.push(c);
            }
            _ => out.push(c),
        }
        i += 1;
    }

    out
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Index of the `)` closing the `(` at `open`, on the same line.
fn matching_paren(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_quote = false;
    for (offset, &c) in chars[open..].iter().enumerate() {
        match c {
            '\n' => return None,
            '"' => in_quote = !in_quote,
            _ if in_quote => {}
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}
