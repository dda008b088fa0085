//! Term highlighting for rendered entry text.
//!
//! Text coming back from the model carries stray markdown (bold markers,
//! headings, inline code, links). It is cleaned unconditionally, then split
//! around case-insensitive occurrences of the active term.

use crate::models::Segment;
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]*)\]\([^()]*\)").unwrap());
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:#{1,6}[ \t]+)+").unwrap());
static UNDERSCORE_EMPHASIS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__([^_]+)__").unwrap());

/// Strip markdown artifacts from `text`.
///
/// Every rewrite shortens the text, so the passes are repeated until nothing
/// changes; this makes the cleaning idempotent.
pub fn clean(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = clean_once(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn clean_once(text: &str) -> String {
    let text = LINK_RE.replace_all(text, "$1");
    let text = HEADING_RE.replace_all(&text, "");
    let text = UNDERSCORE_EMPHASIS_RE.replace_all(&text, "$1");
    text.chars().filter(|c| *c != '*' && *c != '`').collect()
}

/// Clean `text` and split it into plain and emphasized runs around
/// `active_term`.
pub fn highlight(text: &str, active_term: Option<&str>) -> Vec<Segment> {
    let cleaned = clean(text);

    let term = match active_term.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return vec![Segment::Plain(cleaned)],
    };

    let re = match RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re,
        // An escaped literal only fails on pathological size limits.
        Err(_) => return vec![Segment::Plain(cleaned)],
    };

    let mut segments = Vec::new();
    let mut last = 0;
    for m in re.find_iter(&cleaned) {
        if m.start() > last {
            segments.push(Segment::Plain(cleaned[last..m.start()].to_string()));
        }
        segments.push(Segment::Emphasized(m.as_str().to_string()));
        last = m.end();
    }
    if last < cleaned.len() {
        segments.push(Segment::Plain(cleaned[last..].to_string()));
    }
    if segments.is_empty() {
        segments.push(Segment::Plain(cleaned));
    }
    segments
}

#[cfg(test)]
#[path = "highlight_test.rs"]
mod highlight_test;
