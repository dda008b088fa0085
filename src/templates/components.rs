//! Shared HTML components.
//!
//! Contains the navigation bar, escaping helpers and the base HTML template.

use crate::models::{Category, Segment};

use super::styles::STYLE;

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Highlighted text as HTML; emphasized runs become `<mark>`.
pub fn segments_html(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Plain(text) => html_escape(text),
            Segment::Emphasized(text) => {
                format!(r#"<mark class="term">{}</mark>"#, html_escape(text))
            }
        })
        .collect()
}

// ============================================================================
// Navigation Bar
// ============================================================================

pub fn nav_bar(search_query: Option<&str>, category: Option<Category>) -> String {
    let query_val = search_query.unwrap_or("");
    let category_input = match category {
        Some(c) => format!(r#"<input type="hidden" name="category" value="{}">"#, c),
        None => String::new(),
    };

    format!(
        r#"<nav class="nav-bar">
            <a href="/" class="brand">DevBrain</a>
            <a href="/">Library</a>
            <a href="/new">+ New Entry</a>
            <span class="spacer"></span>
            <form class="search-box" action="/" method="get">
                <input type="text" name="q" placeholder="Search titles and tags..." value="{}">
                {}
                <button type="submit">Go</button>
            </form>
        </nav>"#,
        html_escape(query_val),
        category_input
    )
}

// ============================================================================
// Base Template
// ============================================================================

pub fn base_html(
    title: &str,
    content: &str,
    search_query: Option<&str>,
    category: Option<Category>,
) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - DevBrain</title>
    <style>{STYLE}</style>
</head>
<body>
    {nav}
    <div class="container">
        {content}
    </div>
</body>
</html>"#,
        title = html_escape(title),
        STYLE = STYLE,
        nav = nav_bar(search_query, category),
        content = content,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_html_escapes_and_marks() {
        let segments = vec![
            Segment::Plain("run <".to_string()),
            Segment::Emphasized("git & co".to_string()),
        ];
        assert_eq!(
            segments_html(&segments),
            r#"run &lt;<mark class="term">git &amp; co</mark>"#
        );
    }

    #[test]
    fn test_nav_bar_keeps_category_filter() {
        let nav = nav_bar(Some("\"reset\""), Some(Category::Troubleshooting));
        assert!(nav.contains(r#"value="&quot;reset&quot;""#));
        assert!(nav.contains(r#"name="category" value="Troubleshooting""#));
    }
}
