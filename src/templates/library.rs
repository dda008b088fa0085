//! Library list and the add-entry form.

use crate::models::{Category, KnowledgeEntry};

use super::components::{base_html, html_escape};

// ============================================================================
// Library
// ============================================================================

/// How the library lists its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LibraryLayout {
    #[default]
    List,
    Grid,
}

impl LibraryLayout {
    /// `grid` selects the card grid; anything else is the list.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("grid") => LibraryLayout::Grid,
            _ => LibraryLayout::List,
        }
    }
}

fn library_href(query: &str, category: Option<Category>, layout: LibraryLayout) -> String {
    let mut params = Vec::new();
    if !query.is_empty() {
        params.push(format!("q={}", urlencoding::encode(query)));
    }
    if let Some(c) = category {
        params.push(format!("category={}", c));
    }
    if layout == LibraryLayout::Grid {
        params.push("view=grid".to_string());
    }
    if params.is_empty() {
        "/".to_string()
    } else {
        format!("/?{}", params.join("&"))
    }
}

fn category_tabs(query: &str, active: Option<Category>, layout: LibraryLayout) -> String {
    let link = |label: &str, value: Option<Category>| {
        let class = if value == active { " class=\"active\"" } else { "" };
        format!(
            r#"<a href="{}"{}>{}</a>"#,
            html_escape(&library_href(query, value, layout)),
            class,
            label
        )
    };

    let mut html = String::from(r#"<div class="category-tabs">"#);
    html.push_str(&link("All", None));
    for category in Category::ALL {
        html.push_str(&link(category.as_str(), Some(category)));
    }
    html.push_str("</div>");
    html
}

fn layout_toggle(query: &str, category: Option<Category>, active: LibraryLayout) -> String {
    let link = |label: &str, layout: LibraryLayout| {
        let class = if layout == active { " class=\"active\"" } else { "" };
        format!(
            r#"<a href="{}"{}>{}</a>"#,
            html_escape(&library_href(query, category, layout)),
            class,
            label
        )
    };
    format!(
        r#"<div class="layout-toggle">{}{}</div>"#,
        link("List", LibraryLayout::List),
        link("Grid", LibraryLayout::Grid)
    )
}

pub fn render_library(
    entries: &[&KnowledgeEntry],
    total: usize,
    query: &str,
    category: Option<Category>,
    layout: LibraryLayout,
) -> String {
    let mut html = format!(
        r#"<div class="library-header"><h1>Knowledge Library</h1>{}</div>"#,
        layout_toggle(query, category, layout)
    );
    html.push_str(&category_tabs(query, category, layout));

    if entries.is_empty() {
        let message = if total == 0 {
            r#"No entries yet. <a href="/new">Add your first one.</a>"#
        } else {
            "No entries match this search."
        };
        html.push_str(&format!(r#"<p class="empty">{}</p>"#, message));
        return base_html("Library", &html, Some(query), category);
    }

    let list_class = match layout {
        LibraryLayout::List => "entry-list",
        LibraryLayout::Grid => "entry-list grid",
    };
    html.push_str(&format!(r#"<ul class="{}">"#, list_class));
    for entry in entries {
        let tags: String = entry
            .tags
            .iter()
            .map(|t| format!(r#"<span class="tag">#{}</span>"#, html_escape(t)))
            .collect();
        let images = match entry.image_urls.len() {
            0 => String::new(),
            1 => r#"<span class="image-count">1 image</span>"#.to_string(),
            n => format!(r#"<span class="image-count">{} images</span>"#, n),
        };

        html.push_str(&format!(
            r#"<li class="entry-item">
                <div>
                    <span class="category-badge">{category}</span>
                    <a href="/entry/{id}" class="title">{title}</a>
                </div>
                <div class="summary">{summary}</div>
                <div class="meta">{tags} {images} {created}</div>
            </li>"#,
            category = entry.category,
            id = urlencoding::encode(&entry.id),
            title = html_escape(&entry.title),
            summary = html_escape(&entry.summary),
            tags = tags,
            images = images,
            created = entry.created_at.format("%Y-%m-%d %H:%M"),
        ));
    }
    html.push_str("</ul>");

    if entries.len() < total {
        html.push_str(&format!(
            r#"<p class="meta">Showing {} of {} entries.</p>"#,
            entries.len(),
            total
        ));
    }

    base_html("Library", &html, Some(query), category)
}

// ============================================================================
// New Entry
// ============================================================================

pub fn render_new_entry(error: Option<&str>) -> String {
    let error_html = error
        .map(|e| format!(r#"<p class="form-error">{}</p>"#, html_escape(e)))
        .unwrap_or_default();

    let content = format!(
        r#"<h1>Add New Knowledge</h1>
        <p>Paste messy notes, commands or error logs, or upload screenshots. They will be
        structured into a titled entry with steps, snippets and a diagram.</p>
        {error}
        <form class="add-form" method="post" action="/new" enctype="multipart/form-data"
              onsubmit="this.classList.add('busy'); this.querySelector('button[type=submit]').disabled = true;">
            <textarea name="text" placeholder="Paste your notes here..."></textarea>
            <div class="row">
                <input type="file" name="images" accept="image/*" multiple>
                <span class="spacer"></span>
                <a class="button" href="/">Cancel</a>
                <button type="submit" class="primary">Analyze &amp; Save</button>
                <span class="analyzing">Analyzing...</span>
            </div>
        </form>"#,
        error = error_html,
    );

    base_html("New Entry", &content, None, None)
}
