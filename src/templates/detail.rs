//! Entry detail view: highlighted content, diagram region and practice panel.

use crate::detail::DetailSession;
use crate::diagram::{DiagramView, RenderOutcome};
use crate::models::{ContextType, KnowledgeEntry, RenderBlock};
use crate::practice::{PracticeSession, PracticeState};

use super::components::{base_html, html_escape, segments_html};

pub fn render_detail(session: &DetailSession) -> String {
    let entry = session.entry();
    let id = urlencoding::encode(&entry.id).into_owned();

    let mut html = format!(
        r#"<div class="entry-header">
            <h1>{title}</h1>
            <a class="button" href="/">Back</a>
            <form method="post" action="/api/entry/{id}/delete"
                  onsubmit="return confirm('Delete this entry?');">
                <button type="submit" class="danger">Delete</button>
            </form>
        </div>
        <div class="meta"><span class="category-badge">{category}</span>{tags} {created}</div>"#,
        title = html_escape(&entry.title),
        id = id,
        category = entry.category,
        tags = entry
            .tags
            .iter()
            .map(|t| format!(r#"<span class="tag">#{}</span>"#, html_escape(t)))
            .collect::<String>(),
        created = entry.created_at.format("%Y-%m-%d %H:%M"),
    );

    html.push_str(&format!(
        r#"<h2>Summary</h2><div class="summary-block">{}</div>"#,
        segments_html(&session.highlight(&entry.summary))
    ));

    if let Some(term) = session.active_term() {
        html.push_str(&format!(
            r#"<div class="term-bar">Highlighting <mark class="term">{}</mark>
                <span class="meta">Click another node to change it.</span>
            </div>"#,
            html_escape(term)
        ));
    }

    html.push_str(&render_diagram(session.diagram(), entry, &id));

    if !entry.steps.is_empty() {
        html.push_str(r#"<h2>Steps</h2><ol class="steps">"#);
        for step in &entry.steps {
            html.push_str(&format!("<li>{}</li>", segments_html(&session.highlight(step))));
        }
        html.push_str("</ol>");
    }

    if !entry.code_snippets.is_empty() {
        html.push_str("<h2>Code</h2>");
        for snippet in &entry.code_snippets {
            html.push_str(&format!(
                r#"<div class="snippet">
                    <div class="lang">{}</div>
                    <pre><code>{}</code></pre>
                    <div class="description">{}</div>
                </div>"#,
                html_escape(&snippet.language),
                html_escape(&snippet.code),
                html_escape(&snippet.description)
            ));
        }
    }

    let blocks = session.blocks();
    if !blocks.is_empty() {
        html.push_str(r#"<h2>Original Notes</h2><div class="content">"#);
        html.push_str(&render_blocks(&blocks, session));
        html.push_str("</div>");
    }

    if !entry.image_urls.is_empty() {
        html.push_str(r#"<h2>Images</h2><div class="images">"#);
        for url in &entry.image_urls {
            html.push_str(&format!(r#"<img src="{}" alt="attachment">"#, html_escape(url)));
        }
        html.push_str("</div>");
    }

    html.push_str(&render_practice(session.practice(), &id));
    html.push_str(&node_click_script(&id));

    base_html(&entry.title, &html, None, None)
}

fn render_blocks(blocks: &[RenderBlock], session: &DetailSession) -> String {
    let mut html = String::new();
    for block in blocks {
        match block {
            RenderBlock::Paragraph(segments) => {
                html.push_str(&format!("<p>{}</p>", segments_html(segments)));
            }
            RenderBlock::Blank => html.push_str(r#"<div class="blank"></div>"#),
            RenderBlock::Table { headers, rows } => {
                html.push_str(r#"<table class="content-table"><thead><tr>"#);
                for header in headers {
                    html.push_str(&format!(
                        "<th>{}</th>",
                        segments_html(&session.highlight(header))
                    ));
                }
                html.push_str("</tr></thead><tbody>");
                for row in rows {
                    html.push_str("<tr>");
                    for cell in row {
                        html.push_str(&format!(
                            "<td>{}</td>",
                            segments_html(&session.highlight(cell))
                        ));
                    }
                    html.push_str("</tr>");
                }
                html.push_str("</tbody></table>");
            }
        }
    }
    html
}

// ============================================================================
// Diagram Region
// ============================================================================

fn action_button(id: &str, action: &str, label: &str, title: &str) -> String {
    format!(
        r#"<form method="post" action="/api/entry/{}/diagram/{}"><button type="submit" title="{}">{}</button></form>"#,
        id, action, title, label
    )
}

fn render_diagram(view: &DiagramView, entry: &KnowledgeEntry, id: &str) -> String {
    let outcome = match view.outcome() {
        Some(outcome) => outcome,
        None => return String::new(),
    };

    match outcome {
        RenderOutcome::Empty => String::new(),
        RenderOutcome::Failed(message) => format!(
            r#"<h2>Diagram</h2>
            <div id="diagram" class="diagram-region">
                <p class="diagram-error">{}</p>
                <details><summary>Diagram source</summary><pre><code>{}</code></pre></details>
            </div>"#,
            html_escape(message),
            html_escape(entry.mermaid_chart.as_deref().unwrap_or(""))
        ),
        RenderOutcome::Rendered(diagram) => {
            let viewport = view.viewport();
            let mut toolbar = String::new();
            if viewport.is_fullscreen() {
                toolbar.push_str(&action_button(id, "zoom-out", "&minus;", "Zoom out"));
                toolbar.push_str(&format!(
                    r#"<span class="zoom">{}%</span>"#,
                    viewport.width_percent()
                ));
                toolbar.push_str(&action_button(id, "zoom-in", "+", "Zoom in"));
                toolbar.push_str(&action_button(id, "reset", "Reset", "Reset zoom"));
                toolbar.push_str(&action_button(id, "fullscreen", "Exit fullscreen", "Exit fullscreen"));
            } else {
                toolbar.push_str(&action_button(id, "fullscreen", "Fullscreen", "Open fullscreen"));
            }

            format!(
                r#"<h2>Diagram</h2>
                <div id="diagram" class="diagram-region{fullscreen}">
                    <div class="diagram-toolbar">{toolbar}</div>
                    <div class="diagram-surface" id="diagram-surface">
                        <div style="width: {width}%">{markup}</div>
                    </div>
                    <p class="diagram-hint">Click a node to highlight it in the notes.</p>
                </div>"#,
                fullscreen = if viewport.is_fullscreen() { " fullscreen" } else { "" },
                toolbar = toolbar,
                width = viewport.width_percent(),
                markup = diagram.markup,
            )
        }
    }
}

fn node_click_script(id: &str) -> String {
    format!(
        r#"<script>
    document.querySelectorAll('#diagram-surface g.node[id]').forEach(node => {{
        node.addEventListener('click', async () => {{
            const response = await fetch('/api/entry/{id}/node/' + encodeURIComponent(node.id), {{ method: 'POST' }});
            if (response.ok) window.location.reload();
        }});
    }});
    </script>"#,
        id = id
    )
}

// ============================================================================
// Practice Panel
// ============================================================================

fn answer_box(practice: &PracticeSession, editable: bool) -> String {
    format!(
        r#"<textarea name="answer" class="code" placeholder="Type your answer..."{}>{}</textarea>"#,
        if editable { "" } else { " readonly" },
        html_escape(practice.answer())
    )
}

fn render_practice(practice: &PracticeSession, id: &str) -> String {
    let start_form = |label: &str| {
        format!(
            r#"<form method="post" action="/api/entry/{}/practice/start"><button type="submit" class="primary">{}</button></form>"#,
            id, label
        )
    };

    let question = practice
        .challenge()
        .map(|c| {
            let kind = match c.context_type {
                ContextType::Code => "Code",
                ContextType::Concept => "Concept",
            };
            format!(
                r#"<span class="category-badge">{}</span><p class="question">{}</p>"#,
                kind,
                html_escape(&c.question)
            )
        })
        .unwrap_or_default();

    let body = match practice.state() {
        PracticeState::Idle => format!(
            "<p>Test yourself on this entry with a generated question.</p>{}",
            start_form("Start practice")
        ),
        PracticeState::LoadingChallenge => {
            r#"<p class="practice-status">Generating a question...</p>"#.to_string()
        }
        PracticeState::Active { .. } => format!(
            r#"{question}
            <form method="post" action="/api/entry/{id}/practice/submit">
                {answer}
                <button type="submit" class="primary">Submit answer</button>
            </form>"#,
            question = question,
            id = id,
            answer = answer_box(practice, true),
        ),
        PracticeState::Evaluating { .. } => format!(
            r#"{}{}<p class="practice-status">Evaluating your answer...</p>"#,
            question,
            answer_box(practice, false)
        ),
        PracticeState::Result { evaluation, .. } => {
            let (class, verdict) = if evaluation.is_correct {
                ("correct", "Correct")
            } else {
                ("incorrect", "Not quite")
            };
            format!(
                r#"{question}{answer}
                <div class="result">
                    <span class="score">{score}/100</span>
                    <span class="verdict {class}">{verdict}</span>
                    <p class="feedback">{feedback}</p>
                    <div class="solution"><strong>Solution</strong><pre><code>{solution}</code></pre></div>
                </div>
                {retry}"#,
                question = question,
                answer = answer_box(practice, false),
                score = evaluation.score,
                class = class,
                verdict = verdict,
                feedback = html_escape(&evaluation.feedback),
                solution = html_escape(&evaluation.correct_solution),
                retry = start_form("Try another question"),
            )
        }
    };

    format!(
        r#"<div id="practice" class="practice-panel"><h2>Practice</h2>{}</div>"#,
        body
    )
}
