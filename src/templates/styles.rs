//! CSS styles for DevBrain.
//!
//! Contains the main STYLE constant with all CSS for the web interface.

// ============================================================================
// CSS Styles
// ============================================================================

pub const STYLE: &str = r#"
/* Solarized Dark Theme */
:root {
    --base03: #002b36;
    --base02: #073642;
    --base01: #586e75;
    --base00: #657b83;
    --base0: #839496;
    --base1: #93a1a1;
    --base2: #eee8d5;
    --base3: #fdf6e3;

    --yellow: #b58900;
    --orange: #cb4b16;
    --red: #dc322f;
    --blue: #268bd2;
    --cyan: #2aa198;
    --green: #859900;

    --bg: var(--base03);
    --panel: var(--base02);
    --fg: var(--base0);
    --strong: var(--base1);
    --muted: var(--base01);
    --border: #0d4a5a;
    --link: var(--blue);
    --link-hover: var(--cyan);
    --mark-bg: rgba(181, 137, 0, 0.35);
}

* { box-sizing: border-box; margin: 0; padding: 0; }

body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
    line-height: 1.6;
    color: var(--fg);
    background: var(--bg);
}

.container {
    max-width: 960px;
    margin: 0 auto;
    padding: 1rem;
}

a { color: var(--link); text-decoration: none; }
a:hover { color: var(--link-hover); text-decoration: underline; }

h1, h2, h3 { font-weight: 600; color: var(--strong); margin-top: 1.5em; margin-bottom: 0.5em; }
h1 { font-size: 1.6rem; margin-top: 0.5em; }
h2 { font-size: 1.15rem; }

code, pre, textarea.code { font-family: "SF Mono", "Consolas", "Liberation Mono", monospace; }

button, .button {
    padding: 0.4rem 0.9rem;
    border: 1px solid var(--border);
    border-radius: 4px;
    background: var(--panel);
    color: var(--strong);
    cursor: pointer;
    font-size: 0.85rem;
    font-family: inherit;
}
button:hover, .button:hover { border-color: var(--link); text-decoration: none; }
button.primary { background: var(--blue); border-color: var(--blue); color: white; }
button.danger { color: var(--red); }
button:disabled { opacity: 0.5; cursor: default; }

/* Navigation */

.nav-bar {
    position: sticky;
    top: 0;
    background: var(--bg);
    border-bottom: 1px solid var(--border);
    padding: 0.5rem 1rem;
    display: flex;
    gap: 1rem;
    align-items: center;
    flex-wrap: wrap;
    z-index: 100;
}
.nav-bar .brand { font-weight: 700; color: var(--cyan); }
.nav-bar .spacer { flex: 1; }

.search-box { display: flex; gap: 0.5rem; }
.search-box input, .search-box select {
    padding: 0.4rem 0.75rem;
    border: 1px solid var(--border);
    border-radius: 4px;
    background: var(--panel);
    color: var(--fg);
    font-size: 0.9rem;
}
.search-box input { width: 200px; }

/* Library */

.category-tabs { display: flex; flex-wrap: wrap; gap: 0.5rem; margin: 1rem 0; }
.category-tabs a {
    padding: 0.2rem 0.7rem;
    border: 1px solid var(--border);
    border-radius: 999px;
    font-size: 0.8rem;
    color: var(--fg);
}
.category-tabs a.active { background: var(--blue); border-color: var(--blue); color: white; }

.entry-list { list-style: none; }
.entry-item {
    padding: 0.75rem 0;
    border-bottom: 1px solid var(--border);
}
.entry-item:last-child { border-bottom: none; }
.entry-item .title { font-size: 1.05rem; }
.entry-item .summary { font-size: 0.9rem; margin-top: 0.2rem; }
.entry-item .meta { font-size: 0.75rem; color: var(--muted); margin-top: 0.3rem; }
.entry-item .image-count { margin-right: 0.4rem; }
.entry-list.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 0.8rem; }
.entry-list.grid .entry-item { border: 1px solid var(--border); border-radius: 4px; padding: 0.8rem; }
.library-header { display: flex; justify-content: space-between; align-items: center; }
.layout-toggle { display: flex; gap: 0.3rem; font-size: 0.85rem; }
.layout-toggle a { padding: 0.2rem 0.6rem; border: 1px solid var(--border); border-radius: 3px; }
.layout-toggle a.active { background: var(--blue); border-color: var(--blue); color: white; }

.category-badge {
    font-size: 0.65rem;
    padding: 0.1rem 0.45rem;
    background: var(--panel);
    border-radius: 3px;
    text-transform: uppercase;
    letter-spacing: 0.05em;
    margin-right: 0.5rem;
    vertical-align: middle;
}
.tag { color: var(--cyan); margin-right: 0.5rem; }

.empty { color: var(--muted); padding: 2rem 0; text-align: center; }

/* Add form */

.add-form textarea {
    width: 100%;
    min-height: 16rem;
    padding: 0.75rem;
    background: var(--panel);
    color: var(--fg);
    border: 1px solid var(--border);
    border-radius: 4px;
    font-size: 0.9rem;
}
.add-form .row { display: flex; gap: 1rem; align-items: center; margin-top: 1rem; }
.form-error { color: var(--red); margin: 0.5rem 0; }
.analyzing { display: none; color: var(--yellow); }
.add-form.busy .analyzing { display: inline; }

/* Entry detail */

.entry-header { display: flex; align-items: center; gap: 1rem; flex-wrap: wrap; }
.entry-header h1 { flex: 1; }
.summary-block {
    background: var(--panel);
    border-left: 3px solid var(--cyan);
    padding: 0.75rem 1rem;
    border-radius: 4px;
}

.content p { margin: 0.4rem 0; }
.content .blank { height: 0.6rem; }
mark.term { background: var(--mark-bg); color: var(--strong); border-radius: 2px; padding: 0 0.1rem; }

.term-bar { font-size: 0.85rem; color: var(--muted); margin: 0.5rem 0; display: flex; gap: 0.5rem; align-items: center; }

table.content-table { width: 100%; border-collapse: collapse; font-size: 0.85rem; margin: 0.75rem 0; }
.content-table th, .content-table td { padding: 0.4rem 0.6rem; text-align: left; border: 1px solid var(--border); }
.content-table th { background: var(--panel); color: var(--strong); }

ol.steps { padding-left: 1.5rem; }
ol.steps li { margin: 0.3rem 0; }

.snippet { margin: 0.75rem 0; }
.snippet .lang { font-size: 0.7rem; color: var(--muted); text-transform: uppercase; }
.snippet pre {
    background: var(--panel);
    padding: 0.75rem 1rem;
    overflow-x: auto;
    border-radius: 4px;
}
.snippet .description { font-size: 0.85rem; color: var(--muted); }

.images { display: flex; flex-wrap: wrap; gap: 0.5rem; }
.images img { max-width: 280px; max-height: 200px; border: 1px solid var(--border); border-radius: 4px; }

/* Diagram */

.diagram-region { position: relative; margin: 0.75rem 0; }
.diagram-toolbar { display: flex; gap: 0.4rem; align-items: center; margin-bottom: 0.4rem; }
.diagram-toolbar form { display: inline; }
.diagram-toolbar .zoom { font-size: 0.8rem; color: var(--muted); min-width: 3rem; text-align: center; }
.diagram-surface {
    background: var(--base3);
    border-radius: 4px;
    padding: 0.75rem;
    max-height: 420px;
    overflow: auto;
}
.diagram-surface svg { height: auto; }
.diagram-surface g.node { cursor: pointer; }
.diagram-surface g.node:hover { opacity: 0.8; }
.diagram-region.fullscreen {
    position: fixed;
    inset: 0;
    z-index: 200;
    margin: 0;
    padding: 1rem;
    background: var(--bg);
    display: flex;
    flex-direction: column;
}
.diagram-region.fullscreen .diagram-surface { max-height: none; flex: 1; }
.diagram-error { color: var(--orange); font-size: 0.9rem; }
.diagram-hint { font-size: 0.75rem; color: var(--muted); }

/* Practice */

.practice-panel {
    margin-top: 2rem;
    padding: 1rem;
    border: 1px solid var(--border);
    border-radius: 6px;
    background: var(--panel);
}
.practice-panel h2 { margin-top: 0; }
.practice-panel .question { color: var(--strong); margin: 0.5rem 0; }
.practice-panel textarea {
    width: 100%;
    min-height: 6rem;
    padding: 0.5rem;
    background: var(--bg);
    color: var(--fg);
    border: 1px solid var(--border);
    border-radius: 4px;
    margin: 0.5rem 0;
}
.practice-panel textarea[readonly] { opacity: 0.7; }
.practice-status { color: var(--yellow); font-size: 0.9rem; }
.verdict { font-weight: 700; }
.verdict.correct { color: var(--green); }
.verdict.incorrect { color: var(--orange); }
.score { float: right; font-size: 1.4rem; color: var(--strong); }
.feedback { margin: 0.5rem 0; }
.solution pre { background: var(--bg); padding: 0.5rem 0.75rem; border-radius: 4px; overflow-x: auto; }
"#;
