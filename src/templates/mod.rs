//! HTML templates and styling for DevBrain.
//!
//! This module contains all CSS styles, JavaScript code, and HTML
//! generation functions for the web interface.
//!
//! ## Module Structure
//!
//! - `styles` - CSS constants and theme definitions
//! - `components` - Shared HTML components (nav bar, escaping, base template)
//! - `library` - Library list and add-entry form
//! - `detail` - Entry detail view with diagram and practice panel

mod components;
mod detail;
mod library;
mod styles;

pub use components::{base_html, html_escape, nav_bar, segments_html};
pub use detail::render_detail;
pub use library::{render_library, render_new_entry, LibraryLayout};
pub use styles::STYLE;
