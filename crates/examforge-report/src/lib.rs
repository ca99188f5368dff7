//! examforge-report: Read-only projections of a test document.

pub mod html;

pub use html::{generate_html, write_html_worksheet, RenderOptions};
