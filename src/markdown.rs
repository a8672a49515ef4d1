//! HTML to Markdown conversion for forum summaries and post bodies.

/// Convert an HTML fragment to Markdown, trimming surrounding whitespace.
#[must_use]
pub fn html_to_markdown(html: &str) -> String {
    html2md::parse_html(html).trim().to_string()
}
