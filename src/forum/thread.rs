//! Scraping of a discussion's flat view.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use scraper::{ElementRef, Html};
use tracing::trace;

use crate::error::{ForumError, Result};
use crate::html::{attr, next_sibling_element, numeric_attr, select_first, selector, text};
use crate::markdown::html_to_markdown;

/// Attribute carrying a post id, both on the post block and on the
/// container wrapping a post together with its replies.
const POST_ID_ATTR: &str = "data-post-id";

/// A post block as rendered on the discussion page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostBlock {
    pub post_id: u64,
    pub title: String,
    pub author: String,
    pub created_at: DateTime<FixedOffset>,
    pub content: String,
    pub responds_to: Option<u64>,
}

/// Read every post block of a discussion page, in page order.
///
/// # Errors
///
/// Returns [`ForumError::Parse`] if any block lacks an expected element.
pub fn parse_posts(html: &str) -> Result<Vec<PostBlock>> {
    let document = Html::parse_document(html);
    let post_sel = selector("div.forumpost")?;
    let heading_sel = selector("h3.h6")?;
    let author_sel = selector("a")?;
    let time_sel = selector("time")?;
    let content_sel = selector("div.post-content-container")?;

    document
        .select(&post_sel)
        .map(|block| -> Result<PostBlock> {
            let post_id = numeric_attr(block, POST_ID_ATTR, "post block")?;

            let heading = select_first(block, &heading_sel, "post title")?;
            let byline = next_sibling_element(heading)
                .ok_or_else(|| ForumError::parse(format!("missing byline of post {post_id}")))?;
            let author = text(select_first(byline, &author_sel, "post author")?);
            let datetime = attr(select_first(byline, &time_sel, "post date")?, "datetime", "post date")?;
            let content = select_first(block, &content_sel, "post content")?;

            let parsed = PostBlock {
                post_id,
                title: text(heading),
                author,
                created_at: parse_datetime(datetime)?,
                content: html_to_markdown(&content.html()),
                responds_to: parent_post_id(block)?,
            };
            trace!(post_id, responds_to = ?parsed.responds_to, "Parsed post block");
            Ok(parsed)
        })
        .collect()
}

/// Id of the post a block replies to.
///
/// Replies are nested inside their parent's container three levels up
/// (container, replies list, parent container). A root post has no such
/// attributed ancestor.
fn parent_post_id(block: ElementRef<'_>) -> Result<Option<u64>> {
    let Some(ancestor) = block.ancestors().nth(2).and_then(ElementRef::wrap) else {
        return Ok(None);
    };
    if ancestor.value().attr(POST_ID_ATTR).is_none() {
        return Ok(None);
    }
    numeric_attr(ancestor, POST_ID_ATTR, "reply container").map(Some)
}

/// Parse an ISO-8601 `datetime` attribute; values without an offset are taken as UTC.
fn parse_datetime(value: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date);
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .map(|naive| naive.and_utc().fixed_offset())
        .map_err(|_| ForumError::parse(format!("invalid post date {value:?}")))
}
