//! Scraping of the forum view page: its header and the discussion list.

use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use scraper::{ElementRef, Html, Selector};
use tracing::trace;

use crate::error::{ForumError, Result};
use crate::html::{attr, first_child_element, numeric_attr, select_first, selector, text};
use crate::markdown::html_to_markdown;

use super::{Breadcrumb, Discussion};

/// Target-state rendered on the favourite and subscription toggles of a
/// discussion whose flag is set. The flag is read straight from this value.
const TOGGLE_ON_STATE: &str = "0";

/// Forum metadata read from the top of the view page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForumHeader {
    pub path: Vec<Breadcrumb>,
    pub name: String,
    pub summary: String,
}

/// One row of the discussion list.
#[derive(Debug, Clone, PartialEq)]
pub enum ListingEntry {
    /// A discussion already in the collection; only its id is read.
    Known(u64),
    /// A discussion seen for the first time, with its listing metadata and no posts.
    New(Discussion),
}

impl ListingEntry {
    #[must_use]
    pub fn discussion_id(&self) -> u64 {
        match self {
            Self::Known(id) => *id,
            Self::New(discussion) => discussion.discussion_id,
        }
    }
}

/// Read breadcrumbs, heading and intro of the forum view page.
///
/// # Errors
///
/// Returns [`ForumError::Parse`] if the navigation bar, heading or intro is missing.
pub fn parse_forum_header(html: &str) -> Result<ForumHeader> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let navbar = select_first(root, &selector("#page-navbar")?, "navigation bar")?;
    let link = selector("a")?;
    let path = navbar
        .select(&link)
        .map(|a| -> Result<Breadcrumb> {
            Ok(Breadcrumb {
                label: text(a).replace('\n', "").trim().to_string(),
                href: attr(a, "href", "breadcrumb link")?.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let name = text(select_first(root, &selector("h1.h2")?, "forum heading")?);
    let intro = select_first(root, &selector("div#intro")?, "forum intro")?;

    Ok(ForumHeader {
        path,
        name,
        summary: html_to_markdown(&intro.html()),
    })
}

struct RowSelectors {
    favorite: Selector,
    topic_link: Selector,
    author_info: Selector,
    time: Selector,
    subscription: Selector,
}

impl RowSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            favorite: selector(r#"a[data-type="favorite-toggle"]"#)?,
            topic_link: selector("th.topic a")?,
            author_info: selector("td.author .author-info")?,
            time: selector("time")?,
            subscription: selector(r#"input[data-type="subscription-toggle"]"#)?,
        })
    }
}

/// Read the discussion list in page order.
///
/// Rows whose id is in `known`, or already appeared higher on the page, are
/// returned as [`ListingEntry::Known`] without reading the rest of the row.
///
/// # Errors
///
/// Returns [`ForumError::Parse`] if any row lacks an expected element.
pub fn parse_discussion_rows(html: &str, mut known: HashSet<u64>) -> Result<Vec<ListingEntry>> {
    let document = Html::parse_document(html);
    let rows = selector("tr.discussion")?;
    let selectors = RowSelectors::new()?;

    let mut entries = Vec::new();
    for row in document.select(&rows) {
        let discussion_id = numeric_attr(row, "data-discussionid", "discussion row")?;

        if !known.insert(discussion_id) {
            trace!(discussion_id, "Listed discussion already known");
            entries.push(ListingEntry::Known(discussion_id));
            continue;
        }

        let discussion = parse_new_row(row, discussion_id, &selectors)?;
        trace!(discussion_id, title = %discussion.title, "Listed new discussion");
        entries.push(ListingEntry::New(discussion));
    }

    Ok(entries)
}

fn parse_new_row(
    row: ElementRef<'_>,
    discussion_id: u64,
    selectors: &RowSelectors,
) -> Result<Discussion> {
    let is_favorited = toggle_is_on(select_first(row, &selectors.favorite, "favourite toggle")?);

    let title = attr(
        select_first(row, &selectors.topic_link, "discussion link")?,
        "title",
        "discussion link",
    )?
    .to_string();

    let author_info = select_first(row, &selectors.author_info, "author block")?;
    let author = first_child_element(author_info)
        .map(text)
        .ok_or_else(|| ForumError::parse(format!("missing author of discussion {discussion_id}")))?;
    let timestamp: i64 = numeric_attr(
        select_first(author_info, &selectors.time, "discussion date")?,
        "data-timestamp",
        "discussion date",
    )?;
    let created_at = timestamp_to_datetime(timestamp)?;

    let is_subscribed = toggle_is_on(select_first(
        row,
        &selectors.subscription,
        "subscription toggle",
    )?);

    Ok(Discussion {
        is_subscribed,
        is_favorited,
        ..Discussion::new(discussion_id, title, author, created_at)
    })
}

/// A toggle whose target-state is "0" marks the flag as set.
fn toggle_is_on(toggle: ElementRef<'_>) -> bool {
    toggle.value().attr("data-targetstate") == Some(TOGGLE_ON_STATE)
}

fn timestamp_to_datetime(timestamp: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .ok_or_else(|| ForumError::parse(format!("invalid discussion timestamp {timestamp}")))
}
