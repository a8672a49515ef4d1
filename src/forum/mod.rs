//! In-memory model of a forum and its reconciliation against live pages.
//!
//! Each level fetches and parses its own page: the [`Forum`] reads the
//! discussion list, every [`Discussion`] reads its flat view. Reconciling
//! builds the new collection from the page and keeps only entries seen on
//! it, so a fresh run and a repeated run converge to the same tree.

mod discussion;
pub mod listing;
mod post;
pub mod thread;

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use reqwest::StatusCode;
use tracing::{debug, info, trace};

use crate::error::Result;
use crate::export;
use crate::session::Session;

pub use discussion::Discussion;
pub use listing::{ForumHeader, ListingEntry};
pub use post::Post;
pub use thread::PostBlock;

/// One entry of the site navigation leading to the forum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Forum {
    pub forum_id: u64,
    pub forum_name: Option<String>,
    /// Intro block converted to Markdown.
    pub forum_summary: Option<String>,
    pub path: Vec<Breadcrumb>,
    /// False when the forum page redirected or was refused; nothing else is fetched then.
    pub accessible: bool,
    pub discussions: Vec<Discussion>,
}

/// Build the forum `forum_id` and fetch everything it contains.
///
/// # Errors
///
/// See [`Forum::setup`].
pub async fn get_forum(session: &Session, forum_id: u64) -> Result<Forum> {
    let mut forum = Forum::new(forum_id);
    forum.setup(session).await?;
    Ok(forum)
}

impl Forum {
    #[must_use]
    pub fn new(forum_id: u64) -> Self {
        Self {
            forum_id,
            forum_name: None,
            forum_summary: None,
            path: Vec::new(),
            accessible: false,
            discussions: Vec::new(),
        }
    }

    /// Probe the forum page, read its metadata and fetch all discussions.
    ///
    /// Any status other than 200 on the probe (a redirect to the login or
    /// enrolment page, typically) leaves the forum inaccessible without error.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or when an expected element is
    /// missing from the forum or discussion pages.
    pub async fn setup(&mut self, session: &Session) -> Result<()> {
        let url = session.forum_url(self.forum_id);
        let probe = session.get_no_redirect(&url).await?;

        if probe.status != StatusCode::OK {
            info!(forum_id = self.forum_id, status = %probe.status, "Forum is not accessible");
            self.accessible = false;
            return Ok(());
        }

        self.accessible = true;
        let ForumHeader {
            path,
            name,
            summary,
        } = listing::parse_forum_header(&probe.body)?;
        info!(forum_id = self.forum_id, name = %name, "Forum found");
        self.path = path;
        self.forum_name = Some(name);
        self.forum_summary = Some(summary);

        self.update_discussions(session).await
    }

    /// Make the discussion collection match the forum's current listing.
    ///
    /// Known discussions only get their posts refreshed; new ones are read
    /// from their row and fetched for the first time; discussions no longer
    /// listed are dropped. A discussion listed twice is refreshed once.
    ///
    /// # Errors
    ///
    /// Returns an error if a page cannot be fetched or parsed. No partial
    /// reconciliation is rolled back.
    pub async fn update_discussions(&mut self, session: &Session) -> Result<()> {
        if !self.accessible {
            return Ok(());
        }

        let url = session.forum_url(self.forum_id);
        let page = session.get(&url).await?.ensure_success()?;
        let known: HashSet<u64> = self.discussions.iter().map(|d| d.discussion_id).collect();
        let entries = listing::parse_discussion_rows(&page.body, known)?;

        let mut seen = HashSet::with_capacity(entries.len());
        for entry in entries {
            if !seen.insert(entry.discussion_id()) {
                trace!(discussion_id = entry.discussion_id(), "Discussion listed twice");
                continue;
            }
            match entry {
                ListingEntry::Known(discussion_id) => {
                    if let Some(discussion) = self.discussion_mut(discussion_id) {
                        debug!(discussion_id, "Refreshing known discussion");
                        discussion.update_posts(session).await?;
                    }
                }
                ListingEntry::New(mut discussion) => {
                    debug!(
                        discussion_id = discussion.discussion_id,
                        title = %discussion.title,
                        "Fetching new discussion"
                    );
                    discussion.update_posts(session).await?;
                    self.discussions.push(discussion);
                }
            }
        }

        let before = self.discussions.len();
        self.discussions
            .retain(|d| seen.contains(&d.discussion_id));

        info!(
            forum_id = self.forum_id,
            discussions = self.discussions.len(),
            removed = before - self.discussions.len(),
            "Discussions reconciled"
        );
        Ok(())
    }

    #[must_use]
    pub fn discussion(&self, discussion_id: u64) -> Option<&Discussion> {
        self.discussions
            .iter()
            .find(|d| d.discussion_id == discussion_id)
    }

    pub fn discussion_mut(&mut self, discussion_id: u64) -> Option<&mut Discussion> {
        self.discussions
            .iter_mut()
            .find(|d| d.discussion_id == discussion_id)
    }

    /// Write every post under `directory`, one sub-directory per discussion.
    ///
    /// # Errors
    ///
    /// See [`export::save_forum`].
    pub async fn save(&self, directory: &Path) -> Result<()> {
        export::save_forum(self, directory).await
    }
}

impl<'a> IntoIterator for &'a Forum {
    type Item = &'a Discussion;
    type IntoIter = std::slice::Iter<'a, Discussion>;

    fn into_iter(self) -> Self::IntoIter {
        self.discussions.iter()
    }
}

impl fmt::Display for Forum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Forum id={} name={} discussions={}>",
            self.forum_id,
            self.forum_name.as_deref().unwrap_or("?"),
            self.discussions.len()
        )
    }
}
