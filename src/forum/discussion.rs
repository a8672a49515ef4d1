use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::Result;
use crate::export;
use crate::session::Session;

use super::thread::{parse_posts, PostBlock};
use super::Post;

/// A forum thread and the posts currently rendered on its page.
#[derive(Debug, Clone, PartialEq)]
pub struct Discussion {
    pub discussion_id: u64,
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub is_subscribed: bool,
    pub is_favorited: bool,
    pub posts: Vec<Post>,
}

impl Discussion {
    #[must_use]
    pub fn new(
        discussion_id: u64,
        title: impl Into<String>,
        author: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            discussion_id,
            title: title.into(),
            author: author.into(),
            created_at,
            is_subscribed: false,
            is_favorited: false,
            posts: Vec::new(),
        }
    }

    #[must_use]
    pub fn post(&self, post_id: u64) -> Option<&Post> {
        self.posts.iter().find(|p| p.post_id == post_id)
    }

    /// The post `post` replies to, if it is still part of this discussion.
    #[must_use]
    pub fn parent_of(&self, post: &Post) -> Option<&Post> {
        post.responds_to.and_then(|id| self.post(id))
    }

    pub fn replies_to(&self, post_id: u64) -> impl Iterator<Item = &Post> {
        self.posts
            .iter()
            .filter(move |p| p.responds_to == Some(post_id))
    }

    /// Refetch the discussion page and make the post collection match it.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be fetched, is served with an
    /// error status, or a post block cannot be parsed.
    pub async fn update_posts(&mut self, session: &Session) -> Result<()> {
        let url = session.discussion_url(self.discussion_id);
        let page = session.get(&url).await?.ensure_success()?;
        let blocks = parse_posts(&page.body)?;
        self.reconcile_posts(blocks);
        Ok(())
    }

    /// Apply freshly parsed post blocks: known posts are updated in place,
    /// new ones appended, and posts absent from `blocks` dropped.
    pub fn reconcile_posts(&mut self, blocks: Vec<PostBlock>) {
        let mut seen = HashSet::with_capacity(blocks.len());
        let mut added = 0usize;

        for block in blocks {
            seen.insert(block.post_id);

            let index = if let Some(index) = self.posts.iter().position(|p| p.post_id == block.post_id) {
                index
            } else {
                self.posts
                    .push(Post::placeholder(self.discussion_id, block.post_id));
                added += 1;
                self.posts.len() - 1
            };

            let post = &mut self.posts[index];
            post.title = block.title;
            post.author = block.author;
            post.created_at = block.created_at;
            post.content = block.content;
            post.responds_to = block.responds_to;
        }

        let before = self.posts.len();
        self.posts.retain(|p| seen.contains(&p.post_id));

        debug!(
            discussion_id = self.discussion_id,
            posts = self.posts.len(),
            added,
            removed = before - self.posts.len(),
            "Reconciled posts"
        );
    }

    /// Write every post of this discussion into `directory`.
    ///
    /// # Errors
    ///
    /// See [`export::save_discussion`].
    pub async fn save(&self, directory: &Path) -> Result<()> {
        export::save_discussion(self, directory).await
    }
}

impl fmt::Display for Discussion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Discussion id={} title={} author={} posts={}>",
            self.discussion_id,
            self.title,
            self.author,
            self.posts.len()
        )
    }
}
