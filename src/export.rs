//! Markdown export of a scraped forum.
//!
//! Layout: `<directory>/<discussion_id>/discussion_<discussion_id>_post_<post_id>.md`.

use std::path::Path;

use tracing::{debug, info};

use crate::error::{ForumError, Result};
use crate::forum::{Discussion, Forum};
use crate::fs_utils::ensure_dir;

/// Write every discussion of `forum` under `directory`.
///
/// Does nothing, not even creating `directory`, when the forum is inaccessible.
///
/// # Errors
///
/// Returns an error if `directory` (or a discussion directory) exists and is
/// not a directory, or if a file cannot be written.
pub async fn save_forum(forum: &Forum, directory: &Path) -> Result<()> {
    if !forum.accessible {
        debug!(forum_id = forum.forum_id, "Forum is not accessible, nothing to save");
        return Ok(());
    }

    ensure_dir(directory).await?;

    for discussion in forum {
        let discussion_dir = directory.join(discussion.discussion_id.to_string());
        save_discussion(discussion, &discussion_dir).await?;
    }

    info!(
        forum_id = forum.forum_id,
        discussions = forum.discussions.len(),
        directory = %directory.display(),
        "Forum saved"
    );
    Ok(())
}

/// Write one Markdown file per post of `discussion` into `directory`.
///
/// # Errors
///
/// Returns [`ForumError::NotADirectory`] if `directory` exists as a file,
/// or [`ForumError::Io`] if a post cannot be written.
pub async fn save_discussion(discussion: &Discussion, directory: &Path) -> Result<()> {
    ensure_dir(directory).await?;

    for post in &discussion.posts {
        let path = directory.join(post.file_name());
        tokio::fs::write(&path, post.render())
            .await
            .map_err(|e| ForumError::io(&path, e))?;
    }

    debug!(
        discussion_id = discussion.discussion_id,
        posts = discussion.posts.len(),
        "Discussion saved"
    );
    Ok(())
}
