use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::error::{ForumError, Result};

/// Make sure `path` is a directory, creating it and its parents if needed.
///
/// # Errors
///
/// Returns [`ForumError::NotADirectory`] if something else already lives at
/// `path`, or [`ForumError::Io`] if it cannot be created.
pub async fn ensure_dir(path: &Path) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(ForumError::NotADirectory(path.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Creating directory");
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|e| ForumError::io(path, e))
        }
        Err(e) => Err(ForumError::io(path, e)),
    }
}

/// Recursively delete the directory at `path` if it exists.
///
/// # Errors
///
/// Returns [`ForumError::Io`] if the directory exists but cannot be removed.
pub async fn clear_dir(path: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Removed previous output");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ForumError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_ensure_dir_creates_parents() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");

        ensure_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        // Existing directories are accepted as-is.
        ensure_dir(&nested).await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_dir_rejects_files() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.md");
        std::fs::write(&file, "x").unwrap();

        assert!(matches!(
            ensure_dir(&file).await,
            Err(ForumError::NotADirectory(p)) if p == file
        ));
    }

    #[tokio::test]
    async fn test_clear_dir() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        std::fs::create_dir_all(out.join("1")).unwrap();
        std::fs::write(out.join("1").join("post.md"), "x").unwrap();

        clear_dir(&out).await.unwrap();
        assert!(!out.exists());
        // Missing directories are fine.
        clear_dir(&out).await.unwrap();
    }
}
