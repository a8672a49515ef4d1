use std::path::{Path, PathBuf};

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while talking to the portal or mirroring its content.
#[derive(Debug, Error)]
pub enum ForumError {
    /// Transport-level failure reported by the HTTP client.
    #[error("connection to the portal failed: {0}")]
    Connection(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Response { url: String, status: StatusCode },
    #[error("login failed: {0}")]
    Login(String),
    /// An element the scraper relies on is absent from the page.
    #[error("failed to parse portal page: {0}")]
    Parse(String),
    /// Reserved for flows that detect an expired session; nothing raises it yet.
    #[error("not logged in to the portal")]
    NotLoggedIn,
    #[error("invalid portal URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
}

impl ForumError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T, E = ForumError> = std::result::Result<T, E>;
