//! Moodle forum mirror library.
//!
//! Logs into a Moodle portal through its CAS identity provider, scrapes a
//! single discussion forum and mirrors every post to Markdown files.

// Allow raw string hashes for safety - they're harmless and prevent issues if content changes
#![allow(clippy::needless_raw_string_hashes)]

pub mod auth;
pub mod config;
pub mod constants;
pub mod cookies;
pub mod error;
pub mod export;
pub mod forum;
pub mod fs_utils;
mod html;
pub mod markdown;
pub mod session;

pub use error::{ForumError, Result};
pub use forum::{get_forum, Breadcrumb, Discussion, Forum, Post};
pub use session::{Page, Session};
