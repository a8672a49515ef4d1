//! Netscape `cookies.txt` persistence for the session cookie jar.
//!
//! Reusing the portal and CAS cookies between runs lets most runs skip the
//! credential round-trip. The jar only exposes the `Cookie` header it would
//! send to a URL, so cookies first seen during the run lose their attributes
//! and are written as host-only session cookies. Loaded cookies the jar still
//! holds unchanged are written back as they were read.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;

use chrono::Utc;
use reqwest::cookie::{CookieStore, Jar};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ForumError, Result};

const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

const FILE_HEADER: &str = "# Netscape HTTP Cookie File\n# This file was generated by moodle-forum-mirror. Edit at your own risk.\n\n";

/// One line of a Netscape cookie file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetscapeCookie {
    pub domain: String,
    pub include_subdomains: bool,
    pub path: String,
    pub secure: bool,
    /// UNIX expiry time; 0 for a session cookie.
    pub expires: i64,
    pub name: String,
    pub value: String,
    pub http_only: bool,
}

impl NetscapeCookie {
    /// Parse one line, returning `None` for comments, blank or malformed lines.
    #[must_use]
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (line, http_only) = match line.strip_prefix(HTTP_ONLY_PREFIX) {
            Some(rest) => (rest, true),
            None => (line, false),
        };
        if line.trim().is_empty() || line.starts_with('#') {
            return None;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 7 {
            return None;
        }

        Some(Self {
            domain: parts[0].to_string(),
            include_subdomains: parts[1].eq_ignore_ascii_case("TRUE"),
            path: parts[2].to_string(),
            secure: parts[3].eq_ignore_ascii_case("TRUE"),
            expires: parts[4].parse().ok()?,
            name: parts[5].to_string(),
            value: parts[6].to_string(),
            http_only,
        })
    }

    #[must_use]
    pub fn to_line(&self) -> String {
        let flag = |b: bool| if b { "TRUE" } else { "FALSE" };
        format!(
            "{}{}\t{}\t{}\t{}\t{}\t{}\t{}",
            if self.http_only { HTTP_ONLY_PREFIX } else { "" },
            self.domain,
            flag(self.include_subdomains),
            self.path,
            flag(self.secure),
            self.expires,
            self.name,
            self.value
        )
    }

    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires != 0 && self.expires <= now
    }

    /// URL the cookie is scoped to, used to feed it back to the jar.
    fn origin(&self) -> Option<Url> {
        let scheme = if self.secure { "https" } else { "http" };
        Url::parse(&format!("{scheme}://{}{}", self.host(), self.path)).ok()
    }

    fn host(&self) -> &str {
        self.domain.trim_start_matches('.')
    }

    /// Whether `jar` still sends this exact cookie to its origin.
    fn is_still_sent(&self, jar: &Jar) -> bool {
        self.origin().is_some_and(|url| {
            sent_pairs(jar, &url)
                .iter()
                .any(|(name, value)| *name == self.name && *value == self.value)
        })
    }

    /// `Set-Cookie` header value equivalent to this line.
    fn set_cookie_header(&self, now: i64) -> String {
        let mut header = format!("{}={}; Path={}", self.name, self.value, self.path);
        if self.include_subdomains {
            header.push_str("; Domain=");
            header.push_str(self.host());
        }
        if self.secure {
            header.push_str("; Secure");
        }
        if self.http_only {
            header.push_str("; HttpOnly");
        }
        if self.expires != 0 {
            header.push_str(&format!("; Max-Age={}", self.expires - now));
        }
        header
    }
}

/// Parse the content of a cookie file, skipping unreadable lines.
#[must_use]
pub fn parse_cookie_file(content: &str) -> Vec<NetscapeCookie> {
    content
        .lines()
        .filter_map(|line| {
            let cookie = NetscapeCookie::parse_line(line);
            if cookie.is_none()
                && !line.trim().is_empty()
                && (!line.starts_with('#') || line.starts_with(HTTP_ONLY_PREFIX))
            {
                warn!(line, "Skipping malformed cookie line");
            }
            cookie
        })
        .collect()
}

/// Load unexpired cookies from `path` into `jar`. A missing file loads nothing.
///
/// Returns the cookies that were fed to the jar, to be handed back to
/// [`save_cookies`] so they survive runs that never visit their host.
///
/// # Errors
///
/// Returns [`ForumError::Io`] if the file exists but cannot be read.
pub async fn load_cookies(jar: &Jar, path: &Path) -> Result<Vec<NetscapeCookie>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No cookie file to load");
            return Ok(Vec::new());
        }
        Err(e) => return Err(ForumError::io(path, e)),
    };

    let now = Utc::now().timestamp();
    let mut loaded = Vec::new();
    for cookie in parse_cookie_file(&content) {
        if cookie.is_expired(now) {
            continue;
        }
        let Some(url) = cookie.origin() else {
            warn!(domain = %cookie.domain, "Skipping cookie with unusable domain");
            continue;
        };
        jar.add_cookie_str(&cookie.set_cookie_header(now), &url);
        loaded.push(cookie);
    }

    info!(path = %path.display(), loaded = loaded.len(), "Cookies loaded");
    Ok(loaded)
}

/// Cookies `jar` would send to each of `urls`, as host-only session cookies.
#[must_use]
pub fn jar_cookies(jar: &Jar, urls: &[Url]) -> Vec<NetscapeCookie> {
    let mut seen = HashSet::new();
    let mut cookies = Vec::new();

    for url in urls {
        let Some(host) = url.host_str() else {
            continue;
        };
        for (name, value) in sent_pairs(jar, url) {
            if !seen.insert((host.to_string(), name.clone())) {
                continue;
            }
            cookies.push(NetscapeCookie {
                domain: host.to_string(),
                include_subdomains: false,
                path: "/".to_string(),
                secure: url.scheme() == "https",
                expires: 0,
                name,
                value,
                http_only: false,
            });
        }
    }

    cookies
}

/// Cookies to persist after a run.
///
/// Loaded cookies the jar still sends unchanged keep their original line,
/// expiry included. Anything else the jar sends to `urls`, or to the
/// origin of a loaded cookie, is added through [`jar_cookies`].
#[must_use]
pub fn merge_cookies(jar: &Jar, urls: &[Url], loaded: &[NetscapeCookie]) -> Vec<NetscapeCookie> {
    let mut cookies: Vec<NetscapeCookie> = loaded
        .iter()
        .filter(|cookie| cookie.is_still_sent(jar))
        .cloned()
        .collect();

    let mut targets = urls.to_vec();
    targets.extend(loaded.iter().filter_map(NetscapeCookie::origin));

    for cookie in jar_cookies(jar, &targets) {
        let known = cookies
            .iter()
            .any(|c| c.host() == cookie.domain && c.name == cookie.name);
        if !known {
            cookies.push(cookie);
        }
    }

    cookies
}

/// Write the cookies to keep (see [`merge_cookies`]) to `path`.
///
/// # Errors
///
/// Returns [`ForumError::Io`] if the file cannot be written.
pub async fn save_cookies(
    jar: &Jar,
    urls: &[Url],
    loaded: &[NetscapeCookie],
    path: &Path,
) -> Result<usize> {
    let cookies = merge_cookies(jar, urls, loaded);

    let mut content = String::from(FILE_HEADER);
    for cookie in &cookies {
        content.push_str(&cookie.to_line());
        content.push('\n');
    }

    tokio::fs::write(path, content)
        .await
        .map_err(|e| ForumError::io(path, e))?;

    info!(path = %path.display(), saved = cookies.len(), "Cookies saved");
    Ok(cookies.len())
}

/// `name=value` pairs of the `Cookie` header `jar` would send to `url`.
fn sent_pairs(jar: &Jar, url: &Url) -> Vec<(String, String)> {
    let Some(header) = jar.cookies(url) else {
        return Vec::new();
    };
    let Ok(header) = header.to_str() else {
        return Vec::new();
    };
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}
