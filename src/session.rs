//! Authenticated HTTP access to the portal.
//!
//! A [`Session`] is built once per run and handed to every operation that
//! needs the network. It owns a cookie jar shared by two clients: one that
//! follows redirects and one that stops at the first response, which is how
//! forum access is probed.

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use tracing::trace;
use url::Url;

use crate::constants::{
    CAS_LOGIN_PATH, DISCUSSION_VIEW_PATH, FLAT_VIEW_MODE, FORUM_VIEW_PATH, REQUEST_TIMEOUT,
    USER_AGENT,
};
use crate::error::{ForumError, Result};

/// A fetched page: the URL it was finally served from, its status and body.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    pub status: StatusCode,
    pub body: String,
}

impl Page {
    /// Fail with [`ForumError::Response`] unless the status is 2xx.
    ///
    /// # Errors
    ///
    /// Returns an error if the page was not served successfully.
    pub fn ensure_success(self) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(ForumError::Response {
                url: self.url.to_string(),
                status: self.status,
            })
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    base_url: Url,
    jar: Arc<Jar>,
    client: Client,
    no_redirect: Client,
}

impl Session {
    /// Create a session against the portal rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or the HTTP clients cannot be built.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let jar = Arc::new(Jar::default());

        Ok(Self {
            client: build_client(&jar, Policy::default())?,
            no_redirect: build_client(&jar, Policy::none())?,
            base_url,
            jar,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Cookie jar shared by every request of this session.
    #[must_use]
    pub fn jar(&self) -> &Arc<Jar> {
        &self.jar
    }

    /// Whether `url` is served by the portal itself rather than the identity provider.
    #[must_use]
    pub fn is_portal_url(&self, url: &Url) -> bool {
        url.origin() == self.base_url.origin()
    }

    #[must_use]
    pub fn cas_login_url(&self) -> Url {
        self.portal_url(CAS_LOGIN_PATH, &[("authCAS", "CAS")])
    }

    #[must_use]
    pub fn forum_url(&self, forum_id: u64) -> Url {
        let id = forum_id.to_string();
        self.portal_url(FORUM_VIEW_PATH, &[("id", id.as_str())])
    }

    /// Flat view of a discussion, with every post on a single page.
    #[must_use]
    pub fn discussion_url(&self, discussion_id: u64) -> Url {
        let id = discussion_id.to_string();
        self.portal_url(
            DISCUSSION_VIEW_PATH,
            &[("mode", FLAT_VIEW_MODE), ("d", id.as_str())],
        )
    }

    /// Route `path` below the portal root, keeping any path the root is installed under.
    fn portal_url(&self, path: &str, query: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        let root = self.base_url.path().trim_end_matches('/');
        url.set_path(&format!("{root}{path}"));
        url.set_query(None);
        url.set_fragment(None);
        url.query_pairs_mut().extend_pairs(query);
        url
    }

    /// GET `url`, following redirects.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure; the status is not checked.
    pub async fn get(&self, url: &Url) -> Result<Page> {
        trace!(url = %url, "GET");
        let response = self.client.get(url.clone()).send().await?;
        into_page(response).await
    }

    /// GET `url` and return the first response, even if it is a redirect.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure; the status is not checked.
    pub async fn get_no_redirect(&self, url: &Url) -> Result<Page> {
        trace!(url = %url, "GET (no redirect)");
        let response = self.no_redirect.get(url.clone()).send().await?;
        into_page(response).await
    }

    /// POST an url-encoded form to `url`, following redirects.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure; the status is not checked.
    pub async fn post_form(&self, url: &Url, form: &[(&str, &str)]) -> Result<Page> {
        trace!(url = %url, "POST");
        let response = self.client.post(url.clone()).form(form).send().await?;
        into_page(response).await
    }
}

fn build_client(jar: &Arc<Jar>, redirect: Policy) -> Result<Client> {
    Client::builder()
        .cookie_provider(Arc::clone(jar))
        .redirect(redirect)
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(ForumError::Connection)
}

async fn into_page(response: reqwest::Response) -> Result<Page> {
    let url = response.url().clone();
    let status = response.status();
    let body = response.text().await?;
    Ok(Page { url, status, body })
}
