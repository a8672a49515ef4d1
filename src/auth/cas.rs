//! CAS login handshake.
//!
//! The portal's CAS entry point either lands straight back on the portal
//! (the session cookie is still valid) or on the identity provider's login
//! form. The form carries a per-load `execution` nonce which must be posted
//! back, together with the credentials, to the URL the form was served from.

use reqwest::StatusCode;
use scraper::Html;
use tracing::{debug, info};
use url::Url;

use crate::constants::DEVICE_FINGERPRINT;
use crate::error::{ForumError, Result};
use crate::html::{attr, selector};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The session cookie was still valid; no credentials were sent.
    AlreadyLoggedIn,
    /// Credentials were accepted by the identity provider at `provider`.
    LoggedIn { provider: Url },
}

/// Log `session` into the portal.
///
/// # Errors
///
/// Returns [`ForumError::Parse`] if the login form has no `execution` value,
/// [`ForumError::Login`] if the provider rejects the credentials, and
/// [`ForumError::Response`] for any other error status.
pub async fn login(session: &Session, username: &str, password: &str) -> Result<LoginOutcome> {
    let entry = session.cas_login_url();
    debug!(url = %entry, "Opening CAS login page");
    let login_page = session.get(&entry).await?;

    if session.is_portal_url(&login_page.url) {
        info!("Already logged in");
        return Ok(LoginOutcome::AlreadyLoggedIn);
    }

    let execution = extract_execution(&login_page.body)?;

    debug!(url = %login_page.url, "Submitting credentials to identity provider");
    let response = session
        .post_form(
            &login_page.url,
            &[
                ("username", username),
                ("password", password),
                ("execution", execution.as_str()),
                ("_eventId", "submit"),
                ("geolocation", ""),
                ("deviceFingerprint", DEVICE_FINGERPRINT),
            ],
        )
        .await?;

    if response.status == StatusCode::UNAUTHORIZED {
        return Err(ForumError::Login("invalid username or password".to_string()));
    }
    if response.status.is_client_error() || response.status.is_server_error() {
        return Err(ForumError::Response {
            url: response.url.to_string(),
            status: response.status,
        });
    }

    info!(provider = %login_page.url.host_str().unwrap_or_default(), "Logged in");
    Ok(LoginOutcome::LoggedIn {
        provider: login_page.url,
    })
}

/// Value of the hidden `execution` input on the CAS login form.
fn extract_execution(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let input = selector(r#"input[name="execution"]"#)?;

    let field = document
        .select(&input)
        .next()
        .ok_or_else(|| ForumError::parse("could not find execution field on login page"))?;
    let value = attr(field, "value", "execution field")?;

    if value.is_empty() {
        return Err(ForumError::parse("execution field on login page is empty"));
    }
    Ok(value.to_string())
}
