//! Shared constants used across the application.

use std::time::Duration;

/// Portal used when the configuration does not name one.
pub const DEFAULT_PORTAL_URL: &str = "https://moodle.umontpellier.fr";

/// User agent string sent with every portal request.
///
/// The CAS provider serves a degraded login page to unknown agents, so this
/// mirrors a regular desktop browser.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Per-request timeout enforced by the session.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Portal entry point that hands over to the CAS identity provider.
pub const CAS_LOGIN_PATH: &str = "/login/index.php";

pub const FORUM_VIEW_PATH: &str = "/mod/forum/view.php";

pub const DISCUSSION_VIEW_PATH: &str = "/mod/forum/discuss.php";

/// Discussion display mode rendering every post on one page ("flat" view).
pub const FLAT_VIEW_MODE: &str = "3";

/// Placeholder browser fingerprint expected by the CAS login form.
pub const DEVICE_FINGERPRINT: &str = "1234567890";

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

pub const DEFAULT_COOKIES_FILE: &str = "cookies.txt";
