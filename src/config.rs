use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::constants::{DEFAULT_COOKIES_FILE, DEFAULT_PORTAL_URL};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {} as JSON: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse {} as TOML: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Run configuration, read once at startup.
#[derive(Clone, Deserialize)]
pub struct Config {
    pub username: String,
    pub password: String,
    pub forum_id: u64,
    pub output_directory: PathBuf,
    /// Persist session cookies between runs.
    #[serde(default)]
    pub save_cookies: bool,
    #[serde(default = "default_cookies_file")]
    pub cookies_file: PathBuf,
    #[serde(default = "default_portal_url")]
    pub portal_url: String,
}

fn default_cookies_file() -> PathBuf {
    PathBuf::from(DEFAULT_COOKIES_FILE)
}

fn default_portal_url() -> String {
    DEFAULT_PORTAL_URL.to_string()
}

// Hand-written so the password never reaches the logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("forum_id", &self.forum_id)
            .field("output_directory", &self.output_directory)
            .field("save_cookies", &self.save_cookies)
            .field("cookies_file", &self.cookies_file)
            .field("portal_url", &self.portal_url)
            .finish()
    }
}

impl Config {
    /// Load the configuration file at `path`, then apply environment overrides.
    ///
    /// Files ending in `.toml` are read as TOML, anything else as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an override is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::parse(path, &content)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration content, picking the format from `path`'s extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid for that format.
    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            toml::from_str(content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })
        } else {
            serde_json::from_str(content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    /// Override file values with `MOODLE_*` environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or boolean variable does not parse.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(username) = optional_env("MOODLE_USERNAME") {
            self.username = username;
        }
        if let Some(password) = optional_env("MOODLE_PASSWORD") {
            self.password = password;
        }
        self.forum_id = parse_env_u64("MOODLE_FORUM_ID", self.forum_id)?;
        if let Some(dir) = optional_env("MOODLE_OUTPUT_DIRECTORY") {
            self.output_directory = PathBuf::from(dir);
        }
        self.save_cookies = parse_env_bool("MOODLE_SAVE_COOKIES", self.save_cookies)?;
        Ok(())
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "username".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.password.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "password".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.forum_id == 0 {
            return Err(ConfigError::InvalidValue {
                name: "forum_id".to_string(),
                message: "must be a positive forum id".to_string(),
            });
        }
        if self.output_directory.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "output_directory".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        match Url::parse(&self.portal_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
            _ => {
                return Err(ConfigError::InvalidValue {
                    name: "portal_url".to_string(),
                    message: format!("must be an absolute http(s) URL, got '{}'", self.portal_url),
                });
            }
        }
        Ok(())
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}
