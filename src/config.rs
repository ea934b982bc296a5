//! Configuration types for comic-wall
//!
//! The library never reads the environment itself. The binary assembles a [`Config`]
//! once at startup and hands it to [`Pipeline::new`](crate::Pipeline::new).

use crate::error::{Error, Result};
use crate::types::VkCredentials;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// VK API version the request parameters are written against
pub const DEFAULT_API_VERSION: &str = "5.131";

/// VK community and API settings
#[derive(Clone, Serialize, Deserialize)]
pub struct VkConfig {
    /// Community (group) identifier, positive, without the leading `-`
    pub group_id: u64,

    /// Access token with `photos` and `wall` rights
    #[serde(skip_serializing)]
    pub access_token: String,

    /// API version sent as `v` (default: "5.131")
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Method endpoint base (default: "https://api.vk.com/method")
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl VkConfig {
    /// Credentials passed along with every VK method call
    pub fn credentials(&self) -> VkCredentials {
        VkCredentials {
            group_id: self.group_id,
            access_token: self.access_token.clone(),
            api_version: self.api_version.clone(),
        }
    }
}

impl std::fmt::Debug for VkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VkConfig")
            .field("group_id", &self.group_id)
            .field("access_token", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Webcomic API settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComicConfig {
    /// Base URL of the webcomic JSON API (default: "https://xkcd.com")
    #[serde(default = "default_comic_base_url")]
    pub base_url: String,
}

impl Default for ComicConfig {
    fn default() -> Self {
        Self {
            base_url: default_comic_base_url(),
        }
    }
}

/// Main configuration for a single run
///
/// The binary builds this from flags and environment variables. The serde derives
/// are for library users who keep the settings in their own JSON or TOML files;
/// `request_timeout` is stored as whole seconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// VK community and API settings
    pub vk: VkConfig,

    /// Webcomic API settings
    #[serde(default)]
    pub comic: ComicConfig,

    /// Directory the comic image is downloaded into (default: "./images")
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Config {
    /// Create a configuration with defaults for everything except the VK credentials
    pub fn new(group_id: u64, access_token: impl Into<String>) -> Self {
        Self {
            vk: VkConfig {
                group_id,
                access_token: access_token.into(),
                api_version: default_api_version(),
                api_base: default_api_base(),
            },
            comic: ComicConfig::default(),
            scratch_dir: default_scratch_dir(),
            request_timeout: default_request_timeout(),
        }
    }

    /// Check every setting before any network call is made
    pub fn validate(&self) -> Result<()> {
        if self.vk.group_id == 0 {
            return Err(Error::config(
                "VK_GROUP_ID",
                "group id must be a positive integer",
            ));
        }
        if self.vk.access_token.trim().is_empty() {
            return Err(Error::config("VK_ACCESS_TOKEN", "access token is empty"));
        }
        if self.vk.api_version.trim().is_empty() {
            return Err(Error::config("VK_API_VERSION", "API version is empty"));
        }
        validate_url("VK_API_BASE", &self.vk.api_base)?;
        validate_url("COMIC_BASE_URL", &self.comic.base_url)?;
        if self.request_timeout.is_zero() {
            return Err(Error::config(
                "COMIC_REQUEST_TIMEOUT_SECS",
                "request timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn validate_url(key: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| Error::config(key, format!("invalid URL '{}': {}", value, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::config(
            key,
            format!("unsupported URL scheme '{}' in '{}'", other, value),
        )),
    }
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_api_base() -> String {
    "https://api.vk.com/method".to_string()
}

fn default_comic_base_url() -> String {
    "https://xkcd.com".to_string()
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("./images")
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
