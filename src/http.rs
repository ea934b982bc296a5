//! Shared HTTP client setup and request helpers

use crate::error::{Error, Result};
use std::time::Duration;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("comic-wall/", env!("CARGO_PKG_VERSION"));

/// Build the single client used for every request of a run
///
/// The timeout applies per request; an expired request is reported like any
/// other transport failure of the stage that issued it.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "Failed to create HTTP client: {}",
                e
            )))
        })
}

/// Describe a transport failure for an error message
pub fn describe_transport_error(err: &reqwest::Error, url: &str) -> String {
    if err.is_timeout() {
        format!("request to '{}' timed out", url)
    } else if err.is_connect() {
        format!("connection failed for '{}': {}", url, err)
    } else {
        format!("request to '{}' failed: {}", url, err)
    }
}

/// Join an endpoint base and a path segment, tolerating trailing slashes
pub fn endpoint(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
