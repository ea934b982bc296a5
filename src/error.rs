//! Error types for comic-wall
//!
//! Every failure that can happen while a comic travels from the webcomic API to the
//! community wall is fatal to the run. Each variant records the [`Stage`] it came from
//! so the process boundary can report which of the HTTP calls failed.

use crate::types::Stage;
use thiserror::Error;

/// Result type alias for comic-wall operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for comic-wall
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "VK_GROUP_ID")
        key: Option<String>,
    },

    /// Webcomic API unreachable, timed out, or returned a non-success status
    #[error("{stage}: webcomic API unavailable: {message}")]
    UpstreamUnavailable {
        /// Stage that issued the request
        stage: Stage,
        /// Transport error or HTTP status description
        message: String,
    },

    /// A required field was absent from an otherwise successful response
    #[error("{stage}: malformed response: {message}")]
    MalformedResponse {
        /// Stage whose response was malformed
        stage: Stage,
        /// Which field was missing or invalid
        message: String,
    },

    /// Image retrieval failed (network or local write)
    #[error("{stage}: image download failed: {message}")]
    DownloadFailed {
        /// Always [`Stage::ImageDownload`]
        stage: Stage,
        /// Transport, status or I/O description
        message: String,
    },

    /// The social-network API rejected the request
    #[error("{stage}: VK API error{}: {message}", code_suffix(.code))]
    AuthOrApiError {
        /// Stage that was rejected
        stage: Stage,
        /// VK `error_code` when the response carried an error envelope
        code: Option<i64>,
        /// VK `error_msg`, HTTP status or transport description
        message: String,
    },

    /// The binary upload POST failed or returned an unusable ticket
    #[error("{stage}: photo upload failed: {message}")]
    UploadFailed {
        /// Always [`Stage::UploadBinary`]
        stage: Stage,
        /// Transport, status or body description
        message: String,
    },

    /// I/O error outside of a pipeline stage (scratch directory, client setup)
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
}

impl Error {
    /// Build a configuration error for the given key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// The pipeline stage this error was raised in, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::UpstreamUnavailable { stage, .. }
            | Error::MalformedResponse { stage, .. }
            | Error::DownloadFailed { stage, .. }
            | Error::AuthOrApiError { stage, .. }
            | Error::UploadFailed { stage, .. } => Some(*stage),
            Error::Config { .. } | Error::Io(_) => None,
        }
    }

    /// Process exit code for this error
    ///
    /// Configuration problems exit with 2 so a scheduler can tell them apart from
    /// a run that failed at one of the remote APIs.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Config { .. } => 2,
            _ => 1,
        }
    }
}

fn code_suffix(code: &Option<i64>) -> String {
    code.map(|c| format!(" {c}")).unwrap_or_default()
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_stage() {
        let err = Error::UpstreamUnavailable {
            stage: Stage::LatestIssue,
            message: "HTTP 503 Service Unavailable".into(),
        };
        assert_eq!(
            err.to_string(),
            "latest issue: webcomic API unavailable: HTTP 503 Service Unavailable"
        );
    }

    #[test]
    fn test_api_error_display_with_and_without_code() {
        let with_code = Error::AuthOrApiError {
            stage: Stage::UploadTarget,
            code: Some(5),
            message: "User authorization failed".into(),
        };
        assert_eq!(
            with_code.to_string(),
            "upload target: VK API error 5: User authorization failed"
        );

        let without_code = Error::AuthOrApiError {
            stage: Stage::PostToWall,
            code: None,
            message: "HTTP 500".into(),
        };
        assert_eq!(without_code.to_string(), "post to wall: VK API error: HTTP 500");
    }

    #[test]
    fn test_stage_accessor() {
        let err = Error::UploadFailed {
            stage: Stage::UploadBinary,
            message: "connection reset".into(),
        };
        assert_eq!(err.stage(), Some(Stage::UploadBinary));
        assert_eq!(Error::config("VK_GROUP_ID", "not set").stage(), None);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::config("VK_ACCESS_TOKEN", "empty").exit_code(), 2);
        let err = Error::DownloadFailed {
            stage: Stage::ImageDownload,
            message: "HTTP 404".into(),
        };
        assert_eq!(err.exit_code(), 1);
        assert_eq!(Error::Io(std::io::Error::other("disk")).exit_code(), 1);
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = Error::Io(std::io::Error::other("client setup"));
        let source = std::error::Error::source(&err).expect("io error source");
        assert_eq!(source.to_string(), "client setup");
        assert_eq!(err.to_string(), "I/O error: client setup");
    }
}
