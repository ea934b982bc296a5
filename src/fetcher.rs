//! Image download into the scratch directory

use crate::error::{Error, Result};
use crate::http::describe_transport_error;
use crate::types::{DownloadedImage, Stage};
use std::path::Path;
use tracing::debug;

/// Downloads comic images to local files
pub struct ImageFetcher {
    client: reqwest::Client,
}

impl ImageFetcher {
    /// Create a fetcher sharing the run's HTTP client
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Download `url` and write the raw bytes to `destination`
    ///
    /// The parent directory is created if missing. Bytes are persisted as-is, with no
    /// size cap or content-type check. The caller owns the created file.
    pub async fn download(&self, url: &str, destination: &Path) -> Result<DownloadedImage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| download_failed(describe_transport_error(&e, url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_failed(format!("HTTP {} from '{}'", status, url)));
        }

        let content = response.bytes().await.map_err(|e| {
            download_failed(format!("failed to read body from '{}': {}", url, e))
        })?;

        if let Some(parent) = destination.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                download_failed(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        tokio::fs::write(destination, &content).await.map_err(|e| {
            download_failed(format!("failed to write {}: {}", destination.display(), e))
        })?;

        debug!(
            url = %url,
            path = %destination.display(),
            bytes = content.len(),
            "image downloaded"
        );

        Ok(DownloadedImage {
            local_path: destination.to_path_buf(),
            byte_length: content.len() as u64,
        })
    }
}

fn download_failed(message: String) -> Error {
    Error::DownloadFailed {
        stage: Stage::ImageDownload,
        message,
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::build_client;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> ImageFetcher {
        ImageFetcher::new(build_client(Duration::from_secs(5)).unwrap())
    }

    #[tokio::test]
    async fn test_download_writes_exact_bytes() {
        let server = MockServer::start().await;
        let fixture: Vec<u8> = vec![0x89, b'P', b'N', b'G', 0x00, 0xff, 0x01, 0x02];
        Mock::given(method("GET"))
            .and(path("/comics/img.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(fixture.clone()))
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("1234.png");
        let url = format!("{}/comics/img.png", server.uri());

        let image = fetcher().download(&url, &dest).await.unwrap();

        assert_eq!(image.local_path, dest);
        assert_eq!(image.byte_length, fixture.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), fixture);
    }

    #[tokio::test]
    async fn test_download_creates_missing_directory() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3, 4]))
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("nested").join("images").join("1.png");
        let url = format!("{}/img.png", server.uri());

        fetcher().download(&url, &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), vec![1u8, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_download_http_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("missing.png");
        let url = format!("{}/missing.png", server.uri());

        match fetcher().download(&url, &dest).await.unwrap_err() {
            Error::DownloadFailed { stage, message } => {
                assert_eq!(stage, Stage::ImageDownload);
                assert!(message.contains("404"));
            }
            other => panic!("expected DownloadFailed, got {other:?}"),
        }
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_write_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8]))
            .mount(&server)
            .await;

        // A regular file where the parent directory should be
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let dest = blocker.join("1.png");
        let url = format!("{}/img.png", server.uri());

        let err = fetcher().download(&url, &dest).await.unwrap_err();
        assert!(matches!(err, Error::DownloadFailed { .. }));
    }
}
