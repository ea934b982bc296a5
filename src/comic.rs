//! Random comic selection from the webcomic JSON API
//!
//! The API exposes the newest issue at `{base}/info.0.json` and each issue at
//! `{base}/{num}/info.0.json`. A run asks for the newest issue number, draws an
//! issue uniformly from `1..=num` and fetches its image URL and caption.

use crate::config::ComicConfig;
use crate::error::{Error, Result};
use crate::http::{describe_transport_error, endpoint};
use crate::types::{ComicMetadata, Stage};
use rand::Rng;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// Draw a uniformly distributed issue number in `[1, max]`
///
/// A `max` of 0 is treated as 1, since issue numbering starts at 1.
pub fn pick_random(max: u32) -> u32 {
    rand::thread_rng().gen_range(1..=max.max(1))
}

/// Strategy for choosing which issue to post
///
/// Implemented for any `Fn(u32) -> u32`, which receives the latest issue number.
pub trait IssueSelector: Send + Sync {
    /// Choose an issue number in `[1, latest]`
    fn select(&self, latest: u32) -> u32;
}

/// Uniform random selection backed by the thread-local RNG
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformSelector;

impl IssueSelector for UniformSelector {
    fn select(&self, latest: u32) -> u32 {
        pick_random(latest)
    }
}

impl<F> IssueSelector for F
where
    F: Fn(u32) -> u32 + Send + Sync,
{
    fn select(&self, latest: u32) -> u32 {
        self(latest)
    }
}

#[derive(Debug, Deserialize)]
struct LatestIssue {
    num: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
    img: Option<String>,
    alt: Option<String>,
    title: Option<String>,
}

/// Picks a random comic and resolves its metadata
pub struct ComicPicker {
    client: reqwest::Client,
    base_url: String,
    selector: Box<dyn IssueSelector>,
}

impl ComicPicker {
    /// Create a picker using uniform random selection
    pub fn new(client: reqwest::Client, config: &ComicConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            selector: Box::new(UniformSelector),
        }
    }

    /// Replace the selection strategy
    pub fn with_selector(mut self, selector: impl IssueSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    /// Number of the newest issue
    pub async fn fetch_latest_count(&self) -> Result<u32> {
        let url = endpoint(&self.base_url, "info.0.json");
        let latest: LatestIssue = self.get_json(&url, Stage::LatestIssue).await?;

        match latest.num {
            Some(num) if num >= 1 => Ok(num),
            Some(_) => Err(Error::MalformedResponse {
                stage: Stage::LatestIssue,
                message: "latest issue number is 0".to_string(),
            }),
            None => Err(Error::MalformedResponse {
                stage: Stage::LatestIssue,
                message: "missing field 'num'".to_string(),
            }),
        }
    }

    /// Fetch image URL and caption of one issue
    pub async fn fetch_metadata(&self, identifier: u32) -> Result<ComicMetadata> {
        let url = endpoint(&self.base_url, &format!("{}/info.0.json", identifier));
        let issue: IssueResponse = self.get_json(&url, Stage::IssueMetadata).await?;

        let image_url = issue
            .img
            .filter(|img| !img.trim().is_empty())
            .ok_or_else(|| Error::MalformedResponse {
                stage: Stage::IssueMetadata,
                message: format!("issue {} has no 'img' field", identifier),
            })?;
        let caption = issue.alt.ok_or_else(|| Error::MalformedResponse {
            stage: Stage::IssueMetadata,
            message: format!("issue {} has no 'alt' field", identifier),
        })?;

        Ok(ComicMetadata {
            identifier,
            image_url,
            caption,
            title: issue.title,
        })
    }

    /// Resolve the latest issue, draw one at random and fetch its metadata
    pub async fn pick_random_comic(&self) -> Result<ComicMetadata> {
        let latest = self.fetch_latest_count().await?;
        let identifier = self.selector.select(latest).clamp(1, latest);
        info!(comic_id = identifier, latest, "Getting comic #{}", identifier);
        self.fetch_metadata(identifier).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, stage: Stage) -> Result<T> {
        debug!(url = %url, %stage, "fetching comic API");

        let response = self.client.get(url).send().await.map_err(|e| {
            Error::UpstreamUnavailable {
                stage,
                message: describe_transport_error(&e, url),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable {
                stage,
                message: format!("HTTP {} from '{}'", status, url),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::UpstreamUnavailable {
                stage,
                message: describe_transport_error(&e, url),
            })?;

        serde_json::from_slice(&body).map_err(|e| Error::UpstreamUnavailable {
            stage,
            message: format!("unparsable body from '{}': {}", url, e),
        })
    }
}
