//! # comic-wall
//!
//! Republishes a random xkcd comic, with its alt text as the caption, as a photo
//! post on a VK community wall.
//!
//! A run is one straight sequence of HTTP calls:
//!
//! 1. [`ComicPicker`] reads the newest issue number, draws one issue uniformly and
//!    fetches its image URL and caption
//! 2. [`ImageFetcher`] downloads the image into the scratch directory
//! 3. [`WallPhotoPublisher`] gets an upload URL, uploads the image, saves it to the
//!    wall album and posts it
//! 4. [`Pipeline`] sequences the above and removes the image on every exit path
//!
//! Nothing is retried. Any failure aborts the run and names the stage it came from.
//!
//! ## Quick Start
//!
//! ```no_run
//! use comic_wall::{Config, Pipeline};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::new(123456, "vk-access-token");
//!     let outcome = Pipeline::new(config)?.run().await?;
//!     println!("posted comic #{} as {}", outcome.comic_id, outcome.attachment);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Random comic selection
pub mod comic;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Image download
pub mod fetcher;
/// Shared HTTP helpers
pub mod http;
/// Run orchestration and scratch file cleanup
pub mod pipeline;
/// VK wall photo publishing
pub mod publisher;
/// Core types
pub mod types;

// Re-export commonly used types
pub use comic::{ComicPicker, IssueSelector, UniformSelector, pick_random};
pub use config::{ComicConfig, Config, VkConfig};
pub use error::{Error, Result};
pub use fetcher::ImageFetcher;
pub use pipeline::{Pipeline, ScratchFile};
pub use publisher::WallPhotoPublisher;
pub use types::{
    ComicMetadata, DownloadedImage, PostOutcome, PublishRequest, SavedPhotoRef, Stage,
    UploadTicket, VkCredentials,
};
