//! One run: pick a comic, download it, publish it, clean up
//!
//! The downloaded image lives in a [`ScratchFile`] for the whole run. Dropping the
//! guard removes the file, so it is gone after success, after any failure that
//! follows the download, and when the run's future is cancelled.

use crate::comic::{ComicPicker, IssueSelector};
use crate::config::Config;
use crate::error::Result;
use crate::fetcher::ImageFetcher;
use crate::http::build_client;
use crate::publisher::WallPhotoPublisher;
use crate::types::{ComicMetadata, PostOutcome};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A file that is deleted when the guard goes out of scope
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Take ownership of the file at `path`
    ///
    /// Call this before the file is written so a partial write is also removed.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the guarded file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed scratch file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to remove scratch file")
            }
        }
    }
}

/// Scratch file name for a comic: its identifier plus the image's extension
pub fn scratch_file_name(comic: &ComicMetadata) -> String {
    let extension = url::Url::parse(&comic.image_url)
        .ok()
        .and_then(|url| {
            Path::new(url.path())
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase)
        })
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "png".to_string());
    format!("{}.{}", comic.identifier, extension)
}

/// Sequences the comic picker, image fetcher and wall publisher
pub struct Pipeline {
    scratch_dir: PathBuf,
    picker: ComicPicker,
    fetcher: ImageFetcher,
    publisher: WallPhotoPublisher,
}

impl Pipeline {
    /// Validate the configuration and build every component around one HTTP client
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = build_client(config.request_timeout)?;

        Ok(Self {
            picker: ComicPicker::new(client.clone(), &config.comic),
            fetcher: ImageFetcher::new(client.clone()),
            publisher: WallPhotoPublisher::new(
                client,
                &config.vk.api_base,
                config.vk.credentials(),
            ),
            scratch_dir: config.scratch_dir,
        })
    }

    /// Replace how the comic is chosen from the available issues
    pub fn with_selector(mut self, selector: impl IssueSelector + 'static) -> Self {
        self.picker = self.picker.with_selector(selector);
        self
    }

    /// Run the whole pipeline once
    pub async fn run(&self) -> Result<PostOutcome> {
        let comic = self.picker.pick_random_comic().await?;
        if let Some(title) = &comic.title {
            info!(comic_id = comic.identifier, title = %title, "comic selected");
        }

        let scratch = ScratchFile::new(self.scratch_dir.join(scratch_file_name(&comic)));
        let image = self
            .fetcher
            .download(&comic.image_url, scratch.path())
            .await?;

        let photo = self
            .publisher
            .publish(&image.local_path, &comic.caption)
            .await?;

        drop(scratch);

        let outcome = PostOutcome {
            comic_id: comic.identifier,
            attachment: photo.attachment(),
            bytes: image.byte_length,
        };
        info!(
            comic_id = outcome.comic_id,
            attachment = %outcome.attachment,
            bytes = outcome.bytes,
            "comic posted"
        );
        Ok(outcome)
    }
}
