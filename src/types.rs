//! Core types flowing through the pipeline

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Pipeline stage, attached to every error for diagnosis
///
/// Serializes as snake_case so library users can report it in structured output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Fetching the latest issue number from the webcomic API
    LatestIssue,
    /// Fetching metadata for the drawn issue
    IssueMetadata,
    /// Downloading the comic image to the scratch directory
    ImageDownload,
    /// `photos.getWallUploadServer`
    UploadTarget,
    /// Multipart POST to the upload URL
    UploadBinary,
    /// `photos.saveWallPhoto`
    SaveToAlbum,
    /// `wall.post`
    PostToWall,
}

impl Stage {
    /// Human-readable stage name used in logs and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::LatestIssue => "latest issue",
            Stage::IssueMetadata => "issue metadata",
            Stage::ImageDownload => "image download",
            Stage::UploadTarget => "upload target",
            Stage::UploadBinary => "upload binary",
            Stage::SaveToAlbum => "save to album",
            Stage::PostToWall => "post to wall",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata of a single comic issue
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComicMetadata {
    /// Issue number (always >= 1)
    pub identifier: u32,
    /// Absolute URL of the comic image
    pub image_url: String,
    /// Caption (the comic's alt text), used as the wall post message
    pub caption: String,
    /// Issue title, when the API provides one
    pub title: Option<String>,
}

/// An image persisted to the scratch directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadedImage {
    /// Where the bytes were written
    pub local_path: PathBuf,
    /// Number of bytes written
    pub byte_length: u64,
}

/// Opaque ticket returned by the upload server, passed verbatim to `photos.saveWallPhoto`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadTicket {
    /// Upload server identifier
    pub server: String,
    /// Upload hash
    pub hash: String,
    /// Serialized photo descriptor
    pub photo: String,
}

/// A photo committed to the group's wall album
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SavedPhotoRef {
    /// Owner of the photo (negative for communities)
    pub owner_id: i64,
    /// Photo identifier
    pub media_id: i64,
}

impl SavedPhotoRef {
    /// Attachment reference in the `photo{owner_id}_{media_id}` wire format
    pub fn attachment(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SavedPhotoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "photo{}_{}", self.owner_id, self.media_id)
    }
}

/// Credentials and API version shared by every VK method call
#[derive(Clone, PartialEq, Eq)]
pub struct VkCredentials {
    /// Community (group) identifier, without the leading `-`
    pub group_id: u64,
    /// Community or user access token
    pub access_token: String,
    /// VK API version (`v` parameter)
    pub api_version: String,
}

impl VkCredentials {
    /// Base query parameters every VK method requires
    ///
    /// Built fresh on every call so no request can leak parameters into another.
    pub fn base_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("group_id", self.group_id.to_string()),
            ("access_token", self.access_token.clone()),
            ("v", self.api_version.clone()),
        ]
    }
}

// Keep the token out of logs
impl fmt::Debug for VkCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VkCredentials")
            .field("group_id", &self.group_id)
            .field("access_token", &"<redacted>")
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Everything needed for the final `wall.post` call
#[derive(Clone, Debug)]
pub struct PublishRequest<'a> {
    /// Group, token and API version
    pub credentials: &'a VkCredentials,
    /// Post text
    pub message: &'a str,
    /// Photo to attach
    pub attachment: SavedPhotoRef,
}

impl PublishRequest<'_> {
    /// Full `wall.post` query: base parameters plus owner, message and attachment
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = self.credentials.base_params();
        params.push(("owner_id", format!("-{}", self.credentials.group_id)));
        params.push(("from_group", "1".to_string()));
        params.push(("message", self.message.to_string()));
        params.push(("attachments", self.attachment.attachment()));
        params
    }
}

/// Summary of a successful run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostOutcome {
    /// Comic that was posted
    pub comic_id: u32,
    /// Attachment reference used in the wall post
    pub attachment: String,
    /// Size of the uploaded image
    pub bytes: u64,
}
