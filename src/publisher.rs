//! Publishing a photo post on a VK community wall
//!
//! VK splits a photo post into three phases, which must run in this order:
//!
//! 1. `photos.getWallUploadServer` returns a one-off upload URL
//! 2. the image is POSTed to that URL as multipart field `photo`, which returns
//!    an opaque ticket (`photo`, `server`, `hash`)
//! 3. `photos.saveWallPhoto` commits the ticket to the group's wall album
//! 4. `wall.post` publishes the message with the saved photo attached
//!
//! A failure at any step aborts the rest. Nothing is retried.

use crate::error::{Error, Result};
use crate::http::{describe_transport_error, endpoint};
use crate::types::{PublishRequest, SavedPhotoRef, Stage, UploadTicket, VkCredentials};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, info, warn};

/// Standard VK method response: either `response` or `error` is present
#[derive(Debug, Deserialize)]
struct VkEnvelope<T> {
    response: Option<T>,
    error: Option<VkApiError>,
}

#[derive(Debug, Deserialize)]
struct VkApiError {
    error_code: i64,
    error_msg: String,
}

#[derive(Debug, Deserialize)]
struct UploadServer {
    upload_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    photo: Option<String>,
    // Numeric in practice, but treated as an opaque token
    server: Option<serde_json::Value>,
    hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SavedPhoto {
    owner_id: Option<i64>,
    id: Option<i64>,
}

/// Runs the upload/save/post handshake against the VK API
pub struct WallPhotoPublisher {
    client: reqwest::Client,
    api_base: String,
    credentials: VkCredentials,
}

impl WallPhotoPublisher {
    /// Create a publisher for the given community
    pub fn new(client: reqwest::Client, api_base: &str, credentials: VkCredentials) -> Self {
        Self {
            client,
            api_base: api_base.to_string(),
            credentials,
        }
    }

    /// Credentials this publisher posts with
    pub fn credentials(&self) -> &VkCredentials {
        &self.credentials
    }

    /// Upload the image at `image_path` and post it with `message`
    ///
    /// Returns the saved photo that was attached to the post.
    pub async fn publish(&self, image_path: &Path, message: &str) -> Result<SavedPhotoRef> {
        info!(group_id = self.credentials.group_id, "Uploading photo to VK server");
        let upload_url = self.request_upload_target().await?;
        let ticket = self.upload_binary(&upload_url, image_path).await?;

        info!("Saving photo to the group");
        let photo = self.save_to_album(&ticket).await?;

        info!(attachment = %photo, "Posting photo on the wall");
        let request = PublishRequest {
            credentials: &self.credentials,
            message,
            attachment: photo,
        };
        if let Err(e) = self.post_to_wall(&request).await {
            warn!(
                attachment = %photo,
                "wall post failed after the photo was saved; the album photo is left without a post"
            );
            return Err(e);
        }

        Ok(photo)
    }

    /// Step 1: obtain a one-off upload URL
    pub async fn request_upload_target(&self) -> Result<String> {
        let stage = Stage::UploadTarget;
        let server: UploadServer = self
            .call_method(
                "photos.getWallUploadServer",
                self.credentials.base_params(),
                stage,
            )
            .await?;

        server
            .upload_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::MalformedResponse {
                stage,
                message: "missing field 'upload_url'".to_string(),
            })
    }

    /// Step 2: POST the image file as multipart field `photo`
    pub async fn upload_binary(&self, upload_url: &str, image_path: &Path) -> Result<UploadTicket> {
        let stage = Stage::UploadBinary;
        let upload_failed = |message: String| Error::UploadFailed { stage, message };

        let bytes = tokio::fs::read(image_path)
            .await
            .map_err(|e| upload_failed(format!("failed to read {}: {}", image_path.display(), e)))?;
        let file_name = image_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo.png".to_string());

        debug!(file = %file_name, bytes = bytes.len(), "uploading photo");
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("photo", part);

        let response = self
            .client
            .post(upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| upload_failed(describe_transport_error(&e, upload_url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(upload_failed(format!("HTTP {} from upload server", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| upload_failed(format!("failed to read upload response: {}", e)))?;
        let uploaded: UploadResponse = serde_json::from_slice(&body)
            .map_err(|e| upload_failed(format!("unparsable upload response: {}", e)))?;

        let missing = |field: &str| Error::MalformedResponse {
            stage,
            message: format!("upload response has no '{}' field", field),
        };
        let photo = uploaded.photo.ok_or_else(|| missing("photo"))?;
        let server = uploaded
            .server
            .and_then(|value| match value {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| missing("server"))?;
        let hash = uploaded.hash.ok_or_else(|| missing("hash"))?;

        // The upload server answers 200 with an empty photo list when no file arrived
        if photo.is_empty() || photo == "[]" {
            return Err(upload_failed(
                "upload server did not receive the photo".to_string(),
            ));
        }

        Ok(UploadTicket {
            server,
            hash,
            photo,
        })
    }

    /// Step 3: commit an uploaded photo to the group's wall album
    pub async fn save_to_album(&self, ticket: &UploadTicket) -> Result<SavedPhotoRef> {
        let stage = Stage::SaveToAlbum;
        let mut params = self.credentials.base_params();
        params.push(("photo", ticket.photo.clone()));
        params.push(("server", ticket.server.clone()));
        params.push(("hash", ticket.hash.clone()));

        let saved: Vec<SavedPhoto> = self
            .call_method("photos.saveWallPhoto", params, stage)
            .await?;

        let first = saved.into_iter().next().ok_or_else(|| Error::MalformedResponse {
            stage,
            message: "saveWallPhoto returned no photos".to_string(),
        })?;

        match (first.owner_id, first.id) {
            (Some(owner_id), Some(media_id)) => Ok(SavedPhotoRef { owner_id, media_id }),
            _ => Err(Error::MalformedResponse {
                stage,
                message: "saved photo lacks 'owner_id' or 'id'".to_string(),
            }),
        }
    }

    /// Step 4: create the wall post
    ///
    /// Success is decided by HTTP status alone; the response body is discarded.
    pub async fn post_to_wall(&self, request: &PublishRequest<'_>) -> Result<()> {
        let stage = Stage::PostToWall;
        let url = endpoint(&self.api_base, "wall.post");

        let response = self
            .client
            .get(&url)
            .query(&request.query())
            .send()
            .await
            .map_err(|e| Error::AuthOrApiError {
                stage,
                code: None,
                message: describe_transport_error(&e, &url),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::AuthOrApiError {
                stage,
                code: None,
                message: format!("HTTP {}", status),
            });
        }

        debug!(attachment = %request.attachment, "wall post created");
        Ok(())
    }

    /// Call a VK method and unwrap its `response` envelope
    async fn call_method<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<(&'static str, String)>,
        stage: Stage,
    ) -> Result<T> {
        let url = endpoint(&self.api_base, method);
        debug!(method, %stage, "calling VK API");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::AuthOrApiError {
                stage,
                code: None,
                message: describe_transport_error(&e, &url),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::AuthOrApiError {
                stage,
                code: None,
                message: format!("HTTP {} from {}", status, method),
            });
        }

        let body = response.bytes().await.map_err(|e| Error::AuthOrApiError {
            stage,
            code: None,
            message: format!("failed to read {} response: {}", method, e),
        })?;
        let envelope: VkEnvelope<T> =
            serde_json::from_slice(&body).map_err(|e| Error::MalformedResponse {
                stage,
                message: format!("unparsable {} response: {}", method, e),
            })?;

        if let Some(err) = envelope.error {
            return Err(Error::AuthOrApiError {
                stage,
                code: Some(err.error_code),
                message: err.error_msg,
            });
        }

        envelope.response.ok_or_else(|| Error::MalformedResponse {
            stage,
            message: format!("{} response has no 'response' field", method),
        })
    }
}
