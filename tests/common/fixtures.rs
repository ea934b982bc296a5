//! Mock webcomic and VK servers

use comic_wall::Config;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Bytes served as the comic image
pub const IMAGE_BYTES: [u8; 4] = [0x01, 0x02, 0x03, 0x04];

/// Caption of the mocked comic
pub const CAPTION: &str = "caption text";

/// Mock servers standing in for both remote APIs, plus a scratch directory
pub struct TestEnv {
    /// Webcomic API and image host
    pub comic: MockServer,
    /// VK method API and upload server
    pub vk: MockServer,
    /// Keeps the scratch directory alive for the duration of the test
    pub temp_dir: TempDir,
}

impl TestEnv {
    pub async fn start() -> Self {
        Self {
            comic: MockServer::start().await,
            vk: MockServer::start().await,
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// Scratch directory the pipeline downloads into
    pub fn scratch_dir(&self) -> PathBuf {
        self.temp_dir.path().join("images")
    }

    /// Configuration pointing every endpoint at the mock servers
    pub fn config(&self) -> Config {
        let mut config = Config::new(100, "test-token");
        config.comic.base_url = self.comic.uri();
        config.vk.api_base = format!("{}/method", self.vk.uri());
        config.scratch_dir = self.scratch_dir();
        config
    }

    /// URL the image is served from
    pub fn image_url(&self) -> String {
        format!("{}/x/img.png", self.comic.uri())
    }

    /// Upload URL handed out by `photos.getWallUploadServer`
    pub fn upload_url(&self) -> String {
        format!("{}/up", self.vk.uri())
    }

    /// Mount the webcomic API: `num` as the latest issue and `id` as a full issue
    pub async fn mount_comic(&self, num: u32, id: u32) {
        Mock::given(method("GET"))
            .and(path("/info.0.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"num": num})),
            )
            .mount(&self.comic)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/{}/info.0.json", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "num": id,
                "img": self.image_url(),
                "alt": CAPTION,
                "title": "Test Comic"
            })))
            .mount(&self.comic)
            .await;
        Mock::given(method("GET"))
            .and(path("/x/img.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(IMAGE_BYTES.to_vec()))
            .mount(&self.comic)
            .await;
    }

    /// Successful `photos.getWallUploadServer` response
    pub fn upload_target_ok(&self) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": {"upload_url": self.upload_url(), "album_id": -14, "user_id": 0}
        }))
    }

    /// Number of entries left in the scratch directory (0 if it was never created)
    pub fn scratch_file_count(&self) -> usize {
        count_entries(&self.scratch_dir())
    }
}

/// Successful upload server response
pub fn upload_ok() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_json(serde_json::json!({"photo": "p", "server": "s", "hash": "h"}))
}

/// Successful `photos.saveWallPhoto` response
pub fn save_ok() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_json(serde_json::json!({"response": [{"owner_id": -100, "id": 55}]}))
}

/// Successful `wall.post` response
pub fn post_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": {"post_id": 9}}))
}

fn count_entries(dir: &Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}
