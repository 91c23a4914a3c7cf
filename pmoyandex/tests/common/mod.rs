//! Helpers shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use pmoyandex::{
    Delivery, Downloader, Orchestrator, RetryPolicy, TrackMetadata, YandexClient, YandexError,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const AUDIO_BYTES: &[u8] = b"ID3\x04\x00fake-mp3-payload";

/// A delivered file, as seen by the transport during `deliver_audio`
#[derive(Debug, Clone)]
pub struct Delivered {
    pub path: PathBuf,
    pub track_title: String,
    pub contents: Vec<u8>,
}

/// Chat transport double recording every notification and delivery
#[derive(Debug, Default)]
pub struct RecordingDelivery {
    pub messages: Mutex<Vec<String>>,
    pub delivered: Mutex<Vec<Delivered>>,
    pub fail_delivery: bool,
}

impl RecordingDelivery {
    pub fn failing() -> Self {
        Self {
            fail_delivery: true,
            ..Default::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn delivered(&self) -> Vec<Delivered> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn notify(&self, text: &str) {
        self.messages.lock().unwrap().push(text.to_string());
    }

    async fn deliver_audio(&self, path: &Path, track: &TrackMetadata) -> pmoyandex::Result<()> {
        if self.fail_delivery {
            return Err(YandexError::Delivery("chat transport rejected the file".into()));
        }
        let contents = std::fs::read(path)?;
        self.delivered.lock().unwrap().push(Delivered {
            path: path.to_path_buf(),
            track_title: track.title.clone(),
            contents,
        });
        Ok(())
    }
}

pub fn api_base(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

pub fn fast_client(server: &MockServer) -> YandexClient {
    YandexClient::builder()
        .base_url(api_base(server))
        .retry_policy(RetryPolicy::new(3, Duration::from_millis(1)))
        .build()
        .unwrap()
}

pub fn orchestrator(server: &MockServer, downloads: &Path) -> Orchestrator {
    Orchestrator::new(fast_client(server), Downloader::new(downloads).unwrap())
}

/// Number of entries left in the downloads directory (0 if it was never created)
pub fn files_left(downloads: &Path) -> usize {
    std::fs::read_dir(downloads).map(|d| d.count()).unwrap_or(0)
}

pub async fn mount_track(server: &MockServer, id: &str, title: &str, artist: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v2.1/handlers/track/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "track": {
                "id": id,
                "title": title,
                "artists": [{"name": artist}]
            }
        })))
        .mount(server)
        .await;
}

/// Mounts both download-location steps and the audio file for one track
pub async fn mount_download(server: &MockServer, id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v2.1/handlers/track/{}/download-info/m", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "downloadInfo": {"codec": "mp3", "bitrateInKbps": 320}
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/api/v2.1/handlers/track/{}/download-info", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "downloadInfoUrl": format!("{}/files/{}.mp3", server.uri(), id)
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/files/{}.mp3", id)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(AUDIO_BYTES.to_vec()))
        .mount(server)
        .await;
}

/// Serves every track id with the same metadata and audio file
pub async fn mount_any_track(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v2\.1/handlers/track/\d+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "track": {"title": "Generic", "artists": [{"name": "Band"}]}
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v2\.1/handlers/track/\d+/download-info/m$"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"downloadInfo": {"codec": "mp3"}})),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v2\.1/handlers/track/\d+/download-info$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "downloadInfoUrl": format!("{}/files/generic.mp3", server.uri())
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/generic.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(AUDIO_BYTES.to_vec()))
        .mount(server)
        .await;
}

pub fn track_refs(ids: impl IntoIterator<Item = u32>) -> Vec<serde_json::Value> {
    ids.into_iter()
        .map(|i| json!({"id": i, "title": format!("Track {}", i)}))
        .collect()
}

/// Requests received by the mock server whose path matches `predicate`
pub async fn count_requests(server: &MockServer, predicate: impl Fn(&str) -> bool) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| predicate(r.url.path()))
        .count()
}
