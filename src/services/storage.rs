// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Object storage for uploaded media (Cloud Storage JSON API).
//!
//! Objects are written with a simple media upload and served from the
//! bucket's public URL. On Cloud Run the access token comes from the
//! metadata server and is cached until shortly before it expires; against
//! a storage emulator no token is sent.

use crate::error::AppError;
use axum::body::Bytes;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const GCS_BASE_URL: &str = "https://storage.googleapis.com";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
/// Refresh the cached token this long before it expires.
const TOKEN_EXPIRY_SLACK: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Uploads media and hands back public URLs.
#[derive(Clone)]
pub struct StorageService {
    base_url: String,
    /// None in mock mode: nothing is uploaded.
    http: Option<reqwest::Client>,
    authenticated: bool,
    token: Arc<Mutex<Option<CachedToken>>>,
}

impl StorageService {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let authenticated = base_url == GCS_BASE_URL;
        if !authenticated {
            tracing::info!(base_url = %base_url, "Using unauthenticated storage endpoint");
        }

        Self {
            base_url,
            http: Some(reqwest::Client::new()),
            authenticated,
            token: Arc::new(Mutex::new(None)),
        }
    }

    /// Storage that skips uploads and only computes URLs (tests, offline).
    pub fn new_mock() -> Self {
        Self {
            base_url: GCS_BASE_URL.to_string(),
            http: None,
            authenticated: false,
            token: Arc::new(Mutex::new(None)),
        }
    }

    /// Public URL for an object. Against an emulator this is the emulator's
    /// own object path, so locally stored media stays reachable.
    pub fn public_url(&self, bucket: &str, object: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            bucket,
            urlencoding::encode(object).replace("%2F", "/")
        )
    }

    /// Upload `bytes` under `{prefix}/{millis}_{file_name}` and return the public URL.
    pub async fn upload(
        &self,
        bucket: &str,
        prefix: &str,
        file_name: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<String, AppError> {
        let object = object_name(prefix, file_name);
        let size = bytes.len();

        let Some(http) = &self.http else {
            tracing::debug!(bucket, object = %object, "Mock storage, skipping upload");
            return Ok(self.public_url(bucket, &object));
        };

        let url = format!("{}/upload/storage/v1/b/{}/o", self.base_url, bucket);
        let mut request = http
            .post(&url)
            .query(&[("uploadType", "media"), ("name", object.as_str())])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);

        if self.authenticated {
            request = request.bearer_auth(self.access_token(http).await?);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!(
                "Upload to {} failed: HTTP {}: {}",
                bucket, status, body
            )));
        }

        tracing::info!(bucket, object = %object, size, "Uploaded object");
        Ok(self.public_url(bucket, &object))
    }

    async fn access_token(&self, http: &reqwest::Client) -> Result<String, AppError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_EXPIRY_SLACK {
                return Ok(token.token.clone());
            }
        }

        let response = http
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Metadata token request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Storage(format!(
                "Metadata token request returned HTTP {}",
                response.status()
            )));
        }

        let fresh: MetadataToken = response
            .json()
            .await
            .map_err(|e| AppError::Storage(format!("Metadata token parse error: {}", e)))?;

        tracing::debug!(expires_in = fresh.expires_in, "Fetched storage access token");

        *cached = Some(CachedToken {
            token: fresh.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(fresh.expires_in),
        });
        Ok(fresh.access_token)
    }
}

/// Object name for an upload: `{prefix}/{unix_millis}_{sanitised name}`.
pub fn object_name(prefix: &str, file_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    format!("{}/{}_{}", prefix, millis, sanitize_file_name(file_name))
}

/// Keep ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`.
fn sanitize_file_name(name: &str) -> String {
    // Drop any client-side directory components
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches(['.', '_']).is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("voice note.aac"), "voice_note.aac");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\photos\\fort.jpg"), "fort.jpg");
        assert_eq!(sanitize_file_name(".."), "upload");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[test]
    fn test_object_name_layout() {
        let name = object_name("audio", "clip.aac");
        let (prefix, rest) = name.split_once('/').unwrap();
        assert_eq!(prefix, "audio");
        let (millis, file) = rest.split_once('_').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(file, "clip.aac");
    }

    #[test]
    fn test_public_url_keeps_path_separators() {
        let storage = StorageService::new_mock();
        assert_eq!(
            storage.public_url("spotimages", "images/1_fort.jpg"),
            "https://storage.googleapis.com/spotimages/images/1_fort.jpg"
        );
    }

    #[test]
    fn test_public_url_against_emulator() {
        let storage = StorageService::new("http://localhost:4443/");
        assert_eq!(
            storage.public_url("spotimages", "images/1_fort.jpg"),
            "http://localhost:4443/spotimages/images/1_fort.jpg"
        );
        let gcs = StorageService::new("https://storage.googleapis.com");
        assert_eq!(
            gcs.public_url("spotimages", "images/1_fort.jpg"),
            "https://storage.googleapis.com/spotimages/images/1_fort.jpg"
        );
    }

    #[tokio::test]
    async fn test_mock_upload_returns_public_url() {
        let storage = StorageService::new_mock();
        let url = storage
            .upload(
                "audiofiles",
                "audio",
                "clip.aac",
                "audio/aac",
                Bytes::from_static(b"data"),
            )
            .await
            .unwrap();

        assert!(url.starts_with("https://storage.googleapis.com/audiofiles/audio/"));
        assert!(url.ends_with("_clip.aac"));
    }
}
