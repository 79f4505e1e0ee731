//! Cloudinary upload client.
//!
//! Uploaded bytes are spooled to a scratch file, pushed to Cloudinary with a
//! signed upload request, and the scratch file is removed afterwards whether
//! the upload worked or not.
//!
//! # API Reference
//!
//! - Endpoint: `https://api.cloudinary.com/v1_1/<cloud_name>/image/upload`
//! - Authentication: `api_key` plus a `signature` digest (SHA-1 by default,
//!   SHA-256 when the account requires it) over the sorted signed parameters
//!   followed by the API secret

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::config::{MediaConfig, SignatureAlgorithm};

/// Cloudinary API base URL.
const BASE_URL: &str = "https://api.cloudinary.com/v1_1";

/// Errors that can occur when uploading media.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Reading or writing the scratch file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Cloudinary rejected the upload.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Cloudinary upload client.
#[derive(Clone)]
pub struct MediaClient {
    inner: Arc<MediaClientInner>,
}

struct MediaClientInner {
    client: reqwest::Client,
    upload_url: String,
    api_key: String,
    api_secret: SecretString,
    folder: String,
    upload_dir: PathBuf,
    signature_algorithm: SignatureAlgorithm,
}

impl std::fmt::Debug for MediaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaClient")
            .field("upload_url", &self.inner.upload_url)
            .field("folder", &self.inner.folder)
            .field("upload_dir", &self.inner.upload_dir)
            .field("signature_algorithm", &self.inner.signature_algorithm)
            .finish_non_exhaustive()
    }
}

impl MediaClient {
    /// Create a client for the configured Cloudinary account.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &MediaConfig) -> Result<Self, MediaError> {
        let upload_url = format!("{BASE_URL}/{}/image/upload", config.cloud_name);
        Self::with_upload_url(config, upload_url)
    }

    /// Create a client that posts to an explicit upload URL.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn with_upload_url(config: &MediaConfig, upload_url: String) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            inner: Arc::new(MediaClientInner {
                client,
                upload_url,
                api_key: config.api_key.clone(),
                api_secret: config.api_secret.clone(),
                folder: config.folder.clone(),
                upload_dir: config.upload_dir.clone(),
                signature_algorithm: config.signature_algorithm,
            }),
        })
    }

    /// Upload an image and return its durable HTTPS URL.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Io` if the scratch file cannot be written.
    /// Returns `MediaError::Http` or `MediaError::Api` if the upload fails.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(&self, bytes: &[u8], file_name: Option<&str>) -> Result<String, MediaError> {
        tokio::fs::create_dir_all(&self.inner.upload_dir).await?;
        let path = self.inner.upload_dir.join(Uuid::new_v4().to_string());
        tokio::fs::write(&path, bytes).await?;

        let result = self.send(&path, file_name).await;

        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(error = %e, path = %path.display(), "Failed to remove upload scratch file");
        }

        match &result {
            Ok(url) => tracing::info!(url = %url, "Uploaded image"),
            Err(e) => tracing::warn!(error = %e, "Image upload failed"),
        }
        result
    }

    async fn send(&self, path: &Path, file_name: Option<&str>) -> Result<String, MediaError> {
        let data = tokio::fs::read(path).await?;
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[
                ("folder", self.inner.folder.as_str()),
                ("timestamp", timestamp.as_str()),
            ],
            &self.inner.api_secret,
            self.inner.signature_algorithm,
        );

        let file = Part::bytes(data).file_name(file_name.unwrap_or("upload").to_string());
        let mut form = Form::new()
            .part("file", file)
            .text("api_key", self.inner.api_key.clone())
            .text("folder", self.inner.folder.clone())
            .text("timestamp", timestamp)
            .text("signature", signature);
        if self.inner.signature_algorithm == SignatureAlgorithm::Sha256 {
            form = form.text("signature_algorithm", SignatureAlgorithm::Sha256.as_str());
        }

        let response = self
            .inner
            .client
            .post(&self.inner.upload_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MediaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response.json().await?;
        Ok(body.secure_url)
    }
}

/// Sign upload parameters: sort by name, join as `k=v&k=v`, append the
/// secret, and hex-encode the digest.
fn sign(params: &[(&str, &str)], secret: &SecretString, algorithm: SignatureAlgorithm) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_unstable_by_key(|(key, _)| *key);

    let joined = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let payload = format!("{joined}{}", secret.expose_secret());
    match algorithm {
        SignatureAlgorithm::Sha1 => hex::encode(Sha1::digest(payload.as_bytes())),
        SignatureAlgorithm::Sha256 => hex::encode(Sha256::digest(payload.as_bytes())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::Multipart;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};

    use super::*;

    const SECRET: &str = "abcd";

    fn config(upload_dir: PathBuf, signature_algorithm: SignatureAlgorithm) -> MediaConfig {
        MediaConfig {
            cloud_name: "demo".to_string(),
            api_key: "1234".to_string(),
            api_secret: SecretString::from(SECRET),
            folder: "property_uploads".to_string(),
            upload_dir,
            signature_algorithm,
        }
    }

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("homestead-media-{}", Uuid::new_v4()))
    }

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1_1/demo/image/upload")
    }

    /// Checks the signature the way Cloudinary does: SHA-1 unless the
    /// request names another algorithm.
    async fn accept_upload(
        mut multipart: Multipart,
    ) -> Result<Json<serde_json::Value>, StatusCode> {
        let mut fields = HashMap::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let value = field.bytes().await.unwrap();
            fields.insert(name, value);
        }

        let text = |key: &str| String::from_utf8(fields[key].to_vec()).unwrap();
        let algorithm = fields
            .get("signature_algorithm")
            .map_or(SignatureAlgorithm::Sha1, |raw| {
                String::from_utf8(raw.to_vec()).unwrap().parse().unwrap()
            });
        let (timestamp, folder) = (text("timestamp"), text("folder"));
        let expected = sign(
            &[("timestamp", timestamp.as_str()), ("folder", folder.as_str())],
            &SecretString::from(SECRET),
            algorithm,
        );
        if text("signature") != expected || text("api_key") != "1234" {
            return Err(StatusCode::UNAUTHORIZED);
        }
        if fields["file"].to_vec() != b"image-bytes".to_vec() {
            return Err(StatusCode::BAD_REQUEST);
        }

        Ok(Json(serde_json::json!({
            "secure_url": "https://res.cloudinary.com/demo/image/upload/property_uploads/a.jpg"
        })))
    }

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[test]
    fn test_sha1_signature_matches_published_example() {
        let signature = sign(
            &[("timestamp", "1315060510"), ("public_id", "sample_image")],
            &SecretString::from(SECRET),
            SignatureAlgorithm::Sha1,
        );
        assert_eq!(signature, "b4ad47fb4e25c7bf5f92a20089f9db59bc302313");
    }

    #[test]
    fn test_sha256_signature_sorts_params_and_appends_secret() {
        let expected =
            hex::encode(Sha256::digest(b"folder=property_uploads&timestamp=1315060510abcd"));

        let signature = sign(
            &[("timestamp", "1315060510"), ("folder", "property_uploads")],
            &SecretString::from(SECRET),
            SignatureAlgorithm::Sha256,
        );
        assert_eq!(signature, expected);
        assert_eq!(signature.len(), 64);
    }

    #[tokio::test]
    async fn test_upload_returns_secure_url_and_cleans_up() {
        let url = spawn_stub(Router::new().route("/v1_1/demo/image/upload", post(accept_upload))).await;
        let dir = scratch_dir();
        let client =
            MediaClient::with_upload_url(&config(dir.clone(), SignatureAlgorithm::Sha1), url)
                .unwrap();

        let secure_url = client.upload(b"image-bytes", Some("a.jpg")).await.unwrap();

        assert_eq!(
            secure_url,
            "https://res.cloudinary.com/demo/image/upload/property_uploads/a.jpg"
        );
        assert!(dir_is_empty(&dir));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_sha256_upload_names_its_algorithm() {
        let url = spawn_stub(Router::new().route("/v1_1/demo/image/upload", post(accept_upload))).await;
        let dir = scratch_dir();
        let client =
            MediaClient::with_upload_url(&config(dir.clone(), SignatureAlgorithm::Sha256), url)
                .unwrap();

        assert!(client.upload(b"image-bytes", Some("a.jpg")).await.is_ok());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_failed_upload_still_cleans_up() {
        let url = spawn_stub(Router::new().route(
            "/v1_1/demo/image/upload",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        ))
        .await;
        let dir = scratch_dir();
        let client =
            MediaClient::with_upload_url(&config(dir.clone(), SignatureAlgorithm::Sha1), url)
                .unwrap();

        let err = client.upload(b"image-bytes", None).await.unwrap_err();

        assert!(matches!(err, MediaError::Api { status: 500, .. }));
        assert!(dir_is_empty(&dir));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_default_upload_url_uses_cloud_name() {
        let client =
            MediaClient::new(&config(scratch_dir(), SignatureAlgorithm::default())).unwrap();
        assert_eq!(
            client.inner.upload_url,
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }
}
