use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{CloudinaryConfig, CloudinaryCredentials, SignatureAlgorithm};

/// Incoming transformation: automatic quality, re-encoded to mp4.
pub const VIDEO_TRANSFORMATION: &str = "q_auto,f_mp4";

#[derive(Debug, Error)]
pub enum CloudinaryError {
    #[error("request to media host failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("media host answered {status}: {message}")]
    Api { status: u16, message: String },

    #[error("media host refused to destroy asset: {0}")]
    Rejected(String),
}

/// What the upload call returns. Every other field of the response is dropped.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UploadedAsset {
    pub public_id: String,
    pub bytes: u64,
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DestroyOutcome {
    Deleted,
    /// The host had no such asset; the end state is the same.
    NotFound,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: ApiErrorMessage,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorMessage {
    #[serde(default)]
    message: String,
}

/// Remote store for video assets.
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload_video(&self, file_name: &str, data: Bytes) -> Result<UploadedAsset, CloudinaryError>;

    async fn destroy_video(&self, public_id: &str) -> Result<DestroyOutcome, CloudinaryError>;
}

pub struct CloudinaryClient {
    http: reqwest::Client,
    credentials: CloudinaryCredentials,
    api_base: String,
    folder: String,
    algorithm: SignatureAlgorithm,
}

impl CloudinaryClient {
    pub fn new(
        config: &CloudinaryConfig,
        credentials: CloudinaryCredentials,
        timeout: Duration,
    ) -> Result<Self, CloudinaryError> {
        let mut builder = reqwest::Client::builder();
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            credentials,
            api_base: config.api_base.clone(),
            folder: config.folder.clone(),
            algorithm: config.signature_algorithm,
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1_1/{}/video/{}",
            self.api_base, self.credentials.cloud_name, action
        )
    }

    /// Signed parameters plus `api_key` and `signature`.
    fn signed_params(&self, mut params: BTreeMap<&'static str, String>) -> BTreeMap<&'static str, String> {
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
        let signature = sign_params(&params, &self.credentials.api_secret, self.algorithm);
        params.insert("api_key", self.credentials.api_key.clone());
        params.insert("signature", signature);
        params
    }

    fn upload_params(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("folder", self.folder.clone()),
            ("transformation", VIDEO_TRANSFORMATION.to_string()),
        ])
    }
}

#[async_trait]
impl MediaHost for CloudinaryClient {
    async fn upload_video(&self, file_name: &str, data: Bytes) -> Result<UploadedAsset, CloudinaryError> {
        let size = data.len();
        let mut form = Form::new().part(
            "file",
            Part::bytes(Vec::from(data)).file_name(file_name.to_string()),
        );
        for (key, value) in self.signed_params(self.upload_params()) {
            form = form.text(key, value);
        }

        info!("[cloudinary] ⬆️  Uploading {} ({} bytes)", file_name, size);

        let response = self.http.post(self.endpoint("upload")).multipart(form).send().await?;
        let response = check_status(response).await?;
        let asset: UploadedAsset = response.json().await?;

        info!(
            "[cloudinary] ✅ Uploaded {} ({} bytes, {:.2}s)",
            asset.public_id,
            asset.bytes,
            asset.duration.unwrap_or(0.0)
        );

        Ok(asset)
    }

    async fn destroy_video(&self, public_id: &str) -> Result<DestroyOutcome, CloudinaryError> {
        let params = self.signed_params(BTreeMap::from([("public_id", public_id.to_string())]));

        let response = self.http.post(self.endpoint("destroy")).form(&params).send().await?;
        let response = check_status(response).await?;
        let body: DestroyResponse = response.json().await?;

        match body.result.as_str() {
            "ok" => Ok(DestroyOutcome::Deleted),
            "not found" => {
                warn!("[cloudinary] Asset {} was already gone", public_id);
                Ok(DestroyOutcome::NotFound)
            }
            other => Err(CloudinaryError::Rejected(other.to_string())),
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CloudinaryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: ApiErrorBody = response.json().await.unwrap_or_default();
    Err(CloudinaryError::Api {
        status: status.as_u16(),
        message: body.error.message,
    })
}

/// Request signature: non-empty params sorted by name, `k=v` joined by `&`,
/// secret appended, hex digest.
pub fn sign_params(
    params: &BTreeMap<&str, String>,
    api_secret: &str,
    algorithm: SignatureAlgorithm,
) -> String {
    let to_sign = params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");
    let payload = format!("{}{}", to_sign, api_secret);

    match algorithm {
        SignatureAlgorithm::Sha1 => hex::encode(Sha1::digest(payload.as_bytes())),
        SignatureAlgorithm::Sha256 => hex::encode(Sha256::digest(payload.as_bytes())),
    }
}
