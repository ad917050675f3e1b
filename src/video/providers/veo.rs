//! Veo (Google) video generation over the Gemini Developer API.

use crate::config::BASE_URL_ENV;
use crate::error::{sanitize_error_message, Result, VideoExpressError};
use crate::video::provider::{BackendConnector, VideoBackend};
use crate::video::types::{JobHandle, JobRequest, JobStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default Gemini Developer API root.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Veo model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VeoModel {
    /// Veo 3.1 Fast Preview - lower latency.
    #[default]
    Veo31Fast,
    /// Veo 3.1 Preview - higher quality.
    Veo31,
}

impl VeoModel {
    /// Returns the Gemini Developer API model identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Veo31Fast => "veo-3.1-fast-generate-preview",
            Self::Veo31 => "veo-3.1-generate-preview",
        }
    }
}

impl std::fmt::Display for VeoModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VeoModel {
    type Err = VideoExpressError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "fast" | "veo-3.1-fast-generate-preview" => Ok(Self::Veo31Fast),
            "quality" | "veo-3.1-generate-preview" => Ok(Self::Veo31),
            other => Err(VideoExpressError::InvalidRequest(format!(
                "unknown Veo model '{}', expected fast or quality",
                other
            ))),
        }
    }
}

/// Builder for [`VeoConnector`].
#[derive(Debug, Clone, Default)]
pub struct VeoConnectorBuilder {
    model: VeoModel,
    base_url: Option<String>,
    client: Option<reqwest::Client>,
}

impl VeoConnectorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Veo model variant.
    pub fn model(mut self, model: VeoModel) -> Self {
        self.model = model;
        self
    }

    /// Sets the API root. Falls back to `VEO_BASE_URL`, then the public endpoint.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Uses an existing HTTP client (shares its connection pool).
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the connector.
    pub fn build(self) -> Result<VeoConnector> {
        let base_url = self
            .base_url
            .or_else(|| std::env::var(BASE_URL_ENV).ok())
            .unwrap_or_else(|| GEMINI_API_BASE_URL.to_string());
        let base_url = base_url.trim_end_matches('/').to_string();

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(VideoExpressError::InvalidRequest(format!(
                "Veo base URL must be http(s): {}",
                base_url
            )));
        }

        Ok(VeoConnector {
            client: self.client.unwrap_or_default(),
            model: self.model,
            base_url,
        })
    }
}

/// Connects [`VeoSession`]s for a given API key.
#[derive(Debug, Clone)]
pub struct VeoConnector {
    client: reqwest::Client,
    model: VeoModel,
    base_url: String,
}

impl VeoConnector {
    /// Creates a new `VeoConnectorBuilder`.
    pub fn builder() -> VeoConnectorBuilder {
        VeoConnectorBuilder::new()
    }

    /// Returns the configured model.
    pub fn model(&self) -> VeoModel {
        self.model
    }

    /// Returns the API root.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl BackendConnector for VeoConnector {
    fn connect(&self, credential: &str) -> Result<Box<dyn VideoBackend>> {
        if credential.trim().is_empty() {
            return Err(VideoExpressError::CredentialInvalid(
                "API key is empty".into(),
            ));
        }
        Ok(Box::new(VeoSession {
            client: self.client.clone(),
            api_key: credential.to_string(),
            model: self.model,
            base_url: self.base_url.clone(),
        }))
    }

    fn name(&self) -> &str {
        "Veo (Google)"
    }
}

/// A Veo backend bound to one API key.
pub struct VeoSession {
    client: reqwest::Client,
    api_key: String,
    model: VeoModel,
    base_url: String,
}

impl VeoSession {
    async fn read_operation(&self, response: reqwest::Response) -> Result<JobStatus> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text));
        }

        let operation: VeoOperationResponse = response.json().await?;
        operation.into_status()
    }
}

#[async_trait]
impl VideoBackend for VeoSession {
    async fn create_job(&self, request: &JobRequest) -> Result<JobStatus> {
        let url = format!(
            "{}/models/{}:predictLongRunning",
            self.base_url,
            self.model.as_str()
        );
        let body = VeoRequest::from_request(request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        self.read_operation(response).await
    }

    async fn poll_job(&self, handle: &JobHandle) -> Result<JobStatus> {
        let url = format!("{}/{}", self.base_url, handle.as_str());

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        self.read_operation(response).await
    }

    async fn fetch_asset(&self, asset_ref: &str) -> Result<Vec<u8>> {
        if asset_ref.starts_with("gs://") {
            return Err(VideoExpressError::GenerationFailed(format!(
                "Veo returned a Google Cloud Storage URI ({}) which cannot be downloaded directly",
                asset_ref
            )));
        }

        // The file endpoint authenticates via the `key` query parameter
        let url = with_key(asset_ref, &self.api_key)?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let reason = status.canonical_reason().unwrap_or("Unknown Status");
            let status_text = match extract_error_message(&text) {
                Some(message) => format!("{}: {}", reason, message),
                None => reason.to_string(),
            };
            return Err(VideoExpressError::Transport {
                status: status.as_u16(),
                status_text,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    fn model(&self) -> &str {
        self.model.as_str()
    }
}

/// Appends the API key as a percent-encoded `key` query parameter.
fn with_key(url: &str, api_key: &str) -> Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(url).map_err(|e| {
        VideoExpressError::GenerationFailed(format!("invalid video URI '{}': {}", url, e))
    })?;
    url.query_pairs_mut().append_pair("key", api_key);
    Ok(url)
}

/// Pulls `error.message` out of a Google API error body.
fn extract_error_message(text: &str) -> Option<String> {
    serde_json::from_str::<VeoErrorBody>(text)
        .ok()
        .and_then(|body| body.error.message)
        .map(|m| sanitize_error_message(&m))
        .filter(|m| !m.is_empty())
}

/// Maps a non-success API response to an error, keeping the provider's
/// message verbatim so credential markers survive classification.
fn parse_error(status: u16, text: &str) -> VideoExpressError {
    let message = extract_error_message(text).unwrap_or_else(|| {
        let sanitized = sanitize_error_message(text);
        if sanitized.is_empty() {
            format!("request failed with status {}", status)
        } else {
            sanitized
        }
    });
    VideoExpressError::Api { status, message }
}

// ── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoRequest {
    instances: Vec<VeoInstance>,
    parameters: VeoParameters,
}

#[derive(Debug, Serialize)]
struct VeoInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoParameters {
    aspect_ratio: String,
    resolution: String,
    number_of_videos: u32,
}

impl VeoRequest {
    fn from_request(req: &JobRequest) -> Self {
        Self {
            instances: vec![VeoInstance {
                prompt: req.prompt.clone(),
            }],
            parameters: VeoParameters {
                aspect_ratio: req.config.aspect_ratio.as_str().to_string(),
                resolution: req.config.resolution.as_str().to_string(),
                number_of_videos: 1,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct VeoOperationResponse {
    name: String,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default)]
    response: Option<VeoVideoResponse>,
    #[serde(default)]
    error: Option<VeoError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoVideoResponse {
    #[serde(default)]
    generate_video_response: Option<VeoGenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoGenerateVideoResponse {
    #[serde(default)]
    generated_samples: Option<Vec<VeoGeneratedSample>>,
    #[serde(default)]
    rai_media_filtered_count: Option<u32>,
    #[serde(default)]
    rai_media_filtered_reasons: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct VeoGeneratedSample {
    #[serde(default)]
    video: Option<VeoVideo>,
}

#[derive(Debug, Deserialize)]
struct VeoVideo {
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VeoError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VeoErrorBody {
    error: VeoError,
}

impl VeoOperationResponse {
    fn into_status(self) -> Result<JobStatus> {
        // An error is terminal even when `done` is absent
        if let Some(err) = self.error {
            return Err(VideoExpressError::GenerationFailed(
                err.message.unwrap_or_else(|| "Unknown error".into()),
            ));
        }

        let handle = JobHandle::new(self.name);
        if !self.done.unwrap_or(false) {
            return Ok(JobStatus::pending(handle));
        }

        let gen_resp = self.response.and_then(|r| r.generate_video_response);
        let Some(gen_resp) = gen_resp else {
            return Ok(JobStatus::finished(handle, None));
        };

        let samples = gen_resp.generated_samples.unwrap_or_default();
        if samples.is_empty() && gen_resp.rai_media_filtered_count.unwrap_or(0) > 0 {
            let reasons = gen_resp.rai_media_filtered_reasons.unwrap_or_default();
            let detail = if reasons.is_empty() {
                "filtered by Veo safety filters".to_string()
            } else {
                format!("filtered by Veo safety filters: {}", reasons.join("; "))
            };
            return Err(VideoExpressError::EmptyResult(Some(detail)));
        }

        let asset_ref = samples
            .into_iter()
            .next()
            .and_then(|s| s.video)
            .and_then(|v| v.uri);
        Ok(JobStatus::finished(handle, asset_ref))
    }
}
