//! Core types for video generation.

use crate::error::{Result, VideoExpressError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Output aspect ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 16:9 landscape.
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16 portrait.
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    /// Returns the wire string for this ratio.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = VideoExpressError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "16:9" => Ok(Self::Landscape),
            "9:16" => Ok(Self::Portrait),
            other => Err(VideoExpressError::InvalidRequest(format!(
                "unsupported aspect ratio '{}', expected 16:9 or 9:16",
                other
            ))),
        }
    }
}

/// Output resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    /// 1280x720.
    #[default]
    #[serde(rename = "720p")]
    Hd,
    /// 1920x1080.
    #[serde(rename = "1080p")]
    FullHd,
}

impl Resolution {
    /// Returns the wire string for this resolution.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hd => "720p",
            Self::FullHd => "1080p",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = VideoExpressError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "720p" => Ok(Self::Hd),
            "1080p" => Ok(Self::FullHd),
            other => Err(VideoExpressError::InvalidRequest(format!(
                "unsupported resolution '{}', expected 720p or 1080p",
                other
            ))),
        }
    }
}

/// Rendering options chosen before submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConfig {
    /// Aspect ratio of the output.
    pub aspect_ratio: AspectRatio,
    /// Resolution of the output.
    pub resolution: Resolution,
}

impl VideoConfig {
    /// Creates a config from its two fields.
    pub fn new(aspect_ratio: AspectRatio, resolution: Resolution) -> Self {
        Self {
            aspect_ratio,
            resolution,
        }
    }

    /// Returns a copy with the aspect ratio replaced.
    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// Returns a copy with the resolution replaced.
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }
}

/// A job creation request as sent to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    /// The text prompt describing the desired video.
    pub prompt: String,
    /// Rendering options.
    pub config: VideoConfig,
}

impl JobRequest {
    /// Creates a request, rejecting prompts that are empty after trimming.
    pub fn new(prompt: impl Into<String>, config: VideoConfig) -> Result<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(VideoExpressError::InvalidRequest(
                "prompt must not be empty".into(),
            ));
        }
        Ok(Self { prompt, config })
    }
}

/// Opaque provider-issued reference to a remote job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    /// Wraps a provider operation name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the provider operation name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of a remote job returned by create and poll calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    /// The job's handle (may be refreshed by the provider).
    pub handle: JobHandle,
    /// Whether the job reached a terminal state.
    pub done: bool,
    /// Reference to the finished asset, present only on successful completion.
    pub asset_ref: Option<String>,
}

impl JobStatus {
    /// A job that is still running.
    pub fn pending(handle: JobHandle) -> Self {
        Self {
            handle,
            done: false,
            asset_ref: None,
        }
    }

    /// A finished job, optionally carrying an asset reference.
    pub fn finished(handle: JobHandle, asset_ref: Option<String>) -> Self {
        Self {
            handle,
            done: true,
            asset_ref,
        }
    }
}

/// Metadata about the video generation process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Wall-clock time from submission to fetched asset, in milliseconds.
    pub duration_ms: Option<u64>,
    /// Number of status queries issued after submission.
    pub polls: u32,
}

/// Fetched video bytes held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoAsset {
    /// Raw video bytes.
    pub data: Vec<u8>,
    /// MIME type (e.g., "video/mp4").
    pub mime_type: String,
    /// Generation metadata.
    pub metadata: VideoMetadata,
}

/// Shared, locally-dereferenceable handle to a fetched asset.
///
/// The buffer is freed when the last handle is dropped.
pub type AssetHandle = Arc<VideoAsset>;

impl VideoAsset {
    /// Creates a new asset.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>, metadata: VideoMetadata) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
            metadata,
        }
    }

    /// Returns the size of the video data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Saves the video to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }

    /// Encodes the video data as base64.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Returns the video as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}
