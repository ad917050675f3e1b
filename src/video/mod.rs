//! Video generation module.

mod client;
mod provider;
pub mod providers;
mod types;

pub use client::{VideoGenerationClient, VideoGenerationClientBuilder, DEFAULT_POLL_INTERVAL};
pub use provider::{BackendConnector, VideoBackend};
pub use types::{
    AspectRatio, AssetHandle, JobHandle, JobRequest, JobStatus, Resolution, VideoAsset,
    VideoConfig, VideoMetadata,
};
