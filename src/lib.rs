#![warn(missing_docs)]
//! Video Express - prompt-to-video generation sessions.
//!
//! Submits a prompt to a remote video-generation service (Google Veo),
//! polls the job until it finishes, fetches the video, and keeps the
//! results in an in-memory session history behind a small state machine
//! that a presentation layer can render.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use video_express::{
//!     CredentialGate, CredentialProvider, EnvCredentialProvider, Orchestrator, VeoConnector,
//!     VideoConfig, VideoGenerationClient,
//! };
//!
//! #[tokio::main]
//! async fn main() -> video_express::Result<()> {
//!     let credentials: Arc<dyn CredentialProvider> = Arc::new(EnvCredentialProvider::new());
//!     let client =
//!         VideoGenerationClient::builder(credentials.clone(), Arc::new(VeoConnector::builder().build()?))
//!             .build();
//!     let mut session = Orchestrator::new(client, CredentialGate::new(credentials));
//!     session.start().await;
//!
//!     let state = session
//!         .submit("A cat on a skateboard", VideoConfig::default())
//!         .await?;
//!     if let Some(video) = state.video() {
//!         video.asset.save(video.download_file_name())?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `veo` (default): Veo (Google) through the Gemini Developer API
//! - `cli`: the `video-express` command-line front end

pub mod config;
pub mod credential;
mod error;
pub mod session;
pub mod video;

#[cfg(test)]
mod testing;

pub use config::Settings;
pub use credential::{
    CredentialGate, CredentialProvider, EnvCredentialProvider, StaticCredentialProvider,
};
pub use error::{is_credential_message, ErrorKind, Result, VideoExpressError};
pub use session::{GeneratedVideo, GenerationState, History, Orchestrator};
pub use video::{
    AspectRatio, AssetHandle, BackendConnector, JobHandle, JobRequest, JobStatus, Resolution,
    VideoAsset, VideoBackend, VideoConfig, VideoGenerationClient, VideoMetadata,
};

#[cfg(feature = "veo")]
pub use video::providers::{VeoConnector, VeoConnectorBuilder, VeoModel};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::credential::{CredentialGate, CredentialProvider};
    pub use crate::error::{Result, VideoExpressError};
    pub use crate::session::{GenerationState, Orchestrator};
    pub use crate::video::{VideoConfig, VideoGenerationClient};

    #[cfg(feature = "veo")]
    pub use crate::video::providers::VeoConnector;
}
