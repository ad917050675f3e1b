//! Video backend traits.

use crate::error::Result;
use crate::video::types::{JobHandle, JobRequest, JobStatus};
use async_trait::async_trait;

/// A remote video-generation service bound to one credential.
///
/// Sessions are short-lived: one is connected per generation call so a
/// newly selected credential always takes effect.
#[async_trait]
pub trait VideoBackend: Send + Sync {
    /// Submits a new job.
    async fn create_job(&self, request: &JobRequest) -> Result<JobStatus>;

    /// Re-queries the status of a submitted job.
    async fn poll_job(&self, handle: &JobHandle) -> Result<JobStatus>;

    /// Downloads the finished asset.
    async fn fetch_asset(&self, asset_ref: &str) -> Result<Vec<u8>>;

    /// Returns the model identifier used for generation.
    fn model(&self) -> &str;
}

/// Creates [`VideoBackend`] sessions from a credential.
pub trait BackendConnector: Send + Sync {
    /// Connects a fresh session that authenticates with `credential`.
    fn connect(&self, credential: &str) -> Result<Box<dyn VideoBackend>>;

    /// Returns the name of this backend for display.
    fn name(&self) -> &str;
}
