//! Drives one generation request from submission to a terminal outcome.

use crate::credential::CredentialProvider;
use crate::error::{Result, VideoExpressError};
use crate::video::provider::{BackendConnector, VideoBackend};
use crate::video::types::{
    AssetHandle, JobHandle, JobRequest, JobStatus, VideoAsset, VideoConfig, VideoMetadata,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Delay between status queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Builder for [`VideoGenerationClient`].
pub struct VideoGenerationClientBuilder {
    credentials: Arc<dyn CredentialProvider>,
    connector: Arc<dyn BackendConnector>,
    poll_interval: Duration,
    poll_timeout: Option<Duration>,
}

impl VideoGenerationClientBuilder {
    /// Creates a builder with the default poll interval and no deadline.
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        connector: Arc<dyn BackendConnector>,
    ) -> Self {
        Self {
            credentials,
            connector,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: None,
        }
    }

    /// Sets the delay between status queries.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Bounds the total time spent waiting for the job to finish.
    ///
    /// Without a deadline a stuck job is polled forever.
    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = Some(timeout);
        self
    }

    /// Builds the client.
    pub fn build(self) -> VideoGenerationClient {
        VideoGenerationClient {
            credentials: self.credentials,
            connector: self.connector,
            poll_interval: self.poll_interval,
            poll_timeout: self.poll_timeout,
        }
    }
}

/// Submits jobs, polls them to completion and fetches the result.
///
/// Holds no per-request state: every [`generate`](Self::generate) call reads
/// the credential again and connects a fresh backend session.
pub struct VideoGenerationClient {
    credentials: Arc<dyn CredentialProvider>,
    connector: Arc<dyn BackendConnector>,
    poll_interval: Duration,
    poll_timeout: Option<Duration>,
}

/// One in-flight request. Dropped once terminal.
struct GenerationJob<'a> {
    request: &'a JobRequest,
    handle: JobHandle,
    done: bool,
    asset_ref: Option<String>,
    polls: u32,
}

impl<'a> GenerationJob<'a> {
    fn new(request: &'a JobRequest, status: JobStatus) -> Self {
        Self {
            request,
            handle: status.handle,
            done: status.done,
            asset_ref: status.asset_ref,
            polls: 0,
        }
    }

    fn update(&mut self, status: JobStatus) {
        self.handle = status.handle;
        self.done = status.done;
        self.asset_ref = status.asset_ref;
        self.polls += 1;
    }
}

impl VideoGenerationClient {
    /// Creates a builder.
    pub fn builder(
        credentials: Arc<dyn CredentialProvider>,
        connector: Arc<dyn BackendConnector>,
    ) -> VideoGenerationClientBuilder {
        VideoGenerationClientBuilder::new(credentials, connector)
    }

    /// Returns the delay between status queries.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the poll deadline, if any.
    pub fn poll_timeout(&self) -> Option<Duration> {
        self.poll_timeout
    }

    /// Returns the display name of the backend.
    pub fn backend_name(&self) -> &str {
        self.connector.name()
    }

    /// Generates a video and returns a handle to its bytes.
    ///
    /// Failures are classified once here: credential rejections become
    /// [`VideoExpressError::CredentialInvalid`], everything unrecognized
    /// becomes [`VideoExpressError::GenerationFailed`].
    pub async fn generate(&self, prompt: &str, config: VideoConfig) -> Result<AssetHandle> {
        let request = JobRequest::new(prompt, config)?;

        self.run(&request).await.map_err(|e| {
            let e = e.classify();
            tracing::warn!(kind = ?e.kind(), "video generation failed: {e}");
            e
        })
    }

    async fn run(&self, request: &JobRequest) -> Result<AssetHandle> {
        let start = Instant::now();

        let credential = self.credentials.credential().await?;
        let backend = self.connector.connect(&credential)?;

        tracing::info!(
            backend = self.connector.name(),
            model = backend.model(),
            aspect_ratio = %request.config.aspect_ratio,
            resolution = %request.config.resolution,
            "starting video generation"
        );

        let status = backend.create_job(request).await?;
        let mut job = GenerationJob::new(request, status);
        tracing::debug!(operation = %job.handle, "submitted video generation request");

        self.wait_until_done(backend.as_ref(), &mut job, start).await?;

        let asset_ref = job.asset_ref.take().ok_or(VideoExpressError::EmptyResult(None))?;
        tracing::debug!(operation = %job.handle, "video generated, fetching content");

        let data = backend.fetch_asset(&asset_ref).await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            operation = %job.handle,
            size_bytes = data.len(),
            polls = job.polls,
            duration_ms,
            prompt_len = job.request.prompt.len(),
            "video generation complete"
        );

        Ok(Arc::new(VideoAsset::new(
            data,
            "video/mp4",
            VideoMetadata {
                model: Some(backend.model().to_string()),
                duration_ms: Some(duration_ms),
                polls: job.polls,
            },
        )))
    }

    async fn wait_until_done(
        &self,
        backend: &dyn VideoBackend,
        job: &mut GenerationJob<'_>,
        start: Instant,
    ) -> Result<()> {
        while !job.done {
            let cycle = async {
                tokio::time::sleep(self.poll_interval).await;
                backend.poll_job(&job.handle).await
            };

            // The deadline bounds the sleep and the status request together
            let status = match self.poll_timeout {
                Some(limit) => {
                    let remaining = limit.saturating_sub(start.elapsed());
                    tokio::time::timeout(remaining, cycle)
                        .await
                        .map_err(|_| VideoExpressError::Timeout(limit))??
                }
                None => cycle.await?,
            };
            job.update(status);

            tracing::debug!(
                operation = %job.handle,
                polls = job.polls,
                done = job.done,
                elapsed_secs = start.elapsed().as_secs(),
                "polling video generation"
            );
        }
        Ok(())
    }
}

impl std::fmt::Debug for VideoGenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoGenerationClient")
            .field("backend", &self.connector.name())
            .field("poll_interval", &self.poll_interval)
            .field("poll_timeout", &self.poll_timeout)
            .finish_non_exhaustive()
    }
}
