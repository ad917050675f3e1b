//! Scripted in-process backend for unit tests.

use crate::error::{Result, VideoExpressError};
use crate::video::{BackendConnector, JobHandle, JobRequest, JobStatus, VideoBackend};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Hook = Box<dyn FnMut() + Send>;

/// Replays queued job statuses and assets, recording every call.
///
/// Clones share the same script, so the same value serves as connector and
/// as the sessions it hands out.
#[derive(Clone, Default)]
pub(crate) struct ScriptedBackend {
    statuses: Arc<Mutex<VecDeque<Result<JobStatus>>>>,
    assets: Arc<Mutex<VecDeque<Result<Vec<u8>>>>>,
    calls: Arc<Mutex<Vec<String>>>,
    credentials: Arc<Mutex<Vec<String>>>,
    on_create: Arc<Mutex<Option<Hook>>>,
    poll_delay: Arc<Mutex<Duration>>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queues the response to the next create or poll call.
    pub(crate) fn push_status(&self, status: Result<JobStatus>) {
        self.statuses.lock().unwrap().push_back(status);
    }

    pub(crate) fn pending(&self, name: &str) {
        self.push_status(Ok(JobStatus::pending(JobHandle::new(name))));
    }

    pub(crate) fn done(&self, name: &str, asset_ref: Option<&str>) {
        self.push_status(Ok(JobStatus::finished(
            JobHandle::new(name),
            asset_ref.map(str::to_string),
        )));
    }

    /// Queues the response to the next fetch. Unscripted fetches return a
    /// small placeholder payload.
    pub(crate) fn set_asset(&self, asset: Result<Vec<u8>>) {
        self.assets.lock().unwrap().push_back(asset);
    }

    /// Runs `hook` inside the next create call, before it responds.
    pub(crate) fn on_create(&self, hook: impl FnMut() + Send + 'static) {
        *self.on_create.lock().unwrap() = Some(Box::new(hook));
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Makes every poll take `delay` before answering.
    pub(crate) fn set_poll_delay(&self, delay: Duration) {
        *self.poll_delay.lock().unwrap() = delay;
    }

    pub(crate) fn credentials(&self) -> Vec<String> {
        self.credentials.lock().unwrap().clone()
    }

    fn next_status(&self) -> Result<JobStatus> {
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(VideoExpressError::GenerationFailed("script exhausted".into())))
    }
}

#[async_trait]
impl VideoBackend for ScriptedBackend {
    async fn create_job(&self, request: &JobRequest) -> Result<JobStatus> {
        if let Some(hook) = self.on_create.lock().unwrap().as_mut() {
            hook();
        }
        self.calls.lock().unwrap().push(format!(
            "create:{}:{}:{}",
            request.prompt, request.config.aspect_ratio, request.config.resolution
        ));
        self.next_status()
    }

    async fn poll_job(&self, handle: &JobHandle) -> Result<JobStatus> {
        self.calls.lock().unwrap().push(format!("poll:{}", handle));
        let delay = *self.poll_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.next_status()
    }

    async fn fetch_asset(&self, asset_ref: &str) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(format!("fetch:{}", asset_ref));
        self.assets
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(b"video".to_vec()))
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

impl BackendConnector for ScriptedBackend {
    fn connect(&self, credential: &str) -> Result<Box<dyn VideoBackend>> {
        self.credentials.lock().unwrap().push(credential.to_string());
        Ok(Box::new(self.clone()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
