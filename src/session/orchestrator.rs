//! Sequences state transitions around generation calls and owns the history.

use crate::credential::CredentialGate;
use crate::error::{Result, VideoExpressError};
use crate::session::history::History;
use crate::session::state::{GeneratedVideo, GenerationState};
use crate::video::{VideoConfig, VideoGenerationClient};
use chrono::Utc;
use tokio::sync::watch;

/// Shown after the provider rejects the credential.
pub const CREDENTIAL_EXPIRED_MESSAGE: &str =
    "Credential session expired or invalid. Please select an API key again.";

/// Shown when a failure carries no message of its own.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong while generating the video.";

/// The only writer of [`GenerationState`] and [`History`].
///
/// The presentation layer reads through [`state`](Self::state),
/// [`subscribe`](Self::subscribe) and [`history`](Self::history), and
/// requests transitions through the intent methods.
pub struct Orchestrator {
    client: VideoGenerationClient,
    gate: CredentialGate,
    history: History,
    state: watch::Sender<GenerationState>,
    last_id: u64,
}

impl Orchestrator {
    /// Creates an orchestrator in the `Idle` state with an empty history.
    pub fn new(client: VideoGenerationClient, gate: CredentialGate) -> Self {
        let (state, _) = watch::channel(GenerationState::default());
        Self {
            client,
            gate,
            history: History::new(),
            state,
            last_id: 0,
        }
    }

    /// Checks the credential once at startup and returns whether one is present.
    pub async fn start(&mut self) -> bool {
        let available = self.gate.check().await;
        tracing::debug!(available, "initial credential check");
        available
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> GenerationState {
        self.state.borrow().clone()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    /// Completed videos, most recent first.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Whether the credential gate is open.
    pub fn has_credential(&self) -> bool {
        self.gate.is_available()
    }

    /// The underlying client.
    pub fn client(&self) -> &VideoGenerationClient {
        &self.client
    }

    /// Opens the host credential selection surface.
    pub async fn select_credential(&mut self) -> Result<()> {
        self.gate.select().await
    }

    /// Generates a video and returns the resulting state.
    ///
    /// The state becomes `Generating` before the first network call. Errors
    /// are only returned for rejected input; generation failures end in a
    /// state carrying the message.
    pub async fn submit(&mut self, prompt: &str, config: VideoConfig) -> Result<GenerationState> {
        if prompt.trim().is_empty() {
            return Err(VideoExpressError::InvalidRequest(
                "prompt must not be empty".into(),
            ));
        }

        let id = self.next_id(Utc::now().timestamp_millis());
        self.transition(GenerationState::Generating);

        let next = match self.client.generate(prompt, config).await {
            Ok(asset) => {
                let video = GeneratedVideo {
                    id,
                    asset,
                    prompt: prompt.to_string(),
                    created_at: Utc::now(),
                    config,
                };
                self.history.prepend(video.clone());
                GenerationState::Completed { video }
            }
            Err(e) if e.is_credential_error() => {
                self.gate.invalidate();
                GenerationState::Idle {
                    error: Some(CREDENTIAL_EXPIRED_MESSAGE.to_string()),
                }
            }
            Err(e) => {
                let message = e.to_string();
                let error = if message.trim().is_empty() {
                    GENERIC_FAILURE_MESSAGE.to_string()
                } else {
                    message
                };
                GenerationState::Failed { error }
            }
        };

        self.transition(next.clone());
        Ok(next)
    }

    /// Returns to a clean `Idle`, keeping history. Ignored while generating.
    pub fn reset(&mut self) -> bool {
        if self.state.borrow().is_generating() {
            return false;
        }
        self.transition(GenerationState::default());
        true
    }

    /// Displays an existing history entry without any network activity.
    pub fn view_history_entry(&mut self, id: u64) -> Result<()> {
        let video = self.history.get(id).cloned().ok_or_else(|| {
            VideoExpressError::InvalidRequest(format!("no history entry with id {}", id))
        })?;
        self.transition(GenerationState::Completed { video });
        Ok(())
    }

    /// Evicts a history entry so its asset can be freed.
    ///
    /// If the entry is on display the state returns to `Idle`.
    pub fn remove_history_entry(&mut self, id: u64) -> Option<GeneratedVideo> {
        let removed = self.history.remove(id)?;
        let displayed = self.state.borrow().video().map(|v| v.id) == Some(id);
        if displayed {
            self.transition(GenerationState::default());
        }
        Some(removed)
    }

    fn next_id(&mut self, now_ms: i64) -> u64 {
        let candidate = u64::try_from(now_ms).unwrap_or(0);
        self.last_id = candidate.max(self.last_id + 1);
        self.last_id
    }

    fn transition(&self, next: GenerationState) {
        let previous = self.state.send_replace(next);
        tracing::debug!(
            from = previous.status(),
            to = self.state.borrow().status(),
            "state transition"
        );
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("state", &self.state.borrow().status())
            .field("history", &self.history.len())
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}
