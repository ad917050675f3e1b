//! Error types for the video generation lifecycle.

use std::time::Duration;

/// Message substrings that mean the provider rejected the credential or
/// could not find the entity it points at.
const CREDENTIAL_MARKERS: &[&str] = &[
    "API Key invalid",
    "API key not valid",
    "Requested entity was not found",
];

/// Maximum length of a provider error body carried in an error message.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Errors that can occur while generating a video.
#[derive(Debug, thiserror::Error)]
pub enum VideoExpressError {
    /// Credential rejected, expired, or not found. Recoverable by selecting
    /// a credential again.
    #[error("credential invalid: {0}")]
    CredentialInvalid(String),

    /// The job finished but carried no asset reference. The detail says
    /// why, when the provider reported it (e.g. safety-filtered media).
    #[error("video generation completed but no video URI was returned{}", detail_suffix(.0))]
    EmptyResult(Option<String>),

    /// Fetching the finished asset returned a non-success response.
    #[error("failed to fetch video content: {status} {status_text}")]
    Transport {
        /// HTTP status code.
        status: u16,
        /// Reason phrase, plus the provider's message when one was sent.
        status_text: String,
    },

    /// Any other failure during submission or polling.
    #[error("{0}")]
    GenerationFailed(String),

    /// The job did not finish within the configured poll deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The host surface for selecting a credential is not available.
    #[error("credential selection unavailable: {0}")]
    EnvironmentUnavailable(String),

    /// Invalid request parameters (caller bug).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Provider error message.
        message: String,
    },

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error (e.g., saving a video).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The user-facing category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`VideoExpressError::CredentialInvalid`].
    CredentialInvalid,
    /// See [`VideoExpressError::EmptyResult`].
    EmptyResult,
    /// See [`VideoExpressError::Transport`].
    TransportError,
    /// Catch-all for submission and polling failures.
    GenerationFailed,
    /// See [`VideoExpressError::Timeout`].
    Timeout,
    /// See [`VideoExpressError::EnvironmentUnavailable`].
    EnvironmentUnavailable,
    /// See [`VideoExpressError::InvalidRequest`].
    InvalidRequest,
}

impl VideoExpressError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CredentialInvalid(_) => ErrorKind::CredentialInvalid,
            Self::EmptyResult(_) => ErrorKind::EmptyResult,
            Self::Transport { .. } => ErrorKind::TransportError,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::EnvironmentUnavailable(_) => ErrorKind::EnvironmentUnavailable,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::GenerationFailed(_)
            | Self::Api { .. }
            | Self::Network(_)
            | Self::Io(_)
            | Self::Json(_) => ErrorKind::GenerationFailed,
        }
    }

    /// Returns true if the provider rejected the credential.
    pub fn is_credential_error(&self) -> bool {
        self.kind() == ErrorKind::CredentialInvalid
    }

    /// Reclassifies a raw lifecycle failure at the client boundary.
    ///
    /// Credential markers anywhere in the message win over every other kind.
    /// Already-typed outcomes keep their kind; everything else becomes
    /// [`VideoExpressError::GenerationFailed`] with its original message.
    pub fn classify(self) -> Self {
        let message = match &self {
            Self::CredentialInvalid(_) => return self,
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        };

        if is_credential_message(&message) {
            return Self::CredentialInvalid(message);
        }

        match self {
            Self::EmptyResult(_)
            | Self::Transport { .. }
            | Self::Timeout(_)
            | Self::EnvironmentUnavailable(_)
            | Self::InvalidRequest(_)
            | Self::GenerationFailed(_) => self,
            _ => Self::GenerationFailed(message),
        }
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(" ({})", d),
        None => String::new(),
    }
}

/// Returns true if `message` says the credential was rejected or not found.
pub fn is_credential_message(message: &str) -> bool {
    CREDENTIAL_MARKERS.iter().any(|m| message.contains(m))
}

/// Collapses whitespace in a provider error body and caps its length.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        return collapsed;
    }
    let mut truncated: String = collapsed.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
    truncated.push_str("...");
    truncated
}

/// Result type alias for video generation operations.
pub type Result<T> = std::result::Result<T, VideoExpressError>;
