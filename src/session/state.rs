//! UI-visible generation state and the completed-video record.

use crate::video::{AssetHandle, VideoConfig};
use chrono::{DateTime, Utc};

/// A completed generation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedVideo {
    /// Session-unique id derived from the submission time in milliseconds.
    pub id: u64,
    /// The fetched video bytes.
    pub asset: AssetHandle,
    /// The prompt as submitted.
    pub prompt: String,
    /// When the video became available.
    pub created_at: DateTime<Utc>,
    /// Rendering options used.
    pub config: VideoConfig,
}

impl GeneratedVideo {
    /// Suggested file name for downloading this video.
    pub fn download_file_name(&self) -> String {
        format!("video-express-{}.mp4", self.id)
    }
}

/// The single source of truth for what the presentation layer shows.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationState {
    /// Waiting for input, optionally showing a dismissable error.
    Idle {
        /// Inline message from the previous attempt.
        error: Option<String>,
    },
    /// A request is in flight.
    Generating,
    /// A video is displayed.
    Completed {
        /// The displayed video.
        video: GeneratedVideo,
    },
    /// The last request failed.
    Failed {
        /// Human-readable failure message.
        error: String,
    },
}

impl Default for GenerationState {
    fn default() -> Self {
        Self::Idle { error: None }
    }
}

impl GenerationState {
    /// Short status label.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Idle { .. } => "idle",
            Self::Generating => "generating",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "error",
        }
    }

    /// The error message to show, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Idle { error } => error.as_deref(),
            Self::Failed { error } => Some(error),
            _ => None,
        }
    }

    /// The displayed video, if any.
    pub fn video(&self) -> Option<&GeneratedVideo> {
        match self {
            Self::Completed { video } => Some(video),
            _ => None,
        }
    }

    /// Returns true while a request is in flight.
    pub fn is_generating(&self) -> bool {
        matches!(self, Self::Generating)
    }
}

impl std::fmt::Display for GenerationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle { error: None } => write!(f, "idle"),
            Self::Idle { error: Some(e) } => write!(f, "idle ({})", e),
            Self::Generating => write!(f, "generating"),
            Self::Completed { video } => write!(f, "completed (#{})", video.id),
            Self::Failed { error } => write!(f, "error: {}", error),
        }
    }
}
