//! Settings resolved from the environment.

use crate::error::{Result, VideoExpressError};
use std::time::Duration;

#[cfg(feature = "veo")]
use crate::credential::CredentialProvider;
#[cfg(feature = "veo")]
use crate::video::providers::VeoConnector;
#[cfg(feature = "veo")]
use crate::video::VideoGenerationClient;
#[cfg(feature = "veo")]
use std::sync::Arc;

/// Environment variable overriding the Veo API root.
pub const BASE_URL_ENV: &str = "VEO_BASE_URL";
/// Environment variable selecting the Veo model (`fast` or `quality`).
pub const MODEL_ENV: &str = "VEO_MODEL";
/// Environment variable overriding the poll interval, in seconds.
pub const POLL_INTERVAL_ENV: &str = "VIDEO_EXPRESS_POLL_INTERVAL_SECS";
/// Environment variable setting a poll deadline, in seconds.
pub const POLL_TIMEOUT_ENV: &str = "VIDEO_EXPRESS_POLL_TIMEOUT_SECS";

/// Runtime settings. Every field is optional; unset fields keep the
/// library defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Veo model name or alias.
    pub model: Option<String>,
    /// API root override.
    pub base_url: Option<String>,
    /// Delay between status queries.
    pub poll_interval: Option<Duration>,
    /// Maximum time to wait for a job.
    pub poll_timeout: Option<Duration>,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            model: non_empty(MODEL_ENV),
            base_url: non_empty(BASE_URL_ENV),
            poll_interval: non_empty(POLL_INTERVAL_ENV)
                .map(|v| parse_secs(POLL_INTERVAL_ENV, &v))
                .transpose()?,
            poll_timeout: non_empty(POLL_TIMEOUT_ENV)
                .map(|v| parse_secs(POLL_TIMEOUT_ENV, &v))
                .transpose()?,
        })
    }
}

#[cfg(feature = "veo")]
impl Settings {
    /// Builds a Veo connector from these settings.
    pub fn connector(&self) -> Result<VeoConnector> {
        let mut builder = VeoConnector::builder();
        if let Some(model) = &self.model {
            builder = builder.model(model.parse()?);
        }
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url.clone());
        }
        builder.build()
    }

    /// Builds a generation client over a Veo connector.
    pub fn client(
        &self,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<VideoGenerationClient> {
        let mut builder = VideoGenerationClient::builder(credentials, Arc::new(self.connector()?));
        if let Some(interval) = self.poll_interval {
            builder = builder.poll_interval(interval);
        }
        if let Some(timeout) = self.poll_timeout {
            builder = builder.poll_timeout(timeout);
        }
        Ok(builder.build())
    }
}

fn parse_secs(name: &str, value: &str) -> Result<Duration> {
    let secs: f64 = value.trim().parse().map_err(|_| {
        VideoExpressError::InvalidRequest(format!(
            "{} must be a number of seconds, got '{}'",
            name, value
        ))
    })?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(VideoExpressError::InvalidRequest(format!(
            "{} must be positive, got '{}'",
            name, value
        )));
    }
    Ok(Duration::from_secs_f64(secs))
}
