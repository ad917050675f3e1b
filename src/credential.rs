//! Credential sources and the gate that blocks generation until one is present.

use crate::error::{Result, VideoExpressError};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Environment variable read by [`EnvCredentialProvider::new`].
pub const DEFAULT_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Supplies the API credential. Implemented by the host environment.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns true if a credential is currently selected.
    async fn has_credential(&self) -> Result<bool>;

    /// Opens the host's credential selection surface.
    ///
    /// Idempotent; may be called again after the credential is invalidated.
    /// Fails with [`VideoExpressError::EnvironmentUnavailable`] if the host
    /// has no selection surface.
    async fn select_credential(&self) -> Result<()>;

    /// Returns the currently selected credential.
    async fn credential(&self) -> Result<String>;
}

fn missing_credential() -> VideoExpressError {
    VideoExpressError::CredentialInvalid("no API key has been selected".into())
}

/// Reads the credential from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvCredentialProvider {
    var: String,
}

impl EnvCredentialProvider {
    /// Reads `GOOGLE_API_KEY`.
    pub fn new() -> Self {
        Self::from_var(DEFAULT_API_KEY_ENV)
    }

    /// Reads the given variable instead.
    pub fn from_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Returns the variable name.
    pub fn var(&self) -> &str {
        &self.var
    }

    fn read(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

impl Default for EnvCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn has_credential(&self) -> Result<bool> {
        Ok(self.read().is_some())
    }

    async fn select_credential(&self) -> Result<()> {
        if self.read().is_some() {
            Ok(())
        } else {
            Err(VideoExpressError::EnvironmentUnavailable(format!(
                "{} is not set; export it and select again",
                self.var
            )))
        }
    }

    async fn credential(&self) -> Result<String> {
        self.read().ok_or_else(missing_credential)
    }
}

/// In-memory credential that the host can replace at any time.
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialProvider {
    key: Arc<RwLock<Option<String>>>,
}

impl StaticCredentialProvider {
    /// Creates a provider holding `key`.
    pub fn new(key: impl Into<String>) -> Self {
        let provider = Self::default();
        provider.set(key);
        provider
    }

    /// Replaces the held key.
    pub fn set(&self, key: impl Into<String>) {
        let mut slot = self.key.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(key.into());
    }

    /// Removes the held key.
    pub fn clear(&self) {
        let mut slot = self.key.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    fn get(&self) -> Option<String> {
        self.key
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .filter(|k| !k.trim().is_empty())
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn has_credential(&self) -> Result<bool> {
        Ok(self.get().is_some())
    }

    async fn select_credential(&self) -> Result<()> {
        if self.get().is_some() {
            Ok(())
        } else {
            Err(VideoExpressError::EnvironmentUnavailable(
                "no credential selection surface; set a key first".into(),
            ))
        }
    }

    async fn credential(&self) -> Result<String> {
        self.get().ok_or_else(missing_credential)
    }
}

/// Tracks whether generation-capable UI should be unlocked.
pub struct CredentialGate {
    provider: Arc<dyn CredentialProvider>,
    available: bool,
}

impl CredentialGate {
    /// Creates a closed gate over `provider`.
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Self {
            provider,
            available: false,
        }
    }

    /// Queries the provider once and records the result.
    ///
    /// A provider error leaves the gate closed.
    pub async fn check(&mut self) -> bool {
        self.available = match self.provider.has_credential().await {
            Ok(has) => has,
            Err(e) => {
                tracing::error!("error checking credential: {e}");
                false
            }
        };
        self.available
    }

    /// Opens the host selection surface and unlocks the gate.
    ///
    /// The gate opens as soon as the call resolves, without re-querying
    /// `has_credential`: the selection surface can close before the host
    /// reports the new key.
    pub async fn select(&mut self) -> Result<()> {
        self.provider.select_credential().await?;
        self.available = true;
        Ok(())
    }

    /// Closes the gate so the presentation layer prompts for a credential again.
    pub fn invalidate(&mut self) {
        self.available = false;
    }

    /// Returns true if a credential is believed to be present.
    pub fn is_available(&self) -> bool {
        self.available
    }
}

impl std::fmt::Debug for CredentialGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialGate")
            .field("available", &self.available)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    /// Selection succeeds but the host has not registered a key yet.
    struct LaggingHost;

    #[async_trait]
    impl CredentialProvider for LaggingHost {
        async fn has_credential(&self) -> Result<bool> {
            Ok(false)
        }

        async fn select_credential(&self) -> Result<()> {
            Ok(())
        }

        async fn credential(&self) -> Result<String> {
            Err(missing_credential())
        }
    }

    struct BrokenHost;

    #[async_trait]
    impl CredentialProvider for BrokenHost {
        async fn has_credential(&self) -> Result<bool> {
            Err(VideoExpressError::EnvironmentUnavailable("no host".into()))
        }

        async fn select_credential(&self) -> Result<()> {
            Err(VideoExpressError::EnvironmentUnavailable("no host".into()))
        }

        async fn credential(&self) -> Result<String> {
            Err(missing_credential())
        }
    }

    #[tokio::test]
    async fn test_static_provider_set_and_clear() {
        let provider = StaticCredentialProvider::default();
        assert!(!provider.has_credential().await.unwrap());
        assert!(provider.credential().await.unwrap_err().is_credential_error());

        provider.set("key-1");
        let shared = provider.clone();
        assert_eq!(shared.credential().await.unwrap(), "key-1");

        provider.set("key-2");
        assert_eq!(shared.credential().await.unwrap(), "key-2");

        provider.clear();
        assert!(!shared.has_credential().await.unwrap());
    }

    #[tokio::test]
    async fn test_env_provider_missing_var() {
        let provider = EnvCredentialProvider::from_var("VIDEO_EXPRESS_TEST_UNSET_KEY");
        assert!(!provider.has_credential().await.unwrap());
        let err = provider.select_credential().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EnvironmentUnavailable);
        assert!(provider.credential().await.unwrap_err().is_credential_error());
    }

    #[tokio::test]
    async fn test_gate_check_reflects_provider() {
        let provider = StaticCredentialProvider::new("key");
        let mut gate = CredentialGate::new(Arc::new(provider.clone()));
        assert!(!gate.is_available());
        assert!(gate.check().await);

        provider.clear();
        assert!(!gate.check().await);
    }

    #[tokio::test]
    async fn test_gate_select_is_optimistic() {
        let mut gate = CredentialGate::new(Arc::new(LaggingHost));
        assert!(!gate.check().await);

        gate.select().await.unwrap();
        assert!(gate.is_available());
    }

    #[tokio::test]
    async fn test_gate_stays_closed_when_host_missing() {
        let mut gate = CredentialGate::new(Arc::new(BrokenHost));
        assert!(!gate.check().await);

        let err = gate.select().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EnvironmentUnavailable);
        assert!(!gate.is_available());
    }

    #[tokio::test]
    async fn test_gate_invalidate() {
        let mut gate = CredentialGate::new(Arc::new(StaticCredentialProvider::new("key")));
        gate.select().await.unwrap();
        gate.invalidate();
        assert!(!gate.is_available());
    }
}
