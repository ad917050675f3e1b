//! Video generation backends.

#[cfg(feature = "veo")]
mod veo;

#[cfg(feature = "veo")]
pub use veo::{VeoConnector, VeoConnectorBuilder, VeoModel, VeoSession, GEMINI_API_BASE_URL};
