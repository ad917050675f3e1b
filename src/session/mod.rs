//! Generation session: state machine, history and the orchestrator driving them.

mod history;
mod orchestrator;
mod state;

pub use history::History;
pub use orchestrator::{Orchestrator, CREDENTIAL_EXPIRED_MESSAGE, GENERIC_FAILURE_MESSAGE};
pub use state::{GeneratedVideo, GenerationState};
