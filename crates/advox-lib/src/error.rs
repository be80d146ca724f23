//! Error taxonomy for synthesis requests.

use thiserror::Error;

use crate::engine::EngineError;

/// Failures a synthesis request can surface to the HTTP layer.
///
/// Client-caused variants map to 400; everything else is a generic 500 with
/// no engine internals in the body.
#[derive(Debug, Error)]
pub enum TtsError {
    /// Advisor id not present in the voice registry. Rejected before any
    /// engine call, with the known ids in the message.
    #[error("Unknown advisor '{id}'. Available: {known:?}")]
    UnknownAdvisor { id: String, known: Vec<&'static str> },

    /// Request text missing or whitespace-only.
    #[error("Request text must not be empty")]
    EmptyText,

    /// Engine completed without error but emitted zero audio bytes.
    #[error("Edge TTS returned empty audio")]
    EmptySynthesis,

    /// Engine fault during connect or streaming.
    #[error("engine failure: {0}")]
    Engine(#[from] EngineError),

    /// Voice catalog passthrough failed.
    #[error("voice catalog fetch failed: {0}")]
    Catalog(EngineError),
}

impl TtsError {
    /// True for client-caused failures (HTTP 400).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnknownAdvisor { .. } | Self::EmptyText)
    }
}
