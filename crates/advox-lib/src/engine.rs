//! Speech engine abstraction — typed event stream plus voice catalog.
//!
//! The engine is external. All the service sees is an ordered, finite,
//! non-restartable sequence of events per call: audio payloads interleaved
//! with optional word-timing markers. Implementations must preserve emission
//! order; both audio byte order and boundary order are load-bearing.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use serde::Serialize;
use thiserror::Error;

/// One event from an in-flight synthesis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A chunk of encoded audio, in emission order.
    Audio(Vec<u8>),
    /// A word-timing marker in the engine's native 100 ns ticks.
    /// Only emitted when the call requested boundaries.
    WordBoundary {
        text: String,
        offset_ticks: u64,
        duration_ticks: u64,
    },
}

/// Engine-side failures, surfaced mid-stream or at connect time.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine connect failed: {0}")]
    Connect(String),
    #[error("engine stream error: {0}")]
    Stream(String),
    #[error("engine protocol violation: {0}")]
    Protocol(String),
    #[error("engine http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Ordered event sequence for one synthesis call. Consumed exactly once.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EngineEvent, EngineError>> + Send>>;

/// One voice from the engine's catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogVoice {
    pub id: String,
    pub name: String,
    pub gender: String,
    pub locale: String,
}

/// External neural TTS engine, specified only at its interface.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Open one streaming synthesis call. `with_boundaries` asks the engine
    /// to interleave word-timing markers with the audio.
    async fn open(
        &self,
        text: &str,
        voice: &str,
        with_boundaries: bool,
    ) -> Result<EventStream, EngineError>;

    /// Fetch the engine's voice catalog.
    async fn list_voices(&self) -> Result<Vec<CatalogVoice>, EngineError>;
}
