//! Synthesis session — one engine call, consumed to completion.
//!
//! Owns exactly one streaming call per invocation and partitions its events
//! into an audio accumulator and a boundaries sequence, both in strict
//! arrival order. On any stream error the partial buffers are dropped; a
//! completed stream with zero audio bytes is a hard failure, not a 0-length
//! success.

use advox_core::boundary::WordBoundary;
use futures_util::StreamExt;
use tracing::debug;

use crate::breadcrumb::{
    Breadcrumb, CRUMB_AUDIO_GENERATED, CRUMB_BOUNDARIES_CAPTURED, CRUMB_ENGINE_CALL_START,
    CRUMB_ENGINE_ERROR, CRUMB_WITH_BOUNDARIES_START,
};
use crate::engine::{EngineEvent, SpeechEngine};
use crate::error::TtsError;

/// Everything one completed session produced.
#[derive(Debug)]
pub struct SynthesisOutput {
    pub audio: Vec<u8>,
    pub boundaries: Vec<WordBoundary>,
}

/// Run one synthesis call against `engine` and consume its full event stream.
///
/// Plain mode (`with_boundaries = false`) asks the engine for audio only.
/// Boundary mode additionally collects word-timing markers, converting ticks
/// to milliseconds as each one arrives.
pub async fn synthesize(
    engine: &dyn SpeechEngine,
    trail: &dyn Breadcrumb,
    text: &str,
    voice: &str,
    with_boundaries: bool,
) -> Result<SynthesisOutput, TtsError> {
    // Each mode has its own start checkpoint
    let (start_id, start_event) = if with_boundaries {
        (CRUMB_WITH_BOUNDARIES_START, "tts_with_boundaries_started")
    } else {
        (CRUMB_ENGINE_CALL_START, "tts_generation_started")
    };
    trail.light(
        start_id,
        start_event,
        serde_json::json!({
            "voice": voice,
            "text_length": text.chars().count(),
        }),
    );

    let result = consume(engine, text, voice, with_boundaries).await;

    match &result {
        Ok(output) => {
            trail.light(
                CRUMB_AUDIO_GENERATED,
                "audio_generated_success",
                serde_json::json!({
                    "audio_bytes": output.audio.len(),
                    "voice": voice,
                }),
            );
            if with_boundaries {
                trail.light(
                    CRUMB_BOUNDARIES_CAPTURED,
                    "word_boundaries_captured",
                    serde_json::json!({
                        "word_count": output.boundaries.len(),
                        "voice": voice,
                    }),
                );
            }
        }
        Err(e) => trail.fail(CRUMB_ENGINE_ERROR, e),
    }

    result
}

async fn consume(
    engine: &dyn SpeechEngine,
    text: &str,
    voice: &str,
    with_boundaries: bool,
) -> Result<SynthesisOutput, TtsError> {
    let mut events = engine.open(text, voice, with_boundaries).await?;

    let mut audio: Vec<u8> = Vec::new();
    let mut boundaries: Vec<WordBoundary> = Vec::new();

    while let Some(event) = events.next().await {
        match event? {
            EngineEvent::Audio(bytes) => audio.extend_from_slice(&bytes),
            EngineEvent::WordBoundary {
                text,
                offset_ticks,
                duration_ticks,
            } => boundaries.push(WordBoundary::from_ticks(text, offset_ticks, duration_ticks)),
        }
    }

    if audio.is_empty() {
        return Err(TtsError::EmptySynthesis);
    }

    debug!(
        "session: {} audio bytes, {} boundaries",
        audio.len(),
        boundaries.len()
    );

    Ok(SynthesisOutput { audio, boundaries })
}
