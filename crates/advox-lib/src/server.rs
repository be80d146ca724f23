//! HTTP API for the advox TTS service.
//!
//! FastAPI-compatible surface: `/health`, `/voices`, `/synthesize`,
//! `/synthesize/advisor/{advisor_id}`, `/synthesize/with-boundaries`.
//! CORS-permissive so browser clients can call directly.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;
use tower_http::cors::CorsLayer;

use advox_core::admission::admit;
use advox_core::boundary::{WordBoundary, total_duration_ms};
use advox_core::voices::{DEFAULT_VOICE, MAX_TEXT_LENGTH, VoiceRegistry};

use crate::breadcrumb::{
    Breadcrumb, CRUMB_REQUEST_ERROR, CRUMB_REQUEST_START, CRUMB_TEXT_TRUNCATED,
    CRUMB_WITH_BOUNDARIES_SUCCESS,
};
use crate::engine::SpeechEngine;
use crate::error::TtsError;
use crate::session;

/// Shared per-process state. The registry is immutable; the engine and trail
/// are internally synchronized, so requests never contend on locks here.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<dyn SpeechEngine>,
    trail: Arc<dyn Breadcrumb>,
    registry: VoiceRegistry,
    max_text_length: usize,
}

impl AppState {
    pub fn new(engine: Arc<dyn SpeechEngine>, trail: Arc<dyn Breadcrumb>) -> Self {
        Self {
            engine,
            trail,
            registry: VoiceRegistry::default(),
            max_text_length: MAX_TEXT_LENGTH,
        }
    }
}

/// Build the axum router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/voices", get(voices))
        .route("/synthesize", post(synthesize))
        .route("/synthesize/advisor/{advisor_id}", post(synthesize_advisor))
        .route("/synthesize/with-boundaries", post(synthesize_with_boundaries))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct SynthesizeRequest {
    text: String,
    #[serde(default)]
    voice: Option<String>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct BoundariesResponse {
    audio: String,
    word_boundaries: Vec<WordBoundary>,
    total_duration_ms: u64,
}

/// Error envelope, FastAPI-shaped: `{"detail": "..."}`.
struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn internal(detail: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

// ─── Handlers ─────────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ready",
        "service": "Edge TTS",
        "advisors": state.registry.advisor_ids(),
        "max_text_length": state.max_text_length,
    }))
}

async fn voices(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let catalog = state
        .engine
        .list_voices()
        .await
        .map_err(|e| reject(&state, TtsError::Catalog(e)))?;

    // English voices only, capped to keep the response reasonable
    let available: Vec<_> = catalog
        .into_iter()
        .filter(|v| v.locale.starts_with("en-"))
        .take(20)
        .collect();

    let advisor_voices: serde_json::Map<String, serde_json::Value> = state
        .registry
        .entries()
        .map(|(id, voice)| (id.to_string(), json!(voice)))
        .collect();

    Ok(Json(json!({
        "advisor_voices": advisor_voices,
        "available_voices": available,
    })))
}

async fn synthesize(
    State(state): State<AppState>,
    Json(req): Json<SynthesizeRequest>,
) -> Result<Response, ApiError> {
    state.trail.light(
        CRUMB_REQUEST_START,
        "synthesize_request_received",
        json!({
            "text_length": req.text.chars().count(),
            "voice": req.voice.as_deref().unwrap_or(DEFAULT_VOICE),
        }),
    );

    let voice = req.voice.unwrap_or_else(|| DEFAULT_VOICE.to_string());
    let text = admit_text(&state, &req.text, None)?;

    let out = session::synthesize(&*state.engine, &*state.trail, &text, &voice, false)
        .await
        .map_err(|e| reject(&state, e))?;

    Ok(audio_response(out.audio, "speech.mp3"))
}

async fn synthesize_advisor(
    State(state): State<AppState>,
    Path(advisor_id): Path<String>,
    Json(req): Json<SynthesizeRequest>,
) -> Result<Response, ApiError> {
    state.trail.light(
        CRUMB_REQUEST_START,
        "advisor_synthesize_request",
        json!({
            "advisor_id": advisor_id,
            "text_length": req.text.chars().count(),
        }),
    );

    // Routing is resolved before anything touches the engine
    let Some(voice) = state.registry.resolve(&advisor_id) else {
        return Err(reject(
            &state,
            TtsError::UnknownAdvisor {
                id: advisor_id,
                known: state.registry.advisor_ids(),
            },
        ));
    };

    let text = admit_text(&state, &req.text, Some(&advisor_id))?;

    let out = session::synthesize(&*state.engine, &*state.trail, &text, voice, false)
        .await
        .map_err(|e| reject(&state, e))?;

    Ok(audio_response(out.audio, &format!("{advisor_id}_speech.mp3")))
}

async fn synthesize_with_boundaries(
    State(state): State<AppState>,
    Json(req): Json<SynthesizeRequest>,
) -> Result<Json<BoundariesResponse>, ApiError> {
    state.trail.light(
        CRUMB_REQUEST_START,
        "synthesize_with_boundaries_request",
        json!({
            "text_length": req.text.chars().count(),
            "voice": req.voice.as_deref().unwrap_or(DEFAULT_VOICE),
        }),
    );

    let voice = req.voice.unwrap_or_else(|| DEFAULT_VOICE.to_string());
    let text = admit_text(&state, &req.text, None)?;

    let out = session::synthesize(&*state.engine, &*state.trail, &text, &voice, true)
        .await
        .map_err(|e| reject(&state, e))?;

    let total_duration_ms = total_duration_ms(&out.boundaries);

    state.trail.light(
        CRUMB_WITH_BOUNDARIES_SUCCESS,
        "boundaries_response_sent",
        json!({
            "word_count": out.boundaries.len(),
            "audio_size": out.audio.len(),
            "total_duration_ms": total_duration_ms,
        }),
    );

    Ok(Json(BoundariesResponse {
        audio: BASE64.encode(&out.audio),
        word_boundaries: out.boundaries,
        total_duration_ms,
    }))
}

// ─── Helpers ──────────────────────────────────────────────────────────────

/// Validate and clamp inbound text. Truncation is a crumb, never an error.
fn admit_text(state: &AppState, text: &str, advisor_id: Option<&str>) -> Result<String, ApiError> {
    if text.trim().is_empty() {
        return Err(reject(state, TtsError::EmptyText));
    }

    let (admitted, was_truncated) = admit(text, state.max_text_length);
    if was_truncated {
        let mut context = json!({
            "original_length": text.chars().count(),
            "truncated_to": state.max_text_length,
        });
        if let Some(id) = advisor_id {
            context["advisor_id"] = json!(id);
        }
        state
            .trail
            .light(CRUMB_TEXT_TRUNCATED, "text_truncated", context);
    }

    Ok(admitted.to_string())
}

/// Crumb the failure and map it to a response. Validation failures carry
/// their reason; everything else is a generic 500 with no engine internals.
fn reject(state: &AppState, err: TtsError) -> ApiError {
    state.trail.fail(CRUMB_REQUEST_ERROR, &err);

    if err.is_client_error() {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            detail: err.to_string(),
        }
    } else if matches!(err, TtsError::Catalog(_)) {
        ApiError::internal("Failed to fetch voice list")
    } else {
        ApiError::internal("TTS generation failed")
    }
}

/// Raw audio response: exact byte length, inline disposition.
fn audio_response(audio: Vec<u8>, filename: &str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(audio.len()));
    if let Ok(disposition) = HeaderValue::from_str(&format!("inline; filename=\"{filename}\"")) {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }
    (headers, Body::from(audio)).into_response()
}
