//! Edge read-aloud engine client.
//!
//! Speaks the consumer read-aloud websocket protocol: one `speech.config`
//! frame, one SSML frame, then a stream of frames back — binary frames carry
//! MP3 audio behind a 2-byte header-length prefix, text frames carry JSON
//! metadata (word boundaries) and turn markers. `Path:turn.end` terminates
//! the turn.
//!
//! The voice catalog comes from the matching HTTPS voices/list endpoint.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::engine::{CatalogVoice, EngineError, EngineEvent, EventStream, SpeechEngine};

const TRUSTED_CLIENT_TOKEN: &str = "6A5AA1D4EAFF4E9FB37E23D68491D6F4";
const WSS_ENDPOINT: &str =
    "wss://speech.platform.bing.com/consumer/speech/synthesize/readaloud/edge/v1";
const VOICE_LIST_ENDPOINT: &str =
    "https://speech.platform.bing.com/consumer/speech/synthesize/readaloud/voices/list";

/// MP3 output; matches the `speech.mp3` filenames the HTTP layer serves.
const OUTPUT_FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";

/// Edge TTS engine handle. Cheap to clone; one websocket per `open` call.
#[derive(Clone)]
pub struct EdgeEngine {
    http: reqwest::Client,
}

impl EdgeEngine {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for EdgeEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechEngine for EdgeEngine {
    async fn open(
        &self,
        text: &str,
        voice: &str,
        with_boundaries: bool,
    ) -> Result<EventStream, EngineError> {
        let url = format!(
            "{WSS_ENDPOINT}?TrustedClientToken={TRUSTED_CLIENT_TOKEN}&ConnectionId={}",
            connection_id()
        );

        let (mut ws, _) = connect_async(url.as_str())
            .await
            .map_err(|e| EngineError::Connect(e.to_string()))?;

        ws.send(Message::Text(speech_config(with_boundaries).into()))
            .await
            .map_err(|e| EngineError::Connect(e.to_string()))?;
        ws.send(Message::Text(
            ssml_request(&connection_id(), text, voice).into(),
        ))
        .await
        .map_err(|e| EngineError::Connect(e.to_string()))?;

        let (tx, rx) = futures_channel::mpsc::unbounded();
        tokio::spawn(async move {
            pump(ws, tx).await;
        });

        Ok(Box::pin(rx))
    }

    async fn list_voices(&self) -> Result<Vec<CatalogVoice>, EngineError> {
        let url = format!("{VOICE_LIST_ENDPOINT}?trustedclienttoken={TRUSTED_CLIENT_TOKEN}");
        let voices: Vec<EdgeVoice> = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(voices
            .into_iter()
            .map(|v| CatalogVoice {
                id: v.short_name,
                name: v.friendly_name,
                gender: v.gender,
                locale: v.locale,
            })
            .collect())
    }
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

type EventSender = futures_channel::mpsc::UnboundedSender<Result<EngineEvent, EngineError>>;

/// Forward frames from the socket into the event channel until `turn.end`.
///
/// A closed socket before `turn.end` is an incomplete stream and surfaces as
/// a stream error — partial delivery is never treated as success. If the
/// receiver is gone (caller disconnected), the pump just stops.
async fn pump(mut ws: WsStream, tx: EventSender) {
    while let Some(frame) = ws.next().await {
        let frame = match frame {
            Ok(f) => f,
            Err(e) => {
                let _ = tx.unbounded_send(Err(EngineError::Stream(e.to_string())));
                return;
            }
        };

        match frame {
            Message::Text(text) => match text_frame_path(&text) {
                Some("turn.end") => {
                    debug!("edge: turn.end");
                    let _ = ws.close(None).await;
                    return;
                }
                Some("audio.metadata") => {
                    let events = match parse_metadata(frame_body(&text)) {
                        Ok(events) => events,
                        Err(e) => {
                            let _ = tx.unbounded_send(Err(e));
                            return;
                        }
                    };
                    for event in events {
                        if tx.unbounded_send(Ok(event)).is_err() {
                            return;
                        }
                    }
                }
                // turn.start, response — markers only
                Some(_) => {}
                None => {
                    let _ = tx.unbounded_send(Err(EngineError::Protocol(
                        "text frame without Path header".into(),
                    )));
                    return;
                }
            },
            Message::Binary(payload) => match binary_frame_audio(&payload) {
                Ok(audio) => {
                    if !audio.is_empty()
                        && tx
                            .unbounded_send(Ok(EngineEvent::Audio(audio.to_vec())))
                            .is_err()
                    {
                        return;
                    }
                }
                Err(e) => {
                    let _ = tx.unbounded_send(Err(e));
                    return;
                }
            },
            Message::Close(_) => {
                let _ = tx.unbounded_send(Err(EngineError::Stream(
                    "engine closed before turn.end".into(),
                )));
                return;
            }
            other => warn!("edge: ignoring unexpected frame: {other:?}"),
        }
    }

    // Socket ended without turn.end
    let _ = tx.unbounded_send(Err(EngineError::Stream(
        "engine stream ended before turn.end".into(),
    )));
}

// ─── Frame construction ───────────────────────────────────────────────────

fn connection_id() -> String {
    format!("{:016x}{:016x}", rand::random::<u64>(), rand::random::<u64>())
}

fn timestamp() -> String {
    chrono::Utc::now()
        .format("%a %b %d %Y %H:%M:%S GMT+0000 (Coordinated Universal Time)")
        .to_string()
}

fn speech_config(with_boundaries: bool) -> String {
    let word_boundary = if with_boundaries { "true" } else { "false" };
    format!(
        "X-Timestamp:{}\r\nContent-Type:application/json; charset=utf-8\r\nPath:speech.config\r\n\r\n\
         {{\"context\":{{\"synthesis\":{{\"audio\":{{\"metadataoptions\":{{\
         \"sentenceBoundaryEnabled\":\"false\",\"wordBoundaryEnabled\":\"{word_boundary}\"}},\
         \"outputFormat\":\"{OUTPUT_FORMAT}\"}}}}}}}}",
        timestamp()
    )
}

fn ssml_request(request_id: &str, text: &str, voice: &str) -> String {
    format!(
        "X-RequestId:{request_id}\r\nContent-Type:application/ssml+xml\r\n\
         X-Timestamp:{}\r\nPath:ssml\r\n\r\n\
         <speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='en-US'>\
         <voice name='{voice}'>\
         <prosody pitch='+0Hz' rate='+0%' volume='+0%'>{}</prosody>\
         </voice></speak>",
        timestamp(),
        escape_xml(text)
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// ─── Frame parsing ────────────────────────────────────────────────────────

/// Value of the `Path:` header in a text frame.
fn text_frame_path(frame: &str) -> Option<&str> {
    let headers = frame.split("\r\n\r\n").next().unwrap_or("");
    headers
        .lines()
        .find_map(|line| line.strip_prefix("Path:"))
        .map(str::trim)
}

/// Body of a text frame (everything after the blank line).
fn frame_body(frame: &str) -> &str {
    frame
        .split_once("\r\n\r\n")
        .map(|(_, body)| body)
        .unwrap_or("")
}

/// Extract the audio payload from a binary frame.
///
/// Layout: 2-byte big-endian header length, ASCII headers (must contain
/// `Path:audio`), then the raw MP3 payload.
fn binary_frame_audio(frame: &[u8]) -> Result<&[u8], EngineError> {
    if frame.len() < 2 {
        return Err(EngineError::Protocol("binary frame shorter than 2 bytes".into()));
    }
    let header_len = u16::from_be_bytes([frame[0], frame[1]]) as usize;
    let payload_start = 2 + header_len;
    if frame.len() < payload_start {
        return Err(EngineError::Protocol(
            "binary frame shorter than its declared header".into(),
        ));
    }
    let headers = String::from_utf8_lossy(&frame[2..payload_start]);
    if !headers.contains("Path:audio") {
        return Err(EngineError::Protocol(
            "binary frame without Path:audio header".into(),
        ));
    }
    Ok(&frame[payload_start..])
}

#[derive(Deserialize)]
struct MetadataFrame {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<MetadataEntry>,
}

/// One metadata entry, dispatched on its `Type` tag. Entries the service
/// does not consume (`SessionEnd` carries only an `Offset`) must still
/// deserialize, so everything but `WordBoundary` falls into the ignore arm.
#[derive(Deserialize)]
#[serde(tag = "Type", content = "Data")]
enum MetadataEntry {
    WordBoundary(BoundaryData),
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct BoundaryData {
    #[serde(rename = "Offset")]
    offset: u64,
    #[serde(rename = "Duration")]
    duration: u64,
    #[serde(rename = "text")]
    text: BoundaryText,
}

#[derive(Deserialize)]
struct BoundaryText {
    #[serde(rename = "Text")]
    text: String,
}

/// Word-boundary events from an `audio.metadata` body, ticks passed through.
fn parse_metadata(body: &str) -> Result<Vec<EngineEvent>, EngineError> {
    let frame: MetadataFrame = serde_json::from_str(body)
        .map_err(|e| EngineError::Protocol(format!("bad audio.metadata frame: {e}")))?;

    Ok(frame
        .metadata
        .into_iter()
        .filter_map(|entry| match entry {
            MetadataEntry::WordBoundary(data) => Some(EngineEvent::WordBoundary {
                text: data.text.text,
                offset_ticks: data.offset,
                duration_ticks: data.duration,
            }),
            MetadataEntry::Other => None,
        })
        .collect())
}

/// One entry from the voices/list catalog.
#[derive(Deserialize)]
struct EdgeVoice {
    #[serde(rename = "ShortName")]
    short_name: String,
    #[serde(rename = "FriendlyName")]
    friendly_name: String,
    #[serde(rename = "Gender")]
    gender: String,
    #[serde(rename = "Locale")]
    locale: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_frame_path_is_extracted() {
        let frame = "X-RequestId:abc\r\nPath:turn.end\r\n\r\n{}";
        assert_eq!(text_frame_path(frame), Some("turn.end"));
    }

    #[test]
    fn text_frame_without_path_is_none() {
        assert_eq!(text_frame_path("X-RequestId:abc\r\n\r\n{}"), None);
    }

    #[test]
    fn frame_body_follows_blank_line() {
        let frame = "Path:audio.metadata\r\n\r\n{\"Metadata\":[]}";
        assert_eq!(frame_body(frame), "{\"Metadata\":[]}");
    }

    #[test]
    fn binary_frame_payload_follows_headers() {
        let headers = b"Path:audio\r\n";
        let mut frame = (headers.len() as u16).to_be_bytes().to_vec();
        frame.extend_from_slice(headers);
        frame.extend_from_slice(&[0x01, 0x02, 0x03]);
        assert_eq!(binary_frame_audio(&frame).unwrap(), &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn binary_frame_without_audio_path_is_rejected() {
        let headers = b"Path:other\r\n";
        let mut frame = (headers.len() as u16).to_be_bytes().to_vec();
        frame.extend_from_slice(headers);
        assert!(binary_frame_audio(&frame).is_err());
    }

    #[test]
    fn truncated_binary_frame_is_rejected() {
        assert!(binary_frame_audio(&[0x00]).is_err());
        assert!(binary_frame_audio(&[0x00, 0xFF, 0x01]).is_err());
    }

    #[test]
    fn metadata_yields_word_boundaries_with_raw_ticks() {
        let body = r#"{"Metadata":[{"Type":"WordBoundary","Data":{"Offset":1000000,"Duration":4250000,"text":{"Text":"Hello","Length":5,"BoundaryType":"WordBoundary"}}}]}"#;
        let events = parse_metadata(body).unwrap();
        assert_eq!(
            events,
            vec![EngineEvent::WordBoundary {
                text: "Hello".into(),
                offset_ticks: 1_000_000,
                duration_ticks: 4_250_000,
            }]
        );
    }

    #[test]
    fn session_end_metadata_is_skipped_despite_missing_fields() {
        // SessionEnd entries carry only an Offset, never Duration or text
        let body = r#"{"Metadata":[{"Type":"SessionEnd","Data":{"Offset":96500000}}]}"#;
        assert!(parse_metadata(body).unwrap().is_empty());
    }

    #[test]
    fn word_boundaries_survive_alongside_session_end() {
        let body = r#"{"Metadata":[
            {"Type":"WordBoundary","Data":{"Offset":1000000,"Duration":4250000,"text":{"Text":"Hello"}}},
            {"Type":"SessionEnd","Data":{"Offset":96500000}}
        ]}"#;
        let events = parse_metadata(body).unwrap();
        assert_eq!(
            events,
            vec![EngineEvent::WordBoundary {
                text: "Hello".into(),
                offset_ticks: 1_000_000,
                duration_ticks: 4_250_000,
            }]
        );
    }

    #[test]
    fn malformed_metadata_is_a_protocol_error() {
        assert!(matches!(
            parse_metadata("not json"),
            Err(EngineError::Protocol(_))
        ));
    }

    #[test]
    fn ssml_escapes_reserved_characters() {
        let ssml = ssml_request("id", "a < b & c", "en-US-GuyNeural");
        assert!(ssml.contains("a &lt; b &amp; c"));
        assert!(ssml.contains("<voice name='en-US-GuyNeural'>"));
    }

    #[test]
    fn speech_config_toggles_word_boundaries() {
        assert!(speech_config(true).contains("\"wordBoundaryEnabled\":\"true\""));
        assert!(speech_config(false).contains("\"wordBoundaryEnabled\":\"false\""));
        assert!(speech_config(false).contains(OUTPUT_FORMAT));
    }

    #[test]
    fn connection_ids_are_32_hex_chars() {
        let id = connection_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
