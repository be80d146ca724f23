//! Word-boundary timing — tick conversion and utterance duration.
//!
//! The engine reports word timings in 100-nanosecond ticks. Clients get
//! milliseconds, converted by exact integer floor division.

use serde::{Deserialize, Serialize};

/// Ticks per millisecond (one tick = 100 ns).
const TICKS_PER_MS: u64 = 10_000;

/// One word-timing marker, normalized to milliseconds.
///
/// Serialized camelCase (`offsetMs`, `durationMs`) — the field names are part
/// of the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordBoundary {
    pub text: String,
    pub offset_ms: u64,
    pub duration_ms: u64,
}

impl WordBoundary {
    /// Build a boundary from raw engine ticks.
    pub fn from_ticks(text: impl Into<String>, offset_ticks: u64, duration_ticks: u64) -> Self {
        Self {
            text: text.into(),
            offset_ms: offset_ticks / TICKS_PER_MS,
            duration_ms: duration_ticks / TICKS_PER_MS,
        }
    }
}

/// Total utterance duration: end of the last boundary in emission order,
/// or 0 when no boundaries were produced. Total over any input.
pub fn total_duration_ms(boundaries: &[WordBoundary]) -> u64 {
    boundaries
        .last()
        .map(|b| b.offset_ms + b.duration_ms)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_convert_by_floor_division() {
        let b = WordBoundary::from_ticks("hi", 50_000, 19_999);
        assert_eq!(b.offset_ms, 5);
        assert_eq!(b.duration_ms, 1); // floor, not round
    }

    #[test]
    fn exact_multiples_convert_exactly() {
        let b = WordBoundary::from_ticks("word", 1_230_000, 450_000);
        assert_eq!(b.offset_ms, 123);
        assert_eq!(b.duration_ms, 45);
    }

    #[test]
    fn zero_ticks_are_zero_ms() {
        let b = WordBoundary::from_ticks("", 0, 0);
        assert_eq!((b.offset_ms, b.duration_ms), (0, 0));
    }

    #[test]
    fn total_duration_of_empty_sequence_is_zero() {
        assert_eq!(total_duration_ms(&[]), 0);
    }

    #[test]
    fn total_duration_comes_from_last_boundary() {
        let bounds = vec![
            WordBoundary::from_ticks("hello", 0, 500_000),
            WordBoundary::from_ticks("world", 600_000, 700_000),
        ];
        // 60 + 70, regardless of earlier entries
        assert_eq!(total_duration_ms(&bounds), 130);
    }

    #[test]
    fn serializes_camel_case() {
        let b = WordBoundary::from_ticks("Hi", 0, 50_000);
        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"text": "Hi", "offsetMs": 0, "durationMs": 5})
        );
    }
}
