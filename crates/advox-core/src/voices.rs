//! Advisor → engine voice registry.
//!
//! Built once at startup from a fixed table, never mutated, read concurrently
//! by every request. Both short ids (`zen`) and canonical ids (`zen-master`)
//! are first-class keys and may collide on the same underlying voice.

use std::collections::HashMap;

/// Voice used when a request names no advisor and no explicit voice.
pub const DEFAULT_VOICE: &str = "en-US-GuyNeural";

/// Hard cap on synthesized text. Longer input is clamped, not rejected.
pub const MAX_TEXT_LENGTH: usize = 5000;

/// Advisor id → engine voice parameter, in presentation order.
const ADVISOR_VOICES: &[(&str, &str)] = &[
    // Short ids
    ("zen", "en-US-GuyNeural"),
    ("business", "en-US-ChristopherNeural"),
    ("researcher", "en-US-JennyNeural"),
    ("organizer", "en-US-AriaNeural"),
    ("team", "en-US-GuyNeural"),
    // Canonical ids used by the app
    ("zen-master", "en-US-GuyNeural"),
    ("business-advisor", "en-US-ChristopherNeural"),
    ("risk-analyst", "en-US-DavisNeural"),
    ("image-advisor", "en-US-JennyNeural"),
    ("app-help", "en-US-AriaNeural"),
];

/// Immutable advisor → voice lookup.
#[derive(Debug, Clone)]
pub struct VoiceRegistry {
    by_id: HashMap<&'static str, &'static str>,
}

impl Default for VoiceRegistry {
    fn default() -> Self {
        Self {
            by_id: ADVISOR_VOICES.iter().copied().collect(),
        }
    }
}

impl VoiceRegistry {
    /// Resolve an advisor id to its engine voice parameter.
    pub fn resolve(&self, id: &str) -> Option<&'static str> {
        self.by_id.get(id).copied()
    }

    /// All advisor ids, in table order.
    pub fn advisor_ids(&self) -> Vec<&'static str> {
        ADVISOR_VOICES.iter().map(|(id, _)| *id).collect()
    }

    /// All advisor → voice pairs, in table order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &'static str)> {
        ADVISOR_VOICES.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_short_and_canonical_ids() {
        let reg = VoiceRegistry::default();
        assert_eq!(reg.resolve("zen"), Some("en-US-GuyNeural"));
        assert_eq!(reg.resolve("zen-master"), Some("en-US-GuyNeural"));
        assert_eq!(reg.resolve("risk-analyst"), Some("en-US-DavisNeural"));
    }

    #[test]
    fn unknown_id_is_none() {
        let reg = VoiceRegistry::default();
        assert_eq!(reg.resolve("not-a-real-advisor"), None);
        assert_eq!(reg.resolve(""), None);
    }

    #[test]
    fn every_registered_id_has_a_nonempty_voice() {
        let reg = VoiceRegistry::default();
        for id in reg.advisor_ids() {
            let voice = reg.resolve(id).unwrap();
            assert!(!voice.is_empty(), "advisor {id} maps to empty voice");
        }
    }

    #[test]
    fn advisor_ids_preserve_table_order() {
        let reg = VoiceRegistry::default();
        let ids = reg.advisor_ids();
        assert_eq!(ids.first(), Some(&"zen"));
        assert_eq!(ids.last(), Some(&"app-help"));
        assert_eq!(ids.len(), 10);
    }
}
