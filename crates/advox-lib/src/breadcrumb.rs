//! Breadcrumb trail — structured checkpoint logging for request tracing.
//!
//! Every request lights a fixed sequence of numbered crumbs (4300-4399 is the
//! TTS range) so a failed request can be located by its last lit checkpoint.
//! Crumbs go to `tracing` and, optionally, to an append-only log file.

use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{error, info};

// Checkpoint ids, kept stable across services.
pub const CRUMB_REQUEST_START: u16 = 4300;
pub const CRUMB_TEXT_TRUNCATED: u16 = 4301;
pub const CRUMB_ENGINE_CALL_START: u16 = 4302;
pub const CRUMB_AUDIO_GENERATED: u16 = 4303;
pub const CRUMB_BOUNDARIES_CAPTURED: u16 = 4304;
pub const CRUMB_WITH_BOUNDARIES_START: u16 = 4305;
pub const CRUMB_WITH_BOUNDARIES_SUCCESS: u16 = 4306;
pub const CRUMB_REQUEST_ERROR: u16 = 4390;
pub const CRUMB_ENGINE_ERROR: u16 = 4391;

/// Observability sink the request handlers report checkpoints to.
///
/// Storage and retention are the implementation's business; the handlers only
/// promise to call it at the defined checkpoints and on every failure path.
pub trait Breadcrumb: Send + Sync {
    /// Record a successful checkpoint with structured context.
    fn light(&self, id: u16, event: &str, context: serde_json::Value);

    /// Record a failed checkpoint.
    fn fail(&self, id: u16, error: &dyn Display);
}

/// Production trail: logs through `tracing`, optionally appends one line per
/// crumb to a log file. File-write failures are logged and swallowed — the
/// trail must never take down a request.
pub struct Trail {
    component: &'static str,
    log_file: Option<PathBuf>,
}

impl Trail {
    pub fn new(component: &'static str, log_file: Option<PathBuf>) -> Self {
        Self {
            component,
            log_file,
        }
    }

    fn append_line(&self, line: &str) {
        let Some(path) = &self.log_file else {
            return;
        };
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| writeln!(f, "{line}"));
        if let Err(e) = result {
            error!("breadcrumb: failed to append to {}: {e}", path.display());
        }
    }

    fn timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

impl Breadcrumb for Trail {
    fn light(&self, id: u16, event: &str, context: serde_json::Value) {
        info!(crumb = id, event, %context, "{}.{event}", self.component);
        self.append_line(&format!(
            "[{}] CRUMB-{id} ok {}.{event} | {context}",
            Self::timestamp(),
            self.component
        ));
    }

    fn fail(&self, id: u16, error: &dyn Display) {
        error!(crumb = id, "{} | ERROR: {error}", self.component);
        self.append_line(&format!(
            "[{}] CRUMB-{id} FAIL {} | ERROR: {error}",
            Self::timestamp(),
            self.component
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trail_without_file_is_silent() {
        let trail = Trail::new("Test", None);
        trail.light(CRUMB_REQUEST_START, "request", serde_json::json!({}));
        trail.fail(CRUMB_REQUEST_ERROR, &"boom");
    }

    #[test]
    fn trail_appends_one_line_per_crumb() {
        let dir = std::env::temp_dir().join(format!("advox-crumb-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("trail.log");

        let trail = Trail::new("Test", Some(path.clone()));
        trail.light(CRUMB_REQUEST_START, "start", serde_json::json!({"n": 1}));
        trail.fail(CRUMB_ENGINE_ERROR, &"engine down");

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("CRUMB-4300"));
        assert!(lines[0].contains("Test.start"));
        assert!(lines[1].contains("CRUMB-4391"));
        assert!(lines[1].contains("engine down"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
