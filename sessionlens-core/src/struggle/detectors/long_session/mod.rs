//! Long Session Detector
//!
//! Flags sessions whose raw wall-clock span exceeds a threshold (four hours
//! by default). Informational only: a long session is not a failure, but it
//! is context for the other findings.

use crate::config::DetectorConfig;
use crate::struggle::engine::StruggleDetector;
use crate::struggle::pattern::{Detection, Severity, StruggleKind};
use crate::types::Session;

pub struct LongSessionDetector {
    threshold_seconds: i64,
}

impl LongSessionDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            threshold_seconds: config.long_session_threshold_seconds,
        }
    }
}

impl StruggleDetector for LongSessionDetector {
    fn name(&self) -> &str {
        "long_session"
    }

    fn detect(&self, session: &Session) -> Vec<Detection> {
        if session.duration_seconds <= self.threshold_seconds {
            return Vec::new();
        }
        vec![Detection::new(
            StruggleKind::LongSession {
                duration_seconds: session.duration_seconds,
                active_duration_seconds: session.active_duration_seconds,
                threshold_seconds: self.threshold_seconds,
            },
            Severity::Info,
            1.0,
        )]
    }
}
