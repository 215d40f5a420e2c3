//! Error Streak Detector
//!
//! Flags consecutive failed invocations of the same tool. A successful call
//! or a call to a different tool ends the streak.

use super::preview;
use crate::config::DetectorConfig;
use crate::struggle::engine::StruggleDetector;
use crate::struggle::pattern::{Detection, Severity, StruggleKind};
use crate::types::{Session, ToolOperation};

/// Characters of the final error message kept as evidence.
const ERROR_PREVIEW_CHARS: usize = 200;

pub struct ErrorStreakDetector {
    min_errors: usize,
}

impl ErrorStreakDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            min_errors: config.error_streak_min.max(2),
        }
    }

    fn finding(&self, streak: &[ToolOperation]) -> Detection {
        let first = &streak[0];
        let last = &streak[streak.len() - 1];
        Detection::new(
            StruggleKind::ErrorStreak {
                tool_name: first.name.clone(),
                count: streak.len(),
                start_index: first.index,
                end_index: last.index,
                last_error: preview(&last.output, ERROR_PREVIEW_CHARS),
            },
            Severity::Error,
            0.7 + 0.05 * (streak.len() - self.min_errors) as f64,
        )
    }
}

impl StruggleDetector for ErrorStreakDetector {
    fn name(&self) -> &str {
        "error_streak"
    }

    fn detect(&self, session: &Session) -> Vec<Detection> {
        let ops = &session.tool_operations;
        let mut detections = Vec::new();
        let mut start = 0;

        while start < ops.len() {
            if !ops[start].is_error() {
                start += 1;
                continue;
            }
            let mut end = start + 1;
            while end < ops.len() && ops[end].is_error() && ops[end].name == ops[start].name {
                end += 1;
            }
            if end - start >= self.min_errors {
                detections.push(self.finding(&ops[start..end]));
            }
            start = end;
        }

        detections
    }
}
