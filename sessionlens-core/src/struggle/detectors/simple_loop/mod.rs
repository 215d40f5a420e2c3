//! Simple Loop Detector
//!
//! Flags runs of consecutive tool calls with the same name and byte-for-byte
//! identical input. Re-running `ls` three times in a row rarely means
//! anything new is being learned.
//!
//! ## Example
//!
//! ```text
//! #0 Bash {"command":"ls"}
//! #1 Bash {"command":"ls"}
//! #2 Bash {"command":"ls"}      -> simple_loop, count = 3, indices 0..=2
//! #3 Read {"file_path":"a.rs"}
//! ```
//!
//! Runs of at least twice the minimum are reported as errors.

use crate::config::DetectorConfig;
use crate::struggle::engine::StruggleDetector;
use crate::struggle::pattern::{Detection, Severity, StruggleKind};
use crate::types::{Session, ToolOperation};

pub struct SimpleLoopDetector {
    min_repeats: usize,
}

impl SimpleLoopDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            min_repeats: config.simple_loop_min_repeats.max(2),
        }
    }

    fn same_call(a: &ToolOperation, b: &ToolOperation) -> bool {
        a.name == b.name && a.input == b.input
    }

    fn finding(&self, run: &[ToolOperation]) -> Detection {
        let first = &run[0];
        let count = run.len();
        let severity = if count >= self.min_repeats * 2 {
            Severity::Error
        } else {
            Severity::Warning
        };
        Detection::new(
            StruggleKind::SimpleLoop {
                tool_name: first.name.clone(),
                input: first.input.clone(),
                count,
                start_index: first.index,
                end_index: run[count - 1].index,
            },
            severity,
            0.6 + 0.1 * (count - self.min_repeats) as f64,
        )
    }
}

impl StruggleDetector for SimpleLoopDetector {
    fn name(&self) -> &str {
        "simple_loop"
    }

    fn detect(&self, session: &Session) -> Vec<Detection> {
        let ops = &session.tool_operations;
        let mut detections = Vec::new();
        let mut start = 0;

        while start < ops.len() {
            let mut end = start + 1;
            while end < ops.len() && Self::same_call(&ops[start], &ops[end]) {
                end += 1;
            }
            if end - start >= self.min_repeats {
                detections.push(self.finding(&ops[start..end]));
            }
            start = end;
        }

        detections
    }
}
