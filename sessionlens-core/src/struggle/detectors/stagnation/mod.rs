//! Stagnation Detector
//!
//! Flags consecutive calls to the same tool that keep producing byte-identical
//! output. Inputs may differ: trying three variations of a test command and
//! getting the same failure each time is still no progress.
//!
//! Empty outputs are ignored; many tools legitimately return nothing.

use super::preview;
use crate::config::DetectorConfig;
use crate::struggle::engine::StruggleDetector;
use crate::struggle::pattern::{Detection, Severity, StruggleKind};
use crate::types::{Session, ToolOperation};

const OUTPUT_PREVIEW_CHARS: usize = 120;

pub struct StagnationDetector {
    min_repeats: usize,
}

impl StagnationDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            min_repeats: config.stagnation_min_repeats.max(2),
        }
    }

    fn same_result(a: &ToolOperation, b: &ToolOperation) -> bool {
        a.name == b.name && a.output == b.output
    }
}

impl StruggleDetector for StagnationDetector {
    fn name(&self) -> &str {
        "stagnation"
    }

    fn detect(&self, session: &Session) -> Vec<Detection> {
        let ops = &session.tool_operations;
        let mut detections = Vec::new();
        let mut start = 0;

        while start < ops.len() {
            if ops[start].output.trim().is_empty() {
                start += 1;
                continue;
            }
            let mut end = start + 1;
            while end < ops.len() && Self::same_result(&ops[start], &ops[end]) {
                end += 1;
            }
            let count = end - start;
            if count >= self.min_repeats {
                detections.push(Detection::new(
                    StruggleKind::Stagnation {
                        tool_name: ops[start].name.clone(),
                        count,
                        start_index: ops[start].index,
                        end_index: ops[end - 1].index,
                        output_preview: preview(&ops[start].output, OUTPUT_PREVIEW_CHARS),
                    },
                    Severity::Warning,
                    0.6 + 0.1 * (count - self.min_repeats) as f64,
                ));
            }
            start = end;
        }

        detections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::struggle::testing::{op_at, session_with_ops};
    use serde_json::json;

    fn detector() -> StagnationDetector {
        StagnationDetector::new(&DetectorConfig::default())
    }

    fn bash(command: &str, output: &str) -> ToolOperation {
        op_at("Bash", json!({"command": command}), output, false, 0)
    }

    #[test]
    fn test_identical_output_with_varied_input() {
        let session = session_with_ops(vec![
            bash("cargo test", "test result: FAILED. 1 failed"),
            bash("cargo test -- --nocapture", "test result: FAILED. 1 failed"),
            bash("cargo test foo", "test result: FAILED. 1 failed"),
        ]);
        let found = detector().detect(&session);

        assert_eq!(found.len(), 1);
        match &found[0].kind {
            StruggleKind::Stagnation {
                count,
                output_preview,
                ..
            } => {
                assert_eq!(*count, 3);
                assert_eq!(output_preview, "test result: FAILED. 1 failed");
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_changing_output_not_flagged() {
        let session = session_with_ops(vec![
            bash("cargo test", "3 failed"),
            bash("cargo test", "2 failed"),
            bash("cargo test", "1 failed"),
        ]);
        assert!(detector().detect(&session).is_empty());
    }

    #[test]
    fn test_empty_output_ignored() {
        let session = session_with_ops(vec![bash("true", ""), bash("true", ""), bash("true", "")]);
        assert!(detector().detect(&session).is_empty());
    }
}
