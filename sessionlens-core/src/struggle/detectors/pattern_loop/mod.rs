//! Pattern Loop Detector
//!
//! Flags a short sequence of tool names that repeats back to back, e.g.
//! `Edit -> Bash -> Edit -> Bash -> Edit -> Bash`. That shape usually means
//! an edit/test cycle that isn't converging.
//!
//! Shorter sequences are tried first. Operations already covered by a
//! finding are not reused by a longer one, so `A B A B A B` is reported once
//! as `[A, B] x 3` rather than again as `[A, B, A, B]`. Sequences made of a
//! single repeated tool are left to the simple loop detector.

use crate::config::DetectorConfig;
use crate::struggle::engine::StruggleDetector;
use crate::struggle::pattern::{Detection, Severity, StruggleKind};
use crate::types::Session;

pub struct PatternLoopDetector {
    max_length: usize,
    min_repetitions: usize,
}

impl PatternLoopDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            max_length: config.pattern_loop_max_length.max(2),
            min_repetitions: config.pattern_loop_min_repetitions.max(2),
        }
    }

    /// Number of consecutive copies of `names[start..start + len]` beginning at `start`.
    fn repetitions_at(names: &[&str], start: usize, len: usize) -> usize {
        let unit = &names[start..start + len];
        let mut reps = 1;
        let mut next = start + len;
        while next + len <= names.len() && &names[next..next + len] == unit {
            reps += 1;
            next += len;
        }
        reps
    }
}

impl StruggleDetector for PatternLoopDetector {
    fn name(&self) -> &str {
        "pattern_loop"
    }

    fn detect(&self, session: &Session) -> Vec<Detection> {
        let ops = &session.tool_operations;
        let names: Vec<&str> = ops.iter().map(|o| o.name.as_str()).collect();
        let mut covered = vec![false; names.len()];
        let mut detections = Vec::new();

        for len in 2..=self.max_length {
            let mut start = 0;
            while start + len * self.min_repetitions <= names.len() {
                let unit = &names[start..start + len];
                if covered[start] || unit.iter().all(|n| *n == unit[0]) {
                    start += 1;
                    continue;
                }

                let reps = Self::repetitions_at(&names, start, len);
                let end = start + reps * len;
                if reps < self.min_repetitions || covered[start..end].iter().any(|c| *c) {
                    start += 1;
                    continue;
                }

                covered[start..end].iter_mut().for_each(|c| *c = true);
                detections.push(Detection::new(
                    StruggleKind::PatternLoop {
                        sequence: unit.iter().map(|n| n.to_string()).collect(),
                        repetitions: reps,
                        start_index: ops[start].index,
                        end_index: ops[end - 1].index,
                    },
                    Severity::Warning,
                    0.5 + 0.1 * reps as f64,
                ));
                start = end;
            }
        }

        detections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::struggle::testing::{op, session_with_ops};
    use serde_json::json;

    fn detector() -> PatternLoopDetector {
        PatternLoopDetector::new(&DetectorConfig::default())
    }

    fn session_of(names: &[&str]) -> Session {
        session_with_ops(names.iter().map(|n| op(n, json!({}))).collect())
    }

    #[test]
    fn test_edit_bash_cycle() {
        let session = session_of(&["Read", "Edit", "Bash", "Edit", "Bash", "Edit", "Bash"]);
        let found = detector().detect(&session);

        assert_eq!(found.len(), 1);
        match &found[0].kind {
            StruggleKind::PatternLoop {
                sequence,
                repetitions,
                start_index,
                end_index,
            } => {
                assert_eq!(sequence, &vec!["Edit".to_string(), "Bash".to_string()]);
                assert_eq!(*repetitions, 3);
                assert_eq!(*start_index, 1);
                assert_eq!(*end_index, 6);
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_single_occurrence_not_flagged() {
        let session = session_of(&["Read", "Edit", "Bash", "Grep"]);
        assert!(detector().detect(&session).is_empty());
    }

    #[test]
    fn test_same_tool_run_left_to_simple_loop() {
        let session = session_of(&["Bash", "Bash", "Bash", "Bash"]);
        assert!(detector().detect(&session).is_empty());
    }

    #[test]
    fn test_three_step_cycle() {
        let session = session_of(&["Read", "Edit", "Bash", "Read", "Edit", "Bash"]);
        let found = detector().detect(&session);
        assert_eq!(found.len(), 1);
        match &found[0].kind {
            StruggleKind::PatternLoop { sequence, .. } => assert_eq!(sequence.len(), 3),
            other => panic!("unexpected kind: {:?}", other),
        }
    }
}
