//! Reading Spiral Detector
//!
//! Flags stretches where read/search operations far outnumber actions: the
//! assistant keeps looking around without changing anything.
//!
//! A window of `reading_spiral_window` operations slides across the session.
//! A window is flagged when `reads > ratio * max(actions, 1)`. Overlapping or
//! adjacent flagged windows merge into one finding, with counts taken over the
//! merged range. Tools that are neither reads nor actions (e.g. `TodoWrite`)
//! count toward the window size only.

use super::{is_action_tool, is_read_tool};
use crate::config::DetectorConfig;
use crate::struggle::engine::StruggleDetector;
use crate::struggle::pattern::{Detection, Severity, StruggleKind};
use crate::types::{Session, ToolOperation};

pub struct ReadingSpiralDetector {
    window: usize,
    ratio: f64,
}

impl ReadingSpiralDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            window: config.reading_spiral_window.max(2),
            ratio: config.reading_spiral_ratio,
        }
    }

    fn counts(ops: &[ToolOperation]) -> (usize, usize) {
        let reads = ops.iter().filter(|o| is_read_tool(&o.name)).count();
        let actions = ops.iter().filter(|o| is_action_tool(&o.name)).count();
        (reads, actions)
    }

    fn is_spiral(&self, reads: usize, actions: usize) -> bool {
        reads as f64 > self.ratio * actions.max(1) as f64
    }
}

impl StruggleDetector for ReadingSpiralDetector {
    fn name(&self) -> &str {
        "reading_spiral"
    }

    fn detect(&self, session: &Session) -> Vec<Detection> {
        let ops = &session.tool_operations;
        if ops.len() < self.window {
            return Vec::new();
        }

        // Half-open ranges of merged flagged windows
        let mut ranges: Vec<(usize, usize)> = Vec::new();
        for start in 0..=ops.len() - self.window {
            let end = start + self.window;
            let (reads, actions) = Self::counts(&ops[start..end]);
            if !self.is_spiral(reads, actions) {
                continue;
            }
            match ranges.last_mut() {
                Some(last) if start <= last.1 => last.1 = end,
                _ => ranges.push((start, end)),
            }
        }

        ranges
            .into_iter()
            .map(|(start, end)| {
                let (reads, actions) = Self::counts(&ops[start..end]);
                let ratio = reads as f64 / actions.max(1) as f64;
                Detection::new(
                    StruggleKind::ReadingSpiral {
                        read_count: reads,
                        action_count: actions,
                        ratio,
                        start_index: ops[start].index,
                        end_index: ops[end - 1].index,
                    },
                    Severity::Warning,
                    (ratio / (self.ratio * 2.0)).min(1.0),
                )
            })
            .collect()
    }
}
