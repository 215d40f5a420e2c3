//! Shotgun Debugging Detector
//!
//! Flags bursts where many different tools are fired in quick succession,
//! the signature of undirected trial and error.
//!
//! For each timestamped operation a window of `shotgun_window_minutes` is
//! opened. The window is flagged when it holds at least
//! `shotgun_min_unique_tools` distinct tools and its velocity
//! (`calls / max(span_minutes, 1)`) reaches `shotgun_min_tools_per_minute`.
//! Scanning resumes after the flagged window so bursts are not reported
//! twice. Operations without a timestamp are skipped.

use crate::config::DetectorConfig;
use crate::struggle::engine::StruggleDetector;
use crate::struggle::pattern::{Detection, Severity, StruggleKind};
use crate::types::{Session, ToolOperation};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;

pub struct ShotgunDebuggingDetector {
    window: Duration,
    min_unique_tools: usize,
    min_tools_per_minute: f64,
}

impl ShotgunDebuggingDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        // Negative or NaN windows collapse to zero
        let minutes = config.shotgun_window_minutes.max(0.0);
        Self {
            window: Duration::milliseconds((minutes * 60_000.0) as i64),
            min_unique_tools: config.shotgun_min_unique_tools.max(2),
            min_tools_per_minute: config.shotgun_min_tools_per_minute,
        }
    }
}

impl StruggleDetector for ShotgunDebuggingDetector {
    fn name(&self) -> &str {
        "shotgun_debugging"
    }

    fn detect(&self, session: &Session) -> Vec<Detection> {
        let timed: Vec<(&ToolOperation, DateTime<Utc>)> = session
            .tool_operations
            .iter()
            .filter_map(|o| o.timestamp.map(|ts| (o, ts)))
            .collect();

        let mut detections = Vec::new();
        let mut start = 0;

        while start < timed.len() {
            let window_start = timed[start].1;
            let mut end = start;
            while end < timed.len() && timed[end].1 - window_start <= self.window {
                end += 1;
            }
            // The opening operation always belongs to its own window
            let end = end.max(start + 1);

            let burst = &timed[start..end];
            let unique: BTreeSet<&str> = burst.iter().map(|(o, _)| o.name.as_str()).collect();
            let span_minutes =
                (burst[burst.len() - 1].1 - window_start).num_milliseconds() as f64 / 60_000.0;
            let tools_per_minute = burst.len() as f64 / span_minutes.max(1.0);

            if unique.len() >= self.min_unique_tools && tools_per_minute >= self.min_tools_per_minute
            {
                detections.push(Detection::new(
                    StruggleKind::ShotgunDebugging {
                        tool_count: burst.len(),
                        unique_tools: unique.iter().map(|s| s.to_string()).collect(),
                        tools_per_minute,
                        start_index: burst[0].0.index,
                        end_index: burst[burst.len() - 1].0.index,
                    },
                    Severity::Warning,
                    0.5 + 0.05 * (unique.len() - self.min_unique_tools) as f64,
                ));
                start = end;
            } else {
                start += 1;
            }
        }

        detections
    }
}
