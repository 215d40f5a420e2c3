//! Context Switching Detector
//!
//! Flags sessions that bounce between files far more often than the number
//! of files involved would require. Only operations that name a file are
//! considered; a switch is a change of file between two consecutive such
//! operations.
//!
//! Working through five files in turn gives 4 switches over 5 files. Hopping
//! between the same three files twelve times gives 12 switches over 3 files,
//! which is flagged.

use crate::config::DetectorConfig;
use crate::struggle::engine::StruggleDetector;
use crate::struggle::pattern::{Detection, Severity, StruggleKind};
use crate::types::Session;
use std::collections::HashSet;

pub struct ContextSwitchingDetector {
    min_switches: usize,
    min_switches_per_file: f64,
}

impl ContextSwitchingDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            min_switches: config.context_switch_min_switches.max(1),
            min_switches_per_file: config.context_switch_switches_per_file,
        }
    }
}

impl StruggleDetector for ContextSwitchingDetector {
    fn name(&self) -> &str {
        "context_switching"
    }

    fn detect(&self, session: &Session) -> Vec<Detection> {
        let targets: Vec<(usize, &str)> = session
            .tool_operations
            .iter()
            .filter_map(|o| o.file_target().map(|f| (o.index, f)))
            .collect();
        if targets.len() < 2 {
            return Vec::new();
        }

        let unique: HashSet<&str> = targets.iter().map(|(_, f)| *f).collect();
        let mut switches = 0;
        let mut first_switch = None;
        for pair in targets.windows(2) {
            if pair[0].1 != pair[1].1 {
                switches += 1;
                first_switch.get_or_insert(pair[0].0);
            }
        }

        let switches_per_file = switches as f64 / unique.len() as f64;
        if switches < self.min_switches || switches_per_file < self.min_switches_per_file {
            return Vec::new();
        }

        let switch_rate = switches as f64 / (targets.len() - 1) as f64;
        vec![Detection::new(
            StruggleKind::ContextSwitching {
                switches,
                unique_files: unique.len(),
                switch_rate,
                switches_per_file,
                first_index: first_switch.unwrap_or(targets[0].0),
            },
            Severity::Warning,
            switch_rate,
        )]
    }
}
