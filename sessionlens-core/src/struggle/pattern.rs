//! Struggle pattern findings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How loudly a finding should be surfaced.
///
/// Ordered `Info < Warning < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// What a redundant-sequence finding repeated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Redundancy {
    /// A file was read, edited, then read again with nothing in between to justify it
    ReadEditRead { file: String },
    /// The same shell command ran again with no file change in between
    DuplicateCommand { command: String },
}

/// The nine kinds of struggle signal, with kind-specific evidence.
///
/// Indices refer to [`ToolOperation::index`](crate::types::ToolOperation::index).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StruggleKind {
    SimpleLoop {
        tool_name: String,
        input: serde_json::Value,
        count: usize,
        start_index: usize,
        end_index: usize,
    },
    PatternLoop {
        sequence: Vec<String>,
        repetitions: usize,
        start_index: usize,
        end_index: usize,
    },
    ErrorStreak {
        tool_name: String,
        count: usize,
        start_index: usize,
        end_index: usize,
        last_error: String,
    },
    Stagnation {
        tool_name: String,
        count: usize,
        start_index: usize,
        end_index: usize,
        output_preview: String,
    },
    ReadingSpiral {
        read_count: usize,
        action_count: usize,
        ratio: f64,
        start_index: usize,
        end_index: usize,
    },
    ShotgunDebugging {
        tool_count: usize,
        unique_tools: Vec<String>,
        tools_per_minute: f64,
        start_index: usize,
        end_index: usize,
    },
    RedundantSequence {
        redundancy: Redundancy,
        indices: Vec<usize>,
    },
    ContextSwitching {
        switches: usize,
        unique_files: usize,
        switch_rate: f64,
        switches_per_file: f64,
        first_index: usize,
    },
    LongSession {
        duration_seconds: i64,
        active_duration_seconds: i64,
        threshold_seconds: i64,
    },
}

impl StruggleKind {
    /// Stable snake_case name of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            StruggleKind::SimpleLoop { .. } => "simple_loop",
            StruggleKind::PatternLoop { .. } => "pattern_loop",
            StruggleKind::ErrorStreak { .. } => "error_streak",
            StruggleKind::Stagnation { .. } => "stagnation",
            StruggleKind::ReadingSpiral { .. } => "reading_spiral",
            StruggleKind::ShotgunDebugging { .. } => "shotgun_debugging",
            StruggleKind::RedundantSequence { .. } => "redundant_sequence",
            StruggleKind::ContextSwitching { .. } => "context_switching",
            StruggleKind::LongSession { .. } => "long_session",
        }
    }

    /// First tool operation the finding touches; `None` for session-level findings.
    pub fn first_index(&self) -> Option<usize> {
        match self {
            StruggleKind::SimpleLoop { start_index, .. }
            | StruggleKind::PatternLoop { start_index, .. }
            | StruggleKind::ErrorStreak { start_index, .. }
            | StruggleKind::Stagnation { start_index, .. }
            | StruggleKind::ReadingSpiral { start_index, .. }
            | StruggleKind::ShotgunDebugging { start_index, .. } => Some(*start_index),
            StruggleKind::RedundantSequence { indices, .. } => indices.iter().min().copied(),
            StruggleKind::ContextSwitching { first_index, .. } => Some(*first_index),
            StruggleKind::LongSession { .. } => None,
        }
    }

    /// One-line human-readable summary.
    pub fn describe(&self) -> String {
        match self {
            StruggleKind::SimpleLoop {
                tool_name, count, ..
            } => format!("{} called {} times in a row with identical input", tool_name, count),
            StruggleKind::PatternLoop {
                sequence,
                repetitions,
                ..
            } => format!(
                "sequence [{}] repeated {} times",
                sequence.join(" -> "),
                repetitions
            ),
            StruggleKind::ErrorStreak {
                tool_name, count, ..
            } => format!("{} failed {} times in a row", tool_name, count),
            StruggleKind::Stagnation {
                tool_name, count, ..
            } => format!("{} returned identical output {} times", tool_name, count),
            StruggleKind::ReadingSpiral {
                read_count,
                action_count,
                ..
            } => format!(
                "{} read/search operations against {} actions",
                read_count, action_count
            ),
            StruggleKind::ShotgunDebugging {
                tool_count,
                unique_tools,
                tools_per_minute,
                ..
            } => format!(
                "{} calls across {} tools at {:.1}/min",
                tool_count,
                unique_tools.len(),
                tools_per_minute
            ),
            StruggleKind::RedundantSequence { redundancy, .. } => match redundancy {
                Redundancy::ReadEditRead { file } => {
                    format!("re-read {} right after editing it", file)
                }
                Redundancy::DuplicateCommand { command } => {
                    format!("re-ran `{}` with no change in between", command)
                }
            },
            StruggleKind::ContextSwitching {
                switches,
                unique_files,
                ..
            } => format!("{} switches between {} files", switches, unique_files),
            StruggleKind::LongSession {
                duration_seconds, ..
            } => format!("session ran {:.1} hours", *duration_seconds as f64 / 3600.0),
        }
    }
}

/// Where a finding came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub session_id: String,
    pub detector: String,
    pub detected_at: DateTime<Utc>,
    /// Detector's confidence in the finding, 0.0 to 1.0
    pub confidence: f64,
}

/// A detector's raw output before provenance is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub kind: StruggleKind,
    pub severity: Severity,
    pub confidence: f64,
}

impl Detection {
    pub fn new(kind: StruggleKind, severity: Severity, confidence: f64) -> Self {
        Self {
            kind,
            severity,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// A struggle finding with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrugglePattern {
    #[serde(flatten)]
    pub kind: StruggleKind,
    pub severity: Severity,
    #[serde(rename = "_provenance")]
    pub provenance: Provenance,
}

impl StrugglePattern {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}
