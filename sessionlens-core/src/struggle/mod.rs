//! Struggle detection
//!
//! Nine independent detectors look for friction in a finished session:
//! repeated calls, failing streaks, unproductive reading, and so on. Each
//! detector lives in its own subdirectory under [`detectors`].

pub mod detectors;
mod engine;
mod pattern;

pub use detectors::create_default_engine;
pub use engine::{sort_for_annotation, StruggleDetector, StruggleEngine};
pub use pattern::{Detection, Provenance, Redundancy, Severity, StruggleKind, StrugglePattern};

#[cfg(test)]
pub(crate) mod testing {
    //! Session builders shared by detector tests.

    use crate::types::{
        ContextMetadata, InitiationType, Session, ToolOperation, ToolStatus,
    };
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use serde_json::Value;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    pub fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    /// Operation issued `seconds` after [`base_time`].
    pub fn op_at(name: &str, input: Value, output: &str, is_error: bool, seconds: i64) -> ToolOperation {
        let ts = base_time() + Duration::seconds(seconds);
        ToolOperation {
            index: 0,
            tool_use_id: String::new(),
            name: name.to_string(),
            input,
            output: output.to_string(),
            status: ToolStatus::from_is_error(is_error),
            timestamp: Some(ts),
            completed_at: Some(ts),
            context: ContextMetadata {
                initiation_type: InitiationType::FullyAutonomous,
                preceding_window: vec![],
            },
        }
    }

    pub fn op(name: &str, input: Value) -> ToolOperation {
        op_at(name, input, "", false, 0)
    }

    /// A session holding `ops`, renumbered in order.
    pub fn session_with_ops(ops: Vec<ToolOperation>) -> Session {
        let tool_operations: Vec<ToolOperation> = ops
            .into_iter()
            .enumerate()
            .map(|(i, mut op)| {
                op.index = i;
                op.tool_use_id = format!("toolu_{}", i);
                op
            })
            .collect();

        let mut tool_usage = BTreeMap::new();
        for op in &tool_operations {
            *tool_usage.entry(op.name.clone()).or_insert(0) += 1;
        }

        Session {
            session_id: "session-test".to_string(),
            project_name: "test".to_string(),
            source_path: PathBuf::from("test.jsonl"),
            start_time: Some(base_time()),
            end_time: Some(base_time()),
            duration_seconds: 0,
            active_duration_seconds: 0,
            duration_analysis: None,
            conversation: vec![],
            error_count: tool_operations.iter().filter(|o| o.is_error()).count(),
            tool_operations,
            entry_count: 0,
            user_message_count: 0,
            assistant_message_count: 0,
            human_prompt_count: 0,
            tool_usage,
            corrupted_lines: 0,
            data_quality_issues: vec![],
            is_self_generated: false,
            has_struggle: false,
            struggle_indicators: vec![],
        }
    }
}
