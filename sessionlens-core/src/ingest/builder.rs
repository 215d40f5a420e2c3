//! Session construction
//!
//! Turns the records of one log file into a [`Session`]:
//!
//! - user and assistant records become [`ConversationEntry`]s in source order
//! - each `tool_use` is held in a pending map until a later `tool_result`
//!   with the same id arrives, which emits a [`ToolOperation`]
//! - intent context is captured when the `tool_use` is seen, from the
//!   entries *before* the assistant message that issued it
//! - counts, raw duration and the break-aware active duration are filled in
//!
//! `tool_use` items that never receive a result are dropped. Results without
//! a matching `tool_use` are reported as a data-quality issue.

use super::project::resolve_project_name;
use super::reader::{read_log, ParsedLog, RecordType};
use crate::config::{Config, DurationConfig, SessionConfig};
use crate::duration::calculate_active_duration;
use crate::error::Result;
use crate::intent::{IntentClassifier, IntentRules};
use crate::types::{
    Content, ContextMetadata, ConversationEntry, Role, Session, ToolOperation, ToolStatus,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// A `tool_use` waiting for its result.
struct PendingTool {
    name: String,
    input: serde_json::Value,
    timestamp: Option<DateTime<Utc>>,
    context: ContextMetadata,
}

/// Builds sessions from log files.
pub struct SessionBuilder {
    session: SessionConfig,
    duration: DurationConfig,
    classifier: IntentClassifier,
}

impl SessionBuilder {
    /// Create a builder, compiling the intent rule tables from `config`.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            session: config.session.clone(),
            duration: config.duration.clone(),
            classifier: IntentClassifier::new(&IntentRules::from_config(&config.rules))?,
        })
    }

    /// Read a log file and build its session.
    ///
    /// Returns `Ok(None)` when the file holds no parseable records.
    pub fn build_from_file(&self, path: &Path) -> Result<Option<Session>> {
        let parsed = read_log(path)?;
        for warning in &parsed.warnings {
            tracing::debug!(path = %path.display(), warning = %warning, "Skipped log line");
        }
        Ok(self.build(path, &parsed))
    }

    /// Build a session from already-parsed records.
    pub fn build(&self, path: &Path, parsed: &ParsedLog) -> Option<Session> {
        if parsed.records.is_empty() {
            return None;
        }

        let mut conversation: Vec<ConversationEntry> = Vec::new();
        let mut tool_operations: Vec<ToolOperation> = Vec::new();
        let mut pending: HashMap<String, PendingTool> = HashMap::new();
        let mut unmatched_results = 0usize;

        for record in &parsed.records {
            let role = match record.record_type {
                RecordType::User => Role::User,
                RecordType::Assistant => Role::Assistant,
                RecordType::Summary | RecordType::Other => continue,
            };

            for item in &record.content {
                match item {
                    Content::ToolUse { id, name, input } if role == Role::Assistant => {
                        let start = conversation.len().saturating_sub(self.session.context_window);
                        let window = conversation[start..].to_vec();
                        let initiation_type = self.classifier.classify(name, &window);
                        pending.insert(
                            id.clone(),
                            PendingTool {
                                name: name.clone(),
                                input: input.clone(),
                                timestamp: record.timestamp,
                                context: ContextMetadata {
                                    initiation_type,
                                    preceding_window: window,
                                },
                            },
                        );
                    }
                    Content::ToolResult {
                        tool_use_id,
                        content,
                        is_error,
                    } => match pending.remove(tool_use_id) {
                        Some(tool) => tool_operations.push(ToolOperation {
                            index: tool_operations.len(),
                            tool_use_id: tool_use_id.clone(),
                            name: tool.name,
                            input: tool.input,
                            output: content.clone(),
                            status: ToolStatus::from_is_error(*is_error),
                            timestamp: tool.timestamp,
                            completed_at: record.timestamp,
                            context: tool.context,
                        }),
                        None => unmatched_results += 1,
                    },
                    _ => {}
                }
            }

            conversation.push(ConversationEntry {
                index: conversation.len(),
                role,
                timestamp: record.timestamp,
                content: record.content.clone(),
            });
        }

        if !pending.is_empty() {
            tracing::debug!(
                path = %path.display(),
                dropped = pending.len(),
                "Dropped tool uses without results"
            );
        }

        let mut issues = Vec::new();
        if unmatched_results > 0 {
            issues.push(format!(
                "{} tool results without a matching tool use",
                unmatched_results
            ));
        }

        let session = self.assemble(path, parsed, conversation, tool_operations, issues);

        tracing::info!(
            path = %path.display(),
            session_id = %session.session_id,
            entries = session.conversation.len(),
            tool_operations = session.tool_operations.len(),
            corrupted_lines = session.corrupted_lines,
            "Built session"
        );

        Some(session)
    }

    fn assemble(
        &self,
        path: &Path,
        parsed: &ParsedLog,
        conversation: Vec<ConversationEntry>,
        tool_operations: Vec<ToolOperation>,
        mut issues: Vec<String>,
    ) -> Session {
        let timestamps: Vec<DateTime<Utc>> =
            conversation.iter().filter_map(|e| e.timestamp).collect();
        let missing = conversation.len() - timestamps.len();
        if missing > 0 {
            issues.push(format!("{} entries missing timestamps", missing));
        }

        let start_time = timestamps.iter().min().copied();
        let end_time = timestamps.iter().max().copied();
        let duration_seconds = match (start_time, end_time) {
            (Some(start), Some(end)) => (end - start).num_seconds(),
            _ => 0,
        };

        if !conversation.is_empty() && timestamps.len() < 2 {
            issues.push("fewer than 2 timestamped entries; duration unavailable".to_string());
        }

        let (active_duration_seconds, duration_analysis) =
            match calculate_active_duration(&conversation, &self.duration) {
                Ok(analysis) => (
                    analysis.active_duration_seconds.min(duration_seconds),
                    Some(analysis),
                ),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Active duration failed");
                    issues.push(format!("active duration calculation failed: {}", e));
                    (duration_seconds, None)
                }
            };

        let mut tool_usage = BTreeMap::new();
        for op in &tool_operations {
            *tool_usage.entry(op.name.clone()).or_insert(0) += 1;
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown");

        let mut session = Session {
            session_id: session_id(stem, start_time),
            project_name: resolve_project_name(path, parsed, self.session.project_probe_records),
            source_path: path.to_path_buf(),
            start_time,
            end_time,
            duration_seconds,
            active_duration_seconds,
            duration_analysis,
            user_message_count: conversation.iter().filter(|e| e.role == Role::User).count(),
            assistant_message_count: conversation
                .iter()
                .filter(|e| e.role == Role::Assistant)
                .count(),
            human_prompt_count: conversation.iter().filter(|e| e.is_human_prompt()).count(),
            error_count: tool_operations.iter().filter(|o| o.is_error()).count(),
            entry_count: parsed.records.len(),
            conversation,
            tool_operations,
            tool_usage,
            corrupted_lines: parsed.corrupted_lines,
            data_quality_issues: issues,
            is_self_generated: false,
            has_struggle: false,
            struggle_indicators: vec![],
        };
        session.is_self_generated = self.is_self_generated(&session);
        session
    }

    /// Whether the first human prompt matches a known programmatic-analysis signature.
    pub fn is_self_generated(&self, session: &Session) -> bool {
        let Some(first) = session.first_user_text() else {
            return false;
        };
        let lowered = first.to_lowercase();
        self.session
            .self_generated_signatures
            .iter()
            .any(|sig| !sig.is_empty() && lowered.contains(&sig.to_lowercase()))
    }
}

/// Session id from the start time and the full file stem.
///
/// The whole stem is kept so sibling logs started in the same second
/// (`agent-1a2b..`, `agent-3c4d..`) stay distinct.
fn session_id(stem: &str, start_time: Option<DateTime<Utc>>) -> String {
    match start_time {
        Some(start) => format!("session-{}-{}", start.format("%Y%m%d-%H%M%S"), stem),
        None => format!("session-{}", stem),
    }
}
