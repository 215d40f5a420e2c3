//! Core domain types for sessionlens
//!
//! These types describe a normalized conversation log: the entries of one
//! session, the tool operations correlated from it, and the derived duration
//! analysis.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Session** | One normalized conversation built from a single log file |
//! | **Entry** | One user or assistant record in the conversation, in source order |
//! | **Content** | A typed item inside an entry: text, tool use, or tool result |
//! | **ToolOperation** | A tool use paired with its result |
//! | **Active duration** | Wall-clock span minus excluded breaks |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

// ============================================
// Conversation content
// ============================================

/// Author of a conversation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("unknown role: {}", s)),
        }
    }
}

/// One typed content item.
///
/// Plain-string message content normalizes to a single [`Content::Text`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
    },
}

/// A user or assistant record, in source order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    /// Position within the session's conversation
    pub index: usize,
    pub role: Role,
    /// `None` when the record carried no parseable timestamp
    pub timestamp: Option<DateTime<Utc>>,
    pub content: Vec<Content>,
}

impl ConversationEntry {
    /// Concatenated text items, newline separated.
    pub fn text(&self) -> String {
        let parts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|c| match c {
                Content::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        parts.join("\n")
    }

    /// Text items plus tool result payloads.
    pub fn searchable_text(&self) -> String {
        let parts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|c| match c {
                Content::Text { text } => Some(text.as_str()),
                Content::ToolResult { content, .. } => Some(content.as_str()),
                Content::ToolUse { .. } => None,
            })
            .collect();
        parts.join("\n")
    }

    /// Whether this entry carries any non-empty text item.
    pub fn has_text(&self) -> bool {
        self.content
            .iter()
            .any(|c| matches!(c, Content::Text { text } if !text.trim().is_empty()))
    }

    /// Whether this is a user entry written by a person rather than a tool-result carrier.
    pub fn is_human_prompt(&self) -> bool {
        self.role == Role::User && self.has_text()
    }
}

// ============================================
// Tool operations
// ============================================

/// Outcome of a tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Success,
    Error,
}

impl ToolStatus {
    pub fn from_is_error(is_error: bool) -> Self {
        if is_error {
            ToolStatus::Error
        } else {
            ToolStatus::Success
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolStatus::Success => "success",
            ToolStatus::Error => "error",
        }
    }
}

/// Why a tool was likely invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitiationType {
    /// The preceding user message explicitly asked for this kind of tool
    UserDirected,
    /// The user gave high-level guidance and the assistant chose the tool
    GuidedAutonomous,
    /// No user prompt motivates the call
    FullyAutonomous,
}

impl InitiationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InitiationType::UserDirected => "user_directed",
            InitiationType::GuidedAutonomous => "guided_autonomous",
            InitiationType::FullyAutonomous => "fully_autonomous",
        }
    }
}

impl std::fmt::Display for InitiationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification result plus the conversation window it was derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextMetadata {
    pub initiation_type: InitiationType,
    /// Entries preceding the tool's triggering message, oldest first
    pub preceding_window: Vec<ConversationEntry>,
}

/// One tool use paired with its result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOperation {
    /// Position within the session's tool operations
    pub index: usize,
    pub tool_use_id: String,
    pub name: String,
    pub input: serde_json::Value,
    pub output: String,
    pub status: ToolStatus,
    /// Timestamp of the entry that issued the tool use
    pub timestamp: Option<DateTime<Utc>>,
    /// Timestamp of the entry carrying the result
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(rename = "_context_metadata")]
    pub context: ContextMetadata,
}

impl ToolOperation {
    pub fn is_error(&self) -> bool {
        self.status == ToolStatus::Error
    }

    /// File path the operation targets, if the input names one.
    pub fn file_target(&self) -> Option<&str> {
        ["file_path", "filePath", "notebook_path", "path"]
            .iter()
            .find_map(|key| self.input.get(*key).and_then(|v| v.as_str()))
            .filter(|s| !s.is_empty())
    }

    /// Shell command for Bash-like tools.
    pub fn command(&self) -> Option<&str> {
        self.input.get("command").and_then(|v| v.as_str())
    }
}

// ============================================
// Duration analysis
// ============================================

/// A contiguous stretch of activity with no gap above the limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSegment {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_seconds: i64,
    pub message_count: usize,
}

/// A gap excluded from active time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedGap {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: f64,
    pub reason: String,
}

/// Heuristic trust label for an active-duration estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

/// Break-aware duration estimate for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationAnalysis {
    pub active_duration_seconds: i64,
    pub active_segments: Vec<ActiveSegment>,
    pub excluded_gaps: Vec<ExcludedGap>,
    pub confidence: Confidence,
    /// Diagnostic values: entry counts, ratio, parameters, downgrade reasons
    pub metadata: serde_json::Value,
}

// ============================================
// Sessions
// ============================================

/// One normalized conversation built from a single log file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub project_name: String,
    pub source_path: PathBuf,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Raw span between the first and last timestamp
    pub duration_seconds: i64,
    /// Break-aware span; never exceeds `duration_seconds`
    pub active_duration_seconds: i64,
    pub duration_analysis: Option<DurationAnalysis>,
    pub conversation: Vec<ConversationEntry>,
    pub tool_operations: Vec<ToolOperation>,
    /// All parsed records, including summaries
    pub entry_count: usize,
    pub user_message_count: usize,
    pub assistant_message_count: usize,
    /// User entries that carry text (not only tool results)
    pub human_prompt_count: usize,
    /// Tool name -> number of operations
    pub tool_usage: BTreeMap<String, usize>,
    pub error_count: usize,
    /// Lines that were not valid JSON objects
    pub corrupted_lines: usize,
    pub data_quality_issues: Vec<String>,
    pub is_self_generated: bool,
    pub has_struggle: bool,
    pub struggle_indicators: Vec<String>,
}

impl Session {
    /// Text of the first user entry that carries text.
    pub fn first_user_text(&self) -> Option<String> {
        self.conversation
            .iter()
            .find(|e| e.is_human_prompt())
            .map(|e| e.text())
    }

    /// Minutes of raw wall-clock span.
    pub fn duration_minutes(&self) -> f64 {
        self.duration_seconds as f64 / 60.0
    }
}
