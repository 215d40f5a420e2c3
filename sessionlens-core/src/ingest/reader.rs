//! Line-delimited JSON log reader
//!
//! Reads an assistant conversation log one line at a time and normalizes each
//! record's message content into [`Content`] items.
//!
//! # Error Handling
//!
//! The reader never aborts on bad data:
//!
//! - **Malformed lines** (invalid JSON, non-object values, invalid UTF-8, or
//!   records whose known fields have the wrong shape) are counted in
//!   [`ParsedLog::corrupted_lines`], noted in [`ParsedLog::warnings`], and skipped.
//! - **Missing fields** fall back to defaults via `#[serde(default)]`.
//! - **Unknown content blocks** (images, thinking blocks) are dropped.
//! - **Unknown record types** are kept as [`RecordType::Other`] so callers can
//!   count them without treating them as conversation.
//!
//! Only failing to open or read the file itself is an error.

use crate::error::{Error, Result};
use crate::types::Content;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Kind of a log record, from its `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    User,
    Assistant,
    Summary,
    Other,
}

impl RecordType {
    fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some("user") => RecordType::User,
            Some("assistant") => RecordType::Assistant,
            Some("summary") => RecordType::Summary,
            _ => RecordType::Other,
        }
    }
}

/// One successfully parsed log line.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// 1-based line number in the source file
    pub line: usize,
    pub record_type: RecordType,
    pub timestamp: Option<DateTime<Utc>>,
    pub cwd: Option<String>,
    pub content: Vec<Content>,
}

/// Everything read from one log file.
#[derive(Debug, Default)]
pub struct ParsedLog {
    /// Records in source order
    pub records: Vec<LogRecord>,
    /// Non-blank lines that could not be parsed
    pub corrupted_lines: usize,
    pub warnings: Vec<String>,
}

impl ParsedLog {
    /// Whether every record is a summary (and there is at least one).
    pub fn is_summary_only(&self) -> bool {
        !self.records.is_empty()
            && self
                .records
                .iter()
                .all(|r| r.record_type == RecordType::Summary)
    }
}

// ============================================
// Raw wire shapes
// ============================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawRecord {
    #[serde(rename = "type")]
    record_type: Option<String>,
    timestamp: Option<String>,
    cwd: Option<String>,
    message: Option<RawMessage>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawMessage {
    content: Option<RawContent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: serde_json::Value,
        #[serde(default)]
        is_error: bool,
    },
    #[serde(other)]
    Unknown,
}

impl RawContent {
    fn normalize(self) -> Vec<Content> {
        match self {
            RawContent::Text(text) => vec![Content::Text { text }],
            RawContent::Blocks(blocks) => blocks
                .into_iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(Content::Text { text }),
                    ContentBlock::ToolUse { id, name, input } => {
                        Some(Content::ToolUse { id, name, input })
                    }
                    ContentBlock::ToolResult {
                        tool_use_id,
                        content,
                        is_error,
                    } => Some(Content::ToolResult {
                        tool_use_id,
                        content: flatten_tool_result(&content),
                        is_error,
                    }),
                    ContentBlock::Unknown => None,
                })
                .collect(),
        }
    }
}

/// Tool result payloads arrive as a string or a list of text blocks.
fn flatten_tool_result(content: &serde_json::Value) -> String {
    match content {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s.as_str()),
                other => other.get("text").and_then(|t| t.as_str()),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ============================================
// Reading
// ============================================

/// Read and normalize a log file.
pub fn read_log(path: &Path) -> Result<ParsedLog> {
    let unreadable = |e: Error| Error::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let file = File::open(path).map_err(|e| unreadable(e.into()))?;
    let parsed = read_records(BufReader::new(file)).map_err(unreadable)?;

    tracing::debug!(
        path = %path.display(),
        records = parsed.records.len(),
        corrupted = parsed.corrupted_lines,
        "Read log file"
    );

    Ok(parsed)
}

/// Read records from any buffered source.
pub fn read_records<R: BufRead>(reader: R) -> Result<ParsedLog> {
    let mut parsed = ParsedLog::default();

    for (i, line_result) in reader.split(b'\n').enumerate() {
        let line_number = i + 1;
        let bytes = line_result?;

        let line = match String::from_utf8(bytes) {
            Ok(l) => l,
            Err(_) => {
                parsed.corrupted_lines += 1;
                parsed
                    .warnings
                    .push(format!("Line {}: invalid UTF-8", line_number));
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match parse_line(&line, line_number) {
            Ok(record) => parsed.records.push(record),
            Err(message) => {
                parsed.corrupted_lines += 1;
                parsed
                    .warnings
                    .push(format!("Line {}: {}", line_number, message));
            }
        }
    }

    Ok(parsed)
}

fn parse_line(line: &str, line_number: usize) -> std::result::Result<LogRecord, String> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|e| format!("JSON parse error: {}", e))?;
    if !value.is_object() {
        return Err("not a JSON object".to_string());
    }

    let raw: RawRecord =
        serde_json::from_value(value).map_err(|e| format!("deserialization error: {}", e))?;

    let content = raw
        .message
        .and_then(|m| m.content)
        .map(RawContent::normalize)
        .unwrap_or_default();

    Ok(LogRecord {
        line: line_number,
        record_type: RecordType::from_raw(raw.record_type.as_deref()),
        timestamp: raw.timestamp.as_deref().and_then(parse_timestamp),
        cwd: raw.cwd.filter(|c| !c.is_empty()),
        content,
    })
}
