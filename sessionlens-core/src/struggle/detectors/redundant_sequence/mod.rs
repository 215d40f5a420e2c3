//! Redundant Sequence Detector
//!
//! Flags two kinds of wasted work:
//!
//! - **read → edit → read** of the same file. A successful edit already
//!   returns the new content, so reading the file straight back adds nothing.
//!   A shell command in between (a build, a formatter, a test run) may have
//!   changed the file and resets tracking. So does a failed edit.
//! - **duplicate command**: the same shell command run again with no
//!   successful file edit since the previous run.

use super::{is_edit_tool, is_read_tool, is_shell_tool};
use crate::struggle::engine::StruggleDetector;
use crate::struggle::pattern::{Detection, Redundancy, Severity, StruggleKind};
use crate::types::Session;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
enum FileState {
    Read { read: usize },
    Edited { read: usize, edit: usize },
}

pub struct RedundantSequenceDetector;

impl RedundantSequenceDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RedundantSequenceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl StruggleDetector for RedundantSequenceDetector {
    fn name(&self) -> &str {
        "redundant_sequence"
    }

    fn detect(&self, session: &Session) -> Vec<Detection> {
        let mut detections = Vec::new();
        let mut files: HashMap<String, FileState> = HashMap::new();
        let mut commands: HashMap<String, usize> = HashMap::new();

        for op in &session.tool_operations {
            if is_shell_tool(&op.name) {
                files.clear();
                let Some(command) = op.command().map(str::trim).filter(|c| !c.is_empty()) else {
                    continue;
                };
                if let Some(prev) = commands.insert(command.to_string(), op.index) {
                    detections.push(Detection::new(
                        StruggleKind::RedundantSequence {
                            redundancy: Redundancy::DuplicateCommand {
                                command: command.to_string(),
                            },
                            indices: vec![prev, op.index],
                        },
                        Severity::Info,
                        0.6,
                    ));
                }
                continue;
            }

            if is_edit_tool(&op.name) {
                if op.is_error() {
                    files.clear();
                    continue;
                }
                // Any successful edit justifies rerunning a command
                commands.clear();
            }

            let Some(file) = op.file_target() else {
                continue;
            };

            if is_edit_tool(&op.name) {
                match files.get(file).copied() {
                    Some(FileState::Read { read }) | Some(FileState::Edited { read, .. }) => {
                        files.insert(
                            file.to_string(),
                            FileState::Edited {
                                read,
                                edit: op.index,
                            },
                        );
                    }
                    None => {}
                }
            } else if is_read_tool(&op.name) {
                if let Some(FileState::Edited { read, edit }) = files.get(file).copied() {
                    detections.push(Detection::new(
                        StruggleKind::RedundantSequence {
                            redundancy: Redundancy::ReadEditRead {
                                file: file.to_string(),
                            },
                            indices: vec![read, edit, op.index],
                        },
                        Severity::Info,
                        0.7,
                    ));
                }
                files.insert(file.to_string(), FileState::Read { read: op.index });
            }
        }

        detections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::struggle::testing::{op, op_at, session_with_ops};
    use serde_json::json;

    fn read(path: &str) -> crate::types::ToolOperation {
        op("Read", json!({"file_path": path}))
    }

    fn edit(path: &str) -> crate::types::ToolOperation {
        op("Edit", json!({"file_path": path, "old_string": "a", "new_string": "b"}))
    }

    fn bash(command: &str) -> crate::types::ToolOperation {
        op("Bash", json!({"command": command}))
    }

    #[test]
    fn test_read_edit_read_flagged() {
        let session = session_with_ops(vec![read("src/a.rs"), edit("src/a.rs"), read("src/a.rs")]);
        let found = RedundantSequenceDetector::new().detect(&session);

        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].kind,
            StruggleKind::RedundantSequence {
                redundancy: Redundancy::ReadEditRead {
                    file: "src/a.rs".to_string()
                },
                indices: vec![0, 1, 2],
            }
        );
        assert_eq!(found[0].severity, Severity::Info);
    }

    #[test]
    fn test_shell_command_justifies_reread() {
        let session = session_with_ops(vec![
            read("src/a.rs"),
            edit("src/a.rs"),
            bash("cargo fmt"),
            read("src/a.rs"),
        ]);
        assert!(RedundantSequenceDetector::new().detect(&session).is_empty());
    }

    #[test]
    fn test_failed_edit_justifies_reread() {
        let failed = op_at(
            "Edit",
            json!({"file_path": "src/a.rs"}),
            "old_string not found",
            true,
            0,
        );
        let session = session_with_ops(vec![read("src/a.rs"), failed, read("src/a.rs")]);
        assert!(RedundantSequenceDetector::new().detect(&session).is_empty());
    }

    #[test]
    fn test_other_file_not_flagged() {
        let session = session_with_ops(vec![read("src/a.rs"), edit("src/a.rs"), read("src/b.rs")]);
        assert!(RedundantSequenceDetector::new().detect(&session).is_empty());
    }

    #[test]
    fn test_duplicate_command_without_change() {
        let session = session_with_ops(vec![
            bash("cargo test"),
            read("src/a.rs"),
            bash("cargo test"),
        ]);
        let found = RedundantSequenceDetector::new().detect(&session);

        assert_eq!(found.len(), 1);
        match &found[0].kind {
            StruggleKind::RedundantSequence {
                redundancy: Redundancy::DuplicateCommand { command },
                indices,
            } => {
                assert_eq!(command, "cargo test");
                assert_eq!(indices, &vec![0, 2]);
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_edit_between_commands_is_progress() {
        let session = session_with_ops(vec![
            bash("cargo test"),
            edit("src/a.rs"),
            bash("cargo test"),
        ]);
        assert!(RedundantSequenceDetector::new().detect(&session).is_empty());
    }

    #[test]
    fn test_edit_without_file_target_is_progress() {
        // MultiEdit payloads recorded without a path still change the tree
        let session = session_with_ops(vec![
            bash("npm test"),
            op("MultiEdit", json!({"edits": [{"old_string": "a", "new_string": "b"}]})),
            bash("npm test"),
        ]);
        assert!(RedundantSequenceDetector::new().detect(&session).is_empty());
    }
}
