//! Built-in struggle detectors
//!
//! Each detector lives in its own subdirectory.
//!
//! | Detector | Severity | Signal |
//! |----------|----------|--------|
//! | [`simple_loop`] | warning/error | same tool, same input, back to back |
//! | [`pattern_loop`] | warning | a short sequence of tools repeating |
//! | [`error_streak`] | error | one tool failing repeatedly |
//! | [`stagnation`] | warning | one tool returning identical output |
//! | [`reading_spiral`] | warning | reads far outnumber actions |
//! | [`shotgun_debugging`] | warning | many different tools in quick succession |
//! | [`redundant_sequence`] | info | re-reading an edited file, re-running a command |
//! | [`context_switching`] | warning | bouncing between files |
//! | [`long_session`] | info | raw span above a threshold |
//!
//! Use [`create_default_engine`] to get an engine with every detector that
//! is not disabled in the config.

pub mod context_switching;
pub mod error_streak;
pub mod long_session;
pub mod pattern_loop;
pub mod reading_spiral;
pub mod redundant_sequence;
pub mod shotgun_debugging;
pub mod simple_loop;
pub mod stagnation;

use super::engine::{StruggleDetector, StruggleEngine};
use crate::config::DetectorConfig;

/// Tools that only gather information.
pub(crate) const READ_TOOLS: &[&str] = &[
    "Read",
    "Grep",
    "Glob",
    "LS",
    "WebFetch",
    "WebSearch",
    "NotebookRead",
];

/// Tools that change files or run commands.
pub(crate) const ACTION_TOOLS: &[&str] = &["Edit", "Write", "MultiEdit", "NotebookEdit", "Bash"];

/// Tools that modify a file in place.
pub(crate) const EDIT_TOOLS: &[&str] = &["Edit", "Write", "MultiEdit", "NotebookEdit"];

pub(crate) fn is_read_tool(name: &str) -> bool {
    READ_TOOLS.iter().any(|t| t.eq_ignore_ascii_case(name))
}

pub(crate) fn is_action_tool(name: &str) -> bool {
    ACTION_TOOLS.iter().any(|t| t.eq_ignore_ascii_case(name))
}

pub(crate) fn is_edit_tool(name: &str) -> bool {
    EDIT_TOOLS.iter().any(|t| t.eq_ignore_ascii_case(name))
}

pub(crate) fn is_shell_tool(name: &str) -> bool {
    name.eq_ignore_ascii_case("Bash")
}

/// First `max_chars` characters of `text`, with an ellipsis when cut.
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

/// Create an engine with every built-in detector not listed in `config.disabled`.
///
/// ```rust,ignore
/// use sessionlens_core::struggle::create_default_engine;
///
/// let engine = create_default_engine(&config.detectors);
/// println!("Registered detectors: {:?}", engine.detector_names());
/// ```
pub fn create_default_engine(config: &DetectorConfig) -> StruggleEngine {
    let all: Vec<Box<dyn StruggleDetector>> = vec![
        Box::new(simple_loop::SimpleLoopDetector::new(config)),
        Box::new(pattern_loop::PatternLoopDetector::new(config)),
        Box::new(error_streak::ErrorStreakDetector::new(config)),
        Box::new(stagnation::StagnationDetector::new(config)),
        Box::new(reading_spiral::ReadingSpiralDetector::new(config)),
        Box::new(shotgun_debugging::ShotgunDebuggingDetector::new(config)),
        Box::new(redundant_sequence::RedundantSequenceDetector::new()),
        Box::new(context_switching::ContextSwitchingDetector::new(config)),
        Box::new(long_session::LongSessionDetector::new(config)),
    ];

    let mut engine = StruggleEngine::new();
    for detector in all {
        if config.is_disabled(detector.name()) {
            tracing::debug!(detector = detector.name(), "Detector disabled by config");
            continue;
        }
        engine.register(detector);
    }
    engine
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_has_all_detectors() {
        let engine = create_default_engine(&DetectorConfig::default());
        let names = engine.detector_names();

        assert_eq!(names.len(), 9);
        for expected in [
            "simple_loop",
            "pattern_loop",
            "error_streak",
            "stagnation",
            "reading_spiral",
            "shotgun_debugging",
            "redundant_sequence",
            "context_switching",
            "long_session",
        ] {
            assert!(engine.has_detector(expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_disabled_detectors_are_skipped() {
        let config = DetectorConfig {
            disabled: vec!["long_session".to_string()],
            ..Default::default()
        };
        let engine = create_default_engine(&config);
        assert!(!engine.has_detector("long_session"));
        assert_eq!(engine.detector_names().len(), 8);
    }

    #[test]
    fn test_tool_categories() {
        assert!(is_read_tool("Grep"));
        assert!(!is_read_tool("Edit"));
        assert!(is_action_tool("Bash"));
        assert!(is_edit_tool("MultiEdit"));
        assert!(!is_edit_tool("Bash"));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("  short  ", 10), "short");
        assert_eq!(preview("héllo wörld", 5), "héllo...");
    }
}
