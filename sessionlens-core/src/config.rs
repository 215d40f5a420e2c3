//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/sessionlens/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/sessionlens/` (~/.config/sessionlens/)
//! - Data: `$XDG_DATA_HOME/sessionlens/` (~/.local/share/sessionlens/)
//! - State/Logs: `$XDG_STATE_HOME/sessionlens/` (~/.local/state/sessionlens/)
//!
//! A [`Config`] is an explicit value: load it once per batch run and pass it
//! by reference to the components that need it.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Active-duration calculation
    #[serde(default)]
    pub duration: DurationConfig,

    /// Session building
    #[serde(default)]
    pub session: SessionConfig,

    /// Struggle detector thresholds
    #[serde(default)]
    pub detectors: DetectorConfig,

    /// Lexical rule table overrides
    #[serde(default)]
    pub rules: RulesConfig,

    /// Knowledge graph storage
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Parameters for the break-aware duration estimate.
#[derive(Debug, Deserialize, Clone)]
pub struct DurationConfig {
    /// Gaps longer than this close the current active segment
    #[serde(default = "default_max_gap_minutes")]
    pub max_gap_minutes: f64,

    /// Segments must last longer than this to count as active time
    #[serde(default)]
    pub min_active_seconds: i64,

    /// Gaps longer than this are reported as a break rather than a pause
    #[serde(default = "default_break_threshold_minutes")]
    pub break_threshold_minutes: f64,
}

impl Default for DurationConfig {
    fn default() -> Self {
        Self {
            max_gap_minutes: default_max_gap_minutes(),
            min_active_seconds: 0,
            break_threshold_minutes: default_break_threshold_minutes(),
        }
    }
}

impl DurationConfig {
    /// Reject parameters the calculator cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.max_gap_minutes.is_finite() || self.max_gap_minutes <= 0.0 {
            return Err(Error::Duration(format!(
                "max_gap_minutes must be positive, got {}",
                self.max_gap_minutes
            )));
        }
        if self.min_active_seconds < 0 {
            return Err(Error::Duration(format!(
                "min_active_seconds must not be negative, got {}",
                self.min_active_seconds
            )));
        }
        Ok(())
    }
}

fn default_max_gap_minutes() -> f64 {
    30.0
}

fn default_break_threshold_minutes() -> f64 {
    60.0
}

/// Session building configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Number of preceding conversation entries captured for intent classification
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// How many leading records are probed for a `cwd` field
    #[serde(default = "default_project_probe_records")]
    pub project_probe_records: usize,

    /// Lower-case fragments identifying prompts written by analysis tooling
    #[serde(default = "default_self_generated_signatures")]
    pub self_generated_signatures: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
            project_probe_records: default_project_probe_records(),
            self_generated_signatures: default_self_generated_signatures(),
        }
    }
}

fn default_context_window() -> usize {
    5
}

fn default_project_probe_records() -> usize {
    5
}

fn default_self_generated_signatures() -> Vec<String> {
    [
        "analyze this claude code session",
        "you are analyzing a conversation",
        "analyze the following coding session",
        "you are an expert at analyzing ai coding sessions",
        "struggle patterns detected in this session",
        "generate a session analysis report",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Struggle detector thresholds
#[derive(Debug, Deserialize, Clone)]
pub struct DetectorConfig {
    #[serde(default = "default_simple_loop_min_repeats")]
    pub simple_loop_min_repeats: usize,

    #[serde(default = "default_pattern_loop_max_length")]
    pub pattern_loop_max_length: usize,

    #[serde(default = "default_pattern_loop_min_repetitions")]
    pub pattern_loop_min_repetitions: usize,

    #[serde(default = "default_error_streak_min")]
    pub error_streak_min: usize,

    #[serde(default = "default_stagnation_min_repeats")]
    pub stagnation_min_repeats: usize,

    #[serde(default = "default_reading_spiral_window")]
    pub reading_spiral_window: usize,

    /// Reads per mutating action above which a window is a spiral
    #[serde(default = "default_reading_spiral_ratio")]
    pub reading_spiral_ratio: f64,

    #[serde(default = "default_shotgun_window_minutes")]
    pub shotgun_window_minutes: f64,

    #[serde(default = "default_shotgun_min_unique_tools")]
    pub shotgun_min_unique_tools: usize,

    #[serde(default = "default_shotgun_min_tools_per_minute")]
    pub shotgun_min_tools_per_minute: f64,

    #[serde(default = "default_context_switch_min_switches")]
    pub context_switch_min_switches: usize,

    #[serde(default = "default_context_switch_switches_per_file")]
    pub context_switch_switches_per_file: f64,

    #[serde(default = "default_long_session_threshold_seconds")]
    pub long_session_threshold_seconds: i64,

    /// Detector names to skip (e.g. `"long_session"`)
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            simple_loop_min_repeats: default_simple_loop_min_repeats(),
            pattern_loop_max_length: default_pattern_loop_max_length(),
            pattern_loop_min_repetitions: default_pattern_loop_min_repetitions(),
            error_streak_min: default_error_streak_min(),
            stagnation_min_repeats: default_stagnation_min_repeats(),
            reading_spiral_window: default_reading_spiral_window(),
            reading_spiral_ratio: default_reading_spiral_ratio(),
            shotgun_window_minutes: default_shotgun_window_minutes(),
            shotgun_min_unique_tools: default_shotgun_min_unique_tools(),
            shotgun_min_tools_per_minute: default_shotgun_min_tools_per_minute(),
            context_switch_min_switches: default_context_switch_min_switches(),
            context_switch_switches_per_file: default_context_switch_switches_per_file(),
            long_session_threshold_seconds: default_long_session_threshold_seconds(),
            disabled: vec![],
        }
    }
}

impl DetectorConfig {
    /// Whether the named detector is switched off.
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.iter().any(|d| d == name)
    }
}

fn default_simple_loop_min_repeats() -> usize {
    3
}

fn default_pattern_loop_max_length() -> usize {
    4
}

fn default_pattern_loop_min_repetitions() -> usize {
    2
}

fn default_error_streak_min() -> usize {
    3
}

fn default_stagnation_min_repeats() -> usize {
    3
}

fn default_reading_spiral_window() -> usize {
    10
}

fn default_reading_spiral_ratio() -> f64 {
    3.0
}

fn default_shotgun_window_minutes() -> f64 {
    5.0
}

fn default_shotgun_min_unique_tools() -> usize {
    5
}

fn default_shotgun_min_tools_per_minute() -> f64 {
    3.0
}

fn default_context_switch_min_switches() -> usize {
    8
}

fn default_context_switch_switches_per_file() -> f64 {
    2.0
}

fn default_long_session_threshold_seconds() -> i64 {
    4 * 60 * 60
}

/// Overrides for the lexical rule tables.
///
/// Any table left unset falls back to the built-in one. A configured table
/// replaces the built-in table entirely.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RulesConfig {
    /// Tool name -> keywords that mark an explicit request for that tool
    pub intent_tool_keywords: Option<BTreeMap<String, Vec<String>>>,
    /// Phrases that mark high-level guidance without naming a tool
    pub intent_guidance_phrases: Option<Vec<String>>,
    /// Technology/topic terms matched on word boundaries
    pub concept_terms: Option<Vec<String>>,
    /// Error signatures matched as substrings
    pub error_terms: Option<Vec<String>>,
    /// Markers that a message reports a resolution
    pub resolution_cues: Option<Vec<String>>,
    /// Filler phrases that disqualify an assistant solution candidate
    pub generic_phrases: Option<Vec<String>>,
}

/// Knowledge graph storage configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct KnowledgeConfig {
    /// Override for the graph document location
    pub graph_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/sessionlens/config.toml` (~/.config/sessionlens/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("sessionlens").join("config.toml")
    }

    /// Returns the data directory path (for the knowledge graph)
    ///
    /// `$XDG_DATA_HOME/sessionlens/` (~/.local/share/sessionlens/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("sessionlens")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/sessionlens/` (~/.local/state/sessionlens/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("sessionlens")
    }

    /// Returns the log file path
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("sessionlens.log")
    }

    /// Returns the directory Claude Code writes conversation logs to
    ///
    /// `~/.claude/projects/`
    pub fn default_log_root() -> PathBuf {
        home_dir().join(".claude").join("projects")
    }

    /// Returns the knowledge graph document path, honoring `[knowledge].graph_path`.
    pub fn knowledge_graph_path(&self) -> PathBuf {
        self.knowledge
            .graph_path
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("knowledge_graph.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.duration.max_gap_minutes, 30.0);
        assert_eq!(config.duration.min_active_seconds, 0);
        assert_eq!(config.session.context_window, 5);
        assert_eq!(config.detectors.simple_loop_min_repeats, 3);
        assert!(config.rules.concept_terms.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[duration]
max_gap_minutes = 15
min_active_seconds = 60

[detectors]
error_streak_min = 4
disabled = ["long_session"]

[rules]
concept_terms = ["elm", "ocaml"]

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.duration.max_gap_minutes, 15.0);
        assert_eq!(config.duration.min_active_seconds, 60);
        assert_eq!(config.duration.break_threshold_minutes, 60.0);
        assert_eq!(config.detectors.error_streak_min, 4);
        assert_eq!(config.detectors.simple_loop_min_repeats, 3);
        assert!(config.detectors.is_disabled("long_session"));
        assert!(!config.detectors.is_disabled("simple_loop"));
        assert_eq!(
            config.rules.concept_terms,
            Some(vec!["elm".to_string(), "ocaml".to_string()])
        );
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_duration_config_validation() {
        assert!(DurationConfig::default().validate().is_ok());

        let config = DurationConfig {
            max_gap_minutes: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Duration(_))));

        let config = DurationConfig {
            min_active_seconds: -1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_knowledge_graph_path_override() {
        let mut config = Config::default();
        assert!(config
            .knowledge_graph_path()
            .ends_with("sessionlens/knowledge_graph.json"));

        config.knowledge.graph_path = Some(PathBuf::from("/tmp/kg.json"));
        assert_eq!(config.knowledge_graph_path(), PathBuf::from("/tmp/kg.json"));
    }
}
