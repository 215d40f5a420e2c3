//! Tool-intent classification
//!
//! Labels why a tool was likely invoked by looking at the most recent user
//! prompt before the assistant message that issued it:
//!
//! | Label | Rule |
//! |-------|------|
//! | `user_directed` | the prompt contains a keyword tied to this tool ("read" for `Read`) |
//! | `guided_autonomous` | the prompt contains a high-level guidance phrase ("debug", "figure out") |
//! | `fully_autonomous` | no prompt in the window, or neither rule matches |
//!
//! This is a lexical rule table, not a learned classifier. Both tables can be
//! replaced through `[rules]` in the config file.

use crate::config::RulesConfig;
use crate::error::{Error, Result};
use crate::types::{ConversationEntry, InitiationType, Role};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

/// Built-in tool keyword table.
const DEFAULT_TOOL_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Read",
        &["read", "check", "look at", "open", "show me", "view", "inspect", "examine"],
    ),
    (
        "Write",
        &["write", "create", "save", "new file", "generate"],
    ),
    (
        "Edit",
        &["edit", "change", "modify", "update", "fix", "replace", "rename", "refactor"],
    ),
    (
        "MultiEdit",
        &["edit", "change", "modify", "update", "fix", "replace", "rename", "refactor"],
    ),
    (
        "Bash",
        &["run", "execute", "install", "build", "test", "command", "terminal", "npm", "cargo", "git"],
    ),
    ("Grep", &["search", "grep", "find", "look for", "where is"]),
    ("Glob", &["find", "list files", "locate", "glob"]),
    ("LS", &["list", "ls", "directory", "folder"]),
    ("WebFetch", &["fetch", "url", "website", "download", "http"]),
    ("WebSearch", &["search the web", "google", "look up", "research"]),
    ("TodoWrite", &["todo", "plan", "task list", "checklist"]),
    ("Task", &["delegate", "agent", "subagent", "investigate"]),
    ("NotebookEdit", &["notebook", "cell", "jupyter"]),
];

/// Built-in guidance phrase table.
const DEFAULT_GUIDANCE_PHRASES: &[&str] = &[
    "debug",
    "implement",
    "figure out",
    "investigate",
    "make it work",
    "get it working",
    "solve",
    "help me",
    "improve",
    "optimize",
    "refactor",
    "add support",
    "set up",
    "clean up",
    "work on",
    "why is",
    "why does",
];

/// The keyword tables, as plain data.
#[derive(Debug, Clone)]
pub struct IntentRules {
    pub tool_keywords: BTreeMap<String, Vec<String>>,
    pub guidance_phrases: Vec<String>,
}

impl Default for IntentRules {
    fn default() -> Self {
        Self {
            tool_keywords: DEFAULT_TOOL_KEYWORDS
                .iter()
                .map(|(tool, words)| {
                    (
                        tool.to_string(),
                        words.iter().map(|w| w.to_string()).collect(),
                    )
                })
                .collect(),
            guidance_phrases: DEFAULT_GUIDANCE_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl IntentRules {
    /// Built-in tables with any configured table swapped in.
    pub fn from_config(rules: &RulesConfig) -> Self {
        let defaults = Self::default();
        Self {
            tool_keywords: rules
                .intent_tool_keywords
                .clone()
                .unwrap_or(defaults.tool_keywords),
            guidance_phrases: rules
                .intent_guidance_phrases
                .clone()
                .unwrap_or(defaults.guidance_phrases),
        }
    }
}

/// Compiled classifier.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    tool_patterns: HashMap<String, Vec<Regex>>,
    guidance_patterns: Vec<Regex>,
}

impl IntentClassifier {
    /// Compile a classifier from rule tables.
    pub fn new(rules: &IntentRules) -> Result<Self> {
        let mut tool_patterns = HashMap::new();
        for (tool, words) in &rules.tool_keywords {
            let compiled = words
                .iter()
                .map(|w| word_pattern(w))
                .collect::<Result<Vec<_>>>()?;
            tool_patterns.insert(tool.to_lowercase(), compiled);
        }

        let guidance_patterns = rules
            .guidance_phrases
            .iter()
            .map(|p| word_pattern(p))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            tool_patterns,
            guidance_patterns,
        })
    }

    /// Classify one tool invocation against the entries that preceded it.
    ///
    /// `preceding` must not include the assistant message that issued the tool.
    pub fn classify(&self, tool_name: &str, preceding: &[ConversationEntry]) -> InitiationType {
        let Some(prompt) = most_recent_prompt(preceding) else {
            return InitiationType::FullyAutonomous;
        };
        let text = prompt.text();

        if self.has_tool_cue(tool_name, &text) {
            InitiationType::UserDirected
        } else if self.guidance_patterns.iter().any(|re| re.is_match(&text)) {
            InitiationType::GuidedAutonomous
        } else {
            InitiationType::FullyAutonomous
        }
    }

    fn has_tool_cue(&self, tool_name: &str, text: &str) -> bool {
        self.tool_patterns
            .get(&tool_name.to_lowercase())
            .map(|patterns| patterns.iter().any(|re| re.is_match(text)))
            .unwrap_or(false)
    }
}

/// Most recent user entry carrying text; tool-result carriers are skipped.
fn most_recent_prompt(preceding: &[ConversationEntry]) -> Option<&ConversationEntry> {
    preceding
        .iter()
        .rev()
        .find(|e| e.role == Role::User && e.has_text())
}

/// Case-insensitive match of a phrase delimited by non-word characters.
///
/// `\b` would not work for terms ending in punctuation such as `c++`.
pub(crate) fn word_pattern(phrase: &str) -> Result<Regex> {
    let escaped = regex::escape(phrase.trim());
    Regex::new(&format!(r"(?i)(?:^|\W){}(?:\W|$)", escaped))
        .map_err(|e| Error::Config(format!("invalid rule phrase {:?}: {}", phrase, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Content;

    fn user(text: &str) -> ConversationEntry {
        ConversationEntry {
            index: 0,
            role: Role::User,
            timestamp: None,
            content: vec![Content::Text {
                text: text.to_string(),
            }],
        }
    }

    fn assistant(text: &str) -> ConversationEntry {
        ConversationEntry {
            role: Role::Assistant,
            ..user(text)
        }
    }

    fn tool_result() -> ConversationEntry {
        ConversationEntry {
            index: 0,
            role: Role::User,
            timestamp: None,
            content: vec![Content::ToolResult {
                tool_use_id: "t1".to_string(),
                content: "file contents".to_string(),
                is_error: false,
            }],
        }
    }

    fn classifier() -> IntentClassifier {
        IntentClassifier::new(&IntentRules::default()).unwrap()
    }

    #[test]
    fn test_no_user_message_is_fully_autonomous() {
        let c = classifier();
        assert_eq!(c.classify("Read", &[]), InitiationType::FullyAutonomous);
        assert_eq!(
            c.classify("Read", &[assistant("Let me read that file")]),
            InitiationType::FullyAutonomous
        );
    }

    #[test]
    fn test_tool_keyword_is_user_directed() {
        let c = classifier();
        let window = vec![user("Can you check the config loader?")];
        assert_eq!(c.classify("Read", &window), InitiationType::UserDirected);
    }

    #[test]
    fn test_guidance_phrase_is_guided() {
        let c = classifier();
        let window = vec![user("Please debug the login flow")];
        assert_eq!(c.classify("Read", &window), InitiationType::GuidedAutonomous);
    }

    #[test]
    fn test_unrelated_prompt_is_fully_autonomous() {
        let c = classifier();
        let window = vec![user("Thanks, looks good")];
        assert_eq!(c.classify("Bash", &window), InitiationType::FullyAutonomous);
    }

    #[test]
    fn test_keywords_match_whole_words() {
        let c = classifier();
        // "thread" contains "read" but is not the word "read"
        let window = vec![user("The thread pool looks fine")];
        assert_eq!(c.classify("Read", &window), InitiationType::FullyAutonomous);
    }

    #[test]
    fn test_tool_result_carriers_are_skipped() {
        let c = classifier();
        let window = vec![
            user("Run the test suite"),
            assistant("Running tests"),
            tool_result(),
        ];
        assert_eq!(c.classify("Bash", &window), InitiationType::UserDirected);
    }

    #[test]
    fn test_most_recent_prompt_wins() {
        let c = classifier();
        let window = vec![user("Read main.rs"), assistant("Done"), user("Thanks")];
        assert_eq!(c.classify("Read", &window), InitiationType::FullyAutonomous);
    }

    #[test]
    fn test_tool_name_lookup_is_case_insensitive() {
        let c = classifier();
        let window = vec![user("please run cargo test")];
        assert_eq!(c.classify("bash", &window), InitiationType::UserDirected);
    }

    #[test]
    fn test_configured_tables_replace_defaults() {
        let rules = RulesConfig {
            intent_tool_keywords: Some(BTreeMap::from([(
                "Read".to_string(),
                vec!["peek".to_string()],
            )])),
            intent_guidance_phrases: Some(vec!["sort this out".to_string()]),
            ..Default::default()
        };
        let c = IntentClassifier::new(&IntentRules::from_config(&rules)).unwrap();

        assert_eq!(
            c.classify("Read", &[user("peek at lib.rs")]),
            InitiationType::UserDirected
        );
        assert_eq!(
            c.classify("Read", &[user("check lib.rs")]),
            InitiationType::FullyAutonomous
        );
        assert_eq!(
            c.classify("Bash", &[user("can you sort this out")]),
            InitiationType::GuidedAutonomous
        );
    }
}
