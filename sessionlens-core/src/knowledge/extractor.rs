//! Knowledge extraction
//!
//! Pulls three sets out of a session's conversation:
//!
//! - **concepts**: configured topic terms found as whole words in message text
//! - **errors**: configured error signatures found in message text or tool results
//! - **solutions**: paragraphs or sentences (50 to 500 characters) that report a fix
//!
//! A solution candidate must contain a resolution cue that is not negated
//! ("fixed" counts, "not fixed" does not). Assistant-authored candidates must
//! also look actionable: no generic narration, not a question, and either
//! code-like tokens or more than 80 characters.
//!
//! Extraction is deterministic. Running it twice on the same session yields
//! the same sets.

use super::rules::KnowledgeRules;
use crate::error::{Error, Result};
use crate::intent::word_pattern;
use crate::types::{Role, Session};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const MIN_SOLUTION_CHARS: usize = 50;
const MAX_SOLUTION_CHARS: usize = 500;
const ACTIONABLE_LENGTH: usize = 80;

const NEGATIONS: &[&str] = &["not ", "n't ", "never "];

/// Inline code, calls, paths with extensions, `::`, arrows, flags, package-manager commands.
const CODE_TOKEN_PATTERN: &str = r"`[^`]+`|\w+\(\)|\w+::\w+|=>|->|\s--?[a-z][\w-]*|[\w./-]+\.(?:rs|ts|tsx|js|jsx|py|go|java|rb|toml|json|ya?ml|css|html|sql|sh)\b|\b(?:npm|cargo|pip|yarn|pnpm|git|make)\s+\w+";

/// What one session contributes to the knowledge graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConnections {
    pub concepts: BTreeSet<String>,
    pub errors: BTreeSet<String>,
    pub solutions: BTreeSet<String>,
    pub project: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Compiled extractor.
#[derive(Debug, Clone)]
pub struct KnowledgeExtractor {
    concepts: Vec<(String, Regex)>,
    error_terms: Vec<String>,
    resolution_cues: Vec<String>,
    generic_phrases: Vec<Regex>,
    code_token: Regex,
    paragraph_break: Regex,
}

impl KnowledgeExtractor {
    pub fn new(rules: &KnowledgeRules) -> Result<Self> {
        let concepts = rules
            .concept_terms
            .iter()
            .map(|t| Ok((t.to_lowercase(), word_pattern(t)?)))
            .collect::<Result<Vec<_>>>()?;
        let generic_phrases = rules
            .generic_phrases
            .iter()
            .map(|p| word_pattern(p))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            concepts,
            error_terms: lowered(&rules.error_terms),
            resolution_cues: lowered(&rules.resolution_cues),
            generic_phrases,
            code_token: compile(CODE_TOKEN_PATTERN)?,
            paragraph_break: compile(r"\n\s*\n")?,
        })
    }

    /// Extract the session's concepts, errors and solutions.
    pub fn extract(&self, session: &Session) -> SessionConnections {
        let mut connections = SessionConnections {
            project: session.project_name.clone(),
            timestamp: session.start_time,
            ..Default::default()
        };

        for entry in &session.conversation {
            let text = entry.text();
            let searchable = entry.searchable_text().to_lowercase();

            for (term, pattern) in &self.concepts {
                if pattern.is_match(&text) {
                    connections.concepts.insert(term.clone());
                }
            }
            for term in &self.error_terms {
                if searchable.contains(term.as_str()) {
                    connections.errors.insert(term.clone());
                }
            }

            if text.trim().is_empty() || !self.has_resolution_cue(&text.to_lowercase()) {
                continue;
            }
            for candidate in self.solution_candidates(&text) {
                if entry.role == Role::Assistant && !self.is_actionable(&candidate) {
                    continue;
                }
                connections.solutions.insert(candidate);
            }
        }

        tracing::debug!(
            session_id = %session.session_id,
            concepts = connections.concepts.len(),
            errors = connections.errors.len(),
            solutions = connections.solutions.len(),
            "Extracted knowledge"
        );

        connections
    }

    /// Whether `lowered` holds a resolution cue not directly preceded by a negation.
    fn has_resolution_cue(&self, lowered: &str) -> bool {
        self.resolution_cues.iter().any(|cue| {
            lowered.match_indices(cue.as_str()).any(|(pos, _)| {
                let before = &lowered[..pos];
                !NEGATIONS.iter().any(|n| before.ends_with(n))
            })
        })
    }

    fn solution_candidates(&self, text: &str) -> Vec<String> {
        let mut candidates = Vec::new();
        for paragraph in self.paragraph_break.split(text) {
            let paragraph = paragraph.trim();
            if !self.has_resolution_cue(&paragraph.to_lowercase()) {
                continue;
            }
            let len = paragraph.chars().count();
            if (MIN_SOLUTION_CHARS..=MAX_SOLUTION_CHARS).contains(&len) {
                candidates.push(paragraph.to_string());
            } else if len > MAX_SOLUTION_CHARS {
                candidates.extend(
                    split_sentences(paragraph)
                        .into_iter()
                        .filter(|s| {
                            (MIN_SOLUTION_CHARS..=MAX_SOLUTION_CHARS)
                                .contains(&s.chars().count())
                        })
                        .filter(|s| self.has_resolution_cue(&s.to_lowercase()))
                        .map(|s| s.to_string()),
                );
            }
        }
        candidates
    }

    fn is_actionable(&self, candidate: &str) -> bool {
        if candidate.trim_end().ends_with('?') {
            return false;
        }
        if self.generic_phrases.iter().any(|re| re.is_match(candidate)) {
            return false;
        }
        self.code_token.is_match(candidate) || candidate.chars().count() > ACTIONABLE_LENGTH
    }
}

fn lowered(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Config(format!("invalid pattern {:?}: {}", pattern, e)))
}

/// Split at `.`, `!` or `?` followed by whitespace, and at line breaks.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let cut = match c {
            '\n' => Some(i),
            '.' | '!' | '?' => match chars.peek() {
                Some((_, next)) if next.is_whitespace() => Some(i + c.len_utf8()),
                _ => None,
            },
            _ => None,
        };
        if let Some(end) = cut {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}
