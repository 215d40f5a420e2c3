//! Lexical rule tables for knowledge extraction.
//!
//! Every table can be replaced through `[rules]` in the config file.

use crate::config::RulesConfig;

/// Technology and topic terms, matched as whole words.
const DEFAULT_CONCEPT_TERMS: &[&str] = &[
    "react",
    "vue",
    "angular",
    "svelte",
    "next.js",
    "node.js",
    "typescript",
    "javascript",
    "python",
    "rust",
    "java",
    "c++",
    "django",
    "flask",
    "fastapi",
    "express",
    "tailwind",
    "css",
    "html",
    "graphql",
    "rest api",
    "api",
    "websocket",
    "database",
    "postgres",
    "postgresql",
    "mysql",
    "sqlite",
    "redis",
    "migration",
    "docker",
    "kubernetes",
    "deployment",
    "ci/cd",
    "authentication",
    "authorization",
    "oauth",
    "jwt",
    "testing",
    "unit test",
    "integration test",
    "caching",
    "async",
    "concurrency",
    "performance",
    "refactoring",
    "state management",
    "routing",
    "middleware",
    "logging",
    "error handling",
    "security",
    "webpack",
    "vite",
    "git",
    "npm",
    "cargo",
];

/// Error signatures, matched as lower-case substrings.
const DEFAULT_ERROR_TERMS: &[&str] = &[
    "typeerror",
    "syntaxerror",
    "referenceerror",
    "importerror",
    "modulenotfounderror",
    "keyerror",
    "attributeerror",
    "indexerror",
    "valueerror",
    "cannot find module",
    "module not found",
    "is not defined",
    "undefined is not",
    "null pointer",
    "segmentation fault",
    "permission denied",
    "connection refused",
    "timed out",
    "out of memory",
    "stack overflow",
    "no such file or directory",
    "command not found",
    "could not compile",
    "build failed",
    "tests failed",
    "test failed",
    "mismatched types",
    "cannot borrow",
    "unresolved import",
    "panicked at",
    "deadlock",
    "race condition",
    "cors",
    "404",
    "500 internal server error",
];

/// Phrases that mark a message as reporting a fix.
const DEFAULT_RESOLUTION_CUES: &[&str] = &[
    "✅",
    "fixed",
    "resolved",
    "solved",
    "working",
    "works now",
    "the fix",
    "the solution",
    "the issue was",
    "the problem was",
    "successfully",
];

/// Openers that mark an assistant candidate as narration rather than a solution.
const DEFAULT_GENERIC_PHRASES: &[&str] = &[
    "let me",
    "i will",
    "i'll",
    "i'm going to",
    "let's",
    "i can",
    "would you like",
    "should i",
    "great question",
];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The extraction tables, as plain data.
#[derive(Debug, Clone)]
pub struct KnowledgeRules {
    pub concept_terms: Vec<String>,
    pub error_terms: Vec<String>,
    pub resolution_cues: Vec<String>,
    pub generic_phrases: Vec<String>,
}

impl Default for KnowledgeRules {
    fn default() -> Self {
        Self {
            concept_terms: owned(DEFAULT_CONCEPT_TERMS),
            error_terms: owned(DEFAULT_ERROR_TERMS),
            resolution_cues: owned(DEFAULT_RESOLUTION_CUES),
            generic_phrases: owned(DEFAULT_GENERIC_PHRASES),
        }
    }
}

impl KnowledgeRules {
    /// Built-in tables with any configured table swapped in.
    pub fn from_config(rules: &RulesConfig) -> Self {
        let defaults = Self::default();
        Self {
            concept_terms: rules
                .concept_terms
                .clone()
                .unwrap_or(defaults.concept_terms),
            error_terms: rules.error_terms.clone().unwrap_or(defaults.error_terms),
            resolution_cues: rules
                .resolution_cues
                .clone()
                .unwrap_or(defaults.resolution_cues),
            generic_phrases: rules
                .generic_phrases
                .clone()
                .unwrap_or(defaults.generic_phrases),
        }
    }
}
