//! Cross-session knowledge
//!
//! [`KnowledgeExtractor`] reduces a session to concept, error and solution
//! sets. [`KnowledgeGraph`] accumulates those sets across sessions and answers
//! "which earlier sessions looked like this?" and "how was this error fixed
//! before?". Scoring is lexical overlap only.

mod extractor;
mod graph;
mod rules;

pub use extractor::{KnowledgeExtractor, SessionConnections};
pub use graph::{GraphDocument, GraphStats, KnowledgeGraph, RankedSolution, SimilarSession};
pub use rules::KnowledgeRules;
