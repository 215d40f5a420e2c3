//! # sessionlens-core
//!
//! Core library for sessionlens - an analysis engine for AI coding-assistant
//! conversation logs.
//!
//! This library provides:
//! - A tolerant line-delimited JSON log reader and session builder
//! - Break-aware active-duration estimation
//! - Tool-intent classification from preceding conversation
//! - Nine struggle detectors behind a pluggable engine
//! - Knowledge extraction and a persisted cross-session knowledge graph
//! - Configuration management and logging infrastructure
//!
//! ## Pipeline
//!
//! ```text
//! log file ─► reader ─► SessionBuilder ─► Session ─┬─► StruggleEngine ─► [StrugglePattern]
//!                        │  intent                  │
//!                        │  duration                └─► KnowledgeExtractor ─► KnowledgeGraph
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use sessionlens_core::{BatchAnalyzer, Config, KnowledgeGraph};
//! use std::path::Path;
//!
//! let config = Config::load().expect("failed to load config");
//! let analyzer = BatchAnalyzer::new(&config).expect("invalid rule tables");
//! let mut graph = KnowledgeGraph::open(config.knowledge_graph_path());
//!
//! let files = BatchAnalyzer::discover_files(Path::new("logs")).expect("failed to list logs");
//! let result = analyzer
//!     .analyze_files(&files, Some(&mut graph))
//!     .expect("no sessions found");
//! for analyzed in &result.sessions {
//!     println!("{}: {} findings", analyzed.session.session_id, analyzed.patterns.len());
//! }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use duration::calculate_active_duration;
pub use error::{Error, Result};
pub use ingest::{AnalyzedSession, BatchAnalyzer, BatchResult, SessionBuilder, SkipReason};
pub use intent::{IntentClassifier, IntentRules};
pub use knowledge::{KnowledgeExtractor, KnowledgeGraph, SessionConnections};
pub use struggle::{create_default_engine, Severity, StruggleEngine, StrugglePattern};
pub use types::*;

// Public modules
pub mod config;
pub mod duration;
pub mod error;
pub mod ingest;
pub mod intent;
pub mod knowledge;
pub mod logging;
pub mod struggle;
pub mod types;
