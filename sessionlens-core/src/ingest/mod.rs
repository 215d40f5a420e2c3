//! Ingestion and batch analysis of assistant log files
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │  Source Files   │ ──► │  SessionBuilder  │ ──► │  StruggleEngine  │
//! │   (*.jsonl)     │     │ reader + intent  │     │   9 detectors    │
//! └─────────────────┘     │   + duration     │     └────────┬─────────┘
//!                         └──────────────────┘              │
//!                                                           ▼
//!                         ┌──────────────────┐     ┌──────────────────┐
//!                         │  KnowledgeGraph  │ ◄── │KnowledgeExtractor│
//!                         │  (JSON document) │     │                  │
//!                         └──────────────────┘     └──────────────────┘
//! ```
//!
//! Files are processed one at a time. A file that cannot be read is recorded
//! in [`BatchResult::errors`] and the batch moves on. The only error that
//! escapes a batch is [`Error::NoSessionsFound`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sessionlens_core::{Config, BatchAnalyzer, KnowledgeGraph};
//!
//! let config = Config::load()?;
//! let analyzer = BatchAnalyzer::new(&config)?;
//! let mut graph = KnowledgeGraph::open(config.knowledge_graph_path());
//!
//! let files = BatchAnalyzer::discover_files(&root)?;
//! let result = analyzer.analyze_files(&files, Some(&mut graph))?;
//! println!("Analyzed {} sessions", result.sessions.len());
//! ```

mod builder;
mod project;
mod reader;

pub use builder::SessionBuilder;
pub use project::{resolve_project_name, SUMMARY_SESSION};
pub use reader::{read_log, read_records, LogRecord, ParsedLog, RecordType};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::knowledge::{KnowledgeExtractor, KnowledgeGraph, KnowledgeRules, SessionConnections};
use crate::struggle::{create_default_engine, StruggleEngine, StrugglePattern};
use crate::types::Session;
use std::path::{Path, PathBuf};

/// A session with everything derived from it.
#[derive(Debug, Clone)]
pub struct AnalyzedSession {
    pub session: Session,
    /// Findings in annotation order
    pub patterns: Vec<StrugglePattern>,
    pub connections: SessionConnections,
}

/// Reason a file produced no analyzed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No parseable records
    Empty,
    /// Only summary records
    SummaryOnly,
    /// First prompt matches a programmatic-analysis signature
    SelfGenerated,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Empty => "empty",
            SkipReason::SummaryOnly => "summary only",
            SkipReason::SelfGenerated => "self-generated",
        }
    }
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Number of files attempted
    pub files_processed: usize,
    pub sessions: Vec<AnalyzedSession>,
    pub skipped: Vec<(PathBuf, SkipReason)>,
    /// Per-file failures (file path → error message)
    pub errors: Vec<(PathBuf, String)>,
}

impl BatchResult {
    pub fn self_generated_count(&self) -> usize {
        self.skipped
            .iter()
            .filter(|(_, r)| *r == SkipReason::SelfGenerated)
            .count()
    }
}

/// Drives the full pipeline over a list of files.
pub struct BatchAnalyzer {
    builder: SessionBuilder,
    engine: StruggleEngine,
    extractor: KnowledgeExtractor,
}

impl BatchAnalyzer {
    /// Create an analyzer from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            builder: SessionBuilder::new(config)?,
            engine: create_default_engine(&config.detectors),
            extractor: KnowledgeExtractor::new(&KnowledgeRules::from_config(&config.rules))?,
        })
    }

    pub fn builder(&self) -> &SessionBuilder {
        &self.builder
    }

    pub fn engine(&self) -> &StruggleEngine {
        &self.engine
    }

    pub fn extractor(&self) -> &KnowledgeExtractor {
        &self.extractor
    }

    /// All `*.jsonl` files under `root`, sorted. A file path is returned as-is.
    pub fn discover_files(root: &Path) -> Result<Vec<PathBuf>> {
        if root.is_file() {
            return Ok(vec![root.to_path_buf()]);
        }

        let pattern = root.join("**").join("*.jsonl");
        let pattern = pattern.to_string_lossy();
        let entries = glob::glob(&pattern)
            .map_err(|e| Error::Config(format!("invalid search pattern {}: {}", pattern, e)))?;

        let mut files = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %e.path().display(), error = %e, "Unreadable path");
                }
            }
        }
        files.sort();

        tracing::info!(root = %root.display(), count = files.len(), "Discovered log files");
        Ok(files)
    }

    /// Analyze `paths` in order. See [`analyze_files_with_progress`](Self::analyze_files_with_progress).
    pub fn analyze_files(
        &self,
        paths: &[PathBuf],
        graph: Option<&mut KnowledgeGraph>,
    ) -> Result<BatchResult> {
        self.analyze_files_with_progress(paths, graph, |_, _, _| {})
    }

    /// Analyze `paths` in order, adding each session to `graph` as it completes.
    ///
    /// The callback receives `(current_file_index, total_files, file_path)` before
    /// each file is processed.
    pub fn analyze_files_with_progress<F>(
        &self,
        paths: &[PathBuf],
        mut graph: Option<&mut KnowledgeGraph>,
        mut on_progress: F,
    ) -> Result<BatchResult>
    where
        F: FnMut(usize, usize, &Path),
    {
        let total = paths.len();
        let mut result = BatchResult::default();

        for (i, path) in paths.iter().enumerate() {
            on_progress(i, total, path);
            result.files_processed += 1;

            let session = match self.builder.build_from_file(path) {
                Ok(Some(session)) => session,
                Ok(None) => {
                    Self::skip(&mut result, path, SkipReason::Empty);
                    continue;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to analyze file");
                    result.errors.push((path.clone(), e.to_string()));
                    continue;
                }
            };

            if session.project_name == SUMMARY_SESSION {
                Self::skip(&mut result, path, SkipReason::SummaryOnly);
                continue;
            }
            if session.is_self_generated {
                Self::skip(&mut result, path, SkipReason::SelfGenerated);
                continue;
            }

            let analyzed = self.analyze_session(session);

            if let Some(graph) = graph.as_deref_mut() {
                if let Err(e) = graph.add_session_connections(
                    &analyzed.session.session_id,
                    analyzed.connections.clone(),
                ) {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to update knowledge graph");
                    result.errors.push((path.clone(), e.to_string()));
                }
            }

            result.sessions.push(analyzed);
        }

        tracing::info!(
            files = result.files_processed,
            sessions = result.sessions.len(),
            skipped = result.skipped.len(),
            errors = result.errors.len(),
            "Batch analysis complete"
        );

        if result.sessions.is_empty() {
            return Err(Error::NoSessionsFound {
                files: result.files_processed,
            });
        }
        Ok(result)
    }

    /// Run detectors and extraction over one built session.
    pub fn analyze_session(&self, mut session: Session) -> AnalyzedSession {
        let patterns = self.engine.run_all(&session);
        self.engine.annotate(&mut session, &patterns);
        let connections = self.extractor.extract(&session);
        AnalyzedSession {
            session,
            patterns,
            connections,
        }
    }

    fn skip(result: &mut BatchResult, path: &Path, reason: SkipReason) {
        tracing::debug!(path = %path.display(), reason = reason.as_str(), "File skipped");
        result.skipped.push((path.to_path_buf(), reason));
    }
}
