//! Persisted cross-session knowledge graph
//!
//! A single JSON document:
//!
//! ```json
//! {
//!   "sessions": { "<session id>": { "concepts": [..], "errors": [..], "solutions": [..],
//!                                   "project": "..", "timestamp": ".." } },
//!   "indexes":  { "<concept or error>": ["<session id>", ..] }
//! }
//! ```
//!
//! The document is read on first access and cached for the lifetime of the
//! [`KnowledgeGraph`]. Every [`add_session_connections`](KnowledgeGraph::add_session_connections)
//! rewrites the whole file (temp file + rename), so a crash loses at most the
//! session being added.
//!
//! There is no locking. One process at a time.

use super::extractor::SessionConnections;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Number of index terms reported by [`KnowledgeGraph::stats`].
const TOP_TERMS: usize = 10;

/// On-disk shape of the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub sessions: BTreeMap<String, SessionConnections>,
    /// Concept or error term -> ids of sessions that mention it
    #[serde(default)]
    pub indexes: BTreeMap<String, Vec<String>>,
}

/// A session ranked by overlap with a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarSession {
    pub session_id: String,
    pub score: u32,
    pub project: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub matching_concepts: Vec<String>,
    pub matching_errors: Vec<String>,
}

/// A stored solution ranked against the caller's context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSolution {
    pub solution: String,
    pub session_id: String,
    pub project: String,
    /// Share of context concepts the source session also mentions
    pub relevance: f64,
    pub matching_concepts: Vec<String>,
}

/// Summary counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub sessions: usize,
    pub concepts: usize,
    pub errors: usize,
    pub solutions: usize,
    /// Most connected index terms with their session counts
    pub top_terms: Vec<(String, usize)>,
}

/// Case-insensitive substring match in either direction. Inputs must be lowercase.
fn terms_match(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

/// Lowercased, non-empty query terms.
fn normalize(terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Query terms that match any of `stored`.
fn matching<'a>(query: &'a [String], stored: &BTreeSet<String>) -> Vec<&'a String> {
    query
        .iter()
        .filter(|q| stored.iter().any(|s| terms_match(q, &s.to_lowercase())))
        .collect()
}

/// Knowledge graph backed by a JSON file, or held only in memory.
#[derive(Debug)]
pub struct KnowledgeGraph {
    path: Option<PathBuf>,
    document: Option<GraphDocument>,
}

impl KnowledgeGraph {
    /// Graph persisted at `path`. Nothing is read until first access.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            document: None,
        }
    }

    /// Graph that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            document: Some(GraphDocument::default()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn document(&mut self) -> Result<&mut GraphDocument> {
        if self.document.is_none() {
            let loaded = match &self.path {
                Some(path) => load(path)?,
                None => GraphDocument::default(),
            };
            self.document = Some(loaded);
        }
        // Populated above
        self.document
            .as_mut()
            .ok_or_else(|| Error::KnowledgeGraph("document not loaded".to_string()))
    }

    /// Merge a session's connections into the graph and persist.
    pub fn add_session_connections(
        &mut self,
        session_id: &str,
        connections: SessionConnections,
    ) -> Result<()> {
        let doc = self.document()?;

        for term in connections.concepts.iter().chain(&connections.errors) {
            let ids = doc.indexes.entry(term.clone()).or_default();
            if !ids.iter().any(|id| id == session_id) {
                ids.push(session_id.to_string());
            }
        }

        match doc.sessions.get_mut(session_id) {
            Some(existing) => {
                existing.concepts.extend(connections.concepts);
                existing.errors.extend(connections.errors);
                existing.solutions.extend(connections.solutions);
                existing.project = connections.project;
                if connections.timestamp.is_some() {
                    existing.timestamp = connections.timestamp;
                }
            }
            None => {
                doc.sessions.insert(session_id.to_string(), connections);
            }
        }

        self.persist()
    }

    /// Sessions ranked by `2 x concept overlap + 3 x error overlap`. Zero scores are omitted.
    pub fn find_similar_sessions(
        &mut self,
        concepts: &[String],
        errors: &[String],
    ) -> Result<Vec<SimilarSession>> {
        let concepts = normalize(concepts);
        let errors = normalize(errors);
        let doc = self.document()?;

        let mut results: Vec<SimilarSession> = doc
            .sessions
            .iter()
            .filter_map(|(id, conn)| {
                let matching_concepts = matching(&concepts, &conn.concepts);
                let matching_errors = matching(&errors, &conn.errors);
                let score = 2 * matching_concepts.len() as u32 + 3 * matching_errors.len() as u32;
                (score > 0).then(|| SimilarSession {
                    session_id: id.clone(),
                    score,
                    project: conn.project.clone(),
                    timestamp: conn.timestamp,
                    matching_concepts: matching_concepts.into_iter().cloned().collect(),
                    matching_errors: matching_errors.into_iter().cloned().collect(),
                })
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(results)
    }

    /// Every solution from sessions whose errors match `error_pattern`,
    /// ranked by how many `context_concepts` the session shares.
    pub fn get_solutions_for_error(
        &mut self,
        error_pattern: &str,
        context_concepts: &[String],
    ) -> Result<Vec<RankedSolution>> {
        let pattern = error_pattern.trim().to_lowercase();
        let context = normalize(context_concepts);
        let doc = self.document()?;

        let mut results = Vec::new();
        for (id, conn) in &doc.sessions {
            if !conn
                .errors
                .iter()
                .any(|e| terms_match(&pattern, &e.to_lowercase()))
            {
                continue;
            }

            let matched = matching(&context, &conn.concepts);
            let relevance = if context.is_empty() {
                1.0
            } else {
                matched.len() as f64 / context.len() as f64
            };

            for solution in &conn.solutions {
                results.push(RankedSolution {
                    solution: solution.clone(),
                    session_id: id.clone(),
                    project: conn.project.clone(),
                    relevance,
                    matching_concepts: matched.iter().map(|s| s.to_string()).collect(),
                });
            }
        }

        results.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
        Ok(results)
    }

    /// Session ids indexed under `term` (exact, case-insensitive).
    pub fn sessions_for_term(&mut self, term: &str) -> Result<Vec<String>> {
        let term = term.trim().to_lowercase();
        let doc = self.document()?;
        Ok(doc.indexes.get(&term).cloned().unwrap_or_default())
    }

    /// Stored connections for one session.
    pub fn session(&mut self, session_id: &str) -> Result<Option<SessionConnections>> {
        Ok(self.document()?.sessions.get(session_id).cloned())
    }

    pub fn len(&mut self) -> Result<usize> {
        Ok(self.document()?.sessions.len())
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn stats(&mut self) -> Result<GraphStats> {
        let doc = self.document()?;

        let concepts: BTreeSet<&String> =
            doc.sessions.values().flat_map(|c| &c.concepts).collect();
        let errors: BTreeSet<&String> = doc.sessions.values().flat_map(|c| &c.errors).collect();

        let mut top_terms: Vec<(String, usize)> = doc
            .indexes
            .iter()
            .map(|(term, ids)| (term.clone(), ids.len()))
            .collect();
        top_terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_terms.truncate(TOP_TERMS);

        Ok(GraphStats {
            sessions: doc.sessions.len(),
            concepts: concepts.len(),
            errors: errors.len(),
            solutions: doc.sessions.values().map(|c| c.solutions.len()).sum(),
            top_terms,
        })
    }

    fn persist(&self) -> Result<()> {
        let (Some(path), Some(doc)) = (&self.path, &self.document) else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| graph_io("create directory", parent, e))?;
        }

        let json = serde_json::to_string_pretty(doc)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| graph_io("write", &tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| graph_io("replace", path, e))?;

        tracing::debug!(
            path = %path.display(),
            sessions = doc.sessions.len(),
            "Persisted knowledge graph"
        );
        Ok(())
    }
}

fn load(path: &Path) -> Result<GraphDocument> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No knowledge graph yet, starting empty");
        return Ok(GraphDocument::default());
    }

    let contents = fs::read_to_string(path).map_err(|e| graph_io("read", path, e))?;
    let doc: GraphDocument = serde_json::from_str(&contents).map_err(|e| {
        Error::KnowledgeGraph(format!("invalid graph document {}: {}", path.display(), e))
    })?;

    tracing::info!(
        path = %path.display(),
        sessions = doc.sessions.len(),
        "Loaded knowledge graph"
    );
    Ok(doc)
}

fn graph_io(action: &str, path: &Path, e: std::io::Error) -> Error {
    Error::KnowledgeGraph(format!("failed to {} {}: {}", action, path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn connections(concepts: &[&str], errors: &[&str], solutions: &[&str]) -> SessionConnections {
        SessionConnections {
            concepts: set(concepts),
            errors: set(errors),
            solutions: set(solutions),
            project: "app".to_string(),
            timestamp: None,
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_similar_react() {
        let mut graph = KnowledgeGraph::in_memory();
        graph
            .add_session_connections("s1", connections(&["react", "testing"], &[], &[]))
            .unwrap();
        graph
            .add_session_connections("s2", connections(&["vue"], &[], &[]))
            .unwrap();

        let results = graph.find_similar_sessions(&strings(&["react"]), &[]).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].session_id, "s1");
        assert_eq!(results[0].score, 2);
        assert_eq!(results[0].matching_concepts, strings(&["react"]));
    }

    #[test]
    fn test_errors_weigh_more_and_match_substrings() {
        let mut graph = KnowledgeGraph::in_memory();
        graph
            .add_session_connections("a", connections(&["react", "jwt"], &[], &[]))
            .unwrap();
        graph
            .add_session_connections("b", connections(&[], &["cannot find module"], &[]))
            .unwrap();

        let results = graph
            .find_similar_sessions(&strings(&["React", "JWT"]), &strings(&["Cannot find module 'x'"]))
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].session_id, "a");
        assert_eq!(results[0].score, 4);
        assert_eq!(results[1].session_id, "b");
        assert_eq!(results[1].score, 3);
    }

    #[test]
    fn test_solutions_ranked_by_context() {
        let mut graph = KnowledgeGraph::in_memory();
        graph
            .add_session_connections(
                "docker",
                connections(&["docker"], &["permission denied"], &["chmod +x the entrypoint"]),
            )
            .unwrap();
        graph
            .add_session_connections(
                "ssh",
                connections(&["git"], &["permission denied"], &["add the key to ssh-agent"]),
            )
            .unwrap();
        graph
            .add_session_connections("other", connections(&["git"], &["timed out"], &["retry"]))
            .unwrap();

        let results = graph
            .get_solutions_for_error("permission denied", &strings(&["git"]))
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].solution, "add the key to ssh-agent");
        assert_eq!(results[0].relevance, 1.0);
        assert_eq!(results[1].relevance, 0.0);

        let no_context = graph.get_solutions_for_error("denied", &[]).unwrap();
        assert_eq!(no_context.len(), 2);
        assert!(no_context.iter().all(|r| r.relevance == 1.0));
    }

    #[test]
    fn test_re_adding_session_merges() {
        let mut graph = KnowledgeGraph::in_memory();
        graph
            .add_session_connections("s1", connections(&["rust"], &[], &[]))
            .unwrap();
        graph
            .add_session_connections("s1", connections(&["cargo"], &[], &[]))
            .unwrap();

        assert_eq!(graph.len().unwrap(), 1);
        let stored = graph.session("s1").unwrap().unwrap();
        assert_eq!(stored.concepts, set(&["cargo", "rust"]));
        assert_eq!(graph.sessions_for_term("RUST").unwrap(), strings(&["s1"]));
    }

    #[test]
    fn test_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("graph.json");

        let mut graph = KnowledgeGraph::open(&path);
        assert!(graph.is_empty().unwrap());
        graph
            .add_session_connections("s1", connections(&["react"], &["typeerror"], &["use optional chaining"]))
            .unwrap();
        assert!(path.exists());

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw["sessions"]["s1"].is_object());
        assert_eq!(raw["indexes"]["react"], serde_json::json!(["s1"]));

        let mut reopened = KnowledgeGraph::open(&path);
        assert_eq!(reopened.len().unwrap(), 1);
        let stats = reopened.stats().unwrap();
        assert_eq!(stats.concepts, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.solutions, 1);
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.json");
        fs::write(&path, "not json").unwrap();

        let mut graph = KnowledgeGraph::open(&path);
        assert!(matches!(graph.len(), Err(Error::KnowledgeGraph(_))));
    }

    #[test]
    fn test_stats_top_terms() {
        let mut graph = KnowledgeGraph::in_memory();
        graph
            .add_session_connections("a", connections(&["rust", "async"], &[], &[]))
            .unwrap();
        graph
            .add_session_connections("b", connections(&["rust"], &[], &[]))
            .unwrap();

        let stats = graph.stats().unwrap();
        assert_eq!(stats.sessions, 2);
        assert_eq!(stats.top_terms[0], ("rust".to_string(), 2));
    }
}
