//! Struggle detector framework
//!
//! Detectors consume a finished [`Session`] and produce [`Detection`]s. The
//! engine attaches provenance and orders the findings for annotation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      STRUGGLE ENGINE                            │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐             │
//! │  │ simple_loop │  │ error_streak│  │ long_session│  ...        │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘             │
//! │         │                │                │                     │
//! │         ▼                ▼                ▼                     │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              StruggleEngine.run_all()                   │   │
//! │  │  - Calls detector.detect() on the session               │   │
//! │  │  - Wraps detections with _provenance                    │   │
//! │  │  - Sorts by first tool index, then severity             │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sessionlens_core::struggle::create_default_engine;
//!
//! let engine = create_default_engine(&config.detectors);
//! let patterns = engine.run_all(&session);
//! engine.annotate(&mut session, &patterns);
//! ```

use super::pattern::{Detection, Provenance, StrugglePattern};
use crate::error::{Error, Result};
use crate::types::Session;
use chrono::Utc;
use std::cmp::Reverse;
use std::time::Instant;

/// Trait that all struggle detectors implement.
///
/// Detectors are stateless: the same session always yields the same
/// detections, and no detector reads another's output.
pub trait StruggleDetector: Send + Sync {
    /// Unique snake_case name, matching the kind it emits.
    fn name(&self) -> &str;

    /// Analyze a session and return zero or more detections.
    fn detect(&self, session: &Session) -> Vec<Detection>;
}

/// Engine that manages and runs struggle detectors.
pub struct StruggleEngine {
    detectors: Vec<Box<dyn StruggleDetector>>,
}

impl StruggleEngine {
    /// Create a new empty engine.
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    /// Register a detector with the engine.
    pub fn register(&mut self, detector: Box<dyn StruggleDetector>) {
        tracing::debug!(detector = detector.name(), "Registered struggle detector");
        self.detectors.push(detector);
    }

    /// Get list of registered detector names.
    pub fn detector_names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Check if a detector is registered.
    pub fn has_detector(&self, name: &str) -> bool {
        self.detectors.iter().any(|d| d.name() == name)
    }

    /// Run a single detector by name.
    pub fn run_detector(&self, name: &str, session: &Session) -> Result<Vec<StrugglePattern>> {
        let detector = self
            .detectors
            .iter()
            .find(|d| d.name() == name)
            .ok_or_else(|| Error::Config(format!("Detector not found: {}", name)))?;

        let mut patterns = Self::run_one(detector.as_ref(), session);
        sort_for_annotation(&mut patterns);
        Ok(patterns)
    }

    /// Run every registered detector and return the findings in annotation order.
    pub fn run_all(&self, session: &Session) -> Vec<StrugglePattern> {
        let mut patterns: Vec<StrugglePattern> = self
            .detectors
            .iter()
            .flat_map(|d| Self::run_one(d.as_ref(), session))
            .collect();
        sort_for_annotation(&mut patterns);

        tracing::info!(
            session_id = %session.session_id,
            findings = patterns.len(),
            "Struggle detection complete"
        );

        patterns
    }

    /// Set `has_struggle` and `struggle_indicators` from findings.
    ///
    /// Indicators are the distinct kind names in annotation order.
    pub fn annotate(&self, session: &mut Session, patterns: &[StrugglePattern]) {
        let mut indicators: Vec<String> = Vec::new();
        for pattern in patterns {
            let name = pattern.name();
            if !indicators.iter().any(|i| i == name) {
                indicators.push(name.to_string());
            }
        }
        session.has_struggle = !indicators.is_empty();
        session.struggle_indicators = indicators;
    }

    fn run_one(detector: &dyn StruggleDetector, session: &Session) -> Vec<StrugglePattern> {
        let start = Instant::now();
        let detected_at = Utc::now();
        let detections = detector.detect(session);

        tracing::debug!(
            detector = detector.name(),
            session_id = %session.session_id,
            findings = detections.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Ran struggle detector"
        );

        detections
            .into_iter()
            .map(|d| StrugglePattern {
                kind: d.kind,
                severity: d.severity,
                provenance: Provenance {
                    session_id: session.session_id.clone(),
                    detector: detector.name().to_string(),
                    detected_at,
                    confidence: d.confidence,
                },
            })
            .collect()
    }
}

impl Default for StruggleEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Order findings for rendering: first tool index ascending, then
/// `error > warning > info`. Session-level findings come last.
pub fn sort_for_annotation(patterns: &mut [StrugglePattern]) {
    patterns.sort_by_key(|p| {
        (
            p.kind.first_index().unwrap_or(usize::MAX),
            Reverse(p.severity),
        )
    });
}
