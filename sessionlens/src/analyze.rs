//! sessionlens-analyze - CLI tool to analyze AI assistant conversation logs
//!
//! Builds sessions from log files, runs the struggle detectors, updates the
//! knowledge graph, and prints a per-session report.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use sessionlens_core::ingest::{AnalyzedSession, BatchAnalyzer, BatchResult};
use sessionlens_core::knowledge::SimilarSession;
use sessionlens_core::{Config, InitiationType, KnowledgeGraph};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Number of similar sessions shown per session with `--similar`.
const SIMILAR_LIMIT: usize = 3;

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "sessionlens-analyze")]
#[command(about = "Detect struggle patterns in AI assistant conversation logs")]
#[command(version)]
struct Args {
    /// Log files or directories to scan for *.jsonl (default: ~/.claude/projects)
    paths: Vec<PathBuf>,

    /// Knowledge graph document to update (default: from config)
    #[arg(long)]
    graph: Option<PathBuf>,

    /// Do not read or update the knowledge graph
    #[arg(long, conflicts_with = "graph")]
    no_graph: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Show the most similar earlier sessions from the knowledge graph
    #[arg(long)]
    similar: bool,

    /// Verbose output (data-quality issues and extracted knowledge)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        sessionlens_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let roots = if args.paths.is_empty() {
        vec![Config::default_log_root()]
    } else {
        args.paths.clone()
    };

    let mut files = Vec::new();
    for root in &roots {
        let found = BatchAnalyzer::discover_files(root)
            .with_context(|| format!("failed to scan {}", root.display()))?;
        files.extend(found);
    }
    files.sort();
    files.dedup();

    if files.is_empty() {
        anyhow::bail!("No log files found under {:?}", roots);
    }

    let analyzer = BatchAnalyzer::new(&config).context("failed to compile rule tables")?;

    let mut graph = if args.no_graph {
        None
    } else {
        let path = args
            .graph
            .clone()
            .unwrap_or_else(|| config.knowledge_graph_path());
        Some(KnowledgeGraph::open(path))
    };

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("invalid progress template")?
            .progress_chars("#>-"),
    );

    let result = analyzer
        .analyze_files_with_progress(&files, graph.as_mut(), |current, _, path| {
            pb.set_position(current as u64);
            pb.set_message(
                path.file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("...")
                    .to_string(),
            );
        })
        .context("analysis failed")?;

    pb.finish_and_clear();

    let similar = match (&mut graph, args.similar) {
        (Some(graph), true) => find_similar(graph, &result)?,
        _ => BTreeMap::new(),
    };

    match args.format {
        OutputFormat::Json => print_json(&result, &similar)?,
        OutputFormat::Text => print_text(&result, &similar, args.verbose),
    }

    tracing::info!(
        files = result.files_processed,
        sessions = result.sessions.len(),
        errors = result.errors.len(),
        "sessionlens-analyze finished"
    );

    Ok(())
}

/// Similar sessions for each analyzed session, excluding itself.
fn find_similar(
    graph: &mut KnowledgeGraph,
    result: &BatchResult,
) -> Result<BTreeMap<String, Vec<SimilarSession>>> {
    let mut similar = BTreeMap::new();
    for analyzed in &result.sessions {
        let id = &analyzed.session.session_id;
        let concepts: Vec<String> = analyzed.connections.concepts.iter().cloned().collect();
        let errors: Vec<String> = analyzed.connections.errors.iter().cloned().collect();

        let matches: Vec<SimilarSession> = graph
            .find_similar_sessions(&concepts, &errors)
            .context("failed to query knowledge graph")?
            .into_iter()
            .filter(|s| &s.session_id != id)
            .take(SIMILAR_LIMIT)
            .collect();
        similar.insert(id.clone(), matches);
    }
    Ok(similar)
}

fn intent_counts(analyzed: &AnalyzedSession) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for op in &analyzed.session.tool_operations {
        *counts.entry(op.context.initiation_type.as_str()).or_insert(0) += 1;
    }
    counts
}

fn print_text(
    result: &BatchResult,
    similar: &BTreeMap<String, Vec<SimilarSession>>,
    verbose: bool,
) {
    for analyzed in &result.sessions {
        let session = &analyzed.session;
        println!("Session: {} ({})", session.session_id, session.project_name);

        let confidence = session
            .duration_analysis
            .as_ref()
            .map(|d| d.confidence.as_str())
            .unwrap_or("n/a");
        println!(
            "  Duration: {:.1} min raw, {:.1} min active (confidence {})",
            session.duration_minutes(),
            session.active_duration_seconds as f64 / 60.0,
            confidence
        );
        println!(
            "  Messages: {} prompts, {} assistant, {} tool operations ({} failed)",
            session.human_prompt_count,
            session.assistant_message_count,
            session.tool_operations.len(),
            session.error_count
        );

        let intents = intent_counts(analyzed);
        if !intents.is_empty() {
            let rendered: Vec<String> = [
                InitiationType::UserDirected,
                InitiationType::GuidedAutonomous,
                InitiationType::FullyAutonomous,
            ]
            .iter()
            .map(|t| format!("{} {}", t, intents.get(t.as_str()).copied().unwrap_or(0)))
            .collect();
            println!("  Intent: {}", rendered.join(", "));
        }

        if analyzed.patterns.is_empty() {
            println!("  No struggle patterns detected");
        } else {
            println!("  Findings:");
            for pattern in &analyzed.patterns {
                let location = pattern
                    .kind
                    .first_index()
                    .map(|i| format!(" @#{}", i))
                    .unwrap_or_default();
                println!(
                    "    [{}] {}{}: {}",
                    pattern.severity.as_str(),
                    pattern.name(),
                    location,
                    pattern.kind.describe()
                );
            }
        }

        if verbose {
            let c = &analyzed.connections;
            if !c.concepts.is_empty() {
                let concepts: Vec<&str> = c.concepts.iter().map(|s| s.as_str()).collect();
                println!("  Concepts: {}", concepts.join(", "));
            }
            if !c.errors.is_empty() {
                let errors: Vec<&str> = c.errors.iter().map(|s| s.as_str()).collect();
                println!("  Errors: {}", errors.join(", "));
            }
            if !c.solutions.is_empty() {
                println!("  Solutions: {}", c.solutions.len());
            }
            if session.corrupted_lines > 0 {
                println!("  Corrupted lines: {}", session.corrupted_lines);
            }
            for issue in &session.data_quality_issues {
                println!("  Data quality: {}", issue);
            }
        }

        if let Some(matches) = similar.get(&session.session_id) {
            for m in matches {
                println!(
                    "  Similar: {} ({}, score {})",
                    m.session_id, m.project, m.score
                );
            }
        }
        println!();
    }

    for (path, reason) in &result.skipped {
        if verbose {
            println!("Skipped {}: {}", path.display(), reason.as_str());
        }
    }
    for (path, error) in &result.errors {
        eprintln!("Error in {}: {}", path.display(), error);
    }

    let findings: usize = result.sessions.iter().map(|s| s.patterns.len()).sum();
    let struggling = result
        .sessions
        .iter()
        .filter(|s| s.session.has_struggle)
        .count();
    println!("---");
    println!(
        "Analyzed {} session(s) from {} file(s): {} with struggle, {} finding(s)",
        result.sessions.len(),
        result.files_processed,
        struggling,
        findings
    );
    println!(
        "Skipped {} file(s) ({} self-generated), {} error(s)",
        result.skipped.len(),
        result.self_generated_count(),
        result.errors.len()
    );
}

fn print_json(result: &BatchResult, similar: &BTreeMap<String, Vec<SimilarSession>>) -> Result<()> {
    let sessions: Vec<serde_json::Value> = result
        .sessions
        .iter()
        .map(|analyzed| {
            let s = &analyzed.session;
            serde_json::json!({
                "session_id": s.session_id,
                "project_name": s.project_name,
                "source_path": s.source_path,
                "start_time": s.start_time,
                "end_time": s.end_time,
                "duration_seconds": s.duration_seconds,
                "active_duration_seconds": s.active_duration_seconds,
                "duration_analysis": s.duration_analysis,
                "entry_count": s.entry_count,
                "user_message_count": s.user_message_count,
                "assistant_message_count": s.assistant_message_count,
                "human_prompt_count": s.human_prompt_count,
                "tool_usage": s.tool_usage,
                "intent_counts": intent_counts(analyzed),
                "error_count": s.error_count,
                "corrupted_lines": s.corrupted_lines,
                "data_quality_issues": s.data_quality_issues,
                "has_struggle": s.has_struggle,
                "struggle_indicators": s.struggle_indicators,
                "patterns": analyzed.patterns,
                "knowledge": analyzed.connections,
                "similar": similar.get(&s.session_id),
            })
        })
        .collect();

    let skipped: Vec<serde_json::Value> = result
        .skipped
        .iter()
        .map(|(path, reason)| serde_json::json!({"path": path, "reason": reason.as_str()}))
        .collect();
    let errors: Vec<serde_json::Value> = result
        .errors
        .iter()
        .map(|(path, error)| serde_json::json!({"path": path, "error": error}))
        .collect();

    let output = serde_json::json!({
        "files_processed": result.files_processed,
        "sessions": sessions,
        "skipped": skipped,
        "errors": errors,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
