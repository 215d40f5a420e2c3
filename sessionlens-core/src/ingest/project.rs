//! Project name resolution
//!
//! Resolution order:
//!
//! 1. A file made only of summary records is `"summary-session"`.
//! 2. The last component of the first `cwd` seen in the leading records.
//! 3. The log's parent directory. Claude-style encoded directories
//!    (`-Users-alice-dev-my-app`) are decoded; otherwise ancestors are walked
//!    upward, skipping generic directory names.
//! 4. The file's stem.

use super::reader::ParsedLog;
use std::path::{Component, Path};

/// Project name used for files that hold nothing but summaries.
pub const SUMMARY_SESSION: &str = "summary-session";

/// Directory names that never name a project on their own.
const NON_PROJECT_DIRS: &[&str] = &[
    "users",
    "home",
    "root",
    "dev",
    "src",
    "code",
    "projects",
    "project",
    "repos",
    "repo",
    "workspace",
    "workspaces",
    "documents",
    "desktop",
    "downloads",
    "git",
    "github",
    "work",
    "tmp",
    "var",
    "data",
    "logs",
    "sessions",
];

/// Directories that are followed by a user name.
const HOME_ROOTS: &[&str] = &["users", "home"];

fn is_non_project(name: &str) -> bool {
    NON_PROJECT_DIRS.contains(&name.to_ascii_lowercase().as_str())
}

fn is_home_root(name: &str) -> bool {
    HOME_ROOTS.contains(&name.to_ascii_lowercase().as_str())
}

/// Resolve the project name for a parsed log.
pub fn resolve_project_name(path: &Path, parsed: &ParsedLog, probe_records: usize) -> String {
    if parsed.is_summary_only() {
        return SUMMARY_SESSION.to_string();
    }

    if let Some(name) = parsed
        .records
        .iter()
        .take(probe_records)
        .find_map(|r| r.cwd.as_deref())
        .and_then(last_component)
    {
        return name;
    }

    if let Some(name) = from_log_path(path) {
        return name;
    }

    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Final normal component of a path, accepting both separators.
fn last_component(cwd: &str) -> Option<String> {
    cwd.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn from_log_path(path: &Path) -> Option<String> {
    let parent = path.parent()?;
    let dir_name = parent.file_name()?.to_str()?;

    if dir_name.starts_with('-') {
        return decode_encoded_dir(dir_name);
    }

    let names: Vec<&str> = parent
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();

    names
        .iter()
        .enumerate()
        .rev()
        .find(|(i, name)| {
            let after_home_root = *i > 0 && is_home_root(names[i - 1]);
            !name.starts_with('.') && !is_non_project(name) && !after_home_root
        })
        .map(|(_, name)| name.to_string())
}

/// Decode a Claude-encoded project directory such as `-Users-alice-dev-my-app`.
///
/// The encoding maps `/` to `-`, so dashes inside the project name cannot be
/// told apart from separators. Everything after the home directory and any
/// generic leading directories is taken as the project name.
fn decode_encoded_dir(dir_name: &str) -> Option<String> {
    let parts: Vec<&str> = dir_name.split('-').filter(|p| !p.is_empty()).collect();
    let mut rest: &[&str] = &parts;

    match rest.first() {
        Some(first) if is_home_root(first) => rest = rest.get(2..).unwrap_or(&[]),
        Some(first) if first.eq_ignore_ascii_case("root") => rest = &rest[1..],
        _ => {}
    }

    while let Some(first) = rest.first() {
        if is_non_project(first) {
            rest = &rest[1..];
        } else {
            break;
        }
    }

    if rest.is_empty() {
        None
    } else {
        Some(rest.join("-"))
    }
}
