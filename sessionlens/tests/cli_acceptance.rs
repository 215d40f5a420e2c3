use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        seed_claude_fixture(&home);

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn default_graph_path(&self) -> PathBuf {
        self.xdg_data.join("sessionlens/knowledge_graph.json")
    }

    fn projects_dir(&self) -> PathBuf {
        self.home.join(".claude/projects")
    }
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../sessionlens-core/tests/fixtures/claude")
        .join(name)
}

fn seed_claude_fixture(home: &Path) {
    let target = home
        .join(".claude/projects/-Users-x-dev-my-app")
        .join("loop-session.jsonl");

    fs::create_dir_all(target.parent().expect("missing fixture parent"))
        .expect("failed to create claude fixture directories");
    fs::copy(fixture("-Users-x-dev-my-app/loop-session.jsonl"), target)
        .expect("failed to copy claude fixture");
}

fn run_analyze(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("sessionlens-analyze"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute sessionlens-analyze: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    panic!(
        "sessionlens-analyze {:?} failed\nstatus: {:?}\nstdout:\n{}\nstderr:\n{}",
        args,
        output.status.code(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn analyze_default_root_reports_findings() {
    let env = CliTestEnv::new();
    let args = ["--no-graph"];
    let output = run_analyze(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Session: session-20250301-090000-loop-session (my-app)"));
    assert!(stdout.contains("simple_loop"));
    assert!(stdout.contains("Analyzed 1 session(s) from 1 file(s)"));
    assert!(!env.default_graph_path().exists());
}

#[test]
fn analyze_json_updates_graph() {
    let env = CliTestEnv::new();
    let graph = env.home.join("graph.json");
    let projects = env.projects_dir();
    let graph_arg = graph.to_string_lossy().to_string();
    let projects_arg = projects.to_string_lossy().to_string();
    let args = [
        projects_arg.as_str(),
        "--graph",
        graph_arg.as_str(),
        "--format",
        "json",
        "--similar",
    ];

    let output = run_analyze(&env, &args);
    assert_success(&args, &output);

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    let sessions = report["sessions"].as_array().expect("sessions array");
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["project_name"], "my-app");
    assert_eq!(sessions[0]["has_struggle"], true);
    assert!(sessions[0]["patterns"]
        .as_array()
        .expect("patterns array")
        .iter()
        .any(|p| p["type"] == "simple_loop"));
    // The only session in the graph is the session itself
    assert_eq!(sessions[0]["similar"], serde_json::json!([]));

    assert!(graph.exists());
    let document: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&graph).expect("graph should be readable"))
            .expect("graph should be JSON");
    assert!(document["sessions"]
        .get("session-20250301-090000-loop-session")
        .is_some());
}

#[test]
fn analyze_default_graph_location() {
    let env = CliTestEnv::new();
    let output = run_analyze(&env, &[]);
    assert_success(&[], &output);
    assert!(env.default_graph_path().exists());
}

#[test]
fn analyze_skips_self_generated_logs() {
    let env = CliTestEnv::new();
    let target = env.projects_dir().join("-Users-x-dev-tools/self-generated.jsonl");
    fs::create_dir_all(target.parent().expect("missing parent")).expect("failed to create dir");
    fs::copy(fixture("self-generated.jsonl"), &target).expect("failed to copy fixture");

    let args = ["--no-graph"];
    let output = run_analyze(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Analyzed 1 session(s) from 2 file(s)"));
    assert!(stdout.contains("(1 self-generated)"));
}

#[test]
fn analyze_fails_without_sessions() {
    let env = CliTestEnv::new();
    let summary = fixture("summary-only.jsonl");
    let summary_arg = summary.to_string_lossy().to_string();
    let args = [summary_arg.as_str(), "--no-graph"];

    let output = run_analyze(&env, &args);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no sessions found"), "stderr: {stderr}");
}

#[test]
fn analyze_fails_on_empty_directory() {
    let env = CliTestEnv::new();
    let empty = env.home.join("empty");
    fs::create_dir_all(&empty).expect("failed to create dir");
    let empty_arg = empty.to_string_lossy().to_string();
    let args = [empty_arg.as_str()];

    let output = run_analyze(&env, &args);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No log files found"), "stderr: {stderr}");
}
