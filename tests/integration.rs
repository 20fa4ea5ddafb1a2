use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn zerodev_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("zerodev");
    path
}

fn write_workspace(ws: &Path) {
    fs::create_dir_all(ws.join("src")).unwrap();
    fs::create_dir_all(ws.join("scripts")).unwrap();

    let parser: Vec<String> = (0..50)
        .map(|i| format!("def parse_token_{}(stream):\n    return stream.read({})", i, i))
        .collect();
    fs::write(ws.join("src/parser.py"), parser.join("\n")).unwrap();
    fs::write(
        ws.join("src/util.js"),
        "export function clamp(x, lo, hi) {\n  return Math.min(Math.max(x, lo), hi);\n}\n",
    )
    .unwrap();
    fs::write(ws.join("scripts/build.sh"), "#!/bin/sh\ncargo build --release\n").unwrap();
    fs::write(ws.join("README.md"), "# Demo workspace\n").unwrap();
}

fn write_config(root: &Path, workspace: Option<&Path>) -> PathBuf {
    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let mut config_content = format!(
        r#"[db]
path = "{}/data/zerodev.sqlite"

[indexing]
window_size = 20
slice_size = 2

[retrieval]
top_k = 20
context_length = 2048
"#,
        root.display()
    );
    if let Some(ws) = workspace {
        config_content.push_str(&format!(
            "\n[workspace]\nroot = \"{}\"\nexclude_globs = []\n",
            ws.display()
        ));
    }

    let config_path = config_dir.join("zerodev.toml");
    fs::write(&config_path, config_content).unwrap();
    config_path
}

fn setup_test_env() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    let ws = root.join("ws");
    write_workspace(&ws);
    let config_path = write_config(&root, Some(&ws));
    (tmp, config_path, ws)
}

fn run_zerodev(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = zerodev_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run zerodev binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn payload(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).unwrap_or_else(|e| panic!("bad payload {:?}: {}", stdout, e))
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path, _ws) = setup_test_env();

    let (stdout, stderr, success) = run_zerodev(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/zerodev.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path, _ws) = setup_test_env();

    let (_, _, success1) = run_zerodev(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_zerodev(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_index_workspace() {
    let (_tmp, config_path, _ws) = setup_test_env();

    run_zerodev(&config_path, &["init"]);
    let (stdout, stderr, success) = run_zerodev(&config_path, &["index", "--progress", "off"]);
    assert!(success, "index failed: stdout={}, stderr={}", stdout, stderr);
    // parser.py: 100 lines -> 10 windows; util.js: 4 lines; build.sh: 3 lines
    assert!(stdout.contains("files: 3"), "stdout={}", stdout);
    assert!(stdout.contains("chunks: 12"), "stdout={}", stdout);
    assert!(stdout.contains("ok"));
}

#[test]
fn test_index_dry_run_writes_nothing() {
    let (_tmp, config_path, _ws) = setup_test_env();

    run_zerodev(&config_path, &["init"]);
    let (stdout, _, success) = run_zerodev(&config_path, &["index", "--dry-run", "--progress", "off"]);
    assert!(success);
    assert!(stdout.contains("(dry-run)"));
    assert!(stdout.contains("chunks: 12"));

    let (stdout, _, success) = run_zerodev(&config_path, &["status"]);
    assert!(success);
    assert!(stdout.contains("Snapshot:    none"), "stdout={}", stdout);
}

#[test]
fn test_index_without_sources_saves_nothing() {
    let tmp = TempDir::new().unwrap();
    let ws = tmp.path().join("docs");
    fs::create_dir_all(&ws).unwrap();
    fs::write(ws.join("notes.md"), "# only markdown here\n").unwrap();
    let config_path = write_config(tmp.path(), Some(&ws));

    let (stdout, stderr, success) = run_zerodev(&config_path, &["index", "--progress", "off"]);
    assert!(success, "stderr={}", stderr);
    assert!(stdout.contains("No files to save."));
}

#[test]
fn test_index_without_workspace_saves_nothing() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(tmp.path(), None);

    let (stdout, stderr, success) = run_zerodev(&config_path, &["index"]);
    assert!(success, "stderr={}", stderr);
    assert!(stdout.contains("No files to save."));
    assert!(stderr.contains("no workspace folder is open"), "stderr={}", stderr);
}

#[test]
fn test_index_root_flag_overrides_config() {
    let tmp = TempDir::new().unwrap();
    let ws = tmp.path().join("ws");
    write_workspace(&ws);
    let config_path = write_config(tmp.path(), None);

    let (stdout, stderr, success) = run_zerodev(
        &config_path,
        &["index", "--root", ws.to_str().unwrap(), "--progress", "off"],
    );
    assert!(success, "stderr={}", stderr);
    assert!(stdout.contains("chunks: 12"));
}

#[test]
fn test_index_json_progress() {
    let (_tmp, config_path, _ws) = setup_test_env();

    let (_, stderr, success) = run_zerodev(&config_path, &["index", "--progress", "json"]);
    assert!(success);
    assert!(stderr.contains(r#""phase":"scanning""#), "stderr={}", stderr);
    assert!(stderr.contains(r#""phase":"windowing""#));
}

#[test]
fn test_index_unknown_progress_mode_errors() {
    let (_tmp, config_path, _ws) = setup_test_env();

    let (_, stderr, success) = run_zerodev(&config_path, &["index", "--progress", "loud"]);
    assert!(!success);
    assert!(stderr.contains("unknown progress mode"));
}

#[test]
fn test_status_after_index() {
    let (_tmp, config_path, _ws) = setup_test_env();

    run_zerodev(&config_path, &["index", "--progress", "off"]);
    let (stdout, stderr, success) = run_zerodev(&config_path, &["status"]);
    assert!(success, "stderr={}", stderr);
    assert!(stdout.contains("Files:       3"), "stdout={}", stdout);
    assert!(stdout.contains("Chunks:      12"));
    assert!(stdout.contains("stride 10"));
}

#[test]
fn test_search_ranks_same_file_first() {
    let (_tmp, config_path, ws) = setup_test_env();

    run_zerodev(&config_path, &["index", "--progress", "off"]);
    let query = ws.join("src/parser.py");
    let (stdout, stderr, success) =
        run_zerodev(&config_path, &["search", "--file", query.to_str().unwrap(), "--limit", "3"]);
    assert!(success, "stderr={}", stderr);
    assert!(stdout.starts_with("1. ["), "stdout={}", stdout);
    let first = stdout.lines().next().unwrap();
    assert!(first.contains("src/parser.py"), "first={}", first);
    assert!(stdout.contains("3. ["));
    assert!(!stdout.contains("4. ["));
}

#[test]
fn test_search_without_index() {
    let (_tmp, config_path, ws) = setup_test_env();

    let query = ws.join("src/util.js");
    let (stdout, _, success) = run_zerodev(&config_path, &["search", "--file", query.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_search_missing_file_errors() {
    let (_tmp, config_path, ws) = setup_test_env();

    let query = ws.join("src/nope.py");
    let (_, stderr, success) = run_zerodev(&config_path, &["search", "--file", query.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("no active context"), "stderr={}", stderr);
}

#[test]
fn test_context_for_python_file() {
    let (_tmp, config_path, ws) = setup_test_env();

    run_zerodev(&config_path, &["index", "--progress", "off"]);
    let query = ws.join("src/parser.py");
    let (stdout, stderr, success) = run_zerodev(&config_path, &["context", "--file", query.to_str().unwrap()]);
    assert!(success, "stderr={}", stderr);
    assert!(stdout.starts_with(
        "# Here are some relevant code fragments from other files of the repo:\n# ----------"
    ));
    assert!(stdout.contains("# the below code fragment can be found in: src/parser.py"));
    assert!(stderr.contains("context:"));
}

#[test]
fn test_context_uses_slash_comments_for_js() {
    let (_tmp, config_path, ws) = setup_test_env();

    run_zerodev(&config_path, &["index", "--progress", "off"]);
    let query = ws.join("src/util.js");
    let (stdout, stderr, success) = run_zerodev(&config_path, &["context", "--file", query.to_str().unwrap()]);
    assert!(success, "stderr={}", stderr);
    assert!(stdout.starts_with("// Here are some relevant code fragments"));
    assert!(stdout.contains("// the below code fragment can be found in: src/util.js"));
}

#[test]
fn test_context_unsupported_language_errors() {
    let (_tmp, config_path, ws) = setup_test_env();

    run_zerodev(&config_path, &["index", "--progress", "off"]);
    let query = ws.join("README.md");
    let (_, stderr, success) = run_zerodev(&config_path, &["context", "--file", query.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("language not supported"), "stderr={}", stderr);
}

#[test]
fn test_prompt_normal_has_no_context() {
    let (_tmp, config_path, _ws) = setup_test_env();

    let (stdout, stderr, success) = run_zerodev(&config_path, &["prompt", "write a quicksort"]);
    assert!(success, "stderr={}", stderr);
    let json = payload(&stdout);
    assert_eq!(json["prompt"], "write a quicksort");
    assert_eq!(json["context"], "");
    assert_eq!(json["command"], "gen");
    assert!(json["linting_log"].is_null());
}

#[test]
fn test_prompt_repo_attaches_context() {
    let (_tmp, config_path, ws) = setup_test_env();

    run_zerodev(&config_path, &["index", "--progress", "off"]);
    let query = ws.join("src/parser.py");
    let (stdout, stderr, success) = run_zerodev(
        &config_path,
        &["prompt", "@repo add a tokenizer", "--file", query.to_str().unwrap()],
    );
    assert!(success, "stderr={}", stderr);
    let json = payload(&stdout);
    assert_eq!(json["prompt"], "@repo add a tokenizer");
    let context = json["context"].as_str().unwrap();
    assert!(context.contains("can be found in: src/parser.py"));
}

#[test]
fn test_prompt_repo_degrades_to_empty_context() {
    let (_tmp, config_path, ws) = setup_test_env();

    run_zerodev(&config_path, &["index", "--progress", "off"]);
    let query = ws.join("README.md");
    let (stdout, stderr, success) = run_zerodev(
        &config_path,
        &["prompt", "@repo summarize", "--file", query.to_str().unwrap()],
    );
    assert!(success, "stderr={}", stderr);
    assert_eq!(payload(&stdout)["context"], "");
    assert!(stderr.contains("language not supported"));
}

#[test]
fn test_prompt_file_attaches_document() {
    let (_tmp, config_path, ws) = setup_test_env();

    let query = ws.join("scripts/build.sh");
    let (stdout, _, success) = run_zerodev(
        &config_path,
        &["prompt", "@file add a test step", "--file", query.to_str().unwrap()],
    );
    assert!(success);
    assert_eq!(payload(&stdout)["context"], "#!/bin/sh\ncargo build --release\n");
}

#[test]
fn test_prompt_empty_errors() {
    let (_tmp, config_path, _ws) = setup_test_env();

    let (_, _, success) = run_zerodev(&config_path, &["prompt", "   "]);
    assert!(!success);
}

#[test]
fn test_invalid_config_errors() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("bad.toml");
    fs::write(
        &config_path,
        "[db]\npath = \"x.sqlite\"\n[indexing]\nslice_size = 0\n",
    )
    .unwrap();

    let (_, stderr, success) = run_zerodev(&config_path, &["status"]);
    assert!(!success);
    assert!(stderr.contains("slice_size"));
}
