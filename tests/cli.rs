use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn citeseek_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("citeseek");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    fs::write(
        root.join("notes.txt"),
        "Rust ownership notes.\n\n\nSecond page about borrowing and lifetimes.",
    )
    .unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/citeseek.sqlite"

[chunking]
max_tokens = 700
overlap_tokens = 80

[retrieval]
top_k = 3

[server]
bind = "127.0.0.1:7979"
"#,
        root.display()
    );

    let config_path = config_dir.join("citeseek.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_citeseek(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = citeseek_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        // Provider constructors must fail deterministically, not pick
        // up a key from the developer's shell.
        .env_remove("OPENAI_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run citeseek binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_citeseek(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_citeseek(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_citeseek(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_documents_empty_on_fresh_database() {
    let (_tmp, config_path) = setup_test_env();

    run_citeseek(&config_path, &["init"]);
    let (stdout, stderr, success) = run_citeseek(&config_path, &["documents"]);
    assert!(
        success,
        "documents failed: stdout={}, stderr={}",
        stdout, stderr
    );
    assert!(stdout.contains("No documents."));
}

#[test]
fn test_delete_nonexistent_document_fails() {
    let (_tmp, config_path) = setup_test_env();

    run_citeseek(&config_path, &["init"]);
    let (_, stderr, success) = run_citeseek(&config_path, &["delete", "no-such-id"]);
    assert!(!success, "delete of missing document should fail");
    assert!(stderr.contains("not found"));
}

#[test]
fn test_upload_without_api_key_fails_cleanly() {
    let (tmp, config_path) = setup_test_env();

    run_citeseek(&config_path, &["init"]);
    let notes = tmp.path().join("notes.txt");
    let (_, stderr, success) =
        run_citeseek(&config_path, &["upload", notes.to_str().unwrap()]);
    assert!(!success, "upload without OPENAI_API_KEY should fail");
    assert!(stderr.contains("OPENAI_API_KEY"));
}

#[test]
fn test_default_config_when_file_missing() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");

    // With defaults the db lands in ./data relative to cwd, so point
    // cwd at the temp dir.
    let binary = citeseek_binary();
    let output = Command::new(&binary)
        .current_dir(tmp.path())
        .arg("--config")
        .arg(missing.to_str().unwrap())
        .arg("init")
        .env_remove("OPENAI_API_KEY")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "init with missing config should use defaults: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_invalid_config_rejected() {
    let (tmp, _) = setup_test_env();

    let bad = format!(
        r#"[db]
path = "{}/data/citeseek.sqlite"

[chunking]
max_tokens = 100
overlap_tokens = 100
"#,
        tmp.path().display()
    );
    let bad_path = tmp.path().join("config").join("bad.toml");
    fs::write(&bad_path, bad).unwrap();

    let (_, stderr, success) = run_citeseek(&bad_path, &["init"]);
    assert!(!success, "overlap >= max_tokens must be rejected");
    assert!(
        stderr.contains("overlap"),
        "expected overlap validation error, got: {}",
        stderr
    );
}
