use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn docent_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("docent");
    path
}

/// Tempdir with a plain-text document and a career-domain config whose
/// providers point at an unroutable local port, so upstream calls fail
/// fast instead of hanging.
fn setup_test_env(profile: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    fs::create_dir_all(root.join("config")).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();

    fs::write(
        root.join("handbook.txt"),
        "Data analysts need statistics, SQL, and communication skills.\n\n\
         Software engineers typically hold a computer science degree.\n\n\
         Pilots require flight school training and medical certification.",
    )
    .unwrap();

    let config_content = format!(
        r#"[document]
path = "{root}/handbook.txt"

[chunking]
max_tokens = 700

[embedding]
provider = "ollama"
model = "nomic-embed-text"
dims = 768
url = "http://127.0.0.1:9"
max_retries = 0
timeout_secs = 2

[generation]
model = "llama3"
url = "http://127.0.0.1:9"
max_retries = 0
timeout_secs = 2

[index]
backend = "sqlite"
path = "{root}/data/index.sqlite"

[domain]
profile = "{profile}"

[server]
bind = "127.0.0.1:7461"
"#,
        root = root.display(),
        profile = profile,
    );

    let config_path = root.join("config").join("docent.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_docent(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = docent_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run docent binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn ingest_dry_run_reports_counts_without_writing() {
    let (tmp, config_path) = setup_test_env("career");

    let (stdout, stderr, success) = run_docent(&config_path, &["ingest", "--dry-run"]);
    assert!(success, "dry-run failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("pages read: 1"));
    assert!(stdout.contains("chunks: 1"));
    assert!(stdout.contains("dry-run"));
    assert!(!tmp.path().join("data/index.sqlite").exists());
}

#[test]
fn ingest_fails_cleanly_when_embedding_backend_is_down() {
    let (_tmp, config_path) = setup_test_env("career");

    let (stdout, stderr, success) = run_docent(&config_path, &["ingest"]);
    assert!(!success, "ingest should fail: stdout={}", stdout);
    assert!(stderr.contains("embedding a chunk batch"), "stderr={}", stderr);
}

#[test]
fn ingest_rejects_unsupported_document_format() {
    let (tmp, config_path) = setup_test_env("career");
    fs::write(tmp.path().join("handbook.docx"), b"zip bytes").unwrap();
    let body = fs::read_to_string(&config_path)
        .unwrap()
        .replace("handbook.txt", "handbook.docx");
    fs::write(&config_path, body).unwrap();

    let (_, stderr, success) = run_docent(&config_path, &["ingest", "--dry-run"]);
    assert!(!success);
    assert!(stderr.contains("unsupported document format"), "stderr={}", stderr);
}

#[test]
fn ask_empty_question_prints_validation_message() {
    let (_tmp, config_path) = setup_test_env("career");

    let (stdout, _, success) = run_docent(&config_path, &["ask", "   "]);
    assert!(success);
    assert!(stdout.contains("Please ask a valid career-related question."));
}

#[test]
fn ask_small_talk_prints_acknowledgement_without_backends() {
    let (_tmp, config_path) = setup_test_env("career");

    // No Ollama is reachable; the short-circuit must answer anyway.
    let (stdout, _, success) = run_docent(&config_path, &["ask", "thanks"]);
    assert!(success);
    assert!(stdout.contains("You're welcome"));
}

#[test]
fn ask_degrades_to_fallback_when_backends_are_down() {
    let (_tmp, config_path) = setup_test_env("career");

    let (stdout, stderr, success) =
        run_docent(&config_path, &["ask", "What skills do data analysts need?"]);
    assert!(success, "ask must not fail: stderr={}", stderr);
    assert!(
        stdout.contains("Something went wrong"),
        "stdout={}, stderr={}",
        stdout,
        stderr
    );
    assert!(stderr.contains("upstream failure"));
}

#[test]
fn hr_profile_does_not_short_circuit_small_talk() {
    let (_tmp, config_path) = setup_test_env("hr");

    // "thanks" reaches retrieval in the HR domain; with the embedding
    // backend down that surfaces as the upstream fallback, not the ack.
    let (stdout, _, success) = run_docent(&config_path, &["ask", "thanks"]);
    assert!(success);
    assert!(!stdout.contains("You're welcome"));
    assert!(stdout.contains("Something went wrong"));
}

#[test]
fn unknown_profile_is_rejected_at_config_load() {
    let (_tmp, config_path) = setup_test_env("career");
    let body = fs::read_to_string(&config_path)
        .unwrap()
        .replace("profile = \"career\"", "profile = \"legal\"");
    fs::write(&config_path, body).unwrap();

    let (_, stderr, success) = run_docent(&config_path, &["ask", "hi"]);
    assert!(!success);
    assert!(stderr.contains("Unknown domain profile"), "stderr={}", stderr);
}
