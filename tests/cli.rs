use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn docsum_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("docsum");
    path
}

fn run_docsum(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = docsum_binary();
    let output = Command::new(&binary)
        .current_dir(dir)
        .env("HOME", dir)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run docsum binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn disabled_config(dir: &Path) -> PathBuf {
    let path = dir.join("docsum.toml");
    fs::write(&path, "[summarizer]\nprovider = \"disabled\"\n").unwrap();
    path
}

#[test]
fn extract_prints_text() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("notes.txt");
    fs::write(&file, "Plain notes about the launch plan.").unwrap();

    let (stdout, stderr, ok) = run_docsum(tmp.path(), &["extract", file.to_str().unwrap()]);
    assert!(ok, "extract failed: {}", stderr);
    assert_eq!(stdout.trim(), "Plain notes about the launch plan.");
}

#[test]
fn extract_rejects_unknown_extension() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("notes.md");
    fs::write(&file, "# heading").unwrap();

    let (_, stderr, ok) = run_docsum(tmp.path(), &["extract", file.to_str().unwrap()]);
    assert!(!ok);
    assert!(stderr.contains("Unsupported file type"));
}

#[test]
fn download_writes_docx_that_extracts_back() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("out.docx");

    let (stdout, stderr, ok) = run_docsum(
        tmp.path(),
        &["download", "Hello world.", "--output", output.to_str().unwrap()],
    );
    assert!(ok, "download failed: {}", stderr);
    assert!(stdout.contains("out.docx"));

    let (text, stderr, ok) = run_docsum(tmp.path(), &["extract", output.to_str().unwrap()]);
    assert!(ok, "extract failed: {}", stderr);
    assert!(text.contains("Document Summary"));
    assert!(text.contains("Hello world."));
}

#[test]
fn download_defaults_to_summary_docx() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, ok) = run_docsum(tmp.path(), &["download", "Short summary."]);
    assert!(ok, "download failed: {}", stderr);
    assert!(tmp.path().join("summary.docx").exists());
}

#[test]
fn summarize_with_disabled_model_prints_error_json() {
    let tmp = TempDir::new().unwrap();
    let config = disabled_config(tmp.path());
    let file = tmp.path().join("notes.txt");
    fs::write(&file, "Some words to summarize.").unwrap();

    let (stdout, _, ok) = run_docsum(
        tmp.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "summarize",
            file.to_str().unwrap(),
            "--length",
            "short",
        ],
    );
    assert!(!ok);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("summarization error"));
    assert!(json.get("summary").is_none());
}

#[test]
fn summarize_empty_file_never_reaches_model() {
    let tmp = TempDir::new().unwrap();
    let config = disabled_config(tmp.path());
    let file = tmp.path().join("empty.txt");
    fs::write(&file, "").unwrap();

    let (stdout, _, ok) = run_docsum(
        tmp.path(),
        &["--config", config.to_str().unwrap(), "summarize", file.to_str().unwrap()],
    );
    assert!(!ok);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("no extractable words"));
}

#[test]
fn summarize_rejects_unknown_extension_before_loading_model() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("notes.md");
    fs::write(&file, "# heading\n\nSome notes.").unwrap();

    // Default config: the local model would be fetched into $HOME/.cache.
    let (stdout, _, ok) = run_docsum(tmp.path(), &["summarize", file.to_str().unwrap()]);
    assert!(!ok);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["error"], "unsupported file type: notes.md");
    assert!(!tmp.path().join(".cache").exists());
}

#[test]
fn invalid_config_is_reported() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("bad.toml");
    fs::write(&config, "[summarizer]\nprovider = \"cloud\"\n").unwrap();
    let file = tmp.path().join("notes.txt");
    fs::write(&file, "words").unwrap();

    let (_, stderr, ok) = run_docsum(
        tmp.path(),
        &["--config", config.to_str().unwrap(), "summarize", file.to_str().unwrap()],
    );
    assert!(!ok);
    assert!(stderr.contains("Unknown summarizer provider"));
}
