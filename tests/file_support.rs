//! Upload behavior through the CLI: supported formats, extraction
//! failures, size limits, directories and replacement semantics.
//!
//! Uploading never contacts a provider, so no mock server is needed.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn docubot_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.push("docubot");
    path
}

fn setup_upload_env(max_file_bytes: Option<u64>) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    let files_dir = root.join("files");
    fs::create_dir_all(files_dir.join("nested")).unwrap();
    fs::write(files_dir.join("notes.txt"), "Quarterly revenue grew by 12%.").unwrap();
    fs::write(files_dir.join("readme.md"), "# Handbook\n\nOffice hours are 9 to 5.").unwrap();
    fs::write(files_dir.join("nested").join("deep.txt"), "Nested file text.").unwrap();
    fs::write(files_dir.join("broken.pdf"), b"not a valid pdf").unwrap();
    fs::write(files_dir.join("image.png"), [0x89, b'P', b'N', b'G']).unwrap();

    let mut config_content = format!(
        "[sessions]\ndir = \"{}/chat_histories\"\n",
        root.display()
    );
    if let Some(limit) = max_file_bytes {
        config_content.push_str(&format!("\n[upload]\nmax_file_bytes = {}\n", limit));
    }
    let config_path = root.join("docubot.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_docubot(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(docubot_binary())
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env_remove("OPENAI_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run docubot at {:?}: {}", docubot_binary(), e));
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

fn file(tmp: &TempDir, rel: &str) -> String {
    tmp.path().join("files").join(rel).display().to_string()
}

fn session_record(tmp: &TempDir) -> serde_json::Value {
    let dir = tmp.path().join("chat_histories");
    let mut files: Vec<PathBuf> = fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1, "expected one session in {:?}", dir);
    let path = files.remove(0);
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn file_support_text_formats_upload() {
    let (tmp, config) = setup_upload_env(None);

    let (stdout, stderr, success) = run_docubot(
        &config,
        &["upload", &file(&tmp, "notes.txt"), &file(&tmp, "readme.md")],
    );
    assert!(success, "upload failed: {}", stderr);
    assert!(stdout.contains("Uploaded 2 file(s)"));
    assert!(!stderr.contains("Warning"));

    let record = session_record(&tmp);
    assert_eq!(
        record["uploaded_file_names"],
        serde_json::json!(["notes.txt", "readme.md"])
    );
    assert_eq!(record["document_texts"][0], "Quarterly revenue grew by 12%.");
    assert!(record["document_texts"][1]
        .as_str()
        .unwrap()
        .contains("Office hours"));
}

#[test]
fn file_support_corrupt_pdf_keeps_slot() {
    let (tmp, config) = setup_upload_env(None);

    let (stdout, stderr, success) = run_docubot(
        &config,
        &["upload", &file(&tmp, "broken.pdf"), &file(&tmp, "notes.txt")],
    );
    assert!(success, "upload failed: {}", stderr);
    assert!(stderr.contains("Warning: Could not extract text from broken.pdf"));
    assert!(stdout.contains("(1 with text)"));

    let record = session_record(&tmp);
    assert_eq!(
        record["uploaded_file_names"],
        serde_json::json!(["broken.pdf", "notes.txt"])
    );
    assert_eq!(record["document_texts"][0], "");
}

#[test]
fn file_support_max_size_skipped() {
    let (tmp, config) = setup_upload_env(Some(20));

    let (_, stderr, success) = run_docubot(
        &config,
        &["upload", &file(&tmp, "notes.txt"), &file(&tmp, "nested/deep.txt")],
    );
    assert!(success, "upload failed: {}", stderr);
    assert!(stderr.contains("Could not extract text from notes.txt"));
    assert!(stderr.contains("byte limit"));

    let record = session_record(&tmp);
    assert_eq!(record["document_texts"], serde_json::json!(["", "Nested file text."]));
}

#[test]
fn file_support_directory_upload() {
    let (tmp, config) = setup_upload_env(None);

    let dir = tmp.path().join("files").display().to_string();
    let (_, stderr, success) = run_docubot(&config, &["upload", &dir]);
    assert!(success, "upload failed: {}", stderr);

    let record = session_record(&tmp);
    assert_eq!(
        record["uploaded_file_names"],
        serde_json::json!(["broken.pdf", "deep.txt", "notes.txt", "readme.md"])
    );
}

#[test]
fn file_support_upload_replaces_documents() {
    let (tmp, config) = setup_upload_env(None);

    run_docubot(&config, &["upload", &file(&tmp, "notes.txt")]);
    let (_, stderr, success) = run_docubot(&config, &["upload", &file(&tmp, "readme.md")]);
    assert!(success, "upload failed: {}", stderr);

    let record = session_record(&tmp);
    assert_eq!(record["uploaded_file_names"], serde_json::json!(["readme.md"]));
}

#[test]
fn file_support_missing_path_is_error() {
    let (tmp, config) = setup_upload_env(None);

    run_docubot(&config, &["upload", &file(&tmp, "notes.txt")]);
    let (_, stderr, success) = run_docubot(&config, &["upload", &file(&tmp, "missing.pdf")]);
    assert!(!success);
    assert!(stderr.contains("No such file or directory"));

    let record = session_record(&tmp);
    assert_eq!(record["uploaded_file_names"], serde_json::json!(["notes.txt"]));
}
