use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn wmem_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("wmem");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    // A small browser export: two history pages and one bookmark.
    fs::write(
        root.join("export.json"),
        r#"[
  {
    "url": "https://docs.rs/tokio/latest/tokio/",
    "title": "tokio - Rust",
    "snippet": "An asynchronous runtime for the Rust programming language.",
    "websiteSource": "history",
    "visitCount": 12,
    "lastVisited": "2026-08-20T10:00:00Z",
    "textChunks": ["Tokio is an asynchronous runtime for Rust programming."],
    "knowledge": {
      "entities": [{"name": "Tokio", "entityType": "library"}],
      "topics": [{"name": "async runtime"}, {"name": "Rust programming"}]
    }
  },
  {
    "url": "https://cooking.example.com/sourdough",
    "title": "Perfect Sourdough Bread",
    "snippet": "A step by step sourdough recipe with a long cold proof.",
    "websiteSource": "bookmark",
    "bookmarkDate": "2026-07-01T08:30:00Z",
    "folder": "recipes",
    "pageType": "recipe",
    "textChunks": ["Mix the levain and let the dough rest overnight."],
    "knowledge": {
      "topics": [{"name": "sourdough"}, {"name": "baking"}]
    }
  },
  {
    "url": "https://blog.example.org/borrow-checker",
    "title": "Understanding the Borrow Checker",
    "snippet": "Why Rust programming feels hard at first and how to get past it.",
    "websiteSource": "history",
    "visitCount": 2,
    "lastVisited": "2026-06-15T19:45:00Z",
    "textChunks": ["The borrow checker enforces aliasing rules for Rust programming."]
  }
]"#,
    )
    .unwrap();

    // Low thresholds so short fixture fragments qualify regardless of
    // corpus-dependent bm25 magnitudes.
    let config_content = format!(
        r#"[index]
path = "{}/data/wmem.sqlite"

[retrieval]
min_score = 0.05
resolve_threshold = 0.05
final_limit = 10

[analysis]
provider = "disabled"

[enhancement]
provider = "disabled"
"#,
        root.display()
    );

    let config_path = config_dir.join("wmem.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_wmem(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = wmem_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run wmem binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn export_path(config_path: &Path) -> String {
    config_path
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("export.json")
        .to_str()
        .unwrap()
        .to_string()
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_wmem(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_wmem(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_wmem(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_import_export_file() {
    let (_tmp, config_path) = setup_test_env();

    run_wmem(&config_path, &["init"]);
    let export = export_path(&config_path);
    let (stdout, stderr, success) = run_wmem(&config_path, &["import", &export]);
    assert!(
        success,
        "import failed: stdout={}, stderr={}",
        stdout, stderr
    );
    assert!(stdout.contains("Imported 3 of 3 pages"));
}

#[test]
fn test_import_idempotent_no_duplicates() {
    let (_tmp, config_path) = setup_test_env();

    run_wmem(&config_path, &["init"]);
    let export = export_path(&config_path);

    let (stdout1, _, _) = run_wmem(&config_path, &["import", &export]);
    assert!(stdout1.contains("Imported 3 of 3 pages"));

    // Re-import refreshes pages in place by URL
    let (stdout2, _, _) = run_wmem(&config_path, &["import", &export]);
    assert!(stdout2.contains("Imported 3 of 3 pages"));

    // Search still returns one result per URL
    let (stdout, _, _) = run_wmem(&config_path, &["search", "sourdough", "--no-analysis"]);
    assert_eq!(
        stdout.matches("cooking.example.com/sourdough").count(),
        1,
        "Expected the bookmark URL exactly once, got: {}",
        stdout
    );
}

#[test]
fn test_import_missing_file_errors() {
    let (_tmp, config_path) = setup_test_env();

    run_wmem(&config_path, &["init"]);
    let (_, stderr, success) = run_wmem(&config_path, &["import", "/nonexistent/export.json"]);
    assert!(!success, "import of a missing file should fail");
    assert!(
        stderr.contains("Failed to read export file"),
        "Should report the read failure, got: {}",
        stderr
    );
}

#[test]
fn test_search_finds_matching_page() {
    let (_tmp, config_path) = setup_test_env();

    run_wmem(&config_path, &["init"]);
    let export = export_path(&config_path);
    run_wmem(&config_path, &["import", &export]);

    let (stdout, stderr, success) =
        run_wmem(&config_path, &["search", "sourdough recipe", "--no-analysis"]);
    assert!(
        success,
        "search failed: stdout={}, stderr={}",
        stdout, stderr
    );
    assert!(
        stdout.contains("Perfect Sourdough Bread"),
        "Expected the sourdough page in results, got: {}",
        stdout
    );
    assert!(stdout.contains("bookmark"));
}

#[test]
fn test_search_deterministic() {
    let (_tmp, config_path) = setup_test_env();

    run_wmem(&config_path, &["init"]);
    let export = export_path(&config_path);
    run_wmem(&config_path, &["import", &export]);

    let (stdout1, _, _) = run_wmem(&config_path, &["search", "Rust programming", "--no-analysis"]);
    let (stdout2, _, _) = run_wmem(&config_path, &["search", "Rust programming", "--no-analysis"]);
    assert_eq!(
        stdout1, stdout2,
        "Search results should be deterministic across runs"
    );
}

#[test]
fn test_search_empty_query() {
    let (_tmp, config_path) = setup_test_env();

    run_wmem(&config_path, &["init"]);
    let (stdout, _, success) = run_wmem(&config_path, &["search", ""]);
    assert!(success, "Empty query should not panic");
    assert!(stdout.contains("No results"));
}

#[test]
fn test_search_no_results() {
    let (_tmp, config_path) = setup_test_env();

    run_wmem(&config_path, &["init"]);
    let export = export_path(&config_path);
    run_wmem(&config_path, &["import", &export]);

    let (stdout, _, success) = run_wmem(&config_path, &["search", "xyznonexistent"]);
    assert!(success);
    assert!(stdout.contains("No results"));
}

#[test]
fn test_search_respects_limit() {
    let (_tmp, config_path) = setup_test_env();

    run_wmem(&config_path, &["init"]);
    let export = export_path(&config_path);
    run_wmem(&config_path, &["import", &export]);

    let (stdout, _, success) = run_wmem(
        &config_path,
        &["search", "Rust programming", "--no-analysis", "--limit", "1"],
    );
    assert!(success);
    assert!(
        stdout.contains("1. ") && !stdout.contains("2. "),
        "Expected exactly one numbered result, got: {}",
        stdout
    );
}

#[test]
fn test_search_filter_boosts_domain() {
    let (_tmp, config_path) = setup_test_env();

    run_wmem(&config_path, &["init"]);
    let export = export_path(&config_path);
    run_wmem(&config_path, &["import", &export]);

    // Both Rust pages match; the filter should put the blog first.
    let (stdout, _, success) = run_wmem(
        &config_path,
        &[
            "search",
            "Rust programming",
            "--no-analysis",
            "--filter",
            "blog.example.org",
        ],
    );
    assert!(success);
    let blog_pos = stdout.find("blog.example.org");
    let docs_pos = stdout.find("docs.rs");
    assert!(blog_pos.is_some(), "Expected blog page, got: {}", stdout);
    if let (Some(blog), Some(docs)) = (blog_pos, docs_pos) {
        assert!(
            blog < docs,
            "Filtered domain should rank first, got: {}",
            stdout
        );
    }
}

#[test]
fn test_resolve_prints_single_url() {
    let (_tmp, config_path) = setup_test_env();

    run_wmem(&config_path, &["init"]);
    let export = export_path(&config_path);
    run_wmem(&config_path, &["import", &export]);

    let (stdout, stderr, success) = run_wmem(&config_path, &["resolve", "sourdough recipe"]);
    assert!(
        success,
        "resolve failed: stdout={}, stderr={}",
        stdout, stderr
    );
    assert_eq!(
        stdout.trim(),
        "https://cooking.example.com/sourdough",
        "Expected exactly the bookmark URL, got: {}",
        stdout
    );
}

#[test]
fn test_resolve_no_match() {
    let (_tmp, config_path) = setup_test_env();

    run_wmem(&config_path, &["init"]);
    let (stdout, _, success) = run_wmem(&config_path, &["resolve", "xyznonexistent"]);
    assert!(success, "resolve should not fail on an empty index");
    assert!(stdout.contains("No match"));
}

#[test]
fn test_stats_reports_counts() {
    let (_tmp, config_path) = setup_test_env();

    run_wmem(&config_path, &["init"]);
    let export = export_path(&config_path);
    run_wmem(&config_path, &["import", &export]);

    let (stdout, stderr, success) = run_wmem(&config_path, &["stats"]);
    assert!(
        success,
        "stats failed: stdout={}, stderr={}",
        stdout, stderr
    );
    assert!(stdout.contains("Pages:"));
    assert!(stdout.contains("3"));
    assert!(stdout.contains("By source:"));
    assert!(stdout.contains("history"));
    assert!(stdout.contains("bookmark"));
}

#[test]
fn test_missing_config_errors() {
    let (_tmp, config_path) = setup_test_env();

    let bad_path = config_path.parent().unwrap().join("missing.toml");
    let (_, stderr, success) = run_wmem(&bad_path, &["stats"]);
    assert!(!success, "Missing config should fail");
    assert!(
        stderr.contains("Failed to read config file"),
        "Should report the missing config, got: {}",
        stderr
    );
}
