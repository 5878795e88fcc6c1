use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn repolens_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("repolens");
    path
}

/// Nothing listens on port 9, so both upstreams are unreachable unless a
/// test passes a mock server URL.
const UNREACHABLE: &str = "http://127.0.0.1:9";

fn setup_test_env(github_url: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/repolens.sqlite"

[github]
api_url = "{}"
token_env = "REPOLENS_TEST_UNSET_TOKEN"
timeout_secs = 5

[models]
url = "{}"
probe_timeout_secs = 1

[preview]
default_lines = 5
"#,
        root.display(),
        github_url,
        UNREACHABLE
    );

    let config_path = config_dir.join("repolens.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_repolens(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = repolens_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run repolens binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

/// First whitespace-separated token of the line containing `needle`.
fn id_on_line(stdout: &str, needle: &str) -> String {
    stdout
        .lines()
        .find(|l| l.contains(needle))
        .unwrap_or_else(|| panic!("no line containing {needle} in:\n{stdout}"))
        .split_whitespace()
        .next()
        .unwrap()
        .to_string()
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env(UNREACHABLE);

    let (stdout, stderr, success) = run_repolens(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data").join("repolens.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env(UNREACHABLE);

    let (_, _, success1) = run_repolens(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_repolens(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_repos_empty() {
    let (_tmp, config_path) = setup_test_env(UNREACHABLE);
    let (stdout, stderr, success) = run_repolens(&config_path, &["repos"]);
    assert!(success, "repos failed: {}", stderr);
    assert!(stdout.contains("No repositories."));
}

#[test]
fn test_status_with_model_server_down() {
    let (_tmp, config_path) = setup_test_env(UNREACHABLE);
    let (stdout, stderr, success) = run_repolens(&config_path, &["status"]);
    assert!(success, "status failed: {}", stderr);
    assert!(stdout.contains("available:    no"));
    assert!(stdout.contains("github token: not set"));
    assert!(stdout.contains("codellama:7b"));
    assert!(stdout.contains("missing"));
}

#[test]
fn test_ingest_invalid_url_fails() {
    let (_tmp, config_path) = setup_test_env(UNREACHABLE);
    let (_, stderr, success) = run_repolens(&config_path, &["ingest", "not-a-repo"]);
    assert!(!success);
    assert!(stderr.contains("invalid repository URL"));
}

#[test]
fn test_ingest_unreachable_api_reports_no_files() {
    let (_tmp, config_path) = setup_test_env(UNREACHABLE);
    let (_, stderr, success) = run_repolens(
        &config_path,
        &["ingest", "https://github.com/acme/widgets"],
    );
    assert!(!success);
    assert!(stderr.contains("unable to fetch repository files for acme/widgets"));
}

#[test]
fn test_unknown_ids_fail() {
    let (_tmp, config_path) = setup_test_env(UNREACHABLE);

    let (_, stderr, success) = run_repolens(&config_path, &["preview", "missing"]);
    assert!(!success);
    assert!(stderr.contains("file not found"));

    let (_, stderr, success) = run_repolens(&config_path, &["forget", "missing"]);
    assert!(!success);
    assert!(stderr.contains("repository not found"));

    let (_, stderr, success) = run_repolens(&config_path, &["search", "missing", "q"]);
    assert!(!success);
    assert!(stderr.contains("repository not found"));
}

#[test]
fn test_missing_config_file_errors() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) =
        run_repolens(&tmp.path().join("nope.toml"), &["repos"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_full_cli_flow_against_mock_api() {
    let github = MockServer::start().await;
    let content = (1..=8)
        .map(|i| format!("value_{i} = {i}"))
        .collect::<Vec<_>>()
        .join("\n");

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "description": "Widgets",
            "language": "Python",
            "stargazers_count": 3,
            "forks_count": 1
        })))
        .mount(&github)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/git/trees/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tree": [
                { "path": "settings.py", "type": "blob", "size": content.len() },
                { "path": "logo.png", "type": "blob", "size": 10 }
            ]
        })))
        .mount(&github)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contents/settings.py"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": STANDARD.encode(&content),
            "size": content.len()
        })))
        .mount(&github)
        .await;

    let (_tmp, config_path) = setup_test_env(&github.uri());
    let run = |args: Vec<String>| {
        let config_path = config_path.clone();
        tokio::task::spawn_blocking(move || {
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            run_repolens(&config_path, &args)
        })
    };

    let (stdout, stderr, success) = run(vec![
        "ingest".into(),
        "https://github.com/acme/widgets".into(),
    ])
    .await
    .unwrap();
    assert!(success, "ingest failed: {}", stderr);
    assert!(stdout.contains("Repository acme/widgets"));
    assert!(stdout.contains("Stored 1 files."));
    assert!(!stdout.contains("logo.png"));
    let file_id = id_on_line(&stdout, "settings.py");

    let (stdout, _, success) = run(vec!["preview".into(), file_id.clone()]).await.unwrap();
    assert!(success);
    assert!(stdout.contains("   5 | value_5 = 5"));
    assert!(stdout.contains("... (3 more lines)"));

    let (stdout, _, success) = run(vec!["analyze".into(), file_id.clone()]).await.unwrap();
    assert!(success);
    assert!(stdout.contains("(heuristic fallback)"));
    assert!(stdout.contains("# FALLBACK ANALYSIS: settings.py"));

    let (stdout, _, success) = run(vec!["repos".into()]).await.unwrap();
    assert!(success);
    let repo_id = id_on_line(&stdout, "acme/widgets");
    assert!(stdout.contains("files: 1"));

    let (stdout, _, success) = run(vec!["search".into(), repo_id.clone(), "VALUE_7".into()])
        .await
        .unwrap();
    assert!(success);
    assert!(stdout.contains("Searched 1 files"));
    assert!(stdout.contains("## settings.py"));

    let (stdout, _, success) = run(vec!["forget".into(), repo_id]).await.unwrap();
    assert!(success);
    assert!(stdout.contains("Deleted repository"));

    let (stdout, _, _) = run(vec!["repos".into()]).await.unwrap();
    assert!(stdout.contains("No repositories."));
}
