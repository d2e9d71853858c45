//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OVERRIDES: [&str; 4] = [
    "ESSAYMARK_AGENT_ID",
    "ESSAYMARK_AUTH_KEY",
    "ESSAYMARK_AUTH_SECRET",
    "ESSAYMARK_PLATFORM",
];

fn essaymark() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("essaymark").unwrap();
    for var in OVERRIDES {
        cmd.env_remove(var);
    }
    cmd
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Write a config pointing the agent at `base_url`, with a store in `dir`.
fn write_config(dir: &Path, base_url: &str) -> PathBuf {
    let config = format!(
        r#"[agent]
agent_id = "agent-1"
auth_key = "key"
auth_secret = "secret"
base_url = "{base_url}"
timeout_secs = 5

[store]
path = "{}"
"#,
        dir.join("reviews.db").display()
    );
    let path = dir.join("essaymark.toml");
    std::fs::write(&path, config).unwrap();
    path
}

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();

    essaymark()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created essaymark.toml"));

    let content = std::fs::read_to_string(dir.path().join("essaymark.toml")).unwrap();
    assert!(content.contains("[agent]"));
    assert!(content.contains("${AUTH_SECRET}"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    essaymark()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    essaymark()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn render_writes_annotated_page() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("essay.html");

    essaymark()
        .arg("render")
        .arg("--result")
        .arg(fixture("agent_reply.txt"))
        .arg("--essay")
        .arg(fixture("essay.txt"))
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("内容相关性"))
        .stdout(predicate::str::contains("Wrote"));

    let html = std::fs::read_to_string(&output).unwrap();
    assert!(html.contains("<span class=\"word a1\">apples</span>"));
    assert!(html.contains("<span class=\"word b1\">Running</span>"));
    assert!(html.contains("修改建议：Running every morning is fun."));
}

#[test]
fn render_rejects_malformed_reply() {
    let dir = TempDir::new().unwrap();
    let reply = dir.path().join("reply.txt");
    std::fs::write(&reply, "```json\n{not valid\n```").unwrap();

    essaymark()
        .arg("render")
        .arg("--result")
        .arg(&reply)
        .arg("--essay")
        .arg(fixture("essay.txt"))
        .arg("--output")
        .arg(dir.path().join("out.html"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("malformed evaluation payload"));

    assert!(!dir.path().join("out.html").exists());
}

#[test]
fn evaluate_without_credentials_fails_fast() {
    let dir = TempDir::new().unwrap();

    essaymark()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("evaluate")
        .arg("--essay")
        .arg(fixture("essay.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("missing agent settings"));
}

#[test]
fn evaluate_rejects_empty_essay_before_calling_agent() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "http://127.0.0.1:9");
    let essay = dir.path().join("empty.txt");
    std::fs::write(&essay, "   \n").unwrap();

    essaymark()
        .arg("evaluate")
        .arg("--essay")
        .arg(&essay)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("essay text is missing or empty"));
}

#[test]
fn history_requires_a_store() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("essaymark.toml");
    std::fs::write(&config, "[agent]\nagent_id = \"a\"\n").unwrap();

    essaymark()
        .arg("history")
        .arg("--user")
        .arg("student-1")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no review store configured"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn evaluate_against_agent_then_list_history() {
    let server = MockServer::start().await;
    let reply = std::fs::read_to_string(fixture("agent_reply.txt")).unwrap();

    Mock::given(method("POST"))
        .and(path("/openapi/agent/chat/completions/v1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"choices": [{"content": reply}]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &server.uri());
    let html = dir.path().join("page.html");

    essaymark()
        .arg("evaluate")
        .arg("--essay")
        .arg(fixture("essay.txt"))
        .arg("--user")
        .arg("student-1")
        .arg("--json")
        .arg("--html")
        .arg(&html)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"总体评分\": 82.0"))
        .stderr(predicate::str::contains("Saved review"));

    assert!(std::fs::read_to_string(&html)
        .unwrap()
        .contains("<span class=\"word a1\">like</span>"));

    essaymark()
        .arg("history")
        .arg("--user")
        .arg("student-1")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 review(s) for student-1"))
        .stdout(predicate::str::contains("82"));

    essaymark()
        .arg("history")
        .arg("--user")
        .arg("someone-else")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("No reviews for someone-else"));
}

#[test]
fn help_output() {
    essaymark()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("CEFR vocabulary annotation"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("evaluate"));
}

#[test]
fn version_output() {
    essaymark()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("essaymark"));
}
