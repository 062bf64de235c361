use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_KEY: &str = include_str!("../../staffsync-sheets/tests/fixtures/test-service-account.pem");

/// `staffsync` with an empty environment and a scratch home directory.
fn staffsync_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("staffsync"));
    cmd.env_clear().env("HOME", home).env("USERPROFILE", home);
    cmd
}

fn with_live_env(cmd: &mut Command, store_url: &str) {
    cmd.env("SHEET_ID", "sheet-1")
        .env("GOOGLE_CLIENT_EMAIL", "svc@example.iam.gserviceaccount.com")
        .env("GOOGLE_PRIVATE_KEY", TEST_KEY)
        .env("SUPABASE_URL", store_url)
        .env("SUPABASE_SERVICE_ROLE_KEY", "service-key");
}

fn record(name: &str, email: &str, department: &str) -> serde_json::Value {
    json!({
        "id": format!("{email}-0000-uuid"),
        "sheet_row_id": format!("EMP-{name}"),
        "name": name,
        "email": email,
        "department": department,
        "phone": null,
        "created_at": "2024-05-01T10:00:00Z",
        "updated_at": null,
        "last_synced_at": null,
        "last_synced_from": null
    })
}

#[test]
fn help_lists_every_command() {
    let home = TempDir::new().expect("home");
    staffsync_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("serve"))
        .stdout(contains("sync"))
        .stdout(contains("add"))
        .stdout(contains("list"))
        .stdout(contains("mirror"));
}

#[test]
fn missing_environment_fails_with_the_first_missing_key() {
    let home = TempDir::new().expect("home");
    staffsync_cmd(home.path())
        .arg("sync")
        .assert()
        .failure()
        .stderr(contains("failed to load configuration"))
        .stderr(contains("missing required configuration value: SHEET_ID"));
}

#[test]
fn explicit_config_path_that_does_not_exist_fails() {
    let home = TempDir::new().expect("home");
    let missing = home.path().join("nope.yaml");
    staffsync_cmd(home.path())
        .arg("--config")
        .arg(&missing)
        .arg("list")
        .assert()
        .failure()
        .stderr(contains("failed to load configuration"))
        .stderr(contains("nope.yaml"));
}

#[test]
fn config_file_with_blank_required_value_is_rejected() {
    let home = TempDir::new().expect("home");
    let dir = home.path().join(".staffsync");
    fs::create_dir_all(&dir).expect("config dir");
    fs::write(
        dir.join("config.yaml"),
        "sheet:\n  spreadsheet_id: sheet-1\ngoogle:\n  client_email: svc@example.com\n  private_key: k\nstore:\n  url: \"\"\n  service_role_key: k\n",
    )
    .expect("write config");

    staffsync_cmd(home.path())
        .arg("sync")
        .assert()
        .failure()
        .stderr(contains("store.url"));
}

#[test]
fn add_rejects_blank_name_before_loading_config() {
    let home = TempDir::new().expect("home");
    staffsync_cmd(home.path())
        .args(["add", "--name", "   ", "--email", "d@x.com"])
        .assert()
        .failure()
        .stderr(contains("Name and email are required"));
}

#[test]
fn mirror_reports_unreadable_event_file() {
    let home = TempDir::new().expect("home");
    staffsync_cmd(home.path())
        .args(["mirror", "missing-event.json"])
        .assert()
        .failure()
        .stderr(contains("failed to read change event"));
}

#[test]
fn mirror_reports_malformed_event() {
    let home = TempDir::new().expect("home");
    let event = home.path().join("event.json");
    fs::write(&event, r#"{"operation": "UPSERT"}"#).expect("write event");

    staffsync_cmd(home.path())
        .arg("mirror")
        .arg(&event)
        .assert()
        .failure()
        .stderr(contains("invalid change event"));
}

#[tokio::test(flavor = "multi_thread")]
async fn list_json_prints_store_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/employee_contacts"))
        .and(query_param("order", "name.asc"))
        .and(query_param("department", "eq.Ops"))
        .and(header("apikey", "service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            record("Amy", "a@x.com", "Ops"),
            record("Zed", "z@x.com", "Ops"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().expect("home");
    let mut cmd = staffsync_cmd(home.path());
    cmd.args(["list", "--department", "Ops", "--json"]);
    with_live_env(&mut cmd, &server.uri());

    let output = tokio::task::spawn_blocking(move || cmd.output())
        .await
        .expect("join")
        .expect("run staffsync");

    output
        .clone()
        .assert()
        .success()
        .stdout(contains("\"email\": \"a@x.com\""))
        .stdout(contains("\"email\": \"z@x.com\""));
    let listed: Vec<serde_json::Value> =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["name"], "Amy");
}

#[tokio::test(flavor = "multi_thread")]
async fn list_table_shows_empty_store_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/employee_contacts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let home = TempDir::new().expect("home");
    let mut cmd = staffsync_cmd(home.path());
    cmd.arg("list");
    with_live_env(&mut cmd, &server.uri());

    let output = tokio::task::spawn_blocking(move || cmd.output())
        .await
        .expect("join")
        .expect("run staffsync");

    output
        .assert()
        .success()
        .stdout(contains("No employees found."));
}

#[tokio::test(flavor = "multi_thread")]
async fn store_error_exits_non_zero_with_context() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/employee_contacts"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let home = TempDir::new().expect("home");
    let mut cmd = staffsync_cmd(home.path());
    cmd.arg("list");
    with_live_env(&mut cmd, &server.uri());

    let output = tokio::task::spawn_blocking(move || cmd.output())
        .await
        .expect("join")
        .expect("run staffsync");

    output
        .assert()
        .failure()
        .stderr(contains("failed to list employees"))
        .stderr(contains("500"));
}
