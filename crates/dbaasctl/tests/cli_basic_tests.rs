use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a test command
fn dbaasctl() -> Command {
    let mut cmd = Command::cargo_bin("dbaasctl").unwrap();
    cmd.env_remove("DBAASCTL_PROFILE")
        .env_remove("DBAASCTL_CONFIG_FILE")
        .env_remove("RUST_LOG");
    cmd
}

/// Command bound to an isolated config file
fn dbaasctl_with_config(config: &Path) -> Command {
    let mut cmd = dbaasctl();
    cmd.arg("--config-file").arg(config);
    cmd
}

#[test]
fn test_help_flag() {
    dbaasctl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("DBaaS provisioning workflow CLI"))
        .stdout(predicate::str::contains("EXAMPLES:"));
}

#[test]
fn test_version_flag() {
    dbaasctl()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dbaasctl"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_command_json() {
    let dir = TempDir::new().unwrap();
    dbaasctl_with_config(&dir.path().join("config.toml"))
        .args(["version", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"dbaasctl\""));
}

#[test]
fn test_no_args_shows_help() {
    dbaasctl()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_invalid_subcommand() {
    dbaasctl()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_run_help_lists_polling_flags() {
    dbaasctl()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--max-attempts"))
        .stdout(predicate::str::contains("--require-ready"));
}

#[test]
fn test_invalid_output_format() {
    dbaasctl()
        .args(["version", "-o", "xml"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_cleanup_requires_cluster() {
    dbaasctl()
        .arg("cleanup")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--cluster"));
}

#[test]
fn test_profile_set_missing_required_args() {
    dbaasctl()
        .args(["profile", "set", "staging"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--api-url"));
}

#[test]
fn test_profile_lifecycle() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");

    dbaasctl_with_config(&config)
        .args([
            "profile",
            "set",
            "staging",
            "--api-url",
            "https://dbaas.example.com",
            "--login",
            "operator",
            "--password",
            "secret",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile 'staging' saved"));

    let saved = std::fs::read_to_string(&config).unwrap();
    assert!(saved.contains("default_profile = \"staging\""));
    assert!(saved.contains("login = \"operator\""));

    dbaasctl_with_config(&config)
        .args(["profile", "list", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"staging\""))
        .stdout(predicate::str::contains("\"is_default\": true"));

    dbaasctl_with_config(&config)
        .args(["profile", "show", "staging"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API URL: https://dbaas.example.com"))
        .stdout(predicate::str::contains("Password: configured (plaintext)"))
        .stdout(predicate::str::contains("secret").not());

    dbaasctl_with_config(&config)
        .args(["profile", "show", "staging", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"password_storage\": \"plaintext\""));

    dbaasctl_with_config(&config)
        .args(["profile", "remove", "staging"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Default profile cleared."));

    dbaasctl_with_config(&config)
        .args(["profile", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No profiles configured."));
}

#[test]
fn test_profile_show_reports_keyring_password() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        "[profiles.prod]\napi_url = \"https://dbaas.example.com\"\nlogin = \"operator\"\npassword = \"keyring:prod-password\"\n",
    )
    .unwrap();

    dbaasctl_with_config(&config)
        .args(["profile", "show", "prod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Password: configured (keyring)"))
        .stdout(predicate::str::contains("prod-password").not());
}

#[test]
fn test_profile_show_unknown() {
    let dir = TempDir::new().unwrap();
    dbaasctl_with_config(&dir.path().join("config.toml"))
        .args(["profile", "show", "missing"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Profile 'missing' not found"));
}

#[test]
fn test_profile_path_honours_config_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("custom.toml");
    dbaasctl_with_config(&config)
        .args(["profile", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_run_without_profile_fails_before_any_request() {
    let dir = TempDir::new().unwrap();
    dbaasctl_with_config(&dir.path().join("config.toml"))
        .arg("run")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No profile configured"))
        .stderr(predicate::str::contains("tip"));
}

#[test]
fn test_corrupt_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[[[broken").unwrap();
    dbaasctl_with_config(&config)
        .args(["profile", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("parse"));
}

fn write_profile(dir: &TempDir, api_url: &str) -> std::path::PathBuf {
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        format!(
            "default_profile = \"local\"\n\n[profiles.local]\napi_url = \"{}\"\nlogin = \"operator\"\npassword = \"secret\"\n",
            api_url
        ),
    )
    .unwrap();
    config
}

async fn mock_authorize(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/api/authorize"))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_json(serde_json::json!({"refresh_token": "token-123"})),
        )
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cleanup_deletes_dump_then_cluster() {
    let server = MockServer::start().await;
    mock_authorize(&server, 200).await;
    Mock::given(method("DELETE"))
        .and(path("/api/dumps/d-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/clusters/c-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_profile(&dir, &server.uri());

    let assert = tokio::task::spawn_blocking(move || {
        dbaasctl_with_config(&config)
            .args(["cleanup", "--cluster", "c-1", "--dump", "d-1", "-o", "json"])
            .assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("dump d-1"))
        .stdout(predicate::str::contains("cluster c-1"));

    let requests = server.received_requests().await.unwrap();
    let deletes: Vec<String> = requests
        .iter()
        .filter(|r| r.method.as_str() == "DELETE")
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(deletes, vec!["/api/dumps/d-1", "/api/clusters/c-1"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cleanup_reports_failed_deletion() {
    let server = MockServer::start().await;
    mock_authorize(&server, 200).await;
    Mock::given(method("DELETE"))
        .and(path("/api/clusters/c-1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_profile(&dir, &server.uri());

    let assert = tokio::task::spawn_blocking(move || {
        dbaasctl_with_config(&config)
            .args(["cleanup", "--cluster", "c-1"])
            .assert()
    })
    .await
    .unwrap();

    assert
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Teardown incomplete"))
        .stderr(predicate::str::contains("dbaasctl cleanup"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_credentials_exit_with_auth_error() {
    let server = MockServer::start().await;
    mock_authorize(&server, 401).await;

    let dir = TempDir::new().unwrap();
    let config = write_profile(&dir, &server.uri());

    let assert = tokio::task::spawn_blocking(move || {
        dbaasctl_with_config(&config)
            .args(["catalog", "types"])
            .assert()
    })
    .await
    .unwrap();

    assert
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Authentication failed"));
}
