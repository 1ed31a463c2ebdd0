//! CLI smoke tests for the careflow-server binary
//!
//! These tests drive the compiled binary: help output, configuration
//! validation and a short-lived server on an in-memory database.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::time::timeout;

/// Helper to run the careflow-server binary with given arguments
fn run_careflow_server(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_careflow-server"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute careflow-server")
}

/// Helper to run the careflow-server binary with timeout
async fn run_careflow_server_with_timeout(
    args: &[&str],
    timeout_duration: Duration,
) -> Result<std::process::Output, Box<dyn std::error::Error>> {
    let mut cmd = tokio::process::Command::new(env!("CARGO_BIN_EXE_careflow-server"));
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match timeout(timeout_duration, cmd.output()).await {
        Ok(result) => result.map_err(|e| e.into()),
        Err(elapsed) => Err(elapsed.into()),
    }
}

/// Config file with `home_dir` inside the temp dir so logs stay there.
fn write_config(dir: &Path, name: &str, body: &str) -> String {
    let home = dir.join("home").to_string_lossy().replace('\\', "/");
    let content = format!(
        r#"
server:
  home_dir: "{home}"
  host: "127.0.0.1"
  port: 5000
{body}
"#
    );
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write config file");
    path.to_string_lossy().to_string()
}

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[test]
fn test_cli_help_command() {
    let output = run_careflow_server(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("careflow-server"), "Should contain binary name");
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("--config"), "Should mention config option");
    assert!(stdout.contains("--mock"), "Should mention mock option");
}

#[test]
fn test_cli_version_command() {
    let output = run_careflow_server(&["--version"]);

    assert!(output.status.success(), "Version command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("careflow-server"));
    assert!(stdout.chars().any(|c| c.is_ascii_digit()));
}

#[test]
fn test_cli_invalid_command() {
    let output = run_careflow_server(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "stderr: {stderr}");
}

#[test]
fn test_cli_config_validation_missing_file() {
    let output = run_careflow_server(&["--config", "/nonexistent/config.yaml", "check"]);

    assert!(!output.status.success(), "Should fail with missing config");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config file not found"), "stderr: {stderr}");
}

#[test]
fn test_cli_config_flag_short_form() {
    let output = run_careflow_server(&["-c", "/nonexistent/config.yaml", "check"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config file not found"), "stderr: {stderr}");
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("invalid.yaml");
    std::fs::write(&config_path, "invalid: yaml: content: [unclosed")
        .expect("Failed to write file");

    let output = run_careflow_server(&["--config", config_path.to_str().unwrap(), "check"]);

    assert!(!output.status.success(), "Should fail with invalid YAML");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to extract config"), "stderr: {stderr}");
}

#[test]
fn test_cli_config_validation_valid_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        temp_dir.path(),
        "valid.yaml",
        r#"
database:
  url: "sqlite://database/careflow.db"

logging:
  default:
    console_level: info
    file: "logs/careflow.log"
    file_level: info
    max_backups: 3
    max_size_mb: 100

modules:
  accounts:
    jwt_secret: "check-secret"
    token_ttl_hours: 12
  appointments:
    enforce_doctor_ownership: true
"#,
    );

    let output = run_careflow_server(&["--config", &config_path, "check"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        output.status.success(),
        "Should succeed with valid config\nSTDOUT: {stdout}\nSTDERR: {stderr}"
    );
    assert!(stdout.contains("Configuration check passed"));
}

#[test]
fn test_cli_check_rejects_bad_module_section() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        temp_dir.path(),
        "bad_module.yaml",
        r#"
modules:
  accounts:
    token_ttl_hours: "soon"
"#,
    );

    let output = run_careflow_server(&["--config", &config_path, "check"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("accounts"), "stderr: {stderr}");
}

#[test]
fn test_cli_mock_flag_skips_dsn_check() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        temp_dir.path(),
        "mock.yaml",
        r#"
database:
  url: "mysql://localhost/nonexistent"
"#,
    );

    let output = run_careflow_server(&["--config", &config_path, "check"]);
    assert!(!output.status.success(), "Unsupported DSN fails without --mock");

    let output = run_careflow_server(&["--config", &config_path, "--mock", "check"]);
    assert!(
        output.status.success(),
        "Should succeed with --mock: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_cli_print_config_applies_port_override() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "print.yaml", "");

    let output = run_careflow_server(&["--config", &config_path, "--port", "6123", "--print-config"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("port: 6123"), "stdout: {stdout}");
}

#[test]
fn test_cli_run_command_config_validation() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        temp_dir.path(),
        "invalid.yaml",
        r#"
logging:
  level: "info"
"#,
    );

    let output = run_careflow_server(&["--config", &config_path, "run"]);

    assert!(!output.status.success(), "Malformed logging section should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid"), "stderr: {stderr}");
}

#[test]
fn test_cli_subcommand_help() {
    let output = run_careflow_server(&["run", "--help"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Start the server"));

    let output = run_careflow_server(&["check", "--help"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Check configuration"));
}

#[tokio::test]
async fn test_cli_run_command_with_mock_database() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "run.yaml", "");
    let port = free_port().to_string();

    let result = run_careflow_server_with_timeout(
        &["--config", &config_path, "--mock", "--port", &port, "run"],
        Duration::from_secs(5),
    )
    .await;

    // Still running when the timeout hits means startup succeeded
    match result {
        Err(err) => assert!(err.to_string().contains("elapsed"), "unexpected error: {err}"),
        Ok(output) => panic!(
            "Server exited early\nSTDOUT: {}\nSTDERR: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        ),
    }
}

#[tokio::test]
async fn test_server_serves_api_on_mock_database() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        temp_dir.path(),
        "api.yaml",
        r#"
modules:
  accounts:
    jwt_secret: "smoke-secret"
"#,
    );
    let port = free_port();

    let mut child = tokio::process::Command::new(env!("CARGO_BIN_EXE_careflow-server"))
        .args(["--config", &config_path, "--mock", "--port", &port.to_string(), "run"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn careflow-server");

    let base = format!("http://127.0.0.1:{port}");
    let client = reqwest::Client::new();

    let mut healthy = false;
    for _ in 0..50 {
        if let Ok(resp) = client.get(format!("{base}/health")).send().await {
            if resp.status().is_success() {
                healthy = true;
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(healthy, "server never became healthy");

    let resp = client
        .post(format!("{base}/api/register"))
        .json(&json!({
            "name": "Dr. A",
            "email": "dr.a@clinic.test",
            "password": "secret1",
            "role": "doctor",
            "department": "Cardiology"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let doctors: Value = client
        .get(format!("{base}/api/doctors"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(doctors[0]["name"], "Dr. A");
    assert_eq!(doctors[0]["department"], "Cardiology");

    let resp = client
        .get(format!("{base}/api/my-appointments"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    child.kill().await.unwrap();
}


#[test]
fn test_shipped_config_passes_check() {
    let shipped = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/careflow.yaml");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let home = temp_dir.path().to_string_lossy().replace('\\', "/");

    let output = Command::new(env!("CARGO_BIN_EXE_careflow-server"))
        .args(["--config", shipped.to_str().unwrap(), "check"])
        .env("APP__SERVER__HOME_DIR", &home)
        .output()
        .expect("Failed to execute careflow-server");

    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
}
