//! Smoke tests for the `careflow` binary. None of these reach a server.

use std::process::{Command, Output};

use tempfile::TempDir;

fn careflow(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_careflow"))
        .args(args)
        .env("CAREFLOW_API_URL", "http://127.0.0.1:9/api")
        .output()
        .expect("Failed to execute careflow")
}

#[test]
fn help_lists_commands() {
    let output = careflow(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for cmd in ["register", "login", "logout", "doctors", "book", "my-appointments", "requests", "accept", "reject"] {
        assert!(stdout.contains(cmd), "missing {cmd} in help:\n{stdout}");
    }
}

#[test]
fn whoami_without_session_fails() {
    let dir = TempDir::new().unwrap();
    let session = dir.path().join("session.json");
    let output = careflow(&["--session-file", session.to_str().unwrap(), "whoami"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not logged in"), "{stderr}");
}

#[test]
fn logout_removes_session_file() {
    let dir = TempDir::new().unwrap();
    let session = dir.path().join("session.json");
    std::fs::write(
        &session,
        r#"{"token":"t","role":"patient","name":"Pat","expiresAt":"2099-01-01T00:00:00Z"}"#,
    )
    .unwrap();

    let output = careflow(&["--session-file", session.to_str().unwrap(), "whoami"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Pat (patient)"));

    let output = careflow(&["--session-file", session.to_str().unwrap(), "logout"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Logged out."));
    assert!(!session.exists());
}

#[test]
fn register_validation_happens_before_any_request() {
    let output = careflow(&[
        "register",
        "--name",
        "Dr. A",
        "--email",
        "a@clinic.test",
        "--password",
        "secret1",
        "--role",
        "doctor",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Department is required for doctors."), "{stderr}");
}

#[test]
fn unknown_role_is_a_usage_error() {
    let output = careflow(&["login", "--email", "a@b.co", "--password", "x", "--role", "nurse"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nurse"));
}
