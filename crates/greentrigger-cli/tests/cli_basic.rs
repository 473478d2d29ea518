//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_greentrigger-cli"))
        .args(args)
        .env("GREENTRIGGER_DATA_DIR", data_dir.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

/// Run a CLI command with `input` on stdin and return (stdout, exit code).
fn run_cli_with_stdin(data_dir: &TempDir, args: &[&str], input: &[u8]) -> (String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_greentrigger-cli"))
        .args(args)
        .env("GREENTRIGGER_DATA_DIR", data_dir.path())
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI command");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input)
        .expect("Failed to write stdin");
    let output = child.wait_with_output().expect("Failed to wait for CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    (stdout, output.status.code().unwrap_or(-1))
}

fn body(identity: &str, from: &str, to: &str) -> String {
    format!(
        r#"{{"trigger_identity": "{identity}", "triggerFields": {{"hours_start": "{from}", "hours_stop": "{to}"}}}}"#
    )
}

fn parse(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout.trim()).expect("stdout is not JSON")
}

#[test]
fn test_window_check() {
    let dir = TempDir::new().unwrap();

    let (stdout, _, code) = run_cli(&dir, &["window", "check", "--from", "22:00", "--to", "06:00", "--at", "23:30"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("inside"), "unexpected output: {stdout}");
    assert!(stdout.contains("wraps midnight"));

    let (stdout, _, code) = run_cli(&dir, &["window", "check", "--from", "09:00", "--to", "17:00", "--at", "08:00"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("outside"));
}

#[test]
fn test_window_check_rejects_garbage() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["window", "check", "--from", "soon", "--to", "06:00"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Malformed window"));
}

#[test]
fn test_evaluate_missing_to_is_client_error() {
    let dir = TempDir::new().unwrap();
    let request = r#"{"trigger_identity": "t3", "triggerFields": {"hours_start": "09:00"}}"#;

    let (stdout, _, code) = run_cli(&dir, &["evaluate", "--dry-run", "--body", request]);
    assert_eq!(code, 2);
    assert_eq!(parse(&stdout)["errors"][0]["message"], "Missing to");
}

#[test]
fn test_evaluate_unparseable_body_is_client_error() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["evaluate", "--dry-run", "--body", "{oops"]);
    assert_eq!(code, 2);
    assert!(parse(&stdout)["errors"].is_array());
}

#[test]
fn test_evaluate_dry_run_creates_event() {
    let dir = TempDir::new().unwrap();
    let request = body("t1", "09:00", "17:00");

    let (stdout, _, code) = run_cli(
        &dir,
        &["evaluate", "--dry-run", "--measurement", "45", "--now", "2024-06-03T12:00:00Z", "--body", &request],
    );
    assert_eq!(code, 0);
    let json = parse(&stdout);
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["classification"], true);
    assert_eq!(data[0]["measurement"], 45.0);
}

#[test]
fn test_evaluate_outside_window_is_empty() {
    let dir = TempDir::new().unwrap();
    let request = body("t2", "09:00", "17:00");

    let (stdout, _, code) = run_cli(
        &dir,
        &["evaluate", "--dry-run", "--measurement", "45", "--now", "2024-06-03T08:00:00Z", "--body", &request],
    );
    assert_eq!(code, 0);
    assert_eq!(parse(&stdout)["data"].as_array().unwrap().len(), 0);
}

#[test]
fn test_evaluate_without_provider_is_server_error() {
    let dir = TempDir::new().unwrap();
    let request = body("t8", "00:00", "23:59");

    let (stdout, _, code) = run_cli(&dir, &["evaluate", "--dry-run", "--body", &request]);
    assert_eq!(code, 1);
    let message = parse(&stdout)["errors"][0]["message"].as_str().unwrap().to_string();
    assert!(message.contains("Measurement unavailable"));
}

#[test]
fn test_evaluate_persists_between_runs() {
    let dir = TempDir::new().unwrap();
    let request = body("persisted", "00:00", "23:59");
    let args = ["evaluate", "--measurement", "55.5", "--now", "2024-06-03T12:00:00Z", "--body", &request];

    let (first, _, code) = run_cli(&dir, &args);
    assert_eq!(code, 0);
    let (second, _, code) = run_cli(&dir, &args);
    assert_eq!(code, 0);

    let first = parse(&first);
    let second = parse(&second);
    assert_eq!(first["data"][0]["meta"]["id"], second["data"][0]["meta"]["id"]);

    let (count, _, code) = run_cli(&dir, &["events", "count", "persisted"]);
    assert_eq!(code, 0);
    assert_eq!(count.trim(), "1");

    let (listed, _, code) = run_cli(&dir, &["events", "list", "persisted", "--json"]);
    assert_eq!(code, 0);
    assert_eq!(parse(&listed)["data"][0]["measurement"], 55.5);
}

#[test]
fn test_evaluate_zero_limit() {
    let dir = TempDir::new().unwrap();
    let request = r#"{"trigger_identity": "t4", "triggerFields": {"hours_start": "00:00", "hours_stop": "23:59"}, "limit": 0}"#;

    let (stdout, _, code) = run_cli(&dir, &["evaluate", "--body", request]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), r#"{"data":[]}"#);

    let (count, _, _) = run_cli(&dir, &["events", "count", "t4"]);
    assert_eq!(count.trim(), "0");
}

#[test]
fn test_config_set_and_get() {
    let dir = TempDir::new().unwrap();

    let (stdout, _, code) = run_cli(&dir, &["config", "set", "window.utc_offset_minutes", "120"]);
    assert_eq!(code, 0, "config set failed");
    assert_eq!(stdout.trim(), "ok");

    let (stdout, _, code) = run_cli(&dir, &["config", "get", "window.utc_offset_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "120");

    let (_, _, code) = run_cli(&dir, &["config", "get", "window.nope"]);
    assert_eq!(code, 1);
}

#[test]
fn test_evaluate_bad_request_leaves_ledger_untouched() {
    let dir = TempDir::new().unwrap();
    let request = r#"{"trigger_identity": "t3", "triggerFields": {"hours_start": "09:00"}}"#;

    let (stdout, _, code) = run_cli(&dir, &["evaluate", "--body", request]);
    assert_eq!(code, 2);
    assert_eq!(stdout.trim(), r#"{"errors":[{"message":"Missing to"}]}"#);
    assert!(!dir.path().join("events.db").exists());
}

#[test]
fn test_evaluate_signals_survive_unusable_ledger() {
    let dir = TempDir::new().unwrap();
    // A directory cannot be opened as a database file
    let ledger = dir.path().join("not-a-file");
    std::fs::create_dir(&ledger).unwrap();
    let ledger = ledger.to_string_lossy().to_string();
    let (_, _, code) = run_cli(&dir, &["config", "set", "storage.path", &ledger]);
    assert_eq!(code, 0);

    let missing_to = r#"{"trigger_identity": "t3", "triggerFields": {"hours_start": "09:00"}}"#;
    let (stdout, _, code) = run_cli(&dir, &["evaluate", "--body", missing_to]);
    assert_eq!(code, 2);
    assert_eq!(parse(&stdout)["errors"][0]["message"], "Missing to");

    let (stdout, _, code) = run_cli(&dir, &["evaluate", "--body", "{oops"]);
    assert_eq!(code, 2);
    assert!(parse(&stdout)["errors"].is_array());

    let zero = r#"{"trigger_identity": "t4", "triggerFields": {"hours_start": "00:00", "hours_stop": "23:59"}, "limit": 0}"#;
    let (stdout, _, code) = run_cli(&dir, &["evaluate", "--body", zero]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), r#"{"data":[]}"#);

    let request = body("t5", "00:00", "23:59");
    let (stdout, _, code) = run_cli(&dir, &["evaluate", "--measurement", "45", "--body", &request]);
    assert_eq!(code, 1);
    let message = parse(&stdout)["errors"][0]["message"].as_str().unwrap().to_string();
    assert!(message.starts_with("Persistence unavailable"), "unexpected message: {message}");
}

#[test]
fn test_evaluate_rejects_out_of_range_measurement() {
    let dir = TempDir::new().unwrap();
    let request = body("t6", "00:00", "23:59");

    for value in ["NaN", "150"] {
        let (stdout, _, code) = run_cli(
            &dir,
            &["evaluate", "--measurement", value, "--now", "2024-06-03T12:00:00Z", "--body", &request],
        );
        assert_eq!(code, 1, "measurement {value} was accepted");
        let message = parse(&stdout)["errors"][0]["message"].as_str().unwrap().to_string();
        assert!(message.starts_with("Measurement unavailable"), "unexpected message: {message}");
    }

    let (count, _, _) = run_cli(&dir, &["events", "count", "t6"]);
    assert_eq!(count.trim(), "0");
}

#[test]
fn test_evaluate_non_utf8_stdin_is_client_error() {
    let dir = TempDir::new().unwrap();

    let (stdout, code) = run_cli_with_stdin(&dir, &["evaluate", "--dry-run"], b"\xff\xfe{");
    assert_eq!(code, 2);
    let message = parse(&stdout)["errors"][0]["message"].as_str().unwrap().to_string();
    assert!(message.starts_with("Invalid request"), "unexpected message: {message}");
}

#[test]
fn test_evaluate_reads_body_from_stdin() {
    let dir = TempDir::new().unwrap();
    let request = body("piped", "00:00", "23:59");

    let (stdout, code) = run_cli_with_stdin(
        &dir,
        &["evaluate", "--dry-run", "--measurement", "12.5"],
        request.as_bytes(),
    );
    assert_eq!(code, 0);
    assert_eq!(parse(&stdout)["data"][0]["classification"], false);
}
