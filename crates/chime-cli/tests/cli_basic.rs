//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run, each against its own data
//! directory, and verify outputs.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "chime-cli", "--"])
        .args(args)
        .env("CHIME_DATA_DIR", data_dir)
        .env("CHIME_LOG", "error")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(data_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout
}

#[test]
fn test_reminder_add_and_list() {
    let dir = TempDir::new().unwrap();
    let out = run_ok(dir.path(), &["reminder", "add", "Call mom", "--at", "2099-05-01 18:00"]);
    assert!(out.contains("Reminder added: Call mom"));

    let out = run_ok(dir.path(), &["reminder", "list", "--json"]);
    let list: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(list[0]["text"], "Call mom");
    assert_eq!(list[0]["datetime"], "2099-05-01 18:00");
}

#[test]
fn test_reminder_add_rejects_past_time() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["reminder", "add", "Too late", "--at", "2001-01-01 00:00"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("past time"), "{stderr}");
}

#[test]
fn test_reminder_add_rejects_garbage_datetime() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["reminder", "add", "Someday", "--at", "soonish"]);
    assert_ne!(code, 0);
}

#[test]
fn test_reminder_remove_and_clear() {
    let dir = TempDir::new().unwrap();
    run_ok(dir.path(), &["reminder", "add", "A", "--at", "2099-01-01 10:00"]);
    run_ok(dir.path(), &["reminder", "add", "B", "--at", "2099-01-01 11:00"]);

    let out = run_ok(dir.path(), &["reminder", "remove", "A", "--at", "2099-01-01 10:00"]);
    assert!(out.contains("Removed 1"));
    let (_, _, code) = run_cli(dir.path(), &["reminder", "remove", "A", "--at", "2099-01-01 10:00"]);
    assert_ne!(code, 0);

    run_ok(dir.path(), &["reminder", "clear"]);
    let out = run_ok(dir.path(), &["reminder", "list"]);
    assert!(out.contains("No reminders."));
}

#[test]
fn test_config_get_set() {
    let dir = TempDir::new().unwrap();
    assert_eq!(run_ok(dir.path(), &["config", "get", "poller.interval_secs"]).trim(), "10");

    run_ok(dir.path(), &["config", "set", "alarm.auto_dismiss_secs", "120"]);
    assert_eq!(
        run_ok(dir.path(), &["config", "get", "alarm.auto_dismiss_secs"]).trim(),
        "120"
    );

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "no.such.key"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_list_is_json() {
    let dir = TempDir::new().unwrap();
    let out = run_ok(dir.path(), &["config", "list"]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["notifications"]["tag_prefix"], "alarm-");
}

#[test]
fn test_session_id_is_stable() {
    let dir = TempDir::new().unwrap();
    let first = run_ok(dir.path(), &["session", "id"]);
    let second = run_ok(dir.path(), &["session", "id"]);
    assert_eq!(first, second);
    assert_eq!(first.trim().len(), 36);
}

#[test]
fn test_session_mute_toggle() {
    let dir = TempDir::new().unwrap();
    assert!(run_ok(dir.path(), &["session", "toggle", "weather"]).contains("muted"));
    let out = run_ok(dir.path(), &["session", "mutes"]);
    let map: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(map["weather"], true);

    run_ok(dir.path(), &["session", "unmute", "weather"]);
    let out = run_ok(dir.path(), &["session", "mutes"]);
    let map: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(map["weather"], false);
}

#[test]
fn test_run_once_reports_recent_reminder() {
    let dir = TempDir::new().unwrap();
    let soon = (chrono::Utc::now() + chrono::Duration::seconds(2)).to_rfc3339();
    run_ok(dir.path(), &["reminder", "add", "Stretch", "--at", &soon]);
    std::thread::sleep(std::time::Duration::from_secs(3));

    let out = run_ok(dir.path(), &["run", "--once", "--json", "--since-secs", "600"]);
    let events: Vec<serde_json::Value> = out
        .lines()
        .filter(|l| l.starts_with('{'))
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert!(events
        .iter()
        .any(|e| e["type"] == "ReminderDue" && e["reminder"]["text"] == "Stretch"));
    assert!(events.iter().any(|e| e["type"] == "AlarmStarted"));
    assert!(events.iter().any(|e| e["type"] == "AlarmStopped"));
}

#[test]
fn test_run_once_without_due_reminders() {
    let dir = TempDir::new().unwrap();
    let out = run_ok(dir.path(), &["run", "--once", "--json"]);
    let last: serde_json::Value = serde_json::from_str(out.lines().last().unwrap()).unwrap();
    assert_eq!(last["type"], "PollCompleted");
    assert_eq!(last["due"], 0);
}
