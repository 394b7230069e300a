//! Command-line tests for the `focus-timer` binary.
//!
//! Audio and the window title are disabled so these tests run in
//! environments without a sound device or a terminal.

use assert_cmd::Command;
use predicates::prelude::*;

fn focus_timer() -> Command {
    Command::cargo_bin("focus-timer").unwrap()
}

// ============================================================================
// Argument Tests
// ============================================================================

#[test]
fn test_help() {
    focus_timer()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_run_help_lists_options() {
    focus_timer()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--short-break"))
        .stdout(predicate::str::contains("--sessions"))
        .stdout(predicate::str::contains("--no-sound"));
}

#[test]
fn test_version() {
    focus_timer()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_out_of_range_duration_is_rejected() {
    focus_timer()
        .args(["run", "--work", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--work"));
}

#[test]
fn test_out_of_range_sessions_is_rejected() {
    focus_timer()
        .args(["run", "--sessions", "13"])
        .assert()
        .failure();
}

#[test]
fn test_completions_bash() {
    focus_timer()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("focus-timer"));
}

// ============================================================================
// Interactive Tests
// ============================================================================

#[test]
fn test_run_quits_on_q() {
    focus_timer()
        .args(["run", "--no-sound", "--no-title"])
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("[Work Time] 25:00"));
}

#[test]
fn test_run_exits_on_end_of_input() {
    focus_timer()
        .args(["run", "--no-sound", "--no-title", "--work", "1"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("01:00"));
}

#[test]
fn test_run_json_snapshot() {
    focus_timer()
        .args(["run", "--no-sound", "--no-title", "--json", "--work", "30"])
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"mode\":\"work\""))
        .stdout(predicate::str::contains("\"secondsRemaining\":1800"))
        .stdout(predicate::str::contains("\"display\":\"30:00\""));
}

#[test]
fn test_run_prints_help_and_hints() {
    focus_timer()
        .args(["run", "--no-sound", "--no-title"])
        .write_stdin("help\ndance\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("acknowledge a finished session"))
        .stdout(predicate::str::contains("unknown command 'dance'"));
}
