//! Integration tests for the blockflow CLI.
//!
//! These tests invoke the `blockflow` binary as a subprocess and check
//! exit codes, stdout, and stderr.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(deprecated)]
fn blockflow() -> Command {
    Command::cargo_bin("blockflow").unwrap()
}

/// Helper: write a graph document into `dir`, returning its path.
fn graph_file(dir: &TempDir, json: &str) -> PathBuf {
    let path = dir.path().join("graph.json");
    fs::write(&path, json).unwrap();
    path
}

const ONE_NOTE: &str = r#"{"blocks": {
    "s": {"id": "s", "type": "start", "inputs": {}, "next": "p", "x": 40, "y": 40},
    "p": {"id": "p", "type": "play_note", "inputs": {"pitch": "E4", "beats": 1}}
}}"#;

const REPEAT_TWICE: &str = r#"[
    {"id": "s", "type": "start", "next": "r"},
    {"id": "r", "type": "repeat", "inputs": {"iterations": 2}, "body": "p"},
    {"id": "p", "type": "play_note", "inputs": {"pitch": "E4", "beats": 1}}
]"#;

const FOREVER: &str = r#"[
    {"id": "s", "type": "start", "next": "f"},
    {"id": "f", "type": "forever", "body": "w"},
    {"id": "w", "type": "wait", "inputs": {"seconds": 1}}
]"#;

// ---- No-args / help ----

#[test]
fn no_args_prints_usage_and_fails() {
    blockflow()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: blockflow"));
}

#[test]
fn help_flag_exits_0() {
    blockflow()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("compile"))
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn unknown_command_fails() {
    blockflow().arg("teleport").assert().failure();
}

// ---- Input errors ----

#[test]
fn missing_file_exits_1() {
    blockflow()
        .args(["compile", "/nonexistent/graph.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn malformed_graph_exits_1() {
    let dir = TempDir::new().unwrap();
    let path = graph_file(&dir, "{not json");
    blockflow()
        .arg("run")
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("malformed graph document"));
}

#[test]
fn duplicate_node_id_exits_1() {
    let dir = TempDir::new().unwrap();
    let path = graph_file(
        &dir,
        r#"[{"id": "a", "type": "start"}, {"id": "a", "type": "wait"}]"#,
    );
    blockflow()
        .arg("verify")
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("duplicate node id 'a'"));
}

// ---- compile ----

#[test]
fn compile_prints_listing() {
    let dir = TempDir::new().unwrap();
    let path = graph_file(&dir, ONE_NOTE);
    blockflow()
        .arg("compile")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("function thread_s"))
        .stdout(predicate::str::contains("thread_end_1:"))
        .stdout(predicate::str::contains("syscall play_note("))
        .stdout(predicate::str::contains("; p"));
}

#[test]
fn compile_reports_unknown_block_type() {
    let dir = TempDir::new().unwrap();
    let path = graph_file(
        &dir,
        r#"[{"id": "s", "type": "start", "next": "x"}, {"id": "x", "type": "teleport"}]"#,
    );
    blockflow()
        .arg("compile")
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "warning: unknown block type 'teleport' at node 'x'",
        ));
}

#[test]
fn compile_without_start_block_warns() {
    let dir = TempDir::new().unwrap();
    let path = graph_file(&dir, r#"[{"id": "w", "type": "wait"}]"#);
    blockflow()
        .arg("compile")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("no 'start' block"));
}

// ---- verify ----

#[test]
fn verify_ok() {
    let dir = TempDir::new().unwrap();
    let path = graph_file(&dir, REPEAT_TWICE);
    blockflow()
        .arg("verify")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("OK:"))
        .stdout(predicate::str::contains("1 threads"));
}

#[test]
fn verify_notes_stranded_thread_end() {
    let dir = TempDir::new().unwrap();
    let path = graph_file(&dir, FOREVER);
    blockflow()
        .arg("verify")
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "note: block 'thread_end_1' in 'thread_s' is unreachable",
        ));
}

// ---- run ----

#[test]
fn run_prints_events_with_virtual_time() {
    let dir = TempDir::new().unwrap();
    let path = graph_file(&dir, REPEAT_TWICE);
    blockflow()
        .arg("run")
        .arg(&path)
        .args(["--dt", "100"])
        .assert()
        .success()
        .stdout("t=100 note E4 500ms\nt=600 note E4 500ms\n")
        .stderr(predicate::str::contains("finished after"));
}

#[test]
fn run_json_events() {
    let dir = TempDir::new().unwrap();
    let path = graph_file(&dir, ONE_NOTE);
    blockflow()
        .arg("run")
        .arg(&path)
        .args(["--dt", "100", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"kind":"note","pitch":"E4","duration_ms":500.0,"at_ms":100.0}"#,
        ));
}

#[test]
fn run_stops_at_pulse_limit() {
    let dir = TempDir::new().unwrap();
    let path = graph_file(&dir, FOREVER);
    blockflow()
        .arg("run")
        .arg(&path)
        .args(["--dt", "500", "--max-pulses", "4"])
        .assert()
        .success()
        .stderr(predicate::str::contains("stopped after 4 pulses at t=2000"));
}

#[test]
fn run_reports_breakpoint_then_continues() {
    let dir = TempDir::new().unwrap();
    let path = graph_file(&dir, ONE_NOTE);
    blockflow()
        .arg("run")
        .arg(&path)
        .args(["--dt", "100", "--break", "p"])
        .assert()
        .success()
        .stdout("breakpoint p at t=100\nt=100 note E4 500ms\n")
        .stderr(predicate::str::contains("finished after 6 pulses at t=600"));
}

#[test]
fn run_rejects_zero_slice() {
    let dir = TempDir::new().unwrap();
    let path = graph_file(&dir, ONE_NOTE);
    blockflow()
        .arg("run")
        .arg(&path)
        .args(["--slice", "0"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("invalid value '0'"));
}

#[test]
fn run_print_block() {
    let dir = TempDir::new().unwrap();
    let path = graph_file(
        &dir,
        r#"[
            {"id": "s", "type": "start", "next": "v"},
            {"id": "v", "type": "set_volume", "inputs": {"level": 100}, "next": "m"},
            {"id": "m", "type": "print", "inputs": {"message": "hello"}}
        ]"#,
    );
    blockflow()
        .arg("run")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("t=16 volume 100"))
        .stdout(predicate::str::contains("t=16 print hello"));
}
