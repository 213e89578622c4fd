use serde_json::Value;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn qbank(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_qbank"))
        .args(args)
        .env_remove("QBANK_API_URL")
        .output()
        .expect("run qbank")
}

#[test]
fn check_prints_the_payload_of_a_yaml_draft() {
    let dir = temp_dir("qbank-check");
    let draft = dir.join("draft.yaml");
    std::fs::write(
        &draft,
        "question: Which sort is stable?
topic: Algorithms
subtopic: Sorting
question_type: single
marks: 2
time_limit: 120
tags: sorting, stability
options:
  - Quick sort
  - Merge sort
correct_answers: [1]
",
    )
    .expect("write draft");

    let output = qbank(&["check", "mcq", draft.to_str().expect("utf-8 path")]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let payload: Value = serde_json::from_slice(&output.stdout).expect("payload json");
    assert_eq!(payload["marks"], Value::from(2.0));
    assert_eq!(payload["time_limit"], Value::from(120));
    assert_eq!(payload["options"].as_array().map(Vec::len), Some(2));
    assert_eq!(payload["correct_answers"][0], payload["options"][1]["option_id"]);
    assert_eq!(payload["tags"], serde_json::json!(["sorting", "stability"]));
}

#[test]
fn check_rejects_an_invalid_draft() {
    let dir = temp_dir("qbank-invalid");
    let draft = dir.join("draft.json");
    std::fs::write(
        &draft,
        r#"{ "question": "Order these", "topic": "Algorithms", "items": [] }"#,
    )
    .expect("write draft");

    let output = qbank(&["check", "rearrange", draft.to_str().expect("utf-8 path")]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("add at least 1 items"));
}

#[test]
fn unknown_commands_print_usage() {
    let output = qbank(&["frobnicate"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage:"));
}
