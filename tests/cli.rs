#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::path::Path;
use tempfile::tempdir;

fn write_request(dir: &Path, workers: serde_json::Value, order: serde_json::Value) -> String {
    let days: Vec<_> = (2..=8).map(|d| format!("2025-06-{d:02}")).collect();
    let requirements: Vec<_> = days
        .iter()
        .map(|d| json!({ "date": d, "area": "Bar", "shift": "Morning", "headcount": 1 }))
        .collect();
    let request = json!({
        "input": {
            "start_date": "2025-06-02",
            "weeks": 1,
            "shifts": ["Morning"],
            "areas": ["Bar"],
            "workers": workers,
            "requirements": requirements
        },
        "relaxation_order": order,
        "options": { "attempt_time_limit_ms": 30000 }
    });
    let path = dir.join("request.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&request).unwrap()).unwrap();
    path.to_string_lossy().into_owned()
}

fn two_workers() -> serde_json::Value {
    json!([
        { "id": "ana", "areas": ["Bar"], "max_shifts_per_week": 5 },
        { "id": "bo", "areas": ["Bar"], "max_shifts_per_week": 5 }
    ])
}

#[test]
fn solve_prints_report_and_writes_outputs() {
    let dir = tempdir().unwrap();
    let request = write_request(dir.path(), two_workers(), json!(["Day Weights"]));
    let out_json = dir.path().join("result.json");
    let out_csv = dir.path().join("schedule.csv");

    Command::cargo_bin("staffplan-cli")
        .unwrap()
        .args(["--request", &request, "solve"])
        .arg("--out-json")
        .arg(&out_json)
        .arg("--out-csv")
        .arg(&out_csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("Schedule found (7 entries)."))
        .stdout(predicate::str::contains("Relaxed rules: none"))
        .stdout(predicate::str::contains("Capacity Report:"));

    let csv = std::fs::read_to_string(&out_csv).unwrap();
    assert!(csv.starts_with("worker,date,weekday,shift,area"));
    assert_eq!(csv.lines().count(), 8);

    Command::cargo_bin("staffplan-cli")
        .unwrap()
        .args(["--request", &request, "check", "--result"])
        .arg(&out_json)
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: no weekend violations"));
}

#[test]
fn exhausted_solve_exits_with_code_2() {
    let dir = tempdir().unwrap();
    let workers = json!([{ "id": "ana", "areas": ["Bar"], "max_shifts_per_week": 5 }]);
    let request = write_request(dir.path(), workers, json!([]));

    Command::cargo_bin("staffplan-cli")
        .unwrap()
        .args(["--request", &request, "solve"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Failed to find a feasible schedule"))
        .stdout(predicate::str::contains("Bar: short by 2 shift(s)"));

    Command::cargo_bin("staffplan-cli")
        .unwrap()
        .args(["--request", &request, "capacity"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("7 shifts required, 5 max shifts available"));
}

#[test]
fn windows_lists_clipped_weekends() {
    let dir = tempdir().unwrap();
    let request = write_request(dir.path(), two_workers(), json!([]));

    Command::cargo_bin("staffplan-cli")
        .unwrap()
        .args(["--request", &request, "windows"])
        .assert()
        .success()
        .stdout(predicate::str::diff("2025-06-06 → 2025-06-08\n"));
}

#[test]
fn missing_request_file_fails() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("staffplan-cli")
        .unwrap()
        .current_dir(dir.path())
        .arg("capacity")
        .assert()
        .failure()
        .stderr(predicate::str::contains("request.json"));
}
