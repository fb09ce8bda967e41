//! End-to-end CLI pass against the paper service.
//!
//! GREEN when:
//! - `bnr apply` creates a declared notification and tracks it in the state file
//! - a second `bnr apply` with unchanged declarations is a no-op
//! - changing a subscriber makes the next apply an update
//! - `bnr destroy` deletes the notification and leaves the state empty
//! - a missing caller account fails before anything is touched

use predicates::prelude::*;
use std::fs;
use std::path::Path;

const ACCOUNT: &str = "111122223333";

fn declaration(email: &str) -> String {
    format!(
        r#"
caller:
  account_id_env: BNR_ACCOUNT_ID
notifications:
  monthly-80:
    budget_name: monthly-cost
    comparison_operator: GREATER_THAN
    threshold: 80
    threshold_type: PERCENTAGE
    notification_type: ACTUAL
    subscriber_email_addresses: ["{email}"]
"#
    )
}

#[allow(deprecated)]
fn bnr(dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("bnr").unwrap();
    cmd.current_dir(dir)
        .env("BNR_ACCOUNT_ID", ACCOUNT)
        .env("RUST_LOG", "warn");
    cmd
}

fn reconcile_args<'a>(verb: &'a str) -> [&'a str; 7] {
    [
        verb,
        "--config",
        "bnr.yaml",
        "--state",
        "state.json",
        "--paper",
        "paper.json",
    ]
}

fn tracked(dir: &Path) -> serde_json::Value {
    let raw = fs::read_to_string(dir.join("state.json")).unwrap();
    let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
    v["notifications"].clone()
}

#[test]
fn apply_then_noop_then_destroy() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("bnr.yaml"), declaration("ops@example.com")).unwrap();

    bnr(root)
        .args([
            "paper",
            "init",
            "--paper",
            "paper.json",
            "--account",
            ACCOUNT,
            "--budget",
            "monthly-cost",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("paper_budget=111122223333/monthly-cost"));

    bnr(root)
        .args(reconcile_args("plan"))
        .assert()
        .success()
        .stdout(predicate::str::contains("name=monthly-80 action=create"));

    bnr(root)
        .args(reconcile_args("apply"))
        .assert()
        .success()
        .stdout(predicate::str::contains("name=monthly-80 action=created"));
    let state = tracked(root);
    assert_eq!(state["monthly-80"]["record"]["budget_name"], "monthly-cost");
    assert_eq!(state["monthly-80"]["record"]["account_id"], ACCOUNT);

    bnr(root)
        .args(reconcile_args("apply"))
        .assert()
        .success()
        .stdout(predicate::str::contains("name=monthly-80 action=noop"));

    fs::write(root.join("bnr.yaml"), declaration("fin@example.com")).unwrap();
    bnr(root)
        .args(reconcile_args("plan"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "name=monthly-80 action=update adds=1 removes=1 rule_change=false",
        ));
    bnr(root)
        .args(reconcile_args("apply"))
        .assert()
        .success()
        .stdout(predicate::str::contains("name=monthly-80 action=updated"));

    bnr(root)
        .args(["paper", "show", "--paper", "paper.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fin@example.com"))
        .stdout(predicate::str::contains("ops@example.com").not());

    bnr(root)
        .args(reconcile_args("destroy"))
        .assert()
        .success()
        .stdout(predicate::str::contains("name=monthly-80 action=deleted outcome=DELETED"));
    assert!(tracked(root).as_object().unwrap().is_empty());
}

#[test]
fn missing_caller_account_fails_without_touching_state() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("bnr.yaml"), declaration("ops@example.com")).unwrap();

    bnr(root)
        .env_remove("BNR_ACCOUNT_ID")
        .args(reconcile_args("apply"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("BNR_ACCOUNT_ID"));
    assert!(!root.join("state.json").exists());
}

#[test]
fn declaration_without_subscribers_is_reported_and_fails() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(
        root.join("bnr.yaml"),
        r#"
notifications:
  empty:
    budget_name: monthly-cost
    comparison_operator: GREATER_THAN
    threshold: 80
    threshold_type: PERCENTAGE
    notification_type: ACTUAL
"#,
    )
    .unwrap();

    bnr(root)
        .args(reconcile_args("apply"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("name=empty action=failed"))
        .stderr(predicate::str::contains("APPLY_INCOMPLETE"));
    assert!(tracked(root).as_object().unwrap().is_empty());
}
