//! A remote read failure on one tracked notification does not stop the others.
//!
//! GREEN when:
//! - `bnr plan` reports the failing declaration and still plans the rest
//! - `bnr refresh` forgets notifications deleted upstream, keeps the failing
//!   one tracked, saves state, then exits non-zero

use predicates::prelude::*;
use std::fs;
use std::path::Path;

const ACCOUNT: &str = "111122223333";

const DECLARATIONS: &str = r#"
caller:
  account_id_env: BNR_ACCOUNT_ID
notifications:
  a-monthly:
    budget_name: monthly-cost
    comparison_operator: GREATER_THAN
    threshold: 80
    threshold_type: PERCENTAGE
    notification_type: ACTUAL
    subscriber_email_addresses: [ops@example.com]
  b-shared:
    budget_name: shared-cost
    comparison_operator: GREATER_THAN
    threshold: 1000
    threshold_type: ABSOLUTE_VALUE
    notification_type: FORECASTED
    subscriber_email_addresses: [fin@example.com]
"#;

#[allow(deprecated)]
fn bnr(dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("bnr").unwrap();
    cmd.current_dir(dir)
        .env("BNR_ACCOUNT_ID", ACCOUNT)
        .env("RUST_LOG", "warn");
    cmd
}

fn reconcile_args(verb: &str) -> [&str; 7] {
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

fn seed_budget(dir: &Path, budget: &str) {
    bnr(dir)
        .args([
            "paper", "init", "--paper", "paper.json", "--account", ACCOUNT, "--budget", budget,
        ])
        .assert()
        .success();
}

#[test]
fn refresh_saves_progress_before_failing() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("bnr.yaml"), DECLARATIONS).unwrap();
    seed_budget(root, "monthly-cost");
    seed_budget(root, "shared-cost");
    bnr(root).args(reconcile_args("apply")).assert().success();

    // Upstream: the monthly notification is gone and the shared budget no
    // longer exists, so reading it is a remote error rather than an absence.
    let ledger = serde_json::json!({
        "budgets": [
            { "account_id": ACCOUNT, "budget_name": "monthly-cost", "notifications": [] }
        ]
    });
    fs::write(root.join("paper.json"), ledger.to_string()).unwrap();

    bnr(root)
        .args(reconcile_args("plan"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("name=a-monthly action=recreate"))
        .stdout(predicate::str::contains("name=b-shared action=failed"))
        .stderr(predicate::str::contains("PLAN_INCOMPLETE"));

    bnr(root)
        .args(reconcile_args("refresh"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("name=a-monthly action=forgotten"))
        .stdout(predicate::str::contains("name=b-shared action=failed"))
        .stderr(predicate::str::contains("REFRESH_INCOMPLETE"));

    let raw = fs::read_to_string(root.join("state.json")).unwrap();
    let state: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let tracked = state["notifications"].as_object().unwrap();
    assert!(!tracked.contains_key("a-monthly"));
    assert!(tracked.contains_key("b-shared"));
}
