//! One reconciliation pass from the last known record toward the declaration.
//!
//! GREEN when:
//! - nothing tracked creates; a second identical pass only lists
//! - a notification deleted upstream is created again
//! - out-of-band subscriber drift is reverted
//! - moving to another budget or account is a replacement, never an in-place update

use bnr_reconcile::*;
use bnr_testkit::*;

#[test]
fn first_pass_creates_second_pass_is_noop() {
    let client = recording_paper();
    let engine = ReconcilerEngine::new(&client, CALLER_ACCOUNT);
    let desired = record(default_rule(), &["a@x.com"], &["arn:topic:1"]);

    let created = engine.converge(None, &desired).unwrap();
    assert!(matches!(created, ConvergeOutcome::Created(_)));

    client.clear();
    assert_eq!(
        engine.converge(Some(&desired), &desired).unwrap(),
        ConvergeOutcome::Unchanged
    );
    assert!(client.mutations().is_empty());
    assert_eq!(
        client.kinds(),
        vec![CallKind::ListNotifications, CallKind::ListSubscribers]
    );
}

#[test]
fn vanished_upstream_is_recreated() {
    let client = recording_paper();
    let engine = ReconcilerEngine::new(&client, CALLER_ACCOUNT);
    let desired = record(default_rule(), &["a@x.com"], &[]);

    // Tracked locally, never present remotely.
    let outcome = engine.converge(Some(&desired), &desired).unwrap();
    assert!(matches!(outcome, ConvergeOutcome::Created(_)));
    assert_eq!(client.inner().notification_count(&caller_budget()), 1);
}

#[test]
fn drift_made_out_of_band_is_reverted() {
    let client = recording_paper();
    let desired = record(default_rule(), &["a@x.com"], &[]);
    preload(client.inner(), &desired);
    // Someone added a subscriber by hand.
    client
        .inner()
        .add_subscriber(
            &caller_budget(),
            &default_rule(),
            &SubscriberEntry::email("intruder@x.com"),
        )
        .unwrap();
    let engine = ReconcilerEngine::new(&client, CALLER_ACCOUNT);

    assert_eq!(
        engine.converge(Some(&desired), &desired).unwrap(),
        ConvergeOutcome::Updated
    );
    assert_eq!(client.count(CallKind::RemoveSubscriber), 1);
    assert_eq!(
        engine.read(&desired).unwrap().unwrap().subscribers,
        desired.subscribers
    );
}

#[test]
fn budget_change_requires_replacement() {
    let client = recording_paper();
    let previous = record(default_rule(), &["a@x.com"], &[]);
    preload(client.inner(), &previous);
    let renamed_budget = BudgetRef::new(CALLER_ACCOUNT, "quarterly-cost");
    client.inner().ensure_budget(&renamed_budget);
    let engine = ReconcilerEngine::new(&client, CALLER_ACCOUNT);

    let mut desired = previous.clone();
    desired.budget_name = "quarterly-cost".to_string();

    let err = engine.update(&previous, &desired).unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::ReplacementRequired {
            field: "budget_name",
            ..
        }
    ));
    assert!(client.calls().is_empty());

    let outcome = engine.converge(Some(&previous), &desired).unwrap();
    let ConvergeOutcome::Replaced(handle) = &outcome else {
        panic!("expected replacement, got {outcome:?}");
    };
    assert!(handle.as_str().contains(":quarterly-cost:"));
    assert_eq!(client.inner().notification_count(&caller_budget()), 0);
    assert_eq!(client.inner().notification_count(&renamed_budget), 1);

    let kinds = client.kinds();
    let delete_at = kinds
        .iter()
        .position(|k| *k == CallKind::DeleteNotification)
        .unwrap();
    let create_at = kinds
        .iter()
        .position(|k| *k == CallKind::CreateNotification)
        .unwrap();
    assert!(delete_at < create_at);
}

#[test]
fn account_change_requires_replacement() {
    let client = recording_paper();
    let previous = record(default_rule(), &["a@x.com"], &[]);
    let engine = ReconcilerEngine::new(&client, CALLER_ACCOUNT);

    let mut desired = previous.clone();
    desired.account_id = Some("999988887777".to_string());

    let plan = engine.plan_update(&previous, &desired);
    assert!(matches!(
        plan,
        Err(ReconcileError::ReplacementRequired {
            field: "account_id",
            ..
        })
    ));
    assert!(client.calls().is_empty());
}
