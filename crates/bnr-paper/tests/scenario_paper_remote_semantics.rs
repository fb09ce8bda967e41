//! Paper budgeting service behaves like the remote side the engine expects.
//!
//! GREEN when:
//! - duplicate comparison keys are accepted and listed in creation order
//! - lookups by descriptor address the first duplicate only
//! - subscriber add/remove report DuplicateRecord / NotFound
//! - the ledger survives a save/load through a JSON file

use bnr_paper::PaperBudgetService;
use bnr_reconcile::*;

fn budget() -> BudgetRef {
    BudgetRef::new("123456789012", "monthly")
}

fn rule() -> NotificationDescriptor {
    NotificationDescriptor::new(
        ComparisonOperator::GreaterThan,
        1000.0,
        ThresholdType::AbsoluteValue,
        NotificationType::Forecasted,
    )
}

fn seeded() -> PaperBudgetService {
    let svc = PaperBudgetService::new();
    svc.ensure_budget(&budget());
    svc
}

#[test]
fn duplicate_keys_are_tolerated_and_first_is_addressed() {
    let svc = seeded();
    svc.create_notification(&budget(), &rule(), &[SubscriberEntry::email("first@x.com")])
        .unwrap();
    svc.create_notification(&budget(), &rule(), &[SubscriberEntry::email("second@x.com")])
        .unwrap();

    assert_eq!(svc.notification_count(&budget()), 2);

    let subs = svc.list_subscribers(&budget(), &rule()).unwrap();
    assert_eq!(subs, vec![SubscriberEntry::email("first@x.com")]);

    svc.delete_notification(&budget(), &rule()).unwrap();
    let subs = svc.list_subscribers(&budget(), &rule()).unwrap();
    assert_eq!(subs, vec![SubscriberEntry::email("second@x.com")]);
}

#[test]
fn create_without_subscribers_is_invalid() {
    let svc = seeded();
    let err = svc.create_notification(&budget(), &rule(), &[]).unwrap_err();
    assert!(matches!(err, RemoteError::InvalidRequest(_)));
    assert_eq!(svc.notification_count(&budget()), 0);
}

#[test]
fn subscriber_mutations_report_conflicts() {
    let svc = seeded();
    let a = SubscriberEntry::email("a@x.com");
    svc.create_notification(&budget(), &rule(), &[a.clone()]).unwrap();

    let dup = svc.add_subscriber(&budget(), &rule(), &a).unwrap_err();
    assert!(matches!(dup, RemoteError::DuplicateRecord(_)));

    let missing = svc
        .remove_subscriber(&budget(), &rule(), &SubscriberEntry::topic("arn:topic:9"))
        .unwrap_err();
    assert!(missing.is_not_found());
}

#[test]
fn update_moves_the_rule_to_the_new_key() {
    let svc = seeded();
    svc.create_notification(&budget(), &rule(), &[SubscriberEntry::email("a@x.com")])
        .unwrap();

    let new_rule = NotificationDescriptor {
        threshold: 2000.0,
        threshold_type: ThresholdType::Percentage,
        ..rule()
    };
    svc.update_notification(&budget(), &rule(), &new_rule).unwrap();

    assert!(svc.list_subscribers(&budget(), &rule()).unwrap_err().is_not_found());
    let listed = svc.list_notifications(&budget()).unwrap();
    assert_eq!(find_match(&listed, &new_rule), Some(new_rule));
}

#[test]
fn ledger_survives_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("paper.json");

    let svc = seeded();
    svc.create_notification(
        &budget(),
        &rule(),
        &[SubscriberEntry::email("a@x.com"), SubscriberEntry::topic("arn:topic:1")],
    )
    .unwrap();
    svc.save(&path).unwrap();

    let reloaded = PaperBudgetService::load(&path).unwrap();
    assert_eq!(reloaded.ledger(), svc.ledger());
}

#[test]
fn missing_ledger_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let svc = PaperBudgetService::load(dir.path().join("absent.json")).unwrap();
    assert!(svc.ledger().budgets.is_empty());
}
