//! Test support for the reconciler.
//!
//! - [`RecordingClient`]: wraps any [`BudgetClient`] (the paper service by
//!   default), records every call in order and can fail the n-th call of a
//!   given kind.
//! - Fixture helpers for descriptors and records.

mod recording;

pub use recording::{CallKind, ClientCall, RecordingClient};

use bnr_paper::PaperBudgetService;
use bnr_reconcile::{
    BudgetClient, BudgetRef, ComparisonOperator, NotificationDescriptor, NotificationType,
    ReconciliationRecord, SubscriberSet, ThresholdType,
};

/// Account id the engine under test treats as "the caller's own account".
pub const CALLER_ACCOUNT: &str = "111122223333";

pub const BUDGET: &str = "monthly-cost";

pub fn caller_budget() -> BudgetRef {
    BudgetRef::new(CALLER_ACCOUNT, BUDGET)
}

pub fn descriptor(
    comparison_operator: ComparisonOperator,
    threshold: f64,
    threshold_type: ThresholdType,
    notification_type: NotificationType,
) -> NotificationDescriptor {
    NotificationDescriptor::new(
        comparison_operator,
        threshold,
        threshold_type,
        notification_type,
    )
}

/// GREATER_THAN 80 PERCENTAGE ACTUAL
pub fn default_rule() -> NotificationDescriptor {
    descriptor(
        ComparisonOperator::GreaterThan,
        80.0,
        ThresholdType::Percentage,
        NotificationType::Actual,
    )
}

/// Record under [`BUDGET`] with the account left to default.
pub fn record(
    notification: NotificationDescriptor,
    emails: &[&str],
    topics: &[&str],
) -> ReconciliationRecord {
    ReconciliationRecord::new(
        BUDGET,
        None,
        notification,
        SubscriberSet::from_addresses(emails.iter().copied(), topics.iter().copied()),
    )
}

/// Paper service with the caller's [`BUDGET`] already registered.
pub fn seeded_paper() -> PaperBudgetService {
    let svc = PaperBudgetService::new();
    svc.ensure_budget(&caller_budget());
    svc
}

/// Recording client over a seeded paper service.
pub fn recording_paper() -> RecordingClient<PaperBudgetService> {
    RecordingClient::new(seeded_paper())
}

/// Create `rec` directly on `client`, bypassing the engine.
pub fn preload<C: BudgetClient>(client: &C, rec: &ReconciliationRecord) {
    let target = rec.target(CALLER_ACCOUNT);
    if let Err(e) =
        client.create_notification(&target, &rec.notification, &rec.subscribers.entries())
    {
        panic!("preload failed for {}: {e}", rec.notification);
    }
}
