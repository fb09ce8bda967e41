//! Deterministic in-memory "paper" budgeting service.
//!
//! Behaves like the remote service as far as the reconciler can observe:
//! - budgets must exist before notifications can be attached
//!   (`ensure_budget`); anything else is `NotFound`
//! - a notification is created with its full subscriber list, which must be
//!   non-empty
//! - duplicate comparison keys are accepted without complaint
//! - listings omit `threshold_type` when it is PERCENTAGE
//! - every lookup by descriptor uses the first match in listing order
//! - adding an existing subscriber is `DuplicateRecord`, removing a missing one
//!   is `NotFound`
//!
//! No randomness, no timestamps. State is a serializable [`PaperLedger`] that
//! can be saved to / loaded from a JSON file.

use std::cell::RefCell;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bnr_reconcile::{
    is_same_notification, BudgetClient, BudgetRef, NotificationDescriptor, RemoteError,
    RemoteNotification, SubscriberEntry, ThresholdType,
};
use tracing::debug;

pub mod types;

pub use types::{PaperBudget, PaperLedger, PaperNotification};

type RemoteResult<T> = std::result::Result<T, RemoteError>;

#[derive(Debug, Default)]
pub struct PaperBudgetService {
    ledger: RefCell<PaperLedger>,
}

impl PaperBudgetService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ledger(ledger: PaperLedger) -> Self {
        Self {
            ledger: RefCell::new(ledger),
        }
    }

    /// Load a ledger file. A missing file is an empty service.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read paper ledger: {}", path.display()))?;
        let ledger: PaperLedger = serde_json::from_str(&raw)
            .with_context(|| format!("parse paper ledger: {}", path.display()))?;
        Ok(Self::from_ledger(ledger))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let raw = serde_json::to_string_pretty(&*self.ledger.borrow())
            .context("serialize paper ledger")?;
        fs::write(path, raw)
            .with_context(|| format!("write paper ledger: {}", path.display()))?;
        Ok(())
    }

    /// Snapshot of the current state.
    pub fn ledger(&self) -> PaperLedger {
        self.ledger.borrow().clone()
    }

    /// Register a budget so notifications can be attached to it. Idempotent.
    pub fn ensure_budget(&self, target: &BudgetRef) {
        let mut ledger = self.ledger.borrow_mut();
        if ledger.budgets.iter().any(|b| b.matches(target)) {
            return;
        }
        ledger.budgets.push(PaperBudget {
            account_id: target.account_id.clone(),
            budget_name: target.budget_name.clone(),
            notifications: Vec::new(),
        });
    }

    /// Number of stored notifications under `target` (0 for unknown budgets).
    pub fn notification_count(&self, target: &BudgetRef) -> usize {
        self.ledger
            .borrow()
            .budgets
            .iter()
            .find(|b| b.matches(target))
            .map(|b| b.notifications.len())
            .unwrap_or(0)
    }

    fn with_budget<T>(
        &self,
        target: &BudgetRef,
        f: impl FnOnce(&mut PaperBudget) -> RemoteResult<T>,
    ) -> RemoteResult<T> {
        let mut ledger = self.ledger.borrow_mut();
        let budget = ledger
            .budgets
            .iter_mut()
            .find(|b| b.matches(target))
            .ok_or_else(|| RemoteError::NotFound(format!("budget {target}")))?;
        f(budget)
    }

    fn with_notification<T>(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
        f: impl FnOnce(&mut PaperNotification) -> RemoteResult<T>,
    ) -> RemoteResult<T> {
        self.with_budget(target, |budget| {
            let n = budget
                .notifications
                .iter_mut()
                .find(|n| is_same_notification(&n.notification, notification))
                .ok_or_else(|| not_found(target, notification))?;
            f(n)
        })
    }
}

fn not_found(target: &BudgetRef, notification: &NotificationDescriptor) -> RemoteError {
    RemoteError::NotFound(format!("notification {notification} in budget {target}"))
}

/// The wire shape drops the default threshold type.
fn as_listed(n: &NotificationDescriptor) -> RemoteNotification {
    let mut listed = RemoteNotification::from(*n);
    if n.threshold_type == ThresholdType::Percentage {
        listed.threshold_type = None;
    }
    listed
}

impl BudgetClient for PaperBudgetService {
    fn create_notification(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
        subscribers: &[SubscriberEntry],
    ) -> RemoteResult<()> {
        if subscribers.is_empty() {
            return Err(RemoteError::InvalidRequest(
                "a notification needs at least one subscriber".to_string(),
            ));
        }
        self.with_budget(target, |budget| {
            let mut unique: Vec<SubscriberEntry> = Vec::with_capacity(subscribers.len());
            for s in subscribers {
                if !unique.contains(s) {
                    unique.push(s.clone());
                }
            }
            budget.notifications.push(PaperNotification {
                notification: *notification,
                subscribers: unique,
            });
            debug!(budget = %target, notification = %notification, "paper: notification created");
            Ok(())
        })
    }

    fn list_notifications(&self, target: &BudgetRef) -> RemoteResult<Vec<RemoteNotification>> {
        self.with_budget(target, |budget| {
            Ok(budget
                .notifications
                .iter()
                .map(|n| as_listed(&n.notification))
                .collect())
        })
    }

    fn list_subscribers(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
    ) -> RemoteResult<Vec<SubscriberEntry>> {
        self.with_notification(target, notification, |n| Ok(n.subscribers.clone()))
    }

    fn add_subscriber(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
        subscriber: &SubscriberEntry,
    ) -> RemoteResult<()> {
        self.with_notification(target, notification, |n| {
            if n.subscribers.contains(subscriber) {
                return Err(RemoteError::DuplicateRecord(format!(
                    "{} subscriber {}",
                    subscriber.kind.as_str(),
                    subscriber.address
                )));
            }
            n.subscribers.push(subscriber.clone());
            Ok(())
        })
    }

    fn remove_subscriber(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
        subscriber: &SubscriberEntry,
    ) -> RemoteResult<()> {
        self.with_notification(target, notification, |n| {
            let before = n.subscribers.len();
            n.subscribers.retain(|s| s != subscriber);
            if n.subscribers.len() == before {
                return Err(RemoteError::NotFound(format!(
                    "{} subscriber {}",
                    subscriber.kind.as_str(),
                    subscriber.address
                )));
            }
            Ok(())
        })
    }

    fn update_notification(
        &self,
        target: &BudgetRef,
        old: &NotificationDescriptor,
        new: &NotificationDescriptor,
    ) -> RemoteResult<()> {
        self.with_notification(target, old, |n| {
            n.notification = *new;
            Ok(())
        })
    }

    fn delete_notification(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
    ) -> RemoteResult<()> {
        self.with_budget(target, |budget| {
            let idx = budget
                .notifications
                .iter()
                .position(|n| is_same_notification(&n.notification, notification))
                .ok_or_else(|| not_found(target, notification))?;
            budget.notifications.remove(idx);
            Ok(())
        })
    }
}
