use bnr_reconcile::{BudgetRef, NotificationDescriptor, SubscriberEntry};
use serde::{Deserialize, Serialize};

/// One notification as the paper service stores it.
///
/// Subscribers keep insertion order, like a remote listing would.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperNotification {
    pub notification: NotificationDescriptor,
    pub subscribers: Vec<SubscriberEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperBudget {
    pub account_id: String,
    pub budget_name: String,
    /// Listing order. Duplicate comparison keys are allowed.
    #[serde(default)]
    pub notifications: Vec<PaperNotification>,
}

impl PaperBudget {
    pub fn matches(&self, target: &BudgetRef) -> bool {
        self.account_id == target.account_id && self.budget_name == target.budget_name
    }
}

/// Full persisted state of the paper service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperLedger {
    #[serde(default)]
    pub budgets: Vec<PaperBudget>,
}
