//! Update planning.
//!
//! An [`UpdatePlan`] is the exact list of remote calls an update will issue.
//! Building it performs every pre-flight check, so an update either fails
//! before touching the remote side or executes the plan as computed.

use crate::{
    diff_subscribers, BudgetRef, NotificationDescriptor, ReconcileError, ReconciliationRecord,
    SubscriberEntry, SubscriberKind, ValidationError,
};

/// Rule-field change: `old` selects the notification, `new` replaces it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuleChange {
    pub old: NotificationDescriptor,
    pub new: NotificationDescriptor,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdatePlan {
    pub target: BudgetRef,
    /// Key of the notification as it exists remotely before the plan runs.
    /// Subscriber calls address the notification through it.
    pub current: NotificationDescriptor,
    pub additions: Vec<SubscriberEntry>,
    pub removals: Vec<SubscriberEntry>,
    pub rule_change: Option<RuleChange>,
}

impl UpdatePlan {
    pub fn is_noop(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty() && self.rule_change.is_none()
    }

    /// Number of remote mutations the plan will issue.
    pub fn call_count(&self) -> usize {
        self.additions.len() + self.removals.len() + usize::from(self.rule_change.is_some())
    }
}

/// Pre-flight checks shared by create and update.
///
/// The subscriber check runs first so an empty declaration always reports
/// [`ValidationError::NoSubscribers`].
pub fn validate(desired: &ReconciliationRecord) -> Result<(), ValidationError> {
    if desired.subscribers.is_empty() {
        return Err(ValidationError::NoSubscribers);
    }
    for kind in SubscriberKind::ALL {
        if desired
            .subscribers
            .addresses(kind)
            .iter()
            .any(|a| a.trim().is_empty())
        {
            return Err(ValidationError::BlankAddress { kind });
        }
    }
    if !desired.notification.threshold.is_finite() {
        return Err(ValidationError::NonFiniteThreshold(
            desired.notification.threshold,
        ));
    }
    if desired.budget_name.trim().is_empty() {
        return Err(ValidationError::EmptyBudgetName);
    }
    Ok(())
}

pub(crate) fn plan_update(
    previous: &ReconciliationRecord,
    desired: &ReconciliationRecord,
    caller_account_id: &str,
) -> Result<UpdatePlan, ReconcileError> {
    validate(desired)?;

    let old_target = previous.target(caller_account_id);
    let new_target = desired.target(caller_account_id);
    if old_target.account_id != new_target.account_id {
        return Err(ReconcileError::ReplacementRequired {
            field: "account_id",
            old: old_target.account_id,
            new: new_target.account_id,
        });
    }
    if old_target.budget_name != new_target.budget_name {
        return Err(ReconcileError::ReplacementRequired {
            field: "budget_name",
            old: old_target.budget_name,
            new: new_target.budget_name,
        });
    }

    let subscriber_diff = diff_subscribers(&previous.subscribers, &desired.subscribers);

    let rule_change = if previous.notification.key() != desired.notification.key() {
        Some(RuleChange {
            old: previous.notification,
            new: desired.notification,
        })
    } else {
        None
    };

    Ok(UpdatePlan {
        target: old_target,
        current: previous.notification,
        additions: subscriber_diff.additions(),
        removals: subscriber_diff.removals(),
        rule_change,
    })
}
