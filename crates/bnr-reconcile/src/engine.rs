use tracing::{debug, info, warn};

use crate::plan::{self, UpdatePlan};
use crate::{
    find_match, BudgetClient, LocalHandle, ReconcileError, ReconciliationRecord, SubscriberSet,
};

/// Result of a successful delete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The remote service no longer had the notification.
    AlreadyAbsent,
}

/// What one reconciliation pass did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConvergeOutcome {
    /// Nothing tracked, or the tracked notification vanished upstream.
    Created(LocalHandle),
    Updated,
    /// Owning budget changed: the old notification was deleted and a new one created.
    Replaced(LocalHandle),
    Unchanged,
}

/// Create/read/update/delete orchestration for budget notifications.
///
/// Every operation is a strictly sequential chain of calls on `C`. The engine
/// keeps no state between calls apart from the caller's account id, which
/// fills in records that leave `account_id` unset.
pub struct ReconcilerEngine<C> {
    client: C,
    caller_account_id: String,
}

impl<C: BudgetClient> ReconcilerEngine<C> {
    pub fn new(client: C, caller_account_id: impl Into<String>) -> Self {
        Self {
            client,
            caller_account_id: caller_account_id.into(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_client(self) -> C {
        self.client
    }

    pub fn caller_account_id(&self) -> &str {
        &self.caller_account_id
    }

    /// Create the notification with its full subscriber list in one call.
    ///
    /// Validation runs before any remote call. On success a fresh
    /// [`LocalHandle`] is minted; the remote side never sees it.
    pub fn create(&self, desired: &ReconciliationRecord) -> Result<LocalHandle, ReconcileError> {
        plan::validate(desired)?;

        let target = desired.target(&self.caller_account_id);
        let subscribers = desired.subscribers.entries();
        self.client
            .create_notification(&target, &desired.notification, &subscribers)?;

        let handle = LocalHandle::mint(&target);
        info!(
            budget = %target,
            notification = %desired.notification,
            subscribers = subscribers.len(),
            handle = %handle,
            "notification created"
        );
        Ok(handle)
    }

    /// Re-derive the record from the remote service.
    ///
    /// `Ok(None)` means no remote notification matches the record's comparison
    /// key any more: it was deleted upstream and the local handle is stale.
    pub fn read(
        &self,
        record: &ReconciliationRecord,
    ) -> Result<Option<ReconciliationRecord>, ReconcileError> {
        let target = record.target(&self.caller_account_id);
        let listed = self.client.list_notifications(&target)?;

        let Some(matched) = find_match(&listed, &record.notification) else {
            warn!(
                budget = %target,
                notification = %record.notification,
                "couldn't find notification, removing from state"
            );
            return Ok(None);
        };

        let entries = self.client.list_subscribers(&target, &matched)?;
        let subscribers = SubscriberSet::from_entries(entries);
        debug!(
            budget = %target,
            notification = %matched,
            subscribers = subscribers.len(),
            "notification read"
        );

        Ok(Some(ReconciliationRecord {
            budget_name: target.budget_name,
            account_id: Some(target.account_id),
            notification: matched,
            subscribers,
        }))
    }

    /// Compute the calls [`update`][Self::update] would issue, without issuing them.
    pub fn plan_update(
        &self,
        previous: &ReconciliationRecord,
        desired: &ReconciliationRecord,
    ) -> Result<UpdatePlan, ReconcileError> {
        plan::plan_update(previous, desired, &self.caller_account_id)
    }

    /// Converge `previous` toward `desired`.
    ///
    /// 1. All subscriber adds, then all removes, addressed by the previous key.
    /// 2. One rule update carrying old + new descriptors, only if the key changed.
    ///
    /// A failure part-way leaves earlier calls applied; the next pass converges.
    pub fn update(
        &self,
        previous: &ReconciliationRecord,
        desired: &ReconciliationRecord,
    ) -> Result<(), ReconcileError> {
        let plan = self.plan_update(previous, desired)?;
        self.apply(&plan)
    }

    /// Execute a plan produced by [`plan_update`][Self::plan_update].
    pub fn apply(&self, plan: &UpdatePlan) -> Result<(), ReconcileError> {
        for entry in &plan.additions {
            self.client
                .add_subscriber(&plan.target, &plan.current, entry)?;
            info!(
                budget = %plan.target,
                kind = entry.kind.as_str(),
                address = %entry.address,
                "subscriber added"
            );
        }

        for entry in &plan.removals {
            self.client
                .remove_subscriber(&plan.target, &plan.current, entry)?;
            info!(
                budget = %plan.target,
                kind = entry.kind.as_str(),
                address = %entry.address,
                "subscriber removed"
            );
        }

        if let Some(change) = &plan.rule_change {
            self.client
                .update_notification(&plan.target, &change.old, &change.new)?;
            info!(
                budget = %plan.target,
                old = %change.old,
                new = %change.new,
                "notification rule updated"
            );
        }

        Ok(())
    }

    /// Delete the notification. A remote not-found counts as success.
    pub fn delete(&self, record: &ReconciliationRecord) -> Result<DeleteOutcome, ReconcileError> {
        let target = record.target(&self.caller_account_id);
        match self
            .client
            .delete_notification(&target, &record.notification)
        {
            Ok(()) => {
                info!(budget = %target, notification = %record.notification, "notification deleted");
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) if e.is_not_found() => {
                debug!(budget = %target, notification = %record.notification, "notification already absent");
                Ok(DeleteOutcome::AlreadyAbsent)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// One reconciliation pass from the last known record toward `desired`.
    ///
    /// The prior record is re-read first; the plan is computed against what the
    /// remote service actually holds.
    pub fn converge(
        &self,
        prior: Option<&ReconciliationRecord>,
        desired: &ReconciliationRecord,
    ) -> Result<ConvergeOutcome, ReconcileError> {
        plan::validate(desired)?;

        let observed = match prior {
            Some(p) => self.read(p)?,
            None => None,
        };
        let Some(observed) = observed else {
            return self.create(desired).map(ConvergeOutcome::Created);
        };

        match self.plan_update(&observed, desired) {
            Ok(plan) if plan.is_noop() => Ok(ConvergeOutcome::Unchanged),
            Ok(plan) => {
                self.apply(&plan)?;
                Ok(ConvergeOutcome::Updated)
            }
            Err(ReconcileError::ReplacementRequired { field, .. }) => {
                info!(field, "owning budget changed, replacing notification");
                self.delete(&observed)?;
                self.create(desired).map(ConvergeOutcome::Replaced)
            }
            Err(e) => Err(e),
        }
    }
}
