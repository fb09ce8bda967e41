use std::cell::RefCell;

use bnr_reconcile::{
    BudgetClient, BudgetRef, NotificationDescriptor, RemoteError, RemoteNotification,
    SubscriberEntry,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
    CreateNotification,
    ListNotifications,
    ListSubscribers,
    AddSubscriber,
    RemoveSubscriber,
    UpdateNotification,
    DeleteNotification,
}

/// One issued call with its arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientCall {
    CreateNotification {
        target: BudgetRef,
        notification: NotificationDescriptor,
        subscribers: Vec<SubscriberEntry>,
    },
    ListNotifications {
        target: BudgetRef,
    },
    ListSubscribers {
        target: BudgetRef,
        notification: NotificationDescriptor,
    },
    AddSubscriber {
        target: BudgetRef,
        notification: NotificationDescriptor,
        subscriber: SubscriberEntry,
    },
    RemoveSubscriber {
        target: BudgetRef,
        notification: NotificationDescriptor,
        subscriber: SubscriberEntry,
    },
    UpdateNotification {
        target: BudgetRef,
        old: NotificationDescriptor,
        new: NotificationDescriptor,
    },
    DeleteNotification {
        target: BudgetRef,
        notification: NotificationDescriptor,
    },
}

impl ClientCall {
    pub fn kind(&self) -> CallKind {
        match self {
            ClientCall::CreateNotification { .. } => CallKind::CreateNotification,
            ClientCall::ListNotifications { .. } => CallKind::ListNotifications,
            ClientCall::ListSubscribers { .. } => CallKind::ListSubscribers,
            ClientCall::AddSubscriber { .. } => CallKind::AddSubscriber,
            ClientCall::RemoveSubscriber { .. } => CallKind::RemoveSubscriber,
            ClientCall::UpdateNotification { .. } => CallKind::UpdateNotification,
            ClientCall::DeleteNotification { .. } => CallKind::DeleteNotification,
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(
            self.kind(),
            CallKind::ListNotifications | CallKind::ListSubscribers
        )
    }
}

struct InjectedFailure {
    kind: CallKind,
    /// 1-based occurrence of `kind` that fails.
    nth: usize,
    error: RemoteError,
}

/// Records every call, then forwards it to `inner` unless a failure was
/// injected for it. Failing calls are recorded too: they were issued.
pub struct RecordingClient<C> {
    inner: C,
    calls: RefCell<Vec<ClientCall>>,
    failures: RefCell<Vec<InjectedFailure>>,
}

impl<C: BudgetClient> RecordingClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            calls: RefCell::new(Vec::new()),
            failures: RefCell::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Fail the `nth` (1-based) call of `kind` with `error`. Fires once.
    pub fn fail_nth(&self, kind: CallKind, nth: usize, error: RemoteError) {
        self.failures
            .borrow_mut()
            .push(InjectedFailure { kind, nth, error });
    }

    pub fn calls(&self) -> Vec<ClientCall> {
        self.calls.borrow().clone()
    }

    pub fn kinds(&self) -> Vec<CallKind> {
        self.calls.borrow().iter().map(ClientCall::kind).collect()
    }

    pub fn count(&self, kind: CallKind) -> usize {
        self.calls.borrow().iter().filter(|c| c.kind() == kind).count()
    }

    pub fn mutations(&self) -> Vec<ClientCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    /// Forget recorded calls. Unfired failures stay armed and count from zero again.
    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: ClientCall) -> Result<(), RemoteError> {
        let kind = call.kind();
        let mut calls = self.calls.borrow_mut();
        calls.push(call);
        let seen = calls.iter().filter(|c| c.kind() == kind).count();
        drop(calls);

        let mut failures = self.failures.borrow_mut();
        match failures.iter().position(|f| f.kind == kind && f.nth == seen) {
            Some(idx) => Err(failures.remove(idx).error),
            None => Ok(()),
        }
    }
}

impl<C: BudgetClient> BudgetClient for RecordingClient<C> {
    fn create_notification(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
        subscribers: &[SubscriberEntry],
    ) -> Result<(), RemoteError> {
        self.record(ClientCall::CreateNotification {
            target: target.clone(),
            notification: *notification,
            subscribers: subscribers.to_vec(),
        })?;
        self.inner
            .create_notification(target, notification, subscribers)
    }

    fn list_notifications(&self, target: &BudgetRef) -> Result<Vec<RemoteNotification>, RemoteError> {
        self.record(ClientCall::ListNotifications {
            target: target.clone(),
        })?;
        self.inner.list_notifications(target)
    }

    fn list_subscribers(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
    ) -> Result<Vec<SubscriberEntry>, RemoteError> {
        self.record(ClientCall::ListSubscribers {
            target: target.clone(),
            notification: *notification,
        })?;
        self.inner.list_subscribers(target, notification)
    }

    fn add_subscriber(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
        subscriber: &SubscriberEntry,
    ) -> Result<(), RemoteError> {
        self.record(ClientCall::AddSubscriber {
            target: target.clone(),
            notification: *notification,
            subscriber: subscriber.clone(),
        })?;
        self.inner.add_subscriber(target, notification, subscriber)
    }

    fn remove_subscriber(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
        subscriber: &SubscriberEntry,
    ) -> Result<(), RemoteError> {
        self.record(ClientCall::RemoveSubscriber {
            target: target.clone(),
            notification: *notification,
            subscriber: subscriber.clone(),
        })?;
        self.inner.remove_subscriber(target, notification, subscriber)
    }

    fn update_notification(
        &self,
        target: &BudgetRef,
        old: &NotificationDescriptor,
        new: &NotificationDescriptor,
    ) -> Result<(), RemoteError> {
        self.record(ClientCall::UpdateNotification {
            target: target.clone(),
            old: *old,
            new: *new,
        })?;
        self.inner.update_notification(target, old, new)
    }

    fn delete_notification(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
    ) -> Result<(), RemoteError> {
        self.record(ClientCall::DeleteNotification {
            target: target.clone(),
            notification: *notification,
        })?;
        self.inner.delete_notification(target, notification)
    }
}
