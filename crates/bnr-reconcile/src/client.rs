//! Remote budgeting client contract.
//!
//! The engine never talks to the network itself. Anything that can list,
//! create, mutate and delete notifications under a budget implements
//! [`BudgetClient`]: the paper service, test doubles, or a live adapter.
//!
//! Every call names the notification by its full descriptor because the remote
//! service has no other identifier for it.

use thiserror::Error;

use crate::{BudgetRef, NotificationDescriptor, RemoteNotification, SubscriberEntry};

/// Failure reported by the remote budgeting service.
///
/// The engine propagates these unchanged. Only [`RemoteError::NotFound`] carries
/// meaning to the engine (delete treats it as "already absent").
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("throttled: {0}")]
    Throttled(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("duplicate record: {0}")]
    DuplicateRecord(String),

    #[error("service error: {0}")]
    Service(String),
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }
}

type Result<T> = std::result::Result<T, RemoteError>;

/// Operations of the remote budgeting service.
///
/// Methods take `&self`; stateful implementations use interior mutability.
pub trait BudgetClient {
    fn create_notification(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
        subscribers: &[SubscriberEntry],
    ) -> Result<()>;

    /// Threshold type may be missing from the listed notifications.
    fn list_notifications(&self, target: &BudgetRef) -> Result<Vec<RemoteNotification>>;

    fn list_subscribers(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
    ) -> Result<Vec<SubscriberEntry>>;

    fn add_subscriber(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
        subscriber: &SubscriberEntry,
    ) -> Result<()>;

    fn remove_subscriber(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
        subscriber: &SubscriberEntry,
    ) -> Result<()>;

    /// `old` selects the notification, `new` replaces its rule fields.
    fn update_notification(
        &self,
        target: &BudgetRef,
        old: &NotificationDescriptor,
        new: &NotificationDescriptor,
    ) -> Result<()>;

    fn delete_notification(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
    ) -> Result<()>;
}

impl<T: BudgetClient + ?Sized> BudgetClient for &T {
    fn create_notification(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
        subscribers: &[SubscriberEntry],
    ) -> Result<()> {
        (**self).create_notification(target, notification, subscribers)
    }

    fn list_notifications(&self, target: &BudgetRef) -> Result<Vec<RemoteNotification>> {
        (**self).list_notifications(target)
    }

    fn list_subscribers(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
    ) -> Result<Vec<SubscriberEntry>> {
        (**self).list_subscribers(target, notification)
    }

    fn add_subscriber(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
        subscriber: &SubscriberEntry,
    ) -> Result<()> {
        (**self).add_subscriber(target, notification, subscriber)
    }

    fn remove_subscriber(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
        subscriber: &SubscriberEntry,
    ) -> Result<()> {
        (**self).remove_subscriber(target, notification, subscriber)
    }

    fn update_notification(
        &self,
        target: &BudgetRef,
        old: &NotificationDescriptor,
        new: &NotificationDescriptor,
    ) -> Result<()> {
        (**self).update_notification(target, old, new)
    }

    fn delete_notification(
        &self,
        target: &BudgetRef,
        notification: &NotificationDescriptor,
    ) -> Result<()> {
        (**self).delete_notification(target, notification)
    }
}
