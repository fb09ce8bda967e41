use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// How the spend is compared against the threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonOperator {
    GreaterThan,
    LessThan,
    EqualTo,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::GreaterThan => "GREATER_THAN",
            ComparisonOperator::LessThan => "LESS_THAN",
            ComparisonOperator::EqualTo => "EQUAL_TO",
        }
    }
}

/// Whether the threshold is a percentage of the budget or an absolute amount.
///
/// The remote service omits this field on output when it is `Percentage`,
/// which is why `Percentage` is also the `Default`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThresholdType {
    #[default]
    Percentage,
    AbsoluteValue,
}

impl ThresholdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdType::Percentage => "PERCENTAGE",
            ThresholdType::AbsoluteValue => "ABSOLUTE_VALUE",
        }
    }
}

/// Actual spend vs forecasted spend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    Actual,
    Forecasted,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Actual => "ACTUAL",
            NotificationType::Forecasted => "FORECASTED",
        }
    }
}

/// The identity-bearing attributes of a notification rule.
///
/// Equality is defined through [`ComparisonKey`]: all four fields, with the
/// threshold compared bit-for-bit.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct NotificationDescriptor {
    pub comparison_operator: ComparisonOperator,
    pub threshold: f64,
    pub threshold_type: ThresholdType,
    pub notification_type: NotificationType,
}

impl NotificationDescriptor {
    pub fn new(
        comparison_operator: ComparisonOperator,
        threshold: f64,
        threshold_type: ThresholdType,
        notification_type: NotificationType,
    ) -> Self {
        Self {
            comparison_operator,
            threshold,
            threshold_type,
            notification_type,
        }
    }

    pub fn key(&self) -> ComparisonKey {
        ComparisonKey {
            comparison_operator: self.comparison_operator,
            threshold_bits: self.threshold.to_bits(),
            threshold_type: self.threshold_type,
            notification_type: self.notification_type,
        }
    }
}

impl PartialEq for NotificationDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for NotificationDescriptor {}

impl fmt::Display for NotificationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ({})",
            self.notification_type.as_str(),
            self.comparison_operator.as_str(),
            self.threshold,
            self.threshold_type.as_str()
        )
    }
}

/// Natural key of a notification. There is no surrogate id on the remote side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComparisonKey {
    pub comparison_operator: ComparisonOperator,
    /// `f64::to_bits` of the threshold: equality is exact, never tolerant.
    pub threshold_bits: u64,
    pub threshold_type: ThresholdType,
    pub notification_type: NotificationType,
}

/// Notification as listed by the remote service.
///
/// Same shape as [`NotificationDescriptor`] except that `threshold_type` may be
/// absent. Always go through [`RemoteNotification::normalize`] before comparing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteNotification {
    pub comparison_operator: ComparisonOperator,
    pub threshold: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_type: Option<ThresholdType>,
    pub notification_type: NotificationType,
}

impl RemoteNotification {
    /// Restore the default the service drops on output.
    pub fn normalize(self) -> NotificationDescriptor {
        NotificationDescriptor {
            comparison_operator: self.comparison_operator,
            threshold: self.threshold,
            threshold_type: self.threshold_type.unwrap_or_default(),
            notification_type: self.notification_type,
        }
    }
}

impl From<NotificationDescriptor> for RemoteNotification {
    fn from(d: NotificationDescriptor) -> Self {
        Self {
            comparison_operator: d.comparison_operator,
            threshold: d.threshold,
            threshold_type: Some(d.threshold_type),
            notification_type: d.notification_type,
        }
    }
}

/// Subscriber classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriberKind {
    /// Direct message to an email address.
    Email,
    /// Publish/subscribe topic broadcast.
    Topic,
}

impl SubscriberKind {
    pub const ALL: [SubscriberKind; 2] = [SubscriberKind::Email, SubscriberKind::Topic];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriberKind::Email => "EMAIL",
            SubscriberKind::Topic => "TOPIC",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriberEntry {
    pub kind: SubscriberKind,
    pub address: String,
}

impl SubscriberEntry {
    pub fn new(kind: SubscriberKind, address: impl Into<String>) -> Self {
        Self {
            kind,
            address: address.into(),
        }
    }

    pub fn email(address: impl Into<String>) -> Self {
        Self::new(SubscriberKind::Email, address)
    }

    pub fn topic(address: impl Into<String>) -> Self {
        Self::new(SubscriberKind::Topic, address)
    }
}

static NO_ADDRESSES: BTreeSet<String> = BTreeSet::new();

/// Subscriber addresses keyed by kind. Unique by (kind, address).
///
/// Equality ignores kinds whose address set is empty.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberSet {
    by_kind: BTreeMap<SubscriberKind, BTreeSet<String>>,
}

impl SubscriberSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = SubscriberEntry>,
    {
        let mut set = Self::empty();
        for e in entries {
            set.insert(e.kind, e.address);
        }
        set
    }

    /// Build from the two declared address lists.
    pub fn from_addresses<E, T, S>(emails: E, topics: T) -> Self
    where
        E: IntoIterator<Item = S>,
        T: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::empty();
        for a in emails {
            set.insert(SubscriberKind::Email, a);
        }
        for a in topics {
            set.insert(SubscriberKind::Topic, a);
        }
        set
    }

    /// Returns `false` if the address was already present for that kind.
    pub fn insert(&mut self, kind: SubscriberKind, address: impl Into<String>) -> bool {
        self.by_kind.entry(kind).or_default().insert(address.into())
    }

    pub fn addresses(&self, kind: SubscriberKind) -> &BTreeSet<String> {
        self.by_kind.get(&kind).unwrap_or(&NO_ADDRESSES)
    }

    /// Size of the union across kinds.
    pub fn len(&self) -> usize {
        self.by_kind.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattened entries, kind-major, addresses sorted.
    pub fn entries(&self) -> Vec<SubscriberEntry> {
        let mut out = Vec::with_capacity(self.len());
        for (kind, addrs) in &self.by_kind {
            for a in addrs {
                out.push(SubscriberEntry::new(*kind, a.clone()));
            }
        }
        out
    }
}

impl PartialEq for SubscriberSet {
    fn eq(&self, other: &Self) -> bool {
        SubscriberKind::ALL
            .iter()
            .all(|k| self.addresses(*k) == other.addresses(*k))
    }
}

impl Eq for SubscriberSet {}

/// The owning budget of a notification, account already resolved.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BudgetRef {
    pub account_id: String,
    pub budget_name: String,
}

impl BudgetRef {
    pub fn new(account_id: impl Into<String>, budget_name: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            budget_name: budget_name.into(),
        }
    }
}

impl fmt::Display for BudgetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account_id, self.budget_name)
    }
}

/// Locally tracked state of one notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRecord {
    pub budget_name: String,
    /// `None` means "the caller's own account".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub notification: NotificationDescriptor,
    pub subscribers: SubscriberSet,
}

impl ReconciliationRecord {
    pub fn new(
        budget_name: impl Into<String>,
        account_id: Option<String>,
        notification: NotificationDescriptor,
        subscribers: SubscriberSet,
    ) -> Self {
        Self {
            budget_name: budget_name.into(),
            account_id,
            notification,
            subscribers,
        }
    }

    /// Resolve the owning budget, defaulting the account to `caller_account_id`.
    pub fn target(&self, caller_account_id: &str) -> BudgetRef {
        BudgetRef {
            account_id: self
                .account_id
                .clone()
                .unwrap_or_else(|| caller_account_id.to_string()),
            budget_name: self.budget_name.clone(),
        }
    }
}
