//! bnr-reconcile
//!
//! Reconciliation engine for budget notifications.
//!
//! Architectural decisions:
//! - A notification has no server-issued id; its identity is the four-field
//!   comparison key (operator, threshold, threshold type, notification type)
//! - Remote descriptors are normalized (missing threshold type => PERCENTAGE)
//!   before every comparison
//! - First matching remote notification wins; duplicates are not detected
//! - Subscriber changes are minimal per-kind set diffs, adds before removes
//! - Rule fields are updated with one call carrying old + new descriptors
//! - No retries, no rollback: the next pass converges
//!
//! All remote IO goes through the injected [`BudgetClient`].

mod client;
mod diff;
mod engine;
mod error;
mod handle;
mod matcher;
mod plan;
mod types;

pub use client::{BudgetClient, RemoteError};
pub use diff::{diff, diff_subscribers, SetDiff, SubscriberDiff};
pub use engine::{ConvergeOutcome, DeleteOutcome, ReconcilerEngine};
pub use error::{ReconcileError, ValidationError};
pub use handle::LocalHandle;
pub use matcher::{find_match, is_same_notification};
pub use plan::{validate, RuleChange, UpdatePlan};
pub use types::*;
