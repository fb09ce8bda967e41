use thiserror::Error;

use crate::{RemoteError, SubscriberKind};

/// Pre-flight failures. Detected locally; no remote call has been made.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("at least one subscriber required")]
    NoSubscribers,

    #[error("{} subscriber address must not be blank", .kind.as_str())]
    BlankAddress { kind: SubscriberKind },

    #[error("threshold must be a finite number, got {0}")]
    NonFiniteThreshold(f64),

    #[error("budget name must not be empty")]
    EmptyBudgetName,
}

/// Error returned by every lifecycle operation of the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Remote failure, unchanged.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The owning budget changed; the notification cannot be moved in place.
    #[error("{field} changed from '{old}' to '{new}': notification must be replaced")]
    ReplacementRequired {
        field: &'static str,
        old: String,
        new: String,
    },
}

impl ReconcileError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ReconcileError::Validation(_))
    }

    pub fn as_remote(&self) -> Option<&RemoteError> {
        match self {
            ReconcileError::Remote(e) => Some(e),
            _ => None,
        }
    }
}
