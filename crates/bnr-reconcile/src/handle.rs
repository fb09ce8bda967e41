use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::BudgetRef;

/// Process-local bookkeeping token minted on create.
///
/// The remote service does not know this value. It must never be sent back to
/// it; remote calls always address a notification by its comparison key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalHandle(String);

impl LocalHandle {
    /// `"{account}:{budget}:{random suffix}"`
    pub fn mint(target: &BudgetRef) -> Self {
        Self(format!(
            "{}:{}:{}",
            target.account_id,
            target.budget_name,
            Uuid::new_v4().simple()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_share_prefix_but_never_collide() {
        let target = BudgetRef::new("123456789012", "monthly");
        let a = LocalHandle::mint(&target);
        let b = LocalHandle::mint(&target);
        assert!(a.as_str().starts_with("123456789012:monthly:"));
        assert!(b.as_str().starts_with("123456789012:monthly:"));
        assert_ne!(a, b);
    }
}
