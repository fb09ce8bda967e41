use std::collections::{BTreeMap, BTreeSet};

use crate::{SubscriberEntry, SubscriberKind, SubscriberSet};

/// Minimal change between two address sets of one kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SetDiff {
    pub to_remove: BTreeSet<String>,
    pub to_add: BTreeSet<String>,
}

impl SetDiff {
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}

/// `to_remove = previous - desired`, `to_add = desired - previous`.
///
/// Addresses present on both sides appear in neither output.
pub fn diff(previous: &BTreeSet<String>, desired: &BTreeSet<String>) -> SetDiff {
    SetDiff {
        to_remove: previous.difference(desired).cloned().collect(),
        to_add: desired.difference(previous).cloned().collect(),
    }
}

/// Per-kind diff of two subscriber sets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubscriberDiff {
    per_kind: BTreeMap<SubscriberKind, SetDiff>,
}

impl SubscriberDiff {
    pub fn for_kind(&self, kind: SubscriberKind) -> Option<&SetDiff> {
        self.per_kind.get(&kind)
    }

    /// Entries to add, kind-major, addresses sorted.
    pub fn additions(&self) -> Vec<SubscriberEntry> {
        self.per_kind
            .iter()
            .flat_map(|(kind, d)| d.to_add.iter().map(|a| SubscriberEntry::new(*kind, a.clone())))
            .collect()
    }

    /// Entries to remove, kind-major, addresses sorted.
    pub fn removals(&self) -> Vec<SubscriberEntry> {
        self.per_kind
            .iter()
            .flat_map(|(kind, d)| {
                d.to_remove
                    .iter()
                    .map(|a| SubscriberEntry::new(*kind, a.clone()))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.per_kind.values().all(SetDiff::is_empty)
    }
}

pub fn diff_subscribers(previous: &SubscriberSet, desired: &SubscriberSet) -> SubscriberDiff {
    let mut per_kind = BTreeMap::new();
    for kind in SubscriberKind::ALL {
        let d = diff(previous.addresses(kind), desired.addresses(kind));
        if !d.is_empty() {
            per_kind.insert(kind, d);
        }
    }
    SubscriberDiff { per_kind }
}
