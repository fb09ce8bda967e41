//! Local record of what was reconciled, keyed by declaration name.
//!
//! The remote service has no notion of our handles, so this file is the only
//! place a handle lives between runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bnr_reconcile::{LocalHandle, ReconciliationRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedNotification {
    pub handle: LocalHandle,
    /// Last record observed or written remotely.
    pub record: ReconciliationRecord,
    pub updated_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    #[serde(default)]
    pub notifications: BTreeMap<String, TrackedNotification>,
}

impl StateFile {
    /// Missing file is an empty state.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read state file: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parse state file: {}", path.display()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let raw = serde_json::to_string_pretty(self).context("serialize state")?;
        fs::write(path, raw).with_context(|| format!("write state file: {}", path.display()))
    }

    pub fn get(&self, name: &str) -> Option<&TrackedNotification> {
        self.notifications.get(name)
    }

    pub fn record(&self, name: &str) -> Option<&ReconciliationRecord> {
        self.get(name).map(|t| &t.record)
    }

    /// Track a freshly created (or replaced) notification. Overwrites any
    /// previous entry under `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handle: LocalHandle,
        record: ReconciliationRecord,
        now: DateTime<Utc>,
    ) {
        let name = name.into();
        debug!(name = %name, handle = %handle, "state: registered");
        self.notifications.insert(
            name,
            TrackedNotification {
                handle,
                record,
                updated_at_utc: now,
            },
        );
    }

    /// Replace the stored record, keeping the handle. Returns false if `name`
    /// is not tracked.
    pub fn refresh(&mut self, name: &str, record: ReconciliationRecord, now: DateTime<Utc>) -> bool {
        match self.notifications.get_mut(name) {
            Some(tracked) => {
                tracked.record = record;
                tracked.updated_at_utc = now;
                true
            }
            None => false,
        }
    }

    pub fn deregister(&mut self, name: &str) -> Option<TrackedNotification> {
        let removed = self.notifications.remove(name);
        if removed.is_some() {
            debug!(name, "state: deregistered");
        }
        removed
    }

    pub fn names(&self) -> Vec<String> {
        self.notifications.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }
}
