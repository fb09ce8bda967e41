use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use bnr_reconcile::{
    ComparisonOperator, NotificationDescriptor, NotificationType, ReconciliationRecord,
    SubscriberSet, ThresholdType,
};
use serde::Deserialize;

use crate::LoadedConfig;

/// Env var consulted for the caller's account when the declaration names none.
pub const DEFAULT_ACCOUNT_ENV: &str = "BNR_ACCOUNT_ID";

/// Typed view of a merged declaration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BnrConfig {
    #[serde(default)]
    pub caller: CallerConfig,
    /// Keyed by declaration name. The name is what local state is tracked under.
    #[serde(default)]
    pub notifications: BTreeMap<String, NotificationDecl>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallerConfig {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub account_id_env: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationDecl {
    pub budget_name: String,
    #[serde(default)]
    pub account_id: Option<String>,
    pub comparison_operator: ComparisonOperator,
    pub threshold: f64,
    /// Required here even though listings may omit it: a declaration names
    /// the full comparison key.
    pub threshold_type: ThresholdType,
    pub notification_type: NotificationType,
    #[serde(default)]
    pub subscriber_email_addresses: Vec<String>,
    #[serde(default)]
    pub subscriber_sns_topic_arns: Vec<String>,
}

impl BnrConfig {
    /// Extract and validate the typed config from a loaded document.
    pub fn from_loaded(loaded: &LoadedConfig) -> Result<Self> {
        let cfg: BnrConfig = serde_json::from_value(loaded.config_json.clone())
            .context("CONFIG_INVALID: declaration document does not match schema")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(id) = &self.caller.account_id {
            validate_account_id(id).context("caller.account_id")?;
        }
        for (name, decl) in &self.notifications {
            if let Some(id) = &decl.account_id {
                validate_account_id(id).with_context(|| format!("notifications.{name}"))?;
            }
        }
        Ok(())
    }

    /// Caller account from the environment.
    pub fn caller_account_id(&self) -> Result<String> {
        self.caller.resolve_with(|name| std::env::var(name).ok())
    }
}

impl CallerConfig {
    /// Literal `account_id` wins; otherwise the env var named by
    /// `account_id_env` (or [`DEFAULT_ACCOUNT_ENV`]) is read through `lookup`.
    pub fn resolve_with<F>(&self, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(id) = &self.account_id {
            validate_account_id(id)?;
            return Ok(id.clone());
        }
        let var = self
            .account_id_env
            .as_deref()
            .unwrap_or(DEFAULT_ACCOUNT_ENV);
        let Some(raw) = lookup(var) else {
            bail!("CONFIG_MISSING_ACCOUNT: caller account not set; export {var} or set caller.account_id");
        };
        let id = raw.trim().to_string();
        validate_account_id(&id).with_context(|| format!("env {var}"))?;
        Ok(id)
    }
}

impl NotificationDecl {
    pub fn descriptor(&self) -> NotificationDescriptor {
        NotificationDescriptor::new(
            self.comparison_operator,
            self.threshold,
            self.threshold_type,
            self.notification_type,
        )
    }

    /// Desired record for the engine. Subscriber duplicates collapse here.
    pub fn to_record(&self) -> ReconciliationRecord {
        ReconciliationRecord::new(
            self.budget_name.clone(),
            self.account_id.clone(),
            self.descriptor(),
            SubscriberSet::from_addresses(
                self.subscriber_email_addresses.iter().cloned(),
                self.subscriber_sns_topic_arns.iter().cloned(),
            ),
        )
    }
}

/// Account ids are exactly twelve ASCII digits.
pub fn validate_account_id(id: &str) -> Result<()> {
    if id.len() != 12 || !id.bytes().all(|b| b.is_ascii_digit()) {
        bail!("CONFIG_INVALID_ACCOUNT: {id:?} is not a 12-digit account id");
    }
    Ok(())
}
