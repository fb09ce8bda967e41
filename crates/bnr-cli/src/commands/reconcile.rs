//! plan / apply / refresh / destroy.
//!
//! Output is one `key=value` line per declaration so scripts can grep it.
//! Declarations are handled one at a time in name order; a failing one is
//! reported and the rest still run. State and the paper ledger are saved
//! before a failure is surfaced.

use anyhow::{bail, Result};
use bnr_paper::PaperBudgetService;
use bnr_reconcile::{
    ConvergeOutcome, DeleteOutcome, ReconcileError, ReconcilerEngine, ReconciliationRecord,
};
use chrono::Utc;
use tracing::{error, info};

use super::Session;
use crate::ReconcileArgs;

type Engine<'a> = ReconcilerEngine<&'a PaperBudgetService>;

fn engine(session: &Session) -> Engine<'_> {
    ReconcilerEngine::new(&session.paper, session.caller_account_id.clone())
}

/// The record as it will exist remotely: account made explicit.
fn as_stored(desired: &ReconciliationRecord, caller_account_id: &str) -> ReconciliationRecord {
    ReconciliationRecord {
        account_id: Some(desired.target(caller_account_id).account_id),
        ..desired.clone()
    }
}

/// Tracked names with no declaration any more.
fn orphans(session: &Session) -> Vec<String> {
    session
        .state
        .names()
        .into_iter()
        .filter(|n| !session.config.notifications.contains_key(n))
        .collect()
}

pub fn plan(args: &ReconcileArgs) -> Result<()> {
    let session = Session::open(args)?;
    let engine = engine(&session);
    println!("config_hash={}", session.loaded.config_hash);

    let mut failed: Vec<String> = Vec::new();
    for (name, decl) in &session.config.notifications {
        match planned_action(&engine, session.state.record(name), &decl.to_record()) {
            Ok(action) => println!("name={name} action={action}"),
            Err(e) => {
                error!(name = %name, error = %e, "plan failed");
                println!("name={name} action=failed error=\"{e}\"");
                failed.push(name.clone());
            }
        }
    }

    for name in orphans(&session) {
        println!("name={name} action=delete");
    }

    if !failed.is_empty() {
        bail!(
            "PLAN_INCOMPLETE: {} declaration(s) failed: {}",
            failed.len(),
            failed.join(", ")
        );
    }
    Ok(())
}

/// What a converge pass would do for one declaration, as printed by `plan`.
fn planned_action(
    engine: &Engine<'_>,
    prior: Option<&ReconciliationRecord>,
    desired: &ReconciliationRecord,
) -> Result<String, ReconcileError> {
    if let Err(e) = bnr_reconcile::validate(desired) {
        return Ok(format!("invalid error=\"{e}\""));
    }
    let Some(prior) = prior else {
        return Ok("create".to_string());
    };
    let Some(observed) = engine.read(prior)? else {
        return Ok("recreate".to_string());
    };
    match engine.plan_update(&observed, desired) {
        Ok(p) if p.is_noop() => Ok("noop".to_string()),
        Ok(p) => Ok(format!(
            "update adds={} removes={} rule_change={}",
            p.additions.len(),
            p.removals.len(),
            p.rule_change.is_some()
        )),
        Err(ReconcileError::ReplacementRequired { field, old, new }) => {
            Ok(format!("replace field={field} old={old} new={new}"))
        }
        Err(e) => Err(e),
    }
}

pub fn apply(args: &ReconcileArgs) -> Result<()> {
    let mut session = Session::open(args)?;
    println!("config_hash={}", session.loaded.config_hash);

    let mut failed: Vec<String> = Vec::new();
    let names: Vec<String> = session.config.notifications.keys().cloned().collect();

    for name in names {
        let desired = session.config.notifications[&name].to_record();
        let prior = session.state.record(&name).cloned();
        let outcome = engine(&session).converge(prior.as_ref(), &desired);

        let stored = as_stored(&desired, &session.caller_account_id);
        let now = Utc::now();
        match outcome {
            Ok(ConvergeOutcome::Created(handle)) => {
                println!("name={name} action=created handle={handle}");
                session.state.register(name, handle, stored, now);
            }
            Ok(ConvergeOutcome::Replaced(handle)) => {
                println!("name={name} action=replaced handle={handle}");
                session.state.register(name, handle, stored, now);
            }
            Ok(ConvergeOutcome::Updated) => {
                println!("name={name} action=updated");
                session.state.refresh(&name, stored, now);
            }
            Ok(ConvergeOutcome::Unchanged) => println!("name={name} action=noop"),
            Err(e) => {
                error!(name = %name, error = %e, "converge failed");
                println!("name={name} action=failed error=\"{e}\"");
                failed.push(name);
            }
        }
    }

    for name in orphans(&session) {
        let Some(tracked) = session.state.get(&name).cloned() else {
            continue;
        };
        match engine(&session).delete(&tracked.record) {
            Ok(outcome) => {
                println!("name={name} action=deleted outcome={}", outcome_str(outcome));
                session.state.deregister(&name);
            }
            Err(e) => {
                error!(name = %name, error = %e, "delete failed");
                println!("name={name} action=failed error=\"{e}\"");
                failed.push(name);
            }
        }
    }

    session.save(args)?;
    info!(tracked = session.state.len(), failed = failed.len(), "apply finished");

    if !failed.is_empty() {
        bail!(
            "APPLY_INCOMPLETE: {} declaration(s) failed: {}",
            failed.len(),
            failed.join(", ")
        );
    }
    Ok(())
}

pub fn refresh(args: &ReconcileArgs) -> Result<()> {
    let mut session = Session::open(args)?;
    let mut failed: Vec<String> = Vec::new();

    for name in session.state.names() {
        let Some(prior) = session.state.record(&name).cloned() else {
            continue;
        };
        match engine(&session).read(&prior) {
            Ok(Some(observed)) => {
                let drifted = observed != prior;
                println!("name={name} action=refreshed drifted={drifted}");
                session.state.refresh(&name, observed, Utc::now());
            }
            Ok(None) => {
                println!("name={name} action=forgotten");
                session.state.deregister(&name);
            }
            Err(e) => {
                error!(name = %name, error = %e, "read failed");
                println!("name={name} action=failed error=\"{e}\"");
                failed.push(name);
            }
        }
    }

    session.save(args)?;
    if !failed.is_empty() {
        bail!(
            "REFRESH_INCOMPLETE: {} notification(s) could not be read: {}",
            failed.len(),
            failed.join(", ")
        );
    }
    Ok(())
}

pub fn destroy(args: &ReconcileArgs) -> Result<()> {
    let mut session = Session::open(args)?;
    let mut failed = 0usize;

    for name in session.state.names() {
        let Some(prior) = session.state.record(&name).cloned() else {
            continue;
        };
        match engine(&session).delete(&prior) {
            Ok(outcome) => {
                println!("name={name} action=deleted outcome={}", outcome_str(outcome));
                session.state.deregister(&name);
            }
            Err(e) => {
                error!(name = %name, error = %e, "delete failed");
                println!("name={name} action=failed error=\"{e}\"");
                failed += 1;
            }
        }
    }

    session.save(args)?;
    if failed > 0 {
        bail!("DESTROY_INCOMPLETE: {failed} notification(s) could not be deleted");
    }
    Ok(())
}

fn outcome_str(outcome: DeleteOutcome) -> &'static str {
    match outcome {
        DeleteOutcome::Deleted => "DELETED",
        DeleteOutcome::AlreadyAbsent => "ALREADY_ABSENT",
    }
}
