use anyhow::{Context, Result};
use bnr_config::validate_account_id;
use bnr_reconcile::BudgetRef;
use std::path::Path;
use tracing::info;

use super::open_paper;

pub fn init(path: &Path, account: &str, budget: &str) -> Result<()> {
    validate_account_id(account).context("--account")?;
    if budget.trim().is_empty() {
        anyhow::bail!("--budget must not be empty");
    }

    let paper = open_paper(path)?;
    let target = BudgetRef::new(account, budget);
    paper.ensure_budget(&target);
    paper.save(path)?;

    info!(budget = %target, path = %path.display(), "paper budget ready");
    println!("paper_budget={target}");
    Ok(())
}

pub fn show(path: &Path) -> Result<()> {
    let paper = open_paper(path)?;
    let raw = serde_json::to_string_pretty(&paper.ledger()).context("serialize paper ledger")?;
    println!("{raw}");
    Ok(())
}
