//! Command handler modules for bnr-cli.
//!
//! Shared loading/saving lives here; command logic lives in the submodules.

pub mod paper;
pub mod reconcile;

use anyhow::{Context, Result};
use bnr_config::{BnrConfig, LoadedConfig, StateFile};
use bnr_paper::PaperBudgetService;
use std::path::Path;

use crate::ReconcileArgs;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Everything one reconcile command works against.
pub struct Session {
    pub loaded: LoadedConfig,
    pub config: BnrConfig,
    pub caller_account_id: String,
    pub state: StateFile,
    pub paper: PaperBudgetService,
}

impl Session {
    pub fn open(args: &ReconcileArgs) -> Result<Self> {
        let loaded = bnr_config::load_layered_yaml(&args.config_paths)?;
        let config = BnrConfig::from_loaded(&loaded)?;
        let caller_account_id = config.caller_account_id()?;
        let state = StateFile::load(&args.state)?;
        let paper = open_paper(&args.paper)?;
        Ok(Self {
            loaded,
            config,
            caller_account_id,
            state,
            paper,
        })
    }

    /// Persist state first: it is the only copy of the handles.
    pub fn save(&self, args: &ReconcileArgs) -> Result<()> {
        self.state.save(&args.state)?;
        self.paper.save(&args.paper)
    }
}

pub fn open_paper(path: &Path) -> Result<PaperBudgetService> {
    PaperBudgetService::load(path)
        .with_context(|| format!("open paper service: {}", path.display()))
}
