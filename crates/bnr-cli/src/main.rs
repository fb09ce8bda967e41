use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "bnr")]
#[command(about = "Budget notification reconciler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered declaration hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> team -> env overrides...)
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Show what a converge pass would do, without changing anything
    Plan(ReconcileArgs),

    /// Converge every declaration; delete tracked notifications no longer declared
    Apply(ReconcileArgs),

    /// Re-read every tracked notification; forget the ones gone upstream
    Refresh(ReconcileArgs),

    /// Delete every tracked notification
    Destroy(ReconcileArgs),

    /// Paper budgeting service utilities
    Paper {
        #[command(subcommand)]
        cmd: PaperCmd,
    },
}

#[derive(Args)]
pub struct ReconcileArgs {
    /// Declaration paths in merge order
    #[arg(long = "config", required = true)]
    pub config_paths: Vec<PathBuf>,

    /// Local state file (created when missing)
    #[arg(long)]
    pub state: PathBuf,

    /// Paper ledger file standing in for the remote service
    #[arg(long)]
    pub paper: PathBuf,
}

#[derive(Subcommand)]
enum PaperCmd {
    /// Register a budget so notifications can be attached to it
    Init {
        #[arg(long)]
        paper: PathBuf,

        /// 12-digit account id owning the budget
        #[arg(long)]
        account: String,

        #[arg(long)]
        budget: String,
    },

    /// Print the ledger JSON
    Show {
        #[arg(long)]
        paper: PathBuf,
    },
}

fn main() -> Result<()> {
    // Dev-time convenience; absence is fine.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let loaded = bnr_config::load_layered_yaml(&paths)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Plan(args) => commands::reconcile::plan(&args)?,
        Commands::Apply(args) => commands::reconcile::apply(&args)?,
        Commands::Refresh(args) => commands::reconcile::refresh(&args)?,
        Commands::Destroy(args) => commands::reconcile::destroy(&args)?,

        Commands::Paper { cmd } => match cmd {
            PaperCmd::Init {
                paper,
                account,
                budget,
            } => commands::paper::init(&paper, &account, &budget)?,
            PaperCmd::Show { paper } => commands::paper::show(&paper)?,
        },
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
