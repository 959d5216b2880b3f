//! anomalyze - validate sensor sheets, simulate ingestion and export reports

use std::path::PathBuf;

use anomalyze_sdk::auth::SignUpRequest;
use anomalyze_sdk::cli::commands::export::{ExportArgs, handle_export};
use anomalyze_sdk::cli::commands::ingest::handle_ingest;
use anomalyze_sdk::cli::commands::session::{handle_logout, handle_show, handle_signup};
use anomalyze_sdk::cli::commands::validate::handle_validate;
use anomalyze_sdk::config::AnomalyzeConfig;
use anomalyze_sdk::models::ReportPeriod;
use anomalyze_sdk::validation::FileValidator;
use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "anomalyze", version, about = "Sensor file ingestion and PDF report export")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a CSV or Excel sensor file
    Validate {
        /// File to validate (.csv, .xlsx, .xls)
        file: PathBuf,
    },
    /// Validate a file and run the upload and analysis stages
    Ingest {
        /// File to ingest (.csv, .xlsx, .xls)
        file: PathBuf,
    },
    /// Export a factory report for a period as PDF
    Export {
        /// Report period
        #[arg(short, long, default_value = "daily")]
        period: ReportPeriod,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Export only the first chart on a single page
        #[arg(long)]
        single: bool,

        /// Seed for the mock sensor series
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Manage the local session
    Session {
        /// Directory holding the session profile
        #[arg(long, default_value = ".anomalyze", global = true)]
        session_dir: PathBuf,

        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Create an account and sign in
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        company: Option<String>,
        /// Accepted but never stored
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Show the signed-in user
    Show,
    /// Sign out
    Logout,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => AnomalyzeConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AnomalyzeConfig::default(),
    };

    match cli.command {
        Commands::Validate { file } => {
            let validator = FileValidator::with_config(config.validation.clone());
            handle_validate(&validator, &file).await?;
        }
        Commands::Ingest { file } => handle_ingest(&config, &file).await?,
        Commands::Export {
            period,
            out,
            single,
            seed,
        } => {
            let args = ExportArgs {
                period,
                single,
                seed,
            };
            handle_export(&config, &args, &out).await?;
        }
        Commands::Session {
            session_dir,
            action,
        } => match action {
            SessionAction::Signup {
                name,
                email,
                company,
                password,
            } => {
                let request = SignUpRequest {
                    name,
                    email,
                    company,
                    password,
                };
                handle_signup(&session_dir, request).await?;
            }
            SessionAction::Show => handle_show(&session_dir).await?,
            SessionAction::Logout => handle_logout(&session_dir).await?,
        },
    }

    Ok(())
}
