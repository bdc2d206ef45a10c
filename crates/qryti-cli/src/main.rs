//! # qryti-cli
//!
//! Command-line client for the Qryti ISO 42001 compliance service.
//!
//! This is the entry point for the `qryti` binary. It parses arguments, sets
//! up logging and the panic hook, and hands off to the command handlers.

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use qryti_core::error::{QrytiError, QrytiResult};
use tracing::{error, info};

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Client for the Qryti ISO 42001 compliance service
#[derive(Parser)]
#[command(name = "qryti", version, about = "Qryti compliance API client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the backend base URL
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Override the per-attempt timeout
    #[arg(long, global = true, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Bypass the response cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Where the session is persisted
    #[arg(long, global = true, env = "QRYTI_SESSION_FILE", value_name = "PATH")]
    pub session_file: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and persist the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "QRYTI_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Check that the backend is reachable
    Health,
    /// Check that the stored token is still accepted
    Verify,
    /// GET a path and print the JSON response
    Get {
        path: String,
        /// Query parameter as key=value (repeatable)
        #[arg(short, long = "query", value_name = "KEY=VALUE")]
        query: Vec<String>,
    },
    /// POST a JSON body to a path
    Post {
        path: String,
        #[arg(long)]
        data: String,
    },
    /// PUT a JSON body to a path
    Put {
        path: String,
        #[arg(long)]
        data: String,
    },
    /// DELETE a path
    Delete { path: String },
    /// Compliance clients
    #[command(subcommand)]
    Clients(ClientsCommand),
    /// AI model registry
    #[command(subcommand)]
    Models(ModelsCommand),
    /// Compliance reports
    #[command(subcommand)]
    Reports(ReportsCommand),
    /// Show the effective configuration and where it came from
    Config,
    /// Show version information
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ClientsCommand {
    /// List compliance clients
    List,
}

#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// List registered AI models
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        risk_level: Option<String>,
        #[arg(long = "type")]
        model_type: Option<String>,
        #[arg(long)]
        client_id: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReportsCommand {
    /// List generated reports
    List,
    /// Print a download link for a report
    Download { id: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.global.verbose);
    setup_panic_handler();

    info!("Starting qryti v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprint!("{}", ErrorFormatter::new().format_error(&e));
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> QrytiResult<()> {
    let rt = tokio::runtime::Runtime::new().map_err(|e| QrytiError::Storage {
        message: format!("Failed to create async runtime: {}", e),
    })?;

    rt.block_on(async {
        let ctx = CommandContext::new(&cli.global).await?;
        commands::dispatch_command(cli.command, &ctx).await
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "qryti={level},qryti_core={level},qryti_config={level},qryti_client={level}"
        ))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("qryti encountered an unexpected error: {}", panic_info);
        eprintln!("qryti crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/qryti/qryti/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
