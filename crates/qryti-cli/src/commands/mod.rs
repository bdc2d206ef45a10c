//! Command implementations and dispatch logic.
//!
//! Every handler is an async function taking the shared [`CommandContext`].

use std::collections::HashMap;
use std::sync::Arc;

use camino::Utf8PathBuf;
use qryti_client::{ApiClient, ClientConfig, FileStore, ReqwestTransport};
use qryti_config::{ConfigLoader, ConfigSource, QrytiToml};
use qryti_core::error::{QrytiError, QrytiResult};
use tracing::{info, warn};

pub mod request;
pub mod resources;
pub mod session;
pub mod system;


use crate::output::OutputHandler;
use crate::{ClientsCommand, Commands, GlobalArgs, ModelsCommand, ReportsCommand};

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub config: QrytiToml,
    pub sources: Vec<ConfigSource>,
    pub session_file: Utf8PathBuf,
    pub client: ApiClient,
    pub output: OutputHandler,
}

impl CommandContext {
    /// Load configuration, open the session file and build the client
    pub async fn new(args: &GlobalArgs) -> QrytiResult<Self> {
        let cwd = std::env::current_dir()
            .ok()
            .and_then(|dir| Utf8PathBuf::try_from(dir).ok())
            .ok_or_else(|| QrytiError::ConfigValidation {
                field: "working_directory".to_string(),
                reason: "current directory is missing or not valid UTF-8".to_string(),
            })?;

        let (config, sources) = ConfigLoader::new(cwd.clone())
            .load(cli_overrides(args))
            .await?;

        let session_file = match &args.session_file {
            Some(path) => Utf8PathBuf::from(path),
            None => default_session_file()?,
        };

        Self::with_config(cwd, config, sources, session_file).await
    }

    /// Build a context from an already resolved configuration
    pub async fn with_config(
        cwd: Utf8PathBuf,
        config: QrytiToml,
        sources: Vec<ConfigSource>,
        session_file: Utf8PathBuf,
    ) -> QrytiResult<Self> {
        let client = ApiClient::new(
            ClientConfig::from(&config),
            Arc::new(ReqwestTransport::new()?),
            Arc::new(FileStore::new(session_file.clone())),
        )
        .await?;

        Ok(Self {
            cwd,
            config,
            sources,
            session_file,
            client,
            output: OutputHandler::new(),
        })
    }
}

/// Translate global flags into configuration overrides
pub fn cli_overrides(args: &GlobalArgs) -> HashMap<String, String> {
    let mut overrides = HashMap::new();
    if let Some(url) = &args.api_url {
        overrides.insert("api-url".to_string(), url.clone());
    }
    if let Some(timeout) = args.timeout_ms {
        overrides.insert("timeout-ms".to_string(), timeout.to_string());
    }
    if args.no_cache {
        overrides.insert("no-cache".to_string(), "true".to_string());
    }
    overrides
}

fn default_session_file() -> QrytiResult<Utf8PathBuf> {
    let home = dirs::home_dir()
        .and_then(|home| Utf8PathBuf::try_from(home).ok())
        .ok_or_else(|| QrytiError::Storage {
            message: "Could not determine the home directory; pass --session-file".to_string(),
        })?;
    Ok(home.join(".qryti").join("session.json"))
}

/// Dispatch a command to its handler.
///
/// A 401 from any command means the stored token is dead, so the session is
/// dropped before the error is reported.
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> QrytiResult<()> {
    let result = run_command(command, ctx).await;

    if let Err(error) = &result {
        if error.is_unauthorized() && ctx.client.is_authenticated() {
            warn!("Backend rejected the stored token");
            match ctx.client.logout().await {
                Ok(()) => ctx.output.warn("Session expired; you have been signed out"),
                Err(e) => warn!(error = %e, "Failed to clear the expired session"),
            }
        }
    }
    result
}

async fn run_command(command: Commands, ctx: &CommandContext) -> QrytiResult<()> {
    match command {
        Commands::Login { email, password } => {
            info!("Signing in as {}", email);
            session::login(&email, password, ctx).await
        }
        Commands::Logout => session::logout(ctx).await,
        Commands::Whoami => session::whoami(ctx).await,
        Commands::Verify => session::verify(ctx).await,
        Commands::Health => system::health(ctx).await,
        Commands::Get { path, query } => {
            info!("GET {}", path);
            request::get(&path, &query, ctx).await
        }
        Commands::Post { path, data } => {
            info!("POST {}", path);
            request::post(&path, &data, ctx).await
        }
        Commands::Put { path, data } => {
            info!("PUT {}", path);
            request::put(&path, &data, ctx).await
        }
        Commands::Delete { path } => {
            info!("DELETE {}", path);
            request::delete(&path, ctx).await
        }
        Commands::Clients(ClientsCommand::List) => resources::list_clients(ctx).await,
        Commands::Models(ModelsCommand::List {
            status,
            risk_level,
            model_type,
            client_id,
        }) => {
            let filters = resources::model_filters(status, risk_level, model_type, client_id)?;
            resources::list_models(&filters, ctx).await
        }
        Commands::Reports(ReportsCommand::List) => resources::list_reports(ctx).await,
        Commands::Reports(ReportsCommand::Download { id }) => {
            resources::download_report(&id, ctx).await
        }
        Commands::Config => system::show_config(ctx).await,
        Commands::Version => system::show_version(ctx).await,
    }
}
