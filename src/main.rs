use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use studyhall::cli::{AdminCommands, NewUserArgs, run_create_user, run_init};
use studyhall::config::{ServerConfig, WEATHER_API_KEY_ENV};
use studyhall::server::{AppState, create_router};
use studyhall::store::{SqliteStore, Store};
use studyhall::upstream::UpstreamClient;

#[derive(Parser)]
#[command(name = "studyhall")]
#[command(about = "A social learning server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Config file to read instead of <data-dir>/studyhall.toml
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    data_dir: String,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config =
        ServerConfig::load(config_path.as_deref(), Path::new(&data_dir))?.with_env_overrides();
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    let db_path = config.db_path();
    if !db_path.exists() {
        bail!(
            "Server not initialized. Run 'studyhall admin init' first to create the database."
        );
    }

    let store = SqliteStore::with_timeout(&db_path, config.storage_timeout())?;
    store.initialize()?;

    let purged = store.delete_expired_tokens(Utc::now())?;
    if purged > 0 {
        info!("Purged {purged} expired tokens");
    }

    if config.upstream.weather_api_key.is_none() {
        warn!("No weather API key configured; set {WEATHER_API_KEY_ENV} to enable /weather/");
    }

    let upstream = UpstreamClient::new(config.upstream.clone())?;
    let state = Arc::new(AppState::new(
        Arc::new(store),
        config.token_ttls(),
        upstream,
    ));

    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("studyhall=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                non_interactive,
            } => {
                run_init(data_dir, non_interactive)?;
            }
            AdminCommands::CreateUser {
                data_dir,
                username,
                email,
                password,
                staff,
                non_interactive,
            } => {
                run_create_user(
                    data_dir,
                    NewUserArgs {
                        username,
                        email,
                        password,
                        staff,
                    },
                    non_interactive,
                )?;
            }
        },
        Commands::Serve {
            host,
            port,
            data_dir,
            config,
        } => {
            run_serve(host, port, data_dir, config).await?;
        }
    }

    Ok(())
}
