mod config;
mod web;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tasks::Store;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "A small task tracker with a REST API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server
    Serve {
        /// Address to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Database connection string, e.g. mem:// or ws://localhost:8000
        #[arg(long)]
        database_url: Option<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// Show configuration file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Use RUST_LOG=debug for per-request detail
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            database_url,
        } => {
            let mut cfg = config::load_config()?;
            if let Some(host) = host {
                cfg.server.host = host;
            }
            if let Some(port) = port {
                cfg.server.port = port;
            }
            if let Some(url) = database_url {
                cfg.database.url = Some(url);
                cfg.database.path = None;
            }
            serve(cfg).await
        }
        Commands::Config { action } => handle_config_command(action),
    }
}

async fn serve(cfg: config::Config) -> Result<()> {
    let default_path = if cfg.database.url.is_none() {
        Some(config::get_db_path(&cfg)?)
    } else {
        None
    };

    // One connection for the lifetime of the process
    let store = Store::connect(&cfg.database, default_path).await?;

    let state = Arc::new(web::WebState { store });
    let router = web::build_router(state, &cfg.allowed_origins())?;

    let addr = cfg.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind API server to {}", addr))?;

    tracing::info!("Server is running on http://{}", addr);
    tracing::info!("Allowing requests from: {}", cfg.allowed_origins().join(", "));

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

fn handle_config_command(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let mut shown = config::load_config()?;
            if shown.database.password.is_some() {
                shown.database.password = Some("********".to_string());
            }
            print!("{}", toml::to_string_pretty(&shown)?);
            Ok(())
        }
        ConfigAction::Get { key } => {
            let cfg = config::load_config()?;
            match config::get_config_value(&cfg, &key) {
                Some(value) => println!("{}", value),
                None => println!("(not set)"),
            }
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let path = config::get_config_file()?;
            // Write back the file contents only, not environment overrides
            let mut cfg = config::load_config_from(&path)?;
            config::set_config_value(&mut cfg, &key, &value)?;
            config::save_config(&cfg)?;
            println!("Set {} = {}", key, value);
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", config::get_config_file()?.display());
            Ok(())
        }
    }
}
