//! Ringo bridge - operator CLI
//!
//! Runs one action against the Ringo cloud API and prints its result
//! envelope as JSON.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use ringo_bridge::{
    logging::{init_logging, LogConfig},
    services::params::DigitalKeyParams,
    BridgeConfig, Connection, ConnectionSlot, Credentials, ServiceResponse, Services,
};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};

/// Ringo bridge command line
#[derive(Parser, Debug)]
#[command(name = "ringo-bridge")]
#[command(about = "Talk to Ringo smart locks through the vendor cloud API")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Ringo API client id
    #[arg(long, global = true, env = "RINGO_CLIENT_ID")]
    client_id: Option<String>,

    /// Ringo API client secret
    #[arg(long, global = true, env = "RINGO_CLIENT_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// TOML configuration file
    #[arg(long, global = true, env = "RINGO_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Authenticate and count the visible locks
    Verify,
    /// List locks
    Locks,
    /// List digital keys
    Keys,
    /// List users
    Users,
    /// Show the status of a digital key
    KeyStatus {
        /// Digital key to check
        digital_key: String,
    },
    /// Unlock a door with the first usable key
    Unlock {
        lock_id: i64,
        relay_id: i64,
    },
}

impl Cli {
    fn credentials(&self) -> anyhow::Result<Credentials> {
        let client_id = self
            .client_id
            .clone()
            .context("Missing client id. Use --client-id or set RINGO_CLIENT_ID")?;
        let secret = self
            .secret
            .clone()
            .context("Missing secret. Use --secret or set RINGO_CLIENT_SECRET")?;
        Ok(Credentials::new(client_id, secret))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = BridgeConfig::load(cli.config.as_deref())?;
    init_logging(LogConfig::from(&config.logging).with_debug(cli.debug))
        .map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;
    debug!("Loaded configuration: {config:?}");

    let credentials = cli.credentials()?;
    let response = run(&cli.command, &config, credentials).await;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(if response.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run(
    command: &Command,
    config: &BridgeConfig,
    credentials: Credentials,
) -> ServiceResponse {
    let slot = Arc::new(ConnectionSlot::new());
    let connection = match Connection::setup(config, credentials).await {
        Ok(connection) => connection,
        Err(e) => return ServiceResponse::from_error(&e),
    };
    let connection = match slot.install(connection).await {
        Ok(connection) => connection,
        Err(e) => return ServiceResponse::from_error(&e),
    };
    let services = Services::new(Arc::clone(&slot));

    let response = match command {
        Command::Verify => {
            info!("Credentials accepted");
            ServiceResponse::success(json!({
                "authenticated": true,
                "locks": connection.entities().len(),
            }))
        }
        Command::Locks => services.get_locks().await,
        Command::Keys => services.get_keys().await,
        Command::Users => services.get_users().await,
        Command::KeyStatus { digital_key } => {
            services
                .get_key_status(DigitalKeyParams {
                    digital_key: digital_key.clone(),
                })
                .await
        }
        Command::Unlock { lock_id, relay_id } => {
            let entity_id = format!("{lock_id}_{relay_id}");
            match connection.entity(&entity_id) {
                Some(entity) => ServiceResponse::from_result(entity.unlock().await.map(|()| {
                    json!({
                        "entity_id": entity.unique_id(),
                        "state": entity.state(),
                        "attributes": entity.attributes(),
                    })
                })),
                None => ServiceResponse::failure(format!("Lock entity not found: {entity_id}")),
            }
        }
    };

    slot.unload().await;
    response
}
