//! Tourlytics API Server
//!
//! Serves interaction breakdowns computed from the upstream tagging API.
//! Stateless apart from the response cache, so it can be scaled horizontally.

use dotenvy::dotenv;
use tokio::signal;
use tourlytics::config::Config;
use tourlytics::core::http::start_server;
use tourlytics::logging;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let config = Config::from_env()?;
    info!("Starting Tourlytics API Server");
    info!(environment = %config.environment, "Environment");
    info!(
        port = config.port,
        towns = config.taxonomy.towns.len(),
        categories = config.taxonomy.categories.len(),
        "HTTP Server: http://0.0.0.0:{}",
        config.port
    );

    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(config).await {
            error!(error = %e, "HTTP server error");
        }
    });

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down API server...");
        }
        _ = server_handle => {
            error!("HTTP server stopped");
        }
    }

    Ok(())
}
