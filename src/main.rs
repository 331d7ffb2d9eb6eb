//! linkbridged - identity linking daemon.
//!
//! Maintenance host: builds a [`Bridge`] from the config, serves metrics and
//! prunes expired cooldowns and linking codes until shutdown. It does not
//! talk to a game server or chat network itself; platform adapters embed the
//! library and drive [`Bridge::registry`] and [`Bridge::players`].

use linkbridge::bridge::Bridge;
use linkbridge::config::{Config, validate};
use linkbridge::linking::LinkBackend;
use linkbridge::{http, metrics};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Interval of the housekeeping task.
const MAINTENANCE_INTERVAL: tokio::time::Duration = tokio::time::Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "Refusing to start with {} configuration error(s)",
            errors.len()
        ));
    }

    info!(bridge = %config.bridge.name, "Starting linkbridged");

    let bridge = Bridge::open(&config).await?;
    match bridge.backend.link_count().await {
        Ok(count) => info!(count, "Loaded links"),
        Err(e) => warn!(error = %e, "Failed to count links"),
    }
    info!(
        labels = ?bridge.registry.game_labels(),
        chat_commands = bridge.registry.chat_definitions().len(),
        "Command registry ready"
    );

    // Convention: metrics_port = 0 disables the HTTP endpoint.
    let metrics_port = config.bridge.metrics_port;
    if metrics_port == 0 {
        info!("Prometheus HTTP server disabled (metrics_port = 0)");
    } else {
        metrics::init();
        tokio::spawn(async move {
            http::run_http_server(metrics_port).await;
        });
        info!(port = metrics_port, "Prometheus HTTP server started");
    }

    let bridge = Arc::new(bridge);
    {
        let bridge = Arc::clone(&bridge);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(MAINTENANCE_INTERVAL);
            loop {
                interval.tick().await;
                let (expired_limits, expired_codes) = bridge.prune_expired().await;
                if expired_limits > 0 || expired_codes > 0 {
                    info!(expired_limits, expired_codes, "Maintenance pruned expired entries");
                }
            }
        });
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping");
    Ok(())
}
