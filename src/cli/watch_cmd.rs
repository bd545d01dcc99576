use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::cli::indicator::{JsonLinesIndicator, TerminalIndicator};
use crate::cli::output::{OutputFormat, OutputOptions};
use crate::core::badge::{BadgeStateMachine, IndicatorSink};
use crate::core::client::UsageClient;
use crate::core::config::AppConfig;
use crate::core::monitor::{refresh_channel, UsageMonitor};
use crate::core::store::{default_store_path, SnapshotStore};

/// Poll usage and keep a rotating badge on screen until Ctrl-C.
/// Each line read from stdin requests an immediate refresh.
pub async fn run(config: &AppConfig, opts: &OutputOptions) -> Result<()> {
    let client = UsageClient::from_config(&config.api).context("Cannot start watch mode")?;
    let store = Arc::new(SnapshotStore::open(default_store_path()));

    let sink: Arc<dyn IndicatorSink> = match opts.format {
        OutputFormat::Text => Arc::new(TerminalIndicator::new(std::io::stdout(), opts.use_color)),
        OutputFormat::Json => Arc::new(JsonLinesIndicator::new(std::io::stdout())),
    };
    let badge = BadgeStateMachine::new(
        Arc::clone(&store),
        sink,
        config.thresholds,
        config.polling.rotate_interval(),
    );
    let monitor = UsageMonitor::new(client, store, badge, config.polling.fetch_interval());
    let (handle, requests) = refresh_channel();

    let stdin_task = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(_)) = lines.next_line().await {
            match handle.refresh().await {
                Ok(ack) => debug!(id = ack.id, success = ack.success, "Refresh acknowledged"),
                Err(e) => {
                    warn!("Refresh failed: {:#}", e);
                    break;
                }
            }
        }
    });

    info!(
        "Fetching every {}s, rotating every {}s. Press Enter to refresh, Ctrl-C to quit.",
        config.polling.fetch_interval_secs, config.polling.rotate_interval_secs
    );

    monitor
        .run(requests, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    stdin_task.abort();
    if matches!(opts.format, OutputFormat::Text) {
        println!();
    }
    Ok(())
}
