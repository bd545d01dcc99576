use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::cli::output::{OutputFormat, OutputOptions};
use crate::cli::renderer;
use crate::core::client::{UsageClient, UsageSource};
use crate::core::config::AppConfig;
use crate::core::models::usage::Snapshot;
use crate::core::panel::UsagePanel;
use crate::core::store::{default_store_path, SnapshotStore};

#[derive(Serialize)]
#[serde(untagged)]
enum PanelPayload {
    Available(UsagePanel),
    Unavailable { available: bool, error: String },
}

/// Fetch a fresh snapshot and store it. Failures are logged and returned; the
/// store keeps its previous snapshot.
pub async fn fetch_into(
    store: &SnapshotStore,
    config: &AppConfig,
    opts: &OutputOptions,
) -> Result<Snapshot> {
    let spinner = matches!(opts.format, OutputFormat::Text).then(|| {
        tokio::spawn(async {
            let frames = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
            let mut i = 0usize;
            loop {
                eprint!("\r {} Fetching usage data...", frames[i % frames.len()]);
                i = i.wrapping_add(1);
                tokio::time::sleep(std::time::Duration::from_millis(80)).await;
            }
        })
    });

    let result = match UsageClient::from_config(&config.api) {
        Ok(client) => client.fetch_snapshot().await.map_err(anyhow::Error::from),
        Err(e) => Err(e),
    };

    if let Some(s) = spinner {
        s.abort();
        eprint!("\r\x1b[2K");
    }

    match result {
        Ok(snapshot) => {
            store.set(snapshot.clone());
            Ok(snapshot)
        }
        Err(e) => {
            warn!("Failed to fetch usage: {:#}", e);
            Err(e)
        }
    }
}

pub async fn run(cached: bool, config: &AppConfig, opts: &OutputOptions) -> Result<()> {
    let store = SnapshotStore::open(default_store_path());

    let outcome = if cached {
        store
            .latest()
            .context("No cached snapshot; run without --cached first")
    } else {
        fetch_into(&store, config, opts).await
    };

    let now = Utc::now();
    match opts.format {
        OutputFormat::Text => match &outcome {
            Ok(snapshot) => {
                let panel = UsagePanel::build(snapshot, &config.thresholds, now);
                println!("{}", renderer::render_panel(&panel, opts.use_color));
            }
            Err(e) => {
                println!("{}", renderer::render_unavailable(opts.use_color));
                if opts.verbose {
                    eprintln!("{:#}", e);
                }
            }
        },
        OutputFormat::Json => {
            let payload = match outcome {
                Ok(snapshot) => {
                    PanelPayload::Available(UsagePanel::build(&snapshot, &config.thresholds, now))
                }
                Err(e) => PanelPayload::Unavailable {
                    available: false,
                    error: format!("{:#}", e),
                },
            };
            println!("{}", opts.to_json(&payload)?);
        }
    }

    Ok(())
}
