use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

use crate::cli::output::{OutputFormat, OutputOptions};
use crate::cli::renderer;
use crate::cli::status_cmd::fetch_into;
use crate::core::badge::render_face;
use crate::core::config::AppConfig;
use crate::core::models::badge::BadgeFace;
use crate::core::models::usage::WindowKind;
use crate::core::store::{default_store_path, SnapshotStore};

#[derive(Serialize)]
struct BadgePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    window: Option<WindowKind>,
    #[serde(flatten)]
    face: BadgeFace,
}

/// Print the badge as it would look right now, for one window or both.
pub async fn run(
    window: Option<String>,
    cached: bool,
    config: &AppConfig,
    opts: &OutputOptions,
) -> Result<()> {
    let kinds = match window.as_deref() {
        None => vec![WindowKind::Short, WindowKind::Long],
        Some(id) => match WindowKind::from_id(id) {
            Some(kind) => vec![kind],
            None => anyhow::bail!("Unknown window: '{}' (expected short or long)", id),
        },
    };

    let store = SnapshotStore::open(default_store_path());
    let snapshot = if cached {
        store.latest()
    } else {
        fetch_into(&store, config, opts).await.ok()
    };

    let now = Utc::now();
    let payloads: Vec<BadgePayload> = match &snapshot {
        Some(snapshot) => kinds
            .into_iter()
            .map(|kind| BadgePayload {
                window: Some(kind),
                face: render_face(snapshot, kind, &config.thresholds, now),
            })
            .collect(),
        None => vec![BadgePayload {
            window: None,
            face: BadgeFace::error(),
        }],
    };

    match opts.format {
        OutputFormat::Text => {
            for payload in &payloads {
                let label = payload.window.map(|k| k.label()).unwrap_or("Badge");
                println!(
                    "{:<7}  {}",
                    label,
                    renderer::render_face(&payload.face, opts.use_color)
                );
            }
        }
        OutputFormat::Json => println!("{}", opts.to_json(&payloads)?),
    }

    Ok(())
}
