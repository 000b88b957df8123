//! Stream link sync — batch entrypoint.
//! Runs one pass (fetch → audit → match → merge → write) and exits.
//! Exit code 1 on the fatal condition (no usable feed key, unreadable catalog).

use anyhow::Result;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stream_link_sync::config::{load_providers_default, SyncConfig};
use stream_link_sync::feed::{feed_date, rapidapi::RapidApiFeed};
use stream_link_sync::metrics::TextfileExporter;
use stream_link_sync::store::rtdb::RtdbStore;
use stream_link_sync::{run_pass, SyncReport, SyncSettings};

/// `LOG_FORMAT=json` switches to JSON lines; otherwise compact text.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stream_link_sync=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

async fn run() -> Result<SyncReport> {
    let cfg = SyncConfig::from_env()?;
    let providers = load_providers_default()?;
    let exporter = cfg
        .metrics_textfile
        .clone()
        .map(TextfileExporter::install)
        .transpose()?;

    let feed = RapidApiFeed::new(cfg.api_keys.clone(), cfg.api_host.clone(), cfg.http_timeout)?;
    let store = RtdbStore::new(
        cfg.db_url.clone(),
        cfg.db_auth.clone(),
        cfg.catalog_path.clone(),
        cfg.audit_path.clone(),
        cfg.http_timeout,
    )?;

    let settings = SyncSettings {
        pages: cfg.pages,
        date: feed_date(chrono::Utc::now(), cfg.utc_offset),
        classifier: providers.classifier(),
        labels: providers.labels.clone(),
    };
    info!(
        date = %settings.date,
        pages = settings.pages,
        keys = feed.key_count(),
        "starting sync pass"
    );

    let mut rng = rand::rng();
    let result = run_pass(&feed, &store, &store, &settings, &mut rng).await;

    // Metrics are flushed even for a failed pass.
    if let Some(exp) = &exporter {
        if let Err(e) = exp.flush() {
            tracing::warn!(error = ?e, "metrics textfile not written");
        }
    }
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    match run().await {
        Ok(report) => {
            info!(
                fetched = report.fetched,
                unique = report.unique,
                matched = report.matched,
                updated = report.updated,
                unmatched = report.unmatched,
                unclassified = report.unclassified,
                write_failures = report.write_failures,
                "sync done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("sync aborted: {e:#}");
            ExitCode::FAILURE
        }
    }
}
