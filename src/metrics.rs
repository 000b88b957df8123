// src/metrics.rs
use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::path::PathBuf;

/// One-time metrics registration (so series show up in the exposition).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("sync_feed_events_total", "Raw feed records fetched.");
        describe_counter!(
            "sync_unmatched_total",
            "Unique feed events with no catalog entry."
        );
        describe_counter!(
            "sync_unclassified_total",
            "Feed events without a single classifiable endpoint."
        );
        describe_counter!("sync_updates_total", "Catalog link lists rewritten.");
        describe_counter!(
            "sync_write_failures_total",
            "Catalog writes that failed."
        );
        describe_counter!(
            "sync_key_rotations_total",
            "Feed keys rejected (429/401) and rotated past."
        );
        describe_counter!("sync_feed_errors_total", "Non-2xx feed responses.");
        describe_histogram!("sync_feed_fetch_ms", "Feed page fetch time in milliseconds.");
        describe_gauge!("sync_last_run_ts", "Unix ts when the last pass finished.");
    });
}

/// Prometheus recorder whose exposition is dumped to a file at the end of a
/// pass, for a node-exporter textfile collector.
pub struct TextfileExporter {
    handle: PrometheusHandle,
    path: PathBuf,
}

impl TextfileExporter {
    pub fn install(path: PathBuf) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle, path })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Write via a sibling temp file so collectors never read half a file.
    pub fn flush(&self) -> Result<()> {
        let tmp = self.path.with_extension("prom.tmp");
        std::fs::write(&tmp, self.render())
            .with_context(|| format!("writing metrics to {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("moving metrics into {}", self.path.display()))?;
        Ok(())
    }
}
