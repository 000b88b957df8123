// src/sync.rs
//! # Sync pass
//! `plan_updates` is the pure core (dedupe → match → classify → merge) and
//! performs no I/O. `run_pass` wraps it with the fetch, audit, catalog read
//! and per-event writes.
//!
//! The catalog is read once per pass. A write made for one feed event never
//! influences matching for a later one.

use anyhow::{bail, Context, Result};
use metrics::{counter, gauge};
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::classify::Classifier;
use crate::dedup::dedupe_feed;
use crate::feed::{FeedSource, FetchOutcome, KeyCursor};
use crate::matcher::find_match;
use crate::merge::{merge_links, LinkLabels};
use crate::metrics::ensure_metrics_described;
use crate::model::{CatalogEntry, FeedEvent, Link};
use crate::store::{AuditSink, CatalogStore};

/// Replacement link list for one catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkUpdate {
    pub key: String,
    pub links: Vec<Link>,
    pub home_team: String,
    pub away_team: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    pub updates: Vec<LinkUpdate>,
    pub unique_events: usize,
    pub unmatched: usize,
    pub unclassified: usize,
}

pub fn plan_updates<R: Rng + ?Sized>(
    feed: Vec<FeedEvent>,
    catalog: &[CatalogEntry],
    classifier: &Classifier,
    labels: &LinkLabels,
    rng: &mut R,
) -> SyncPlan {
    let unique = dedupe_feed(feed);
    let mut plan = SyncPlan {
        unique_events: unique.len(),
        ..SyncPlan::default()
    };
    let mut claimed: HashSet<&str> = HashSet::new();

    for ev in &unique {
        if ev.endpoints.is_empty() {
            debug!(home = %ev.home_team, away = %ev.away_team, "no endpoints, skipped");
            plan.unclassified += 1;
            continue;
        }

        let Some(entry) = find_match(ev, catalog) else {
            debug!(home = %ev.home_team, away = %ev.away_team, "no catalog match");
            plan.unmatched += 1;
            continue;
        };

        let ranked = classifier.rank(&ev.endpoints);
        if ranked.is_empty() {
            debug!(key = %entry.key, "no classifiable endpoints, skipped");
            plan.unclassified += 1;
            continue;
        }

        if !claimed.insert(entry.key.as_str()) {
            warn!(
                key = %entry.key,
                home = %ev.home_team,
                away = %ev.away_team,
                "catalog entry matched by more than one feed event; later write wins"
            );
        }

        let links = merge_links(&entry.event.links, &ranked, ev.sport(), labels, rng);
        plan.updates.push(LinkUpdate {
            key: entry.key.clone(),
            links,
            home_team: ev.home_team.clone(),
            away_team: ev.away_team.clone(),
        });
    }

    plan
}

/// Per-pass knobs that are not collaborators.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub pages: u32,
    /// Feed date parameter (see `feed::feed_date`).
    pub date: String,
    pub classifier: Classifier,
    pub labels: LinkLabels,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub fetched: usize,
    pub unique: usize,
    pub matched: usize,
    pub updated: usize,
    pub unmatched: usize,
    pub unclassified: usize,
    pub write_failures: usize,
}

/// One full pass. Only credential exhaustion and an unreadable catalog abort
/// it; everything per-event is logged, counted, and skipped.
pub async fn run_pass<R: Rng + ?Sized>(
    feed: &dyn FeedSource,
    store: &dyn CatalogStore,
    audit: &dyn AuditSink,
    settings: &SyncSettings,
    rng: &mut R,
) -> Result<SyncReport> {
    ensure_metrics_described();

    let mut cursor = KeyCursor::new();
    let mut raw = Vec::new();
    let mut events = Vec::new();
    for page in 1..=settings.pages {
        match feed.fetch_page(&mut cursor, &settings.date, page).await {
            FetchOutcome::Page(p) => {
                debug!(page, records = p.raw.len(), provider = feed.name(), "feed page");
                raw.extend(p.raw);
                events.extend(p.events);
            }
            FetchOutcome::Empty => debug!(page, provider = feed.name(), "feed page empty"),
            FetchOutcome::Exhausted => bail!("all feed keys exhausted (page {page})"),
        }
    }
    counter!("sync_feed_events_total").increment(raw.len() as u64);

    let mut report = SyncReport {
        fetched: raw.len(),
        ..SyncReport::default()
    };
    if raw.is_empty() {
        info!(date = %settings.date, "feed returned no records");
        return Ok(report);
    }

    if let Err(e) = audit.store_raw(&settings.date, &raw).await {
        warn!(error = ?e, "raw feed audit copy failed");
    }

    let catalog = store.load_catalog().await.context("loading catalog")?;
    let plan = plan_updates(events, &catalog, &settings.classifier, &settings.labels, rng);

    report.unique = plan.unique_events;
    report.matched = plan.updates.len();
    report.unmatched = plan.unmatched;
    report.unclassified = plan.unclassified;
    counter!("sync_unmatched_total").increment(plan.unmatched as u64);
    counter!("sync_unclassified_total").increment(plan.unclassified as u64);

    for upd in &plan.updates {
        match store.write_links(&upd.key, &upd.links).await {
            Ok(()) => {
                report.updated += 1;
                counter!("sync_updates_total").increment(1);
                info!(
                    key = %upd.key,
                    home = %upd.home_team,
                    away = %upd.away_team,
                    links = upd.links.len(),
                    "stream links updated"
                );
            }
            Err(e) => {
                report.write_failures += 1;
                counter!("sync_write_failures_total").increment(1);
                warn!(key = %upd.key, error = ?e, "stream link write failed");
            }
        }
    }

    gauge!("sync_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
    Ok(report)
}
