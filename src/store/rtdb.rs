// src/store/rtdb.rs
//! Firebase Realtime Database over its REST surface.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::collections::BTreeMap;
use std::time::Duration;

use super::{fingerprint, AuditSink, CatalogStore};
use crate::model::{CatalogEntry, CatalogEvent, Link};

pub struct RtdbStore {
    base_url: String,
    auth: Option<String>,
    catalog_path: String,
    audit_path: String,
    client: Client,
}

impl RtdbStore {
    pub fn new(
        base_url: impl Into<String>,
        auth: Option<String>,
        catalog_path: impl Into<String>,
        audit_path: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("building store http client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth: auth.filter(|a| !a.trim().is_empty()),
            catalog_path: trim_path(catalog_path.into()),
            audit_path: trim_path(audit_path.into()),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(token) => req.query(&[("auth", token)]),
            None => req,
        }
    }
}

fn trim_path(p: String) -> String {
    p.trim_matches('/').to_string()
}

/// Decode the catalog node. Malformed entries are skipped, not fatal.
pub fn decode_catalog(body: Option<BTreeMap<String, Option<serde_json::Value>>>) -> Vec<CatalogEntry> {
    let mut out = Vec::new();
    for (key, value) in body.unwrap_or_default() {
        let Some(value) = value else { continue };
        match serde_json::from_value::<CatalogEvent>(value) {
            Ok(event) => out.push(CatalogEntry { key, event }),
            Err(e) => tracing::debug!(%key, error = %e, "catalog entry skipped (undecodable)"),
        }
    }
    out
}

#[async_trait]
impl CatalogStore for RtdbStore {
    async fn load_catalog(&self) -> Result<Vec<CatalogEntry>> {
        let body: Option<BTreeMap<String, Option<serde_json::Value>>> = self
            .authed(self.client.get(self.url(&self.catalog_path)))
            .send()
            .await
            .context("catalog http get()")?
            .error_for_status()
            .context("catalog non-2xx")?
            .json()
            .await
            .context("decoding catalog body")?;
        Ok(decode_catalog(body))
    }

    async fn write_links(&self, key: &str, links: &[Link]) -> Result<()> {
        let path = format!("{}/{}/streamLinks", self.catalog_path, key);
        self.authed(self.client.put(self.url(&path)))
            .json(links)
            .send()
            .await
            .with_context(|| format!("stream links put() for {key}"))?
            .error_for_status()
            .with_context(|| format!("stream links non-2xx for {key}"))?;
        Ok(())
    }
}

#[async_trait]
impl AuditSink for RtdbStore {
    async fn store_raw(&self, date: &str, records: &[serde_json::Value]) -> Result<()> {
        let body = serde_json::json!({
            "fetched_at": chrono::Utc::now().to_rfc3339(),
            "sha256": fingerprint(records),
            "count": records.len(),
            "records": records,
        });
        let path = format!("{}/{}", self.audit_path, date);
        self.authed(self.client.put(self.url(&path)))
            .json(&body)
            .send()
            .await
            .context("audit put()")?
            .error_for_status()
            .context("audit non-2xx")?;
        Ok(())
    }
}
