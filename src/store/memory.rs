// src/store/memory.rs
//! In-process catalog + audit store (test helper).

use anyhow::{anyhow, Result};
use std::collections::HashSet;
use std::sync::Mutex;

use super::{AuditSink, CatalogStore};
use crate::model::{CatalogEntry, Link};

#[derive(Debug, Default)]
pub struct MemoryStore {
    catalog: Mutex<Vec<CatalogEntry>>,
    /// Every `write_links` call, in order.
    pub writes: Mutex<Vec<(String, Vec<Link>)>>,
    /// Every `store_raw` call, in order.
    pub audits: Mutex<Vec<(String, Vec<serde_json::Value>)>>,
    failing_keys: HashSet<String>,
    loads: Mutex<usize>,
}

impl MemoryStore {
    pub fn new(catalog: Vec<CatalogEntry>) -> Self {
        Self {
            catalog: Mutex::new(catalog),
            ..Self::default()
        }
    }

    /// Make writes to `key` fail, for exercising per-event error handling.
    pub fn failing_on(mut self, key: impl Into<String>) -> Self {
        self.failing_keys.insert(key.into());
        self
    }

    pub fn load_count(&self) -> Result<usize> {
        Ok(*self.loads.lock().map_err(|_| anyhow!("memory store mutex poisoned"))?)
    }

    pub fn snapshot(&self) -> Result<Vec<CatalogEntry>> {
        Ok(self
            .catalog
            .lock()
            .map_err(|_| anyhow!("memory store mutex poisoned"))?
            .clone())
    }
}

#[async_trait::async_trait]
impl CatalogStore for MemoryStore {
    async fn load_catalog(&self) -> Result<Vec<CatalogEntry>> {
        *self.loads.lock().map_err(|_| anyhow!("memory store mutex poisoned"))? += 1;
        self.snapshot()
    }

    async fn write_links(&self, key: &str, links: &[Link]) -> Result<()> {
        if self.failing_keys.contains(key) {
            return Err(anyhow!("write to {key} rejected"));
        }
        let mut catalog = self
            .catalog
            .lock()
            .map_err(|_| anyhow!("memory store mutex poisoned"))?;
        let entry = catalog
            .iter_mut()
            .find(|e| e.key == key)
            .ok_or_else(|| anyhow!("no catalog entry {key}"))?;
        entry.event.links = links.to_vec();
        drop(catalog);

        self.writes
            .lock()
            .map_err(|_| anyhow!("memory store mutex poisoned"))?
            .push((key.to_string(), links.to_vec()));
        Ok(())
    }
}

#[async_trait::async_trait]
impl AuditSink for MemoryStore {
    async fn store_raw(&self, date: &str, records: &[serde_json::Value]) -> Result<()> {
        self.audits
            .lock()
            .map_err(|_| anyhow!("memory store mutex poisoned"))?
            .push((date.to_string(), records.to_vec()));
        Ok(())
    }
}
