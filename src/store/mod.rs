// src/store/mod.rs
pub mod memory;
pub mod rtdb;

use anyhow::Result;

use crate::model::{CatalogEntry, Link};

/// Read/write access to the scheduled-event catalog.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Full snapshot, in store key order.
    async fn load_catalog(&self) -> Result<Vec<CatalogEntry>>;
    /// Replace the link list of one entry.
    async fn write_links(&self, key: &str, links: &[Link]) -> Result<()>;
}

/// Destination for the verbatim feed copy taken before deduplication.
#[async_trait::async_trait]
pub trait AuditSink: Send + Sync {
    async fn store_raw(&self, date: &str, records: &[serde_json::Value]) -> Result<()>;
}

/// Hex SHA-256 of the serialized records, stored next to the audit copy.
pub fn fingerprint(records: &[serde_json::Value]) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    let mut hasher = Sha256::new();
    for rec in records {
        hasher.update(rec.to_string().as_bytes());
        hasher.update(b"\n");
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
