// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod classify;
pub mod config;
pub mod dedup;
pub mod matcher;
pub mod merge;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod sync;

// Collaborators at the I/O boundary
pub mod feed;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::classify::{ClassifiedEndpoint, Classifier};
pub use crate::model::{CatalogEntry, CatalogEvent, FeedEndpoint, FeedEvent, Link, LinkOrigin};
pub use crate::normalize::normalize_name;
pub use crate::sync::{plan_updates, run_pass, SyncReport, SyncSettings};
