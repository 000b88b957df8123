// src/feed/mod.rs
pub mod rapidapi;

use chrono::{DateTime, FixedOffset, Utc};
use metrics::counter;
use std::future::Future;

use crate::model::FeedEvent;

/// One page of the feed: the verbatim records (for the audit copy) and the
/// ones that decoded into `FeedEvent`s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPage {
    pub raw: Vec<serde_json::Value>,
    pub events: Vec<FeedEvent>,
}

impl FeedPage {
    pub fn from_raw(raw: Vec<serde_json::Value>) -> Self {
        let mut events = Vec::with_capacity(raw.len());
        for (idx, rec) in raw.iter().enumerate() {
            match serde_json::from_value::<FeedEvent>(rec.clone()) {
                Ok(ev) => events.push(ev),
                Err(e) => tracing::debug!(idx, error = %e, "feed record skipped (undecodable)"),
            }
        }
        Self { raw, events }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// Tagged result of one page fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    Page(FeedPage),
    /// Non-fatal provider trouble or a genuinely empty page.
    Empty,
    /// Every credential was rejected; the pass cannot continue.
    Exhausted,
}

/// Position in the ordered credential list. Threaded through every page
/// fetch of a pass so a key rejected on page 1 is not retried on page 2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyCursor {
    index: usize,
}

impl KeyCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current<'k>(&self, keys: &'k [String]) -> Option<&'k str> {
        keys.get(self.index).map(String::as_str)
    }

    pub fn advance(&mut self) {
        self.index = self.index.saturating_add(1);
    }
}

/// What a single keyed request produced.
#[derive(Debug)]
pub enum KeyAttempt {
    Success(FeedPage),
    /// Rate-limited or unauthorized: rotate to the next key.
    Rejected(u16),
    Failed(anyhow::Error),
}

/// Bounded rotation: try the current key, move on after each rejection,
/// report `Exhausted` once the list runs out.
pub async fn rotate_keys<F, Fut>(keys: &[String], cursor: &mut KeyCursor, mut attempt: F) -> FetchOutcome
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = KeyAttempt>,
{
    while let Some(key) = cursor.current(keys) {
        match attempt(key.to_string()).await {
            KeyAttempt::Success(page) if page.is_empty() => return FetchOutcome::Empty,
            KeyAttempt::Success(page) => return FetchOutcome::Page(page),
            KeyAttempt::Rejected(status) => {
                tracing::warn!(key_index = cursor.index(), status, "feed key rejected, rotating");
                counter!("sync_key_rotations_total").increment(1);
                cursor.advance();
            }
            KeyAttempt::Failed(e) => {
                tracing::warn!(error = ?e, "feed request failed, treating page as empty");
                return FetchOutcome::Empty;
            }
        }
    }
    FetchOutcome::Exhausted
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_page(&self, cursor: &mut KeyCursor, date: &str, page: u32) -> FetchOutcome;
    fn name(&self) -> &'static str;
}

/// Feed date parameter: day-month-year without separators, in `offset`.
pub fn feed_date(now: DateTime<Utc>, offset: FixedOffset) -> String {
    now.with_timezone(&offset).format("%d%m%Y").to_string()
}
