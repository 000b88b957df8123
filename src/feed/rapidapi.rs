// src/feed/rapidapi.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use super::{rotate_keys, FeedPage, FeedSource, FetchOutcome, KeyAttempt, KeyCursor};

pub const DEFAULT_HOST: &str = "football-live-streaming-api.p.rapidapi.com";

#[derive(Debug, Deserialize)]
struct MatchesBody {
    #[serde(default)]
    matches: Option<Vec<serde_json::Value>>,
}

/// Live-match feed behind RapidAPI, with an ordered list of subscription keys.
pub struct RapidApiFeed {
    keys: Vec<String>,
    host: String,
    base_url: String,
    client: Client,
}

impl RapidApiFeed {
    pub fn new(keys: Vec<String>, host: impl Into<String>, timeout: Duration) -> Result<Self> {
        let host = host.into();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("building feed http client")?;
        Ok(Self {
            keys,
            base_url: format!("https://{host}"),
            host,
            client,
        })
    }

    /// Point requests at another origin (e.g. a local stub) while keeping
    /// the `x-rapidapi-host` header.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    async fn request(&self, key: String, date: &str, page: u32) -> KeyAttempt {
        let t0 = std::time::Instant::now();
        let res = self
            .client
            .get(format!("{}/matches", self.base_url))
            .query(&[("page", page.to_string()), ("date", date.to_string())])
            .header("x-rapidapi-key", key)
            .header("x-rapidapi-host", &self.host)
            .send()
            .await;

        let resp = match res {
            Ok(r) => r,
            Err(e) => return KeyAttempt::Failed(anyhow::Error::new(e).context("feed http get()")),
        };

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::UNAUTHORIZED {
            return KeyAttempt::Rejected(status.as_u16());
        }
        if !status.is_success() {
            counter!("sync_feed_errors_total").increment(1);
            return KeyAttempt::Failed(anyhow!("feed returned HTTP {status}"));
        }

        let body: MatchesBody = match resp.json().await.context("decoding feed body") {
            Ok(b) => b,
            Err(e) => return KeyAttempt::Failed(e),
        };

        histogram!("sync_feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        KeyAttempt::Success(FeedPage::from_raw(body.matches.unwrap_or_default()))
    }
}

#[async_trait]
impl FeedSource for RapidApiFeed {
    async fn fetch_page(&self, cursor: &mut KeyCursor, date: &str, page: u32) -> FetchOutcome {
        rotate_keys(&self.keys, cursor, |key| self.request(key, date, page)).await
    }

    fn name(&self) -> &'static str {
        "RapidAPI"
    }
}
