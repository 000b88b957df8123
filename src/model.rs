// src/model.rs
//! Feed and catalog shapes, deserialized straight from the wire.
//!
//! The feed speaks snake_case (`home_team_name`, `servers`, ...); the catalog
//! store speaks camelCase (`team1Name`, `streamLinks`, ...). Both sides are
//! lenient: nulls and missing fields fall back to defaults instead of failing
//! the whole record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_SPORT: &str = "Football";

/// One viewing endpoint reported by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedEndpoint {
    pub url: String,
    pub referer: Option<String>,
}

/// One live fixture reported by the feed. Lives for a single pass.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedEvent {
    #[serde(rename = "home_team_name", default, deserialize_with = "null_as_empty")]
    pub home_team: String,
    #[serde(rename = "away_team_name", default, deserialize_with = "null_as_empty")]
    pub away_team: String,
    #[serde(default = "default_sport", deserialize_with = "sport_or_default")]
    pub sport_category: String,
    /// Unix seconds.
    #[serde(rename = "match_time", default, deserialize_with = "epoch_secs")]
    pub start_time: i64,
    #[serde(rename = "servers", default, deserialize_with = "servers")]
    pub endpoints: Vec<FeedEndpoint>,
}

impl FeedEvent {
    /// Sport category with the feed's implicit default applied.
    pub fn sport(&self) -> &str {
        if self.sport_category.trim().is_empty() {
            DEFAULT_SPORT
        } else {
            &self.sport_category
        }
    }

    pub fn start_time_ms(&self) -> i64 {
        self.start_time.saturating_mul(1000)
    }
}

/// Who put a link on a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOrigin {
    Manual,
    Api,
}

impl LinkOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkOrigin::Manual => "manual",
            LinkOrigin::Api => "api",
        }
    }
}

/// A display-ready stream link as stored on a catalog entry.
///
/// Every stored field is optional and only written back when it was present,
/// so manual links round-trip byte-for-byte; fields this crate does not know
/// about ride along in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "link", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Link {
    /// Link written by this engine.
    pub fn api(name: impl Into<String>, url: impl Into<String>, logo: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            url: Some(url.into()),
            kind: Some("Direct".to_string()),
            logo: Some(logo.into()),
            origin: Some(LinkOrigin::Api.as_str().to_string()),
            extra: serde_json::Map::new(),
        }
    }

    /// Link added by hand. Mostly useful for fixtures.
    pub fn manual(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            url: Some(url.into()),
            kind: Some("Direct".to_string()),
            logo: Some(String::new()),
            origin: Some(LinkOrigin::Manual.as_str().to_string()),
            extra: serde_json::Map::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or_default()
    }

    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or_default()
    }

    pub fn logo(&self) -> &str {
        self.logo.as_deref().unwrap_or_default()
    }

    /// Legacy entries carry no origin and count as manual.
    pub fn origin(&self) -> LinkOrigin {
        match self.origin.as_deref() {
            Some(o) if o.eq_ignore_ascii_case("api") => LinkOrigin::Api,
            _ => LinkOrigin::Manual,
        }
    }
}

/// A scheduled event in the catalog store.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEvent {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub team1_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub team2_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sport_type: String,
    #[serde(rename = "matchTime", default, deserialize_with = "catalog_time")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(rename = "streamLinks", default, deserialize_with = "stream_links")]
    pub links: Vec<Link>,
}

impl CatalogEvent {
    pub fn start_time_ms(&self) -> Option<i64> {
        self.start_time.map(|t| t.timestamp_millis())
    }
}

/// A catalog event together with the opaque key the store assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub key: String,
    pub event: CatalogEvent,
}

// --- lenient field decoders ---

fn default_sport() -> String {
    DEFAULT_SPORT.to_string()
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn sport_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(default_sport))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Int(i64),
    Float(f64),
    Text(String),
}

fn epoch_secs<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    Ok(match Option::<NumberOrText>::deserialize(d)? {
        Some(NumberOrText::Int(v)) => v,
        Some(NumberOrText::Float(v)) => v as i64,
        Some(NumberOrText::Text(s)) => s.trim().parse().unwrap_or(0),
        None => 0,
    })
}

#[derive(Deserialize, Default)]
struct WireHeaders {
    #[serde(alias = "Referer", default)]
    referer: Option<String>,
}

#[derive(Deserialize)]
struct WireServer {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    headers: Option<WireHeaders>,
}

fn servers<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<FeedEndpoint>, D::Error> {
    let raw = Option::<Vec<Option<WireServer>>>::deserialize(d)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .flatten()
        .map(|s| FeedEndpoint {
            url: s.url.unwrap_or_default(),
            referer: s
                .headers
                .and_then(|h| h.referer)
                .filter(|r| !r.is_empty()),
        })
        .collect())
}

/// Parse a catalog `matchTime`: RFC 3339, naive ISO (read as UTC), a bare
/// date, or epoch milliseconds.
pub fn parse_catalog_time(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n));
    }
    s.parse::<i64>().ok().and_then(millis_to_utc)
}

fn millis_to_utc(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

fn catalog_time<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    Ok(match Option::<NumberOrText>::deserialize(d)? {
        Some(NumberOrText::Int(ms)) => millis_to_utc(ms),
        Some(NumberOrText::Float(ms)) => millis_to_utc(ms as i64),
        Some(NumberOrText::Text(s)) => parse_catalog_time(&s),
        None => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireLinks {
    List(Vec<Option<Link>>),
    Keyed(BTreeMap<String, Option<Link>>),
}

/// The store turns sparse arrays into index-keyed objects; accept both and
/// drop null slots.
fn stream_links<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Link>, D::Error> {
    Ok(match Option::<WireLinks>::deserialize(d)? {
        None => Vec::new(),
        Some(WireLinks::List(v)) => v.into_iter().flatten().collect(),
        Some(WireLinks::Keyed(map)) => {
            let mut slots: Vec<(String, Link)> = map
                .into_iter()
                .filter_map(|(k, v)| v.map(|l| (k, l)))
                .collect();
            slots.sort_by(|(a, _), (b, _)| {
                match (a.parse::<u64>(), b.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => a.cmp(b),
                }
            });
            slots.into_iter().map(|(_, l)| l).collect()
        }
    })
}
