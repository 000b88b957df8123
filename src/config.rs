// src/config.rs
use anyhow::{anyhow, bail, Context, Result};
use chrono::FixedOffset;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::classify::{default_priority, default_rules, Classifier, ProviderRule};
use crate::feed::rapidapi::DEFAULT_HOST;
use crate::merge::LinkLabels;

pub const ENV_PROVIDERS_PATH: &str = "SYNC_PROVIDERS_PATH";
pub const DEFAULT_PROVIDERS_TOML: &str = "config/providers.toml";
pub const DEFAULT_PROVIDERS_JSON: &str = "config/providers.json";

/// Process-level settings, read from the environment.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub api_keys: Vec<String>,
    pub api_host: String,
    pub pages: u32,
    pub utc_offset: FixedOffset,
    pub db_url: String,
    pub db_auth: Option<String>,
    pub catalog_path: String,
    pub audit_path: String,
    pub http_timeout: Duration,
    pub metrics_textfile: Option<PathBuf>,
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env_opt(name) {
        None => Ok(None),
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow!("{name} is not a valid value: {v:?}")),
    }
}

/// Comma-separated key list; blanks dropped, order kept.
pub fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

impl SyncConfig {
    pub fn from_env() -> Result<Self> {
        let api_keys = parse_key_list(&env_opt("RAPIDAPI_KEYS_LIST").unwrap_or_default());
        if api_keys.is_empty() {
            bail!("RAPIDAPI_KEYS_LIST is empty or missing");
        }
        let db_url = env_opt("FIREBASE_DB_URL").context("FIREBASE_DB_URL is missing")?;

        let offset_min: i32 = env_parse("FEED_UTC_OFFSET_MINUTES")?.unwrap_or(0);
        let utc_offset = FixedOffset::east_opt(offset_min.saturating_mul(60))
            .ok_or_else(|| anyhow!("FEED_UTC_OFFSET_MINUTES out of range: {offset_min}"))?;

        Ok(Self {
            api_keys,
            api_host: env_opt("RAPIDAPI_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            pages: env_parse::<u32>("FEED_PAGES")?.unwrap_or(2).clamp(1, 10),
            utc_offset,
            db_url,
            db_auth: env_opt("FIREBASE_AUTH_TOKEN"),
            catalog_path: env_opt("CATALOG_PATH").unwrap_or_else(|| "matches".into()),
            audit_path: env_opt("AUDIT_PATH").unwrap_or_else(|| "api_raw".into()),
            http_timeout: Duration::from_secs(env_parse("HTTP_TIMEOUT_SECS")?.unwrap_or(15)),
            metrics_textfile: env_opt("METRICS_TEXTFILE").map(PathBuf::from),
        })
    }
}

/// Provider table, ranking and labels: the deployment-specific knobs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub priority: Vec<String>,
    pub providers: Vec<ProviderRule>,
    pub labels: LinkLabels,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            priority: default_priority(),
            providers: default_rules(),
            labels: LinkLabels::default(),
        }
    }
}

impl ProviderSettings {
    pub fn classifier(&self) -> Classifier {
        Classifier::new(self.providers.clone(), self.priority.clone())
    }

    fn sanitize(mut self) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        self.priority = self
            .priority
            .into_iter()
            .map(|p| p.trim().to_ascii_uppercase())
            .filter(|p| !p.is_empty() && seen.insert(p.clone()))
            .collect();
        for rule in &mut self.providers {
            rule.tag = rule.tag.trim().to_ascii_uppercase();
            rule.signatures.retain(|s| !s.trim().is_empty());
            if rule.signatures.is_empty() {
                bail!("provider {} has no signatures", rule.tag);
            }
        }
        if !(0.0..=1.0).contains(&self.labels.sport_adjective_chance) {
            self.labels.sport_adjective_chance = LinkLabels::default().sport_adjective_chance;
        }
        Ok(self)
    }
}

/// Load provider settings from an explicit path. TOML or JSON.
pub fn load_providers_from(path: &Path) -> Result<ProviderSettings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading provider settings from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_providers(&content, &ext)
}

/// Load provider settings using env var + fallbacks:
/// 1) $SYNC_PROVIDERS_PATH
/// 2) config/providers.toml
/// 3) config/providers.json
/// 4) built-in defaults
pub fn load_providers_default() -> Result<ProviderSettings> {
    if let Some(p) = env_opt(ENV_PROVIDERS_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            bail!("{ENV_PROVIDERS_PATH} points to non-existent path");
        }
        return load_providers_from(&pb);
    }
    for candidate in [DEFAULT_PROVIDERS_TOML, DEFAULT_PROVIDERS_JSON] {
        let pb = PathBuf::from(candidate);
        if pb.exists() {
            return load_providers_from(&pb);
        }
    }
    Ok(ProviderSettings::default())
}

fn parse_providers(s: &str, hint_ext: &str) -> Result<ProviderSettings> {
    let parsed = if hint_ext == "json" {
        serde_json::from_str::<ProviderSettings>(s).context("parsing provider settings json")?
    } else if hint_ext == "toml" {
        toml::from_str::<ProviderSettings>(s).context("parsing provider settings toml")?
    } else {
        match toml::from_str::<ProviderSettings>(s) {
            Ok(v) => v,
            Err(_) => serde_json::from_str(s).context("unsupported provider settings format")?,
        }
    };
    parsed.sanitize()
}
