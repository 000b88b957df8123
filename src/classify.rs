// src/classify.rs
//! Provider classification and priority ranking for feed endpoints.

use serde::{Deserialize, Serialize};

use crate::model::FeedEndpoint;

pub const LOGO_FMP: &str = "https://i.ibb.co/CFsJDtb/1000315330.png";
pub const LOGO_SOCO: &str = "https://i.ibb.co/DgvNg0k0/1000315332.png";
pub const LOGO_OK9: &str = "https://i.ibb.co/k66hvS7j/1000313353.jpg";

/// Which part of the endpoint a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    Url,
    Referer,
}

/// Signature table entry: endpoints whose `field` contains any signature
/// belong to `tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRule {
    pub tag: String,
    #[serde(default = "default_field")]
    pub field: MatchField,
    pub signatures: Vec<String>,
    #[serde(default)]
    pub logo: String,
}

fn default_field() -> MatchField {
    MatchField::Url
}

impl ProviderRule {
    fn matches(&self, ep: &FeedEndpoint) -> bool {
        let haystack = match self.field {
            MatchField::Url => ep.url.as_str(),
            MatchField::Referer => ep.referer.as_deref().unwrap_or_default(),
        };
        !haystack.is_empty()
            && self
                .signatures
                .iter()
                .any(|sig| !sig.is_empty() && haystack.contains(sig.as_str()))
    }
}

pub fn default_rules() -> Vec<ProviderRule> {
    vec![
        ProviderRule {
            tag: "FMP".into(),
            field: MatchField::Referer,
            signatures: vec!["fmp.live".into()],
            logo: LOGO_FMP.into(),
        },
        ProviderRule {
            tag: "SOCO".into(),
            field: MatchField::Url,
            signatures: vec!["pull.niues.live".into()],
            logo: LOGO_SOCO.into(),
        },
        ProviderRule {
            tag: "OK9".into(),
            field: MatchField::Url,
            signatures: vec!["cdnok9.com".into()],
            logo: LOGO_OK9.into(),
        },
    ]
}

pub fn default_priority() -> Vec<String> {
    vec!["FMP".into(), "SOCO".into(), "OK9".into()]
}

/// An endpoint that matched a provider rule, ready to become a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEndpoint {
    pub url: String,
    pub provider: String,
    pub logo: String,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<ProviderRule>,
    priority: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(default_rules(), default_priority())
    }
}

impl Classifier {
    pub fn new(rules: Vec<ProviderRule>, priority: Vec<String>) -> Self {
        Self { rules, priority }
    }

    pub fn rules(&self) -> &[ProviderRule] {
        &self.rules
    }

    pub fn priority(&self) -> &[String] {
        &self.priority
    }

    /// First rule (in declared order) whose signature the endpoint carries.
    pub fn classify(&self, ep: &FeedEndpoint) -> Option<&ProviderRule> {
        if ep.url.trim().is_empty() {
            return None;
        }
        self.rules.iter().find(|r| r.matches(ep))
    }

    /// Classify every endpoint and concatenate the buckets in priority
    /// order. Within a bucket the feed order is kept. Unknown endpoints, and
    /// endpoints whose tag has no priority slot, are dropped.
    pub fn rank(&self, endpoints: &[FeedEndpoint]) -> Vec<ClassifiedEndpoint> {
        let tagged: Vec<(&FeedEndpoint, &ProviderRule)> = endpoints
            .iter()
            .filter_map(|ep| self.classify(ep).map(|r| (ep, r)))
            .collect();

        let mut out = Vec::with_capacity(tagged.len());
        for bucket in &self.priority {
            for (ep, rule) in tagged.iter().filter(|(_, r)| &r.tag == bucket) {
                out.push(ClassifiedEndpoint {
                    url: ep.url.clone(),
                    provider: rule.tag.clone(),
                    logo: rule.logo.clone(),
                });
            }
        }
        out
    }
}
