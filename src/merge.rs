// src/merge.rs
//! Link-list merge policy.
//!
//! Manual links stay exactly where they are, as the head of the list. The
//! api tail is rebuilt from scratch every pass: rank 0 and rank 1 get fixed
//! labels, every further rank gets a generated branded label.

use rand::{seq::IndexedRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::classify::ClassifiedEndpoint;
use crate::model::{Link, LinkOrigin};

/// Display labels for engine-written links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkLabels {
    pub primary: String,
    pub secondary: String,
    pub brand: String,
    pub neutral_adjectives: Vec<String>,
    pub cricket_adjectives: Vec<String>,
    pub football_adjectives: Vec<String>,
    pub resolutions: Vec<String>,
    /// Chance of replacing the neutral adjective with a sport-specific one.
    pub sport_adjective_chance: f64,
}

impl Default for LinkLabels {
    fn default() -> Self {
        fn words(ws: &[&str]) -> Vec<String> {
            ws.iter().map(|w| w.to_string()).collect()
        }
        Self {
            primary: "SPORTIFy TV".into(),
            secondary: "SPORTIFy TV+ HD".into(),
            brand: "SPORTIFy".into(),
            neutral_adjectives: words(&[
                "FAST", "PRO", "MAX", "ULTRA", "PLUS", "GOLD", "LIVE", "PRIME", "TURBO", "STAR",
            ]),
            cricket_adjectives: words(&["CRICKET", "T20", "MATCH"]),
            football_adjectives: words(&["FOOTBALL", "SOCCER", "GOAL"]),
            resolutions: words(&["HD", "FHD", "SD"]),
            sport_adjective_chance: 0.3,
        }
    }
}

/// Randomized label for overflow links: brand + resolution, brand +
/// adjective, or brand + adjective + resolution, each equally likely.
pub fn branded_name<R: Rng + ?Sized>(labels: &LinkLabels, sport: &str, rng: &mut R) -> String {
    let sport_set = if sport.to_lowercase().contains("cricket") {
        &labels.cricket_adjectives
    } else {
        &labels.football_adjectives
    };

    let mut adjective = labels.neutral_adjectives.choose(rng);
    let chance = labels.sport_adjective_chance;
    let chance = if chance.is_nan() { 0.0 } else { chance.clamp(0.0, 1.0) };
    if rng.random_bool(chance) {
        adjective = sport_set.choose(rng).or(adjective);
    }
    let resolution = labels.resolutions.choose(rng);

    let parts: Vec<&String> = match rng.random_range(0..3u8) {
        0 => vec![Some(&labels.brand), resolution],
        1 => vec![Some(&labels.brand), adjective],
        _ => vec![Some(&labels.brand), adjective, resolution],
    }
    .into_iter()
    .flatten()
    .collect();

    parts
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// New link list for a matched catalog entry: manual head ++ fresh api tail.
pub fn merge_links<R: Rng + ?Sized>(
    existing: &[Link],
    ranked: &[ClassifiedEndpoint],
    sport: &str,
    labels: &LinkLabels,
    rng: &mut R,
) -> Vec<Link> {
    let mut out: Vec<Link> = existing
        .iter()
        .filter(|l| l.origin() == LinkOrigin::Manual)
        .cloned()
        .collect();
    out.reserve(ranked.len());

    for (rank, ep) in ranked.iter().enumerate() {
        let name = match rank {
            0 => labels.primary.clone(),
            1 => labels.secondary.clone(),
            _ => branded_name(labels, sport, rng),
        };
        out.push(Link::api(name, ep.url.clone(), ep.logo.clone()));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn all_possible_names(labels: &LinkLabels, sport_set: &[String]) -> HashSet<String> {
        let mut set = HashSet::new();
        let adjs: Vec<&String> = labels.neutral_adjectives.iter().chain(sport_set).collect();
        for r in &labels.resolutions {
            set.insert(format!("{} {}", labels.brand, r));
        }
        for a in &adjs {
            set.insert(format!("{} {}", labels.brand, a));
            for r in &labels.resolutions {
                set.insert(format!("{} {} {}", labels.brand, a, r));
            }
        }
        set
    }

    #[test]
    fn branded_names_stay_in_the_football_vocabulary() {
        let labels = LinkLabels::default();
        let allowed = all_possible_names(&labels, &labels.football_adjectives);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let n = branded_name(&labels, "Football", &mut rng);
            assert!(allowed.contains(&n), "unexpected name {n}");
        }
    }

    #[test]
    fn unset_sport_chance_falls_back_to_neutral_words() {
        let labels = LinkLabels {
            sport_adjective_chance: f64::NAN,
            ..LinkLabels::default()
        };
        let allowed = all_possible_names(&labels, &[]);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let n = branded_name(&labels, "Football", &mut rng);
            assert!(allowed.contains(&n), "unexpected name {n}");
        }
    }

    #[test]
    fn cricket_sport_never_yields_football_words() {
        let labels = LinkLabels::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut saw_cricket_word = false;
        for _ in 0..500 {
            let n = branded_name(&labels, "T20 Cricket", &mut rng);
            assert!(!labels.football_adjectives.iter().any(|w| n.contains(w.as_str())));
            saw_cricket_word |= labels.cricket_adjectives.iter().any(|w| n.contains(w.as_str()));
        }
        assert!(saw_cricket_word);
    }

    #[test]
    fn two_and_three_word_layouts_both_occur() {
        let labels = LinkLabels::default();
        let mut rng = StdRng::seed_from_u64(1);
        let word_counts: HashSet<usize> = (0..300)
            .map(|_| branded_name(&labels, "Football", &mut rng).split(' ').count())
            .collect();
        assert_eq!(word_counts, HashSet::from([2, 3]));
    }

    #[test]
    fn api_links_are_dropped_and_rebuilt() {
        let labels = LinkLabels::default();
        let existing = vec![
            Link::api("SPORTIFy TV", "https://old/1", "l"),
            Link::manual("Promo", "https://x"),
        ];
        let ranked = vec![ClassifiedEndpoint {
            url: "https://new/1".into(),
            provider: "SOCO".into(),
            logo: "logo".into(),
        }];
        let mut rng = StdRng::seed_from_u64(0);
        let out = merge_links(&existing, &ranked, "Football", &labels, &mut rng);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], existing[1]);
        assert_eq!(out[1].url(), "https://new/1");
        assert_eq!(out[1].kind(), "Direct");
        assert_eq!(out[1].origin(), LinkOrigin::Api);
    }
}
