// src/matcher.rs
//! Greedy first-fit lookup of the catalog entry a feed record refers to.
//!
//! The scan stops at the first entry that passes all three gates (sport,
//! both team positions, start-time window); it never looks for a better
//! candidate further down the catalog.

use crate::model::{CatalogEntry, FeedEvent};
use crate::normalize::{names_correspond, normalize_name};

/// Feed and catalog start times must be strictly closer than this.
pub const MATCH_WINDOW_MS: u64 = 86_400_000;

pub fn find_match<'a>(feed: &FeedEvent, catalog: &'a [CatalogEntry]) -> Option<&'a CatalogEntry> {
    let sport = feed.sport().to_lowercase();
    let home = normalize_name(&feed.home_team);
    let away = normalize_name(&feed.away_team);
    let feed_ms = feed.start_time_ms();

    catalog.iter().find(|entry| {
        let ev = &entry.event;
        if ev.sport_type.to_lowercase() != sport {
            return false;
        }
        if !names_correspond(&normalize_name(&ev.team1_name), &home)
            || !names_correspond(&normalize_name(&ev.team2_name), &away)
        {
            return false;
        }
        ev.start_time_ms()
            .is_some_and(|cat_ms| cat_ms.abs_diff(feed_ms) < MATCH_WINDOW_MS)
    })
}
