// src/dedup.rs
use std::collections::HashMap;

use crate::model::FeedEvent;
use crate::normalize::pair_key;

/// Collapse feed records that describe the same team pair (the feed is
/// paginated and fixtures repeat across pages). The record with more
/// endpoints wins; ties keep the first seen. Output keeps first-occurrence
/// order.
pub fn dedupe_feed(events: Vec<FeedEvent>) -> Vec<FeedEvent> {
    let mut slot_by_key: HashMap<String, usize> = HashMap::with_capacity(events.len());
    let mut out: Vec<FeedEvent> = Vec::with_capacity(events.len());

    for ev in events {
        let key = pair_key(&ev.home_team, &ev.away_team);
        match slot_by_key.get(&key) {
            Some(&idx) => {
                if ev.endpoints.len() > out[idx].endpoints.len() {
                    out[idx] = ev;
                }
            }
            None => {
                slot_by_key.insert(key, out.len());
                out.push(ev);
            }
        }
    }

    out
}
