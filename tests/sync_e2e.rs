// tests/sync_e2e.rs
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rand::{rngs::StdRng, SeedableRng};
use serde_json::{json, Value};
use std::sync::Mutex;

use stream_link_sync::classify::{Classifier, LOGO_OK9, LOGO_SOCO};
use stream_link_sync::feed::{FeedPage, FeedSource, FetchOutcome, KeyCursor};
use stream_link_sync::merge::LinkLabels;
use stream_link_sync::store::memory::MemoryStore;
use stream_link_sync::{run_pass, CatalogEntry, CatalogEvent, Link, LinkOrigin, SyncSettings};

const T: i64 = 1_740_853_800; // 2025-03-01T18:30:00Z
const SOCO_URL: &str = "https://pull.niues.live/live/stream-1.flv";
const OK9_URL: &str = "https://hls.cdnok9.com/live/2.m3u8";

/// Serves pre-baked pages; a `None` page means "every key rejected".
struct MockFeed {
    pages: Vec<Option<Vec<Value>>>,
    calls: Mutex<Vec<(String, u32, usize)>>,
}

impl MockFeed {
    fn new(pages: Vec<Option<Vec<Value>>>) -> Self {
        Self {
            pages,
            calls: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl FeedSource for MockFeed {
    async fn fetch_page(&self, cursor: &mut KeyCursor, date: &str, page: u32) -> FetchOutcome {
        self.calls
            .lock()
            .unwrap()
            .push((date.to_string(), page, cursor.index()));
        match self.pages.get(page as usize - 1) {
            Some(Some(records)) if records.is_empty() => FetchOutcome::Empty,
            Some(Some(records)) => FetchOutcome::Page(FeedPage::from_raw(records.clone())),
            Some(None) => FetchOutcome::Exhausted,
            None => FetchOutcome::Empty,
        }
    }

    fn name(&self) -> &'static str {
        "MockFeed"
    }
}

fn settings(pages: u32) -> SyncSettings {
    SyncSettings {
        pages,
        date: "01032025".into(),
        classifier: Classifier::default(),
        labels: LinkLabels::default(),
    }
}

fn madrid_barca(links: Vec<Link>) -> CatalogEntry {
    CatalogEntry {
        key: "-Nmatch1".into(),
        event: CatalogEvent {
            team1_name: "Real Madrid".into(),
            team2_name: "Barcelona".into(),
            sport_type: "Football".into(),
            start_time: Utc.timestamp_opt(T, 0).single(),
            links,
        },
    }
}

fn record(home: &str, away: &str, urls: &[&str]) -> Value {
    json!({
        "home_team_name": home,
        "away_team_name": away,
        "sport_category": "Football",
        "match_time": T,
        "servers": urls.iter().map(|u| json!({"url": u, "headers": {}})).collect::<Vec<_>>(),
    })
}

#[tokio::test]
async fn madrid_barcelona_scenario() {
    let store = MemoryStore::new(vec![madrid_barca(vec![Link::manual("Promo", "https://x")])]);
    let feed = MockFeed::new(vec![Some(vec![record(
        "real madrid",
        "fc barcelona",
        &[SOCO_URL, OK9_URL],
    )])]);

    let report = run_pass(&feed, &store, &store, &settings(1), &mut StdRng::seed_from_u64(1))
        .await
        .unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(report.matched, 1);

    let writes = store.writes.lock().unwrap();
    assert_eq!(writes.len(), 1);
    let (key, links) = &writes[0];
    assert_eq!(key, "-Nmatch1");

    let summary: Vec<_> = links
        .iter()
        .map(|l| (l.name(), l.url(), l.origin()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Promo", "https://x", LinkOrigin::Manual),
            ("SPORTIFy TV", SOCO_URL, LinkOrigin::Api),
            ("SPORTIFy TV+ HD", OK9_URL, LinkOrigin::Api),
        ]
    );
    assert_eq!(links[1].logo(), LOGO_SOCO);
    assert_eq!(links[2].logo(), LOGO_OK9);
    assert_eq!(links[2].kind(), "Direct");
}

#[tokio::test]
async fn unclassifiable_endpoints_cause_no_write() {
    let store = MemoryStore::new(vec![madrid_barca(vec![])]);
    let feed = MockFeed::new(vec![Some(vec![record(
        "Real Madrid",
        "Barcelona",
        &["https://random-cdn.test/a.m3u8"],
    )])]);

    let report = run_pass(&feed, &store, &store, &settings(1), &mut StdRng::seed_from_u64(1))
        .await
        .unwrap();
    assert_eq!(report.unclassified, 1);
    assert_eq!(report.updated, 0);
    assert!(store.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn second_run_replaces_the_api_tail_and_still_writes() {
    let store = MemoryStore::new(vec![madrid_barca(vec![Link::manual("Promo", "https://x")])]);
    let feed = MockFeed::new(vec![Some(vec![record("Real Madrid", "Barcelona", &[SOCO_URL])])]);

    for _ in 0..2 {
        run_pass(&feed, &store, &store, &settings(1), &mut StdRng::seed_from_u64(1))
            .await
            .unwrap();
    }

    let writes = store.writes.lock().unwrap();
    assert_eq!(writes.len(), 2, "write-back is unconditional");
    assert_eq!(writes[0].1, writes[1].1);
    assert_eq!(writes[1].1.len(), 2);
    assert_eq!(store.snapshot().unwrap()[0].event.links, writes[1].1);
}

#[tokio::test]
async fn duplicate_pages_keep_the_richer_record() {
    let store = MemoryStore::new(vec![madrid_barca(vec![])]);
    let feed = MockFeed::new(vec![
        Some(vec![record("Real Madrid", "Barcelona", &[OK9_URL])]),
        Some(vec![record(
            "real madrid",
            "barcelona",
            &[OK9_URL, SOCO_URL, "https://hls.cdnok9.com/live/3.m3u8"],
        )]),
    ]);

    let report = run_pass(&feed, &store, &store, &settings(2), &mut StdRng::seed_from_u64(9))
        .await
        .unwrap();
    assert_eq!(report.fetched, 2);
    assert_eq!(report.unique, 1);

    let writes = store.writes.lock().unwrap();
    assert_eq!(writes.len(), 1);
    let links = &writes[0].1;
    assert_eq!(links.len(), 3);
    assert_eq!(links[0].url(), SOCO_URL);
    assert!(links[2].name().starts_with("SPORTIFy"));
}

#[tokio::test]
async fn raw_feed_is_audited_verbatim_before_dedup() {
    let store = MemoryStore::new(vec![]);
    let junk = json!({"unexpected": true});
    let page = vec![
        record("A", "B", &[SOCO_URL]),
        record("A", "B", &[SOCO_URL]),
        junk.clone(),
    ];
    let feed = MockFeed::new(vec![Some(page.clone())]);

    let report = run_pass(&feed, &store, &store, &settings(1), &mut StdRng::seed_from_u64(1))
        .await
        .unwrap();
    assert_eq!(report.fetched, 3);

    let audits = store.audits.lock().unwrap();
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].0, "01032025");
    assert_eq!(audits[0].1, page);
}

#[tokio::test]
async fn exhaustion_aborts_the_pass_before_any_write() {
    let store = MemoryStore::new(vec![madrid_barca(vec![])]);
    let feed = MockFeed::new(vec![
        Some(vec![record("Real Madrid", "Barcelona", &[SOCO_URL])]),
        None,
    ]);

    let err = run_pass(&feed, &store, &store, &settings(2), &mut StdRng::seed_from_u64(1))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("exhausted"));
    assert!(store.writes.lock().unwrap().is_empty());
    assert_eq!(store.load_count().unwrap(), 0);
}

#[tokio::test]
async fn empty_feed_never_touches_the_store() {
    let store = MemoryStore::new(vec![madrid_barca(vec![])]);
    let feed = MockFeed::new(vec![Some(vec![]), Some(vec![])]);

    let report = run_pass(&feed, &store, &store, &settings(2), &mut StdRng::seed_from_u64(1))
        .await
        .unwrap();
    assert_eq!(report, Default::default());
    assert_eq!(store.load_count().unwrap(), 0);
    assert!(store.audits.lock().unwrap().is_empty());

    let calls = feed.calls.lock().unwrap();
    assert_eq!(calls.iter().map(|c| c.1).collect::<Vec<_>>(), vec![1, 2]);
}

#[tokio::test]
async fn failed_write_is_counted_and_the_pass_goes_on() {
    let mut other = madrid_barca(vec![]);
    other.key = "-Nmatch2".into();
    other.event.team1_name = "Lyon".into();
    other.event.team2_name = "Nice".into();

    let store = MemoryStore::new(vec![madrid_barca(vec![]), other]).failing_on("-Nmatch1");
    let feed = MockFeed::new(vec![Some(vec![
        record("Real Madrid", "Barcelona", &[SOCO_URL]),
        record("Lyon", "Nice", &[OK9_URL]),
    ])]);

    let report = run_pass(&feed, &store, &store, &settings(1), &mut StdRng::seed_from_u64(1))
        .await
        .unwrap();
    assert_eq!(report.write_failures, 1);
    assert_eq!(report.updated, 1);
    let writes = store.writes.lock().unwrap();
    assert_eq!(writes[0].0, "-Nmatch2");
}
