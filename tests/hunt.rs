use std::{
    collections::HashMap,
    sync::Mutex,
};

use async_trait::async_trait;
use chrono::NaiveDate;
use odds_hunter::{
    BookmakerOdds, Collector, FetchError, HuntParams, Ledger, Sport, hunt,
};
use tempfile::TempDir;

/// Hands out fixed listings and odds tables, and remembers what it was asked.
#[derive(Default)]
struct StubCollector {
    listings: HashMap<NaiveDate, Vec<String>>,
    tables: HashMap<String, Vec<BookmakerOdds>>,
    failing_days: Vec<NaiveDate>,
    listed: Mutex<Vec<NaiveDate>>,
    fetched: Mutex<Vec<String>>,
}

impl StubCollector {
    fn list(mut self, date: NaiveDate, urls: &[&str]) -> Self {
        self.listings
            .insert(date, urls.iter().map(|u| u.to_string()).collect());
        self
    }

    fn odds(mut self, url: &str, table: Vec<BookmakerOdds>) -> Self {
        self.tables.insert(url.to_string(), table);
        self
    }

    fn failing(mut self, date: NaiveDate) -> Self {
        self.failing_days.push(date);
        self
    }
}

#[async_trait]
impl Collector for StubCollector {
    async fn list_event_urls(&self, date: NaiveDate, _sport: Sport) -> anyhow::Result<Vec<String>> {
        self.listed.lock().unwrap().push(date);
        if self.failing_days.contains(&date) {
            anyhow::bail!("listing endpoint unreachable");
        }
        Ok(self.listings.get(&date).cloned().unwrap_or_default())
    }

    async fn fetch_odds(&self, url: &str, market: &str) -> Result<Vec<BookmakerOdds>, FetchError> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.tables
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::MarketUnavailable(market.to_string()))
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 5, d).unwrap()
}

fn params(start: NaiveDate, end: NaiveDate) -> HuntParams {
    HuntParams {
        start,
        end,
        sport: Sport::Football,
        market: "1X2".to_string(),
        max_urls_per_day: None,
    }
}

async fn setup_ledger(commit_everything: bool) -> (Ledger, String, TempDir) {
    let tmp = TempDir::new().unwrap();
    let url = format!("sqlite://{}", tmp.path().join("odds.db").display());
    let ledger = Ledger::connect(&url, commit_everything).await.unwrap();
    (ledger, url, tmp)
}

#[tokio::test]
async fn one_day_hunt_stores_every_bookmaker_and_sentinel() {
    let collector = StubCollector::default()
        .list(day(16), &["https://x/a", "https://x/b"])
        .odds(
            "https://x/a",
            vec![
                BookmakerOdds::new("BookA", vec![1.5, 3.2, 2.1]),
                BookmakerOdds::new("BookB", vec![1.4, 3.4, 2.3]),
            ],
        );
    let (mut ledger, url, _tmp) = setup_ledger(false).await;

    let summary = hunt(&collector, &mut ledger, &params(day(16), day(16)))
        .await
        .unwrap();
    drop(ledger);

    assert_eq!(summary.days, 1);
    assert_eq!(summary.urls, 2);
    assert_eq!(summary.odds_rows, 2);
    assert_eq!(summary.no_data_rows, 1);

    // The single flush at the end made everything durable.
    let mut reopened = Ledger::connect(&url, true).await.unwrap();
    let records = reopened.records().await.unwrap();
    let rows: Vec<_> = records
        .iter()
        .map(|r| (r.link.as_str(), r.bookmaker.as_str(), r.date.as_str(), r.odds()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("https://x/a", "BookA", "20230516", [Some(1.5), Some(3.2), Some(2.1)]),
            ("https://x/a", "BookB", "20230516", [Some(1.4), Some(3.4), Some(2.3)]),
            ("https://x/b", "N/A", "20230516", [None, None, None]),
        ]
    );
    assert!(records.iter().all(|r| r.market.as_deref() == Some("1X2")));
}

#[tokio::test]
async fn reversed_range_is_walked_forwards() {
    let collector = StubCollector::default();
    let (mut ledger, _url, _tmp) = setup_ledger(true).await;

    let summary = hunt(&collector, &mut ledger, &params(day(16), day(14)))
        .await
        .unwrap();

    assert_eq!(summary.days, 3);
    assert_eq!(*collector.listed.lock().unwrap(), vec![day(14), day(15), day(16)]);
    assert_eq!(ledger.count().await.unwrap(), 0);
}

#[tokio::test]
async fn max_urls_per_day_caps_fetches() {
    let urls: Vec<String> = (0..5).map(|i| format!("https://x/{}", i)).collect();
    let url_refs: Vec<&str> = urls.iter().map(String::as_str).collect();
    let collector = StubCollector::default()
        .list(day(14), &url_refs)
        .list(day(15), &url_refs[..1]);
    let (mut ledger, _url, _tmp) = setup_ledger(true).await;

    let mut capped = params(day(14), day(15));
    capped.max_urls_per_day = Some(2);
    let summary = hunt(&collector, &mut ledger, &capped).await.unwrap();

    assert_eq!(summary.urls, 3);
    assert_eq!(
        *collector.fetched.lock().unwrap(),
        vec!["https://x/0", "https://x/1", "https://x/0"]
    );
    // https://x/0 was seen on both days, the later date wins.
    let records = ledger.records_for_link("https://x/0").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].date, "20230515");
}

#[tokio::test]
async fn listing_failures_skip_the_day() {
    let collector = StubCollector::default()
        .failing(day(14))
        .list(day(15), &["https://x/a"])
        .odds("https://x/a", vec![BookmakerOdds::new("BookA", vec![1.9, 1.9])]);
    let (mut ledger, _url, _tmp) = setup_ledger(true).await;

    let summary = hunt(&collector, &mut ledger, &params(day(14), day(15)))
        .await
        .unwrap();

    assert_eq!(summary.days, 2);
    assert_eq!(summary.urls, 1);
    let records = ledger.records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].odds(), [Some(1.9), Some(1.9), None]);
}

#[tokio::test]
async fn rerunning_a_range_overwrites_in_place() {
    let first = StubCollector::default()
        .list(day(16), &["https://x/a"])
        .odds("https://x/a", vec![BookmakerOdds::new("BookA", vec![1.5, 3.2, 2.1])]);
    let second = StubCollector::default()
        .list(day(16), &["https://x/a"])
        .odds("https://x/a", vec![BookmakerOdds::new("BookA", vec![1.6, 3.0, 2.2])]);
    let (mut ledger, _url, _tmp) = setup_ledger(false).await;

    hunt(&first, &mut ledger, &params(day(16), day(16))).await.unwrap();
    hunt(&second, &mut ledger, &params(day(16), day(16))).await.unwrap();

    let records = ledger.records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].odds(), [Some(1.6), Some(3.0), Some(2.2)]);
}
