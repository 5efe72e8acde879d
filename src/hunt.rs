use chrono::NaiveDate;
use log::{debug, info, warn};

use crate::{
    Collector, Ledger, Sport,
    text_manipulators::format_event_date,
};

/// What to hunt for.
#[derive(Debug, Clone)]
pub struct HuntParams {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub sport: Sport,
    pub market: String,
    /// `None` visits every event the listing returns.
    pub max_urls_per_day: Option<usize>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HuntSummary {
    pub days: usize,
    pub urls: usize,
    pub odds_rows: usize,
    pub no_data_rows: usize,
}

/// Walks `[start, end]` a day at a time and stores the odds of every event
/// found. Pages that yield nothing get a single `N/A` row. Writes are flushed
/// once at the end.
pub async fn hunt<C: Collector + ?Sized>(
    collector: &C,
    ledger: &mut Ledger,
    params: &HuntParams,
) -> anyhow::Result<HuntSummary> {
    let (start, end) = if params.end < params.start {
        (params.end, params.start)
    } else {
        (params.start, params.end)
    };
    let mut summary = HuntSummary::default();

    ledger.ensure_schema().await?;

    for date in start.iter_days().take_while(|date| *date <= end) {
        let day = format_event_date(date);
        summary.days += 1;

        let urls = match collector.list_event_urls(date, params.sport).await {
            Ok(urls) => urls,
            Err(e) => {
                warn!("Couldn't list {} events for {}: {:#}", params.sport, day, e);
                Vec::new()
            }
        };
        let limit = params.max_urls_per_day.unwrap_or(usize::MAX);
        info!(
            "{}: {} {} events listed, visiting {}",
            day,
            urls.len(),
            params.sport,
            urls.len().min(limit)
        );

        for url in urls.iter().take(limit) {
            summary.urls += 1;
            match collector.fetch_odds(url, &params.market).await {
                Ok(table) if !table.is_empty() => {
                    debug!("{} bookmakers on {}", table.len(), url);
                    for row in &table {
                        ledger
                            .upsert(url, &day, &params.market, &row.bookmaker, &row.odds)
                            .await?;
                        summary.odds_rows += 1;
                    }
                }
                Ok(_) => {
                    warn!("No {} odds on {}", params.market, url);
                    ledger.upsert_no_data(url, &day, &params.market).await?;
                    summary.no_data_rows += 1;
                }
                Err(e) => {
                    warn!("No {} odds on {}: {}", params.market, url, e);
                    ledger.upsert_no_data(url, &day, &params.market).await?;
                    summary.no_data_rows += 1;
                }
            }
        }
    }

    ledger.flush().await?;
    Ok(summary)
}
