use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    FetchError, Sport,
    browser::{BrowserSession, PageRenderer},
    event_list_scraper::EventListScraper,
    odds_scraper::{BookmakerOdds, OddsPageScraper},
    scraping_context::ScrapingContext,
};

/// Where the hunt gets its urls and odds from.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Absolute urls of the event pages for `sport` on `date`.
    async fn list_event_urls(&self, date: NaiveDate, sport: Sport) -> anyhow::Result<Vec<String>>;

    /// The market's odds table on the page at `url`. Any error means "no data".
    async fn fetch_odds(&self, url: &str, market: &str) -> Result<Vec<BookmakerOdds>, FetchError>;
}

/// Scrapes the live site: JSON endpoint for listings, rendered pages for odds.
pub struct SiteCollector<R = BrowserSession> {
    ctx: ScrapingContext,
    renderer: R,
}

impl SiteCollector<BrowserSession> {
    /// Opens the browser session this collector renders pages with.
    pub async fn open(ctx: ScrapingContext) -> anyhow::Result<Self> {
        let renderer = BrowserSession::open(ctx.scraping_config.headless).await?;
        Ok(Self::with_renderer(ctx, renderer))
    }

    pub async fn close(self) -> anyhow::Result<()> {
        self.renderer.close().await
    }
}

impl<R: PageRenderer> SiteCollector<R> {
    pub fn with_renderer(ctx: ScrapingContext, renderer: R) -> Self {
        Self { ctx, renderer }
    }
}

#[async_trait]
impl<R: PageRenderer> Collector for SiteCollector<R> {
    async fn list_event_urls(&self, date: NaiveDate, sport: Sport) -> anyhow::Result<Vec<String>> {
        EventListScraper::new(&self.ctx).scrape(date, sport).await
    }

    async fn fetch_odds(&self, url: &str, market: &str) -> Result<Vec<BookmakerOdds>, FetchError> {
        let config = &self.ctx.scraping_config;
        let html = self
            .renderer
            .render(
                &config.get_market_url(url, market),
                &config.selectors.render_wait(),
                config.page_timeout,
            )
            .await?;
        OddsPageScraper::new(&config.selectors).scrape(&html, market)
    }
}
