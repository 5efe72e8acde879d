use std::{num::NonZeroU32, time::Duration};

use anyhow::Context;
use chrono::NaiveDate;
use scraper::Selector;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    Sport,
    text_manipulators::{format_event_date, parse_event_date},
};

const DEFAULT_SITE_ORIGIN: &str = "https://www.oddsportal.com";

/// The env config env vars needed for scraping. All of them have defaults.
#[derive(Debug, Deserialize)]
pub struct ScrapingEnv {
    #[serde(default = "default_site_origin")]
    site_origin: String,
    // Defaults to the nextgames endpoint under `site_origin`.
    #[serde(default)]
    event_list_url: Option<String>,
    #[serde(default = "default_market_url_template")]
    market_url_template: String,
    #[serde(default = "default_market_item_selector")]
    market_item_selector: String,
    #[serde(default = "default_bookmaker_selector")]
    bookmaker_selector: String,
    #[serde(default = "default_odds_selector")]
    odds_selector: String,
    #[serde(default = "default_page_timeout_secs")]
    page_timeout_secs: u64,
    #[serde(default = "default_requests_per_sec")]
    requests_per_sec: u32,
    #[serde(default = "default_headless")]
    headless: bool,
}

fn default_site_origin() -> String {
    DEFAULT_SITE_ORIGIN.to_string()
}

fn default_market_url_template() -> String {
    "{url}#{market}".to_string()
}

fn default_market_item_selector() -> String {
    "li.odds-item".to_string()
}

fn default_bookmaker_selector() -> String {
    "a.bookmaker-name p".to_string()
}

fn default_odds_selector() -> String {
    "div.odds-cell p".to_string()
}

fn default_page_timeout_secs() -> u64 {
    5
}

fn default_requests_per_sec() -> u32 {
    2
}

fn default_headless() -> bool {
    true
}

/// Parsed CSS selectors for the rendered event page.
#[derive(Debug, Clone)]
pub struct OddsSelectors {
    /// Kept as text as well, the browser waits on these before we parse anything.
    pub market_item_css: String,
    pub bookmaker_css: String,
    pub market_item: Selector,
    pub bookmaker: Selector,
    pub odds: Selector,
}

impl OddsSelectors {
    pub fn new(market_item: &str, bookmaker: &str, odds: &str) -> anyhow::Result<Self> {
        Ok(Self {
            market_item_css: market_item.to_string(),
            bookmaker_css: bookmaker.to_string(),
            market_item: parse_selector(market_item)?,
            bookmaker: parse_selector(bookmaker)?,
            odds: parse_selector(odds)?,
        })
    }

    /// Selectors that must all match before the page counts as rendered.
    pub fn render_wait(&self) -> [&str; 2] {
        [&self.market_item_css, &self.bookmaker_css]
    }
}

fn parse_selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("invalid selector {:?}: {:?}", css, e))
}

pub struct ScrapingConfig {
    site_origin: String,
    event_list_url: String,
    market_url_template: String,
    pub selectors: OddsSelectors,
    pub page_timeout: Duration,
    pub requests_per_sec: NonZeroU32,
    pub headless: bool,
}

impl ScrapingConfig {
    pub fn new() -> anyhow::Result<Self> {
        let scraping_env = ScrapingEnv::load_from_env()?;
        Self::from_env(scraping_env)
    }

    pub fn from_env(scraping_env: ScrapingEnv) -> anyhow::Result<Self> {
        let site_origin = scraping_env.site_origin.trim_end_matches('/').to_string();
        let event_list_url = scraping_env.event_list_url.unwrap_or_else(|| {
            format!("{}/ajax-nextgames/{{sport_id}}/-4/1/{{date}}/yje83.dat", site_origin)
        });
        let selectors = OddsSelectors::new(
            &scraping_env.market_item_selector,
            &scraping_env.bookmaker_selector,
            &scraping_env.odds_selector,
        )?;
        let requests_per_sec = NonZeroU32::new(scraping_env.requests_per_sec)
            .context("REQUESTS_PER_SEC must be greater than zero")?;
        Ok(Self {
            site_origin,
            event_list_url,
            market_url_template: scraping_env.market_url_template,
            selectors,
            page_timeout: Duration::from_secs(scraping_env.page_timeout_secs),
            requests_per_sec,
            headless: scraping_env.headless,
        })
    }

    pub fn site_origin(&self) -> &str {
        &self.site_origin
    }

    pub fn get_event_list_url(&self, sport: Sport, date: NaiveDate) -> String {
        self.event_list_url
            .replace("{sport_id}", &sport.id().to_string())
            .replace("{sport}", sport.name())
            .replace("{date}", &format_event_date(date))
    }

    pub fn get_referer(&self, sport: Sport, date: NaiveDate) -> String {
        format!(
            "{}/matches/{}/{}/",
            self.site_origin,
            sport.name(),
            format_event_date(date)
        )
    }

    pub fn get_market_url(&self, url: &str, market: &str) -> String {
        self.market_url_template
            .replace("{url}", url)
            .replace("{market}", market)
    }
}

/// The env config env vars needed to run a hunt and store what it finds.
#[derive(Debug, Deserialize)]
pub struct HuntEnv {
    pub hunt_start: String,
    pub hunt_end: String,
    #[serde(default = "default_sport")]
    pub hunt_sport: String,
    #[serde(default = "default_market")]
    pub hunt_market: String,
    #[serde(default)]
    pub max_urls_per_day: Option<usize>,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default)]
    pub commit_everything: bool,
}

fn default_sport() -> String {
    "football".to_string()
}

fn default_market() -> String {
    "1X2".to_string()
}

fn default_database_url() -> String {
    "sqlite://odds.db".to_string()
}

impl HuntEnv {
    pub fn params(&self) -> anyhow::Result<crate::HuntParams> {
        Ok(crate::HuntParams {
            start: parse_event_date(&self.hunt_start).context("bad HUNT_START")?,
            end: parse_event_date(&self.hunt_end).context("bad HUNT_END")?,
            sport: self.hunt_sport.parse()?,
            market: self.hunt_market.clone(),
            max_urls_per_day: self.max_urls_per_day,
        })
    }
}

// Extension trait.
pub trait LoadFromEnv: DeserializeOwned {
    fn load_from_env() -> anyhow::Result<Self> {
        // Don't throw an error if .env file doesn't exist.
        let _ = dotenv::dotenv();
        let config =
            envy::from_env::<Self>().context("failed to load env variables into config struct")?;
        Ok(config)
    }
}

impl<T: DeserializeOwned> LoadFromEnv for T {}
