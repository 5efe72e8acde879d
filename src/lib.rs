mod fetch_error;
mod ratelimit;
mod requests;
mod sport;
mod text_manipulators;

pub mod browser;
pub mod collector;
pub mod config;
pub mod event_list_scraper;
pub mod hunt;
pub mod ledger;
pub mod odds_scraper;
pub mod scraping_context;

pub use browser::{BrowserSession, PageRenderer};
pub use collector::{Collector, SiteCollector};
pub use fetch_error::FetchError;
pub use hunt::{HuntParams, HuntSummary, hunt};
pub use ledger::{Ledger, NO_DATA_BOOKMAKER, OddsRecord};
pub use odds_scraper::BookmakerOdds;
pub use scraping_context::ScrapingContext;
pub use sport::Sport;
pub use text_manipulators::{format_event_date, parse_event_date};
