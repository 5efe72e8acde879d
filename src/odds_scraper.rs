use scraper::Html;

use crate::{FetchError, config::OddsSelectors, text_manipulators::extract_text};

/// One bookmaker's prices for a market, in the order the page shows them.
#[derive(Debug, Clone, PartialEq)]
pub struct BookmakerOdds {
    pub bookmaker: String,
    pub odds: Vec<f64>,
}

impl BookmakerOdds {
    pub fn new(bookmaker: impl Into<String>, odds: Vec<f64>) -> Self {
        Self {
            bookmaker: bookmaker.into(),
            odds,
        }
    }
}

/// Pulls the odds table for a market out of a rendered event page.
pub struct OddsPageScraper<'a> {
    selectors: &'a OddsSelectors,
}

impl<'a> OddsPageScraper<'a> {
    pub fn new(selectors: &'a OddsSelectors) -> Self {
        Self { selectors }
    }

    pub fn scrape(&self, html: &str, market: &str) -> Result<Vec<BookmakerOdds>, FetchError> {
        let document = Html::parse_document(html);

        let offered = document
            .select(&self.selectors.market_item)
            .map(extract_text)
            .any(|item| item.eq_ignore_ascii_case(market.trim()));
        if !offered {
            return Err(FetchError::MarketUnavailable(market.to_string()));
        }

        let bookmakers: Vec<String> = document
            .select(&self.selectors.bookmaker)
            .map(extract_text)
            .collect();
        let odds: Vec<String> = document
            .select(&self.selectors.odds)
            .map(extract_text)
            .collect();

        pair_bookmakers_with_odds(bookmakers, &odds)
    }
}

/// Hands each bookmaker the next `odds.len() / bookmakers.len()` values in
/// document order. Pages where the values don't divide evenly are rejected
/// rather than paired off-by-some.
pub fn pair_bookmakers_with_odds(
    bookmakers: Vec<String>,
    odds: &[String],
) -> Result<Vec<BookmakerOdds>, FetchError> {
    if bookmakers.is_empty() {
        return Err(FetchError::NoBookmakers);
    }
    if odds.is_empty() || odds.len() % bookmakers.len() != 0 {
        return Err(FetchError::CountMismatch {
            bookmakers: bookmakers.len(),
            odds: odds.len(),
        });
    }

    let per_bookmaker = odds.len() / bookmakers.len();
    let values = odds
        .iter()
        .map(|text| parse_odds(text))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(bookmakers
        .into_iter()
        .zip(values.chunks(per_bookmaker))
        .map(|(bookmaker, run)| BookmakerOdds::new(bookmaker, run.to_vec()))
        .collect())
}

fn parse_odds(text: &str) -> Result<f64, FetchError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| FetchError::InvalidOdds(text.to_string()))
}
