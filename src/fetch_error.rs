use thiserror::Error;

/// Why an event page produced no odds.
///
/// The hunt treats every variant the same way (a `N/A` row), the variants only
/// exist so the logs can tell a slow page from a market that isn't offered.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timed out after {0}s waiting for page content")]
    Timeout(u64),

    #[error("market {0:?} is not offered on this page")]
    MarketUnavailable(String),

    #[error("no bookmakers found on page")]
    NoBookmakers,

    #[error("{odds} odds values can't be split evenly across {bookmakers} bookmakers")]
    CountMismatch { bookmakers: usize, odds: usize },

    #[error("couldn't parse odds value {0:?}")]
    InvalidOdds(String),

    /// Launch, navigation and CDP failures, network errors included.
    #[error("browser error: {0}")]
    Browser(String),
}
