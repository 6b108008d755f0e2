//! Market data trait definition.
//!
//! Defines the interface for the upstream sources behind every dashboard
//! view, so views and the gateway can run against the HTTP provider or an
//! in-memory fake.

use async_trait::async_trait;

use crate::core::{
    Event, Indicators, MarketIndex, MarketMovers, NewsItem, Period, PriceSample, Quote, Sentiment,
};
use crate::error::Result;

/// Trait for upstream market data sources.
///
/// Implementations reject blank required arguments with
/// [`crate::error::ProviderError::MissingParameter`] before doing any I/O.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetches the price series for `ticker` over `period`.
    ///
    /// Samples are not guaranteed to be in time order.
    ///
    /// # Errors
    ///
    /// Returns an error if `ticker` is blank or the upstream call fails.
    async fn price_history(&self, ticker: &str, period: Period) -> Result<Vec<PriceSample>>;

    /// Fetches the posts published by `author`.
    ///
    /// # Errors
    ///
    /// Returns an error if `author` is blank or the upstream call fails.
    async fn posts(&self, author: &str) -> Result<Vec<Event>>;

    /// Resolves an audio key to a playable URL.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is blank or the upstream call fails.
    async fn audio_url(&self, key: &str) -> Result<String>;

    /// Fetches the sentiment analysis for `ticker`.
    ///
    /// # Errors
    ///
    /// Returns an error if `ticker` is blank or the upstream call fails.
    async fn sentiment(&self, ticker: &str) -> Result<Sentiment>;

    /// Fetches the quote for `symbol`.
    ///
    /// # Errors
    ///
    /// Returns an error if `symbol` is blank, the upstream call fails, or
    /// upstream has no quote for it.
    async fn quote(&self, symbol: &str) -> Result<Quote>;

    /// Fetches technical indicators for `symbol`.
    ///
    /// # Errors
    ///
    /// Returns an error if `symbol` is blank or the upstream call fails.
    async fn indicators(&self, symbol: &str) -> Result<Indicators>;

    /// Fetches up to `count` gainers, losers, and most-active symbols.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the three lists cannot be fetched.
    async fn movers(&self, count: usize) -> Result<MarketMovers>;

    /// Fetches the major US indices.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream call fails.
    async fn indices(&self) -> Result<Vec<MarketIndex>>;

    /// Fetches general market news.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream call fails.
    async fn news(&self) -> Result<Vec<NewsItem>>;
}

/// Returns `value` trimmed, or a missing-parameter error if it is blank.
pub(crate) fn require<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::error::ProviderError::missing(name).into());
    }
    Ok(trimmed)
}
