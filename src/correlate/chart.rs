//! Loads the two inputs of a chart and correlates them.

use tracing::{info, warn};

use super::correlator::{Correlation, CorrelatorConfig, correlate};
use crate::core::Period;
use crate::error::Result;
use crate::provider::MarketData;

/// What to draw: a ticker's prices annotated with one author's posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    /// Security to chart.
    pub ticker: String,
    /// Price history window.
    pub period: Period,
    /// Whose posts to pin onto the series.
    pub author: String,
    /// Matching parameters.
    pub config: CorrelatorConfig,
}

/// Fetches prices and posts concurrently, then correlates them.
///
/// A price failure fails the chart. A posts failure only drops the
/// annotations: the series is still drawn and the failure is kept in
/// [`Correlation::posts_error`].
///
/// # Errors
///
/// Returns an error if the price history cannot be fetched.
pub async fn load_chart<M>(source: &M, request: &ChartRequest) -> Result<Correlation>
where
    M: MarketData + ?Sized,
{
    let (samples, posts) = tokio::join!(
        source.price_history(&request.ticker, request.period),
        source.posts(&request.author),
    );
    let samples = samples?;

    let (events, posts_error) = match posts {
        Ok(events) => (events, None),
        Err(e) => {
            warn!(
                author = %request.author,
                error = %e,
                "posts unavailable, charting prices only"
            );
            (Vec::new(), Some(e.to_string()))
        }
    };

    let mut correlation = correlate(&samples, &events, &request.config);
    correlation.posts_error = posts_error;
    info!(
        ticker = %request.ticker,
        period = %request.period,
        samples = correlation.samples.len(),
        attached = correlation.attached,
        "chart loaded"
    );
    Ok(correlation)
}
