//! Market data models.
//!
//! Typed views over the upstream JSON payloads. Records with an open-ended
//! upstream shape keep their known fields typed and collect everything else
//! into an `extra` map, so new upstream fields stay representable without
//! weakening the required ones.

use crate::error::ProviderError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Unknown upstream fields, keyed by field name.
pub type Extra = BTreeMap<String, Value>;

/// Technical indicators: indicator name to field/value table.
pub type Indicators = BTreeMap<String, BTreeMap<String, Value>>;

/// Price history window requested from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Period {
    /// Intraday.
    #[default]
    #[serde(rename = "1d")]
    OneDay,
    /// Five trading days.
    #[serde(rename = "5d")]
    FiveDay,
    /// One month.
    #[serde(rename = "1mo")]
    OneMonth,
}

impl Period {
    /// Returns the query-string value for this period.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::FiveDay => "5d",
            Self::OneMonth => "1mo",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1d" => Ok(Self::OneDay),
            "5d" => Ok(Self::FiveDay),
            "1mo" => Ok(Self::OneMonth),
            other => Err(format!("unknown period '{other}' (expected 1d, 5d, 1mo)")),
        }
    }
}

/// One point of a price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    /// Closing price of the bar.
    pub price: f64,
    /// Traded volume.
    pub volume: u64,
    /// Opening price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Extra per-bar fields from upstream.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: Extra,
}

impl PriceSample {
    /// Creates a flat bar where open, high, low and close are all `price`.
    #[must_use]
    pub const fn flat(timestamp: i64, price: f64) -> Self {
        Self {
            timestamp,
            price,
            volume: 0,
            open: price,
            high: price,
            low: price,
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpstreamBar {
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume", default, deserialize_with = "de_volume")]
    volume: u64,
    #[serde(flatten)]
    extra: Extra,
}

/// Decodes the backend's `{ "<timestamp>": { Open, High, Low, Close, Volume } }`
/// price payload.
///
/// Samples come back in key order; callers that need time order sort them
/// (the correlator does).
///
/// # Errors
///
/// Returns [`ProviderError::Decode`] if the payload is not an object of bars
/// or a key is not an integer timestamp.
///
/// # Examples
///
/// ```
/// use marketpulse::core::decode_price_history;
///
/// let json = serde_json::json!({
///     "1700000000": {"Open": 1.0, "High": 2.0, "Low": 0.5, "Close": 1.5, "Volume": 100}
/// });
/// let samples = decode_price_history(json).unwrap();
/// assert_eq!(samples[0].timestamp, 1_700_000_000);
/// assert_eq!(samples[0].price, 1.5);
/// ```
pub fn decode_price_history(payload: Value) -> Result<Vec<PriceSample>, ProviderError> {
    let bars: BTreeMap<String, UpstreamBar> = serde_json::from_value(payload)?;

    bars.into_iter()
        .map(|(key, bar)| {
            let timestamp = key
                .trim()
                .parse::<i64>()
                .map_err(|_| ProviderError::Decode(format!("invalid timestamp key: {key}")))?;
            Ok(PriceSample {
                timestamp,
                price: bar.close,
                volume: bar.volume,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                extra: bar.extra,
            })
        })
        .collect()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn de_volume<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw.map_or(0, |v| if v.is_finite() && v > 0.0 { v as u64 } else { 0 }))
}

/// A security quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Ticker symbol.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Last price, as formatted by upstream.
    pub price: String,
    /// Absolute change.
    #[serde(default)]
    pub change: Option<String>,
    /// Percent change.
    #[serde(default)]
    pub percent_change: Option<String>,
    /// Session open.
    #[serde(default)]
    pub open: Option<String>,
    /// Session high.
    #[serde(default)]
    pub high: Option<String>,
    /// Session low.
    #[serde(default)]
    pub low: Option<String>,
    /// 52-week high.
    #[serde(default)]
    pub year_high: Option<String>,
    /// 52-week low.
    #[serde(default)]
    pub year_low: Option<String>,
    /// Session volume.
    #[serde(default)]
    pub volume: Option<f64>,
    /// Average volume.
    #[serde(default)]
    pub avg_volume: Option<f64>,
    /// Market capitalisation.
    #[serde(default)]
    pub market_cap: Option<String>,
    /// Price/earnings ratio.
    #[serde(default)]
    pub pe: Option<String>,
    /// Earnings per share.
    #[serde(default)]
    pub eps: Option<String>,
    /// Sector.
    #[serde(default)]
    pub sector: Option<String>,
    /// Industry.
    #[serde(default)]
    pub industry: Option<String>,
    /// Company description.
    #[serde(default)]
    pub about: Option<String>,
    /// Any other upstream field.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Sentiment bucket derived from a score in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentCategory {
    /// Score below 0.4.
    Bearish,
    /// Score between 0.4 and 0.6 inclusive.
    Neutral,
    /// Score above 0.6.
    Bullish,
}

impl SentimentCategory {
    /// Buckets a sentiment score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score < 0.4 {
            Self::Bearish
        } else if score > 0.6 {
            Self::Bullish
        } else {
            Self::Neutral
        }
    }
}

impl fmt::Display for SentimentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Bearish => "Bearish",
            Self::Neutral => "Neutral",
            Self::Bullish => "Bullish",
        };
        f.write_str(label)
    }
}

/// A cited sentiment driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPoint {
    /// Summary of the point.
    pub point: String,
    /// Source link.
    #[serde(default)]
    pub url: String,
}

/// Sentiment analysis for a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// Score in `[0, 1]`.
    pub sentiment_score: f64,
    /// Supporting points.
    #[serde(default)]
    pub key_points: Vec<KeyPoint>,
}

impl Sentiment {
    /// Returns the bucket for this score.
    #[must_use]
    pub fn category(&self) -> SentimentCategory {
        SentimentCategory::from_score(self.sentiment_score)
    }
}

/// A gainer, loser, or most-active entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mover {
    /// Ticker symbol.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Last price.
    pub price: String,
    /// Absolute change.
    pub change: String,
    /// Percent change.
    pub percent_change: String,
}

/// The three movers lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketMovers {
    /// Top gainers.
    pub gainers: Vec<Mover>,
    /// Top losers.
    pub losers: Vec<Mover>,
    /// Most actively traded.
    pub actives: Vec<Mover>,
}

/// A market index snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketIndex {
    /// Index name.
    pub name: String,
    /// Index level.
    pub value: f64,
    /// Absolute change.
    #[serde(default)]
    pub change: String,
    /// Percent change.
    #[serde(default)]
    pub percent_change: String,
    /// Return figures and anything else upstream adds.
    #[serde(flatten)]
    pub extra: Extra,
}

/// A market news headline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Headline.
    pub title: String,
    /// Article link.
    pub link: String,
    /// Publisher.
    #[serde(default)]
    pub source: String,
    /// Relative or absolute publish time, as upstream formats it.
    #[serde(default)]
    pub time: String,
    /// Thumbnail.
    #[serde(default)]
    pub img: Option<String>,
    /// Other upstream fields.
    #[serde(flatten)]
    pub extra: Extra,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_price_history() {
        let payload = json!({
            "1700000060": {
                "Open": 2.0, "High": 3.0, "Low": 1.0, "Close": 2.5, "Volume": 10, "Dividends": 0.0
            },
            "1700000000": {"Open": 1.0, "High": 2.0, "Low": 0.5, "Close": 1.5, "Volume": 20.0}
        });
        let mut samples = decode_price_history(payload).unwrap();
        samples.sort_by_key(|s| s.timestamp);

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].timestamp, 1_700_000_000);
        assert_eq!(samples[0].volume, 20);
        assert_eq!(samples[1].price, 2.5);
        assert_eq!(samples[1].extra.get("Dividends"), Some(&json!(0.0)));
    }

    #[test]
    fn test_decode_price_history_bad_key() {
        let payload = json!({"yesterday": {"Open": 1.0, "High": 1.0, "Low": 1.0, "Close": 1.0}});
        let err = decode_price_history(payload).unwrap_err();
        assert!(matches!(err, ProviderError::Decode(msg) if msg.contains("yesterday")));
    }

    #[test]
    fn test_decode_price_history_not_object() {
        assert!(decode_price_history(json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("5d".parse::<Period>(), Ok(Period::FiveDay));
        assert_eq!("1MO".parse::<Period>(), Ok(Period::OneMonth));
        assert!("1y".parse::<Period>().is_err());
        assert_eq!(Period::default().to_string(), "1d");
    }

    #[test]
    fn test_quote_keeps_unknown_fields() {
        let quote: Quote = serde_json::from_value(json!({
            "symbol": "AAPL",
            "name": "Apple Inc.",
            "price": "190.12",
            "percentChange": "+1.2%",
            "volume": 1234,
            "nav": "n/a",
            "fiveDaysReturn": "2%"
        }))
        .unwrap();

        assert_eq!(quote.percent_change.as_deref(), Some("+1.2%"));
        assert_eq!(quote.volume, Some(1234.0));
        assert_eq!(quote.extra.get("nav"), Some(&json!("n/a")));
        assert_eq!(quote.extra.len(), 2);
    }

    #[test]
    fn test_quote_requires_price() {
        let result: Result<Quote, _> =
            serde_json::from_value(json!({"symbol": "AAPL", "name": "Apple"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_sentiment_category_bounds() {
        assert_eq!(SentimentCategory::from_score(0.39), SentimentCategory::Bearish);
        assert_eq!(SentimentCategory::from_score(0.4), SentimentCategory::Neutral);
        assert_eq!(SentimentCategory::from_score(0.6), SentimentCategory::Neutral);
        assert_eq!(SentimentCategory::from_score(0.61), SentimentCategory::Bullish);
    }

    #[test]
    fn test_sentiment_decode() {
        let s: Sentiment = serde_json::from_value(json!({
            "sentiment_score": 0.72,
            "key_points": [{"point": "Strong earnings", "url": "https://example.com"}]
        }))
        .unwrap();
        assert_eq!(s.category(), SentimentCategory::Bullish);
        assert_eq!(s.key_points.len(), 1);
    }
}
