//! Normalizing gateway in front of a [`MarketData`] source.
//!
//! Every request ends in a `(status, body)` pair. Validation failures answer
//! `400` without touching the upstream; upstream failures answer `500` with a
//! fixed per-endpoint message while the detail goes to the log only.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error};

use super::traits::MarketData;
use crate::core::Period;
use crate::error::{CommandError, Error};

/// Routes the gateway answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Price history; params `ticker`, optional `period`.
    Price,
    /// Posts by an author; param `author`.
    Posts,
    /// Audio lookup; param `key`.
    Tts,
    /// Sentiment analysis; param `ticker`.
    Sentiment,
}

impl Endpoint {
    /// All endpoints, in display order.
    pub const ALL: [Self; 4] = [Self::Price, Self::Posts, Self::Tts, Self::Sentiment];

    /// Returns the route name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Posts => "posts",
            Self::Tts => "tts",
            Self::Sentiment => "sentiment",
        }
    }

    const fn failure_message(self) -> &'static str {
        match self {
            Self::Price => "Failed to fetch stock data",
            Self::Posts => "Failed to fetch posts",
            Self::Tts => "Failed to fetch audio file",
            Self::Sentiment => "Failed to fetch sentiment data",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CommandError::UnknownEndpoint(s.to_string()).into())
    }
}

/// A normalized gateway reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// Payload on success, `{"error": ...}` otherwise.
    pub body: Value,
}

impl GatewayResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    /// Returns true for a 2xx status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns the error message of a failed reply.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}

/// Query parameters, keyed by name.
pub type Params = BTreeMap<String, String>;

fn param<'a>(params: &'a Params, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// Answers one gateway request against `source`.
///
/// # Examples
///
/// ```no_run
/// # async fn demo(source: &dyn marketpulse::provider::MarketData) {
/// use marketpulse::provider::{Endpoint, Params, dispatch};
///
/// let reply = dispatch(source, Endpoint::Posts, &Params::new()).await;
/// assert_eq!(reply.status, 400);
/// assert_eq!(reply.error_message(), Some("Author parameter is required"));
/// # }
/// ```
pub async fn dispatch<M>(source: &M, endpoint: Endpoint, params: &Params) -> GatewayResponse
where
    M: MarketData + ?Sized,
{
    debug!(%endpoint, ?params, "gateway request");

    let outcome: Result<Value, Error> = match endpoint {
        Endpoint::Price => {
            let Some(ticker) = param(params, "ticker") else {
                return GatewayResponse::error(400, "Ticker parameter is required");
            };
            let period = match param(params, "period").map(Period::from_str).transpose() {
                Ok(period) => period.unwrap_or_default(),
                Err(_) => return GatewayResponse::error(400, "Invalid period"),
            };
            source
                .price_history(ticker, period)
                .await
                .and_then(|samples| Ok(serde_json::to_value(samples)?))
        }
        Endpoint::Posts => {
            let Some(author) = param(params, "author") else {
                return GatewayResponse::error(400, "Author parameter is required");
            };
            source
                .posts(author)
                .await
                .and_then(|posts| Ok(serde_json::to_value(posts)?))
        }
        Endpoint::Tts => {
            let Some(key) = param(params, "key") else {
                return GatewayResponse::error(400, "Missing required query parameter 'key'");
            };
            source
                .audio_url(key)
                .await
                .map(|url| json!({ "audio_file": url }))
        }
        Endpoint::Sentiment => {
            let Some(ticker) = param(params, "ticker") else {
                return GatewayResponse::error(400, "Ticker parameter is required");
            };
            source
                .sentiment(ticker)
                .await
                .and_then(|sentiment| Ok(serde_json::to_value(sentiment)?))
        }
    };

    match outcome {
        Ok(body) => GatewayResponse::ok(body),
        Err(e) => {
            error!(%endpoint, error = %e, "gateway upstream failure");
            GatewayResponse::error(500, endpoint.failure_message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("price", Endpoint::Price)]
    #[test_case("POSTS", Endpoint::Posts)]
    #[test_case(" tts ", Endpoint::Tts)]
    #[test_case("sentiment", Endpoint::Sentiment)]
    fn test_endpoint_parse(raw: &str, expected: Endpoint) {
        assert_eq!(raw.parse::<Endpoint>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_endpoint() {
        let err = "stock".parse::<Endpoint>().unwrap_err();
        assert!(matches!(err, Error::Command(CommandError::UnknownEndpoint(_))));
    }

    #[test]
    fn test_response_helpers() {
        let reply = GatewayResponse::error(500, "Failed to fetch posts");
        assert!(!reply.is_success());
        assert_eq!(reply.error_message(), Some("Failed to fetch posts"));
        assert!(GatewayResponse::ok(json!([])).is_success());
    }

    #[test]
    fn test_blank_param_counts_as_missing() {
        let mut params = Params::new();
        params.insert("ticker".to_string(), "  ".to_string());
        assert_eq!(param(&params, "ticker"), None);
    }
}
