//! Provider configuration.
//!
//! Base URLs for the dashboard backend and the market data service, plus
//! the request timeout. Values come from CLI flags or their environment
//! variables and are validated before any client is built.

use std::time::Duration;

use reqwest::Url;

use crate::error::{Error, Result};

/// Default base URL of the dashboard backend.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default base URL of the market data service.
pub const DEFAULT_MARKET_URL: &str = "https://finance-query.onrender.com/v1";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Validated endpoints and limits for [`crate::provider::HttpProvider`].
///
/// # Examples
///
/// ```
/// use marketpulse::config::ProviderConfig;
///
/// let config = ProviderConfig::new("http://localhost:8000/", "https://example.com/v1", 10)?;
/// assert_eq!(config.api_url(), "http://localhost:8000");
/// # Ok::<(), marketpulse::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    api_url: String,
    market_url: String,
    timeout: Duration,
}

impl ProviderConfig {
    /// Builds a config, rejecting malformed URLs and a zero timeout.
    ///
    /// Trailing slashes are stripped so routes can be appended directly.
    pub fn new(api_url: &str, market_url: &str, timeout_secs: u64) -> Result<Self> {
        if timeout_secs == 0 {
            return Err(Error::Config {
                message: "timeout must be at least 1 second".to_string(),
            });
        }

        Ok(Self {
            api_url: validate_base("api url", api_url)?,
            market_url: validate_base("market url", market_url)?,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Returns the dashboard backend base URL.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Returns the market data service base URL.
    #[must_use]
    pub fn market_url(&self) -> &str {
        &self.market_url
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            market_url: DEFAULT_MARKET_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

fn validate_base(what: &str, raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|e| Error::Config {
        message: format!("invalid {what} '{raw}': {e}"),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Config {
            message: format!("{what} must use http or https, got '{}'", url.scheme()),
        });
    }

    Ok(trimmed.to_string())
}
