//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{DEFAULT_API_URL, DEFAULT_MARKET_URL, DEFAULT_TIMEOUT_SECS, ProviderConfig};
use crate::core::Period;
use crate::correlate::DEFAULT_CUTOFF_SECS;
use crate::error::Result;
use crate::refresh::{FAST_INTERVAL, INDICES_INTERVAL, MOVERS_INTERVAL, NEWS_INTERVAL};

/// Default author whose posts annotate charts.
pub const DEFAULT_AUTHOR: &str = "trump";

/// Default number of entries per movers list.
pub const DEFAULT_MOVERS_COUNT: usize = 25;

/// marketpulse: market dashboard in the terminal.
///
/// Quotes, sentiment, movers and news, price charts annotated with posts,
/// and a streaming chat assistant.
#[derive(Parser, Debug)]
#[command(name = "marketpulse")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Base URL of the dashboard backend.
    #[arg(long, env = "API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Base URL of the market data service.
    #[arg(long, env = "MARKET_API_URL", default_value = DEFAULT_MARKET_URL, global = true)]
    pub market_url: String,

    /// Request timeout in seconds.
    #[arg(long, env = "MARKETPULSE_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout: u64,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the quote and fundamentals for a symbol.
    Quote {
        /// Ticker symbol.
        symbol: String,
    },

    /// Show the sentiment analysis for a ticker.
    Sentiment {
        /// Ticker symbol.
        ticker: String,
    },

    /// Show technical indicators for a symbol.
    Indicators {
        /// Ticker symbol.
        symbol: String,
    },

    /// Show top gainers, losers, and most active symbols.
    Movers {
        /// Entries per list.
        #[arg(short = 'n', long, default_value_t = DEFAULT_MOVERS_COUNT)]
        count: usize,
    },

    /// Show the major US indices.
    Indices,

    /// Show market news.
    News {
        /// Maximum number of stories.
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Resolve an audio key to a playable URL.
    Audio {
        /// Audio key from a post.
        key: String,
    },

    /// Show a price series annotated with an author's posts.
    Chart {
        /// Ticker symbol.
        ticker: String,

        #[command(flatten)]
        chart: ChartArgs,
    },

    /// Poll a view and print every update.
    ///
    /// Stops on Ctrl-C or after `--ticks` updates.
    Watch {
        /// View to poll.
        #[arg(value_enum)]
        view: View,

        /// Symbol for per-symbol views.
        symbol: Option<String>,

        /// Seconds between fetches (defaults per view).
        #[arg(long)]
        interval: Option<u64>,

        /// Stop after this many updates.
        #[arg(long)]
        ticks: Option<usize>,

        #[command(flatten)]
        chart: ChartArgs,
    },

    /// Chat with the market assistant.
    ///
    /// With a message, sends one turn. Without, reads turns from stdin.
    Chat {
        /// Ticker the conversation is about.
        #[arg(short, long)]
        ticker: Option<String>,

        /// Message to send.
        message: Option<String>,
    },

    /// Call a gateway endpoint and print the normalized reply.
    Gateway {
        /// Endpoint name (price, posts, tts, sentiment).
        endpoint: String,

        /// Parameters as key=value pairs.
        params: Vec<String>,
    },
}

/// Options shared by the chart views.
#[derive(clap::Args, Debug, Clone)]
pub struct ChartArgs {
    /// Price history window (1d, 5d, 1mo).
    #[arg(long, default_value = "1d")]
    pub period: Period,

    /// Author whose posts annotate the chart.
    #[arg(long, default_value = DEFAULT_AUTHOR)]
    pub author: String,

    /// Maximum seconds between a post and its price sample.
    #[arg(long, default_value_t = DEFAULT_CUTOFF_SECS)]
    pub cutoff: u64,
}

/// Views that can be polled.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Quote for a symbol.
    Quote,
    /// Indicators for a symbol.
    Indicators,
    /// Sentiment for a ticker.
    Sentiment,
    /// Annotated price chart for a ticker.
    Chart,
    /// Market movers.
    Movers,
    /// Market indices.
    Indices,
    /// Market news.
    News,
}

impl View {
    /// Returns the view's default refresh interval.
    #[must_use]
    pub const fn default_interval(self) -> Duration {
        match self {
            Self::Quote | Self::Indicators | Self::Sentiment | Self::Chart => FAST_INTERVAL,
            Self::Movers => MOVERS_INTERVAL,
            Self::Indices => INDICES_INTERVAL,
            Self::News => NEWS_INTERVAL,
        }
    }

    /// Returns true if the view needs a symbol.
    #[must_use]
    pub const fn needs_symbol(self) -> bool {
        matches!(
            self,
            Self::Quote | Self::Indicators | Self::Sentiment | Self::Chart
        )
    }

    /// Returns the log label for the view.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Indicators => "indicators",
            Self::Sentiment => "sentiment",
            Self::Chart => "chart",
            Self::Movers => "movers",
            Self::Indices => "indices",
            Self::News => "news",
        }
    }
}

impl Cli {
    /// Builds the validated provider configuration from the flags.
    pub fn provider_config(&self) -> Result<ProviderConfig> {
        ProviderConfig::new(&self.api_url, &self.market_url, self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["marketpulse", "indices"]).unwrap();
        assert_eq!(cli.timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(cli.format, "text");
        assert!(cli.provider_config().is_ok());
    }

    #[test]
    fn test_chart_args() {
        let cli = Cli::try_parse_from([
            "marketpulse",
            "chart",
            "TSLA",
            "--period",
            "5d",
            "--cutoff",
            "60",
        ])
        .unwrap();
        let Commands::Chart { ticker, chart } = cli.command else {
            panic!("expected chart command");
        };
        assert_eq!(ticker, "TSLA");
        assert_eq!(chart.period, Period::FiveDay);
        assert_eq!(chart.author, DEFAULT_AUTHOR);
        assert_eq!(chart.cutoff, 60);
    }

    #[test]
    fn test_bad_period_rejected() {
        assert!(Cli::try_parse_from(["marketpulse", "chart", "TSLA", "--period", "2y"]).is_err());
    }

    #[test]
    fn test_view_intervals() {
        assert_eq!(View::Quote.default_interval(), FAST_INTERVAL);
        assert_eq!(View::Movers.default_interval(), Duration::from_secs(900));
        assert_eq!(View::News.default_interval(), Duration::from_secs(600));
        assert!(!View::News.needs_symbol());
        assert!(View::Chart.needs_symbol());
    }
}
