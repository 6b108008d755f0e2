//! Periodic refresh of polled views.
//!
//! Provides the stale-while-error state container and the background loop
//! that drives it.

pub mod poller;
pub mod state;

pub use poller::Poller;
pub use state::{Applied, RefreshState};

use std::time::Duration;

/// Default interval for fast-moving views: quote, indicators, sentiment, chart.
pub const FAST_INTERVAL: Duration = Duration::from_secs(15);

/// Default interval for market movers.
pub const MOVERS_INTERVAL: Duration = Duration::from_secs(900);

/// Default interval for market indices.
pub const INDICES_INTERVAL: Duration = Duration::from_secs(900);

/// Default interval for news.
pub const NEWS_INTERVAL: Duration = Duration::from_secs(600);
