//! # marketpulse
//!
//! Market dashboard client for the terminal.
//!
//! marketpulse talks to a dashboard backend and a public market data service
//! and renders what a browser dashboard would: quotes, sentiment, movers,
//! indices, news, price charts annotated with social-media posts, and a
//! streaming chat assistant.
//!
//! ## Features
//!
//! - **Streaming chat**: incremental, UTF-8 safe assembly of chunked replies
//! - **Correlation**: posts pinned onto the nearest price sample within a cutoff
//! - **Polling**: stale-while-error refresh loops with out-of-order protection
//! - **Gateway**: normalized `{status, body}` replies in front of the providers

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![warn(unsafe_code)]

pub mod cli;
pub mod config;
pub mod core;
pub mod correlate;
pub mod error;
pub mod io;
pub mod provider;
pub mod refresh;
pub mod stream;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use crate::core::{ChatMessage, ChatRequest, Conversation, Event, Period, PriceSample, Role};

// Re-export streaming types
pub use stream::{ChatBackend, ChatObserver, ChatSession, ResponseAssembler, Submission};

// Re-export correlation types
pub use correlate::{Correlation, CorrelatorConfig, correlate};

// Re-export refresh types
pub use refresh::{Poller, RefreshState};

// Re-export provider types
pub use config::ProviderConfig;
pub use provider::{GatewayResponse, HttpProvider, MarketData};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};
