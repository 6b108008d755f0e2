//! Core domain models for marketpulse.
//!
//! This module contains the fundamental data structures used throughout the
//! crate: chat messages, market payloads, and external events. These are
//! pure domain models with no I/O dependencies.

pub mod event;
pub mod market;
pub mod message;

pub use event::Event;
pub use market::{
    Extra, Indicators, KeyPoint, MarketIndex, MarketMovers, Mover, NewsItem, Period, PriceSample,
    Quote, Sentiment, SentimentCategory, decode_price_history,
};
pub use message::{ChatMessage, ChatRequest, Conversation, Role, greeting_for};
