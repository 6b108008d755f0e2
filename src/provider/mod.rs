//! Upstream data providers.
//!
//! The [`MarketData`] trait abstracts every dashboard data source,
//! [`HttpProvider`] implements it (and the chat backend) over HTTP, and the
//! gateway turns provider results into normalized status/body replies.

pub mod client;
pub mod gateway;
pub mod traits;

pub use client::HttpProvider;
pub use gateway::{Endpoint, GatewayResponse, Params, dispatch};
pub use traits::MarketData;
