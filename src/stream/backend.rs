//! Chat backend trait definition.
//!
//! Defines the interface for anything that can answer a [`ChatRequest`]
//! with a chunked byte stream, so the chat session can be driven by the
//! HTTP provider or by an in-memory fake.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::core::ChatRequest;
use crate::error::Result;

/// A boxed stream of raw response chunks.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>>>;

/// Source of streamed chat replies.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends `request` and returns the reply body as a byte stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or the response status
    /// is not a success.
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream>;
}
