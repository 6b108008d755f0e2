//! HTTP implementation of [`MarketData`] and [`ChatBackend`].
//!
//! Talks to two upstreams: the dashboard backend (prices, posts, audio,
//! sentiment, chat) and the public market data service (quotes, indicators,
//! movers, indices, news). One pooled `reqwest` client serves both.

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::traits::{MarketData, require};
use crate::config::ProviderConfig;
use crate::core::{
    ChatRequest, Event, Indicators, MarketIndex, MarketMovers, Mover, NewsItem, Period,
    PriceSample, Quote, Sentiment, decode_price_history,
};
use crate::error::{Error, ProviderError, Result, StreamError};
use crate::stream::{ByteStream, ChatBackend};

/// US region filter for the indices route.
const INDICES_REGION: &str = "US";

/// Provider backed by the dashboard backend and the market data service.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: Client,
    config: ProviderConfig,
}

impl HttpProvider {
    /// Creates a provider with a client configured from `config`.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        // Only the connect phase is bounded client-wide. A chat reply may
        // stream for longer than the timeout, so JSON calls set it per request.
        let client = Client::builder()
            .connect_timeout(config.timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to build http client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn api(&self, path: &str) -> String {
        format!("{}/{path}", self.config.api_url())
    }

    fn market(&self, path: &str) -> String {
        format!("{}/{path}", self.config.market_url())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .query(query)
            .timeout(self.config.timeout())
            .send()
            .await?;
        let response = ensure_success(url, response)?;
        Ok(response.json::<T>().await?)
    }
}

fn ensure_success(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    warn!(url, status = status.as_u16(), "upstream returned error status");
    Err(ProviderError::Status {
        status: status.as_u16(),
    }
    .into())
}

/// Pulls a playable URL out of the audio endpoint's reply.
fn audio_location(payload: Value) -> Result<String> {
    match payload {
        Value::String(url) if !url.is_empty() => Ok(url),
        Value::Object(mut fields) => ["audio_file", "url"]
            .iter()
            .find_map(|key| match fields.remove(*key) {
                Some(Value::String(url)) if !url.is_empty() => Some(url),
                _ => None,
            })
            .ok_or_else(|| ProviderError::Decode("audio reply has no url".to_string()).into()),
        other => Err(ProviderError::Decode(format!("unexpected audio reply: {other}")).into()),
    }
}

#[async_trait]
impl MarketData for HttpProvider {
    async fn price_history(&self, ticker: &str, period: Period) -> Result<Vec<PriceSample>> {
        let ticker = require("ticker", ticker)?;
        let payload: Value = self
            .get_json(&self.api(&format!("price/{ticker}")), &[("period", period.as_str())])
            .await?;
        Ok(decode_price_history(payload)?)
    }

    async fn posts(&self, author: &str) -> Result<Vec<Event>> {
        let author = require("author", author)?;
        self.get_json(&self.api(&format!("posts/{author}")), &[]).await
    }

    async fn audio_url(&self, key: &str) -> Result<String> {
        let key = require("key", key)?;
        let payload: Value = self.get_json(&self.api("tts"), &[("key", key)]).await?;
        audio_location(payload)
    }

    async fn sentiment(&self, ticker: &str) -> Result<Sentiment> {
        let ticker = require("ticker", ticker)?;
        self.get_json(&self.api(&format!("sentiment/{ticker}")), &[])
            .await
    }

    async fn quote(&self, symbol: &str) -> Result<Quote> {
        let symbol = require("symbol", symbol)?;
        let quotes: Vec<Quote> = self
            .get_json(&self.market("quotes"), &[("symbols", symbol)])
            .await?;
        quotes.into_iter().next().ok_or_else(|| {
            ProviderError::NoData {
                what: format!("quote {symbol}"),
            }
            .into()
        })
    }

    async fn indicators(&self, symbol: &str) -> Result<Indicators> {
        let symbol = require("symbol", symbol)?;
        self.get_json(&self.market("indicators"), &[("symbol", symbol)])
            .await
    }

    async fn movers(&self, count: usize) -> Result<MarketMovers> {
        let count = count.to_string();
        let query = [("count", count.as_str())];
        let gainers_url = self.market("gainers");
        let losers_url = self.market("losers");
        let actives_url = self.market("actives");
        let (gainers, losers, actives) = tokio::try_join!(
            self.get_json::<Vec<Mover>>(&gainers_url, &query),
            self.get_json::<Vec<Mover>>(&losers_url, &query),
            self.get_json::<Vec<Mover>>(&actives_url, &query),
        )?;
        Ok(MarketMovers {
            gainers,
            losers,
            actives,
        })
    }

    async fn indices(&self) -> Result<Vec<MarketIndex>> {
        self.get_json(&self.market("indices"), &[("region", INDICES_REGION)])
            .await
    }

    async fn news(&self) -> Result<Vec<NewsItem>> {
        self.get_json(&self.market("news"), &[]).await
    }
}

#[async_trait]
impl ChatBackend for HttpProvider {
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream> {
        let url = self.api("chat/stream");
        debug!(url, history = request.history.len(), "opening chat stream");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| StreamError::Read(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "chat request rejected");
            return Err(StreamError::RequestFailed {
                status: status.as_u16(),
            }
            .into());
        }

        let stream = response
            .bytes_stream()
            .map_ok(|chunk| chunk.to_vec())
            .map_err(|e| Error::from(StreamError::Read(e.to_string())));
        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{ChatObserver, ChatSession, Submission};
    use serde_json::json;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Reads up to the blank line that ends the request head.
    async fn read_head(socket: &mut TcpStream) {
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => head.extend_from_slice(&buf[..n]),
            }
        }
    }

    /// Serves one chunked 200 reply, sleeping `gap` before each chunk.
    async fn drip_server(chunks: &'static [&'static str], gap: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_head(&mut socket).await;
            let status = "HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n";
            socket.write_all(status.as_bytes()).await.unwrap();
            for chunk in chunks {
                tokio::time::sleep(gap).await;
                let frame = format!("{:x}\r\n{chunk}\r\n", chunk.len());
                socket.write_all(frame.as_bytes()).await.unwrap();
                socket.flush().await.unwrap();
            }
            socket.write_all(b"0\r\n\r\n").await.unwrap();
            let mut rest = Vec::new();
            let _ = socket.read_to_end(&mut rest).await;
        });
        format!("http://{addr}")
    }

    /// Answers every request with the same JSON body.
    async fn json_server(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = listener.accept().await.unwrap();
                tokio::spawn(async move {
                    read_head(&mut socket).await;
                    let reply = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\
                         content-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(reply.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{addr}")
    }

    /// Accepts one connection and never answers it.
    async fn silent_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut rest = Vec::new();
            let _ = socket.read_to_end(&mut rest).await;
        });
        format!("http://{addr}")
    }

    #[derive(Default)]
    struct Snapshots(Vec<String>);

    impl ChatObserver for Snapshots {
        fn on_snapshot(&mut self, text: &str) {
            self.0.push(text.to_string());
        }
    }

    fn provider() -> HttpProvider {
        HttpProvider::new(ProviderConfig::default()).unwrap()
    }

    #[test]
    fn test_route_building() {
        let p = provider();
        assert_eq!(p.api("posts/trump"), "http://localhost:8000/posts/trump");
        assert_eq!(
            p.market("quotes"),
            "https://finance-query.onrender.com/v1/quotes"
        );
    }

    #[test]
    fn test_audio_location_shapes() {
        assert_eq!(
            audio_location(json!({"audio_file": "https://a/x.mp3"})).unwrap(),
            "https://a/x.mp3"
        );
        assert_eq!(
            audio_location(json!({"url": "https://a/y.mp3"})).unwrap(),
            "https://a/y.mp3"
        );
        assert_eq!(audio_location(json!("https://a/z.mp3")).unwrap(), "https://a/z.mp3");
        assert!(audio_location(json!({"audio_file": ""})).is_err());
        assert!(audio_location(json!(42)).is_err());
    }

    #[tokio::test]
    async fn test_blank_inputs_rejected_without_io() {
        let p = provider();
        for err in [
            p.price_history(" ", Period::OneDay).await.unwrap_err(),
            p.posts("").await.unwrap_err(),
            p.audio_url("").await.unwrap_err(),
            p.sentiment("\t").await.unwrap_err(),
            p.quote("").await.unwrap_err(),
            p.indicators("").await.unwrap_err(),
        ] {
            assert!(matches!(
                err,
                Error::Provider(ProviderError::MissingParameter { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_chat_stream_outlives_request_timeout() {
        let base = drip_server(&["Hello ", "slow ", "world"], Duration::from_millis(800)).await;
        let provider = HttpProvider::new(ProviderConfig::new(&base, &base, 1).unwrap()).unwrap();
        let mut session = ChatSession::without_greeting(None);
        let mut observer = Snapshots::default();

        let outcome = session.submit(&provider, "hi", &mut observer).await;

        assert_eq!(outcome, Submission::Answered);
        assert_eq!(observer.0.last().map(String::as_str), Some("Hello slow world"));
        assert_eq!(
            session.conversation().last().map(|m| m.content.as_str()),
            Some("Hello slow world")
        );
    }

    #[tokio::test]
    async fn test_json_request_still_times_out() {
        let base = silent_server().await;
        let provider = HttpProvider::new(ProviderConfig::new(&base, &base, 1).unwrap()).unwrap();
        let err = provider.posts("trump").await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::Http(_))));
    }

    const MOVER_LIST: &str = r#"[{"symbol": "NVDA", "name": "NVIDIA", "price": "1.00",
        "change": "+0.10", "percentChange": "+11.11%"}]"#;

    #[tokio::test]
    async fn test_movers_fetches_all_three_lists() {
        let base = json_server(MOVER_LIST).await;
        let provider = HttpProvider::new(ProviderConfig::new(&base, &base, 5).unwrap()).unwrap();

        let movers = provider.movers(5).await.unwrap();

        for list in [&movers.gainers, &movers.losers, &movers.actives] {
            assert_eq!(list.len(), 1);
            assert_eq!(list[0].symbol, "NVDA");
        }
    }
}
