//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::core::{
    ChatMessage, Indicators, MarketIndex, MarketMovers, Mover, NewsItem, Quote, Sentiment,
};
use crate::correlate::Correlation;
use crate::error::{CommandError, Error, ProviderError, StreamError};
use crate::io::preview;
use crate::provider::GatewayResponse;
use crate::refresh::RefreshState;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Formats a quote.
#[must_use]
pub fn format_quote(quote: &Quote, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_quote_text(quote),
        OutputFormat::Json => format_json(quote),
    }
}

fn format_quote_text(quote: &Quote) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{} ({})", quote.name, quote.symbol);
    let _ = write!(output, "  Price:       {}", quote.price);
    if let Some(change) = &quote.change {
        let pct = quote.percent_change.as_deref().unwrap_or("-");
        let _ = write!(output, "  {change} ({pct})");
    }
    output.push('\n');

    let rows = [
        ("Open", quote.open.as_deref()),
        ("High", quote.high.as_deref()),
        ("Low", quote.low.as_deref()),
        ("52w high", quote.year_high.as_deref()),
        ("52w low", quote.year_low.as_deref()),
        ("Market cap", quote.market_cap.as_deref()),
        ("P/E", quote.pe.as_deref()),
        ("EPS", quote.eps.as_deref()),
        ("Sector", quote.sector.as_deref()),
        ("Industry", quote.industry.as_deref()),
    ];
    for (label, value) in rows {
        if let Some(value) = value {
            let _ = writeln!(output, "  {:<12} {value}", format!("{label}:"));
        }
    }
    if let Some(volume) = quote.volume {
        let _ = writeln!(output, "  {:<12} {}", "Volume:", format_count(volume));
    }
    if let Some(about) = &quote.about {
        let _ = writeln!(output, "\n{}", preview(about, 280));
    }
    output
}

/// Formats a sentiment analysis.
#[must_use]
pub fn format_sentiment(sentiment: &Sentiment, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            let _ = writeln!(
                output,
                "Sentiment: {} ({:.2})",
                sentiment.category(),
                sentiment.sentiment_score
            );
            for point in &sentiment.key_points {
                let _ = writeln!(output, "  - {}", preview(&point.point, 120));
                if !point.url.is_empty() {
                    let _ = writeln!(output, "    {}", point.url);
                }
            }
            output
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct SentimentOutput<'a> {
                #[serde(flatten)]
                sentiment: &'a Sentiment,
                category: String,
            }
            format_json(&SentimentOutput {
                sentiment,
                category: sentiment.category().to_string(),
            })
        }
    }
}

/// Formats technical indicators, one group per block.
#[must_use]
pub fn format_indicators(indicators: &Indicators, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            if indicators.is_empty() {
                return "No indicators available.\n".to_string();
            }
            let mut output = String::new();
            for (group, values) in indicators {
                let _ = writeln!(output, "{group}");
                for (name, value) in values {
                    let _ = writeln!(output, "  {name:<16} {}", scalar(value));
                }
            }
            output
        }
        OutputFormat::Json => format_json(indicators),
    }
}

/// Formats the three movers lists.
#[must_use]
pub fn format_movers(movers: &MarketMovers, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            for (title, list) in [
                ("Top gainers", &movers.gainers),
                ("Top losers", &movers.losers),
                ("Most active", &movers.actives),
            ] {
                let _ = writeln!(output, "{title}:");
                format_mover_rows(&mut output, list);
                output.push('\n');
            }
            output
        }
        OutputFormat::Json => format_json(movers),
    }
}

fn format_mover_rows(output: &mut String, movers: &[Mover]) {
    if movers.is_empty() {
        output.push_str("  (none)\n");
        return;
    }
    for m in movers {
        let _ = writeln!(
            output,
            "  {:<8} {:<28} {:>10} {:>10} {:>9}",
            m.symbol,
            preview(&m.name, 28),
            m.price,
            m.change,
            m.percent_change
        );
    }
}

/// Formats market indices.
#[must_use]
pub fn format_indices(indices: &[MarketIndex], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            if indices.is_empty() {
                return "No indices available.\n".to_string();
            }
            let mut output = String::new();
            for index in indices {
                let _ = writeln!(
                    output,
                    "{:<28} {:>12.2} {:>10} {:>9}",
                    preview(&index.name, 28),
                    index.value,
                    index.change,
                    index.percent_change
                );
            }
            output
        }
        OutputFormat::Json => format_json(&indices),
    }
}

/// Formats up to `limit` news items.
#[must_use]
pub fn format_news(news: &[NewsItem], limit: usize, format: OutputFormat) -> String {
    let shown = &news[..news.len().min(limit)];
    match format {
        OutputFormat::Text => {
            if shown.is_empty() {
                return "No news available.\n".to_string();
            }
            let mut output = String::new();
            for item in shown {
                let _ = writeln!(output, "{}", preview(&item.title, 100));
                let _ = writeln!(output, "  {} · {}", item.source, item.time);
                let _ = writeln!(output, "  {}", item.link);
            }
            output
        }
        OutputFormat::Json => format_json(&shown),
    }
}

/// Formats a resolved audio URL.
#[must_use]
pub fn format_audio(url: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("{url}\n"),
        OutputFormat::Json => format_json(&serde_json::json!({ "audio_file": url })),
    }
}

/// Formats a correlated chart series.
///
/// Text output lists only the samples that carry an event.
#[must_use]
pub fn format_chart(ticker: &str, chart: &Correlation, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_chart_text(ticker, chart),
        OutputFormat::Json => format_json(chart),
    }
}

fn format_chart_text(ticker: &str, chart: &Correlation) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{ticker}: {} samples", chart.samples.len());

    if let (Some(first), Some(last)) = (chart.samples.first(), chart.samples.last()) {
        let _ = writeln!(
            output,
            "  {} .. {}  {:.2} -> {:.2}",
            format_timestamp(first.sample.timestamp),
            format_timestamp(last.sample.timestamp),
            first.sample.price,
            last.sample.price
        );
    }
    let _ = writeln!(
        output,
        "  Events: {} attached, {} unmatched, {} displaced",
        chart.attached, chart.unmatched, chart.displaced
    );
    if let Some(error) = &chart.posts_error {
        let _ = writeln!(output, "  ! posts unavailable: {error}");
    }

    for point in chart.annotated() {
        let Some(event) = &point.event else { continue };
        let _ = writeln!(
            output,
            "  {}  {:>10.2}  {}",
            format_timestamp(point.sample.timestamp),
            point.sample.price,
            preview(&event.content, 80)
        );
    }
    output
}

/// Formats a chat transcript.
#[must_use]
pub fn format_transcript(messages: &[ChatMessage], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            for message in messages {
                let _ = writeln!(output, "{}: {}", message.role.as_str(), message.content);
            }
            output
        }
        OutputFormat::Json => format_json(messages),
    }
}

/// Formats a normalized gateway reply. Always JSON.
#[must_use]
pub fn format_gateway(response: &GatewayResponse) -> String {
    format_json(response)
}

/// Formats one update of a polled view.
///
/// Text output shows the view's data (or a placeholder), the time of the
/// last successful refresh, and the latest error when the data is stale.
/// JSON output is one compact object per update.
pub fn format_refresh<T, F>(
    label: &str,
    state: &RefreshState<T>,
    format: OutputFormat,
    render: F,
) -> String
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            let updated = state
                .last_updated()
                .map_or_else(|| "never".to_string(), |t| t.format("%H:%M:%S UTC").to_string());
            let _ = writeln!(output, "== {label} (updated {updated}) ==");
            if let Some(error) = state.error() {
                let _ = writeln!(output, "! refresh failed: {error}");
            }
            match state.data() {
                Some(data) => output.push_str(&render(data)),
                None => output.push_str("(no data yet)\n"),
            }
            output
        }
        OutputFormat::Json => {
            let mut line = serde_json::to_string(state).unwrap_or_else(|_| "{}".to_string());
            line.push('\n');
            line
        }
    }
}

/// Formats an error for output.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ErrorOutput<'a> {
                error: ErrorBody<'a>,
            }
            #[derive(Serialize)]
            struct ErrorBody<'a> {
                #[serde(rename = "type")]
                kind: &'a str,
                message: String,
            }
            format_json(&ErrorOutput {
                error: ErrorBody {
                    kind: error_kind(error),
                    message: error.to_string(),
                },
            })
        }
    }
}

const fn error_kind(error: &Error) -> &'static str {
    match error {
        Error::Stream(StreamError::RequestFailed { .. }) => "request_failed",
        Error::Stream(_) => "stream",
        Error::Provider(ProviderError::MissingParameter { .. }) => "missing_parameter",
        Error::Provider(ProviderError::NoData { .. }) => "no_data",
        Error::Provider(_) => "provider",
        Error::Command(CommandError::InvalidArgument(_)) => "invalid_argument",
        Error::Command(CommandError::UnknownEndpoint(_)) => "unknown_endpoint",
        Error::Command(_) => "command",
        Error::Config { .. } => "config",
    }
}

/// Formats a value as JSON.
fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn format_timestamp(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map_or_else(|| ts.to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
}

/// Renders a JSON scalar without quotes.
fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n
            .as_f64()
            .map_or_else(|| n.to_string(), |f| format!("{f:.2}")),
        other => other.to_string(),
    }
}

/// Formats a share count as human-readable.
fn format_count(count: f64) -> String {
    if count < 1e3 {
        format!("{count:.0}")
    } else if count < 1e6 {
        format!("{:.1}K", count / 1e3)
    } else if count < 1e9 {
        format!("{:.1}M", count / 1e6)
    } else {
        format!("{:.1}B", count / 1e9)
    }
}
