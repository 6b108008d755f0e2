//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use std::future::Future;
use std::io::Write as IoWrite;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::cli::output::{
    OutputFormat, format_audio, format_chart, format_gateway, format_indicators, format_indices,
    format_movers, format_news, format_quote, format_refresh, format_sentiment, format_transcript,
};
use crate::cli::parser::{ChartArgs, Cli, Commands, DEFAULT_MOVERS_COUNT, View};
use crate::core::ChatMessage;
use crate::correlate::{ChartRequest, CorrelatorConfig, load_chart};
use crate::error::{CommandError, Result};
use crate::io::unseen_suffix;
use crate::provider::{HttpProvider, MarketData, Params, dispatch};
use crate::refresh::Poller;
use crate::stream::{ChatObserver, ChatSession, Submission};

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success. Streaming commands (`chat`,
/// `watch`) write as they go and return whatever is left to print.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the command fails.
pub async fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let provider = HttpProvider::new(cli.provider_config()?)?;
    debug!(
        api = provider.config().api_url(),
        market = provider.config().market_url(),
        "provider ready"
    );

    match &cli.command {
        Commands::Quote { symbol } => Ok(format_quote(&provider.quote(symbol).await?, format)),
        Commands::Sentiment { ticker } => Ok(format_sentiment(
            &provider.sentiment(ticker).await?,
            format,
        )),
        Commands::Indicators { symbol } => Ok(format_indicators(
            &provider.indicators(symbol).await?,
            format,
        )),
        Commands::Movers { count } => {
            if *count == 0 {
                return Err(CommandError::InvalidArgument("count must be positive".into()).into());
            }
            Ok(format_movers(&provider.movers(*count).await?, format))
        }
        Commands::Indices => Ok(format_indices(&provider.indices().await?, format)),
        Commands::News { limit } => Ok(format_news(&provider.news().await?, *limit, format)),
        Commands::Audio { key } => Ok(format_audio(&provider.audio_url(key).await?, format)),
        Commands::Chart { ticker, chart } => {
            let request = chart_request(ticker, chart);
            let correlation = load_chart(&provider, &request).await?;
            Ok(format_chart(&request.ticker, &correlation, format))
        }
        Commands::Watch {
            view,
            symbol,
            interval,
            ticks,
            chart,
        } => {
            let plan = WatchPlan {
                view: *view,
                symbol: symbol.clone(),
                interval: *interval,
                ticks: *ticks,
                chart: chart.clone(),
                format,
            };
            cmd_watch(Arc::new(provider), plan).await
        }
        Commands::Chat { ticker, message } => {
            cmd_chat(&provider, ticker.clone(), message.as_deref(), format).await
        }
        Commands::Gateway { endpoint, params } => cmd_gateway(&provider, endpoint, params).await,
    }
}

fn chart_request(ticker: &str, args: &ChartArgs) -> ChartRequest {
    ChartRequest {
        ticker: ticker.trim().to_uppercase(),
        period: args.period,
        author: args.author.clone(),
        config: CorrelatorConfig::new(args.cutoff),
    }
}

// ==================== Gateway ====================

/// Parses `key=value` pairs into gateway params.
pub(crate) fn parse_params(raw: &[String]) -> Result<Params> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| {
                    CommandError::InvalidArgument(format!("expected key=value, got '{pair}'"))
                        .into()
                })
        })
        .collect()
}

async fn cmd_gateway<M>(source: &M, endpoint: &str, raw: &[String]) -> Result<String>
where
    M: MarketData + ?Sized,
{
    let endpoint = endpoint.parse()?;
    let params = parse_params(raw)?;
    let reply = dispatch(source, endpoint, &params).await;
    Ok(format_gateway(&reply))
}

// ==================== Chat ====================

/// Prints streamed replies as they grow.
///
/// Only the unseen suffix of each snapshot is written, so the terminal
/// shows one continuously growing line of text.
struct TerminalObserver {
    echo: bool,
    streamed: String,
}

impl TerminalObserver {
    const fn new(echo: bool) -> Self {
        Self {
            echo,
            streamed: String::new(),
        }
    }

    fn emit(text: &str) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            log_write_error(&e);
        }
    }
}

impl ChatObserver for TerminalObserver {
    fn on_snapshot(&mut self, text: &str) {
        if !self.echo {
            return;
        }
        let fresh = unseen_suffix(text, self.streamed.len());
        if !fresh.is_empty() {
            Self::emit(fresh);
            self.streamed.push_str(fresh);
        }
    }

    fn on_commit(&mut self, message: &ChatMessage) {
        if self.echo {
            // A failed turn commits the fallback, not what was streamed.
            if message.content != self.streamed {
                if !self.streamed.is_empty() {
                    Self::emit("\n");
                }
                Self::emit(&message.content);
            }
            Self::emit("\n");
        }
        self.streamed.clear();
    }
}

/// Warns on a failed stdout write and returns whether it did. A broken
/// pipe (output piped into `head`) is ignored.
fn log_write_error(error: &std::io::Error) -> bool {
    if error.kind() == std::io::ErrorKind::BrokenPipe {
        return false;
    }
    warn!(%error, "failed to write chat output");
    true
}

async fn cmd_chat(
    provider: &HttpProvider,
    ticker: Option<String>,
    message: Option<&str>,
    format: OutputFormat,
) -> Result<String> {
    let echo = format == OutputFormat::Text;
    let mut session = ChatSession::new(ticker.map(|t| t.trim().to_uppercase()));
    let mut observer = TerminalObserver::new(echo);

    if let Some(message) = message {
        if session.submit(provider, message, &mut observer).await == Submission::Rejected {
            return Err(CommandError::InvalidArgument("message is empty".into()).into());
        }
        return Ok(if echo {
            String::new()
        } else {
            format_transcript(session.conversation().messages(), format)
        });
    }

    if echo && let Some(greeting) = session.conversation().last() {
        TerminalObserver::emit(&format!("{}\n> ", greeting.content));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if matches!(line, "/quit" | "/exit") {
            break;
        }
        let outcome = session.submit(provider, line, &mut observer).await;
        debug!(?outcome, turns = session.conversation().len(), "chat turn done");
        if echo {
            TerminalObserver::emit("> ");
        }
    }

    Ok(if echo {
        "\n".to_string()
    } else {
        format_transcript(session.conversation().messages(), format)
    })
}

// ==================== Watch ====================

struct WatchPlan {
    view: View,
    symbol: Option<String>,
    interval: Option<u64>,
    ticks: Option<usize>,
    chart: ChartArgs,
    format: OutputFormat,
}

impl WatchPlan {
    fn every(&self) -> Result<Duration> {
        match self.interval {
            Some(0) => {
                Err(CommandError::InvalidArgument("interval must be positive".into()).into())
            }
            Some(secs) => Ok(Duration::from_secs(secs)),
            None => Ok(self.view.default_interval()),
        }
    }

    fn symbol(&self) -> Result<String> {
        match self.symbol.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => Ok(s.to_uppercase()),
            _ => Err(CommandError::InvalidArgument(format!(
                "the {} view needs a symbol",
                self.view.label()
            ))
            .into()),
        }
    }
}

/// Wraps a per-call fetch so each tick gets its own handle on the source.
fn fetcher<G, Fut>(source: &Arc<dyn MarketData>, get: G) -> impl Fn() -> Fut + Send + 'static
where
    G: Fn(Arc<dyn MarketData>) -> Fut + Send + 'static,
{
    let source = Arc::clone(source);
    move || get(Arc::clone(&source))
}

async fn cmd_watch(source: Arc<dyn MarketData>, plan: WatchPlan) -> Result<String> {
    let every = plan.every()?;
    let symbol = if plan.view.needs_symbol() {
        plan.symbol()?
    } else {
        String::new()
    };
    let format = plan.format;

    match plan.view {
        View::Quote => {
            let fetch = fetcher(&source, move |p| {
                let symbol = symbol.clone();
                async move { p.quote(&symbol).await }
            });
            watch_loop(&plan, every, fetch, |q| format_quote(q, format)).await
        }
        View::Indicators => {
            let fetch = fetcher(&source, move |p| {
                let symbol = symbol.clone();
                async move { p.indicators(&symbol).await }
            });
            watch_loop(&plan, every, fetch, |i| format_indicators(i, format)).await
        }
        View::Sentiment => {
            let fetch = fetcher(&source, move |p| {
                let symbol = symbol.clone();
                async move { p.sentiment(&symbol).await }
            });
            watch_loop(&plan, every, fetch, |s| format_sentiment(s, format)).await
        }
        View::Chart => {
            let request = chart_request(&symbol, &plan.chart);
            let ticker = request.ticker.clone();
            let fetch = fetcher(&source, move |p| {
                let request = request.clone();
                async move { load_chart(&*p, &request).await }
            });
            watch_loop(&plan, every, fetch, |c| format_chart(&ticker, c, format)).await
        }
        View::Movers => {
            let fetch = fetcher(&source, |p| async move {
                p.movers(DEFAULT_MOVERS_COUNT).await
            });
            watch_loop(&plan, every, fetch, |m| format_movers(m, format)).await
        }
        View::Indices => {
            let fetch = fetcher(&source, |p| async move { p.indices().await });
            watch_loop(&plan, every, fetch, |i| format_indices(i, format)).await
        }
        View::News => {
            let fetch = fetcher(&source, |p| async move { p.news().await });
            watch_loop(&plan, every, fetch, |n| format_news(n, usize::MAX, format)).await
        }
    }
}

/// Prints every state change until Ctrl-C or the tick limit.
async fn watch_loop<T, F, Fut, R>(
    plan: &WatchPlan,
    every: Duration,
    fetch: F,
    render: R,
) -> Result<String>
where
    T: Clone + Serialize + Send + Sync + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    R: Fn(&T) -> String,
{
    let label = plan.view.label();
    let mut poller = Poller::spawn(label, every, fetch);
    let mut out = tokio::io::stdout();
    let mut updates = 0usize;

    loop {
        tokio::select! {
            next = poller.changed() => {
                let Some(state) = next else { break };
                let text = format_refresh(label, &state, plan.format, &render);
                out.write_all(text.as_bytes()).await?;
                out.flush().await?;
                updates += 1;
                if plan.ticks.is_some_and(|limit| updates >= limit) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!(label, "interrupted");
                break;
            }
        }
    }

    poller.shutdown().await;
    Ok(String::new())
}
