use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::circuit_breaker::CircuitBreaker;
use crate::data_source::{degrade_to_empty, RawSeries, SeriesRequest, SeriesSource, SourceError};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient, DEFAULT_TIMEOUT_MS};
use crate::retry::{send_with_retry, RetryConfig};
use crate::{DateWindow, ProviderCode, SourceKind};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const CLOSE: &str = "close";
const ADJ_CLOSE: &str = "adjclose";

/// Market-data adapter over the Yahoo Finance chart API.
///
/// Requests daily bars with adjusted closes. The raw series carries both the
/// raw and the adjusted close and designates the adjusted one whenever the
/// response has an adjusted value slot for every session.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    circuit_breaker: Arc<CircuitBreaker>,
    retry: RetryConfig,
    timeout_ms: u64,
    base_url: String,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

impl YahooAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            circuit_breaker: Arc::new(CircuitBreaker::for_source(SourceKind::MarketData)),
            retry: RetryConfig::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            base_url: String::from(DEFAULT_BASE_URL),
        }
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn chart_endpoint(&self, symbol: &str, window: DateWindow) -> String {
        // period2 is exclusive upstream
        format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=div%2Csplits&includeAdjustedClose=true",
            self.base_url,
            urlencoding::encode(symbol),
            unix_midnight(window.start()),
            unix_midnight(window.end()),
        )
    }

    async fn fetch_chart(&self, symbol: &str, window: DateWindow) -> Result<RawSeries, SourceError> {
        if !self.circuit_breaker.allow_request() {
            return Err(SourceError::unavailable(
                "yahoo circuit breaker is open; skipping upstream call",
            ));
        }

        let request = HttpRequest::get(self.chart_endpoint(symbol, window))
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);

        let response = send_with_retry(self.http_client.as_ref(), request, &self.retry)
            .await
            .map_err(|error| {
                self.circuit_breaker.record_failure();
                if error.is_timeout() {
                    SourceError::timeout(format!("yahoo request timed out: {}", error.message()))
                } else {
                    SourceError::unavailable(format!("yahoo transport error: {}", error.message()))
                }
            })?;

        match response.status {
            status if (200..300).contains(&status) => self.circuit_breaker.record_success(),
            404 => {
                self.circuit_breaker.record_success();
                return Err(SourceError::unavailable(format!(
                    "yahoo has no chart for '{symbol}'"
                )));
            }
            429 => {
                self.circuit_breaker.record_failure();
                return Err(SourceError::rate_limited("yahoo returned status 429"));
            }
            status => {
                self.circuit_breaker.record_failure();
                return Err(SourceError::unavailable(format!(
                    "yahoo returned status {status}"
                )));
            }
        }

        parse_chart(&response.body)
    }
}

impl SeriesSource for YahooAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::MarketData
    }

    fn fetch<'a>(
        &'a self,
        req: SeriesRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawSeries, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let ProviderCode::Ticker(symbol) = &req.code else {
                return Err(SourceError::invalid_request(format!(
                    "yahoo expects a ticker symbol, got series code '{}'",
                    req.code
                )));
            };
            if symbol.trim().is_empty() {
                return Err(SourceError::invalid_request("yahoo ticker must not be empty"));
            }

            let result = self.fetch_chart(symbol, req.window).await;
            degrade_to_empty(self.kind(), &req.code, result, || {
                RawSeries::new([CLOSE, ADJ_CLOSE], ADJ_CLOSE)
            })
        })
    }
}

fn unix_midnight(date: Date) -> i64 {
    date.midnight().assume_utc().unix_timestamp()
}

fn parse_chart(body: &str) -> Result<RawSeries, SourceError> {
    let response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = response.chart.error {
        return Err(SourceError::unavailable(format!(
            "yahoo chart API error: {} {}",
            error.code, error.description
        )));
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| SourceError::malformed("no chart result in response"))?;

    // no timestamps means no sessions in the requested window
    let timestamps = result.timestamp.unwrap_or_default();

    // an adjusted block that does not cover every session is unusable
    let adjusted = result
        .indicators
        .adjclose
        .and_then(|series| series.into_iter().next())
        .map(|series| series.adjclose)
        .filter(|adjusted| !adjusted.is_empty() && adjusted.len() >= timestamps.len());
    let close = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| quote.close)
        .unwrap_or_default();

    let mut raw = match adjusted {
        Some(_) => RawSeries::new([CLOSE, ADJ_CLOSE], ADJ_CLOSE),
        None => RawSeries::new([CLOSE], CLOSE),
    };

    let gmt_offset = result.meta.and_then(|meta| meta.gmtoffset).unwrap_or(0);

    for (i, &ts) in timestamps.iter().enumerate() {
        let local = OffsetDateTime::from_unix_timestamp(ts.saturating_add(gmt_offset))
            .map_err(|e| SourceError::malformed(format!("invalid timestamp {ts}: {e}")))?;

        let close_value = close.get(i).copied().flatten();
        let values = match &adjusted {
            Some(adjusted) => vec![close_value, adjusted.get(i).copied().flatten()],
            None => vec![close_value],
        };
        raw.push_row(local.date(), values);
    }

    Ok(raw)
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    meta: Option<YahooChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartMeta {
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
    #[serde(default)]
    adjclose: Option<Vec<YahooChartAdjClose>>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}
