use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use time::macros::format_description;
use time::Date;

use crate::circuit_breaker::CircuitBreaker;
use crate::data_source::{degrade_to_empty, RawSeries, SeriesRequest, SeriesSource, SourceError};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient, DEFAULT_TIMEOUT_MS};
use crate::retry::{send_with_retry, RetryConfig};
use crate::{DateWindow, ProviderCode, SourceKind};

const DEFAULT_BASE_URL: &str = "https://api.bcb.gov.br";
const VALUE_COLUMN: &str = "valor";
/// SGS rejects daily-series queries spanning more than ten years.
const MAX_CHUNK_YEARS: i32 = 10;

/// Central-bank adapter over the Banco Central do Brasil SGS API.
///
/// Long windows are fetched as consecutive chunks and merged. A chunk the
/// series does not cover yet (HTTP 404) contributes no rows; any other chunk
/// failure turns the whole fetch into "no data".
#[derive(Clone)]
pub struct CentralBankAdapter {
    http_client: Arc<dyn HttpClient>,
    circuit_breaker: Arc<CircuitBreaker>,
    retry: RetryConfig,
    timeout_ms: u64,
    base_url: String,
    max_chunk_years: i32,
}

impl Default for CentralBankAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

impl CentralBankAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            circuit_breaker: Arc::new(CircuitBreaker::for_source(SourceKind::CentralBank)),
            retry: RetryConfig::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            base_url: String::from(DEFAULT_BASE_URL),
            max_chunk_years: MAX_CHUNK_YEARS,
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

    pub fn with_max_chunk_years(mut self, years: i32) -> Self {
        self.max_chunk_years = years.max(1);
        self
    }

    fn series_endpoint(&self, code: u32, window: DateWindow) -> Result<String, SourceError> {
        Ok(format!(
            "{}/dados/serie/bcdata.sgs.{}/dados?formato=json&dataInicial={}&dataFinal={}",
            self.base_url,
            code,
            urlencoding::encode(&format_sgs_date(window.start())?),
            urlencoding::encode(&format_sgs_date(window.end())?),
        ))
    }

    async fn fetch_series(&self, code: u32, window: DateWindow) -> Result<RawSeries, SourceError> {
        let mut raw = RawSeries::new([VALUE_COLUMN], VALUE_COLUMN);
        for chunk in window.chunks(self.max_chunk_years) {
            let rows = self.fetch_chunk(code, chunk).await?;
            tracing::debug!(code, window = %chunk, rows = rows.rows().len(), "sgs chunk fetched");
            raw.extend(rows);
        }
        Ok(raw)
    }

    async fn fetch_chunk(&self, code: u32, window: DateWindow) -> Result<RawSeries, SourceError> {
        if !self.circuit_breaker.allow_request() {
            return Err(SourceError::unavailable(
                "bcb circuit breaker is open; skipping upstream call",
            ));
        }

        let request = HttpRequest::get(self.series_endpoint(code, window)?)
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);

        let response = send_with_retry(self.http_client.as_ref(), request, &self.retry)
            .await
            .map_err(|error| {
                self.circuit_breaker.record_failure();
                if error.is_timeout() {
                    SourceError::timeout(format!("bcb request timed out: {}", error.message()))
                } else {
                    SourceError::unavailable(format!("bcb transport error: {}", error.message()))
                }
            })?;

        match response.status {
            status if (200..300).contains(&status) => self.circuit_breaker.record_success(),
            404 => {
                // SGS answers 404 for a range before the series starts
                self.circuit_breaker.record_success();
                return Ok(RawSeries::new([VALUE_COLUMN], VALUE_COLUMN));
            }
            429 => {
                self.circuit_breaker.record_failure();
                return Err(SourceError::rate_limited("bcb returned status 429"));
            }
            status => {
                self.circuit_breaker.record_failure();
                return Err(SourceError::unavailable(format!(
                    "bcb returned status {status}"
                )));
            }
        }

        parse_observations(&response.body)
    }
}

impl SeriesSource for CentralBankAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::CentralBank
    }

    fn fetch<'a>(
        &'a self,
        req: SeriesRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawSeries, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let ProviderCode::SeriesCode(code) = req.code else {
                return Err(SourceError::invalid_request(format!(
                    "bcb expects a numeric series code, got '{}'",
                    req.code
                )));
            };

            let result = self.fetch_series(code, req.window).await;
            degrade_to_empty(self.kind(), &req.code, result, || {
                RawSeries::new([VALUE_COLUMN], VALUE_COLUMN)
            })
        })
    }
}

fn format_sgs_date(date: Date) -> Result<String, SourceError> {
    date.format(format_description!("[day]/[month]/[year]"))
        .map_err(|e| SourceError::internal(format!("cannot format date {date}: {e}")))
}

fn parse_sgs_date(raw: &str) -> Result<Date, SourceError> {
    Date::parse(raw.trim(), format_description!("[day]/[month]/[year]"))
        .map_err(|_| SourceError::malformed(format!("invalid sgs date '{raw}'")))
}

/// Blank, null or non-numeric values are missing, not malformed.
fn parse_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn parse_observations(body: &str) -> Result<RawSeries, SourceError> {
    let observations: Vec<SgsObservation> = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse sgs response: {e}")))?;

    let mut raw = RawSeries::new([VALUE_COLUMN], VALUE_COLUMN);
    for observation in observations {
        let date = parse_sgs_date(&observation.data)?;
        raw.push_row(date, vec![parse_value(&observation.valor)]);
    }
    Ok(raw)
}

#[derive(Debug, Clone, Deserialize)]
struct SgsObservation {
    data: String,
    #[serde(default)]
    valor: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::RecordingHttpClient;
    use crate::data_source::SourceErrorKind;
    use crate::http_client::{HttpError, HttpResponse};
    use time::macros::date;

    fn adapter(client: Arc<RecordingHttpClient>) -> CentralBankAdapter {
        CentralBankAdapter::with_http_client(client).with_retry(RetryConfig::no_retry())
    }

    fn selic(start: Date, end: Date) -> SeriesRequest {
        SeriesRequest::new(
            ProviderCode::SeriesCode(4189),
            DateWindow::new(start, end).expect("valid window"),
        )
    }

    #[tokio::test]
    async fn requests_sgs_json_with_brazilian_dates() {
        let client = Arc::new(RecordingHttpClient::always(Ok(HttpResponse::ok_json("[]"))));

        adapter(client.clone())
            .fetch(selic(date!(2020-01-01), date!(2024-03-11)))
            .await
            .expect("fetch succeeds");

        let requests = client.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            "https://api.bcb.gov.br/dados/serie/bcdata.sgs.4189/dados?formato=json&dataInicial=01%2F01%2F2020&dataFinal=11%2F03%2F2024"
        );
    }

    #[tokio::test]
    async fn parses_string_values_and_blanks() {
        let body = r#"[
            {"data": "01/12/2023", "valor": "11.75"},
            {"data": "02/01/2024", "valor": ""},
            {"data": "01/02/2024", "valor": 11.25}
        ]"#;
        let client = Arc::new(RecordingHttpClient::always(Ok(HttpResponse::ok_json(body))));

        let raw = adapter(client)
            .fetch(selic(date!(2023-12-01), date!(2024-02-02)))
            .await
            .expect("fetch succeeds");

        assert_eq!(raw.value_column(), "valor");
        assert_eq!(raw.rows().len(), 3);
        assert_eq!(raw.rows()[0].date, date!(2023-12-01));
        assert_eq!(raw.rows()[0].values, vec![Some(11.75)]);
        assert_eq!(raw.rows()[1].values, vec![None]);
        assert_eq!(raw.rows()[2].values, vec![Some(11.25)]);
    }

    #[tokio::test]
    async fn long_window_is_chunked_and_404_chunks_are_empty() {
        let client = Arc::new(RecordingHttpClient::scripted(vec![
            Ok(HttpResponse::with_status(404, r#"{"error":"Value(s) not found"}"#)),
            Ok(HttpResponse::ok_json(r#"[{"data":"01/07/2012","valor":"7.5"}]"#)),
            Ok(HttpResponse::ok_json(r#"[{"data":"01/07/2014","valor":"6.9"}]"#)),
        ]));

        let raw = adapter(client.clone())
            .fetch(selic(date!(1994-07-01), date!(2024-03-11)))
            .await
            .expect("fetch succeeds");

        let urls = client
            .recorded_requests()
            .into_iter()
            .map(|request| request.url)
            .collect::<Vec<_>>();
        assert_eq!(urls.len(), 3);
        assert!(urls[0].contains("dataInicial=01%2F07%2F1994&dataFinal=30%2F06%2F2004"));
        assert!(urls[1].contains("dataInicial=01%2F07%2F2004&dataFinal=30%2F06%2F2014"));
        assert!(urls[2].contains("dataFinal=11%2F03%2F2024"));
        assert_eq!(raw.rows().len(), 2);
    }

    #[tokio::test]
    async fn chunk_length_is_configurable() {
        let client = Arc::new(RecordingHttpClient::always(Ok(HttpResponse::ok_json("[]"))));

        adapter(client.clone())
            .with_max_chunk_years(5)
            .fetch(selic(date!(2010-01-01), date!(2024-12-31)))
            .await
            .expect("fetch succeeds");

        let urls = client
            .recorded_requests()
            .into_iter()
            .map(|request| request.url)
            .collect::<Vec<_>>();
        assert_eq!(urls.len(), 3);
        assert!(urls[1].contains("dataInicial=01%2F01%2F2015&dataFinal=31%2F12%2F2019"));
    }

    #[tokio::test]
    async fn any_failed_chunk_degrades_whole_fetch() {
        let client = Arc::new(RecordingHttpClient::scripted(vec![
            Ok(HttpResponse::ok_json(r#"[{"data":"01/07/1994","valor":"1.0"}]"#)),
            Err(HttpError::new("connection reset")),
        ]));

        let raw = adapter(client)
            .fetch(selic(date!(1994-07-01), date!(2014-01-01)))
            .await
            .expect("degrades instead of failing");

        assert!(raw.is_empty());
    }

    #[tokio::test]
    async fn malformed_payloads_degrade_to_empty() {
        for body in [
            r#"{"erro": "parametro invalido"}"#,
            "<html>Service Unavailable</html>",
            r#"[{"data":"2024-01-02","valor":"1.0"}]"#,
        ] {
            let client = Arc::new(RecordingHttpClient::always(Ok(HttpResponse::ok_json(body))));
            let raw = adapter(client)
                .fetch(selic(date!(2024-01-01), date!(2024-02-01)))
                .await
                .expect("degrades");
            assert!(raw.is_empty(), "body {body} should degrade");
        }
    }

    #[tokio::test]
    async fn ticker_is_a_contract_violation() {
        let client = Arc::new(RecordingHttpClient::default());
        let request = SeriesRequest::new(
            ProviderCode::Ticker(String::from("^BVSP")),
            DateWindow::new(date!(2024-01-01), date!(2024-01-02)).expect("valid window"),
        );

        let error = adapter(client.clone()).fetch(request).await.expect_err("wrong code shape");

        assert_eq!(error.kind(), SourceErrorKind::InvalidRequest);
        assert!(client.recorded_requests().is_empty());
    }
}
