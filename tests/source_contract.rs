//! Contract tests for the HTTP source adapters.
//!
//! Every adapter must turn transport faults, bad statuses and unparseable
//! bodies into an empty series, so that a known indicator never fails at the
//! facade. The adapters are wired into a real `IndicatorService` over a
//! scripted HTTP client.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use ferromacro_core::{
    CentralBankAdapter, HttpClient, HttpError, HttpRequest, HttpResponse, IndicatorRegistry,
    IndicatorService, ManualClock, RetryConfig, UtcDateTime, YahooAdapter,
};
use time::macros::{date, datetime};

/// Answers every request with the same outcome, choosing by URL substring.
struct RoutedHttpClient {
    routes: Vec<(&'static str, Result<HttpResponse, HttpError>)>,
    fallback: Result<HttpResponse, HttpError>,
    seen: Mutex<Vec<String>>,
}

impl RoutedHttpClient {
    fn always(outcome: Result<HttpResponse, HttpError>) -> Arc<Self> {
        Self::routed(Vec::new(), outcome)
    }

    fn routed(
        routes: Vec<(&'static str, Result<HttpResponse, HttpError>)>,
        fallback: Result<HttpResponse, HttpError>,
    ) -> Arc<Self> {
        Arc::new(Self {
            routes,
            fallback,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().expect("seen lock").clone()
    }
}

impl HttpClient for RoutedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let outcome = self
            .routes
            .iter()
            .find(|(needle, _)| request.url.contains(needle))
            .map(|(_, outcome)| outcome.clone())
            .unwrap_or_else(|| self.fallback.clone());
        self.seen.lock().expect("seen lock").push(request.url);
        Box::pin(async move { outcome })
    }
}

fn service_over(client: Arc<RoutedHttpClient>) -> IndicatorService {
    let yahoo = YahooAdapter::with_http_client(client.clone()).with_retry(RetryConfig::no_retry());
    let bcb = CentralBankAdapter::with_http_client(client).with_retry(RetryConfig::no_retry());
    IndicatorService::builder()
        .with_source(Arc::new(yahoo))
        .with_source(Arc::new(bcb))
        .with_clock(Arc::new(ManualClock::new(UtcDateTime::from_offset_datetime(
            datetime!(2024-03-10 12:00 UTC),
        ))))
        .build()
        .expect("valid service")
}

#[tokio::test]
async fn when_network_is_down_every_known_indicator_returns_empty() {
    let client = RoutedHttpClient::always(Err(HttpError::new("connection refused")));
    let service = service_over(client.clone());

    for definition in IndicatorRegistry::default().iter() {
        let series = service
            .get_indicator_series(&definition.name)
            .await
            .unwrap_or_else(|error| panic!("{} failed: {error}", definition.name));
        assert!(series.is_empty(), "{} should be empty", definition.name);
    }
    assert!(!client.seen().is_empty());
}

#[tokio::test]
async fn when_upstream_answers_garbage_every_known_indicator_returns_empty() {
    let client = RoutedHttpClient::always(Ok(HttpResponse::ok_json("<html>maintenance</html>")));
    let service = service_over(client);

    for definition in IndicatorRegistry::default().iter() {
        let series = service
            .get_indicator_series(&definition.name)
            .await
            .expect("known indicator");
        assert!(series.is_empty());
    }
}

#[tokio::test]
async fn when_upstream_is_rate_limiting_indicators_return_empty() {
    let client = RoutedHttpClient::always(Ok(HttpResponse::with_status(429, "Too Many Requests")));
    let service = service_over(client);

    let ibovespa = service.get_indicator_series("Ibovespa").await.expect("known");
    let selic = service.get_indicator_series("Taxa Selic").await.expect("known");

    assert!(ibovespa.is_empty());
    assert!(selic.is_empty());
}

#[tokio::test]
async fn when_sgs_answers_selic_pipeline_produces_sorted_series() {
    let body = r#"[
        {"data": "08/03/2024", "valor": "0.043739"},
        {"data": "07/03/2024", "valor": ""},
        {"data": "06/03/2024", "valor": "0.043739"}
    ]"#;
    let client = RoutedHttpClient::routed(
        vec![("dataFinal=11%2F03%2F2024", Ok(HttpResponse::ok_json(body)))],
        Ok(HttpResponse::with_status(404, "[]")),
    );
    let service = service_over(client.clone());

    let series = service.get_indicator_series("Taxa Selic").await.expect("known");

    let dates = series.points().iter().map(|point| point.date).collect::<Vec<_>>();
    assert_eq!(dates, vec![date!(2024-03-06), date!(2024-03-08)]);
    assert_eq!(series.last().map(|point| point.value), Some(0.043739));

    let seen = client.seen();
    assert_eq!(seen.len(), 3, "1994-07-01 through tomorrow spans three chunks");
    assert!(seen.iter().all(|url| url.contains("bcdata.sgs.4189")));
}

#[tokio::test]
async fn when_yahoo_answers_ibovespa_pipeline_prefers_adjusted_close() {
    let body = r#"{
        "chart": {
            "result": [{
                "meta": {"gmtoffset": -10800},
                "timestamp": [1709902800, 1709816400],
                "indicators": {
                    "quote": [{"close": [128000.0, 127500.0]}],
                    "adjclose": [{"adjclose": [127900.0, null]}]
                }
            }],
            "error": null
        }
    }"#;
    let client = RoutedHttpClient::always(Ok(HttpResponse::ok_json(body)));
    let service = service_over(client.clone());

    let series = service.get_indicator_series("Ibovespa").await.expect("known");

    assert_eq!(series.len(), 1);
    assert_eq!(series.points()[0].date, date!(2024-03-08));
    assert_eq!(series.points()[0].value, 127900.0);
    assert!(client.seen()[0].contains("%5EBVSP"));
}

#[tokio::test]
async fn when_base_urls_are_overridden_adapters_call_that_host() {
    let client = RoutedHttpClient::always(Ok(HttpResponse::ok_json("[]")));
    let yahoo = YahooAdapter::with_http_client(client.clone())
        .with_retry(RetryConfig::no_retry())
        .with_base_url("http://127.0.0.1:9000/yahoo");
    let bcb = CentralBankAdapter::with_http_client(client.clone())
        .with_retry(RetryConfig::no_retry())
        .with_base_url("http://127.0.0.1:9000/sgs");
    let service = IndicatorService::builder()
        .with_source(Arc::new(yahoo))
        .with_source(Arc::new(bcb))
        .with_clock(Arc::new(ManualClock::new(UtcDateTime::from_offset_datetime(
            datetime!(2024-03-10 12:00 UTC),
        ))))
        .build()
        .expect("valid service");

    service.get_indicator_series("Ibovespa").await.expect("known");
    service.get_indicator_series("IPCA Mensal").await.expect("known");

    let seen = client.seen();
    assert!(seen[0].starts_with("http://127.0.0.1:9000/yahoo/v8/finance/chart/"), "{}", seen[0]);
    assert!(seen[1..]
        .iter()
        .all(|url| url.starts_with("http://127.0.0.1:9000/sgs/dados/serie/bcdata.sgs.433/")));
}
