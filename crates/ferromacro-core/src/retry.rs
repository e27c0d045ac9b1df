//! Retry logic with exponential backoff and jitter.

use std::time::Duration;

use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// Backoff strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    Fixed {
        delay: Duration,
    },
    /// `base * factor^attempt`, capped at `max`, optionally jittered by +/- 50%.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(500),
            factor: 2.0,
            max: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let seconds = base.as_secs_f64() * factor.powi(attempt as i32);
                let delay = Duration::from_secs_f64(seconds.min(max.as_secs_f64()));
                if !jitter {
                    return delay;
                }

                let spread = delay.as_millis() as u64 / 2;
                let offset = fastrand::u64(0..=spread * 2);
                let total = (delay.as_millis() as u64 + offset).saturating_sub(spread);
                Duration::from_millis(total)
            }
        }
    }
}

/// Retry policy for upstream HTTP calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub enabled: bool,
    /// Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub backoff: Backoff,
    pub retry_on_status: Vec<u16>,
    pub retry_on_timeout: bool,
    pub retry_on_connect: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 2,
            backoff: Backoff::default(),
            retry_on_status: vec![408, 429, 500, 502, 503, 504],
            retry_on_timeout: true,
            retry_on_connect: true,
        }
    }
}

impl RetryConfig {
    pub fn exponential(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed { delay },
            ..Self::default()
        }
    }

    pub fn no_retry() -> Self {
        Self {
            enabled: false,
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }

    pub fn should_retry_error(&self, error: &HttpError) -> bool {
        if !error.retryable() {
            return false;
        }
        if error.is_timeout() {
            self.retry_on_timeout
        } else {
            self.retry_on_connect
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    const fn attempts(&self) -> u32 {
        if self.enabled {
            self.max_retries.saturating_add(1)
        } else {
            1
        }
    }
}

/// Executes `request`, retrying transient failures per `config`.
///
/// Returns the last response or error once attempts run out; a retryable
/// status on the final attempt comes back as `Ok`.
pub async fn send_with_retry(
    client: &dyn HttpClient,
    request: HttpRequest,
    config: &RetryConfig,
) -> Result<HttpResponse, HttpError> {
    let attempts = config.attempts();
    let mut attempt = 0;

    loop {
        let outcome = client.execute(request.clone()).await;
        let retry = match &outcome {
            Ok(response) => config.should_retry_status(response.status),
            Err(error) => config.should_retry_error(error),
        };
        if !retry || attempt + 1 >= attempts {
            return outcome;
        }

        let delay = config.delay_for_attempt(attempt);
        tracing::debug!(
            url = %request.url,
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            "retrying upstream request"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    struct ScriptedClient {
        outcomes: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedClient {
        fn new(outcomes: Vec<Result<HttpResponse, HttpError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().expect("calls lock")
        }
    }

    impl HttpClient for ScriptedClient {
        fn execute<'a>(
            &'a self,
            _request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            *self.calls.lock().expect("calls lock") += 1;
            let outcome = self
                .outcomes
                .lock()
                .expect("outcomes lock")
                .pop_front()
                .unwrap_or_else(|| Err(HttpError::non_retryable("script exhausted")));
            Box::pin(async move { outcome })
        }
    }

    fn quick(max_retries: u32) -> RetryConfig {
        RetryConfig::fixed(Duration::from_millis(1), max_retries)
    }

    #[test]
    fn test_fixed_backoff() {
        let backoff = Backoff::Fixed {
            delay: Duration::from_millis(100),
        };

        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(10), Duration::from_millis(100));
    }

    #[test]
    fn test_exponential_backoff() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(1),
            jitter: false,
        };

        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(400));
        assert_eq!(backoff.delay(4), Duration::from_secs(1));
    }

    #[test]
    fn test_exponential_backoff_with_jitter_stays_in_band() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(1),
            jitter: true,
        };

        for _ in 0..10 {
            for attempt in 0..5 {
                let delay_ms = backoff.delay(attempt).as_millis() as f64;
                let capped = (100.0 * 2_f64.powi(attempt as i32)).min(1000.0);
                assert!(delay_ms >= capped * 0.49, "attempt={attempt}, delay_ms={delay_ms}");
                assert!(delay_ms <= capped * 1.51, "attempt={attempt}, delay_ms={delay_ms}");
            }
        }
    }

    #[test]
    fn test_default_retry_config() {
        let config = RetryConfig::default();

        assert!(config.enabled);
        assert_eq!(config.max_retries, 2);
        assert!(config.should_retry_status(429));
        assert!(config.should_retry_status(503));
        assert!(!config.should_retry_status(404));
        assert!(config.should_retry_error(&HttpError::timeout("slow")));
        assert!(!config.should_retry_error(&HttpError::non_retryable("bad url")));
    }

    #[tokio::test]
    async fn retries_transient_status_then_succeeds() {
        let client = ScriptedClient::new(vec![
            Ok(HttpResponse::with_status(503, "")),
            Ok(HttpResponse::ok_json("[]")),
        ]);

        let response = send_with_retry(&client, HttpRequest::get("https://example.test"), &quick(2))
            .await
            .expect("second attempt succeeds");

        assert_eq!(response.status, 200);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let client = ScriptedClient::new(vec![
            Err(HttpError::new("reset")),
            Err(HttpError::new("reset")),
            Err(HttpError::new("reset")),
            Ok(HttpResponse::ok_json("[]")),
        ]);

        let error = send_with_retry(&client, HttpRequest::get("https://example.test"), &quick(2))
            .await
            .expect_err("all attempts fail");

        assert_eq!(error.message(), "reset");
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let client = ScriptedClient::new(vec![Ok(HttpResponse::with_status(404, ""))]);

        let response = send_with_retry(&client, HttpRequest::get("https://example.test"), &quick(3))
            .await
            .expect("404 is a response");

        assert_eq!(response.status, 404);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn disabled_config_makes_one_attempt() {
        let client = ScriptedClient::new(vec![Ok(HttpResponse::with_status(503, ""))]);

        let response = send_with_retry(&client, HttpRequest::get("https://example.test"), &RetryConfig::no_retry())
            .await
            .expect("single response");

        assert_eq!(response.status, 503);
        assert_eq!(client.calls(), 1);
    }
}
