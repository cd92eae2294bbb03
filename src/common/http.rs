use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use tracing::warn;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Retry behavior of a service client. Kept as plain data so each caller
/// can see and override it; applied at the transport level only, never
/// inside the decode/signing core.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
    pub retry_statuses: Vec<StatusCode>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
            retry_statuses: vec![
                StatusCode::INTERNAL_SERVER_ERROR,
                StatusCode::BAD_GATEWAY,
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::GATEWAY_TIMEOUT,
            ],
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
            retry_statuses: Vec::new(),
        }
    }

    fn should_retry_status(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status)
    }

    // Exponential: backoff, 2*backoff, 4*backoff, ...
    fn delay(&self, attempt: u32) -> Duration {
        self.backoff * 2u32.saturating_pow(attempt)
    }
}

/// A reusable HTTP resource: one pooled `reqwest::Client` carrying the
/// service's default header set plus an explicit retry policy.
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(default_headers: HeaderMap, retry: RetryPolicy) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .default_headers(default_headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(READ_TIMEOUT)
            .build()?;
        Ok(Self { client, retry })
    }

    /// Client with only the browser User-Agent set.
    pub fn with_user_agent(retry: RetryPolicy) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        Self::new(headers, retry)
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Sends the request, retrying transient transport errors and
    /// configured 5xx statuses. The final response is returned as-is;
    /// status handling stays with the caller.
    pub async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Response, reqwest::Error> {
        let mut attempt = 0u32;
        loop {
            let replay = match request.try_clone() {
                Some(clone) => clone,
                // Streaming bodies cannot be replayed; send once.
                None => return request.send().await,
            };

            match replay.send().await {
                Ok(response)
                    if self.retry.should_retry_status(response.status())
                        && attempt + 1 < self.retry.max_attempts =>
                {
                    warn!(
                        "retrying after status {} (attempt {})",
                        response.status(),
                        attempt + 1
                    );
                }
                Ok(response) => return Ok(response),
                Err(error) if attempt + 1 < self.retry.max_attempts => {
                    warn!("retrying after transport error: {}", error);
                }
                Err(error) => return Err(error),
            }

            tokio::time::sleep(self.retry.delay(attempt)).await;
            attempt += 1;
        }
    }
}
