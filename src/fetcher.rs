use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::Config;

/// Statuses worth retrying: rate limiting and transient server errors.
const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-retryable HTTP error status, surfaced on the first attempt.
    #[error("HTTP status {0}")]
    Status(StatusCode),
    /// Transport-level failure (timeout, connect, body read).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("gave up on {url} after {attempts} attempts (last status {status})")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        status: StatusCode,
    },
}

/// Fetch seam: one GET, returning the response body as text.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Blocking HTTP client with bounded linear-backoff retries on
/// transient failures and a fixed pause after each successful fetch to
/// bound the request rate. Reused across calls for connection pooling;
/// carries no run-specific state.
pub struct HttpFetcher {
    client: Client,
    request_pause: Duration,
    backoff_step: Duration,
    max_retries: u32,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("job-harvester")),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .expect("Failed to build HTTP client");

        HttpFetcher {
            client,
            request_pause: config.request_pause,
            backoff_step: config.backoff_step,
            max_retries: config.max_retries,
        }
    }

    fn backoff(&self, attempt: u32) {
        let wait = self.backoff_step * attempt;
        info!("Backing off for {:?} (attempt {})...", wait, attempt);
        thread::sleep(wait);
    }
}

fn is_retryable(status: StatusCode) -> bool {
    RETRYABLE_STATUSES.contains(&status.as_u16())
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0u32;
        loop {
            debug!("GET {}", url);
            match self.client.get(url).send() {
                Ok(response) => {
                    let status = response.status();
                    if is_retryable(status) {
                        if attempt >= self.max_retries {
                            return Err(FetchError::RetriesExhausted {
                                url: url.to_string(),
                                attempts: attempt + 1,
                                status,
                            });
                        }
                        attempt += 1;
                        warn!("Got {} from {}, retrying...", status, url);
                        self.backoff(attempt);
                        continue;
                    }
                    if !status.is_success() {
                        return Err(FetchError::Status(status));
                    }
                    let text = response.text()?;
                    // Server load relief between requests.
                    thread::sleep(self.request_pause);
                    return Ok(text);
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    if attempt >= self.max_retries {
                        return Err(FetchError::Request(e));
                    }
                    attempt += 1;
                    warn!("Request to {} failed ({}), retrying...", url, e);
                    self.backoff(attempt);
                }
                Err(e) => return Err(FetchError::Request(e)),
            }
        }
    }
}
