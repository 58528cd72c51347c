//! Retrying wrapper for same-origin HTTP calls.
//!
//! Knows nothing about authentication; the session monitor keeps the guest
//! cookie fresh independently.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use serde::Serialize;
use tracing::{debug, instrument};

use super::retry::{retry_with_backoff, RetryPolicy};
use crate::services::client::{ClientError, ClientResult};
use crate::services::config::AppConfig;

/// A request that can be replayed for every attempt.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl FetchRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post_json<T: Serialize>(url: impl Into<String>, body: &T) -> ClientResult<Self> {
        let bytes = serde_json::to_vec(body).map_err(|e| ClientError::NetworkError {
            message: format!("Failed to serialize request body: {}", e),
        })?;
        Ok(Self::new(Method::POST, url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(bytes))
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Outcome classification: network failures and the configured statuses are
/// worth another attempt, everything else is final.
pub fn is_transient(
    outcome: &Result<Response, reqwest::Error>,
    retryable_statuses: &[u16],
) -> bool {
    match outcome {
        Ok(response) => retryable_statuses.contains(&response.status().as_u16()),
        Err(e) => !e.is_builder() && !e.is_decode(),
    }
}

#[derive(Clone)]
pub struct FetchInterceptor {
    http_client: Client,
    policy: RetryPolicy,
    retryable_statuses: Vec<u16>,
    base_url: Option<String>,
}

impl FetchInterceptor {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(http_client: Client, config: &AppConfig) -> Self {
        Self {
            http_client,
            policy: RetryPolicy::from(&config.retry),
            retryable_statuses: config.retry.retryable_statuses.clone(),
            base_url: config.base_url(),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn resolve(&self, url: &str) -> String {
        match &self.base_url {
            Some(base) => crate::utils::join_url(base, url),
            None => url.to_string(),
        }
    }

    /// Send `request`, retrying transient failures with the configured policy.
    pub async fn fetch(&self, request: FetchRequest) -> Result<Response, reqwest::Error> {
        let policy = self.policy;
        self.fetch_with_retry(request, policy.max_attempts, policy.backoff_base_ms)
            .await
    }

    /// Send `request` up to `max_attempts` times, waiting `backoff_ms`,
    /// 2×`backoff_ms`… between attempts. The last response or error is
    /// returned unchanged.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn fetch_with_retry(
        &self,
        request: FetchRequest,
        max_attempts: u32,
        backoff_ms: u64,
    ) -> Result<Response, reqwest::Error> {
        let policy = RetryPolicy {
            max_attempts: max_attempts.max(1),
            backoff_base_ms: backoff_ms,
            max_backoff_ms: self.policy.max_backoff_ms.max(backoff_ms),
        };
        let url = self.resolve(&request.url);

        retry_with_backoff(
            &policy,
            |attempt| {
                debug!("{} {} (attempt {})", request.method, url, attempt);
                let mut builder = self
                    .http_client
                    .request(request.method.clone(), &url)
                    .headers(request.headers.clone());
                if let Some(body) = &request.body {
                    builder = builder.body(body.clone());
                }
                builder.send()
            },
            |outcome| is_transient(outcome, &self.retryable_statuses),
        )
        .await
    }
}
