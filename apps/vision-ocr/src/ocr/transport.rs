//! Rate limited HTTP transport
//!
//! Every outbound call waits on a token bucket owned by the transport
//! instance. Failures are returned as is, nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, RateLimiter};
use reqwest::header::HeaderMap;

use crate::config::VisionOcrOptions;
use crate::error::Result;

/// Raw HTTP reply
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a JSON POST and returns the raw reply
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &serde_json::Value,
    ) -> Result<TransportResponse>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn post_json(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &serde_json::Value,
    ) -> Result<TransportResponse> {
        (**self).post_json(url, headers, body).await
    }
}

/// Plain reqwest transport
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &serde_json::Value,
    ) -> Result<TransportResponse> {
        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(TransportResponse { status, body })
    }
}

/// Admission control for outbound calls
#[async_trait]
pub trait Throttle: Send + Sync {
    /// Wait until one more call is allowed and consume its budget
    async fn acquire(&self);
}

#[async_trait]
impl Throttle for DefaultDirectRateLimiter {
    async fn acquire(&self) {
        self.until_ready().await;
    }
}

/// Transport that waits on a throttle before each call
pub struct RateLimitedTransport<T = ReqwestTransport, L = DefaultDirectRateLimiter> {
    inner: T,
    limiter: Arc<L>,
}

impl<T, L> RateLimitedTransport<T, L>
where
    T: HttpTransport,
    L: Throttle,
{
    pub fn new(inner: T, limiter: Arc<L>) -> Self {
        Self { inner, limiter }
    }
}

impl RateLimitedTransport {
    /// reqwest transport behind a token bucket built from the options' quota
    pub fn from_options(options: &VisionOcrOptions) -> Result<Self> {
        let quota = options.rate_limit.quota()?;
        let inner = ReqwestTransport::new(options.timeout())?;
        Ok(Self::new(inner, Arc::new(RateLimiter::direct(quota))))
    }
}

#[async_trait]
impl<T, L> HttpTransport for RateLimitedTransport<T, L>
where
    T: HttpTransport,
    L: Throttle,
{
    async fn post_json(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &serde_json::Value,
    ) -> Result<TransportResponse> {
        self.limiter.acquire().await;
        tracing::trace!(url = url, "Rate limiter admitted request");
        self.inner.post_json(url, headers, body).await
    }
}

/// Request captured by [`MockTransport`]
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

/// Transport replaying canned replies in order, then an empty result
#[cfg(test)]
pub struct MockTransport {
    replies: std::sync::Mutex<std::collections::VecDeque<(u16, String)>>,
    requests: std::sync::Mutex<Vec<RecordedRequest>>,
}

#[cfg(test)]
impl MockTransport {
    pub const EMPTY_RESULT: &'static str = r#"{"result": {"textAnnotation": {"blocks": []}}}"#;

    pub fn new(replies: Vec<(u16, &str)>) -> Self {
        Self {
            replies: std::sync::Mutex::new(
                replies
                    .into_iter()
                    .map(|(status, body)| (status, body.to_string()))
                    .collect(),
            ),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn ok(body: &str) -> Self {
        Self::new(vec![(200, body)])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl HttpTransport for MockTransport {
    async fn post_json(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &serde_json::Value,
    ) -> Result<TransportResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            headers,
            body: body.clone(),
        });

        let (status, body) = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| (200, Self::EMPTY_RESULT.to_string()));

        Ok(TransportResponse {
            status,
            body: body.into_bytes(),
        })
    }
}

/// Throttle that admits everything and counts admissions
#[cfg(test)]
#[derive(Default)]
pub struct CountingThrottle {
    pub acquired: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
#[async_trait]
impl Throttle for CountingThrottle {
    async fn acquire(&self) {
        self.acquired
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}
