//! Page fetching boundary.
//!
//! Adapters never talk to `reqwest` directly; they go through [`Fetch`] so
//! tests (and offline fixtures) can serve canned pages.

use showscout_core::SourceError;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Value for the `Cookie` header.
    pub cookies: Option<String>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            cookies: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_cookies(mut self, cookies: Option<String>) -> Self {
        self.cookies = cookies;
        self
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server returned HTTP {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,
}

impl From<FetchError> for SourceError {
    fn from(e: FetchError) -> Self {
        SourceError::Unavailable(e.to_string())
    }
}

/// Supplies raw page bodies and download payloads.
#[async_trait::async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError>;

    /// Raw response body, for binary payloads such as `.torrent` files.
    async fn fetch_bytes(&self, request: &FetchRequest) -> Result<Vec<u8>, FetchError> {
        self.fetch(request).await.map(String::into_bytes)
    }
}

/// `reqwest` backed fetcher used in production.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    async fn send(&self, request: &FetchRequest) -> Result<reqwest::Response, FetchError> {
        debug!(url = %request.url, "fetching");

        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(cookies) = &request.cookies {
            builder = builder.header(reqwest::header::COOKIE, cookies.as_str());
        }

        let resp = builder.send().await.map_err(map_reqwest)?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }
        Ok(resp)
    }
}

#[async_trait::async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        self.send(request).await?.text().await.map_err(map_reqwest)
    }

    async fn fetch_bytes(&self, request: &FetchRequest) -> Result<Vec<u8>, FetchError> {
        let bytes = self.send(request).await?.bytes().await.map_err(map_reqwest)?;
        Ok(bytes.to_vec())
    }
}

fn map_reqwest(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(e.to_string())
    }
}

/// Serves pages from memory, keyed by URL prefix.
///
/// Every request is recorded so callers can check what was sent.
#[derive(Default)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
    delay: Option<Duration>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url_prefix: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url_prefix.into(), body.into());
        self
    }

    /// Sleep before answering, to simulate a slow site.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Fetch for StaticFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        // Longest matching prefix wins.
        self.pages
            .iter()
            .filter(|(prefix, _)| request.url.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, body)| body.clone())
            .ok_or(FetchError::Status(404))
    }
}
