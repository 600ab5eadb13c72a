//! Trait abstractions for HTTP so tests can inject mock transports.
//!
//! The release fetcher and the downloader only talk to the network through
//! [`HttpClient`]. Tests use the generated `MockHttpClient` to count calls or
//! simulate failures; everything else uses [`ReqwestHttpClient`].

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
#[cfg(test)]
use mockall::automock;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use tokio::io::AsyncWriteExt;

/// Called with (bytes downloaded so far, total size if known).
pub type ProgressCallback = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Transport-level failure, mapped to a stage error by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpFailure {
    /// The server answered with a non-success status.
    Status { code: u16, reason: String },
    /// No usable response (DNS, TLS, connection reset, truncated body).
    Network(String),
    /// Writing the body to disk failed.
    Io(String),
}

impl HttpFailure {
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpFailure::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn reason(&self) -> String {
        match self {
            HttpFailure::Status { reason, .. } => reason.clone(),
            HttpFailure::Network(message) => message.clone(),
            HttpFailure::Io(message) => format!("I/O error: {message}"),
        }
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpFailure::Status { code, reason } => write!(f, "HTTP {} {}", code, reason),
            HttpFailure::Network(message) => write!(f, "{}", message),
            HttpFailure::Io(message) => write!(f, "I/O error: {}", message),
        }
    }
}

/// HTTP client trait for abstracting network operations.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET `url` with the given `Accept` header and return the whole body.
    async fn get(&self, url: &str, accept: &str) -> Result<Vec<u8>, HttpFailure>;

    /// GET `url` and stream the body into a newly created file at `dest`.
    /// Returns the number of bytes written.
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<u64, HttpFailure>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    token: Option<String>,
}

impl ReqwestHttpClient {
    pub fn new(token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("setup-everything/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self::with_client(client, token)
    }

    pub fn with_client(client: reqwest::Client, token: Option<String>) -> Self {
        // An empty token (unset CI secret) means anonymous access.
        let token = token.filter(|t| !t.is_empty());
        Self { client, token }
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("token {token}")),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, HttpFailure> {
        let response = request
            .send()
            .await
            .map_err(|e| HttpFailure::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpFailure::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(response)
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, accept: &str) -> Result<Vec<u8>, HttpFailure> {
        let response = self.send(self.request(url).header(ACCEPT, accept)).await?;

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| HttpFailure::Network(e.to_string()))
    }

    async fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<u64, HttpFailure> {
        let response = self.send(self.request(url)).await?;
        let total = response.content_length();

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| HttpFailure::Io(e.to_string()))?;

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| HttpFailure::Network(e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| HttpFailure::Io(e.to_string()))?;
            written += chunk.len() as u64;
            if let Some(ref cb) = progress {
                cb(written, total);
            }
        }

        file.flush().await.map_err(|e| HttpFailure::Io(e.to_string()))?;

        Ok(written)
    }
}
