//! The blocking transport seam.
//!
//! The bridge performs fetches through a [`Transport`] object so tests
//! can substitute canned responses; the real implementation wraps a
//! blocking reqwest client.

use std::time::Duration;

/// User-Agent sent with all requests. Mimics a common desktop browser to
/// avoid basic bot detection.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default request timeout.
const TIMEOUT: Duration = Duration::from_secs(30);

/// An outgoing request, as assembled by the XHR layer.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: String,
    /// Absolute URL.
    pub url: String,
    /// Request headers in registration order; duplicates allowed.
    pub headers: Vec<(String, String)>,
    /// Request body, if any.
    pub body: Option<Vec<u8>>,
}

impl TransportRequest {
    /// A bare GET for `url`.
    #[must_use]
    pub fn get(url: &str) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }
}

/// A completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase, when known.
    pub status_text: String,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Raw response body.
    pub body: Vec<u8>,
}

/// Transport failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The exchange failed before a response arrived.
    #[error("network error: {0}")]
    Network(String),
    /// The exchange was cancelled underneath us; completions for aborted
    /// fetches are suppressed rather than surfaced as errors.
    #[error("request aborted")]
    Aborted,
}

/// A blocking fetch implementation.
pub trait Transport: Send + Sync {
    /// Perform the exchange, blocking the calling (background) thread.
    ///
    /// # Errors
    ///
    /// [`TransportError::Network`] for connection/protocol failures;
    /// [`TransportError::Aborted`] when the exchange was cancelled.
    fn fetch(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// The production transport: one blocking reqwest exchange per fetch.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpTransport;

impl Transport for HttpTransport {
    fn fetch(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| TransportError::Network(format!("failed to create HTTP client: {e}")))?;

        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .unwrap_or(reqwest::Method::GET);
        let mut builder = client
            .request(method, &request.url)
            .header("User-Agent", USER_AGENT);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .map_err(|e| TransportError::Network(format!("request failed: {e}")))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .map_err(|e| TransportError::Network(format!("failed to read response body: {e}")))?
            .to_vec();

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
        })
    }
}
